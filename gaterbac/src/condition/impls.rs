use chrono::DateTime;
use gatecore::permission::{
    Condition,
    ConditionKind,
    Operator,
};
use serde_json::Value;
use std::fmt;

use super::*;

static NULL: Value = Value::Null;

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        rule: impl Fn(&Context, &str) -> Result<bool, RuleError> + Send + Sync + 'static,
    ) {
        self.0.insert(name.into(), Arc::new(rule));
    }

    pub fn evaluate(
        &self,
        name: &str,
        context: &Context,
        user_id: &str,
    ) -> Result<bool, RuleError> {
        let rule = self.0.get(name)
            .ok_or_else(|| RuleError::Unregistered(name.to_string()))?;
        rule(context, user_id)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.0.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_tuple("RuleRegistry").field(&names).finish()
    }
}

impl<'a> Subject<'a> {
    pub fn new(id: &'a str) -> Self {
        Self { id, role: None }
    }

    pub fn role(mut self, val: Option<&'a str>) -> Self {
        self.role = val;
        self
    }

    /// Substitute the user tokens within strings, including strings
    /// nested inside arrays.
    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(
                s.replace("{{user.id}}", self.id)
                    .replace("{{user.role}}", self.role.unwrap_or(""))
            ),
            Value::Array(items) => Value::Array(
                items.iter().map(|v| self.substitute(v)).collect()
            ),
            v => v.clone(),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(RuleRegistry::default())
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    pub fn new(rules: RuleRegistry) -> Self {
        Self {
            rules,
            ts_source: None,
        }
    }

    pub fn ts_source(mut self, val: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.ts_source = Some(Arc::new(val));
        self
    }

    /// Share an existing timestamp source, or fall back to the system
    /// clock with `None`.
    pub fn clock(mut self, val: Option<TsSource>) -> Self {
        self.ts_source = val;
        self
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn now(&self) -> i64 {
        self.ts_source
            .as_ref()
            .map(|f| f())
            .unwrap_or_else(gatecore::now)
    }

    /// True when every condition holds; an empty list always holds.
    pub fn evaluate(
        &self,
        conditions: &[Condition],
        context: &Context,
        subject: &Subject,
    ) -> bool {
        conditions.iter()
            .all(|condition| self.evaluate_one(condition, context, subject))
    }

    pub fn evaluate_one(
        &self,
        condition: &Condition,
        context: &Context,
        subject: &Subject,
    ) -> bool {
        match condition.kind {
            ConditionKind::Field => match &condition.field {
                Some(field) => compare(
                    condition.operator,
                    lookup(context, field).unwrap_or(&NULL),
                    &subject.substitute(&condition.value),
                ),
                None => {
                    log::warn!("field condition without a field evaluated as false");
                    false
                }
            },
            ConditionKind::Location => compare(
                condition.operator,
                lookup(context, condition.field.as_deref().unwrap_or("location"))
                    .unwrap_or(&NULL),
                &subject.substitute(&condition.value),
            ),
            ConditionKind::Time => compare(
                condition.operator,
                &Value::from(self.now()),
                &as_timestamp(&condition.value),
            ),
            ConditionKind::Custom => {
                let Some(name) = condition.custom_function.as_deref() else {
                    log::warn!("custom condition without a rule name evaluated as false");
                    return false;
                };
                match self.rules.evaluate(name, context, subject.id) {
                    Ok(result) => result,
                    Err(e) => {
                        log::warn!("custom rule {name:?} evaluated as false: {e}");
                        false
                    }
                }
            }
            kind => {
                log::warn!("unsupported condition {kind} evaluated as false");
                false
            }
        }
    }
}

/// Resolve a dotted path against the context; array elements may be
/// addressed by their index.
pub fn lookup<'a>(context: &'a Context, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = context.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok()
            .and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Apply the operator with the field value on the left hand side.
pub fn compare(operator: Operator, field: &Value, value: &Value) -> bool {
    match operator {
        Operator::Equals => loose_eq(field, value),
        Operator::NotEquals => !loose_eq(field, value),
        Operator::Contains => !field.is_null() &&
            as_text(field).contains(&as_text(value)),
        Operator::GreaterThan => match (as_number(field), as_number(value)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        Operator::LessThan => match (as_number(field), as_number(value)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        Operator::In => value.as_array()
            .map(|items| items.iter().any(|v| loose_eq(field, v)))
            .unwrap_or(false),
        Operator::NotIn => value.as_array()
            .map(|items| !items.iter().any(|v| loose_eq(field, v)))
            .unwrap_or(false),
        _ => false,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (a, b) => a == b,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        v => v.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

// RFC 3339 strings are converted to unix timestamps; everything else is
// left for the numeric coercion.
fn as_timestamp(value: &Value) -> Value {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Value::from(dt.timestamp()))
            .unwrap_or_else(|_| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(as_timestamp).collect()),
        v => v.clone(),
    }
}
