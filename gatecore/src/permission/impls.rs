use std::{
    fmt,
    str::FromStr,
};
use crate::error::ValueError;
use super::*;

impl Permission {
    /// A new unconditional permission, identified as `resource.action`.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        let resource = resource.into();
        let action = action.into();
        let id = format!("{resource}.{action}");
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            resource,
            action,
            conditions: Vec::new(),
        }
    }

    pub fn id(mut self, val: impl Into<String>) -> Self {
        self.id = val.into();
        self
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.name = val.into();
        self
    }

    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.description = val.into();
        self
    }

    pub fn condition(mut self, val: Condition) -> Self {
        self.conditions.push(val);
        self
    }

    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

impl Condition {
    pub fn field(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            kind: ConditionKind::Field,
            field: Some(field.into()),
            operator,
            value: value.into(),
            custom_function: None,
        }
    }

    pub fn time(operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            kind: ConditionKind::Time,
            operator,
            value: value.into(),
            .. Default::default()
        }
    }

    pub fn location(operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            kind: ConditionKind::Location,
            operator,
            value: value.into(),
            .. Default::default()
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            kind: ConditionKind::Custom,
            custom_function: Some(name.into()),
            .. Default::default()
        }
    }

    /// The ownership condition: the `owner_id` of the context must be
    /// the acting user.
    pub fn owner() -> Self {
        Self::field("owner_id", Operator::Equals, "{{user.id}}")
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl From<ConditionKind> for &'static str {
    fn from(kind: ConditionKind) -> &'static str {
        match kind {
            ConditionKind::Field => "field",
            ConditionKind::Time => "time",
            ConditionKind::Location => "location",
            ConditionKind::Custom => "custom",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl From<Operator> for &'static str {
    fn from(operator: Operator) -> &'static str {
        match operator {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }
}

impl FromStr for Operator {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Operator::Equals),
            "not_equals" => Ok(Operator::NotEquals),
            "contains" => Ok(Operator::Contains),
            "greater_than" => Ok(Operator::GreaterThan),
            "less_than" => Ok(Operator::LessThan),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    #[test]
    fn permission_id() {
        let permission = Permission::new("budgets", "approve");
        assert_eq!(permission.id, "budgets.approve");
        assert!(permission.matches("budgets", "approve"));
        assert!(!permission.matches("budgets", "view"));
        assert!(permission.conditions.is_empty());
    }

    #[test]
    fn condition_serde() -> anyhow::Result<()> {
        let condition: Condition = serde_json::from_value(json!({
            "type": "field",
            "field": "owner_id",
            "operator": "equals",
            "value": "{{user.id}}"
        }))?;
        assert_eq!(condition, Condition::owner());

        let condition: Condition = serde_json::from_value(json!({
            "type": "custom",
            "custom_function": "business_hours"
        }))?;
        assert_eq!(condition, Condition::custom("business_hours"));
        assert_eq!(condition.operator, Operator::Equals);
        Ok(())
    }

    #[test]
    fn operator_str() -> anyhow::Result<()> {
        assert_eq!(Operator::GreaterThan.to_string(), "greater_than");
        assert_eq!(Operator::from_str("not_in")?, Operator::NotIn);
        assert!(matches!(
            Operator::from_str("between").expect_err("should be an error"),
            ValueError::Unsupported(s) if s == "between",
        ));
        Ok(())
    }
}
