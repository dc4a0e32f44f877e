use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A grantable rule: permits `action` on `resource`, provided every
/// attached condition holds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub resource: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    #[default]
    Field,
    Time,
    Location,
    Custom,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
}

/// A predicate gating a permission or a workflow step.
///
/// For `field` conditions the `field` names the context entry to be
/// compared (dotted paths descend into nested objects), and string
/// values may carry the `{{user.id}}` or `{{user.role}}` tokens, which
/// are substituted with the acting user before comparison.  `custom`
/// conditions name a registered rule through `custom_function`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_function: Option<String>,
}

mod impls;
