use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::permission::Condition;

mod impls;
pub mod instance;
pub use instance::{
    HistoryAction,
    HistoryItem,
    InstanceStatus,
    Transition,
    WorkflowInstance,
};

/// An ordered list of steps describing a multi-actor process.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

fn enabled_default() -> bool {
    true
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    OnCreate,
    OnUpdate,
    OnDelete,
    #[default]
    Manual,
}

/// Declarative description of the event that should start a workflow.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Trigger {
    pub event: TriggerEvent,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    #[default]
    Task,
    Approval,
    Notification,
    Condition,
    Action,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeKind {
    User,
    Role,
    Group,
    #[default]
    Auto,
}

/// One unit of work in a workflow.
///
/// Conditions decide whether the step runs at all (a failing condition
/// skips it); actions fire once on entry.  `timeout` is in seconds and
/// is only acted upon by an explicit sweep of overdue steps.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub assignee_type: AssigneeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    UpdateField,
    SendNotification,
    CallApi,
    CreateRecord,
    Custom,
}

/// A side effect declared by a step.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub target: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_function: Option<String>,
}
