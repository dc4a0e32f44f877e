//! The mutable engine state that a durable store would persist across
//! restarts.  Catalogs are not part of it as they are seeded at start.

use serde::{Deserialize, Serialize};
use crate::{
    assignment::UserAssignment,
    audit::PermissionCheck,
    workflow::{
        Transition,
        WorkflowInstance,
    },
};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AccessState {
    pub assignments: Vec<UserAssignment>,
    pub checks: Vec<PermissionCheck>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkflowState {
    pub instances: Vec<WorkflowInstance>,
    pub last_instance_seq: i64,
    /// Transitions queued but not yet executed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<Transition>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub access: AccessState,
    #[serde(default)]
    pub workflow: WorkflowState,
}
