use async_trait::async_trait;
use serde_json::Value;
use crate::{
    error::{
        BackendError,
        DispatchError,
    },
    snapshot::Snapshot,
    workflow::{
        Step,
        WorkflowInstance,
    },
};

/// Delivers the outward side effects declared by workflow actions.
pub trait Dispatcher: Send + Sync {
    fn send_notification(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError>;
    fn call_api(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError>;
    fn create_record(
        &self,
        instance: &WorkflowInstance,
        target: &str,
        value: &Value,
    ) -> Result<(), DispatchError>;
}

/// Maps a step's assignee declaration to a concrete actor.  Returning
/// `None` leaves the step without an assignee.
pub trait AssigneeResolver: Send + Sync {
    fn resolve(
        &self,
        step: &Step,
        instance: &WorkflowInstance,
    ) -> Option<String>;
}

#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Snapshot>, BackendError>;
    async fn save(&self, snapshot: &Snapshot) -> Result<(), BackendError>;
}
