use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("workflow is disabled: {0}")]
    WorkflowDisabled(String),
    #[error("workflow already exists: {0}")]
    DuplicateWorkflow(String),
    #[error("workflow instance not found: {0}")]
    InstanceNotFound(String),
    #[error("step not found: {0}")]
    StepNotFound(String),
    #[error("user `{user_id}` is not the assignee of step `{step_id}`")]
    NotAssignee {
        step_id: String,
        user_id: String,
    },
    #[error("workflow instance is not running: {0}")]
    NotRunning(String),
    #[error("step is not awaiting completion: {0}")]
    StepNotBlocking(String),
    #[error("step has already been decided: {0}")]
    StepDecided(String),
}
