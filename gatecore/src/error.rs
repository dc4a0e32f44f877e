use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Raised by a notification/API/record dispatcher.  The workflow engine
/// never propagates these, the action is simply skipped.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("dispatch target rejected: {0}")]
    Rejected(String),
    #[error("dispatcher unavailable")]
    Unavailable,
}

/// Raised by a registered custom rule or custom action.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("no rule registered under the name: {0}")]
    Unregistered(String),
    #[error("missing value: {0}")]
    Missing(String),
    #[error("rule failed: {0}")]
    Failed(String),
}
