use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("permission already exists: {0}")]
    DuplicatePermission(String),
    #[error("role already exists: {0}")]
    DuplicateRole(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}
