use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] gatecore::error::BackendError),
    #[error(transparent)]
    Rbac(#[from] gaterbac::error::Error),
    #[error(transparent)]
    Workflow(#[from] gateflow::error::Error),
    #[error("user `{user_id}` may not {action} {resource}")]
    Forbidden {
        user_id: String,
        resource: String,
        action: String,
    },
}
