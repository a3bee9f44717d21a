use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComponentError {
    #[error("behavior has no handler method '{method}' for event '{event}'")]
    UnknownMethod { event: String, method: String },
    #[error("behavior is already attached to component {0}")]
    AlreadyAttached(u64),
}
