use component::ComponentError;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidRoute(String),
    #[error("{0}")]
    InvalidPath(String),
    #[error("invalid path alias: {0}")]
    InvalidAlias(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRoute(_) => ErrorCode::NotFound,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::InvalidPath(_) | Self::InvalidAlias(_) => ErrorCode::InvalidPath,
            Self::InvalidConfig(_) | Self::Component(_) | Self::Action(_) => ErrorCode::Internal,
        }
    }
}

impl From<&DispatchError> for ApiError {
    fn from(value: &DispatchError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}
