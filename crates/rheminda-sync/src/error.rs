use rheminda_api::ApiError;
use rheminda_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The change was refused before anything was sent.
    #[error(transparent)]
    Rejected(#[from] CoreError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Api(e) => e.code(),
            SyncError::Rejected(e) => e.code(),
        }
    }

    /// The reminder no longer exists on the server.
    pub fn is_gone(&self) -> bool {
        matches!(self, SyncError::Api(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
