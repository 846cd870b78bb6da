use rheminda_core::ReminderId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached (connect failure or timeout).
    #[error("Server unreachable: {0}")]
    Network(String),

    #[error("Reminder not found: {id}")]
    NotFound { id: ReminderId },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Api { .. } => "API_ERROR",
            ApiError::Parse(_) => "PARSE_ERROR",
            ApiError::Http(_) => "HTTP_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// True when the request may not have reached the server at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
