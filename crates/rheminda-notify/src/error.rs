use thiserror::Error;

/// Errors reported by an OS notification bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No native notification plugin is reachable (e.g. running outside the
    /// native shell).
    #[error("Notification bridge unavailable: {0}")]
    Unavailable(String),

    /// The user has not granted notification permission.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The channel or action type is already registered. Callers treat this
    /// as success.
    #[error("Already registered: {0}")]
    AlreadyExists(String),

    /// The platform refused the request (bad payload, quota, …).
    #[error("Bridge rejected request: {0}")]
    Rejected(String),
}

impl BridgeError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BridgeError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
