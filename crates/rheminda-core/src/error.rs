use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl CoreError {
    /// Short machine-readable code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::UnknownVariant { .. } => "UNKNOWN_VARIANT",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_code() {
        let errors = [
            CoreError::Config("bad path".into()),
            CoreError::Validation("blank title".into()),
            CoreError::UnknownVariant {
                kind: "status",
                value: "archived".into(),
            },
        ];
        let codes: Vec<_> = errors.iter().map(CoreError::code).collect();
        assert_eq!(codes, ["CONFIG_ERROR", "VALIDATION_ERROR", "UNKNOWN_VARIANT"]);
        assert_eq!(errors[2].to_string(), "Unknown status: archived");
    }
}
