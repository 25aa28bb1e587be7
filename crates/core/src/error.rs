#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
