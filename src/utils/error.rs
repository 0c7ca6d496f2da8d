use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("DNS resolution failed: {0}")]
    DnsError(#[from] hickory_resolver::error::ResolveError),

    #[error("AWS {operation} failed: {message}")]
    AwsError { operation: String, message: String },

    #[error("Command `{command}` timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Resource creation failed: {message}")]
    CreationError { message: String },
}

impl HarnessError {
    pub fn aws(operation: &str, err: impl std::fmt::Display) -> Self {
        HarnessError::AwsError {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
