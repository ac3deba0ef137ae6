use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Registry returned HTTP {status} for postal code {postal_code}")]
    HttpStatusError { postal_code: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid postal code '{value}': {reason}")]
    InvalidPostalCode { value: String, reason: String },

    #[error("Reference table error: {message}")]
    ReferenceError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LocatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LocatorError::ApiError(_) | LocatorError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            LocatorError::IoError(_) => ErrorCategory::Storage,
            LocatorError::CsvError(_)
            | LocatorError::SerializationError(_)
            | LocatorError::InvalidPostalCode { .. } => ErrorCategory::Data,
            LocatorError::ConfigValidationError { .. }
            | LocatorError::InvalidConfigValueError { .. }
            | LocatorError::ReferenceError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Transport failures, rate limiting and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::ApiError(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            LocatorError::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity and the registry endpoint, then rerun; cached postal codes are skipped"
            }
            ErrorCategory::Storage => "Check that the cache directory exists and is writable",
            ErrorCategory::Data => "Inspect the offending file or value; it is skipped on the next run",
            ErrorCategory::Configuration => {
                "Review the configuration file and command-line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LocatorError::ReferenceError { message } => {
                format!("Could not load the MSA reference table: {}", message)
            }
            LocatorError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocatorError>;
