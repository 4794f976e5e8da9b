use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredentialError { var: String },

    #[error("Failed to fetch feed {url}: {message}")]
    FetchError { url: String, message: String },

    #[error("Gateway API call '{operation}' failed (status {status}): {message}")]
    RemoteApiError {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Background task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    RemoteService,
    Io,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn config(message: impl Into<String>) -> Self {
        SyncError::ConfigError {
            message: message.into(),
        }
    }

    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::FetchError {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        SyncError::RemoteApiError {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingCredentialError { .. } => ErrorCategory::Configuration,
            SyncError::HttpError(_) | SyncError::FetchError { .. } => ErrorCategory::Network,
            SyncError::RemoteApiError { .. } | SyncError::SerializationError(_) => {
                ErrorCategory::RemoteService
            }
            SyncError::IoError(_) => ErrorCategory::Io,
            SyncError::TaskError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::HttpError(_) | SyncError::FetchError { .. } => ErrorSeverity::Medium,
            SyncError::RemoteApiError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            SyncError::TaskError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SyncError::MissingCredentialError { .. } => {
                "Export CF_API_TOKEN and CF_IDENTIFIER before running".to_string()
            }
            SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line arguments".to_string()
            }
            SyncError::FetchError { url, .. } => {
                format!("Make sure the feed {} is reachable and returns 2xx", url)
            }
            SyncError::HttpError(_) => "Check network connectivity and retry".to_string(),
            SyncError::RemoteApiError { status: 401, .. }
            | SyncError::RemoteApiError { status: 403, .. } => {
                "Verify the API token has Zero Trust edit permission".to_string()
            }
            SyncError::RemoteApiError { .. } => {
                "Inspect the gateway state and re-run the sync".to_string()
            }
            SyncError::SerializationError(_) => {
                "The gateway returned an unexpected payload; re-run with --verbose".to_string()
            }
            SyncError::IoError(_) => "Check file paths and permissions".to_string(),
            SyncError::TaskError { .. } => "Re-run the sync".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::MissingCredentialError { var } => {
                format!("Please set {} (CF_API_TOKEN and CF_IDENTIFIER are required)", var)
            }
            SyncError::FetchError { url, .. } => format!("Could not download feed {}", url),
            SyncError::RemoteApiError {
                operation, status, ..
            } => format!("Gateway rejected '{}' with status {}", operation, status),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
