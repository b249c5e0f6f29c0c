use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("WAV codec error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Download failed with status {status}: {url}")]
    DownloadError { status: u16, url: String },

    #[error("Audio file exceeds the {limit_bytes} byte download limit")]
    TooLargeError { limit_bytes: usize },

    #[error("Audio decode error: {reason}")]
    DecodeError { reason: String },

    #[error("Audio processing error: {message}")]
    ProcessingError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error for {field}: {message}")]
    ValidationError { field: String, message: String },
}

/// Coarse grouping used in logs and operator-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Audio,
    Storage,
    Configuration,
    Request,
    System,
}

/// Drives the process exit code and log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ApiError(_) | AppError::DownloadError { .. } => ErrorCategory::Network,
            AppError::WavError(_)
            | AppError::DecodeError { .. }
            | AppError::ProcessingError { .. } => ErrorCategory::Audio,
            AppError::StorageError { .. } => ErrorCategory::Storage,
            AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AppError::ValidationError { .. } | AppError::TooLargeError { .. } => {
                ErrorCategory::Request
            }
            AppError::IoError(_) | AppError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient network conditions; the caller may simply retry.
            AppError::ApiError(_) | AppError::DownloadError { .. } => ErrorSeverity::Medium,
            // Bad input, not a service fault.
            AppError::ValidationError { .. }
            | AppError::TooLargeError { .. }
            | AppError::DecodeError { .. } => ErrorSeverity::Low,
            AppError::WavError(_)
            | AppError::ProcessingError { .. }
            | AppError::StorageError { .. } => ErrorSeverity::High,
            AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
            AppError::IoError(_) | AppError::SerializationError(_) => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AppError::ApiError(_) => {
                "Check network connectivity and that the remote endpoint is reachable".to_string()
            }
            AppError::DownloadError { url, .. } => {
                format!("Verify that the audio file URL is correct and accessible: {}", url)
            }
            AppError::TooLargeError { limit_bytes } => format!(
                "Submit a smaller file or raise the download limit (currently {} bytes)",
                limit_bytes
            ),
            AppError::DecodeError { .. } | AppError::WavError(_) => {
                "Make sure the source file is a PCM or float WAV file".to_string()
            }
            AppError::ProcessingError { .. } => {
                "Inspect the server logs for the failing processing stage".to_string()
            }
            AppError::StorageError { .. } => {
                "Check the storage credentials and that the target buckets exist".to_string()
            }
            AppError::ConfigError { .. } | AppError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and restart the server".to_string()
            }
            AppError::MissingConfigError { field } => {
                format!("Set the {} environment variable (or the matching config entry)", field)
            }
            AppError::ValidationError { field, .. } => {
                format!("Correct the '{}' field of the request and resubmit", field)
            }
            AppError::IoError(_) => "Check file permissions and available disk space".to_string(),
            AppError::SerializationError(_) => {
                "Verify the request payload is well-formed JSON".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::ApiError(_) => "Could not reach the remote server".to_string(),
            AppError::DownloadError { .. } => "Failed to download audio file".to_string(),
            AppError::TooLargeError { .. } => "Audio file is too large".to_string(),
            AppError::DecodeError { .. } | AppError::WavError(_) => {
                "Audio file could not be decoded".to_string()
            }
            AppError::ProcessingError { .. } => "Audio processing failed".to_string(),
            AppError::StorageError { .. } => "Could not store the processed files".to_string(),
            AppError::ConfigError { message } => format!("Configuration problem: {}", message),
            AppError::MissingConfigError { field } => format!("Missing configuration: {}", field),
            AppError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            AppError::ValidationError { field, message } => {
                format!("Invalid request field '{}': {}", field, message)
            }
            AppError::IoError(_) => "A filesystem operation failed".to_string(),
            AppError::SerializationError(_) => "Malformed JSON payload".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
