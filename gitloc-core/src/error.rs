//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type GitlocResult<T> = Result<T, GitlocError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for gitloc
#[derive(Error, Debug)]
pub enum GitlocError {
    #[error("Repository not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Access forbidden or rate limited: {message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Repository {repository} is empty")]
    EmptyRepository {
        repository: String,
        context: ErrorContext,
    },

    #[error("Failed to fetch repository metadata: {message}")]
    MetadataFetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("{}", download_exhausted_message(.attempts, .last_status, .last_error))]
    DownloadExhausted {
        attempts: usize,
        /// HTTP status of the last attempt; `None` when it failed below HTTP
        last_status: Option<u16>,
        last_error: String,
        context: ErrorContext,
    },

    #[error("Corrupted download: {message}")]
    CorruptedPayload {
        message: String,
        context: ErrorContext,
    },

    #[error("Failed to decode archive: {message}")]
    ArchiveDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Unsupported action: {action}")]
    UnsupportedAction {
        action: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Turns the last download failure into guidance text.
///
/// A 400 from the archive hosts almost always means the repository is private,
/// does not exist, or the branch guess was wrong; a 404 means nothing was there.
fn download_exhausted_message(attempts: &usize, last_status: &Option<u16>, last_error: &str) -> String {
    match last_status {
        Some(400) => format!(
            "Failed to download repository archive after {} attempts: Bad Request. \
             The repository is likely private, nonexistent, or on an unexpected branch \
             (check visibility, branch or relay). Last error: {}",
            attempts, last_error
        ),
        Some(404) => format!(
            "Failed to download repository archive after {} attempts: archive not found. \
             Last error: {}",
            attempts, last_error
        ),
        _ => format!(
            "Failed to download repository archive after {} attempts. Last error: {}",
            attempts, last_error
        ),
    }
}

const PUBLIC_OR_PROXY_HINT: &str = " Hint: check if the repository is public, or configure a proxy.";
const CHECK_URL_HINT: &str = " Hint: check the repository URL and try again.";

impl GitlocError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GitlocError::NotFound { context, .. } => Some(context),
            GitlocError::Forbidden { context, .. } => Some(context),
            GitlocError::EmptyRepository { context, .. } => Some(context),
            GitlocError::MetadataFetch { context, .. } => Some(context),
            GitlocError::DownloadExhausted { context, .. } => Some(context),
            GitlocError::CorruptedPayload { context, .. } => Some(context),
            GitlocError::ArchiveDecode { context, .. } => Some(context),
            GitlocError::Network { context, .. } => Some(context),
            GitlocError::Config { context, .. } => Some(context),
            GitlocError::Storage { context, .. } => Some(context),
            GitlocError::Validation { context, .. } => Some(context),
            GitlocError::UnsupportedAction { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GitlocError::Network { .. }
                | GitlocError::Forbidden { .. }
                | GitlocError::DownloadExhausted { .. }
        )
    }

    /// Caller-facing message. Never empty.
    pub fn user_message(&self) -> String {
        let mut message = self.to_string();
        if message.trim().is_empty() {
            message = "Unknown error while counting lines".to_string();
        }

        match self {
            GitlocError::DownloadExhausted {
                last_status: Some(400),
                ..
            } => message.push_str(PUBLIC_OR_PROXY_HINT),
            GitlocError::NotFound { .. }
            | GitlocError::DownloadExhausted {
                last_status: Some(404),
                ..
            } => message.push_str(CHECK_URL_HINT),
            _ => {}
        }

        message
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            GitlocError::Config { .. } | GitlocError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            GitlocError::Network { .. }
            | GitlocError::Forbidden { .. }
            | GitlocError::DownloadExhausted { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GitlocError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'gitloc config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GitlocError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::GitlocError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GitlocError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}
