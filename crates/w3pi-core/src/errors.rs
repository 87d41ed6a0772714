//! Error types for the W3Pi trigger.
//!
//! The per-event pipeline itself is a closed numeric transform and never fails;
//! errors only arise at its boundaries (configuration, model loading, input
//! framing, capacity checks).

use thiserror::Error;

/// Unified error type for all W3Pi operations.
///
/// Provides structured, actionable error messages with context.
#[derive(Error, Debug)]
pub enum W3piError {
    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// More candidates than the fixed-width array (or the configured sort width) can hold
    #[error("Capacity exceeded: {count} candidates for {capacity} slots")]
    CapacityExceeded { count: usize, capacity: usize },

    /// Score-model artifact errors (malformed trees, wrong feature count)
    #[error("Model error: {0}")]
    ModelError(String),

    /// Raw event dump framing errors
    #[error("Framing error: {0}")]
    FramingError(String),

    /// I/O errors (model files, dumps, telemetry)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl W3piError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        W3piError::ConfigError(message.into())
    }

    /// Creates a capacity error.
    pub fn capacity(count: usize, capacity: usize) -> Self {
        W3piError::CapacityExceeded { count, capacity }
    }

    /// Creates a model error.
    pub fn model(message: impl Into<String>) -> Self {
        W3piError::ModelError(message.into())
    }

    /// Creates a framing error.
    pub fn framing(message: impl Into<String>) -> Self {
        W3piError::FramingError(message.into())
    }

    /// Returns a user-friendly error message with actionable guidance.
    pub fn user_message(&self) -> String {
        match self {
            W3piError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n\
                     → Review the [ordering] and [isolation] tables of your config file.\n\
                     → block_count must be a power of two and block_count × block_size ≤ 216.",
                    msg
                )
            }
            W3piError::CapacityExceeded { count, capacity } => {
                format!(
                    "Capacity exceeded: {} candidates for {} slots\n\
                     → Events carry at most 216 candidates.\n\
                     → Use an ordering preset whose sort width covers the event.",
                    count, capacity
                )
            }
            W3piError::ModelError(msg) => {
                format!(
                    "Model error: {}\n\
                     → Check that the model JSON was exported for 11 input features.\n\
                     → Only single-output (binary) tree ensembles are supported.",
                    msg
                )
            }
            W3piError::FramingError(msg) => {
                format!(
                    "Framing error: {}\n\
                     → Verify the dump holds 64-bit little-endian header + candidate words.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for W3Pi operations.
pub type Result<T> = std::result::Result<T, W3piError>;
