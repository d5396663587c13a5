//! Error types for toolchain discovery.

use std::path::PathBuf;

/// Errors that can occur while locating or configuring the toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// A registry key, directory or environment variable required by the
    /// toolchain could not be found.
    #[error("{0}")]
    Platform(String),

    /// The batch script ran but its exported environment could not be used.
    #[error("{0}")]
    ValueParse(String),

    /// A required process environment variable is not set.
    #[error("environment variable `{name}` is not set")]
    MissingEnv {
        /// Name of the missing variable.
        name: String,
    },

    /// I/O error, e.g. while spawning the batch script.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read.
    #[error("config error at {}: {detail}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Description of the failure.
        detail: String,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolchainError {
    /// Construct a [`ToolchainError::Platform`] from any message.
    pub fn platform(message: impl Into<String>) -> Self {
        ToolchainError::Platform(message.into())
    }
}

/// Errors returned by a [`Registry`](crate::registry::Registry) lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The key or the value under it does not exist.
    #[error("registry value not found: {key}\\{name}")]
    NotFound { key: String, name: String },
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
