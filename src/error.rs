//! Error types for stancache
//!
//! All modules use `StanCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stancache operations
pub type StanCacheResult<T> = Result<T, StanCacheError>;

/// All errors that can occur in stancache
#[derive(Error, Debug)]
pub enum StanCacheError {
    // Invocation errors
    #[error("Invalid cache file name template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    // Compiler errors
    #[error("Model compilation failed: {0}")]
    Compile(#[source] Box<dyn std::error::Error + Send + Sync>),

    // Storage errors
    #[error("Could not determine a per-user cache directory")]
    CacheDirUnavailable,

    #[error("Failed to serialize compiled model: {reason}")]
    Serialize { reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl StanCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid template error
    pub fn template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an external compiler error without altering it
    pub fn compile<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Compile(Box::new(source))
    }

    /// Borrow the compiler's own error, if this is a compilation failure
    /// raised by a compiler of error type `E`
    pub fn compile_error<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Compile(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidTemplate { .. } => {
                Some("Templates may only use {digest} and {model_name}, e.g. model-{digest}.bin")
            }
            Self::CacheDirUnavailable => Some("Pass --cache-dir or set STANCACHE_DIR"),
            Self::Compile(_) => Some("Check the model source and the compiler settings"),
            Self::ConfigInvalid { .. } => Some("Run: stancache config show"),
            _ => None,
        }
    }
}
