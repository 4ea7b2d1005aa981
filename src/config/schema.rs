//! Configuration schema for stancache
//!
//! Configuration is stored at `~/.config/stancache/config.toml`

use crate::cache::DEFAULT_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location and naming
    pub cache: CacheConfig,

    /// External compiler settings
    pub compiler: CompilerConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (defaults to the per-user cache location)
    pub dir: Option<PathBuf>,

    /// Entry file name template
    pub file_template: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// External compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler program
    pub program: String,

    /// Arguments placed before the generated ones
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "stanc".to_string(),
            args: Vec::new(),
        }
    }
}
