//! Content fingerprints for model sources
//!
//! A fingerprint is the SHA256 digest of the whitespace-normalized model
//! source and the canonical option set. Reformatting a model does not change
//! its fingerprint; changing a compiler option does.

use crate::options::CompileOptions;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex digest identifying a (source, options) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex digest
    pub const LEN: usize = 64;

    /// Fingerprint a model source under the given options
    pub fn compute(source: &str, options: &CompileOptions) -> Self {
        let normalized = normalize_source(source);

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        // Canonical options are JSON and never contain a raw NUL
        hasher.update([0u8]);
        hasher.update(options.canonical().as_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// The full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Collapse whitespace runs to a single space and trim both ends
pub fn normalize_source(source: &str) -> String {
    source.split_whitespace().collect::<Vec<_>>().join(" ")
}
