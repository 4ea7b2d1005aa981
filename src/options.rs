//! Compile option sets
//!
//! Options are forwarded verbatim to the external compiler and folded into
//! the fingerprint through a canonical, key-sorted JSON rendering.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Option names the Stan toolchain understands
pub mod names {
    /// Directories searched for `#include` files
    pub const INCLUDE_PATHS: &str = "include_paths";
    /// Extra arguments passed to the C++ compiler
    pub const EXTRA_COMPILE_ARGS: &str = "extra_compile_args";
    /// Boost library location
    pub const BOOST_LIB: &str = "boost_lib";
    /// Eigen library location
    pub const EIGEN_LIB: &str = "eigen_lib";
    /// Replace the model name with a generated one
    pub const OBFUSCATE_MODEL_NAME: &str = "obfuscate_model_name";
    /// Verbose compiler output
    pub const VERBOSE: &str = "verbose";
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Absent / compiler default
    Null,
    /// Boolean switch
    Bool(bool),
    /// String value (paths, names)
    Str(String),
    /// List of strings (include paths, extra flags)
    List(Vec<String>),
}

impl OptionValue {
    /// Whether this value means "use the compiler default"
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Str(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Mapping from option name to value, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    values: BTreeMap<String, OptionValue>,
}

impl CompileOptions {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an option, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get an option value
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Remove an option
    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    /// Iterate over options in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no options are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Canonical textual form used for fingerprinting
    ///
    /// Compact JSON with sorted keys. `Null` entries are dropped, so an
    /// explicit default hashes the same as leaving the option out.
    pub fn canonical(&self) -> String {
        let effective: BTreeMap<&str, &OptionValue> = self
            .values
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
            .collect();

        // A map of strings to plain values cannot fail to serialize
        serde_json::to_string(&effective).unwrap_or_else(|_| String::from("{}"))
    }

    /// Render as command-line flags for an external compiler program
    pub fn to_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        for (name, value) in &self.values {
            let flag = format!("--{}", name.replace('_', "-"));
            match value {
                OptionValue::Null | OptionValue::Bool(false) => {}
                OptionValue::Bool(true) => flags.push(flag),
                OptionValue::Str(s) => flags.push(format!("{}={}", flag, s)),
                OptionValue::List(items) => {
                    flags.extend(items.iter().map(|item| format!("{}={}", flag, item)));
                }
            }
        }
        flags
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for CompileOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (k, v) in iter {
            options.set(k, v);
        }
        options
    }
}
