//! stancache - compiled model cache
//!
//! Compiles Stan models through an external compiler and keeps the results
//! in a per-user cache directory, keyed by a fingerprint of the
//! whitespace-normalized source and the compile options.

pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod options;
pub mod ui;

pub use cache::{BuildRequest, CacheStore, Cached};
pub use compiler::{CommandCompiler, CompiledModel, ModelCompiler};
pub use error::{StanCacheError, StanCacheResult};
pub use fingerprint::Fingerprint;
pub use options::{CompileOptions, OptionValue};
