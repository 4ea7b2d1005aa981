//! CLI command implementations

pub mod build;
pub mod clean;
pub mod config;
pub mod fingerprint;
pub mod list;

pub use build::execute as build;
pub use clean::execute as clean;
pub use config::execute as config;
pub use fingerprint::execute as fingerprint;
pub use list::execute as list;

use crate::cache::CacheStore;
use crate::compiler::CommandCompiler;
use crate::config::Config;
use crate::error::{StanCacheError, StanCacheResult};
use std::io::Read;
use std::path::Path;

/// Open the cache store described by the configuration
pub(crate) fn open_store(
    config: &Config,
    cache_dir: &Path,
) -> StanCacheResult<CacheStore<CommandCompiler>> {
    let compiler = CommandCompiler::new(&config.compiler.program)
        .with_args(config.compiler.args.iter().cloned());
    CacheStore::open(cache_dir, compiler)
}

/// Read model source from a file, or standard input for "-"
pub(crate) fn read_source(path: &Path) -> StanCacheResult<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| StanCacheError::io("reading model from standard input", e))?;
        return Ok(source);
    }

    std::fs::read_to_string(path)
        .map_err(|e| StanCacheError::io(format!("reading model {}", path.display()), e))
}
