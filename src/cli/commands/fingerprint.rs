//! Fingerprint command - print the cache key of a model

use super::read_source;
use crate::cli::args::FingerprintArgs;
use crate::error::StanCacheResult;
use crate::fingerprint::Fingerprint;

/// Execute the fingerprint command
pub fn execute(args: FingerprintArgs) -> StanCacheResult<()> {
    let source = read_source(&args.file)?;
    let options = args.model.to_options()?;
    println!("{}", Fingerprint::compute(&source, &options));
    Ok(())
}
