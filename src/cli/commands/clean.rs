//! Clean command - remove every cached model

use super::open_store;
use crate::cli::args::CleanArgs;
use crate::config::Config;
use crate::error::StanCacheResult;
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the clean command
pub fn execute(args: CleanArgs, config: &Config, cache_dir: &Path) -> StanCacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let store = open_store(config, cache_dir)?;

    let count = store.entries()?.len();
    if count > 0 {
        let prompt = format!(
            "Remove {} cached model(s) from {}?",
            count,
            store.root().display()
        );
        if !ui::confirm(&ctx, &prompt, false)? {
            ui::step_warn_hint(&ctx, "Aborted", "Use --yes to skip the prompt");
            return Ok(());
        }
    }

    // Also sweeps staged writes and empty directories that entries() skips
    store.clear()?;
    if count == 0 {
        ui::step_info(&ctx, "No cached models to clear.");
    } else {
        ui::step_ok(&ctx, &format!("Cleared {} cached model(s)", count));
    }
    Ok(())
}
