//! Build command - compile a model or load it from the cache

use super::{open_store, read_source};
use crate::cache::{format_duration, BuildRequest};
use crate::cli::args::BuildArgs;
use crate::compiler::DEFAULT_MODEL_NAME;
use crate::config::Config;
use crate::error::StanCacheResult;
use crate::ui::{self, CompileSpinner, UiContext};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Execute the build command
pub fn execute(args: BuildArgs, config: &Config, cache_dir: &Path) -> StanCacheResult<()> {
    let ctx = UiContext::detect();
    let source = read_source(&args.file)?;
    let store = open_store(config, cache_dir)?;

    let request = BuildRequest {
        cache_file_name: Some(
            args.cache_file_name
                .unwrap_or_else(|| config.cache.file_template.clone()),
        ),
        recompile: args.recompile,
        model_name: args.model_name,
        options: args.model.to_options()?,
    };
    debug!("Model options: {:?}", request.options);

    let model_name = request
        .model_name
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

    let start = Instant::now();
    let spinner = CompileSpinner::start(&ctx, &model_name);
    let result = store.get_or_create(&source, &request);
    spinner.finish();
    let cached = result?;

    if cached.created {
        ui::step_ok_detail(
            &ctx,
            &format!("Model '{}' available", model_name),
            &format!("{} compilation time", format_duration(start.elapsed())),
        );
    } else {
        ui::step_ok_detail(
            &ctx,
            &format!("Model '{}' available", model_name),
            "got from cache",
        );
    }
    ui::key_value(&ctx, "entry", &cached.path.display().to_string());
    ui::key_value(&ctx, "fingerprint", cached.fingerprint.as_str());

    if args.emit {
        print!("{}", cached.artifact.code);
    }

    Ok(())
}
