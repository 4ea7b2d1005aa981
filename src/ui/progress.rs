//! Compile spinner with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a model is loaded or compiled
///
/// Compilation can take minutes; in a terminal an indicatif spinner with
/// elapsed time is shown, otherwise a single plain line is printed.
pub struct CompileSpinner {
    bar: Option<ProgressBar>,
}

impl CompileSpinner {
    /// Start the spinner for the given model
    pub fn start(ctx: &UiContext, model_name: &str) -> Self {
        let bar = if ctx.is_interactive() {
            let bar = ProgressBar::new_spinner();
            if let Ok(spinner_style) =
                ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}  {elapsed:.dim}")
            {
                bar.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
            }
            bar.set_message(format!("Preparing model {}", model_name));
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            eprintln!("{} Preparing model {}", style("...").dim(), model_name);
            None
        };
        Self { bar }
    }

    /// Stop and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl Drop for CompileSpinner {
    fn drop(&mut self) {
        self.finish();
    }
}
