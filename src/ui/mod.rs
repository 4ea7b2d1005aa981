//! Terminal output for the stancache CLI
//!
//! Uses `cliclack` for styled steps and prompts and `indicatif` for the
//! compile spinner, falling back to plain lines when not attached to a
//! terminal (CI, pipes, tests).

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{key_value, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::CompileSpinner;
pub use prompts::confirm;
