//! CLI argument definitions using clap derive

use crate::error::{StanCacheError, StanCacheResult};
use crate::options::{names, CompileOptions, OptionValue};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// stancache - compiled Stan model cache
///
/// Compiles Stan models with an external compiler and reuses the result
/// whenever the same model source and options are seen again.
#[derive(Parser, Debug)]
#[command(name = "stancache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STANCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides the configured one)
    #[arg(long, global = true, env = "STANCACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a model, or load it from the cache
    Build(BuildArgs),

    /// Print the fingerprint of a model and options
    Fingerprint(FingerprintArgs),

    /// List cached models
    List(ListArgs),

    /// Remove every cached model
    Clean(CleanArgs),

    /// Print the cache directory
    Path,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Options that take part in compilation and fingerprinting
#[derive(Args, Debug, Default)]
pub struct ModelOptionArgs {
    /// Directory searched for #include files (repeatable)
    #[arg(long = "include-path", value_name = "DIR")]
    pub include_paths: Vec<String>,

    /// Extra argument for the C++ compiler (repeatable)
    #[arg(long = "extra-compile-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extra_compile_args: Vec<String>,

    /// Replace the model name with a generated one
    #[arg(long)]
    pub obfuscate_model_name: bool,

    /// Additional compiler option as KEY=VALUE (repeatable)
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

impl ModelOptionArgs {
    /// Collect the flags into a compile option set
    pub fn to_options(&self) -> StanCacheResult<CompileOptions> {
        let mut options = CompileOptions::new();

        if !self.include_paths.is_empty() {
            options.set(names::INCLUDE_PATHS, self.include_paths.clone());
        }
        if !self.extra_compile_args.is_empty() {
            options.set(names::EXTRA_COMPILE_ARGS, self.extra_compile_args.clone());
        }
        if self.obfuscate_model_name {
            options.set(names::OBFUSCATE_MODEL_NAME, true);
        }

        for raw in &self.options {
            let (key, value) = raw.split_once('=').ok_or_else(|| {
                StanCacheError::User(format!("Option {:?} must be KEY=VALUE", raw))
            })?;
            let key = key.trim().replace('-', "_");
            if key.is_empty() {
                return Err(StanCacheError::User(format!("Option {:?} has no key", raw)));
            }
            options.set(key, parse_option_value(value));
        }

        Ok(options)
    }
}

/// Interpret `true`/`false` as booleans and everything else as a string
fn parse_option_value(value: &str) -> OptionValue {
    match value {
        "true" => OptionValue::Bool(true),
        "false" => OptionValue::Bool(false),
        other => OptionValue::Str(other.to_string()),
    }
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Model source file ("-" reads standard input)
    pub file: PathBuf,

    /// Logical model name passed to the compiler
    #[arg(short = 'n', long)]
    pub model_name: Option<String>,

    /// Entry file name template using {digest} and {model_name}
    #[arg(long)]
    pub cache_file_name: Option<String>,

    /// Compile even if a cached model exists
    #[arg(short, long)]
    pub recompile: bool,

    /// Print the compiled code to standard output
    #[arg(long)]
    pub emit: bool,

    #[command(flatten)]
    pub model: ModelOptionArgs,
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Model source file ("-" reads standard input)
    pub file: PathBuf,

    #[command(flatten)]
    pub model: ModelOptionArgs,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one path per line)
    Plain,
}
