//! External model compiler
//!
//! The cache treats compilation as opaque: a compiler turns model source and
//! options into a serializable artifact, or fails with its own error type.

use crate::options::CompileOptions;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Model name used when the caller does not supply one
pub const DEFAULT_MODEL_NAME: &str = "anon_model";

/// Turns model source into a compiled artifact
pub trait ModelCompiler {
    /// The compiled artifact stored in the cache
    type Artifact: Serialize + DeserializeOwned;

    /// Compiler-specific failure, propagated to callers unchanged
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compile `source` as a model called `model_name`
    fn compile(
        &self,
        source: &str,
        model_name: &str,
        options: &CompileOptions,
    ) -> Result<Self::Artifact, Self::Error>;
}

/// Artifact produced by [`CommandCompiler`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledModel {
    /// Logical model name stamped at compile time
    pub model_name: String,
    /// Program that produced the model
    pub compiler: String,
    /// Generated code (the compiler's standard output)
    pub code: String,
    /// When the model was compiled
    pub compiled_at: DateTime<Utc>,
}

/// Errors from running an external compiler program
#[derive(Debug, Error)]
pub enum CommandCompilerError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage model source: {0}")]
    Stage(#[source] std::io::Error),

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} produced non-UTF-8 output")]
    InvalidOutput { program: String },
}

/// Compiles models by running an external program such as `stanc`
///
/// The program is invoked as
/// `<program> <args..> --name=<model_name> <option flags..> <source.stan>`
/// and its standard output becomes the artifact's code.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompiler {
    /// Create a compiler for the given program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Leading arguments passed before the generated ones
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Program name for messages
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new("stanc")
    }
}

impl ModelCompiler for CommandCompiler {
    type Artifact = CompiledModel;
    type Error = CommandCompilerError;

    fn compile(
        &self,
        source: &str,
        model_name: &str,
        options: &CompileOptions,
    ) -> Result<CompiledModel, CommandCompilerError> {
        let program = self.program_name();

        let mut staged = tempfile::Builder::new()
            .prefix("stancache-")
            .suffix(".stan")
            .tempfile()
            .map_err(CommandCompilerError::Stage)?;
        staged
            .write_all(source.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(CommandCompilerError::Stage)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(format!("--name={}", model_name))
            .args(options.to_flags())
            .arg(staged.path());

        debug!("Running compiler: {:?}", cmd);

        let output = cmd.output().map_err(|e| CommandCompilerError::Spawn {
            program: program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(CommandCompilerError::Failed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let code = String::from_utf8(output.stdout)
            .map_err(|_| CommandCompilerError::InvalidOutput {
                program: program.clone(),
            })?;

        Ok(CompiledModel {
            model_name: model_name.to_string(),
            compiler: program,
            code,
            compiled_at: Utc::now(),
        })
    }
}
