//! Running chart scripts
//!
//! Chart scripts are opaque payloads executed by a [`ScriptEngine`]. The
//! [`ChartRunner`] sets up what a script can see (resolved inputs, chart
//! name and type, effective properties), switches into the working
//! directory, and interprets the outcome. Only one chart runs at a time per
//! process.

mod context;
mod display;
mod engine;
mod export;
mod run;
mod subprocess;

pub use context::ExecutionContext;
pub use display::{FigureBackend, NullBackend};
pub use engine::{FnEngine, ScriptEngine, ScriptEnv, ScriptError, ScriptExit, ScriptResult};
pub use export::{
    data_export_filepath, image_export_filepath, sanitize_filename, DataExportOptions, ExportKind,
    ImageExportOptions,
};
pub use run::ChartRunner;
pub use subprocess::{ConfigError, EngineConfig, SubprocessEngine, PYTHON_DRIVER};

/// Property names understood by exporting chart scripts
pub mod props {
    pub use super::export::{
        DATA_EXPORT_FILENAME, DATA_EXPORT_FOLDER, DATA_EXPORT_FORMAT, EXPORT_DATA, EXPORT_IMAGE,
        IMAGE_EXPORT_DPI, IMAGE_EXPORT_FILENAME, IMAGE_EXPORT_FOLDER, IMAGE_EXPORT_FORMAT,
        IMAGE_EXPORT_HEIGHT, IMAGE_EXPORT_WIDTH,
    };
}

/// Environment variables set by [`SubprocessEngine`]
pub mod env_vars {
    pub use super::subprocess::{
        ENV_CHART_NAME, ENV_CHART_TYPE, ENV_EXIT_STATUS, ENV_INPUTS, ENV_PROPERTIES,
        ENV_SHOW_REQUEST, ENV_WANT_SHOW,
    };
}

use crate::workspace::ResolveError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a chart
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Working directory must be an absolute path: {}", .0.display())]
    RelativeWorkingDir(PathBuf),

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error("Cannot enter working directory {}: {source}", .path.display())]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chart script of '{chart}' exited with code {code}")]
    ScriptFailure { chart: String, code: i32 },

    #[error("Chart script failed: {0}")]
    ScriptExecution(#[from] ScriptError),

    #[error("Chart script silently failed to create {kind} file '{}'", .path.display())]
    ExportFailure { kind: ExportKind, path: PathBuf },
}

/// Result type for chart runs
pub type RunResult<T> = Result<T, RunError>;
