//! Script engine contract
//!
//! The runner does not know how chart scripts are executed. An engine gets
//! the script text and a [`ScriptEnv`] giving read access to the published
//! context and the instrumented display entry point.

use super::context::ExecutionContext;
use super::display::DisplayHook;
use crate::document::{ChartType, Properties};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a script run ended, short of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptExit {
    /// The script ran to its end
    Completed,
    /// The script terminated itself with a status code (0 means success)
    Exited(i32),
}

/// Failures raised while a script runs
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to start script interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("script was terminated by a signal")]
    Terminated,

    #[error("cannot encode script environment: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid script search path: {0}")]
    SearchPath(#[from] std::env::JoinPathsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Raised(String),
}

/// Result type for script engines
pub type ScriptResult<T> = Result<T, ScriptError>;

/// What a running script can see and do
pub struct ScriptEnv<'a> {
    context: &'a ExecutionContext,
    display: &'a mut DisplayHook,
}

impl<'a> ScriptEnv<'a> {
    pub(crate) fn new(context: &'a ExecutionContext, display: &'a mut DisplayHook) -> Self {
        Self { context, display }
    }

    /// Resolved input paths
    pub fn inputs(&self) -> &[PathBuf] {
        &self.context.inputs
    }

    pub fn properties(&self) -> &Properties {
        &self.context.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.context.properties.get(key).map(String::as_str)
    }

    pub fn chart_name(&self) -> &str {
        &self.context.chart_name
    }

    pub fn chart_type(&self) -> ChartType {
        self.context.chart_type
    }

    pub fn working_dir(&self) -> &Path {
        &self.context.working_dir
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.context.search_paths
    }

    /// Whether the caller wants the figure shown after a successful run
    pub fn display_requested(&self) -> bool {
        self.context.want_display
    }

    /// Display the current figure. The runner will not show it again.
    pub fn show(&mut self) {
        self.display.show();
    }
}

/// Executes chart scripts
pub trait ScriptEngine {
    /// Run `script` to completion or early exit.
    ///
    /// The process working directory is already set to
    /// [`ScriptEnv::working_dir`] when this is called.
    fn execute(&self, script: &str, env: &mut ScriptEnv<'_>) -> ScriptResult<ScriptExit>;
}

/// Engine backed by a Rust closure, for charts drawn in-process
pub struct FnEngine<F>(F);

impl<F> FnEngine<F>
where
    F: Fn(&str, &mut ScriptEnv<'_>) -> ScriptResult<ScriptExit>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ScriptEngine for FnEngine<F>
where
    F: Fn(&str, &mut ScriptEnv<'_>) -> ScriptResult<ScriptExit>,
{
    fn execute(&self, script: &str, env: &mut ScriptEnv<'_>) -> ScriptResult<ScriptExit> {
        (self.0)(script, env)
    }
}
