//! Script engine that runs chart scripts in an interpreter subprocess
//!
//! The script is written to the interpreter's stdin. The published context
//! travels through environment variables:
//!
//! - `ANF_INPUTS`: JSON array of input paths
//! - `ANF_PROPERTIES`: JSON object of chart properties
//! - `ANF_CHART_NAME`, `ANF_CHART_TYPE`
//! - `ANF_WANT_SHOW`: `1` if the caller wants the figure shown, else `0`
//! - `ANF_SHOW_REQUEST`: a path the script creates when it shows the figure
//! - `ANF_EXIT_STATUS`: a path the script writes its status code to when it
//!   exits on purpose
//!
//! The exit status file separates a deliberate `exit(n)` from a crash. A
//! non-zero status with the file present becomes [`ScriptExit::Exited`]; a
//! non-zero status without it is an unhandled failure, reported as
//! [`ScriptError::Raised`] carrying the tail of the interpreter's stderr.
//!
//! The default configuration runs `python3` with [`PYTHON_DRIVER`], which
//! implements this protocol: it records `SystemExit` codes, marks
//! `matplotlib.pyplot.show` calls, and shows the figure itself when
//! `ANF_WANT_SHOW` is set and the script did not. Other interpreters have to
//! follow the same protocol through their own prelude.
//!
//! The working directory is prepended to the configured search path
//! variable (`PYTHONPATH` by default) so scripts can import modules that
//! sit next to the analysis.

use super::engine::{ScriptEngine, ScriptEnv, ScriptError, ScriptExit, ScriptResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

pub const ENV_INPUTS: &str = "ANF_INPUTS";
pub const ENV_PROPERTIES: &str = "ANF_PROPERTIES";
pub const ENV_CHART_NAME: &str = "ANF_CHART_NAME";
pub const ENV_CHART_TYPE: &str = "ANF_CHART_TYPE";
pub const ENV_WANT_SHOW: &str = "ANF_WANT_SHOW";
pub const ENV_SHOW_REQUEST: &str = "ANF_SHOW_REQUEST";
pub const ENV_EXIT_STATUS: &str = "ANF_EXIT_STATUS";

/// Lines of stderr kept in the error of a failed script
const STDERR_TAIL_LINES: usize = 20;

/// Python program that reads a chart script from stdin and runs it
/// following the environment protocol of this module
pub const PYTHON_DRIVER: &str = r#"import os, sys

def _anf_mark(var, text=""):
    with open(os.environ[var], "w") as f:
        f.write(text)

try:
    import matplotlib.pyplot as _anf_plt
except ImportError:
    _anf_plt = None
else:
    _anf_plain_show = _anf_plt.show
    def _anf_show(*args, **kwargs):
        _anf_mark("ANF_SHOW_REQUEST")
        return _anf_plain_show(*args, **kwargs)
    _anf_plt.show = _anf_show

_anf_code = compile(sys.stdin.read(), os.environ.get("ANF_CHART_NAME") or "<chart>", "exec")
try:
    exec(_anf_code, {"__name__": "__main__"})
except SystemExit as e:
    if e.code is None:
        _anf_mark("ANF_EXIT_STATUS", "0")
    elif isinstance(e.code, int):
        _anf_mark("ANF_EXIT_STATUS", str(int(e.code)))
    else:
        _anf_mark("ANF_EXIT_STATUS", "1")
    raise

if (os.environ.get("ANF_WANT_SHOW") == "1" and _anf_plt is not None
        and not os.path.exists(os.environ["ANF_SHOW_REQUEST"])):
    _anf_plt.show()
"#;

/// Errors loading an engine configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid engine config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How to start the script interpreter
///
/// ```yaml
/// program: sh
/// args: []
/// search_path_var: PYTHONPATH
/// env:
///   LANG: C
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Environment variable listing module search directories
    pub search_path_var: String,
    /// Extra environment for the interpreter
    pub env: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-c".to_string(), PYTHON_DRIVER.to_string()],
            search_path_var: "PYTHONPATH".to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}

/// Runs each script in a fresh interpreter process
#[derive(Debug, Clone, Default)]
pub struct SubprocessEngine {
    config: EngineConfig,
}

impl SubprocessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn search_path(&self, env: &ScriptEnv<'_>) -> ScriptResult<std::ffi::OsString> {
        let inherited = std::env::var_os(&self.config.search_path_var);
        let paths: Vec<PathBuf> = env
            .search_paths()
            .iter()
            .cloned()
            .chain(inherited.iter().flat_map(std::env::split_paths))
            .collect();
        Ok(std::env::join_paths(paths)?)
    }
}

impl ScriptEngine for SubprocessEngine {
    fn execute(&self, script: &str, env: &mut ScriptEnv<'_>) -> ScriptResult<ScriptExit> {
        let marker_dir = tempfile::tempdir()?;
        let show_request = marker_dir.path().join("show");
        let exit_status = marker_dir.path().join("exit");

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .current_dir(env.working_dir())
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(&self.config.env)
            .env(ENV_INPUTS, serde_json::to_string(env.inputs())?)
            .env(ENV_PROPERTIES, serde_json::to_string(env.properties())?)
            .env(ENV_CHART_NAME, env.chart_name())
            .env(ENV_CHART_TYPE, env.chart_type().as_str())
            .env(ENV_WANT_SHOW, if env.display_requested() { "1" } else { "0" })
            .env(ENV_SHOW_REQUEST, &show_request)
            .env(ENV_EXIT_STATUS, &exit_status)
            .env(&self.config.search_path_var, self.search_path(env)?);

        let mut child = command.spawn().map_err(|source| ScriptError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;
        tracing::debug!(program = %self.config.program, pid = child.id(), "started script interpreter");

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(script.as_bytes()) {
                // the interpreter may exit before reading all of its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if show_request.exists() {
            env.show();
        }
        let requested = read_exit_status(&exit_status)?;

        match (output.status.code(), requested) {
            (None, _) => Err(ScriptError::Terminated),
            (Some(_), Some(code)) => Ok(ScriptExit::Exited(code)),
            (Some(0), None) => {
                if !stderr.trim().is_empty() {
                    tracing::warn!(chart = %env.chart_name(), stderr = %stderr.trim_end(), "script wrote to stderr");
                }
                Ok(ScriptExit::Completed)
            }
            (Some(code), None) => Err(ScriptError::Raised(failure_message(&stderr, code))),
        }
    }
}

/// Status code the script wrote to its exit status file, if any
fn read_exit_status(path: &Path) -> ScriptResult<Option<i32>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    text.trim()
        .parse()
        .map(Some)
        .map_err(|_| ScriptError::Raised(format!("invalid exit status '{}'", text.trim())))
}

/// Last lines of stderr, or the bare status when the script printed nothing
fn failure_message(stderr: &str, code: i32) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    if lines.iter().all(|l| l.trim().is_empty()) {
        return format!("script interpreter exited with status {code}");
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}
