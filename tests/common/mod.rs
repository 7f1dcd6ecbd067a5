//! Shared helpers for integration tests
//!
//! `ToyEngine` understands a tiny line-oriented script language, enough to
//! drive the runner through every outcome:
//!
//! - `exit(N)`: terminate with status N
//! - `show()`: show the figure
//! - `fail(message)`: raise an error
//! - `panic()`: panic inside the engine
//! - `export_if_needed()`: write the image/data file the export properties ask for
//! - `record_cwd(file)`: write the current directory into `file`
//! - `record_properties(file)`: write the properties as JSON into `file`
//!
//! Blank lines and lines starting with `#` are ignored.

#![allow(dead_code)]

use anfkit::runner::{data_export_filepath, image_export_filepath, props};
use anfkit::{FigureBackend, ScriptEngine, ScriptEnv, ScriptError, ScriptExit, Workspace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

pub struct ToyEngine;

fn argument<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    line.strip_prefix(command)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn io_error(e: std::io::Error) -> ScriptError {
    ScriptError::Io(e)
}

impl ScriptEngine for ToyEngine {
    fn execute(&self, script: &str, env: &mut ScriptEnv<'_>) -> Result<ScriptExit, ScriptError> {
        for line in script.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(code) = argument(line, "exit") {
                let code = code
                    .parse()
                    .map_err(|_| ScriptError::Raised(format!("bad exit code: {}", code)))?;
                return Ok(ScriptExit::Exited(code));
            } else if line == "show()" {
                env.show();
            } else if let Some(message) = argument(line, "fail") {
                return Err(ScriptError::Raised(message.to_string()));
            } else if line == "panic()" {
                panic!("chart script panicked");
            } else if line == "export_if_needed()" {
                let props = env.properties().clone();
                let mut targets = Vec::new();
                if props.get(props::EXPORT_IMAGE).map(String::as_str) == Some("true") {
                    targets.push(image_export_filepath(&props, env.chart_name()));
                }
                if props.get(props::EXPORT_DATA).map(String::as_str) == Some("true") {
                    targets.push(data_export_filepath(&props, env.chart_name()));
                }
                for target in targets {
                    let path = env.working_dir().join(target);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).map_err(io_error)?;
                    }
                    std::fs::write(&path, "exported\n").map_err(io_error)?;
                }
            } else if let Some(file) = argument(line, "record_cwd") {
                let cwd = std::env::current_dir().map_err(io_error)?;
                std::fs::write(file, cwd.to_string_lossy().as_bytes()).map_err(io_error)?;
            } else if let Some(file) = argument(line, "record_properties") {
                let json = serde_json::to_string(env.properties())?;
                std::fs::write(file, json).map_err(io_error)?;
            } else {
                return Err(ScriptError::Raised(format!("unknown statement: {}", line)));
            }
        }
        Ok(ScriptExit::Completed)
    }
}

/// Figure backend that records every call
#[derive(Clone, Default)]
pub struct RecordingBackend {
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl RecordingBackend {
    pub fn shows(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == "show").count()
    }

    pub fn clears(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == "clear").count()
    }
}

impl FigureBackend for RecordingBackend {
    fn clear_figure(&mut self) {
        self.calls.borrow_mut().push("clear");
    }

    fn show(&mut self) {
        self.calls.borrow_mut().push("show");
    }
}

/// A workspace directory holding the given (empty) project directories
pub fn workspace_with(projects: &[&str]) -> (TempDir, Workspace) {
    let dir = TempDir::new().expect("create workspace dir");
    for project in projects {
        std::fs::create_dir_all(dir.path().join(project)).expect("create project dir");
    }
    let workspace = Workspace::new(dir.path(), HashMap::new()).expect("open workspace");
    (dir, workspace)
}

/// Read a file written by a toy script
pub fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("read script output")
}

static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Serialize tests that look at the process working directory
pub fn serial() -> std::sync::MutexGuard<'static, ()> {
    SERIAL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
