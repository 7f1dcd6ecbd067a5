//! Execution context shared with chart scripts, and the scoped guards
//! that publish it and switch the working directory

use crate::document::{Chart, ChartType, Properties};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes chart runs across the process; the working directory is global
static EXECUTION_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn execution_lock() -> MutexGuard<'static, ()> {
    EXECUTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State published to a chart script for the duration of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    /// Filesystem paths (or globs) of the analysis inputs
    pub inputs: Vec<PathBuf>,
    pub chart_name: String,
    pub chart_type: ChartType,
    /// Chart properties overlaid with caller-supplied extras
    pub properties: Properties,
    pub working_dir: PathBuf,
    /// Directories the script may load its own modules from
    pub search_paths: Vec<PathBuf>,
    /// The caller wants the figure shown once the script succeeds
    pub want_display: bool,
    published: bool,
}

impl ExecutionContext {
    /// Context for one run of `chart`; not published yet
    pub(crate) fn for_run(
        chart: &Chart,
        inputs: Vec<PathBuf>,
        properties: Properties,
        working_dir: &Path,
        want_display: bool,
    ) -> Self {
        Self {
            inputs,
            chart_name: chart.name.clone(),
            chart_type: chart.chart_type,
            properties,
            working_dir: working_dir.to_path_buf(),
            search_paths: vec![working_dir.to_path_buf()],
            want_display,
            published: false,
        }
    }

    /// Whether a run is currently in progress
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Fill in the context; everything is cleared again when the guard drops
    pub(crate) fn publish(&mut self, published: ExecutionContext) -> PublishGuard<'_> {
        *self = ExecutionContext {
            published: true,
            ..published
        };
        PublishGuard { context: self }
    }
}

/// Keeps the context published; clears it on drop
pub(crate) struct PublishGuard<'a> {
    context: &'a mut ExecutionContext,
}

impl Deref for PublishGuard<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        *self.context = ExecutionContext::default();
    }
}

/// Switches the process working directory; restores the original on drop
#[derive(Debug)]
pub(crate) struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    pub(crate) fn enter(dir: &Path) -> std::io::Result<Self> {
        let original = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        Ok(Self { original })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.original) {
            tracing::error!(
                dir = %self.original.display(),
                error = %e,
                "failed to restore working directory"
            );
        }
    }
}
