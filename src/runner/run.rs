//! ChartRunner: executes chart scripts in a scoped environment

use super::context::{execution_lock, ExecutionContext, WorkingDirGuard};
use super::display::{DisplayHook, FigureBackend, NullBackend};
use super::engine::{ScriptEngine, ScriptEnv, ScriptExit};
use super::{RunError, RunResult};
use crate::document::{Analysis, Chart, Properties};
use crate::workspace::{ResolveResult, WorkspaceResolver};
use std::path::{Path, PathBuf};

/// Runs chart scripts one at a time
///
/// Each run publishes the analysis inputs and chart properties into the
/// runner's [`ExecutionContext`], switches the process working directory,
/// and hands the script to the [`ScriptEngine`]. The working directory and
/// the context are restored on every exit path.
pub struct ChartRunner {
    engine: Box<dyn ScriptEngine>,
    display: DisplayHook,
    context: ExecutionContext,
}

impl ChartRunner {
    /// Create a runner that draws nothing
    pub fn new(engine: impl ScriptEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            display: DisplayHook::new(Box::new(NullBackend)),
            context: ExecutionContext::default(),
        }
    }

    /// Use the given plotting backend
    pub fn with_backend(mut self, backend: impl FigureBackend + 'static) -> Self {
        self.display = DisplayHook::new(Box::new(backend));
        self
    }

    /// The published context; empty unless a run is in progress
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Run a chart script.
    ///
    /// `extra_properties` override same-named chart properties. With
    /// `want_display`, the figure is shown after a successful run unless the
    /// script already showed it.
    pub fn run(
        &mut self,
        analysis: &Analysis,
        chart: &Chart,
        working_dir: &Path,
        resolver: &dyn WorkspaceResolver,
        extra_properties: &Properties,
        want_display: bool,
    ) -> RunResult<()> {
        if !working_dir.is_absolute() {
            return Err(RunError::RelativeWorkingDir(working_dir.to_path_buf()));
        }
        let _lock = execution_lock();

        let inputs = analysis
            .inputs
            .iter()
            .map(|pattern| resolver.resolve(pattern))
            .collect::<ResolveResult<Vec<PathBuf>>>()?;

        let mut properties = chart.properties.clone();
        properties.extend(
            extra_properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        tracing::debug!(
            chart = %chart.name,
            id = %chart.id,
            working_dir = %working_dir.display(),
            inputs = inputs.len(),
            "running chart script"
        );

        self.display.reset();

        let context = self.context.publish(ExecutionContext::for_run(
            chart,
            inputs,
            properties,
            working_dir,
            want_display,
        ));

        let cwd = WorkingDirGuard::enter(working_dir).map_err(|source| RunError::WorkingDir {
            path: working_dir.to_path_buf(),
            source,
        })?;

        let outcome = self
            .engine
            .execute(&chart.script, &mut ScriptEnv::new(&context, &mut self.display));

        drop(cwd);
        drop(context);

        match outcome? {
            ScriptExit::Completed | ScriptExit::Exited(0) => {}
            ScriptExit::Exited(code) => {
                return Err(RunError::ScriptFailure {
                    chart: chart.name.clone(),
                    code,
                })
            }
        }

        if want_display && !self.display.was_shown() {
            tracing::debug!(chart = %chart.name, "showing figure on behalf of script");
            self.display.show();
        }
        Ok(())
    }
}
