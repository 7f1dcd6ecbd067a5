//! Figure backends and display instrumentation

/// The plotting library as seen by the runner
pub trait FigureBackend {
    /// Discard the current figure
    fn clear_figure(&mut self);

    /// Display the current figure
    fn show(&mut self);
}

/// Backend that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl FigureBackend for NullBackend {
    fn clear_figure(&mut self) {
        tracing::trace!("clear figure (no backend)");
    }

    fn show(&mut self) {
        tracing::debug!("show figure (no backend)");
    }
}

/// Wraps a backend and records whether `show` was called during a run
pub(crate) struct DisplayHook {
    backend: Box<dyn FigureBackend>,
    shown: bool,
}

impl DisplayHook {
    pub(crate) fn new(backend: Box<dyn FigureBackend>) -> Self {
        Self {
            backend,
            shown: false,
        }
    }

    /// Clear the figure and forget earlier `show` calls
    pub(crate) fn reset(&mut self) {
        self.backend.clear_figure();
        self.shown = false;
    }

    pub(crate) fn show(&mut self) {
        self.backend.show();
        self.shown = true;
    }

    pub(crate) fn was_shown(&self) -> bool {
        self.shown
    }
}
