//! Document model: analyses, folders, charts and their identifiers

mod analysis;
mod chart;
mod folder;
mod id;


pub use analysis::Analysis;
pub use chart::{Chart, ChartType, DialogPage, Properties};
pub use folder::{Folder, Item, ItemRef};
pub use id::{IdAllocator, ItemId};

use thiserror::Error;

/// Errors raised while building document items
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Wrong chart or folder id '{0}': ids are expected to be numeric strings")]
    InvalidIdentifier(String),

    #[error("Chart or folder id '{0}' is out of range")]
    IdentifierOutOfRange(String),

    #[error("Unknown chart type '{0}' (expected MATPLOTLIB, BAR, LINE or HISTOGRAM)")]
    InvalidChartType(String),
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
