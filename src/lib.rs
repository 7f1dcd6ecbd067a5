//! anfkit: Analysis documents and chart scripts
//!
//! Reads, edits and writes analysis (`.anf`) files, and runs the chart
//! scripts they contain.
//!
//! # Core Concepts
//!
//! - **Analysis**: input patterns plus a tree of folders and charts
//! - **Chart**: a named, typed script with properties and dialog pages
//! - **Workspace**: maps workspace paths like `/Project/results/*.sca` to files
//! - **ChartRunner**: executes chart scripts through a pluggable engine
//!
//! # Example
//!
//! ```
//! use anfkit::{Analysis, Chart, ChartType, IdAllocator, Item};
//!
//! let ids = IdAllocator::new();
//! let chart = Chart::new(ids.next_id(), ChartType::Line, "Delay").with_script("exit(0)\n");
//! let analysis = Analysis::with_items(&ids, ["/ProjectA/results/*.sca"], vec![Item::from(chart)]);
//!
//! let text = analysis.to_xml().unwrap();
//! let loaded = Analysis::from_xml_with(&text, &ids).unwrap();
//! assert_eq!(loaded.collect_charts()[0].name, "Delay");
//! ```

pub mod document;
pub mod format;
pub mod runner;
pub mod workspace;

pub use document::{
    Analysis, Chart, ChartType, DialogPage, DocumentError, DocumentResult, Folder, IdAllocator,
    Item, ItemId, ItemRef, Properties,
};
pub use format::{FormatError, FormatResult, FORMAT_VERSION};
pub use runner::{
    ChartRunner, DataExportOptions, EngineConfig, FigureBackend, ImageExportOptions, NullBackend,
    RunError, RunResult, ScriptEngine, ScriptEnv, ScriptError, ScriptExit, SubprocessEngine,
};
pub use workspace::{ResolveError, ResolveResult, Workspace, WorkspaceResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
