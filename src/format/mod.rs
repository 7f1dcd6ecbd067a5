//! The analysis (`.anf`) file format
//!
//! Analyses are stored as XML:
//!
//! ```text
//! <analysis version="2">
//!     <inputs>
//!         <input pattern="/Project/results/*.sca"/>
//!     </inputs>
//!     <charts>
//!         <folder id="1" name="Scalars">
//!             <chart id="2" type="BAR" name="Throughput">
//!                 <script><![CDATA[...]]></script>
//!                 <dialogPage id="main" label="Main"><![CDATA[...]]></dialogPage>
//!                 <property name="title" value="..."/>
//!             </chart>
//!         </folder>
//!     </charts>
//! </analysis>
//! ```

mod read;
mod write;

pub use read::parse_analysis;
pub use write::{escape_attribute, write_analysis};

use crate::document::{Analysis, DocumentError, IdAllocator};
use std::path::Path;
use thiserror::Error;

/// The only file format version understood
pub const FORMAT_VERSION: &str = "2";

pub(crate) const ROOT_TAG: &str = "analysis";
pub(crate) const INPUTS_TAG: &str = "inputs";
pub(crate) const INPUT_TAG: &str = "input";
pub(crate) const CHARTS_TAG: &str = "charts";
pub(crate) const FOLDER_TAG: &str = "folder";
pub(crate) const CHART_TAG: &str = "chart";
pub(crate) const SCRIPT_TAG: &str = "script";
pub(crate) const DIALOG_PAGE_TAG: &str = "dialogPage";
pub(crate) const PROPERTY_TAG: &str = "property";

/// Errors that can occur while reading or writing analysis files
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("XML write error: {0}")]
    Write(#[from] quick_xml::Error),

    #[error("Unsupported analysis file version: {} (only \"2\" is supported)", quoted_version(.0))]
    UnsupportedVersion(Option<String>),

    #[error("Expected <analysis> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Missing <{0}> element")]
    MissingElement(&'static str),

    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Duplicate chart or folder id '{0}'")]
    DuplicateIdentifier(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn quoted_version(version: &Option<String>) -> String {
    match version {
        Some(v) => format!("\"{v}\""),
        None => "none".to_string(),
    }
}

/// Result type for format operations
pub type FormatResult<T> = Result<T, FormatError>;

impl Analysis {
    /// Parse analysis file content, drawing ids from the shared allocator
    pub fn from_xml(text: &str) -> FormatResult<Self> {
        parse_analysis(text, IdAllocator::shared())
    }

    /// Parse analysis file content with an explicit allocator
    pub fn from_xml_with(text: &str, ids: &IdAllocator) -> FormatResult<Self> {
        parse_analysis(text, ids)
    }

    /// Serialize to analysis file content
    pub fn to_xml(&self) -> FormatResult<String> {
        write_analysis(self)
    }

    /// Read an `.anf` file, drawing ids from the shared allocator
    pub fn from_anf_file(path: impl AsRef<Path>) -> FormatResult<Self> {
        Self::from_anf_file_with(path, IdAllocator::shared())
    }

    /// Read an `.anf` file with an explicit allocator
    pub fn from_anf_file_with(path: impl AsRef<Path>, ids: &IdAllocator) -> FormatResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let analysis = parse_analysis(&text, ids)?;
        tracing::info!(
            path = %path.display(),
            inputs = analysis.inputs.len(),
            charts = analysis.collect_charts().len(),
            "loaded analysis"
        );
        Ok(analysis)
    }

    /// Save to an `.anf` file, replacing its content
    pub fn to_anf_file(&self, path: impl AsRef<Path>) -> FormatResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_xml()?)?;
        tracing::info!(path = %path.display(), "saved analysis");
        Ok(())
    }
}
