//! Charts and their dialog pages

use super::id::ItemId;
use super::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Chart properties, kept sorted so saved files are stable
pub type Properties = BTreeMap<String, String>;

/// Kind of chart, as stored in the `type` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChartType {
    /// Generic plot drawn entirely by the script
    #[default]
    Matplotlib,
    Bar,
    Line,
    Histogram,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Matplotlib,
        ChartType::Bar,
        ChartType::Line,
        ChartType::Histogram,
    ];

    /// Name used in the file format
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Matplotlib => "MATPLOTLIB",
            ChartType::Bar => "BAR",
            ChartType::Line => "LINE",
            ChartType::Histogram => "HISTOGRAM",
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DocumentError::InvalidChartType(s.to_string()))
    }
}

/// A page of the chart properties dialog.
///
/// The id is free-form and not drawn from the item allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogPage {
    pub id: Option<String>,
    /// Tab label shown by the editor
    pub label: String,
    /// Page markup
    pub content: String,
}

impl DialogPage {
    pub fn new(id: Option<String>, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            content: content.into(),
        }
    }
}

/// A chart: a named, typed script plus the properties it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: ItemId,
    pub name: String,
    pub chart_type: ChartType,
    pub template: Option<String>,
    pub icon: Option<String>,
    pub script: String,
    pub dialog_pages: Vec<DialogPage>,
    pub properties: Properties,
}

impl Chart {
    /// Create an empty chart
    pub fn new(id: ItemId, chart_type: ChartType, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            chart_type,
            template: None,
            icon: None,
            script: String::new(),
            dialog_pages: Vec::new(),
            properties: Properties::new(),
        }
    }

    /// Create a chart from a type name as found in a file.
    ///
    /// Fails with [`DocumentError::InvalidChartType`] for unknown types.
    pub fn try_new(
        id: ItemId,
        type_name: &str,
        name: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        Ok(Self::new(id, type_name.parse()?, name))
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_dialog_page(mut self, page: DialogPage) -> Self {
        self.dialog_pages.push(page);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.properties.insert(key.into(), value.to_string());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
