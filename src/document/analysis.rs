//! Analysis: the document root

use super::chart::Chart;
use super::folder::{Folder, Item, ItemRef};
use super::id::{IdAllocator, ItemId};
use serde::{Deserialize, Serialize};

/// Contents of an analysis file: input patterns and a tree of charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Workspace-relative path globs of the result files
    pub inputs: Vec<String>,
    /// Unnamed root of the chart tree; its id is never saved
    pub root_folder: Folder,
}

impl Analysis {
    /// Create an empty analysis
    pub fn new(ids: &IdAllocator) -> Self {
        Self {
            inputs: Vec::new(),
            root_folder: Folder::new(ids.next_id(), ""),
        }
    }

    /// Create an analysis from inputs and top-level items
    pub fn with_items(
        ids: &IdAllocator,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        items: impl IntoIterator<Item = Item>,
    ) -> Self {
        let mut root_folder = Folder::new(ids.next_id(), "");
        root_folder.items.extend(items);
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            root_folder,
        }
    }

    pub fn with_input(mut self, pattern: impl Into<String>) -> Self {
        self.inputs.push(pattern.into());
        self
    }

    /// All charts in the analysis, depth-first in document order
    pub fn collect_charts(&self) -> Vec<&Chart> {
        self.root_folder.collect_charts()
    }

    pub fn find_chart(&self, id: &ItemId) -> Option<&Chart> {
        self.root_folder.find_chart(id)
    }

    pub fn find_chart_mut(&mut self, id: &ItemId) -> Option<&mut Chart> {
        self.root_folder.find_chart_mut(id)
    }

    /// Charts with the given name, in document order
    pub fn find_charts_by_name(&self, name: &str) -> Vec<&Chart> {
        self.collect_charts()
            .into_iter()
            .filter(|c| c.name == name)
            .collect()
    }

    /// Path of an item, starting at the root folder and ending with the item.
    ///
    /// Returns `None` if the item is not part of this analysis.
    pub fn item_path(&self, id: &ItemId) -> Option<Vec<ItemRef<'_>>> {
        self.root_folder.item_path(id)
    }

    /// Item path as a string of names joined by `separator`, root excluded.
    ///
    /// For top-level items this is just the item name.
    pub fn item_path_string(&self, id: &ItemId, separator: &str) -> Option<String> {
        let path = self.item_path(id)?;
        let names: Vec<&str> = path.iter().skip(1).map(|segment| segment.name()).collect();
        Some(names.join(separator))
    }
}
