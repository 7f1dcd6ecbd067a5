//! Folders and the items they contain

use super::chart::Chart;
use super::id::ItemId;
use serde::{Deserialize, Serialize};

/// An entry in a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Item {
    Chart(Chart),
    Folder(Folder),
}

impl Item {
    pub fn id(&self) -> &ItemId {
        match self {
            Item::Chart(c) => &c.id,
            Item::Folder(f) => &f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Chart(c) => &c.name,
            Item::Folder(f) => &f.name,
        }
    }

    pub fn as_chart(&self) -> Option<&Chart> {
        match self {
            Item::Chart(c) => Some(c),
            Item::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Item::Folder(f) => Some(f),
            Item::Chart(_) => None,
        }
    }
}

impl From<Chart> for Item {
    fn from(chart: Chart) -> Self {
        Item::Chart(chart)
    }
}

impl From<Folder> for Item {
    fn from(folder: Folder) -> Self {
        Item::Folder(folder)
    }
}

/// Borrowed view of a tree node, used for item paths
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemRef<'a> {
    Chart(&'a Chart),
    Folder(&'a Folder),
}

impl<'a> ItemRef<'a> {
    pub fn id(&self) -> &'a ItemId {
        match self {
            ItemRef::Chart(c) => &c.id,
            ItemRef::Folder(f) => &f.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            ItemRef::Chart(c) => &c.name,
            ItemRef::Folder(f) => &f.name,
        }
    }
}

impl<'a> From<&'a Item> for ItemRef<'a> {
    fn from(item: &'a Item) -> Self {
        match item {
            Item::Chart(c) => ItemRef::Chart(c),
            Item::Folder(f) => ItemRef::Folder(f),
        }
    }
}

/// A named container of charts and nested folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: ItemId,
    pub name: String,
    pub items: Vec<Item>,
}

impl Folder {
    /// Create an empty folder
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Add an item (chart or folder) at the end
    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn push(&mut self, item: impl Into<Item>) {
        self.items.push(item.into());
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// All charts in this folder and its subfolders, depth-first in document order
    pub fn collect_charts(&self) -> Vec<&Chart> {
        let mut charts = Vec::new();
        self.collect_charts_into(&mut charts);
        charts
    }

    fn collect_charts_into<'a>(&'a self, out: &mut Vec<&'a Chart>) {
        for item in &self.items {
            match item {
                Item::Chart(chart) => out.push(chart),
                Item::Folder(folder) => folder.collect_charts_into(out),
            }
        }
    }

    /// Path from this folder down to the item with the given id.
    ///
    /// The path starts with this folder and ends with the item itself.
    pub fn item_path(&self, id: &ItemId) -> Option<Vec<ItemRef<'_>>> {
        for item in &self.items {
            if item.id() == id {
                return Some(vec![ItemRef::Folder(self), item.into()]);
            }
            if let Item::Folder(child) = item {
                if let Some(mut path) = child.item_path(id) {
                    path.insert(0, ItemRef::Folder(self));
                    return Some(path);
                }
            }
        }
        None
    }

    /// Find a chart anywhere below this folder
    pub fn find_chart(&self, id: &ItemId) -> Option<&Chart> {
        self.collect_charts().into_iter().find(|c| &c.id == id)
    }

    /// Mutable access to a chart anywhere below this folder
    pub fn find_chart_mut(&mut self, id: &ItemId) -> Option<&mut Chart> {
        for item in &mut self.items {
            match item {
                Item::Chart(chart) if &chart.id == id => return Some(chart),
                Item::Chart(_) => {}
                Item::Folder(folder) => {
                    if let Some(chart) = folder.find_chart_mut(id) {
                        return Some(chart);
                    }
                }
            }
        }
        None
    }

    /// Remove the item with the given id from anywhere below this folder
    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        if let Some(pos) = self.items.iter().position(|i| i.id() == id) {
            return Some(self.items.remove(pos));
        }
        self.items.iter_mut().find_map(|item| match item {
            Item::Folder(folder) => folder.remove_item(id),
            Item::Chart(_) => None,
        })
    }
}

impl<'a> IntoIterator for &'a Folder {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
