//! Reading analysis files

use super::{
    FormatError, FormatResult, CHARTS_TAG, CHART_TAG, DIALOG_PAGE_TAG, FOLDER_TAG, FORMAT_VERSION,
    INPUTS_TAG, INPUT_TAG, PROPERTY_TAG, ROOT_TAG, SCRIPT_TAG,
};
use crate::document::{Analysis, Chart, DialogPage, Folder, IdAllocator, Item};
use roxmltree::{Document, Node};
use std::collections::HashSet;

/// Parse analysis file content into an [`Analysis`].
///
/// Explicit ids found in the document are reserved in `ids` before any
/// item is built, so ids minted for items without one never collide with
/// ids that appear later in the file.
pub fn parse_analysis(text: &str, ids: &IdAllocator) -> FormatResult<Analysis> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name(ROOT_TAG) {
        return Err(FormatError::UnexpectedRoot(root.tag_name().name().to_string()));
    }
    match root.attribute("version") {
        Some(FORMAT_VERSION) => {}
        other => return Err(FormatError::UnsupportedVersion(other.map(str::to_string))),
    }

    let inputs = child_elements(root, INPUTS_TAG)
        .flat_map(|inputs| child_elements(inputs, INPUT_TAG))
        .map(|input| required_attribute(input, INPUT_TAG, "pattern").map(str::to_string))
        .collect::<FormatResult<Vec<_>>>()?;

    let charts = child_elements(root, CHARTS_TAG)
        .next()
        .ok_or(FormatError::MissingElement(CHARTS_TAG))?;

    reserve_ids(charts, ids, &mut HashSet::new())?;

    let mut root_folder = Folder::new(ids.next_id(), "");
    root_folder.items = read_items(charts, ids)?;

    Ok(Analysis {
        inputs,
        root_folder,
    })
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(tag))
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> FormatResult<&'a str> {
    node.attribute(attribute)
        .ok_or(FormatError::MissingAttribute { element, attribute })
}

/// Walk the same folder/chart elements `read_items` visits and reserve their ids
fn reserve_ids(folder: Node, ids: &IdAllocator, seen: &mut HashSet<i128>) -> FormatResult<()> {
    for child in folder.children().filter(Node::is_element) {
        let is_folder = child.has_tag_name(FOLDER_TAG);
        if !is_folder && !child.has_tag_name(CHART_TAG) {
            continue;
        }
        if let Some(id) = child.attribute("id") {
            let n = ids.reserve(id)?;
            if !seen.insert(n) {
                return Err(FormatError::DuplicateIdentifier(n.to_string()));
            }
        }
        if is_folder {
            reserve_ids(child, ids, seen)?;
        }
    }
    Ok(())
}

fn read_items(folder: Node, ids: &IdAllocator) -> FormatResult<Vec<Item>> {
    let mut items = Vec::new();
    for child in folder.children().filter(Node::is_element) {
        match child.tag_name().name() {
            FOLDER_TAG => items.push(Item::Folder(read_folder(child, ids)?)),
            CHART_TAG => items.push(Item::Chart(read_chart(child, ids)?)),
            // unknown elements are skipped
            _ => {}
        }
    }
    Ok(items)
}

fn read_folder(node: Node, ids: &IdAllocator) -> FormatResult<Folder> {
    let id = ids.allocate(node.attribute("id"))?;
    let mut folder = Folder::new(id, node.attribute("name").unwrap_or_default());
    folder.items = read_items(node, ids)?;
    Ok(folder)
}

fn read_chart(node: Node, ids: &IdAllocator) -> FormatResult<Chart> {
    let id = ids.allocate(node.attribute("id"))?;
    let type_name = required_attribute(node, CHART_TAG, "type")?;
    let mut chart = Chart::try_new(id, type_name, node.attribute("name").unwrap_or_default())?;
    chart.template = node.attribute("template").map(str::to_string);
    chart.icon = node.attribute("icon").map(str::to_string);
    chart.script = content(child_elements(node, SCRIPT_TAG).next());

    chart.dialog_pages = child_elements(node, DIALOG_PAGE_TAG)
        .map(|page| DialogPage {
            id: page.attribute("id").map(str::to_string),
            label: page.attribute("label").unwrap_or_default().to_string(),
            content: content(Some(page)),
        })
        .collect();

    for property in child_elements(node, PROPERTY_TAG) {
        let name = required_attribute(property, PROPERTY_TAG, "name")?;
        let value = property.attribute("value").unwrap_or_default();
        chart.properties.insert(name.to_string(), value.to_string());
    }

    Ok(chart)
}

/// Text and CDATA of an element, trimmed, with a single trailing newline.
///
/// A missing element, or one without any text, yields the empty string;
/// whitespace-only text yields `"\n"`.
fn content(node: Option<Node>) -> String {
    let Some(node) = node else {
        return String::new();
    };
    let mut texts = node.children().filter(Node::is_text).peekable();
    if texts.peek().is_none() {
        return String::new();
    }
    let text: String = texts.filter_map(|n| n.text()).collect();
    format!("{}\n", text.trim())
}
