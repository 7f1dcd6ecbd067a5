//! Writing analysis files

use super::{
    FormatResult, CHARTS_TAG, CHART_TAG, DIALOG_PAGE_TAG, FOLDER_TAG, FORMAT_VERSION, INPUTS_TAG,
    INPUT_TAG, PROPERTY_TAG, ROOT_TAG, SCRIPT_TAG,
};
use crate::document::{Analysis, Chart, Folder, Item};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;

const INDENT: usize = 4;

/// Serialize an analysis as indented XML.
///
/// Inputs come first, then the chart tree. Script and dialog page bodies
/// are written as CDATA; attribute values are entity-escaped, including
/// line breaks and tabs, so they survive a round trip.
pub fn write_analysis(analysis: &Analysis) -> FormatResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ROOT_TAG);
    push_attribute(&mut root, "version", FORMAT_VERSION);
    writer.write_event(Event::Start(root))?;

    if analysis.inputs.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(INPUTS_TAG)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(INPUTS_TAG)))?;
        for pattern in &analysis.inputs {
            let mut input = BytesStart::new(INPUT_TAG);
            push_attribute(&mut input, "pattern", pattern);
            writer.write_event(Event::Empty(input))?;
        }
        writer.write_event(Event::End(BytesEnd::new(INPUTS_TAG)))?;
    }

    write_folder_body(&mut writer, CHARTS_TAG, BytesStart::new(CHARTS_TAG), &analysis.root_folder)?;

    writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;

    let mut text = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    text.push('\n');
    Ok(text)
}

fn write_folder_body(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    start: BytesStart<'_>,
    folder: &Folder,
) -> FormatResult<()> {
    if folder.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for item in folder {
        match item {
            Item::Chart(chart) => write_chart(writer, chart)?,
            Item::Folder(child) => write_folder(writer, child)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_folder(writer: &mut Writer<Vec<u8>>, folder: &Folder) -> FormatResult<()> {
    let mut start = BytesStart::new(FOLDER_TAG);
    push_attribute(&mut start, "id", folder.id.as_str());
    push_attribute(&mut start, "name", &folder.name);
    write_folder_body(writer, FOLDER_TAG, start, folder)
}

fn write_chart(writer: &mut Writer<Vec<u8>>, chart: &Chart) -> FormatResult<()> {
    let mut start = BytesStart::new(CHART_TAG);
    push_attribute(&mut start, "id", chart.id.as_str());
    push_attribute(&mut start, "type", chart.chart_type.as_str());
    push_attribute(&mut start, "name", &chart.name);
    if let Some(template) = &chart.template {
        push_attribute(&mut start, "template", template);
    }
    if let Some(icon) = &chart.icon {
        push_attribute(&mut start, "icon", icon);
    }
    writer.write_event(Event::Start(start))?;

    write_text_element(writer, SCRIPT_TAG, BytesStart::new(SCRIPT_TAG), &chart.script)?;

    for page in &chart.dialog_pages {
        let mut start = BytesStart::new(DIALOG_PAGE_TAG);
        if let Some(id) = &page.id {
            push_attribute(&mut start, "id", id);
        }
        push_attribute(&mut start, "label", &page.label);
        write_text_element(writer, DIALOG_PAGE_TAG, start, &page.content)?;
    }

    for (name, value) in &chart.properties {
        let mut property = BytesStart::new(PROPERTY_TAG);
        push_attribute(&mut property, "name", name);
        push_attribute(&mut property, "value", value);
        writer.write_event(Event::Empty(property))?;
    }

    writer.write_event(Event::End(BytesEnd::new(CHART_TAG)))?;
    Ok(())
}

/// Element holding `text` as CDATA; an empty element when there is no text
fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    start: BytesStart<'_>,
    text: &str,
) -> FormatResult<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    write_cdata(writer, text)?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write `text` as CDATA, splitting around any `]]>` it contains
fn write_cdata(writer: &mut Writer<Vec<u8>>, text: &str) -> FormatResult<()> {
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        let (head, tail) = rest.split_at(pos + 2);
        writer.write_event(Event::CData(BytesCData::new(head)))?;
        rest = tail;
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;
    Ok(())
}

/// Attach an attribute whose value is already escaped by [`escape_attribute`]
fn push_attribute(start: &mut BytesStart<'_>, name: &str, value: &str) {
    start.push_attribute(Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escape_attribute(value).into_owned().into_bytes()),
    });
}

/// Escape a string for use inside a double-quoted XML attribute.
///
/// Besides the markup characters, `\n`, `\r` and `\t` are written as
/// character references: XML parsers normalize literal whitespace in
/// attribute values to spaces.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
