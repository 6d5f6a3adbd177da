// src/optimize/svg.rs

//! Conservative SVG cleanup.
//!
//! Removes comments, the XML declaration, processing instructions,
//! `<metadata>` and editor-specific elements and attributes, and
//! whitespace-only text between tags. A doctype is dropped unless it
//! declares entities. Text inside `<text>` and friends is kept verbatim and
//! `id` attributes are never touched. The root `viewBox` is dropped when it
//! is exactly `0 0 <width> <height>`.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Elements whose character data is rendered or interpreted as-is.
const TEXT_ELEMENTS: [&[u8]; 7] = [b"text", b"tspan", b"textPath", b"title", b"desc", b"style", b"script"];

const EDITOR_PREFIXES: [&[u8]; 6] = [
    b"sodipodi:",
    b"inkscape:",
    b"sketch:",
    b"xmlns:sodipodi",
    b"xmlns:inkscape",
    b"xmlns:sketch",
];

pub fn cleanup(input: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(input).context("svg is not valid UTF-8")?;
    let mut reader = Reader::from_str(text);

    let mut writer = Writer::new(Vec::with_capacity(input.len()));
    let mut skip_depth = 0usize;
    let mut text_depth = 0usize;

    loop {
        match reader.read_event().context("parsing svg")? {
            Event::Eof => break,
            Event::Start(e) if skip_depth > 0 || is_removed_element(e.name().as_ref()) => {
                skip_depth += 1;
            }
            Event::End(_) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Event::Empty(e) if is_removed_element(e.name().as_ref()) => {}
            Event::DocType(e) if e.contains(&b'[') => writer
                .write_event(Event::DocType(e))
                .context("writing svg")?,
            Event::Comment(_) | Event::DocType(_) | Event::PI(_) | Event::Decl(_) => {}
            Event::Text(e) if text_depth == 0 && e.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(e) => {
                if is_text_element(e.name().as_ref()) {
                    text_depth += 1;
                }
                writer
                    .write_event(Event::Start(clean_element(&e)?))
                    .context("writing svg")?
            }
            Event::End(e) => {
                if is_text_element(e.name().as_ref()) {
                    text_depth = text_depth.saturating_sub(1);
                }
                writer.write_event(Event::End(e)).context("writing svg")?
            }
            Event::Empty(e) => writer
                .write_event(Event::Empty(clean_element(&e)?))
                .context("writing svg")?,
            other => writer.write_event(other).context("writing svg")?,
        }
    }

    Ok(writer.into_inner())
}

fn is_removed_element(name: &[u8]) -> bool {
    name == b"metadata" || is_editor_name(name)
}

fn is_text_element(name: &[u8]) -> bool {
    TEXT_ELEMENTS.contains(&name)
}

fn is_editor_name(name: &[u8]) -> bool {
    EDITOR_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn clean_element(element: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();

    let mut attributes: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    for attr in element.attributes() {
        let attr = attr.context("reading svg attribute")?;
        attributes.push((attr.key.as_ref().to_vec(), attr.value.into_owned()));
    }

    let drop_view_box = name == "svg" && view_box_is_redundant(&attributes);

    let mut cleaned = BytesStart::new(name);
    for (key, value) in &attributes {
        if is_editor_name(key) || (drop_view_box && key.as_slice() == b"viewBox") {
            continue;
        }
        cleaned.push_attribute((key.as_slice(), value.as_slice()));
    }
    Ok(cleaned)
}

fn attribute<'a>(attributes: &'a [(Vec<u8>, Vec<u8>)], key: &[u8]) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .and_then(|(_, v)| std::str::from_utf8(v).ok())
}

/// `viewBox="0 0 W H"` with `width="W"` and `height="H"` (optionally `px`).
fn view_box_is_redundant(attributes: &[(Vec<u8>, Vec<u8>)]) -> bool {
    let (Some(view_box), Some(width), Some(height)) = (
        attribute(attributes, b"viewBox"),
        attribute(attributes, b"width"),
        attribute(attributes, b"height"),
    ) else {
        return false;
    };

    let parts: Vec<&str> = view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();

    parts.len() == 4
        && parts[0] == "0"
        && parts[1] == "0"
        && parts[2] == width.trim().trim_end_matches("px")
        && parts[3] == height.trim().trim_end_matches("px")
}
