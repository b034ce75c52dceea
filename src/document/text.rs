//! Textual (de)serialization of a [`Document`] to/from an XML-like form.
//!
//! This is the concrete instance of the "document parsing and
//! serialization" collaborator spec.md §1 declares external to the core:
//! the core never imports this module itself (see `lib.rs`), only the CLI
//! and tests do. A small element/attribute/text subset is supported — no
//! DTDs, processing instructions, comments, or namespaces beyond what
//! directives already give us via the configured prefix.

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{Document, NodeId, NodeKind, NodeRef};

/// `parse`'s failure modes, following the teacher's small-error-enum-at-a-
/// module-boundary pattern (`diskplan::expr::parse::ExprError`): the textual
/// reader is the one place in this crate where a malformed *input* (as
/// opposed to an internal invariant violation) can surface, so it gets its
/// own `thiserror` enum rather than ad hoc `anyhow::bail!`/`.context()`
/// strings.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("reading an XML event: {0}")]
    Xml(String),
    #[error("element name is not valid UTF-8: {0}")]
    InvalidElementName(String),
    #[error("attribute name is not valid UTF-8: {0}")]
    InvalidAttributeName(String),
    #[error("reading an attribute: {0}")]
    InvalidAttribute(String),
    #[error("decoding text content: {0}")]
    InvalidText(String),
    #[error("decoding an attribute value: {0}")]
    InvalidAttributeValue(String),
    #[error("closing tag with no matching open element")]
    UnbalancedClosingTag,
}

/// Parse a complete document from its textual form.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut doc = Document::new();
    let mut open: Vec<NodeId> = vec![doc.root().id()];
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::Xml(e.to_string()))?
        {
            Event::Start(ref start) => {
                let parent = *open.last().expect("root frame is never popped");
                let id = append_element(&mut doc, parent, start)?;
                open.push(id);
            }
            Event::Empty(ref start) => {
                let parent = *open.last().expect("root frame is never popped");
                append_element(&mut doc, parent, start)?;
            }
            Event::End(_) => {
                if open.len() <= 1 {
                    return Err(ParseError::UnbalancedClosingTag);
                }
                open.pop();
            }
            Event::Text(text) => {
                let decoded = text.unescape().map_err(|e| ParseError::InvalidText(e.to_string()))?;
                if !decoded.trim().is_empty() {
                    let parent = *open.last().expect("root frame is never popped");
                    let id = doc.append_child(parent, NodeKind::Text, "");
                    doc.set_text(id, decoded.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn append_element(doc: &mut Document, parent: NodeId, start: &BytesStart) -> Result<NodeId, ParseError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| ParseError::InvalidElementName(e.to_string()))?
        .to_owned();
    let id = doc.append_child(parent, NodeKind::Element, &name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidAttribute(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::InvalidAttributeName(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::InvalidAttributeValue(e.to_string()))?;
        doc.append_attribute(id, key, &value);
    }
    Ok(id)
}

/// Render a document's root children back to textual form.
pub fn render(doc: &Document) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    for child in doc.root().children() {
        render_node(&mut writer, child)?;
    }
    String::from_utf8(writer.into_inner()).context("rendered document is not valid UTF-8")
}

fn render_node(writer: &mut Writer<Vec<u8>>, node: NodeRef<'_>) -> Result<()> {
    match node.kind() {
        NodeKind::Text => {
            writer
                .write_event(Event::Text(BytesText::new(node.text())))
                .context("writing a text node")?;
        }
        NodeKind::Element | NodeKind::Document => {
            let mut start = BytesStart::new(node.name());
            for attr in node.attributes() {
                start.push_attribute((attr.name(), attr.value()));
            }
            let children: Vec<_> = node.children().collect();
            if children.is_empty() {
                writer
                    .write_event(Event::Empty(start))
                    .context("writing an empty element")?;
            } else {
                writer
                    .write_event(Event::Start(start))
                    .context("writing a start tag")?;
                for child in children {
                    render_node(writer, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(node.name())))
                    .context("writing an end tag")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_tree() {
        let doc = parse(r#"<root><p n="a"/><p n="b">hi</p></root>"#).unwrap();
        let rendered = render(&doc).unwrap();
        assert_eq!(rendered, r#"<root><p n="a"/><p n="b">hi</p></root>"#);
    }
}
