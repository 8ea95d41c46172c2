//! Minimal XML element tree
//!
//! The provider speaks a small, namespace-qualified XML dialect without mixed
//! content. This module parses documents into an owned [`Element`] tree and
//! writes trees back out, either compact (the canonical form used for
//! equality) or indented for display.
//!
//! Element names are stored as local names; namespace prefixes are dropped.
//! Attributes (including `xmlns`) are kept verbatim and in document order.

use crate::error::{Error, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// One XML element with its attributes, text and child elements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Local name (prefix stripped)
    pub name: String,
    /// Attributes in document order, keys as written (e.g. `xmlns`)
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Character data directly inside this element, unescaped
    pub text: Option<String>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a leaf element holding `text`
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Add an attribute (builder style)
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Add a child element (builder style)
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given local name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the given local name
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|c| c.text.as_deref())
    }

    /// Value of an attribute by its key as written
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Default namespace declared on this element, if any
    pub fn namespace(&self) -> Option<&str> {
        self.get_attribute("xmlns")
    }

    /// Remove whitespace-only text nodes from this element and all descendants
    ///
    /// Non-blank text is left untouched, including its leading and trailing
    /// whitespace.
    pub fn strip_whitespace(&mut self) {
        if self.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.text = None;
        }
        for child in &mut self.children {
            child.strip_whitespace();
        }
    }

    /// Serialize this element (no XML declaration)
    ///
    /// With `indent == false` the output is the canonical compact form:
    /// attributes and children in stored order, no insignificant whitespace,
    /// childless elements without text written as `<Name/>`.
    pub fn to_xml(&self, indent: bool) -> Result<String> {
        let mut writer = new_writer(indent);
        write_element(&mut writer, self)?;
        into_string(writer)
    }

    /// Serialize this element as a complete document with an XML declaration
    pub fn to_document(&self, indent: bool) -> Result<String> {
        let mut writer = new_writer(indent);
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        write_element(&mut writer, self)?;
        let mut out = into_string(writer)?;
        if indent {
            out.push('\n');
        }
        Ok(out)
    }
}

/// Parse a document into its root element
///
/// Comments, processing instructions and the XML declaration are skipped.
/// Text is kept verbatim (whitespace included); use
/// [`Element::strip_whitespace`] to drop formatting whitespace.
pub fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::xml(format!(
                "parse error at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref start) => stack.push(open_element(start)?),
            Event::Empty(ref start) => {
                let element = open_element(start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::xml("closing tag without matching opening tag"))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(ref text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::xml(format!("invalid character data: {}", e)))?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| Error::xml(format!("CDATA is not valid UTF-8: {}", e)))?;
                append_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::xml(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| Error::xml("document has no root element"))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xml(format!("invalid attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::xml(format!("invalid attribute value for {}: {}", key, e)))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_some() => Err(Error::xml(format!(
            "multiple root elements (second root <{}>)",
            element.name
        ))),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

fn append_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) => {
            match element.text {
                Some(ref mut existing) => existing.push_str(text),
                None => element.text = Some(text.to_string()),
            }
            Ok(())
        }
        // Whitespace around the root element is formatting
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::xml("character data outside the root element")),
    }
}

fn new_writer(indent: bool) -> Writer<Vec<u8>> {
    if indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    }
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::xml(format!("serialized XML is not valid UTF-8: {}", e)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::xml(format!("write failed: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text.as_deref().filter(|t| !t.is_empty());
    if element.children.is_empty() && text.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = text {
        emit(writer, Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_prefixes_and_keeps_attributes() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<r:Root xmlns:r="urn:x" xmlns="urn:y"><r:Leaf a="1">text</r:Leaf></r:Root>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.name, "Root");
        assert_eq!(root.get_attribute("xmlns:r"), Some("urn:x"));
        assert_eq!(root.namespace(), Some("urn:y"));
        let leaf = root.find("Leaf").unwrap();
        assert_eq!(leaf.get_attribute("a"), Some("1"));
        assert_eq!(leaf.text.as_deref(), Some("text"));
    }

    #[test]
    fn test_entities_round_trip() {
        let root = parse("<V>a &amp; b &lt;c&gt; \"q\"</V>").unwrap();
        assert_eq!(root.text.as_deref(), Some("a & b <c> \"q\""));
        assert_eq!(root.to_xml(false).unwrap(), "<V>a &amp; b &lt;c&gt; \"q\"</V>");
    }

    #[test]
    fn test_strip_whitespace_removes_only_blank_text() {
        let mut root = parse("<A>\n  <B> x </B>\n  <C>   </C>\n</A>").unwrap();
        assert!(root.text.is_some());
        root.strip_whitespace();
        assert_eq!(root.text, None);
        assert_eq!(root.find_text("B"), Some(" x "));
        assert_eq!(root.find("C").unwrap().text, None);
        assert_eq!(root.to_xml(false).unwrap(), "<A><B> x </B><C/></A>");
    }

    #[test]
    fn test_compact_output_is_stable() {
        let element = Element::new("A")
            .attribute("xmlns", "urn:z")
            .child(Element::with_text("B", "1"))
            .child(Element::new("C"));
        let first = element.to_xml(false).unwrap();
        let reparsed = parse(&first).unwrap();
        assert_eq!(reparsed, element);
        assert_eq!(reparsed.to_xml(false).unwrap(), first);
    }

    #[test]
    fn test_document_has_declaration() {
        let doc = Element::with_text("A", "b").to_document(false).unwrap();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.ends_with("<A>b</A>"));
    }

    #[test]
    fn test_rejects_broken_documents() {
        assert!(matches!(parse(""), Err(Error::Xml(_))));
        assert!(matches!(parse("<A><B></A>"), Err(Error::Xml(_))));
        assert!(matches!(parse("<A/><B/>"), Err(Error::Xml(_))));
        assert!(matches!(parse("<A>"), Err(Error::Xml(_))));
    }
}
