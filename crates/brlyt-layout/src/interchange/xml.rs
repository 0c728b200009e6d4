//! A minimal XML element tree and its quick-xml reader and writer.
//!
//! The interchange document only uses elements and attributes, never text content, so
//! whitespace and indentation carry no meaning and every value survives a round trip.

use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::{Error, Result, MAX_TREE_DEPTH};

/// Element nesting allowed in a document: a `<Children>` wrapper per tree level plus the
/// layout's own structure.
const MAX_ELEMENT_DEPTH: usize = 2 * MAX_TREE_DEPTH + 8;

/// An XML element with attributes and child elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Add an attribute, formatting the value with `Display`.
    pub fn attr(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a required attribute.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T> {
        let value = self.get(key).ok_or_else(|| {
            Error::Interchange(format!("<{}> is missing attribute '{}'", self.tag, key))
        })?;
        self.parse_value(key, value)
    }

    /// Parse an optional attribute, falling back to `default`.
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            Some(value) => self.parse_value(key, value),
            None => Ok(default),
        }
    }

    fn parse_value<T: FromStr>(&self, key: &str, value: &str) -> Result<T> {
        value.parse().map_err(|_| {
            Error::Interchange(format!(
                "<{}> attribute '{}' has invalid value '{}'",
                self.tag, key, value
            ))
        })
    }

    /// First child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// First child with the given tag, or an error naming the missing element.
    pub fn require(&self, tag: &str) -> Result<&Element> {
        self.find(tag).ok_or_else(|| {
            Error::Interchange(format!("<{}> is missing child <{}>", self.tag, tag))
        })
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// Write this element as an indented XML document.
    pub fn write_document<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);
        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Interchange(e.to_string()))?;
        self.write_element(&mut xml_writer)
    }

    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Interchange(e.to_string()))?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Interchange(e.to_string()))?;
        for child in &self.children {
            child.write_element(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(|e| Error::Interchange(e.to_string()))?;
        Ok(())
    }

    /// Parse an XML document into its root element.
    pub fn parse_document(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if stack.len() >= MAX_ELEMENT_DEPTH {
                        return Err(Error::Interchange(format!(
                            "XML nesting deeper than {MAX_ELEMENT_DEPTH} elements"
                        )));
                    }
                    stack.push(Self::from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::from_start(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => root = Some(element),
                        }
                    }
                }
                Ok(Event::Eof) => break,
                // Declarations, comments and stray text carry nothing.
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Interchange(format!(
                        "XML parse error at byte {}: {}",
                        reader.error_position(),
                        e
                    )))
                }
            }
        }

        root.ok_or_else(|| Error::Interchange("no root element found in XML".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Interchange(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Interchange(e.to_string()))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_parse() {
        let root = Element::new("Layout")
            .attr("version", 10)
            .child(Element::new("Textures").child(Element::new("Texture").attr("name", "a&b.tpl")))
            .child(Element::new("Empty"));

        let mut output = Vec::new();
        root.write_document(&mut output).unwrap();
        let xml = String::from_utf8(output).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("a&amp;b.tpl"));

        let parsed = Element::parse_document(&xml).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_attribute_helpers() {
        let element = Element::new("Scale").attr("x", 1.5).attr("y", "oops");
        assert_eq!(element.parse::<f32>("x").unwrap(), 1.5);
        assert_eq!(element.parse_or::<u8>("z", 7).unwrap(), 7);
        assert!(matches!(element.parse::<f32>("y"), Err(Error::Interchange(_))));
        assert!(matches!(element.parse::<f32>("w"), Err(Error::Interchange(_))));
        assert!(element.require("Child").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Element::parse_document("").is_err());
        assert!(Element::parse_document("<A><B></A>").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "<A>".repeat(MAX_ELEMENT_DEPTH + 1) + &"</A>".repeat(MAX_ELEMENT_DEPTH + 1);
        assert!(matches!(
            Element::parse_document(&deep),
            Err(Error::Interchange(message)) if message.contains("nesting")
        ));

        let shallow = "<A>".repeat(MAX_ELEMENT_DEPTH) + &"</A>".repeat(MAX_ELEMENT_DEPTH);
        assert!(Element::parse_document(&shallow).is_ok());
    }
}
