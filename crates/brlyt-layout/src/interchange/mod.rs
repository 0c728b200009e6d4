//! Text interchange formats.
//!
//! XML (feature `xml`) is the editable form: every field, including reserved material
//! flag bits, is written so a decode/XML/encode cycle reproduces the binary file. JSON
//! (feature `serde`) is a direct serde rendering of the model. JSON escapes control
//! characters itself, so text strings are stored unescaped there.

#[cfg(feature = "xml")]
mod convert;
#[cfg(feature = "xml")]
mod xml;

#[cfg(feature = "xml")]
pub use xml::Element;

#[cfg(any(feature = "xml", feature = "serde"))]
use crate::{Error, Layout, Result};

#[cfg(feature = "xml")]
impl Layout {
    /// Build the XML element tree for this layout.
    pub fn to_xml_element(&self) -> Element {
        convert::layout_to_element(self)
    }

    /// Write this layout as an XML document.
    pub fn write_xml<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.to_xml_element().write_document(writer)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_xml(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Interchange(e.to_string()))
    }

    /// Parse a layout from an XML document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = Element::parse_document(xml)?;
        convert::layout_from_element(&root)
    }
}

#[cfg(feature = "serde")]
impl Layout {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Interchange(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Interchange(e.to_string()))
    }
}
