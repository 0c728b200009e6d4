//! Text box panes (`txt1`).
//!
//! After the pane record comes a 40-byte text block, then the string itself as UTF-16BE
//! code units. The block's `text_offset` is relative to the start of the section, so with
//! the 8-byte section header and 108 bytes of fixed payload the text starts at 116.

use brlyt_common::big_endian::{F32, U16, U32};
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::PaneProperties;
use crate::section::{begin_section, finish_section, SectionHeader};
use crate::types::{Color8, Vec2};
use crate::{Error, Node, Result, SectionKind};

/// Section-relative offset of the string in every `txt1` this codec writes.
pub const TEXT_OFFSET: u32 = 116;

/// Filler glyph run that authoring tools store in untranslated text boxes.
pub const PLACEHOLDER_GLYPHS: &str = "あああああああああああああああああああ";

/// What [`PLACEHOLDER_GLYPHS`] decodes to, and what encodes back to it.
pub const PLACEHOLDER_SENTINEL: &str =
    "==== THIS IS PLACEHOLDER TEXT PLEASE DO NOT TRANSLATE ====";

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawTextBlock {
    string_length: U16,
    max_string_length: U16,
    material_index: U16,
    font_index: U16,
    text_origin: u8,
    line_alignment: u8,
    reserved: U16,
    text_offset: U32,
    top_color: [u8; 4],
    bottom_color: [u8; 4],
    font_size: [F32; 2],
    char_spacing: F32,
    line_spacing: F32,
}

/// A text box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Text {
    pub properties: PaneProperties,
    /// Byte length of the string buffer as stored.
    pub string_length: u16,
    pub max_string_length: u16,
    pub material_index: u16,
    pub font_index: u16,
    pub text_origin: u8,
    pub line_alignment: u8,
    pub top_color: Color8,
    pub bottom_color: Color8,
    pub font_size: Vec2,
    pub char_spacing: f32,
    pub line_spacing: f32,
    /// The decoded string, newlines kept as-is.
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Text {
    /// A text box with default metrics holding `text`.
    pub fn new(properties: PaneProperties, text: impl Into<String>) -> Self {
        Self {
            properties,
            string_length: 0,
            max_string_length: 0,
            material_index: 0,
            font_index: 0,
            text_origin: 0,
            line_alignment: 0,
            top_color: Color8::white(),
            bottom_color: Color8::white(),
            font_size: Vec2::default(),
            char_spacing: 0.0,
            line_spacing: 0.0,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(payload);
        let properties = PaneProperties::read(&mut reader)?;
        let raw: RawTextBlock = reader.read_struct()?;

        let text_start = (raw.text_offset.get() as usize)
            .checked_sub(SectionHeader::SIZE)
            .filter(|&start| start <= payload.len())
            .ok_or(Error::InvalidStringOffset {
                offset: raw.text_offset.get() as usize,
                len: payload.len(),
            })?;

        let units: Vec<u16> = payload[text_start..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();

        let declared = raw.string_length.get();
        if (declared as usize) < units.len() * 2 {
            return Err(Error::StringSizeMismatch {
                declared,
                actual: units.len() * 2,
            });
        }

        let mut text =
            String::from_utf16(&units).map_err(|_| Error::InvalidText(properties.name.clone()))?;
        if text == PLACEHOLDER_GLYPHS {
            text = PLACEHOLDER_SENTINEL.to_string();
        }

        Ok(Self {
            properties,
            string_length: declared,
            max_string_length: raw.max_string_length.get(),
            material_index: raw.material_index.get(),
            font_index: raw.font_index.get(),
            text_origin: raw.text_origin,
            line_alignment: raw.line_alignment,
            top_color: Color8::from_bytes(raw.top_color),
            bottom_color: Color8::from_bytes(raw.bottom_color),
            font_size: Vec2::new(raw.font_size[0].get(), raw.font_size[1].get()),
            char_spacing: raw.char_spacing.get(),
            line_spacing: raw.line_spacing.get(),
            text,
            children: Vec::new(),
        })
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let source = if self.text == PLACEHOLDER_SENTINEL {
            PLACEHOLDER_GLYPHS
        } else {
            self.text.as_str()
        };
        let units: Vec<u16> = source.encode_utf16().collect();

        let (string_length, max_string_length) = self.buffer_lengths(units.len())?;

        let start = begin_section(writer, SectionKind::Text);
        self.properties.write(writer)?;
        writer.write_struct(&RawTextBlock {
            string_length: U16::new(string_length),
            max_string_length: U16::new(max_string_length),
            material_index: U16::new(self.material_index),
            font_index: U16::new(self.font_index),
            text_origin: self.text_origin,
            line_alignment: self.line_alignment,
            reserved: U16::new(0),
            text_offset: U32::new(TEXT_OFFSET),
            top_color: self.top_color.to_bytes(),
            bottom_color: self.bottom_color.to_bytes(),
            font_size: [self.font_size.x, self.font_size.y].map(F32::new),
            char_spacing: F32::new(self.char_spacing),
            line_spacing: F32::new(self.line_spacing),
        });
        for unit in &units {
            writer.write_u16(*unit);
        }
        // The padding doubles as the terminator, so it is never empty.
        if writer.align_to(4) == 0 {
            writer.write_u32(0);
        }
        finish_section(writer, start)
    }

    /// Stored buffer lengths, grown when the text no longer fits.
    fn buffer_lengths(&self, unit_count: usize) -> Result<(u16, u16)> {
        if (self.string_length as usize) >= unit_count * 2 {
            return Ok((self.string_length, self.max_string_length));
        }
        let needed = (unit_count + 1) * 2;
        let needed = u16::try_from(needed).map_err(|_| Error::TooManyEntries {
            what: "text bytes",
            count: needed,
            max: u16::MAX as usize,
        })?;
        Ok((needed, self.max_string_length.max(needed)))
    }
}

/// Escape text for a line-oriented document: `\` becomes `\\`, and newline, carriage
/// return and tab become `\n`, `\r` and `\t`.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverse [`escape_text`]. Unknown escapes are kept literally.
pub fn unescape_text(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('t') => unescaped.push('\t'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
