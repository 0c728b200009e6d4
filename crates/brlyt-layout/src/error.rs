//! Error types for layout decoding and encoding.

use thiserror::Error;

use crate::SectionKind;

/// Errors that can occur when decoding or encoding a layout.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error reading or writing a layout file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Byte-level error (truncated input, bad seek, invalid UTF-8).
    #[error("{0}")]
    Common(#[from] brlyt_common::Error),

    /// The file does not start with the layout magic.
    #[error("invalid layout magic: expected 'RLYT', got {actual:?}")]
    BadMagic { actual: [u8; 4] },

    /// The byte-order mark is not big-endian.
    #[error("unsupported byte-order mark {0:#06x}")]
    BadByteOrderMark(u16),

    /// The file size in the header disagrees with the buffer length.
    #[error("file size mismatch: header declares {declared} bytes, buffer holds {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    /// A section declares a size smaller than its own header.
    #[error("section '{tag}' declares size {size}, smaller than its 8-byte header")]
    MalformedSection { tag: SectionKind, size: u32 },

    /// A required top-level section is absent.
    #[error("missing required '{0}' section")]
    MissingSection(SectionKind),

    /// No root pane was found in the section stream.
    #[error("layout has no root pane")]
    MissingRootPane,

    /// A material references a texture index past the end of the texture table.
    #[error("texture index {index} out of range (texture table holds {count})")]
    TextureIndexOutOfRange { index: u16, count: usize },

    /// A material references a texture name that is not in the texture table.
    #[error("texture '{0}' is not in the texture table")]
    UnresolvedTextureName(String),

    /// A string table offset points outside its section or runs backwards.
    #[error("string table offset {offset} is invalid (payload length {len})")]
    InvalidStringOffset { offset: usize, len: usize },

    /// A section-relative offset inside a pane record points outside the section.
    #[error("offset {offset} is outside the section payload (length {len})")]
    InvalidOffset { offset: usize, len: usize },

    /// The stored text length is smaller than the text actually present.
    #[error("text string length {declared} is smaller than the decoded {actual} bytes")]
    StringSizeMismatch { declared: u16, actual: usize },

    /// Text payload is not valid UTF-16.
    #[error("invalid UTF-16 text in pane '{0}'")]
    InvalidText(String),

    /// A pane origin byte outside the 3x3 grid.
    #[error("invalid pane origin {0} (expected 0..=8)")]
    InvalidOrigin(u8),

    /// A name does not fit its fixed-width field.
    #[error("name '{name}' is longer than {max} bytes")]
    NameTooLong { name: String, max: usize },

    /// A list is longer than its count field can express.
    #[error("too many {what}: {count} (maximum {max})")]
    TooManyEntries {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// A material field holds a value wider than its packed bit field.
    #[error("material field '{field}' value {value} exceeds its maximum {max}")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// The pane or group tree nests deeper than the decoder and encoder allow.
    #[error("tree nesting exceeds the maximum depth of {max}")]
    TreeTooDeep { max: usize },

    /// The file would hold more sections than the header can count.
    #[error("too many sections: {0}")]
    TooManySections(usize),

    /// The interchange document does not describe a valid layout.
    #[error("interchange error: {0}")]
    Interchange(String),
}

impl Error {
    /// Whether this error means a read ran past the end of the input.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Common(brlyt_common::Error::Truncated { .. }))
    }
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, Error>;
