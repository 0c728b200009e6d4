//! File header and section tags.

use std::fmt;

use brlyt_common::big_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Layout file header.
///
/// Every layout file starts with this 16-byte record, followed by `section_count`
/// framed sections.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct FileHeader {
    /// Always `RLYT`.
    pub magic: [u8; 4],
    /// Always `0xFEFF` (big-endian).
    pub byte_order: U16,
    /// Format revision.
    pub version: U16,
    /// Length of the whole file in bytes.
    pub file_size: U32,
    /// Length of this header (16).
    pub header_size: U16,
    /// Number of sections following the header, scope markers included.
    pub section_count: U16,
}

impl FileHeader {
    /// The magic bytes at the start of a layout file.
    pub const MAGIC: &'static [u8; 4] = b"RLYT";

    /// Big-endian byte-order mark.
    pub const BYTE_ORDER_MARK: u16 = 0xFEFF;

    /// Revision written for new files.
    pub const DEFAULT_VERSION: u16 = 0x000A;

    /// Size of the header in bytes.
    pub const SIZE: usize = 16;

    /// Byte offset of `file_size`, patched once the file is complete.
    pub const FILE_SIZE_OFFSET: usize = 8;

    /// Byte offset of `section_count`, patched once the file is complete.
    pub const SECTION_COUNT_OFFSET: usize = 14;

    /// Build a header with placeholder size and count.
    pub fn new(version: u16) -> Self {
        Self {
            magic: *Self::MAGIC,
            byte_order: U16::new(Self::BYTE_ORDER_MARK),
            version: U16::new(version),
            file_size: U32::new(0),
            header_size: U16::new(Self::SIZE as u16),
            section_count: U16::new(0),
        }
    }
}

/// The kind of a framed section, identified by its 4-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `lyt1` - screen size and centering.
    LayoutInfo,
    /// `txl1` - texture name table.
    TextureList,
    /// `fnl1` - font name table.
    FontList,
    /// `mat1` - material table.
    Materials,
    /// `pan1` - plain pane.
    Pane,
    /// `bnd1` - bounding pane.
    Bounding,
    /// `pic1` - picture pane.
    Picture,
    /// `txt1` - text box pane.
    Text,
    /// `wnd1` - window pane.
    Window,
    /// `grp1` - pane group.
    Group,
    /// `pas1` - start of a pane child list.
    PaneStart,
    /// `pae1` - end of a pane child list.
    PaneEnd,
    /// `grs1` - start of a group child list.
    GroupStart,
    /// `gre1` - end of a group child list.
    GroupEnd,
    /// Any tag this codec does not know.
    Unknown([u8; 4]),
}

impl SectionKind {
    /// Identify a section from its tag.
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"lyt1" => Self::LayoutInfo,
            b"txl1" => Self::TextureList,
            b"fnl1" => Self::FontList,
            b"mat1" => Self::Materials,
            b"pan1" => Self::Pane,
            b"bnd1" => Self::Bounding,
            b"pic1" => Self::Picture,
            b"txt1" => Self::Text,
            b"wnd1" => Self::Window,
            b"grp1" => Self::Group,
            b"pas1" => Self::PaneStart,
            b"pae1" => Self::PaneEnd,
            b"grs1" => Self::GroupStart,
            b"gre1" => Self::GroupEnd,
            _ => Self::Unknown(tag),
        }
    }

    /// The 4-byte tag written for this section.
    pub fn tag(self) -> [u8; 4] {
        match self {
            Self::LayoutInfo => *b"lyt1",
            Self::TextureList => *b"txl1",
            Self::FontList => *b"fnl1",
            Self::Materials => *b"mat1",
            Self::Pane => *b"pan1",
            Self::Bounding => *b"bnd1",
            Self::Picture => *b"pic1",
            Self::Text => *b"txt1",
            Self::Window => *b"wnd1",
            Self::Group => *b"grp1",
            Self::PaneStart => *b"pas1",
            Self::PaneEnd => *b"pae1",
            Self::GroupStart => *b"grs1",
            Self::GroupEnd => *b"gre1",
            Self::Unknown(tag) => tag,
        }
    }

    /// Whether this tag opens a child list.
    pub fn is_scope_start(self) -> bool {
        matches!(self, Self::PaneStart | Self::GroupStart)
    }

    /// Whether this tag closes a child list.
    pub fn is_scope_end(self) -> bool {
        matches!(self, Self::PaneEnd | Self::GroupEnd)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.tag()))
    }
}
