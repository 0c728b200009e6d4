//! Whole-file decode and encode.

use std::fs;
use std::path::Path;

use brlyt_common::big_endian::F32;
use brlyt_common::{BinaryReader, BinaryWriter};
use tracing::{debug, warn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::material::{decode_materials, encode_materials, Material};
use crate::panes::{Group, Pane};
use crate::section::{begin_section, finish_section, SectionStream};
use crate::strings::{decode_string_table, encode_string_table};
use crate::tree::{self, Node};
use crate::{Error, FileHeader, Result, SectionKind};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawLayoutInfo {
    centered: u8,
    reserved: [u8; 3],
    width: F32,
    height: F32,
}

/// Screen metrics from the `lyt1` section.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutInfo {
    /// Non-zero when the layout origin is the screen center.
    pub centered: u8,
    pub width: f32,
    pub height: f32,
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self {
            centered: 1,
            width: 608.0,
            height: 456.0,
        }
    }
}

impl LayoutInfo {
    fn decode(payload: &[u8]) -> Result<Self> {
        let raw: RawLayoutInfo = BinaryReader::new(payload).read_struct()?;
        Ok(Self {
            centered: raw.centered,
            width: raw.width.get(),
            height: raw.height.get(),
        })
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let start = begin_section(writer, SectionKind::LayoutInfo);
        writer.write_struct(&RawLayoutInfo {
            centered: self.centered,
            reserved: [0; 3],
            width: F32::new(self.width),
            height: F32::new(self.height),
        });
        finish_section(writer, start)
    }
}

/// A decoded layout file.
///
/// # Example
///
/// ```
/// use brlyt_layout::{Layout, Node, Pane, PaneProperties};
///
/// let mut layout = Layout::new(Pane::new(PaneProperties::new("RootPane")));
/// layout
///     .root_pane
///     .children
///     .push(Node::Bounding(Pane::new(PaneProperties::new("B_hit"))));
///
/// let bytes = layout.to_bytes().unwrap();
/// assert_eq!(&bytes[..4], b"RLYT");
/// assert_eq!(Layout::parse(&bytes).unwrap(), layout);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Format revision from the file header.
    pub version: u16,
    pub info: LayoutInfo,
    /// Texture names (`txl1`); `None` when the file has no texture table.
    pub textures: Option<Vec<String>>,
    /// Font names (`fnl1`); `None` when the file has no font table.
    pub fonts: Option<Vec<String>>,
    pub materials: Vec<Material>,
    pub root_pane: Pane,
    pub root_group: Option<Group>,
}

impl Layout {
    /// An empty layout around `root_pane`.
    pub fn new(root_pane: Pane) -> Self {
        Self {
            version: FileHeader::DEFAULT_VERSION,
            info: LayoutInfo::default(),
            textures: None,
            fonts: None,
            materials: Vec::new(),
            root_pane,
            root_group: None,
        }
    }

    /// Read and decode a layout file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Decode a layout from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: FileHeader = reader.read_struct()?;

        if &header.magic != FileHeader::MAGIC {
            return Err(Error::BadMagic {
                actual: header.magic,
            });
        }
        if header.byte_order.get() != FileHeader::BYTE_ORDER_MARK {
            return Err(Error::BadByteOrderMark(header.byte_order.get()));
        }
        let declared = header.file_size.get() as usize;
        if declared != data.len() {
            return Err(Error::SizeMismatch {
                declared,
                actual: data.len(),
            });
        }
        reader.seek(header.header_size.get() as usize)?;

        let section_count = header.section_count.get();
        debug!(version = header.version.get(), section_count, "decoding layout");

        let mut stream = SectionStream::new(reader, section_count);
        let mut info = None;
        let mut textures: Option<Vec<String>> = None;
        let mut fonts = None;
        let mut materials = None;
        let mut root_pane: Option<Pane> = None;
        let mut root_group: Option<Group> = None;

        while let Some(section) = stream.next_section()? {
            debug!(kind = %section.kind(), size = section.header.size, "top-level section");
            match section.kind() {
                SectionKind::LayoutInfo => info = Some(LayoutInfo::decode(section.payload)?),
                SectionKind::TextureList => {
                    textures = Some(decode_string_table(section.payload)?);
                }
                SectionKind::FontList => fonts = Some(decode_string_table(section.payload)?),
                SectionKind::Materials => {
                    let names = textures.as_deref().unwrap_or_default();
                    materials = Some(decode_materials(section.payload, names)?);
                }
                SectionKind::Pane if root_pane.is_none() => {
                    let mut pane = Pane::decode(section.payload)?;
                    tree::read_children(&mut stream, &mut pane.children, 0)?;
                    root_pane = Some(pane);
                }
                SectionKind::Group if root_group.is_none() => {
                    let mut group = Group::decode(section.payload)?;
                    tree::read_children(&mut stream, &mut group.children, 0)?;
                    root_group = Some(group);
                }
                kind => warn!(%kind, size = section.header.size, "skipping top-level section"),
            }
        }

        Ok(Self {
            version: header.version.get(),
            info: info.ok_or(Error::MissingSection(SectionKind::LayoutInfo))?,
            textures,
            fonts,
            materials: materials.unwrap_or_default(),
            root_pane: root_pane.ok_or(Error::MissingRootPane)?,
            root_group,
        })
    }

    /// Encode the layout.
    ///
    /// Sections are written as layout info, textures, fonts, materials, the pane tree and
    /// the group tree; the header's file size and section count are patched last.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(4096);
        writer.write_struct(&FileHeader::new(self.version));
        let mut section_count = 0usize;

        self.info.encode(&mut writer)?;
        section_count += 1;

        let textures = self.textures.as_deref().unwrap_or_default();
        if let Some(names) = &self.textures {
            encode_string_table(&mut writer, SectionKind::TextureList, names)?;
            section_count += 1;
        }
        if let Some(names) = &self.fonts {
            encode_string_table(&mut writer, SectionKind::FontList, names)?;
            section_count += 1;
        }
        encode_materials(&mut writer, &self.materials, textures)?;
        section_count += 1;

        let records = tree::flatten(&self.root_pane, self.root_group.as_ref())?;
        for record in &records {
            record.write(&mut writer)?;
        }
        section_count += records.len();

        let section_count =
            u16::try_from(section_count).map_err(|_| Error::TooManySections(section_count))?;
        let file_size = u32::try_from(writer.position()).map_err(|_| Error::TooManyEntries {
            what: "file bytes",
            count: writer.position(),
            max: u32::MAX as usize,
        })?;
        writer.patch_u32(FileHeader::FILE_SIZE_OFFSET, file_size)?;
        writer.patch_u16(FileHeader::SECTION_COUNT_OFFSET, section_count)?;
        debug!(file_size, section_count, "encoded layout");

        Ok(writer.into_inner())
    }

    /// Encode the layout and write it to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Number of tree nodes below the root pane and root group, roots included.
    pub fn node_count(&self) -> usize {
        let panes = 1 + self
            .root_pane
            .children
            .iter()
            .map(Node::subtree_len)
            .sum::<usize>();
        let groups = self.root_group.as_ref().map_or(0, |group| {
            1 + group.children.iter().map(Node::subtree_len).sum::<usize>()
        });
        panes + groups
    }
}
