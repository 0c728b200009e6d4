//! Pane records.
//!
//! All pane-like sections (`pan1`, `bnd1`, `pic1`, `txt1`, `wnd1`) start with the same
//! 68-byte record holding name, flags and transform; [`PaneProperties`] is its decoded
//! form. The variant-specific trailers live in the submodules.
//!
//! Decoders here turn one section payload into one node with an empty child list; the
//! tree builder in [`crate::tree`] attaches children afterwards.

mod group;
mod picture;
mod text;
mod window;

pub use group::Group;
pub use picture::Picture;
pub use text::{
    escape_text, unescape_text, Text, PLACEHOLDER_GLYPHS, PLACEHOLDER_SENTINEL, TEXT_OFFSET,
};
pub use window::{ContentOverflow, Window, WindowFrame};

use brlyt_common::big_endian::{F32, U16};
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::section::{begin_section, finish_section};
use crate::strings::{decode_fixed, encode_fixed};
use crate::types::{Origin, PaneFlags, RawUvSet, UvSet, Vec2, Vec3, VertexColors};
use crate::{Node, Result, SectionKind};

/// Width of the pane name field.
pub const PANE_NAME_LEN: usize = 16;

/// Width of the pane user-data field.
pub const USER_DATA_LEN: usize = 8;

/// The common 68-byte pane record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawPane {
    flags: u8,
    origin: u8,
    alpha: u8,
    reserved: u8,
    name: [u8; PANE_NAME_LEN],
    user_data: [u8; USER_DATA_LEN],
    translate: [F32; 3],
    rotate: [F32; 3],
    scale: [F32; 2],
    width: F32,
    height: F32,
}

/// Fields shared by every pane-like node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaneProperties {
    pub name: String,
    pub user_data: String,
    pub flags: PaneFlags,
    pub origin: Origin,
    pub alpha: u8,
    pub translate: Vec3,
    pub rotate: Vec3,
    pub scale: Vec2,
    pub width: f32,
    pub height: f32,
}

impl PaneProperties {
    /// Properties with identity transform and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_data: String::new(),
            flags: PaneFlags::default(),
            origin: Origin::default(),
            alpha: 255,
            translate: Vec3::default(),
            rotate: Vec3::default(),
            scale: Vec2::new(1.0, 1.0),
            width: 0.0,
            height: 0.0,
        }
    }

    /// Size of the on-disk record.
    pub const SIZE: usize = std::mem::size_of::<RawPane>();

    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let raw: RawPane = reader.read_struct()?;
        Ok(Self {
            name: decode_fixed(&raw.name)?,
            user_data: decode_fixed(&raw.user_data)?,
            flags: PaneFlags::from_bits(raw.flags),
            origin: Origin::from_index(raw.origin)?,
            alpha: raw.alpha,
            translate: Vec3::new(
                raw.translate[0].get(),
                raw.translate[1].get(),
                raw.translate[2].get(),
            ),
            rotate: Vec3::new(raw.rotate[0].get(), raw.rotate[1].get(), raw.rotate[2].get()),
            scale: Vec2::new(raw.scale[0].get(), raw.scale[1].get()),
            width: raw.width.get(),
            height: raw.height.get(),
        })
    }

    pub(crate) fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        let raw = RawPane {
            flags: self.flags.bits(),
            origin: self.origin.index(),
            alpha: self.alpha,
            reserved: 0,
            name: encode_fixed(&self.name)?,
            user_data: encode_fixed(&self.user_data)?,
            translate: [self.translate.x, self.translate.y, self.translate.z].map(F32::new),
            rotate: [self.rotate.x, self.rotate.y, self.rotate.z].map(F32::new),
            scale: [self.scale.x, self.scale.y].map(F32::new),
            width: F32::new(self.width),
            height: F32::new(self.height),
        };
        writer.write_struct(&raw);
        Ok(())
    }
}

/// A plain pane (`pan1`) or bounding pane (`bnd1`); both carry only the common record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pane {
    pub properties: PaneProperties,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Pane {
    pub fn new(properties: PaneProperties) -> Self {
        Self {
            properties,
            children: Vec::new(),
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(payload);
        Ok(Self::new(PaneProperties::read(&mut reader)?))
    }

    /// Write this pane as a `pan1` or `bnd1` section.
    pub(crate) fn encode(&self, kind: SectionKind, writer: &mut BinaryWriter) -> Result<()> {
        let start = begin_section(writer, kind);
        self.properties.write(writer)?;
        finish_section(writer, start)
    }
}

/// Vertex colors, material and UV count: the block shared by pictures and windows.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawVertexBlock {
    colors: [[u8; 4]; 4],
    material_index: U16,
    uv_count: u8,
    reserved: u8,
}

/// Decoded form of [`RawVertexBlock`] plus the UV quads that follow it.
#[derive(Debug, Clone)]
pub(crate) struct VertexBlock {
    pub vertex_colors: VertexColors,
    pub material_index: u16,
    pub uv_sets: Vec<UvSet>,
}

impl VertexBlock {
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let raw: RawVertexBlock = reader.read_struct()?;
        let uv_sets = (0..raw.uv_count)
            .map(|_| reader.read_struct::<RawUvSet>().map(UvSet::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            vertex_colors: VertexColors::from_raw(raw.colors),
            material_index: raw.material_index.get(),
            uv_sets,
        })
    }

    pub(crate) fn write(
        writer: &mut BinaryWriter,
        vertex_colors: VertexColors,
        material_index: u16,
        uv_sets: &[UvSet],
    ) -> Result<()> {
        let uv_count = u8::try_from(uv_sets.len()).map_err(|_| crate::Error::TooManyEntries {
            what: "UV sets",
            count: uv_sets.len(),
            max: u8::MAX as usize,
        })?;
        writer.write_struct(&RawVertexBlock {
            colors: vertex_colors.to_raw(),
            material_index: U16::new(material_index),
            uv_count,
            reserved: 0,
        });
        for uv in uv_sets {
            writer.write_struct(&RawUvSet::from(uv));
        }
        Ok(())
    }

    /// Bytes taken by the block and `uv_count` quads.
    pub(crate) fn size(uv_count: usize) -> usize {
        std::mem::size_of::<RawVertexBlock>() + uv_count * std::mem::size_of::<RawUvSet>()
    }
}
