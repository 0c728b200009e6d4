//! Window panes (`wnd1`).
//!
//! ```text
//! pane record (68)
//! content overflow: left, right, top, bottom (f32 x 4)
//! frame count u8, 3 pad, content offset u32, frame table offset u32
//! content block: vertex colors, material, UV sets          at content offset
//! frame count x u32 offsets                                 at frame table offset
//! frame count x { material u16, texture flip u8, pad u8 }
//! ```
//!
//! All offsets are relative to the start of the section.

use brlyt_common::big_endian::{F32, U16, U32};
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::{PaneProperties, VertexBlock};
use crate::section::{begin_section, finish_section, SectionHeader};
use crate::types::{UvSet, VertexColors};
use crate::{Error, Node, Result, SectionKind};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawWindowBlock {
    content_overflow: [F32; 4],
    frame_count: u8,
    reserved: [u8; 3],
    content_offset: U32,
    frame_table_offset: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawWindowFrame {
    material_index: U16,
    texture_flip: u8,
    reserved: u8,
}

const CONTENT_OFFSET: usize =
    SectionHeader::SIZE + PaneProperties::SIZE + std::mem::size_of::<RawWindowBlock>();

/// How far the window content extends past the pane edges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentOverflow {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// One frame of a window border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowFrame {
    pub material_index: u16,
    pub texture_flip: u8,
}

/// A nine-slice style window: a content quad plus border frames.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub properties: PaneProperties,
    pub content_overflow: ContentOverflow,
    pub vertex_colors: VertexColors,
    pub material_index: u16,
    pub uv_sets: Vec<UvSet>,
    pub frames: Vec<WindowFrame>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Window {
    pub fn new(properties: PaneProperties, material_index: u16) -> Self {
        Self {
            properties,
            content_overflow: ContentOverflow::default(),
            vertex_colors: VertexColors::default(),
            material_index,
            uv_sets: Vec::new(),
            frames: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(payload);
        let properties = PaneProperties::read(&mut reader)?;
        let raw: RawWindowBlock = reader.read_struct()?;

        reader.seek(payload_offset(raw.content_offset.get(), payload.len())?)?;
        let content = VertexBlock::read(&mut reader)?;

        reader.seek(payload_offset(raw.frame_table_offset.get(), payload.len())?)?;
        let frame_offsets = (0..raw.frame_count)
            .map(|_| reader.read_u32())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut frames = Vec::with_capacity(frame_offsets.len());
        for offset in frame_offsets {
            reader.seek(payload_offset(offset, payload.len())?)?;
            let frame: RawWindowFrame = reader.read_struct()?;
            frames.push(WindowFrame {
                material_index: frame.material_index.get(),
                texture_flip: frame.texture_flip,
            });
        }

        let [left, right, top, bottom] = raw.content_overflow.map(|v| v.get());
        Ok(Self {
            properties,
            content_overflow: ContentOverflow {
                left,
                right,
                top,
                bottom,
            },
            vertex_colors: content.vertex_colors,
            material_index: content.material_index,
            uv_sets: content.uv_sets,
            frames,
            children: Vec::new(),
        })
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let frame_count = u8::try_from(self.frames.len()).map_err(|_| Error::TooManyEntries {
            what: "window frames",
            count: self.frames.len(),
            max: u8::MAX as usize,
        })?;
        let frame_table_offset = CONTENT_OFFSET + VertexBlock::size(self.uv_sets.len());
        let overflow = &self.content_overflow;

        let start = begin_section(writer, SectionKind::Window);
        self.properties.write(writer)?;
        writer.write_struct(&RawWindowBlock {
            content_overflow: [overflow.left, overflow.right, overflow.top, overflow.bottom]
                .map(F32::new),
            frame_count,
            reserved: [0; 3],
            content_offset: U32::new(CONTENT_OFFSET as u32),
            frame_table_offset: U32::new(frame_table_offset as u32),
        });
        VertexBlock::write(writer, self.vertex_colors, self.material_index, &self.uv_sets)?;

        let frames_start = frame_table_offset + self.frames.len() * 4;
        for index in 0..self.frames.len() {
            let offset = frames_start + index * std::mem::size_of::<RawWindowFrame>();
            writer.write_u32(offset as u32);
        }
        for frame in &self.frames {
            writer.write_struct(&RawWindowFrame {
                material_index: U16::new(frame.material_index),
                texture_flip: frame.texture_flip,
                reserved: 0,
            });
        }
        finish_section(writer, start)
    }
}

/// Convert a section-relative offset into a payload offset.
fn payload_offset(offset: u32, len: usize) -> Result<usize> {
    (offset as usize)
        .checked_sub(SectionHeader::SIZE)
        .filter(|&position| position <= len)
        .ok_or(Error::InvalidOffset {
            offset: offset as usize,
            len,
        })
}
