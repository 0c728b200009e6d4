//! Picture panes (`pic1`).

use brlyt_common::{BinaryReader, BinaryWriter};

use super::{PaneProperties, VertexBlock};
use crate::section::{begin_section, finish_section};
use crate::types::{UvSet, VertexColors};
use crate::{Node, Result, SectionKind};

/// A textured quad.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Picture {
    pub properties: PaneProperties,
    pub vertex_colors: VertexColors,
    /// Index into the layout's material table.
    pub material_index: u16,
    pub uv_sets: Vec<UvSet>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Picture {
    pub fn new(properties: PaneProperties, material_index: u16) -> Self {
        Self {
            properties,
            vertex_colors: VertexColors::default(),
            material_index,
            uv_sets: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(payload);
        let properties = PaneProperties::read(&mut reader)?;
        let block = VertexBlock::read(&mut reader)?;
        Ok(Self {
            properties,
            vertex_colors: block.vertex_colors,
            material_index: block.material_index,
            uv_sets: block.uv_sets,
            children: Vec::new(),
        })
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let start = begin_section(writer, SectionKind::Picture);
        self.properties.write(writer)?;
        VertexBlock::write(writer, self.vertex_colors, self.material_index, &self.uv_sets)?;
        finish_section(writer, start)
    }
}
