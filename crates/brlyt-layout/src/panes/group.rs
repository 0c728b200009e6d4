//! Pane groups (`grp1`).

use brlyt_common::big_endian::U16;
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::PANE_NAME_LEN;
use crate::section::{begin_section, finish_section};
use crate::strings::{decode_fixed, encode_fixed};
use crate::{Error, Node, Result, SectionKind};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawGroup {
    name: [u8; PANE_NAME_LEN],
    entry_count: U16,
    reserved: U16,
}

/// A named set of panes, referenced by pane name. Groups nest like panes do.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    pub name: String,
    /// Member pane names.
    pub panes: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(payload);
        let raw: RawGroup = reader.read_struct()?;
        let panes = (0..raw.entry_count.get())
            .map(|_| decode_fixed(reader.read_bytes(PANE_NAME_LEN)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: decode_fixed(&raw.name)?,
            panes,
            children: Vec::new(),
        })
    }

    pub(crate) fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let entry_count = u16::try_from(self.panes.len()).map_err(|_| Error::TooManyEntries {
            what: "group entries",
            count: self.panes.len(),
            max: u16::MAX as usize,
        })?;

        let start = begin_section(writer, SectionKind::Group);
        writer.write_struct(&RawGroup {
            name: encode_fixed(&self.name)?,
            entry_count: U16::new(entry_count),
            reserved: U16::new(0),
        });
        for pane in &self.panes {
            writer.write_bytes(&encode_fixed::<PANE_NAME_LEN>(pane)?);
        }
        finish_section(writer, start)
    }
}
