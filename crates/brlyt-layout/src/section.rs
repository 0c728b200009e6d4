//! Section framing.
//!
//! Every chunk of a layout file is prefixed with `{tag: [u8; 4], size: u32}` where `size`
//! counts the 8-byte header itself. [`SectionStream`] walks those chunks while keeping the
//! global "sections remaining" budget from the file header; the tree builder threads it
//! through every level of recursion.

use brlyt_common::big_endian::U32;
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result, SectionKind};

/// On-disk section header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawSectionHeader {
    tag: [u8; 4],
    size: U32,
}

/// A decoded section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub kind: SectionKind,
    /// Total size including the header.
    pub size: u32,
}

impl SectionHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// Number of payload bytes following the header.
    pub fn payload_len(&self) -> usize {
        (self.size as usize).saturating_sub(Self::SIZE)
    }
}

/// Read a section header at the current position.
pub fn read_header(reader: &mut BinaryReader<'_>) -> Result<SectionHeader> {
    let raw: RawSectionHeader = reader.read_struct()?;
    let header = SectionHeader {
        kind: SectionKind::from_tag(raw.tag),
        size: raw.size.get(),
    };
    if (header.size as usize) < SectionHeader::SIZE {
        return Err(Error::MalformedSection {
            tag: header.kind,
            size: header.size,
        });
    }
    Ok(header)
}

/// Write a section header.
pub fn write_header(writer: &mut BinaryWriter, kind: SectionKind, size: u32) {
    writer.write_struct(&RawSectionHeader {
        tag: kind.tag(),
        size: U32::new(size),
    });
}

/// Start a section whose size is not known yet. Returns the section's start offset.
pub(crate) fn begin_section(writer: &mut BinaryWriter, kind: SectionKind) -> usize {
    let start = writer.position();
    write_header(writer, kind, 0);
    start
}

/// Backpatch the size of a section started with [`begin_section`].
pub(crate) fn finish_section(writer: &mut BinaryWriter, start: usize) -> Result<()> {
    let size = writer.position() - start;
    let size = u32::try_from(size).map_err(|_| Error::TooManyEntries {
        what: "section bytes",
        count: size,
        max: u32::MAX as usize,
    })?;
    writer.patch_u32(start + 4, size)?;
    Ok(())
}

/// A framed section whose payload has been sliced out of the input.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub header: SectionHeader,
    pub payload: &'a [u8],
}

impl Section<'_> {
    pub fn kind(&self) -> SectionKind {
        self.header.kind
    }
}

/// Cursor over the section sequence plus the remaining-section budget.
#[derive(Debug)]
pub struct SectionStream<'a> {
    reader: BinaryReader<'a>,
    remaining: u16,
}

impl<'a> SectionStream<'a> {
    /// Wrap a reader positioned at the first section.
    pub fn new(reader: BinaryReader<'a>, section_count: u16) -> Self {
        Self {
            reader,
            remaining: section_count,
        }
    }

    /// Sections still to be read according to the file header.
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    /// Current byte offset in the file.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Read the next section, or `None` once the section budget is spent.
    pub fn next_section(&mut self) -> Result<Option<Section<'a>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let header = read_header(&mut self.reader)?;
        let payload = self.reader.read_bytes(header.payload_len())?;
        self.remaining -= 1;
        Ok(Some(Section { header, payload }))
    }

    /// Look one section ahead: if it opens a child list, consume it and return `true`;
    /// otherwise leave the stream exactly where it was.
    pub fn take_scope_start(&mut self) -> Result<bool> {
        if self.remaining == 0 || self.reader.remaining() < SectionHeader::SIZE {
            return Ok(false);
        }
        let header = read_header(&mut self.reader)?;
        if header.kind.is_scope_start() {
            // Scope markers carry no payload, but skip whatever they declare.
            self.reader.skip(header.payload_len())?;
            self.remaining -= 1;
            return Ok(true);
        }
        self.reader.unread(SectionHeader::SIZE)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_bytes(sections: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        for (tag, payload) in sections {
            let start = begin_section(&mut writer, SectionKind::from_tag(**tag));
            writer.write_bytes(payload);
            finish_section(&mut writer, start).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_header_round_trip() {
        let bytes = stream_bytes(&[(b"pan1", &[1, 2, 3, 4])]);
        assert_eq!(&bytes[..8], b"pan1\0\0\0\x0c");

        let mut reader = BinaryReader::new(&bytes);
        let header = read_header(&mut reader).unwrap();
        assert_eq!(header.kind, SectionKind::Pane);
        assert_eq!(header.payload_len(), 4);
    }

    #[test]
    fn test_undersized_section_is_rejected() {
        let bytes = *b"pan1\0\0\0\x04";
        let mut reader = BinaryReader::new(&bytes);
        assert!(matches!(
            read_header(&mut reader),
            Err(Error::MalformedSection { size: 4, .. })
        ));
    }

    #[test]
    fn test_scope_lookahead_consumes_start_marker() {
        let bytes = stream_bytes(&[(b"pas1", &[]), (b"pae1", &[])]);
        let mut stream = SectionStream::new(BinaryReader::new(&bytes), 2);

        assert!(stream.take_scope_start().unwrap());
        assert_eq!(stream.remaining(), 1);
        assert_eq!(stream.position(), 8);
    }

    #[test]
    fn test_scope_lookahead_rewinds_on_other_tags() {
        let bytes = stream_bytes(&[(b"pic1", &[0; 4])]);
        let mut stream = SectionStream::new(BinaryReader::new(&bytes), 1);

        assert!(!stream.take_scope_start().unwrap());
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.remaining(), 1);

        let section = stream.next_section().unwrap().unwrap();
        assert_eq!(section.kind(), SectionKind::Picture);
        assert!(stream.next_section().unwrap().is_none());
    }

    #[test]
    fn test_lookahead_at_end_of_input() {
        let mut stream = SectionStream::new(BinaryReader::new(&[]), 3);
        assert!(!stream.take_scope_start().unwrap());
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = stream_bytes(&[(b"txl1", &[0; 8])]);
        bytes.truncate(12);
        let mut stream = SectionStream::new(BinaryReader::new(&bytes), 1);
        assert!(stream.next_section().unwrap_err().is_truncated());
    }
}
