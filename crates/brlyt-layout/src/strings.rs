//! Name storage: the `txl1`/`fnl1` string tables and fixed-width name fields.
//!
//! A string table payload is laid out as
//!
//! ```text
//! count: u16, reserved: u16
//! count x { offset: u32, reserved: u32 }   offsets relative to the start of this array
//! count x null-terminated names
//! zero padding to a 4-byte boundary
//! ```
//!
//! The end of each name is the next entry's offset, and the end of the last one is the end
//! of the payload; trailing nulls (terminator and padding) are stripped.

use brlyt_common::big_endian::{U16, U32};
use brlyt_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::section::{begin_section, finish_section};
use crate::{Error, Result, SectionKind};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawTableHeader {
    count: U16,
    reserved: U16,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawTableEntry {
    offset: U32,
    reserved: U32,
}

const HEADER_SIZE: usize = std::mem::size_of::<RawTableHeader>();
const ENTRY_SIZE: usize = std::mem::size_of::<RawTableEntry>();

/// Decode a string table payload into its names.
pub fn decode_string_table(payload: &[u8]) -> Result<Vec<String>> {
    let mut reader = BinaryReader::new(payload);
    let header: RawTableHeader = reader.read_struct()?;
    let count = header.count.get() as usize;

    let mut bounds = Vec::with_capacity(count + 1);
    for _ in 0..count {
        let entry: RawTableEntry = reader.read_struct()?;
        bounds.push(entry.offset.get() as usize + HEADER_SIZE);
    }
    bounds.push(payload.len());

    let names_start = HEADER_SIZE + count * ENTRY_SIZE;
    let mut names = Vec::with_capacity(count);
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start < names_start || start > end || end > payload.len() {
            return Err(Error::InvalidStringOffset {
                offset: start,
                len: payload.len(),
            });
        }
        let bytes = &payload[start..end];
        let trimmed = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(&bytes[..0], |last| &bytes[..=last]);
        let name = std::str::from_utf8(trimmed).map_err(brlyt_common::Error::from)?;
        names.push(name.to_string());
    }
    Ok(names)
}

/// Write a complete string table section (`txl1` or `fnl1`).
pub fn encode_string_table(
    writer: &mut BinaryWriter,
    kind: SectionKind,
    names: &[String],
) -> Result<()> {
    let count = u16::try_from(names.len()).map_err(|_| Error::TooManyEntries {
        what: "string table entries",
        count: names.len(),
        max: u16::MAX as usize,
    })?;

    let start = begin_section(writer, kind);
    writer.write_struct(&RawTableHeader {
        count: U16::new(count),
        reserved: U16::new(0),
    });

    let mut offset = names.len() * ENTRY_SIZE;
    for name in names {
        writer.write_struct(&RawTableEntry {
            offset: U32::new(offset as u32),
            reserved: U32::new(0),
        });
        offset += name.len() + 1;
    }
    for name in names {
        writer.write_bytes(name.as_bytes());
        writer.write_u8(0);
    }
    writer.align_to(4);

    finish_section(writer, start)
}

/// Read a null-padded fixed-width name.
pub(crate) fn decode_fixed(bytes: &[u8]) -> Result<String> {
    let mut reader = BinaryReader::new(bytes);
    Ok(reader.read_string_in_buffer(bytes.len())?.to_string())
}

/// Null-pad `name` into an `N`-byte field.
pub(crate) fn encode_fixed<const N: usize>(name: &str) -> Result<[u8; N]> {
    if name.len() > N {
        return Err(Error::NameTooLong {
            name: name.to_string(),
            max: N,
        });
    }
    let mut field = [0u8; N];
    field[..name.len()].copy_from_slice(name.as_bytes());
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::read_header;
    use proptest::prelude::*;

    fn encode(names: &[&str]) -> Vec<u8> {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let mut writer = BinaryWriter::new();
        encode_string_table(&mut writer, SectionKind::TextureList, &names).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_table_layout() {
        let bytes = encode(&["tex_a.tpl", "b.tpl"]);
        // header 8 + count/pad 4 + 2 entries 16 + "tex_a.tpl\0" 10 + "b.tpl\0" 6 = 44
        assert_eq!(bytes.len(), 44);
        assert_eq!(&bytes[8..12], &[0, 2, 0, 0]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 16]);
        assert_eq!(&bytes[20..24], &[0, 0, 0, 26]);
        assert_eq!(&bytes[28..38], b"tex_a.tpl\0");

        let names = decode_string_table(&bytes[8..]).unwrap();
        assert_eq!(names, ["tex_a.tpl", "b.tpl"]);
    }

    #[test]
    fn test_padding_is_stripped() {
        let bytes = encode(&["font.brfnt"]);
        let mut reader = BinaryReader::new(&bytes);
        let header = read_header(&mut reader).unwrap();
        assert_eq!(header.size as usize, bytes.len());
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(decode_string_table(&bytes[8..]).unwrap(), ["font.brfnt"]);
    }

    #[test]
    fn test_empty_table() {
        let bytes = encode(&[]);
        assert_eq!(bytes.len(), 12);
        assert!(decode_string_table(&bytes[8..]).unwrap().is_empty());
    }

    #[test]
    fn test_offset_past_payload() {
        let payload = [0, 1, 0, 0, 0, 0, 0, 64, 0, 0, 0, 0, b'a', 0, 0, 0];
        assert!(matches!(
            decode_string_table(&payload),
            Err(Error::InvalidStringOffset { offset: 68, .. })
        ));
    }

    #[test]
    fn test_offsets_running_backwards() {
        let mut bytes = encode(&["first", "second"]);
        // Point the second entry before the first.
        bytes[20..24].copy_from_slice(&[0, 0, 0, 8]);
        assert!(matches!(
            decode_string_table(&bytes[8..]),
            Err(Error::InvalidStringOffset { .. })
        ));
    }

    #[test]
    fn test_fixed_names() {
        assert_eq!(&encode_fixed::<8>("abc").unwrap(), b"abc\0\0\0\0\0");
        assert_eq!(encode_fixed::<4>("abcd").unwrap(), *b"abcd");
        assert!(matches!(
            encode_fixed::<4>("abcde"),
            Err(Error::NameTooLong { max: 4, .. })
        ));
        assert_eq!(decode_fixed(b"RootPane\0\0\0\0\0\0\0\0").unwrap(), "RootPane");
        assert_eq!(decode_fixed(b"abcd").unwrap(), "abcd");
    }

    proptest! {
        #[test]
        fn prop_string_table_round_trip(names in prop::collection::vec("[a-zA-Z0-9_.]{1,24}", 0..12)) {
            let mut writer = BinaryWriter::new();
            encode_string_table(&mut writer, SectionKind::FontList, &names).unwrap();
            let bytes = writer.into_inner();

            let mut reader = BinaryReader::new(&bytes);
            let header = read_header(&mut reader).unwrap();
            prop_assert_eq!(header.size as usize, bytes.len());
            prop_assert_eq!(header.payload_len(), bytes.len() - 8);
            prop_assert_eq!(decode_string_table(&bytes[8..]).unwrap(), names);
        }
    }
}
