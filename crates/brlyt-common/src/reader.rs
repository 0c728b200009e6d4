//! Big-endian binary reader over byte slices.
//!
//! [`BinaryReader`] is the cursor every decoder in the layout codec shares. It never copies
//! the underlying buffer, and apart from [`BinaryReader::unread`] it only moves forward.

use byteorder::{BigEndian, ByteOrder};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader that provides zero-copy, big-endian reading from a byte slice.
///
/// # Example
///
/// ```
/// use brlyt_common::BinaryReader;
///
/// let data = [0x00, 0x01, 0x02, 0x03, 0x3F, 0x80, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x00010203);
/// assert_eq!(reader.read_f32().unwrap(), 1.0);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::SeekOutOfBounds {
                position,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Step back over `count` bytes that were already consumed.
    ///
    /// This is the one-ahead lookahead used by the section framing: read a header,
    /// and if it is not the one wanted, hand it back.
    pub fn unread(&mut self, count: usize) -> Result<()> {
        let position = self
            .position
            .checked_sub(count)
            .ok_or(Error::SeekOutOfBounds {
                position: 0,
                len: self.data.len(),
            })?;
        self.position = position;
        Ok(())
    }

    /// Skip `count` bytes, failing if the buffer is shorter.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::Truncated {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(BigEndian::read_u16)
    }

    /// Read a big-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_bytes(2).map(BigEndian::read_i16)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(BigEndian::read_u32)
    }

    /// Read a big-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes(4).map(BigEndian::read_f32)
    }

    /// Read a string from a fixed-size, null-padded buffer, stopping at the first null.
    pub fn read_string_in_buffer(&mut self, buffer_size: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(buffer_size)?;
        let end = memchr::memchr(0, bytes).unwrap_or(buffer_size);
        std::str::from_utf8(&bytes[..end]).map_err(Error::Utf8)
    }

    /// Read a fixed-layout record using zerocopy.
    ///
    /// Records are declared with `zerocopy::byteorder::big_endian` field types, so the
    /// bytes are taken as-is and byte order is resolved on field access.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::Truncated {
            needed: size,
            available: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::byteorder::big_endian::U16;
    use zerocopy::{Immutable, KnownLayout};

    #[derive(FromBytes, Immutable, KnownLayout)]
    #[repr(C)]
    struct Pair {
        tag: [u8; 2],
        value: U16,
    }

    #[test]
    fn test_read_primitives_big_endian() {
        let data = [
            0x12u8, 0x34, // u16
            0xFF, 0xFE, // i16: -2
            0xDE, 0xAD, 0xBE, 0xEF, // u32
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u32().unwrap(), 0xDEADBEEF);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_unread_restores_position() {
        let data = *b"pas1\0\0\0\x08";
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_bytes(4).unwrap(), b"pas1");
        assert_eq!(reader.read_u32().unwrap(), 8);
        reader.unread(8).unwrap();
        assert_eq!(reader.position(), 0);
        assert!(reader.unread(1).is_err());
    }

    #[test]
    fn test_read_string_in_buffer() {
        let data = b"RootPane\0\0\0\0\0\0\0\0tail";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_string_in_buffer(16).unwrap(), "RootPane");
        assert_eq!(reader.position(), 16);
    }

    #[test]
    fn test_read_struct() {
        let data = [b'o', b'k', 0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        let pair: Pair = reader.read_struct().unwrap();
        assert_eq!(&pair.tag, b"ok");
        assert_eq!(pair.value.get(), 0x0102);
    }

    #[test]
    fn test_truncated_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        assert!(matches!(
            reader.read_u32(),
            Err(Error::Truncated {
                needed: 4,
                available: 2
            })
        ));
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);

        assert!(reader.seek(4).is_ok());
        assert!(reader.is_empty());
        assert!(reader.seek(5).is_err());
    }
}
