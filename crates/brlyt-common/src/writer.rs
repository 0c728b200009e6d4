//! Big-endian binary writer with backpatching.

use byteorder::{BigEndian, ByteOrder};
use zerocopy::{Immutable, IntoBytes};

use crate::{Error, Result};

/// A growable output buffer for big-endian binary data.
///
/// Sizes and offsets that are only known once later data has been written are emitted as
/// placeholders and fixed up afterwards with the `patch_*` methods.
///
/// # Example
///
/// ```
/// use brlyt_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new();
/// writer.write_bytes(b"lyt1");
/// writer.write_u32(0);
/// writer.write_u32(0xCAFE);
/// writer.patch_u32(4, writer.position() as u32).unwrap();
///
/// assert_eq!(writer.as_slice(), b"lyt1\0\0\0\x0c\0\0\xca\xfe");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
}

impl BinaryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// View the written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the buffer.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Append raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append `count` zero bytes.
    #[inline]
    pub fn write_zeros(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }

    /// Append zero bytes until the position is a multiple of `alignment`.
    ///
    /// Returns the number of bytes added.
    pub fn align_to(&mut self, alignment: usize) -> usize {
        let padding = (alignment - self.position() % alignment) % alignment;
        self.write_zeros(padding);
        padding
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_i16(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_f32(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    /// Write a string into a fixed-size, null-padded field.
    ///
    /// The caller is responsible for making sure `value` fits; longer input is cut at
    /// `size` bytes.
    pub fn write_string_in_buffer(&mut self, value: &str, size: usize) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(size);
        self.write_bytes(&bytes[..len]);
        self.write_zeros(size - len);
    }

    /// Write a fixed-layout record using zerocopy.
    #[inline]
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) {
        self.write_bytes(value.as_bytes());
    }

    /// Overwrite a big-endian u16 that was written earlier.
    pub fn patch_u16(&mut self, position: usize, value: u16) -> Result<()> {
        let slot = self.patch_slot(position, 2)?;
        BigEndian::write_u16(slot, value);
        Ok(())
    }

    /// Overwrite a big-endian u32 that was written earlier.
    pub fn patch_u32(&mut self, position: usize, value: u32) -> Result<()> {
        let slot = self.patch_slot(position, 4)?;
        BigEndian::write_u32(slot, value);
        Ok(())
    }

    fn patch_slot(&mut self, position: usize, width: usize) -> Result<&mut [u8]> {
        let len = self.buffer.len();
        match position.checked_add(width) {
            Some(end) if end <= len => Ok(&mut self.buffer[position..end]),
            _ => Err(Error::PatchOutOfBounds {
                position,
                width,
                len,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryReader;

    #[test]
    fn test_write_read_back() {
        let mut writer = BinaryWriter::new();
        writer.write_u16(0xFEFF);
        writer.write_i16(-300);
        writer.write_u32(76);
        writer.write_f32(-0.5);

        let bytes = writer.into_inner();
        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_u16().unwrap(), 0xFEFF);
        assert_eq!(reader.read_i16().unwrap(), -300);
        assert_eq!(reader.read_u32().unwrap(), 76);
        assert_eq!(reader.read_f32().unwrap(), -0.5);
    }

    #[test]
    fn test_align_to() {
        let mut writer = BinaryWriter::new();
        writer.write_bytes(b"abcde");
        assert_eq!(writer.align_to(4), 3);
        assert_eq!(writer.position(), 8);
        assert_eq!(writer.align_to(4), 0);
    }

    #[test]
    fn test_fixed_string_is_null_padded() {
        let mut writer = BinaryWriter::new();
        writer.write_string_in_buffer("N_pic", 8);
        assert_eq!(writer.as_slice(), b"N_pic\0\0\0");
    }

    #[test]
    fn test_patch_bounds() {
        let mut writer = BinaryWriter::new();
        writer.write_u32(0);
        assert!(writer.patch_u32(0, 20).is_ok());
        assert_eq!(writer.as_slice(), &[0, 0, 0, 20]);
        assert!(writer.patch_u16(3, 1).is_err());
    }
}
