//! Bit packing helpers for material records.
//!
//! Two numbering schemes are in play. The 32-bit material flag word is described with
//! MSB-first bit positions (bit 0 is the most significant bit), so a [`FlagRange`] of
//! `28..=31` is the low nibble. Packed sub-byte fields inside substructures use ordinary
//! LSB-first `(width, shift)` pairs, described by [`BitField`].

use crate::{Error, Result};

/// A closed range of MSB-first bit positions in the material flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagRange {
    pub start: u32,
    pub end: u32,
}

impl FlagRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A single-bit presence flag.
    pub const fn bit(position: u32) -> Self {
        Self::new(position, position)
    }

    pub const fn width(self) -> u32 {
        self.end - self.start + 1
    }

    /// Largest value the range can hold.
    pub const fn max(self) -> u32 {
        (1u32 << self.width()) - 1
    }

    const fn shift(self) -> u32 {
        31 - self.end
    }

    /// Mask of the range's bits in place.
    pub const fn mask(self) -> u32 {
        self.max() << self.shift()
    }

    pub const fn extract(self, flags: u32) -> u32 {
        (flags >> self.shift()) & self.max()
    }

    /// Replace the range's bits in `flags` with `value`. `value` must fit the range.
    pub const fn insert(self, flags: u32, value: u32) -> u32 {
        (flags & !self.mask()) | ((value & self.max()) << self.shift())
    }
}

/// An LSB-first field of a packed byte or half-word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub width: u32,
    pub shift: u32,
}

impl BitField {
    pub const fn new(width: u32, shift: u32) -> Self {
        Self { width, shift }
    }

    const fn value_mask(self) -> u32 {
        (1u32 << self.width) - 1
    }

    pub const fn get(self, packed: u32) -> u32 {
        (packed >> self.shift) & self.value_mask()
    }

    /// Largest value the field can hold.
    pub const fn max(self) -> u32 {
        self.value_mask()
    }

    /// OR `value` into `packed`. Values wider than the field are rejected with
    /// [`Error::FieldOutOfRange`] naming `field`.
    pub fn put(self, packed: u32, value: u32, field: &'static str) -> Result<u32> {
        if value > self.value_mask() {
            return Err(Error::FieldOutOfRange {
                field,
                value,
                max: self.value_mask(),
            });
        }
        Ok(packed | (value << self.shift))
    }

    pub fn get_u8(self, packed: u8) -> u8 {
        self.get(u32::from(packed)) as u8
    }

    pub fn put_u8(self, packed: u8, value: u8, field: &'static str) -> Result<u8> {
        Ok(self.put(u32::from(packed), u32::from(value), field)? as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_range_is_msb_first() {
        let textures = FlagRange::new(28, 31);
        assert_eq!(textures.width(), 4);
        assert_eq!(textures.mask(), 0x0000_000F);
        assert_eq!(textures.extract(0x0000_0002), 2);

        let srt = FlagRange::new(24, 27);
        assert_eq!(srt.mask(), 0x0000_00F0);

        assert_eq!(FlagRange::bit(0).mask(), 0x8000_0000);
        assert_eq!(FlagRange::bit(7).mask(), 0x0100_0000);
        assert_eq!(FlagRange::new(9, 13).mask(), 0x007C_0000);
        assert_eq!(FlagRange::new(17, 18).max(), 3);
    }

    #[test]
    fn test_flag_range_insert_preserves_other_bits() {
        let range = FlagRange::new(14, 16);
        let flags = range.insert(0xFFFF_FFFF, 5);
        assert_eq!(range.extract(flags), 5);
        assert_eq!(flags | range.mask(), 0xFFFF_FFFF);
        assert_eq!(range.insert(flags, 0) & range.mask(), 0);
    }

    #[test]
    fn test_bit_field_get_put() {
        // TEV bias: 2 bits at 4 of the op/bias/scale byte.
        let bias = BitField::new(2, 4);
        assert_eq!(bias.get_u8(0b1110_0101), 0b10);
        assert_eq!(bias.put_u8(0b0000_0101, 0b11, "bias").unwrap(), 0b0011_0101);
        assert_eq!(bias.max(), 3);

        // tex map: 9 bits at 0 of the order half-word.
        let tex_map = BitField::new(9, 0);
        assert_eq!(tex_map.get(0xFFFF), 0x1FF);
        let tex_sel = BitField::new(5, 11);
        assert_eq!(tex_sel.get(0xF800), 0x1F);
        assert_eq!(tex_map.put(0, 0x1FF, "tex_map").unwrap(), 0x1FF);
    }

    #[test]
    fn test_bit_field_rejects_wide_values() {
        let bias = BitField::new(2, 4);
        match bias.put_u8(0, 4, "bias") {
            Err(Error::FieldOutOfRange { field, value, max }) => {
                assert_eq!((field, value, max), ("bias", 4, 3));
            }
            other => panic!("expected FieldOutOfRange, got {other:?}"),
        }

        let tex_map = BitField::new(9, 0);
        assert!(matches!(
            tex_map.put(0, 600, "tex_map"),
            Err(Error::FieldOutOfRange { value: 600, max: 511, .. })
        ));
    }
}
