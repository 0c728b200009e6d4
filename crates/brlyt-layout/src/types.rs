//! Small value types shared by panes and materials.

use brlyt_common::big_endian::F32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Signed 16-bit RGBA color, used by material color registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color16 {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

impl Color16 {
    pub const fn new(r: i16, g: i16, b: i16, a: i16) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A texture coordinate pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TexCoord {
    pub s: f32,
    pub t: f32,
}

/// Texture coordinates for the four corners of a quad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UvSet {
    pub top_left: TexCoord,
    pub top_right: TexCoord,
    pub bottom_left: TexCoord,
    pub bottom_right: TexCoord,
}

/// On-disk UV quad: s,t for TL, TR, BL, BR.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub(crate) struct RawUvSet {
    coords: [F32; 8],
}

impl From<RawUvSet> for UvSet {
    fn from(raw: RawUvSet) -> Self {
        let c = raw.coords.map(|v| v.get());
        Self {
            top_left: TexCoord { s: c[0], t: c[1] },
            top_right: TexCoord { s: c[2], t: c[3] },
            bottom_left: TexCoord { s: c[4], t: c[5] },
            bottom_right: TexCoord { s: c[6], t: c[7] },
        }
    }
}

impl From<&UvSet> for RawUvSet {
    fn from(uv: &UvSet) -> Self {
        let coords = [
            uv.top_left.s,
            uv.top_left.t,
            uv.top_right.s,
            uv.top_right.t,
            uv.bottom_left.s,
            uv.bottom_left.t,
            uv.bottom_right.s,
            uv.bottom_right.t,
        ];
        Self {
            coords: coords.map(F32::new),
        }
    }
}

/// Per-corner vertex colors of a picture or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexColors {
    pub top_left: Color8,
    pub top_right: Color8,
    pub bottom_left: Color8,
    pub bottom_right: Color8,
}

impl Default for VertexColors {
    fn default() -> Self {
        Self {
            top_left: Color8::white(),
            top_right: Color8::white(),
            bottom_left: Color8::white(),
            bottom_right: Color8::white(),
        }
    }
}

impl VertexColors {
    pub(crate) fn from_raw(raw: [[u8; 4]; 4]) -> Self {
        Self {
            top_left: Color8::from_bytes(raw[0]),
            top_right: Color8::from_bytes(raw[1]),
            bottom_left: Color8::from_bytes(raw[2]),
            bottom_right: Color8::from_bytes(raw[3]),
        }
    }

    pub(crate) fn to_raw(self) -> [[u8; 4]; 4] {
        [
            self.top_left.to_bytes(),
            self.top_right.to_bytes(),
            self.bottom_left.to_bytes(),
            self.bottom_right.to_bytes(),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HorizontalOrigin {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VerticalOrigin {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Anchor point of a pane on the 3x3 grid.
///
/// Stored on disk as `horizontal + vertical * 3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Origin {
    pub horizontal: HorizontalOrigin,
    pub vertical: VerticalOrigin,
}

impl Origin {
    pub fn from_index(index: u8) -> Result<Self> {
        let horizontal = match index % 3 {
            0 => HorizontalOrigin::Left,
            1 => HorizontalOrigin::Center,
            _ => HorizontalOrigin::Right,
        };
        let vertical = match index / 3 {
            0 => VerticalOrigin::Top,
            1 => VerticalOrigin::Center,
            2 => VerticalOrigin::Bottom,
            _ => return Err(Error::InvalidOrigin(index)),
        };
        Ok(Self {
            horizontal,
            vertical,
        })
    }

    pub fn index(self) -> u8 {
        let h = match self.horizontal {
            HorizontalOrigin::Left => 0,
            HorizontalOrigin::Center => 1,
            HorizontalOrigin::Right => 2,
        };
        let v = match self.vertical {
            VerticalOrigin::Top => 0,
            VerticalOrigin::Center => 1,
            VerticalOrigin::Bottom => 2,
        };
        h + v * 3
    }
}

/// The pane flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaneFlags {
    /// Bit 0.
    pub visible: bool,
    /// Bit 1: the pane is adjusted for widescreen output.
    pub widescreen: bool,
    /// Bits 2-7, kept verbatim.
    pub extra: u8,
}

impl Default for PaneFlags {
    fn default() -> Self {
        Self {
            visible: true,
            widescreen: false,
            extra: 0,
        }
    }
}

impl PaneFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            visible: bits & 0x1 != 0,
            widescreen: bits & 0x2 != 0,
            extra: bits >> 2,
        }
    }

    pub fn bits(self) -> u8 {
        u8::from(self.visible) | (u8::from(self.widescreen) << 1) | (self.extra << 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_index_mapping() {
        for index in 0..9 {
            assert_eq!(Origin::from_index(index).unwrap().index(), index);
        }
        let origin = Origin::from_index(5).unwrap();
        assert_eq!(origin.horizontal, HorizontalOrigin::Right);
        assert_eq!(origin.vertical, VerticalOrigin::Center);
        assert!(matches!(Origin::from_index(9), Err(Error::InvalidOrigin(9))));
    }

    #[test]
    fn test_pane_flags() {
        let flags = PaneFlags::from_bits(0b0000_0110);
        assert!(!flags.visible);
        assert!(flags.widescreen);
        assert_eq!(flags.extra, 1);
        assert_eq!(flags.bits(), 0b0000_0110);
        assert_eq!(PaneFlags::from_bits(0xFF).bits(), 0xFF);
    }

    #[test]
    fn test_uv_set_order() {
        let raw = RawUvSet {
            coords: [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0].map(F32::new),
        };
        let uv = UvSet::from(raw);
        assert_eq!(uv.top_right, TexCoord { s: 1.0, t: 0.0 });
        assert_eq!(uv.bottom_left, TexCoord { s: 0.0, t: 1.0 });
        assert_eq!(RawUvSet::from(&uv).as_bytes(), raw.as_bytes());
    }
}
