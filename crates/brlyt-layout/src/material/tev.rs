//! Packed TEV records: stages, the swap table and alpha compare.
//!
//! These are the substructures whose fields are narrower than a byte. Every field is
//! described by a [`BitField`] constant and packed or unpacked through it.

use brlyt_common::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::bits::BitField;
use crate::Result;

const TEX_MAP: BitField = BitField::new(9, 0);
const RAS_SEL: BitField = BitField::new(2, 9);
const TEX_SEL: BitField = BitField::new(5, 11);

const INPUT_A: BitField = BitField::new(4, 0);
const INPUT_B: BitField = BitField::new(4, 4);
const INPUT_C: BitField = BitField::new(4, 0);
const INPUT_D: BitField = BitField::new(4, 4);
const OP: BitField = BitField::new(4, 0);
const BIAS: BitField = BitField::new(2, 4);
const SCALE: BitField = BitField::new(2, 6);
const CLAMP: BitField = BitField::new(1, 0);
const REGISTER: BitField = BitField::new(2, 1);
const CONSTANT_SEL: BitField = BitField::new(5, 3);

const IND_TEX_ID: BitField = BitField::new(2, 0);
const IND_BIAS: BitField = BitField::new(3, 0);
const IND_MATRIX: BitField = BitField::new(5, 3);
const IND_WRAP_S: BitField = BitField::new(3, 0);
const IND_WRAP_T: BitField = BitField::new(3, 3);
const IND_FORMAT: BitField = BitField::new(2, 0);
const IND_ADD_PREVIOUS: BitField = BitField::new(1, 2);
const IND_UTC_LOD: BitField = BitField::new(1, 3);
const IND_ALPHA: BitField = BitField::new(4, 4);

const SWAP_R: BitField = BitField::new(2, 0);
const SWAP_G: BitField = BitField::new(2, 2);
const SWAP_B: BitField = BitField::new(2, 4);
const SWAP_A: BitField = BitField::new(2, 6);

const COMPARE_0: BitField = BitField::new(3, 0);
const COMPARE_1: BitField = BitField::new(3, 4);

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub(crate) struct RawTevStage {
    tex_coord: u8,
    color: u8,
    order: U16,
    color_combiner: [u8; 4],
    alpha_combiner: [u8; 4],
    indirect: [u8; 4],
}

/// One combiner (color or alpha) of a TEV stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TevCombiner {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub op: u8,
    pub bias: u8,
    pub scale: u8,
    pub clamp: u8,
    pub register: u8,
    pub constant_sel: u8,
}

impl TevCombiner {
    fn unpack(bytes: [u8; 4]) -> Self {
        Self {
            a: INPUT_A.get_u8(bytes[0]),
            b: INPUT_B.get_u8(bytes[0]),
            c: INPUT_C.get_u8(bytes[1]),
            d: INPUT_D.get_u8(bytes[1]),
            op: OP.get_u8(bytes[2]),
            bias: BIAS.get_u8(bytes[2]),
            scale: SCALE.get_u8(bytes[2]),
            clamp: CLAMP.get_u8(bytes[3]),
            register: REGISTER.get_u8(bytes[3]),
            constant_sel: CONSTANT_SEL.get_u8(bytes[3]),
        }
    }

    fn pack(&self) -> Result<[u8; 4]> {
        let inputs_ab = INPUT_A.put_u8(0, self.a, "tev_combiner.a")?;
        let inputs_ab = INPUT_B.put_u8(inputs_ab, self.b, "tev_combiner.b")?;
        let inputs_cd = INPUT_C.put_u8(0, self.c, "tev_combiner.c")?;
        let inputs_cd = INPUT_D.put_u8(inputs_cd, self.d, "tev_combiner.d")?;
        let operation = OP.put_u8(0, self.op, "tev_combiner.op")?;
        let operation = BIAS.put_u8(operation, self.bias, "tev_combiner.bias")?;
        let operation = SCALE.put_u8(operation, self.scale, "tev_combiner.scale")?;
        let output = CLAMP.put_u8(0, self.clamp, "tev_combiner.clamp")?;
        let output = REGISTER.put_u8(output, self.register, "tev_combiner.register")?;
        let output = CONSTANT_SEL.put_u8(output, self.constant_sel, "tev_combiner.constant_sel")?;
        Ok([inputs_ab, inputs_cd, operation, output])
    }
}

/// Indirect texturing setup of a TEV stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndirectStage {
    pub tex_id: u8,
    pub bias: u8,
    pub matrix: u8,
    pub wrap_s: u8,
    pub wrap_t: u8,
    pub format: u8,
    pub add_previous: u8,
    pub utc_lod: u8,
    pub alpha: u8,
}

impl IndirectStage {
    fn unpack(bytes: [u8; 4]) -> Self {
        Self {
            tex_id: IND_TEX_ID.get_u8(bytes[0]),
            bias: IND_BIAS.get_u8(bytes[1]),
            matrix: IND_MATRIX.get_u8(bytes[1]),
            wrap_s: IND_WRAP_S.get_u8(bytes[2]),
            wrap_t: IND_WRAP_T.get_u8(bytes[2]),
            format: IND_FORMAT.get_u8(bytes[3]),
            add_previous: IND_ADD_PREVIOUS.get_u8(bytes[3]),
            utc_lod: IND_UTC_LOD.get_u8(bytes[3]),
            alpha: IND_ALPHA.get_u8(bytes[3]),
        }
    }

    fn pack(&self) -> Result<[u8; 4]> {
        let tex_id = IND_TEX_ID.put_u8(0, self.tex_id, "indirect.tex_id")?;
        let matrix = IND_BIAS.put_u8(0, self.bias, "indirect.bias")?;
        let matrix = IND_MATRIX.put_u8(matrix, self.matrix, "indirect.matrix")?;
        let wrap = IND_WRAP_S.put_u8(0, self.wrap_s, "indirect.wrap_s")?;
        let wrap = IND_WRAP_T.put_u8(wrap, self.wrap_t, "indirect.wrap_t")?;
        let format = IND_FORMAT.put_u8(0, self.format, "indirect.format")?;
        let format = IND_ADD_PREVIOUS.put_u8(format, self.add_previous, "indirect.add_previous")?;
        let format = IND_UTC_LOD.put_u8(format, self.utc_lod, "indirect.utc_lod")?;
        let format = IND_ALPHA.put_u8(format, self.alpha, "indirect.alpha")?;
        Ok([tex_id, matrix, wrap, format])
    }
}

/// A texture environment stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TevStage {
    pub tex_coord: u8,
    pub color: u8,
    pub tex_map: u16,
    pub ras_sel: u8,
    pub tex_sel: u8,
    pub color_combiner: TevCombiner,
    pub alpha_combiner: TevCombiner,
    pub indirect: IndirectStage,
}

impl From<RawTevStage> for TevStage {
    fn from(raw: RawTevStage) -> Self {
        let order = u32::from(raw.order.get());
        Self {
            tex_coord: raw.tex_coord,
            color: raw.color,
            tex_map: TEX_MAP.get(order) as u16,
            ras_sel: RAS_SEL.get(order) as u8,
            tex_sel: TEX_SEL.get(order) as u8,
            color_combiner: TevCombiner::unpack(raw.color_combiner),
            alpha_combiner: TevCombiner::unpack(raw.alpha_combiner),
            indirect: IndirectStage::unpack(raw.indirect),
        }
    }
}

impl RawTevStage {
    pub(crate) fn pack(stage: &TevStage) -> Result<Self> {
        let order = TEX_MAP.put(0, u32::from(stage.tex_map), "tev_stage.tex_map")?;
        let order = RAS_SEL.put(order, u32::from(stage.ras_sel), "tev_stage.ras_sel")?;
        let order = TEX_SEL.put(order, u32::from(stage.tex_sel), "tev_stage.tex_sel")?;
        Ok(Self {
            tex_coord: stage.tex_coord,
            color: stage.color,
            order: U16::new(order as u16),
            color_combiner: stage.color_combiner.pack()?,
            alpha_combiner: stage.alpha_combiner.pack()?,
            indirect: stage.indirect.pack()?,
        })
    }
}

/// Channel routing of one swap table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapMode {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SwapMode {
    fn unpack(byte: u8) -> Self {
        Self {
            r: SWAP_R.get_u8(byte),
            g: SWAP_G.get_u8(byte),
            b: SWAP_B.get_u8(byte),
            a: SWAP_A.get_u8(byte),
        }
    }

    fn pack(&self) -> Result<u8> {
        let byte = SWAP_R.put_u8(0, self.r, "swap_mode.r")?;
        let byte = SWAP_G.put_u8(byte, self.g, "swap_mode.g")?;
        let byte = SWAP_B.put_u8(byte, self.b, "swap_mode.b")?;
        SWAP_A.put_u8(byte, self.a, "swap_mode.a")
    }
}

/// The four-entry TEV swap table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TevSwapTable {
    pub modes: [SwapMode; 4],
}

impl TevSwapTable {
    pub(crate) fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            modes: bytes.map(SwapMode::unpack),
        }
    }

    pub(crate) fn to_bytes(self) -> Result<[u8; 4]> {
        let mut bytes = [0; 4];
        for (byte, mode) in bytes.iter_mut().zip(&self.modes) {
            *byte = mode.pack()?;
        }
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlphaCompare {
    pub comp0: u8,
    pub comp1: u8,
    pub op: u8,
    pub ref0: u8,
    pub ref1: u8,
}

impl AlphaCompare {
    pub(crate) fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            comp0: COMPARE_0.get_u8(bytes[0]),
            comp1: COMPARE_1.get_u8(bytes[0]),
            op: bytes[1],
            ref0: bytes[2],
            ref1: bytes[3],
        }
    }

    pub(crate) fn to_bytes(self) -> Result<[u8; 4]> {
        let compare = COMPARE_0.put_u8(0, self.comp0, "alpha_compare.comp0")?;
        let compare = COMPARE_1.put_u8(compare, self.comp1, "alpha_compare.comp1")?;
        Ok([compare, self.op, self.ref0, self.ref1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn raw_stage(bytes: [u8; 16]) -> RawTevStage {
        RawTevStage::read_from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_stage_fields() {
        let stage = TevStage::from(raw_stage([
            0x01, 0x04, // tex coord, color
            0b0111_1011, 0b0000_0011, // tex sel 15, ras sel 1, tex map 259
            0x21, 0x43, 0b1110_0101, 0b0001_0101, // a1 b2 c3 d4, op5 bias2 scale3, clamp1 reg2 const2
            0xFA, 0xF0, 0x0F, 0xFF, // alpha combiner
            0x03, 0b0101_1110, 0b0010_1001, 0b1010_1101, // indirect
        ]));

        assert_eq!(stage.tex_coord, 1);
        assert_eq!(stage.color, 4);
        assert_eq!(stage.tex_sel, 15);
        assert_eq!(stage.ras_sel, 1);
        assert_eq!(stage.tex_map, 259);

        let color = stage.color_combiner;
        assert_eq!((color.a, color.b, color.c, color.d), (1, 2, 3, 4));
        assert_eq!((color.op, color.bias, color.scale), (5, 2, 3));
        assert_eq!((color.clamp, color.register, color.constant_sel), (1, 2, 2));

        let alpha = stage.alpha_combiner;
        assert_eq!((alpha.a, alpha.b, alpha.c, alpha.d), (10, 15, 0, 15));
        assert_eq!((alpha.clamp, alpha.register, alpha.constant_sel), (1, 3, 31));

        let indirect = stage.indirect;
        assert_eq!(indirect.tex_id, 3);
        assert_eq!((indirect.bias, indirect.matrix), (6, 11));
        assert_eq!((indirect.wrap_s, indirect.wrap_t), (1, 5));
        assert_eq!(
            (indirect.format, indirect.add_previous, indirect.utc_lod, indirect.alpha),
            (1, 1, 1, 10)
        );
    }

    #[test]
    fn test_stage_repacks_exactly() {
        let bytes = [
            0x00, 0xFF, 0xFF, 0xFF, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01, 0xFF,
            0x3F, 0xFF,
        ];
        let stage = TevStage::from(raw_stage(bytes));
        assert_eq!(RawTevStage::pack(&stage).unwrap().as_bytes(), &bytes);
    }

    #[test]
    fn test_stage_rejects_wide_fields() {
        let stage = TevStage {
            tex_map: 600,
            ..TevStage::default()
        };
        assert!(matches!(
            RawTevStage::pack(&stage),
            Err(Error::FieldOutOfRange { field: "tev_stage.tex_map", value: 600, max: 511 })
        ));

        let mut stage = TevStage::default();
        stage.color_combiner.scale = 4;
        assert!(matches!(
            RawTevStage::pack(&stage),
            Err(Error::FieldOutOfRange { field: "tev_combiner.scale", .. })
        ));

        let mut stage = TevStage::default();
        stage.indirect.wrap_t = 8;
        assert!(matches!(
            RawTevStage::pack(&stage),
            Err(Error::FieldOutOfRange { field: "indirect.wrap_t", value: 8, max: 7 })
        ));
    }

    #[test]
    fn test_swap_table_rejects_wide_fields() {
        let mut table = TevSwapTable::default();
        table.modes[2].g = 4;
        assert!(matches!(
            table.to_bytes(),
            Err(Error::FieldOutOfRange { field: "swap_mode.g", value: 4, max: 3 })
        ));
    }

    #[test]
    fn test_alpha_compare_rejects_wide_fields() {
        let compare = AlphaCompare {
            comp0: 9,
            ..AlphaCompare::default()
        };
        assert!(matches!(
            compare.to_bytes(),
            Err(Error::FieldOutOfRange { field: "alpha_compare.comp0", value: 9, max: 7 })
        ));
    }

    #[test]
    fn test_swap_table() {
        let bytes = [0b11_10_01_00, 0b00_01_10_11, 0xFF, 0x00];
        let table = TevSwapTable::from_bytes(bytes);
        assert_eq!(
            table.modes[0],
            SwapMode {
                r: 0,
                g: 1,
                b: 2,
                a: 3
            }
        );
        assert_eq!(table.modes[1].r, 3);
        assert_eq!(table.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_alpha_compare() {
        let compare = AlphaCompare::from_bytes([0x63, 1, 128, 255]);
        assert_eq!((compare.comp0, compare.comp1), (3, 6));
        assert_eq!((compare.op, compare.ref0, compare.ref1), (1, 128, 255));
        assert_eq!(compare.to_bytes().unwrap(), [0x63, 1, 128, 255]);
    }
}
