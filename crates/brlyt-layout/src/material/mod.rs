//! Materials (`mat1`).
//!
//! Each material is a fixed 64-byte header followed by optional substructures. Which
//! substructures are present, and how many of each, is encoded in ranges of the header's
//! 32-bit flag word; they always appear in the order of [`Material`]'s fields.
//!
//! The flag word is not stored on [`Material`] as such. Ranges owned by a substructure
//! are recomputed from the lists and options on encode, and all other bits are carried
//! in [`Material::reserved_flags`].

mod bits;
mod tev;

pub use bits::{BitField, FlagRange};
pub use tev::{AlphaCompare, IndirectStage, SwapMode, TevCombiner, TevStage, TevSwapTable};

use brlyt_common::big_endian::{F32, I16, U16, U32};
use brlyt_common::{BinaryReader, BinaryWriter};
use tracing::debug;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::section::{begin_section, finish_section, SectionHeader};
use crate::strings::{decode_fixed, encode_fixed};
use crate::types::{Color16, Color8, Vec2};
use crate::{Error, Result, SectionKind};
use tev::RawTevStage;

/// Width of the material name field.
pub const MATERIAL_NAME_LEN: usize = 20;

/// Flag word ranges, MSB-first.
pub mod flags {
    use super::FlagRange;

    pub const TEXTURES: FlagRange = FlagRange::new(28, 31);
    pub const TEXTURE_SRTS: FlagRange = FlagRange::new(24, 27);
    pub const TEX_COORD_GENS: FlagRange = FlagRange::new(20, 23);
    pub const TEV_SWAP: FlagRange = FlagRange::bit(19);
    pub const INDIRECT_SRTS: FlagRange = FlagRange::new(17, 18);
    pub const INDIRECT_ORDERS: FlagRange = FlagRange::new(14, 16);
    pub const TEV_STAGES: FlagRange = FlagRange::new(9, 13);
    pub const ALPHA_COMPARE: FlagRange = FlagRange::bit(8);
    pub const BLEND_MODE: FlagRange = FlagRange::bit(7);
    pub const CHAN_CONTROL: FlagRange = FlagRange::bit(6);
    pub const MATERIAL_COLOR: FlagRange = FlagRange::bit(4);

    /// Every bit owned by a substructure.
    pub const OWNED: u32 = TEXTURES.mask()
        | TEXTURE_SRTS.mask()
        | TEX_COORD_GENS.mask()
        | TEV_SWAP.mask()
        | INDIRECT_SRTS.mask()
        | INDIRECT_ORDERS.mask()
        | TEV_STAGES.mask()
        | ALPHA_COMPARE.mask()
        | BLEND_MODE.mask()
        | CHAN_CONTROL.mask()
        | MATERIAL_COLOR.mask();
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawMaterialHeader {
    name: [u8; MATERIAL_NAME_LEN],
    fore_color: [I16; 4],
    back_color: [I16; 4],
    color_reg3: [I16; 4],
    tev_colors: [[u8; 4]; 4],
    flags: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawTextureRef {
    texture_index: U16,
    wrap_s: u8,
    wrap_t: u8,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawSrt {
    translate: [F32; 2],
    rotation: F32,
    scale: [F32; 2],
}

/// A texture used by a material, referenced by its name in the texture table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureRef {
    pub name: String,
    pub wrap_s: u8,
    pub wrap_t: u8,
}

/// Scale/rotate/translate transform of a texture or indirect texture.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureSrt {
    pub translate: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for TextureSrt {
    fn default() -> Self {
        Self {
            translate: Vec2::default(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl From<RawSrt> for TextureSrt {
    fn from(raw: RawSrt) -> Self {
        Self {
            translate: Vec2::new(raw.translate[0].get(), raw.translate[1].get()),
            rotation: raw.rotation.get(),
            scale: Vec2::new(raw.scale[0].get(), raw.scale[1].get()),
        }
    }
}

impl From<&TextureSrt> for RawSrt {
    fn from(srt: &TextureSrt) -> Self {
        Self {
            translate: [srt.translate.x, srt.translate.y].map(F32::new),
            rotation: F32::new(srt.rotation),
            scale: [srt.scale.x, srt.scale.y].map(F32::new),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TexCoordGen {
    pub gen_type: u8,
    pub source: u8,
    pub matrix: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChanControl {
    pub color_source: u8,
    pub alpha_source: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndirectOrder {
    pub tex_coord: u8,
    pub tex_map: u8,
    pub scale_s: u8,
    pub scale_t: u8,
}

/// Framebuffer blending, kept as the four raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendMode {
    pub blend_type: u8,
    pub source: u8,
    pub destination: u8,
    pub logic_op: u8,
}

/// A material definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub name: String,
    pub fore_color: Color16,
    pub back_color: Color16,
    pub color_reg3: Color16,
    pub tev_colors: [Color8; 4],
    /// Flag word bits that no substructure owns.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reserved_flags: u32,
    pub textures: Vec<TextureRef>,
    pub texture_srts: Vec<TextureSrt>,
    pub tex_coord_gens: Vec<TexCoordGen>,
    pub chan_control: Option<ChanControl>,
    pub material_color: Option<Color8>,
    pub tev_swap: Option<TevSwapTable>,
    pub indirect_srts: Vec<TextureSrt>,
    pub indirect_orders: Vec<IndirectOrder>,
    pub tev_stages: Vec<TevStage>,
    pub alpha_compare: Option<AlphaCompare>,
    pub blend_mode: Option<BlendMode>,
}

impl Material {
    /// A material with no substructures.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fore_color: Color16::default(),
            back_color: Color16::default(),
            color_reg3: Color16::default(),
            tev_colors: [Color8::default(); 4],
            reserved_flags: 0,
            textures: Vec::new(),
            texture_srts: Vec::new(),
            tex_coord_gens: Vec::new(),
            chan_control: None,
            material_color: None,
            tev_swap: None,
            indirect_srts: Vec::new(),
            indirect_orders: Vec::new(),
            tev_stages: Vec::new(),
            alpha_compare: None,
            blend_mode: None,
        }
    }

    /// Compute the flag word that describes this material's substructures.
    pub fn flag_word(&self) -> Result<u32> {
        let counted = [
            (flags::TEXTURES, self.textures.len(), "texture references"),
            (flags::TEXTURE_SRTS, self.texture_srts.len(), "texture SRTs"),
            (flags::TEX_COORD_GENS, self.tex_coord_gens.len(), "texcoord generators"),
            (flags::INDIRECT_SRTS, self.indirect_srts.len(), "indirect SRTs"),
            (flags::INDIRECT_ORDERS, self.indirect_orders.len(), "indirect orders"),
            (flags::TEV_STAGES, self.tev_stages.len(), "TEV stages"),
        ];
        let present = [
            (flags::CHAN_CONTROL, self.chan_control.is_some()),
            (flags::MATERIAL_COLOR, self.material_color.is_some()),
            (flags::TEV_SWAP, self.tev_swap.is_some()),
            (flags::ALPHA_COMPARE, self.alpha_compare.is_some()),
            (flags::BLEND_MODE, self.blend_mode.is_some()),
        ];

        let mut word = self.reserved_flags & !flags::OWNED;
        for (range, count, what) in counted {
            if count > range.max() as usize {
                return Err(Error::TooManyEntries {
                    what,
                    count,
                    max: range.max() as usize,
                });
            }
            word = range.insert(word, count as u32);
        }
        for (range, is_present) in present {
            word = range.insert(word, u32::from(is_present));
        }
        Ok(word)
    }

    /// Decode one material, resolving texture indices against `textures`.
    pub(crate) fn read(reader: &mut BinaryReader<'_>, textures: &[String]) -> Result<Self> {
        let header: RawMaterialHeader = reader.read_struct()?;
        let word = header.flags.get();
        let count = |range: FlagRange| range.extract(word) as usize;
        let present = |range: FlagRange| range.extract(word) == 1;

        let mut material = Self::new(decode_fixed(&header.name)?);
        material.fore_color = color16(header.fore_color);
        material.back_color = color16(header.back_color);
        material.color_reg3 = color16(header.color_reg3);
        material.tev_colors = header.tev_colors.map(Color8::from_bytes);
        material.reserved_flags = word & !flags::OWNED;

        for _ in 0..count(flags::TEXTURES) {
            let raw: RawTextureRef = reader.read_struct()?;
            let index = raw.texture_index.get();
            let name = textures
                .get(index as usize)
                .ok_or(Error::TextureIndexOutOfRange {
                    index,
                    count: textures.len(),
                })?;
            material.textures.push(TextureRef {
                name: name.clone(),
                wrap_s: raw.wrap_s,
                wrap_t: raw.wrap_t,
            });
        }
        for _ in 0..count(flags::TEXTURE_SRTS) {
            material.texture_srts.push(reader.read_struct::<RawSrt>()?.into());
        }
        for _ in 0..count(flags::TEX_COORD_GENS) {
            let [gen_type, source, matrix, _] = reader.read_array()?;
            material.tex_coord_gens.push(TexCoordGen {
                gen_type,
                source,
                matrix,
            });
        }
        if present(flags::CHAN_CONTROL) {
            let [color_source, alpha_source, _, _] = reader.read_array()?;
            material.chan_control = Some(ChanControl {
                color_source,
                alpha_source,
            });
        }
        if present(flags::MATERIAL_COLOR) {
            material.material_color = Some(Color8::from_bytes(reader.read_array()?));
        }
        if present(flags::TEV_SWAP) {
            material.tev_swap = Some(TevSwapTable::from_bytes(reader.read_array()?));
        }
        for _ in 0..count(flags::INDIRECT_SRTS) {
            material.indirect_srts.push(reader.read_struct::<RawSrt>()?.into());
        }
        for _ in 0..count(flags::INDIRECT_ORDERS) {
            let [tex_coord, tex_map, scale_s, scale_t] = reader.read_array()?;
            material.indirect_orders.push(IndirectOrder {
                tex_coord,
                tex_map,
                scale_s,
                scale_t,
            });
        }
        for _ in 0..count(flags::TEV_STAGES) {
            material.tev_stages.push(reader.read_struct::<RawTevStage>()?.into());
        }
        if present(flags::ALPHA_COMPARE) {
            material.alpha_compare = Some(AlphaCompare::from_bytes(reader.read_array()?));
        }
        if present(flags::BLEND_MODE) {
            let [blend_type, source, destination, logic_op] = reader.read_array()?;
            material.blend_mode = Some(BlendMode {
                blend_type,
                source,
                destination,
                logic_op,
            });
        }
        Ok(material)
    }

    /// Encode one material, resolving texture names against `textures`.
    pub(crate) fn write(&self, writer: &mut BinaryWriter, textures: &[String]) -> Result<()> {
        let word = self.flag_word()?;
        writer.write_struct(&RawMaterialHeader {
            name: encode_fixed(&self.name)?,
            fore_color: raw_color16(self.fore_color),
            back_color: raw_color16(self.back_color),
            color_reg3: raw_color16(self.color_reg3),
            tev_colors: self.tev_colors.map(Color8::to_bytes),
            flags: U32::new(word),
        });

        for texture in &self.textures {
            let index = textures
                .iter()
                .position(|name| *name == texture.name)
                .ok_or_else(|| Error::UnresolvedTextureName(texture.name.clone()))?;
            writer.write_struct(&RawTextureRef {
                texture_index: U16::new(index as u16),
                wrap_s: texture.wrap_s,
                wrap_t: texture.wrap_t,
            });
        }
        for srt in &self.texture_srts {
            writer.write_struct(&RawSrt::from(srt));
        }
        for gen in &self.tex_coord_gens {
            writer.write_bytes(&[gen.gen_type, gen.source, gen.matrix, 0]);
        }
        if let Some(chan) = &self.chan_control {
            writer.write_bytes(&[chan.color_source, chan.alpha_source, 0, 0]);
        }
        if let Some(color) = self.material_color {
            writer.write_bytes(&color.to_bytes());
        }
        if let Some(swap) = self.tev_swap {
            writer.write_bytes(&swap.to_bytes()?);
        }
        for srt in &self.indirect_srts {
            writer.write_struct(&RawSrt::from(srt));
        }
        for order in &self.indirect_orders {
            writer.write_bytes(&[order.tex_coord, order.tex_map, order.scale_s, order.scale_t]);
        }
        for stage in &self.tev_stages {
            writer.write_struct(&RawTevStage::pack(stage)?);
        }
        if let Some(compare) = self.alpha_compare {
            writer.write_bytes(&compare.to_bytes()?);
        }
        if let Some(blend) = &self.blend_mode {
            writer.write_bytes(&[blend.blend_type, blend.source, blend.destination, blend.logic_op]);
        }
        Ok(())
    }
}

fn color16(raw: [I16; 4]) -> Color16 {
    let [r, g, b, a] = raw.map(|v| v.get());
    Color16::new(r, g, b, a)
}

fn raw_color16(color: Color16) -> [I16; 4] {
    [color.r, color.g, color.b, color.a].map(I16::new)
}

/// Decode a `mat1` payload.
///
/// Material offsets are relative to the section start. Each material is decoded from the
/// bytes between its offset and the next one, so a flag word that claims more data than
/// the material holds is reported as truncation.
pub fn decode_materials(payload: &[u8], textures: &[String]) -> Result<Vec<Material>> {
    let mut reader = BinaryReader::new(payload);
    let count = reader.read_u16()? as usize;
    reader.skip(2)?;

    let mut bounds = Vec::with_capacity(count + 1);
    for _ in 0..count {
        let offset = reader.read_u32()? as usize;
        let start = offset
            .checked_sub(SectionHeader::SIZE)
            .ok_or(Error::InvalidOffset {
                offset,
                len: payload.len(),
            })?;
        bounds.push(start);
    }
    bounds.push(payload.len());

    let mut materials = Vec::with_capacity(count);
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start > end || end > payload.len() {
            return Err(Error::InvalidOffset {
                offset: start + SectionHeader::SIZE,
                len: payload.len(),
            });
        }
        let mut material_reader = BinaryReader::new(&payload[start..end]);
        let material = Material::read(&mut material_reader, textures)?;
        debug!(
            name = %material.name,
            textures = material.textures.len(),
            tev_stages = material.tev_stages.len(),
            "decoded material"
        );
        materials.push(material);
    }
    Ok(materials)
}

/// Write a complete `mat1` section.
pub fn encode_materials(
    writer: &mut BinaryWriter,
    materials: &[Material],
    textures: &[String],
) -> Result<()> {
    let count = u16::try_from(materials.len()).map_err(|_| Error::TooManyEntries {
        what: "materials",
        count: materials.len(),
        max: u16::MAX as usize,
    })?;

    let start = begin_section(writer, SectionKind::Materials);
    writer.write_u16(count);
    writer.write_u16(0);
    let table = writer.position();
    writer.write_zeros(materials.len() * 4);

    for (index, material) in materials.iter().enumerate() {
        let offset = writer.position() - start;
        writer.patch_u32(table + index * 4, offset as u32)?;
        material.write(writer, textures)?;
    }
    finish_section(writer, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textures() -> Vec<String> {
        vec!["tex_a".to_string(), "tex_b".to_string()]
    }

    fn encode(materials: &[Material]) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        encode_materials(&mut writer, materials, &textures()).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<RawMaterialHeader>(), 64);
        assert_eq!(std::mem::size_of::<RawSrt>(), 20);
        assert_eq!(std::mem::size_of::<RawTevStage>(), 16);
    }

    #[test]
    fn test_two_texture_refs_resolve_by_index() {
        let mut payload = vec![0, 1, 0, 0, 0, 0, 0, 16];
        let mut header = [0u8; 64];
        header[..6].copy_from_slice(b"M_pic\0");
        header[60..].copy_from_slice(&2u32.to_be_bytes());
        payload.extend_from_slice(&header);
        payload.extend_from_slice(&[0, 0, 0, 1, 0, 1, 2, 2]);

        let materials = decode_materials(&payload, &textures()).unwrap();
        assert_eq!(materials.len(), 1);
        let names: Vec<_> = materials[0].textures.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["tex_a", "tex_b"]);
        assert_eq!(materials[0].textures[1].wrap_s, 2);

        let bytes = encode(&materials);
        assert_eq!(&bytes[8..], &payload[..]);
    }

    #[test]
    fn test_texture_index_out_of_range() {
        let mut payload = vec![0, 1, 0, 0, 0, 0, 0, 16];
        let mut header = [0u8; 64];
        header[60..].copy_from_slice(&1u32.to_be_bytes());
        payload.extend_from_slice(&header);
        payload.extend_from_slice(&[0, 5, 0, 0]);
        assert!(matches!(
            decode_materials(&payload, &textures()),
            Err(Error::TextureIndexOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_unresolved_texture_name() {
        let mut material = Material::new("M_bad");
        material.textures.push(TextureRef {
            name: "missing".to_string(),
            wrap_s: 0,
            wrap_t: 0,
        });
        let mut writer = BinaryWriter::new();
        assert!(matches!(
            encode_materials(&mut writer, &[material], &textures()),
            Err(Error::UnresolvedTextureName(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_flag_word_is_recomputed() {
        let mut material = Material::new("M_full");
        material.reserved_flags = 0x8000_0000 | flags::TEXTURES.mask();
        material.tex_coord_gens.push(TexCoordGen::default());
        material.chan_control = Some(ChanControl {
            color_source: 1,
            alpha_source: 0,
        });
        material.blend_mode = Some(BlendMode::default());
        material.tev_stages = vec![TevStage::default(); 3];

        let word = material.flag_word().unwrap();
        assert_eq!(word & 0x8000_0000, 0x8000_0000);
        assert_eq!(flags::TEXTURES.extract(word), 0);
        assert_eq!(flags::TEX_COORD_GENS.extract(word), 1);
        assert_eq!(flags::TEV_STAGES.extract(word), 3);
        assert_eq!(flags::CHAN_CONTROL.extract(word), 1);
        assert_eq!(flags::BLEND_MODE.extract(word), 1);
        assert_eq!(flags::ALPHA_COMPARE.extract(word), 0);
    }

    #[test]
    fn test_too_many_indirect_srts() {
        let mut material = Material::new("M_ind");
        material.indirect_srts = vec![TextureSrt::default(); 4];
        assert!(matches!(
            material.flag_word(),
            Err(Error::TooManyEntries { max: 3, count: 4, .. })
        ));
    }

    #[test]
    fn test_full_material_round_trip() {
        let mut material = Material::new("M_window_frame_01");
        material.fore_color = Color16::new(-1, 0, 255, 1023);
        material.tev_colors[2] = Color8::new(1, 2, 3, 4);
        material.reserved_flags = 0x0400_0000;
        material.textures = vec![
            TextureRef {
                name: "tex_b".to_string(),
                wrap_s: 1,
                wrap_t: 2,
            },
            TextureRef {
                name: "tex_a".to_string(),
                wrap_s: 0,
                wrap_t: 0,
            },
        ];
        material.texture_srts = vec![TextureSrt {
            translate: Vec2::new(0.5, -0.5),
            rotation: 90.0,
            scale: Vec2::new(2.0, 1.0),
        }];
        material.tex_coord_gens = vec![TexCoordGen {
            gen_type: 1,
            source: 4,
            matrix: 30,
        }];
        material.chan_control = Some(ChanControl {
            color_source: 1,
            alpha_source: 0,
        });
        material.material_color = Some(Color8::new(10, 20, 30, 40));
        material.tev_swap = Some(TevSwapTable::default());
        material.indirect_srts = vec![TextureSrt::default()];
        material.indirect_orders = vec![IndirectOrder {
            tex_coord: 1,
            tex_map: 1,
            scale_s: 2,
            scale_t: 3,
        }];
        material.tev_stages = vec![TevStage {
            tex_map: 1,
            tex_sel: 3,
            ..TevStage::default()
        }];
        material.alpha_compare = Some(AlphaCompare {
            comp0: 7,
            comp1: 6,
            op: 1,
            ref0: 0,
            ref1: 255,
        });
        material.blend_mode = Some(BlendMode {
            blend_type: 1,
            source: 4,
            destination: 5,
            logic_op: 15,
        });

        let second = Material::new("M_plain");
        let bytes = encode(&[material.clone(), second.clone()]);
        assert_eq!(bytes.len() % 4, 0);
        // count, then offsets relative to the section start
        assert_eq!(&bytes[8..12], &[0, 2, 0, 0]);
        assert_eq!(&bytes[12..16], &20u32.to_be_bytes());

        let decoded = decode_materials(&bytes[8..], &textures()).unwrap();
        assert_eq!(decoded, vec![material, second]);
    }

    #[test]
    fn test_wide_packed_field_fails_encode() {
        let mut material = Material::new("M_wide");
        material.alpha_compare = Some(AlphaCompare {
            comp0: 9,
            ..AlphaCompare::default()
        });
        let mut writer = BinaryWriter::new();
        assert!(matches!(
            encode_materials(&mut writer, &[material], &textures()),
            Err(Error::FieldOutOfRange { field: "alpha_compare.comp0", value: 9, max: 7 })
        ));

        let mut material = Material::new("M_wide");
        material.tev_stages = vec![TevStage {
            ras_sel: 5,
            ..TevStage::default()
        }];
        let mut writer = BinaryWriter::new();
        assert!(matches!(
            encode_materials(&mut writer, &[material], &textures()),
            Err(Error::FieldOutOfRange { field: "tev_stage.ras_sel", value: 5, max: 3 })
        ));
    }

    #[test]
    fn test_material_color_keeps_rgba_order() {
        let mut material = Material::new("M_color");
        material.material_color = Some(Color8::new(1, 2, 3, 4));
        let bytes = encode(&[material]);
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_flag_claims_more_than_material_holds() {
        let mut payload = vec![0, 1, 0, 0, 0, 0, 0, 16];
        let mut header = [0u8; 64];
        header[60..].copy_from_slice(&flags::TEV_STAGES.insert(0, 1).to_be_bytes());
        payload.extend_from_slice(&header);
        payload.extend_from_slice(&[0; 8]);
        assert!(decode_materials(&payload, &[]).unwrap_err().is_truncated());
    }
}
