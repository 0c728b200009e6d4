//! Lossless decoder and encoder for BRLYT layout files.
//!
//! A BRLYT file describes a 2D user interface screen: texture and font tables, materials,
//! and a tree of panes (plain, picture, text, window, bounding) plus a parallel tree of
//! pane groups. The file is a flat, big-endian stream of tagged sections; nesting is
//! expressed by scope marker sections.
//!
//! [`Layout::parse`] builds the in-memory model and [`Layout::to_bytes`] writes it back.
//! For files produced by the authoring tools the two are inverses byte for byte.
//!
//! # Sections
//!
//! - `lyt1` - Screen size ([`LayoutInfo`])
//! - `txl1` / `fnl1` - Texture and font name tables
//! - `mat1` - Materials ([`Material`])
//! - `pan1` `bnd1` `pic1` `txt1` `wnd1` - Panes ([`Node`])
//! - `grp1` - Pane groups ([`Group`])
//! - `pas1`/`pae1`, `grs1`/`gre1` - Child list markers
//!
//! # Example
//!
//! ```no_run
//! use brlyt_layout::Layout;
//!
//! let layout = Layout::open("my_Title.brlyt")?;
//! println!("{} nodes, {} materials", layout.node_count(), layout.materials.len());
//!
//! let xml = layout.to_xml_string()?;
//! let back = Layout::from_xml(&xml)?;
//! assert_eq!(back.to_bytes()?, layout.to_bytes()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod interchange;
mod layout;
mod material;
mod panes;
mod section;
mod strings;
mod tree;
mod types;

pub use error::{Error, Result};
pub use header::{FileHeader, SectionKind};
#[cfg(feature = "xml")]
pub use interchange::Element;
pub use layout::{Layout, LayoutInfo};
pub use material::{
    decode_materials, encode_materials, flags, AlphaCompare, BitField, BlendMode, ChanControl,
    FlagRange, IndirectOrder, IndirectStage, Material, SwapMode, TevCombiner, TevStage,
    TevSwapTable, TexCoordGen, TextureRef, TextureSrt, MATERIAL_NAME_LEN,
};
pub use panes::{
    escape_text, unescape_text, ContentOverflow, Group, Pane, PaneProperties, Picture, Text,
    Window, WindowFrame, PANE_NAME_LEN, PLACEHOLDER_GLYPHS, PLACEHOLDER_SENTINEL, TEXT_OFFSET,
    USER_DATA_LEN,
};
pub use section::{read_header, write_header, Section, SectionHeader, SectionStream};
pub use strings::{decode_string_table, encode_string_table};
pub use tree::{flatten, Node, Record, Scope, MAX_TREE_DEPTH};
pub use types::{
    Color16, Color8, HorizontalOrigin, Origin, PaneFlags, TexCoord, UvSet, Vec2, Vec3,
    VertexColors, VerticalOrigin,
};
