//! Common utilities for the brlyt crates.
//!
//! This crate provides the byte-level substrate the layout codec is built on:
//!
//! - [`BinaryReader`] - Zero-copy big-endian cursor over a byte slice, with peek and unread
//! - [`BinaryWriter`] - Growable big-endian output buffer with backpatching
//! - [`Error`] - Truncation and string decoding failures

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Re-export the big-endian field types used by fixed-layout records
pub use zerocopy::byteorder::big_endian;
