#![warn(rust_2018_idioms)]

//! # WOFF2
//!
//! An encoder and decoder for the WOFF2 web font container.
//!
//! `woff2::encode` compresses a TrueType/OpenType font or TrueType collection, applying the
//! `glyf`/`loca` and `hmtx` table transforms where they can be reversed exactly.
//! `woff2::decode` rebuilds the SFNT font. Fonts that are laid out canonically, with tables in
//! tag order and `loca` following `glyf`, decode to the same bytes that were encoded.

/// Reading and writing of binary data.
pub mod binary;
/// Assembly of SFNT fonts and collections.
pub mod builder;
/// Checksum calculation routines.
pub mod checksum;
pub mod error;
pub mod size;
pub mod tables;
pub mod tag;
/// Shared test code.
#[cfg(test)]
pub mod tests;
pub mod woff2;

pub use crate::error::Woff2Error;
pub use crate::woff2::{decode, decode_with_options, encode, DecodeOptions, EncodeOptions};
