//! Reading and writing of the WOFF2 font format.
//!
//! <https://www.w3.org/TR/WOFF2/>

pub mod collection;
mod compress;
pub mod decode;
pub mod directory;
pub mod encode;
pub mod glyf;
pub mod hmtx;
mod lut;

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, Woff2Error, WriteError};
use crate::tables::{FontTableProvider, TTCF_MAGIC};
use crate::tag;

pub use self::collection::{CollectionDirectory, CollectionFontEntry};
pub use self::decode::{decode, decode_with_options, DecodeState};
pub use self::directory::{TableDirectoryEntry, TableEntry};
pub use self::encode::encode;
pub use self::glyf::TransformOutcome;

pub const MAGIC: u32 = tag::WOF2;

/// The size in bytes of the WOFF2 header
pub const HEADER_SIZE: usize = 48;

const LOWEST_UCODE: u16 = 253;

/// UIntBase128, Variable-length encoding of 32-bit unsigned integers.
#[derive(Copy, Clone)]
pub enum U32Base128 {}

/// 255UInt16, Variable-length encoding of a 16-bit unsigned integer for optimized intermediate
/// font data storage.
#[derive(Copy, Clone)]
pub enum PackedU16 {}

/// Options that control encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Brotli quality from 0 (fastest) to 11 (smallest). Larger values are treated as 11.
    pub compression_effort: u8,
    /// Apply the `glyf`/`loca` transform where the glyph data allows it.
    pub transform_glyf_loca: bool,
    /// Apply the `hmtx` transform where the metrics allow it. Only used when `glyf` is
    /// transformed and the input is not a collection.
    pub transform_hmtx: bool,
    /// Keep tables in the order they are laid out in the input instead of tag order.
    pub preserve_table_order: bool,
    /// Extended metadata XML.
    pub metadata: Option<String>,
    /// Private data block, stored as is.
    pub private_data: Option<Vec<u8>>,
}

/// Options that control decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Fail with `ChecksumMismatch` when the `checkSumAdjustment` carried by the `head` table
    /// differs from the value calculated for the decoded font.
    pub verify_checksums: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff2Header {
    pub flavor: u32,
    pub length: u32,
    pub num_tables: u16,
    pub total_sfnt_size: u32,
    pub total_compressed_size: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub meta_offset: u32,
    pub meta_length: u32,
    pub meta_orig_length: u32,
    pub priv_offset: u32,
    pub priv_length: u32,
}

/// A parsed WOFF2 file with its table data decompressed.
///
/// Transformed tables are stored in their transformed form, use `table_provider` to get at the
/// reconstructed tables of a font.
pub struct Woff2Font<'a> {
    pub scope: ReadScope<'a>,
    pub header: Woff2Header,
    pub table_directory: Vec<TableDirectoryEntry>,
    pub collection_directory: Option<CollectionDirectory>,
    pub table_data: Vec<u8>,
}

/// Serves the reconstructed tables of one font in a WOFF2 file.
pub struct Woff2TableProvider {
    flavor: u32,
    tables: FxHashMap<u32, Box<[u8]>>,
}

pub struct BitSlice<'a> {
    data: &'a [u8],
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            compression_effort: 11,
            transform_glyf_loca: true,
            transform_hmtx: true,
            preserve_table_order: false,
            metadata: None,
            private_data: None,
        }
    }
}

impl<'a> Woff2Font<'a> {
    /// Parse a WOFF2 file and decompress its table data.
    pub fn read(data: &'a [u8]) -> Result<Self, Woff2Error> {
        decode::read_font(ReadScope::new(data))
    }

    /// The "sfnt version" of the input font
    pub fn flavor(&self) -> u32 {
        self.header.flavor
    }

    pub fn is_collection(&self) -> bool {
        self.collection_directory.is_some()
    }

    /// The number of fonts in this file
    pub fn num_fonts(&self) -> usize {
        self.collection_directory
            .as_ref()
            .map_or(1, |directory| directory.fonts.len())
    }

    /// Decompress and return the extended metadata XML if present
    pub fn extended_metadata(&self) -> Result<Option<String>, Woff2Error> {
        let offset = usize::try_from(self.header.meta_offset)?;
        let length = usize::try_from(self.header.meta_length)?;
        if offset == 0 || length == 0 {
            return Ok(None);
        }

        let compressed_metadata = self.scope.offset_length(offset, length)?;
        let metadata = compress::decompress(
            compressed_metadata.data(),
            usize::try_from(self.header.meta_orig_length)?,
        )?;
        String::from_utf8(metadata)
            .map(Some)
            .map_err(|_| Woff2Error::Decompression("metadata is not valid UTF-8"))
    }

    /// The private data block, if present
    pub fn private_data(&self) -> Result<Option<&'a [u8]>, Woff2Error> {
        let offset = usize::try_from(self.header.priv_offset)?;
        let length = usize::try_from(self.header.priv_length)?;
        if offset == 0 || length == 0 {
            return Ok(None);
        }

        let scope = self.scope.offset_length(offset, length)?;
        Ok(Some(scope.data()))
    }

    /// The data stored for a table directory entry. Transformed tables are returned in their
    /// transformed form.
    pub fn stored_table_data(&self, entry: &TableDirectoryEntry) -> Result<&[u8], ParseError> {
        ReadScope::new(&self.table_data)
            .offset_length(entry.offset, entry.stored_length())
            .map(|scope| scope.data())
    }

    /// The indices into the table directory of the tables of the font at `index`
    pub fn font_table_indices(&self, index: usize) -> Result<Cow<'_, [u16]>, Woff2Error> {
        match &self.collection_directory {
            Some(directory) => directory
                .get(index)
                .map(|font| Cow::Borrowed(font.table_indices.as_slice()))
                .ok_or(Woff2Error::Parse(ParseError::BadIndex)),
            None if index == 0 => {
                let num_tables = u16::try_from(self.table_directory.len())?;
                Ok(Cow::Owned((0..num_tables).collect()))
            }
            None => Err(Woff2Error::Parse(ParseError::BadIndex)),
        }
    }

    /// The "sfnt version" of the font at `index`
    pub fn font_flavor(&self, index: usize) -> Result<u32, Woff2Error> {
        match &self.collection_directory {
            Some(directory) => directory
                .get(index)
                .map(|font| font.flavor)
                .ok_or(Woff2Error::Parse(ParseError::BadIndex)),
            None if index == 0 => Ok(self.header.flavor),
            None => Err(Woff2Error::Parse(ParseError::BadIndex)),
        }
    }

    pub fn find_table_entry(&self, tag: u32, index: usize) -> Option<&TableDirectoryEntry> {
        let indices = self.font_table_indices(index).ok()?;
        indices
            .iter()
            .filter_map(|&index| self.table_directory.get(usize::from(index)))
            .find(|entry| entry.tag == tag)
    }

    /// Reconstruct the tables of the font at `index`.
    pub fn table_provider(&self, index: usize) -> Result<Woff2TableProvider, Woff2Error> {
        let flavor = self.font_flavor(index)?;
        let indices = self.font_table_indices(index)?;
        let mut reconstructed = decode::ReconstructedTables::new(self.table_directory.len());
        reconstructed.reconstruct_font(self, &indices)?;

        let mut tables = FxHashMap::default();
        for &index in indices.iter() {
            let index = usize::from(index);
            let tag = self.table_directory[index].tag;
            if let Some(data) = reconstructed.take(index) {
                tables.insert(tag, data.into_boxed_slice());
            }
        }

        Ok(Woff2TableProvider { flavor, tables })
    }
}

impl Woff2TableProvider {
    pub fn sfnt_version(&self) -> u32 {
        self.flavor
    }

    pub fn into_tables(self) -> FxHashMap<u32, Box<[u8]>> {
        self.tables
    }
}

impl FontTableProvider for Woff2TableProvider {
    fn table_data<'a>(&'a self, tag: u32) -> Result<Option<Cow<'a, [u8]>>, ParseError> {
        Ok(self.tables.get(&tag).map(|table| Cow::from(table.as_ref())))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.tables.contains_key(&tag)
    }
}

impl ReadBinary for Woff2Header {
    type HostType<'a> = Self;

    /// Read the header. Fails with `ParseError::BadVersion` if the signature is not `wOF2` and
    /// `ParseError::BadValue` if the reserved field is not zero.
    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let signature = ctxt.read_u32be()?;
        ctxt.check_version(signature == MAGIC)?;
        let flavor = ctxt.read_u32be()?;
        let length = ctxt.read_u32be()?;
        let num_tables = ctxt.read_u16be()?;
        let reserved = ctxt.read_u16be()?;
        ctxt.check(reserved == 0)?;
        let (total_sfnt_size, total_compressed_size) = ctxt.read::<(U32Be, U32Be)>()?;
        let (major_version, minor_version) = ctxt.read::<(U16Be, U16Be)>()?;
        let (meta_offset, meta_length) = ctxt.read::<(U32Be, U32Be)>()?;
        let meta_orig_length = ctxt.read_u32be()?;
        let (priv_offset, priv_length) = ctxt.read::<(U32Be, U32Be)>()?;

        Ok(Woff2Header {
            flavor,
            length,
            num_tables,
            total_sfnt_size,
            total_compressed_size,
            major_version,
            minor_version,
            meta_offset,
            meta_length,
            meta_orig_length,
            priv_offset,
            priv_length,
        })
    }
}

impl WriteBinary<&Self> for Woff2Header {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, header: &Woff2Header) -> Result<(), WriteError> {
        U32Be::write(ctxt, MAGIC)?;
        U32Be::write(ctxt, header.flavor)?;
        U32Be::write(ctxt, header.length)?;
        U16Be::write(ctxt, header.num_tables)?;
        U16Be::write(ctxt, 0u16)?; // reserved
        U32Be::write(ctxt, header.total_sfnt_size)?;
        U32Be::write(ctxt, header.total_compressed_size)?;
        U16Be::write(ctxt, header.major_version)?;
        U16Be::write(ctxt, header.minor_version)?;
        U32Be::write(ctxt, header.meta_offset)?;
        U32Be::write(ctxt, header.meta_length)?;
        U32Be::write(ctxt, header.meta_orig_length)?;
        U32Be::write(ctxt, header.priv_offset)?;
        U32Be::write(ctxt, header.priv_length)?;

        Ok(())
    }
}

impl Woff2Header {
    pub fn is_collection(&self) -> bool {
        self.flavor == TTCF_MAGIC
    }
}

/// `255UInt16`: values below 253 take one byte, codes 253 to 255 introduce a wider form.
impl ReadBinary for PackedU16 {
    type HostType<'a> = u16;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<u16, ParseError> {
        let code = ctxt.read_u8()?;
        let value = match code {
            0..=252 => u16::from(code),
            253 => ctxt.read_u16be()?,
            254 => LOWEST_UCODE * 2 + u16::from(ctxt.read_u8()?),
            255 => LOWEST_UCODE + u16::from(ctxt.read_u8()?),
        };
        Ok(value)
    }
}

impl WriteBinary<u16> for PackedU16 {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, value: u16) -> Result<(), WriteError> {
        if value < LOWEST_UCODE {
            ctxt.write_bytes(&[value as u8])
        } else if value < LOWEST_UCODE * 2 {
            ctxt.write_bytes(&[255, (value - LOWEST_UCODE) as u8])
        } else if value < LOWEST_UCODE * 3 + 3 {
            ctxt.write_bytes(&[254, (value - LOWEST_UCODE * 2) as u8])
        } else {
            ctxt.write_bytes(&[253])?;
            U16Be::write(ctxt, value)
        }
    }
}

/// `UIntBase128`: big-endian groups of 7 bits, high bit set on every byte but the last. At most
/// five bytes, no leading zero group and no overflow past 32 bits.
impl ReadBinary for U32Base128 {
    type HostType<'a> = u32;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<u32, ParseError> {
        let first = ctxt.read_u8()?;
        ctxt.check(first != 0x80)?;

        let mut value = u32::from(first & 0x7F);
        let mut byte = first;
        for _ in 1..5 {
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            byte = ctxt.read_u8()?;
            value = value
                .checked_mul(128)
                .ok_or(ParseError::BadValue)?
                | u32::from(byte & 0x7F);
        }

        if byte & 0x80 == 0 {
            Ok(value)
        } else {
            Err(ParseError::BadValue)
        }
    }
}

impl WriteBinary<u32> for U32Base128 {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, value: u32) -> Result<(), WriteError> {
        let size = U32Base128::size(value);
        let mut bytes = [0u8; 5];
        for (i, byte) in bytes[..size].iter_mut().enumerate() {
            let shift = 7 * (size - i - 1);
            *byte = ((value >> shift) & 0x7F) as u8;
            if i < size - 1 {
                *byte |= 0x80;
            }
        }
        ctxt.write_bytes(&bytes[..size])
    }
}

impl U32Base128 {
    /// The number of bytes needed to encode `value`
    pub fn size(value: u32) -> usize {
        let bits = 32 - value.leading_zeros() as usize;
        bits.div_ceil(7).max(1)
    }
}

impl<'a> BitSlice<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitSlice { data }
    }

    /// Bit `index`, counting from the most significant bit of the first byte.
    pub fn get(&self, index: usize) -> Option<bool> {
        let byte = self.data.get(index / 8)?;
        Some(byte & (0x80 >> (index % 8)) != 0)
    }

    pub fn len(&self) -> usize {
        self.data.len() * 8
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Set bit `index` of a bitmap laid out as read by `BitSlice`.
pub(crate) fn set_bit(bitmap: &mut [u8], index: usize) {
    bitmap[index / 8] |= 0x80 >> (index % 8);
}
