//! The WOFF2 collection directory.
//!
//! <https://www.w3.org/TR/WOFF2/#collection_dir_format>

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::U32Be;
use crate::error::{ParseError, Woff2Error, WriteError};
use crate::woff2::PackedU16;

/// Collection header version 1.0
pub const VERSION_1: u32 = 0x00010000;
/// Collection header version 2.0
pub const VERSION_2: u32 = 0x00020000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDirectory {
    /// The version of the TrueType collection header
    pub version: u32,
    pub fonts: Vec<CollectionFontEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFontEntry {
    pub flavor: u32,
    /// Indices into the table directory
    pub table_indices: Vec<u16>,
}

impl ReadBinary for CollectionFontEntry {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let num_tables = ctxt.read::<PackedU16>()?;
        let flavor = ctxt.read_u32be()?;
        let table_indices = (0..num_tables)
            .map(|_i| ctxt.read::<PackedU16>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CollectionFontEntry {
            flavor,
            table_indices,
        })
    }
}

impl ReadBinary for CollectionDirectory {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_fonts = ctxt.read::<PackedU16>()?;
        let fonts = (0..num_fonts)
            .map(|_i| ctxt.read::<CollectionFontEntry>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CollectionDirectory { version, fonts })
    }
}

impl WriteBinary<&Self> for CollectionDirectory {
    type Output = ();

    fn write<C: WriteContext>(
        ctxt: &mut C,
        directory: &CollectionDirectory,
    ) -> Result<(), WriteError> {
        U32Be::write(ctxt, directory.version)?;
        PackedU16::write(ctxt, u16::try_from(directory.fonts.len())?)?;
        for font in &directory.fonts {
            PackedU16::write(ctxt, u16::try_from(font.table_indices.len())?)?;
            U32Be::write(ctxt, font.flavor)?;
            for &index in &font.table_indices {
                PackedU16::write(ctxt, index)?;
            }
        }

        Ok(())
    }
}

impl CollectionDirectory {
    /// Read the collection directory and check it against a table directory of `num_tables`
    /// entries.
    pub fn read_checked(ctxt: &mut ReadCtxt<'_>, num_tables: usize) -> Result<Self, Woff2Error> {
        let directory = ctxt
            .read::<CollectionDirectory>()
            .map_err(|_| Woff2Error::corrupt(None, "collection directory is truncated"))?;

        if directory.version != VERSION_1 && directory.version != VERSION_2 {
            return Err(Woff2Error::corrupt(None, "unknown collection version"));
        }
        if directory.fonts.is_empty() {
            return Err(Woff2Error::corrupt(None, "collection has no fonts"));
        }
        for font in &directory.fonts {
            for (i, &index) in font.table_indices.iter().enumerate() {
                if usize::from(index) >= num_tables {
                    return Err(Woff2Error::corrupt(None, "table index out of range"));
                }
                if font.table_indices[..i].contains(&index) {
                    return Err(Woff2Error::corrupt(None, "table listed twice in font"));
                }
            }
        }

        Ok(directory)
    }

    /// The major version of the TrueType collection header
    pub fn major_version(&self) -> u16 {
        (self.version >> 16) as u16
    }

    pub fn get(&self, index: usize) -> Option<&CollectionFontEntry> {
        self.fonts.get(index)
    }
}
