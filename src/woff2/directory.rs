//! The WOFF2 table directory.
//!
//! <https://www.w3.org/TR/WOFF2/#table_dir_format>

use log::debug;

use super::lut::KNOWN_TABLE_TAGS;
use super::U32Base128;
use crate::binary::read::ReadCtxt;
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{U32Be, U8};
use crate::error::{ParseError, Woff2Error, WriteError};
use crate::tag::{self, DisplayTag};

const BITS_0_TO_5: u8 = 0x3F;
const CUSTOM_TAG: u8 = 63;

/// Version of the `glyf`/`loca` transform that leaves the tables unchanged
pub const NULL_TRANSFORM: u8 = 3;

/// How the tag of a table directory entry is stored
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableEntry {
    /// Index into the list of known tags
    Known(u8),
    /// Explicit tag following the flags byte
    Custom(u32),
}

/// An entry in the WOFF2 table directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDirectoryEntry {
    pub tag: u32,
    pub transform_version: u8,
    pub orig_length: u32,
    pub transform_length: Option<u32>,
    /// Offset of the table's data within the decompressed table data
    pub offset: usize,
}

impl TableEntry {
    pub fn from_tag(tag: u32) -> Self {
        KNOWN_TABLE_TAGS
            .iter()
            .position(|&known| known == tag)
            .map_or(TableEntry::Custom(tag), |index| TableEntry::Known(index as u8))
    }

    pub fn tag(self) -> u32 {
        match self {
            TableEntry::Known(index) => KNOWN_TABLE_TAGS[usize::from(index)],
            TableEntry::Custom(tag) => tag,
        }
    }

    fn flags_index(self) -> u8 {
        match self {
            TableEntry::Known(index) => index,
            TableEntry::Custom(_) => CUSTOM_TAG,
        }
    }
}

impl TableDirectoryEntry {
    /// Create an entry for a table, `transform_length` is `Some` if the table is transformed.
    pub fn new(tag: u32, orig_length: u32, transform_length: Option<u32>) -> Self {
        let transform_version = match (tag, transform_length.is_some()) {
            (tag::GLYF, false) | (tag::LOCA, false) => NULL_TRANSFORM,
            (tag::HMTX, true) => 1,
            _ => 0,
        };
        TableDirectoryEntry {
            tag,
            transform_version,
            orig_length,
            transform_length,
            offset: 0,
        }
    }

    pub fn is_transformed(&self) -> bool {
        self.transform_length.is_some()
    }

    /// The number of bytes of table data stored in the compressed stream
    pub fn stored_length(&self) -> usize {
        self.transform_length.unwrap_or(self.orig_length) as usize
    }
}

/// Read `num_tables` table directory entries.
///
/// Entry offsets are assigned on the assumption that table data is stored contiguously in
/// directory order.
pub fn read_table_directory(
    ctxt: &mut ReadCtxt<'_>,
    num_tables: usize,
) -> Result<Vec<TableDirectoryEntry>, Woff2Error> {
    let mut offset = 0usize;
    let mut table_directory = Vec::with_capacity(num_tables);
    for _ in 0..num_tables {
        let mut entry = read_entry(ctxt)?;
        entry.offset = offset;
        offset = offset
            .checked_add(entry.stored_length())
            .ok_or(Woff2Error::corrupt(Some(entry.tag), "table data too large"))?;
        table_directory.push(entry);
    }

    check_glyf_loca_pairs(&table_directory)?;

    Ok(table_directory)
}

fn read_entry(ctxt: &mut ReadCtxt<'_>) -> Result<TableDirectoryEntry, Woff2Error> {
    let truncated = |_: ParseError| Woff2Error::corrupt(None, "table directory is truncated");

    let flags = ctxt.read_u8().map_err(ParseError::from).map_err(truncated)?;
    let table_entry = match flags & BITS_0_TO_5 {
        // Tag is the following 4 bytes
        CUSTOM_TAG => TableEntry::Custom(
            ctxt.read_u32be()
                .map_err(ParseError::from)
                .map_err(truncated)?,
        ),
        index => TableEntry::Known(index),
    };
    let tag = table_entry.tag();
    let transform_version = flags >> 6;
    let orig_length = ctxt
        .read::<U32Base128>()
        .map_err(|_| Woff2Error::corrupt(Some(tag), "invalid origLength"))?;

    let transformed = match (tag, transform_version) {
        (tag::GLYF, 0) | (tag::LOCA, 0) => true,
        (tag::GLYF, NULL_TRANSFORM) | (tag::LOCA, NULL_TRANSFORM) => false,
        (tag::HMTX, 1) => true,
        (_, 0) => false,
        _ => {
            return Err(Woff2Error::unsupported(
                Some(tag),
                "unknown table transform version",
            ))
        }
    };

    let transform_length = if transformed {
        let transform_length = ctxt
            .read::<U32Base128>()
            .map_err(|_| Woff2Error::corrupt(Some(tag), "invalid transformLength"))?;
        if tag == tag::LOCA && transform_length != 0 {
            return Err(Woff2Error::corrupt(
                Some(tag),
                "transform length must be zero",
            ));
        }
        Some(transform_length)
    } else {
        None
    };

    debug!(
        "table '{}' version {} length {} stored {:?}",
        DisplayTag(tag),
        transform_version,
        orig_length,
        transform_length
    );

    Ok(TableDirectoryEntry {
        tag,
        transform_version,
        orig_length,
        transform_length,
        offset: 0,
    })
}

/// A transformed `glyf` must be directly followed by a transformed `loca` and a transformed
/// `loca` must directly follow a transformed `glyf`.
fn check_glyf_loca_pairs(table_directory: &[TableDirectoryEntry]) -> Result<(), Woff2Error> {
    for (index, entry) in table_directory.iter().enumerate() {
        if !entry.is_transformed() {
            continue;
        }
        match entry.tag {
            tag::GLYF => {
                let loca = table_directory.get(index + 1);
                if !loca.map_or(false, |loca| loca.tag == tag::LOCA && loca.is_transformed()) {
                    return Err(Woff2Error::corrupt(
                        Some(tag::GLYF),
                        "transformed glyf must be followed by transformed loca",
                    ));
                }
            }
            tag::LOCA => {
                let glyf = index
                    .checked_sub(1)
                    .and_then(|index| table_directory.get(index));
                if !glyf.map_or(false, |glyf| glyf.tag == tag::GLYF && glyf.is_transformed()) {
                    return Err(Woff2Error::corrupt(
                        Some(tag::LOCA),
                        "transformed loca must follow transformed glyf",
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

impl WriteBinary<&Self> for TableDirectoryEntry {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, entry: &TableDirectoryEntry) -> Result<(), WriteError> {
        let table_entry = TableEntry::from_tag(entry.tag);
        U8::write(ctxt, table_entry.flags_index() | (entry.transform_version << 6))?;
        if let TableEntry::Custom(tag) = table_entry {
            U32Be::write(ctxt, tag)?;
        }
        U32Base128::write(ctxt, entry.orig_length)?;
        if let Some(transform_length) = entry.transform_length {
            U32Base128::write(ctxt, transform_length)?;
        }

        Ok(())
    }
}

/// Sort key that orders tables by tag with `loca` immediately after `glyf`.
pub fn canonical_order_key(tag: u32) -> (u32, u8) {
    if tag == tag::LOCA {
        (tag::GLYF, 1)
    } else {
        (tag, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::binary::write::WriteBuffer;

    fn read(data: &[u8], num_tables: usize) -> Result<Vec<TableDirectoryEntry>, Woff2Error> {
        read_table_directory(&mut ReadScope::new(data).ctxt(), num_tables)
    }

    #[test]
    fn test_table_entry() {
        assert_eq!(TableEntry::from_tag(tag::CMAP), TableEntry::Known(0));
        assert_eq!(TableEntry::from_tag(tag::LOCA), TableEntry::Known(11));
        assert_eq!(TableEntry::from_tag(tag::SILL), TableEntry::Known(62));
        let custom = tag::tag(*b"abcd");
        assert_eq!(TableEntry::from_tag(custom), TableEntry::Custom(custom));
        assert_eq!(TableEntry::Known(10).tag(), tag::GLYF);
    }

    #[test]
    fn test_read_known_and_custom_entries() {
        let data = [
            0x01, 0x36, // head, 54 bytes
            0x3F, b'a', b'b', b'c', b'd', 0x0A, // custom tag, 10 bytes
            0x0A, 0x81, 0x00, 0x20, // glyf transformed, 128 bytes, 32 stored
            0x0B, 0x10, 0x00, // loca transformed, 16 bytes
        ];
        let entries = read(&data, 4).unwrap();
        assert_eq!(entries[0].tag, tag::HEAD);
        assert_eq!(entries[0].orig_length, 54);
        assert!(!entries[0].is_transformed());
        assert_eq!(entries[1].tag, tag::tag(*b"abcd"));
        assert_eq!(entries[1].offset, 54);
        assert_eq!(entries[2].transform_length, Some(32));
        assert_eq!(entries[2].offset, 64);
        assert_eq!(entries[3].offset, 96);
        assert_eq!(entries[3].stored_length(), 0);
    }

    #[test]
    fn test_loca_transform_length_must_be_zero() {
        let data = [0x0A, 0x10, 0x08, 0x0B, 0x10, 0x01];
        assert!(matches!(
            read(&data, 2),
            Err(Woff2Error::CorruptContainer {
                tag: Some(tag::LOCA),
                ..
            })
        ));
    }

    #[test]
    fn test_unpaired_glyf_transform() {
        // Transformed glyf followed by null transformed loca
        let data = [0x0A, 0x10, 0x08, 0xCB, 0x10];
        assert!(matches!(
            read(&data, 2),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn test_unknown_transform_version() {
        // cmap with transform version 1
        let data = [0x40, 0x10, 0x10];
        assert!(matches!(
            read(&data, 1),
            Err(Woff2Error::UnsupportedFeature {
                tag: Some(tag::CMAP),
                ..
            })
        ));
    }

    #[test]
    fn test_truncated_directory() {
        let data = [0x3F, b'a', b'b'];
        assert!(matches!(
            read(&data, 1),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn test_write_entries() {
        let entries = [
            TableDirectoryEntry::new(tag::GLYF, 128, Some(32)),
            TableDirectoryEntry::new(tag::LOCA, 16, Some(0)),
            TableDirectoryEntry::new(tag::HMTX, 40, None),
            TableDirectoryEntry::new(tag::tag(*b"abcd"), 10, None),
        ];
        let mut buffer = WriteBuffer::new();
        for entry in &entries {
            TableDirectoryEntry::write(&mut buffer, entry).unwrap();
        }
        assert_eq!(
            buffer.bytes(),
            &[
                0x0A, 0x81, 0x00, 0x20, 0x0B, 0x10, 0x00, 0x03, 0x28, 0x3F, b'a', b'b', b'c', b'd',
                0x0A
            ]
        );

        let read_back = read(buffer.bytes(), 4).unwrap();
        assert_eq!(read_back[2].tag, tag::HMTX);
        assert_eq!(read_back[2].transform_version, 0);
    }

    #[test]
    fn test_null_transform_version() {
        let entry = TableDirectoryEntry::new(tag::GLYF, 8, None);
        assert_eq!(entry.transform_version, NULL_TRANSFORM);
        let mut buffer = WriteBuffer::new();
        TableDirectoryEntry::write(&mut buffer, &entry).unwrap();
        assert_eq!(buffer.bytes(), &[0xCA, 0x08]);
    }

    #[test]
    fn test_canonical_order() {
        let mut tags = vec![tag::LOCA, tag::HEAD, tag::GLYF, tag::CMAP, tag::OS_2, tag::HHEA];
        tags.sort_by_key(|&tag| canonical_order_key(tag));
        assert_eq!(
            tags,
            vec![tag::OS_2, tag::CMAP, tag::GLYF, tag::LOCA, tag::HEAD, tag::HHEA]
        );
    }
}
