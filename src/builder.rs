//! Assembly of SFNT fonts and font collections from table data.
//!
//! Table records are always written sorted by tag. Table data is laid out in the order the
//! tables were added, each table padded with zeros to a 32-bit boundary.

use std::num::Wrapping;

use crate::binary::long_align;
use crate::binary::write::{Placeholder, WriteBinary, WriteBinaryDep, WriteBuffer, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::checksum;
use crate::error::WriteError;
use crate::tables::{TableRecord, TTCF_MAGIC};
use crate::{size, tag};

/// The size of the offset table that precedes the table records of an SFNT font.
pub const OFFSET_TABLE_SIZE: usize = size::U32 + 4 * size::U16;

/// Offset of the `checkSumAdjustment` field within the `head` table.
pub const CHECK_SUM_ADJUSTMENT_OFFSET: usize = 8;

/// Builds a single SFNT font.
pub struct FontBuilder {
    sfnt_version: u32,
    tables: Vec<TaggedBuffer>,
}

/// Builds a TrueType collection whose fonts may share tables.
pub struct CollectionBuilder {
    major_version: u16,
    tables: Vec<WriteBuffer>,
    fonts: Vec<CollectionFont>,
}

struct CollectionFont {
    sfnt_version: u32,
    tables: Vec<(u32, usize)>,
}

struct TaggedBuffer {
    tag: u32,
    buffer: WriteBuffer,
}

impl FontBuilder {
    pub fn new(sfnt_version: u32) -> Self {
        FontBuilder {
            sfnt_version,
            tables: Vec::new(),
        }
    }

    /// Add a table, written with `T`. Tables are laid out in the order they are added.
    pub fn add_table<HostType, T: WriteBinaryDep<HostType>>(
        &mut self,
        tag: u32,
        table: HostType,
        args: T::Args,
    ) -> Result<T::Output, WriteError> {
        if self.tables.iter().any(|table| table.tag == tag) {
            return Err(WriteError::BadValue);
        }

        let mut buffer = WriteBuffer::new();
        let output = T::write_dep(&mut buffer, table, args)?;
        self.tables.push(TaggedBuffer { tag, buffer });

        Ok(output)
    }

    /// Returns a `Vec<u8>` containing the built font
    ///
    /// If the font has a `head` table its `checkSumAdjustment` is recalculated.
    pub fn data(self) -> Result<Vec<u8>, WriteError> {
        let mut font = WriteBuffer::new();
        let num_tables = u16::try_from(self.tables.len())?;
        write_offset_table(&mut font, self.sfnt_version, num_tables)?;

        let mut table_offset = font.bytes_written() + self.tables.len() * TableRecord::SIZE;
        let mut records = Vec::with_capacity(self.tables.len());
        for TaggedBuffer { tag, buffer } in &self.tables {
            records.push(TableRecord {
                table_tag: *tag,
                checksum: table_checksum(*tag, buffer.bytes())?,
                offset: u32::try_from(table_offset)?,
                length: u32::try_from(buffer.len())?,
            });
            table_offset += long_align(buffer.len());
        }
        records.sort_by_key(|record| record.table_tag);
        for record in &records {
            TableRecord::write(&mut font, record)?;
        }

        let mut check_sum_adjustment = None;
        for TaggedBuffer { tag, buffer } in &self.tables {
            if let Some(placeholder) = write_table(&mut font, *tag, buffer.bytes())? {
                check_sum_adjustment = Some(placeholder);
            }
        }

        if let Some(placeholder) = check_sum_adjustment {
            let font_checksum = checksum::table_checksum(font.bytes())
                .map_err(|_| WriteError::BadValue)?;
            font.write_placeholder(placeholder, checksum::checksum_adjustment(font_checksum))?;
        }

        Ok(font.into_inner())
    }
}

impl CollectionBuilder {
    /// `major_version` is the version of the TTC header, either 1 or 2.
    pub fn new(major_version: u16) -> Self {
        CollectionBuilder {
            major_version,
            tables: Vec::new(),
            fonts: Vec::new(),
        }
    }

    /// Add a table to the collection, returning its index for use in `add_font`.
    ///
    /// Tables are laid out in the order they are added.
    pub fn add_table(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        let mut buffer = WriteBuffer::new();
        buffer.write_bytes(data)?;
        self.tables.push(buffer);
        Ok(self.tables.len() - 1)
    }

    /// Add a font made up of `(tag, table index)` pairs.
    pub fn add_font(
        &mut self,
        sfnt_version: u32,
        tables: Vec<(u32, usize)>,
    ) -> Result<(), WriteError> {
        for (i, (tag, index)) in tables.iter().enumerate() {
            if *index >= self.tables.len() || tables[..i].iter().any(|(other, _)| other == tag) {
                return Err(WriteError::BadValue);
            }
        }
        self.fonts.push(CollectionFont {
            sfnt_version,
            tables,
        });
        Ok(())
    }

    /// Returns a `Vec<u8>` containing the built collection
    ///
    /// The `head` tables of a collection are written unchanged, as they may be shared between
    /// fonts.
    pub fn data(self) -> Result<Vec<u8>, WriteError> {
        let mut font = WriteBuffer::new();
        let num_fonts = u32::try_from(self.fonts.len())?;

        U32Be::write(&mut font, TTCF_MAGIC)?;
        U16Be::write(&mut font, self.major_version)?;
        U16Be::write(&mut font, 0u16)?;
        U32Be::write(&mut font, num_fonts)?;
        let offsets = font.placeholder_array::<U32Be, u32>(self.fonts.len())?;
        if self.major_version == 2 {
            // No digital signature: ulDsigTag, ulDsigLength, ulDsigOffset
            font.write_zeros(3 * size::U32)?;
        }

        let headers_length: usize = self
            .fonts
            .iter()
            .map(|entry| OFFSET_TABLE_SIZE + entry.tables.len() * TableRecord::SIZE)
            .sum();
        let mut table_offsets = Vec::with_capacity(self.tables.len());
        let mut table_offset = font.bytes_written() + headers_length;
        for table in &self.tables {
            table_offsets.push(table_offset);
            table_offset += long_align(table.len());
        }

        for (entry, placeholder) in self.fonts.iter().zip(offsets) {
            let font_offset = u32::try_from(font.bytes_written())?;
            font.write_placeholder(placeholder, font_offset)?;
            let num_tables = u16::try_from(entry.tables.len())?;
            write_offset_table(&mut font, entry.sfnt_version, num_tables)?;

            let mut records = entry
                .tables
                .iter()
                .map(|&(tag, index)| {
                    let table = &self.tables[index];
                    Ok(TableRecord {
                        table_tag: tag,
                        checksum: table_checksum(tag, table.bytes())?,
                        offset: u32::try_from(table_offsets[index])?,
                        length: u32::try_from(table.len())?,
                    })
                })
                .collect::<Result<Vec<_>, WriteError>>()?;
            records.sort_by_key(|record| record.table_tag);
            for record in &records {
                TableRecord::write(&mut font, record)?;
            }
        }

        for table in &self.tables {
            font.write_bytes(table.bytes())?;
            font.write_zeros(long_align(table.len()) - table.len())?;
        }

        Ok(font.into_inner())
    }
}

fn write_offset_table<C: WriteContext>(
    font: &mut C,
    sfnt_version: u32,
    num_tables: u16,
) -> Result<(), WriteError> {
    let n = max_power_of_2(num_tables);
    let search_range = 16u16.saturating_mul(1 << n);
    let entry_selector = n;
    let range_shift = num_tables.saturating_mul(16).saturating_sub(search_range);

    U32Be::write(font, sfnt_version)?;
    U16Be::write(font, num_tables)?;
    U16Be::write(font, search_range)?;
    U16Be::write(font, entry_selector)?;
    U16Be::write(font, range_shift)?;

    Ok(())
}

/// Write a table followed by its padding. For the `head` table the `checkSumAdjustment` is
/// zeroed and a placeholder to it returned.
fn write_table(
    font: &mut WriteBuffer,
    tag: u32,
    data: &[u8],
) -> Result<Option<Placeholder<U32Be, u32>>, WriteError> {
    let has_adjustment = data.len() >= CHECK_SUM_ADJUSTMENT_OFFSET + size::U32;
    let placeholder = if tag == tag::HEAD && has_adjustment {
        font.write_bytes(&data[..CHECK_SUM_ADJUSTMENT_OFFSET])?;
        let placeholder = font.placeholder::<U32Be, u32>()?;
        font.write_bytes(&data[CHECK_SUM_ADJUSTMENT_OFFSET + size::U32..])?;
        Some(placeholder)
    } else {
        font.write_bytes(data)?;
        None
    };
    font.write_zeros(long_align(data.len()) - data.len())?;

    Ok(placeholder)
}

/// The checksum of a table as stored in its table record. The `head` table is summed with its
/// `checkSumAdjustment` set to zero.
fn table_checksum(tag: u32, data: &[u8]) -> Result<u32, WriteError> {
    let sum = checksum::table_checksum(data).map_err(|_| WriteError::BadValue)?;
    if tag == tag::HEAD && data.len() >= CHECK_SUM_ADJUSTMENT_OFFSET + size::U32 {
        let adjustment = &data[CHECK_SUM_ADJUSTMENT_OFFSET..][..size::U32];
        let adjustment =
            u32::from_be_bytes([adjustment[0], adjustment[1], adjustment[2], adjustment[3]]);
        Ok((sum - Wrapping(adjustment)).0)
    } else {
        Ok(sum.0)
    }
}

/// Calculate the maximum power of 2 that is <= num
fn max_power_of_2(num: u16) -> u16 {
    15u16.saturating_sub(num.leading_zeros() as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tables::{OffsetTable, TTF_MAGIC};

    fn head_table(check_sum_adjustment: u32) -> Vec<u8> {
        let mut head = vec![0, 1, 0, 0, 0, 1, 0, 0];
        head.extend_from_slice(&check_sum_adjustment.to_be_bytes());
        head.extend_from_slice(&0x5F0F3CF5u32.to_be_bytes());
        head.resize(54, 0);
        head
    }

    #[test]
    fn test_max_power_of_2() {
        assert_eq!(max_power_of_2(0), 0);
        assert_eq!(max_power_of_2(1), 0);
        assert_eq!(max_power_of_2(2), 1);
        assert_eq!(max_power_of_2(4), 2);
        assert_eq!(max_power_of_2(15), 3);
        assert_eq!(max_power_of_2(16), 4);
        assert_eq!(max_power_of_2(17), 4);
        assert_eq!(max_power_of_2(39), 5);
        assert_eq!(max_power_of_2(std::u16::MAX), 15);
    }

    #[test]
    fn test_offset_table_size() {
        assert_eq!(OFFSET_TABLE_SIZE, 12);
    }

    #[test]
    fn test_font_builder_layout() {
        let mut builder = FontBuilder::new(TTF_MAGIC);
        builder
            .add_table::<_, ReadScope<'_>>(tag::NAME, ReadScope::new(&[1, 2, 3]), ())
            .unwrap();
        builder
            .add_table::<_, ReadScope<'_>>(
                tag::HEAD,
                ReadScope::new(&head_table(0xDEADBEEF)),
                (),
            )
            .unwrap();
        let data = builder.data().unwrap();

        let offset_table = ReadScope::new(&data).read::<OffsetTable<'_>>().unwrap();
        assert_eq!(offset_table.search_range, 32);
        assert_eq!(offset_table.entry_selector, 1);
        assert_eq!(offset_table.range_shift, 0);
        let records = offset_table.table_records.to_vec();
        // Records are sorted by tag, data follows in insertion order
        assert_eq!(records[0].table_tag, tag::HEAD);
        assert_eq!(records[1].table_tag, tag::NAME);
        assert_eq!(records[1].offset, 44);
        assert_eq!(records[1].length, 3);
        assert_eq!(records[0].offset, 48);
        assert_eq!(&data[44..48], &[1, 2, 3, 0]);

        // The font now sums to the magic value
        assert_eq!(
            checksum::table_checksum(&data).unwrap(),
            Wrapping(checksum::CHECKSUM_MAGIC)
        );
    }

    #[test]
    fn test_font_builder_duplicate_tag() {
        let mut builder = FontBuilder::new(TTF_MAGIC);
        builder
            .add_table::<_, ReadScope<'_>>(tag::NAME, ReadScope::new(&[1]), ())
            .unwrap();
        assert!(builder
            .add_table::<_, ReadScope<'_>>(tag::NAME, ReadScope::new(&[2]), ())
            .is_err());
    }

    #[test]
    fn test_head_checksum_ignores_adjustment() {
        assert_eq!(
            table_checksum(tag::HEAD, &head_table(0x12345678)).unwrap(),
            table_checksum(tag::HEAD, &head_table(0)).unwrap()
        );
    }

    #[test]
    fn test_collection_builder_shares_tables() {
        let mut builder = CollectionBuilder::new(2);
        let shared = builder.add_table(&[9, 9, 9, 9]).unwrap();
        let a = builder.add_table(&[1]).unwrap();
        let b = builder.add_table(&[2]).unwrap();
        builder
            .add_font(TTF_MAGIC, vec![(tag::NAME, a), (tag::CMAP, shared)])
            .unwrap();
        builder
            .add_font(TTF_MAGIC, vec![(tag::NAME, b), (tag::CMAP, shared)])
            .unwrap();
        let data = builder.data().unwrap();

        // ttcf header (12) + 2 offsets + DSIG fields (12) + 2 * (12 + 2 * 16) + 3 * 4
        assert_eq!(data.len(), 12 + 8 + 12 + 2 * 44 + 12);
        assert_eq!(&data[0..4], b"ttcf");
        let first = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let second = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        assert_eq!(first, 32);
        assert_eq!(second, 76);

        let scope = ReadScope::new(&data);
        let font1 = scope.offset(32).read::<OffsetTable<'_>>().unwrap();
        let font2 = scope.offset(76).read::<OffsetTable<'_>>().unwrap();
        assert_eq!(
            font1.find_table_record(tag::CMAP).unwrap().offset,
            font2.find_table_record(tag::CMAP).unwrap().offset
        );
    }

    #[test]
    fn test_collection_builder_bad_index() {
        let mut builder = CollectionBuilder::new(1);
        assert!(builder.add_font(TTF_MAGIC, vec![(tag::NAME, 0)]).is_err());
    }
}
