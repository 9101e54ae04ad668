//! OpenType font table parsing.

pub mod glyf;
pub mod loca;

use crate::binary::read::{ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::size;
use crate::tag;

use std::borrow::Cow;

/// Magic value identifying a CFF font (`OTTO`)
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic value used by some legacy Apple TrueType fonts (`true`)
pub const TRUE_MAGIC: u32 = tag::TRUE;

/// Magic value identifying a TrueType font collection `ttcf`
pub const TTCF_MAGIC: u32 = tag::TTCF;

/// The `magicNumber` field of the `head` table
pub const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// Access to the tables of a single font by tag
pub trait FontTableProvider {
    /// The data of table `tag`, or `None` if the font does not have one
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError>;

    fn has_table(&self, tag: u32) -> bool;
}

/// The size of the offsets in the `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

pub struct OpenTypeFont<'a> {
    pub scope: ReadScope<'a>,
    pub data: OpenTypeData<'a>,
}

/// An OpenTypeFont containing a single font or a collection of fonts
pub enum OpenTypeData<'a> {
    Single(OffsetTable<'a>),
    Collection(TTCHeader<'a>),
}

/// TrueType collection header
pub struct TTCHeader<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    pub offset_tables: ReadArray<'a, U32Be>,
    /// Digital signature fields, present in version 2 headers
    pub dsig: Option<DsigRecord>,
}

/// Location of the `DSIG` table of a version 2 collection header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DsigRecord {
    pub tag: u32,
    pub length: u32,
    pub offset: u32,
}

/// OpenType Offset Table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Clone)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

/// An entry in the Offset Table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
///
/// Only the fields needed to reconstruct glyph data are retained.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq)]
pub struct HeadTable {
    pub check_sum_adjustment: u32,
    pub units_per_em: u16,
    pub index_to_loc_format: IndexToLocFormat,
}

/// `hhea` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq)]
pub struct HheaTable {
    pub advance_width_max: u16,
    pub num_h_metrics: u16,
}

/// `hmtx` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx>
#[derive(Debug)]
pub struct HmtxTable<'a> {
    pub h_metrics: ReadArray<'a, LongHorMetric>,
    pub left_side_bearings: ReadArray<'a, I16Be>,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// A signed 2.14 fixed point number
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct F2Dot14(pub i16);

/// `maxp` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/maxp>
#[derive(Debug, Clone, PartialEq)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
}

impl<'a> OpenTypeFont<'a> {
    /// The number of fonts in this file
    pub fn num_fonts(&self) -> usize {
        match &self.data {
            OpenTypeData::Single(_) => 1,
            OpenTypeData::Collection(ttc) => ttc.offset_tables.len(),
        }
    }

    /// The offset table of the font at `index`
    pub fn offset_table(&self, index: usize) -> Result<Cow<'_, OffsetTable<'a>>, ParseError> {
        match &self.data {
            OpenTypeData::Single(offset_table) => Ok(Cow::Borrowed(offset_table)),
            OpenTypeData::Collection(ttc) => {
                let offset = ttc
                    .offset_tables
                    .get_item(index)
                    .ok_or(ParseError::BadIndex)?;
                let offset = usize::try_from(offset)?;
                let offset_table = self.scope.offset(offset).read::<OffsetTable<'_>>()?;
                Ok(Cow::Owned(offset_table))
            }
        }
    }
}

impl ReadBinary for OpenTypeFont<'_> {
    type HostType<'a> = OpenTypeFont<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        // Peek at the first four bytes to tell a collection from a single font
        let data = match ctxt.clone().read_u32be()? {
            TTCF_MAGIC => OpenTypeData::Collection(ctxt.read::<TTCHeader<'_>>()?),
            _ => OpenTypeData::Single(ctxt.read::<OffsetTable<'_>>()?),
        };

        Ok(OpenTypeFont { scope, data })
    }
}

impl ReadBinary for TTCHeader<'_> {
    type HostType<'a> = TTCHeader<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let ttc_tag = ctxt.read_u32be()?;
        ctxt.check_version(ttc_tag == TTCF_MAGIC)?;
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(matches!(major_version, 1 | 2))?;
        let num_fonts = usize::try_from(ctxt.read_u32be()?)?;
        let offset_tables = ctxt.read_array::<U32Be>(num_fonts)?;
        let dsig = match major_version {
            2 => Some(ctxt.read::<DsigRecord>()?),
            _ => None,
        };

        Ok(TTCHeader {
            major_version,
            minor_version,
            offset_tables,
            dsig,
        })
    }
}

impl ReadFrom for DsigRecord {
    type ReadType = ((U32Be, U32Be), U32Be);

    fn read_from(((tag, length), offset): ((u32, u32), u32)) -> Self {
        DsigRecord {
            tag,
            length,
            offset,
        }
    }
}

impl ReadBinary for OffsetTable<'_> {
    type HostType<'a> = OffsetTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        ctxt.check_version(matches!(sfnt_version, TTF_MAGIC | CFF_MAGIC | TRUE_MAGIC))?;
        let num_tables = ctxt.read_u16be()?;
        let search_range = ctxt.read_u16be()?;
        let entry_selector = ctxt.read_u16be()?;
        let range_shift = ctxt.read_u16be()?;
        let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;

        Ok(OffsetTable {
            sfnt_version,
            search_range,
            entry_selector,
            range_shift,
            table_records,
        })
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));
    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl WriteBinary<&Self> for TableRecord {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &TableRecord) -> Result<(), WriteError> {
        U32Be::write(ctxt, table.table_tag)?;
        U32Be::write(ctxt, table.checksum)?;
        U32Be::write(ctxt, table.offset)?;
        U32Be::write(ctxt, table.length)?;

        Ok(())
    }
}

impl<'a> OffsetTable<'a> {
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|table_record| table_record.table_tag == tag)
    }
}

impl TableRecord {
    pub const SIZE: usize = 4 * size::U32;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        // majorVersion, minorVersion, fontRevision
        ctxt.read_slice(2 * size::U16 + size::U32)?;
        let check_sum_adjustment = ctxt.read_u32be()?;
        let magic_number = ctxt.read_u32be()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let _flags = ctxt.read_u16be()?;
        let units_per_em = ctxt.read_u16be()?;
        // created, modified, bounding box, macStyle, lowestRecPPEM, fontDirectionHint
        ctxt.read_slice(16 + 4 * size::I16 + 3 * size::U16)?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let _glyph_data_format = ctxt.read_i16be()?;

        Ok(HeadTable {
            check_sum_adjustment,
            units_per_em,
            index_to_loc_format,
        })
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        // minorVersion, ascender, descender, lineGap
        ctxt.read_slice(4 * size::U16)?;
        let advance_width_max = ctxt.read_u16be()?;
        // minLeftSideBearing through metricDataFormat
        ctxt.read_slice(11 * size::I16)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            advance_width_max,
            num_h_metrics,
        })
    }
}

impl ReadBinaryDep for HmtxTable<'_> {
    type Args<'a> = (usize, usize); // num_glyphs, num_h_metrics
    type HostType<'a> = HmtxTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
        Ok(HmtxTable {
            h_metrics,
            left_side_bearings,
        })
    }
}

impl<'a> HmtxTable<'a> {
    /// The left side bearing of every glyph, in glyph order
    pub fn left_side_bearings(&self) -> impl Iterator<Item = i16> + '_ {
        self.h_metrics
            .iter()
            .map(|metric| metric.lsb)
            .chain(self.left_side_bearings.iter())
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);
    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl WriteBinary for LongHorMetric {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, metric: LongHorMetric) -> Result<(), WriteError> {
        U16Be::write(ctxt, metric.advance_width)?;
        I16Be::write(ctxt, metric.lsb)?;

        Ok(())
    }
}

impl ReadFrom for F2Dot14 {
    type ReadType = I16Be;

    fn read_from(value: i16) -> Self {
        F2Dot14(value)
    }
}

impl WriteBinary for F2Dot14 {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, value: F2Dot14) -> Result<(), WriteError> {
        I16Be::write(ctxt, value.0)
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        ctxt.check_version(matches!(version, 0x00005000 | 0x00010000))?;
        let num_glyphs = ctxt.read_u16be()?;
        Ok(MaxpTable {
            version,
            num_glyphs,
        })
    }
}

impl ReadBinary for IndexToLocFormat {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let index_to_loc_format = ctxt.read_i16be()?;

        match index_to_loc_format {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl IndexToLocFormat {
    /// The size in bytes of each `loca` entry
    pub fn entry_size(self) -> usize {
        match self {
            IndexToLocFormat::Short => size::U16,
            IndexToLocFormat::Long => size::U32,
        }
    }
}
