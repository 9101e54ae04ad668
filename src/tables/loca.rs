//! Parsing and writing of the `loca` table, the offset of each glyph within `glyf`.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use std::ops::Range;

use crate::binary::read::{ReadArray, ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Clone, Debug)]
pub struct LocaTable<'a> {
    pub offsets: LocaOffsets<'a>,
}

#[derive(Clone, Debug)]
pub enum LocaOffsets<'a> {
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

impl<'b> ReadBinaryDep for LocaTable<'b> {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable<'a>;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` specifies whether the offsets are short or long, from the `head`
    ///   table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        // The value of n is numGlyphs + 1.
        let count = usize::from(num_glyphs) + 1;
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => LocaOffsets::Short(ctxt.read_array::<U16Be>(count)?),
            IndexToLocFormat::Long => LocaOffsets::Long(ctxt.read_array::<U32Be>(count)?),
        };

        Ok(LocaTable { offsets })
    }
}

impl<'a> LocaOffsets<'a> {
    /// Iterate the offsets in this table.
    ///
    /// Short offsets are scaled to their actual value.
    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        let (short, long) = match self {
            LocaOffsets::Short(array) => (Some(array.iter()), None),
            LocaOffsets::Long(array) => (None, Some(array.iter())),
        };
        short
            .into_iter()
            .flatten()
            .map(|offset| u32::from(offset) * 2)
            .chain(long.into_iter().flatten())
    }

    /// Returns the number of offsets in the table.
    pub fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(array) => array.len(),
            LocaOffsets::Long(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a specified offset from the table at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            LocaOffsets::Short(array) => array.get_item(index).map(|offset| u32::from(offset) * 2),
            LocaOffsets::Long(array) => array.get_item(index),
        }
    }

    /// Get the last offset in the table.
    ///
    /// Returns `None` if the table is empty.
    pub fn last(&self) -> Option<u32> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }
}

impl<'a> LocaTable<'a> {
    /// Compute the byte range of every glyph within a `glyf` table of `glyf_len` bytes.
    ///
    /// Returns `None` if the offsets decrease or point past the end of the `glyf` table.
    pub fn glyph_ranges(&self, glyf_len: usize) -> Option<Vec<Range<usize>>> {
        let offsets = self
            .offsets
            .iter()
            .map(|offset| usize::try_from(offset).ok())
            .collect::<Option<Vec<_>>>()?;
        let mut ranges = Vec::with_capacity(offsets.len().saturating_sub(1));
        for pair in offsets.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if start > end || end > glyf_len {
                return None;
            }
            ranges.push(start..end);
        }
        Some(ranges)
    }
}

pub mod owned {
    use crate::binary::write::{WriteBinaryDep, WriteContext};
    use crate::binary::{U16Be, U32Be};
    use crate::error::WriteError;
    use crate::tables::IndexToLocFormat;

    /// A `loca` table under construction.
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct LocaTable {
        pub offsets: Vec<u32>,
    }

    impl LocaTable {
        pub fn with_capacity(num_glyphs: usize) -> Self {
            LocaTable {
                offsets: Vec::with_capacity(num_glyphs + 1),
            }
        }

        /// The size in bytes of this table when written in `index_to_loc_format`.
        pub fn size(&self, index_to_loc_format: IndexToLocFormat) -> usize {
            self.offsets.len() * index_to_loc_format.entry_size()
        }
    }

    impl WriteBinaryDep<Self> for LocaTable {
        type Output = ();
        type Args = IndexToLocFormat;

        fn write_dep<C: WriteContext>(
            ctxt: &mut C,
            loca: LocaTable,
            index_to_loc_format: Self::Args,
        ) -> Result<(), WriteError> {
            match index_to_loc_format {
                IndexToLocFormat::Short => {
                    // Half of each offset is stored, so odd offsets cannot be represented
                    let halves = loca
                        .offsets
                        .iter()
                        .map(|&offset| match offset % 2 {
                            0 => u16::try_from(offset / 2).map_err(WriteError::from),
                            _ => Err(WriteError::BadValue),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    ctxt.write_vec::<U16Be, _>(halves)
                }
                IndexToLocFormat::Long => ctxt.write_vec::<U32Be, _>(loca.offsets),
            }
        }
    }
}
