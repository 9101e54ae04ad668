//! Decoding of WOFF2 files to SFNT fonts and collections.
//!
//! Decoding is a sequence of steps modelled by [DecodeState]. Each step consumes the state and
//! returns the next one, or `DecodeState::Failed` with the error that stopped it.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use super::collection::CollectionDirectory;
use super::directory::{self, TableDirectoryEntry};
use super::{compress, glyf, hmtx, DecodeOptions, Woff2Font, Woff2Header, HEADER_SIZE};
use crate::binary::long_align;
use crate::binary::read::ReadScope;
use crate::builder::{CollectionBuilder, FontBuilder, CHECK_SUM_ADJUSTMENT_OFFSET};
use crate::error::{ParseError, Woff2Error};
use crate::tables::{HheaTable, MaxpTable, OffsetTable};
use crate::{size, tag};

/// Table data larger than this many times the size of the file is assumed to have bad lengths in
/// the table directory. Real fonts stay well below 20.
const MAX_PLAUSIBLE_COMPRESSION_RATIO: usize = 100;

/// The largest amount of table data a file may decompress to
const MAX_TABLE_DATA_LENGTH: usize = 1 << 30;

/// The steps of decoding a WOFF2 file.
pub enum DecodeState<'a> {
    /// Nothing has been read yet
    Start(ReadScope<'a>),
    HeaderParsed {
        scope: ReadScope<'a>,
        header: Woff2Header,
    },
    DirectoryParsed {
        scope: ReadScope<'a>,
        header: Woff2Header,
        table_directory: Vec<TableDirectoryEntry>,
        collection_directory: Option<CollectionDirectory>,
        /// Offset of the compressed table data
        payload_offset: usize,
    },
    /// The table data is decompressed and the file layout has been checked
    PayloadDecompressed(Woff2Font<'a>),
    /// Every table of every font has been reconstructed
    TablesReconstructed {
        font: Woff2Font<'a>,
        tables: ReconstructedTables,
    },
    /// The decoded font or collection
    Done(Vec<u8>),
    Failed(Woff2Error),
}

/// Tables reconstructed from a WOFF2 file, indexed by table directory position.
///
/// Tables shared between the fonts of a collection are only reconstructed once.
pub struct ReconstructedTables {
    tables: Vec<Option<Vec<u8>>>,
    /// The xMin of each glyph, keyed by the directory index of the `glyf` table they came from
    x_mins: FxHashMap<usize, Vec<i16>>,
}

/// Decode a WOFF2 file into an SFNT font or TrueType collection.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, Woff2Error> {
    decode_with_options(data, &DecodeOptions::default())
}

pub fn decode_with_options(data: &[u8], options: &DecodeOptions) -> Result<Vec<u8>, Woff2Error> {
    let mut state = DecodeState::new(data);
    loop {
        state = match state.advance(options) {
            DecodeState::Done(font) => return Ok(font),
            DecodeState::Failed(err) => return Err(err),
            next => next,
        };
    }
}

/// Parse a WOFF2 file up to and including decompression of its table data.
pub(crate) fn read_font(scope: ReadScope<'_>) -> Result<Woff2Font<'_>, Woff2Error> {
    let options = DecodeOptions::default();
    let mut state = DecodeState::Start(scope);
    loop {
        state = match state.advance(&options) {
            DecodeState::PayloadDecompressed(font) => return Ok(font),
            DecodeState::Failed(err) => return Err(err),
            next => next,
        };
    }
}

impl<'a> DecodeState<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        DecodeState::Start(ReadScope::new(data))
    }

    /// Returns true if no further progress can be made
    pub fn is_finished(&self) -> bool {
        matches!(self, DecodeState::Done(_) | DecodeState::Failed(_))
    }

    /// Perform the next decoding step.
    pub fn advance(self, options: &DecodeOptions) -> DecodeState<'a> {
        let next = match self {
            DecodeState::Start(scope) => parse_header(scope),
            DecodeState::HeaderParsed { scope, header } => parse_directories(scope, header),
            DecodeState::DirectoryParsed {
                scope,
                header,
                table_directory,
                collection_directory,
                payload_offset,
            } => decompress_payload(
                scope,
                header,
                table_directory,
                collection_directory,
                payload_offset,
            ),
            DecodeState::PayloadDecompressed(font) => reconstruct_tables(font),
            DecodeState::TablesReconstructed { font, tables } => {
                assemble(&font, tables, options).map(DecodeState::Done)
            }
            done @ (DecodeState::Done(_) | DecodeState::Failed(_)) => Ok(done),
        };

        next.unwrap_or_else(DecodeState::Failed)
    }
}

fn parse_header(scope: ReadScope<'_>) -> Result<DecodeState<'_>, Woff2Error> {
    let data_length = scope.data().len();
    let header = scope.read::<Woff2Header>().map_err(|err| match err {
        ParseError::BadVersion => Woff2Error::InvalidHeader("signature is not wOF2"),
        ParseError::BadValue => Woff2Error::InvalidHeader("reserved field is not zero"),
        _ => Woff2Error::TruncatedFile {
            offset: 0,
            needed: HEADER_SIZE,
        },
    })?;

    if header.num_tables == 0 {
        return Err(Woff2Error::InvalidHeader("font has no tables"));
    }
    let length = usize::try_from(header.length)?;
    if length > data_length {
        return Err(Woff2Error::TruncatedFile {
            offset: data_length,
            needed: length - data_length,
        });
    } else if length < data_length {
        return Err(Woff2Error::InvalidHeader(
            "length does not match the size of the file",
        ));
    }

    Ok(DecodeState::HeaderParsed { scope, header })
}

fn parse_directories<'a>(
    scope: ReadScope<'a>,
    header: Woff2Header,
) -> Result<DecodeState<'a>, Woff2Error> {
    let mut ctxt = scope.offset(HEADER_SIZE).ctxt();
    let table_directory =
        directory::read_table_directory(&mut ctxt, usize::from(header.num_tables))?;
    let collection_directory = if header.is_collection() {
        Some(CollectionDirectory::read_checked(
            &mut ctxt,
            table_directory.len(),
        )?)
    } else {
        None
    };
    let payload_offset = HEADER_SIZE + ctxt.position();
    debug!(
        "{} table directory entries, compressed data at {}",
        table_directory.len(),
        payload_offset
    );

    Ok(DecodeState::DirectoryParsed {
        scope,
        header,
        table_directory,
        collection_directory,
        payload_offset,
    })
}

fn decompress_payload<'a>(
    scope: ReadScope<'a>,
    header: Woff2Header,
    table_directory: Vec<TableDirectoryEntry>,
    collection_directory: Option<CollectionDirectory>,
    payload_offset: usize,
) -> Result<DecodeState<'a>, Woff2Error> {
    let file_length = scope.data().len();
    let compressed_size = usize::try_from(header.total_compressed_size)?;
    let payload_end = payload_offset
        .checked_add(compressed_size)
        .filter(|&end| end <= file_length)
        .ok_or(Woff2Error::TruncatedFile {
            offset: payload_offset,
            needed: compressed_size,
        })?;

    let expected_length = table_directory
        .iter()
        .try_fold(0usize, |total, entry| total.checked_add(entry.stored_length()))
        .ok_or(Woff2Error::Decompression("table data too large"))?;
    check_plausible_length(expected_length, file_length)?;
    let table_data = compress::decompress(
        &scope.data()[payload_offset..payload_end],
        expected_length,
    )?;

    check_layout(&header, payload_end, file_length)?;

    Ok(DecodeState::PayloadDecompressed(Woff2Font {
        scope,
        header,
        table_directory,
        collection_directory,
        table_data,
    }))
}

fn check_plausible_length(table_data_length: usize, file_length: usize) -> Result<(), Woff2Error> {
    let ratio_limit = file_length.saturating_mul(MAX_PLAUSIBLE_COMPRESSION_RATIO);
    if table_data_length > ratio_limit || table_data_length > MAX_TABLE_DATA_LENGTH {
        warn!(
            "{} bytes of table data declared in a {} byte file",
            table_data_length, file_length
        );
        return Err(Woff2Error::Decompression("implausible table data length"));
    }
    Ok(())
}

/// Check that the metadata and private data blocks follow the table data, each on a 4-byte
/// boundary, and that the file ends after the last of them, padded or not.
fn check_layout(
    header: &Woff2Header,
    payload_end: usize,
    file_length: usize,
) -> Result<(), Woff2Error> {
    let mut end = payload_end;
    for (offset, length, name) in [
        (header.meta_offset, header.meta_length, "metadata"),
        (header.priv_offset, header.priv_length, "private data"),
    ] {
        if offset == 0 && length == 0 {
            continue;
        }
        let offset = usize::try_from(offset)?;
        let length = usize::try_from(length)?;
        if offset == 0 || length == 0 || offset != long_align(end) {
            debug!("{} block at {}, expected {}", name, offset, long_align(end));
            return Err(Woff2Error::InvalidHeader(
                "data block is not at the expected offset",
            ));
        }
        end = offset
            .checked_add(length)
            .filter(|&end| end <= file_length)
            .ok_or(Woff2Error::TruncatedFile {
                offset,
                needed: length,
            })?;
    }

    // The final padding is optional
    if end != file_length && long_align(end) != file_length {
        return Err(Woff2Error::InvalidHeader("unexpected data after the last block"));
    }

    Ok(())
}

fn reconstruct_tables(font: Woff2Font<'_>) -> Result<DecodeState<'_>, Woff2Error> {
    let mut tables = ReconstructedTables::new(font.table_directory.len());
    for index in 0..font.num_fonts() {
        let indices = font.font_table_indices(index)?;
        if !font.is_collection() {
            check_unique_tags(&font, &indices)?;
        }
        tables.reconstruct_font(&font, &indices)?;
    }

    Ok(DecodeState::TablesReconstructed { font, tables })
}

fn check_unique_tags(font: &Woff2Font<'_>, indices: &[u16]) -> Result<(), Woff2Error> {
    for (i, &index) in indices.iter().enumerate() {
        let tag = font.table_directory[usize::from(index)].tag;
        if indices[..i]
            .iter()
            .any(|&other| font.table_directory[usize::from(other)].tag == tag)
        {
            return Err(Woff2Error::corrupt(Some(tag), "duplicate table"));
        }
    }
    Ok(())
}

impl ReconstructedTables {
    pub fn new(num_tables: usize) -> Self {
        ReconstructedTables {
            tables: vec![None; num_tables],
            x_mins: FxHashMap::default(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.tables.get(index)?.as_deref()
    }

    pub fn take(&mut self, index: usize) -> Option<Vec<u8>> {
        self.tables.get_mut(index)?.take()
    }

    /// Reconstruct the tables of the font made up of the table directory entries at `indices`.
    ///
    /// `glyf` and `loca` are reconstructed first, then the untransformed tables, then `hmtx` which
    /// depends on `glyf`, `hhea` and `maxp`.
    pub fn reconstruct_font(
        &mut self,
        font: &Woff2Font<'_>,
        indices: &[u16],
    ) -> Result<(), Woff2Error> {
        let find = |tag: u32| {
            indices
                .iter()
                .map(|&index| usize::from(index))
                .find(|&index| font.table_directory[index].tag == tag)
        };

        let is_transformed = |&index: &usize| font.table_directory[index].is_transformed();
        let glyf_index = find(tag::GLYF).filter(is_transformed);
        if let Some(glyf_index) = glyf_index {
            self.reconstruct_glyf(font, indices, glyf_index)?;
        }

        for &index in indices {
            let index = usize::from(index);
            let entry = &font.table_directory[index];
            let is_hmtx = entry.tag == tag::HMTX && entry.is_transformed();
            if self.tables[index].is_some() || is_hmtx {
                continue;
            }
            if entry.is_transformed() {
                // A transformed loca not paired with a transformed glyf in this font
                return Err(Woff2Error::corrupt(
                    Some(entry.tag),
                    "transformed table without its glyf table",
                ));
            }
            self.tables[index] = Some(font.stored_table_data(entry)?.to_vec());
        }

        if let Some(hmtx_index) = find(tag::HMTX).filter(is_transformed) {
            if self.tables[hmtx_index].is_none() {
                let x_mins = glyf_index
                    .and_then(|index| self.x_mins.get(&index))
                    .ok_or(Woff2Error::corrupt(
                        Some(tag::HMTX),
                        "transformed hmtx requires a transformed glyf table",
                    ))?;
                let num_h_metrics = find(tag::HHEA)
                    .and_then(|index| self.get(index))
                    .and_then(|data| ReadScope::new(data).read::<HheaTable>().ok())
                    .ok_or(Woff2Error::corrupt(Some(tag::HHEA), "missing or invalid hhea"))?
                    .num_h_metrics;
                let num_glyphs = find(tag::MAXP)
                    .and_then(|index| self.get(index))
                    .and_then(|data| ReadScope::new(data).read::<MaxpTable>().ok())
                    .ok_or(Woff2Error::corrupt(Some(tag::MAXP), "missing or invalid maxp"))?
                    .num_glyphs;

                let entry = &font.table_directory[hmtx_index];
                let hmtx = hmtx::reconstruct_hmtx(
                    font.stored_table_data(entry)?,
                    num_glyphs,
                    num_h_metrics,
                    x_mins,
                )?;
                check_length(entry, hmtx.len())?;
                self.tables[hmtx_index] = Some(hmtx);
            }
        }

        Ok(())
    }

    fn reconstruct_glyf(
        &mut self,
        font: &Woff2Font<'_>,
        indices: &[u16],
        glyf_index: usize,
    ) -> Result<(), Woff2Error> {
        // The table directory requires the transformed loca to immediately follow glyf
        let loca_index = glyf_index + 1;
        if !indices.iter().any(|&index| usize::from(index) == loca_index) {
            return Err(Woff2Error::corrupt(
                Some(tag::LOCA),
                "font has transformed glyf without loca",
            ));
        }
        if self.tables[glyf_index].is_some() {
            return Ok(());
        }

        let glyf_entry = &font.table_directory[glyf_index];
        let loca_entry = &font.table_directory[loca_index];
        let rebuilt = glyf::reconstruct_glyf(font.stored_table_data(glyf_entry)?)?;
        check_length(glyf_entry, rebuilt.glyf.len())?;
        check_length(loca_entry, rebuilt.loca.len())?;

        self.tables[glyf_index] = Some(rebuilt.glyf);
        self.tables[loca_index] = Some(rebuilt.loca);
        self.x_mins.insert(glyf_index, rebuilt.x_mins);

        Ok(())
    }
}

fn check_length(entry: &TableDirectoryEntry, actual: usize) -> Result<(), Woff2Error> {
    let expected = usize::try_from(entry.orig_length)?;
    if expected != actual {
        return Err(Woff2Error::TransformMismatch {
            tag: entry.tag,
            expected,
            actual,
        });
    }
    Ok(())
}

/// The `checkSumAdjustment` field of a `head` table
fn checksum_adjustment(head: &[u8]) -> Option<u32> {
    ReadScope::new(head)
        .offset_length(CHECK_SUM_ADJUSTMENT_OFFSET, size::U32)
        .and_then(|scope| scope.ctxt().read_u32be().map_err(ParseError::from))
        .ok()
}

fn assemble(
    font: &Woff2Font<'_>,
    mut tables: ReconstructedTables,
    options: &DecodeOptions,
) -> Result<Vec<u8>, Woff2Error> {
    let output = match &font.collection_directory {
        None => {
            let mut transmitted_adjustment = None;
            let mut builder = FontBuilder::new(font.flavor());
            for (index, entry) in font.table_directory.iter().enumerate() {
                let data = tables.take(index).ok_or(Woff2Error::corrupt(
                    Some(entry.tag),
                    "table was not reconstructed",
                ))?;
                if entry.tag == tag::HEAD {
                    transmitted_adjustment = checksum_adjustment(&data);
                }
                builder.add_table::<_, ReadScope<'_>>(entry.tag, ReadScope::new(&data), ())?;
            }
            let output = builder.data()?;

            if options.verify_checksums {
                if let Some(expected) = transmitted_adjustment {
                    let actual = ReadScope::new(&output)
                        .read::<OffsetTable<'_>>()?
                        .find_table_record(tag::HEAD)
                        .and_then(|record| {
                            output
                                .get(usize::try_from(record.offset).ok()?..)
                                .and_then(checksum_adjustment)
                        })
                        .ok_or(Woff2Error::corrupt(Some(tag::HEAD), "head table too short"))?;
                    if expected != actual {
                        return Err(Woff2Error::ChecksumMismatch { expected, actual });
                    }
                }
            }
            output
        }
        Some(collection) => {
            let mut builder = CollectionBuilder::new(collection.major_version());
            let mut builder_indices = vec![None; font.table_directory.len()];
            for (index, builder_index) in builder_indices.iter_mut().enumerate() {
                if let Some(data) = tables.get(index) {
                    *builder_index = Some(builder.add_table(data)?);
                }
            }
            for entry in &collection.fonts {
                let font_tables = entry
                    .table_indices
                    .iter()
                    .map(|&index| {
                        let index = usize::from(index);
                        builder_indices[index]
                            .map(|builder_index| (font.table_directory[index].tag, builder_index))
                            .ok_or(Woff2Error::corrupt(None, "table was not reconstructed"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                builder.add_font(entry.flavor, font_tables)?;
            }
            builder.data()?
        }
    };

    if output.len() != font.header.total_sfnt_size as usize {
        warn!(
            "decoded font is {} bytes, header totalSfntSize is {}",
            output.len(),
            font.header.total_sfnt_size
        );
    }

    Ok(output)
}
