//! Encoding of SFNT fonts and collections to WOFF2.

use std::borrow::Cow;

use itertools::Itertools;
use log::debug;

use super::collection::{CollectionDirectory, CollectionFontEntry};
use super::directory::{canonical_order_key, TableDirectoryEntry};
use super::glyf::{transform_glyf, TransformOutcome};
use super::hmtx::{glyph_x_mins, transform_hmtx};
use super::{compress, EncodeOptions, Woff2Header, HEADER_SIZE};
use crate::binary::long_align;
use crate::binary::read::ReadScope;
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::builder::{CollectionBuilder, FontBuilder, CHECK_SUM_ADJUSTMENT_OFFSET};
use crate::error::{ParseError, Woff2Error};
use crate::tables::{
    HeadTable, HheaTable, MaxpTable, OffsetTable, OpenTypeData, OpenTypeFont, TableRecord,
    TTCF_MAGIC,
};
use crate::{size, tag};

/// The minimum size of a `head` table
const HEAD_TABLE_MIN_SIZE: usize = 54;

/// A table of the input, possibly shared between the fonts of a collection
struct SourceTable<'a> {
    tag: u32,
    offset: u32,
    data: &'a [u8],
}

/// A font of the input with its tables as indices into the list of `SourceTable`s
struct SourceFont {
    flavor: u32,
    tables: Vec<usize>,
}

/// A table as it will be stored in the WOFF2 file
struct StoredTable<'a> {
    entry: TableDirectoryEntry,
    data: Cow<'a, [u8]>,
    /// The untransformed table
    original: &'a [u8],
}

/// Encode an SFNT font or TrueType collection as WOFF2.
pub fn encode(sfnt: &[u8], options: &EncodeOptions) -> Result<Vec<u8>, Woff2Error> {
    let scope = ReadScope::new(sfnt);
    let font = scope
        .read::<OpenTypeFont<'_>>()
        .map_err(|err| match err {
            ParseError::BadVersion => Woff2Error::malformed(None, "unknown SFNT version"),
            _ => Woff2Error::malformed(None, "unable to read font header"),
        })?;

    let (source_tables, source_fonts) = read_source_tables(&font, sfnt.len())?;
    let is_collection = matches!(font.data, OpenTypeData::Collection(_));

    // Position of each source table in the table directory
    let order = table_order(&source_tables, &source_fonts, options.preserve_table_order);
    let mut directory_index = vec![0; source_tables.len()];
    for (position, &table_index) in order.iter().enumerate() {
        directory_index[table_index] = position;
    }

    let mut stored = order
        .iter()
        .map(|&index| {
            let table = &source_tables[index];
            Ok(StoredTable {
                entry: TableDirectoryEntry::new(table.tag, u32::try_from(table.data.len())?, None),
                data: Cow::Borrowed(table.data),
                original: table.data,
            })
        })
        .collect::<Result<Vec<_>, Woff2Error>>()?;

    let fonts = source_fonts
        .iter()
        .map(|font| {
            let indices = font
                .tables
                .iter()
                .map(|&index| u16::try_from(directory_index[index]))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CollectionFontEntry {
                flavor: font.flavor,
                table_indices: indices,
            })
        })
        .collect::<Result<Vec<_>, Woff2Error>>()?;

    if options.transform_glyf_loca {
        apply_transforms(&mut stored, &fonts, is_collection, options);
    }

    let total_sfnt_size = fix_up_head(&mut stored, &fonts, &font)?;

    let collection_directory = match &font.data {
        OpenTypeData::Single(_) => None,
        OpenTypeData::Collection(ttc) => Some(CollectionDirectory {
            version: u32::from(ttc.major_version) << 16,
            fonts,
        }),
    };
    let flavor = match &collection_directory {
        Some(_) => TTCF_MAGIC,
        None => source_fonts.first().map_or(0, |font| font.flavor),
    };

    write_woff2(flavor, &stored, collection_directory.as_ref(), total_sfnt_size, options)
}

/// Collect the tables of every font in the input, merging tables that are shared by fonts of a
/// collection.
fn read_source_tables<'a>(
    font: &OpenTypeFont<'a>,
    file_length: usize,
) -> Result<(Vec<SourceTable<'a>>, Vec<SourceFont>), Woff2Error> {
    let mut tables: Vec<SourceTable<'a>> = Vec::new();
    let mut fonts = Vec::with_capacity(font.num_fonts());
    for index in 0..font.num_fonts() {
        let offset_table = font
            .offset_table(index)
            .map_err(|_| Woff2Error::malformed(None, "unable to read offset table"))?;
        let records = validate_records(&offset_table, file_length)?;

        let mut font_tables = Vec::with_capacity(records.len());
        for record in records {
            let data = record.read_table(&font.scope)?.data();
            let existing = tables
                .iter()
                .position(|table| table.tag == record.table_tag && table.offset == record.offset);
            let table_index = match existing {
                Some(existing) if tables[existing].data.len() != data.len() => {
                    return Err(Woff2Error::MalformedFont {
                        tag: Some(record.table_tag),
                        offset: Some(record.offset as usize),
                        reason: "shared table has differing lengths",
                    });
                }
                Some(existing) => existing,
                None => {
                    tables.push(SourceTable {
                        tag: record.table_tag,
                        offset: record.offset,
                        data,
                    });
                    tables.len() - 1
                }
            };
            font_tables.push(table_index);
        }
        fonts.push(SourceFont {
            flavor: offset_table.sfnt_version,
            tables: font_tables,
        });
    }

    Ok((tables, fonts))
}

fn validate_records(
    offset_table: &OffsetTable<'_>,
    file_length: usize,
) -> Result<Vec<TableRecord>, Woff2Error> {
    let records = offset_table.table_records.iter().collect::<Vec<_>>();
    for (i, record) in records.iter().enumerate() {
        let end = usize::try_from(record.offset)?.checked_add(usize::try_from(record.length)?);
        if end.map_or(true, |end| end > file_length) {
            return Err(Woff2Error::MalformedFont {
                tag: Some(record.table_tag),
                offset: Some(record.offset as usize),
                reason: "table extends past the end of the file",
            });
        }
        if records[..i]
            .iter()
            .any(|other| other.table_tag == record.table_tag)
        {
            return Err(Woff2Error::malformed(Some(record.table_tag), "duplicate table"));
        }
    }

    match records.iter().find(|record| record.table_tag == tag::HEAD) {
        None => Err(Woff2Error::malformed(Some(tag::HEAD), "missing head table")),
        Some(head) if (head.length as usize) < HEAD_TABLE_MIN_SIZE => {
            Err(Woff2Error::malformed(Some(tag::HEAD), "head table too short"))
        }
        Some(_) => Ok(records),
    }
}

/// The order of the tables in the table directory, as indices into `tables`.
fn table_order(tables: &[SourceTable<'_>], fonts: &[SourceFont], preserve: bool) -> Vec<usize> {
    if preserve {
        (0..tables.len())
            .sorted_by_key(|&index| tables[index].offset)
            .collect()
    } else {
        fonts
            .iter()
            .flat_map(|font| {
                font.tables
                    .iter()
                    .copied()
                    .sorted_by_key(|&index| canonical_order_key(tables[index].tag))
            })
            .unique()
            .collect()
    }
}

fn find_table(stored: &[StoredTable<'_>], font: &CollectionFontEntry, tag: u32) -> Option<usize> {
    font.table_indices
        .iter()
        .map(|&index| usize::from(index))
        .find(|&index| stored[index].entry.tag == tag)
}

/// Transform each `glyf`/`loca` pair of the input, and the `hmtx` of a single font.
fn apply_transforms(
    stored: &mut [StoredTable<'_>],
    fonts: &[CollectionFontEntry],
    is_collection: bool,
    options: &EncodeOptions,
) {
    let glyf_indices = stored
        .iter()
        .positions(|table| table.entry.tag == tag::GLYF)
        .collect::<Vec<_>>();
    for glyf_index in glyf_indices {
        transform_glyf_pair(stored, fonts, glyf_index, is_collection, options);
    }
}

/// Transform the `glyf` table at `glyf_index` along with the `loca` that follows it. The `head`
/// and `maxp` tables of the first font using the pair describe it.
fn transform_glyf_pair(
    stored: &mut [StoredTable<'_>],
    fonts: &[CollectionFontEntry],
    glyf_index: usize,
    is_collection: bool,
    options: &EncodeOptions,
) {
    let loca_index = glyf_index + 1;
    if stored.get(loca_index).map(|table| table.entry.tag) != Some(tag::LOCA) {
        debug!("loca does not follow glyf, not transforming");
        return;
    }
    // Every font must use the pair together
    let has = |font: &CollectionFontEntry, index: usize| {
        font.table_indices.iter().any(|&i| usize::from(i) == index)
    };
    if fonts
        .iter()
        .any(|font| has(font, glyf_index) != has(font, loca_index))
    {
        debug!("glyf and loca not used together, not transforming");
        return;
    }
    let Some(font) = fonts.iter().find(|font| has(font, glyf_index)) else {
        return;
    };

    let head = find_table(stored, font, tag::HEAD)
        .and_then(|index| ReadScope::new(&stored[index].data).read::<HeadTable>().ok());
    let maxp = find_table(stored, font, tag::MAXP)
        .and_then(|index| ReadScope::new(&stored[index].data).read::<MaxpTable>().ok());
    let (Some(head), Some(maxp)) = (head, maxp) else {
        debug!("unable to read head or maxp, not transforming glyf");
        return;
    };

    let outcome = transform_glyf(
        &stored[glyf_index].data,
        &stored[loca_index].data,
        maxp.num_glyphs,
        head.index_to_loc_format,
    );
    let transformed = match outcome {
        TransformOutcome::Transformed(data) => data,
        TransformOutcome::Raw(_) => return,
    };
    let (Ok(glyf_length), Ok(glyf_orig_length), Ok(loca_orig_length)) = (
        u32::try_from(transformed.len()),
        u32::try_from(stored[glyf_index].data.len()),
        u32::try_from(stored[loca_index].data.len()),
    ) else {
        return;
    };

    let x_mins = if !is_collection && options.transform_hmtx {
        glyph_x_mins(
            &stored[glyf_index].data,
            &stored[loca_index].data,
            maxp.num_glyphs,
            head.index_to_loc_format,
        )
    } else {
        None
    };

    stored[glyf_index].entry =
        TableDirectoryEntry::new(tag::GLYF, glyf_orig_length, Some(glyf_length));
    stored[glyf_index].data = Cow::Owned(transformed);
    stored[loca_index].entry = TableDirectoryEntry::new(tag::LOCA, loca_orig_length, Some(0));
    stored[loca_index].data = Cow::Owned(Vec::new());
    debug!("glyf {} transformed to {} bytes", glyf_index, glyf_length);

    if let Some(x_mins) = x_mins {
        transform_font_hmtx(stored, font, maxp.num_glyphs, &x_mins);
    }
}

fn transform_font_hmtx(
    stored: &mut [StoredTable<'_>],
    font: &CollectionFontEntry,
    num_glyphs: u16,
    x_mins: &[i16],
) {
    let Some(hmtx_index) = find_table(stored, font, tag::HMTX) else {
        return;
    };
    let Some(hhea) = find_table(stored, font, tag::HHEA)
        .and_then(|index| ReadScope::new(&stored[index].data).read::<HheaTable>().ok())
    else {
        debug!("unable to read hhea, not transforming hmtx");
        return;
    };

    let hmtx = &stored[hmtx_index].data;
    let transformed = match transform_hmtx(hmtx, num_glyphs, hhea.num_h_metrics, x_mins) {
        TransformOutcome::Transformed(data) => data,
        TransformOutcome::Raw(_) => return,
    };
    if let (Ok(orig_length), Ok(length)) =
        (u32::try_from(hmtx.len()), u32::try_from(transformed.len()))
    {
        stored[hmtx_index].entry = TableDirectoryEntry::new(tag::HMTX, orig_length, Some(length));
        stored[hmtx_index].data = Cow::Owned(transformed);
    }
}

/// Build the SFNT that decoding will produce, returning its size.
///
/// For a single font the `checkSumAdjustment` of the stored `head` table is updated to match. The
/// `head` tables of collections are stored unchanged.
fn fix_up_head(
    stored: &mut [StoredTable<'_>],
    fonts: &[CollectionFontEntry],
    font: &OpenTypeFont<'_>,
) -> Result<usize, Woff2Error> {
    match &font.data {
        OpenTypeData::Single(offset_table) => {
            let mut builder = FontBuilder::new(offset_table.sfnt_version);
            for table in stored.iter() {
                builder.add_table::<_, ReadScope<'_>>(
                    table.entry.tag,
                    ReadScope::new(table.original),
                    (),
                )?;
            }
            let sfnt = builder.data()?;

            if let Some(head) = stored.iter_mut().find(|table| table.entry.tag == tag::HEAD) {
                let adjustment = head_checksum_adjustment(&sfnt)?;
                head.data.to_mut()[CHECK_SUM_ADJUSTMENT_OFFSET..][..size::U32]
                    .copy_from_slice(&adjustment.to_be_bytes());
            }
            Ok(sfnt.len())
        }
        OpenTypeData::Collection(ttc) => {
            let mut builder = CollectionBuilder::new(ttc.major_version);
            for table in stored.iter() {
                builder.add_table(table.original)?;
            }
            for entry in fonts {
                let tables = entry
                    .table_indices
                    .iter()
                    .map(|&index| {
                        let index = usize::from(index);
                        (stored[index].entry.tag, index)
                    })
                    .collect();
                builder.add_font(entry.flavor, tables)?;
            }
            Ok(builder.data()?.len())
        }
    }
}

/// Read the `checkSumAdjustment` from the `head` table of a built font
fn head_checksum_adjustment(sfnt: &[u8]) -> Result<u32, Woff2Error> {
    let scope = ReadScope::new(sfnt);
    let record = scope
        .read::<OffsetTable<'_>>()?
        .find_table_record(tag::HEAD)
        .ok_or(Woff2Error::malformed(Some(tag::HEAD), "missing head table"))?;
    let offset = usize::try_from(record.offset)? + CHECK_SUM_ADJUSTMENT_OFFSET;
    let adjustment = scope
        .offset(offset)
        .ctxt()
        .read_u32be()
        .map_err(ParseError::from)?;
    Ok(adjustment)
}

fn write_woff2(
    flavor: u32,
    stored: &[StoredTable<'_>],
    collection_directory: Option<&CollectionDirectory>,
    total_sfnt_size: usize,
    options: &EncodeOptions,
) -> Result<Vec<u8>, Woff2Error> {
    let mut table_data = Vec::with_capacity(stored.iter().map(|table| table.data.len()).sum());
    for table in stored {
        table_data.extend_from_slice(&table.data);
    }
    let compressed = compress::compress(&table_data, options.compression_effort)?;
    debug!(
        "{} bytes of table data compressed to {}",
        table_data.len(),
        compressed.len()
    );

    let metadata = match options.metadata.as_deref() {
        Some(xml) if !xml.is_empty() => Some((
            compress::compress(xml.as_bytes(), options.compression_effort)?,
            xml.len(),
        )),
        _ => None,
    };
    let private_data = options
        .private_data
        .as_deref()
        .filter(|data| !data.is_empty());

    let mut directories = WriteBuffer::new();
    for table in stored {
        TableDirectoryEntry::write(&mut directories, &table.entry)?;
    }
    if let Some(collection_directory) = collection_directory {
        CollectionDirectory::write(&mut directories, collection_directory)?;
    }

    // Metadata and private data each start on a 4-byte boundary
    let mut end = HEADER_SIZE + directories.len() + compressed.len();
    let (mut meta_offset, mut meta_length, mut meta_orig_length) = (0, 0, 0);
    if let Some((compressed_metadata, orig_length)) = &metadata {
        meta_offset = long_align(end);
        meta_length = compressed_metadata.len();
        meta_orig_length = *orig_length;
        end = meta_offset + meta_length;
    }
    let (mut priv_offset, mut priv_length) = (0, 0);
    if let Some(private_data) = private_data {
        priv_offset = long_align(end);
        priv_length = private_data.len();
        end = priv_offset + priv_length;
    }
    let length = long_align(end);

    let header = Woff2Header {
        flavor,
        length: u32::try_from(length)?,
        num_tables: u16::try_from(stored.len())?,
        total_sfnt_size: u32::try_from(total_sfnt_size)?,
        total_compressed_size: u32::try_from(compressed.len())?,
        major_version: 1,
        minor_version: 0,
        meta_offset: u32::try_from(meta_offset)?,
        meta_length: u32::try_from(meta_length)?,
        meta_orig_length: u32::try_from(meta_orig_length)?,
        priv_offset: u32::try_from(priv_offset)?,
        priv_length: u32::try_from(priv_length)?,
    };

    let mut woff2 = WriteBuffer::new();
    Woff2Header::write(&mut woff2, &header)?;
    woff2.write_bytes(directories.bytes())?;
    woff2.write_bytes(&compressed)?;
    if let Some((compressed_metadata, _)) = &metadata {
        woff2.write_zeros(meta_offset - woff2.len())?;
        woff2.write_bytes(compressed_metadata)?;
    }
    if let Some(private_data) = private_data {
        woff2.write_zeros(priv_offset - woff2.len())?;
        woff2.write_bytes(private_data)?;
    }
    woff2.write_zeros(length - woff2.len())?;

    Ok(woff2.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{
        be_tag, build_sfnt, head_table, sample_glyphs, truetype_tables, TRUETYPE_FLAVOR,
    };
    use crate::woff2::Woff2Font;

    fn directory_tags(woff2: &Woff2Font<'_>) -> Vec<u32> {
        woff2.table_directory.iter().map(|entry| entry.tag).collect()
    }

    fn transformed(woff2: &Woff2Font<'_>, tag: u32) -> bool {
        woff2
            .find_table_entry(tag, 0)
            .map_or(false, |entry| entry.is_transformed())
    }

    #[test]
    fn test_transformed_tables() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let data = encode(&sfnt, &EncodeOptions::default()).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        assert_eq!(woff2.header.num_tables, 10);
        assert_eq!(woff2.header.total_sfnt_size as usize, sfnt.len());
        assert_eq!(woff2.header.length as usize, data.len());
        assert_eq!(data.len() % 4, 0);
        assert!(transformed(&woff2, tag::GLYF));
        assert!(transformed(&woff2, tag::HMTX));
        let loca = woff2.find_table_entry(tag::LOCA, 0).unwrap();
        assert_eq!(loca.transform_length, Some(0));
        assert_eq!(loca.transform_version, 0);
    }

    #[test]
    fn test_transforms_disabled() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let options = EncodeOptions {
            transform_glyf_loca: false,
            ..EncodeOptions::default()
        };
        let data = encode(&sfnt, &options).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        assert!(woff2
            .table_directory
            .iter()
            .all(|entry| !entry.is_transformed()));
        let glyf = woff2.find_table_entry(tag::GLYF, 0).unwrap();
        assert_eq!(glyf.transform_version, 3);
    }

    #[test]
    fn test_hmtx_transform_disabled() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let options = EncodeOptions {
            transform_hmtx: false,
            ..EncodeOptions::default()
        };
        let data = encode(&sfnt, &options).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        assert!(transformed(&woff2, tag::GLYF));
        assert!(!transformed(&woff2, tag::HMTX));
    }

    #[test]
    fn test_canonical_table_order() {
        let mut tables = truetype_tables(&sample_glyphs(), false);
        tables.reverse();
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &tables);
        let data = encode(&sfnt, &EncodeOptions::default()).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        let expected = truetype_tables(&sample_glyphs(), false)
            .into_iter()
            .map(|(tag, _)| tag)
            .collect::<Vec<_>>();
        assert_eq!(directory_tags(&woff2), expected);
        assert!(transformed(&woff2, tag::GLYF));
    }

    #[test]
    fn test_preserve_table_order() {
        let mut tables = truetype_tables(&sample_glyphs(), false);
        tables.reverse();
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &tables);
        let options = EncodeOptions {
            preserve_table_order: true,
            ..EncodeOptions::default()
        };
        let data = encode(&sfnt, &options).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        let expected = tables.iter().map(|(tag, _)| *tag).collect::<Vec<_>>();
        assert_eq!(directory_tags(&woff2), expected);
        // loca now precedes glyf so neither can be transformed
        assert!(!transformed(&woff2, tag::GLYF));
        assert!(!transformed(&woff2, tag::LOCA));
        assert!(!transformed(&woff2, tag::HMTX));
    }

    #[test]
    fn test_head_adjustment_corrected() {
        let tables = truetype_tables(&sample_glyphs(), false);
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &tables);
        let head_offset = ReadScope::new(&sfnt)
            .read::<OffsetTable<'_>>()
            .unwrap()
            .find_table_record(tag::HEAD)
            .unwrap()
            .offset as usize;
        let adjustment = &sfnt[head_offset + 8..head_offset + 12];

        let mut broken = sfnt.clone();
        broken[head_offset + 8..head_offset + 12].copy_from_slice(&[0xAB; 4]);
        let data = encode(&broken, &EncodeOptions::default()).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();
        let head = woff2
            .stored_table_data(woff2.find_table_entry(tag::HEAD, 0).unwrap())
            .unwrap();
        assert_eq!(&head[8..12], adjustment);
    }

    #[test]
    fn test_metadata_and_private_data() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let xml = "<?xml version=\"1.0\"?><metadata version=\"1.0\"></metadata>";
        let options = EncodeOptions {
            metadata: Some(xml.to_string()),
            private_data: Some(vec![1, 2, 3, 4, 5]),
            ..EncodeOptions::default()
        };
        let data = encode(&sfnt, &options).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();

        let header = &woff2.header;
        assert_eq!(header.meta_offset % 4, 0);
        assert_eq!(header.priv_offset % 4, 0);
        assert_eq!(header.meta_orig_length as usize, xml.len());
        assert!(header.priv_offset >= header.meta_offset + header.meta_length);
        assert_eq!(header.length as usize, data.len());
        assert_eq!(woff2.extended_metadata().unwrap().as_deref(), Some(xml));
        assert_eq!(woff2.private_data().unwrap(), Some(&[1u8, 2, 3, 4, 5][..]));
    }

    #[test]
    fn test_empty_metadata_is_omitted() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let options = EncodeOptions {
            metadata: Some(String::new()),
            private_data: Some(Vec::new()),
            ..EncodeOptions::default()
        };
        let data = encode(&sfnt, &options).unwrap();
        let woff2 = Woff2Font::read(&data).unwrap();
        assert_eq!(woff2.header.meta_offset, 0);
        assert_eq!(woff2.header.priv_offset, 0);
    }

    #[test]
    fn test_unknown_sfnt_version() {
        let mut sfnt = build_sfnt(TRUETYPE_FLAVOR, &[(tag::HEAD, head_table(false))]);
        sfnt[..4].copy_from_slice(b"abcd");
        assert_eq!(
            encode(&sfnt, &EncodeOptions::default()),
            Err(Woff2Error::malformed(None, "unknown SFNT version"))
        );
    }

    #[test]
    fn test_missing_head() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &[(be_tag(b"name"), vec![1, 2, 3, 4])]);
        assert!(matches!(
            encode(&sfnt, &EncodeOptions::default()),
            Err(Woff2Error::MalformedFont {
                tag: Some(tag::HEAD),
                ..
            })
        ));
    }

    #[test]
    fn test_short_head() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &[(tag::HEAD, head_table(false)[..20].to_vec())]);
        assert!(matches!(
            encode(&sfnt, &EncodeOptions::default()),
            Err(Woff2Error::MalformedFont {
                tag: Some(tag::HEAD),
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_table() {
        let sfnt = build_sfnt(
            TRUETYPE_FLAVOR,
            &[
                (tag::HEAD, head_table(false)),
                (be_tag(b"name"), vec![1, 2, 3, 4]),
                (be_tag(b"name"), vec![5, 6, 7, 8]),
            ],
        );
        assert_eq!(
            encode(&sfnt, &EncodeOptions::default()),
            Err(Woff2Error::malformed(Some(be_tag(b"name")), "duplicate table"))
        );
    }

    #[test]
    fn test_table_past_end_of_file() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let truncated = &sfnt[..sfnt.len() - 40];
        assert!(matches!(
            encode(truncated, &EncodeOptions::default()),
            Err(Woff2Error::MalformedFont {
                offset: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn test_effort_above_maximum() {
        let sfnt = build_sfnt(TRUETYPE_FLAVOR, &truetype_tables(&sample_glyphs(), false));
        let options = |compression_effort| EncodeOptions {
            compression_effort,
            ..EncodeOptions::default()
        };
        assert_eq!(
            encode(&sfnt, &options(200)).unwrap(),
            encode(&sfnt, &options(11)).unwrap()
        );
    }
}
