pub const TRUETYPE_FLAVOR: u32 = 0x00010000;
pub const CFF_FLAVOR: u32 = 0x4F54544F; // OTTO

pub fn be_tag(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// A glyph in a test font
#[derive(Debug, Clone, Copy)]
pub enum GlyphSpec {
    Empty,
    /// A rectangle from (x_min, y_min) to (x_max, y_max)
    Rect(i16, i16, i16, i16),
    /// A reference to another glyph offset by (dx, dy)
    Composite(u16, i16, i16),
}

fn push_u16(data: &mut Vec<u8>, value: u16) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(data: &mut Vec<u8>, value: i16) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

fn rect_bbox(glyph: GlyphSpec, glyphs: &[GlyphSpec]) -> Option<(i16, i16, i16, i16)> {
    match glyph {
        GlyphSpec::Empty => None,
        GlyphSpec::Rect(x_min, y_min, x_max, y_max) => Some((x_min, y_min, x_max, y_max)),
        GlyphSpec::Composite(index, dx, dy) => {
            let (x_min, y_min, x_max, y_max) = rect_bbox(glyphs[usize::from(index)], glyphs)?;
            Some((x_min + dx, y_min + dy, x_max + dx, y_max + dy))
        }
    }
}

/// Encode a simple glyph with compact flags and coordinates: short vectors where the delta fits
/// in a byte, the "same" bit for zero deltas and repeated flags.
fn encode_simple_glyph(points: &[(i16, i16)], bbox: (i16, i16, i16, i16)) -> Vec<u8> {
    let mut data = Vec::new();
    push_i16(&mut data, 1); // numberOfContours
    push_i16(&mut data, bbox.0);
    push_i16(&mut data, bbox.1);
    push_i16(&mut data, bbox.2);
    push_i16(&mut data, bbox.3);
    push_u16(&mut data, (points.len() - 1) as u16); // endPtsOfContours
    push_u16(&mut data, 0); // instructionLength

    fn delta(value: i32, short: u8, same: u8, data: &mut Vec<u8>) -> u8 {
        if value == 0 {
            same
        } else if value > -256 && value < 256 {
            data.push(value.unsigned_abs() as u8);
            if value > 0 {
                short | same
            } else {
                short
            }
        } else {
            data.extend_from_slice(&(value as i16).to_be_bytes());
            0
        }
    }

    let mut flags: Vec<u8> = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut last_flag = None;
    let mut repeat = 0u8;
    let mut prev = (0i32, 0i32);
    for &(x, y) in points {
        let (x, y) = (i32::from(x), i32::from(y));
        let mut flag = 0x01; // on curve
        flag |= delta(x - prev.0, 0x02, 0x10, &mut xs);
        flag |= delta(y - prev.1, 0x04, 0x20, &mut ys);
        if last_flag == Some(flag) && repeat != u8::MAX {
            if let Some(last) = flags.last_mut() {
                *last |= 0x08;
            }
            repeat += 1;
        } else {
            if repeat != 0 {
                flags.push(repeat);
            }
            flags.push(flag);
            repeat = 0;
        }
        last_flag = Some(flag);
        prev = (x, y);
    }
    if repeat != 0 {
        flags.push(repeat);
    }

    data.extend(flags);
    data.extend(xs);
    data.extend(ys);
    data
}

fn encode_glyph(glyph: GlyphSpec, glyphs: &[GlyphSpec]) -> Vec<u8> {
    match glyph {
        GlyphSpec::Empty => Vec::new(),
        GlyphSpec::Rect(x_min, y_min, x_max, y_max) => encode_simple_glyph(
            &[(x_min, y_min), (x_min, y_max), (x_max, y_max), (x_max, y_min)],
            (x_min, y_min, x_max, y_max),
        ),
        GlyphSpec::Composite(index, dx, dy) => {
            let bbox = rect_bbox(glyph, glyphs).unwrap_or((0, 0, 0, 0));
            let mut data = Vec::new();
            push_i16(&mut data, -1);
            push_i16(&mut data, bbox.0);
            push_i16(&mut data, bbox.1);
            push_i16(&mut data, bbox.2);
            push_i16(&mut data, bbox.3);
            push_u16(&mut data, 0x0003); // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES
            push_u16(&mut data, index);
            push_i16(&mut data, dx);
            push_i16(&mut data, dy);
            data
        }
    }
}

/// Build `glyf` and `loca` tables, each glyph padded to 4 bytes.
pub fn build_glyf_loca(glyphs: &[GlyphSpec], long_loca: bool) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(glyphs.len() + 1);
    for &glyph in glyphs {
        offsets.push(glyf.len());
        glyf.extend(encode_glyph(glyph, glyphs));
        pad4(&mut glyf);
    }
    offsets.push(glyf.len());

    let mut loca = Vec::new();
    for offset in offsets {
        if long_loca {
            push_u32(&mut loca, offset as u32);
        } else {
            push_u16(&mut loca, (offset / 2) as u16);
        }
    }
    (glyf, loca)
}

/// The xMin of each glyph, zero for empty glyphs
pub fn glyph_x_mins(glyphs: &[GlyphSpec]) -> Vec<i16> {
    glyphs
        .iter()
        .map(|&glyph| rect_bbox(glyph, glyphs).map_or(0, |bbox| bbox.0))
        .collect()
}

pub fn head_table(long_loca: bool) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0x00010000); // version
    push_u32(&mut data, 0x00018000); // fontRevision
    push_u32(&mut data, 0); // checkSumAdjustment
    push_u32(&mut data, 0x5F0F3CF5); // magicNumber
    push_u16(&mut data, 0x000B); // flags
    push_u16(&mut data, 1000); // unitsPerEm
    data.extend_from_slice(&[0, 0, 0, 0, 0xD5, 0x6B, 0x4C, 0x80]); // created
    data.extend_from_slice(&[0, 0, 0, 0, 0xD8, 0x2E, 0x6F, 0x00]); // modified
    push_i16(&mut data, -50);
    push_i16(&mut data, -250);
    push_i16(&mut data, 1200);
    push_i16(&mut data, 1800);
    push_u16(&mut data, 0); // macStyle
    push_u16(&mut data, 8); // lowestRecPPEM
    push_i16(&mut data, 2); // fontDirectionHint
    push_i16(&mut data, i16::from(long_loca)); // indexToLocFormat
    push_i16(&mut data, 0); // glyphDataFormat
    data
}

pub fn hhea_table(num_h_metrics: u16) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0x00010000);
    push_i16(&mut data, 800); // ascender
    push_i16(&mut data, -200); // descender
    push_i16(&mut data, 90); // lineGap
    push_u16(&mut data, 1250); // advanceWidthMax
    data.extend_from_slice(&[0; 22]); // minLeftSideBearing through metricDataFormat
    push_u16(&mut data, num_h_metrics);
    data
}

pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0x00010000);
    push_u16(&mut data, num_glyphs);
    for value in [64u16, 4, 64, 4, 2, 0, 16, 0, 64, 0, 0, 2, 1] {
        push_u16(&mut data, value);
    }
    data
}

/// `hmtx` with one advance per long metric and the given side bearings for every glyph
pub fn hmtx_table(advances: &[u16], lsbs: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    for (i, &lsb) in lsbs.iter().enumerate() {
        if let Some(&advance) = advances.get(i) {
            push_u16(&mut data, advance);
        }
        push_i16(&mut data, lsb);
    }
    data
}

/// Deterministic table contents
pub fn filler_table(seed: u8, length: usize) -> Vec<u8> {
    (0..length)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i % 61) as u8 ^ (i / 7) as u8))
        .collect()
}

/// Sort tables by tag with `loca` immediately after `glyf`
pub fn sort_canonical(tables: &mut [(u32, Vec<u8>)]) {
    let glyf = be_tag(b"glyf");
    let loca = be_tag(b"loca");
    tables.sort_by_key(|(tag, _)| if *tag == loca { (glyf, 1) } else { (*tag, 0) });
}

/// The tables of a TrueType font, in canonical order.
///
/// Side bearings equal glyph xMins so the `hmtx` table is transformable.
pub fn truetype_tables(glyphs: &[GlyphSpec], long_loca: bool) -> Vec<(u32, Vec<u8>)> {
    let num_glyphs = glyphs.len() as u16;
    let (glyf, loca) = build_glyf_loca(glyphs, long_loca);
    let advances = (0..num_glyphs).map(|i| 500 + i * 10).collect::<Vec<_>>();
    let mut tables = vec![
        (be_tag(b"OS/2"), filler_table(1, 96)),
        (be_tag(b"cmap"), filler_table(2, 38)),
        (be_tag(b"glyf"), glyf),
        (be_tag(b"loca"), loca),
        (be_tag(b"head"), head_table(long_loca)),
        (be_tag(b"hhea"), hhea_table(num_glyphs)),
        (be_tag(b"hmtx"), hmtx_table(&advances, &glyph_x_mins(glyphs))),
        (be_tag(b"maxp"), maxp_table(num_glyphs)),
        (be_tag(b"name"), filler_table(3, 70)),
        (be_tag(b"post"), filler_table(4, 32)),
    ];
    sort_canonical(&mut tables);
    tables
}

pub fn sample_glyphs() -> Vec<GlyphSpec> {
    vec![
        GlyphSpec::Empty,
        GlyphSpec::Rect(100, 0, 500, 700),
        GlyphSpec::Rect(-50, -250, 1200, 1800),
        GlyphSpec::Composite(1, 600, 0),
        GlyphSpec::Rect(30, 30, 31, 4000),
        GlyphSpec::Empty,
    ]
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn offset_table(data: &mut Vec<u8>, flavor: u32, num_tables: u16) {
    let mut entry_selector = 0u16;
    while (1u32 << (entry_selector + 1)) <= u32::from(num_tables) {
        entry_selector += 1;
    }
    let search_range = 16u16.saturating_mul(1 << entry_selector);
    push_u32(data, flavor);
    push_u16(data, num_tables);
    push_u16(data, search_range);
    push_u16(data, entry_selector);
    push_u16(data, num_tables.saturating_mul(16).saturating_sub(search_range));
}

fn record_checksum(tag: u32, table: &[u8]) -> u32 {
    if tag == be_tag(b"head") && table.len() >= 12 {
        let mut zeroed = table.to_vec();
        zeroed[8..12].fill(0);
        checksum(&zeroed)
    } else {
        checksum(table)
    }
}

/// Build an SFNT font with table data laid out in the order given and records sorted by tag.
///
/// The `head` checkSumAdjustment is set so the font sums to 0xB1B0AFBA.
pub fn build_sfnt(flavor: u32, tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut font = Vec::new();
    offset_table(&mut font, flavor, tables.len() as u16);

    let mut offset = 12 + 16 * tables.len();
    let mut records = Vec::new();
    let mut head_offset = None;
    for (tag, table) in tables {
        if *tag == be_tag(b"head") {
            head_offset = Some(offset);
        }
        records.push((*tag, record_checksum(*tag, table), offset, table.len()));
        offset += (table.len() + 3) & !3;
    }
    records.sort_by_key(|record| record.0);
    for (tag, checksum, offset, length) in records {
        push_u32(&mut font, tag);
        push_u32(&mut font, checksum);
        push_u32(&mut font, offset as u32);
        push_u32(&mut font, length as u32);
    }
    for (tag, table) in tables {
        if *tag == be_tag(b"head") {
            font.extend_from_slice(&table[..8]);
            push_u32(&mut font, 0);
            font.extend_from_slice(&table[12..]);
        } else {
            font.extend_from_slice(table);
        }
        pad4(&mut font);
    }

    if let Some(head_offset) = head_offset {
        let adjustment = 0xB1B0AFBAu32.wrapping_sub(checksum(&font));
        font[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    font
}

/// Build a TrueType collection. `fonts` lists the flavor of each font and indices into
/// `tables`. Table data is laid out in the order given, `head` tables are left unchanged.
pub fn build_ttc(
    major_version: u16,
    tables: &[(u32, Vec<u8>)],
    fonts: &[(u32, Vec<usize>)],
) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, be_tag(b"ttcf"));
    push_u16(&mut data, major_version);
    push_u16(&mut data, 0);
    push_u32(&mut data, fonts.len() as u32);
    let header_size = 12 + 4 * fonts.len() + if major_version == 2 { 12 } else { 0 };
    let mut font_offset = header_size;
    for (_, indices) in fonts {
        push_u32(&mut data, font_offset as u32);
        font_offset += 12 + 16 * indices.len();
    }
    if major_version == 2 {
        data.extend_from_slice(&[0; 12]);
    }

    let mut table_offsets = Vec::new();
    let mut table_offset = font_offset;
    for (_, table) in tables {
        table_offsets.push(table_offset);
        table_offset += (table.len() + 3) & !3;
    }

    for (flavor, indices) in fonts {
        offset_table(&mut data, *flavor, indices.len() as u16);
        let mut records = indices
            .iter()
            .map(|&index| {
                let (tag, table) = &tables[index];
                (*tag, record_checksum(*tag, table), table_offsets[index], table.len())
            })
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.0);
        for (tag, checksum, offset, length) in records {
            push_u32(&mut data, tag);
            push_u32(&mut data, checksum);
            push_u32(&mut data, offset as u32);
            push_u32(&mut data, length as u32);
        }
    }
    for (_, table) in tables {
        data.extend_from_slice(table);
        pad4(&mut data);
    }
    data
}
