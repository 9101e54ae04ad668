//! The WOFF2 `glyf`/`loca` transform.
//!
//! The transformed table splits glyph data into separate streams of contour counts, point counts,
//! flags, coordinates, composite data, bounding boxes and instructions, and drops `loca`
//! entirely. Decoding rebuilds `glyf` and `loca`.
//!
//! <https://www.w3.org/TR/WOFF2/#glyf_table_format>

use log::{debug, warn};

use super::lut::XYTriplet;
use super::{set_bit, BitSlice, PackedU16};
use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteBinaryDep, WriteBuffer, WriteContext};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::{ParseError, Woff2Error, WriteError};
use crate::tables::glyf::{
    BoundingBox, CompositeGlyph, CompositeGlyphs, GlyfRecord, GlyfTable, Glyph, GlyphData, Point,
    SimpleGlyph, SimpleGlyphFlag,
};
use crate::tables::loca::{owned, LocaTable};
use crate::tables::IndexToLocFormat;
use crate::tag;

/// Option flag indicating the overlap simple bitmap is present
const OVERLAP_SIMPLE_BITMAP: u16 = 0x0001;

/// Flag bit marking an off-curve point in the flag stream
const OFF_CURVE: u8 = 0x80;

/// The result of attempting to transform a table.
#[derive(Debug, PartialEq, Eq)]
pub enum TransformOutcome<'a> {
    /// The transformed table data
    Transformed(Vec<u8>),
    /// The table could not be transformed and is stored as is
    Raw(&'a [u8]),
}

/// A `glyf` table as rebuilt from its transformed form.
pub struct ReconstructedGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub index_format: IndexToLocFormat,
    /// The `xMin` of every glyph, zero for empty glyphs
    pub x_mins: Vec<i16>,
}

struct TransformedGlyphTable<'a> {
    option_flags: u16,
    num_glyphs: u16,
    index_format: IndexToLocFormat,
    n_contour_scope: ReadScope<'a>,
    n_points_scope: ReadScope<'a>,
    flag_scope: ReadScope<'a>,
    glyph_scope: ReadScope<'a>,
    composite_scope: ReadScope<'a>,
    bbox_bitmap_scope: ReadScope<'a>,
    bbox_scope: ReadScope<'a>,
    instruction_scope: ReadScope<'a>,
    overlap_bitmap_scope: Option<ReadScope<'a>>,
}

/// Output streams of the transform
#[derive(Default)]
struct Streams {
    n_contour: WriteBuffer,
    n_points: WriteBuffer,
    flags: WriteBuffer,
    glyphs: WriteBuffer,
    composite: WriteBuffer,
    bbox_bitmap: Vec<u8>,
    bbox: WriteBuffer,
    instructions: WriteBuffer,
    overlap_bitmap: Vec<u8>,
    has_overlap: bool,
}

/// The number of bytes in the bounding box bitmap
fn bbox_bitmap_len(num_glyphs: u16) -> usize {
    4 * ((usize::from(num_glyphs) + 31) / 32)
}

/// The number of bytes in the overlap simple bitmap
fn overlap_bitmap_len(num_glyphs: u16) -> usize {
    (usize::from(num_glyphs) + 7) >> 3
}

/// Transform `glyf` and `loca`.
///
/// Returns `TransformOutcome::Raw` when the tables can't be parsed or the transformed data does not
/// reconstruct to exactly the same bytes.
pub fn transform_glyf<'a>(
    glyf: &'a [u8],
    loca: &[u8],
    num_glyphs: u16,
    index_format: IndexToLocFormat,
) -> TransformOutcome<'a> {
    match try_transform_glyf(glyf, loca, num_glyphs, index_format) {
        Ok(transformed) => match reconstruct_glyf(&transformed) {
            Ok(rebuilt) if rebuilt.glyf == glyf && rebuilt.loca == loca => {
                TransformOutcome::Transformed(transformed)
            }
            Ok(_) => {
                debug!("glyf transform does not reproduce the original, storing raw");
                TransformOutcome::Raw(glyf)
            }
            Err(err) => {
                debug!("unable to reconstruct transformed glyf: {}", err);
                TransformOutcome::Raw(glyf)
            }
        },
        Err(reason) => {
            debug!("glyf not transformed: {}", reason);
            TransformOutcome::Raw(glyf)
        }
    }
}

fn try_transform_glyf(
    glyf: &[u8],
    loca: &[u8],
    num_glyphs: u16,
    index_format: IndexToLocFormat,
) -> Result<Vec<u8>, &'static str> {
    let loca = ReadScope::new(loca)
        .read_dep::<LocaTable<'_>>((num_glyphs, index_format))
        .map_err(|_| "loca table is too short")?;
    let glyf = ReadScope::new(glyf)
        .read_dep::<GlyfTable<'_>>(&loca)
        .map_err(|_| {
            warn!("loca offsets out of order or past the end of glyf");
            "invalid loca offsets"
        })?;

    let mut streams = Streams {
        bbox_bitmap: vec![0; bbox_bitmap_len(num_glyphs)],
        overlap_bitmap: vec![0; overlap_bitmap_len(num_glyphs)],
        ..Streams::default()
    };
    for (glyph_index, mut record) in glyf.records.into_iter().enumerate() {
        record.parse().map_err(|_| "unable to parse glyph")?;
        match record {
            GlyfRecord::Empty => {
                I16Be::write(&mut streams.n_contour, 0i16).map_err(|_| "write failed")?
            }
            GlyfRecord::Parsed(glyph) => streams
                .add_glyph(glyph_index, glyph)
                .map_err(|_| "glyph can't be encoded")?,
            GlyfRecord::Present { .. } => return Err("glyph was not parsed"),
        }
    }

    streams
        .into_table(num_glyphs, index_format)
        .map_err(|_| "write failed")
}

impl Streams {
    fn add_glyph(&mut self, glyph_index: usize, glyph: Glyph<'_>) -> Result<(), WriteError> {
        I16Be::write(&mut self.n_contour, glyph.number_of_contours)?;
        match glyph.data {
            GlyphData::Simple(simple) => {
                if glyph.number_of_contours == 0 {
                    // Stored as an empty glyph, the self check rejects this
                    return Ok(());
                }
                let counts = simple.contour_point_counts().ok_or(WriteError::BadValue)?;
                for count in counts {
                    PackedU16::write(&mut self.n_points, count)?;
                }

                let mut prev = Point(0, 0);
                for (flag, &point) in simple.flags.iter().zip(&simple.coordinates) {
                    let dx = point.0 - prev.0;
                    let dy = point.1 - prev.1;
                    encode_triplet(flag.is_on_curve(), dx, dy, &mut self.flags, &mut self.glyphs)?;
                    prev = point;
                }
                PackedU16::write(&mut self.glyphs, u16::try_from(simple.instructions.len())?)?;
                self.instructions.write_bytes(simple.instructions)?;

                let computed = simple.bounding_box().map_err(|_| WriteError::BadValue)?;
                if glyph.bounding_box != computed {
                    set_bit(&mut self.bbox_bitmap, glyph_index);
                    BoundingBox::write(&mut self.bbox, glyph.bounding_box)?;
                }
                if simple.has_overlap_flag() {
                    set_bit(&mut self.overlap_bitmap, glyph_index);
                    self.has_overlap = true;
                }
            }
            GlyphData::Composite {
                glyphs,
                instructions,
            } => {
                if glyph.number_of_contours != -1 {
                    return Err(WriteError::BadValue);
                }
                let mut has_instructions = false;
                for component in glyphs {
                    has_instructions |= component.flags.we_have_instructions();
                    CompositeGlyph::write(&mut self.composite, component)?;
                }
                if has_instructions {
                    PackedU16::write(&mut self.glyphs, u16::try_from(instructions.len())?)?;
                    self.instructions.write_bytes(instructions)?;
                }
                // Composite glyphs always have an explicit bounding box
                set_bit(&mut self.bbox_bitmap, glyph_index);
                BoundingBox::write(&mut self.bbox, glyph.bounding_box)?;
            }
        }

        Ok(())
    }

    fn into_table(
        self,
        num_glyphs: u16,
        index_format: IndexToLocFormat,
    ) -> Result<Vec<u8>, WriteError> {
        let option_flags = if self.has_overlap {
            OVERLAP_SIMPLE_BITMAP
        } else {
            0
        };
        let bbox_stream_size = self.bbox_bitmap.len() + self.bbox.len();

        let mut table = WriteBuffer::new();
        U16Be::write(&mut table, 0u16)?; // version
        U16Be::write(&mut table, option_flags)?;
        U16Be::write(&mut table, num_glyphs)?;
        U16Be::write(&mut table, index_format_value(index_format))?;
        for size in [
            self.n_contour.len(),
            self.n_points.len(),
            self.flags.len(),
            self.glyphs.len(),
            self.composite.len(),
            bbox_stream_size,
            self.instructions.len(),
        ] {
            U32Be::write(&mut table, u32::try_from(size)?)?;
        }
        table.write_bytes(self.n_contour.bytes())?;
        table.write_bytes(self.n_points.bytes())?;
        table.write_bytes(self.flags.bytes())?;
        table.write_bytes(self.glyphs.bytes())?;
        table.write_bytes(self.composite.bytes())?;
        table.write_bytes(&self.bbox_bitmap)?;
        table.write_bytes(self.bbox.bytes())?;
        table.write_bytes(self.instructions.bytes())?;
        if self.has_overlap {
            table.write_bytes(&self.overlap_bitmap)?;
        }

        Ok(table.into_inner())
    }
}

fn index_format_value(index_format: IndexToLocFormat) -> u16 {
    match index_format {
        IndexToLocFormat::Short => 0,
        IndexToLocFormat::Long => 1,
    }
}

/// Encode a point delta as a flag byte and a triplet of 1 to 4 bytes.
pub fn encode_triplet<C: WriteContext>(
    on_curve: bool,
    dx: i32,
    dy: i32,
    flags: &mut C,
    glyphs: &mut C,
) -> Result<(), WriteError> {
    let abs_x = dx.unsigned_abs();
    let abs_y = dy.unsigned_abs();
    if abs_x > 0xFFFF || abs_y > 0xFFFF {
        return Err(WriteError::BadValue);
    }

    let on_curve_bit = if on_curve { 0 } else { OFF_CURVE };
    let x_sign_bit = u32::from(dx >= 0);
    let y_sign_bit = u32::from(dy >= 0);
    let xy_sign_bits = x_sign_bit + 2 * y_sign_bit;

    let (flag, bytes, byte_count) = if dx == 0 && abs_y < 1280 {
        (((abs_y & 0xF00) >> 7) + y_sign_bit, [abs_y as u8, 0, 0, 0], 1)
    } else if dy == 0 && abs_x < 1280 {
        (10 + ((abs_x & 0xF00) >> 7) + x_sign_bit, [abs_x as u8, 0, 0, 0], 1)
    } else if abs_x < 65 && abs_y < 65 {
        let (x, y) = (abs_x - 1, abs_y - 1);
        (
            20 + (x & 0x30) + ((y & 0x30) >> 2) + xy_sign_bits,
            [(((x & 0xF) << 4) | (y & 0xF)) as u8, 0, 0, 0],
            1,
        )
    } else if abs_x < 769 && abs_y < 769 {
        let (x, y) = (abs_x - 1, abs_y - 1);
        (
            84 + 12 * ((x & 0x300) >> 8) + ((y & 0x300) >> 6) + xy_sign_bits,
            [x as u8, y as u8, 0, 0],
            2,
        )
    } else if abs_x < 4096 && abs_y < 4096 {
        (
            120 + xy_sign_bits,
            [
                (abs_x >> 4) as u8,
                (((abs_x & 0xF) << 4) | (abs_y >> 8)) as u8,
                abs_y as u8,
                0,
            ],
            3,
        )
    } else {
        (
            124 + xy_sign_bits,
            [
                (abs_x >> 8) as u8,
                abs_x as u8,
                (abs_y >> 8) as u8,
                abs_y as u8,
            ],
            4,
        )
    };

    flags.write_bytes(&[on_curve_bit | flag as u8])?;
    glyphs.write_bytes(&bytes[..byte_count])
}

/// Decode a point delta from `flag` and the triplet bytes that follow in `glyphs`.
///
/// Returns the delta and whether the point is on the curve.
pub fn decode_triplet(flag: u8, glyphs: &mut ReadCtxt<'_>) -> Result<(Point, bool), ParseError> {
    // The most significant bit of a flag is clear for on-curve points, the opposite of the
    // OpenType simple glyph flags.
    let on_curve = flag & OFF_CURVE == 0;
    let triplet = XYTriplet::from_flag(flag);
    let bytes = glyphs.read_slice(usize::from(triplet.byte_count))?;
    let data = bytes
        .iter()
        .fold(0u32, |data, &byte| (data << 8) | u32::from(byte));

    Ok((Point(triplet.dx(data), triplet.dy(data)), on_curve))
}

impl<'a> TransformedGlyphTable<'a> {
    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, Woff2Error> {
        let corrupt =
            |_| Woff2Error::corrupt(Some(tag::GLYF), "transformed glyf header is truncated");

        let reserved = ctxt.read_u16be().map_err(corrupt)?;
        if reserved != 0 {
            return Err(Woff2Error::unsupported(
                Some(tag::GLYF),
                "unknown transformed glyf version",
            ));
        }
        let option_flags = ctxt.read_u16be().map_err(corrupt)?;
        let num_glyphs = ctxt.read_u16be().map_err(corrupt)?;
        let index_format = match ctxt.read_u16be().map_err(corrupt)? {
            0 => IndexToLocFormat::Short,
            1 => IndexToLocFormat::Long,
            _ => return Err(Woff2Error::corrupt(Some(tag::GLYF), "invalid index format")),
        };

        let mut sizes = [0usize; 7];
        for size in sizes.iter_mut() {
            *size = usize::try_from(ctxt.read_u32be().map_err(corrupt)?)?;
        }
        let [
            n_contour_stream_size,
            n_points_stream_size,
            flag_stream_size,
            glyph_stream_size,
            composite_stream_size,
            bbox_stream_size,
            instruction_stream_size,
        ] = sizes;

        // The total number of bytes in bboxBitmap is equal to 4 * floor((numGlyphs + 31) / 32).
        let bbox_bitmap_length = bbox_bitmap_len(num_glyphs);
        let bbox_data_length = bbox_stream_size
            .checked_sub(bbox_bitmap_length)
            .ok_or(Woff2Error::corrupt(
                Some(tag::GLYF),
                "bbox stream is shorter than its bitmap",
            ))?;

        let overrun = |_| Woff2Error::corrupt(Some(tag::GLYF), "stream extends past end of table");
        let mut stream = |length: usize| ctxt.read_scope(length).map_err(overrun);
        let n_contour_scope = stream(n_contour_stream_size)?;
        let n_points_scope = stream(n_points_stream_size)?;
        let flag_scope = stream(flag_stream_size)?;
        let glyph_scope = stream(glyph_stream_size)?;
        let composite_scope = stream(composite_stream_size)?;
        let bbox_bitmap_scope = stream(bbox_bitmap_length)?;
        let bbox_scope = stream(bbox_data_length)?;
        let instruction_scope = stream(instruction_stream_size)?;
        let overlap_bitmap_scope = if option_flags & OVERLAP_SIMPLE_BITMAP != 0 {
            Some(stream(overlap_bitmap_len(num_glyphs))?)
        } else {
            None
        };

        Ok(TransformedGlyphTable {
            option_flags,
            num_glyphs,
            index_format,
            n_contour_scope,
            n_points_scope,
            flag_scope,
            glyph_scope,
            composite_scope,
            bbox_bitmap_scope,
            bbox_scope,
            instruction_scope,
            overlap_bitmap_scope,
        })
    }
}

/// Rebuild `glyf` and `loca` from a transformed `glyf` table.
pub fn reconstruct_glyf(data: &[u8]) -> Result<ReconstructedGlyf, Woff2Error> {
    let table = TransformedGlyphTable::read(&mut ReadScope::new(data).ctxt())?;
    debug!(
        "reconstructing {} glyphs, option flags {:#x}",
        table.num_glyphs, table.option_flags
    );

    let num_glyphs = usize::from(table.num_glyphs);
    let mut n_contour_ctxt = table.n_contour_scope.ctxt();
    let mut n_points_ctxt = table.n_points_scope.ctxt();
    let mut flags_ctxt = table.flag_scope.ctxt();
    let mut glyphs_ctxt = table.glyph_scope.ctxt();
    let mut composite_ctxt = table.composite_scope.ctxt();
    let mut bbox_ctxt = table.bbox_scope.ctxt();
    let mut instructions_ctxt = table.instruction_scope.ctxt();
    let bbox_bitmap = BitSlice::new(table.bbox_bitmap_scope.data());
    let overlap_bitmap = table
        .overlap_bitmap_scope
        .map(|scope| BitSlice::new(scope.data()));

    let corrupt = |reason| Woff2Error::corrupt(Some(tag::GLYF), reason);
    let mut records = Vec::with_capacity(num_glyphs);
    let mut x_mins = Vec::with_capacity(num_glyphs);
    for glyph_index in 0..num_glyphs {
        let number_of_contours = n_contour_ctxt
            .read_i16be()
            .map_err(|_| corrupt("nContour stream is truncated"))?;
        let has_bbox = bbox_bitmap.get(glyph_index) == Some(true);

        let record = match number_of_contours {
            0 => {
                if has_bbox {
                    return Err(corrupt("empty glyph has a bounding box"));
                }
                GlyfRecord::Empty
            }
            -1 => {
                // A composite glyph MUST have an explicitly supplied bounding box.
                if !has_bbox {
                    return Err(corrupt("composite glyph without bounding box"));
                }
                let glyphs = composite_ctxt
                    .read::<CompositeGlyphs>()
                    .map_err(|_| corrupt("composite stream is truncated"))?;
                let instruction_length = if glyphs.have_instructions {
                    glyphs_ctxt
                        .read::<PackedU16>()
                        .map_err(|_| corrupt("glyph stream is truncated"))?
                } else {
                    0
                };
                let instructions = instructions_ctxt
                    .read_slice(usize::from(instruction_length))
                    .map_err(|_| corrupt("instruction stream is truncated"))?;
                let bounding_box = bbox_ctxt
                    .read::<BoundingBox>()
                    .map_err(|_| corrupt("bbox stream is truncated"))?;

                GlyfRecord::Parsed(Glyph {
                    number_of_contours,
                    bounding_box,
                    data: GlyphData::Composite {
                        glyphs: glyphs.glyphs,
                        instructions,
                    },
                })
            }
            num if num > 0 => {
                let has_overlap = overlap_bitmap
                    .as_ref()
                    .and_then(|bitmap| bitmap.get(glyph_index))
                    .unwrap_or(false);
                let simple = decode_simple_glyph(
                    &mut n_points_ctxt,
                    &mut flags_ctxt,
                    &mut glyphs_ctxt,
                    &mut instructions_ctxt,
                    num as u16,
                    has_overlap,
                )?;
                let bounding_box = if has_bbox {
                    bbox_ctxt
                        .read::<BoundingBox>()
                        .map_err(|_| corrupt("bbox stream is truncated"))?
                } else {
                    simple
                        .bounding_box()
                        .map_err(|_| corrupt("point coordinates exceed 16 bits"))?
                };

                GlyfRecord::Parsed(Glyph {
                    number_of_contours,
                    bounding_box,
                    data: GlyphData::Simple(simple),
                })
            }
            _ => return Err(corrupt("invalid number of contours")),
        };

        x_mins.push(match &record {
            GlyfRecord::Parsed(glyph) => glyph.bounding_box.x_min,
            _ => 0,
        });
        records.push(record);
    }

    let mut glyf = WriteBuffer::new();
    let loca = GlyfTable::write(&mut glyf, GlyfTable { records })?;
    let mut loca_data = WriteBuffer::new();
    owned::LocaTable::write_dep(&mut loca_data, loca, table.index_format)
        .map_err(|_| Woff2Error::corrupt(Some(tag::LOCA), "glyph offsets do not fit loca format"))?;

    Ok(ReconstructedGlyf {
        glyf: glyf.into_inner(),
        loca: loca_data.into_inner(),
        index_format: table.index_format,
        x_mins,
    })
}

fn decode_simple_glyph<'a>(
    n_points_ctxt: &mut ReadCtxt<'_>,
    flags_ctxt: &mut ReadCtxt<'_>,
    glyphs_ctxt: &mut ReadCtxt<'_>,
    instructions_ctxt: &mut ReadCtxt<'a>,
    number_of_contours: u16,
    has_overlap: bool,
) -> Result<SimpleGlyph<'a>, Woff2Error> {
    let corrupt = |reason| Woff2Error::corrupt(Some(tag::GLYF), reason);

    // Read numberOfContours 255UInt16 values from the nPoints stream. Each of these is the
    // number of points of that contour. Convert this into the endPtsOfContours[] array by
    // computing the cumulative sum, then subtracting one.
    let mut n_points = 0u32;
    let end_pts_of_contours = (0..number_of_contours)
        .map(|_| {
            let count = n_points_ctxt
                .read::<PackedU16>()
                .map_err(|_| corrupt("nPoints stream is truncated"))?;
            n_points += u32::from(count);
            n_points
                .checked_sub(1)
                .and_then(|end| u16::try_from(end).ok())
                .ok_or(corrupt("invalid contour end point"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut flags = Vec::with_capacity(n_points as usize);
    let mut coordinates = Vec::with_capacity(n_points as usize);
    let mut prev = Point(0, 0);
    for _ in 0..n_points {
        let flag = flags_ctxt
            .read_u8()
            .map_err(|_| corrupt("flag stream is truncated"))?;
        let (delta, on_curve) =
            decode_triplet(flag, glyphs_ctxt).map_err(|_| corrupt("glyph stream is truncated"))?;

        // The x and y coordinates are stored as deltas against the previous point, with the
        // first one being implicitly against (0, 0).
        prev = prev
            .0
            .checked_add(delta.0)
            .zip(prev.1.checked_add(delta.1))
            .map(|(x, y)| Point(x, y))
            .ok_or(corrupt("point coordinate overflows"))?;
        coordinates.push(prev);
        flags.push(if on_curve {
            SimpleGlyphFlag::ON_CURVE_POINT
        } else {
            SimpleGlyphFlag::empty()
        });
    }
    if has_overlap {
        if let Some(first) = flags.first_mut() {
            *first |= SimpleGlyphFlag::OVERLAP_SIMPLE;
        }
    }

    let instruction_length = glyphs_ctxt
        .read::<PackedU16>()
        .map_err(|_| corrupt("glyph stream is truncated"))?;
    let instructions = instructions_ctxt
        .read_slice(usize::from(instruction_length))
        .map_err(|_| corrupt("instruction stream is truncated"))?;

    Ok(SimpleGlyph {
        end_pts_of_contours,
        instructions,
        flags,
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{build_glyf_loca, GlyphSpec};

    fn triplet(on_curve: bool, dx: i32, dy: i32) -> (u8, Vec<u8>) {
        let mut flags = WriteBuffer::new();
        let mut glyphs = WriteBuffer::new();
        encode_triplet(on_curve, dx, dy, &mut flags, &mut glyphs).unwrap();
        (flags.bytes()[0], glyphs.into_inner())
    }

    #[test]
    fn test_encode_triplet_forms() {
        assert_eq!(triplet(true, 0, 5), (1, vec![5]));
        assert_eq!(triplet(true, 0, -300), (2, vec![44]));
        assert_eq!(triplet(false, 7, 0), (128 + 11, vec![7]));
        assert_eq!(triplet(true, -3, 4), (20 + 2, vec![0x23]));
        assert_eq!(triplet(true, 100, -200), (84 + 1, vec![99, 199]));
        assert_eq!(triplet(true, 1000, 2000), (123, vec![0x3E, 0x87, 0xD0]));
        assert_eq!(triplet(true, -5000, 10), (124 + 2, vec![0x13, 0x88, 0x00, 0x0A]));
    }

    #[test]
    fn test_triplet_round_trip() {
        let deltas = [
            (0, 0),
            (0, 1279),
            (-1279, 0),
            (64, -64),
            (-65, 65),
            (768, -768),
            (-769, 1),
            (4095, -4095),
            (4096, 0),
            (-32768, 32767),
        ];
        for (dx, dy) in deltas {
            for on_curve in [true, false] {
                let (flag, bytes) = triplet(on_curve, dx, dy);
                let mut ctxt = ReadScope::new(&bytes).ctxt();
                let (point, decoded_on_curve) = decode_triplet(flag, &mut ctxt).unwrap();
                assert_eq!(point, Point(dx, dy), "delta ({}, {})", dx, dy);
                assert_eq!(decoded_on_curve, on_curve);
                assert!(!ctxt.bytes_available());
            }
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let (glyf, loca) = build_glyf_loca(
            &[
                GlyphSpec::Empty,
                GlyphSpec::Rect(100, 0, 500, 700),
                GlyphSpec::Composite(1, 600, 0),
                GlyphSpec::Rect(-50, -250, 1200, 1800),
            ], false);

        let transformed = match transform_glyf(&glyf, &loca, 4, IndexToLocFormat::Short) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        assert!(transformed.len() < glyf.len() + loca.len());

        let rebuilt = reconstruct_glyf(&transformed).unwrap();
        assert_eq!(rebuilt.glyf, glyf);
        assert_eq!(rebuilt.loca, loca);
        assert_eq!(rebuilt.x_mins, vec![0, 100, 700, -50]);
    }

    #[test]
    fn test_transform_long_loca() {
        let (glyf, loca) = build_glyf_loca(
            &[GlyphSpec::Rect(0, 0, 10, 10), GlyphSpec::Empty], true);
        let transformed = match transform_glyf(&glyf, &loca, 2, IndexToLocFormat::Long) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        let rebuilt = reconstruct_glyf(&transformed).unwrap();
        assert_eq!(rebuilt.index_format, IndexToLocFormat::Long);
        assert_eq!(rebuilt.loca, loca);
    }

    #[test]
    fn test_loca_out_of_range_is_raw() {
        let (glyf, mut loca) = build_glyf_loca(&[GlyphSpec::Rect(0, 0, 10, 10)], false);
        // Point the end of the last glyph past the end of glyf
        let last = loca.len() - 1;
        loca[last] = 0xFF;
        assert_eq!(
            transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short),
            TransformOutcome::Raw(&glyf)
        );
    }

    #[test]
    fn test_non_canonical_glyph_is_raw() {
        let (mut glyf, loca) = build_glyf_loca(&[GlyphSpec::Rect(0, 0, 10, 10)], false);
        // Set the reserved bit on the first point flag
        let flags_offset = 10 + 2 + 2;
        glyf[flags_offset] |= 0x80;
        assert_eq!(
            transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short),
            TransformOutcome::Raw(&glyf)
        );
    }

    #[test]
    fn test_composite_requires_bbox() {
        let (glyf, loca) = build_glyf_loca(&[GlyphSpec::Composite(0, 0, 0)], false);
        let mut transformed = match transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        // Clear the bbox bitmap, which follows the header, nContour, nPoints, flag, glyph and
        // composite streams.
        let sizes = |i: usize| {
            let offset = 8 + i * 4;
            u32::from_be_bytes([
                transformed[offset],
                transformed[offset + 1],
                transformed[offset + 2],
                transformed[offset + 3],
            ]) as usize
        };
        let bitmap_offset = 36 + (0..5).map(sizes).sum::<usize>();
        transformed[bitmap_offset] = 0;
        assert!(matches!(
            reconstruct_glyf(&transformed),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn test_overlap_flag_round_trip() {
        let (mut glyf, loca) = build_glyf_loca(&[GlyphSpec::Rect(0, 0, 10, 10)], false);
        let flags_offset = 10 + 2 + 2;
        glyf[flags_offset] |= SimpleGlyphFlag::OVERLAP_SIMPLE.bits();
        let transformed = match transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        // optionFlags
        assert_eq!(&transformed[2..4], &[0, 1]);
        assert_eq!(reconstruct_glyf(&transformed).unwrap().glyf, glyf);
    }

    /// A transformed glyf holding one simple glyph of a single contour, where every point uses
    /// triplet flag 127 with an x delta of 65535.
    fn far_apart_points(num_points: u16) -> Vec<u8> {
        let mut n_points = WriteBuffer::new();
        PackedU16::write(&mut n_points, num_points).unwrap();
        let flags = vec![127u8; usize::from(num_points)];
        let mut glyphs = [0xFFu8, 0xFF, 0x00, 0x00].repeat(usize::from(num_points));
        glyphs.push(0); // instruction length

        let mut table = WriteBuffer::new();
        for value in [0u16, 0, 1, 1] {
            U16Be::write(&mut table, value).unwrap();
        }
        for size in [2, n_points.len(), flags.len(), glyphs.len(), 0, 4, 0] {
            U32Be::write(&mut table, size as u32).unwrap();
        }
        I16Be::write(&mut table, 1i16).unwrap();
        table.write_bytes(n_points.bytes()).unwrap();
        table.write_bytes(&flags).unwrap();
        table.write_bytes(&glyphs).unwrap();
        table.write_zeros(4).unwrap(); // bbox bitmap
        table.into_inner()
    }

    #[test]
    fn test_coordinate_overflow() {
        assert!(matches!(
            reconstruct_glyf(&far_apart_points(40000)),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn test_computed_bbox_out_of_range() {
        // Without an explicit bbox the box is computed, and x = 65535 does not fit
        assert!(matches!(
            reconstruct_glyf(&far_apart_points(2)),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn test_unknown_version() {
        let (glyf, loca) = build_glyf_loca(&[GlyphSpec::Rect(0, 0, 10, 10)], false);
        let mut transformed = match transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        transformed[1] = 1;
        assert!(matches!(
            reconstruct_glyf(&transformed),
            Err(Woff2Error::UnsupportedFeature { .. })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let (glyf, loca) = build_glyf_loca(&[GlyphSpec::Rect(0, 0, 10, 10)], false);
        let transformed = match transform_glyf(&glyf, &loca, 1, IndexToLocFormat::Short) {
            TransformOutcome::Transformed(data) => data,
            TransformOutcome::Raw(_) => panic!("expected glyf to be transformed"),
        };
        assert!(matches!(
            reconstruct_glyf(&transformed[..transformed.len() - 1]),
            Err(Woff2Error::CorruptContainer { .. })
        ));
    }
}
