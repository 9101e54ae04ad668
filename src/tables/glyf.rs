//! Parsing and writing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType outline
//! > format. Information regarding the rasterizer (scaler) refers to the TrueType rasterizer.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>

use std::iter;

use bitflags::bitflags;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{long_padding, I16Be, U16Be, I8, U8};
use crate::error::{ParseError, WriteError};
use crate::tables::loca::{owned, LocaTable};
use crate::tables::F2Dot14;

bitflags! {
    #[rustfmt::skip]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT                       = 0b00000001;
        const X_SHORT_VECTOR                       = 0b00000010;
        const Y_SHORT_VECTOR                       = 0b00000100;
        const REPEAT_FLAG                          = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
        const OVERLAP_SIMPLE                       = 0b01000000;
    }
}

bitflags! {
    /// Flags of a composite glyph component
    ///
    /// Reserved bits are kept so that components are written back unchanged.
    #[rustfmt::skip]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct CompositeGlyphFlag: u16 {
        /// Arguments are 16-bit rather than bytes
        const ARG_1_AND_2_ARE_WORDS     = 0x0001;
        /// Arguments are an x, y offset rather than point numbers
        const ARGS_ARE_XY_VALUES        = 0x0002;
        const ROUND_XY_TO_GRID          = 0x0004;
        /// One F2Dot14 scale follows the arguments
        const WE_HAVE_A_SCALE           = 0x0008;
        const MORE_COMPONENTS           = 0x0020;
        /// Separate x and y scales follow the arguments
        const WE_HAVE_AN_X_AND_Y_SCALE  = 0x0040;
        /// A 2x2 matrix follows the arguments
        const WE_HAVE_A_TWO_BY_TWO      = 0x0080;
        /// An instruction length and instructions follow the last component
        const WE_HAVE_INSTRUCTIONS      = 0x0100;
        const USE_MY_METRICS            = 0x0200;
        const OVERLAP_COMPOUND          = 0x0400;
        const SCALED_COMPONENT_OFFSET   = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// `glyf` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>
#[derive(Debug, PartialEq)]
pub struct GlyfTable<'a> {
    pub records: Vec<GlyfRecord<'a>>,
}

/// One entry of the `glyf` table, parsed on demand.
#[derive(Debug, PartialEq, Clone)]
pub enum GlyfRecord<'a> {
    /// A glyph with no outline, such as a space
    Empty,
    Present {
        number_of_contours: i16,
        scope: ReadScope<'a>,
    },
    Parsed(Glyph<'a>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Glyph<'a> {
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub data: GlyphData<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyphData<'a> {
    /// Contours and points of a glyph with `number_of_contours >= 0`
    Simple(SimpleGlyph<'a>),
    /// Components of a glyph with `number_of_contours < 0`
    Composite {
        glyphs: Vec<CompositeGlyph>,
        instructions: &'a [u8],
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph<'a> {
    pub end_pts_of_contours: Vec<u16>,
    pub instructions: &'a [u8],
    pub flags: Vec<SimpleGlyphFlag>,
    pub coordinates: Vec<Point>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

/// A component offset or anchor point number, sized and signed according to its flags.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY { x_scale: F2Dot14, y_scale: F2Dot14 },
    Matrix([[F2Dot14; 2]; 2]),
}

/// The components of a composite glyph and whether instructions follow them.
pub struct CompositeGlyphs {
    pub glyphs: Vec<CompositeGlyph>,
    pub have_instructions: bool,
}

/// An outline point.
///
/// Coordinates are the running sum of the 16-bit deltas stored in the font. They are kept at 32
/// bits so that the deltas can be recovered exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub i32, pub i32);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BoundingBox {
    pub x_min: i16,
    pub x_max: i16,
    pub y_min: i16,
    pub y_max: i16,
}

impl<'b> ReadBinaryDep for GlyfTable<'b> {
    type Args<'a> = &'a LocaTable<'a>;
    type HostType<'a> = GlyfTable<'a>;

    /// Read the glyph records of a `glyf` table.
    ///
    /// Glyphs are not parsed, see [GlyfRecord::parse]. Fails with `ParseError::BadOffset` if the
    /// `loca` offsets are decreasing or point past the end of the table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        loca: &'a LocaTable<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let ranges = loca
            .glyph_ranges(scope.data().len())
            .ok_or(ParseError::BadOffset)?;

        let records = ranges
            .into_iter()
            .map(|range| {
                if range.is_empty() {
                    return Ok(GlyfRecord::Empty);
                }
                let glyph_scope = scope.offset_length(range.start, range.len())?;
                let number_of_contours = glyph_scope.read::<I16Be>()?;
                Ok(GlyfRecord::Present {
                    number_of_contours,
                    scope: glyph_scope,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        Ok(GlyfTable { records })
    }
}

impl<'a> WriteBinary for GlyfTable<'a> {
    type Output = owned::LocaTable;

    /// Write this glyf table into `ctxt`, returning the matching `loca` offsets.
    ///
    /// Each glyph is padded to a 4-byte boundary. Empty glyphs take no space.
    fn write<C: WriteContext>(
        ctxt: &mut C,
        table: GlyfTable<'a>,
    ) -> Result<owned::LocaTable, WriteError> {
        let mut loca = owned::LocaTable::with_capacity(table.records.len());

        let start = ctxt.bytes_written();
        for record in table.records {
            loca.offsets
                .push(u32::try_from(ctxt.bytes_written() - start)?);

            let offset = ctxt.bytes_written();
            match record {
                GlyfRecord::Empty => (),
                GlyfRecord::Present { scope, .. } => ReadScope::write(ctxt, scope)?,
                GlyfRecord::Parsed(glyph) => Glyph::write(ctxt, glyph)?,
            }
            ctxt.write_zeros(long_padding(ctxt.bytes_written() - offset))?;
        }

        // Add the final loca entry
        loca.offsets
            .push(u32::try_from(ctxt.bytes_written() - start)?);

        Ok(loca)
    }
}

impl ReadBinary for Glyph<'_> {
    type HostType<'a> = Glyph<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;
        // A negative contour count marks a composite glyph
        let data = match u16::try_from(number_of_contours) {
            Ok(contours) => GlyphData::Simple(ctxt.read_dep::<SimpleGlyph<'_>>(contours)?),
            Err(_) => {
                let CompositeGlyphs {
                    glyphs,
                    have_instructions,
                } = ctxt.read::<CompositeGlyphs>()?;
                let instructions: &[u8] = if have_instructions {
                    let length = ctxt.read_u16be()?;
                    ctxt.read_slice(usize::from(length))?
                } else {
                    &[]
                };
                GlyphData::Composite {
                    glyphs,
                    instructions,
                }
            }
        };

        Ok(Glyph {
            number_of_contours,
            bounding_box,
            data,
        })
    }
}

impl<'a> WriteBinary for Glyph<'a> {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, glyph: Glyph<'a>) -> Result<(), WriteError> {
        I16Be::write(ctxt, glyph.number_of_contours)?;
        BoundingBox::write(ctxt, glyph.bounding_box)?;
        match glyph.data {
            GlyphData::Simple(simple_glyph) => SimpleGlyph::write(ctxt, simple_glyph),
            GlyphData::Composite {
                glyphs,
                instructions,
            } => {
                let has_instructions = glyphs
                    .iter()
                    .any(|component| component.flags.we_have_instructions());
                ctxt.write_vec::<CompositeGlyph, _>(glyphs)?;
                if has_instructions {
                    U16Be::write(ctxt, u16::try_from(instructions.len())?)?;
                    ctxt.write_bytes(instructions)?;
                }
                Ok(())
            }
        }
    }
}

impl<'a> SimpleGlyph<'a> {
    pub fn bounding_box(&self) -> Result<BoundingBox, ParseError> {
        BoundingBox::from_points(&self.coordinates)
    }

    pub fn has_overlap_flag(&self) -> bool {
        self.flags
            .first()
            .map_or(false, |flag| flag.contains(SimpleGlyphFlag::OVERLAP_SIMPLE))
    }

    /// The number of points in each contour.
    ///
    /// Returns `None` if `end_pts_of_contours` is not increasing.
    pub fn contour_point_counts(&self) -> Option<Vec<u16>> {
        let mut prev_end: i32 = -1;
        self.end_pts_of_contours
            .iter()
            .map(|&end| {
                let count = i32::from(end) - prev_end;
                prev_end = i32::from(end);
                u16::try_from(count).ok().filter(|&count| count > 0)
            })
            .collect()
    }
}

impl ReadBinaryDep for SimpleGlyph<'_> {
    type Args<'a> = u16;
    type HostType<'a> = SimpleGlyph<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        number_of_contours: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = usize::from(number_of_contours);
        let end_pts_of_contours = ctxt.read_array::<U16Be>(number_of_contours)?.to_vec();
        let instruction_length = ctxt.read::<U16Be>()?;
        let instructions = ctxt.read_slice(usize::from(instruction_length))?;
        // end_pts_of_contours stores the index of the end points.
        // Therefore the number of coordinates is the last index + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            let count = if flag.contains(SimpleGlyphFlag::REPEAT_FLAG) {
                usize::from(ctxt.read_u8()?) + 1
            } else {
                1
            };
            flags.extend(iter::repeat(flag).take(count));
        }
        // A repeat count can run past the last point
        ctxt.check(flags.len() == number_of_coordinates)?;

        // All x deltas precede all y deltas. Both are relative to the previous point, the first
        // point being relative to the origin.
        let x_deltas = flags
            .iter()
            .map(|&flag| {
                read_delta(
                    ctxt,
                    flag,
                    SimpleGlyphFlag::X_SHORT_VECTOR,
                    SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut coordinates = Vec::with_capacity(number_of_coordinates);
        let mut point = Point(0, 0);
        for (&flag, dx) in flags.iter().zip(x_deltas) {
            let dy = read_delta(
                ctxt,
                flag,
                SimpleGlyphFlag::Y_SHORT_VECTOR,
                SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
            )?;
            point = Point(point.0 + dx, point.1 + dy);
            coordinates.push(point);
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            flags,
            coordinates,
        })
    }
}

impl<'a> WriteBinary for SimpleGlyph<'a> {
    type Output = ();

    /// Write the glyph description following the end points.
    ///
    /// Flags are compacted: unchanged coordinates and deltas that fit in a byte use the short
    /// forms and runs of identical flags use `REPEAT_FLAG`. Only the on-curve bit of each point
    /// and the overlap bit of the first point carry through from `flags`.
    fn write<C: WriteContext>(ctxt: &mut C, glyph: SimpleGlyph<'_>) -> Result<(), WriteError> {
        if glyph.flags.len() != glyph.coordinates.len() {
            return Err(WriteError::BadValue);
        }

        let has_overlap = glyph.has_overlap_flag();
        ctxt.write_vec::<U16Be, _>(glyph.end_pts_of_contours)?;
        U16Be::write(ctxt, u16::try_from(glyph.instructions.len())?)?;
        ctxt.write_bytes(glyph.instructions)?;

        let mut flags = Vec::with_capacity(glyph.flags.len());
        let mut x_coordinates = Vec::with_capacity(glyph.coordinates.len() * 2);
        let mut y_coordinates = Vec::with_capacity(glyph.coordinates.len() * 2);
        let mut last_flag = None;
        let mut repeat_count = 0u8;
        let mut prev = Point(0, 0);
        for (index, (flag, &point)) in glyph.flags.iter().zip(&glyph.coordinates).enumerate() {
            let mut out_flag = *flag & SimpleGlyphFlag::ON_CURVE_POINT;
            if index == 0 && has_overlap {
                out_flag |= SimpleGlyphFlag::OVERLAP_SIMPLE;
            }
            out_flag |= compact_delta(
                point.0 - prev.0,
                SimpleGlyphFlag::X_SHORT_VECTOR,
                SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
                &mut x_coordinates,
            );
            out_flag |= compact_delta(
                point.1 - prev.1,
                SimpleGlyphFlag::Y_SHORT_VECTOR,
                SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
                &mut y_coordinates,
            );

            if last_flag == Some(out_flag) && repeat_count != u8::MAX {
                if let Some(last) = flags.last_mut() {
                    *last |= SimpleGlyphFlag::REPEAT_FLAG.bits();
                }
                repeat_count += 1;
            } else {
                if repeat_count != 0 {
                    flags.push(repeat_count);
                }
                flags.push(out_flag.bits());
                repeat_count = 0;
            }
            last_flag = Some(out_flag);
            prev = point;
        }
        if repeat_count != 0 {
            flags.push(repeat_count);
        }

        ctxt.write_bytes(&flags)?;
        ctxt.write_bytes(&x_coordinates)?;
        ctxt.write_bytes(&y_coordinates)?;

        Ok(())
    }
}

/// Read one coordinate delta in the form described by the `short` and `same_or_positive` bits of
/// `flag`.
fn read_delta(
    ctxt: &mut ReadCtxt<'_>,
    flag: SimpleGlyphFlag,
    short: SimpleGlyphFlag,
    same_or_positive: SimpleGlyphFlag,
) -> Result<i32, ParseError> {
    let positive = flag.contains(same_or_positive);
    if flag.contains(short) {
        let magnitude = i32::from(ctxt.read_u8()?);
        Ok(if positive { magnitude } else { -magnitude })
    } else if positive {
        Ok(0)
    } else {
        Ok(i32::from(ctxt.read_i16be()?))
    }
}

/// Append the compact form of a coordinate delta to `data`, returning the flags that describe it.
fn compact_delta(
    delta: i32,
    short: SimpleGlyphFlag,
    same_or_positive: SimpleGlyphFlag,
    data: &mut Vec<u8>,
) -> SimpleGlyphFlag {
    if delta == 0 {
        same_or_positive
    } else if delta > -256 && delta < 256 {
        data.push(delta.unsigned_abs() as u8);
        if delta > 0 {
            short | same_or_positive
        } else {
            short
        }
    } else {
        // Deltas are stored in 16 bits
        data.extend_from_slice(&(delta as i16).to_be_bytes());
        SimpleGlyphFlag::empty()
    }
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinary for CompositeGlyphs {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let mut glyphs = Vec::new();
        let mut all_flags = CompositeGlyphFlag::empty();
        loop {
            let flags = ctxt.read::<CompositeGlyphFlag>()?;
            glyphs.push(ctxt.read_dep::<CompositeGlyph>(flags)?);
            all_flags |= flags;
            if !flags.contains(CompositeGlyphFlag::MORE_COMPONENTS) {
                break;
            }
        }

        Ok(CompositeGlyphs {
            glyphs,
            have_instructions: all_flags.we_have_instructions(),
        })
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self.contains(Self::ON_CURVE_POINT)
    }
}

impl ReadFrom for CompositeGlyphFlag {
    type ReadType = U16Be;

    fn read_from(flag: u16) -> Self {
        CompositeGlyphFlag::from_bits_retain(flag)
    }
}

impl ReadBinaryDep for CompositeGlyphArgument {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, flags: CompositeGlyphFlag) -> Result<Self, ParseError> {
        let words = flags.contains(CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS);
        let signed = flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES);
        let arg = match (words, signed) {
            (true, true) => CompositeGlyphArgument::I16(ctxt.read_i16be()?),
            (true, false) => CompositeGlyphArgument::U16(ctxt.read_u16be()?),
            (false, true) => CompositeGlyphArgument::I8(ctxt.read_i8()?),
            (false, false) => CompositeGlyphArgument::U8(ctxt.read_u8()?),
        };

        Ok(arg)
    }
}

impl WriteBinary for CompositeGlyphArgument {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, arg: CompositeGlyphArgument) -> Result<(), WriteError> {
        match arg {
            CompositeGlyphArgument::U8(val) => U8::write(ctxt, val),
            CompositeGlyphArgument::I8(val) => I8::write(ctxt, val),
            CompositeGlyphArgument::U16(val) => U16Be::write(ctxt, val),
            CompositeGlyphArgument::I16(val) => I16Be::write(ctxt, val),
        }
    }
}

impl ReadBinaryDep for CompositeGlyph {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, flags: CompositeGlyphFlag) -> Result<Self, ParseError> {
        let glyph_index = ctxt.read_u16be()?;
        let argument1 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;
        let argument2 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;

        let scale = ctxt.read_dep::<CompositeGlyphScale>(flags)?;

        Ok(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        })
    }
}

impl WriteBinary for CompositeGlyph {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, glyph: CompositeGlyph) -> Result<(), WriteError> {
        U16Be::write(ctxt, glyph.flags.bits())?;
        U16Be::write(ctxt, glyph.glyph_index)?;
        CompositeGlyphArgument::write(ctxt, glyph.argument1)?;
        CompositeGlyphArgument::write(ctxt, glyph.argument2)?;
        if let Some(scale) = glyph.scale {
            CompositeGlyphScale::write(ctxt, scale)?;
        }
        Ok(())
    }
}

impl ReadBinaryDep for CompositeGlyphScale {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Option<Self>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        flags: CompositeGlyphFlag,
    ) -> Result<Option<Self>, ParseError> {
        let mut next = || ctxt.read::<F2Dot14>();
        let scale = if flags.contains(CompositeGlyphFlag::WE_HAVE_A_SCALE) {
            CompositeGlyphScale::Scale(next()?)
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_AN_X_AND_Y_SCALE) {
            CompositeGlyphScale::XY {
                x_scale: next()?,
                y_scale: next()?,
            }
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_A_TWO_BY_TWO) {
            CompositeGlyphScale::Matrix([[next()?, next()?], [next()?, next()?]])
        } else {
            return Ok(None);
        };

        Ok(Some(scale))
    }
}

impl WriteBinary for CompositeGlyphScale {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, scale: CompositeGlyphScale) -> Result<(), WriteError> {
        match scale {
            CompositeGlyphScale::Scale(scale) => F2Dot14::write(ctxt, scale)?,
            CompositeGlyphScale::XY { x_scale, y_scale } => {
                F2Dot14::write(ctxt, x_scale)?;
                F2Dot14::write(ctxt, y_scale)?;
            }
            CompositeGlyphScale::Matrix(matrix) => {
                for &value in matrix.iter().flatten() {
                    F2Dot14::write(ctxt, value)?;
                }
            }
        }

        Ok(())
    }
}

impl ReadFrom for BoundingBox {
    type ReadType = ((I16Be, I16Be), (I16Be, I16Be));

    fn read_from(((x_min, y_min), (x_max, y_max)): ((i16, i16), (i16, i16))) -> Self {
        BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

impl WriteBinary for BoundingBox {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, bbox: BoundingBox) -> Result<(), WriteError> {
        I16Be::write(ctxt, bbox.x_min)?;
        I16Be::write(ctxt, bbox.y_min)?;
        I16Be::write(ctxt, bbox.x_max)?;
        I16Be::write(ctxt, bbox.y_max)?;
        Ok(())
    }
}

impl<'a> GlyfRecord<'a> {
    pub fn number_of_contours(&self) -> i16 {
        match self {
            GlyfRecord::Empty => 0,
            GlyfRecord::Present {
                number_of_contours, ..
            } => *number_of_contours,
            GlyfRecord::Parsed(glyph) => glyph.number_of_contours,
        }
    }

    /// Turn self from GlyfRecord::Present into GlyfRecord::Parsed
    pub fn parse(&mut self) -> Result<(), ParseError> {
        if let GlyfRecord::Present { scope, .. } = self {
            *self = scope.read::<Glyph<'_>>().map(GlyfRecord::Parsed)?;
        }
        Ok(())
    }
}

impl CompositeGlyphFlag {
    pub fn we_have_instructions(self) -> bool {
        self.contains(Self::WE_HAVE_INSTRUCTIONS)
    }
}

impl BoundingBox {
    /// Calculate xMin, xMax and yMin, yMax from a collection of `Points`
    ///
    /// The box of an empty set of points is all zeros. Fails with `ParseError::BadValue` if an
    /// extent does not fit in 16 bits.
    pub fn from_points(points: &[Point]) -> Result<Self, ParseError> {
        let Some(&Point(initial_x, initial_y)) = points.first() else {
            return Ok(BoundingBox {
                x_min: 0,
                x_max: 0,
                y_min: 0,
                y_max: 0,
            });
        };

        let (x_min, x_max, y_min, y_max) = points.iter().fold(
            (initial_x, initial_x, initial_y, initial_y),
            |(x_min, x_max, y_min, y_max), &Point(x, y)| {
                (x_min.min(x), x_max.max(x), y_min.min(y), y_max.max(y))
            },
        );

        let extent = |value: i32| i16::try_from(value).map_err(|_| ParseError::BadValue);
        Ok(BoundingBox {
            x_min: extent(x_min)?,
            x_max: extent(x_max)?,
            y_min: extent(y_min)?,
            y_max: extent(y_max)?,
        })
    }
}
