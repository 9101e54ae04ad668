//! The WOFF2 `hmtx` transform.
//!
//! Left side bearings that equal the `xMin` of their glyph's bounding box are dropped and
//! recovered from the reconstructed `glyf` table.
//!
//! <https://www.w3.org/TR/WOFF2/#hmtx_table_format>

use bitflags::bitflags;
use log::debug;

use super::glyf::TransformOutcome;
use crate::binary::read::ReadScope;
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{I16Be, U16Be, U8};
use crate::error::{ParseError, Woff2Error, WriteError};
use crate::tables::loca::LocaTable;
use crate::tables::{HmtxTable, IndexToLocFormat, LongHorMetric};
use crate::tag;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct HmtxTransformFlags: u8 {
        /// The `lsb` array of the long metrics is absent
        const PROPORTIONAL_LSB_ABSENT = 0b01;
        /// The `leftSideBearing` array is absent
        const MONOSPACE_LSB_ABSENT = 0b10;
    }
}

/// The `xMin` of every glyph in an untransformed `glyf` table, zero for empty glyphs.
pub fn glyph_x_mins(
    glyf: &[u8],
    loca: &[u8],
    num_glyphs: u16,
    index_format: IndexToLocFormat,
) -> Option<Vec<i16>> {
    let loca = ReadScope::new(loca)
        .read_dep::<LocaTable<'_>>((num_glyphs, index_format))
        .ok()?;
    let glyf = ReadScope::new(glyf);
    loca.glyph_ranges(glyf.data().len())?
        .into_iter()
        .map(|range| {
            if range.is_empty() {
                Some(0)
            } else {
                glyf.offset_length(range.start, range.len())
                    .and_then(|glyph| glyph.offset(2).read::<I16Be>())
                    .ok()
            }
        })
        .collect()
}

/// Transform `hmtx`, dropping whichever side bearing arrays match `x_mins`.
///
/// Returns `TransformOutcome::Raw` when neither array can be dropped or the table does not match
/// `num_glyphs` and `num_h_metrics`.
pub fn transform_hmtx<'a>(
    hmtx: &'a [u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> TransformOutcome<'a> {
    match try_transform_hmtx(hmtx, num_glyphs, num_h_metrics, x_mins) {
        Ok(Some(transformed)) => {
            match reconstruct_hmtx(&transformed, num_glyphs, num_h_metrics, x_mins) {
                Ok(rebuilt) if rebuilt == hmtx => TransformOutcome::Transformed(transformed),
                _ => {
                    debug!("hmtx transform does not reproduce the original, storing raw");
                    TransformOutcome::Raw(hmtx)
                }
            }
        }
        Ok(None) => TransformOutcome::Raw(hmtx),
        Err(err) => {
            debug!("hmtx not transformed: {}", err);
            TransformOutcome::Raw(hmtx)
        }
    }
}

fn try_transform_hmtx(
    hmtx: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> Result<Option<Vec<u8>>, Woff2Error> {
    check_counts(num_glyphs, num_h_metrics, x_mins)?;
    let table = ReadScope::new(hmtx)
        .read_dep::<HmtxTable<'_>>((usize::from(num_glyphs), usize::from(num_h_metrics)))?;

    let (proportional_x_mins, monospace_x_mins) = x_mins.split_at(usize::from(num_h_metrics));
    let mut flags = HmtxTransformFlags::empty();
    if table
        .h_metrics
        .iter()
        .map(|metric| metric.lsb)
        .eq(proportional_x_mins.iter().copied())
    {
        flags |= HmtxTransformFlags::PROPORTIONAL_LSB_ABSENT;
    }
    if table
        .left_side_bearings
        .iter()
        .eq(monospace_x_mins.iter().copied())
    {
        flags |= HmtxTransformFlags::MONOSPACE_LSB_ABSENT;
    }
    if flags.is_empty() {
        debug!("hmtx side bearings don't match glyph bounding boxes");
        return Ok(None);
    }

    let mut transformed = WriteBuffer::new();
    U8::write(&mut transformed, flags.bits())?;
    transformed.write_iter::<U16Be, _>(table.h_metrics.iter().map(|metric| metric.advance_width))?;
    if !flags.contains(HmtxTransformFlags::PROPORTIONAL_LSB_ABSENT) {
        transformed.write_iter::<I16Be, _>(table.h_metrics.iter().map(|metric| metric.lsb))?;
    }
    if !flags.contains(HmtxTransformFlags::MONOSPACE_LSB_ABSENT) {
        transformed.write_iter::<I16Be, _>(table.left_side_bearings.iter())?;
    }

    Ok(Some(transformed.into_inner()))
}

fn check_counts(num_glyphs: u16, num_h_metrics: u16, x_mins: &[i16]) -> Result<(), Woff2Error> {
    if num_h_metrics == 0 || num_h_metrics > num_glyphs {
        return Err(Woff2Error::corrupt(
            Some(tag::HMTX),
            "numberOfHMetrics out of range",
        ));
    }
    if x_mins.len() != usize::from(num_glyphs) {
        return Err(Woff2Error::corrupt(
            Some(tag::HMTX),
            "glyph count does not match glyf",
        ));
    }
    Ok(())
}

/// Rebuild `hmtx` from its transformed form. Missing side bearings are taken from `x_mins`.
pub fn reconstruct_hmtx(
    data: &[u8],
    num_glyphs: u16,
    num_h_metrics: u16,
    x_mins: &[i16],
) -> Result<Vec<u8>, Woff2Error> {
    check_counts(num_glyphs, num_h_metrics, x_mins)?;
    let truncated =
        |_: ParseError| Woff2Error::corrupt(Some(tag::HMTX), "transformed hmtx is truncated");

    let mut ctxt = ReadScope::new(data).ctxt();
    let flags = ctxt
        .read_u8()
        .map_err(ParseError::from)
        .map_err(truncated)?;
    let flags = HmtxTransformFlags::from_bits(flags)
        .ok_or(Woff2Error::corrupt(Some(tag::HMTX), "reserved flags set"))?;
    if flags.is_empty() {
        return Err(Woff2Error::corrupt(
            Some(tag::HMTX),
            "transformed hmtx without absent side bearings",
        ));
    }

    let num_h_metrics = usize::from(num_h_metrics);
    let num_lsbs = usize::from(num_glyphs) - num_h_metrics;
    let advance_widths = ctxt.read_array::<U16Be>(num_h_metrics).map_err(truncated)?;
    let proportional_lsbs = if flags.contains(HmtxTransformFlags::PROPORTIONAL_LSB_ABSENT) {
        x_mins[..num_h_metrics].to_vec()
    } else {
        ctxt.read_array::<I16Be>(num_h_metrics)
            .map_err(truncated)?
            .to_vec()
    };
    let monospace_lsbs = if flags.contains(HmtxTransformFlags::MONOSPACE_LSB_ABSENT) {
        x_mins[num_h_metrics..].to_vec()
    } else {
        ctxt.read_array::<I16Be>(num_lsbs)
            .map_err(truncated)?
            .to_vec()
    };

    let mut hmtx = WriteBuffer::new();
    write_metrics(&mut hmtx, advance_widths.iter().zip(proportional_lsbs), monospace_lsbs)?;
    Ok(hmtx.into_inner())
}

fn write_metrics<C: WriteContext>(
    ctxt: &mut C,
    h_metrics: impl Iterator<Item = (u16, i16)>,
    left_side_bearings: Vec<i16>,
) -> Result<(), WriteError> {
    ctxt.write_iter::<LongHorMetric, _>(
        h_metrics.map(|(advance_width, lsb)| LongHorMetric { advance_width, lsb }),
    )?;
    ctxt.write_vec::<I16Be, _>(left_side_bearings)
}
