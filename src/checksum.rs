#![deny(missing_docs)]

use std::num::Wrapping;

use crate::binary::read::ReadScope;
use crate::binary::U32Be;
use crate::error::ParseError;

/// The value that the checksum of a whole font, including `checkSumAdjustment`, must sum to.
pub const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// Calculate a checksum of `data` according to the OpenType table checksum algorithm
///
/// Data that does not end on a 32-bit boundary is treated as if it were padded with zeros.
///
/// https://docs.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums
pub fn table_checksum(data: &[u8]) -> Result<Wrapping<u32>, ParseError> {
    let whole_words = data.len() / 4;
    let mut ctxt = ReadScope::new(data).ctxt();
    let array = ctxt.read_array::<U32Be>(whole_words)?;
    let sum: Wrapping<u32> = array.iter().map(Wrapping).sum();

    let tail = &data[whole_words * 4..];
    if tail.is_empty() {
        Ok(sum)
    } else {
        let mut last = [0; 4];
        last[..tail.len()].copy_from_slice(tail);
        Ok(sum + Wrapping(u32::from_be_bytes(last)))
    }
}

/// Calculate the `checkSumAdjustment` value for a font whose checksum (with the adjustment
/// zeroed) is `font_checksum`.
pub fn checksum_adjustment(font_checksum: Wrapping<u32>) -> u32 {
    (Wrapping(CHECKSUM_MAGIC) - font_checksum).0
}
