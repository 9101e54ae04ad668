//! The WOFF2 known table tags and the transformed `glyf` point encodings.

use crate::tag::tag;

/// Tags that can be encoded with a 6-bit index in a table directory entry flags byte.
///
/// The index of a tag in this array is its encoding. The value 63, which is not present in this
/// array, indicates that an explicit 4-byte tag follows the flags byte.
///
/// <https://www.w3.org/TR/WOFF2/#table_dir_format>
#[rustfmt::skip]
pub static KNOWN_TABLE_TAGS: [u32; 63] = [
    tag(*b"cmap"), tag(*b"head"), tag(*b"hhea"), tag(*b"hmtx"), tag(*b"maxp"), tag(*b"name"),
    tag(*b"OS/2"), tag(*b"post"), tag(*b"cvt "), tag(*b"fpgm"), tag(*b"glyf"), tag(*b"loca"),
    tag(*b"prep"), tag(*b"CFF "), tag(*b"VORG"), tag(*b"EBDT"), tag(*b"EBLC"), tag(*b"gasp"),
    tag(*b"hdmx"), tag(*b"kern"), tag(*b"LTSH"), tag(*b"PCLT"), tag(*b"VDMX"), tag(*b"vhea"),
    tag(*b"vmtx"), tag(*b"BASE"), tag(*b"GDEF"), tag(*b"GPOS"), tag(*b"GSUB"), tag(*b"EBSC"),
    tag(*b"JSTF"), tag(*b"MATH"), tag(*b"CBDT"), tag(*b"CBLC"), tag(*b"COLR"), tag(*b"CPAL"),
    tag(*b"SVG "), tag(*b"sbix"), tag(*b"acnt"), tag(*b"avar"), tag(*b"bdat"), tag(*b"bloc"),
    tag(*b"bsln"), tag(*b"cvar"), tag(*b"fdsc"), tag(*b"feat"), tag(*b"fmtx"), tag(*b"fvar"),
    tag(*b"gvar"), tag(*b"hsty"), tag(*b"just"), tag(*b"lcar"), tag(*b"mort"), tag(*b"morx"),
    tag(*b"opbd"), tag(*b"prop"), tag(*b"trak"), tag(*b"Zapf"), tag(*b"Silf"), tag(*b"Glat"),
    tag(*b"Gloc"), tag(*b"Feat"), tag(*b"Sill"),
];

/// How a point delta is packed into the bytes following a transformed `glyf` flag.
///
/// <https://www.w3.org/TR/WOFF2/#triplet_decoding>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct XYTriplet {
    pub x_is_negative: bool,
    pub y_is_negative: bool,
    /// Data bytes after the flag
    pub byte_count: u8,
    pub x_bits: u8,
    pub y_bits: u8,
    pub delta_x: u16,
    pub delta_y: u16,
}

impl XYTriplet {
    /// The encoding selected by the low seven bits of a flag.
    ///
    /// The 128 encodings fall into six bands. Within each band the sign of x and y cycle
    /// fastest (negative first), then the biases added to the stored magnitudes.
    pub fn from_flag(flag: u8) -> XYTriplet {
        let index = flag & 0x7F;
        let (band, byte_count, x_bits, y_bits) = match index {
            0..=9 => (0, 1, 0, 8),
            10..=19 => (10, 1, 8, 0),
            20..=83 => (20, 1, 4, 4),
            84..=119 => (84, 2, 8, 8),
            120..=123 => (120, 3, 12, 12),
            _ => (124, 4, 16, 16),
        };
        let b = u16::from(index - band);
        let (delta_x, delta_y) = match band {
            0 => (0, (b >> 1) * 256),
            10 => ((b >> 1) * 256, 0),
            20 => (1 + (b >> 4) * 16, 1 + ((b >> 2) & 3) * 16),
            84 => (1 + (b / 12) * 256, 1 + ((b % 12) >> 2) * 256),
            _ => (0, 0),
        };
        // The first two bands carry a single coordinate and so a single sign bit.
        let (x_is_negative, y_is_negative) = match band {
            0 => (false, b & 1 == 0),
            10 => (b & 1 == 0, false),
            _ => (b & 1 == 0, b & 2 == 0),
        };

        XYTriplet {
            x_is_negative,
            y_is_negative,
            byte_count,
            x_bits,
            y_bits,
            delta_x,
            delta_y,
        }
    }

    /// Decode the x delta from the `byte_count` big-endian bytes in `data`.
    pub fn dx(&self, data: u32) -> i32 {
        let shift = self.byte_count * 8 - self.x_bits;
        coordinate(data, shift, self.x_bits, self.delta_x, self.x_is_negative)
    }

    /// Decode the y delta from the `byte_count` big-endian bytes in `data`.
    pub fn dy(&self, data: u32) -> i32 {
        let shift = self.byte_count * 8 - self.x_bits - self.y_bits;
        coordinate(data, shift, self.y_bits, self.delta_y, self.y_is_negative)
    }
}

fn coordinate(data: u32, shift: u8, bits: u8, delta: u16, negative: bool) -> i32 {
    let mask = (1u32 << bits) - 1;
    // At most 16 bits plus a bias below 2^11, so the value fits an i32.
    let value = (((data >> shift) & mask) + u32::from(delta)) as i32;
    if negative {
        -value
    } else {
        value
    }
}
