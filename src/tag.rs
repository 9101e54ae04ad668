//! Font table tags.

use std::fmt;

/// Generate a 4-byte font table tag from byte string
///
/// Example:
///
/// ```ignore
/// assert_eq!(tag!(b"glyf"), 0x676C7966);
/// ```
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

/// Wrapper that formats a tag as its four characters, or as hex when they are not printable.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

/// Build a tag from its four bytes.
pub const fn tag(chars: [u8; 4]) -> u32 {
    u32::from_be_bytes(chars)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            let s: String = bytes.iter().map(|&b| char::from(b)).collect();
            s.fmt(f)
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

pub const CMAP: u32 = tag!(b"cmap");
pub const CVT: u32 = tag!(b"cvt ");
pub const GLYF: u32 = tag!(b"glyf");
pub const HEAD: u32 = tag!(b"head");
pub const HHEA: u32 = tag!(b"hhea");
pub const HMTX: u32 = tag!(b"hmtx");
pub const LOCA: u32 = tag!(b"loca");
pub const MAXP: u32 = tag!(b"maxp");
pub const NAME: u32 = tag!(b"name");
pub const OS_2: u32 = tag!(b"OS/2");
pub const SILL: u32 = tag!(b"Sill");

/// `sfntVersion` of a font with CFF outlines
pub const OTTO: u32 = tag!(b"OTTO");
/// `sfntVersion` of an Apple TrueType font
pub const TRUE: u32 = tag!(b"true");
/// Collection header signature
pub const TTCF: u32 = tag!(b"ttcf");
/// WOFF2 file signature
pub const WOF2: u32 = tag!(b"wOF2");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_value() {
        assert_eq!(GLYF, 0x676C7966);
        assert_eq!(tag(*b"OS/2"), OS_2);
    }

    #[test]
    fn test_ascii() {
        assert_eq!(DisplayTag(NAME).to_string(), "name".to_string());
        assert_eq!(DisplayTag(CVT).to_string(), "cvt ".to_string());
    }

    #[test]
    fn test_non_ascii() {
        assert_eq!(DisplayTag(0x12345678).to_string(), "0x12345678".to_string());
    }
}
