/// Read binary data
pub mod read;

/// Write binary data
pub mod write;

/// Calculate the length required to 32-bit (long) align data of length `len`
///
/// Example:
///
/// ```
/// use woff2::binary::long_align;
///
/// let length = 123;
/// let padded_length = long_align(length);
/// assert_eq!(padded_length, 124);
/// ```
pub const fn long_align(len: usize) -> usize {
    (len + 3) / 4 * 4
}

/// The number of zero bytes needed to pad `len` out to a 32-bit boundary
///
/// ```
/// use woff2::binary::long_padding;
///
/// assert_eq!(long_padding(8), 0);
/// assert_eq!(long_padding(9), 3);
/// ```
pub const fn long_padding(len: usize) -> usize {
    long_align(len) - len
}

// Markers naming the encoding of a value for `ReadFixed` and `WriteBinary`. None of them
// can be constructed.

/// Unsigned byte
#[derive(Copy, Clone)]
pub enum U8 {}

/// Signed byte
#[derive(Copy, Clone)]
pub enum I8 {}

/// Big-endian `u16`
#[derive(Copy, Clone)]
pub enum U16Be {}

/// Big-endian `i16`
#[derive(Copy, Clone)]
pub enum I16Be {}

/// Big-endian `u32`
#[derive(Copy, Clone)]
pub enum U32Be {}
