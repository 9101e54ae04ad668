//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    LimitExceeded,
    MissingTable(u32),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::LimitExceeded => write!(f, "limit exceeded"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    PlaceholderMismatch,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::PlaceholderMismatch => {
                write!(f, "data written to placeholder did not match expected size")
            }
        }
    }
}

impl std::error::Error for WriteError {}

/// Errors returned by the WOFF2 encoder and decoder.
///
/// Where it is known, the error carries the tag of the table or the byte offset involved.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Woff2Error {
    /// The input SFNT font is structurally invalid.
    MalformedFont {
        tag: Option<u32>,
        offset: Option<usize>,
        reason: &'static str,
    },
    /// A reconstructed table did not have the length declared in the table directory.
    TransformMismatch {
        tag: u32,
        expected: usize,
        actual: usize,
    },
    /// The compressed stream was truncated, corrupt, or decompressed to the wrong size.
    Decompression(&'static str),
    /// The compressor failed at every effort level.
    Compression(String),
    /// The WOFF2 header is invalid.
    InvalidHeader(&'static str),
    /// The data ends before a structure it declares.
    TruncatedFile { offset: usize, needed: usize },
    /// The reconstructed font checksum does not match the one carried by the `head` table.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// Valid input that uses a feature this codec does not handle.
    UnsupportedFeature {
        tag: Option<u32>,
        reason: &'static str,
    },
    /// The WOFF2 table directory, collection directory, or transformed table data is corrupt.
    CorruptContainer {
        tag: Option<u32>,
        reason: &'static str,
    },
    /// Low level parse failure.
    Parse(ParseError),
    /// Low level write failure.
    Write(WriteError),
}

impl Woff2Error {
    pub(crate) fn malformed(tag: Option<u32>, reason: &'static str) -> Self {
        Woff2Error::MalformedFont {
            tag,
            offset: None,
            reason,
        }
    }

    pub(crate) fn corrupt(tag: Option<u32>, reason: &'static str) -> Self {
        Woff2Error::CorruptContainer { tag, reason }
    }

    pub(crate) fn unsupported(tag: Option<u32>, reason: &'static str) -> Self {
        Woff2Error::UnsupportedFeature { tag, reason }
    }
}

impl From<ParseError> for Woff2Error {
    fn from(error: ParseError) -> Self {
        Woff2Error::Parse(error)
    }
}

impl From<WriteError> for Woff2Error {
    fn from(error: WriteError) -> Self {
        Woff2Error::Write(error)
    }
}

impl From<std::num::TryFromIntError> for Woff2Error {
    fn from(_error: std::num::TryFromIntError) -> Self {
        Woff2Error::Parse(ParseError::LimitExceeded)
    }
}

struct TableContext(Option<u32>);

impl fmt::Display for TableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(tag) => write!(f, " in '{}' table", DisplayTag(tag)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Woff2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Woff2Error::MalformedFont {
                tag,
                offset,
                reason,
            } => {
                write!(f, "malformed font{}: {}", TableContext(*tag), reason)?;
                if let Some(offset) = offset {
                    write!(f, " (offset {})", offset)?;
                }
                Ok(())
            }
            Woff2Error::TransformMismatch {
                tag,
                expected,
                actual,
            } => write!(
                f,
                "reconstructed '{}' table is {} bytes, expected {}",
                DisplayTag(*tag),
                actual,
                expected
            ),
            Woff2Error::Decompression(reason) => write!(f, "decompression failed: {}", reason),
            Woff2Error::Compression(reason) => write!(f, "compression failed: {}", reason),
            Woff2Error::InvalidHeader(reason) => write!(f, "invalid WOFF2 header: {}", reason),
            Woff2Error::TruncatedFile { offset, needed } => write!(
                f,
                "file truncated: {} bytes needed at offset {}",
                needed, offset
            ),
            Woff2Error::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum adjustment mismatch: expected 0x{:08x}, found 0x{:08x}",
                expected, actual
            ),
            Woff2Error::UnsupportedFeature { tag, reason } => {
                write!(f, "unsupported feature{}: {}", TableContext(*tag), reason)
            }
            Woff2Error::CorruptContainer { tag, reason } => {
                write!(f, "corrupt WOFF2 data{}: {}", TableContext(*tag), reason)
            }
            Woff2Error::Parse(err) => write!(f, "parse error: {}", err),
            Woff2Error::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for Woff2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Woff2Error::Parse(err) => Some(err),
            Woff2Error::Write(err) => Some(err),
            _ => None,
        }
    }
}
