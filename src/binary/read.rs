#![allow(missing_docs)]

//! Parse binary data
//!
//! Data is read through a `ReadScope`, a window onto the input, and a `ReadCtxt` cursor within
//! it. Fixed size values and records implement `ReadFixed`, everything else implements
//! `ReadBinary` or `ReadBinaryDep` when it needs outside information to parse.

use crate::binary::{I16Be, U16Be, U32Be, I8, U8};
use crate::error::ParseError;
use crate::size;
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::slice::ChunksExact;

#[derive(Debug, Copy, Clone)]
pub struct ReadEof {}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReadScope<'a> {
    data: &'a [u8],
}

#[derive(Clone)]
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

pub trait ReadBinary {
    type HostType<'a>: Sized;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadBinaryDep {
    type Args<'a>: Copy;
    type HostType<'a>: Sized;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        args: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError>;
}

/// A value that always occupies `SIZE` bytes.
pub trait ReadFixed {
    type HostType: Sized;

    const SIZE: usize;

    /// Decode a value from exactly `SIZE` bytes.
    fn from_bytes(bytes: &[u8]) -> Self::HostType;
}

/// A record built from a fixed size tuple of primitive values.
pub trait ReadFrom {
    type ReadType: ReadFixed;
    fn read_from(value: <Self::ReadType as ReadFixed>::HostType) -> Self;
}

impl<T> ReadFixed for T
where
    T: ReadFrom,
{
    type HostType = T;

    const SIZE: usize = T::ReadType::SIZE;

    fn from_bytes(bytes: &[u8]) -> T {
        T::read_from(T::ReadType::from_bytes(bytes))
    }
}

impl<T> ReadBinary for T
where
    T: ReadFixed,
{
    type HostType<'a> = T::HostType;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let bytes = ctxt.read_slice(T::SIZE)?;
        Ok(T::from_bytes(bytes))
    }
}

impl<T> ReadBinaryDep for T
where
    T: ReadBinary,
{
    type Args<'a> = ();
    type HostType<'a> = T::HostType<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (): Self::Args<'_>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        T::read(ctxt)
    }
}

/// A run of `len` fixed size values that are decoded on access.
pub struct ReadArray<'a, T: ReadFixed> {
    data: &'a [u8],
    length: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayIter<'a, T: ReadFixed> {
    chunks: ChunksExact<'a, u8>,
    phantom: PhantomData<T>,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        ReadScope { data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The scope starting at `offset`, empty if `offset` is past the end.
    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        ReadScope::new(self.data.get(offset..).unwrap_or(&[]))
    }

    /// The `length` bytes starting at `offset`.
    ///
    /// An empty range is always valid, even when `offset` lies outside the scope.
    pub fn offset_length(&self, offset: usize, length: usize) -> Result<ReadScope<'a>, ParseError> {
        if length == 0 {
            return Ok(ReadScope::new(&[]));
        }
        if offset >= self.data.len() {
            return Err(ParseError::BadOffset);
        }
        offset
            .checked_add(length)
            .and_then(|end| self.data.get(offset..end))
            .map(ReadScope::new)
            .ok_or(ParseError::BadEof)
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt {
            scope: *self,
            offset: 0,
        }
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&self) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read::<T>()
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read_dep::<T>(args)
    }
}

impl<'a> ReadCtxt<'a> {
    pub fn check(&self, cond: bool) -> Result<(), ParseError> {
        if cond {
            Ok(())
        } else {
            Err(ParseError::BadValue)
        }
    }

    /// Check a condition, returning `ParseError::BadVersion` if `false`.
    ///
    /// ```
    /// use woff2::binary::read::ReadScope;
    /// use woff2::error::ParseError;
    ///
    /// let mut ctxt = ReadScope::new(&[0, 2]).ctxt();
    /// let major_version = ctxt.read_u16be().expect("unable to read version");
    ///
    /// assert!(ctxt.check_version(major_version == 2).is_ok());
    /// assert_eq!(ctxt.check_version(major_version == 1), Err(ParseError::BadVersion));
    /// ```
    pub fn check_version(&self, cond: bool) -> Result<(), ParseError> {
        if cond {
            Ok(())
        } else {
            Err(ParseError::BadVersion)
        }
    }

    /// The unread remainder of the data.
    pub fn scope(&self) -> ReadScope<'a> {
        self.scope.offset(self.offset)
    }

    /// The number of bytes read so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&mut self) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, ())
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &mut self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, args)
    }

    pub fn bytes_available(&self) -> bool {
        self.offset < self.scope.data.len()
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ReadEof> {
        let slice = self.read_slice(N)?;
        <[u8; N]>::try_from(slice).map_err(|_| ReadEof {})
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadEof> {
        self.read_bytes::<1>().map(|[byte]| byte)
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadEof> {
        self.read_bytes().map(i8::from_be_bytes)
    }

    pub fn read_u16be(&mut self) -> Result<u16, ReadEof> {
        self.read_bytes().map(u16::from_be_bytes)
    }

    pub fn read_i16be(&mut self) -> Result<i16, ReadEof> {
        self.read_bytes().map(i16::from_be_bytes)
    }

    pub fn read_u32be(&mut self) -> Result<u32, ReadEof> {
        self.read_bytes().map(u32::from_be_bytes)
    }

    pub fn read_array<T: ReadFixed>(
        &mut self,
        length: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        let byte_length = length
            .checked_mul(T::SIZE)
            .ok_or(ParseError::LimitExceeded)?;
        let data = self.read_slice(byte_length)?;
        Ok(ReadArray {
            data,
            length,
            phantom: PhantomData,
        })
    }

    pub fn read_scope(&mut self, length: usize) -> Result<ReadScope<'a>, ReadEof> {
        let scope = self
            .scope
            .offset_length(self.offset, length)
            .map_err(|_| ReadEof {})?;
        self.offset += length;
        Ok(scope)
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ReadEof> {
        self.read_scope(length).map(|scope| scope.data)
    }
}

impl<'a, T: ReadFixed> ReadArray<'a, T> {
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get_item(&self, index: usize) -> Option<T::HostType> {
        if index >= self.length {
            return None;
        }
        let start = index * T::SIZE;
        self.data.get(start..start + T::SIZE).map(T::from_bytes)
    }

    pub fn last(&self) -> Option<T::HostType> {
        self.get_item(self.length.checked_sub(1)?)
    }

    pub fn to_vec(&self) -> Vec<T::HostType> {
        self.iter().collect()
    }

    pub fn iter(&self) -> ReadArrayIter<'a, T> {
        ReadArrayIter {
            chunks: self.data.chunks_exact(T::SIZE.max(1)),
            phantom: PhantomData,
        }
    }
}

impl<T: ReadFixed> Clone for ReadArray<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ReadFixed> Copy for ReadArray<'_, T> {}

impl<'a, 'b, T: ReadFixed> IntoIterator for &'b ReadArray<'a, T> {
    type Item = T::HostType;
    type IntoIter = ReadArrayIter<'a, T>;

    fn into_iter(self) -> ReadArrayIter<'a, T> {
        self.iter()
    }
}

impl<T: ReadFixed> Iterator for ReadArrayIter<'_, T> {
    type Item = T::HostType;

    fn next(&mut self) -> Option<T::HostType> {
        self.chunks.next().map(T::from_bytes)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: ReadFixed> ExactSizeIterator for ReadArrayIter<'_, T> {}

impl<T> fmt::Debug for ReadArray<'_, T>
where
    T: ReadFixed,
    T::HostType: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl ReadFixed for U8 {
    type HostType = u8;

    const SIZE: usize = size::U8;

    fn from_bytes(bytes: &[u8]) -> u8 {
        bytes[0]
    }
}

impl ReadFixed for I8 {
    type HostType = i8;

    const SIZE: usize = size::I8;

    fn from_bytes(bytes: &[u8]) -> i8 {
        i8::from_be_bytes([bytes[0]])
    }
}

impl ReadFixed for U16Be {
    type HostType = u16;

    const SIZE: usize = size::U16;

    fn from_bytes(bytes: &[u8]) -> u16 {
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

impl ReadFixed for I16Be {
    type HostType = i16;

    const SIZE: usize = size::I16;

    fn from_bytes(bytes: &[u8]) -> i16 {
        i16::from_be_bytes([bytes[0], bytes[1]])
    }
}

impl ReadFixed for U32Be {
    type HostType = u32;

    const SIZE: usize = size::U32;

    fn from_bytes(bytes: &[u8]) -> u32 {
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl<T1, T2> ReadFixed for (T1, T2)
where
    T1: ReadFixed,
    T2: ReadFixed,
{
    type HostType = (T1::HostType, T2::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE;

    fn from_bytes(bytes: &[u8]) -> Self::HostType {
        let (first, second) = bytes.split_at(T1::SIZE);
        (T1::from_bytes(first), T2::from_bytes(second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32be() {
        let scope = ReadScope::new(&[1, 2, 3, 4]);
        assert_eq!(scope.read::<U32Be>().unwrap(), 0x01020304);
    }

    #[test]
    fn test_offset_length_empty_range() {
        let scope = ReadScope::new(&[1, 2, 3]);
        assert!(scope.offset_length(99, 0).is_ok());
        assert_eq!(scope.offset_length(3, 1), Err(ParseError::BadOffset));
        assert_eq!(scope.offset_length(2, 2), Err(ParseError::BadEof));
        assert_eq!(scope.offset_length(1, usize::MAX), Err(ParseError::BadEof));
    }

    #[test]
    fn test_position_and_scope() {
        let scope = ReadScope::new(&[0, 1, 2, 3, 4]);
        let mut ctxt = scope.ctxt();
        ctxt.read_u16be().unwrap();
        assert_eq!(ctxt.position(), 2);
        assert_eq!(ctxt.scope().data(), &[2, 3, 4]);
        assert!(ctxt.read_u32be().is_err());
        assert_eq!(ctxt.position(), 2);
    }

    #[test]
    fn test_read_array() {
        let scope = ReadScope::new(&[0, 1, 0xFF, 0xFE, 0, 3]);
        let array = scope.ctxt().read_array::<(U16Be, I16Be)>(1).unwrap();
        assert_eq!(array.get_item(0), Some((1, -2)));
        assert_eq!(array.get_item(1), None);

        let array = scope.ctxt().read_array::<U16Be>(3).unwrap();
        assert_eq!(array.to_vec(), vec![1, 0xFFFE, 3]);
        assert_eq!(array.last(), Some(3));
        assert_eq!(array.iter().len(), 3);
    }

    #[test]
    fn test_read_array_overflow() {
        let scope = ReadScope::new(&[0, 1]);
        assert_eq!(
            scope.ctxt().read_array::<U32Be>(usize::MAX).err(),
            Some(ParseError::LimitExceeded)
        );
    }
}
