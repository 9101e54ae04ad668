#![deny(missing_docs)]

//! Write binary data

use std::marker::PhantomData;

use crate::binary::read::{ReadFixed, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be, I8, U8};
use crate::error::WriteError;

/// A growable in-memory buffer that implements `WriteContext`.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

/// A fixed window of a `WriteBuffer` that a placeholder is written through.
struct WriteSlice<'a> {
    offset: usize,
    data: &'a mut [u8],
}

/// Space for a `T` reserved by `WriteBuffer::placeholder`, filled in with
/// `WriteBuffer::write_placeholder` once the value is known.
pub struct Placeholder<T, HostType>
where
    T: WriteBinary<HostType>,
{
    offset: usize,
    length: usize,
    marker: PhantomData<fn(HostType) -> T>,
}

/// Trait that describes a type that can be written to a `WriteContext` in binary form.
pub trait WriteBinary<HostType = Self> {
    /// The type of the value returned by `write`.
    type Output;

    /// Write the binary representation of `val` to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<Self::Output, WriteError>;
}

/// Trait that describes a type whose binary form depends on extra arguments.
pub trait WriteBinaryDep<HostType = Self> {
    /// The type of the arguments supplied to `write_dep`.
    type Args;
    /// The type of the value returned by `write_dep`.
    type Output;

    /// Write the binary representation of `val` to `ctxt`.
    fn write_dep<C: WriteContext>(
        ctxt: &mut C,
        val: HostType,
        args: Self::Args,
    ) -> Result<Self::Output, WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write a slice of bytes.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write `count` zero bytes.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;

    /// Write each value of a `Vec` as a `T`.
    fn write_vec<T, HostType>(&mut self, vec: Vec<HostType>) -> Result<(), WriteError>
    where
        Self: Sized,
        T: WriteBinary<HostType>,
    {
        self.write_iter::<T, _>(vec.into_iter())
    }

    /// Write each value produced by `iter` as a `T`.
    fn write_iter<T, HostType>(
        &mut self,
        iter: impl Iterator<Item = HostType>,
    ) -> Result<(), WriteError>
    where
        Self: Sized,
        T: WriteBinary<HostType>,
    {
        for val in iter {
            T::write(self, val)?;
        }

        Ok(())
    }
}

impl<T, HostType> WriteBinaryDep<HostType> for T
where
    T: WriteBinary<HostType>,
{
    type Args = ();
    type Output = T::Output;

    fn write_dep<C: WriteContext>(
        ctxt: &mut C,
        val: HostType,
        (): Self::Args,
    ) -> Result<Self::Output, WriteError> {
        T::write(ctxt, val)
    }
}

macro_rules! write_be_bytes {
    ($binary:ty, $host:ty) => {
        impl<T> WriteBinary<T> for $binary
        where
            T: Into<$host>,
        {
            type Output = ();

            fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
                let val: $host = t.into();
                ctxt.write_bytes(&val.to_be_bytes())
            }
        }
    };
}

write_be_bytes!(U8, u8);
write_be_bytes!(I8, i8);
write_be_bytes!(U16Be, u16);
write_be_bytes!(I16Be, i16);
write_be_bytes!(U32Be, u32);

impl<'a> WriteBinary for ReadScope<'a> {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, scope: Self) -> Result<(), WriteError> {
        ctxt.write_bytes(scope.data())
    }
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }
}

impl WriteContext for WriteSlice<'_> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        let end = self.offset + data.len();
        let dest = self
            .data
            .get_mut(self.offset..end)
            .ok_or(WriteError::PlaceholderMismatch)?;
        dest.copy_from_slice(data);
        self.offset = end;
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.write_bytes(&vec![0; count])
    }

    fn bytes_written(&self) -> usize {
        self.offset
    }
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    /// The data written so far
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The number of bytes written so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Consume `self` and return the written data
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Reserve zeroed space for a `T` to be written later.
    pub fn placeholder<T, HostType>(&mut self) -> Result<Placeholder<T, HostType>, WriteError>
    where
        T: WriteBinary<HostType> + ReadFixed,
    {
        let offset = self.bytes_written();
        self.write_zeros(T::SIZE)?;

        Ok(Placeholder {
            offset,
            length: T::SIZE,
            marker: PhantomData,
        })
    }

    /// Reserve space for `count` consecutive values of type `T`.
    pub fn placeholder_array<T, HostType>(
        &mut self,
        count: usize,
    ) -> Result<Vec<Placeholder<T, HostType>>, WriteError>
    where
        T: WriteBinary<HostType> + ReadFixed,
    {
        (0..count).map(|_| self.placeholder::<T, HostType>()).collect()
    }

    /// Write `val` into the space held by `placeholder`, which must be filled exactly.
    pub fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        let end = placeholder.offset + placeholder.length;
        let data = self
            .data
            .get_mut(placeholder.offset..end)
            .ok_or(WriteError::BadValue)?;
        let mut slice = WriteSlice { offset: 0, data };
        let output = T::write(&mut slice, val)?;
        if slice.offset != placeholder.length {
            return Err(WriteError::PlaceholderMismatch);
        }

        Ok(output)
    }
}
