//! Native memory - addressable byte regions and scratch buffer pools
//!
//! Design: `NativeMemory` is the one contract the rest of the crate needs
//! from native memory: a region with a stable address whose bytes can be
//! read and written at offsets. All accesses are bounds-checked and use the
//! host's native byte order.

mod buffer;
mod pool;


pub use buffer::NativeBuffer;
pub use pool::{
    size_index, BufferPool, DirectAllocator, MultiBufferPool, PoolStats, SimpleBufferPool,
    SynchronizedPool,
};

use crate::error::{MarshalError, Result};
use crate::types::NativeType;

/// Addressable native memory region
pub trait NativeMemory {
    /// Visible bytes of the region
    fn as_bytes(&self) -> &[u8];

    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Address of the first byte
    fn address(&self) -> usize;

    #[inline]
    fn size(&self) -> usize {
        self.as_bytes().len()
    }

    /// Borrow `len` bytes at `offset`
    fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let size = self.size();
        check_bounds(offset, len, size)?;
        Ok(&self.as_bytes()[offset..offset + len])
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let size = self.size();
        check_bounds(offset, len, size)?;
        Ok(&mut self.as_bytes_mut()[offset..offset + len])
    }

    /// Copy `src` into the region at `offset`
    fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        self.slice_mut(offset, src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// Zero `len` bytes at `offset`
    fn fill_zero(&mut self, offset: usize, len: usize) -> Result<()> {
        self.slice_mut(offset, len)?.fill(0);
        Ok(())
    }
}

#[inline]
fn check_bounds(offset: usize, len: usize, size: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(MarshalError::OutOfBounds { offset, len, size }),
    }
}

/// Fixed-width scalar stored in native memory
pub trait Scalar: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const SIZE: usize;
    /// Native class this scalar maps to
    const NATIVE: NativeType;

    fn read_ne(bytes: &[u8]) -> Self;
    fn write_ne(self, bytes: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($t:ty => $native:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const SIZE: usize = core::mem::size_of::<$t>();
                const NATIVE: NativeType = NativeType::$native;

                #[inline]
                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_ne_bytes(raw)
                }

                #[inline]
                fn write_ne(self, bytes: &mut [u8]) {
                    bytes[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => SChar,
    u8 => UChar,
    i16 => SShort,
    u16 => UShort,
    i32 => SInt,
    u32 => UInt,
    i64 => SLongLong,
    u64 => ULongLong,
    f32 => Float,
    f64 => Double,
}

/// Typed accessors available on every `NativeMemory`, trait objects included
pub trait NativeMemoryExt: NativeMemory {
    #[inline]
    fn get<T: Scalar>(&self, offset: usize) -> Result<T> {
        Ok(T::read_ne(self.slice(offset, T::SIZE)?))
    }

    #[inline]
    fn put<T: Scalar>(&mut self, offset: usize, value: T) -> Result<()> {
        value.write_ne(self.slice_mut(offset, T::SIZE)?);
        Ok(())
    }

    /// Read a signed integer of `width` bytes, sign-extended
    fn get_int(&self, offset: usize, width: usize) -> Result<i64> {
        match width {
            1 => self.get::<i8>(offset).map(i64::from),
            2 => self.get::<i16>(offset).map(i64::from),
            4 => self.get::<i32>(offset).map(i64::from),
            8 => self.get::<i64>(offset),
            _ => Err(MarshalError::InvalidField(format!("unsupported integer width {width}"))),
        }
    }

    /// Read an unsigned integer of `width` bytes, zero-extended
    fn get_uint(&self, offset: usize, width: usize) -> Result<u64> {
        match width {
            1 => self.get::<u8>(offset).map(u64::from),
            2 => self.get::<u16>(offset).map(u64::from),
            4 => self.get::<u32>(offset).map(u64::from),
            8 => self.get::<u64>(offset),
            _ => Err(MarshalError::InvalidField(format!("unsupported integer width {width}"))),
        }
    }

    /// Store `value` as a signed integer of `width` bytes
    ///
    /// Unlike `put_int`, values outside the signed range of `width` fail
    /// with `IntegerOverflow`.
    fn put_int_checked(&mut self, offset: usize, width: usize, value: i64) -> Result<()> {
        if width < 8 {
            let bits = width * 8;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if !(min..=max).contains(&value) {
                return Err(MarshalError::IntegerOverflow { value, width });
            }
        }
        self.put_int(offset, width, value)
    }

    /// Store the low `width` bytes of `value`
    fn put_int(&mut self, offset: usize, width: usize, value: i64) -> Result<()> {
        match width {
            1 => self.put(offset, value as i8),
            2 => self.put(offset, value as i16),
            4 => self.put(offset, value as i32),
            8 => self.put(offset, value),
            _ => Err(MarshalError::InvalidField(format!("unsupported integer width {width}"))),
        }
    }
}

impl<M: NativeMemory + ?Sized> NativeMemoryExt for M {}

/// Heap-backed memory, handy for building records before a call
impl NativeMemory for Vec<u8> {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }

    #[inline]
    fn address(&self) -> usize {
        self.as_ptr() as usize
    }
}
