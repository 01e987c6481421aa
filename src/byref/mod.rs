//! By-reference values - scalars passed to native code by address
//!
//! Design: A wrapper owns its current value and knows how to copy it into
//! and out of native memory. Allocation and the direction of copying are
//! decided by the call-time marshaller, never by the wrapper.

#[cfg(test)]
mod tests;

use crate::error::{MarshalError, Result};
use crate::memory::{NativeMemory, NativeMemoryExt, Scalar};
use crate::runtime::NativeRuntime;
use std::any::type_name;

/// A value that native code reads or writes through a pointer
pub trait ByReference {
    /// Bytes of native memory the value occupies
    fn native_size(&self, runtime: &NativeRuntime) -> usize;

    /// Copy the current value into `memory` at `offset`
    fn marshal(&self, runtime: &NativeRuntime, memory: &mut dyn NativeMemory, offset: usize) -> Result<()>;

    /// Replace the current value with the contents of `memory` at `offset`
    fn unmarshal(&mut self, runtime: &NativeRuntime, memory: &dyn NativeMemory, offset: usize) -> Result<()>;
}

/// Fixed-width scalar by reference
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalarByReference<T: Scalar> {
    value: T,
}

pub type ByteByReference = ScalarByReference<i8>;
pub type UnsignedByteByReference = ScalarByReference<u8>;
pub type ShortByReference = ScalarByReference<i16>;
pub type UnsignedShortByReference = ScalarByReference<u16>;
pub type IntByReference = ScalarByReference<i32>;
pub type UnsignedIntByReference = ScalarByReference<u32>;
pub type LongLongByReference = ScalarByReference<i64>;
pub type UnsignedLongLongByReference = ScalarByReference<u64>;
pub type FloatByReference = ScalarByReference<f32>;
pub type DoubleByReference = ScalarByReference<f64>;

impl<T: Scalar> ScalarByReference<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self { value }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Assign from a possibly absent value, rejecting `None`
    pub fn assign(&mut self, value: Option<T>) -> Result<()> {
        self.value = value.ok_or(MarshalError::NullValue(type_name::<Self>()))?;
        Ok(())
    }
}

impl<T: Scalar> From<T> for ScalarByReference<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Scalar> TryFrom<Option<T>> for ScalarByReference<T> {
    type Error = MarshalError;

    fn try_from(value: Option<T>) -> Result<Self> {
        value
            .map(Self::new)
            .ok_or(MarshalError::NullValue(type_name::<Self>()))
    }
}

impl<T: Scalar> ByReference for ScalarByReference<T> {
    #[inline]
    fn native_size(&self, _runtime: &NativeRuntime) -> usize {
        T::SIZE
    }

    fn marshal(&self, _runtime: &NativeRuntime, memory: &mut dyn NativeMemory, offset: usize) -> Result<()> {
        memory.put(offset, self.value)
    }

    fn unmarshal(&mut self, _runtime: &NativeRuntime, memory: &dyn NativeMemory, offset: usize) -> Result<()> {
        self.value = memory.get(offset)?;
        Ok(())
    }
}

/// C `long` by reference, 4 or 8 bytes by data model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeLongByReference {
    value: i64,
}

impl NativeLongByReference {
    #[inline]
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: i64) {
        self.value = value;
    }

    pub fn assign(&mut self, value: Option<i64>) -> Result<()> {
        self.value = value.ok_or(MarshalError::NullValue(type_name::<Self>()))?;
        Ok(())
    }
}

impl TryFrom<Option<i64>> for NativeLongByReference {
    type Error = MarshalError;

    fn try_from(value: Option<i64>) -> Result<Self> {
        value
            .map(Self::new)
            .ok_or(MarshalError::NullValue(type_name::<Self>()))
    }
}

impl ByReference for NativeLongByReference {
    #[inline]
    fn native_size(&self, runtime: &NativeRuntime) -> usize {
        runtime.long_size()
    }

    fn marshal(&self, runtime: &NativeRuntime, memory: &mut dyn NativeMemory, offset: usize) -> Result<()> {
        memory.put_int_checked(offset, runtime.long_size(), self.value)
    }

    fn unmarshal(&mut self, runtime: &NativeRuntime, memory: &dyn NativeMemory, offset: usize) -> Result<()> {
        self.value = memory.get_int(offset, runtime.long_size())?;
        Ok(())
    }
}

/// Pointer-sized address by reference
///
/// A zero address is a valid value; it is the pointer itself that native
/// code may fill in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressByReference {
    value: usize,
}

impl AddressByReference {
    #[inline]
    pub fn new(address: usize) -> Self {
        Self { value: address }
    }

    #[inline]
    pub fn get(&self) -> usize {
        self.value
    }

    #[inline]
    pub fn set(&mut self, address: usize) {
        self.value = address;
    }

    /// Non-null address, if any
    #[inline]
    pub fn pointer(&self) -> Option<usize> {
        (self.value != 0).then_some(self.value)
    }

    pub fn assign(&mut self, address: Option<usize>) -> Result<()> {
        self.value = address.ok_or(MarshalError::NullValue(type_name::<Self>()))?;
        Ok(())
    }
}

impl TryFrom<Option<usize>> for AddressByReference {
    type Error = MarshalError;

    fn try_from(address: Option<usize>) -> Result<Self> {
        address
            .map(Self::new)
            .ok_or(MarshalError::NullValue(type_name::<Self>()))
    }
}

impl ByReference for AddressByReference {
    #[inline]
    fn native_size(&self, runtime: &NativeRuntime) -> usize {
        runtime.address_size()
    }

    fn marshal(&self, runtime: &NativeRuntime, memory: &mut dyn NativeMemory, offset: usize) -> Result<()> {
        memory.put_int(offset, runtime.address_size(), self.value as i64)
    }

    fn unmarshal(&mut self, runtime: &NativeRuntime, memory: &dyn NativeMemory, offset: usize) -> Result<()> {
        self.value = memory.get_uint(offset, runtime.address_size())? as usize;
        Ok(())
    }
}
