//! Typed field handles
//!
//! A handle is the offset (and width, where the data model decides it) of a
//! member declared on a `StructLayout`. Handles read and write the member in
//! a `StructValue` bound to that layout.

use super::{StructLayout, StructValue};
use crate::enums::NativeEnum;
use crate::error::{MarshalError, Result};
use crate::memory::{NativeMemory, NativeMemoryExt, Scalar};
use std::any::type_name;
use std::marker::PhantomData;
use std::str;
use std::sync::Arc;

/// Fixed-width scalar member
#[derive(Debug, Clone, Copy)]
pub struct ScalarField<T: Scalar> {
    pub(super) offset: usize,
    pub(super) _marker: PhantomData<T>,
}

impl<T: Scalar> ScalarField<T> {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self, value: &StructValue) -> Result<T> {
        value.get::<T>(self.offset)
    }

    pub fn set(&self, value: &mut StructValue, v: T) -> Result<()> {
        value.put(self.offset, v)
    }
}

/// C `long` member
#[derive(Debug, Clone, Copy)]
pub struct NativeLongField {
    pub(super) offset: usize,
    pub(super) width: usize,
}

impl NativeLongField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self, value: &StructValue) -> Result<i64> {
        value.get_int(self.offset, self.width)
    }

    /// Fails with `IntegerOverflow` when `v` does not fit a 4-byte `long`
    pub fn set(&self, value: &mut StructValue, v: i64) -> Result<()> {
        value.put_int_checked(self.offset, self.width, v)
    }
}

/// Pointer member
#[derive(Debug, Clone, Copy)]
pub struct AddressField {
    pub(super) offset: usize,
    pub(super) width: usize,
}

impl AddressField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self, value: &StructValue) -> Result<usize> {
        Ok(value.get_uint(self.offset, self.width)? as usize)
    }

    pub fn set(&self, value: &mut StructValue, address: usize) -> Result<()> {
        value.put_int(self.offset, self.width, address as i64)
    }
}

/// Integer member whose width comes from a portable alias
#[derive(Debug, Clone, Copy)]
pub struct AliasField {
    pub(super) offset: usize,
    pub(super) width: usize,
    pub(super) signed: bool,
}

impl AliasField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Value sign- or zero-extended according to the resolved type
    pub fn get(&self, value: &StructValue) -> Result<i64> {
        if self.signed {
            value.get_int(self.offset, self.width)
        } else {
            Ok(value.get_uint(self.offset, self.width)? as i64)
        }
    }

    pub fn set(&self, value: &mut StructValue, v: i64) -> Result<()> {
        value.put_int(self.offset, self.width, v)
    }
}

/// Enum member stored as a C `int`
#[derive(Debug, Clone, Copy)]
pub struct EnumField<E: NativeEnum> {
    pub(super) offset: usize,
    pub(super) _marker: PhantomData<E>,
}

impl<E: NativeEnum> EnumField<E> {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self, value: &StructValue) -> Result<E> {
        let raw = value.get::<i32>(self.offset)?;
        value.layout().runtime().enums().value_of::<E>(i64::from(raw))
    }

    pub fn set(&self, value: &mut StructValue, constant: E) -> Result<()> {
        let raw = value.layout().runtime().enums().int_value(constant)?;
        let raw = i32::try_from(raw).map_err(|_| MarshalError::InvalidEnum {
            type_name: type_name::<E>(),
            reason: format!("value {raw} of {constant:?} does not fit a C int"),
        })?;
        value.put(self.offset, raw)
    }
}

/// Text up to the first NUL of a fixed-length region
fn read_terminated(value: &StructValue, offset: usize, len: usize) -> Result<&[u8]> {
    let bytes = value.slice(offset, len)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
    Ok(&bytes[..end])
}

/// Store text NUL-padded, leaving room for the terminator
fn write_terminated(value: &mut StructValue, offset: usize, len: usize, text: &[u8]) -> Result<()> {
    if text.len() >= len {
        return Err(MarshalError::OutOfBounds {
            offset,
            len: text.len() + 1,
            size: len,
        });
    }
    let region = value.slice_mut(offset, len)?;
    region[..text.len()].copy_from_slice(text);
    region[text.len()..].fill(0);
    Ok(())
}

/// Fixed-length UTF-8 text member
#[derive(Debug, Clone, Copy)]
pub struct Utf8StringField {
    pub(super) offset: usize,
    pub(super) len: usize,
}

impl Utf8StringField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the member, failing on malformed UTF-8
    pub fn get(&self, value: &StructValue) -> Result<String> {
        let bytes = read_terminated(value, self.offset, self.len)?;
        Ok(str::from_utf8(bytes)?.to_owned())
    }

    pub fn set(&self, value: &mut StructValue, text: &str) -> Result<()> {
        write_terminated(value, self.offset, self.len, text.as_bytes())
    }
}

/// Fixed-length ASCII text member
#[derive(Debug, Clone, Copy)]
pub struct AsciiStringField {
    pub(super) offset: usize,
    pub(super) len: usize,
}

impl AsciiStringField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the member, failing on any byte above 0x7f
    pub fn get(&self, value: &StructValue) -> Result<String> {
        let bytes = read_terminated(value, self.offset, self.len)?;
        check_ascii(bytes)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    pub fn set(&self, value: &mut StructValue, text: &str) -> Result<()> {
        check_ascii(text.as_bytes())?;
        write_terminated(value, self.offset, self.len, text.as_bytes())
    }
}

fn check_ascii(bytes: &[u8]) -> Result<()> {
    match bytes.iter().position(|b| !b.is_ascii()) {
        Some(position) => Err(MarshalError::NonAscii {
            byte: bytes[position],
            position,
        }),
        None => Ok(()),
    }
}

/// Nested record member
#[derive(Debug, Clone)]
pub struct InnerField {
    pub(super) offset: usize,
    pub(super) layout: Arc<StructLayout>,
}

impl InnerField {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    /// Copy of the nested record
    pub fn get(&self, value: &StructValue) -> Result<StructValue> {
        let mut inner = StructValue::new(Arc::clone(&self.layout))?;
        let size = inner.size();
        inner.write_bytes(0, value.slice(self.offset, size)?)?;
        Ok(inner)
    }

    pub fn set(&self, value: &mut StructValue, inner: &StructValue) -> Result<()> {
        value.write_bytes(self.offset, inner.as_bytes())
    }
}
