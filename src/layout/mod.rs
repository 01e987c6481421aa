//! Struct layout - field offsets, alignment and size of native records
//!
//! Design: Fields are declared once, in order, while a layout is built.
//! Sequential fields land on the next multiple of their alignment after the
//! cursor; explicit offsets are placed as given and leave the cursor alone.
//! `finalize` pads the furthest field end to the widest alignment and seals
//! the layout; from then on it can only be read or bound to memory.

mod fields;
mod value;

#[cfg(test)]
mod tests;

pub use fields::{
    AddressField, AliasField, AsciiStringField, EnumField, InnerField, NativeLongField,
    ScalarField, Utf8StringField,
};
pub use value::StructValue;

use crate::alias::TypeAlias;
use crate::enums::NativeEnum;
use crate::error::{MarshalError, Result};
use crate::logging::log_layout_finalized;
use crate::memory::Scalar;
use crate::runtime::NativeRuntime;
use crate::types::{NativeType, TypeInfo};
use std::marker::PhantomData;
use std::sync::Arc;

/// Explicit byte offset of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Offset(pub usize);

/// Placement of one declared field, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub offset: usize,
    pub size: usize,
    pub align: usize,
    pub explicit: bool,
}

impl FieldDescriptor {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Smallest multiple of `align` at or above `value`
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// `align_up` that reports overflow as a malformed field
fn checked_align_up(value: usize, align: usize) -> Result<usize> {
    value
        .checked_add(align - 1)
        .map(|v| v & !(align - 1))
        .ok_or_else(|| MarshalError::InvalidField(format!("offset {value} overflows when aligned to {align}")))
}

fn field_end(offset: usize, size: usize) -> Result<usize> {
    offset
        .checked_add(size)
        .ok_or_else(|| MarshalError::InvalidField(format!("field of {size} bytes at offset {offset} overflows")))
}

/// Layout of a native record
#[derive(Debug, Clone)]
pub struct StructLayout {
    runtime: NativeRuntime,
    fields: Vec<FieldDescriptor>,
    cursor: usize,
    max_end: usize,
    max_align: usize,
    pack: Option<usize>,
    union: bool,
    size: Option<usize>,
}

impl StructLayout {
    /// Empty sequential layout
    pub fn new(runtime: &NativeRuntime) -> Self {
        Self {
            runtime: runtime.clone(),
            fields: Vec::new(),
            cursor: 0,
            max_end: 0,
            max_align: 1,
            pack: None,
            union: false,
            size: None,
        }
    }

    /// Empty layout where every member starts at offset 0
    pub fn union(runtime: &NativeRuntime) -> Self {
        Self {
            union: true,
            ..Self::new(runtime)
        }
    }

    /// Cap member alignment at `pack` bytes, like `#pragma pack(n)`
    pub fn packed(mut self, pack: usize) -> Result<Self> {
        if !pack.is_power_of_two() {
            return Err(MarshalError::InvalidField(format!(
                "packing {pack} is not a power of two"
            )));
        }
        self.pack = Some(pack);
        Ok(self)
    }

    #[inline]
    pub fn runtime(&self) -> &NativeRuntime {
        &self.runtime
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[inline]
    pub fn is_union(&self) -> bool {
        self.union
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.size.is_some()
    }

    /// Widest member alignment so far
    #[inline]
    pub fn alignment(&self) -> usize {
        self.max_align
    }

    /// Finalized size
    pub fn size(&self) -> Result<usize> {
        self.size.ok_or(MarshalError::LayoutNotSealed)
    }

    /// Declare a field of `size_bits` aligned on `align_bits`
    ///
    /// Returns the field's byte offset.
    pub fn add_field(
        &mut self,
        size_bits: usize,
        align_bits: usize,
        offset: Option<Offset>,
    ) -> Result<usize> {
        let (size, align) = self.check_field(size_bits, align_bits)?;
        let offset = match offset {
            Some(Offset(offset)) => {
                self.record(offset, size, align, true)?;
                return Ok(offset);
            }
            None if self.union => 0,
            None => checked_align_up(self.cursor, align)?,
        };
        self.cursor = self.record(offset, size, align, false)?;
        Ok(offset)
    }

    /// Declare `count` consecutive elements
    ///
    /// Elements are contiguous even in a union. Returns the first element's
    /// offset.
    pub fn add_array(&mut self, count: usize, elem_size_bits: usize, align_bits: usize) -> Result<usize> {
        let (elem_size, align) = self.check_field(elem_size_bits, align_bits)?;
        let base = if self.union { 0 } else { checked_align_up(self.cursor, align)? };
        let size = elem_size
            .checked_mul(count)
            .ok_or_else(|| MarshalError::InvalidField(format!("array of {count} elements overflows")))?;
        self.cursor = self.record(base, size, align, false)?;
        Ok(base)
    }

    /// Declare a field of a native type
    pub fn add_type(&mut self, ty: NativeType) -> Result<usize> {
        let info = self.type_info(ty)?;
        self.add_field(info.size * 8, info.align * 8, None)
    }

    /// Declare a field of a portable alias type
    pub fn add_alias(&mut self, alias: TypeAlias) -> Result<usize> {
        let ty = self.runtime.resolve_alias(alias)?;
        self.add_type(ty)
    }

    /// Declare `count` elements of unused space of a native type
    pub fn add_padding(&mut self, ty: NativeType, count: usize) -> Result<usize> {
        let info = self.type_info(ty)?;
        self.add_array(count, info.size * 8, info.align * 8)
    }

    /// Embed a finalized layout as a member
    pub fn add_inner(&mut self, inner: &StructLayout) -> Result<usize> {
        let size = inner.size()?;
        self.add_field(size * 8, inner.alignment() * 8, None)
    }

    /// Pad to the widest alignment and seal the layout
    ///
    /// Finalizing twice returns the same size.
    pub fn finalize(&mut self) -> Result<usize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = checked_align_up(self.max_end, self.max_align)?;
        self.size = Some(size);
        log_layout_finalized(self.fields.len(), size, self.max_align);
        Ok(size)
    }

    /// Finalize and share
    pub fn into_shared(mut self) -> Result<Arc<StructLayout>> {
        self.finalize()?;
        Ok(Arc::new(self))
    }

    // ------------------------------------------------------------------
    // Typed members
    // ------------------------------------------------------------------

    pub fn scalar<T: Scalar>(&mut self) -> Result<ScalarField<T>> {
        let offset = self.add_type(T::NATIVE)?;
        Ok(ScalarField {
            offset,
            _marker: PhantomData,
        })
    }

    /// C `long`, sized by the data model
    pub fn native_long(&mut self) -> Result<NativeLongField> {
        let width = self.runtime.long_size();
        let offset = self.add_type(NativeType::SLong)?;
        Ok(NativeLongField { offset, width })
    }

    /// `void *`, sized by the data model
    pub fn address(&mut self) -> Result<AddressField> {
        let width = self.runtime.address_size();
        let offset = self.add_type(NativeType::Address)?;
        Ok(AddressField { offset, width })
    }

    /// Integer member declared through a portable alias
    pub fn alias(&mut self, alias: TypeAlias) -> Result<AliasField> {
        let ty = self.runtime.resolve_alias(alias)?;
        if !(ty.is_integral() || ty == NativeType::Address) {
            return Err(MarshalError::InvalidField(format!(
                "alias {alias} resolves to non-integer type {ty}"
            )));
        }
        let width = self.type_info(ty)?.size;
        let offset = self.add_type(ty)?;
        Ok(AliasField {
            offset,
            width,
            signed: ty.is_signed(),
        })
    }

    /// Enum member stored as a C `int`
    pub fn enumeration<E: NativeEnum>(&mut self) -> Result<EnumField<E>> {
        // Mapping problems surface while the layout is built
        self.runtime.enum_entry::<E>()?;
        let offset = self.add_type(NativeType::SInt)?;
        Ok(EnumField {
            offset,
            _marker: PhantomData,
        })
    }

    /// Fixed-length, NUL-padded UTF-8 text
    pub fn utf8_string(&mut self, len: usize) -> Result<Utf8StringField> {
        let offset = self.add_array(len, 8, 8)?;
        Ok(Utf8StringField { offset, len })
    }

    /// Fixed-length, NUL-padded ASCII text
    pub fn ascii_string(&mut self, len: usize) -> Result<AsciiStringField> {
        let offset = self.add_array(len, 8, 8)?;
        Ok(AsciiStringField { offset, len })
    }

    /// Nested record
    pub fn inner(&mut self, layout: Arc<StructLayout>) -> Result<InnerField> {
        let offset = self.add_inner(&layout)?;
        Ok(InnerField { offset, layout })
    }

    fn type_info(&self, ty: NativeType) -> Result<TypeInfo> {
        match ty {
            NativeType::Void => Err(MarshalError::InvalidField("void member".to_string())),
            ty => Ok(self.runtime.type_info(ty)),
        }
    }

    fn check_field(&self, size_bits: usize, align_bits: usize) -> Result<(usize, usize)> {
        if self.size.is_some() {
            return Err(MarshalError::LayoutSealed);
        }
        if size_bits % 8 != 0 {
            return Err(MarshalError::InvalidField(format!(
                "size of {size_bits} bits is not a whole number of bytes"
            )));
        }
        let align = align_bits / 8;
        if align_bits % 8 != 0 || !align.is_power_of_two() {
            return Err(MarshalError::InvalidField(format!(
                "alignment of {align_bits} bits is not a power-of-two byte count"
            )));
        }
        let align = self.pack.map_or(align, |pack| align.min(pack));
        Ok((size_bits / 8, align))
    }

    /// Track a placed field, returning its end
    fn record(&mut self, offset: usize, size: usize, align: usize, explicit: bool) -> Result<usize> {
        let end = field_end(offset, size)?;
        self.max_end = self.max_end.max(end);
        self.max_align = self.max_align.max(align);
        self.fields.push(FieldDescriptor {
            offset,
            size,
            align,
            explicit,
        });
        Ok(end)
    }
}
