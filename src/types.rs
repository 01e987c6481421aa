//! Native type classes and call-boundary value slots
//!
//! Defines type representations compatible with C ABIs.

use crate::platform::DataModel;
use strum::{Display, EnumIter};

/// Primitive native type class
///
/// Every portable alias and every struct member resolves to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum NativeType {
    Void,
    SChar,
    UChar,
    SShort,
    UShort,
    SInt,
    UInt,
    /// C `long`, 4 or 8 bytes depending on the data model
    SLong,
    ULong,
    SLongLong,
    ULongLong,
    Float,
    Double,
    /// Opaque record passed by address
    Struct,
    /// `void *`, 4 or 8 bytes depending on the data model
    Address,
}

/// Size and alignment of a native type, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub size: usize,
    pub align: usize,
}

impl NativeType {
    /// Resolve size and alignment under a data model
    pub const fn info(self, model: &DataModel) -> TypeInfo {
        let (size, align) = match self {
            Self::Void => (0, 1),
            Self::SChar | Self::UChar => (1, 1),
            Self::SShort | Self::UShort => (2, 2),
            Self::SInt | Self::UInt | Self::Float => (4, 4),
            Self::SLong | Self::ULong => (model.long_size, model.long_size),
            Self::SLongLong | Self::ULongLong => (8, model.int64_align),
            Self::Double => (8, model.double_align),
            Self::Struct | Self::Address => (model.address_size, model.address_size),
        };
        TypeInfo { size, align }
    }

    /// Check if type is integral
    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::SChar | Self::UChar | Self::SShort | Self::UShort | Self::SInt
                | Self::UInt | Self::SLong | Self::ULong | Self::SLongLong | Self::ULongLong
        )
    }

    /// Check if type is floating point
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::SChar | Self::SShort | Self::SInt | Self::SLong | Self::SLongLong
                | Self::Float | Self::Double
        )
    }
}

/// A marshalled argument as handed to the native call engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgSlot {
    /// Absent reference, passed as a null pointer
    Null,
    Address(usize),
    Int(i64),
    Float(f32),
    Double(f64),
}

impl ArgSlot {
    /// Address carried by this slot, null for `Null`
    #[inline]
    pub fn address(self) -> Option<usize> {
        match self {
            Self::Null => Some(0),
            Self::Address(addr) => Some(addr),
            _ => None,
        }
    }

    /// Integer view of the slot (addresses included)
    #[inline]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Null => 0,
            Self::Address(addr) => addr as i64,
            Self::Int(v) => v,
            Self::Float(v) => v as i64,
            Self::Double(v) => v as i64,
        }
    }
}

/// A converted scalar value on the managed side of the call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Void,
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Address(usize),
}

impl NativeValue {
    /// Interpret a raw return register according to a native type
    ///
    /// Integers narrower than 64 bits are sign- or zero-extended from
    /// their low bits; floats are taken from the low 32 bits.
    pub fn from_raw(raw: u64, ty: NativeType, model: &DataModel) -> Self {
        let width = ty.info(model).size * 8;
        match ty {
            NativeType::Void => Self::Void,
            NativeType::Float => Self::Float(f32::from_bits(raw as u32)),
            NativeType::Double => Self::Double(f64::from_bits(raw)),
            NativeType::Address | NativeType::Struct => Self::Address(truncate(raw, width) as usize),
            t if t.is_signed() => Self::Int(sign_extend(raw, width)),
            _ => Self::UInt(truncate(raw, width)),
        }
    }

    /// Convert to a native argument slot
    pub fn to_slot(self) -> ArgSlot {
        match self {
            Self::Void => ArgSlot::Null,
            Self::Int(v) => ArgSlot::Int(v),
            Self::UInt(v) => ArgSlot::Int(v as i64),
            Self::Float(v) => ArgSlot::Float(v),
            Self::Double(v) => ArgSlot::Double(v),
            Self::Address(0) => ArgSlot::Null,
            Self::Address(addr) => ArgSlot::Address(addr),
        }
    }

    /// Integer view, used for enum decoding
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => Some(v as i64),
            Self::Address(v) => Some(v as i64),
            _ => None,
        }
    }
}

#[inline]
fn truncate(raw: u64, width: usize) -> u64 {
    if width >= 64 {
        raw
    } else {
        raw & ((1u64 << width) - 1)
    }
}

#[inline]
fn sign_extend(raw: u64, width: usize) -> i64 {
    if width >= 64 || width == 0 {
        raw as i64
    } else {
        let shift = 64 - width;
        ((raw << shift) as i64) >> shift
    }
}
