//! Call-time marshallers for parameters that need native memory
//!
//! Each marshaller turns one managed argument into an `ArgSlot`. Anything
//! that must happen after the native call is registered on the session.

use super::session::{InvocationSession, ScratchId};
use crate::byref::ByReference;
use crate::enums::{EnumRegistry, NativeEnum};
use crate::error::Result;
use crate::flags::ParameterFlags;
use crate::memory::{BufferPool, NativeBuffer, NativeMemory, NativeMemoryExt, Scalar};
use crate::runtime::NativeRuntime;
use crate::types::ArgSlot;
use std::any::{type_name, TypeId};

/// Hand a scratch buffer to the session, returning its address
fn hold_scratch(session: &mut InvocationSession<'_>, buffer: NativeBuffer) -> (usize, ScratchId) {
    let address = buffer.address();
    (address, session.hold(buffer))
}

/// Marshals a by-reference scalar or record through a scratch buffer
#[derive(Debug, Clone, Copy)]
pub struct ByReferenceMarshaller {
    flags: ParameterFlags,
}

impl ByReferenceMarshaller {
    pub fn new(flags: ParameterFlags) -> Self {
        Self { flags }
    }

    #[inline]
    pub fn flags(&self) -> ParameterFlags {
        self.flags
    }

    /// Marshal one argument
    ///
    /// An absent value becomes a null slot with no allocation. Otherwise the
    /// value is copied in for `IN`, and copy-back is scheduled for `OUT`.
    pub fn marshal<'a>(
        &self,
        value: Option<&'a mut dyn ByReference>,
        runtime: &NativeRuntime,
        pool: &mut dyn BufferPool,
        session: &mut InvocationSession<'a>,
    ) -> Result<ArgSlot> {
        let Some(value) = value else {
            return Ok(ArgSlot::Null);
        };

        let mut buffer = pool.get(value.native_size(runtime))?;
        if self.flags.is_in() {
            if let Err(err) = value.marshal(runtime, &mut buffer, 0) {
                pool.put(buffer);
                return Err(err);
            }
        }

        let (address, id) = hold_scratch(session, buffer);
        if self.flags.is_out() {
            session.add_post_invoke(id, move |runtime, memory| value.unmarshal(runtime, memory, 0));
        }
        Ok(ArgSlot::Address(address))
    }
}

/// Array of native scalars passed by address
pub trait ArrayArg {
    /// Bytes per element
    fn element_size(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the first element of the managed storage
    fn address(&self) -> usize;

    fn write_to(&self, memory: &mut dyn NativeMemory) -> Result<()>;

    fn read_from(&mut self, memory: &dyn NativeMemory) -> Result<()>;
}

fn write_elements<T: Scalar>(elements: &[T], memory: &mut dyn NativeMemory) -> Result<()> {
    for (i, &element) in elements.iter().enumerate() {
        memory.put(i * T::SIZE, element)?;
    }
    Ok(())
}

fn read_elements<T: Scalar>(elements: &mut [T], memory: &dyn NativeMemory) -> Result<()> {
    for (i, element) in elements.iter_mut().enumerate() {
        *element = memory.get(i * T::SIZE)?;
    }
    Ok(())
}

impl<T: Scalar> ArrayArg for Vec<T> {
    fn element_size(&self) -> usize {
        T::SIZE
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn address(&self) -> usize {
        self.as_ptr() as usize
    }

    fn write_to(&self, memory: &mut dyn NativeMemory) -> Result<()> {
        write_elements(self, memory)
    }

    fn read_from(&mut self, memory: &dyn NativeMemory) -> Result<()> {
        read_elements(self, memory)
    }
}

impl<T: Scalar, const N: usize> ArrayArg for [T; N] {
    fn element_size(&self) -> usize {
        T::SIZE
    }

    fn len(&self) -> usize {
        N
    }

    fn address(&self) -> usize {
        self.as_ptr() as usize
    }

    fn write_to(&self, memory: &mut dyn NativeMemory) -> Result<()> {
        write_elements(self, memory)
    }

    fn read_from(&mut self, memory: &dyn NativeMemory) -> Result<()> {
        read_elements(self, memory)
    }
}

/// Marshals arrays of scalars
#[derive(Debug, Clone, Copy)]
pub struct ArrayMarshaller {
    flags: ParameterFlags,
}

impl ArrayMarshaller {
    pub fn new(flags: ParameterFlags) -> Self {
        Self { flags }
    }

    #[inline]
    pub fn flags(&self) -> ParameterFlags {
        self.flags
    }

    /// Marshal one array argument
    ///
    /// Pinned arrays without a terminator are handed over in place. All
    /// others go through a scratch buffer, with one extra zeroed element
    /// when `NUL_TERMINATE` is set.
    pub fn marshal<'a>(
        &self,
        array: Option<&'a mut dyn ArrayArg>,
        pool: &mut dyn BufferPool,
        session: &mut InvocationSession<'a>,
    ) -> Result<ArgSlot> {
        let Some(array) = array else {
            return Ok(ArgSlot::Null);
        };

        if self.flags.is_pinned() && !self.flags.is_nul_terminate() {
            return Ok(ArgSlot::Address(array.address()));
        }

        let elements = array.len() + usize::from(self.flags.is_nul_terminate());
        let mut buffer = pool.get(elements * array.element_size())?;
        if self.flags.is_in() {
            if let Err(err) = array.write_to(&mut buffer) {
                pool.put(buffer);
                return Err(err);
            }
        }

        let (address, id) = hold_scratch(session, buffer);
        if self.flags.is_out() {
            session.add_post_invoke(id, move |_, memory| array.read_from(memory));
        }
        Ok(ArgSlot::Address(address))
    }
}

/// Marshals text as a NUL-terminated UTF-8 copy
///
/// Strings are immutable on the managed side, so only `IN` applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMarshaller;

impl StringMarshaller {
    pub fn marshal(
        &self,
        text: Option<&str>,
        pool: &mut dyn BufferPool,
        session: &mut InvocationSession<'_>,
    ) -> Result<ArgSlot> {
        let Some(text) = text else {
            return Ok(ArgSlot::Null);
        };

        let mut buffer = pool.get(text.len() + 1)?;
        if let Err(err) = buffer.write_bytes(0, text.as_bytes()) {
            pool.put(buffer);
            return Err(err);
        }
        let (address, _) = hold_scratch(session, buffer);
        Ok(ArgSlot::Address(address))
    }
}

/// Enum constant or set of constants passed as an integer
pub trait EnumArg {
    /// `TypeId` of the enum type
    fn enum_type(&self) -> TypeId;

    fn enum_type_name(&self) -> &'static str;

    /// True for a set of constants combined into a bitmask
    fn is_set(&self) -> bool;

    fn native_value(&self, registry: &EnumRegistry) -> Result<i64>;
}

impl<E: NativeEnum> EnumArg for E {
    fn enum_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn enum_type_name(&self) -> &'static str {
        type_name::<E>()
    }

    fn is_set(&self) -> bool {
        false
    }

    fn native_value(&self, registry: &EnumRegistry) -> Result<i64> {
        registry.int_value(*self)
    }
}

impl<E: NativeEnum> EnumArg for Vec<E> {
    fn enum_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn enum_type_name(&self) -> &'static str {
        type_name::<E>()
    }

    fn is_set(&self) -> bool {
        true
    }

    fn native_value(&self, registry: &EnumRegistry) -> Result<i64> {
        registry.entry::<E>()?.bitmask(self.iter().copied())
    }
}
