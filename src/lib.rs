//! Native Marshal - struct layout and value marshalling for foreign calls
//!
//! This crate computes native record layouts, resolves portable type
//! aliases per platform, and moves managed values in and out of native
//! memory around a call. Executing the call itself is left to a
//! `NativeInvoker` supplied by the caller.

pub mod alias;
pub mod byref;
pub mod config;
pub mod enums;
pub mod error;
pub mod flags;
pub mod invoke;
pub mod layout;
pub mod logging;
pub mod memory;
pub mod platform;
pub mod runtime;
pub mod types;

#[cfg(test)]
mod probe;

// Re-export core types
pub use alias::{TypeAlias, TypeAliasTable};
pub use byref::{
    AddressByReference, ByReference, IntByReference, NativeLongByReference, ScalarByReference,
};
pub use config::MarshalConfig;
pub use enums::{EnumEntry, EnumRegistry, NativeEnum};
pub use error::{MarshalError, Result};
pub use flags::{ParameterFlags, ParameterTag};
pub use invoke::{Arg, FunctionDescriptor, FunctionTable, InvocationSession, NativeInvoker};
pub use layout::{Offset, StructLayout, StructValue};
pub use memory::{BufferPool, MultiBufferPool, NativeBuffer, NativeMemory, SynchronizedPool};
pub use platform::{Cpu, DataModel, Os, Platform};
pub use runtime::NativeRuntime;
pub use types::{ArgSlot, NativeType, NativeValue};
