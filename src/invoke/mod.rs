//! Parameter marshalling around a native call
//!
//! A `FunctionDescriptor` is built once per bound function and holds one
//! marshalling plan per parameter, decoded from its direction tags. Each
//! call opens a fresh `InvocationSession`: arguments are marshalled into
//! `ArgSlot`s, the call goes through a `NativeInvoker`, then deferred
//! copy-back runs and scratch buffers return to the pool.

mod function;
mod marshal;
mod session;


pub use function::{Arg, FunctionBuilder, FunctionDescriptor, FunctionTable, NativeInvoker};
pub use marshal::{ArrayArg, ArrayMarshaller, ByReferenceMarshaller, EnumArg, StringMarshaller};
pub use session::{InvocationSession, ScratchId};
