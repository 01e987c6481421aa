//! Function descriptors - marshalling plans built once per bound function

use super::marshal::{ArrayArg, ArrayMarshaller, ByReferenceMarshaller, EnumArg, StringMarshaller};
use super::session::InvocationSession;
use crate::alias::TypeAlias;
use crate::byref::ByReference;
use crate::enums::{EnumRegistry, NativeEnum};
use crate::error::{MarshalError, Result};
use crate::flags::ParameterFlags;
use crate::logging::{log_function_bound, log_native_call, log_native_return, perf};
use crate::memory::BufferPool;
use crate::runtime::NativeRuntime;
use crate::types::{ArgSlot, NativeType, NativeValue};
use dashmap::DashMap;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

/// A managed argument for one call
pub enum Arg<'a> {
    Int(i64),
    Float(f32),
    Double(f64),
    Address(usize),
    Enum(Box<dyn EnumArg + 'a>),
    ByRef(Option<&'a mut dyn ByReference>),
    Array(Option<&'a mut dyn ArrayArg>),
    Str(Option<&'a str>),
}

impl<'a> Arg<'a> {
    /// Single enum constant
    pub fn enumeration<E: NativeEnum>(constant: E) -> Self {
        Arg::Enum(Box::new(constant))
    }

    /// Set of enum constants passed as a bitmask
    pub fn enum_set<E: NativeEnum>(constants: Vec<E>) -> Self {
        Arg::Enum(Box::new(constants))
    }

    pub fn by_ref(value: &'a mut dyn ByReference) -> Self {
        Arg::ByRef(Some(value))
    }

    pub fn array(array: &'a mut dyn ArrayArg) -> Self {
        Arg::Array(Some(array))
    }

    fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "integer",
            Arg::Float(_) => "float",
            Arg::Double(_) => "double",
            Arg::Address(_) => "address",
            Arg::Enum(_) => "enum",
            Arg::ByRef(_) => "by-reference value",
            Arg::Array(_) => "array",
            Arg::Str(_) => "string",
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Clone, Copy)]
struct EnumType {
    id: TypeId,
    name: &'static str,
    check: fn(&EnumRegistry) -> Result<()>,
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl EnumType {
    fn of<E: NativeEnum>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
            check: check_entry::<E>,
        }
    }
}

fn check_entry<E: NativeEnum>(registry: &EnumRegistry) -> Result<()> {
    registry.entry::<E>().map(|_| ())
}

/// How one parameter is marshalled
#[derive(Debug, Clone, Copy)]
enum ParamPlan {
    Scalar(NativeType),
    ByReference(ByReferenceMarshaller),
    Array(ArrayMarshaller),
    Str(StringMarshaller),
    Enum { ty: EnumType, set: bool },
}

impl ParamPlan {
    fn flags(&self) -> ParameterFlags {
        match self {
            ParamPlan::ByReference(m) => m.flags(),
            ParamPlan::Array(m) => m.flags(),
            ParamPlan::Str(_) => ParameterFlags::IN,
            _ => ParameterFlags::default(),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ParamPlan::Scalar(ty) if ty.is_float() => "float or double",
            ParamPlan::Scalar(NativeType::Address) => "address",
            ParamPlan::Scalar(_) => "integer",
            ParamPlan::ByReference(_) => "by-reference value",
            ParamPlan::Array(_) => "array",
            ParamPlan::Str(_) => "string",
            ParamPlan::Enum { set: false, .. } => "enum",
            ParamPlan::Enum { set: true, .. } => "enum set",
        }
    }

    fn marshal<'a>(
        &self,
        index: usize,
        arg: Arg<'a>,
        runtime: &NativeRuntime,
        pool: &mut dyn BufferPool,
        session: &mut InvocationSession<'a>,
    ) -> Result<ArgSlot> {
        let mismatch = || MarshalError::ArgKindMismatch {
            index,
            expected: self.expected(),
        };

        match (self, arg) {
            (ParamPlan::Scalar(ty), arg) => scalar_slot(*ty, arg, runtime).ok_or_else(mismatch),
            (ParamPlan::ByReference(m), Arg::ByRef(value)) => m.marshal(value, runtime, pool, session),
            (ParamPlan::Array(m), Arg::Array(array)) => m.marshal(array, pool, session),
            (ParamPlan::Str(m), Arg::Str(text)) => m.marshal(text, pool, session),
            (ParamPlan::Enum { ty, set }, Arg::Enum(constant)) => {
                if constant.enum_type() != ty.id || constant.is_set() != *set {
                    return Err(mismatch());
                }
                Ok(ArgSlot::Int(constant.native_value(runtime.enums())?))
            }
            _ => Err(mismatch()),
        }
    }
}

/// Convert a value argument for a scalar parameter
fn scalar_slot(ty: NativeType, arg: Arg<'_>, runtime: &NativeRuntime) -> Option<ArgSlot> {
    let model = runtime.data_model();
    match (ty, arg) {
        (NativeType::Float, Arg::Float(v)) => Some(ArgSlot::Float(v)),
        (NativeType::Float, Arg::Double(v)) => Some(ArgSlot::Float(v as f32)),
        (NativeType::Double, Arg::Double(v)) => Some(ArgSlot::Double(v)),
        (NativeType::Double, Arg::Float(v)) => Some(ArgSlot::Double(f64::from(v))),
        (NativeType::Address, Arg::Address(v)) => Some(NativeValue::Address(v).to_slot()),
        (ty, Arg::Int(v)) if ty.is_integral() || ty == NativeType::Address => {
            // Narrow to the parameter's width the way a C cast would
            Some(NativeValue::from_raw(v as u64, ty, model).to_slot())
        }
        _ => None,
    }
}

/// Return value conversion
#[derive(Debug, Clone, Copy)]
enum ReturnPlan {
    Value(NativeType),
    Enum(EnumType),
}

/// Ordered marshalling plans for one native function
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    name: String,
    params: Vec<ParamPlan>,
    ret: ReturnPlan,
    blocking: bool,
    runtime: NativeRuntime,
}

impl FunctionDescriptor {
    pub fn builder(name: impl Into<String>, runtime: &NativeRuntime) -> FunctionBuilder {
        FunctionBuilder {
            name: name.into(),
            runtime: runtime.clone(),
            params: Vec::new(),
            ret: ReturnPlan::Value(NativeType::Void),
            blocking: false,
            error: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    #[inline]
    pub fn runtime(&self) -> &NativeRuntime {
        &self.runtime
    }

    /// Decoded direction flags of a parameter
    pub fn param_flags(&self, index: usize) -> Option<ParameterFlags> {
        self.params.get(index).map(ParamPlan::flags)
    }

    /// Native type of the return value
    pub fn return_type(&self) -> NativeType {
        match self.ret {
            ReturnPlan::Value(ty) => ty,
            ReturnPlan::Enum(_) => NativeType::SInt,
        }
    }

    /// Marshal `args`, call through `invoker`, copy back and convert the return
    ///
    /// Deferred copy-back runs whether or not the native call succeeded, and
    /// scratch buffers always return to `pool`. A failed call is reported
    /// after that.
    pub fn invoke<'a, I>(
        &self,
        invoker: &mut dyn NativeInvoker,
        pool: &mut dyn BufferPool,
        args: I,
    ) -> Result<NativeValue>
    where
        I: IntoIterator<Item = Arg<'a>>,
    {
        let args: Vec<Arg<'a>> = args.into_iter().collect();
        if args.len() != self.params.len() {
            return Err(MarshalError::ArgCountMismatch {
                expected: self.params.len(),
                got: args.len(),
            });
        }

        let _perf = perf::track(&self.name);
        let mut session = InvocationSession::new();
        let mut slots = Vec::with_capacity(args.len());
        for (index, (plan, arg)) in self.params.iter().zip(args).enumerate() {
            match plan.marshal(index, arg, &self.runtime, pool, &mut session) {
                Ok(slot) => slots.push(slot),
                Err(err) => {
                    session.abandon(pool);
                    return Err(err);
                }
            }
        }

        log_native_call(&self.name, slots.len());
        let raw = invoker.invoke(self, &slots);
        log_native_return(&self.name, session.deferred());

        let copied_back = session.finish(&self.runtime, pool);
        let raw = raw?;
        copied_back?;

        Ok(NativeValue::from_raw(raw, self.return_type(), self.runtime.data_model()))
    }

    /// Like `invoke`, decoding the return value as an enum constant
    pub fn invoke_enum<'a, E, I>(
        &self,
        invoker: &mut dyn NativeInvoker,
        pool: &mut dyn BufferPool,
        args: I,
    ) -> Result<E>
    where
        E: NativeEnum,
        I: IntoIterator<Item = Arg<'a>>,
    {
        match self.ret {
            ReturnPlan::Enum(ty) if ty.id == TypeId::of::<E>() => {}
            _ => {
                return Err(MarshalError::Config(format!(
                    "'{}' does not return {}",
                    self.name,
                    type_name::<E>()
                )))
            }
        }
        let value = self.invoke(invoker, pool, args)?;
        let raw = value.as_i64().unwrap_or_default();
        self.runtime.enums().value_of::<E>(raw)
    }
}

/// Builds a `FunctionDescriptor`, collecting the first declaration error
pub struct FunctionBuilder {
    name: String,
    runtime: NativeRuntime,
    params: Vec<ParamPlan>,
    ret: ReturnPlan,
    blocking: bool,
    error: Option<MarshalError>,
}

impl FunctionBuilder {
    fn fail(mut self, err: MarshalError) -> Self {
        self.error.get_or_insert(err);
        self
    }

    /// Scalar value parameter
    pub fn param(mut self, ty: NativeType) -> Self {
        if matches!(ty, NativeType::Void | NativeType::Struct) {
            let err = MarshalError::InvalidField(format!("{ty} cannot be passed by value"));
            return self.fail(err);
        }
        self.params.push(ParamPlan::Scalar(ty));
        self
    }

    /// Scalar value parameter declared through a portable alias
    pub fn alias_param(self, alias: TypeAlias) -> Self {
        match self.runtime.resolve_alias(alias) {
            Ok(ty) => self.param(ty),
            Err(err) => self.fail(err),
        }
    }

    pub fn by_reference(mut self, flags: ParameterFlags) -> Self {
        self.params.push(ParamPlan::ByReference(ByReferenceMarshaller::new(flags)));
        self
    }

    /// By-reference parameter with tags given by name, e.g. `["out"]`
    pub fn by_reference_tagged<S: AsRef<str>>(self, tags: &[S]) -> Self {
        match ParameterFlags::parse_names(tags) {
            Ok(flags) => self.by_reference(flags),
            Err(err) => self.fail(err),
        }
    }

    pub fn array(mut self, flags: ParameterFlags) -> Self {
        self.params.push(ParamPlan::Array(ArrayMarshaller::new(flags)));
        self
    }

    /// NUL-terminated string parameter
    pub fn string(mut self) -> Self {
        self.params.push(ParamPlan::Str(StringMarshaller));
        self
    }

    pub fn enumeration<E: NativeEnum>(mut self) -> Self {
        self.params.push(ParamPlan::Enum {
            ty: EnumType::of::<E>(),
            set: false,
        });
        self
    }

    pub fn enum_set<E: NativeEnum>(mut self) -> Self {
        self.params.push(ParamPlan::Enum {
            ty: EnumType::of::<E>(),
            set: true,
        });
        self
    }

    pub fn returns(mut self, ty: NativeType) -> Self {
        if ty == NativeType::Struct {
            return self.fail(MarshalError::InvalidField("struct returned by value".to_string()));
        }
        self.ret = ReturnPlan::Value(ty);
        self
    }

    pub fn returns_alias(self, alias: TypeAlias) -> Self {
        match self.runtime.resolve_alias(alias) {
            Ok(ty) => self.returns(ty),
            Err(err) => self.fail(err),
        }
    }

    pub fn returns_enum<E: NativeEnum>(mut self) -> Self {
        self.ret = ReturnPlan::Enum(EnumType::of::<E>());
        self
    }

    /// Declare that the native function may block indefinitely
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Validate every plan and produce the descriptor
    pub fn build(self) -> Result<FunctionDescriptor> {
        if let Some(err) = self.error {
            return Err(err);
        }

        if self.blocking {
            if let Some(index) = self.params.iter().position(|p| p.flags().is_pinned()) {
                return Err(MarshalError::PinnedBlocking {
                    function: self.name,
                    index,
                });
            }
        }

        let enum_types = self.params.iter().filter_map(|p| match p {
            ParamPlan::Enum { ty, .. } => Some(*ty),
            _ => None,
        });
        let return_enum = match self.ret {
            ReturnPlan::Enum(ty) => Some(ty),
            ReturnPlan::Value(_) => None,
        };
        for ty in enum_types.chain(return_enum) {
            (ty.check)(self.runtime.enums()).map_err(|err| match err {
                MarshalError::InvalidEnum { .. } => err,
                other => MarshalError::InvalidEnum {
                    type_name: ty.name,
                    reason: other.to_string(),
                },
            })?;
        }

        log_function_bound(&self.name, self.params.len());
        Ok(FunctionDescriptor {
            name: self.name,
            params: self.params,
            ret: self.ret,
            blocking: self.blocking,
            runtime: self.runtime,
        })
    }
}

/// The native call engine
///
/// Receives the marshalled slots in parameter order and returns the raw
/// return register.
pub trait NativeInvoker {
    fn invoke(&mut self, function: &FunctionDescriptor, args: &[ArgSlot]) -> Result<u64>;
}

impl<F> NativeInvoker for F
where
    F: FnMut(&FunctionDescriptor, &[ArgSlot]) -> Result<u64>,
{
    fn invoke(&mut self, function: &FunctionDescriptor, args: &[ArgSlot]) -> Result<u64> {
        self(function, args)
    }
}

/// Descriptors bound at load time, looked up by name
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: DashMap<String, Arc<FunctionDescriptor>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, replacing any previous one with the same name
    pub fn bind(&self, descriptor: FunctionDescriptor) -> Arc<FunctionDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.functions
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        descriptor
    }

    pub fn get(&self, name: &str) -> Result<Arc<FunctionDescriptor>> {
        self.functions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| MarshalError::UnboundFunction(name.to_string()))
    }

    /// Look up `name` and invoke it
    pub fn call<'a, I>(
        &self,
        name: &str,
        invoker: &mut dyn NativeInvoker,
        pool: &mut dyn BufferPool,
        args: I,
    ) -> Result<NativeValue>
    where
        I: IntoIterator<Item = Arg<'a>>,
    {
        self.get(name)?.invoke(invoker, pool, args)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

