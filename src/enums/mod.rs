//! Enum codec - integer values for enumerated constants
//!
//! Design: Each enum type gets one immutable `EnumEntry` holding both
//! directions of the mapping. Entries live in an `EnumRegistry` keyed by
//! `TypeId`: the key map is a lock-free skip list and each key owns a
//! `OnceCell`, so building an entry only blocks callers asking for the same
//! type and every later lookup is a plain read.


use crate::error::{MarshalError, Result};
use crate::logging::log_enum_entry;
use crossbeam_skiplist::SkipMap;
use once_cell::sync::OnceCell;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Variant name of the fallback constant for unmapped native values
pub const UNKNOWN_NATIVE_VALUE: &str = "UnknownNativeValue";

/// An enum that crosses the native boundary as an integer
///
/// Derive `strum::EnumIter` and `strum::AsRefStr` and implement this trait.
/// Constants map to their declaration position unless `explicit_value`
/// is overridden, in which case it must return `Some` for every constant.
pub trait NativeEnum:
    IntoEnumIterator + AsRef<str> + Copy + Eq + Hash + Debug + Send + Sync + 'static
{
    /// Explicit native value of this constant
    fn explicit_value(self) -> Option<i64> {
        None
    }

    /// Whether this constant is the fallback for unmapped values
    fn is_unknown_sentinel(self) -> bool {
        self.as_ref() == UNKNOWN_NATIVE_VALUE
    }
}

/// Both directions of one enum type's mapping
#[derive(Debug)]
pub struct EnumEntry<E: NativeEnum> {
    to_native: HashMap<E, i64>,
    from_native: HashMap<i64, E>,
    sentinel: Option<E>,
}

impl<E: NativeEnum> EnumEntry<E> {
    /// Build the mapping for `E`
    ///
    /// When two constants share a value, the later declaration wins the
    /// reverse lookup.
    pub fn build() -> Result<Self> {
        let constants: Vec<E> = E::iter().collect();
        let explicit = constants
            .iter()
            .filter(|c| c.explicit_value().is_some())
            .count();
        if explicit != 0 && explicit != constants.len() {
            return Err(MarshalError::InvalidEnum {
                type_name: type_name::<E>(),
                reason: format!(
                    "{explicit} of {} constants declare an explicit value",
                    constants.len()
                ),
            });
        }

        let mut to_native = HashMap::with_capacity(constants.len());
        let mut from_native = HashMap::with_capacity(constants.len());
        let mut sentinel = None;

        for (ordinal, constant) in constants.into_iter().enumerate() {
            let value = constant.explicit_value().unwrap_or(ordinal as i64);
            to_native.insert(constant, value);
            from_native.insert(value, constant);
            if sentinel.is_none() && constant.is_unknown_sentinel() {
                sentinel = Some(constant);
            }
        }

        log_enum_entry(type_name::<E>(), to_native.len());
        Ok(Self {
            to_native,
            from_native,
            sentinel,
        })
    }

    /// Native value of a constant
    ///
    /// Constants hidden from `EnumIter` have no value.
    #[inline]
    pub fn int_value(&self, constant: E) -> Result<i64> {
        self.to_native
            .get(&constant)
            .copied()
            .ok_or_else(|| MarshalError::InvalidEnum {
                type_name: type_name::<E>(),
                reason: format!("constant {constant:?} has no native value"),
            })
    }

    /// Constant for a native value, falling back to the sentinel
    pub fn value_of(&self, value: i64) -> Result<E> {
        self.from_native
            .get(&value)
            .copied()
            .or(self.sentinel)
            .ok_or(MarshalError::EnumMapping {
                value,
                type_name: type_name::<E>(),
            })
    }

    #[inline]
    pub fn sentinel(&self) -> Option<E> {
        self.sentinel
    }

    /// OR of the values of a set of constants
    pub fn bitmask<I: IntoIterator<Item = E>>(&self, constants: I) -> Result<i64> {
        constants
            .into_iter()
            .try_fold(0, |mask, c| -> Result<i64> { Ok(mask | self.int_value(c)?) })
    }

    /// Every constant whose bits are all set in `mask`, in declaration order
    ///
    /// A constant with value 0 is always included.
    pub fn from_bitmask(&self, mask: i64) -> Vec<E> {
        E::iter()
            .filter(|c| {
                self.to_native
                    .get(c)
                    .is_some_and(|&value| mask & value == value)
            })
            .collect()
    }
}

type AnyEntry = Arc<dyn Any + Send + Sync>;

/// Process- or runtime-wide cache of enum entries
#[derive(Default)]
pub struct EnumRegistry {
    entries: SkipMap<TypeId, Arc<OnceCell<AnyEntry>>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `E`, built on first use
    pub fn entry<E: NativeEnum>(&self) -> Result<Arc<EnumEntry<E>>> {
        let id = TypeId::of::<E>();

        if let Some(cached) = self.entries.get(&id) {
            if let Some(entry) = cached.value().get() {
                return downcast(entry);
            }
        }

        let cell = Arc::clone(
            self.entries
                .get_or_insert(id, Arc::new(OnceCell::new()))
                .value(),
        );
        let entry = cell.get_or_try_init(|| -> Result<AnyEntry> {
            let entry: AnyEntry = Arc::new(EnumEntry::<E>::build()?);
            Ok(entry)
        })?;
        downcast(entry)
    }

    /// Native value of a constant
    pub fn int_value<E: NativeEnum>(&self, constant: E) -> Result<i64> {
        self.entry::<E>()?.int_value(constant)
    }

    /// Constant for a native value
    pub fn value_of<E: NativeEnum>(&self, value: i64) -> Result<E> {
        self.entry::<E>()?.value_of(value)
    }

    /// Number of enum types with a built entry
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EnumRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

fn downcast<E: NativeEnum>(entry: &AnyEntry) -> Result<Arc<EnumEntry<E>>> {
    Arc::clone(entry)
        .downcast::<EnumEntry<E>>()
        .map_err(|_| MarshalError::InvalidEnum {
            type_name: type_name::<E>(),
            reason: "registry entry has a different type".to_string(),
        })
}
