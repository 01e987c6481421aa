//! Portable type aliases and their per-platform native types
//!
//! Design: One data matrix (`tables.rs`) with a row per alias and a column
//! per supported platform. Tables are materialized once per process and
//! never mutated; lookups are plain hash probes.

mod tables;

#[cfg(test)]
mod tests;

use crate::error::{MarshalError, Result};
use crate::platform::{Cpu, Os, Platform, SUPPORTED};
use crate::types::NativeType;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString};
use tracing::debug;

/// Portable C type name whose width depends on the target
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Display, EnumString, EnumIter, EnumCount, AsRefStr,
)]
pub enum TypeAlias {
    #[strum(serialize = "int8_t")]
    Int8T,
    #[strum(to_string = "u_int8_t", serialize = "uint8_t")]
    UInt8T,
    #[strum(serialize = "int16_t")]
    Int16T,
    #[strum(to_string = "u_int16_t", serialize = "uint16_t")]
    UInt16T,
    #[strum(serialize = "int32_t")]
    Int32T,
    #[strum(to_string = "u_int32_t", serialize = "uint32_t")]
    UInt32T,
    #[strum(serialize = "int64_t")]
    Int64T,
    #[strum(to_string = "u_int64_t", serialize = "uint64_t")]
    UInt64T,
    /// `long`, 32 or 64 bits depending on the data model
    #[strum(serialize = "signed_long_int")]
    SignedLongInt,
    #[strum(serialize = "unsigned_long_int")]
    UnsignedLongInt,
    #[strum(serialize = "intptr_t")]
    IntptrT,
    #[strum(serialize = "uintptr_t")]
    UintptrT,
    #[strum(serialize = "caddr_t")]
    CaddrT,
    #[strum(serialize = "dev_t")]
    DevT,
    #[strum(serialize = "blkcnt_t")]
    BlkcntT,
    #[strum(serialize = "blksize_t")]
    BlksizeT,
    #[strum(serialize = "gid_t")]
    GidT,
    #[strum(serialize = "in_addr_t")]
    InAddrT,
    #[strum(serialize = "in_port_t")]
    InPortT,
    #[strum(serialize = "ino_t")]
    InoT,
    #[strum(serialize = "ino64_t")]
    Ino64T,
    #[strum(serialize = "key_t")]
    KeyT,
    #[strum(serialize = "mode_t")]
    ModeT,
    #[strum(serialize = "nlink_t")]
    NlinkT,
    #[strum(serialize = "id_t")]
    IdT,
    #[strum(serialize = "pid_t")]
    PidT,
    #[strum(serialize = "off_t")]
    OffT,
    #[strum(serialize = "swblk_t")]
    SwblkT,
    #[strum(serialize = "uid_t")]
    UidT,
    #[strum(serialize = "clock_t")]
    ClockT,
    #[strum(serialize = "size_t")]
    SizeT,
    #[strum(serialize = "ssize_t")]
    SsizeT,
    #[strum(serialize = "time_t")]
    TimeT,
    #[strum(serialize = "fsblkcnt_t")]
    FsblkcntT,
    #[strum(serialize = "fsfilcnt_t")]
    FsfilcntT,
    #[strum(serialize = "sa_family_t")]
    SaFamilyT,
    #[strum(serialize = "socklen_t")]
    SocklenT,
    #[strum(serialize = "rlim_t")]
    RlimT,
    #[strum(serialize = "cc_t")]
    CcT,
    #[strum(serialize = "speed_t")]
    SpeedT,
    #[strum(serialize = "tcflag_t")]
    TcflagT,
    #[strum(serialize = "eventfd_t")]
    EventfdT,
    #[strum(serialize = "nfds_t")]
    NfdsT,
    #[strum(serialize = "useconds_t")]
    UsecondsT,
    #[strum(serialize = "ptrdiff_t")]
    PtrdiffT,
    #[strum(serialize = "suseconds_t")]
    SusecondsT,
    #[strum(serialize = "wchar_t")]
    WcharT,
    #[strum(serialize = "wint_t")]
    WintT,
    /// Windows object handle
    #[strum(serialize = "HANDLE")]
    Handle,
}

/// Alias table for a single platform
#[derive(Debug)]
pub struct TypeAliasTable {
    platform: Platform,
    entries: HashMap<TypeAlias, NativeType>,
}

static TABLES: Lazy<HashMap<Platform, TypeAliasTable>> = Lazy::new(|| {
    let tables: HashMap<_, _> = SUPPORTED
        .iter()
        .enumerate()
        .map(|(column, &platform)| {
            let entries = tables::ALIAS_MATRIX
                .iter()
                .map(|(alias, row)| (*alias, row[column]))
                .collect();
            (platform, TypeAliasTable { platform, entries })
        })
        .collect();

    debug!(
        platforms = tables.len(),
        aliases = tables::ALIAS_MATRIX.len(),
        "type alias tables materialized"
    );
    tables
});

impl TypeAliasTable {
    /// Table for a platform, failing if the platform has none
    pub fn for_platform(platform: Platform) -> Result<&'static TypeAliasTable> {
        TABLES
            .get(&platform)
            .ok_or_else(|| MarshalError::UnsupportedPlatform {
                os: platform.os.to_string(),
                cpu: platform.cpu.to_string(),
            })
    }

    #[inline]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Concrete native type of an alias on this table's platform
    pub fn get(&self, alias: TypeAlias) -> Result<NativeType> {
        self.entries
            .get(&alias)
            .copied()
            .ok_or(MarshalError::UnresolvedAlias {
                alias,
                platform: self.platform,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeAlias, NativeType)> + '_ {
        self.entries.iter().map(|(a, t)| (*a, *t))
    }
}

/// Resolve an alias for an (os, cpu) pair
pub fn resolve(alias: TypeAlias, os: Os, cpu: Cpu) -> Result<NativeType> {
    TypeAliasTable::for_platform(Platform::new(os, cpu))?.get(alias)
}

/// Resolve an alias given by its C spelling, e.g. `"size_t"`
pub fn resolve_name(name: &str, os: Os, cpu: Cpu) -> Result<NativeType> {
    let alias: TypeAlias = name
        .parse()
        .map_err(|_| MarshalError::Config(format!("unknown type alias '{name}'")))?;
    resolve(alias, os, cpu)
}
