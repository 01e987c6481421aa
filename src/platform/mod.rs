//! Platform description - operating system, CPU and native data model
//!
//! Design: Every width that differs between targets (pointers, `long`, the
//! alignment of 64-bit scalars) is answered by a `DataModel` looked up per
//! platform, never by `cfg!` at the point of use. Layouts can therefore be
//! computed for a foreign target as well as for the host.

use crate::error::{MarshalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};


/// Operating system family
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Display, EnumString, EnumIter, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin,
    FreeBsd,
    OpenBsd,
    Windows,
}

/// CPU architecture
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Display, EnumString, EnumIter, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Cpu {
    I386,
    #[strum(serialize = "x86_64")]
    #[serde(rename = "x86_64")]
    X86_64,
    Arm,
    Aarch64,
}

/// An (os, cpu) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
    pub os: Os,
    pub cpu: Cpu,
}

/// Every platform with a populated alias table
pub const SUPPORTED: [Platform; 9] = [
    Platform::new(Os::Linux, Cpu::X86_64),
    Platform::new(Os::Linux, Cpu::I386),
    Platform::new(Os::Linux, Cpu::Aarch64),
    Platform::new(Os::Linux, Cpu::Arm),
    Platform::new(Os::Darwin, Cpu::X86_64),
    Platform::new(Os::Darwin, Cpu::Aarch64),
    Platform::new(Os::FreeBsd, Cpu::X86_64),
    Platform::new(Os::OpenBsd, Cpu::X86_64),
    Platform::new(Os::Windows, Cpu::X86_64),
];

impl Platform {
    #[inline]
    pub const fn new(os: Os, cpu: Cpu) -> Self {
        Self { os, cpu }
    }

    /// Platform the crate was compiled for
    pub fn host() -> Result<Self> {
        let os = if cfg!(target_os = "linux") || cfg!(target_os = "android") {
            Some(Os::Linux)
        } else if cfg!(target_os = "macos") || cfg!(target_os = "ios") {
            Some(Os::Darwin)
        } else if cfg!(target_os = "freebsd") {
            Some(Os::FreeBsd)
        } else if cfg!(target_os = "openbsd") {
            Some(Os::OpenBsd)
        } else if cfg!(target_os = "windows") {
            Some(Os::Windows)
        } else {
            None
        };

        let cpu = if cfg!(target_arch = "x86_64") {
            Some(Cpu::X86_64)
        } else if cfg!(target_arch = "x86") {
            Some(Cpu::I386)
        } else if cfg!(target_arch = "aarch64") {
            Some(Cpu::Aarch64)
        } else if cfg!(target_arch = "arm") {
            Some(Cpu::Arm)
        } else {
            None
        };

        match (os, cpu) {
            (Some(os), Some(cpu)) => Self::new(os, cpu).supported(),
            _ => Err(MarshalError::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
                cpu: std::env::consts::ARCH.to_string(),
            }),
        }
    }

    /// Parse a platform from its os and cpu names
    pub fn parse(os: &str, cpu: &str) -> Result<Self> {
        let unsupported = || MarshalError::UnsupportedPlatform {
            os: os.to_string(),
            cpu: cpu.to_string(),
        };
        let os: Os = os.parse().map_err(|_| unsupported())?;
        let cpu: Cpu = cpu.parse().map_err(|_| unsupported())?;
        Self::new(os, cpu).supported()
    }

    /// Returns self when an alias table exists for this pair
    pub fn supported(self) -> Result<Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(MarshalError::UnsupportedPlatform {
                os: self.os.to_string(),
                cpu: self.cpu.to_string(),
            })
        }
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        SUPPORTED.contains(&self)
    }

    /// Native data model for this platform
    pub const fn data_model(self) -> DataModel {
        match self.cpu {
            Cpu::I386 => DataModel {
                address_size: 4,
                long_size: 4,
                // System V i386 aligns 64-bit scalars on 4 bytes inside records
                int64_align: if matches!(self.os, Os::Windows) { 8 } else { 4 },
                double_align: if matches!(self.os, Os::Windows) { 8 } else { 4 },
            },
            Cpu::Arm => DataModel {
                address_size: 4,
                long_size: 4,
                int64_align: 8,
                double_align: 8,
            },
            Cpu::X86_64 | Cpu::Aarch64 => DataModel {
                address_size: 8,
                // LLP64
                long_size: if matches!(self.os, Os::Windows) { 4 } else { 8 },
                int64_align: 8,
                double_align: 8,
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.cpu)
    }
}

/// Widths and alignments, in bytes, that vary between platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataModel {
    pub address_size: usize,
    pub long_size: usize,
    pub int64_align: usize,
    pub double_align: usize,
}

impl DataModel {
    /// Data model of the running process
    pub const fn native() -> Self {
        Self {
            address_size: core::mem::size_of::<usize>(),
            long_size: core::mem::size_of::<core::ffi::c_long>(),
            int64_align: core::mem::align_of::<u64>(),
            double_align: core::mem::align_of::<f64>(),
        }
    }
}
