//! Error types for layout, binding and call-time marshalling
//!
//! Configuration failures (unsupported platforms, unresolved aliases, malformed
//! field declarations) surface when a layout or function descriptor is built.
//! Call-time failures surface after the native call's session has finished.

use crate::alias::TypeAlias;
use crate::platform::Platform;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MarshalError>;

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("platform {os}-{cpu} is not supported")]
    UnsupportedPlatform { os: String, cpu: String },

    #[error("type alias '{alias}' has no native type on {platform}")]
    UnresolvedAlias { alias: TypeAlias, platform: Platform },

    #[error("invalid field declaration: {0}")]
    InvalidField(String),

    #[error("struct layout is finalized, no more fields can be declared")]
    LayoutSealed,

    #[error("struct layout must be finalized before it is bound to memory")]
    LayoutNotSealed,

    #[error("{0} cannot hold a null value")]
    NullValue(&'static str),

    #[error("no known enum mapping for value {value} of type {type_name}")]
    EnumMapping { value: i64, type_name: &'static str },

    #[error("invalid enum declaration for {type_name}: {reason}")]
    InvalidEnum {
        type_name: &'static str,
        reason: String,
    },

    #[error("memory access of {len} bytes at offset {offset} exceeds region of {size} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("value {value} does not fit a {width}-byte native integer")]
    IntegerOverflow { value: i64, width: usize },

    #[error("malformed native string: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("string contains non-ASCII byte 0x{byte:02x} at position {position}")]
    NonAscii { byte: u8, position: usize },

    #[error("unknown parameter tag '{0}'")]
    UnknownTag(String),

    #[error("parameter {index} of '{function}' is pinned but the function may block")]
    PinnedBlocking { function: String, index: usize },

    #[error("expected {expected} arguments, got {got}")]
    ArgCountMismatch { expected: usize, got: usize },

    #[error("argument {index} does not match its declared kind: expected {expected}")]
    ArgKindMismatch { index: usize, expected: &'static str },

    #[error("native invocation of '{function}' failed: {reason}")]
    Invocation { function: String, reason: String },

    #[error("failed to allocate {size} bytes of native memory")]
    Alloc { size: usize },

    #[error("function '{0}' is not bound")]
    UnboundFunction(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarshalError {
    /// True for errors raised while building layouts or binding functions
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. }
                | Self::UnresolvedAlias { .. }
                | Self::InvalidField(_)
                | Self::LayoutSealed
                | Self::LayoutNotSealed
                | Self::InvalidEnum { .. }
                | Self::UnknownTag(_)
                | Self::PinnedBlocking { .. }
                | Self::Config(_)
        )
    }
}

impl From<toml::de::Error> for MarshalError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
