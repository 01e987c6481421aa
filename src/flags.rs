//! Parameter direction and ownership flags
//!
//! Tags are decoded once, when a function is bound, into a plain bitmask.
//! Nothing on the call path looks at tags again.

use crate::error::{MarshalError, Result};
use bitflags::bitflags;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Declarative modifier attached to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ParameterTag {
    /// Copy the managed value into native memory before the call
    In,
    /// Copy native memory back into the managed value after the call
    Out,
    /// Hand the managed storage to native code without copying
    Pinned,
    /// Native code does not retain the memory past the call
    Transient,
    /// Backing memory must be native (not managed-heap) memory
    Direct,
    /// Append a zero terminator element
    #[strum(to_string = "NULTERMINATE", serialize = "NUL_TERMINATE")]
    NulTerminate,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParameterFlags: u8 {
        const OUT = 0x01;
        const IN = 0x02;
        const PINNED = 0x04;
        const NUL_TERMINATE = 0x08;
        const TRANSIENT = 0x10;
        const DIRECT = 0x20;
    }
}

impl From<ParameterTag> for ParameterFlags {
    fn from(tag: ParameterTag) -> Self {
        match tag {
            ParameterTag::In => Self::IN,
            ParameterTag::Out => Self::OUT,
            ParameterTag::Pinned => Self::PINNED,
            ParameterTag::Transient => Self::TRANSIENT,
            ParameterTag::Direct => Self::DIRECT,
            ParameterTag::NulTerminate => Self::NUL_TERMINATE,
        }
    }
}

impl Default for ParameterFlags {
    /// No tags at all: copy in both directions
    fn default() -> Self {
        Self::IN | Self::OUT
    }
}

impl ParameterFlags {
    /// Decode a parameter's tags
    ///
    /// When neither `In` nor `Out` is present both are set.
    pub fn parse<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = ParameterTag>,
    {
        let mut flags = tags
            .into_iter()
            .fold(Self::empty(), |acc, tag| acc | Self::from(tag));
        if !flags.intersects(Self::IN | Self::OUT) {
            flags |= Self::IN | Self::OUT;
        }
        flags
    }

    /// Decode tags given by name, e.g. `["out", "pinned"]`
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let tags = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                name.parse::<ParameterTag>()
                    .map_err(|_| MarshalError::UnknownTag(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::parse(tags))
    }

    #[inline]
    pub const fn is_in(self) -> bool {
        self.bits() & (Self::IN.bits() | Self::OUT.bits()) != Self::OUT.bits()
    }

    #[inline]
    pub const fn is_out(self) -> bool {
        self.bits() & (Self::IN.bits() | Self::OUT.bits()) != Self::IN.bits()
    }

    #[inline]
    pub const fn is_pinned(self) -> bool {
        self.contains(Self::PINNED)
    }

    #[inline]
    pub const fn is_transient(self) -> bool {
        self.contains(Self::TRANSIENT)
    }

    #[inline]
    pub const fn is_direct(self) -> bool {
        self.contains(Self::DIRECT)
    }

    #[inline]
    pub const fn is_nul_terminate(self) -> bool {
        self.contains(Self::NUL_TERMINATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParameterTag::*;

    #[test]
    fn test_direction_truth_table() {
        let none = ParameterFlags::parse(std::iter::empty());
        assert!(none.is_in() && none.is_out());

        let in_only = ParameterFlags::parse([In]);
        assert!(in_only.is_in() && !in_only.is_out());

        let out_only = ParameterFlags::parse([Out]);
        assert!(!out_only.is_in() && out_only.is_out());

        let both = ParameterFlags::parse([In, Out]);
        assert!(both.is_in() && both.is_out());
    }

    #[test]
    fn test_modifiers_keep_default_direction() {
        let flags = ParameterFlags::parse([Pinned, NulTerminate]);
        assert!(flags.is_pinned());
        assert!(flags.is_nul_terminate());
        assert!(flags.is_in() && flags.is_out());
        assert!(!flags.is_transient());
        assert!(!flags.is_direct());
    }

    #[test]
    fn test_parse_names() {
        let flags = ParameterFlags::parse_names(&["out", "Transient", "DIRECT"]).unwrap();
        assert_eq!(
            flags,
            ParameterFlags::OUT | ParameterFlags::TRANSIENT | ParameterFlags::DIRECT
        );
        assert!(!flags.is_in());

        let err = ParameterFlags::parse_names(&["in", "borrowed"]).unwrap_err();
        assert!(matches!(err, MarshalError::UnknownTag(ref t) if t == "borrowed"));
    }

    #[test]
    fn test_bit_values_are_stable() {
        assert_eq!(ParameterFlags::OUT.bits(), 0x01);
        assert_eq!(ParameterFlags::IN.bits(), 0x02);
        assert_eq!(ParameterFlags::PINNED.bits(), 0x04);
        assert_eq!(ParameterFlags::NUL_TERMINATE.bits(), 0x08);
        assert_eq!(ParameterFlags::TRANSIENT.bits(), 0x10);
        assert_eq!(ParameterFlags::DIRECT.bits(), 0x20);
        assert_eq!(ParameterFlags::default(), ParameterFlags::parse(std::iter::empty()));
    }
}
