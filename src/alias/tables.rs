//! Alias matrix - one row per alias, one column per supported platform
//!
//! Column order follows `platform::SUPPORTED`. The aarch64 `int64_t` and
//! `u_int64_t` rows resolve to `Address`, which is 64 bits wide there.

use super::TypeAlias::{self, *};
use crate::types::NativeType::{
    self, Address as Ptr, SChar, SInt, SLong, SLongLong, SShort, UChar, UInt, ULong,
    ULongLong, UShort,
};

type Row = (TypeAlias, [NativeType; 9]);

#[rustfmt::skip]
pub(super) static ALIAS_MATRIX: &[Row] = &[
    //               linux-x86_64 linux-i386  linux-aarch64 linux-arm  darwin-x86_64 darwin-aarch64 freebsd-x86_64 openbsd-x86_64 windows-x86_64
    (Int8T,           [SChar,     SChar,      SChar,      SChar,      SChar,      SChar,      SChar,      SChar,      SChar]),
    (UInt8T,          [UChar,     UChar,      UChar,      UChar,      UChar,      UChar,      UChar,      UChar,      UChar]),
    (Int16T,          [SShort,    SShort,     SShort,     SShort,     SShort,     SShort,     SShort,     SShort,     SShort]),
    (UInt16T,         [UShort,    UShort,     UShort,     UShort,     UShort,     UShort,     UShort,     UShort,     UShort]),
    (Int32T,          [SInt,      SInt,       SInt,       SInt,       SInt,       SInt,       SInt,       SInt,       SInt]),
    (UInt32T,         [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (Int64T,          [SLongLong, SLongLong,  Ptr,        SLongLong,  SLongLong,  SLongLong,  SLongLong,  SLongLong,  SLongLong]),
    (UInt64T,         [ULongLong, ULongLong,  Ptr,        ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong]),
    (SignedLongInt,   [SLong,     SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLong]),
    (UnsignedLongInt, [ULong,     ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULong]),
    (IntptrT,         [SLong,     SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLongLong]),
    (UintptrT,        [ULong,     ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULongLong]),
    (CaddrT,          [Ptr,       Ptr,        Ptr,        Ptr,        Ptr,        Ptr,        Ptr,        Ptr,        Ptr]),
    (DevT,            [ULong,     ULongLong,  ULong,      ULongLong,  SInt,       SInt,       ULong,      SInt,       UInt]),
    (BlkcntT,         [SLong,     SLong,      SLong,      SLong,      SLongLong,  SLongLong,  SLongLong,  SLong,      SLongLong]),
    (BlksizeT,        [SLong,     SLong,      SLong,      SLong,      SInt,       SInt,       SInt,       SLong,      SLong]),
    (GidT,            [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (InAddrT,         [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (InPortT,         [UShort,    UShort,     UShort,     UShort,     UShort,     UShort,     UShort,     UShort,     UShort]),
    (InoT,            [ULong,     ULong,      ULong,      ULong,      ULongLong,  ULongLong,  ULongLong,  UInt,       UShort]),
    (Ino64T,          [ULong,     ULongLong,  ULong,      ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong]),
    (KeyT,            [SInt,      SInt,       SInt,       SInt,       SInt,       SInt,       SLong,      SLong,      SInt]),
    (ModeT,           [UInt,      UInt,       UInt,       UInt,       UShort,     UShort,     UShort,     UInt,       UShort]),
    (NlinkT,          [ULong,     UInt,       ULong,      ULong,      UShort,     UShort,     ULongLong,  UInt,       UInt]),
    (IdT,             [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (PidT,            [SInt,      SInt,       SInt,       SInt,       SInt,       SInt,       SInt,       SInt,       SLongLong]),
    (OffT,            [SLong,     SLong,      SLong,      SLong,      SLongLong,  SLongLong,  SLongLong,  SLongLong,  SLong]),
    (SwblkT,          [SLong,     SLong,      SLong,      SLong,      SInt,       SInt,       SInt,       SInt,       SLong]),
    (UidT,            [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (ClockT,          [SLong,     SLong,      SLong,      SLong,      ULong,      ULong,      SInt,       SInt,       SLong]),
    (SizeT,           [ULong,     ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULongLong]),
    (SsizeT,          [SLong,     SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLongLong]),
    (TimeT,           [SLong,     SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SInt,       SLongLong]),
    (FsblkcntT,       [ULong,     ULong,      ULong,      ULong,      UInt,       UInt,       ULongLong,  ULong,      ULongLong]),
    (FsfilcntT,       [ULong,     ULong,      ULong,      ULong,      UInt,       UInt,       ULongLong,  ULong,      ULongLong]),
    (SaFamilyT,       [UShort,    UShort,     UShort,     UShort,     UChar,      UChar,      UChar,      UChar,      UShort]),
    (SocklenT,        [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       SInt]),
    (RlimT,           [ULong,     ULong,      ULong,      ULong,      ULongLong,  ULongLong,  SLongLong,  ULongLong,  ULongLong]),
    (CcT,             [UChar,     UChar,      UChar,      UChar,      UChar,      UChar,      UChar,      UChar,      UChar]),
    (SpeedT,          [UInt,      UInt,       UInt,       UInt,       ULong,      ULong,      UInt,       UInt,       UInt]),
    (TcflagT,         [UInt,      UInt,       UInt,       UInt,       ULong,      ULong,      UInt,       UInt,       UInt]),
    (EventfdT,        [ULongLong, ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong,  ULongLong]),
    (NfdsT,           [ULong,     ULong,      ULong,      ULong,      UInt,       UInt,       UInt,       UInt,       ULong]),
    (UsecondsT,       [UInt,      UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt,       UInt]),
    (PtrdiffT,        [SLong,     SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLong,      SLongLong]),
    (SusecondsT,      [SLong,     SLong,      SLong,      SLong,      SInt,       SInt,       SLong,      SLong,      SLong]),
    (WcharT,          [SInt,      SInt,       UInt,       UInt,       SInt,       SInt,       SInt,       SInt,       UShort]),
    (WintT,           [UInt,      UInt,       UInt,       UInt,       SInt,       SInt,       SInt,       SInt,       UShort]),
    (Handle,          [ULong,     ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      ULong,      Ptr]),
];
