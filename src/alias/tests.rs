use super::*;
use strum::IntoEnumIterator;

#[test]
fn matrix_lists_every_alias_exactly_once() {
    assert_eq!(tables::ALIAS_MATRIX.len(), TypeAlias::COUNT);
    for alias in TypeAlias::iter() {
        let rows = tables::ALIAS_MATRIX.iter().filter(|(a, _)| *a == alias).count();
        assert_eq!(rows, 1, "{alias} appears {rows} times");
    }
}

#[test]
fn every_supported_platform_resolves_every_alias() {
    for platform in SUPPORTED {
        let table = TypeAliasTable::for_platform(platform).expect("table");
        assert_eq!(table.platform(), platform);
        assert_eq!(table.len(), TypeAlias::COUNT);
        for alias in TypeAlias::iter() {
            assert!(table.get(alias).is_ok(), "{alias} missing on {platform}");
        }
    }
}

#[test]
fn unsupported_platform_fails_at_lookup() {
    let err = resolve(TypeAlias::SizeT, Os::OpenBsd, Cpu::Arm).unwrap_err();
    assert!(matches!(err, MarshalError::UnsupportedPlatform { .. }));
    assert!(err.is_configuration());
}

#[test]
fn variable_width_aliases_follow_data_model() {
    let size = |os, cpu| {
        let platform = Platform::new(os, cpu);
        resolve(TypeAlias::SizeT, os, cpu)
            .expect("size_t")
            .info(&platform.data_model())
            .size
    };
    assert_eq!(size(Os::Linux, Cpu::X86_64), 8);
    assert_eq!(size(Os::Linux, Cpu::I386), 4);
    assert_eq!(size(Os::Windows, Cpu::X86_64), 8);

    // long stays 32-bit on LLP64 even though pointers are 64-bit
    let win = Platform::new(Os::Windows, Cpu::X86_64);
    let long = resolve(TypeAlias::SignedLongInt, win.os, win.cpu).unwrap();
    assert_eq!(long.info(&win.data_model()).size, 4);
}

#[test]
fn device_and_inode_ids_differ_between_platforms() {
    assert_eq!(resolve(TypeAlias::DevT, Os::Linux, Cpu::X86_64).unwrap(), NativeType::ULong);
    assert_eq!(resolve(TypeAlias::DevT, Os::Linux, Cpu::Arm).unwrap(), NativeType::ULongLong);
    assert_eq!(resolve(TypeAlias::DevT, Os::OpenBsd, Cpu::X86_64).unwrap(), NativeType::SInt);
    assert_eq!(resolve(TypeAlias::InoT, Os::OpenBsd, Cpu::X86_64).unwrap(), NativeType::UInt);
    assert_eq!(resolve(TypeAlias::Ino64T, Os::Linux, Cpu::Arm).unwrap(), NativeType::ULongLong);
}

#[test]
fn aarch64_keeps_address_for_64_bit_ints() {
    assert_eq!(resolve(TypeAlias::Int64T, Os::Linux, Cpu::Aarch64).unwrap(), NativeType::Address);
    assert_eq!(resolve(TypeAlias::UInt64T, Os::Linux, Cpu::Aarch64).unwrap(), NativeType::Address);
}

#[test]
fn names_round_trip_through_c_spelling() {
    assert_eq!("size_t".parse::<TypeAlias>().unwrap(), TypeAlias::SizeT);
    assert_eq!("uint32_t".parse::<TypeAlias>().unwrap(), TypeAlias::UInt32T);
    assert_eq!(TypeAlias::UInt32T.to_string(), "u_int32_t");
    assert_eq!(TypeAlias::Handle.as_ref(), "HANDLE");
    assert_eq!(
        resolve_name("pid_t", Os::Linux, Cpu::X86_64).unwrap(),
        NativeType::SInt
    );
    assert!(matches!(
        resolve_name("not_a_type", Os::Linux, Cpu::X86_64),
        Err(MarshalError::Config(_))
    ));
}

#[cfg(unix)]
#[test]
fn host_table_matches_libc_widths() {
    use core::mem::size_of;

    let Ok(host) = Platform::host() else { return };
    let model = host.data_model();
    let width = |alias| resolve(alias, host.os, host.cpu).unwrap().info(&model).size;

    assert_eq!(width(TypeAlias::SizeT), size_of::<libc::size_t>());
    assert_eq!(width(TypeAlias::SsizeT), size_of::<libc::ssize_t>());
    assert_eq!(width(TypeAlias::PidT), size_of::<libc::pid_t>());
    assert_eq!(width(TypeAlias::UidT), size_of::<libc::uid_t>());
    assert_eq!(width(TypeAlias::GidT), size_of::<libc::gid_t>());
    assert_eq!(width(TypeAlias::OffT), size_of::<libc::off_t>());
    assert_eq!(width(TypeAlias::ModeT), size_of::<libc::mode_t>());
    assert_eq!(width(TypeAlias::DevT), size_of::<libc::dev_t>());
    assert_eq!(width(TypeAlias::InoT), size_of::<libc::ino_t>());
    assert_eq!(width(TypeAlias::TimeT), size_of::<libc::time_t>());
    assert_eq!(width(TypeAlias::SocklenT), size_of::<libc::socklen_t>());
}
