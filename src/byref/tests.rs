use super::*;
use crate::platform::{Cpu, Os, Platform};

fn runtime(os: Os, cpu: Cpu) -> NativeRuntime {
    NativeRuntime::for_platform(Platform::new(os, cpu)).unwrap()
}

fn round_trip<R>(rt: &NativeRuntime, original: R, mut target: R) -> R
where
    R: ByReference,
{
    let mut memory = vec![0u8; original.native_size(rt) + 3];
    original.marshal(rt, &mut memory, 3).unwrap();
    target.unmarshal(rt, &memory, 3).unwrap();
    target
}

fn check_scalar<T: Scalar>(rt: &NativeRuntime, values: &[T]) {
    for &v in values {
        let back = round_trip(rt, ScalarByReference::new(v), ScalarByReference::default());
        assert_eq!(back.get(), v);
    }
}

#[test]
fn test_scalar_round_trips() {
    let rt = runtime(Os::Linux, Cpu::X86_64);
    check_scalar(&rt, &[0i8, i8::MIN, i8::MAX, -1]);
    check_scalar(&rt, &[0u8, u8::MAX]);
    check_scalar(&rt, &[0i16, i16::MIN, i16::MAX, -300]);
    check_scalar(&rt, &[0u16, u16::MAX]);
    check_scalar(&rt, &[0i32, i32::MIN, i32::MAX, -70_000]);
    check_scalar(&rt, &[0u32, u32::MAX]);
    check_scalar(&rt, &[0i64, i64::MIN, i64::MAX, -1]);
    check_scalar(&rt, &[0u64, u64::MAX]);
    check_scalar(&rt, &[0.0f32, f32::MIN, f32::MAX, -1.5]);
    check_scalar(&rt, &[0.0f64, f64::MIN, f64::MAX, -2.25]);
}

#[test]
fn test_native_long_width_follows_data_model() {
    let lp64 = runtime(Os::Linux, Cpu::X86_64);
    let llp64 = runtime(Os::Windows, Cpu::X86_64);
    let value = NativeLongByReference::new(-2);
    assert_eq!(value.native_size(&lp64), 8);
    assert_eq!(value.native_size(&llp64), 4);

    for rt in [&lp64, &llp64] {
        let back = round_trip(rt, value, NativeLongByReference::default());
        assert_eq!(back.get(), -2);
    }

    let wide = NativeLongByReference::new(i64::MAX);
    assert_eq!(round_trip(&lp64, wide, NativeLongByReference::default()).get(), i64::MAX);
    assert_eq!(
        round_trip(&llp64, NativeLongByReference::new(i32::MIN as i64), NativeLongByReference::default()).get(),
        i32::MIN as i64
    );
}

#[test]
fn test_native_long_rejects_values_wider_than_long() {
    let llp64 = runtime(Os::Windows, Cpu::X86_64);
    let mut memory = vec![0u8; 4];
    let err = NativeLongByReference::new(i64::from(i32::MAX) + 1)
        .marshal(&llp64, &mut memory, 0)
        .unwrap_err();
    assert!(matches!(err, MarshalError::IntegerOverflow { width: 4, .. }));
    assert_eq!(memory, vec![0u8; 4]);

    let lp64 = runtime(Os::Linux, Cpu::X86_64);
    let mut memory = vec![0u8; 8];
    NativeLongByReference::new(i64::MIN).marshal(&lp64, &mut memory, 0).unwrap();
}

#[test]
fn test_address_width_follows_data_model() {
    let ilp32 = runtime(Os::Linux, Cpu::I386);
    let address = AddressByReference::new(0xdead_beef);
    assert_eq!(address.native_size(&ilp32), 4);
    assert_eq!(round_trip(&ilp32, address, AddressByReference::default()).get(), 0xdead_beef);

    let lp64 = runtime(Os::Linux, Cpu::Aarch64);
    assert_eq!(address.native_size(&lp64), 8);
    assert_eq!(AddressByReference::default().pointer(), None);
    assert_eq!(address.pointer(), Some(0xdead_beef));
}

#[test]
fn test_null_values_are_rejected() {
    let err = IntByReference::try_from(None).unwrap_err();
    assert!(matches!(err, MarshalError::NullValue(name) if name.contains("ScalarByReference")));

    assert!(NativeLongByReference::try_from(None).is_err());
    assert!(AddressByReference::try_from(None).is_err());

    let mut value = IntByReference::try_from(Some(5)).unwrap();
    assert!(value.assign(None).is_err());
    assert_eq!(value.get(), 5);
    value.assign(Some(6)).unwrap();
    assert_eq!(value.get(), 6);
}

#[test]
fn test_marshal_out_of_bounds() {
    let rt = runtime(Os::Linux, Cpu::X86_64);
    let mut memory = vec![0u8; 4];
    let value = LongLongByReference::new(1);
    assert!(matches!(
        value.marshal(&rt, &mut memory, 0),
        Err(MarshalError::OutOfBounds { len: 8, size: 4, .. })
    ));
}
