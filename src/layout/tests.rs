use super::*;
use crate::byref::ByReference;
use crate::memory::{NativeMemory, NativeMemoryExt};
use crate::platform::{Cpu, Os, Platform};
use strum::{AsRefStr, EnumIter};

fn runtime(os: Os, cpu: Cpu) -> NativeRuntime {
    NativeRuntime::for_platform(Platform::new(os, cpu)).unwrap()
}

fn lp64() -> NativeRuntime {
    runtime(Os::Linux, Cpu::X86_64)
}

#[test]
fn test_small_field_before_wide_field() {
    let mut layout = StructLayout::new(&lp64());
    assert_eq!(layout.add_field(8, 8, None).unwrap(), 0);
    assert_eq!(layout.add_field(64, 64, None).unwrap(), 8);
    assert_eq!(layout.finalize().unwrap(), 16);
    assert_eq!(layout.alignment(), 8);
}

#[test]
fn test_trailing_padding_to_widest_alignment() {
    let mut layout = StructLayout::new(&lp64());
    layout.add_field(32, 32, None).unwrap();
    layout.add_field(8, 8, None).unwrap();
    assert_eq!(layout.finalize().unwrap(), 8);
}

#[test]
fn test_explicit_offset_leaves_cursor_alone() {
    let mut layout = StructLayout::new(&lp64());
    assert_eq!(layout.add_field(32, 32, None).unwrap(), 0);
    assert_eq!(layout.add_field(8, 8, Some(Offset(12))).unwrap(), 12);
    assert_eq!(layout.add_field(32, 32, None).unwrap(), 4);
    assert_eq!(layout.finalize().unwrap(), 16);
    assert!(layout.fields()[1].explicit);
}

#[test]
fn test_declaring_after_finalize_fails() {
    let mut layout = StructLayout::new(&lp64());
    layout.add_field(16, 16, None).unwrap();
    assert_eq!(layout.finalize().unwrap(), 2);
    assert_eq!(layout.finalize().unwrap(), 2);

    assert!(matches!(layout.add_field(8, 8, None), Err(MarshalError::LayoutSealed)));
    assert!(matches!(layout.add_type(NativeType::SInt), Err(MarshalError::LayoutSealed)));
    assert_eq!(layout.fields().len(), 1);
}

#[test]
fn test_malformed_declarations() {
    let mut layout = StructLayout::new(&lp64());
    assert!(matches!(layout.add_field(12, 8, None), Err(MarshalError::InvalidField(_))));
    assert!(matches!(layout.add_field(8, 24, None), Err(MarshalError::InvalidField(_))));
    assert!(matches!(layout.add_field(8, 0, None), Err(MarshalError::InvalidField(_))));
    assert!(matches!(layout.add_type(NativeType::Void), Err(MarshalError::InvalidField(_))));
    assert!(StructLayout::new(&lp64()).packed(3).is_err());
    assert!(matches!(layout.size(), Err(MarshalError::LayoutNotSealed)));
}

#[test]
fn test_overflowing_declarations_are_malformed() {
    let mut layout = StructLayout::new(&lp64());
    assert!(matches!(
        layout.add_field(32, 32, Some(Offset(usize::MAX - 1))),
        Err(MarshalError::InvalidField(_))
    ));

    layout.add_field(8, 8, None).unwrap();
    assert!(matches!(layout.utf8_string(usize::MAX), Err(MarshalError::InvalidField(_))));
    assert!(matches!(
        layout.add_array(usize::MAX / 2, 16, 16),
        Err(MarshalError::InvalidField(_))
    ));

    let mut cursor = StructLayout::new(&lp64());
    cursor.add_field(8, 8, Some(Offset(0))).unwrap();
    cursor.add_array(usize::MAX - 4, 8, 8).unwrap();
    assert!(matches!(cursor.add_field(32, 32, None), Err(MarshalError::InvalidField(_))));

    // Failed declarations leave the layout usable
    assert_eq!(layout.add_field(32, 32, None).unwrap(), 4);
    assert_eq!(layout.finalize().unwrap(), 8);
}

#[test]
fn test_union_members_overlap() {
    let mut layout = StructLayout::union(&lp64());
    assert_eq!(layout.add_type(NativeType::UChar).unwrap(), 0);
    assert_eq!(layout.add_type(NativeType::Double).unwrap(), 0);
    assert_eq!(layout.add_type(NativeType::SInt).unwrap(), 0);
    assert_eq!(layout.finalize().unwrap(), 8);
}

#[test]
fn test_array_in_union_is_contiguous() {
    let mut layout = StructLayout::union(&lp64());
    layout.add_type(NativeType::SShort).unwrap();
    assert_eq!(layout.add_array(3, 32, 32).unwrap(), 0);
    assert_eq!(layout.finalize().unwrap(), 12);
}

#[test]
fn test_packing_clamps_alignment() {
    let mut layout = StructLayout::new(&lp64()).packed(1).unwrap();
    assert_eq!(layout.add_type(NativeType::UChar).unwrap(), 0);
    assert_eq!(layout.add_type(NativeType::SLongLong).unwrap(), 1);
    assert_eq!(layout.finalize().unwrap(), 9);

    let mut layout = StructLayout::new(&lp64()).packed(2).unwrap();
    layout.add_type(NativeType::UChar).unwrap();
    assert_eq!(layout.add_type(NativeType::SInt).unwrap(), 2);
    assert_eq!(layout.finalize().unwrap(), 6);
}

#[test]
fn test_padding_members() {
    let mut layout = StructLayout::new(&lp64());
    layout.add_type(NativeType::UChar).unwrap();
    assert_eq!(layout.add_padding(NativeType::UChar, 3).unwrap(), 1);
    assert_eq!(layout.add_type(NativeType::UChar).unwrap(), 4);
    assert_eq!(layout.finalize().unwrap(), 5);
}

#[test]
fn test_inner_layout_uses_its_alignment() {
    let rt = lp64();
    let mut inner = StructLayout::new(&rt);
    inner.add_type(NativeType::UChar).unwrap();
    inner.add_type(NativeType::SInt).unwrap();

    let mut outer = StructLayout::new(&rt);
    outer.add_type(NativeType::UChar).unwrap();
    assert!(matches!(outer.add_inner(&inner), Err(MarshalError::LayoutNotSealed)));

    assert_eq!(inner.finalize().unwrap(), 8);
    assert_eq!(outer.add_inner(&inner).unwrap(), 4);
    assert_eq!(outer.finalize().unwrap(), 12);
}

#[test]
fn test_i386_aligns_64_bit_members_on_four() {
    let rt = runtime(Os::Linux, Cpu::I386);
    let mut layout = StructLayout::new(&rt);
    layout.add_type(NativeType::SInt).unwrap();
    assert_eq!(layout.add_type(NativeType::SLongLong).unwrap(), 4);
    assert_eq!(layout.add_type(NativeType::Address).unwrap(), 12);
    assert_eq!(layout.finalize().unwrap(), 16);
}

#[test]
fn test_alias_members_follow_platform_tables() {
    let mut arm = StructLayout::new(&runtime(Os::Linux, Cpu::Arm));
    arm.add_type(NativeType::UChar).unwrap();
    assert_eq!(arm.add_alias(TypeAlias::DevT).unwrap(), 8);
    assert_eq!(arm.finalize().unwrap(), 16);

    let mut i386 = StructLayout::new(&runtime(Os::Linux, Cpu::I386));
    i386.add_type(NativeType::UChar).unwrap();
    assert_eq!(i386.add_alias(TypeAlias::SizeT).unwrap(), 4);
    assert_eq!(i386.finalize().unwrap(), 8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
enum Mode {
    Idle,
    Busy,
    UnknownNativeValue,
}

impl crate::enums::NativeEnum for Mode {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
enum Broken {
    A,
    B,
}

impl crate::enums::NativeEnum for Broken {
    fn explicit_value(self) -> Option<i64> {
        matches!(self, Broken::A).then_some(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
enum Wide {
    Small,
    Large,
}

impl crate::enums::NativeEnum for Wide {
    fn explicit_value(self) -> Option<i64> {
        Some(match self {
            Wide::Small => 1,
            Wide::Large => 1 << 40,
        })
    }
}

#[test]
fn test_typed_fields_read_and_write() {
    let rt = lp64();
    let mut layout = StructLayout::new(&rt);
    let id = layout.scalar::<u16>().unwrap();
    let count = layout.native_long().unwrap();
    let next = layout.address().unwrap();
    let pid = layout.alias(TypeAlias::PidT).unwrap();
    let mode = layout.enumeration::<Mode>().unwrap();
    let name = layout.utf8_string(8).unwrap();
    let tag = layout.ascii_string(4).unwrap();
    let ratio = layout.scalar::<f64>().unwrap();

    assert_eq!(id.offset(), 0);
    assert_eq!(count.offset(), 8);
    assert_eq!(next.offset(), 16);
    assert_eq!(pid.offset(), 24);
    assert_eq!(mode.offset(), 28);
    assert_eq!(name.offset(), 32);
    assert_eq!(tag.offset(), 40);
    assert_eq!(ratio.offset(), 48);

    let layout = layout.into_shared().unwrap();
    assert_eq!(layout.size().unwrap(), 56);

    let mut value = StructValue::new(Arc::clone(&layout)).unwrap();
    id.set(&mut value, 0xbeef).unwrap();
    count.set(&mut value, -5).unwrap();
    next.set(&mut value, 0x1000).unwrap();
    pid.set(&mut value, -1).unwrap();
    mode.set(&mut value, Mode::Busy).unwrap();
    name.set(&mut value, "héllo").unwrap();
    tag.set(&mut value, "abc").unwrap();
    ratio.set(&mut value, 0.25).unwrap();

    assert_eq!(id.get(&value).unwrap(), 0xbeef);
    assert_eq!(count.get(&value).unwrap(), -5);
    assert_eq!(next.get(&value).unwrap(), 0x1000);
    assert_eq!(pid.get(&value).unwrap(), -1);
    assert_eq!(mode.get(&value).unwrap(), Mode::Busy);
    assert_eq!(name.get(&value).unwrap(), "héllo");
    assert_eq!(tag.get(&value).unwrap(), "abc");
    assert_eq!(ratio.get(&value).unwrap(), 0.25);

    // Unmapped enum values fall back to the sentinel
    value.put::<i32>(mode.offset(), 99).unwrap();
    assert_eq!(mode.get(&value).unwrap(), Mode::UnknownNativeValue);
}

#[test]
fn test_enum_value_wider_than_int_is_rejected() {
    let mut layout = StructLayout::new(&lp64());
    let wide = layout.enumeration::<Wide>().unwrap();
    let mut value = StructValue::new(layout.into_shared().unwrap()).unwrap();

    wide.set(&mut value, Wide::Small).unwrap();
    assert!(matches!(
        wide.set(&mut value, Wide::Large),
        Err(MarshalError::InvalidEnum { .. })
    ));
    assert_eq!(wide.get(&value).unwrap(), Wide::Small);
}

#[test]
fn test_native_long_member_rejects_values_wider_than_long() {
    let mut layout = StructLayout::new(&runtime(Os::Windows, Cpu::X86_64));
    let count = layout.native_long().unwrap();
    let mut value = StructValue::new(layout.into_shared().unwrap()).unwrap();

    count.set(&mut value, i64::from(i32::MIN)).unwrap();
    assert!(matches!(
        count.set(&mut value, 1 << 33),
        Err(MarshalError::IntegerOverflow { value: 0x2_0000_0000, width: 4 })
    ));
    assert_eq!(count.get(&value).unwrap(), i64::from(i32::MIN));
}

#[test]
fn test_broken_enum_fails_while_building_layout() {
    let mut layout = StructLayout::new(&lp64());
    let err = layout.enumeration::<Broken>().unwrap_err();
    assert!(err.is_configuration());
    assert!(layout.fields().is_empty());
}

#[test]
fn test_text_members_decode_strictly() {
    let rt = lp64();
    let mut layout = StructLayout::new(&rt);
    let name = layout.utf8_string(4).unwrap();
    let tag = layout.ascii_string(4).unwrap();
    let mut value = StructValue::new(layout.into_shared().unwrap()).unwrap();

    value.write_bytes(name.offset(), &[0x61, 0xff, 0xfe, 0]).unwrap();
    assert!(matches!(name.get(&value), Err(MarshalError::Decode(_))));

    value.write_bytes(tag.offset(), &[0x61, 0xe9, 0, 0]).unwrap();
    assert!(matches!(
        tag.get(&value),
        Err(MarshalError::NonAscii { byte: 0xe9, position: 1 })
    ));
    assert!(matches!(tag.set(&mut value, "é"), Err(MarshalError::NonAscii { .. })));

    // The terminator must fit
    assert!(matches!(name.set(&mut value, "four"), Err(MarshalError::OutOfBounds { .. })));
    name.set(&mut value, "abc").unwrap();
    assert_eq!(name.get(&value).unwrap(), "abc");
}

#[test]
fn test_binding_requires_sealed_layout() {
    let mut layout = StructLayout::new(&lp64());
    layout.add_type(NativeType::SInt).unwrap();
    let err = StructValue::new(Arc::new(layout)).unwrap_err();
    assert!(matches!(err, MarshalError::LayoutNotSealed));
}

#[test]
fn test_inner_field_copies_nested_record() {
    let rt = lp64();
    let mut point = StructLayout::new(&rt);
    let x = point.scalar::<i32>().unwrap();
    let y = point.scalar::<i32>().unwrap();
    let point = point.into_shared().unwrap();

    let mut line = StructLayout::new(&rt);
    let flags = line.scalar::<u8>().unwrap();
    let end = line.inner(Arc::clone(&point)).unwrap();
    let line = line.into_shared().unwrap();
    assert_eq!(end.offset(), 4);
    assert_eq!(line.size().unwrap(), 12);

    let mut p = StructValue::new(point).unwrap();
    x.set(&mut p, 3).unwrap();
    y.set(&mut p, -4).unwrap();

    let mut l = StructValue::new(line).unwrap();
    flags.set(&mut l, 1).unwrap();
    end.set(&mut l, &p).unwrap();

    let copy = end.get(&l).unwrap();
    assert_eq!(x.get(&copy).unwrap(), 3);
    assert_eq!(y.get(&copy).unwrap(), -4);
}

#[test]
fn test_struct_value_by_reference() {
    let rt = lp64();
    let mut layout = StructLayout::new(&rt);
    let a = layout.scalar::<i32>().unwrap();
    let b = layout.scalar::<i64>().unwrap();
    let mut value = StructValue::new(layout.into_shared().unwrap()).unwrap();
    a.set(&mut value, 7).unwrap();
    b.set(&mut value, -9).unwrap();

    assert_eq!(value.native_size(&rt), 16);
    let mut scratch = vec![0u8; 24];
    value.marshal(&rt, &mut scratch, 8).unwrap();
    assert_eq!(scratch.get::<i32>(8).unwrap(), 7);

    scratch.put::<i64>(16, 42).unwrap();
    value.unmarshal(&rt, &scratch, 8).unwrap();
    assert_eq!(b.get(&value).unwrap(), 42);

    let copy = value.try_clone().unwrap();
    assert_ne!(copy.address(), value.address());
    assert_eq!(copy.as_bytes(), value.as_bytes());
}

#[test]
fn test_host_layouts_match_c_compiler() {
    use crate::probe::*;

    let host = NativeRuntime::host().unwrap();
    assert_eq!(host.address_size(), unsafe { probe_pointer_size() });

    let mut mixed = StructLayout::new(&host);
    mixed.add_type(NativeType::SChar).unwrap();
    let value = mixed.add_type(NativeType::SLongLong).unwrap();
    assert_eq!(value, unsafe { probe_mixed_value_offset() });
    assert_eq!(mixed.finalize().unwrap(), unsafe { probe_mixed_size() });

    let mut trailing = StructLayout::new(&host);
    trailing.add_type(NativeType::SLongLong).unwrap();
    trailing.add_type(NativeType::SChar).unwrap();
    assert_eq!(trailing.finalize().unwrap(), unsafe { probe_trailing_size() });

    let mut inner = StructLayout::new(&host);
    inner.add_type(NativeType::SShort).unwrap();
    inner.add_type(NativeType::SInt).unwrap();
    inner.add_type(NativeType::SShort).unwrap();
    inner.finalize().unwrap();

    let mut outer = StructLayout::new(&host);
    outer.add_type(NativeType::SChar).unwrap();
    let inner_offset = outer.add_inner(&inner).unwrap();
    let ratio = outer.add_type(NativeType::Double).unwrap();
    assert_eq!(inner_offset, unsafe { probe_outer_inner_offset() });
    assert_eq!(ratio, unsafe { probe_outer_ratio_offset() });
    assert_eq!(outer.finalize().unwrap(), unsafe { probe_outer_size() });

    let mut union = StructLayout::union(&host);
    union.add_type(NativeType::SChar).unwrap();
    union.add_type(NativeType::SInt).unwrap();
    union.add_type(NativeType::Double).unwrap();
    assert_eq!(union.finalize().unwrap(), unsafe { probe_union_size() });

    let mut packed = StructLayout::new(&host).packed(1).unwrap();
    packed.add_type(NativeType::SChar).unwrap();
    packed.add_type(NativeType::SLongLong).unwrap();
    assert_eq!(packed.finalize().unwrap(), unsafe { probe_packed_size() });
}
