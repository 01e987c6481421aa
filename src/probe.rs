//! Bindings to the C probe library compiled by `build.rs`

use std::ffi::{c_char, c_long, c_void};

extern "C" {
    pub fn probe_mixed_size() -> usize;
    pub fn probe_mixed_value_offset() -> usize;
    pub fn probe_trailing_size() -> usize;
    pub fn probe_outer_size() -> usize;
    pub fn probe_outer_inner_offset() -> usize;
    pub fn probe_outer_ratio_offset() -> usize;
    pub fn probe_union_size() -> usize;
    pub fn probe_packed_size() -> usize;
    pub fn probe_long_size() -> usize;
    pub fn probe_pointer_size() -> usize;

    pub fn probe_swap_int32(out: *mut i32, value: i32) -> i32;
    pub fn probe_negate_long(value: *mut c_long) -> i64;
    pub fn probe_fill_int32(items: *mut i32, count: usize, value: i32) -> usize;
    pub fn probe_sum_terminated(items: *const i32) -> i64;
    pub fn probe_strlen(text: *const c_char) -> i64;
    pub fn probe_is_null(pointer: *const c_void) -> i32;
    pub fn probe_fill_mixed(record: *mut c_void, tag: i8, value: i64);
    pub fn probe_mask_has(mask: i32, bits: i32) -> i32;
}
