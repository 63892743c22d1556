//! Raw ABI of the NDK media API (`NdkMediaCodec.h`, `NdkMediaFormat.h`,
//! `NdkMediaError.h`).
//!
//! Nothing here is linked at build time; the function pointer types describe
//! what [`crate::ndk`] resolves from `libmediandk.so` at runtime.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_long};

pub type media_status_t = i32;

pub const AMEDIA_OK: media_status_t = 0;

pub const AMEDIA_ERROR_BASE: media_status_t = -10000;
pub const AMEDIA_ERROR_UNKNOWN: media_status_t = AMEDIA_ERROR_BASE;
pub const AMEDIA_ERROR_MALFORMED: media_status_t = AMEDIA_ERROR_BASE - 1;
pub const AMEDIA_ERROR_UNSUPPORTED: media_status_t = AMEDIA_ERROR_BASE - 2;
pub const AMEDIA_ERROR_INVALID_OBJECT: media_status_t = AMEDIA_ERROR_BASE - 3;
pub const AMEDIA_ERROR_INVALID_PARAMETER: media_status_t = AMEDIA_ERROR_BASE - 4;

pub const AMEDIA_DRM_ERROR_BASE: media_status_t = -20000;

pub const AMEDIACODEC_BUFFER_FLAG_CODEC_CONFIG: u32 = 2;
pub const AMEDIACODEC_BUFFER_FLAG_END_OF_STREAM: u32 = 4;
pub const AMEDIACODEC_CONFIGURE_FLAG_ENCODE: u32 = 1;

pub const AMEDIACODEC_INFO_OUTPUT_BUFFERS_CHANGED: isize = -3;
pub const AMEDIACODEC_INFO_OUTPUT_FORMAT_CHANGED: isize = -2;
pub const AMEDIACODEC_INFO_TRY_AGAIN_LATER: isize = -1;

#[repr(C)]
pub struct AMediaCodec {
    _private: [u8; 0],
}

#[repr(C)]
pub struct AMediaFormat {
    _private: [u8; 0],
}

#[repr(C)]
pub struct AMediaCrypto {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ANativeWindow {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AMediaCodecBufferInfo {
    pub offset: i32,
    pub size: i32,
    pub presentation_time_us: i64,
    pub flags: u32,
}

pub type AMediaCodec_createCodecByName = unsafe extern "C" fn(name: *const c_char) -> *mut AMediaCodec;

pub type AMediaCodec_configure = unsafe extern "C" fn(
    codec: *mut AMediaCodec,
    format: *const AMediaFormat,
    surface: *mut ANativeWindow,
    crypto: *mut AMediaCrypto,
    flags: u32,
) -> media_status_t;

pub type AMediaCodec_start = unsafe extern "C" fn(codec: *mut AMediaCodec) -> media_status_t;

pub type AMediaCodec_stop = unsafe extern "C" fn(codec: *mut AMediaCodec) -> media_status_t;

pub type AMediaCodec_flush = unsafe extern "C" fn(codec: *mut AMediaCodec) -> media_status_t;

pub type AMediaCodec_delete = unsafe extern "C" fn(codec: *mut AMediaCodec) -> media_status_t;

pub type AMediaCodec_getOutputFormat =
    unsafe extern "C" fn(codec: *mut AMediaCodec) -> *mut AMediaFormat;

pub type AMediaCodec_dequeueInputBuffer =
    unsafe extern "C" fn(codec: *mut AMediaCodec, timeout_us: i64) -> isize;

pub type AMediaCodec_getInputBuffer =
    unsafe extern "C" fn(codec: *mut AMediaCodec, idx: usize, out_size: *mut usize) -> *mut u8;

pub type AMediaCodec_queueInputBuffer = unsafe extern "C" fn(
    codec: *mut AMediaCodec,
    idx: usize,
    offset: c_long,
    size: usize,
    time: u64,
    flags: u32,
) -> media_status_t;

pub type AMediaCodec_dequeueOutputBuffer = unsafe extern "C" fn(
    codec: *mut AMediaCodec,
    info: *mut AMediaCodecBufferInfo,
    timeout_us: i64,
) -> isize;

pub type AMediaCodec_getOutputBuffer =
    unsafe extern "C" fn(codec: *mut AMediaCodec, idx: usize, out_size: *mut usize) -> *mut u8;

pub type AMediaCodec_releaseOutputBuffer =
    unsafe extern "C" fn(codec: *mut AMediaCodec, idx: usize, render: bool) -> media_status_t;

pub type AMediaCodec_setOutputSurface =
    unsafe extern "C" fn(codec: *mut AMediaCodec, surface: *mut ANativeWindow) -> media_status_t;

pub type AMediaFormat_new = unsafe extern "C" fn() -> *mut AMediaFormat;

pub type AMediaFormat_delete = unsafe extern "C" fn(format: *mut AMediaFormat) -> media_status_t;

pub type AMediaFormat_setString =
    unsafe extern "C" fn(format: *mut AMediaFormat, name: *const c_char, value: *const c_char);

pub type AMediaFormat_setInt32 =
    unsafe extern "C" fn(format: *mut AMediaFormat, name: *const c_char, value: i32);

pub type AMediaFormat_getInt32 =
    unsafe extern "C" fn(format: *mut AMediaFormat, name: *const c_char, out: *mut i32) -> bool;
