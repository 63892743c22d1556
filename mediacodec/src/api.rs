//! The typed operation set a session is driven through.
//!
//! [`crate::ndk::NdkApi`] implements [`CodecApi`] over the resolved NDK
//! function table. Handles are opaque associated types: a session never sees
//! raw pointers, and a handle given back to `delete_*` is consumed.

use std::ffi::CStr;
use std::ptr::NonNull;

use crate::error::MediaStatus;
use crate::ffi;
use crate::surface::NativeWindow;

/// Offset, size, timestamp and flags reported for a dequeued output buffer.
pub type BufferInfo = ffi::AMediaCodecBufferInfo;

/// Memory of a codec-owned buffer, valid until the buffer is queued or released.
#[derive(Debug, Clone, Copy)]
pub struct RawBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl RawBuffer {
    pub fn new(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `len` bytes starting at `offset`, `None` when they do not fit.
    pub fn range(self, offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        if end > self.len {
            return None;
        }
        // in bounds: offset <= self.len
        let ptr = unsafe { self.ptr.add(offset) };
        Some(Self { ptr, len })
    }

    /// # Safety
    ///
    /// The memory must stay valid and unaliased for `'a`.
    pub(crate) unsafe fn as_slice<'a>(self) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// # Safety
    ///
    /// The memory must stay valid for `'a` with no other live reference to it.
    pub(crate) unsafe fn as_mut_slice<'a>(self) -> &'a mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

/// The closed set of codec operations, mirroring the NDK entry points.
///
/// Negative `isize` results of the dequeue calls are the NDK's
/// `AMEDIACODEC_INFO_*` sentinels or error codes, non-negative ones are buffer
/// indices. Timeouts are in microseconds: 0 polls, negative blocks.
pub trait CodecApi {
    type Codec;
    type Format;

    fn create_codec_by_name(&self, name: &CStr) -> Option<Self::Codec>;
    fn delete_codec(&self, codec: Self::Codec) -> MediaStatus;

    fn configure(
        &self,
        codec: &Self::Codec,
        format: &Self::Format,
        window: Option<NativeWindow>,
        flags: u32,
    ) -> MediaStatus;
    fn start(&self, codec: &Self::Codec) -> MediaStatus;
    fn stop(&self, codec: &Self::Codec) -> MediaStatus;
    fn flush(&self, codec: &Self::Codec) -> MediaStatus;
    fn output_format(&self, codec: &Self::Codec) -> Option<Self::Format>;

    fn dequeue_input_buffer(&self, codec: &Self::Codec, timeout_us: i64) -> isize;
    fn input_buffer(&self, codec: &Self::Codec, index: usize) -> Option<RawBuffer>;
    fn queue_input_buffer(
        &self,
        codec: &Self::Codec,
        index: usize,
        offset: usize,
        size: usize,
        pts_us: i64,
        flags: u32,
    ) -> MediaStatus;

    fn dequeue_output_buffer(
        &self,
        codec: &Self::Codec,
        info: &mut BufferInfo,
        timeout_us: i64,
    ) -> isize;
    fn output_buffer(&self, codec: &Self::Codec, index: usize) -> Option<RawBuffer>;
    fn release_output_buffer(&self, codec: &Self::Codec, index: usize, render: bool)
    -> MediaStatus;

    /// `None` when the implementation lacks the entry point.
    fn set_output_surface(&self, codec: &Self::Codec, window: NativeWindow)
    -> Option<MediaStatus>;

    fn new_format(&self) -> Option<Self::Format>;
    fn delete_format(&self, format: Self::Format) -> MediaStatus;
    fn format_set_string(&self, format: &Self::Format, key: &CStr, value: &CStr);
    fn format_set_i32(&self, format: &Self::Format, key: &CStr, value: i32);
    fn format_get_i32(&self, format: &Self::Format, key: &CStr) -> Option<i32>;
}

impl<T: CodecApi + ?Sized> CodecApi for &T {
    type Codec = T::Codec;
    type Format = T::Format;

    fn create_codec_by_name(&self, name: &CStr) -> Option<Self::Codec> {
        (**self).create_codec_by_name(name)
    }

    fn delete_codec(&self, codec: Self::Codec) -> MediaStatus {
        (**self).delete_codec(codec)
    }

    fn configure(
        &self,
        codec: &Self::Codec,
        format: &Self::Format,
        window: Option<NativeWindow>,
        flags: u32,
    ) -> MediaStatus {
        (**self).configure(codec, format, window, flags)
    }

    fn start(&self, codec: &Self::Codec) -> MediaStatus {
        (**self).start(codec)
    }

    fn stop(&self, codec: &Self::Codec) -> MediaStatus {
        (**self).stop(codec)
    }

    fn flush(&self, codec: &Self::Codec) -> MediaStatus {
        (**self).flush(codec)
    }

    fn output_format(&self, codec: &Self::Codec) -> Option<Self::Format> {
        (**self).output_format(codec)
    }

    fn dequeue_input_buffer(&self, codec: &Self::Codec, timeout_us: i64) -> isize {
        (**self).dequeue_input_buffer(codec, timeout_us)
    }

    fn input_buffer(&self, codec: &Self::Codec, index: usize) -> Option<RawBuffer> {
        (**self).input_buffer(codec, index)
    }

    fn queue_input_buffer(
        &self,
        codec: &Self::Codec,
        index: usize,
        offset: usize,
        size: usize,
        pts_us: i64,
        flags: u32,
    ) -> MediaStatus {
        (**self).queue_input_buffer(codec, index, offset, size, pts_us, flags)
    }

    fn dequeue_output_buffer(
        &self,
        codec: &Self::Codec,
        info: &mut BufferInfo,
        timeout_us: i64,
    ) -> isize {
        (**self).dequeue_output_buffer(codec, info, timeout_us)
    }

    fn output_buffer(&self, codec: &Self::Codec, index: usize) -> Option<RawBuffer> {
        (**self).output_buffer(codec, index)
    }

    fn release_output_buffer(
        &self,
        codec: &Self::Codec,
        index: usize,
        render: bool,
    ) -> MediaStatus {
        (**self).release_output_buffer(codec, index, render)
    }

    fn set_output_surface(
        &self,
        codec: &Self::Codec,
        window: NativeWindow,
    ) -> Option<MediaStatus> {
        (**self).set_output_surface(codec, window)
    }

    fn new_format(&self) -> Option<Self::Format> {
        (**self).new_format()
    }

    fn delete_format(&self, format: Self::Format) -> MediaStatus {
        (**self).delete_format(format)
    }

    fn format_set_string(&self, format: &Self::Format, key: &CStr, value: &CStr) {
        (**self).format_set_string(format, key, value)
    }

    fn format_set_i32(&self, format: &Self::Format, key: &CStr, value: i32) {
        (**self).format_set_i32(format, key, value)
    }

    fn format_get_i32(&self, format: &Self::Format, key: &CStr) -> Option<i32> {
        (**self).format_get_i32(format, key)
    }
}
