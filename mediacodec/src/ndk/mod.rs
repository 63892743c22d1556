//! [`CodecApi`] over the Android NDK media library, resolved at runtime.
//!
//! ```rust,no_run
//! use mediacodec::{SessionConfig, ndk};
//!
//! let config = SessionConfig::new("OMX.google.h264.decoder", "video/avc", 1920, 1080);
//! let session = ndk::start_session(&config, None)?;
//! assert!(!session.direct_rendering());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod symbols;

use std::ffi::{CStr, OsStr, c_long};
use std::ptr::{self, NonNull};

use libloading::Library;

use crate::api::{BufferInfo, CodecApi, RawBuffer};
use crate::error::{InitError, MediaStatus, StartError};
use crate::resolve::{self, EntryPoint, EntryStatus, Resolver, SymbolTable};
use crate::session::Session;
use crate::surface::{NativeWindow, Surface};
use crate::{SessionConfig, ffi};

use symbols::NdkSymbols;

/// Well-known name of the platform codec library.
pub const LIBRARY_NAME: &str = "libmediandk.so";

static NDK: Resolver<NdkApi> = Resolver::new();

/// An `AMediaCodec*` owned by a session.
#[derive(Debug)]
pub struct NdkCodec(NonNull<ffi::AMediaCodec>);

/// An `AMediaFormat*` owned by a session.
#[derive(Debug)]
pub struct NdkFormat(NonNull<ffi::AMediaFormat>);

// The NDK objects may be used from any thread as long as calls are serialized,
// which `&mut`/`!Sync` session access guarantees.
unsafe impl Send for NdkCodec {}
unsafe impl Send for NdkFormat {}

/// The resolved NDK function table together with the library that exports it.
pub struct NdkApi {
    symbols: NdkSymbols,
    _library: Library,
}

impl std::fmt::Debug for NdkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdkApi")
            .field(
                "set_output_surface",
                &self.symbols.set_output_surface.is_some(),
            )
            .finish_non_exhaustive()
    }
}

impl NdkApi {
    /// The process-wide table, resolved from [`LIBRARY_NAME`] on first use.
    ///
    /// Exactly one resolution attempt is made per process, whatever the number
    /// of concurrent callers; a failure is cached like a success and every
    /// later call reports it again.
    pub fn get() -> Result<&'static NdkApi, InitError> {
        NDK.get_or_resolve(|| Self::load(LIBRARY_NAME))
            .inspect_err(|err| log::error!("MediaCodec NDK init failed: {err}"))
    }

    /// Resolves a private table from an explicit library path.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, InitError> {
        let (library, symbols) = unsafe { resolve::load_table::<NdkSymbols>(path) }?;
        log::debug!(
            "MediaCodec NDK resolved (setOutputSurface: {})",
            if symbols.set_output_surface.is_some() {
                "available"
            } else {
                "unavailable"
            }
        );
        Ok(Self {
            symbols,
            _library: library,
        })
    }

    /// Whether `AMediaCodec_setOutputSurface` was found.
    pub fn supports_output_surface_switch(&self) -> bool {
        self.symbols.set_output_surface.is_some()
    }
}

/// Entry points a usable codec library must (or may) export.
pub fn entry_points() -> &'static [EntryPoint] {
    NdkSymbols::ENTRY_POINTS
}

/// Reports, per declared entry point, whether the library at `path` exports it.
pub fn probe(path: impl AsRef<OsStr>) -> Result<Vec<EntryStatus>, InitError> {
    resolve::probe::<NdkSymbols>(path)
}

/// Starts a session on the process-wide table.
pub fn start_session(
    config: &SessionConfig,
    surface: Option<&dyn Surface>,
) -> Result<Session<&'static NdkApi>, StartError> {
    let api = NdkApi::get()?;
    Session::start(api, config, surface)
}

impl CodecApi for NdkApi {
    type Codec = NdkCodec;
    type Format = NdkFormat;

    fn create_codec_by_name(&self, name: &CStr) -> Option<NdkCodec> {
        NonNull::new(unsafe { (self.symbols.create_codec_by_name)(name.as_ptr()) }).map(NdkCodec)
    }

    fn delete_codec(&self, codec: NdkCodec) -> MediaStatus {
        MediaStatus(unsafe { (self.symbols.delete)(codec.0.as_ptr()) })
    }

    fn configure(
        &self,
        codec: &NdkCodec,
        format: &NdkFormat,
        window: Option<NativeWindow>,
        flags: u32,
    ) -> MediaStatus {
        let window = window.map_or(ptr::null_mut(), NativeWindow::as_ptr);
        MediaStatus(unsafe {
            (self.symbols.configure)(
                codec.0.as_ptr(),
                format.0.as_ptr(),
                window,
                ptr::null_mut(),
                flags,
            )
        })
    }

    fn start(&self, codec: &NdkCodec) -> MediaStatus {
        MediaStatus(unsafe { (self.symbols.start)(codec.0.as_ptr()) })
    }

    fn stop(&self, codec: &NdkCodec) -> MediaStatus {
        MediaStatus(unsafe { (self.symbols.stop)(codec.0.as_ptr()) })
    }

    fn flush(&self, codec: &NdkCodec) -> MediaStatus {
        MediaStatus(unsafe { (self.symbols.flush)(codec.0.as_ptr()) })
    }

    fn output_format(&self, codec: &NdkCodec) -> Option<NdkFormat> {
        NonNull::new(unsafe { (self.symbols.get_output_format)(codec.0.as_ptr()) }).map(NdkFormat)
    }

    fn dequeue_input_buffer(&self, codec: &NdkCodec, timeout_us: i64) -> isize {
        unsafe { (self.symbols.dequeue_input_buffer)(codec.0.as_ptr(), timeout_us) }
    }

    fn input_buffer(&self, codec: &NdkCodec, index: usize) -> Option<RawBuffer> {
        let mut size = 0usize;
        let ptr = unsafe { (self.symbols.get_input_buffer)(codec.0.as_ptr(), index, &mut size) };
        NonNull::new(ptr).map(|ptr| RawBuffer::new(ptr, size))
    }

    fn queue_input_buffer(
        &self,
        codec: &NdkCodec,
        index: usize,
        offset: usize,
        size: usize,
        pts_us: i64,
        flags: u32,
    ) -> MediaStatus {
        MediaStatus(unsafe {
            (self.symbols.queue_input_buffer)(
                codec.0.as_ptr(),
                index,
                offset as c_long,
                size,
                pts_us as u64,
                flags,
            )
        })
    }

    fn dequeue_output_buffer(
        &self,
        codec: &NdkCodec,
        info: &mut BufferInfo,
        timeout_us: i64,
    ) -> isize {
        unsafe { (self.symbols.dequeue_output_buffer)(codec.0.as_ptr(), info, timeout_us) }
    }

    fn output_buffer(&self, codec: &NdkCodec, index: usize) -> Option<RawBuffer> {
        let mut size = 0usize;
        let ptr = unsafe { (self.symbols.get_output_buffer)(codec.0.as_ptr(), index, &mut size) };
        NonNull::new(ptr).map(|ptr| RawBuffer::new(ptr, size))
    }

    fn release_output_buffer(&self, codec: &NdkCodec, index: usize, render: bool) -> MediaStatus {
        MediaStatus(unsafe {
            (self.symbols.release_output_buffer)(codec.0.as_ptr(), index, render)
        })
    }

    fn set_output_surface(&self, codec: &NdkCodec, window: NativeWindow) -> Option<MediaStatus> {
        let set_output_surface = self.symbols.set_output_surface?;
        Some(MediaStatus(unsafe {
            set_output_surface(codec.0.as_ptr(), window.as_ptr())
        }))
    }

    fn new_format(&self) -> Option<NdkFormat> {
        NonNull::new(unsafe { (self.symbols.format_new)() }).map(NdkFormat)
    }

    fn delete_format(&self, format: NdkFormat) -> MediaStatus {
        MediaStatus(unsafe { (self.symbols.format_delete)(format.0.as_ptr()) })
    }

    fn format_set_string(&self, format: &NdkFormat, key: &CStr, value: &CStr) {
        unsafe { (self.symbols.format_set_string)(format.0.as_ptr(), key.as_ptr(), value.as_ptr()) }
    }

    fn format_set_i32(&self, format: &NdkFormat, key: &CStr, value: i32) {
        unsafe { (self.symbols.format_set_int32)(format.0.as_ptr(), key.as_ptr(), value) }
    }

    fn format_get_i32(&self, format: &NdkFormat, key: &CStr) -> Option<i32> {
        let mut out = 0i32;
        let found =
            unsafe { (self.symbols.format_get_int32)(format.0.as_ptr(), key.as_ptr(), &mut out) };
        found.then_some(out)
    }
}

#[test]
fn missing_library_fails_load() {
    let err = NdkApi::load("libmediandk-missing-for-test.so").unwrap_err();
    assert!(matches!(err, InitError::LibraryUnavailable { .. }));
    assert!(probe("libmediandk-missing-for-test.so").is_err());
}
