use std::fmt;

use crate::ffi;

/// A `media_status_t` returned by the codec service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaStatus(pub ffi::media_status_t);

impl MediaStatus {
    pub const OK: Self = Self(ffi::AMEDIA_OK);
    pub const UNKNOWN: Self = Self(ffi::AMEDIA_ERROR_UNKNOWN);
    pub const INVALID_PARAMETER: Self = Self(ffi::AMEDIA_ERROR_INVALID_PARAMETER);

    pub fn is_ok(self) -> bool {
        self.0 == ffi::AMEDIA_OK
    }

    fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            ffi::AMEDIA_OK => "AMEDIA_OK",
            ffi::AMEDIA_ERROR_UNKNOWN => "AMEDIA_ERROR_UNKNOWN",
            ffi::AMEDIA_ERROR_MALFORMED => "AMEDIA_ERROR_MALFORMED",
            ffi::AMEDIA_ERROR_UNSUPPORTED => "AMEDIA_ERROR_UNSUPPORTED",
            ffi::AMEDIA_ERROR_INVALID_OBJECT => "AMEDIA_ERROR_INVALID_OBJECT",
            ffi::AMEDIA_ERROR_INVALID_PARAMETER => "AMEDIA_ERROR_INVALID_PARAMETER",
            code if code <= ffi::AMEDIA_DRM_ERROR_BASE => "AMEDIA_DRM_ERROR",
            _ => return None,
        })
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Resolving the codec library failed. Permanent for the life of the process.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Cannot load codec library {library}: {reason}")]
    LibraryUnavailable { library: String, reason: String },

    #[error("Required entry point {name} is missing: {reason}")]
    MissingSymbol { name: &'static str, reason: String },
}

/// A session never became usable. Everything it allocated is already released.
#[derive(thiserror::Error, Debug)]
pub enum StartError {
    #[error("Hardware codec unavailable: {0}")]
    Unavailable(#[from] InitError),

    #[error("Invalid {0}: contains an interior NUL byte")]
    InvalidArgument(&'static str),

    #[error("AMediaCodec.createCodecByName for {0} failed")]
    CodecNotFound(String),

    #[error("AMediaFormat.new failed")]
    FormatAllocation,

    #[error("AMediaCodec.configure failed: {0}")]
    ConfigureFailed(MediaStatus),

    #[error("AMediaCodec.start failed: {0}")]
    StartFailed(MediaStatus),
}

/// A single buffer operation failed. Other dequeued buffers are unaffected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    #[error("Session is not running")]
    NotRunning,

    #[error("Dequeue failed with code {0}")]
    Dequeue(isize),

    #[error("AMediaCodec.getInputBuffer failed for slot {0}")]
    InputBufferUnavailable(usize),

    #[error("AMediaCodec.getOutputBuffer failed for slot {0}")]
    OutputBufferUnavailable(usize),

    #[error(
        "Output slot {index} reports range offset {offset}, size {size} outside its {capacity} bytes"
    )]
    OutputRange {
        index: usize,
        offset: i32,
        size: i32,
        capacity: usize,
    },

    #[error("AMediaCodec.getOutputFormat returned no format")]
    OutputFormatUnavailable,

    #[error("AMediaCodec.queueInputBuffer failed: {0}")]
    Queue(MediaStatus),

    #[error("AMediaCodec.releaseOutputBuffer failed: {0}")]
    Release(MediaStatus),

    #[error("AMediaCodec.setOutputSurface failed: {0}")]
    SetOutputSurface(MediaStatus),

    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FlushError {
    #[error("Session is not running")]
    NotRunning,

    #[error("AMediaCodec.flush failed: {0}")]
    Rejected(MediaStatus),
}

#[test]
fn media_status_display() {
    assert_eq!(MediaStatus::OK.to_string(), "AMEDIA_OK (0)");
    assert_eq!(
        MediaStatus(ffi::AMEDIA_ERROR_INVALID_OBJECT).to_string(),
        "AMEDIA_ERROR_INVALID_OBJECT (-10003)"
    );
    assert_eq!(MediaStatus(-20004).to_string(), "AMEDIA_DRM_ERROR (-20004)");
    assert_eq!(MediaStatus(-7).to_string(), "status -7");
    assert!(!MediaStatus::UNKNOWN.is_ok());
}
