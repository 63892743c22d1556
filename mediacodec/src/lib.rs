#![doc = include_str!("../README.md")]
//!
//! ## Quick Start
//!
//! 1. Describe the session with a [`SessionConfig`]
//! 2. Start it with [`ndk::start_session`] (or [`Session::start`] over any [`CodecApi`])
//! 3. Alternate [`Session::submit_input`] and [`Session::retrieve_output`]
//! 4. Release every [`OutputBuffer`] once consumed
//!
//! ```rust,no_run
//! use mediacodec::{OutputEvent, SessionConfig, Timeout, ndk};
//!
//! let config = SessionConfig::new("c2.android.avc.decoder", "video/avc", 1280, 720);
//! let session = ndk::start_session(&config, None)?;
//!
//! let parameter_sets: &[u8] = &[0, 0, 0, 1, 0x67];
//! session.submit_input(parameter_sets, 0, true, Timeout::NONE)?;
//!
//! loop {
//!     match session.retrieve_output(Timeout::from_micros(10_000))? {
//!         OutputEvent::Data(buffer) => {
//!             let pixels = buffer.payload().unwrap_or_default();
//!             println!("{} bytes at {} us", pixels.len(), buffer.presentation_time_us());
//!             buffer.release(false)?;
//!         }
//!         OutputEvent::FormatChanged(format) => {
//!             println!("now {}x{}", format.width, format.height);
//!         }
//!         OutputEvent::NotReady => break,
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// The operation set sessions are driven through.
pub mod api;
pub mod config;
pub mod error;
/// Raw ABI of the NDK media API.
pub mod ffi;
/// Format keys, session format entries and reported output formats.
pub mod format;
/// The NDK-backed [`CodecApi`].
pub mod ndk;
pub mod resolve;
/// Session lifecycle, input submission and output retrieval.
pub mod session;
pub mod surface;
pub mod timeout;

#[cfg(test)]
mod fake;

pub use api::CodecApi;
pub use config::{FormatValue, SessionConfig};
pub use error::{FlushError, InitError, IoError, MediaStatus, StartError};
pub use format::OutputFormat;
pub use session::{
    InputKind, InputSlot, OutputBuffer, OutputEvent, Session, SessionState, Submission,
};
pub use surface::{NativeWindow, Surface};
pub use timeout::Timeout;
