//! A single configured codec instance and its buffer exchange.

mod input;
mod output;


use std::cell::Cell;
use std::ffi::CString;

pub use input::{InputKind, InputSlot, Submission};
pub use output::{OutputBuffer, OutputEvent};

use crate::api::CodecApi;
use crate::config::SessionConfig;
use crate::error::{FlushError, IoError, MediaStatus, StartError};
use crate::ffi;
use crate::format::{FormatEntries, OutputFormat};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Configuring,
    Running,
    Stopped,
}

/// An open codec session.
///
/// Buffer tokens ([`InputSlot`], [`OutputBuffer`]) borrow the session, and
/// [`Session::stop`] and [`Session::flush`] take `&mut self`, so no index can
/// outlive the instance that handed it out. Dropping the session stops it.
pub struct Session<A: CodecApi> {
    api: A,
    codec: Option<A::Codec>,
    format: Option<A::Format>,
    started: bool,
    direct_rendering: bool,
    state: SessionState,
    output_format: Cell<Option<OutputFormat>>,
    codec_name: String,
}

impl<A: CodecApi> Session<A> {
    /// Creates, configures and starts a codec instance.
    ///
    /// A `surface` that resolves to a native window selects direct rendering;
    /// otherwise output is exposed in host memory. On failure everything
    /// allocated so far is released before returning.
    pub fn start(
        api: A,
        config: &SessionConfig,
        surface: Option<&dyn Surface>,
    ) -> Result<Self, StartError> {
        let name = CString::new(config.codec_name.as_str())
            .map_err(|_| StartError::InvalidArgument("codec name"))?;
        let entries = FormatEntries::from_config(config)?;

        let mut session = Self {
            api,
            codec: None,
            format: None,
            started: false,
            direct_rendering: false,
            state: SessionState::Configuring,
            output_format: Cell::new(None),
            codec_name: config.codec_name.clone(),
        };

        let Some(codec) = session.api.create_codec_by_name(&name) else {
            log::error!(
                "AMediaCodec.createCodecByName for {} failed",
                config.codec_name
            );
            return Err(StartError::CodecNotFound(config.codec_name.clone()));
        };
        let codec = session.codec.insert(codec);

        let Some(format) = session.api.new_format() else {
            log::error!("AMediaFormat.new failed");
            return Err(StartError::FormatAllocation);
        };
        let format = session.format.insert(format);
        entries.apply(&session.api, format);

        let window = surface.and_then(|surface| surface.native_window());
        let flags = if config.encoder {
            ffi::AMEDIACODEC_CONFIGURE_FLAG_ENCODE
        } else {
            0
        };

        let status = session.api.configure(codec, format, window, flags);
        if !status.is_ok() {
            log::error!("AMediaCodec.configure failed: {status}");
            return Err(StartError::ConfigureFailed(status));
        }

        let status = session.api.start(codec);
        if !status.is_ok() {
            log::error!("AMediaCodec.start failed: {status}");
            return Err(StartError::StartFailed(status));
        }

        session.started = true;
        session.direct_rendering = window.is_some();
        session.state = SessionState::Running;
        log::debug!(
            "MediaCodec {} opened ({} {}x{}, {})",
            session.codec_name,
            config.mime,
            config.width,
            config.height,
            if session.direct_rendering {
                "direct rendering"
            } else {
                "host memory"
            }
        );
        Ok(session)
    }

    /// Stops the codec and releases the instance and its format descriptor.
    ///
    /// Never fails; problems are logged. Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.teardown();
    }

    /// Discards every queued input and pending output.
    pub fn flush(&mut self) -> Result<(), FlushError> {
        let codec = self.running_codec().map_err(|_| FlushError::NotRunning)?;
        let status = self.api.flush(codec);
        if !status.is_ok() {
            log::error!("AMediaCodec.flush failed: {status}");
            return Err(FlushError::Rejected(status));
        }
        log::debug!("MediaCodec {} flushed", self.codec_name);
        Ok(())
    }

    /// Redirects output of a direct-rendering session to another surface.
    pub fn set_output_surface(&mut self, surface: &dyn Surface) -> Result<(), IoError> {
        let codec = self.running_codec()?;
        if !self.direct_rendering {
            return Err(IoError::Unsupported(
                "output surface switch on a host-memory session",
            ));
        }
        let Some(window) = surface.native_window() else {
            return Err(IoError::Unsupported("switching to a surface without a window"));
        };
        match self.api.set_output_surface(codec, window) {
            None => Err(IoError::Unsupported("AMediaCodec.setOutputSurface")),
            Some(status) if !status.is_ok() => {
                log::error!("AMediaCodec.setOutputSurface failed: {status}");
                Err(IoError::SetOutputSurface(status))
            }
            Some(_) => Ok(()),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Output goes to a surface and is never exposed in host memory.
    pub fn direct_rendering(&self) -> bool {
        self.direct_rendering
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The most recent format reported through [`OutputEvent::FormatChanged`].
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format.get()
    }

    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn running_codec(&self) -> Result<&A::Codec, IoError> {
        match (&self.state, &self.codec) {
            (SessionState::Running, Some(codec)) => Ok(codec),
            _ => Err(IoError::NotRunning),
        }
    }

    /// Hands an output index back to the codec.
    fn release_index(&self, index: usize, render: bool) -> Result<(), IoError> {
        let Some(codec) = &self.codec else {
            return Err(IoError::NotRunning);
        };
        let status = self.api.release_output_buffer(codec, index, render);
        if !status.is_ok() {
            log::error!("AMediaCodec.releaseOutputBuffer failed: {status}");
            return Err(IoError::Release(status));
        }
        log::trace!("released output slot {index} (render: {render})");
        Ok(())
    }

    fn teardown(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        self.direct_rendering = false;
        if let Some(codec) = self.codec.take() {
            if self.started {
                warn_on_failure("AMediaCodec.stop", self.api.stop(&codec));
                self.started = false;
            }
            warn_on_failure("AMediaCodec.delete", self.api.delete_codec(codec));
        }
        if let Some(format) = self.format.take() {
            warn_on_failure("AMediaFormat.delete", self.api.delete_format(format));
        }

        self.state = SessionState::Stopped;
        log::debug!("MediaCodec {} closed", self.codec_name);
    }
}

impl<A: CodecApi> Drop for Session<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<A: CodecApi> std::fmt::Debug for Session<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("codec_name", &self.codec_name)
            .field("state", &self.state)
            .field("started", &self.started)
            .field("direct_rendering", &self.direct_rendering)
            .field("output_format", &self.output_format.get())
            .finish_non_exhaustive()
    }
}

fn warn_on_failure(call: &str, status: MediaStatus) {
    if !status.is_ok() {
        log::warn!("{call} failed during teardown: {status}");
    }
}
