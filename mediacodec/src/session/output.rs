use std::ptr;

use crate::api::{BufferInfo, CodecApi, RawBuffer};
use crate::error::IoError;
use crate::ffi;
use crate::format::OutputFormat;
use crate::timeout::Timeout;

use super::Session;

/// One result of [`Session::retrieve_output`].
#[derive(Debug)]
pub enum OutputEvent<'s, A: CodecApi> {
    Data(OutputBuffer<'s, A>),
    FormatChanged(OutputFormat),
    /// Nothing happened within the timeout. Not an error.
    NotReady,
}

/// A dequeued output buffer, owned by the caller until released.
///
/// Consumed by [`OutputBuffer::release`]. Dropped without an explicit release,
/// it is released without rendering.
pub struct OutputBuffer<'s, A: CodecApi> {
    session: &'s Session<A>,
    index: usize,
    presentation_time_us: i64,
    offset: usize,
    len: usize,
    flags: u32,
    payload: Option<RawBuffer>,
    released: bool,
}

impl<'s, A: CodecApi> OutputBuffer<'s, A> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn presentation_time_us(&self) -> i64 {
        self.presentation_time_us
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Payload length; 0 on a direct-rendering session.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.flags & ffi::AMEDIACODEC_BUFFER_FLAG_END_OF_STREAM != 0
    }

    pub fn is_codec_config(&self) -> bool {
        self.flags & ffi::AMEDIACODEC_BUFFER_FLAG_CODEC_CONFIG != 0
    }

    /// Decoded bytes in host memory, `None` on a direct-rendering session.
    pub fn payload(&self) -> Option<&[u8]> {
        // Valid until the index is released, which consumes `self`.
        self.payload.map(|payload| unsafe { payload.as_slice() })
    }

    /// Returns the buffer to the codec, presenting it on the surface if `render`.
    pub fn release(mut self, render: bool) -> Result<(), IoError> {
        self.released = true;
        self.session.release_index(self.index, render)
    }
}

impl<A: CodecApi> Drop for OutputBuffer<'_, A> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.session.release_index(self.index, false);
        }
    }
}

impl<A: CodecApi> std::fmt::Debug for OutputBuffer<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("index", &self.index)
            .field("presentation_time_us", &self.presentation_time_us)
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("flags", &self.flags)
            .field("host_memory", &self.payload.is_some())
            .finish()
    }
}

impl<A: CodecApi> Session<A> {
    /// Dequeues the next output buffer or format change.
    pub fn retrieve_output(&self, timeout: Timeout) -> Result<OutputEvent<'_, A>, IoError> {
        let codec = self.running_codec()?;
        let mut info = BufferInfo::default();

        match self
            .api
            .dequeue_output_buffer(codec, &mut info, timeout.as_micros())
        {
            ffi::AMEDIACODEC_INFO_TRY_AGAIN_LATER => Ok(OutputEvent::NotReady),
            ffi::AMEDIACODEC_INFO_OUTPUT_BUFFERS_CHANGED => {
                log::trace!("output buffers changed");
                Ok(OutputEvent::NotReady)
            }
            ffi::AMEDIACODEC_INFO_OUTPUT_FORMAT_CHANGED => {
                let Some(format) = self.api.output_format(codec) else {
                    log::error!("AMediaCodec.getOutputFormat failed");
                    return Err(IoError::OutputFormatUnavailable);
                };
                let output = OutputFormat::read(&self.api, &format);
                let status = self.api.delete_format(format);
                if !status.is_ok() {
                    log::warn!("AMediaFormat.delete failed for output format: {status}");
                }

                log::debug!(
                    "output format changed: {}x{} stride {} slice height {} color format {}",
                    output.width,
                    output.height,
                    output.stride,
                    output.slice_height,
                    output.pixel_format
                );
                self.output_format.set(Some(output));
                Ok(OutputEvent::FormatChanged(output))
            }
            code if code < 0 => {
                log::error!("AMediaCodec.dequeueOutputBuffer failed: {code}");
                Err(IoError::Dequeue(code))
            }
            index => self.output_data(index as usize, &info).map(OutputEvent::Data),
        }
    }

    /// Releases `buffer`, same as [`OutputBuffer::release`].
    pub fn release_output(&self, buffer: OutputBuffer<'_, A>, render: bool) -> Result<(), IoError> {
        debug_assert!(
            ptr::eq(buffer.session, self),
            "output buffer released on a different session"
        );
        buffer.release(render)
    }

    fn output_data(&self, index: usize, info: &BufferInfo) -> Result<OutputBuffer<'_, A>, IoError> {
        let codec = self.running_codec()?;
        let mut buffer = OutputBuffer {
            session: self,
            index,
            presentation_time_us: info.presentation_time_us,
            offset: 0,
            len: 0,
            flags: info.flags,
            payload: None,
            released: false,
        };

        if self.direct_rendering {
            log::trace!(
                "output slot {index} at {} us (surface)",
                info.presentation_time_us
            );
            return Ok(buffer);
        }

        // An early return drops `buffer`, which releases the index unrendered.
        let Some(memory) = self.api.output_buffer(codec, index) else {
            log::error!("AMediaCodec.getOutputBuffer failed for slot {index}");
            return Err(IoError::OutputBufferUnavailable(index));
        };
        let range = usize::try_from(info.offset)
            .ok()
            .zip(usize::try_from(info.size).ok())
            .and_then(|(offset, size)| Some((offset, memory.range(offset, size)?)));
        let Some((offset, payload)) = range else {
            log::error!(
                "output slot {index} range {}+{} exceeds {} bytes",
                info.offset,
                info.size,
                memory.len()
            );
            return Err(IoError::OutputRange {
                index,
                offset: info.offset,
                size: info.size,
                capacity: memory.len(),
            });
        };

        buffer.offset = offset;
        buffer.len = payload.len();
        buffer.payload = Some(payload);
        log::trace!(
            "output slot {index}: {} bytes at {} us",
            buffer.len,
            buffer.presentation_time_us
        );
        Ok(buffer)
    }
}
