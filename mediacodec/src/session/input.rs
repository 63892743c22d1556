use crate::api::{CodecApi, RawBuffer};
use crate::error::IoError;
use crate::ffi;
use crate::timeout::Timeout;

use super::Session;

/// Outcome of [`Session::submit_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Queued `len` bytes, the input clipped to the slot capacity.
    Submitted { len: usize },
    /// No input slot became free within the timeout.
    NotReady,
}

/// What a queued input buffer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Data,
    /// Out-of-band configuration such as parameter sets.
    CodecConfig,
    EndOfStream,
}

impl InputKind {
    pub fn flags(self) -> u32 {
        match self {
            InputKind::Data => 0,
            InputKind::CodecConfig => ffi::AMEDIACODEC_BUFFER_FLAG_CODEC_CONFIG,
            InputKind::EndOfStream => ffi::AMEDIACODEC_BUFFER_FLAG_END_OF_STREAM,
        }
    }
}

/// A writable input buffer dequeued from the codec.
///
/// Consumed by [`InputSlot::queue`]. Dropped without queueing, it goes back
/// to the codec as an empty buffer.
pub struct InputSlot<'s, A: CodecApi> {
    session: &'s Session<A>,
    index: usize,
    buffer: RawBuffer,
    queued: bool,
}

impl<'s, A: CodecApi> InputSlot<'s, A> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        // The codec owns the memory and does not touch it until the index is
        // queued, which consumes `self`.
        unsafe { self.buffer.as_mut_slice() }
    }

    /// Copies as much of `data` as fits to the start of the buffer.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.capacity());
        self.buffer_mut()[..len].copy_from_slice(&data[..len]);
        len
    }

    /// Hands the first `len` bytes to the codec. `len` is clipped to the capacity.
    pub fn queue(mut self, len: usize, pts_us: i64, kind: InputKind) -> Result<(), IoError> {
        self.queued = true;
        let len = len.min(self.capacity());
        self.session.queue_index(self.index, len, pts_us, kind.flags())
    }
}

impl<A: CodecApi> Drop for InputSlot<'_, A> {
    fn drop(&mut self) {
        if !self.queued {
            log::debug!("input slot {} dropped unused", self.index);
            let _ = self.session.queue_index(self.index, 0, 0, 0);
        }
    }
}

impl<A: CodecApi> std::fmt::Debug for InputSlot<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSlot")
            .field("index", &self.index)
            .field("capacity", &self.buffer.len())
            .finish()
    }
}

impl<A: CodecApi> Session<A> {
    /// Dequeues a writable input slot, `None` if none freed up in time.
    pub fn dequeue_input(&self, timeout: Timeout) -> Result<Option<InputSlot<'_, A>>, IoError> {
        let codec = self.running_codec()?;
        let index = match self.api.dequeue_input_buffer(codec, timeout.as_micros()) {
            ffi::AMEDIACODEC_INFO_TRY_AGAIN_LATER => return Ok(None),
            code if code < 0 => {
                log::error!("AMediaCodec.dequeueInputBuffer failed: {code}");
                return Err(IoError::Dequeue(code));
            }
            index => index as usize,
        };

        let Some(buffer) = self.api.input_buffer(codec, index) else {
            log::error!("AMediaCodec.getInputBuffer failed for slot {index}");
            let _ = self.queue_index(index, 0, 0, 0);
            return Err(IoError::InputBufferUnavailable(index));
        };

        Ok(Some(InputSlot {
            session: self,
            index,
            buffer,
            queued: false,
        }))
    }

    /// Copies `data` into a free input slot and queues it.
    ///
    /// Data larger than the slot is clipped; the queued length is reported in
    /// [`Submission::Submitted`].
    pub fn submit_input(
        &self,
        data: &[u8],
        pts_us: i64,
        is_config: bool,
        timeout: Timeout,
    ) -> Result<Submission, IoError> {
        let Some(mut slot) = self.dequeue_input(timeout)? else {
            return Ok(Submission::NotReady);
        };

        let len = slot.write(data);
        if len < data.len() {
            log::debug!(
                "input of {} bytes truncated to slot {} capacity {len}",
                data.len(),
                slot.index()
            );
        }

        let kind = if is_config {
            InputKind::CodecConfig
        } else {
            InputKind::Data
        };
        slot.queue(len, pts_us, kind)?;
        Ok(Submission::Submitted { len })
    }

    /// Queues an empty buffer flagged end-of-stream.
    pub fn submit_end_of_stream(&self, pts_us: i64, timeout: Timeout) -> Result<Submission, IoError> {
        let Some(slot) = self.dequeue_input(timeout)? else {
            return Ok(Submission::NotReady);
        };
        slot.queue(0, pts_us, InputKind::EndOfStream)?;
        log::debug!("end of stream queued at {pts_us} us");
        Ok(Submission::Submitted { len: 0 })
    }

    fn queue_index(&self, index: usize, len: usize, pts_us: i64, flags: u32) -> Result<(), IoError> {
        let Some(codec) = &self.codec else {
            return Err(IoError::NotRunning);
        };
        let status = self
            .api
            .queue_input_buffer(codec, index, 0, len, pts_us, flags);
        if !status.is_ok() {
            log::error!("AMediaCodec.queueInputBuffer failed: {status}");
            return Err(IoError::Queue(status));
        }
        log::trace!("queued input slot {index}: {len} bytes at {pts_us} us, flags {flags:#x}");
        Ok(())
    }
}
