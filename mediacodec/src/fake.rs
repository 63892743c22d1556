//! Scripted in-memory [`CodecApi`] used by the unit tests.
//!
//! By default it loops input back to output: the first data buffer produces a
//! format change followed by the same bytes as an output buffer.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::ptr::NonNull;

use crate::api::{BufferInfo, CodecApi, RawBuffer};
use crate::error::MediaStatus;
use crate::ffi;
use crate::surface::{NativeWindow, Surface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeValue {
    Int(i32),
    Str(String),
}

#[derive(Debug)]
pub(crate) struct FakeHandle(u32);

#[derive(Debug)]
pub(crate) struct FakeFormat(u32);

/// Something the next output dequeue returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeEvent {
    FormatChanged,
    Buffer {
        data: Vec<u8>,
        offset: i32,
        size: i32,
        pts_us: i64,
        flags: u32,
    },
    Code(isize),
}

impl FakeEvent {
    pub(crate) fn buffer(data: &[u8], pts_us: i64, flags: u32) -> Self {
        FakeEvent::Buffer {
            data: data.to_vec(),
            offset: 0,
            size: data.len() as i32,
            pts_us,
            flags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedInput {
    pub index: usize,
    pub data: Vec<u8>,
    pub pts_us: i64,
    pub flags: u32,
}

#[derive(Debug)]
pub(crate) struct FakeState {
    pub known_codecs: Vec<String>,
    pub input_slots: usize,
    pub input_capacity: usize,
    pub loopback: bool,
    pub has_set_output_surface: bool,
    pub output_format: Vec<(&'static str, i32)>,

    pub fail_format_alloc: bool,
    pub fail_configure: Option<MediaStatus>,
    pub fail_start: Option<MediaStatus>,
    pub fail_flush: Option<MediaStatus>,
    pub fail_queue: Option<MediaStatus>,
    pub fail_release: Option<MediaStatus>,
    pub fail_input_buffer: bool,
    pub fail_output_buffer: bool,
    pub fail_output_format: bool,

    /// Returned by input dequeues before any free slot.
    pub input_codes: VecDeque<isize>,
    pub output_events: VecDeque<FakeEvent>,

    pub codecs_created: usize,
    pub codecs_deleted: usize,
    pub formats_created: usize,
    pub formats_deleted: usize,
    pub starts: usize,
    pub stops: usize,
    pub flushes: usize,
    pub configured_window: Option<NativeWindow>,
    pub configure_flags: Option<u32>,
    pub surface_switches: Vec<NativeWindow>,
    pub input_timeouts: Vec<i64>,
    pub output_timeouts: Vec<i64>,
    pub queued: Vec<QueuedInput>,
    pub released: Vec<(usize, bool)>,

    format_announced: bool,
    next_id: u32,
    live_codecs: Vec<u32>,
    formats: HashMap<u32, HashMap<String, FakeValue>>,
    input_buffers: Vec<Box<[u8]>>,
    free_inputs: VecDeque<usize>,
    output_buffers: HashMap<usize, Box<[u8]>>,
    next_output: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            known_codecs: vec!["c2.fake.avc.decoder".into(), "codec.video.avc".into()],
            input_slots: 2,
            input_capacity: 64,
            loopback: true,
            has_set_output_surface: true,
            output_format: vec![
                ("width", 320),
                ("height", 240),
                ("stride", 320),
                ("slice-height", 240),
                ("color-format", 21),
            ],
            fail_format_alloc: false,
            fail_configure: None,
            fail_start: None,
            fail_flush: None,
            fail_queue: None,
            fail_release: None,
            fail_input_buffer: false,
            fail_output_buffer: false,
            fail_output_format: false,
            input_codes: VecDeque::new(),
            output_events: VecDeque::new(),
            codecs_created: 0,
            codecs_deleted: 0,
            formats_created: 0,
            formats_deleted: 0,
            starts: 0,
            stops: 0,
            flushes: 0,
            configured_window: None,
            configure_flags: None,
            surface_switches: Vec::new(),
            input_timeouts: Vec::new(),
            output_timeouts: Vec::new(),
            queued: Vec::new(),
            released: Vec::new(),
            format_announced: false,
            next_id: 1,
            live_codecs: Vec::new(),
            formats: HashMap::new(),
            input_buffers: Vec::new(),
            free_inputs: VecDeque::new(),
            output_buffers: HashMap::new(),
            next_output: 0,
        }
    }
}

impl FakeState {
    fn new_format_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.formats_created += 1;
        self.formats.insert(id, HashMap::new());
        id
    }

    /// Codec instances created and not yet deleted.
    pub fn live_codecs(&self) -> usize {
        self.live_codecs.len()
    }

    /// Output indices handed out and not yet released.
    pub fn outstanding_outputs(&self) -> usize {
        self.output_buffers.len()
    }

    pub fn free_inputs(&self) -> usize {
        self.free_inputs.len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeCodec {
    state: RefCell<FakeState>,
}

impl FakeCodec {
    pub(crate) fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    pub(crate) fn format_values(&self, format: &FakeFormat) -> HashMap<String, FakeValue> {
        self.state().formats.get(&format.0).cloned().unwrap_or_default()
    }
}

fn status(failure: Option<MediaStatus>) -> MediaStatus {
    failure.unwrap_or(MediaStatus::OK)
}

impl CodecApi for FakeCodec {
    type Codec = FakeHandle;
    type Format = FakeFormat;

    fn create_codec_by_name(&self, name: &CStr) -> Option<FakeHandle> {
        let mut state = self.state_mut();
        let name = name.to_str().ok()?;
        if !state.known_codecs.iter().any(|known| known == name) {
            return None;
        }
        state.codecs_created += 1;
        let id = state.next_id;
        state.next_id += 1;
        state.live_codecs.push(id);
        Some(FakeHandle(id))
    }

    fn delete_codec(&self, codec: FakeHandle) -> MediaStatus {
        let mut state = self.state_mut();
        let Some(pos) = state.live_codecs.iter().position(|&id| id == codec.0) else {
            return MediaStatus::INVALID_PARAMETER;
        };
        state.live_codecs.remove(pos);
        state.codecs_deleted += 1;
        MediaStatus::OK
    }

    fn configure(
        &self,
        _codec: &FakeHandle,
        _format: &FakeFormat,
        window: Option<NativeWindow>,
        flags: u32,
    ) -> MediaStatus {
        let mut state = self.state_mut();
        state.configured_window = window;
        state.configure_flags = Some(flags);
        status(state.fail_configure)
    }

    fn start(&self, _codec: &FakeHandle) -> MediaStatus {
        let mut state = self.state_mut();
        if let Some(failure) = state.fail_start {
            return failure;
        }
        state.starts += 1;
        let slots = state.input_slots;
        let capacity = state.input_capacity;
        state.input_buffers = (0..slots)
            .map(|_| vec![0u8; capacity].into_boxed_slice())
            .collect();
        state.free_inputs = (0..slots).collect();
        MediaStatus::OK
    }

    fn stop(&self, _codec: &FakeHandle) -> MediaStatus {
        self.state_mut().stops += 1;
        MediaStatus::OK
    }

    fn flush(&self, _codec: &FakeHandle) -> MediaStatus {
        let mut state = self.state_mut();
        if let Some(failure) = state.fail_flush {
            return failure;
        }
        state.flushes += 1;
        state.output_events.clear();
        let slots = state.input_buffers.len();
        state.free_inputs = (0..slots).collect();
        MediaStatus::OK
    }

    fn output_format(&self, _codec: &FakeHandle) -> Option<FakeFormat> {
        let mut state = self.state_mut();
        if state.fail_output_format {
            return None;
        }
        let id = state.new_format_id();
        let values = state
            .output_format
            .iter()
            .map(|(key, value)| (key.to_string(), FakeValue::Int(*value)))
            .collect();
        state.formats.insert(id, values);
        Some(FakeFormat(id))
    }

    fn dequeue_input_buffer(&self, _codec: &FakeHandle, timeout_us: i64) -> isize {
        let mut state = self.state_mut();
        state.input_timeouts.push(timeout_us);
        if let Some(code) = state.input_codes.pop_front() {
            return code;
        }
        match state.free_inputs.pop_front() {
            Some(index) => index as isize,
            None => ffi::AMEDIACODEC_INFO_TRY_AGAIN_LATER,
        }
    }

    fn input_buffer(&self, _codec: &FakeHandle, index: usize) -> Option<RawBuffer> {
        let mut state = self.state_mut();
        if state.fail_input_buffer {
            return None;
        }
        let buffer = state.input_buffers.get_mut(index)?;
        let len = buffer.len();
        NonNull::new(buffer.as_mut_ptr()).map(|ptr| RawBuffer::new(ptr, len))
    }

    fn queue_input_buffer(
        &self,
        _codec: &FakeHandle,
        index: usize,
        offset: usize,
        size: usize,
        pts_us: i64,
        flags: u32,
    ) -> MediaStatus {
        let mut state = self.state_mut();
        if let Some(failure) = state.fail_queue {
            return failure;
        }
        let Some(buffer) = state.input_buffers.get(index) else {
            return MediaStatus::INVALID_PARAMETER;
        };
        let Some(data) = buffer.get(offset..offset + size).map(<[u8]>::to_vec) else {
            return MediaStatus::INVALID_PARAMETER;
        };
        state.free_inputs.push_back(index);

        if state.loopback {
            let is_config = flags & ffi::AMEDIACODEC_BUFFER_FLAG_CODEC_CONFIG != 0;
            let is_eos = flags & ffi::AMEDIACODEC_BUFFER_FLAG_END_OF_STREAM != 0;
            if !data.is_empty() && !is_config {
                if !state.format_announced {
                    state.format_announced = true;
                    state.output_events.push_back(FakeEvent::FormatChanged);
                }
                state
                    .output_events
                    .push_back(FakeEvent::buffer(&data, pts_us, flags));
            } else if is_eos {
                state.output_events.push_back(FakeEvent::buffer(&[], pts_us, flags));
            }
        }

        state.queued.push(QueuedInput {
            index,
            data,
            pts_us,
            flags,
        });
        MediaStatus::OK
    }

    fn dequeue_output_buffer(
        &self,
        _codec: &FakeHandle,
        info: &mut BufferInfo,
        timeout_us: i64,
    ) -> isize {
        let mut state = self.state_mut();
        state.output_timeouts.push(timeout_us);
        match state.output_events.pop_front() {
            None => ffi::AMEDIACODEC_INFO_TRY_AGAIN_LATER,
            Some(FakeEvent::FormatChanged) => ffi::AMEDIACODEC_INFO_OUTPUT_FORMAT_CHANGED,
            Some(FakeEvent::Code(code)) => code,
            Some(FakeEvent::Buffer {
                data,
                offset,
                size,
                pts_us,
                flags,
            }) => {
                let index = state.next_output;
                state.next_output += 1;
                state.output_buffers.insert(index, data.into_boxed_slice());
                *info = BufferInfo {
                    offset,
                    size,
                    presentation_time_us: pts_us,
                    flags,
                };
                index as isize
            }
        }
    }

    fn output_buffer(&self, _codec: &FakeHandle, index: usize) -> Option<RawBuffer> {
        let mut state = self.state_mut();
        if state.fail_output_buffer {
            return None;
        }
        let buffer = state.output_buffers.get_mut(&index)?;
        let len = buffer.len();
        NonNull::new(buffer.as_mut_ptr()).map(|ptr| RawBuffer::new(ptr, len))
    }

    fn release_output_buffer(&self, _codec: &FakeHandle, index: usize, render: bool) -> MediaStatus {
        let mut state = self.state_mut();
        if state.output_buffers.remove(&index).is_none() {
            return MediaStatus::INVALID_PARAMETER;
        }
        state.released.push((index, render));
        status(state.fail_release)
    }

    fn set_output_surface(&self, _codec: &FakeHandle, window: NativeWindow) -> Option<MediaStatus> {
        let mut state = self.state_mut();
        if !state.has_set_output_surface {
            return None;
        }
        state.surface_switches.push(window);
        Some(MediaStatus::OK)
    }

    fn new_format(&self) -> Option<FakeFormat> {
        let mut state = self.state_mut();
        if state.fail_format_alloc {
            return None;
        }
        Some(FakeFormat(state.new_format_id()))
    }

    fn delete_format(&self, format: FakeFormat) -> MediaStatus {
        let mut state = self.state_mut();
        state.formats.remove(&format.0);
        state.formats_deleted += 1;
        MediaStatus::OK
    }

    fn format_set_string(&self, format: &FakeFormat, key: &CStr, value: &CStr) {
        let mut state = self.state_mut();
        if let Some(values) = state.formats.get_mut(&format.0) {
            values.insert(
                key.to_string_lossy().into_owned(),
                FakeValue::Str(value.to_string_lossy().into_owned()),
            );
        }
    }

    fn format_set_i32(&self, format: &FakeFormat, key: &CStr, value: i32) {
        let mut state = self.state_mut();
        if let Some(values) = state.formats.get_mut(&format.0) {
            values.insert(key.to_string_lossy().into_owned(), FakeValue::Int(value));
        }
    }

    fn format_get_i32(&self, format: &FakeFormat, key: &CStr) -> Option<i32> {
        let state = self.state();
        match state.formats.get(&format.0)?.get(key.to_str().ok()?)? {
            FakeValue::Int(value) => Some(*value),
            FakeValue::Str(_) => None,
        }
    }
}

/// A surface backed by a made-up window address.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeSurface(pub Option<NativeWindow>);

impl FakeSurface {
    pub(crate) fn window(address: usize) -> Self {
        Self(unsafe { NativeWindow::from_raw(address as *mut std::ffi::c_void) })
    }

    pub(crate) fn detached() -> Self {
        Self(None)
    }
}

impl Surface for FakeSurface {
    fn native_window(&self) -> Option<NativeWindow> {
        self.0
    }
}
