use std::collections::VecDeque;
use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader};

const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Elementary stream syntax, selected from the session mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Avc,
    Hevc,
}

impl StreamKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "video/avc" => Some(StreamKind::Avc),
            "video/hevc" => Some(StreamKind::Hevc),
            _ => None,
        }
    }
}

/// What a NAL unit means for access unit boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalClass {
    AccessUnitDelimiter,
    ParameterSet,
    PrefixSei,
    Slice { first_in_picture: bool },
    Other,
}

/// Classifies a NAL unit (without start code) from its header and, for
/// slices, the first bit of the slice header.
pub fn classify(kind: StreamKind, nal: &[u8]) -> std::io::Result<NalClass> {
    let mut reader = BitReader::<_, BigEndian>::new(Cursor::new(nal));
    let _forbidden_zero = reader.read_bit()?;

    let class = match kind {
        StreamKind::Avc => {
            let _nal_ref_idc: u8 = reader.read_var(2)?;
            let nal_unit_type: u8 = reader.read_var(5)?;
            match nal_unit_type {
                // first_mb_in_slice is ue(v): 0 exactly when its first bit is set
                1 | 5 => NalClass::Slice {
                    first_in_picture: reader.read_bit()?,
                },
                2..=4 => NalClass::Slice {
                    first_in_picture: false,
                },
                6 => NalClass::PrefixSei,
                7 | 8 | 13 | 15 => NalClass::ParameterSet,
                9 => NalClass::AccessUnitDelimiter,
                _ => NalClass::Other,
            }
        }
        StreamKind::Hevc => {
            let nal_unit_type: u8 = reader.read_var(6)?;
            let _nuh_layer_id: u8 = reader.read_var(6)?;
            let _temporal_id_plus1: u8 = reader.read_var(3)?;
            match nal_unit_type {
                0..=9 | 16..=21 => NalClass::Slice {
                    first_in_picture: reader.read_bit()?,
                },
                32..=34 => NalClass::ParameterSet,
                35 => NalClass::AccessUnitDelimiter,
                39 => NalClass::PrefixSei,
                _ => NalClass::Other,
            }
        }
    };
    Ok(class)
}

/// One access unit in Annex-B form (4-byte start codes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    pub data: Vec<u8>,
    /// Holds parameter sets only, to be submitted as codec config.
    pub config: bool,
}

#[derive(Debug, Default)]
struct PendingUnit {
    data: Vec<u8>,
    has_vcl: bool,
    has_other: bool,
}

impl PendingUnit {
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn parameter_sets_only(&self) -> bool {
        !self.is_empty() && !self.has_vcl && !self.has_other
    }

    fn push(&mut self, nal: &[u8]) {
        self.data.extend_from_slice(&START_CODE);
        self.data.extend_from_slice(nal);
    }
}

/// Splits an Annex-B byte stream into access units.
///
/// Units become available through the iterator once the start of the next
/// unit has been seen; [`AccessUnitSplitter::finish`] releases the last one.
#[derive(Debug)]
pub struct AccessUnitSplitter {
    kind: StreamKind,
    buffer: Vec<u8>,
    scanned: usize,
    nal_start: Option<usize>,
    current: PendingUnit,
    ready: VecDeque<AccessUnit>,
    malformed: usize,
}

impl AccessUnitSplitter {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            buffer: Vec::with_capacity(1 << 20),
            scanned: 0,
            nal_start: None,
            current: PendingUnit::default(),
            ready: VecDeque::new(),
            malformed: 0,
        }
    }

    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.scan();
    }

    /// Ends the stream: the last NAL and the unit holding it become available.
    pub fn finish(&mut self) {
        if let Some(start) = self.nal_start.take() {
            let nal = std::mem::take(&mut self.buffer);
            self.handle_nal(&nal[start..]);
        }
        self.buffer.clear();
        self.scanned = 0;
        self.flush_unit();
    }

    /// NAL units whose header could not be read.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn scan(&mut self) {
        while let Some(code) = find_start_code(&self.buffer, self.scanned) {
            if let Some(start) = self.nal_start {
                let nal = self.buffer[start..code].to_vec();
                self.handle_nal(&nal);
            }
            self.nal_start = Some(code + 3);
            self.scanned = code + 3;
        }

        // keep the two bytes a split start code could begin with
        let consumed = match self.nal_start {
            Some(start) => start,
            None => self.buffer.len().saturating_sub(2),
        };
        self.buffer.drain(..consumed);
        self.scanned = self
            .buffer
            .len()
            .saturating_sub(2)
            .max(self.scanned.saturating_sub(consumed));
        self.nal_start = self.nal_start.map(|start| start - consumed);
    }

    fn handle_nal(&mut self, nal: &[u8]) {
        let end = nal.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
        let nal = &nal[..end];
        if nal.is_empty() {
            return;
        }

        let class = match classify(self.kind, nal) {
            Ok(class) => class,
            Err(e) => {
                log::warn!("Skipping malformed NAL unit of {} bytes: {e}", nal.len());
                self.malformed += 1;
                return;
            }
        };

        match class {
            NalClass::AccessUnitDelimiter => {
                self.flush_unit();
                return;
            }
            NalClass::ParameterSet => {
                if self.current.has_vcl {
                    self.flush_unit();
                }
            }
            NalClass::PrefixSei => {
                if self.current.has_vcl || self.current.parameter_sets_only() {
                    self.flush_unit();
                }
                self.current.has_other = true;
            }
            NalClass::Slice { first_in_picture } => {
                if self.current.parameter_sets_only() || (first_in_picture && self.current.has_vcl)
                {
                    self.flush_unit();
                }
                self.current.has_vcl = true;
            }
            NalClass::Other => {
                if self.current.parameter_sets_only() {
                    self.flush_unit();
                }
                self.current.has_other = true;
            }
        }
        self.current.push(nal);
    }

    fn flush_unit(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let config = self.current.parameter_sets_only();
        let unit = std::mem::take(&mut self.current);
        self.ready.push_back(AccessUnit {
            data: unit.data,
            config,
        });
    }
}

impl Iterator for AccessUnitSplitter {
    type Item = AccessUnit;

    fn next(&mut self) -> Option<Self::Item> {
        self.ready.pop_front()
    }
}

/// Position of the next `00 00 01` at or after `from`.
fn find_start_code(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(3)
        .position(|w| w == [0, 0, 1])
        .map(|pos| from + pos)
}
