//! Access unit reassembly from an unframed Annex B byte stream
//!
//! Bytes arrive in chunks of any size with no alignment to NAL units. The
//! reassembler accumulates them and cuts the buffer in front of every start
//! code whose following NAL header carries a *qualifying* unit class:
//!
//! ```text
//!  stream:  [00 00 00 01 67 ..][00 00 00 01 68 ..][00 00 00 01 65 ..][00 00 00 01 41 ..]
//!               SPS (7)            PPS (8)            IDR (5)            slice (1)
//!           |<------------------ access unit #0 ------------------->|<-- #1 ...
//!           cut before SPS                                          cut before slice
//! ```
//!
//! Parameter sets and SEI are therefore never sent on their own: they stay
//! glued to the picture that follows them. A unit is only emitted once the
//! start of the next one has been seen, because the end of a unit cannot be
//! known any earlier.
//!
//! Input without a single start code degrades to one unbounded buffer that is
//! flushed by [`FrameReassembler::finish`].

use bytes::{Bytes, BytesMut};

use super::frame::AccessUnit;
use super::h264::{unit_class, NaluHeaders, NaluType};

/// Zero bytes required in front of `0x01` to form a start code
pub const DEFAULT_MIN_ZERO_RUN: usize = 3;

/// Unit classes that start a new access unit: non-IDR slice (1) and SPS (7)
///
/// IDR slices (5) are absent: encoders emit them right after
/// SPS/PPS, which already opened the unit.
pub const DEFAULT_QUALIFYING_CLASSES: &[u8] =
    &[NaluType::Slice.class(), NaluType::Sps.class()];

/// Boundary detection knobs
///
/// Fields set directly are floored and masked the same way the builder
/// methods do when a [`FrameReassembler`] is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblerConfig {
    /// Minimum zero run before `0x01` (3 for four-byte start codes, 2 to also
    /// accept three-byte ones)
    pub min_zero_run: usize,

    /// Unit classes (0..=31) that close the accumulated access unit
    pub qualifying_classes: Vec<u8>,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            min_zero_run: DEFAULT_MIN_ZERO_RUN,
            qualifying_classes: DEFAULT_QUALIFYING_CLASSES.to_vec(),
        }
    }
}

impl ReassemblerConfig {
    /// Set the start code zero run (at least 1)
    pub fn min_zero_run(mut self, zeros: usize) -> Self {
        self.min_zero_run = zeros.max(1);
        self
    }

    /// Replace the qualifying class set
    pub fn qualifying_classes(mut self, classes: impl IntoIterator<Item = u8>) -> Self {
        self.qualifying_classes = classes.into_iter().map(unit_class).collect();
        self
    }

    /// Whether a start code followed by `class` closes the current unit
    pub fn is_qualifying(&self, class: u8) -> bool {
        self.qualifying_classes.contains(&class)
    }

    /// Apply the builder's floor and class masking to fields set directly
    fn normalized(mut self) -> Self {
        self.min_zero_run = self.min_zero_run.max(1);
        for class in &mut self.qualifying_classes {
            *class = unit_class(*class);
        }
        self
    }
}

/// Stateful Annex B access unit reassembler
///
/// Single writer: owned by the producer task that feeds it.
#[derive(Debug)]
pub struct FrameReassembler {
    config: ReassemblerConfig,
    /// Bytes of the unit in progress
    buffer: BytesMut,
    /// Next buffer index to examine
    scan_pos: usize,
    /// Consecutive zeros ending right before `scan_pos`
    zeros: usize,
    next_sequence: u64,
}

impl FrameReassembler {
    /// Create a reassembler with the default heuristic
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    /// Create a reassembler with a custom heuristic
    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            config: config.normalized(),
            buffer: BytesMut::new(),
            scan_pos: 0,
            zeros: 0,
            next_sequence: 0,
        }
    }

    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }

    /// Bytes accumulated for the unit in progress
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a chunk and collect every access unit it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AccessUnit> {
        let mut units = Vec::new();
        if chunk.is_empty() {
            return units;
        }
        self.buffer.extend_from_slice(chunk);

        while self.scan_pos < self.buffer.len() {
            match self.buffer[self.scan_pos] {
                0x00 => {
                    self.zeros += 1;
                    self.scan_pos += 1;
                }
                0x01 if self.zeros >= self.config.min_zero_run => {
                    let header_pos = self.scan_pos + 1;
                    let Some(&header) = self.buffer.get(header_pos) else {
                        // Header byte not delivered yet; revisit on next push
                        break;
                    };
                    let marker_start = self.scan_pos - self.config.min_zero_run;
                    self.zeros = 0;

                    if self.config.is_qualifying(unit_class(header))
                        && self.has_payload_before(marker_start)
                    {
                        let data = self.buffer.split_to(marker_start).freeze();
                        units.push(self.emit(data));
                        self.scan_pos = header_pos - marker_start;
                    } else {
                        self.scan_pos = header_pos;
                    }
                }
                _ => {
                    self.zeros = 0;
                    self.scan_pos += 1;
                }
            }
        }

        units
    }

    /// End of stream: flush whatever is buffered as the final unit
    pub fn finish(&mut self) -> Option<AccessUnit> {
        self.scan_pos = 0;
        self.zeros = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let data = self.buffer.split().freeze();
        Some(self.emit(data))
    }

    /// Drop buffered bytes and restart sequence numbering for a new stream
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scan_pos = 0;
        self.zeros = 0;
        self.next_sequence = 0;
    }

    // Leading zero padding alone is not a unit
    fn has_payload_before(&self, end: usize) -> bool {
        self.buffer[..end].iter().any(|&b| b != 0)
    }

    fn emit(&mut self, data: Bytes) -> AccessUnit {
        let keyframe = NaluHeaders::new(&data, self.config.min_zero_run)
            .any(|header| NaluType::from_header(header).is_keyframe());
        let unit = AccessUnit::new(self.next_sequence, data, keyframe);
        self.next_sequence += 1;
        unit
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator of access units over an iterator of chunks
pub struct Reassemble<I> {
    chunks: I,
    reassembler: FrameReassembler,
    ready: std::collections::VecDeque<AccessUnit>,
    finished: bool,
}

impl<I> Iterator for Reassemble<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = AccessUnit;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.ready.pop_front() {
                return Some(unit);
            }
            if self.finished {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.ready.extend(self.reassembler.push(chunk.as_ref())),
                None => {
                    self.finished = true;
                    self.ready.extend(self.reassembler.finish());
                }
            }
        }
    }
}

/// Reassemble a finite sequence of chunks
pub fn reassemble<I>(chunks: I, config: ReassemblerConfig) -> Reassemble<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Reassemble {
        chunks: chunks.into_iter(),
        reassembler: FrameReassembler::with_config(config),
        ready: std::collections::VecDeque::new(),
        finished: false,
    }
}
