//! Access unit type shared between the reassembler and viewers

use bytes::Bytes;

/// One independently decodable unit of encoded video
///
/// Cheap to clone: `data` is reference counted, so every subscriber of the
/// video broadcaster shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    /// Position of this unit in the stream, starting at 0
    pub sequence: u64,
    /// Annex B bytes, start codes included
    pub data: Bytes,
    /// Whether an IDR slice is present
    pub keyframe: bool,
}

impl AccessUnit {
    /// Create an access unit
    pub fn new(sequence: u64, data: Bytes, keyframe: bool) -> Self {
        Self {
            sequence,
            data,
            keyframe,
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
