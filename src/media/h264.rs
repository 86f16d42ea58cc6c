//! H.264 Annex B unit classification
//!
//! Devices deliver H.264 as an Annex B byte stream: every NAL unit is preceded
//! by a start code (a zero run followed by `0x01`). The byte right after the
//! start code is the NAL header:
//!
//! ```text
//! +---+-------+-----------+
//! | F |  NRI  |   Type    |
//! | 1 |   2   |     5     |  bits
//! +---+-------+-----------+
//! ```
//!
//! Only the 5-bit type is used for access unit reassembly.

/// Mask selecting the unit type bits of a NAL header byte
pub const NALU_TYPE_MASK: u8 = 0x1F;

/// NAL unit classes the reassembler distinguishes
///
/// Every other class is carried as [`NaluType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaluType {
    /// Non-IDR slice (class 1)
    Slice,
    /// IDR slice, a keyframe (class 5)
    Idr,
    /// Sequence parameter set (class 7)
    Sps,
    Other(u8),
}

impl NaluType {
    /// Classify a NAL header byte
    pub const fn from_header(header: u8) -> Self {
        match unit_class(header) {
            1 => NaluType::Slice,
            5 => NaluType::Idr,
            7 => NaluType::Sps,
            class => NaluType::Other(class),
        }
    }

    /// Raw 5-bit class value
    pub const fn class(self) -> u8 {
        match self {
            NaluType::Slice => 1,
            NaluType::Idr => 5,
            NaluType::Sps => 7,
            NaluType::Other(class) => class,
        }
    }

    pub fn is_keyframe(self) -> bool {
        self == NaluType::Idr
    }
}

/// Extract the unit class (low 5 bits) from a NAL header byte
#[inline]
pub const fn unit_class(header: u8) -> u8 {
    header & NALU_TYPE_MASK
}

/// Iterator over the NAL header bytes found after start codes in a buffer
///
/// A start code here is `min_zero_run` or more zeros followed by `0x01`.
pub struct NaluHeaders<'a> {
    data: &'a [u8],
    offset: usize,
    min_zero_run: usize,
}

impl<'a> NaluHeaders<'a> {
    pub fn new(data: &'a [u8], min_zero_run: usize) -> Self {
        Self {
            data,
            offset: 0,
            min_zero_run,
        }
    }
}

impl Iterator for NaluHeaders<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        let mut zeros = 0;
        while self.offset < self.data.len() {
            let b = self.data[self.offset];
            self.offset += 1;
            match b {
                0x00 => zeros += 1,
                0x01 if zeros >= self.min_zero_run => {
                    return self.data.get(self.offset).copied();
                }
                _ => zeros = 0,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nalu_type_from_header() {
        assert_eq!(NaluType::from_header(0x65), NaluType::Idr);
        assert_eq!(NaluType::from_header(0x67), NaluType::Sps);
        assert_eq!(NaluType::from_header(0x41), NaluType::Slice);
        assert_eq!(NaluType::from_header(0x68), NaluType::Other(8));
        assert_eq!(NaluType::from_header(0xE5), NaluType::Idr);
    }

    #[test]
    fn test_nalu_type_class() {
        assert_eq!(NaluType::Slice.class(), 1);
        assert_eq!(NaluType::Sps.class(), 7);
        assert_eq!(NaluType::Other(12).class(), 12);
        assert_eq!(unit_class(0x67), 7);
        assert_eq!(unit_class(0xE5), 5);

        for header in 0..=u8::MAX {
            assert_eq!(NaluType::from_header(header).class(), unit_class(header));
        }
    }

    #[test]
    fn test_keyframe() {
        assert!(NaluType::Idr.is_keyframe());
        assert!(!NaluType::Slice.is_keyframe());
        assert!(!NaluType::from_header(0x67).is_keyframe());
    }

    #[test]
    fn test_nalu_headers() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x01, 0x67, 0xAA, // SPS
            0x00, 0x00, 0x00, 0x01, 0x68, 0xBB, // PPS
            0x00, 0x00, 0x00, 0x01, 0x65, 0xCC, // IDR
        ];
        let headers: Vec<u8> = NaluHeaders::new(data, 3).collect();
        assert_eq!(headers, vec![0x67, 0x68, 0x65]);
    }

    #[test]
    fn test_nalu_headers_zero_run_threshold() {
        // Three-byte start code is only seen with a two-zero threshold
        let data: &[u8] = &[0x00, 0x00, 0x01, 0x41, 0x9A];
        assert_eq!(NaluHeaders::new(data, 3).count(), 0);
        assert_eq!(NaluHeaders::new(data, 2).collect::<Vec<_>>(), vec![0x41]);
    }

    #[test]
    fn test_nalu_headers_truncated() {
        let data: &[u8] = &[0x00, 0x00, 0x00, 0x01];
        assert_eq!(NaluHeaders::new(data, 3).count(), 0);
    }
}
