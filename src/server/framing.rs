//! Viewer wire framing
//!
//! Every message on a viewer connection is one frame:
//!
//! ```text
//! +------+----------------+-------------+
//! | type | length (u32 BE)|   payload   |
//! | 1    | 4              |   length    |
//! +------+----------------+-------------+
//! ```
//!
//! Video and telemetry frames flow to the viewer, control frames flow from
//! it.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Type byte plus length
pub const HEADER_LEN: usize = 5;

/// Frame type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// One access unit
    Video = 0x01,
    /// One JSON telemetry payload
    Telemetry = 0x02,
    /// One control message
    Control = 0x03,
}

impl FrameType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(FrameType::Video),
            0x02 => Some(FrameType::Telemetry),
            0x03 => Some(FrameType::Control),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(frame_type: FrameType, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }

    /// Header and payload in one buffer
    pub fn encode(&self) -> Result<Bytes, TransportError> {
        let head = encode_header(self.frame_type, self.payload.len())?;
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        buf.put_slice(&head);
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }
}

/// Payloads whose length does not fit the u32 field are rejected
fn encode_header(frame_type: FrameType, len: usize) -> Result<[u8; HEADER_LEN], TransportError> {
    let len_field = u32::try_from(len).map_err(|_| TransportError::FrameTooLarge(len))?;
    let [a, b, c, d] = len_field.to_be_bytes();
    Ok([frame_type.as_u8(), a, b, c, d])
}

/// Write one frame; the caller decides when to flush
pub async fn write_frame<W>(
    writer: &mut W,
    frame_type: FrameType,
    payload: &[u8],
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let head = encode_header(frame_type, payload.len())?;
    writer.write_all(&head).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Read one frame
///
/// Returns `None` on a clean end of stream between frames. Frames longer
/// than `max_payload` are rejected before their payload is read.
pub async fn read_frame<R>(reader: &mut R, max_payload: usize) -> Result<Option<Frame>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut head = [0u8; HEADER_LEN];
    match reader.read_exact(&mut head[..1]).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let frame_type = FrameType::from_u8(head[0]).ok_or(TransportError::UnknownFrameType(head[0]))?;
    reader.read_exact(&mut head[1..]).await?;
    let len = u32::from_be_bytes([head[1], head[2], head[3], head[4]]) as usize;
    if len > max_payload {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Frame::new(frame_type, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(FrameType::Control, Bytes::from_static(b"+land"));
        assert_eq!(
            frame.encode().unwrap().to_vec(),
            vec![0x03, 0x00, 0x00, 0x00, 0x05, b'+', b'l', b'a', b'n', b'd']
        );
    }

    #[test]
    fn test_header_length_limit() {
        assert_eq!(
            encode_header(FrameType::Video, u32::MAX as usize).unwrap(),
            [0x01, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_header_rejects_length_beyond_u32() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(
            encode_header(FrameType::Video, len),
            Err(TransportError::FrameTooLarge(n)) if n == len
        ));
    }

    #[tokio::test]
    async fn test_read_frames_then_eof() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[0x03, 0x00, 0x00])
            .read(&[0x00, 0x06, b'+', b'f', b'o'])
            .read(b"rwa")
            .read(&Frame::new(FrameType::Control, Bytes::new()).encode().unwrap())
            .build();

        let first = read_frame(&mut reader, 64).await.unwrap().unwrap();
        assert_eq!(first.frame_type, FrameType::Control);
        assert_eq!(first.payload, Bytes::from_static(b"+forwa"));

        let empty = read_frame(&mut reader, 64).await.unwrap().unwrap();
        assert!(empty.payload.is_empty());

        assert!(read_frame(&mut reader, 64).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_rejected() {
        let mut reader = tokio_test::io::Builder::new().read(&[0x7F]).build();
        assert!(matches!(
            read_frame(&mut reader, 64).await,
            Err(TransportError::UnknownFrameType(0x7F))
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[0x03, 0x00, 0x01, 0x00, 0x00])
            .build();
        assert!(matches!(
            read_frame(&mut reader, 1024).await,
            Err(TransportError::FrameTooLarge(65536))
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_an_error() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[0x03, 0x00, 0x00, 0x00, 0x04, b'+'])
            .build();
        assert!(matches!(
            read_frame(&mut reader, 64).await,
            Err(TransportError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_write_frame() {
        let mut writer = tokio_test::io::Builder::new()
            .write(&[0x02, 0x00, 0x00, 0x00, 0x02])
            .write(b"{}")
            .build();
        write_frame(&mut writer, FrameType::Telemetry, b"{}").await.unwrap();
    }
}
