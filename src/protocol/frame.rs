//! Length-prefix framing of datagrams on a byte stream
//!
//! The transport writes each datagram behind a size tag counting the bytes
//! that follow it. Sockets and connection handling live elsewhere; this is
//! only the framing contract.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Datagram, DgSize, SIZE_TAG_LEN};

/// Frame a finished datagram for a stream transport
#[must_use]
pub fn encode_frame(dg: &Datagram) -> Bytes {
    let mut buf = BytesMut::with_capacity(SIZE_TAG_LEN + dg.len());
    // A datagram never exceeds DGSIZE_MAX, so its length always fits.
    let len = DgSize::try_from(dg.len()).unwrap_or(DgSize::MAX);
    buf.put_slice(&len.to_le_bytes());
    buf.put_slice(dg.as_slice());
    buf.freeze()
}

/// Incremental decoder splitting framed datagrams off a receive buffer
#[derive(Debug, Default)]
pub struct FrameDecoder {
    _private: (),
}

impl FrameDecoder {
    /// Create a new frame decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split one complete datagram off the front of `buf`.
    ///
    /// Returns `None` and leaves `buf` untouched until a whole frame has
    /// arrived.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Option<Bytes> {
        if buf.len() < SIZE_TAG_LEN {
            return None;
        }

        let mut tag = [0u8; SIZE_TAG_LEN];
        tag.copy_from_slice(&buf[..SIZE_TAG_LEN]);
        let frame_len = DgSize::from_le_bytes(tag) as usize;

        if buf.len() < SIZE_TAG_LEN + frame_len {
            return None;
        }

        buf.advance(SIZE_TAG_LEN);
        Some(buf.split_to(frame_len).freeze())
    }
}
