//! Growable, overflow-checked datagram buffer
//!
//! A [`Datagram`] is built by appending scalars, length-prefixed strings and
//! blobs, and envelope headers. Every append is checked against
//! [`DGSIZE_MAX`] before any byte is written, so a rejected append leaves the
//! datagram exactly as it was.

use std::collections::BTreeSet;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use super::metrics::{EnvelopeDirection, Metrics};
use super::{
    CHANNEL_LEN, CONTROL_CHANNEL, Channel, DGSIZE_MAX, DatagramIterator, DgSize, DoId, Error,
    MessageType, Result, SIZE_TAG_LEN, Zone,
};

/// Capacity of a freshly created datagram.
pub const INITIAL_CAPACITY: usize = 64;

/// Extra bytes reserved beyond the requested length whenever the buffer grows.
const GROWTH_SLACK: usize = 64;

/// Owned, growable datagram.
///
/// `Clone` produces an independent deep copy; two datagrams never share a
/// mutable backing store. Use [`Datagram::freeze`] to hand the finished bytes
/// to a transport as a cheaply clonable, immutable [`Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    buf: BytesMut,
}

impl Datagram {
    /// Create an empty datagram.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create an empty datagram with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity.min(DGSIZE_MAX)),
        }
    }

    /// Create a datagram holding a copy of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut dg = Self::with_capacity(data.len());
        dg.add_data(data)?;
        Ok(dg)
    }

    /// Create a datagram starting with a single-recipient server header.
    pub fn with_server_header(to: Channel, from: Channel, msg_type: MessageType) -> Result<Self> {
        let mut dg = Self::new();
        dg.add_server_header(to, from, msg_type)?;
        Ok(dg)
    }

    /// Create a datagram starting with a multi-recipient server header.
    pub fn with_multi_header<I>(to: I, from: Channel, msg_type: MessageType) -> Result<Self>
    where
        I: IntoIterator<Item = Channel>,
    {
        let mut dg = Self::new();
        dg.add_multi_header(to, from, msg_type)?;
        Ok(dg)
    }

    /// Create a datagram starting with a control header.
    pub fn with_control_header(msg_type: MessageType) -> Result<Self> {
        let mut dg = Self::new();
        dg.add_control_header(msg_type)?;
        Ok(dg)
    }

    /// Number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes the datagram can hold before it must grow.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Bytes that may still be appended before hitting [`DGSIZE_MAX`].
    #[must_use]
    pub fn available(&self) -> usize {
        DGSIZE_MAX - self.buf.len()
    }

    /// Borrow the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Read the datagram from the start without consuming it.
    #[must_use]
    pub fn iter(&self) -> DatagramIterator<&[u8]> {
        DatagramIterator::new(self.as_slice())
    }

    /// Consume the datagram, returning immutable bytes for delivery.
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Reserve room for `len` more bytes, rejecting the append if it would
    /// exceed the maximum datagram size.
    fn check_add_length(&mut self, len: usize) -> Result<()> {
        let current = self.buf.len();
        let attempted = current.saturating_add(len);
        if attempted > DGSIZE_MAX {
            debug!(current, requested = len, max = DGSIZE_MAX, "rejecting datagram append");
            let err = Error::Overflow {
                attempted,
                max: DGSIZE_MAX,
            };
            Metrics::record_error(err.kind());
            return Err(err);
        }

        if self.buf.capacity() - current < len {
            let additional = (len + GROWTH_SLACK).min(DGSIZE_MAX - current);
            self.buf.reserve(additional);
            trace!(
                len = current,
                requested = len,
                capacity = self.buf.capacity(),
                "grew datagram"
            );
        }
        Ok(())
    }

    /// Convert a byte count into a size tag, rejecting lengths that cannot be
    /// represented.
    fn size_tag(&self, len: usize) -> Result<DgSize> {
        DgSize::try_from(len).map_err(|_| {
            let err = Error::Overflow {
                attempted: self.buf.len().saturating_add(SIZE_TAG_LEN).saturating_add(len),
                max: DGSIZE_MAX,
            };
            Metrics::record_error(err.kind());
            err
        })
    }

    /// Append a boolean as a single `0`/`1` byte.
    pub fn add_bool(&mut self, v: bool) -> Result<()> {
        self.add_u8(u8::from(v))
    }

    /// Append an unsigned 8-bit integer.
    pub fn add_u8(&mut self, v: u8) -> Result<()> {
        self.check_add_length(1)?;
        self.buf.put_u8(v);
        Ok(())
    }

    /// Append a signed 8-bit integer.
    pub fn add_i8(&mut self, v: i8) -> Result<()> {
        self.check_add_length(1)?;
        self.buf.put_i8(v);
        Ok(())
    }

    /// Append an unsigned 16-bit integer.
    pub fn add_u16(&mut self, v: u16) -> Result<()> {
        self.check_add_length(2)?;
        self.buf.put_u16_le(v);
        Ok(())
    }

    /// Append a signed 16-bit integer.
    pub fn add_i16(&mut self, v: i16) -> Result<()> {
        self.check_add_length(2)?;
        self.buf.put_i16_le(v);
        Ok(())
    }

    /// Append an unsigned 32-bit integer.
    pub fn add_u32(&mut self, v: u32) -> Result<()> {
        self.check_add_length(4)?;
        self.buf.put_u32_le(v);
        Ok(())
    }

    /// Append a signed 32-bit integer.
    pub fn add_i32(&mut self, v: i32) -> Result<()> {
        self.check_add_length(4)?;
        self.buf.put_i32_le(v);
        Ok(())
    }

    /// Append an unsigned 64-bit integer.
    pub fn add_u64(&mut self, v: u64) -> Result<()> {
        self.check_add_length(8)?;
        self.buf.put_u64_le(v);
        Ok(())
    }

    /// Append a signed 64-bit integer.
    pub fn add_i64(&mut self, v: i64) -> Result<()> {
        self.check_add_length(8)?;
        self.buf.put_i64_le(v);
        Ok(())
    }

    /// Append an IEEE-754 single-precision float.
    pub fn add_f32(&mut self, v: f32) -> Result<()> {
        self.check_add_length(4)?;
        self.buf.put_f32_le(v);
        Ok(())
    }

    /// Append an IEEE-754 double-precision float.
    pub fn add_f64(&mut self, v: f64) -> Result<()> {
        self.check_add_length(8)?;
        self.buf.put_f64_le(v);
        Ok(())
    }

    /// Append a size tag.
    pub fn add_size(&mut self, len: usize) -> Result<()> {
        let tag = self.size_tag(len)?;
        self.check_add_length(SIZE_TAG_LEN)?;
        self.put_size(tag);
        Ok(())
    }

    fn put_size(&mut self, tag: DgSize) {
        self.buf.put_slice(&tag.to_le_bytes());
    }

    /// Append a channel id.
    pub fn add_channel(&mut self, channel: Channel) -> Result<()> {
        self.add_u64(channel)
    }

    /// Append a distributed object id.
    pub fn add_doid(&mut self, doid: DoId) -> Result<()> {
        self.add_u32(doid)
    }

    /// Append a zone id.
    pub fn add_zone(&mut self, zone: Zone) -> Result<()> {
        self.add_u32(zone)
    }

    /// Append a location (parent object id followed by zone) as one append.
    pub fn add_location(&mut self, parent: DoId, zone: Zone) -> Result<()> {
        self.check_add_length(8)?;
        self.buf.put_u32_le(parent);
        self.buf.put_u32_le(zone);
        Ok(())
    }

    /// Append raw bytes with no length prefix.
    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.check_add_length(data.len())?;
        self.buf.put_slice(data);
        Ok(())
    }

    /// Append the full contents of another datagram.
    pub fn add_datagram(&mut self, other: &Datagram) -> Result<()> {
        self.add_data(other.as_slice())
    }

    /// Append a length-prefixed string. Bytes are written as-is.
    pub fn add_string(&mut self, s: &str) -> Result<()> {
        self.add_blob(s.as_bytes())
    }

    /// Append a length-prefixed blob.
    pub fn add_blob(&mut self, blob: &[u8]) -> Result<()> {
        let tag = self.size_tag(blob.len())?;
        self.check_add_length(SIZE_TAG_LEN + blob.len())?;
        self.put_size(tag);
        self.buf.put_slice(blob);
        Ok(())
    }

    /// Append a header addressed to a single channel.
    ///
    /// `to` may not be [`CONTROL_CHANNEL`]; that address is reserved for
    /// [`Datagram::add_control_header`], whose envelope has no sender.
    pub fn add_server_header(
        &mut self,
        to: Channel,
        from: Channel,
        msg_type: MessageType,
    ) -> Result<()> {
        if to == CONTROL_CHANNEL {
            return Err(reserved_channel());
        }
        self.check_add_length(1 + 2 * CHANNEL_LEN + 2)?;
        self.buf.put_u8(1);
        self.buf.put_u64_le(to);
        self.buf.put_u64_le(from);
        self.buf.put_u16_le(msg_type.as_u16());
        Metrics::record_envelope(EnvelopeDirection::Written, msg_type);
        Ok(())
    }

    /// Append a header addressed to a set of channels.
    ///
    /// Duplicate recipients are collapsed and recipients are written in
    /// ascending order, so equal sets always produce identical bytes. A set
    /// holding only [`CONTROL_CHANNEL`] is rejected like a server header.
    pub fn add_multi_header<I>(&mut self, to: I, from: Channel, msg_type: MessageType) -> Result<()>
    where
        I: IntoIterator<Item = Channel>,
    {
        let recipients: BTreeSet<Channel> = to.into_iter().collect();
        let count = match u8::try_from(recipients.len()) {
            Ok(0) => {
                Metrics::record_error(Error::InvalidRecipientCount(0).kind());
                return Err(Error::InvalidRecipientCount(0));
            }
            Ok(1) if recipients.contains(&CONTROL_CHANNEL) => return Err(reserved_channel()),
            Ok(count) => count,
            Err(_) => {
                let err = Error::TooManyRecipients {
                    count: recipients.len(),
                };
                Metrics::record_error(err.kind());
                return Err(err);
            }
        };

        self.check_add_length(1 + (recipients.len() + 1) * CHANNEL_LEN + 2)?;
        self.buf.put_u8(count);
        for channel in recipients {
            self.buf.put_u64_le(channel);
        }
        self.buf.put_u64_le(from);
        self.buf.put_u16_le(msg_type.as_u16());
        Metrics::record_envelope(EnvelopeDirection::Written, msg_type);
        Ok(())
    }

    /// Append a header addressed to the bus control channel.
    pub fn add_control_header(&mut self, msg_type: MessageType) -> Result<()> {
        self.check_add_length(1 + CHANNEL_LEN + 2)?;
        self.buf.put_u8(1);
        self.buf.put_u64_le(CONTROL_CHANNEL);
        self.buf.put_u16_le(msg_type.as_u16());
        Metrics::record_envelope(EnvelopeDirection::Written, msg_type);
        Ok(())
    }
}

fn reserved_channel() -> Error {
    let err = Error::ReservedChannel(CONTROL_CHANNEL);
    debug!(channel = CONTROL_CHANNEL, "rejecting server header to control channel");
    Metrics::record_error(err.kind());
    err
}

impl Default for Datagram {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for Datagram {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Datagram> for Bytes {
    fn from(dg: Datagram) -> Self {
        dg.freeze()
    }
}

impl TryFrom<&[u8]> for Datagram {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl TryFrom<Vec<u8>> for Datagram {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        if data.len() > DGSIZE_MAX {
            return Err(Error::Overflow {
                attempted: data.len(),
                max: DGSIZE_MAX,
            });
        }
        Ok(Self {
            buf: BytesMut::from(&data[..]),
        })
    }
}

impl TryFrom<&str> for Datagram {
    type Error = Error;

    fn try_from(data: &str) -> Result<Self> {
        Self::from_bytes(data.as_bytes())
    }
}
