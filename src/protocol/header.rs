//! Datagram envelope: recipients, sender and message type
//!
//! Every datagram on the bus starts with an envelope. Its first byte says how
//! many recipient channels follow.

use std::collections::BTreeSet;

use super::metrics::{EnvelopeDirection, Metrics};
use super::{
    CHANNEL_LEN, CONTROL_CHANNEL, Channel, Datagram, DatagramIterator, Error, MessageType, Result,
};

/// Parsed datagram envelope
///
/// # Wire Format
///
/// ```text
/// server:   | count=1 (1) | to (8)          | from (8) | msg_type (2) |
/// multi:    | count=N (1) | to_1 .. to_N (8N)          | from (8) | msg_type (2) |
/// control:  | count=1 (1) | CONTROL_CHANNEL (8)        | msg_type (2) |
/// ```
///
/// All integers are little-endian. Recipients of a multi envelope are written
/// in strictly ascending order, and a repeated or out-of-order id is rejected
/// on read. A set holding one channel is written, and read back, as a server
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Envelope {
    /// Addressed to exactly one channel
    Server {
        /// Recipient channel
        to: Channel,
        /// Sender channel
        from: Channel,
        /// Message type
        msg_type: MessageType,
    },
    /// Addressed to a set of channels
    Multi {
        /// Recipient channels
        to: BTreeSet<Channel>,
        /// Sender channel
        from: Channel,
        /// Message type
        msg_type: MessageType,
    },
    /// Addressed to the bus itself
    Control {
        /// Message type
        msg_type: MessageType,
    },
}

impl Envelope {
    /// Message type carried by the envelope
    #[must_use]
    pub fn msg_type(&self) -> MessageType {
        match self {
            Self::Server { msg_type, .. }
            | Self::Multi { msg_type, .. }
            | Self::Control { msg_type } => *msg_type,
        }
    }

    /// Sender channel; control envelopes carry none
    #[must_use]
    pub fn sender(&self) -> Option<Channel> {
        match self {
            Self::Server { from, .. } | Self::Multi { from, .. } => Some(*from),
            Self::Control { .. } => None,
        }
    }

    /// Recipient channels in wire order
    #[must_use]
    pub fn recipients(&self) -> Vec<Channel> {
        match self {
            Self::Server { to, .. } => vec![*to],
            Self::Multi { to, .. } => to.iter().copied().collect(),
            Self::Control { .. } => vec![CONTROL_CHANNEL],
        }
    }

    /// Check whether this envelope targets the control channel
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Control { .. })
    }

    /// Encoded size in bytes
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Server { .. } => 1 + 2 * CHANNEL_LEN + 2,
            Self::Multi { to, .. } => 1 + (to.len() + 1) * CHANNEL_LEN + 2,
            Self::Control { .. } => 1 + CHANNEL_LEN + 2,
        }
    }

    /// Append this envelope to `dg`
    pub fn write(&self, dg: &mut Datagram) -> Result<()> {
        match self {
            Self::Server { to, from, msg_type } => dg.add_server_header(*to, *from, *msg_type),
            Self::Multi { to, from, msg_type } => {
                dg.add_multi_header(to.iter().copied(), *from, *msg_type)
            }
            Self::Control { msg_type } => dg.add_control_header(*msg_type),
        }
    }

    /// Read an envelope, leaving the cursor untouched on failure
    pub fn read<T: AsRef<[u8]>>(it: &mut DatagramIterator<T>) -> Result<Self> {
        let start = it.tell();
        let result = Self::read_fields(it);
        match &result {
            Ok(envelope) => Metrics::record_envelope(EnvelopeDirection::Read, envelope.msg_type()),
            Err(err) => {
                it.rewind(start);
                if !err.is_underrun() {
                    Metrics::record_error(err.kind());
                }
            }
        }
        result
    }

    fn read_fields<T: AsRef<[u8]>>(it: &mut DatagramIterator<T>) -> Result<Self> {
        let count = it.read_u8()?;
        match count {
            0 => Err(Error::InvalidRecipientCount(0)),
            1 => {
                let to = it.read_channel()?;
                if to == CONTROL_CHANNEL {
                    let msg_type = MessageType::new(it.read_u16()?);
                    return Ok(Self::Control { msg_type });
                }
                let from = it.read_channel()?;
                let msg_type = MessageType::new(it.read_u16()?);
                Ok(Self::Server { to, from, msg_type })
            }
            n => {
                let mut to = BTreeSet::new();
                for _ in 0..n {
                    let channel = it.read_channel()?;
                    // Writers emit strictly ascending ids.
                    if to.last().is_some_and(|&prev| channel <= prev) {
                        return Err(Error::DuplicateRecipient { channel });
                    }
                    to.insert(channel);
                }
                let from = it.read_channel()?;
                let msg_type = MessageType::new(it.read_u16()?);
                Ok(Self::Multi { to, from, msg_type })
            }
        }
    }
}
