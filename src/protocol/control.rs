//! Bus administrative messages sent to the control channel
//!
//! Their meaning belongs to the router; this module only fixes their
//! payload shapes so producers and the router agree on bytes.

use bytes::Bytes;

use super::{Channel, Datagram, DatagramIterator, Envelope, Error, MessageType, Result};

/// A control message addressed to [`CONTROL_CHANNEL`](super::CONTROL_CHANNEL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Subscribe to a channel
    AddChannel(Channel),
    /// Unsubscribe from a channel
    RemoveChannel(Channel),
    /// Subscribe to every channel in `low..=high`
    AddRange {
        /// First channel of the range
        low: Channel,
        /// Last channel of the range
        high: Channel,
    },
    /// Unsubscribe from every channel in `low..=high`
    RemoveRange {
        /// First channel of the range
        low: Channel,
        /// Last channel of the range
        high: Channel,
    },
    /// Datagram the router sends on this connection's behalf once it drops
    AddPostRemove(Bytes),
    /// Discard every registered post-remove datagram
    ClearPostRemoves,
    /// Human readable connection name
    SetConName(String),
    /// Connection URL for diagnostics
    SetConUrl(String),
    /// Opaque log record
    LogMessage(Bytes),
}

impl ControlMessage {
    /// Message type used on the wire
    #[must_use]
    pub fn msg_type(&self) -> MessageType {
        match self {
            Self::AddChannel(_) => MessageType::CONTROL_ADD_CHANNEL,
            Self::RemoveChannel(_) => MessageType::CONTROL_REMOVE_CHANNEL,
            Self::AddRange { .. } => MessageType::CONTROL_ADD_RANGE,
            Self::RemoveRange { .. } => MessageType::CONTROL_REMOVE_RANGE,
            Self::AddPostRemove(_) => MessageType::CONTROL_ADD_POST_REMOVE,
            Self::ClearPostRemoves => MessageType::CONTROL_CLEAR_POST_REMOVES,
            Self::SetConName(_) => MessageType::CONTROL_SET_CON_NAME,
            Self::SetConUrl(_) => MessageType::CONTROL_SET_CON_URL,
            Self::LogMessage(_) => MessageType::CONTROL_LOG_MESSAGE,
        }
    }

    /// Build the complete control datagram
    pub fn to_datagram(&self) -> Result<Datagram> {
        let mut dg = Datagram::with_control_header(self.msg_type())?;
        match self {
            Self::AddChannel(channel) | Self::RemoveChannel(channel) => {
                dg.add_channel(*channel)?;
            }
            Self::AddRange { low, high } | Self::RemoveRange { low, high } => {
                dg.add_channel(*low)?;
                dg.add_channel(*high)?;
            }
            Self::AddPostRemove(data) | Self::LogMessage(data) => dg.add_blob(data)?,
            Self::ClearPostRemoves => {}
            Self::SetConName(text) | Self::SetConUrl(text) => dg.add_string(text)?,
        }
        Ok(dg)
    }

    /// Register `post` to be routed when the connection drops
    pub fn add_post_remove(post: &Datagram) -> Self {
        Self::AddPostRemove(Bytes::copy_from_slice(post.as_slice()))
    }

    /// Parse the payload following a control envelope of type `msg_type`
    pub fn read_payload<T: AsRef<[u8]>>(
        msg_type: MessageType,
        it: &mut DatagramIterator<T>,
    ) -> Result<Self> {
        let message = match msg_type {
            MessageType::CONTROL_ADD_CHANNEL => Self::AddChannel(it.read_channel()?),
            MessageType::CONTROL_REMOVE_CHANNEL => Self::RemoveChannel(it.read_channel()?),
            MessageType::CONTROL_ADD_RANGE => Self::AddRange {
                low: it.read_channel()?,
                high: it.read_channel()?,
            },
            MessageType::CONTROL_REMOVE_RANGE => Self::RemoveRange {
                low: it.read_channel()?,
                high: it.read_channel()?,
            },
            MessageType::CONTROL_ADD_POST_REMOVE => {
                Self::AddPostRemove(Bytes::copy_from_slice(it.read_blob()?))
            }
            MessageType::CONTROL_CLEAR_POST_REMOVES => Self::ClearPostRemoves,
            MessageType::CONTROL_SET_CON_NAME => Self::SetConName(it.read_string()?.to_owned()),
            MessageType::CONTROL_SET_CON_URL => Self::SetConUrl(it.read_string()?.to_owned()),
            MessageType::CONTROL_LOG_MESSAGE => {
                Self::LogMessage(Bytes::copy_from_slice(it.read_blob()?))
            }
            other => return Err(Error::UnknownMessageType(other.as_u16())),
        };
        Ok(message)
    }

    /// Parse a complete control datagram, envelope included
    pub fn read<T: AsRef<[u8]>>(it: &mut DatagramIterator<T>) -> Result<Self> {
        let start = it.tell();
        let result = match it.read_envelope()? {
            Envelope::Control { msg_type } => Self::read_payload(msg_type, it),
            other => Err(Error::UnknownMessageType(other.msg_type().as_u16())),
        };
        if result.is_err() {
            it.rewind(start);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: &ControlMessage) -> ControlMessage {
        let dg = message.to_datagram().unwrap();
        let mut it = dg.iter();
        let decoded = ControlMessage::read(&mut it).unwrap();
        assert!(it.is_empty());
        decoded
    }

    #[test]
    fn test_every_control_message_roundtrips() {
        let mut post = Datagram::with_server_header(4000, 12, MessageType::new(2032)).unwrap();
        post.add_doid(4000).unwrap();

        let messages = [
            ControlMessage::AddChannel(5),
            ControlMessage::RemoveChannel(5),
            ControlMessage::AddRange { low: 100, high: 199 },
            ControlMessage::RemoveRange { low: 100, high: 199 },
            ControlMessage::add_post_remove(&post),
            ControlMessage::ClearPostRemoves,
            ControlMessage::SetConName("AI shard 1".to_owned()),
            ControlMessage::SetConUrl("tcp://10.0.0.4:7199".to_owned()),
            ControlMessage::LogMessage(Bytes::from_static(b"\x01\x02")),
        ];

        for message in &messages {
            assert_eq!(&roundtrip(message), message);
        }
    }

    #[test]
    fn test_add_channel_layout() {
        let dg = ControlMessage::AddChannel(0x0102).to_datagram().unwrap();
        let bytes = dg.as_slice();

        assert_eq!(bytes.len(), 1 + 8 + 2 + 8);
        assert_eq!(&bytes[9..11], &9000u16.to_le_bytes());
        assert_eq!(&bytes[11..19], &0x0102u64.to_le_bytes());
    }

    #[test]
    fn test_non_control_envelope_rejected() {
        let dg = Datagram::with_server_header(1, 2, MessageType::new(2020)).unwrap();
        let mut it = dg.iter();
        assert_eq!(
            ControlMessage::read(&mut it),
            Err(Error::UnknownMessageType(2020))
        );
        assert_eq!(it.tell(), 0);
    }

    #[test]
    fn test_unknown_control_type_rejected() {
        let dg = Datagram::with_control_header(MessageType::new(9500)).unwrap();
        assert_eq!(
            ControlMessage::read(&mut dg.iter()),
            Err(Error::UnknownMessageType(9500))
        );
    }
}
