//! Datagram and codec error types

use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An append would push a datagram past its maximum size.
    Overflow,
    /// A read would consume more bytes than remain.
    Underrun,
    /// Bytes were present but structurally inconsistent with the schema.
    Malformed,
    /// A typed value does not fit the descriptor it is packed against.
    InvalidValue,
}

/// Datagram, envelope and value codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Append would exceed the maximum datagram size
    #[error("datagram overflow: {attempted} bytes (max {max})")]
    Overflow {
        /// Length the datagram would have reached
        attempted: usize,
        /// Maximum datagram length
        max: usize,
    },

    /// Read past the end of the readable range
    #[error("datagram underrun: need {needed} bytes, {remaining} remaining")]
    Underrun {
        /// Bytes required by the read
        needed: usize,
        /// Bytes left in the readable range
        remaining: usize,
    },

    /// Array elements do not tile the declared byte length
    #[error("malformed array: declared {declared} bytes, elements consumed {consumed}")]
    ArrayMisaligned {
        /// Byte length read from the size tag
        declared: usize,
        /// Bytes consumed before the mismatch was detected
        consumed: usize,
    },

    /// Descriptor is the invalid sentinel
    #[error("invalid type descriptor")]
    InvalidType,

    /// Schema nesting is deeper than the codec will walk
    #[error("schema nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Maximum supported depth
        limit: usize,
    },

    /// Envelope recipient marker was zero
    #[error("invalid recipient count: {0}")]
    InvalidRecipientCount(u8),

    /// Recipient set does not fit in the one-byte marker
    #[error("too many recipients: {count} (max 255)")]
    TooManyRecipients {
        /// Number of recipients requested
        count: usize,
    },

    /// Server envelope addressed to the reserved control channel
    #[error("channel {0} is reserved for control envelopes")]
    ReservedChannel(u64),

    /// Multi envelope recipients are repeated or out of ascending order
    #[error("duplicate or unordered recipient {channel} in envelope")]
    DuplicateRecipient {
        /// Offending channel id
        channel: u64,
    },

    /// Value variant does not match the descriptor kind
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        /// Kind required by the descriptor
        expected: &'static str,
        /// Kind of the supplied value
        found: &'static str,
    },

    /// Numeric value cannot be represented in the descriptor's width
    #[error("value {value} out of range for {kind}")]
    ValueOutOfRange {
        /// Descriptor kind
        kind: &'static str,
        /// Offending value, rendered
        value: String,
    },

    /// Fixed-size value or array has the wrong length
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Length fixed by the descriptor
        expected: usize,
        /// Length of the supplied value
        found: usize,
    },

    /// String body is not valid UTF-8
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string's size tag
        offset: usize,
    },

    /// Message type has no payload layout known to this crate
    #[error("unknown message type: {0}")]
    UnknownMessageType(u16),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::Underrun { .. } => ErrorKind::Underrun,
            Self::ArrayMisaligned { .. }
            | Self::InvalidType
            | Self::NestingTooDeep { .. }
            | Self::InvalidRecipientCount(_)
            | Self::DuplicateRecipient { .. }
            | Self::InvalidUtf8 { .. }
            | Self::UnknownMessageType(_) => ErrorKind::Malformed,
            Self::TooManyRecipients { .. }
            | Self::ReservedChannel(_)
            | Self::ValueMismatch { .. }
            | Self::ValueOutOfRange { .. }
            | Self::LengthMismatch { .. } => ErrorKind::InvalidValue,
        }
    }

    /// Whether this error is an overflow.
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }

    /// Whether this error is an underrun.
    #[must_use]
    pub const fn is_underrun(&self) -> bool {
        matches!(self, Self::Underrun { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::Overflow {
                attempted: 70_000,
                max: 65_535
            }
            .kind(),
            ErrorKind::Overflow
        );
        assert_eq!(
            Error::Underrun {
                needed: 4,
                remaining: 3
            }
            .kind(),
            ErrorKind::Underrun
        );
        assert_eq!(Error::InvalidType.kind(), ErrorKind::Malformed);
        assert_eq!(Error::DuplicateRecipient { channel: 5 }.kind(), ErrorKind::Malformed);
        assert_eq!(Error::ReservedChannel(4001).kind(), ErrorKind::InvalidValue);
        assert_eq!(
            Error::LengthMismatch {
                expected: 3,
                found: 2
            }
            .kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::Underrun {
            needed: 8,
            remaining: 2,
        };
        assert_eq!(
            err.to_string(),
            "datagram underrun: need 8 bytes, 2 remaining"
        );
    }
}
