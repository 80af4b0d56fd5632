//! Datagram layer: buffer, reader, envelope and message types
//!
//! This module provides the wire format shared by every server on the bus.

mod control;
mod datagram;
mod error;
mod frame;
mod header;
mod iterator;
mod metrics;
mod types;

pub use control::ControlMessage;
pub use datagram::{Datagram, INITIAL_CAPACITY};
pub use error::{Error, ErrorKind, Result};
pub use frame::{FrameDecoder, encode_frame};
pub use header::Envelope;
pub use iterator::DatagramIterator;
pub use metrics::{MetricsSnapshot, metrics_snapshot};
pub use types::{MessageType, Subsystem};

/// Integer type of size tags (lengths of strings, blobs, arrays and frames).
#[cfg(not(feature = "dgsize32"))]
pub type DgSize = u16;

/// Integer type of size tags (lengths of strings, blobs, arrays and frames).
#[cfg(feature = "dgsize32")]
pub type DgSize = u32;

/// Maximum datagram length in bytes
pub const DGSIZE_MAX: usize = DgSize::MAX as usize;

/// Size tag width in bytes
pub const SIZE_TAG_LEN: usize = std::mem::size_of::<DgSize>();

/// Channel identifier
pub type Channel = u64;

/// Distributed object identifier
pub type DoId = u32;

/// Zone identifier
pub type Zone = u32;

/// Channel id width in bytes
pub const CHANNEL_LEN: usize = std::mem::size_of::<Channel>();

/// Reserved channel addressing the bus itself
pub const CONTROL_CHANNEL: Channel = 4001;

/// Object id meaning "no object"
pub const INVALID_DOID: DoId = 0;

/// Zone id meaning "no zone"
pub const INVALID_ZONE: Zone = 0;

pub(crate) fn record_error(err: &Error) {
    metrics::Metrics::record_error(err.kind());
}
