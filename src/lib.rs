//! chanwire - Channel-addressed datagrams for distributed object servers
//!
//! This library provides the wire layer shared by the servers of a
//! distributed object cluster: a growable datagram buffer, a bounds-checked
//! reader, the envelope that routes a datagram to one or more channels, and a
//! schema-driven codec that packs, unpacks and renders typed values.
//!
//! # Quick Start
//!
//! ```rust
//! use chanwire::{Datagram, Envelope, MessageType};
//!
//! // Address a datagram to channel 5 from channel 3
//! let mut dg = Datagram::with_server_header(5, 3, MessageType::STATESERVER_OBJECT_SET_FIELD)?;
//! dg.add_doid(1000)?;
//! dg.add_string("hello")?;
//!
//! // Read it back
//! let mut it = dg.iter();
//! let envelope = it.read_envelope()?;
//! assert_eq!(envelope.recipients(), vec![5]);
//! assert_eq!(it.read_doid()?, 1000);
//! assert_eq!(it.read_string()?, "hello");
//! # Ok::<(), chanwire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Atomic appends** - a rejected append never leaves partial bytes
//! - **Bounds-checked reads** - a failed read never moves the cursor
//! - **Canonical envelopes** - multi-recipient sets are deduplicated and sorted
//! - **Schema codec** - format, pack and unpack values from a type tree
//!
//! Enable `dgsize32` for 32-bit size tags and `serde` for serialization of
//! envelopes, schemas and values.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dclass;
pub mod protocol;

pub use dclass::{DistributedType, Value, format_value, pack_value, unpack_value};
pub use protocol::{
    CONTROL_CHANNEL, Channel, ControlMessage, DGSIZE_MAX, Datagram, DatagramIterator, DgSize,
    DoId, Envelope, Error, ErrorKind, MessageType, Result, Subsystem, Zone,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
