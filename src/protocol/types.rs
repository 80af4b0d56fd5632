//! Message type numbers and the subsystem ranges that own them

use std::fmt;
use std::ops::RangeInclusive;

/// Numeric message type carried in every envelope.
///
/// The number alone decides which subsystem interprets the payload,
/// independent of the channel the datagram arrived on. Zero is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MessageType(u16);

macro_rules! message_types {
    ($($(#[$doc:meta])* $name:ident = $value:expr,)*) => {
        impl MessageType {
            $(
                $(#[$doc])*
                pub const $name: Self = Self($value);
            )*
        }

        const CATALOGUE: &[(MessageType, &str)] = &[
            $((MessageType::$name, stringify!($name)),)*
        ];
    };
}

message_types! {
    /// Reserved; never valid on the wire
    RESERVED = 0,

    /// Subscribe the connection to a channel
    CONTROL_ADD_CHANNEL = 9000,
    /// Unsubscribe the connection from a channel
    CONTROL_REMOVE_CHANNEL = 9001,
    /// Subscribe the connection to an inclusive channel range
    CONTROL_ADD_RANGE = 9002,
    /// Unsubscribe the connection from an inclusive channel range
    CONTROL_REMOVE_RANGE = 9003,
    /// Register a datagram to route when the connection drops
    CONTROL_ADD_POST_REMOVE = 9010,
    /// Forget every registered post-remove datagram
    CONTROL_CLEAR_POST_REMOVES = 9011,
    /// Set the debug name of the connection
    CONTROL_SET_CON_NAME = 9012,
    /// Set the debug URL of the connection
    CONTROL_SET_CON_URL = 9013,
    /// Emit a log line through the bus
    CONTROL_LOG_MESSAGE = 9014,

    /// Move a client session to a new connection state
    CLIENTAGENT_SET_STATE = 1000,
    /// Change the channel a client session sends from
    CLIENTAGENT_SET_CLIENT_ID = 1001,
    /// Forward a raw datagram to the client
    CLIENTAGENT_SEND_DATAGRAM = 1002,
    /// Disconnect the client with a reason code
    CLIENTAGENT_EJECT = 1004,
    /// Drop the client connection without a reason
    CLIENTAGENT_DROP = 1005,
    /// Ask for the client's remote and local addresses
    CLIENTAGENT_GET_NETWORK_ADDRESS = 1006,
    /// Reply carrying the client's network addresses
    CLIENTAGENT_GET_NETWORK_ADDRESS_RESP = 1007,
    /// Let the client see an object of a given class
    CLIENTAGENT_DECLARE_OBJECT = 1010,
    /// Hide a previously declared object from the client
    CLIENTAGENT_UNDECLARE_OBJECT = 1011,
    /// Tie an object's lifetime to the client session
    CLIENTAGENT_ADD_SESSION_OBJECT = 1012,
    /// Untie an object from the client session
    CLIENTAGENT_REMOVE_SESSION_OBJECT = 1013,
    /// Set which fields the client may update on an object
    CLIENTAGENT_SET_FIELDS_SENDABLE = 1014,
    /// Subscribe the client session to a channel
    CLIENTAGENT_OPEN_CHANNEL = 1100,
    /// Unsubscribe the client session from a channel
    CLIENTAGENT_CLOSE_CHANNEL = 1101,
    /// Register a datagram to route when the client disconnects
    CLIENTAGENT_ADD_POST_REMOVE = 1110,
    /// Forget the client's post-remove datagrams
    CLIENTAGENT_CLEAR_POST_REMOVES = 1111,
    /// Open interest in one zone of a parent object
    CLIENTAGENT_ADD_INTEREST = 1200,
    /// Open interest in several zones of a parent object
    CLIENTAGENT_ADD_INTEREST_MULTIPLE = 1201,
    /// Close a previously opened interest
    CLIENTAGENT_REMOVE_INTEREST = 1203,
    /// Report that an interest finished loading
    CLIENTAGENT_DONE_INTEREST_RESP = 1204,

    /// Create an object from its required fields
    STATESERVER_CREATE_OBJECT_WITH_REQUIRED = 2000,
    /// Create an object from required and other fields
    STATESERVER_CREATE_OBJECT_WITH_REQUIRED_OTHER = 2001,
    /// Delete every object owned by an AI channel
    STATESERVER_DELETE_AI_OBJECTS = 2009,
    /// Request one field of an object
    STATESERVER_OBJECT_GET_FIELD = 2010,
    /// Reply to a single field request
    STATESERVER_OBJECT_GET_FIELD_RESP = 2011,
    /// Request several fields of an object
    STATESERVER_OBJECT_GET_FIELDS = 2012,
    /// Reply to a multiple field request
    STATESERVER_OBJECT_GET_FIELDS_RESP = 2013,
    /// Request every field of an object
    STATESERVER_OBJECT_GET_ALL = 2014,
    /// Reply carrying every field of an object
    STATESERVER_OBJECT_GET_ALL_RESP = 2015,
    /// Update one field of an object
    STATESERVER_OBJECT_SET_FIELD = 2020,
    /// Update several fields of an object
    STATESERVER_OBJECT_SET_FIELDS = 2021,
    /// Clear one field from memory
    STATESERVER_OBJECT_DELETE_FIELD_RAM = 2030,
    /// Clear several fields from memory
    STATESERVER_OBJECT_DELETE_FIELDS_RAM = 2031,
    /// Remove an object from memory
    STATESERVER_OBJECT_DELETE_RAM = 2032,
    /// Move an object to a new parent and zone
    STATESERVER_OBJECT_SET_LOCATION = 2040,
    /// Announce that an object is changing location
    STATESERVER_OBJECT_CHANGING_LOCATION = 2041,
    /// Object entering a location, with required fields
    STATESERVER_OBJECT_ENTER_LOCATION_WITH_REQUIRED = 2042,
    /// Object entering a location, with required and other fields
    STATESERVER_OBJECT_ENTER_LOCATION_WITH_REQUIRED_OTHER = 2043,
    /// Request the location of an object
    STATESERVER_OBJECT_GET_LOCATION = 2044,
    /// Reply carrying an object's location
    STATESERVER_OBJECT_GET_LOCATION_RESP = 2045,
    /// Parent acknowledges a child's new location
    STATESERVER_OBJECT_LOCATION_ACK = 2046,
    /// Assign an AI channel to an object
    STATESERVER_OBJECT_SET_AI = 2050,
    /// Announce that an object's AI is changing
    STATESERVER_OBJECT_CHANGING_AI = 2051,
    /// Object entering an AI, with required fields
    STATESERVER_OBJECT_ENTER_AI_WITH_REQUIRED = 2052,
    /// Object entering an AI, with required and other fields
    STATESERVER_OBJECT_ENTER_AI_WITH_REQUIRED_OTHER = 2053,
    /// Request the AI channel of an object
    STATESERVER_OBJECT_GET_AI = 2054,
    /// Reply carrying an object's AI channel
    STATESERVER_OBJECT_GET_AI_RESP = 2055,
    /// Assign an owner channel to an object
    STATESERVER_OBJECT_SET_OWNER = 2060,
    /// Announce that an object's owner is changing
    STATESERVER_OBJECT_CHANGING_OWNER = 2061,
    /// Object entering an owner, with required fields
    STATESERVER_OBJECT_ENTER_OWNER_WITH_REQUIRED = 2062,
    /// Object entering an owner, with required and other fields
    STATESERVER_OBJECT_ENTER_OWNER_WITH_REQUIRED_OTHER = 2063,
    /// Request the owner channel of an object
    STATESERVER_OBJECT_GET_OWNER = 2064,
    /// Reply carrying an object's owner channel
    STATESERVER_OBJECT_GET_OWNER_RESP = 2065,
    /// Object entering an interest, with required fields
    STATESERVER_OBJECT_ENTER_INTEREST_WITH_REQUIRED = 2066,
    /// Object entering an interest, with required and other fields
    STATESERVER_OBJECT_ENTER_INTEREST_WITH_REQUIRED_OTHER = 2067,
    /// Request the objects in one zone
    STATESERVER_OBJECT_GET_ZONE_OBJECTS = 2100,
    /// Request the objects in several zones
    STATESERVER_OBJECT_GET_ZONES_OBJECTS = 2102,
    /// Request every child of an object
    STATESERVER_OBJECT_GET_CHILDREN = 2104,
    /// Request the object count of one zone
    STATESERVER_OBJECT_GET_ZONE_COUNT = 2110,
    /// Reply carrying a zone's object count
    STATESERVER_OBJECT_GET_ZONE_COUNT_RESP = 2111,
    /// Request the object count of several zones
    STATESERVER_OBJECT_GET_ZONES_COUNT = 2112,
    /// Reply carrying the object count of several zones
    STATESERVER_OBJECT_GET_ZONES_COUNT_RESP = 2113,
    /// Request the child count of an object
    STATESERVER_OBJECT_GET_CHILD_COUNT = 2114,
    /// Reply carrying an object's child count
    STATESERVER_OBJECT_GET_CHILD_COUNT_RESP = 2115,
    /// Delete every object in one zone
    STATESERVER_OBJECT_DELETE_ZONE = 2120,
    /// Delete every object in several zones
    STATESERVER_OBJECT_DELETE_ZONES = 2122,
    /// Delete every child of an object
    STATESERVER_OBJECT_DELETE_CHILDREN = 2124,
    /// Request the zones that hold objects
    STATESERVER_GET_ACTIVE_ZONES = 2125,
    /// Reply carrying the active zones
    STATESERVER_GET_ACTIVE_ZONES_RESP = 2126,

    /// Load a stored object into memory
    DBSS_OBJECT_ACTIVATE_WITH_DEFAULTS = 2200,
    /// Load a stored object, overriding some fields
    DBSS_OBJECT_ACTIVATE_WITH_DEFAULTS_OTHER = 2201,
    /// Ask whether a stored object is loaded
    DBSS_OBJECT_GET_ACTIVATED = 2207,
    /// Reply to an activation query
    DBSS_OBJECT_GET_ACTIVATED_RESP = 2208,
    /// Clear one field of a loaded object from memory
    DBSS_OBJECT_DELETE_FIELD_RAM = 2230,
    /// Clear several fields of a loaded object from memory
    DBSS_OBJECT_DELETE_FIELDS_RAM = 2231,
    /// Delete a stored object from the database
    DBSS_OBJECT_DELETE_DISK = 2232,
    /// Register a datagram to route when a loaded object unloads
    DBSS_ADD_POST_REMOVE = 2233,
    /// Forget a loaded object's post-remove datagrams
    DBSS_CLEAR_POST_REMOVES = 2234,

    /// Create a stored object
    DBSERVER_CREATE_OBJECT = 3000,
    /// Reply carrying the new object's id
    DBSERVER_CREATE_OBJECT_RESP = 3001,
    /// Read one stored field
    DBSERVER_OBJECT_GET_FIELD = 3010,
    /// Reply to a stored field read
    DBSERVER_OBJECT_GET_FIELD_RESP = 3011,
    /// Read several stored fields
    DBSERVER_OBJECT_GET_FIELDS = 3012,
    /// Reply to a multiple stored field read
    DBSERVER_OBJECT_GET_FIELDS_RESP = 3013,
    /// Read every stored field of an object
    DBSERVER_OBJECT_GET_ALL = 3014,
    /// Reply carrying every stored field
    DBSERVER_OBJECT_GET_ALL_RESP = 3015,
    /// Write one stored field
    DBSERVER_OBJECT_SET_FIELD = 3020,
    /// Write several stored fields
    DBSERVER_OBJECT_SET_FIELDS = 3021,
    /// Write one stored field if it holds an expected value
    DBSERVER_OBJECT_SET_FIELD_IF_EQUALS = 3022,
    /// Reply to a conditional single field write
    DBSERVER_OBJECT_SET_FIELD_IF_EQUALS_RESP = 3023,
    /// Write several stored fields if they hold expected values
    DBSERVER_OBJECT_SET_FIELDS_IF_EQUALS = 3024,
    /// Reply to a conditional multiple field write
    DBSERVER_OBJECT_SET_FIELDS_IF_EQUALS_RESP = 3025,
    /// Write one stored field if it has no value
    DBSERVER_OBJECT_SET_FIELD_IF_EMPTY = 3026,
    /// Reply to a write-if-empty
    DBSERVER_OBJECT_SET_FIELD_IF_EMPTY_RESP = 3027,
    /// Delete one stored field
    DBSERVER_OBJECT_DELETE_FIELD = 3030,
    /// Delete several stored fields
    DBSERVER_OBJECT_DELETE_FIELDS = 3031,
    /// Delete a stored object
    DBSERVER_OBJECT_DELETE = 3032,
}

impl MessageType {
    /// Wrap a raw message type number
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw message type number
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Check whether this is the reserved zero value
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == 0
    }

    /// Subsystem whose range contains this message type
    #[must_use]
    pub fn subsystem(self) -> Option<Subsystem> {
        Subsystem::of(self)
    }

    /// Catalogue name, if this is a known message type
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        CATALOGUE
            .iter()
            .find(|(msg_type, _)| *msg_type == self)
            .map(|(_, name)| *name)
    }
}

impl From<u16> for MessageType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<MessageType> for u16 {
    fn from(value: MessageType) -> Self {
        value.0
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({})", self.0),
            None => write!(f, "MessageType({})", self.0),
        }
    }
}

/// Subsystem owning a disjoint range of message type numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subsystem {
    /// Bus-internal control messages
    Control,
    /// Client gateway
    ClientAgent,
    /// Object state server (including database-backed state servers)
    StateServer,
    /// Persistence server
    DatabaseServer,
}

impl Subsystem {
    /// Every subsystem, in range order
    pub const ALL: [Self; 4] = [
        Self::ClientAgent,
        Self::StateServer,
        Self::DatabaseServer,
        Self::Control,
    ];

    /// Inclusive range of message type numbers owned by this subsystem
    #[must_use]
    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            Self::Control => 9000..=9999,
            Self::ClientAgent => 1000..=1999,
            Self::StateServer => 2000..=2999,
            Self::DatabaseServer => 3000..=3999,
        }
    }

    /// Subsystem owning `msg_type`, if any
    #[must_use]
    pub fn of(msg_type: MessageType) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|subsystem| subsystem.range().contains(&msg_type.as_u16()))
    }

    /// Check whether `msg_type` falls in this subsystem's range
    #[must_use]
    pub fn owns(self, msg_type: MessageType) -> bool {
        self.range().contains(&msg_type.as_u16())
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Control => "Control",
            Self::ClientAgent => "ClientAgent",
            Self::StateServer => "StateServer",
            Self::DatabaseServer => "DatabaseServer",
        };
        write!(f, "{name}")
    }
}
