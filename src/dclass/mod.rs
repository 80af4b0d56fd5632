//! Distributed class schemas and the values they describe
//!
//! [`DistributedType`] trees describe how a value is laid out inside a
//! datagram. The [`value`] module walks those trees to render, pack and
//! unpack values.

mod types;
pub mod value;

pub use types::{ArrayType, DistributedType, Field, Method, Parameter, Struct, Type};
pub use value::{
    ERROR_MARKER, INVALID_MARKER, MAX_NESTING_DEPTH, Value, format_hex, format_quoted,
    format_value, format_value_lossy, pack_value, read_formatted, read_value, unpack_value,
};
