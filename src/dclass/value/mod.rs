//! Schema-driven value codec
//!
//! Every operation here is a structural walk of a [`DistributedType`] tree:
//! the schema decides the shape, and sizes are either fixed by the schema or
//! read from a size tag in the stream. Packed bytes never decide shape.

mod format;
mod pack;

pub use format::{
    ERROR_MARKER, INVALID_MARKER, format_hex, format_quoted, format_value, format_value_lossy,
    read_formatted,
};
pub use pack::{pack_value, read_value, unpack_value};

use bytes::Bytes;
use tracing::debug;

use crate::dclass::DistributedType;
use crate::protocol::{DatagramIterator, Error, Result};

/// Deepest composite nesting the codec will walk.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A typed value matching some [`DistributedType`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Any signed integer kind
    Int(i64),
    /// Any unsigned integer kind
    UInt(u64),
    /// Either float kind
    Float(f64),
    /// Single byte character
    Char(u8),
    /// String body; bytes are not transcoded
    String(Bytes),
    /// Blob body
    Blob(Bytes),
    /// Fixed or variable array elements
    Array(Vec<Value>),
    /// Struct fields in declaration order
    Struct(Vec<Value>),
    /// Method arguments in parameter order
    Method(Vec<Value>),
}

impl Value {
    /// Name of this value's variant, for error reporting
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Blob(_) => "blob",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
            Self::Method(_) => "method",
        }
    }

    /// String value from text
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::String(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Blob value from bytes
    #[must_use]
    pub fn blob(b: &[u8]) -> Self {
        Self::Blob(Bytes::copy_from_slice(b))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}

/// Reject a fixed array of zero-width elements.
///
/// Such an array consumes no input however large its count, so nothing in
/// the stream bounds the walk.
fn check_fixed_count(element_type: &DistributedType, count: usize) -> Result<()> {
    if count > 0 && element_type.fixed_size() == Some(0) {
        return Err(Error::ArrayMisaligned {
            declared: 0,
            consumed: 0,
        });
    }
    Ok(())
}

/// Walk the elements of a size-tagged array.
///
/// The size tag bounds a sub-range; `element` is called until that range is
/// consumed exactly. An element that would read past the range, a fixed
/// element width that does not divide the range, or an element that makes no
/// progress all fail as [`Error::ArrayMisaligned`].
fn for_each_element<T, F>(
    element_type: &DistributedType,
    it: &mut DatagramIterator<T>,
    mut element: F,
) -> Result<()>
where
    T: AsRef<[u8]>,
    F: FnMut(&mut DatagramIterator<&[u8]>) -> Result<()>,
{
    let declared = it.read_size()?;
    let mut sub = it.read_sub(declared)?;

    if let Some(width) = element_type.fixed_size() {
        let aligned = if width == 0 {
            declared == 0
        } else {
            declared % width == 0
        };
        if !aligned {
            return Err(Error::ArrayMisaligned {
                declared,
                consumed: 0,
            });
        }
    }

    while !sub.is_empty() {
        let before = sub.tell();
        element(&mut sub).map_err(|err| {
            if err.is_underrun() {
                Error::ArrayMisaligned {
                    declared,
                    consumed: before,
                }
            } else {
                err
            }
        })?;
        if sub.tell() == before {
            return Err(Error::ArrayMisaligned {
                declared,
                consumed: before,
            });
        }
    }
    Ok(())
}

/// Rewind `it` to `start` and account for the failure.
fn abandon<T: AsRef<[u8]>>(it: &mut DatagramIterator<T>, start: usize, err: &Error) {
    it.rewind(start);
    // Underruns were already counted where they happened.
    if !err.is_underrun() {
        crate::protocol::record_error(err);
        debug!(offset = start, error = %err, "value decode failed");
    }
}
