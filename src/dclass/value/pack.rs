//! Pack typed values into datagrams and unpack them again

use bytes::Bytes;

use super::{Value, abandon, check_depth, check_fixed_count, for_each_element};
use crate::dclass::{DistributedType, Type};
use crate::protocol::{Datagram, DatagramIterator, Error, Result};

/// Append `value`, laid out as `dtype`, to `dg`.
///
/// Either the whole value is appended or, on any failure, nothing is.
pub fn pack_value(dtype: &DistributedType, value: &Value, dg: &mut Datagram) -> Result<()> {
    let mut scratch = Datagram::new();
    if let Err(err) = pack(dtype, value, &mut scratch, 0) {
        // Overflows were already counted by the scratch datagram.
        if !err.is_overflow() {
            crate::protocol::record_error(&err);
        }
        return Err(err);
    }
    dg.add_datagram(&scratch)
}

/// Decode one value of type `dtype` from the start of `packed`.
pub fn unpack_value(dtype: &DistributedType, packed: &[u8]) -> Result<Value> {
    read_value(dtype, &mut DatagramIterator::new(packed))
}

/// Decode one value of type `dtype` from `it`.
///
/// On failure the cursor is left where it was.
pub fn read_value<T: AsRef<[u8]>>(
    dtype: &DistributedType,
    it: &mut DatagramIterator<T>,
) -> Result<Value> {
    let start = it.tell();
    unpack(dtype, it, 0).inspect_err(|err| abandon(it, start, err))
}

fn mismatch(dtype: &DistributedType, value: &Value) -> Error {
    Error::ValueMismatch {
        expected: dtype.kind().name(),
        found: value.kind_name(),
    }
}

fn integer(dtype: &DistributedType, value: &Value) -> Result<i128> {
    match value {
        Value::Int(v) => Ok(i128::from(*v)),
        Value::UInt(v) => Ok(i128::from(*v)),
        other => Err(mismatch(dtype, other)),
    }
}

fn narrow<N: TryFrom<i128>>(kind: Type, v: i128) -> Result<N> {
    N::try_from(v).map_err(|_| Error::ValueOutOfRange {
        kind: kind.name(),
        value: v.to_string(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn float(dtype: &DistributedType, value: &Value) -> Result<f64> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        Value::UInt(v) => Ok(*v as f64),
        other => Err(mismatch(dtype, other)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn narrow_f32(v: f64) -> Result<f32> {
    if v.is_finite() && !(f64::from(f32::MIN)..=f64::from(f32::MAX)).contains(&v) {
        return Err(Error::ValueOutOfRange {
            kind: Type::Float32.name(),
            value: v.to_string(),
        });
    }
    Ok(v as f32)
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::LengthMismatch { expected, found });
    }
    Ok(())
}

fn pack(dtype: &DistributedType, value: &Value, dg: &mut Datagram, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let kind = dtype.kind();
    match dtype {
        DistributedType::Int8 => dg.add_i8(narrow(kind, integer(dtype, value)?)?),
        DistributedType::Int16 => dg.add_i16(narrow(kind, integer(dtype, value)?)?),
        DistributedType::Int32 => dg.add_i32(narrow(kind, integer(dtype, value)?)?),
        DistributedType::Int64 => dg.add_i64(narrow(kind, integer(dtype, value)?)?),
        DistributedType::UInt8 => dg.add_u8(narrow(kind, integer(dtype, value)?)?),
        DistributedType::UInt16 => dg.add_u16(narrow(kind, integer(dtype, value)?)?),
        DistributedType::UInt32 => dg.add_u32(narrow(kind, integer(dtype, value)?)?),
        DistributedType::UInt64 => dg.add_u64(narrow(kind, integer(dtype, value)?)?),
        DistributedType::Float32 => dg.add_f32(narrow_f32(float(dtype, value)?)?),
        DistributedType::Float64 => dg.add_f64(float(dtype, value)?),
        DistributedType::Char => match value {
            Value::Char(c) => dg.add_u8(*c),
            other => Err(mismatch(dtype, other)),
        },
        DistributedType::String { size } => match value {
            Value::String(s) => {
                check_len(*size, s.len())?;
                dg.add_data(s)
            }
            other => Err(mismatch(dtype, other)),
        },
        DistributedType::VarString => match value {
            Value::String(s) => dg.add_blob(s),
            other => Err(mismatch(dtype, other)),
        },
        DistributedType::Blob { size } => match value {
            Value::Blob(b) => {
                check_len(*size, b.len())?;
                dg.add_data(b)
            }
            other => Err(mismatch(dtype, other)),
        },
        DistributedType::VarBlob => match value {
            Value::Blob(b) => dg.add_blob(b),
            other => Err(mismatch(dtype, other)),
        },
        DistributedType::Array(array) => {
            let Value::Array(items) = value else {
                return Err(mismatch(dtype, value));
            };
            let element_type = array.element_type();
            match array.array_size() {
                Some(count) => {
                    check_len(count, items.len())?;
                    for item in items {
                        pack(element_type, item, dg, depth + 1)?;
                    }
                    Ok(())
                }
                None => {
                    let mut body = Datagram::new();
                    for item in items {
                        pack(element_type, item, &mut body, depth + 1)?;
                    }
                    dg.add_blob(body.as_slice())
                }
            }
        }
        DistributedType::Struct(strct) => {
            let Value::Struct(items) = value else {
                return Err(mismatch(dtype, value));
            };
            check_len(strct.fields().len(), items.len())?;
            for (field, item) in strct.fields().iter().zip(items) {
                pack(field.distributed_type(), item, dg, depth + 1)?;
            }
            Ok(())
        }
        DistributedType::Method(method) => {
            let Value::Method(items) = value else {
                return Err(mismatch(dtype, value));
            };
            check_len(method.parameters().len(), items.len())?;
            for (parameter, item) in method.parameters().iter().zip(items) {
                pack(parameter.distributed_type(), item, dg, depth + 1)?;
            }
            Ok(())
        }
        DistributedType::Invalid => Err(Error::InvalidType),
    }
}

fn unpack<T: AsRef<[u8]>>(
    dtype: &DistributedType,
    it: &mut DatagramIterator<T>,
    depth: usize,
) -> Result<Value> {
    check_depth(depth)?;
    let value = match dtype {
        DistributedType::Int8 => Value::Int(i64::from(it.read_i8()?)),
        DistributedType::Int16 => Value::Int(i64::from(it.read_i16()?)),
        DistributedType::Int32 => Value::Int(i64::from(it.read_i32()?)),
        DistributedType::Int64 => Value::Int(it.read_i64()?),
        DistributedType::UInt8 => Value::UInt(u64::from(it.read_u8()?)),
        DistributedType::UInt16 => Value::UInt(u64::from(it.read_u16()?)),
        DistributedType::UInt32 => Value::UInt(u64::from(it.read_u32()?)),
        DistributedType::UInt64 => Value::UInt(it.read_u64()?),
        DistributedType::Float32 => Value::Float(f64::from(it.read_f32()?)),
        DistributedType::Float64 => Value::Float(it.read_f64()?),
        DistributedType::Char => Value::Char(it.read_u8()?),
        DistributedType::String { size } => {
            Value::String(Bytes::copy_from_slice(it.read_data(*size)?))
        }
        DistributedType::VarString => Value::String(Bytes::copy_from_slice(it.read_blob()?)),
        DistributedType::Blob { size } => Value::Blob(Bytes::copy_from_slice(it.read_data(*size)?)),
        DistributedType::VarBlob => Value::Blob(Bytes::copy_from_slice(it.read_blob()?)),
        DistributedType::Array(array) => {
            let element_type = array.element_type();
            let mut items = Vec::new();
            match array.array_size() {
                Some(count) => {
                    check_fixed_count(element_type, count)?;
                    for _ in 0..count {
                        items.push(unpack(element_type, it, depth + 1)?);
                    }
                }
                None => for_each_element(element_type, it, |sub| {
                    items.push(unpack(element_type, sub, depth + 1)?);
                    Ok(())
                })?,
            }
            Value::Array(items)
        }
        DistributedType::Struct(strct) => Value::Struct(
            strct
                .fields()
                .iter()
                .map(|field| unpack(field.distributed_type(), it, depth + 1))
                .collect::<Result<_>>()?,
        ),
        DistributedType::Method(method) => Value::Method(
            method
                .parameters()
                .iter()
                .map(|parameter| unpack(parameter.distributed_type(), it, depth + 1))
                .collect::<Result<_>>()?,
        ),
        DistributedType::Invalid => return Err(Error::InvalidType),
    };
    Ok(value)
}
