//! Render packed values as schema literals
//!
//! Used to print default values when writing a schema back out.

use super::{abandon, check_depth, check_fixed_count, for_each_element};
use crate::dclass::DistributedType;
use crate::protocol::{DatagramIterator, Error, Result};

/// Rendered in place of a value whose descriptor is invalid.
pub const INVALID_MARKER: &str = "<invalid>";

/// Rendered in place of a value whose bytes do not match its descriptor.
pub const ERROR_MARKER: &str = "<error>";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Render `packed` as a literal of type `dtype`.
pub fn format_value(dtype: &DistributedType, packed: &[u8]) -> Result<String> {
    read_formatted(dtype, &mut DatagramIterator::new(packed))
}

/// Render one value read from `it`.
///
/// On failure nothing is returned and the cursor is left where it was.
pub fn read_formatted<T: AsRef<[u8]>>(
    dtype: &DistributedType,
    it: &mut DatagramIterator<T>,
) -> Result<String> {
    let start = it.tell();
    let mut out = String::new();
    match format(dtype, it, &mut out, 0) {
        Ok(()) => Ok(out),
        Err(err) => {
            abandon(it, start, &err);
            Err(err)
        }
    }
}

/// Render `packed`, substituting a marker when it cannot be rendered.
#[must_use]
pub fn format_value_lossy(dtype: &DistributedType, packed: &[u8]) -> String {
    match format_value(dtype, packed) {
        Ok(text) => text,
        Err(Error::InvalidType) => INVALID_MARKER.to_owned(),
        Err(_) => ERROR_MARKER.to_owned(),
    }
}

fn format<T: AsRef<[u8]>>(
    dtype: &DistributedType,
    it: &mut DatagramIterator<T>,
    out: &mut String,
    depth: usize,
) -> Result<()> {
    check_depth(depth)?;
    match dtype {
        DistributedType::Int8 => out.push_str(&it.read_i8()?.to_string()),
        DistributedType::Int16 => out.push_str(&it.read_i16()?.to_string()),
        DistributedType::Int32 => out.push_str(&it.read_i32()?.to_string()),
        DistributedType::Int64 => out.push_str(&it.read_i64()?.to_string()),
        DistributedType::UInt8 => out.push_str(&it.read_u8()?.to_string()),
        DistributedType::UInt16 => out.push_str(&it.read_u16()?.to_string()),
        DistributedType::UInt32 => out.push_str(&it.read_u32()?.to_string()),
        DistributedType::UInt64 => out.push_str(&it.read_u64()?.to_string()),
        DistributedType::Float32 => out.push_str(&it.read_f32()?.to_string()),
        DistributedType::Float64 => out.push_str(&it.read_f64()?.to_string()),
        DistributedType::Char => {
            let c = it.read_u8()?;
            quote_into('\'', &[c], out);
        }
        DistributedType::String { size } => quote_into('"', it.read_data(*size)?, out),
        DistributedType::VarString => quote_into('"', it.read_blob()?, out),
        DistributedType::Blob { size } => hex_into(it.read_data(*size)?, out),
        DistributedType::VarBlob => hex_into(it.read_blob()?, out),
        DistributedType::Array(array) => {
            let element_type = array.element_type();
            out.push('[');
            match array.array_size() {
                Some(count) => {
                    check_fixed_count(element_type, count)?;
                    for i in 0..count {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        format(element_type, it, out, depth + 1)?;
                    }
                }
                None => {
                    let mut first = true;
                    for_each_element(element_type, it, |sub| {
                        if !first {
                            out.push_str(", ");
                        }
                        first = false;
                        format(element_type, sub, out, depth + 1)
                    })?;
                }
            }
            out.push(']');
        }
        DistributedType::Struct(strct) => {
            out.push('{');
            for (i, field) in strct.fields().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format(field.distributed_type(), it, out, depth + 1)?;
            }
            out.push('}');
        }
        DistributedType::Method(method) => {
            out.push('(');
            for (i, parameter) in method.parameters().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format(parameter.distributed_type(), it, out, depth + 1)?;
            }
            out.push(')');
        }
        DistributedType::Invalid => {
            out.push_str(INVALID_MARKER);
            return Err(Error::InvalidType);
        }
    }
    Ok(())
}

/// Quote `bytes` with `quote`, escaping the quote character and backslash
/// and writing non-printable bytes as `\xHH`.
#[must_use]
pub fn format_quoted(quote: char, bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    quote_into(quote, bytes, &mut out);
    out
}

/// Render `bytes` as `<` + lowercase hex pairs + `>`.
#[must_use]
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    hex_into(bytes, &mut out);
    out
}

fn quote_into(quote: char, bytes: &[u8], out: &mut String) {
    out.push(quote);
    for &b in bytes {
        let c = char::from(b);
        if c == quote || c == '\\' {
            out.push('\\');
            out.push(c);
        } else if (0x20..=0x7E).contains(&b) {
            out.push(c);
        } else {
            out.push_str("\\x");
            push_hex_byte(b, out);
        }
    }
    out.push(quote);
}

fn hex_into(bytes: &[u8], out: &mut String) {
    out.push('<');
    for &b in bytes {
        push_hex_byte(b, out);
    }
    out.push('>');
}

fn push_hex_byte(b: u8, out: &mut String) {
    out.push(char::from(HEX_DIGITS[usize::from(b >> 4)]));
    out.push(char::from(HEX_DIGITS[usize::from(b & 0x0F)]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Datagram;
    use crate::dclass::{Method, Struct};

    #[test]
    fn test_fixed_array_of_uint16() {
        let dtype = DistributedType::array(DistributedType::UInt16, 3);
        let mut dg = Datagram::new();
        for v in [1u16, 2, 3] {
            dg.add_u16(v).unwrap();
        }
        assert_eq!(format_value(&dtype, dg.as_slice()).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn test_var_blob_renders_hex() {
        let mut dg = Datagram::new();
        dg.add_blob(&[0x0A, 0xFF]).unwrap();
        assert_eq!(
            format_value(&DistributedType::VarBlob, dg.as_slice()).unwrap(),
            "<0aff>"
        );
    }

    #[test]
    fn test_string_escapes_quote_and_backslash() {
        let mut dg = Datagram::new();
        dg.add_string("a\"b\\c").unwrap();
        assert_eq!(
            format_value(&DistributedType::VarString, dg.as_slice()).unwrap(),
            r#""a\"b\\c""#
        );
    }

    #[test]
    fn test_non_printable_bytes_escape_as_hex() {
        assert_eq!(format_quoted('"', b"x\n\x7f\xe9"), r#""x\x0a\x7f\xe9""#);
        assert_eq!(format_quoted('\'', b"it's"), r"'it\'s'");
    }

    #[test]
    fn test_struct_of_two_scalars() {
        let dtype = DistributedType::from(
            Struct::new("Pair")
                .with_field("a", DistributedType::UInt8)
                .with_field("b", DistributedType::Int16),
        );
        let mut dg = Datagram::new();
        dg.add_u8(7).unwrap();
        dg.add_i16(-5).unwrap();
        assert_eq!(format_value(&dtype, dg.as_slice()).unwrap(), "{7, -5}");
    }

    #[test]
    fn test_method_uses_parentheses() {
        let dtype = DistributedType::from(
            Method::new()
                .with_parameter("name", DistributedType::VarString)
                .with_anonymous(DistributedType::Char)
                .with_anonymous(DistributedType::Float64),
        );
        let mut dg = Datagram::new();
        dg.add_string("bob").unwrap();
        dg.add_u8(b'q').unwrap();
        dg.add_f64(2.5).unwrap();
        assert_eq!(
            format_value(&dtype, dg.as_slice()).unwrap(),
            "(\"bob\", 'q', 2.5)"
        );
    }

    #[test]
    fn test_var_array_has_no_trailing_separator() {
        let dtype = DistributedType::var_array(DistributedType::UInt8);
        let mut dg = Datagram::new();
        dg.add_blob(&[1, 2]).unwrap();
        assert_eq!(format_value(&dtype, dg.as_slice()).unwrap(), "[1, 2]");

        let mut empty = Datagram::new();
        empty.add_size(0).unwrap();
        assert_eq!(format_value(&dtype, empty.as_slice()).unwrap(), "[]");
    }

    #[test]
    fn test_var_array_misaligned_fails() {
        let dtype = DistributedType::var_array(DistributedType::UInt16);
        let mut dg = Datagram::new();
        dg.add_blob(&[1, 0, 2]).unwrap();

        let err = format_value(&dtype, dg.as_slice()).unwrap_err();
        assert!(matches!(err, Error::ArrayMisaligned { declared: 3, .. }));
    }

    #[test]
    fn test_var_array_of_variable_elements_overshoot_fails() {
        // Second string claims 5 bytes but the array range ends after 2.
        let dtype = DistributedType::var_array(DistributedType::VarString);
        let mut inner = Datagram::new();
        inner.add_string("ab").unwrap();
        inner.add_size(5).unwrap();
        let mut dg = Datagram::new();
        dg.add_blob(inner.as_slice()).unwrap();
        dg.add_data(b"hello").unwrap();

        let err = format_value(&dtype, dg.as_slice()).unwrap_err();
        assert!(matches!(err, Error::ArrayMisaligned { .. }));
    }

    #[test]
    fn test_truncated_input_is_underrun() {
        let dtype = DistributedType::array(DistributedType::UInt32, 2);
        let err = format_value(&dtype, &[0u8; 7]).unwrap_err();
        assert!(err.is_underrun());
        assert_eq!(format_value_lossy(&dtype, &[0u8; 7]), ERROR_MARKER);
    }

    #[test]
    fn test_invalid_type_reports_failure() {
        assert_eq!(
            format_value(&DistributedType::Invalid, &[]),
            Err(Error::InvalidType)
        );
        assert_eq!(
            format_value_lossy(&DistributedType::Invalid, &[]),
            INVALID_MARKER
        );

        let dtype = DistributedType::from(
            Struct::new("Broken")
                .with_field("ok", DistributedType::UInt8)
                .with_field("bad", DistributedType::Invalid),
        );
        assert_eq!(format_value(&dtype, &[1]), Err(Error::InvalidType));
    }

    #[test]
    fn test_wide_integers_are_not_truncated() {
        let mut dg = Datagram::new();
        dg.add_u64(u64::MAX).unwrap();
        dg.add_i64(i64::MIN).unwrap();
        let dtype = DistributedType::from(
            Struct::new("Wide")
                .with_field("u", DistributedType::UInt64)
                .with_field("i", DistributedType::Int64),
        );
        assert_eq!(
            format_value(&dtype, dg.as_slice()).unwrap(),
            "{18446744073709551615, -9223372036854775808}"
        );
    }

    #[test]
    fn test_fixed_string_and_blob() {
        let dtype = DistributedType::from(
            Struct::new("Fixed")
                .with_field("tag", DistributedType::String { size: 3 })
                .with_field("key", DistributedType::Blob { size: 2 }),
        );
        assert_eq!(
            format_value(&dtype, b"abc\x00\x10").unwrap(),
            "{\"abc\", <0010>}"
        );
    }

    #[test]
    fn test_zero_width_fixed_array_is_malformed() {
        let dtype = DistributedType::array(DistributedType::String { size: 0 }, usize::MAX);
        let err = format_value(&dtype, &[]).unwrap_err();
        assert!(matches!(err, Error::ArrayMisaligned { declared: 0, .. }));

        let empty = DistributedType::array(DistributedType::from(Struct::new("Unit")), 0);
        assert_eq!(format_value(&empty, &[]).unwrap(), "[]");
    }

    #[test]
    fn test_failure_restores_cursor() {
        let dtype = DistributedType::array(DistributedType::UInt16, 2);
        let bytes = [1u8, 0, 2];
        let mut it = DatagramIterator::new(&bytes[..]);
        assert!(read_formatted(&dtype, &mut it).is_err());
        assert_eq!(it.tell(), 0);
    }

    #[test]
    fn test_nesting_limit() {
        let mut dtype = DistributedType::UInt8;
        for _ in 0..=crate::dclass::MAX_NESTING_DEPTH {
            dtype = DistributedType::array(dtype, 1);
        }
        assert_eq!(
            format_value(&dtype, &[0]),
            Err(Error::NestingTooDeep {
                limit: crate::dclass::MAX_NESTING_DEPTH
            })
        );
    }
}
