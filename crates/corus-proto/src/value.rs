//! Typed value codec: the fixed-width primitive kinds Corus devices speak
//! on the wire, and the decoded value sum type they map to.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::date::{self, CorusDateTime};
use crate::errors::{DataError, ProtocolError, Result};

/// One of the fixed-width primitive kinds a Corus field may carry.
///
/// Each variant owns its wire width and the decode/encode rules in
/// [`Kind::decode`] / [`Kind::encode`]. There is no virtual dispatch;
/// descriptors elsewhere in the protocol simply carry a `Kind` alongside an
/// id or a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// 8-bit unsigned integer.
    Byte,
    /// 16-bit unsigned integer.
    Word,
    /// 24-bit unsigned integer.
    EWord,
    /// 32-bit unsigned integer.
    ULong,
    /// 40-bit unsigned integer.
    EULong,
    /// IEEE-754 binary32.
    Float,
    /// Signed 16-bit integer, implicit divisor 100. Read-only (database).
    Float1,
    /// 16-bit packed mantissa/exponent. Read-only (database).
    Float2,
    /// 16-bit packed mantissa/exponent. Read-only (database).
    Float3,
    /// Packed date/time, see [`crate::date`].
    Date,
    /// 32-bit integer part + 32-bit fractional part / 1e8. Read-only.
    Index,
    /// 40-bit integer part + 32-bit fractional part / 1e8. Read-only.
    Index9,
    /// Fixed-width Latin-1 text, zero-padded on the right.
    String,
    /// 2 bytes of reserved padding; always decodes to absent.
    Null2,
    /// 4 bytes of reserved padding; always decodes to absent.
    Null4,
}

impl Kind {
    /// Wire width of this kind, in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word | Self::Float1 | Self::Float2 | Self::Float3 | Self::Null2 => 2,
            Self::EWord => 3,
            Self::ULong | Self::Float | Self::Date | Self::Null4 => 4,
            Self::EULong => 5,
            Self::Index => 8,
            Self::Index9 => 9,
            Self::String => 8,
        }
    }

    /// Whether a value of this kind may appear in a `WriteRequest`.
    /// `Float1`, `Float2`, `Float3`, `Index`, and `Index9` only ever appear
    /// in database records read from the device.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Float1 | Self::Float2 | Self::Float3 | Self::Index | Self::Index9)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Byte => "Byte",
            Self::Word => "Word",
            Self::EWord => "EWord",
            Self::ULong => "ULong",
            Self::EULong => "EULong",
            Self::Float => "Float",
            Self::Float1 => "Float1",
            Self::Float2 => "Float2",
            Self::Float3 => "Float3",
            Self::Date => "Date",
            Self::Index => "Index",
            Self::Index9 => "Index9",
            Self::String => "String",
            Self::Null2 => "Null2",
            Self::Null4 => "Null4",
        }
    }

    /// Decodes `bytes` according to this kind's rules.
    ///
    /// An all-ones field (`0xFF` repeated for the kind's width) always
    /// decodes to [`Value::Absent`], regardless of kind.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthMismatch`] if `bytes.len()` does not
    /// equal [`Kind::width`].
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        let width = self.width();
        if bytes.len() != width {
            return Err(ProtocolError::LengthMismatch { expected: width, actual: bytes.len() });
        }

        if matches!(self, Self::Null2 | Self::Null4) {
            return Ok(Value::Absent);
        }

        if bytes.iter().all(|&b| b == 0xFF) {
            return Ok(Value::Absent);
        }

        Ok(match self {
            Self::Byte | Self::Word | Self::EWord | Self::ULong | Self::EULong => {
                Value::Integer(unsigned_le(bytes))
            },
            Self::Float => Value::Decimal(decode_float(bytes)),
            Self::Float1 => Value::Decimal(decode_float1(bytes)),
            Self::Float2 => Value::Decimal(decode_float2(bytes)),
            Self::Float3 => Value::Decimal(decode_float3(bytes)),
            Self::Date => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                Value::Timestamp(date::decode(raw))
            },
            Self::Index => Value::Decimal(decode_index(bytes, 4)),
            Self::Index9 => Value::Decimal(decode_index(bytes, 5)),
            Self::String => Value::Text(decode_string(bytes)),
            Self::Null2 | Self::Null4 => unreachable!("handled above"),
        })
    }

    /// Encodes `value` into this kind's fixed-width wire representation.
    ///
    /// [`Value::Absent`] always encodes to an all-ones field, except for
    /// `Null2`/`Null4`, which are always zero-filled regardless of value
    /// (they carry no information on the wire).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Unsupported`] for kinds that are read-only
    /// in practice (`Float1`, `Float2`, `Float3`, `Index`, `Index9` never
    /// appear in a write request). Returns a [`ProtocolError`] wrapping a
    /// [`DataError`] if the value does not fit the kind (use
    /// [`Kind::try_encode`] to recover the underlying `DataError`).
    pub fn encode(self, value: &Value) -> Result<Vec<u8>> {
        self.try_encode(value).map_err(|err| match err {
            EncodeError::Protocol(e) => e,
            EncodeError::Data(e) => ProtocolError::Unsupported {
                kind: self.name(),
                reason: match e {
                    DataError::IntegerOutOfRange { .. } => "integer out of range",
                    DataError::StringTooLong { .. } => "string too long",
                },
            },
        })
    }

    /// Same as [`Kind::encode`] but surfaces [`DataError`] distinctly from
    /// framing-level [`ProtocolError`]s.
    pub fn try_encode(self, value: &Value) -> std::result::Result<Vec<u8>, EncodeError> {
        let width = self.width();

        if matches!(self, Self::Null2 | Self::Null4) {
            return Ok(vec![0u8; width]);
        }

        if matches!(value, Value::Absent) {
            return Ok(vec![0xFFu8; width]);
        }

        match self {
            Self::Byte | Self::Word | Self::EWord | Self::ULong | Self::EULong => {
                let Value::Integer(raw) = value else {
                    return Err(EncodeError::Protocol(ProtocolError::Unsupported {
                        kind: self.name(),
                        reason: "value is not an integer",
                    }));
                };
                encode_unsigned_le(*raw, width)
            },
            Self::Date => {
                let Value::Timestamp(ts) = value else {
                    return Err(EncodeError::Protocol(ProtocolError::Unsupported {
                        kind: self.name(),
                        reason: "value is not a timestamp",
                    }));
                };
                Ok(date::encode(*ts).to_vec())
            },
            Self::String => {
                let Value::Text(text) = value else {
                    return Err(EncodeError::Protocol(ProtocolError::Unsupported {
                        kind: self.name(),
                        reason: "value is not text",
                    }));
                };
                encode_string(text, width)
            },
            Self::Float1 | Self::Float2 | Self::Float3 | Self::Index | Self::Index9 => {
                Err(EncodeError::Protocol(ProtocolError::Unsupported {
                    kind: self.name(),
                    reason: "kind is only ever read from device-side database records",
                }))
            },
            Self::Float => {
                let Value::Decimal(dec) = value else {
                    return Err(EncodeError::Protocol(ProtocolError::Unsupported {
                        kind: self.name(),
                        reason: "value is not decimal",
                    }));
                };
                Ok(encode_float(*dec).to_vec())
            },
            Self::Null2 | Self::Null4 => unreachable!("handled above"),
        }
    }
}

/// Error surfaced from [`Kind::try_encode`], distinguishing representable
/// range violations from structural/type mismatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A framing or type-shape issue.
    Protocol(ProtocolError),
    /// The value's magnitude does not fit the kind's representable range.
    Data(DataError),
}

/// A decoded Corus value. Deliberately a small sum type rather than one
/// Rust type per wire kind: several kinds decode to the same shape (all
/// integer kinds decode to [`Value::Integer`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any unsigned integer kind (`Byte`, `Word`, `EWord`, `ULong`, `EULong`).
    Integer(u64),
    /// Reserved for sign-carrying kinds. Not currently produced by any
    /// `Kind`, but kept so callers can match exhaustively against future
    /// signed wire kinds without a breaking change.
    Signed(i64),
    /// Any decimal-valued kind (`Float`, `Float1`, `Float2`, `Float3`,
    /// `Index`, `Index9`).
    Decimal(Decimal),
    /// `String`.
    Text(String),
    /// `Date`.
    Timestamp(Option<CorusDateTime>),
    /// The all-ones sentinel, or a `Null2`/`Null4` field.
    Absent,
}

fn unsigned_le(bytes: &[u8]) -> u64 {
    bytes.iter().enumerate().fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)))
}

fn encode_unsigned_le(value: u64, width: usize) -> std::result::Result<Vec<u8>, EncodeError> {
    let max = if width >= 8 { u64::MAX } else { (1u64 << (width * 8)) - 1 };
    if value > max {
        return Err(EncodeError::Data(DataError::IntegerOutOfRange {
            value: i128::from(value),
            width,
        }));
    }
    Ok((0..width).map(|i| ((value >> (8 * i)) & 0xFF) as u8).collect())
}

fn decode_float(bytes: &[u8]) -> Decimal {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    let widened = f64::from(f32::from_le_bytes(raw));
    // The f32 -> f64 widening is exact; formatting the f64 with its
    // shortest round-trip representation mirrors the reference decoder's
    // `Decimal(str(float))` step and avoids spurious low-order bits.
    Decimal::from_str(&format!("{widened}"))
        .unwrap_or(Decimal::ZERO)
        .round_dp(6)
}

fn encode_float(value: Decimal) -> [u8; 4] {
    let as_f32 = value.to_string().parse::<f32>().unwrap_or(0.0);
    as_f32.to_le_bytes()
}

fn decode_float1(bytes: &[u8]) -> Decimal {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(bytes);
    let raw = i16::from_le_bytes(raw);
    Decimal::new(i64::from(raw), 2)
}

fn decode_float2(bytes: &[u8]) -> Decimal {
    let val = u16::from_le_bytes([bytes[0], bytes[1]]);
    let num = val & 0b0111_1111_1111_1111;
    let exp = i32::from((val & 0b1000_0000_0000_0000) >> 15) - 3;
    mantissa_exp_to_decimal(u32::from(num), exp)
}

fn decode_float3(bytes: &[u8]) -> Decimal {
    let val = u16::from_le_bytes([bytes[0], bytes[1]]);
    let num = val & 0b0011_1111_1111_1111;
    let exp = i32::from((val & 0b1100_0000_0000_0000) >> 14) - 2;
    mantissa_exp_to_decimal(u32::from(num), exp)
}

fn mantissa_exp_to_decimal(mantissa: u32, exp: i32) -> Decimal {
    if exp >= 0 {
        Decimal::from(mantissa) * Decimal::from(10i64.pow(exp as u32))
    } else {
        Decimal::new(i64::from(mantissa), (-exp) as u32)
    }
}

fn decode_index(bytes: &[u8], integer_width: usize) -> Decimal {
    let (integer_bytes, fraction_bytes) = bytes.split_at(integer_width);
    let integer = Decimal::from(unsigned_le(integer_bytes));
    let fraction = Decimal::new(unsigned_le(fraction_bytes) as i64, 8);
    (integer + fraction).round_dp(3)
}

fn decode_string(bytes: &[u8]) -> String {
    let trimmed = match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => &[],
    };
    trimmed.iter().map(|&b| b as char).collect()
}

fn encode_string(text: &str, width: usize) -> std::result::Result<Vec<u8>, EncodeError> {
    if text.len() > width {
        return Err(EncodeError::Data(DataError::StringTooLong { len: text.len(), width }));
    }
    let mut out = vec![0u8; width];
    for (slot, ch) in out.iter_mut().zip(text.chars()) {
        *slot = ch as u8;
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn index_decode_matches_known_value() {
        let bytes = [0x14, 0x2e, 0x00, 0x00, 0x80, 0x1d, 0x2c, 0x04];
        let Value::Decimal(value) = Kind::Index.decode(&bytes).unwrap() else {
            panic!("expected decimal")
        };
        assert_eq!(value, Decimal::from_str("11796.7").unwrap());
    }

    #[test]
    fn index9_decode_matches_known_value() {
        let bytes = [0x14, 0x2e, 0x00, 0x00, 0x00, 0x80, 0x1d, 0x2c, 0x04];
        let Value::Decimal(value) = Kind::Index9.decode(&bytes).unwrap() else {
            panic!("expected decimal")
        };
        assert_eq!(value, Decimal::from_str("11796.7").unwrap());
    }

    #[test]
    fn all_ones_decodes_to_absent_for_every_kind() {
        for kind in [
            Kind::Byte,
            Kind::Word,
            Kind::EWord,
            Kind::ULong,
            Kind::EULong,
            Kind::Float,
            Kind::Float1,
            Kind::Float2,
            Kind::Float3,
            Kind::Date,
            Kind::Index,
            Kind::Index9,
            Kind::String,
        ] {
            let bytes = vec![0xFFu8; kind.width()];
            assert_eq!(kind.decode(&bytes).unwrap(), Value::Absent);
            assert_eq!(kind.encode(&Value::Absent).unwrap(), bytes);
        }
    }

    #[test]
    fn null_kinds_always_decode_to_absent() {
        assert_eq!(Kind::Null2.decode(&[0x00, 0x00]).unwrap(), Value::Absent);
        assert_eq!(Kind::Null4.decode(&[0x00, 0x00, 0x00, 0x00]).unwrap(), Value::Absent);
        assert_eq!(Kind::Null2.encode(&Value::Absent).unwrap(), vec![0x00, 0x00]);
    }

    #[test]
    fn read_only_kinds_reject_encoding_concrete_values() {
        let value = Value::Decimal(Decimal::new(123, 1));
        assert!(Kind::Float2.encode(&value).is_err());
        assert!(Kind::Index.encode(&value).is_err());
    }

    #[test]
    fn is_writable_matches_read_only_kind_set() {
        for kind in [Kind::Float1, Kind::Float2, Kind::Float3, Kind::Index, Kind::Index9] {
            assert!(!kind.is_writable());
        }
        for kind in [Kind::Byte, Kind::Word, Kind::Float, Kind::Date, Kind::String] {
            assert!(kind.is_writable());
        }
    }

    #[test]
    fn string_round_trips_with_zero_padding() {
        let bytes = Kind::String.encode(&Value::Text("GAS1".to_string())).unwrap();
        assert_eq!(bytes, b"GAS1\x00\x00\x00\x00");
        assert_eq!(
            Kind::String.decode(&bytes).unwrap(),
            Value::Text("GAS1".to_string())
        );
    }

    #[test]
    fn string_too_long_is_rejected() {
        let err = Kind::String.try_encode(&Value::Text("123456789".to_string()));
        assert!(matches!(err, Err(EncodeError::Data(DataError::StringTooLong { .. }))));
    }

    proptest! {
        #[test]
        fn integer_kinds_round_trip(raw in any::<u32>()) {
            for kind in [Kind::Byte, Kind::Word, Kind::EWord, Kind::ULong, Kind::EULong] {
                let max = if kind.width() >= 8 { u64::MAX } else { (1u64 << (kind.width() * 8)) - 1 };
                let value = u64::from(raw) % (max.saturating_add(1).max(1));
                let bytes = kind.encode(&Value::Integer(value)).unwrap();
                prop_assert_eq!(kind.decode(&bytes).unwrap(), Value::Integer(value));
            }
        }
    }
}
