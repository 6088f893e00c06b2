//! Request message builders: `ReadRequest`, `WriteRequest`, and
//! `ReadDatabaseRequest`.

use std::str::FromStr;

use crate::crc::add_crc;
use crate::date::CorusDateTime;
use crate::descriptor::ParameterDescriptor;
use crate::errors::{ProtocolError, Result};
use crate::value::Value;

const CMD_READ: u8 = 0xBF;
const CMD_WRITE: u8 = 0xFF;
const CMD_READ_DATABASE: u8 = 0xBE;

/// Builds a `ReadRequest` frame for the given parameter ids.
///
/// Wire layout: `SOH | 0xBF | size_byte | id_bytes | ETX | crc16`, where
/// `size_byte` (big-endian, one byte) is the byte length of `id_bytes`.
#[must_use]
pub fn read_request(descriptors: &[ParameterDescriptor]) -> Vec<u8> {
    let id_bytes: Vec<u8> = descriptors.iter().copied().flat_map(ParameterDescriptor::encode_id).collect();

    #[allow(clippy::cast_possible_truncation)]
    let size_byte = id_bytes.len() as u8;

    let mut message = vec![crate::frame::SOH, CMD_READ, size_byte];
    message.extend_from_slice(&id_bytes);
    message.push(crate::frame::ETX);
    add_crc(&message)
}

/// One `(descriptor, value)` pair to write in a `WriteRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteItem {
    /// Target parameter.
    pub descriptor: ParameterDescriptor,
    /// Value to write, encoded per `descriptor.kind`.
    pub value: Value,
}

impl WriteItem {
    /// Creates a write item.
    #[must_use]
    pub const fn new(descriptor: ParameterDescriptor, value: Value) -> Self {
        Self { descriptor, value }
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.descriptor.encode_id();
        out.extend(self.descriptor.kind.encode(&self.value)?);
        Ok(out)
    }
}

/// Builds a `WriteRequest` frame for the given items.
///
/// Wire layout: `SOH | 0xFF | size_byte | item_bytes | ETX | crc16`, where
/// each item is an encoded id followed by its encoded value, and
/// `size_byte` is the little-endian byte length of the concatenated item
/// bytes.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if any item's value cannot be encoded for
/// its kind (see [`crate::value::Kind::encode`]).
pub fn write_request(items: &[WriteItem]) -> Result<Vec<u8>> {
    let mut data_bytes = Vec::new();
    for item in items {
        data_bytes.extend(item.to_bytes()?);
    }

    if data_bytes.len() > u8::MAX as usize {
        return Err(ProtocolError::LengthMismatch { expected: u8::MAX as usize, actual: data_bytes.len() });
    }

    #[allow(clippy::cast_possible_truncation)]
    let size_byte = data_bytes.len() as u8;

    let mut message = vec![crate::frame::SOH, CMD_WRITE, size_byte];
    message.extend_from_slice(&data_bytes);
    message.push(crate::frame::ETX);
    Ok(add_crc(&message))
}

/// Which on-device database a [`read_database_request`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Database {
    /// Sub-hourly interval log.
    Interval,
    /// Hourly log (shares the interval record layout).
    Hourly,
    /// Daily log.
    Daily,
    /// Monthly log.
    Monthly,
    /// Event log.
    Event,
    /// Parameter change log.
    Parameter,
}

impl Database {
    const fn id(self) -> u8 {
        match self {
            Self::Interval => 0,
            Self::Hourly => 1,
            Self::Daily => 2,
            Self::Monthly => 3,
            Self::Event => 4,
            Self::Parameter => 5,
        }
    }
}

/// `s` was not one of the recognized database names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDatabaseName(pub String);

impl FromStr for Database {
    type Err = UnknownDatabaseName;

    /// Parses the lowercase database names used by configuration formats
    /// and by the original client's `database=` call argument.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "interval" => Ok(Self::Interval),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "event" => Ok(Self::Event),
            "parameter" => Ok(Self::Parameter),
            other => Err(UnknownDatabaseName(other.to_string())),
        }
    }
}

/// Requests all records for `database` in `[stop, start]`, newest to
/// oldest. Session persistence and record counting are always disabled:
/// the client always requests the full available range in one pass.
///
/// Wire layout: `SOH | 0xBE | 0x0D | db_byte | options(4) | start_date(4) |
/// stop_date(4) | ETX | crc16`.
#[must_use]
pub fn read_database_request(
    database: Database,
    start: Option<CorusDateTime>,
    stop: Option<CorusDateTime>,
) -> Vec<u8> {
    const OPTIONS_ALL_FIELDS: [u8; 4] = [0xF9, 0xFF, 0xFF, 0xFF];

    let mut message = vec![crate::frame::SOH, CMD_READ_DATABASE, 0x0D, database.id()];
    message.extend_from_slice(&OPTIONS_ALL_FIELDS);
    message.extend_from_slice(&crate::date::encode(start));
    message.extend_from_slice(&crate::date::encode(stop));
    message.push(crate::frame::ETX);
    add_crc(&message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::Kind;

    #[test]
    fn read_request_single_parameter_matches_known_bytes() {
        let descriptors = [ParameterDescriptor::new(148, Kind::Index)];
        let wire = read_request(&descriptors);
        assert_eq!(&wire[..5], &[0x01, 0xBF, 0x01, 0x94, 0x03]);
        assert_eq!(wire.len(), 7);
    }

    #[test]
    fn write_request_rejects_read_only_kind() {
        let item = WriteItem::new(
            ParameterDescriptor::new(1, Kind::Float2),
            Value::Decimal(rust_decimal::Decimal::ONE),
        );
        assert!(write_request(&[item]).is_err());
    }

    #[test]
    fn read_database_request_has_fixed_header() {
        let wire = read_database_request(Database::Interval, None, None);
        assert_eq!(&wire[..4], &[0x01, 0xBE, 0x0D, 0x00]);
        assert_eq!(&wire[4..8], &[0xF9, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn database_names_parse_case_sensitively() {
        assert_eq!("hourly".parse::<Database>().unwrap(), Database::Hourly);
        assert_eq!("parameter".parse::<Database>().unwrap(), Database::Parameter);
    }

    #[test]
    fn unknown_database_name_is_rejected() {
        let err = "weekly".parse::<Database>().unwrap_err();
        assert_eq!(err, UnknownDatabaseName("weekly".to_string()));
    }
}
