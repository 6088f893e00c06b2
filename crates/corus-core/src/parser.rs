//! Splits a response payload into typed fields per a supplied field
//! layout (§4.7).

use std::collections::HashMap;

use corus_proto::descriptor::ParameterDescriptor;
use corus_proto::value::Value;
use corus_proto::ProtocolError;

use crate::database::FieldDescriptor;
use crate::error::{ConfigError, CorusError};

/// Parses a parameter-read response payload against the descriptors used
/// to build the request, in order.
///
/// Absent fields (all-`0xFF`) are omitted from the result, per §4.7.
///
/// # Errors
///
/// Returns [`CorusError::Protocol`] if `payload`'s length does not equal
/// the sum of the descriptors' widths.
pub fn parse_parameters(
    payload: &[u8],
    descriptors: &[ParameterDescriptor],
) -> Result<HashMap<u16, Value>, CorusError> {
    let expected: usize = descriptors.iter().map(|d| d.kind.width()).sum();
    if payload.len() != expected {
        return Err(ProtocolError::LengthMismatch { expected, actual: payload.len() }.into());
    }

    let mut out = HashMap::new();
    let mut offset = 0;
    for descriptor in descriptors {
        let width = descriptor.kind.width();
        let value = descriptor.kind.decode(&payload[offset..offset + width])?;
        offset += width;
        if !matches!(value, Value::Absent) {
            out.insert(descriptor.id, value);
        }
    }
    Ok(out)
}

/// Parses a single database record against its field layout, applying
/// pulse-weight scaling and divisors.
///
/// Absent fields are kept in the result as [`Value::Absent`], unlike
/// parameter reads: a database record's column count is part of its
/// shape, so callers iterate fixed-name fields rather than a sparse map.
///
/// # Errors
///
/// - [`CorusError::Protocol`] if `payload`'s length does not equal the sum
///   of the field widths.
/// - [`CorusError::Config`] if a field requires pulse-weight scaling but
///   none was supplied.
pub fn parse_record(
    payload: &[u8],
    fields: &[FieldDescriptor],
    pulse_weight: Option<rust_decimal::Decimal>,
) -> Result<HashMap<String, Value>, CorusError> {
    let expected: usize = fields.iter().map(|f| f.kind.width()).sum();
    if payload.len() != expected {
        return Err(ProtocolError::LengthMismatch { expected, actual: payload.len() }.into());
    }

    let mut out = HashMap::new();
    let mut offset = 0;
    for field in fields {
        let width = field.kind.width();
        let mut value = field.kind.decode(&payload[offset..offset + width])?;
        offset += width;

        if let Value::Decimal(ref mut decimal) = value {
            if field.scaled_by_pulse_weight {
                let weight = pulse_weight.ok_or_else(|| {
                    ConfigError::MissingPulseWeight { field: field.name.clone() }
                })?;
                *decimal *= weight;
            }
            if let Some(divisor) = field.divisor {
                *decimal /= divisor;
            }
        }

        out.insert(field.name.clone(), value);
    }
    Ok(out)
}
