//! Database record layout and the multi-frame transfer engine.

use std::collections::HashMap;

use corus_proto::frame::{ACK, NACK};
use corus_proto::value::Kind;
use corus_proto::ProtocolError;
use rust_decimal::Decimal;

use crate::channel::ByteChannel;
use crate::error::CorusError;
use crate::frame_reader::read_raw;

/// Maximum number of `NACK`s the engine will send for a single frame
/// before giving up (§4.5, §7).
pub const MAX_RETRIES: u8 = 3;

/// One field within a database record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, used as the key in the decoded record map.
    pub name: String,
    /// Wire kind of the field.
    pub kind: Kind,
    /// Whether the decoded value should be multiplied by the session's
    /// configured pulse weight.
    pub scaled_by_pulse_weight: bool,
    /// An optional divisor applied after pulse-weight scaling.
    pub divisor: Option<Decimal>,
}

impl FieldDescriptor {
    /// Creates a plain, unscaled field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self { name: name.into(), kind, scaled_by_pulse_weight: false, divisor: None }
    }

    /// Marks this field as scaled by the session's pulse weight.
    #[must_use]
    pub const fn scaled_by_pulse_weight(mut self) -> Self {
        self.scaled_by_pulse_weight = true;
        self
    }

    /// Sets a divisor applied after pulse-weight scaling.
    #[must_use]
    pub const fn with_divisor(mut self, divisor: Decimal) -> Self {
        self.divisor = Some(divisor);
        self
    }
}

/// A record layout: the ordered fields that make up one record of a given
/// byte length.
pub type RecordLayout = Vec<FieldDescriptor>;

/// Maps a database's possible first-record byte lengths to the layout that
/// applies. The device's firmware mapping determines which layout is in
/// effect; the client selects by the byte length of the first record it
/// receives.
pub type RecordLengthLayout = HashMap<usize, RecordLayout>;

/// Full, caller-supplied catalog: one [`RecordLengthLayout`] per database.
pub type DatabaseCatalog = HashMap<corus_proto::message::Database, RecordLengthLayout>;

/// The raw outcome of a completed database transfer: concatenated record
/// bytes and the record width used to split them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTransferResult {
    /// Concatenated bytes of every record received, in order.
    pub accumulated: Vec<u8>,
    /// Byte width of one record, as reported by the first frame.
    pub record_size: usize,
}

impl DatabaseTransferResult {
    /// Splits the accumulated bytes into `record_size`-wide slices.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TrailingShortRecord`] if the accumulated
    /// bytes do not split evenly.
    pub fn into_records(self) -> Result<Vec<Vec<u8>>, ProtocolError> {
        let remainder = self.accumulated.len() % self.record_size;
        if remainder != 0 {
            return Err(ProtocolError::TrailingShortRecord {
                remainder,
                record_size: self.record_size,
            });
        }
        Ok(self.accumulated.chunks(self.record_size).map(<[u8]>::to_vec).collect())
    }
}

/// Drives the multi-frame database transfer loop (§4.5) until the
/// terminal frame is seen, then returns the accumulated record bytes.
///
/// # Errors
///
/// - [`CorusError::Communication`] if the retry budget is exhausted or a
///   channel call fails.
/// - [`CorusError::Protocol`] if the first frame claims a zero record
///   size, or a later frame's number is not the predecessor's successor.
pub fn run_transfer(channel: &mut impl ByteChannel) -> Result<DatabaseTransferResult, CorusError> {
    let mut accumulated = Vec::new();
    let mut record_size = None;
    let mut previous_frame_number: Option<u16> = None;
    let mut retry_count = 0u8;

    loop {
        let frame = read_raw(channel)?;

        if !frame.crc_ok {
            channel.send(&[NACK])?;
            retry_count += 1;
            if retry_count > MAX_RETRIES {
                return Err(crate::error::CommunicationError::RetriesExhausted {
                    retries: retry_count,
                }
                .into());
            }
            continue;
        }

        if frame.payload.len() < 2 {
            return Err(ProtocolError::LengthMismatch { expected: 2, actual: frame.payload.len() }
                .into());
        }
        let header = u16::from_le_bytes([frame.payload[0], frame.payload[1]]);
        let frame_number = header & 0x7FFF;
        let is_last = header & 0x8000 != 0;

        let record_data = if record_size.is_some() {
            if Some(frame_number) != previous_frame_number.map(|p| p + 1) {
                return Err(ProtocolError::FrameOutOfOrder {
                    expected: previous_frame_number.map_or(0, |p| p + 1),
                    actual: frame_number,
                }
                .into());
            }
            &frame.payload[2..]
        } else {
            let Some(&size_byte) = frame.payload.get(2) else {
                return Err(ProtocolError::LengthMismatch { expected: 3, actual: frame.payload.len() }
                    .into());
            };
            if size_byte == 0 {
                return Err(ProtocolError::EmptyDatabaseResponse.into());
            }
            record_size = Some(size_byte as usize);
            &frame.payload[3..]
        };

        accumulated.extend_from_slice(record_data);

        if is_last {
            break;
        }

        channel.send(&[ACK])?;
        previous_frame_number = Some(frame_number);
        retry_count = 0;
    }

    let record_size = record_size.ok_or(ProtocolError::EmptyDatabaseResponse)?;
    Ok(DatabaseTransferResult { accumulated, record_size })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corus_proto::crc::add_crc;
    use corus_proto::frame::{ETX, SOH};
    use proptest::prelude::*;

    use super::*;
    use crate::channel::tests_support::MockChannel;

    fn build_frame(header: u16, rest: &[u8]) -> Vec<u8> {
        let mut payload = header.to_le_bytes().to_vec();
        payload.extend_from_slice(rest);
        #[allow(clippy::cast_possible_truncation)]
        let mut body = vec![SOH, payload.len() as u8];
        body.extend_from_slice(&payload);
        body.push(ETX);
        add_crc(&body)
    }

    #[test]
    fn two_frame_happy_path_accumulates_in_order_and_acks_once() {
        let record0 = vec![1u8; 0x28];
        let record1 = vec![2u8; 0x28];

        let mut first_payload = vec![0x28u8];
        first_payload.extend_from_slice(&record0);
        let frame0 = build_frame(0x0000, &first_payload);

        let frame1 = build_frame(0x8001, &record1);

        let mut channel = MockChannel::with_inbound(&frame0);
        channel.push_inbound(&frame1);

        let result = run_transfer(&mut channel).unwrap();
        assert_eq!(result.record_size, 0x28);

        let records = result.into_records().unwrap();
        assert_eq!(records, vec![record0, record1]);

        assert_eq!(channel.sent_messages, vec![vec![ACK]]);
    }

    #[test]
    fn crc_failure_sends_nack_and_retries() {
        let record0 = vec![7u8; 4];
        let mut first_payload = vec![4u8];
        first_payload.extend_from_slice(&record0);
        let mut bad_frame = build_frame(0x0000, &first_payload);
        let last = bad_frame.len() - 1;
        bad_frame[last] ^= 0xFF;

        let good_frame = build_frame(0x8000, &record0);

        let mut channel = MockChannel::with_inbound(&bad_frame);
        channel.push_inbound(&good_frame);

        let result = run_transfer(&mut channel).unwrap();
        assert_eq!(result.accumulated, record0);
        assert_eq!(channel.sent_messages, vec![vec![NACK]]);
    }

    #[test]
    fn exhausting_retry_budget_fails() {
        let mut channel = MockChannel::default();
        let bad = {
            let mut f = build_frame(0x0000, &[4u8, 1, 2, 3, 4]);
            let last = f.len() - 1;
            f[last] ^= 0xFF;
            f
        };
        for _ in 0..=MAX_RETRIES {
            channel.push_inbound(&bad);
        }

        assert!(matches!(
            run_transfer(&mut channel),
            Err(CorusError::Communication(crate::error::CommunicationError::RetriesExhausted {
                ..
            }))
        ));
    }

    #[test]
    fn out_of_order_frame_number_is_fatal() {
        let first_payload = vec![4u8, 1, 2, 3, 4];
        let frame0 = build_frame(0x0000, &first_payload);
        let frame2 = build_frame(0x8002, &[5, 6, 7, 8]);

        let mut channel = MockChannel::with_inbound(&frame0);
        channel.push_inbound(&frame2);

        assert!(matches!(
            run_transfer(&mut channel),
            Err(CorusError::Protocol(ProtocolError::FrameOutOfOrder { .. }))
        ));
    }

    #[test]
    fn zero_record_size_is_rejected() {
        let frame0 = build_frame(0x8000, &[0u8]);
        let mut channel = MockChannel::with_inbound(&frame0);
        assert!(matches!(
            run_transfer(&mut channel),
            Err(CorusError::Protocol(ProtocolError::EmptyDatabaseResponse))
        ));
    }

    proptest! {
        #[test]
        fn n_frame_sequence_round_trips(record_count in 1usize..20, record_size in 1u8..32) {
            let records: Vec<Vec<u8>> =
                (0..record_count).map(|i| vec![i as u8; record_size as usize]).collect();

            let mut channel = MockChannel::default();
            for (i, record) in records.iter().enumerate() {
                let header = if i == 0 { 0 } else { i as u16 };
                let is_last = i + 1 == record_count;
                let header = if is_last { header | 0x8000 } else { header };
                let mut rest = Vec::new();
                if i == 0 {
                    rest.push(record_size);
                }
                rest.extend_from_slice(record);
                channel.push_inbound(&build_frame(header, &rest));
            }

            let result = run_transfer(&mut channel).unwrap();
            let expected: Vec<u8> = records.concat();
            prop_assert_eq!(result.accumulated, expected);
            prop_assert_eq!(result.record_size, record_size as usize);
            // one ACK per non-terminal frame
            prop_assert_eq!(channel.sent_messages.len(), record_count - 1);
        }
    }
}
