//! Reads one `SOH | LEN | PAYLOAD | ETX | CRC16` response frame off a byte
//! channel.
//!
//! Splitting [`read_raw`] from [`read_validated`] lets the database engine
//! inspect a CRC failure and NACK instead of failing the whole transfer
//! (see [`crate::database`]), while a single-response read can fail fast.

use corus_proto::crc::crc_valid;
use corus_proto::frame::{ETX, SOH};
use corus_proto::ProtocolError;

use crate::channel::ByteChannel;
use crate::error::CorusError;

/// A frame read off the wire, with framing validated but CRC only
/// reported, not enforced.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Payload bytes (excluding `SOH`, length, `ETX`, CRC).
    pub payload: Vec<u8>,
    /// Whether the trailing CRC matched the recomputed checksum.
    pub crc_ok: bool,
    /// CRC carried on the wire.
    pub claimed_crc: u16,
    /// CRC recomputed locally.
    pub computed_crc: u16,
}

/// Reads one frame, validating `SOH` and `ETX` but not the CRC.
///
/// # Errors
///
/// Returns [`CorusError::Communication`] if a `recv` call fails, or
/// [`CorusError::Protocol`] if `SOH`/`ETX` do not match.
pub fn read_raw(channel: &mut impl ByteChannel) -> Result<RawFrame, CorusError> {
    let soh = channel.recv(1)?[0];
    if soh != SOH {
        return Err(ProtocolError::BadStartOfHeading { found: soh }.into());
    }

    let len = channel.recv(1)?[0] as usize;
    let payload = channel.recv(len)?;

    let etx = channel.recv(1)?[0];
    if etx != ETX {
        return Err(ProtocolError::BadEndOfText { found: etx }.into());
    }

    let crc_tail = channel.recv(2)?;
    let tail = [crc_tail[0], crc_tail[1]];

    #[allow(clippy::cast_possible_truncation)]
    let mut signed_region = vec![SOH, len as u8];
    signed_region.extend_from_slice(&payload);
    signed_region.push(ETX);

    let crc_ok = crc_valid(&signed_region, tail);
    let claimed_crc = u16::from_le_bytes(tail);
    let computed_crc = corus_proto::crc::crc16(&signed_region);

    Ok(RawFrame { payload, crc_ok, claimed_crc, computed_crc })
}

/// Reads one frame and fails immediately on a CRC mismatch. Used for
/// single-response reads (parameter reads/writes), where there is no
/// retry protocol.
///
/// # Errors
///
/// As [`read_raw`], plus [`CorusError::Protocol`] with
/// [`ProtocolError::CrcMismatch`] on checksum failure.
pub fn read_validated(channel: &mut impl ByteChannel) -> Result<Vec<u8>, CorusError> {
    let frame = read_raw(channel)?;
    if !frame.crc_ok {
        return Err(ProtocolError::CrcMismatch {
            claimed: frame.claimed_crc,
            computed: frame.computed_crc,
        }
        .into());
    }
    Ok(frame.payload)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corus_proto::crc::add_crc;

    use super::*;
    use crate::channel::tests_support::MockChannel;

    fn build(payload: &[u8]) -> Vec<u8> {
        #[allow(clippy::cast_possible_truncation)]
        let mut body = vec![SOH, payload.len() as u8];
        body.extend_from_slice(payload);
        body.push(ETX);
        add_crc(&body)
    }

    #[test]
    fn reads_well_formed_frame() {
        let mut channel = MockChannel::with_inbound(&build(b"hello"));
        let payload = read_validated(&mut channel).unwrap();
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn reports_crc_failure_without_erroring_in_read_raw() {
        let mut wire = build(b"hello");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let mut channel = MockChannel::with_inbound(&wire);
        let frame = read_raw(&mut channel).unwrap();
        assert!(!frame.crc_ok);
    }

    #[test]
    fn read_validated_fails_on_crc_mismatch() {
        let mut wire = build(b"hello");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let mut channel = MockChannel::with_inbound(&wire);
        assert!(matches!(
            read_validated(&mut channel),
            Err(CorusError::Protocol(ProtocolError::CrcMismatch { .. }))
        ));
    }
}
