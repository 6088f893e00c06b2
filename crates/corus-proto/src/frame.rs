//! Response frame structure: `SOH | LEN | PAYLOAD | ETX | CRC16`.
//!
//! Reading the frame off a byte channel is inherently incremental (the
//! length byte must be read before the payload length is known), so the
//! actual socket reads live with the session logic. This module only
//! validates and slices an already-assembled buffer, the way the frame
//! bytes look once collected.

use bytes::Bytes;

use crate::crc::crc_valid;
use crate::errors::{ProtocolError, Result};

/// Start of heading: marks the first byte of every frame.
pub const SOH: u8 = 0x01;
/// End of text: marks the last byte of the payload section.
pub const ETX: u8 = 0x03;
/// Positive acknowledgement, sent between database frames.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement, sent to request a database frame resend.
pub const NACK: u8 = 0x15;
/// End of transmission.
pub const EOT: u8 = 0x04;

/// A single decoded response frame: payload bytes with framing and CRC
/// already verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Payload bytes, excluding `SOH`, the length byte, `ETX`, and the CRC
    /// tail.
    pub payload: Bytes,
}

impl ResponseFrame {
    /// Validates and slices a complete `SOH | LEN | PAYLOAD | ETX | CRC16`
    /// buffer.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::BadStartOfHeading`] if `bytes[0] != SOH`.
    /// - [`ProtocolError::LengthMismatch`] if the buffer is shorter than
    ///   the declared length requires.
    /// - [`ProtocolError::BadEndOfText`] if the byte after the payload is
    ///   not `ETX`.
    /// - [`ProtocolError::CrcMismatch`] if the trailing CRC does not match.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let &[soh, len, ref rest @ ..] = bytes else {
            return Err(ProtocolError::LengthMismatch { expected: 5, actual: bytes.len() });
        };
        if soh != SOH {
            return Err(ProtocolError::BadStartOfHeading { found: soh });
        }

        let len = len as usize;
        let required = len + 1 + 2; // payload + ETX + CRC
        if rest.len() < required {
            return Err(ProtocolError::LengthMismatch { expected: required, actual: rest.len() });
        }

        let (payload, rest) = rest.split_at(len);
        let (&etx, crc_tail) = rest.split_first().expect("checked above");
        if etx != ETX {
            return Err(ProtocolError::BadEndOfText { found: etx });
        }

        let crc_tail = [crc_tail[0], crc_tail[1]];
        let signed_region = &bytes[..2 + len + 1];
        if !crc_valid(signed_region, crc_tail) {
            let claimed = u16::from_le_bytes(crc_tail);
            let computed = crate::crc::crc16(signed_region);
            return Err(ProtocolError::CrcMismatch { claimed, computed });
        }

        Ok(Self { payload: Bytes::copy_from_slice(payload) })
    }
}
