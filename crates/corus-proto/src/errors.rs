//! Error types for wire-level framing and value encoding.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Framing and decoding failures detected while parsing a response frame
/// or a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// First byte of a frame was not `SOH` (0x01).
    #[error("bad SOH: expected 0x01, got {found:#04x}")]
    BadStartOfHeading {
        /// Byte actually received.
        found: u8,
    },

    /// Byte following the payload was not `ETX` (0x03).
    #[error("bad ETX: expected 0x03, got {found:#04x}")]
    BadEndOfText {
        /// Byte actually received.
        found: u8,
    },

    /// The trailing CRC-16 did not match the recomputed checksum.
    #[error("CRC mismatch: frame claimed {claimed:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        /// CRC carried on the wire.
        claimed: u16,
        /// CRC recomputed over the received bytes.
        computed: u16,
    },

    /// A decoded field's byte length did not match the descriptor's expected
    /// width, or the sum of descriptor widths did not match the payload.
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// A database frame's frame number was not the predecessor's successor.
    #[error("frame out of order: expected {expected}, got {actual}")]
    FrameOutOfOrder {
        /// Expected frame number.
        expected: u16,
        /// Frame number actually carried.
        actual: u16,
    },

    /// The device replied with a database frame claiming a record size of
    /// zero, which can never split into records.
    #[error("empty database response: record size is zero")]
    EmptyDatabaseResponse,

    /// The accumulated database payload did not split evenly into
    /// `record_size`-wide records.
    #[error("trailing short record: {remainder} bytes left over, record size {record_size}")]
    TrailingShortRecord {
        /// Bytes left over after slicing off whole records.
        remainder: usize,
        /// Configured record width.
        record_size: usize,
    },

    /// An encode or decode routine was asked to operate on a kind it does
    /// not support (e.g. encoding a database-only kind).
    #[error("unsupported operation for kind {kind}: {reason}")]
    Unsupported {
        /// Name of the offending kind.
        kind: &'static str,
        /// Human-readable explanation.
        reason: &'static str,
    },
}

/// A value supplied to an encoder fell outside the representable range of
/// its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// An unsigned integer kind was given a value wider than its bit width.
    #[error("value {value} does not fit in {width} byte(s)")]
    IntegerOutOfRange {
        /// Value that was rejected.
        value: i128,
        /// Byte width of the target kind.
        width: usize,
    },

    /// A string value was longer than the fixed-width field it targets.
    #[error("string of {len} bytes does not fit in a {width}-byte field")]
    StringTooLong {
        /// Length of the offending string, in bytes.
        len: usize,
        /// Byte width of the target field.
        width: usize,
    },
}
