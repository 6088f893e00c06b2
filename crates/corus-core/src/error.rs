//! Error taxonomy for session-level operations.
//!
//! Four categories, matching how a caller should react: a bad call
//! ([`ConfigError`]), a device or device-reply violation
//! ([`corus_proto::ProtocolError`]), a transport failure
//! ([`CommunicationError`]), and a value outside its representable range
//! ([`corus_proto::DataError`]). We avoid collapsing these into a single
//! flat error type so callers can match on category without string
//! matching.

use std::time::Duration;

use corus_proto::{DataError, ProtocolError};
use thiserror::Error;

/// The caller supplied something the session cannot act on, independent of
/// the device's state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A database name was not one of the known four (or event/parameter)
    /// logs.
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    /// A database read was requested without a layout for the database, or
    /// without a layout entry matching the first record's byte length.
    #[error("no record layout for database {database} at record length {record_length}")]
    MissingLayout {
        /// Database the read targeted.
        database: String,
        /// Byte length the device reported for its first record.
        record_length: usize,
    },

    /// A database field layout needs `scaled_by_pulse_weight` but no pulse
    /// weight was supplied.
    #[error("field {field} requires a pulse weight but none was configured")]
    MissingPulseWeight {
        /// Name of the field requiring scaling.
        field: String,
    },

    /// A write targeted a parameter descriptor marked not writable.
    #[error("parameter {id} is not writable")]
    NotWritable {
        /// Parameter id that was targeted.
        id: u16,
    },

    /// An operation was attempted from a session state that does not
    /// support it (§4.6).
    #[error("cannot call {operation} in state {state:?}")]
    InvalidState {
        /// Name of the attempted operation.
        operation: &'static str,
        /// The session's actual state at the time of the call.
        state: crate::session::SessionState,
    },
}

impl From<corus_proto::message::UnknownDatabaseName> for ConfigError {
    fn from(err: corus_proto::message::UnknownDatabaseName) -> Self {
        Self::UnknownDatabase(err.0)
    }
}

/// Transport-level failure: the byte channel itself misbehaved, or the
/// device did not hold up its end of a handshake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommunicationError {
    /// The underlying byte channel returned an I/O error.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// A `recv` or `send` call did not complete within the configured
    /// timeout.
    #[error("timed out after {elapsed:?}")]
    Timeout {
        /// How long the session waited before giving up.
        elapsed: Duration,
    },

    /// The device replied with three non-zero bytes to the wakeup
    /// sequence.
    #[error("device did not wake: expected three zero bytes, got {found:?}")]
    WakeupFailed {
        /// Bytes actually received.
        found: [u8; 3],
    },

    /// Sign-on completed but the device did not ACK the password echo.
    #[error("sign-on not acknowledged: expected ACK (0x06), got {found:#04x}")]
    SignOnNotAcked {
        /// Byte actually received.
        found: u8,
    },

    /// A write request received something other than ACK (0x06).
    #[error("write not acknowledged: expected ACK (0x06), got {found:#04x}")]
    WriteNotAcked {
        /// Byte actually received.
        found: u8,
    },

    /// The database transfer exhausted its NACK retry budget (3 retries)
    /// without a successful frame.
    #[error("database transfer exhausted retry budget after {retries} retries")]
    RetriesExhausted {
        /// Number of retries attempted before giving up.
        retries: u8,
    },
}

/// All errors a session operation can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorusError {
    /// See [`ConfigError`].
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// See [`corus_proto::ProtocolError`].
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// See [`CommunicationError`].
    #[error("communication error: {0}")]
    Communication(#[from] CommunicationError),

    /// See [`corus_proto::DataError`].
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl CorusError {
    /// Whether the error stems from the transport rather than from the
    /// device's reply content. A caller may choose to retry a fresh
    /// connection after a communication error; protocol and data errors
    /// indicate a broken assumption and should not be retried blindly.
    #[must_use]
    pub const fn is_communication(&self) -> bool {
        matches!(self, Self::Communication(_))
    }
}
