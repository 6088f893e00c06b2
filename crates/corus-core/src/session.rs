//! Session state machine and its public operations (§4.6).
//!
//! Transitions are triggered only by the session's own methods; there is
//! no background task and no concurrency. Unlike a pure sans-I/O state
//! machine, each method here drives the byte channel directly — the
//! protocol is strictly half-duplex request/response, so there is nothing
//! gained by separating "decide" from "do".

use std::collections::HashMap;

use corus_proto::descriptor::ParameterDescriptor;
use corus_proto::message::{self, Database, WriteItem};
use corus_proto::value::Value;
use rust_decimal::Decimal;

use crate::channel::ByteChannel;
use crate::database::{self, DatabaseCatalog};
use crate::error::{CommunicationError, ConfigError, CorusError};
use crate::frame_reader;
use crate::parser;

const ACK: u8 = corus_proto::frame::ACK;
const WAKEUP_BYTES: usize = 200;
const SIGN_ON_REQUEST: &[u8] = b"/?!\r\n";
const SIGN_ON_ACK: &[u8] = &[0x06, 0x30, 0x37, 0x36, 0x0D, 0x0A];
const BREAK_MESSAGE: &[u8] = &[0x01, 0x42, 0x30, 0x03, 0x21, 0x31];

/// Lifecycle state of a [`Session`]. See §4.6 for the full transition
/// diagram; `Idle` and `Authenticated` are both "ready for the next
/// operation" and differ only in whether an operation has run yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection has been established.
    Disconnected,
    /// The transport is connected but the device has not been woken.
    Connected,
    /// The wakeup sequence succeeded.
    Awake,
    /// The device has replied with its identification line.
    Identified,
    /// The ACK/baud negotiation byte has been sent.
    PassPrompt,
    /// The password exchange completed; ready to issue operations.
    Authenticated,
    /// At least one operation has completed; ready for the next.
    Idle,
    /// The session has been torn down and must not be reused.
    Closed,
}

impl SessionState {
    const fn is_ready(self) -> bool {
        matches!(self, Self::Authenticated | Self::Idle)
    }
}

/// Configuration supplied by the caller (§6): password, timeout, and the
/// data-driven catalogs the protocol core does not define content for.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Password echoed back during sign-on. The device never actually
    /// validates it over TCP; it is carried for parity with serial
    /// deployments where it matters.
    pub password: String,
    /// Database record layouts, keyed by database and then by the byte
    /// length of the first record received.
    pub database_layout: DatabaseCatalog,
    /// Pulse weight used to scale fields marked `scaled_by_pulse_weight`.
    pub input_pulse_weight: Option<Decimal>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            password: "00000000".to_string(),
            database_layout: DatabaseCatalog::new(),
            input_pulse_weight: None,
        }
    }
}

/// A Corus session bound to one byte channel.
///
/// Generic over the channel implementation so the state machine and
/// operations can be exercised in tests against an in-memory channel,
/// with `corus-client` supplying the TCP implementation for production
/// use.
pub struct Session<C: ByteChannel> {
    channel: C,
    state: SessionState,
    config: SessionConfig,
}

fn require_state(actual: SessionState, operation: &'static str) -> Result<(), CorusError> {
    let ok = match operation {
        "connect" => actual == SessionState::Disconnected,
        "wakeup" => actual == SessionState::Connected,
        "sign_on" => actual == SessionState::Awake,
        "break_session" => actual.is_ready(),
        _ => actual.is_ready(),
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidState { operation, state: actual }.into())
    }
}

impl<C: ByteChannel> Session<C> {
    /// Creates a new, disconnected session over `channel`.
    #[must_use]
    pub fn new(channel: C, config: SessionConfig) -> Self {
        Self { channel, state: SessionState::Disconnected, config }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Connects the underlying channel.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Communication`] if the channel fails to
    /// connect.
    pub fn connect(&mut self) -> Result<(), CorusError> {
        require_state(self.state, "connect")?;
        self.channel.connect()?;
        self.state = SessionState::Connected;
        tracing::debug!("connected");
        Ok(())
    }

    /// Sends the 200-byte hardware wakeup sequence and expects three zero
    /// bytes back.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Communication`] on a channel failure or a
    /// non-zero wakeup reply.
    pub fn wakeup(&mut self) -> Result<(), CorusError> {
        require_state(self.state, "wakeup")?;
        self.channel.send(&[0u8; WAKEUP_BYTES])?;
        let reply = self.channel.recv(3)?;
        if reply != [0, 0, 0] {
            let mut found = [0u8; 3];
            found.copy_from_slice(&reply);
            return Err(CommunicationError::WakeupFailed { found }.into());
        }
        self.state = SessionState::Awake;
        tracing::debug!("device woke");
        Ok(())
    }

    /// Runs the sign-on handshake: identification exchange, ACK/baud
    /// negotiation, and password echo.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Communication`] if the device does not ACK
    /// the password echo.
    pub fn sign_on(&mut self) -> Result<(), CorusError> {
        require_state(self.state, "sign_on")?;

        self.channel.send(SIGN_ON_REQUEST)?;
        let ident = self.channel.recv_until(b'/', b'\n')?;
        tracing::debug!("received identification: {:?}", ident);
        self.state = SessionState::Identified;

        self.channel.send(SIGN_ON_ACK)?;
        self.state = SessionState::PassPrompt;

        let challenge = self.channel.recv(6)?;
        self.channel.send(&challenge)?;

        let ack = self.channel.recv(1)?[0];
        if ack != ACK {
            return Err(CommunicationError::SignOnNotAcked { found: ack }.into());
        }
        self.state = SessionState::Authenticated;
        tracing::debug!("sign-on complete");
        Ok(())
    }

    /// Sends the precomputed break sequence and disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Communication`] on a channel failure.
    pub fn break_session(&mut self) -> Result<(), CorusError> {
        require_state(self.state, "break_session")?;
        self.channel.send(BREAK_MESSAGE)?;
        self.channel.disconnect()?;
        self.state = SessionState::Closed;
        tracing::debug!("session closed");
        Ok(())
    }

    /// Reads the given parameters and returns the present ones keyed by
    /// id. Absent fields (the device replied with an all-`0xFF` field)
    /// are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Protocol`] on a framing violation, or
    /// [`CorusError::Communication`] on a channel failure.
    pub fn read_parameters(
        &mut self,
        descriptors: &[ParameterDescriptor],
    ) -> Result<HashMap<u16, Value>, CorusError> {
        require_state(self.state, "read_parameters")?;
        let request = message::read_request(descriptors);
        self.channel.send(&request)?;
        let payload = frame_reader::read_validated(&mut self.channel)?;
        let result = parser::parse_parameters(&payload, descriptors)?;
        self.state = SessionState::Idle;
        Ok(result)
    }

    /// Writes the given parameter values and expects a single ACK byte
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Config`] if an item targets a read-only kind,
    /// [`CorusError::Protocol`] if a value cannot be encoded for its kind,
    /// or [`CorusError::Communication`] if the device does not ACK.
    pub fn write_parameters(&mut self, items: &[WriteItem]) -> Result<(), CorusError> {
        require_state(self.state, "write_parameters")?;
        for item in items {
            if !item.descriptor.kind.is_writable() {
                return Err(ConfigError::NotWritable { id: item.descriptor.id }.into());
            }
        }
        let request = message::write_request(items)?;
        self.channel.send(&request)?;
        let ack = self.channel.recv(1)?[0];
        if ack != ACK {
            return Err(CommunicationError::WriteNotAcked { found: ack }.into());
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Reads every available record from `database` in `[stop, start]`.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Config`] if no layout is configured for the
    /// database at the byte length the device reports, and the same
    /// failure modes as [`database::run_transfer`] and
    /// [`parser::parse_record`].
    pub fn read_database(
        &mut self,
        database: Database,
        start: Option<corus_proto::date::CorusDateTime>,
        stop: Option<corus_proto::date::CorusDateTime>,
    ) -> Result<Vec<HashMap<String, Value>>, CorusError> {
        require_state(self.state, "read_database")?;
        let request = message::read_database_request(database, start, stop);
        self.channel.send(&request)?;

        let transfer = database::run_transfer(&mut self.channel)?;
        let record_size = transfer.record_size;
        let layout = self
            .config
            .database_layout
            .get(&database)
            .and_then(|by_length| by_length.get(&record_size))
            .ok_or_else(|| ConfigError::MissingLayout {
                database: format!("{database:?}"),
                record_length: record_size,
            })?
            .clone();

        let records = transfer.into_records()?;
        let pulse_weight = self.config.input_pulse_weight;
        let parsed = records
            .iter()
            .map(|record| parser::parse_record(record, &layout, pulse_weight))
            .collect::<Result<Vec<_>, _>>()?;

        self.state = SessionState::Idle;
        Ok(parsed)
    }

    /// As [`Session::read_database`], but takes the database as a lowercase
    /// name (`"interval"`, `"hourly"`, `"daily"`, `"monthly"`, `"event"`,
    /// `"parameter"`) rather than a [`Database`] value. Convenient when the
    /// database is chosen by configuration rather than by call-site code.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Config`] with [`ConfigError::UnknownDatabase`]
    /// if `name` is not one of the recognized names, plus the same failure
    /// modes as [`Session::read_database`].
    pub fn read_database_named(
        &mut self,
        name: &str,
        start: Option<corus_proto::date::CorusDateTime>,
        stop: Option<corus_proto::date::CorusDateTime>,
    ) -> Result<Vec<HashMap<String, Value>>, CorusError> {
        let database: Database = name.parse().map_err(ConfigError::from)?;
        self.read_database(database, start, stop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corus_proto::crc::add_crc;
    use corus_proto::frame::{ETX, SOH};
    use corus_proto::value::Kind;

    use super::*;
    use crate::channel::tests_support::MockChannel;

    fn authenticated_session() -> Session<MockChannel> {
        let mut channel = MockChannel::default();
        channel.push_inbound(&[0, 0, 0]);
        channel.push_inbound(b"/ABC123\n");
        channel.push_inbound(b"\x01\x02\x03\x04\x05\x06");
        channel.push_inbound(&[ACK]);

        let mut session = Session::new(channel, SessionConfig::default());
        session.connect().unwrap();
        session.wakeup().unwrap();
        session.sign_on().unwrap();
        session
    }

    #[test]
    fn happy_path_reaches_authenticated() {
        let session = authenticated_session();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn wakeup_before_connect_is_rejected() {
        let channel = MockChannel::default();
        let mut session = Session::new(channel, SessionConfig::default());
        assert!(session.wakeup().is_err());
    }

    #[test]
    fn wakeup_rejects_non_zero_reply() {
        let mut channel = MockChannel::default();
        channel.push_inbound(&[1, 2, 3]);
        let mut session = Session::new(channel, SessionConfig::default());
        session.connect().unwrap();
        assert!(matches!(
            session.wakeup(),
            Err(CorusError::Communication(CommunicationError::WakeupFailed { .. }))
        ));
    }

    #[test]
    fn read_parameters_updates_state_to_idle() {
        let mut session = authenticated_session();
        let body = add_crc(&[SOH, 1u8, 0x2A, ETX]);
        session.channel.push_inbound(&body);

        let descriptors = [ParameterDescriptor::new(1, Kind::Byte)];
        let result = session.read_parameters(&descriptors).unwrap();
        assert_eq!(result.get(&1), Some(&Value::Integer(42)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn write_parameters_requires_ack() {
        let mut session = authenticated_session();
        session.channel.push_inbound(&[0x15]); // NACK instead of ACK
        let item = WriteItem::new(ParameterDescriptor::new(1, Kind::Byte), Value::Integer(1));
        assert!(matches!(
            session.write_parameters(&[item]),
            Err(CorusError::Communication(CommunicationError::WriteNotAcked { .. }))
        ));
    }

    #[test]
    fn write_parameters_rejects_read_only_kind_before_sending() {
        let mut session = authenticated_session();
        let item = WriteItem::new(
            ParameterDescriptor::new(7, Kind::Index),
            Value::Decimal(rust_decimal::Decimal::ONE),
        );
        assert!(matches!(
            session.write_parameters(&[item]),
            Err(CorusError::Config(ConfigError::NotWritable { id: 7 }))
        ));
        // rejected before anything was sent on the wire
        assert!(session.channel.sent_messages.is_empty());
    }

    #[test]
    fn read_database_named_rejects_unknown_name() {
        let mut session = authenticated_session();
        assert!(matches!(
            session.read_database_named("weekly", None, None),
            Err(CorusError::Config(ConfigError::UnknownDatabase(name))) if name == "weekly"
        ));
    }
}
