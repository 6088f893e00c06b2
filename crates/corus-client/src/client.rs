//! Public facade combining [`TcpChannel`] with [`corus_core::Session`].

use std::collections::HashMap;

use corus_core::session::SessionState;
use corus_core::{CorusError, Session};
use corus_proto::date::CorusDateTime;
use corus_proto::descriptor::ParameterDescriptor;
use corus_proto::message::{Database, WriteItem};
use corus_proto::value::Value;

use crate::config::ClientConfig;
use crate::transport::TcpChannel;

/// A Corus client connected to one device over TCP.
///
/// Wraps [`corus_core::Session`] bound to a [`TcpChannel`] and drives the
/// connect/wakeup/sign-on sequence so callers only see "connected" or an
/// error.
pub struct CorusClient {
    session: Session<TcpChannel>,
}

impl CorusClient {
    /// Connects to the device at `config.address` and completes the
    /// wakeup and sign-on handshake.
    ///
    /// # Errors
    ///
    /// Returns [`CorusError::Communication`] if the TCP connection, the
    /// wakeup sequence, or the sign-on handshake fails.
    pub fn connect(config: ClientConfig) -> Result<Self, CorusError> {
        let channel = TcpChannel::new(config.address, config.timeout);
        let session_config = config.into_session_config();
        let mut session = Session::new(channel, session_config);

        session.connect()?;
        session.wakeup()?;
        session.sign_on()?;

        Ok(Self { session })
    }

    /// Current session lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Reads the given parameters. Parameters the device reports absent
    /// are omitted from the result.
    ///
    /// # Errors
    ///
    /// See [`corus_core::Session::read_parameters`].
    pub fn read_parameters(
        &mut self,
        descriptors: &[ParameterDescriptor],
    ) -> Result<HashMap<u16, Value>, CorusError> {
        self.session.read_parameters(descriptors)
    }

    /// Writes the given parameter values.
    ///
    /// # Errors
    ///
    /// See [`corus_core::Session::write_parameters`].
    pub fn write_parameters(&mut self, items: &[WriteItem]) -> Result<(), CorusError> {
        self.session.write_parameters(items)
    }

    /// Reads every available record of `database` within `[stop, start]`.
    ///
    /// # Errors
    ///
    /// See [`corus_core::Session::read_database`].
    pub fn read_database(
        &mut self,
        database: Database,
        start: Option<CorusDateTime>,
        stop: Option<CorusDateTime>,
    ) -> Result<Vec<HashMap<String, Value>>, CorusError> {
        self.session.read_database(database, start, stop)
    }

    /// Sends the break sequence and closes the connection.
    ///
    /// # Errors
    ///
    /// See [`corus_core::Session::break_session`].
    pub fn disconnect(mut self) -> Result<(), CorusError> {
        self.session.break_session()
    }
}
