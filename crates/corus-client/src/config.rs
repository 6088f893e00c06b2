//! Caller-supplied configuration for connecting to a device over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use corus_core::database::DatabaseCatalog;
use corus_core::session::SessionConfig;
use rust_decimal::Decimal;

/// Default per-call timeout (§6): long enough for the device's firmware
/// to service a request over a slow link, short enough that a dead
/// connection is noticed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Address and session parameters for one device.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP address of the device.
    pub address: SocketAddr,
    /// Per-call read/write timeout.
    pub timeout: Duration,
    /// Password echoed back during sign-on.
    pub password: String,
    /// Database record layouts, keyed by database and first-record
    /// byte length.
    pub database_layout: DatabaseCatalog,
    /// Pulse weight applied to fields marked `scaled_by_pulse_weight`.
    pub input_pulse_weight: Option<Decimal>,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout, default
    /// password, an empty database catalog, and no pulse weight.
    #[must_use]
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: DEFAULT_TIMEOUT,
            password: "00000000".to_string(),
            database_layout: DatabaseCatalog::new(),
            input_pulse_weight: None,
        }
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the sign-on password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the database record layout catalog.
    #[must_use]
    pub fn with_database_layout(mut self, layout: DatabaseCatalog) -> Self {
        self.database_layout = layout;
        self
    }

    /// Sets the pulse weight used to scale database fields.
    #[must_use]
    pub const fn with_input_pulse_weight(mut self, weight: Decimal) -> Self {
        self.input_pulse_weight = Some(weight);
        self
    }

    pub(crate) fn into_session_config(self) -> SessionConfig {
        SessionConfig {
            password: self.password,
            database_layout: self.database_layout,
            input_pulse_weight: self.input_pulse_weight,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_apply() {
        let config = ClientConfig::new("127.0.0.1:4059".parse().unwrap())
            .with_password("12345678")
            .with_timeout(Duration::from_secs(5))
            .with_input_pulse_weight(Decimal::new(25, 2));

        assert_eq!(config.password, "12345678");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.input_pulse_weight, Some(Decimal::new(25, 2)));
    }
}
