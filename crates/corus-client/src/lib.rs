//! TCP client for the Corus metering protocol.
//!
//! Combines `corus-core`'s session state machine with a blocking TCP
//! [`transport::TcpChannel`] and exposes a single connect/read/write/
//! disconnect facade.
//!
//! # Components
//!
//! - [`CorusClient`]: connects, signs on, and issues operations
//! - [`ClientConfig`]: address, timeout, password, and database layout
//! - [`transport::TcpChannel`]: the blocking `ByteChannel` implementation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
pub mod transport;

pub use client::CorusClient;
pub use config::ClientConfig;
pub use corus_core::{CorusError, Session, SessionState};
pub use corus_proto::date::CorusDateTime;
pub use corus_proto::descriptor::ParameterDescriptor;
pub use corus_proto::message::{Database, WriteItem};
pub use corus_proto::value::{Kind, Value};
