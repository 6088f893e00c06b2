//! Session state machine, database transfer engine, and response parser
//! for the Corus metering protocol.
//!
//! This crate sits between the pure wire codec in `corus-proto` and a
//! concrete transport. It owns everything stateful: the handshake, the
//! multi-frame database transfer's retry and ordering rules, and mapping
//! decoded bytes onto caller-supplied field layouts. [`channel::ByteChannel`]
//! is the only thing it asks of its transport.
//!
//! # Layout
//!
//! - [`channel`]: the [`channel::ByteChannel`] trait a transport implements.
//! - [`frame_reader`]: reads one response frame off a channel.
//! - [`database`]: record layouts and the multi-frame transfer engine.
//! - [`parser`]: splits a response payload into typed fields.
//! - [`session`]: the state machine and its public operations.
//! - [`error`]: [`error::CorusError`] and its categories.

pub mod channel;
pub mod database;
pub mod error;
pub mod frame_reader;
pub mod parser;
pub mod session;

pub use database::{DatabaseCatalog, FieldDescriptor, RecordLayout, RecordLengthLayout};
pub use error::{CommunicationError, ConfigError, CorusError};
pub use session::{Session, SessionConfig, SessionState};
