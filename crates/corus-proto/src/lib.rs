//! Wire format for the Corus metering protocol.
//!
//! This crate is transport-agnostic: it knows how to build request bytes,
//! validate and slice a response frame that has already been read off a
//! byte channel, and convert between wire bytes and typed values. It
//! performs no I/O.
//!
//! # Layout
//!
//! - [`crc`]: CRC-16 checksum.
//! - [`date`]: packed date/time codec.
//! - [`value`]: typed value codec (`Kind`, `Value`).
//! - [`descriptor`]: parameter id encoding.
//! - [`message`]: request builders.
//! - [`frame`]: response frame structure and control bytes.
//! - [`errors`]: [`errors::ProtocolError`] and [`errors::DataError`].

pub mod crc;
pub mod date;
pub mod descriptor;
pub mod errors;
pub mod frame;
pub mod message;
pub mod value;

pub use descriptor::ParameterDescriptor;
pub use errors::{DataError, ProtocolError, Result};
pub use frame::ResponseFrame;
pub use message::{Database, WriteItem};
pub use value::{Kind, Value};
