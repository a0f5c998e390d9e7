//! Error taxonomy for the client engine.
//!
//! Transport and framing failures abort the whole batch, protocol mismatches
//! carry the expected and actual values, simulator failures carry the
//! simulator's own description, and misuse of the API is reported as a
//! precondition error. Nothing here is retried automatically.

use thiserror::Error;
use wire::{ValueType, WireError};

#[derive(Debug, Error)]
pub enum TraciError {
    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing failure: {0}")]
    Wire(#[from] WireError),

    #[error("simulator rejected command 0x{command:02x} (result 0x{result:02x}): {description}")]
    Simulator {
        command: u8,
        result: u8,
        description: String,
    },

    #[error("unexpected command id: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedCommand { expected: u8, actual: u8 },

    #[error("unexpected variable id: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedVariable { expected: u8, actual: u8 },

    #[error("unexpected object id: expected '{expected}', got '{actual}'")]
    UnexpectedObject { expected: String, actual: String },

    #[error("expected {expected} responses, received {actual}")]
    ResponseCount { expected: usize, actual: usize },

    #[error("command 0x{0:02x} returned no value")]
    MissingResponse(u8),

    #[error("cannot read a {actual:?} value as {expected}")]
    ValueConversion {
        expected: &'static str,
        actual: ValueType,
    },

    #[error("reading variable 0x{variable:02x} of '{object}' requires a parameter")]
    MissingParameter { object: String, variable: u8 },

    #[error("changing variable 0x{variable:02x} of '{object}' requires a value")]
    MissingValue { object: String, variable: u8 },

    #[error("object '{0}' is no longer in the simulation")]
    Retired(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("could not connect to {addr} after {attempts} attempts: {source}")]
    ConnectFailed {
        addr: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("simulator process exited before accepting a connection: {0}")]
    ProcessExited(String),
}

impl TraciError {
    /// True for failures after which the byte stream can no longer be trusted
    pub fn is_fatal_for_connection(&self) -> bool {
        matches!(
            self,
            TraciError::Io(_) | TraciError::Wire(_) | TraciError::ResponseCount { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TraciError>;
