//! # TraCI wire format
//!
//! Byte-exact encoding and decoding for the TraCI protocol spoken by the SUMO
//! traffic simulator. Everything here is transient: messages are built for one
//! round trip and then dropped.
//!
//! - [`buffer`]: big-endian cursor primitives
//! - [`command`]: self-framing commands (short and long length form)
//! - [`message`]: framed requests and status-led responses
//! - [`value`]: the typed value catalog
//! - [`constants`]: command, variable and type ids

pub mod buffer;
pub mod command;
pub mod constants;
pub mod error;
pub mod message;
pub mod value;

pub use buffer::{WireReader, WireWriter};
pub use command::Command;
pub use error::{Result, WireError};
pub use message::{RequestMessage, ResponseContainer, ResponseMessage, StatusResponse};
pub use value::{
    BoundingBox, Color, LonLatPosition, Polygon, Position2D, RoadMapPosition, Value, ValueType,
};
