use thiserror::Error;

/// Failures raised while framing or decoding TraCI bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer underflow: needed {needed} bytes, {remaining} remaining")]
    Underflow { needed: usize, remaining: usize },

    #[error("malformed command length {0}")]
    MalformedLength(usize),

    #[error("message declares {declared} bytes but {actual} were received")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unexpected value type: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedType { expected: u8, actual: u8 },

    #[error("unknown value type tag 0x{0:02x}")]
    UnknownType(u8),

    #[error("string is not valid UTF-8")]
    InvalidString,

    #[error("negative element count {0}")]
    NegativeCount(i32),

    #[error("polygon with {0} points exceeds the 255 point limit")]
    PolygonTooLarge(usize),

    #[error("{0} bytes do not fit in a single frame")]
    FrameTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, WireError>;
