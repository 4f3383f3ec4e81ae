//! Frame-level errors

use std::io;

use thiserror::Error;

/// Errors produced while reading or writing frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Underlying I/O failure other than a peer disconnect
    #[error("I/O error: {0}")]
    Io(String),

    /// The peer closed or reset the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// The length prefix exceeds the reader's maximum
    #[error("frame length {length} exceeds maximum of {max} bytes")]
    FrameTooLarge { length: u64, max: u64 },

    /// A tag frame did not contain valid UTF-8
    #[error("tag is not valid UTF-8")]
    InvalidUtf8,

    /// The frame started but did not complete within the timeout
    #[error("frame timed out")]
    FrameTimeout,
}

impl FrameError {
    /// Whether this error is a normal peer departure rather than a fault
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }

    /// Whether the peer sent bytes that do not form a valid frame
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::FrameTooLarge { .. } | Self::InvalidUtf8)
    }
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::ConnectionClosed,
            _ => Self::Io(err.to_string()),
        }
    }
}
