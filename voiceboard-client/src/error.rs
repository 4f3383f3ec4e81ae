//! Client error type

use std::io;

use thiserror::Error;
use voiceboard_common::ErrorKind;
use voiceboard_common::framing::FrameError;
use voiceboard_common::validators::AuthorError;

/// Errors surfaced to callers of [`VoiceClient`](crate::VoiceClient)
///
/// Nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection broke or a frame was malformed
    #[error("connection error: {0}")]
    Frame(#[from] FrameError),

    /// Connecting or local I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server has no recording with this id
    #[error("no recording with id {0}")]
    NotFound(u64),

    /// The server answered with an error frame
    #[error("server rejected request ({kind}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    /// The server answered with something other than a reply status
    #[error("unexpected reply from server: {0}")]
    UnexpectedReply(String),

    /// The message listing was not valid JSON
    #[error("malformed message list: {0}")]
    Decode(#[from] serde_json::Error),

    /// The author name would be refused by the server
    #[error("{0}")]
    InvalidAuthor(AuthorError),
}

impl ClientError {
    /// Whether the connection can no longer be used
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Io(_) | Self::UnexpectedReply(_))
    }
}
