//! Protocol vocabulary for the main and notify connections
//!
//! The main connection carries request/response commands:
//!
//! | Tag    | Client sends after tag     | Server replies            |
//! |--------|----------------------------|---------------------------|
//! | `send` | tag author, blob recording | `ok`, tag id              |
//! | `get`  | tag id                     | `ok`, blob recording      |
//! | `list` | nothing                    | `ok`, blob JSON message list |
//! | `end`  | nothing                    | nothing, connection closes |
//!
//! Any command may instead be answered with an error frame: `err`, tag kind,
//! tag message (see [`crate::io::write_error`]).
//!
//! The notify connection carries a single signal, `notify`, in both
//! directions: client to server after an upload, server to every other
//! client as a wake-up.

use serde::{Deserialize, Serialize};

/// Upload a recording
pub const TAG_SEND: &str = "send";
/// Download a recording by id
pub const TAG_GET: &str = "get";
/// List all messages
pub const TAG_LIST: &str = "list";
/// Close the main connection
pub const TAG_END: &str = "end";
/// New content available (notify connection)
pub const TAG_NOTIFY: &str = "notify";
/// Successful reply status
pub const TAG_OK: &str = "ok";
/// Error reply status, followed by kind and message tags
pub const TAG_ERR: &str = "err";

/// A command read from the main connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Send,
    Get,
    List,
    End,
}

impl Command {
    /// Parse a command tag
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            TAG_SEND => Some(Self::Send),
            TAG_GET => Some(Self::Get),
            TAG_LIST => Some(Self::List),
            TAG_END => Some(Self::End),
            _ => None,
        }
    }

    /// The tag that introduces this command on the wire
    #[must_use]
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Send => TAG_SEND,
            Self::Get => TAG_GET,
            Self::List => TAG_LIST,
            Self::End => TAG_END,
        }
    }
}

/// One uploaded recording as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id, strictly increasing in upload order
    pub id: u64,
    /// Name the uploader gave
    pub author: String,
    /// Upload time (RFC 3339)
    pub created_at: String,
}

/// Parse a recording id sent as a tag
#[must_use]
pub fn parse_message_id(tag: &str) -> Option<u64> {
    tag.trim().parse().ok()
}

/// Encode a message listing for the `list` reply
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_message_list(messages: &[Message]) -> Result<String, serde_json::Error> {
    serde_json::to_string(messages)
}

/// Decode a message listing from the `list` reply blob
///
/// # Errors
///
/// Returns an error if the body is not a JSON array of messages.
pub fn decode_message_list(body: &[u8]) -> Result<Vec<Message>, serde_json::Error> {
    serde_json::from_slice(body)
}
