//! Machine-readable error kinds carried in error frames
//!
//! These kinds are serialized to strings on the wire, allowing clients to
//! react to the failure type (e.g., dropping a stale list entry on
//! `not_found`) without parsing the human-readable message.

use std::fmt;

use strum::{EnumString, IntoStaticStr};

/// Error kinds for main-connection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The requested recording id does not exist
    ///
    /// The connection stays open; the client may issue further commands.
    NotFound,

    /// The request was well-framed but semantically invalid
    ///
    /// Bad author, non-numeric id, empty recording or unknown command.
    Invalid,

    /// The server failed to store or load a recording
    ///
    /// Nothing was appended to the registry; the client may resubmit.
    IoError,
}

impl ErrorKind {
    /// Convert to the string representation used on the wire
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parse from the wire representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}
