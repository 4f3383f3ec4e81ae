//! Voiceboard Common Library
//!
//! Wire framing, protocol vocabulary and reply helpers shared by the
//! voiceboard server and client.

mod error_kind;
pub mod framing;
pub mod io;
pub mod protocol;
pub mod validators;

pub use error_kind::ErrorKind;

/// Default port for the main (command and file transfer) connection
pub const DEFAULT_MAIN_PORT: u16 = 8080;

/// Default port for the notify (push) connection
pub const DEFAULT_NOTIFY_PORT: u16 = 8081;
