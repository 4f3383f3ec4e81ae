//! Voiceboard Client Library
//!
//! A [`VoiceClient`] holds two connections to a voiceboard server: the main
//! connection for uploads, downloads and listings, and the notify connection
//! on which the server pushes a wake-up whenever someone else uploads.
//!
//! Recording and playback are the caller's business; recordings travel as
//! opaque bytes.

pub mod constants;
mod error;
mod network;

pub use error::ClientError;
pub use network::{ClientConfig, NotifyHandler, VoiceClient};
