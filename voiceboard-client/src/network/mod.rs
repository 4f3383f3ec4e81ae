//! Network connections to the voiceboard server

mod client;
mod connect;
mod constants;
mod listener;
mod types;

pub use client::VoiceClient;
pub use listener::NotifyHandler;
pub use types::ClientConfig;
