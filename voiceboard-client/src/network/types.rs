//! Network module type aliases and connection settings

use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use voiceboard_common::framing::{DEFAULT_MAX_FRAME_SIZE, FrameReader, FrameWriter};
use voiceboard_common::{DEFAULT_MAIN_PORT, DEFAULT_NOTIFY_PORT};

use super::constants::CONNECTION_TIMEOUT;
use crate::constants::DEFAULT_HOST;

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server hostname or address
    pub host: String,
    /// Port of the main (command) listener
    pub main_port: u16,
    /// Port of the notify listener
    pub notify_port: u16,
    /// Largest frame accepted from the server
    pub max_frame_size: u32,
    /// Time allowed for each TCP connect
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            main_port: DEFAULT_MAIN_PORT,
            notify_port: DEFAULT_NOTIFY_PORT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            connect_timeout: CONNECTION_TIMEOUT,
        }
    }
}

/// Read half of a connection with buffering and framing
pub type Reader = FrameReader<BufReader<OwnedReadHalf>>;

/// Write half of a connection with framing
pub type Writer = FrameWriter<OwnedWriteHalf>;
