//! Command-line argument parsing

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use voiceboard_common::framing::DEFAULT_MAX_FRAME_SIZE;
use voiceboard_common::{DEFAULT_MAIN_PORT, DEFAULT_NOTIFY_PORT};
use voiceboard_server::constants::FRAME_TIMEOUT;

/// Get default audio root help text for current platform
fn default_audio_root_help() -> String {
    #[cfg(target_os = "linux")]
    return "Recording directory (default: ~/.local/share/voiceboard/audio/)".to_string();

    #[cfg(target_os = "macos")]
    return "Recording directory (default: ~/Library/Application Support/voiceboard/audio/)"
        .to_string();

    #[cfg(target_os = "windows")]
    return "Recording directory (default: %APPDATA%\\voiceboard\\audio\\)".to_string();

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return "Recording directory (overrides platform default)".to_string();
}

/// Voiceboard Server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port for main (command) connections
    #[arg(short, long, default_value_t = DEFAULT_MAIN_PORT)]
    pub port: u16,

    /// Port for notify connections
    #[arg(short, long, default_value_t = DEFAULT_NOTIFY_PORT)]
    pub notify_port: u16,

    /// Recording directory (overrides platform default)
    #[arg(short, long, help = default_audio_root_help())]
    pub audio_root: Option<PathBuf>,

    /// SQLite file for the message registry (in-memory when omitted)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Largest frame accepted from clients, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: u32,

    /// Seconds allowed to finish a frame once its first byte has arrived
    #[arg(long, default_value_t = FRAME_TIMEOUT.as_secs())]
    pub frame_timeout: u64,

    /// Enable debug logging (shows connect/disconnect messages)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}
