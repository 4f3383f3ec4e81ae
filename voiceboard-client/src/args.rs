//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use voiceboard_common::framing::DEFAULT_MAX_FRAME_SIZE;
use voiceboard_common::{DEFAULT_MAIN_PORT, DEFAULT_NOTIFY_PORT};

use voiceboard_client::constants::DEFAULT_HOST;

/// Voiceboard client: share voice recordings with everyone on a server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server hostname or address
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port for main connections
    #[arg(short, long, default_value_t = DEFAULT_MAIN_PORT)]
    pub port: u16,

    /// Server port for notify connections
    #[arg(short, long, default_value_t = DEFAULT_NOTIFY_PORT)]
    pub notify_port: u16,

    /// Name shown next to your recordings (default: $USER)
    #[arg(short, long)]
    pub author: Option<String>,

    /// Largest frame accepted from the server, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: u32,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Action,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Action {
    /// Upload a recording
    Send {
        /// Audio file to upload
        file: PathBuf,
    },
    /// Download a recording by id
    Fetch {
        /// Message id
        id: u64,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List all messages
    List,
    /// Print the message list again whenever someone uploads
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["voiceboard", "list"]);

        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.notify_port, 8081);
        assert!(args.author.is_none());
        assert_eq!(args.command, Action::List);
    }

    #[test]
    fn test_fetch_with_output() {
        let args = Args::parse_from([
            "voiceboard",
            "--host",
            "voice.example.net",
            "-a",
            "alice",
            "fetch",
            "3",
            "-o",
            "clip.wav",
        ]);

        assert_eq!(args.host, "voice.example.net");
        assert_eq!(args.author.as_deref(), Some("alice"));
        assert_eq!(
            args.command,
            Action::Fetch {
                id: 3,
                output: Some(PathBuf::from("clip.wav")),
            }
        );
    }

    #[test]
    fn test_fetch_rejects_non_numeric_id() {
        assert!(Args::try_parse_from(["voiceboard", "fetch", "latest"]).is_err());
    }
}
