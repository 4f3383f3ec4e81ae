//! TCP connection setup

use std::io;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;

use voiceboard_common::framing::{FrameReader, FrameWriter};

use super::types::{Reader, Writer};

/// Connect to `host:port` and wrap both halves in framing
pub(super) async fn open_channel(
    host: &str,
    port: u16,
    max_frame_size: u32,
    connect_timeout: Duration,
) -> io::Result<(Reader, Writer)> {
    let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection to {host}:{port} timed out"),
            ));
        }
    };
    stream.set_nodelay(true)?;

    let (reader, writer) = stream.into_split();
    Ok((
        FrameReader::with_max_frame_size(BufReader::new(reader), max_frame_size),
        FrameWriter::new(writer),
    ))
}
