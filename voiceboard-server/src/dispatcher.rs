//! Main connection handling
//!
//! One task per accepted main connection. The task waits for a command tag,
//! runs the matching exchange to completion and goes back to waiting, until
//! the peer sends `end`, disconnects or breaks framing.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info, warn};

use voiceboard_common::ErrorKind;
use voiceboard_common::framing::{FrameError, FrameReader, FrameWriter};
use voiceboard_common::io::{write_error, write_ok};
use voiceboard_common::protocol::{Command, encode_message_list, parse_message_id};
use voiceboard_common::validators::{AuthorError, validate_author};

use crate::constants::*;
use crate::state::ServerState;

/// Handle a main connection until it closes
///
/// Errors never escape: they end this connection only and are logged.
pub async fn handle_main_connection<S>(socket: S, peer_addr: SocketAddr, state: ServerState)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    debug!(%peer_addr, "main connection opened");

    match dispatch(socket, peer_addr, &state).await {
        Ok(()) => debug!(%peer_addr, "main connection closed"),
        Err(e) if e.is_disconnect() => debug!(%peer_addr, "main connection dropped by peer"),
        Err(FrameError::FrameTimeout) => debug!(%peer_addr, "main connection timed out mid-frame"),
        Err(e) if e.is_malformed() => {
            info!(%peer_addr, error = %e, "main connection sent a malformed frame")
        }
        Err(e) => warn!(%peer_addr, error = %e, "main connection failed"),
    }
}

/// Per-connection context shared by the command handlers
struct Session<'a, R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    state: &'a ServerState,
    peer_addr: SocketAddr,
}

async fn dispatch<S>(socket: S, peer_addr: SocketAddr, state: &ServerState) -> Result<(), FrameError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, writer) = tokio::io::split(socket);
    let mut session = Session {
        reader: FrameReader::with_max_frame_size(BufReader::new(reader), state.max_frame_size),
        writer: FrameWriter::new(writer),
        state,
        peer_addr,
    };

    loop {
        let tag = session.read_tag().await?;
        match Command::parse(&tag) {
            Some(Command::Send) => session.handle_upload().await?,
            Some(Command::Get) => session.handle_download().await?,
            Some(Command::List) => session.handle_list().await?,
            Some(Command::End) => {
                let _ = session.writer.shutdown().await;
                return Ok(());
            }
            None => {
                // The peer is not speaking our protocol; tell it and stop reading
                debug!(%peer_addr, tag = %tag, "unknown command");
                let message = format!("{ERR_UNKNOWN_COMMAND}{tag}");
                let _ = write_error(&mut session.writer, ErrorKind::Invalid, &message).await;
                let _ = session.writer.shutdown().await;
                return Ok(());
            }
        }
    }
}

impl<R, W> Session<'_, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn read_tag(&mut self) -> Result<String, FrameError> {
        self.reader
            .read_tag_with_timeout(self.state.frame_timeout)
            .await
    }

    /// `send`: author tag, recording blob; replies `ok` + id
    ///
    /// Both frames are read before anything is validated so a rejected upload
    /// leaves the connection in sync.
    async fn handle_upload(&mut self) -> Result<(), FrameError> {
        let author = self.read_tag().await?;
        let payload = self
            .reader
            .read_blob_with_timeout(self.state.frame_timeout)
            .await?;

        if let Err(e) = validate_author(&author) {
            return write_error(&mut self.writer, ErrorKind::Invalid, author_error_message(&e)).await;
        }
        if payload.is_empty() {
            return write_error(&mut self.writer, ErrorKind::Invalid, ERR_EMPTY_RECORDING).await;
        }

        let id = self.state.chat.reserve_id();

        if let Err(e) = self.state.store.write(id, &payload).await {
            warn!(peer_addr = %self.peer_addr, id, error = %e, "failed to store recording");
            return write_error(&mut self.writer, ErrorKind::IoError, ERR_STORE_FAILED).await;
        }

        match self.state.chat.commit(id, &author).await {
            Ok(message) => {
                info!(
                    peer_addr = %self.peer_addr,
                    id = message.id,
                    author = %message.author,
                    bytes = payload.len(),
                    "recording stored"
                );
                write_ok(&mut self.writer).await?;
                self.writer.write_tag(&message.id.to_string()).await
            }
            Err(e) => {
                warn!(peer_addr = %self.peer_addr, id, error = %e, "failed to register recording");
                if let Err(e) = self.state.store.remove(id).await {
                    warn!(id, error = %e, "failed to remove unregistered recording");
                }
                write_error(&mut self.writer, ErrorKind::IoError, ERR_STORE_FAILED).await
            }
        }
    }

    /// `get`: id tag; replies `ok` + recording blob streamed from disk
    async fn handle_download(&mut self) -> Result<(), FrameError> {
        let tag = self.read_tag().await?;
        let Some(id) = parse_message_id(&tag) else {
            let message = format!("{ERR_INVALID_ID}{tag}");
            return write_error(&mut self.writer, ErrorKind::Invalid, &message).await;
        };

        if self.state.chat.get(id).await.is_none() {
            return self.write_not_found(id).await;
        }

        let (mut file, length) = match self.state.store.open_recording(id).await {
            Ok(Some(recording)) => recording,
            Ok(None) => {
                warn!(id, "registered recording is missing from disk");
                return self.write_not_found(id).await;
            }
            Err(e) => {
                warn!(id, error = %e, "failed to open recording");
                return write_error(&mut self.writer, ErrorKind::IoError, ERR_LOAD_FAILED).await;
            }
        };

        let Ok(length) = u32::try_from(length) else {
            warn!(id, length, "recording does not fit in a frame");
            return write_error(&mut self.writer, ErrorKind::IoError, ERR_LOAD_FAILED).await;
        };

        debug!(peer_addr = %self.peer_addr, id, bytes = length, "serving recording");
        write_ok(&mut self.writer).await?;
        self.writer.write_blob_from_reader(&mut file, length).await
    }

    /// `list`: replies `ok` + a blob holding the JSON array of every message,
    /// oldest first
    ///
    /// The listing grows with the registry, so it is not bounded by the tag
    /// limit.
    async fn handle_list(&mut self) -> Result<(), FrameError> {
        let messages = self.state.chat.list_all().await;
        match encode_message_list(&messages) {
            Ok(json) => {
                write_ok(&mut self.writer).await?;
                self.writer.write_blob(json.as_bytes()).await
            }
            Err(e) => {
                warn!(error = %e, "failed to encode message list");
                write_error(&mut self.writer, ErrorKind::IoError, ERR_LIST_FAILED).await
            }
        }
    }

    async fn write_not_found(&mut self, id: u64) -> Result<(), FrameError> {
        let message = format!("{ERR_NOT_FOUND}{id}");
        write_error(&mut self.writer, ErrorKind::NotFound, &message).await
    }
}

fn author_error_message(error: &AuthorError) -> &'static str {
    match error {
        AuthorError::Empty => ERR_AUTHOR_EMPTY,
        AuthorError::TooLong => ERR_AUTHOR_TOO_LONG,
        AuthorError::InvalidCharacters => ERR_AUTHOR_INVALID,
    }
}
