//! Client session over the main and notify connections

use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use voiceboard_common::ErrorKind;
use voiceboard_common::io::{RemoteError, Reply, read_reply};
use voiceboard_common::protocol::{
    Command, Message, TAG_NOTIFY, decode_message_list, parse_message_id,
};
use voiceboard_common::validators::validate_author;

use super::connect::open_channel;
use super::listener::{NotifyHandler, spawn_listener};
use super::types::{ClientConfig, Reader, Writer};
use crate::error::ClientError;

/// A connected voiceboard client
///
/// Commands on the main connection run one at a time, in call order. The
/// notify connection is read by a background task that calls the
/// [`NotifyHandler`] given to [`connect`](Self::connect).
pub struct VoiceClient {
    author: String,
    reader: Reader,
    writer: Writer,
    notify_writer: Writer,
    listener: JoinHandle<()>,
}

impl VoiceClient {
    /// Open the main connection, then the notify connection
    ///
    /// `author` is sent with every upload and must pass the same validation
    /// the server applies.
    pub async fn connect<H: NotifyHandler>(
        config: &ClientConfig,
        author: impl Into<String>,
        handler: H,
    ) -> Result<Self, ClientError> {
        let author = author.into();
        validate_author(&author).map_err(ClientError::InvalidAuthor)?;

        let (reader, writer) = open_channel(
            &config.host,
            config.main_port,
            config.max_frame_size,
            config.connect_timeout,
        )
        .await?;
        let (notify_reader, notify_writer) = open_channel(
            &config.host,
            config.notify_port,
            config.max_frame_size,
            config.connect_timeout,
        )
        .await?;
        debug!(
            host = %config.host,
            main_port = config.main_port,
            notify_port = config.notify_port,
            "connected"
        );

        Ok(Self {
            author,
            reader,
            writer,
            notify_writer,
            listener: spawn_listener(notify_reader, handler),
        })
    }

    /// Name sent with uploads
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Upload a recording and notify the other clients
    ///
    /// Returns the id the server assigned. A failed notification is logged,
    /// not returned: the upload itself has succeeded.
    pub async fn send(&mut self, audio: &[u8]) -> Result<u64, ClientError> {
        self.writer.write_tag(Command::Send.as_tag()).await?;
        self.writer.write_tag(&self.author).await?;
        self.writer.write_blob(audio).await?;
        expect_ok(read_reply(&mut self.reader).await?, None)?;

        let tag = self.reader.read_tag().await?;
        let id = parse_message_id(&tag).ok_or(ClientError::UnexpectedReply(tag))?;

        if let Err(e) = self.notify_writer.write_tag(TAG_NOTIFY).await {
            warn!(id, error = %e, "failed to send notification");
        }
        Ok(id)
    }

    /// Download a recording into memory
    pub async fn fetch(&mut self, id: u64) -> Result<Vec<u8>, ClientError> {
        self.request_recording(id).await?;
        Ok(self.reader.read_blob().await?)
    }

    /// Download a recording straight into `writer`
    ///
    /// Returns the number of bytes written.
    pub async fn fetch_into<W>(&mut self, id: u64, writer: &mut W) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin,
    {
        self.request_recording(id).await?;
        Ok(self.reader.stream_blob_to_writer(writer).await?)
    }

    /// Download a recording into a new file at `path`
    ///
    /// The file is created only once the server has accepted the request, so
    /// an unknown id leaves nothing behind. A transfer that breaks midway
    /// removes the partial file. Returns the number of bytes written.
    pub async fn fetch_to_path(&mut self, id: u64, path: &Path) -> Result<u64, ClientError> {
        self.request_recording(id).await?;

        let mut file = File::create(path).await?;
        let result = async {
            let bytes = self.reader.stream_blob_to_writer(&mut file).await?;
            file.sync_all().await?;
            Ok::<u64, ClientError>(bytes)
        }
        .await;

        if result.is_err() {
            drop(file);
            let _ = fs::remove_file(path).await;
        }
        result
    }

    /// List every message on the server, oldest first
    pub async fn list(&mut self) -> Result<Vec<Message>, ClientError> {
        self.writer.write_tag(Command::List.as_tag()).await?;
        expect_ok(read_reply(&mut self.reader).await?, None)?;

        let body = self.reader.read_blob().await?;
        Ok(decode_message_list(&body)?)
    }

    /// End the session and close both connections
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.writer.write_tag(Command::End.as_tag()).await?;
        self.writer.shutdown().await?;
        let _ = self.notify_writer.shutdown().await;
        Ok(())
    }

    async fn request_recording(&mut self, id: u64) -> Result<(), ClientError> {
        self.writer.write_tag(Command::Get.as_tag()).await?;
        self.writer.write_tag(&id.to_string()).await?;
        expect_ok(read_reply(&mut self.reader).await?, Some(id))
    }
}

impl Drop for VoiceClient {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Turn a reply status into a result
///
/// `not_found` maps to [`ClientError::NotFound`] when the request named `id`.
fn expect_ok(reply: Reply, id: Option<u64>) -> Result<(), ClientError> {
    match (reply, id) {
        (Reply::Ok, _) => Ok(()),
        (
            Reply::Err(RemoteError {
                kind: ErrorKind::NotFound,
                ..
            }),
            Some(id),
        ) => Err(ClientError::NotFound(id)),
        (Reply::Err(RemoteError { kind, message }), _) => {
            Err(ClientError::Rejected { kind, message })
        }
        (Reply::Unexpected(tag), _) => Err(ClientError::UnexpectedReply(tag)),
    }
}
