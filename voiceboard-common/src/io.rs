//! Reply helpers shared by server and client
//!
//! This module sits between the protocol vocabulary ([`crate::protocol`]) and
//! the wire format ([`crate::framing`]): it writes and reads the status frames
//! that open every reply on the main connection.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::ErrorKind;
use crate::framing::{FrameError, FrameReader, FrameWriter};
use crate::protocol::{TAG_ERR, TAG_OK};

// =============================================================================
// Error Conversion
// =============================================================================

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(msg) => io::Error::other(msg),
            FrameError::ConnectionClosed => {
                io::Error::new(io::ErrorKind::ConnectionReset, "connection closed")
            }
            FrameError::FrameTimeout => io::Error::new(io::ErrorKind::TimedOut, "frame timed out"),
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

// =============================================================================
// Reply Writing
// =============================================================================

/// Write the success status that opens a reply
pub async fn write_ok<W>(writer: &mut FrameWriter<W>) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_tag(TAG_OK).await
}

/// Write an error frame: `err`, kind, message
pub async fn write_error<W>(
    writer: &mut FrameWriter<W>,
    kind: ErrorKind,
    message: &str,
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_tag(TAG_ERR).await?;
    writer.write_tag(kind.as_str()).await?;
    writer.write_tag(message).await
}

// =============================================================================
// Reply Reading
// =============================================================================

/// An error frame received from the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
}

/// The status that opened a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `ok`: the reply body follows
    Ok,
    /// `err`: the command failed, nothing else follows
    Err(RemoteError),
    /// Something that is not a reply status
    Unexpected(String),
}

/// Read the status that opens a reply
///
/// For an error frame the kind and message tags are consumed too, so the
/// connection is ready for the next command.
pub async fn read_reply<R>(reader: &mut FrameReader<R>) -> Result<Reply, FrameError>
where
    R: AsyncRead + Unpin,
{
    let status = reader.read_tag().await?;
    if status == TAG_OK {
        return Ok(Reply::Ok);
    }
    if status != TAG_ERR {
        return Ok(Reply::Unexpected(status));
    }

    let kind_tag = reader.read_tag().await?;
    let message = reader.read_tag().await?;
    match ErrorKind::parse(&kind_tag) {
        Some(kind) => Ok(Reply::Err(RemoteError { kind, message })),
        None => Ok(Reply::Unexpected(kind_tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ok_reply() {
        let mut buffer = Vec::new();
        write_ok(&mut FrameWriter::new(&mut buffer)).await.unwrap();

        let mut reader = FrameReader::new(buffer.as_slice());
        assert_eq!(read_reply(&mut reader).await.unwrap(), Reply::Ok);
    }

    #[tokio::test]
    async fn test_error_reply_consumes_whole_frame() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            write_error(&mut writer, ErrorKind::NotFound, "no recording 9")
                .await
                .unwrap();
            writer.write_tag("next").await.unwrap();
        }

        let mut reader = FrameReader::new(buffer.as_slice());
        assert_eq!(
            read_reply(&mut reader).await.unwrap(),
            Reply::Err(RemoteError {
                kind: ErrorKind::NotFound,
                message: "no recording 9".to_string(),
            })
        );
        assert_eq!(reader.read_tag().await.unwrap(), "next");
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let mut buffer = Vec::new();
        FrameWriter::new(&mut buffer)
            .write_tag("notify")
            .await
            .unwrap();

        let mut reader = FrameReader::new(buffer.as_slice());
        assert_eq!(
            read_reply(&mut reader).await.unwrap(),
            Reply::Unexpected("notify".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_error_kind() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write_tag(TAG_ERR).await.unwrap();
            writer.write_tag("exploded").await.unwrap();
            writer.write_tag("boom").await.unwrap();
        }

        let mut reader = FrameReader::new(buffer.as_slice());
        assert_eq!(
            read_reply(&mut reader).await.unwrap(),
            Reply::Unexpected("exploded".to_string())
        );
    }

    #[test]
    fn test_frame_error_to_io_error() {
        let err: io::Error = FrameError::ConnectionClosed.into();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);

        let err: io::Error = FrameError::InvalidUtf8.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
