//! Frame writer for sending tags and blobs to a stream

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::FrameError;

/// Writes frames to an async writer
pub struct FrameWriter<W> {
    writer: W,
}

impl<W> FrameWriter<W> {
    /// Create a new frame writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Write a UTF-8 tag frame
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    pub async fn write_tag(&mut self, tag: &str) -> Result<(), FrameError> {
        self.write_frame(tag.as_bytes()).await
    }

    /// Write a binary blob frame
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or the blob does not fit a
    /// 32-bit length prefix.
    pub async fn write_blob(&mut self, blob: &[u8]) -> Result<(), FrameError> {
        self.write_frame(blob).await
    }

    /// Write a blob frame by copying `length` bytes from a reader
    ///
    /// This avoids loading a whole recording into memory when it is served
    /// straight from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or if the reader provides fewer
    /// than `length` bytes. In the latter case the frame is incomplete and the
    /// connection must not be reused.
    pub async fn write_blob_from_reader<R>(
        &mut self,
        reader: &mut R,
        length: u32,
    ) -> Result<(), FrameError>
    where
        R: AsyncRead + Unpin,
    {
        self.writer.write_all(&length.to_be_bytes()).await?;

        let copied = tokio::io::copy(&mut reader.take(u64::from(length)), &mut self.writer).await?;
        if copied < u64::from(length) {
            return Err(FrameError::Io(format!(
                "reader ended early: expected {length} bytes, got {copied}"
            )));
        }

        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and shut down the write half
    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn write_frame(&mut self, body: &[u8]) -> Result<(), FrameError> {
        let length = u32::try_from(body.len()).map_err(|_| FrameError::FrameTooLarge {
            length: body.len() as u64,
            max: u64::from(u32::MAX),
        })?;
        self.writer.write_all(&length.to_be_bytes()).await?;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_write_tag() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write_tag("get").await.unwrap();
        }

        assert_eq!(buffer, b"\x00\x00\x00\x03get");
    }

    #[tokio::test]
    async fn test_write_blob() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write_blob(&[0xde, 0xad, 0xbe, 0xef, 0x00]).await.unwrap();
        }

        assert_eq!(buffer, b"\x00\x00\x00\x05\xde\xad\xbe\xef\x00");
    }

    #[tokio::test]
    async fn test_write_empty_tag() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write_tag("").await.unwrap();
        }

        assert_eq!(buffer, b"\x00\x00\x00\x00");
    }

    #[tokio::test]
    async fn test_write_blob_from_reader() {
        let mut buffer = Vec::new();
        let payload = b"RIFF....WAVEfmt ";
        {
            let mut writer = FrameWriter::new(&mut buffer);
            let mut reader = Cursor::new(payload.as_slice());
            writer
                .write_blob_from_reader(&mut reader, payload.len() as u32)
                .await
                .unwrap();
        }

        let mut expected = (payload.len() as u32).to_be_bytes().to_vec();
        expected.extend_from_slice(payload);
        assert_eq!(buffer, expected);
    }

    #[tokio::test]
    async fn test_write_blob_from_reader_too_short() {
        let mut buffer = Vec::new();
        let mut writer = FrameWriter::new(&mut buffer);
        let mut reader = Cursor::new(b"Short".as_slice());

        let result = writer.write_blob_from_reader(&mut reader, 100).await;
        assert!(matches!(result, Err(FrameError::Io(_))));
    }
}
