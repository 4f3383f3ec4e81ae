//! Frame reader for parsing tags and blobs from a stream

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use super::error::FrameError;
use super::limits::{
    DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE, MAX_TAG_LENGTH, STREAM_BUFFER_SIZE,
    check_frame_length,
};

/// Reads frames from an async reader
pub struct FrameReader<R> {
    reader: R,
    max_frame_size: u32,
}

impl<R> FrameReader<R> {
    /// Create a new frame reader with the default maximum frame size
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_size(reader, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame reader that rejects blobs larger than `max_frame_size`
    pub fn with_max_frame_size(reader: R, max_frame_size: u32) -> Self {
        Self {
            reader,
            max_frame_size,
        }
    }

    /// Tags are bounded by both the tag limit and the configured frame size
    fn max_tag_length(&self) -> u32 {
        MAX_TAG_LENGTH.min(self.max_frame_size)
    }
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Read the next tag frame
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ConnectionClosed`] if the stream ends before or
    /// during the frame, [`FrameError::FrameTooLarge`] for an oversized length
    /// prefix and [`FrameError::InvalidUtf8`] if the body is not text.
    ///
    /// # Note
    ///
    /// This method has no timeout. Servers should prefer
    /// [`read_tag_with_timeout`](Self::read_tag_with_timeout).
    pub async fn read_tag(&mut self) -> Result<String, FrameError> {
        let first_byte = self.read_byte().await?;
        self.read_tag_after_first_byte(first_byte).await
    }

    /// Read the next tag frame, bounding the time spent once it has started
    ///
    /// Waits indefinitely for the first byte so idle connections are allowed,
    /// then the rest of the frame must arrive within `frame_timeout`.
    pub async fn read_tag_with_timeout(
        &mut self,
        frame_timeout: Duration,
    ) -> Result<String, FrameError> {
        let first_byte = self.read_byte().await?;
        match timeout(frame_timeout, self.read_tag_after_first_byte(first_byte)).await {
            Ok(result) => result,
            Err(_) => Err(FrameError::FrameTimeout),
        }
    }

    /// Read the next blob frame
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ConnectionClosed`] if the stream ends before or
    /// during the frame and [`FrameError::FrameTooLarge`] if the length prefix
    /// exceeds the configured maximum.
    pub async fn read_blob(&mut self) -> Result<Vec<u8>, FrameError> {
        let first_byte = self.read_byte().await?;
        self.read_blob_after_first_byte(first_byte).await
    }

    /// Read the next blob frame, bounding the time spent once it has started
    pub async fn read_blob_with_timeout(
        &mut self,
        frame_timeout: Duration,
    ) -> Result<Vec<u8>, FrameError> {
        let first_byte = self.read_byte().await?;
        match timeout(frame_timeout, self.read_blob_after_first_byte(first_byte)).await {
            Ok(result) => result,
            Err(_) => Err(FrameError::FrameTimeout),
        }
    }

    /// Read the next blob frame and stream its body into `writer`
    ///
    /// Returns the number of bytes written.
    pub async fn stream_blob_to_writer<W>(&mut self, writer: &mut W) -> Result<u64, FrameError>
    where
        W: AsyncWrite + Unpin,
    {
        let first_byte = self.read_byte().await?;
        let length = self
            .read_length_after_first_byte(first_byte, self.max_frame_size)
            .await?;

        let mut remaining = u64::from(length);
        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE.min(length as usize)];
        while remaining > 0 {
            let to_read = (remaining as usize).min(buffer.len());
            let n = self.reader.read(&mut buffer[..to_read]).await?;
            if n == 0 {
                return Err(FrameError::ConnectionClosed);
            }
            writer.write_all(&buffer[..n]).await?;
            remaining -= n as u64;
        }
        writer.flush().await?;

        Ok(u64::from(length))
    }

    async fn read_tag_after_first_byte(&mut self, first_byte: u8) -> Result<String, FrameError> {
        let length = self
            .read_length_after_first_byte(first_byte, self.max_tag_length())
            .await?;
        let body = self.read_body(length).await?;
        String::from_utf8(body).map_err(|_| FrameError::InvalidUtf8)
    }

    async fn read_blob_after_first_byte(&mut self, first_byte: u8) -> Result<Vec<u8>, FrameError> {
        let length = self
            .read_length_after_first_byte(first_byte, self.max_frame_size)
            .await?;
        self.read_body(length).await
    }

    /// Complete the length prefix and validate it against `max`
    async fn read_length_after_first_byte(
        &mut self,
        first_byte: u8,
        max: u32,
    ) -> Result<u32, FrameError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix[0] = first_byte;
        self.reader.read_exact(&mut prefix[1..]).await?;
        check_frame_length(u32::from_be_bytes(prefix), max)
    }

    /// Read exactly `length` bytes
    ///
    /// The buffer grows as bytes arrive, so a lying length prefix cannot make
    /// us allocate more than one chunk ahead of the data actually received.
    async fn read_body(&mut self, length: u32) -> Result<Vec<u8>, FrameError> {
        let length = length as usize;
        let mut body = Vec::with_capacity(length.min(STREAM_BUFFER_SIZE));
        let received = (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut body)
            .await?;
        if received < length {
            return Err(FrameError::ConnectionClosed);
        }
        Ok(body)
    }

    async fn read_byte(&mut self) -> Result<u8, FrameError> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf).await?;
        Ok(buf[0])
    }
}
