//! Frame size limits

use super::error::FrameError;

/// Size of the big-endian length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Maximum body length for tag frames (64KB)
///
/// Tags carry commands, ids and author names. The JSON listing grows with
/// the registry and is sent as a blob.
pub const MAX_TAG_LENGTH: u32 = 64 * 1024;

/// Default maximum body length for blob frames (16MB)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Chunk size used when reading or streaming frame bodies (64KB)
pub(crate) const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Check a decoded length prefix against a maximum
///
/// # Errors
///
/// Returns [`FrameError::FrameTooLarge`] if `length` exceeds `max`.
pub fn check_frame_length(length: u32, max: u32) -> Result<u32, FrameError> {
    if length > max {
        return Err(FrameError::FrameTooLarge {
            length: u64::from(length),
            max: u64::from(max),
        });
    }
    Ok(length)
}
