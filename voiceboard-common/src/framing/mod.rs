//! Length-prefixed framing for the voiceboard wire protocol
//!
//! Every unit on the wire is a frame: a 4-byte big-endian unsigned length
//! followed by exactly that many bytes.
//!
//! ```text
//! +------------------+------------------------+
//! | length: u32 (BE) | body: `length` bytes   |
//! +------------------+------------------------+
//! ```
//!
//! A *tag* is a frame whose body is UTF-8 text (commands, ids, author names).
//! A *blob* is a frame whose body is arbitrary bytes (recordings, JSON
//! listings). Readers
//! reject a length above their configured maximum before allocating anything.

mod error;
mod limits;
mod reader;
mod writer;

pub use error::FrameError;
pub use limits::{DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE, MAX_TAG_LENGTH, check_frame_length};
pub use reader::FrameReader;
pub use writer::FrameWriter;
