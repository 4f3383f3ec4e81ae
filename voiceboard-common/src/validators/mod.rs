//! Input validation functions
//!
//! Shared between client and server: clients pre-validate before sending,
//! the server enforces.

mod author;

pub use author::{AuthorError, MAX_AUTHOR_LENGTH, validate_author};
