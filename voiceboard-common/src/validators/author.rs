//! Author name validation
//!
//! The author travels as a tag with every upload and is shown next to each
//! recording in client lists.

use thiserror::Error;

/// Maximum length for author names in characters
pub const MAX_AUTHOR_LENGTH: usize = 32;

/// Validation error for author names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorError {
    /// Author is empty
    #[error("author name is empty")]
    Empty,
    /// Author exceeds maximum length
    #[error("author name is longer than {MAX_AUTHOR_LENGTH} characters")]
    TooLong,
    /// Author contains control characters or surrounding whitespace
    #[error("author name contains control characters or surrounding whitespace")]
    InvalidCharacters,
}

/// Validate an author name
///
/// Checks:
/// - Not empty
/// - Does not exceed maximum length (32 characters)
/// - No control characters
/// - No leading or trailing whitespace (inner spaces are fine)
///
/// # Errors
///
/// Returns an `AuthorError` variant describing the validation failure.
pub fn validate_author(author: &str) -> Result<(), AuthorError> {
    if author.is_empty() {
        return Err(AuthorError::Empty);
    }
    if author.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(AuthorError::TooLong);
    }
    if author.trim() != author || author.chars().any(char::is_control) {
        return Err(AuthorError::InvalidCharacters);
    }
    Ok(())
}
