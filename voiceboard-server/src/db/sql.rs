//! SQL query constants for database operations

// ========================================================================
// Message Registry Operations
// ========================================================================

/// Insert a committed message
///
/// **Parameters:**
/// 1. `id: i64` - Server-assigned message id
/// 2. `author: &str` - Uploader name
/// 3. `created_at: &str` - RFC 3339 upload time
pub const SQL_INSERT_MESSAGE: &str =
    "INSERT INTO messages (id, author, created_at) VALUES (?, ?, ?)";

/// Load every message, oldest first
///
/// **Returns:** `(id: i64, author: String, created_at: String)`
pub const SQL_SELECT_ALL_MESSAGES: &str =
    "SELECT id, author, created_at FROM messages ORDER BY id ASC";
