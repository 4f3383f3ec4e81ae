//! Server-wide constants: directory names, startup messages and the text of
//! error frames sent to clients.

use std::time::Duration;

// =============================================================================
// Storage
// =============================================================================

/// Directory under the platform data dir that holds server state
pub const DATA_DIR_NAME: &str = "voiceboard";

/// Subdirectory of [`DATA_DIR_NAME`] holding recordings
pub const AUDIO_DIR_NAME: &str = "audio";

/// Extension of stored recordings
pub const AUDIO_EXTENSION: &str = "wav";

/// Extension appended while a recording is being written
pub const PART_EXTENSION: &str = "part";

// =============================================================================
// Timeouts
// =============================================================================

/// Time allowed to finish a frame once its first byte has arrived
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(60);

/// Idle time before TCP keepalive probes start on accepted sockets
pub const TCP_KEEPALIVE_TIME: Duration = Duration::from_secs(60);

// =============================================================================
// Notify
// =============================================================================

/// Signals queued per notify connection; one pending wake-up is enough
pub const NOTIFY_QUEUE_CAPACITY: usize = 1;

// =============================================================================
// Startup Messages
// =============================================================================

pub const MSG_BANNER: &str = "Voiceboard Server v";
pub const MSG_LISTENING: &str = "Listening for main connections on ";
pub const MSG_NOTIFY_LISTENING: &str = "Listening for notify connections on ";
pub const MSG_AUDIO_ROOT: &str = "Recordings: ";
pub const MSG_DATABASE: &str = "Database: ";
pub const MSG_IN_MEMORY: &str = "No database configured, message registry is in-memory only";
pub const MSG_SHUTDOWN_RECEIVED: &str = "Shutdown signal received, stopping";

// =============================================================================
// Startup Errors
// =============================================================================

pub const ERR_BIND_FAILED: &str = "Failed to bind ";
pub const ERR_ACCEPT: &str = "Failed to accept connection: ";
pub const ERR_NO_DATA_DIR: &str = "Unable to determine the platform data directory";
pub const ERR_AUDIO_ROOT: &str = "Failed to prepare recording directory ";
pub const ERR_DATABASE_INIT: &str = "Failed to open database: ";
pub const ERR_REGISTRY_LOAD: &str = "Failed to load message registry: ";
pub const ERR_SIGNAL_SIGTERM: &str = "Failed to install SIGTERM handler";
pub const ERR_SIGNAL_SIGINT: &str = "Failed to install SIGINT handler";
pub const ERR_SIGNAL_CTRLC: &str = "Failed to install Ctrl+C handler";

// =============================================================================
// Error Frame Messages (sent to clients)
// =============================================================================

pub const ERR_UNKNOWN_COMMAND: &str = "Unknown command: ";
pub const ERR_INVALID_ID: &str = "Recording id must be a non-negative integer: ";
pub const ERR_NOT_FOUND: &str = "No recording with id ";
pub const ERR_EMPTY_RECORDING: &str = "Recording is empty";
pub const ERR_AUTHOR_EMPTY: &str = "Author name is required";
pub const ERR_AUTHOR_TOO_LONG: &str = "Author name is too long";
pub const ERR_AUTHOR_INVALID: &str = "Author name contains invalid characters";
pub const ERR_STORE_FAILED: &str = "Failed to store recording, please retry";
pub const ERR_LOAD_FAILED: &str = "Failed to load recording";
pub const ERR_LIST_FAILED: &str = "Failed to encode message list";
