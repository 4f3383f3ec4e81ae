//! Notify listener task
//!
//! Reads the notify connection in a plain loop, never inside `select!`, so a
//! read is never cancelled mid-frame. Each `notify` signal invokes the
//! handler; the task ends when the connection closes.

use tokio::task::JoinHandle;
use tracing::debug;

use voiceboard_common::protocol::TAG_NOTIFY;

use super::types::Reader;

/// Callback invoked when the server reports new content
///
/// Runs on the listener task, so it should return quickly; hand heavier work
/// (refreshing the list, downloading) to another task.
pub trait NotifyHandler: Send + Sync + 'static {
    fn on_notify(&self);
}

impl<F> NotifyHandler for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn on_notify(&self) {
        self()
    }
}

/// Spawn the task that turns inbound signals into handler calls
pub(super) fn spawn_listener<H: NotifyHandler>(mut reader: Reader, handler: H) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match reader.read_tag().await {
                Ok(tag) if tag == TAG_NOTIFY => handler.on_notify(),
                Ok(tag) => debug!(tag = %tag, "ignoring unexpected notify tag"),
                Err(e) => {
                    debug!(error = %e, "notify listener stopped");
                    break;
                }
            }
        }
    })
}
