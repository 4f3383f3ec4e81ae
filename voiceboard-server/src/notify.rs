//! Notify connection handling
//!
//! Each notify connection gets a handle in the [`ConnectionRegistry`] and two
//! halves: a writer task draining the handle's signal queue onto the socket,
//! and the reader loop below, which turns an inbound `notify` into a broadcast
//! to every other handle. The connection ends when either half stops.
//!
//! [`ConnectionRegistry`]: crate::connection_registry::ConnectionRegistry

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use voiceboard_common::framing::{FrameError, FrameReader, FrameWriter};
use voiceboard_common::protocol::TAG_NOTIFY;

use crate::connection_registry::{ConnectionRegistry, Signal};
use crate::state::ServerState;

/// Handle a notify connection until it closes
///
/// The handle is unregistered on the way out whatever the reason.
pub async fn handle_notify_connection<S>(socket: S, peer_addr: SocketAddr, state: ServerState)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, writer) = tokio::io::split(socket);
    let (handle, rx) = state.connections.register(peer_addr).await;
    let handle_id = handle.id;
    debug!(%peer_addr, handle_id, "notify connection registered");

    let mut writer_task = tokio::spawn(drain_signals(
        FrameWriter::new(writer),
        rx,
        state.connections.clone(),
        handle_id,
    ));

    let mut frame_reader = FrameReader::new(BufReader::new(reader));

    // An unwritable socket ends the connection even while the peer still sends
    let result: Result<(), FrameError> = tokio::select! {
        result = read_signals(&mut frame_reader, &state, handle_id, peer_addr) => result,
        _ = &mut writer_task => Ok(()),
    };

    state.connections.unregister(handle_id).await;
    writer_task.abort();

    match result {
        Ok(()) => debug!(%peer_addr, handle_id, "notify connection dropped after a failed write"),
        Err(e) if e.is_disconnect() => debug!(%peer_addr, handle_id, "notify connection closed"),
        Err(e) if e.is_malformed() => {
            warn!(%peer_addr, handle_id, error = %e, "notify connection sent a malformed frame")
        }
        Err(e) => debug!(%peer_addr, handle_id, error = %e, "notify connection failed"),
    }
}

/// Broadcast every inbound `notify` to the other handles until a read fails
async fn read_signals<R>(
    reader: &mut FrameReader<R>,
    state: &ServerState,
    handle_id: u64,
    peer_addr: SocketAddr,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let tag = reader.read_tag_with_timeout(state.frame_timeout).await?;
        if tag != TAG_NOTIFY {
            debug!(%peer_addr, tag = %tag, "ignoring unexpected tag on notify connection");
            continue;
        }

        let report = state
            .connections
            .broadcast(Signal::Notify, Some(handle_id))
            .await;
        debug!(
            %peer_addr,
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "notify broadcast"
        );
    }
}

/// Write queued signals until the queue closes or a write fails
async fn drain_signals<W>(
    mut writer: FrameWriter<W>,
    mut rx: mpsc::Receiver<Signal>,
    connections: ConnectionRegistry,
    handle_id: u64,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(signal) = rx.recv().await {
        if let Err(e) = writer.write_tag(signal.as_tag()).await {
            warn!(handle_id, error = %e, "notify delivery failed");
            connections.unregister(handle_id).await;
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRegistry;
    use crate::storage::AudioStore;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{DuplexStream, ReadBuf};
    use tokio::time::timeout;

    /// Writer whose every write fails, like a socket the peer has reset
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Stream that still reads from its peer but can no longer be written
    struct ReadOnlyStream(DuplexStream);

    impl AsyncRead for ReadOnlyStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for ReadOnlyStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn test_state(dir: &TempDir) -> ServerState {
        let store = AudioStore::open(dir.path()).await.unwrap();
        ServerState::new(ChatRegistry::new(), store)
    }

    fn open(state: &ServerState, port: u16) -> DuplexStream {
        let (client, server) = tokio::io::duplex(4096);
        let peer_addr = SocketAddr::from(([127, 0, 0, 1], port));
        tokio::spawn(handle_notify_connection(server, peer_addr, state.clone()));
        client
    }

    async fn wait_for_handles(state: &ServerState, expected: usize) {
        timeout(Duration::from_secs(5), async {
            while state.connections.len().await != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("registry never reached expected size");
    }

    #[tokio::test]
    async fn test_notify_reaches_others_only() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let (a_read, mut a_write) = tokio::io::split(open(&state, 1));
        let (b_read, _b_write) = tokio::io::split(open(&state, 2));
        let (c_read, _c_write) = tokio::io::split(open(&state, 3));
        wait_for_handles(&state, 3).await;

        FrameWriter::new(&mut a_write)
            .write_tag("notify")
            .await
            .unwrap();

        for read_half in [b_read, c_read] {
            let mut reader = FrameReader::new(read_half);
            let tag = timeout(Duration::from_secs(5), reader.read_tag())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(tag, "notify");
        }

        let mut sender = FrameReader::new(a_read);
        assert!(
            timeout(Duration::from_millis(100), sender.read_tag())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_unexpected_tag_ignored() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let (_a_read, mut a_write) = tokio::io::split(open(&state, 1));
        let (b_read, _b_write) = tokio::io::split(open(&state, 2));
        wait_for_handles(&state, 2).await;

        let mut writer = FrameWriter::new(&mut a_write);
        writer.write_tag("hello").await.unwrap();
        writer.write_tag("notify").await.unwrap();

        let mut reader = FrameReader::new(b_read);
        let tag = timeout(Duration::from_secs(5), reader.read_tag())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tag, "notify");
        assert_eq!(state.connections.len().await, 2);
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let _a = open(&state, 1);
        let b = open(&state, 2);
        wait_for_handles(&state, 2).await;

        drop(b);

        wait_for_handles(&state, 1).await;
    }

    #[tokio::test]
    async fn test_failed_write_unregisters_handle() {
        let registry = ConnectionRegistry::new();
        let (dead, dead_rx) = registry.register(SocketAddr::from(([127, 0, 0, 1], 1))).await;
        let (_other, mut other_rx) = registry.register(SocketAddr::from(([127, 0, 0, 1], 2))).await;
        let writer_task = tokio::spawn(drain_signals(
            FrameWriter::new(BrokenWriter),
            dead_rx,
            registry.clone(),
            dead.id,
        ));

        assert_eq!(registry.broadcast(Signal::Notify, None).await.delivered, 2);
        timeout(Duration::from_secs(5), writer_task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(registry.len().await, 1);
        assert_eq!(other_rx.try_recv().unwrap(), Signal::Notify);

        // Later broadcasts skip the dead handle and still reach the others
        let report = registry.broadcast(Signal::Notify, None).await;
        assert_eq!(report.delivered, 1);
        assert!(report.pruned.is_empty());
        assert_eq!(other_rx.try_recv().unwrap(), Signal::Notify);
    }

    #[tokio::test]
    async fn test_unwritable_connection_is_closed() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let (_client, server) = tokio::io::duplex(4096);
        let peer_addr = SocketAddr::from(([127, 0, 0, 1], 1));
        let task = tokio::spawn(handle_notify_connection(
            ReadOnlyStream(server),
            peer_addr,
            state.clone(),
        ));
        wait_for_handles(&state, 1).await;

        state.connections.broadcast(Signal::Notify, None).await;

        // The peer never hangs up, so only the failed write can end the task
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(state.connections.is_empty().await);
    }
}
