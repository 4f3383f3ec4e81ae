//! Registry of live notify connections
//!
//! Every accepted notify connection owns a writer task that drains a small
//! bounded queue onto its socket. The registry keeps the sending half of each
//! queue, so broadcasting never blocks on a slow or dead peer. A full queue
//! already holds a wake-up and is left as is; a closed one means the writer
//! has gone away and its handle is dropped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::warn;
use voiceboard_common::protocol::TAG_NOTIFY;

use crate::constants::NOTIFY_QUEUE_CAPACITY;

/// A signal pushed to notify connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// New content is available
    Notify,
}

impl Signal {
    /// The tag written on the wire for this signal
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Notify => TAG_NOTIFY,
        }
    }
}

/// A registered notify connection
#[derive(Debug, Clone)]
pub struct NotifyHandle {
    pub id: u64,
    pub peer_addr: SocketAddr,
    tx: mpsc::Sender<Signal>,
}

impl NotifyHandle {
    fn deliver(&self, signal: Signal) -> Result<(), DeliveryError> {
        match self.tx.try_send(signal) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(DeliveryError {
                handle_id: self.id,
                peer_addr: self.peer_addr,
            }),
        }
    }
}

/// A broadcast could not reach one recipient
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notify connection {handle_id} ({peer_addr}) is no longer writable")]
pub struct DeliveryError {
    pub handle_id: u64,
    pub peer_addr: SocketAddr,
}

/// Outcome of a broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Handles the signal was queued for, or that already had one pending
    pub delivered: usize,
    /// Handles removed because delivery failed
    pub pruned: Vec<u64>,
}

/// Set of notify connections, shared between all connection tasks
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    handles: Arc<RwLock<HashMap<u64, NotifyHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            handles: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a notify connection
    ///
    /// Returns the handle and the receiving end of its signal queue, which the
    /// connection's writer task drains.
    pub async fn register(
        &self,
        peer_addr: SocketAddr,
    ) -> (NotifyHandle, mpsc::Receiver<Signal>) {
        let (tx, rx) = mpsc::channel(NOTIFY_QUEUE_CAPACITY);
        let handle = NotifyHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            peer_addr,
            tx,
        };

        self.handles.write().await.insert(handle.id, handle.clone());
        (handle, rx)
    }

    /// Remove a handle; removing an unknown id is a no-op
    ///
    /// Returns whether the handle was registered.
    pub async fn unregister(&self, handle_id: u64) -> bool {
        self.handles.write().await.remove(&handle_id).is_some()
    }

    /// Queue `signal` for every registered handle except `except`
    ///
    /// Each handle is tried on its own. A failed delivery is logged and
    /// unregisters that handle only.
    pub async fn broadcast(&self, signal: Signal, except: Option<u64>) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        {
            let handles = self.handles.read().await;
            for handle in handles.values() {
                if Some(handle.id) == except {
                    continue;
                }
                match handle.deliver(signal) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!(error = %e, "broadcast delivery failed");
                        failed.push(e.handle_id);
                    }
                }
            }
        }

        if !failed.is_empty() {
            let mut handles = self.handles.write().await;
            for handle_id in &failed {
                handles.remove(handle_id);
            }
        }

        report.pruned = failed;
        report
    }

    /// Number of registered handles
    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_register_assigns_unique_ids() {
        let registry = ConnectionRegistry::new();

        let (first, _rx1) = registry.register(addr(1000)).await;
        let (second, _rx2) = registry.register(addr(1001)).await;

        assert_ne!(first.id, second.id);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = registry.register(addr(1000)).await;

        assert!(registry.unregister(handle.id).await);
        assert!(!registry.unregister(handle.id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        let registry = ConnectionRegistry::new();
        let (sender, mut sender_rx) = registry.register(addr(1000)).await;
        let (_other, mut other_rx) = registry.register(addr(1001)).await;

        let report = registry.broadcast(Signal::Notify, Some(sender.id)).await;

        assert_eq!(report.delivered, 1);
        assert!(report.pruned.is_empty());
        assert_eq!(other_rx.try_recv().unwrap(), Signal::Notify);
        assert!(sender_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_without_exception_reaches_all() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for port in 0..4 {
            receivers.push(registry.register(addr(2000 + port)).await.1);
        }

        let report = registry.broadcast(Signal::Notify, None).await;

        assert_eq!(report.delivered, 4);
        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), Signal::Notify);
        }
    }

    #[tokio::test]
    async fn test_broadcast_prunes_dead_handle() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = registry.register(addr(1000)).await;
        let (dead, rx_dead) = registry.register(addr(1001)).await;
        let (_c, mut rx_c) = registry.register(addr(1002)).await;
        drop(rx_dead);

        let report = registry.broadcast(Signal::Notify, None).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.pruned, vec![dead.id]);
        assert_eq!(registry.len().await, 2);
        assert_eq!(rx_a.try_recv().unwrap(), Signal::Notify);
        assert_eq!(rx_c.try_recv().unwrap(), Signal::Notify);

        // The dead handle is gone, so the next broadcast is clean
        let report = registry.broadcast(Signal::Notify, None).await;
        assert_eq!(report.delivered, 2);
        assert!(report.pruned.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_keeps_one_pending_signal() {
        let registry = ConnectionRegistry::new();
        let (_slow, mut rx) = registry.register(addr(1000)).await;

        for _ in 0..5 {
            let report = registry.broadcast(Signal::Notify, None).await;
            assert_eq!(report.delivered, 1);
            assert!(report.pruned.is_empty());
        }

        assert_eq!(rx.try_recv().unwrap(), Signal::Notify);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_empty_registry() {
        let registry = ConnectionRegistry::new();
        assert_eq!(
            registry.broadcast(Signal::Notify, None).await,
            BroadcastReport::default()
        );
    }

    #[test]
    fn test_signal_tag() {
        assert_eq!(Signal::Notify.as_tag(), "notify");
    }
}
