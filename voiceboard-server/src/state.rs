//! Shared server state handed to every connection task

use std::time::Duration;

use voiceboard_common::framing::DEFAULT_MAX_FRAME_SIZE;

use crate::chat::ChatRegistry;
use crate::connection_registry::ConnectionRegistry;
use crate::constants::FRAME_TIMEOUT;
use crate::storage::AudioStore;

/// Everything a connection task needs, cheap to clone
#[derive(Debug, Clone)]
pub struct ServerState {
    pub chat: ChatRegistry,
    pub connections: ConnectionRegistry,
    pub store: AudioStore,
    /// Largest frame accepted from clients
    pub max_frame_size: u32,
    /// Time allowed to finish a frame once it has started
    pub frame_timeout: Duration,
}

impl ServerState {
    /// State with default limits and no clients connected
    pub fn new(chat: ChatRegistry, store: AudioStore) -> Self {
        Self {
            chat,
            connections: ConnectionRegistry::new(),
            store,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            frame_timeout: FRAME_TIMEOUT,
        }
    }

    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_frame_timeout(mut self, frame_timeout: Duration) -> Self {
        self.frame_timeout = frame_timeout;
        self
    }
}
