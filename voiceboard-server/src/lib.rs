//! Voiceboard Server Library
//!
//! This library exposes the server's internal modules for the binary and for
//! integration testing.

pub mod chat;
pub mod connection_registry;
pub mod constants;
pub mod db;
pub mod dispatcher;
pub mod notify;
pub mod server;
pub mod state;
pub mod storage;
