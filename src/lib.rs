//! healthsync: an offline-first client that records symptoms and metrics
//! locally and bidirectionally syncs them with a remote server.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod local_store;
pub mod logging;
pub mod remote;
pub mod sync;
