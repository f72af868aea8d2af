//! The sync subsystem: the persisted change queue, the sync-status state
//! machine, and the tick-driven engine that pulls, reconciles, and pushes.

pub mod engine;
pub mod queue;
pub mod status;

pub use engine::{SyncEngine, SyncEngineConfig};
pub use queue::ChangeQueue;
pub use status::{StatusPublisher, SyncStatus};
