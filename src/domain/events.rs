//! Change events emitted by the domain stores.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SymptomEvent {
    Initialized,
    Added { id: String },
    Updated { id: String },
    Deleted { id: String },
    /// Pulled data was merged in - the coordinator must persist and redraw
    /// without re-queueing a push.
    AddedFromExternalSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetricEvent {
    Initialized,
    Added { id: String },
    Updated { id: String },
    Deleted { id: String },
    AddedFromExternalSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SettingsEvent {
    Updated,
}
