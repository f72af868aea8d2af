//! ChangeToPush and the merge table.
//!
//! Uses a tagged record uniformly - no "class instance vs tagged record"
//! split.

use super::{Metric, Symptom};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeToPush {
    AddSymptom { symptom: Symptom },
    UpdateSymptom { symptom: Symptom },
    DeleteSymptom { id: String, deletion_date: DateTime<Utc> },
    AddMetric { metric: Metric },
    UpdateMetric { metric: Metric },
    DeleteMetric { id: String, deletion_date: DateTime<Utc> },
}

/// The three change categories the merge table reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCategory {
    Add,
    Update,
    Delete,
}

impl ChangeToPush {
    /// The entity id this change targets - the key the queue is indexed by.
    pub fn entity_id(&self) -> &str {
        match self {
            ChangeToPush::AddSymptom { symptom } | ChangeToPush::UpdateSymptom { symptom } => {
                &symptom.id
            }
            ChangeToPush::DeleteSymptom { id, .. } => id,
            ChangeToPush::AddMetric { metric } | ChangeToPush::UpdateMetric { metric } => {
                &metric.id
            }
            ChangeToPush::DeleteMetric { id, .. } => id,
        }
    }

    pub fn category(&self) -> ChangeCategory {
        match self {
            ChangeToPush::AddSymptom { .. } | ChangeToPush::AddMetric { .. } => ChangeCategory::Add,
            ChangeToPush::UpdateSymptom { .. } | ChangeToPush::UpdateMetric { .. } => {
                ChangeCategory::Update
            }
            ChangeToPush::DeleteSymptom { .. } | ChangeToPush::DeleteMetric { .. } => {
                ChangeCategory::Delete
            }
        }
    }

    /// The wall-clock date used to order two changes to the same entity:
    /// Add/Update carry `entity.last_modified`, Delete carries
    /// `deletion_date`.
    pub fn ordering_date(&self) -> DateTime<Utc> {
        match self {
            ChangeToPush::AddSymptom { symptom } | ChangeToPush::UpdateSymptom { symptom } => {
                symptom.last_modified
            }
            ChangeToPush::DeleteSymptom { deletion_date, .. } => *deletion_date,
            ChangeToPush::AddMetric { metric } | ChangeToPush::UpdateMetric { metric } => {
                metric.last_modified
            }
            ChangeToPush::DeleteMetric { deletion_date, .. } => *deletion_date,
        }
    }

    /// Re-tags this change's payload as an Add, keeping the payload as-is.
    /// Used by `merge` for the A,U -> "still an Add" case.
    fn retagged_as_add(self) -> Self {
        match self {
            ChangeToPush::UpdateSymptom { symptom } => ChangeToPush::AddSymptom { symptom },
            ChangeToPush::UpdateMetric { metric } => ChangeToPush::AddMetric { metric },
            other => other,
        }
    }
}

/// Returns the later of two timestamps.
pub fn later_of(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    if a >= b {
        a
    } else {
        b
    }
}

/// Merges two pending changes to the same entity. Returns `None` when the
/// merge cancels the entry out entirely (an add followed by a delete).
pub fn merge(existing: ChangeToPush, incoming: ChangeToPush) -> Option<ChangeToPush> {
    let (earliest, latest) = if existing.ordering_date() <= incoming.ordering_date() {
        (existing, incoming)
    } else {
        (incoming, existing)
    };

    match (earliest.category(), latest.category()) {
        (ChangeCategory::Add, ChangeCategory::Delete) => None,
        (ChangeCategory::Add, ChangeCategory::Update) => Some(latest.retagged_as_add()),
        (ChangeCategory::Update, ChangeCategory::Update) => Some(latest),
        (ChangeCategory::Update, ChangeCategory::Delete) => Some(latest),
        // A Delete followed by anything is precluded by this client's flows
        // if it is ever observed, the latest change wins.
        (ChangeCategory::Delete, _) => Some(latest),
        // Add,Add / Update,Add / Delete,Delete aren't reachable either (a
        // second Add to an id already pending an Add/Update would itself be
        // an Update by construction) - fall back to "latest wins".
        _ => Some(latest),
    }
}
