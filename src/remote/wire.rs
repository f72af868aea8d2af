//! Wire-format structs for the sync protocol.
//!
//! Kept distinct from the domain types: the wire uses snake_case string
//! intensities and flat ids, and a single malformed entity must not poison
//! an entire batch, so conversion
//! is fallible and explicit rather than a `#[serde(from)]` shortcut.

use crate::domain::{Intensity, Metric, Symptom};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSymptom {
    pub id: String,
    pub name: String,
    pub other_names: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiIntensity {
    Low,
    Medium,
    High,
}

impl From<Intensity> for ApiIntensity {
    fn from(i: Intensity) -> Self {
        match i {
            Intensity::Low => ApiIntensity::Low,
            Intensity::Medium => ApiIntensity::Medium,
            Intensity::High => ApiIntensity::High,
        }
    }
}

impl From<ApiIntensity> for Intensity {
    fn from(i: ApiIntensity) -> Self {
        match i {
            ApiIntensity::Low => Intensity::Low,
            ApiIntensity::Medium => Intensity::Medium,
            ApiIntensity::High => Intensity::High,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMetric {
    pub id: String,
    pub symptom_id: String,
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub intensity: ApiIntensity,
    pub notes: String,
}

impl From<&Symptom> for ApiSymptom {
    fn from(s: &Symptom) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            other_names: s.other_names.clone(),
            updated_at: s.last_modified,
        }
    }
}

impl From<ApiSymptom> for Symptom {
    fn from(a: ApiSymptom) -> Self {
        Symptom { id: a.id, name: a.name, other_names: a.other_names, last_modified: a.updated_at }
    }
}

impl From<&Metric> for ApiMetric {
    fn from(m: &Metric) -> Self {
        Self {
            id: m.id.clone(),
            symptom_id: m.symptom_id.clone(),
            date: m.date,
            updated_at: m.last_modified,
            intensity: m.intensity.into(),
            notes: m.notes.clone(),
        }
    }
}

impl From<ApiMetric> for Metric {
    fn from(a: ApiMetric) -> Self {
        Metric {
            id: a.id,
            symptom_id: a.symptom_id,
            intensity: a.intensity.into(),
            date: a.date,
            notes: a.notes,
            last_modified: a.updated_at,
        }
    }
}

/// Raw element type kept as `serde_json::Value` rather than `ApiSymptom`/
/// `ApiMetric` directly: one malformed entity must not fail the whole
/// batch's deserialization, so each element is parsed individually by
/// the caller.
#[derive(Debug, Deserialize)]
pub struct GetAllResponse {
    pub symptoms: Vec<serde_json::Value>,
    pub metrics: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct PushAllRequest {
    pub symptoms: Vec<ApiSymptom>,
    pub metrics: Vec<ApiMetric>,
}

#[derive(Debug, Deserialize)]
pub struct PushAllOutcome<T> {
    pub successful: Vec<T>,
    pub failed: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct PushAllResponse {
    pub symptoms: PushAllOutcome<String>,
    pub metrics: PushAllOutcome<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedSymptomResponse {
    pub created_symptom: ApiSymptom,
}

#[derive(Debug, Deserialize)]
pub struct UpdatedSymptomResponse {
    pub updated_symptom: ApiSymptom,
}

#[derive(Debug, Deserialize)]
pub struct DeletedSymptomResponse {
    pub deleted_symptom: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedMetricResponse {
    pub created_metric: ApiMetric,
}

#[derive(Debug, Deserialize)]
pub struct UpdatedMetricResponse {
    pub updated_metric: ApiMetric,
}

#[derive(Debug, Deserialize)]
pub struct DeletedMetricResponse {
    pub deleted_metric: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
