//! Enrich-and-squash: collapses a metric history down to one suggestion per
//! symptom, for a "log again?" quick-entry list.

use super::Metric;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSuggestion {
    pub symptom_id: String,
    pub most_recent: Metric,
    pub recorded_today: bool,
    pub recorded_in_past: bool,
}

/// Squashes `metrics` (expected newest first, matching
/// [`super::MetricStore::get_all`]'s order) down to one entry per symptom
/// id - the most recent metric for that symptom - flagged with whether the
/// symptom was logged today and/or on some earlier day within `metrics`.
pub fn enrich_and_squash(metrics: &[Metric], today: NaiveDate) -> Vec<MetricSuggestion> {
    let mut recorded_today = std::collections::HashSet::new();
    let mut recorded_in_past = std::collections::HashSet::new();
    for metric in metrics {
        if metric.date.date_naive() == today {
            recorded_today.insert(metric.symptom_id.clone());
        } else {
            recorded_in_past.insert(metric.symptom_id.clone());
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for metric in metrics {
        if !seen.insert(metric.symptom_id.clone()) {
            continue;
        }
        out.push(MetricSuggestion {
            recorded_today: recorded_today.contains(&metric.symptom_id),
            recorded_in_past: recorded_in_past.contains(&metric.symptom_id),
            symptom_id: metric.symptom_id.clone(),
            most_recent: metric.clone(),
        });
    }
    out
}
