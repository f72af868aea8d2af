//! Metric: a single timestamped observation of a symptom.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    /// Buckets a 1..=10 numeric intensity into a category (1-3 low,
    /// 4-6 medium, 7-10 high).
    pub fn from_numeric(n: u8) -> Option<Self> {
        match n {
            1..=3 => Some(Intensity::Low),
            4..=6 => Some(Intensity::Medium),
            7..=10 => Some(Intensity::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub symptom_id: String,
    pub intensity: Intensity,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub last_modified: DateTime<Utc>,
}

impl Metric {
    pub fn new(
        id: String,
        symptom_id: String,
        intensity: Intensity,
        date: DateTime<Utc>,
        notes: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self { id, symptom_id, intensity, date, notes, last_modified: now }
    }

    /// Replaces the numeric-intensity prefix on `notes` (if any) with `n`,
    /// recomputing the categorical `intensity` to match, and sets
    /// `last_modified`. Uses the strict `1..=10` range matched by the UI
    /// selector.
    pub fn set_numeric_intensity(&mut self, n: u8, now: DateTime<Utc>) {
        let (_, rest) = parse_numeric_intensity(&self.notes);
        self.notes = match rest {
            Some(rest) if !rest.is_empty() => format!("{n}/10 - {rest}"),
            _ => format!("{n}/10"),
        };
        if let Some(intensity) = Intensity::from_numeric(n) {
            self.intensity = intensity;
        }
        self.last_modified = now;
    }
}

static NUMERIC_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(10|[1-9])/10(?:\s*-\s*(.*))?$").expect("valid regex"));

/// Parses the `N/10[ - rest]` numeric-intensity prefix out of a notes
/// string, where `N` is in `1..=10`. Returns `(Some(n), Some(rest))` when the
/// prefix is present (with `rest` possibly empty), or `(None, Some(notes))`
/// when the whole string is the "rest" because no prefix was found.
pub fn parse_numeric_intensity(notes: &str) -> (Option<u8>, Option<String>) {
    let trimmed = notes.trim();
    if let Some(caps) = NUMERIC_PREFIX_RE.captures(trimmed) {
        let n: u8 = caps[1].parse().expect("regex guarantees 1..=10");
        let rest = caps.get(2).map(|m| m.as_str().to_string());
        (Some(n), rest)
    } else {
        (None, Some(notes.to_string()))
    }
}
