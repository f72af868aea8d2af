//! In-memory domain model: symptoms, metrics, settings, the autocomplete
//! index, and the change-event records that flow out of each store.

pub mod autocomplete;
pub mod change;
pub mod events;
pub mod ids;
pub mod metric;
pub mod metric_store;
pub mod settings;
pub mod settings_store;
pub mod suggestion;
pub mod symptom;
pub mod symptom_store;

pub use autocomplete::Autocompleter;
pub use change::{later_of, merge, ChangeCategory, ChangeToPush};
pub use events::{MetricEvent, SettingsEvent, SymptomEvent};
pub use ids::{generate_metric_id, generate_symptom_id};
pub use metric::{parse_numeric_intensity, Intensity, Metric};
pub use metric_store::MetricStore;
pub use settings::Settings;
pub use settings_store::SettingsStore;
pub use suggestion::{enrich_and_squash, MetricSuggestion};
pub use symptom::Symptom;
pub use symptom_store::SymptomStore;
