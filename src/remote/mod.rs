//! RemoteClient: the sync protocol over HTTPS.

pub mod wire;

use crate::domain::{Metric, Symptom};
use crate::error::{RemoteError, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wire::*;

/// Everything pulled in one `/get-all` round trip, already converted to
/// domain types. Entities that failed to parse are dropped and logged - a
/// single bad entity must not poison the whole batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PulledData {
    pub symptoms: Vec<Symptom>,
    pub metrics: Vec<Metric>,
}

/// Per-entity outcome of a `pushAll` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushAllOutcomes {
    pub symptoms_successful: Vec<String>,
    pub symptoms_failed: Vec<String>,
    pub metrics_successful: Vec<String>,
    pub metrics_failed: Vec<String>,
}

/// The trait-object seam between the sync engine and the transport: a
/// `HttpRemoteClient` in production, a `FakeRemote` in tests.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError>;
    async fn update_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError>;
    async fn delete_symptom(&self, id: &str) -> Result<(), RemoteError>;
    async fn create_metric(&self, metric: &Metric) -> Result<Metric, RemoteError>;
    async fn update_metric(&self, metric: &Metric) -> Result<Metric, RemoteError>;
    async fn delete_metric(&self, id: &str) -> Result<(), RemoteError>;
    async fn read_all(&self, published_since: DateTime<Utc>) -> Result<PulledData, RemoteError>;
    async fn push_all(
        &self,
        symptoms: &[Symptom],
        metrics: &[Metric],
    ) -> Result<PushAllOutcomes, RemoteError>;
    async fn health(&self) -> Result<(), RemoteError>;
}

/// Production `RemoteApi`: `reqwest` over the wire protocol.
pub struct HttpRemoteClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpRemoteClient {
    pub fn new(base_url: String, api_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client config is static and always valid");
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path)).header("x-api-key", &self.api_token)
    }

    /// Maps a completed response to either a parsed success body or the
    /// appropriate `RemoteError`, based on status code.
    /// `missing_entity` is the error to return for a 404 (delete-as-success
    /// callers translate that back to "treat as success" themselves).
    async fn parse<T: serde::de::DeserializeOwned>(
        response: Result<reqwest::Response, reqwest::Error>,
        not_found: RemoteError,
        generic_failure: impl Fn(String) -> RemoteError,
    ) -> Result<T, RemoteError> {
        let response = response.map_err(|e| {
            RemoteError::Transport(TransportError::FailedToConnectWithApi(e.to_string()))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found);
        }
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RemoteError::MalformedPayload(e.to_string()));
        }
        if let Ok(body) = response.json::<ErrorResponse>().await {
            return Err(generic_failure(body.error));
        }
        Err(generic_failure(format!("status {status}")))
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn create_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError> {
        let response = self.request(reqwest::Method::POST, "/symptoms").json(&ApiSymptom::from(symptom)).send().await;
        let parsed: CreatedSymptomResponse = Self::parse(
            response,
            RemoteError::SymptomDoesNotExist,
            RemoteError::FailedToCreateSymptom,
        )
        .await?;
        Ok(parsed.created_symptom.into())
    }

    async fn update_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError> {
        let path = format!("/symptoms/{}", symptom.id);
        let response = self.request(reqwest::Method::PATCH, &path).json(&ApiSymptom::from(symptom)).send().await;
        let parsed: UpdatedSymptomResponse = Self::parse(
            response,
            RemoteError::SymptomDoesNotExist,
            RemoteError::FailedToUpdateSymptom,
        )
        .await?;
        Ok(parsed.updated_symptom.into())
    }

    async fn delete_symptom(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("/symptoms/{id}");
        let response = self.request(reqwest::Method::DELETE, &path).send().await;
        let _: DeletedSymptomResponse = Self::parse(
            response,
            RemoteError::SymptomDoesNotExist,
            RemoteError::FailedToDeleteSymptom,
        )
        .await?;
        Ok(())
    }

    async fn create_metric(&self, metric: &Metric) -> Result<Metric, RemoteError> {
        let response = self.request(reqwest::Method::POST, "/metrics").json(&ApiMetric::from(metric)).send().await;
        let parsed: CreatedMetricResponse = Self::parse(
            response,
            RemoteError::MetricDoesNotExist,
            RemoteError::FailedToCreateMetric,
        )
        .await?;
        Ok(parsed.created_metric.into())
    }

    async fn update_metric(&self, metric: &Metric) -> Result<Metric, RemoteError> {
        let path = format!("/metrics/{}", metric.id);
        let response = self.request(reqwest::Method::PATCH, &path).json(&ApiMetric::from(metric)).send().await;
        let parsed: UpdatedMetricResponse = Self::parse(
            response,
            RemoteError::MetricDoesNotExist,
            RemoteError::FailedToUpdateMetric,
        )
        .await?;
        Ok(parsed.updated_metric.into())
    }

    async fn delete_metric(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("/metrics/{id}");
        let response = self.request(reqwest::Method::DELETE, &path).send().await;
        let _: DeletedMetricResponse = Self::parse(
            response,
            RemoteError::MetricDoesNotExist,
            RemoteError::FailedToDeleteMetric,
        )
        .await?;
        Ok(())
    }

    async fn read_all(&self, published_since: DateTime<Utc>) -> Result<PulledData, RemoteError> {
        let response = self
            .request(reqwest::Method::GET, "/get-all")
            .query(&[("published_since", published_since.to_rfc3339())])
            .send()
            .await;
        let parsed: GetAllResponse = Self::parse(
            response,
            RemoteError::MalformedPayload("unexpected 404 from /get-all".to_string()),
            RemoteError::MalformedPayload,
        )
        .await?;

        let symptoms = parsed
            .symptoms
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ApiSymptom>(raw) {
                Ok(a) => Some(Symptom::from(a)),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed symptom from get-all response");
                    None
                }
            })
            .collect();
        let metrics = parsed
            .metrics
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ApiMetric>(raw) {
                Ok(a) => Some(Metric::from(a)),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed metric from get-all response");
                    None
                }
            })
            .collect();
        Ok(PulledData { symptoms, metrics })
    }

    async fn push_all(
        &self,
        symptoms: &[Symptom],
        metrics: &[Metric],
    ) -> Result<PushAllOutcomes, RemoteError> {
        let body = PushAllRequest {
            symptoms: symptoms.iter().map(ApiSymptom::from).collect(),
            metrics: metrics.iter().map(ApiMetric::from).collect(),
        };
        let response = self.request(reqwest::Method::POST, "/push-all").json(&body).send().await;
        let parsed: PushAllResponse = Self::parse(
            response,
            RemoteError::MalformedPayload("unexpected 404 from /push-all".to_string()),
            RemoteError::MalformedPayload,
        )
        .await?;
        Ok(PushAllOutcomes {
            symptoms_successful: parsed.symptoms.successful,
            symptoms_failed: parsed.symptoms.failed,
            metrics_successful: parsed.metrics.successful,
            metrics_failed: parsed.metrics.failed,
        })
    }

    async fn health(&self) -> Result<(), RemoteError> {
        let response = self.request(reqwest::Method::GET, "/health").send().await.map_err(|e| {
            RemoteError::Transport(TransportError::FailedToConnectWithApi(e.to_string()))
        })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::MalformedPayload(format!("status {}", response.status())))
        }
    }
}

/// In-process test double satisfying the `RemoteApi` trait-object seam,
/// backing the sync-engine integration tests without a real server.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeRemote {
        pub symptoms: Mutex<std::collections::HashMap<String, Symptom>>,
        pub metrics: Mutex<std::collections::HashMap<String, Metric>>,
        /// If set, every call fails with a transport error (simulates being
        /// offline once the configured endpoint is otherwise reachable).
        pub offline: std::sync::atomic::AtomicBool,
    }

    impl FakeRemote {
        pub fn new() -> Self {
            Self::default()
        }

        fn check_online(&self) -> Result<(), RemoteError> {
            if self.offline.load(std::sync::atomic::Ordering::SeqCst) {
                Err(RemoteError::Transport(TransportError::FailedToConnectWithApi(
                    "fake remote is offline".to_string(),
                )))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RemoteApi for FakeRemote {
        async fn create_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError> {
            self.check_online()?;
            self.symptoms.lock().unwrap().insert(symptom.id.clone(), symptom.clone());
            Ok(symptom.clone())
        }

        async fn update_symptom(&self, symptom: &Symptom) -> Result<Symptom, RemoteError> {
            self.check_online()?;
            let mut map = self.symptoms.lock().unwrap();
            if !map.contains_key(&symptom.id) {
                return Err(RemoteError::SymptomDoesNotExist);
            }
            map.insert(symptom.id.clone(), symptom.clone());
            Ok(symptom.clone())
        }

        async fn delete_symptom(&self, id: &str) -> Result<(), RemoteError> {
            self.check_online()?;
            if self.symptoms.lock().unwrap().remove(id).is_none() {
                return Err(RemoteError::SymptomDoesNotExist);
            }
            Ok(())
        }

        async fn create_metric(&self, metric: &Metric) -> Result<Metric, RemoteError> {
            self.check_online()?;
            self.metrics.lock().unwrap().insert(metric.id.clone(), metric.clone());
            Ok(metric.clone())
        }

        async fn update_metric(&self, metric: &Metric) -> Result<Metric, RemoteError> {
            self.check_online()?;
            let mut map = self.metrics.lock().unwrap();
            if !map.contains_key(&metric.id) {
                return Err(RemoteError::MetricDoesNotExist);
            }
            map.insert(metric.id.clone(), metric.clone());
            Ok(metric.clone())
        }

        async fn delete_metric(&self, id: &str) -> Result<(), RemoteError> {
            self.check_online()?;
            if self.metrics.lock().unwrap().remove(id).is_none() {
                return Err(RemoteError::MetricDoesNotExist);
            }
            Ok(())
        }

        async fn read_all(&self, published_since: DateTime<Utc>) -> Result<PulledData, RemoteError> {
            self.check_online()?;
            let symptoms = self
                .symptoms
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.last_modified >= published_since)
                .cloned()
                .collect();
            let metrics = self
                .metrics
                .lock()
                .unwrap()
                .values()
                .filter(|m| m.last_modified >= published_since)
                .cloned()
                .collect();
            Ok(PulledData { symptoms, metrics })
        }

        async fn push_all(
            &self,
            symptoms: &[Symptom],
            metrics: &[Metric],
        ) -> Result<PushAllOutcomes, RemoteError> {
            self.check_online()?;
            let mut outcomes = PushAllOutcomes::default();
            let mut symptom_map = self.symptoms.lock().unwrap();
            for s in symptoms {
                symptom_map.insert(s.id.clone(), s.clone());
                outcomes.symptoms_successful.push(s.id.clone());
            }
            let mut metric_map = self.metrics.lock().unwrap();
            for m in metrics {
                metric_map.insert(m.id.clone(), m.clone());
                outcomes.metrics_successful.push(m.id.clone());
            }
            Ok(outcomes)
        }

        async fn health(&self) -> Result<(), RemoteError> {
            self.check_online()
        }
    }
}
