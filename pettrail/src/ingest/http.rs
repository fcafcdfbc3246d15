//! Reqwest-backed ingestion client.

use super::error::{classify_response, IngestError};
use super::types::{
    ApiErrorBody, PointsBatchRequest, PointsBatchResponse, SessionSummary, StartSessionResponse,
};
use super::IngestClient;
use crate::config::IngestSettings;
use crate::geo::GeoPoint;
use crate::queue::WalkId;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Production HTTP client for the walk ingestion service.
#[derive(Debug, Clone)]
pub struct HttpIngestClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIngestClient {
    /// Build a client from ingestion settings.
    ///
    /// The request timeout applies per attempt; retry scheduling is the
    /// drain engine's job, not this client's.
    pub fn new(settings: &IngestSettings) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn handle_response<T: DeserializeOwned>(
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, IngestError> {
        let response = match response {
            Ok(r) => r,
            // Connection refused, DNS failure, timeout: all retryable.
            Err(e) => return Err(IngestError::Transient(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| IngestError::Transient(format!("malformed response body: {e}")));
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        debug!(status = status.as_u16(), code = ?body.code, "ingestion request rejected");
        Err(classify_response(status.as_u16(), body.code, body.message))
    }
}

impl IngestClient for HttpIngestClient {
    async fn start_session(&self, pet_id: i64) -> Result<StartSessionResponse, IngestError> {
        let url = format!("{}/walks/start", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("petId", pet_id)])
            .send()
            .await;
        Self::handle_response(response).await
    }

    async fn submit_points(
        &self,
        walk_id: WalkId,
        points: &[GeoPoint],
    ) -> Result<PointsBatchResponse, IngestError> {
        let url = format!("{}/walks/{}/points", self.base_url, walk_id);
        let body = PointsBatchRequest::from_points(points);
        let response = self.client.post(&url).json(&body).send().await;
        Self::handle_response(response).await
    }

    async fn stop_session(&self, walk_id: WalkId) -> Result<SessionSummary, IngestError> {
        let url = format!("{}/walks/{}/stop", self.base_url, walk_id);
        let response = self.client.post(&url).send().await;
        Self::handle_response(response).await
    }
}
