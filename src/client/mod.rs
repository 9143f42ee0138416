//! HTTP client for the Trustigo fraud-scoring backend
//!
//! [`FraudApi`] is the seam the workflows and the CLI depend on; the
//! [`HttpFraudApi`] implementation speaks plain REST over `reqwest`.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AnalysisRun, AnalyticsSummary, FraudAlert, UploadResponse, UserDetail, UserRiskRecord,
};

mod request_log;

/// Alerts fetched when the caller does not ask for a specific amount
pub const DEFAULT_ALERT_LIMIT: u32 = 20;

/// Operations the dashboard performs against the backend
#[async_trait]
pub trait FraudApi: Send + Sync {
    /// `GET /fraud-users`
    async fn list_risk_users(&self) -> ApiResult<Vec<UserRiskRecord>>;

    /// `GET /user/{id}`
    async fn get_user(&self, user_id: i64) -> ApiResult<UserDetail>;

    /// `GET /analytics-summary`
    async fn get_analytics_summary(&self) -> ApiResult<AnalyticsSummary>;

    /// `POST /upload-csv` as multipart with a single `file` field
    async fn upload_dataset(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse>;

    /// `POST /run-fraud-analysis`
    async fn trigger_analysis_run(&self) -> ApiResult<AnalysisRun>;

    /// `GET /alerts?limit=N`, newest first
    async fn list_alerts(&self, limit: u32) -> ApiResult<Vec<FraudAlert>>;
}

/// `reqwest`-backed implementation of [`FraudApi`]
#[derive(Clone)]
pub struct HttpFraudApi {
    config: Config,
    client: Client,
}

impl HttpFraudApi {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("trustigo-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    async fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> ApiResult<Response> {
        request_log::request_started(method, path);
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                request_log::request_failed(method, path, &e, start.elapsed());
                return Err(ApiError::TransportError(e.to_string()));
            }
        };

        let status = response.status();
        request_log::request_completed(method, path, status, start.elapsed());

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.client.get(self.config.endpoint(path));
        let response = self.execute("GET", path, request).await?;
        decode(response).await
    }
}

#[async_trait]
impl FraudApi for HttpFraudApi {
    async fn list_risk_users(&self) -> ApiResult<Vec<UserRiskRecord>> {
        self.get_json("/fraud-users").await
    }

    async fn get_user(&self, user_id: i64) -> ApiResult<UserDetail> {
        self.get_json(&format!("/user/{}", user_id)).await
    }

    async fn get_analytics_summary(&self) -> ApiResult<AnalyticsSummary> {
        self.get_json("/analytics-summary").await
    }

    async fn upload_dataset(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse> {
        let path = "/upload-csv";
        let size = bytes.len();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| ApiError::ValidationError(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        tracing::info!(file_name = %file_name, bytes = size, "Uploading dataset");
        let request = self.client.post(self.config.endpoint(path)).multipart(form);
        let response = self.execute("POST", path, request).await?;
        decode(response).await
    }

    async fn trigger_analysis_run(&self) -> ApiResult<AnalysisRun> {
        let path = "/run-fraud-analysis";
        let request = self.client.post(self.config.endpoint(path));
        let response = self.execute("POST", path, request).await?;

        // The trigger has no required body; tolerate an empty one
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(AnalysisRun::default());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn list_alerts(&self, limit: u32) -> ApiResult<Vec<FraudAlert>> {
        self.get_json(&format!("/alerts?limit={}", limit)).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull `detail` out of a FastAPI-style error body
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".csv") {
        "text/csv"
    } else if lower.ends_with(".tsv") {
        "text/tab-separated-values"
    } else {
        "text/plain"
    }
}
