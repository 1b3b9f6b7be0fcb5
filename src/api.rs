//! HTTP transport to the QAFlow collection service.
//!
//! One authenticated POST per finalized session. The transport never retries;
//! a failed submission surfaces to the caller of `end()` and the session is
//! not resubmitted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReporterConfig;
use crate::types::TestReport;

/// Result type for transport operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from report submission
#[derive(Debug)]
pub enum ApiError {
    /// Request never completed (connect, TLS, timeout, body errors)
    Http(reqwest::Error),

    /// Service answered with a non-2xx status
    Status { code: u16, body: String },

    /// Service answered 2xx but the body was not a valid submit response
    InvalidResponse(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(err) => write!(f, "Request failed: {}", err),
            ApiError::Status { code, body } => {
                write!(f, "Service returned HTTP {}: {}", code, body)
            }
            ApiError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

/// Service acknowledgement for a submitted report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Whether the service accepted the report
    pub success: bool,

    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Server-side identifier for the stored report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

/// Delivery seam between the reporter and the collection service.
///
/// The reporter only ever hands over a finalized report; implementations
/// decide how it travels. Tests substitute an in-memory implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit_report(&self, report: &TestReport) -> ApiResult<SubmitResponse>;
}

/// Production transport: bearer-authenticated POST to the QAFlow API
pub struct QaflowApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl QaflowApi {
    pub fn new(config: &ReporterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn tests_url(&self) -> String {
        format!("{}/tests", self.endpoint)
    }
}

#[async_trait]
impl Transport for QaflowApi {
    async fn submit_report(&self, report: &TestReport) -> ApiResult<SubmitResponse> {
        debug!(
            name = %report.name,
            steps = report.steps.len(),
            "submitting test report"
        );

        let response = self
            .client
            .post(self.tests_url())
            .bearer_auth(&self.api_key)
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response
            .json::<SubmitResponse>()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tests_url_strips_trailing_slash() {
        let api = QaflowApi::new(&ReporterConfig::new("k").endpoint("https://example.test/api/"));
        assert_eq!(api.tests_url(), "https://example.test/api/tests");
    }

    #[test]
    fn test_submit_response_parses_minimal_body() {
        let parsed: SubmitResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.message, None);
        assert_eq!(parsed.report_id, None);
    }
}
