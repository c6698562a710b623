use crate::config::AppConfig;
use crate::dto::{decode_latest_analysis, decode_response_count, decode_summary, SummaryResponse};
use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The backend calls the summary flow depends on.
#[allow(async_fn_in_trait)]
pub trait AnalysisBackend {
    /// Ask the backend to summarize all responses of a survey.
    async fn summarize(&self, survey_id: i64) -> Result<SummaryResponse>;
    async fn latest_analysis(&self, survey_id: i64, kind: &str) -> Result<SummaryResponse>;
    async fn response_count(&self, survey_id: i64) -> Result<u64>;
}

/// Batch analyses the backend runs besides the summary. Their payloads are
/// passed through as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisJob {
    Keywords,
    BasicSentiment,
    /// Theme clustering; `k` is the cluster count, backend default when unset.
    Themes { k: Option<u32> },
}

impl AnalysisJob {
    pub fn path(&self) -> &'static str {
        match self {
            AnalysisJob::Keywords => "keywords",
            AnalysisJob::BasicSentiment => "basic-sentiment",
            AnalysisJob::Themes { .. } => "themes",
        }
    }
}

/// Thin client for the survey backend's AI analysis endpoints.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(backend_headers(&config.api_token)?)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn summary_url(&self, survey_id: i64) -> String {
        format!("{}/ai/summary/{}", self.base_url, survey_id)
    }

    pub fn latest_analysis_url(&self, survey_id: i64, kind: &str) -> String {
        format!("{}/ai/analysis/{}/latest/{}", self.base_url, survey_id, kind)
    }

    pub fn responses_url(&self, survey_id: i64) -> String {
        format!("{}/api/responses/survey/{}", self.base_url, survey_id)
    }

    fn job_request(&self, survey_id: i64, job: AnalysisJob) -> reqwest::RequestBuilder {
        let url = format!("{}/ai/{}/{}", self.base_url, job.path(), survey_id);
        let request = self.client.post(url).json(&serde_json::json!({}));
        match job {
            AnalysisJob::Themes { k: Some(k) } => request.query(&[("k", k)]),
            _ => request,
        }
    }

    /// Start a batch analysis and return the backend's JSON as is, including
    /// `{ "ok": false, ... }` bodies.
    pub async fn run_analysis(&self, survey_id: i64, job: AnalysisJob) -> Result<Value> {
        info!("Requesting {} analysis for survey {}", job.path(), survey_id);
        send_json(self.job_request(survey_id, job)).await
    }
}

impl AnalysisBackend for BackendClient {
    async fn summarize(&self, survey_id: i64) -> Result<SummaryResponse> {
        info!("Requesting AI summary for survey {}", survey_id);
        let request = self.client.post(self.summary_url(survey_id)).json(&serde_json::json!({}));
        let body = send_json(request).await?;
        let summary = decode_summary(&body);
        if !summary.ok {
            warn!(
                "Backend returned no summary for survey {}: {}",
                survey_id,
                summary.error.as_deref().unwrap_or("unknown reason")
            );
        }
        Ok(summary)
    }

    async fn latest_analysis(&self, survey_id: i64, kind: &str) -> Result<SummaryResponse> {
        debug!("Fetching latest {} analysis for survey {}", kind, survey_id);
        let body = send_json(self.client.get(self.latest_analysis_url(survey_id, kind))).await?;
        Ok(decode_latest_analysis(&body))
    }

    async fn response_count(&self, survey_id: i64) -> Result<u64> {
        let body = send_json(self.client.get(self.responses_url(survey_id))).await?;
        let count = decode_response_count(&body);
        debug!("Survey {} has {} responses", survey_id, count);
        Ok(count)
    }
}

fn backend_headers(api_token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if !api_token.trim().is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {}", api_token.trim()))
            .map_err(|e| AppError::Config(format!("API token is not a valid header value: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Send a request and parse the JSON body.
///
/// A non-2xx response whose body is `{ "ok": false, ... }` is returned as a
/// value so callers render "nothing to show" instead of failing.
async fn send_json(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    debug!("Backend responded {} with {} bytes", status, text.len());

    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    if let Ok(body) = serde_json::from_str::<Value>(&text) {
        if body.get("ok").and_then(Value::as_bool) == Some(false) {
            return Ok(body);
        }
    }

    Err(AppError::Api {
        status: status.as_u16(),
        message: map_api_error(status, &text),
    })
}

pub fn map_api_error(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 => "Not signed in or session expired. Set a valid API token.".to_string(),
        403 => "You do not have access to this survey.".to_string(),
        404 => "Survey not found.".to_string(),
        429 => "Rate limited. Please wait a moment and try again.".to_string(),
        500 | 502 | 503 | 504 => "The analysis backend is temporarily unavailable. Try again in a moment.".to_string(),
        _ => {
            let truncated: String = body.chars().take(200).collect();
            format!("API error ({}): {}", status, truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> BackendClient {
        let config = AppConfig {
            api_base_url: base_url.to_string(),
            ..AppConfig::default()
        };
        BackendClient::new(&config).expect("client should build")
    }

    #[test]
    fn unit_urls_are_built_without_double_slashes() {
        let client = client_for("https://survey.example.com/");
        assert_eq!(client.base_url(), "https://survey.example.com");
        assert_eq!(client.summary_url(9), "https://survey.example.com/ai/summary/9");
        assert_eq!(
            client.latest_analysis_url(9, "summary"),
            "https://survey.example.com/ai/analysis/9/latest/summary"
        );
        assert_eq!(client.responses_url(9), "https://survey.example.com/api/responses/survey/9");
    }

    #[test]
    fn unit_job_requests_target_their_endpoint() {
        let client = client_for("https://survey.example.com");
        let url_of = |job| {
            client
                .job_request(3, job)
                .build()
                .expect("request should build")
                .url()
                .to_string()
        };

        assert_eq!(url_of(AnalysisJob::Keywords), "https://survey.example.com/ai/keywords/3");
        assert_eq!(
            url_of(AnalysisJob::BasicSentiment),
            "https://survey.example.com/ai/basic-sentiment/3"
        );
        assert_eq!(url_of(AnalysisJob::Themes { k: None }), "https://survey.example.com/ai/themes/3");
        assert_eq!(
            url_of(AnalysisJob::Themes { k: Some(5) }),
            "https://survey.example.com/ai/themes/3?k=5"
        );
    }

    #[test]
    fn unit_new_rejects_invalid_config() {
        let config = AppConfig {
            api_base_url: "ftp://nope".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(BackendClient::new(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn unit_headers_carry_bearer_token_only_when_set() {
        let headers = backend_headers("").expect("headers should build");
        assert!(headers.get(AUTHORIZATION).is_none());

        let headers = backend_headers("abc").expect("headers should build");
        assert_eq!(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()), Some("Bearer abc"));

        assert!(backend_headers("bad\ntoken").is_err());
    }

    #[test]
    fn unit_map_api_error_covers_common_statuses() {
        assert!(map_api_error(StatusCode::UNAUTHORIZED, "").contains("API token"));
        assert_eq!(map_api_error(StatusCode::NOT_FOUND, ""), "Survey not found.");
        assert!(map_api_error(StatusCode::BAD_GATEWAY, "").contains("temporarily unavailable"));

        let long_body = "x".repeat(500);
        let message = map_api_error(StatusCode::BAD_REQUEST, &long_body);
        assert!(message.starts_with("API error (400 Bad Request)"));
        assert!(message.len() < 260);
    }
}
