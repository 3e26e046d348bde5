use std::time::Duration;

use bytes::Bytes;
use fastmusic_core::{AudioQuality, DownloadRequest, SearchResultItem};
use fm_logging::{fm_debug, fm_warn};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AudioPayload, BackendError, FailureKind};

const SEARCH_FAILED: &str = "Search failed";
const DOWNLOAD_FAILED: &str = "Download failed";
const HEALTH_FAILED: &str = "Health check failed";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Conversion happens while the request is open, so this is generous.
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            max_bytes: 200 * 1024 * 1024,
        }
    }
}

/// The conversion service, seen through its HTTP surface.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, BackendError>;

    async fn download(&self, request: &DownloadRequest) -> Result<AudioPayload, BackendError>;

    /// Returns the status string reported by the service.
    async fn health(&self) -> Result<String, BackendError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct DownloadBody<'a> {
    encoded_url: &'a str,
    quality: AudioQuality,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let mut base = Url::parse(&settings.base_url).map_err(|err| {
            BackendError::new(
                FailureKind::InvalidInput,
                format!("Invalid backend URL {:?}: {err}", settings.base_url),
            )
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::new(FailureKind::InvalidInput, err.to_string()))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Bytes, BackendError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(bytes))
    }

    async fn failure(&self, response: reqwest::Response, fallback: &str) -> BackendError {
        let status = response.status();
        let body = self.read_body(response).await.unwrap_or_default();
        error_from_body(status, &body, fallback)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BackendError::new(
                FailureKind::InvalidInput,
                "Please enter a search query",
            ));
        }

        let mut url = self.endpoint("search")?;
        url.query_pairs_mut().append_pair("q", query);
        fm_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(self.failure(response, SEARCH_FAILED).await);
        }

        let body = self.read_body(response).await?;
        let parsed: SearchResponse = serde_json::from_slice(&body).map_err(decode_error)?;
        Ok(parsed.results)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<AudioPayload, BackendError> {
        let url = self.endpoint("download")?;
        let body = serde_json::to_vec(&DownloadBody {
            encoded_url: request.locator.as_str(),
            quality: request.quality,
        })
        .map_err(|err| BackendError::new(FailureKind::InvalidInput, err.to_string()))?;
        fm_debug!("POST {} quality={}", url, request.quality.as_wire());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(self.failure(response, DOWNLOAD_FAILED).await);
        }

        let content_disposition = header_string(&response, CONTENT_DISPOSITION);
        let bytes = self.read_body(response).await?;

        Ok(AudioPayload {
            bytes,
            content_disposition,
        })
    }

    async fn health(&self) -> Result<String, BackendError> {
        let url = self.endpoint("health")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(self.failure(response, HEALTH_FAILED).await);
        }

        let body = self.read_body(response).await?;
        let parsed: HealthResponse = serde_json::from_slice(&body).map_err(decode_error)?;
        Ok(parsed.status)
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Builds the error for a non-success response from its `{detail}` body,
/// falling back to `fallback` when there is none.
fn error_from_body(status: StatusCode, body: &[u8], fallback: &str) -> BackendError {
    let detail = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .and_then(detail_message);
    if detail.is_none() {
        fm_warn!("backend returned {} without a usable detail", status);
    }
    BackendError::new(
        FailureKind::HttpStatus(status.as_u16()),
        detail.unwrap_or_else(|| fallback.to_string()),
    )
}

/// `detail` is a string for handled errors and a list of `{msg}` objects
/// for request validation errors.
fn detail_message(detail: serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(message) if !message.trim().is_empty() => Some(message),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn decode_error(err: serde_json::Error) -> BackendError {
    BackendError::new(
        FailureKind::Decode,
        format!("Unexpected response from server: {err}"),
    )
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> BackendError {
    BackendError::new(
        FailureKind::TooLarge { max_bytes, actual },
        format!("Response exceeds the {max_bytes} byte limit"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, format!("Request timed out: {err}"));
    }
    BackendError::new(FailureKind::Network, format!("Network error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_wins() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            br#"{"detail":"Invalid base64 encoded URL"}"#,
            DOWNLOAD_FAILED,
        );
        assert_eq!(err.kind, FailureKind::HttpStatus(400));
        assert_eq!(err.message, "Invalid base64 encoded URL");
    }

    #[test]
    fn validation_detail_uses_first_msg() {
        let err = error_from_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail":[{"loc":["body","quality"],"msg":"value is not a valid enumeration member"}]}"#,
            DOWNLOAD_FAILED,
        );
        assert_eq!(err.message, "value is not a valid enumeration member");
    }

    #[test]
    fn missing_or_unparseable_detail_falls_back() {
        let err = error_from_body(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>", SEARCH_FAILED);
        assert_eq!(err.message, "Search failed");

        let err = error_from_body(StatusCode::BAD_GATEWAY, br#"{"detail":""}"#, DOWNLOAD_FAILED);
        assert_eq!(err.message, "Download failed");
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_path() {
        let backend = ReqwestBackend::new(BackendSettings {
            base_url: "http://example.com/api".to_string(),
            ..BackendSettings::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("search").unwrap().as_str(),
            "http://example.com/api/search"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(BackendSettings {
            base_url: "not a url".to_string(),
            ..BackendSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);
    }
}
