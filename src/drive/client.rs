//! Google Drive v3 client.
//!
//! Implements [`FileStore`] on top of the `files.list` endpoint using a
//! bearer access token.

use super::{Credentials, FileStore, SearchPage, SearchRequest, StoreError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for the Drive API.
#[derive(Debug, Clone)]
pub struct DriveClientConfig {
    /// Base URL, without trailing slash.
    pub api_base: String,
    pub timeout_seconds: u64,
}

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct DriveClient {
    http_client: Client,
    config: DriveClientConfig,
    credentials: Credentials,
}

impl DriveClient {
    pub fn new(config: DriveClientConfig, credentials: Credentials) -> Result<Self, StoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            credentials,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base.trim_end_matches('/'))
    }
}

/// Query parameters for a `files.list` call.
fn list_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("spaces", "drive".to_string()),
        ("fields", request.fields.clone()),
    ];

    if let Some(ref q) = request.query {
        params.push(("q", q.clone()));
    }
    if let Some(ref token) = request.page_token {
        params.push(("pageToken", token.clone()));
    }
    if let Some(size) = request.page_size {
        params.push(("pageSize", size.to_string()));
    }

    params
}

/// Best-effort extraction of the API's error message.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait::async_trait]
impl FileStore for DriveClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, StoreError> {
        debug!(
            "Drive files.list q={:?} page_token={:?} page_size={:?}",
            request.query, request.page_token, request.page_size
        );

        let response = self
            .http_client
            .get(self.files_url())
            .bearer_auth(&self.credentials.token)
            .query(&list_params(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Request(format!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    StoreError::Request(format!(
                        "Cannot connect to Drive API at {}",
                        self.config.api_base
                    ))
                } else {
                    StoreError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Drive API returned {}", status);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params() {
        let request = SearchRequest::new("files(id)")
            .with_query(Some("'f' in parents".to_string()))
            .with_page_token(Some("tok".to_string()))
            .with_page_size(50);

        let params = list_params(&request);

        assert_eq!(
            params,
            vec![
                ("spaces", "drive".to_string()),
                ("fields", "files(id)".to_string()),
                ("q", "'f' in parents".to_string()),
                ("pageToken", "tok".to_string()),
                ("pageSize", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_params_minimal() {
        let params = list_params(&SearchRequest::new("files(id)"));
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|(k, _)| *k != "q" && *k != "pageSize"));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 403, "message": "Insufficient Permission", "errors": []}}"#;
        assert_eq!(error_message(body), "Insufficient Permission");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_files_url() {
        let credentials: Credentials = serde_json::from_str(r#"{"token": "t"}"#).unwrap();
        let client = DriveClient::new(
            DriveClientConfig {
                api_base: "http://localhost:9000/drive/v3/".to_string(),
                timeout_seconds: 5,
            },
            credentials,
        )
        .unwrap();

        assert_eq!(client.files_url(), "http://localhost:9000/drive/v3/files");
    }
}
