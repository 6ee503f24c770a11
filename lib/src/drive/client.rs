use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::multipart;
use reqwest::StatusCode;

use super::api;
use super::token::{AccessToken, ServiceAccountCredential};
use crate::config::DriveConfig;
use crate::Error;

/// Object id (and optional view link) of the created Drive file.
#[derive(Clone, Debug)]
pub struct DriveUploadResult {
    pub id: String,
    pub web_view_link: Option<String>,
}

/// Drive upload client for a single service account and folder.
///
/// Stateless per call: every upload mints a fresh assertion and exchanges
/// it for a bearer token, exactly as the portal backend does. No token
/// cache.
pub struct DriveClient {
    http: reqwest::Client,
    credential: ServiceAccountCredential,
    folder_id: String,
    token_url: String,
    upload_url: String,
}

impl DriveClient {
    pub fn new(config: &DriveConfig) -> Result<Self, Error> {
        // Fails fast on a malformed blob or key, before any network call.
        let credential = ServiceAccountCredential::from_json(&config.service_account_json)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api::REQUEST_TIMEOUT))
            .build()?;

        Ok(Self {
            http,
            credential,
            folder_id: config.folder_id.clone(),
            token_url: api::GOOGLE_TOKEN_URL.to_string(),
            upload_url: api::DRIVE_UPLOAD_URL.to_string(),
        })
    }

    /// Point the client at non-default endpoints (tests, proxies).
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.upload_url = upload_url.into();
        self
    }

    /// Exchange a fresh JWT assertion for a bearer token.
    pub async fn fetch_access_token(&self) -> Result<AccessToken, Error> {
        let assertion = self.credential.sign(
            api::DRIVE_SCOPE,
            &self.token_url,
            Utc::now().timestamp(),
        )?;

        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", api::JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let err: api::TokenErrorResponse = serde_json::from_slice(&body).unwrap_or_default();
            return Err(Error::Rejected {
                code: status.as_u16(),
                message: err.message(),
            });
        }

        let token: api::TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::Transport(format!("invalid token endpoint response: {}", e)))?;

        log::debug!(
            "obtained access token for {} (expires in {}s)",
            self.credential.client_email(),
            token.expires_in
        );

        Ok(AccessToken {
            token: token.access_token,
            expires_in: token.expires_in,
        })
    }

    /// Decode a base64 payload (as received from the portal) and upload
    /// it. A malformed payload fails before any network traffic.
    pub async fn upload_base64(
        &self,
        filename: &str,
        pdf_base64: &str,
    ) -> Result<DriveUploadResult, Error> {
        let data = STANDARD.decode(pdf_base64)?;
        self.upload(filename, data).await
    }

    /// Upload one file into the configured folder: metadata part plus
    /// binary part in a single multipart POST. Atomic server-side; a
    /// failed token exchange never reaches this request.
    pub async fn upload(&self, filename: &str, data: Vec<u8>) -> Result<DriveUploadResult, Error> {
        let access = self.fetch_access_token().await?;

        let metadata = serde_json::json!({
            "name": filename,
            "parents": [self.folder_id],
        })
        .to_string();

        let form = multipart::Form::new()
            .part(
                "metadata",
                multipart::Part::text(metadata).mime_str("application/json")?,
            )
            .part(
                "file",
                multipart::Part::bytes(data)
                    .file_name(filename.to_string())
                    .mime_str("application/pdf")?,
            );

        let resp = self
            .http
            .post(&self.upload_url)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink"),
            ])
            .bearer_auth(&access.token)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(map_status(status, &body));
        }

        let file: api::DriveFile = serde_json::from_slice(&body)
            .map_err(|e| Error::Transport(format!("invalid upload response: {}", e)))?;

        log::info!("uploaded {} to Drive as {}", filename, file.id);

        Ok(DriveUploadResult {
            id: file.id,
            web_view_link: file.web_view_link,
        })
    }
}

/// Map a non-2xx upload response to a structured error carrying the
/// API's own message.
fn map_status(status: StatusCode, body: &[u8]) -> Error {
    let err: api::DriveErrorResponse = serde_json::from_slice(body).unwrap_or_default();
    Error::Rejected {
        code: status.as_u16(),
        message: err.message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::token::tests::test_credential_json;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use warp::Filter;

    fn test_client() -> DriveClient {
        let config = DriveConfig {
            service_account_json: test_credential_json(),
            folder_id: "folder-123".to_string(),
        };
        DriveClient::new(&config).unwrap()
    }

    /// Mock token endpoint plus upload endpoint; returns the base URLs
    /// and a counter of upload hits.
    async fn spawn_mock_api(
        token_status: warp::http::StatusCode,
        token_body: serde_json::Value,
        upload_body: serde_json::Value,
    ) -> (String, String, Arc<AtomicUsize>) {
        let upload_hits = Arc::new(AtomicUsize::new(0));
        let hits = upload_hits.clone();

        let token = warp::path("token").and(warp::post()).map(move || {
            warp::reply::with_status(warp::reply::json(&token_body), token_status)
        });
        let upload = warp::path("upload")
            .and(warp::post())
            .and(warp::header::<String>("authorization"))
            .map(move |auth: String| {
                assert!(auth.starts_with("Bearer "));
                hits.fetch_add(1, Ordering::SeqCst);
                warp::reply::json(&upload_body)
            });

        let (addr, server) = warp::serve(token.or(upload)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        (
            format!("http://{}/token", addr),
            format!("http://{}/upload", addr),
            upload_hits,
        )
    }

    #[tokio::test]
    async fn upload_happy_path() {
        let (token_url, upload_url, hits) = spawn_mock_api(
            warp::http::StatusCode::OK,
            serde_json::json!({"access_token": "tok-1", "expires_in": 3599, "token_type": "Bearer"}),
            serde_json::json!({"id": "abc123", "webViewLink": "https://drive.example/abc123"}),
        )
        .await;

        let client = test_client().with_endpoints(token_url, upload_url);
        let result = client.upload("report.pdf", vec![0u8; 100]).await.unwrap();

        assert_eq!(result.id, "abc123");
        assert_eq!(
            result.web_view_link.as_deref(),
            Some("https://drive.example/abc123")
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_endpoint_reports_declared_expiry() {
        let (token_url, upload_url, _hits) = spawn_mock_api(
            warp::http::StatusCode::OK,
            serde_json::json!({"access_token": "tok-2", "expires_in": 1234}),
            serde_json::json!({}),
        )
        .await;

        let client = test_client().with_endpoints(token_url, upload_url);
        let token = client.fetch_access_token().await.unwrap();

        assert_eq!(token.token, "tok-2");
        assert_eq!(token.expires_in, 1234);
    }

    #[tokio::test]
    async fn rejected_token_exchange_short_circuits_the_upload() {
        let (token_url, upload_url, hits) = spawn_mock_api(
            warp::http::StatusCode::BAD_REQUEST,
            serde_json::json!({"error": "invalid_grant", "error_description": "invalid_grant"}),
            serde_json::json!({"id": "never"}),
        )
        .await;

        let client = test_client().with_endpoints(token_url, upload_url);
        let err = client.upload("report.pdf", vec![0u8; 100]).await.unwrap_err();

        match err {
            Error::Rejected { code, message } => {
                assert_eq!(code, 400);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }

        // The multipart POST was never attempted.
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_base64_fails_before_any_network_traffic() {
        // Endpoints are not listening; a decode failure must win.
        let client = test_client()
            .with_endpoints("http://127.0.0.1:9/token", "http://127.0.0.1:9/upload");

        let err = client
            .upload_base64("report.pdf", "not!!valid##base64")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Port 9 (discard) is not listening.
        let client = test_client()
            .with_endpoints("http://127.0.0.1:9/token", "http://127.0.0.1:9/upload");

        let err = client.upload("report.pdf", vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
