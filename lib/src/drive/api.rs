use serde::Deserialize;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Request timeout, in seconds
pub(crate) const REQUEST_TIMEOUT: u64 = 30;

/// Successful token exchange. `expires_in` is the endpoint's declared
/// lifetime in seconds; we surface it rather than assuming one hour.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// OAuth2 error body from the token endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TokenErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    pub fn message(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "failed to obtain access token".to_string())
    }
}

/// Created Drive file, as requested via `fields=id,webViewLink`.
#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(rename = "webViewLink", default)]
    pub web_view_link: Option<String>,
}

/// Drive API error envelope: `{"error": {"message": ...}}`.
#[derive(Debug, Default, Deserialize)]
pub struct DriveErrorResponse {
    #[serde(default)]
    pub error: Option<DriveErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DriveErrorDetail {
    #[serde(default)]
    pub message: String,
}

impl DriveErrorResponse {
    pub fn message(&self) -> String {
        self.error
            .as_ref()
            .filter(|e| !e.message.is_empty())
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Drive upload failed".to_string())
    }
}
