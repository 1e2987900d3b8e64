//! Google Drive blob-storage client.
//!
//! Photos are uploaded under a service account and made publicly readable;
//! the image proxy fetches them back through the same account.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::DriveConfig;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FILES_URI: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URI: &str = "https://www.googleapis.com/upload/drive/v3/files";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Blob-storage provider seam. `DriveService` is the production
/// implementation; tests inject `MockMediaStorage`.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload a file and make it publicly readable; returns the share link.
    async fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError>;

    /// Fetch a stored file as (mime type, bytes).
    async fn fetch(&self, file_id: &str) -> Result<(String, Vec<u8>), AppError>;
}

pub struct DriveService {
    http: reqwest::Client,
    client_email: String,
    private_key_pem: String,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expiry_utc: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct FileCreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct FileMetadata {
    #[serde(rename = "mimeType")]
    mime_type: String,
}

impl DriveService {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_email: config.client_email.clone(),
            // Keys arriving via env have literal \n sequences.
            private_key_pem: config.private_key.replace("\\n", "\n"),
            token: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_email.is_empty() && !self.private_key_pem.is_empty()
    }

    /// Service-account bearer token, exchanged via a signed RS256 assertion
    /// and cached until shortly before it expires.
    async fn bearer_token(&self) -> Result<String, AppError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expiry_utc > Utc::now() + Duration::seconds(60) {
                    return Ok(token.value.clone());
                }
            }
        }

        let key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes()).map_err(|e| {
            AppError::DependencyError(anyhow::anyhow!("Invalid Drive service-account key: {}", e))
        })?;

        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: TOKEN_URI,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| {
                AppError::DependencyError(anyhow::anyhow!("Failed to sign Drive assertion: {}", e))
            })?;

        let response = self
            .http
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyError(anyhow::anyhow!(
                "Drive token exchange failed with status {}",
                response.status()
            )));
        }

        let body: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        let token = CachedToken {
            value: body.access_token,
            expiry_utc: now + Duration::seconds(body.expires_in),
        };
        *self.token.write().await = Some(token.clone());

        Ok(token.value)
    }
}

#[async_trait]
impl MediaStorage for DriveService {
    async fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let bearer = self.bearer_token().await?;

        // Drive v3 multipart upload: metadata part + media part in one
        // multipart/related body.
        let boundary = format!("media-{}", Uuid::new_v4().simple());
        let metadata = serde_json::json!({ "name": file_name, "mimeType": mime_type });

        let mut body = Vec::with_capacity(bytes.len() + 512);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = self
            .http
            .post(format!("{UPLOAD_URI}?uploadType=multipart"))
            .bearer_auth(&bearer)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyError(anyhow::anyhow!(
                "Drive upload failed with status {}",
                response.status()
            )));
        }

        let created: FileCreateResponse = response
            .json()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        // Anyone-with-the-link read access, so the proxy (and nothing else)
        // can serve it.
        let response = self
            .http
            .post(format!("{FILES_URI}/{}/permissions", created.id))
            .bearer_auth(&bearer)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyError(anyhow::anyhow!(
                "Drive permission grant failed with status {}",
                response.status()
            )));
        }

        tracing::debug!(file_id = %created.id, "Uploaded file to Drive");

        Ok(format!("https://drive.google.com/uc?id={}", created.id))
    }

    async fn fetch(&self, file_id: &str) -> Result<(String, Vec<u8>), AppError> {
        let bearer = self.bearer_token().await?;

        let response = self
            .http
            .get(format!("{FILES_URI}/{file_id}"))
            .query(&[("fields", "mimeType")])
            .bearer_auth(&bearer)
            .send()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyError(anyhow::anyhow!(
                "Drive metadata fetch failed with status {}",
                response.status()
            )));
        }

        let metadata: FileMetadata = response
            .json()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        let response = self
            .http
            .get(format!("{FILES_URI}/{file_id}"))
            .query(&[("alt", "media")])
            .bearer_auth(&bearer)
            .send()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyError(anyhow::anyhow!(
                "Drive media fetch failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::DependencyError(anyhow::anyhow!(e)))?;

        Ok((metadata.mime_type, bytes.to_vec()))
    }
}

/// In-memory media storage for the integration tests.
#[derive(Default)]
pub struct MockMediaStorage {
    files: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: number of files uploaded so far.
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaStorage for MockMediaStorage {
    async fn upload(
        &self,
        _file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let file_id = Uuid::new_v4().simple().to_string();
        self.files
            .lock()
            .unwrap()
            .insert(file_id.clone(), (mime_type.to_string(), bytes));
        Ok(format!("https://drive.google.com/uc?id={}", file_id))
    }

    async fn fetch(&self, file_id: &str) -> Result<(String, Vec<u8>), AppError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::DependencyError(anyhow::anyhow!("Unknown file id")))
    }
}
