//! DriveService — Google Drive v3 integration for blob storage and link
//! lookup.
//!
//! The service authenticates as a service account: each call to
//! [`DriveService::authorize`] signs a short-lived RS256 assertion and
//! exchanges it at the OAuth token endpoint for a bearer token, which then
//! authorizes the upload and file-list requests. All endpoint base URLs are
//! taken from [`DriveConfig`] so tests can point the service at a local
//! stand-in.

use crate::services::staging::StagedBlob;
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, stream};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Body, Client, header};
use serde::{Deserialize, Serialize};
use std::{io, time::Duration};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

/// OAuth scope for full Drive access.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
/// Grant type for service-account token exchange.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime of a signed assertion.
const ASSERTION_TTL_SECS: i64 = 3600;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum DriveError {
    /// The service-account credential could not be used or was rejected.
    #[error("drive authorization failed: {0}")]
    Auth(String),
    /// The blob transfer failed before a remote id was assigned.
    #[error("drive upload failed: {0}")]
    Upload(String),
    /// The link lookup could not be completed.
    #[error("drive link lookup failed: {0}")]
    LinkLookup(String),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// Which remote file wins when several share the requested name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkTieBreak {
    /// Take the listing's first row as returned by the API.
    #[default]
    First,
    /// Ask the API for the most recently created file.
    Newest,
}

/// Connection settings for the Drive API.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Service-account email, used as the JWT issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key for signing assertions.
    pub private_key: String,
    /// Destination folder id for uploaded blobs.
    pub folder_id: String,
    /// Base URL for metadata calls (`/drive/v3/...`).
    pub api_base_url: String,
    /// Base URL for media uploads (`/upload/drive/v3/...`).
    pub upload_base_url: String,
    /// OAuth token endpoint, also the audience of signed assertions.
    pub token_url: String,
    /// Tie-break policy for name lookups.
    pub tie_break: LinkTieBreak,
}

/// A bearer token returned by the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default, rename = "webViewLink")]
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Gateway to the remote drive.
#[derive(Clone)]
pub struct DriveService {
    client: Client,
    config: DriveConfig,
}

impl DriveService {
    pub fn new(config: DriveConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    /// Exchange a freshly signed service-account assertion for a bearer
    /// token.
    pub async fn authorize(&self) -> DriveResult<AccessToken> {
        let assertion = self.sign_assertion()?;
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|err| DriveError::Auth(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|err| DriveError::Auth(err.to_string()))?;
        debug!(expires_in = token.expires_in, "obtained drive access token");
        Ok(token)
    }

    /// Stream a staged blob into the configured Drive folder.
    ///
    /// The body is `multipart/related`: a JSON metadata part naming the file
    /// and its parent folder, then the media part streamed straight from the
    /// staged file. Returns the id Drive assigned to the new file.
    pub async fn upload(
        &self,
        token: &AccessToken,
        blob: &StagedBlob,
        file_name: &str,
        mime_type: &str,
    ) -> DriveResult<String> {
        let boundary = format!("blob-{}", Uuid::new_v4());
        let metadata = serde_json::json!({
            "name": file_name,
            "parents": [self.config.folder_id],
        });
        let prefix = format!(
            "--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n--{}\r\nContent-Type: {}\r\n\r\n",
            boundary, metadata, boundary, mime_type
        );
        let suffix = format!("\r\n--{}--\r\n", boundary);

        let file = blob
            .reader()
            .await
            .map_err(|err| DriveError::Upload(format!("failed to reopen staged file: {}", err)))?;
        let head = stream::once(async move { Ok::<Bytes, io::Error>(Bytes::from(prefix)) });
        let media = ReaderStream::new(file);
        let tail = stream::once(async move { Ok::<Bytes, io::Error>(Bytes::from(suffix)) });
        let body = Body::wrap_stream(head.chain(media).chain(tail));

        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id",
            self.config.upload_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.access_token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|err| DriveError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Upload(format!(
                "upload endpoint returned {}: {}",
                status, body
            )));
        }

        let created: DriveFile = response
            .json()
            .await
            .map_err(|err| DriveError::Upload(err.to_string()))?;
        Ok(created.id)
    }

    /// Look up the shareable view link for an exact file name.
    ///
    /// Returns `Ok(None)` when no remote file carries the name. When several
    /// do, the configured tie-break picks the winner.
    pub async fn find_link_by_name(
        &self,
        token: &AccessToken,
        file_name: &str,
    ) -> DriveResult<Option<String>> {
        let query = format!("name='{}'", escape_drive_query(file_name));
        let mut url = format!(
            "{}/drive/v3/files?q={}&fields=files(id,name,webViewLink)&pageSize=1",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&query)
        );
        if self.config.tie_break == LinkTieBreak::Newest {
            url.push_str("&orderBy=createdTime%20desc");
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|err| DriveError::LinkLookup(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::LinkLookup(format!(
                "list endpoint returned {}: {}",
                status, body
            )));
        }

        let listing: DriveFileList = response
            .json()
            .await
            .map_err(|err| DriveError::LinkLookup(err.to_string()))?;
        Ok(listing
            .files
            .into_iter()
            .next()
            .and_then(|file| file.web_view_link))
    }

    /// Sign the service-account claim set for the token exchange.
    fn sign_assertion(&self) -> DriveResult<String> {
        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())
            .map_err(|err| DriveError::Auth(format!("invalid private key: {}", err)))?;
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.config.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.config.token_url,
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| DriveError::Auth(format!("failed to sign assertion: {}", err)))
    }
}

/// Escape a value for embedding in a Drive `q` string literal. Backslashes
/// and single quotes are the only characters with meaning inside the quotes.
fn escape_drive_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_escaping_handles_quotes_and_backslashes() {
        assert_eq!(escape_drive_query("plain.pdf"), "plain.pdf");
        assert_eq!(escape_drive_query("o'brien.pdf"), "o\\'brien.pdf");
        assert_eq!(escape_drive_query("a\\b.pdf"), "a\\\\b.pdf");
        assert_eq!(escape_drive_query("it's a \\'.pdf"), "it\\'s a \\\\\\'.pdf");
    }

    #[test]
    fn tie_break_defaults_to_first_match() {
        assert_eq!(LinkTieBreak::default(), LinkTieBreak::First);
    }

    #[test]
    fn unreadable_key_is_an_auth_error() {
        let service = DriveService::new(DriveConfig {
            client_email: "svc@example.iam.gserviceaccount.com".into(),
            private_key: "not a pem".into(),
            folder_id: "folder".into(),
            api_base_url: "https://www.googleapis.com".into(),
            upload_base_url: "https://www.googleapis.com".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            tie_break: LinkTieBreak::First,
        })
        .unwrap();

        let err = service.sign_assertion().unwrap_err();
        assert!(matches!(err, DriveError::Auth(_)));
    }
}
