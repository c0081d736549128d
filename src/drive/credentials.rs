//! OAuth credential loading.
//!
//! Reads an authorized-user token file (the `token.json` written by the
//! Google client libraries). Only the access token is used; refreshing it is
//! left to whatever process maintains the file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Google OAuth token not found: {0}")]
    NotFound(String),
    #[error("failed to read token file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid token file {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("token file {0} has no access token")]
    MissingToken(String),
}

/// Authorized-user credentials.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

// Keeps tokens out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Credentials {
    /// Load credentials from a token file.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(CredentialsError::NotFound(display));
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            CredentialsError::Unreadable {
                path: display.clone(),
                source,
            }
        })?;

        let credentials: Credentials =
            serde_json::from_str(&content).map_err(|source| CredentialsError::Invalid {
                path: display.clone(),
                source,
            })?;

        if credentials.token.trim().is_empty() {
            return Err(CredentialsError::MissingToken(display));
        }

        Ok(credentials)
    }
}
