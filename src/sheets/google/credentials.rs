// src/sheets/google/credentials.rs
//! Service-account credential resolution.
//!
//! Two sources, tried in order:
//! - inline fields from the environment (production deployments)
//! - a JSON key file on disk (local development)

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::settings::CredentialSettings;
use crate::sheets::error::{SheetError, SheetResult};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
];

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// The private key never reaches logs.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    fn validate(self) -> SheetResult<Self> {
        if let Some(kind) = &self.key_type {
            if kind != "service_account" {
                return Err(SheetError::InvalidKey(format!(
                    "expected a service_account key, found {:?}",
                    kind
                )));
            }
        }
        if self.client_email.trim().is_empty() {
            return Err(SheetError::InvalidKey("client_email is empty".to_string()));
        }
        if !self.private_key.contains("-----BEGIN") {
            return Err(SheetError::InvalidKey(
                "private_key is not PEM encoded".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub enum CredentialSource {
    Inline(ServiceAccountKey),
    KeyFile(PathBuf),
}

impl CredentialSource {
    /// Picks the credential source without touching the filesystem or network.
    pub fn resolve(settings: &CredentialSettings) -> Self {
        match (&settings.client_email, &settings.private_key) {
            (Some(email), Some(key)) => CredentialSource::Inline(ServiceAccountKey {
                key_type: Some("service_account".to_string()),
                client_email: email.clone(),
                private_key: unescape_newlines(key),
                private_key_id: settings.private_key_id.clone(),
                project_id: settings.project_id.clone(),
                client_id: settings.client_id.clone(),
                token_uri: default_token_uri(),
            }),
            _ => CredentialSource::KeyFile(settings.key_path.clone()),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            CredentialSource::Inline(_) => "environment variable credentials",
            CredentialSource::KeyFile(_) => "file-based credentials",
        }
    }

    /// Produces a validated key; reads the key file when that is the source.
    pub fn load(self) -> SheetResult<ServiceAccountKey> {
        match self {
            CredentialSource::Inline(key) => key.validate(),
            CredentialSource::KeyFile(path) => {
                if !path.is_file() {
                    return Err(SheetError::KeyFileNotFound(path));
                }
                let raw = std::fs::read_to_string(&path)?;
                let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
                    SheetError::InvalidKey(format!("{}: {}", path.display(), e))
                })?;
                key.validate()
            }
        }
    }
}

/// Turns literal `\n` sequences (as stored in most secret managers) into newlines.
pub fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
