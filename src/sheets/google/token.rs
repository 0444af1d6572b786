// src/sheets/google/token.rs
//! OAuth2 JWT-bearer flow for service accounts.
//!
//! A signed RS256 assertion is exchanged at the key's token endpoint for a
//! short-lived access token. The token is cached and re-exchanged once it is
//! within a minute of expiry; that is the only re-authentication there is.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::credentials::{ServiceAccountKey, SCOPES};
use super::parse_api_error;
use crate::sheets::error::{SheetError, SheetResult};

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct AssertionSigner {
    key: EncodingKey,
    header: Header,
    client_email: String,
    token_uri: String,
}

impl AssertionSigner {
    /// Parses the PEM key up front so a broken key fails before any request.
    pub fn new(account: &ServiceAccountKey) -> SheetResult<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| SheetError::InvalidKey(e.to_string()))?;
        let mut header = Header::new(Algorithm::RS256);
        header.kid = account.private_key_id.clone();
        Ok(Self {
            key,
            header,
            client_email: account.client_email.clone(),
            token_uri: account.token_uri.clone(),
        })
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub fn claims(&self, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            iss: self.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }

    pub fn assertion(&self, now: DateTime<Utc>) -> SheetResult<String> {
        Ok(jsonwebtoken::encode(&self.header, &self.claims(now), &self.key)?)
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_token(self, now: DateTime<Utc>) -> AccessToken {
        AccessToken {
            value: self.access_token,
            expires_at: now + Duration::seconds(self.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS)),
        }
    }
}

pub struct TokenProvider {
    signer: AssertionSigner,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(signer: AssertionSigner) -> Self {
        Self { signer, cached: Mutex::new(None) }
    }

    /// Current access token, exchanging a new assertion when the cached one is stale.
    pub async fn bearer(&self, http: &reqwest::Client) -> SheetResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }
        debug!("Exchanging service account assertion for an access token");
        let token = self.exchange(http, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange(&self, http: &reqwest::Client, now: DateTime<Utc>) -> SheetResult<AccessToken> {
        let assertion = self.signer.assertion(now)?;
        let response = http
            .post(self.signer.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(&body);
            error!("Google Sheets authentication error: {}", message);
            return Err(SheetError::Api { status: status.as_u16(), message });
        }
        let parsed: TokenResponse = response.json().await?;
        Ok(parsed.into_token(now))
    }
}
