//! Bearer tokens for the document store.
//!
//! Production signs a JWT assertion with a service account key and trades it
//! for a short-lived OAuth2 access token, renewed shortly before it expires.
//! The local emulator accepts any fixed token.
use anyhow::Context;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
// Renew this long before the expiry announced by the token endpoint.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The JSON key file issued for a service account.
#[derive(serde::Deserialize, Debug)]
pub struct ServiceAccountKey {
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: Secret<String>,
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read the service account key at {}",
                path.display()
            )
        })?;
        serde_json::from_str(&contents).context("Failed to parse the service account key")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("Failed to sign the token assertion")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("The token request failed")]
    Request(#[from] reqwest::Error),
}

pub enum AccessTokenProvider {
    Static(Secret<String>),
    ServiceAccount(ServiceAccountTokens),
}

impl AccessTokenProvider {
    pub async fn access_token(&self) -> Result<Secret<String>, CredentialsError> {
        match self {
            AccessTokenProvider::Static(token) => Ok(token.clone()),
            AccessTokenProvider::ServiceAccount(tokens) => tokens.access_token().await,
        }
    }
}

pub struct ServiceAccountTokens {
    http_client: Client,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    encoding_key: EncodingKey,
    current: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: Secret<String>,
    refresh_at: Instant,
}

#[derive(serde::Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Secret<String>,
    expires_in: u64,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, anyhow::Error> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .context("The service account private key is not an RSA key in PEM format")?;
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            client_email: key.client_email,
            key_id: key.private_key_id,
            token_uri: key.token_uri,
            encoding_key,
            current: Mutex::new(None),
        })
    }

    #[tracing::instrument(name = "Get a document store access token", skip(self))]
    async fn access_token(&self) -> Result<Secret<String>, CredentialsError> {
        // Held across the refresh: concurrent requests wait for one new token.
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        *current = Some(CachedToken {
            value: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        tracing::info!("Minted a new document store access token");
        Ok(fresh.access_token)
    }

    async fn request_token(&self) -> Result<TokenResponse, CredentialsError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        let assertion = jsonwebtoken::encode(&header, &claims, &self.encoding_key)?;

        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}
