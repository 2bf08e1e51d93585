// Implements the OAuth2 JWT-bearer flow for Google service accounts.
//
// The assertion is an RS256 JWT signed with the account's private key through
// the rustls crypto provider, exchanged at `token_uri` for a bearer token that
// is cached until shortly before it expires.
use crate::client::transport::{self, HttpsClient};
use crate::config::ServiceAccountKey;
use crate::error::{ConfigurationError, StorageError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rustls::SignatureScheme;
use rustls::pki_types::PrivateKeyDer;
use rustls::pki_types::pem::PemObject;
use rustls::sign::SigningKey;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SHEETS_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the server-side expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Where the spreadsheet client gets its bearer token from.
#[derive(Debug)]
pub enum TokenProvider {
    ServiceAccount(ServiceAccountAuth),
    /// A pre-issued token, e.g. from `gcloud auth print-access-token`.
    Static(String),
}

impl TokenProvider {
    pub async fn access_token(&self) -> Result<String, StorageError> {
        match self {
            TokenProvider::ServiceAccount(auth) => auth.access_token().await,
            TokenProvider::Static(token) => Ok(token.clone()),
        }
    }
}

#[derive(Debug)]
pub struct ServiceAccountAuth {
    account: ServiceAccountKey,
    signing_key: Arc<dyn SigningKey>,
    scopes: String,
    http: HttpsClient,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(account: ServiceAccountKey, http: HttpsClient) -> Result<Self, ConfigurationError> {
        if account.client_email.trim().is_empty() {
            return Err(ConfigurationError::InvalidServiceAccount(
                "client_email is empty".to_string(),
            ));
        }

        let der = PrivateKeyDer::from_pem_slice(account.private_key.as_bytes())
            .map_err(|e| ConfigurationError::InvalidServiceAccount(format!("private_key: {}", e)))?;
        let signing_key = rustls::crypto::aws_lc_rs::sign::any_supported_type(&der)
            .map_err(|e| ConfigurationError::InvalidServiceAccount(format!("private_key: {}", e)))?;

        if signing_key
            .choose_scheme(&[SignatureScheme::RSA_PKCS1_SHA256])
            .is_none()
        {
            return Err(ConfigurationError::InvalidServiceAccount(
                "private_key is not an RSA key".to_string(),
            ));
        }

        Ok(Self {
            account,
            signing_key,
            scopes: SHEETS_SCOPES.join(" "),
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.account.client_email
    }

    /// Build the signed JWT assertion for `now` (seconds since the epoch).
    pub fn signed_assertion(&self, now: i64) -> Result<String, StorageError> {
        let mut header = json!({ "alg": "RS256", "typ": "JWT" });
        if !self.account.private_key_id.is_empty() {
            header["kid"] = json!(self.account.private_key_id);
        }
        let claims = json!({
            "iss": self.account.client_email,
            "scope": self.scopes,
            "aud": self.account.token_uri,
            "iat": now,
            "exp": now + ASSERTION_LIFETIME_SECS,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );

        let signer = self
            .signing_key
            .choose_scheme(&[SignatureScheme::RSA_PKCS1_SHA256])
            .ok_or_else(|| StorageError::Auth("RS256 signing unavailable".to_string()))?;
        let signature = signer
            .sign(signing_input.as_bytes())
            .map_err(|e| StorageError::Auth(e.to_string()))?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Return a valid bearer token, fetching a new one when the cache is
    /// empty or about to expire.
    pub async fn access_token(&self) -> Result<String, StorageError> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = cached.as_ref()
            && token.expires_at - EXPIRY_MARGIN_SECS > now
        {
            return Ok(token.access_token.clone());
        }

        let assertion = self.signed_assertion(now)?;
        let req = transport::form_request(
            &self.account.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)],
        )
        .map_err(StorageError::Auth)?;

        let reply = transport::send(&self.http, req)
            .await
            .map_err(StorageError::Network)?;

        if !reply.status.is_success() {
            let detail = reply
                .json()
                .ok()
                .and_then(|v| {
                    v["error_description"]
                        .as_str()
                        .or_else(|| v["error"].as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| reply.error_message());
            log::error!("Token request for {} failed: {}", self.account.client_email, detail);
            return Err(StorageError::Auth(format!("{} ({})", detail, reply.status)));
        }

        let token: TokenResponse =
            serde_json::from_slice(&reply.body).map_err(|e| StorageError::Auth(e.to_string()))?;
        let expires_at = now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        log::info!(
            "Obtained access token for {} (valid {}s)",
            self.account.client_email,
            expires_at - now
        );

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}
