//! Gmail OAuth token management
//!
//! Loads the token file written by Google's consent flow, serves the access
//! token from memory while it is fresh, refreshes it against the OAuth token
//! endpoint when expired, and persists the refreshed token back to disk.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::GmailConfig;
use crate::error::{Error, Result};

/// Refresh this long before the recorded expiry to absorb clock skew.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The on-disk token file. Field names accept both this crate's output and
/// the JSON written by Google's own client libraries (`token` for the access
/// token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenFile {
    /// Current access token
    #[serde(alias = "token")]
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Access token expiry, RFC 3339
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Granted scopes, carried through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

impl TokenFile {
    fn is_fresh(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now(),
            // No recorded expiry: assume stale and refresh
            None => false,
        }
    }
}

/// Response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Manages the Gmail access token lifecycle
pub struct GmailAuth {
    client: Client,
    config: GmailConfig,
    /// Cached token; refresh is serialized behind this lock.
    cached: Mutex<Option<TokenFile>>,
}

impl GmailAuth {
    /// Create a new token manager
    pub fn new(config: GmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            cached: Mutex::new(None),
        })
    }

    /// Get a valid access token, refreshing and persisting if necessary
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if cached.is_none() {
            *cached = Some(self.load_token_file()?);
        }

        let token = cached.as_mut().expect("token loaded above");

        if token.is_fresh() {
            debug!("Using cached Gmail access token");
            return Ok(token.access_token.clone());
        }

        info!("Gmail access token expired, refreshing");
        let refreshed = self.refresh(token).await?;
        token.access_token = refreshed.access_token.clone();
        token.expiry = Some(
            Utc::now() + Duration::seconds(refreshed.expires_in.unwrap_or(3600)),
        );

        if let Err(e) = self.save_token_file(token) {
            // A failed save only costs an extra refresh next run
            warn!("Failed to persist refreshed Gmail token: {}", e);
        }

        Ok(token.access_token.clone())
    }

    fn load_token_file(&self) -> Result<TokenFile> {
        let path = &self.config.token_file;
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Gmail(format!(
                "No Gmail token file at {} ({}). Complete the Google OAuth consent flow and \
                 save the token JSON there, or set GMAIL_TOKEN_FILE.",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Gmail(format!("Invalid token file {}: {}", path.display(), e)))
    }

    fn save_token_file(&self, token: &TokenFile) -> Result<()> {
        let path = &self.config.token_file;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(token)?)?;
        debug!("Token saved to {}", path.display());
        Ok(())
    }

    async fn refresh(&self, token: &TokenFile) -> Result<RefreshResponse> {
        let response = self
            .client
            .post(&self.config.oauth_url)
            .form(&[
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", token.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| Error::Gmail(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Unauthorized(format!(
                "Gmail token refresh failed ({}): {}. Re-run the consent flow to obtain a new token.",
                status, text
            )));
        }

        response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| Error::Gmail(format!("Invalid token refresh response: {}", e)))
    }
}
