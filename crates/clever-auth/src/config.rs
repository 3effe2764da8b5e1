//! Clever provider configuration.
//!
//! Holds the provider endpoints, the registered client credentials and the
//! fixed authorization parameters (district, scopes, redirect URIs).
//!
//! # Example (TOML)
//!
//! ```toml
//! [provider]
//! client_id = "abc"
//! client_secret = "s3cr3t"
//! district_id = "588910be5e56c4000146fc87"
//! request_timeout = "10s"
//! ```

use std::fmt;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use url::Url;

/// Sandbox district used by the Clever instant login test application.
pub const DEFAULT_DISTRICT_ID: &str = "588910be5e56c4000146fc87";

/// Redirect URI registered for the deployed application.
pub const DEFAULT_PRODUCTION_REDIRECT_URI: &str =
    "https://cleverinstantlogin.herokuapp.com/redirect";

/// Redirect URI registered for local development.
pub const DEFAULT_LOCAL_REDIRECT_URI: &str = "http://localhost:8000/redirect";

/// Clever provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleverConfig {
    /// OAuth client identifier issued by Clever.
    pub client_id: String,

    /// OAuth client secret issued by Clever.
    pub client_secret: String,

    /// District the authorization page is scoped to.
    pub district_id: String,

    /// Requested scopes, sent space separated.
    pub scopes: Vec<String>,

    /// Authorization page the user is sent to.
    pub authorize_url: String,

    /// Token endpoint used for the code exchange.
    pub token_url: String,

    /// Base URL of the Clever data API (the `/me` endpoint lives here).
    pub api_base_url: String,

    /// Explicit redirect URI. Takes precedence over the production/local pair.
    pub redirect_uri: Option<String>,

    /// Redirect URI used when the server runs in production mode.
    pub production_redirect_uri: String,

    /// Redirect URI used for local development.
    pub local_redirect_uri: String,

    /// Timeout applied to each outbound call to Clever.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CleverConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            district_id: DEFAULT_DISTRICT_ID.to_string(),
            scopes: vec!["read:user_id".to_string(), "read:sis".to_string()],
            authorize_url: "https://clever.com/oauth/authorize".to_string(),
            token_url: "https://clever.com/oauth/tokens".to_string(),
            api_base_url: "https://api.clever.com".to_string(),
            redirect_uri: None,
            production_redirect_uri: DEFAULT_PRODUCTION_REDIRECT_URI.to_string(),
            local_redirect_uri: DEFAULT_LOCAL_REDIRECT_URI.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for CleverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleverConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("district_id", &self.district_id)
            .field("scopes", &self.scopes)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("production_redirect_uri", &self.production_redirect_uri)
            .field("local_redirect_uri", &self.local_redirect_uri)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CleverConfig {
    /// Returns the client credentials.
    #[must_use]
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(self.client_id.clone(), self.client_secret.clone())
    }

    /// Resolves the redirect URI for the given deployment mode.
    #[must_use]
    pub fn resolve_redirect_uri(&self, production: bool) -> &str {
        match (&self.redirect_uri, production) {
            (Some(uri), _) => uri,
            (None, true) => &self.production_redirect_uri,
            (None, false) => &self.local_redirect_uri,
        }
    }

    /// Returns the `/me` endpoint URL.
    pub fn me_url(&self) -> Result<Url, ConfigError> {
        let base = parse_url("provider.api_base_url", &self.api_base_url)?;
        // `join` would drop the last path segment of a base without a trailing slash
        let me = format!("{}/me", base.as_str().trim_end_matches('/'));
        parse_url("provider.api_base_url", &me)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the client id or secret is empty and
    /// `ConfigError::InvalidValue` if an endpoint is not an absolute URL or the
    /// request timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("provider.client_id".into()));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::Missing("provider.client_secret".into()));
        }
        if self.district_id.trim().is_empty() {
            return Err(ConfigError::Missing("provider.district_id".into()));
        }

        parse_url("provider.authorize_url", &self.authorize_url)?;
        parse_url("provider.token_url", &self.token_url)?;
        self.me_url()?;
        parse_url("provider.production_redirect_uri", &self.production_redirect_uri)?;
        parse_url("provider.local_redirect_uri", &self.local_redirect_uri)?;
        if let Some(uri) = &self.redirect_uri {
            parse_url("provider.redirect_uri", uri)?;
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "provider.request_timeout must be > 0".into(),
            ));
        }

        Ok(())
    }
}

/// Parses an absolute http(s) URL, naming the offending setting on failure.
pub(crate) fn parse_url(setting: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(format!("{setting} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue(format!(
            "{setting} must use http or https, got {other}"
        ))),
    }
}

/// OAuth client credentials for the token endpoint.
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Creates credentials from an id and secret.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the `Authorization` header value for HTTP Basic client authentication.
    #[must_use]
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}
