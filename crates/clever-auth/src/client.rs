//! The composed Clever sign-in flow.
//!
//! [`CleverClient`] owns one HTTP client shared by the token exchange and the
//! profile fetch, plus the precomputed authorization URL.
//!
//! # Example
//!
//! ```ignore
//! use clever_auth::{CleverClient, CleverConfig};
//!
//! let client = CleverClient::new(&config, config.resolve_redirect_uri(false))?;
//!
//! // Landing page links here
//! let url = client.authorization_url();
//!
//! // Callback handler
//! let profile = client.authenticate(Some("code-from-query")).await?;
//! ```

use url::Url;

use crate::CleverResult;
use crate::authorize::AuthorizationRedirect;
use crate::config::{CleverConfig, ConfigError, parse_url};
use crate::error::CleverError;
use crate::profile::{ProfileFetcher, UserProfile};
use crate::token::{AccessToken, TokenExchanger};

/// Client for the Clever sign-in flow.
#[derive(Debug, Clone)]
pub struct CleverClient {
    authorization_url: Url,
    tokens: TokenExchanger,
    profiles: ProfileFetcher,
}

impl CleverClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an endpoint does not parse or the
    /// HTTP client cannot be built.
    pub fn new(config: &CleverConfig, redirect_uri: &str) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("failed to build HTTP client: {e}")))?;

        let authorization_url = AuthorizationRedirect::from_config(config, redirect_uri)?.url();
        let token_url = parse_url("provider.token_url", &config.token_url)?;
        let me_url = config.me_url()?;

        Ok(Self {
            authorization_url,
            tokens: TokenExchanger::new(
                http_client.clone(),
                token_url,
                config.credentials(),
                redirect_uri,
            ),
            profiles: ProfileFetcher::new(http_client, me_url),
        })
    }

    /// Returns the authorization URL for the landing page.
    #[must_use]
    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> CleverResult<AccessToken> {
        self.tokens.exchange(code).await
    }

    /// Fetches the profile of the token's user.
    pub async fn fetch_profile(&self, token: &AccessToken) -> CleverResult<UserProfile> {
        self.profiles.fetch(token).await
    }

    /// Runs the callback half of the flow: code exchange, then profile fetch.
    ///
    /// The profile request is only issued after the exchange succeeded.
    ///
    /// # Errors
    ///
    /// Returns `MissingCode` when `code` is absent or empty, otherwise any
    /// error from [`TokenExchanger::exchange`] or [`ProfileFetcher::fetch`].
    pub async fn authenticate(&self, code: Option<&str>) -> CleverResult<UserProfile> {
        let code = code
            .filter(|c| !c.trim().is_empty())
            .ok_or(CleverError::MissingCode)?;

        let token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&token).await?;

        tracing::info!(user_id = %profile.id, "Authenticated Clever user");
        Ok(profile)
    }
}
