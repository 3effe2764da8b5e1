//! Authorization redirect builder.
//!
//! Builds the Clever authorization page URL the landing page links to. All
//! inputs come from startup configuration, never from the request.

use url::Url;

use crate::config::{CleverConfig, ConfigError, parse_url};

/// A ready-to-render authorization redirect.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    endpoint: Url,
    client_id: String,
    redirect_uri: String,
    district_id: String,
    scope: String,
}

impl AuthorizationRedirect {
    /// Creates a redirect from its parts.
    #[must_use]
    pub fn new(
        endpoint: Url,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        district_id: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        Self {
            endpoint,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            district_id: district_id.into(),
            scope: scopes.join(" "),
        }
    }

    /// Creates a redirect from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the authorize URL does not parse.
    pub fn from_config(config: &CleverConfig, redirect_uri: &str) -> Result<Self, ConfigError> {
        let endpoint = parse_url("provider.authorize_url", &config.authorize_url)?;
        Ok(Self::new(
            endpoint,
            config.client_id.as_str(),
            redirect_uri,
            config.district_id.as_str(),
            &config.scopes,
        ))
    }

    /// Builds the authorization URL.
    ///
    /// Parameters are form-encoded in the order Clever documents:
    /// `response_type`, `redirect_uri`, `district_id`, `client_id`, `scope`.
    #[must_use]
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("district_id", &self.district_id)
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", &self.scope);

        tracing::debug!(
            endpoint = %self.endpoint,
            client_id = %self.client_id,
            "Built authorization URL"
        );

        url
    }
}
