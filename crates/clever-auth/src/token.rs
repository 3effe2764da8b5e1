//! Authorization code exchange.
//!
//! Trades the one-time `code` from the redirect for an access token at the
//! Clever token endpoint using HTTP Basic client authentication.
//!
//! Success means the HTTP status is 2xx AND the body carries a non-empty
//! `access_token`. Nothing else in the body is inspected.

use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::CleverResult;
use crate::config::ClientCredentials;
use crate::error::{CleverError, FlowStage};

const STAGE: FlowStage = FlowStage::TokenExchange;

/// Opaque bearer token returned by the exchange.
///
/// Never logged; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// JSON body sent to the token endpoint.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    grant_type: &'static str,
    redirect_uri: &'a str,
}

/// Token endpoint response. Only `access_token` matters.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorResponse {
    pub(crate) error: String,
    pub(crate) error_description: Option<String>,
}

/// Exchanges authorization codes at the Clever token endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http_client: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
    redirect_uri: String,
}

impl TokenExchanger {
    /// Creates a new exchanger.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        token_url: Url,
        credentials: ClientCredentials,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url,
            credentials,
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// - `MissingCode` if `code` is empty; Clever is not contacted
    /// - `Transport` if the request could not be completed
    /// - `Provider` if Clever answered with a non-2xx status
    /// - `MalformedResponse` if the 2xx body has no usable `access_token`
    pub async fn exchange(&self, code: &str) -> CleverResult<AccessToken> {
        if code.trim().is_empty() {
            return Err(CleverError::MissingCode);
        }

        let body = TokenRequest {
            code,
            grant_type: "authorization_code",
            redirect_uri: &self.redirect_uri,
        };

        tracing::debug!(
            token_endpoint = %self.token_url,
            "Exchanging authorization code"
        );

        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(AUTHORIZATION, self.credentials.basic_authorization())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CleverError::transport(STAGE, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CleverError::transport(STAGE, e))?;

        if !status.is_success() {
            let oauth_error = serde_json::from_str::<OAuthErrorResponse>(&text).ok();
            return Err(CleverError::provider_status(
                STAGE,
                status.as_u16(),
                oauth_error.as_ref().map(|e| e.error.as_str()),
                oauth_error
                    .as_ref()
                    .and_then(|e| e.error_description.as_deref()),
            ));
        }

        let token_response: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            CleverError::malformed(STAGE, format!("failed to parse token response: {e}"))
        })?;

        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CleverError::malformed(STAGE, "response has no access_token"))?;

        tracing::debug!(
            token_type = token_response.token_type.as_deref().unwrap_or("unknown"),
            "Authorization code exchanged"
        );

        Ok(AccessToken::new(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REDIRECT_URI: &str = "http://localhost:8000/redirect";

    fn exchanger(server: &MockServer) -> TokenExchanger {
        let token_url = Url::parse(&format!("{}/oauth/tokens", server.uri())).unwrap();
        TokenExchanger::new(
            reqwest::Client::new(),
            token_url,
            ClientCredentials::new("abc", "shh"),
            REDIRECT_URI,
        )
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .and(header("authorization", "Basic YWJjOnNoaA=="))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "code": "xyz",
                "grant_type": "authorization_code",
                "redirect_uri": REDIRECT_URI,
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok1", "token_type": "bearer"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange("xyz").await.unwrap();
        assert_eq!(token.as_str(), "tok1");
    }

    #[tokio::test]
    async fn test_exchange_ignores_body_code_field() {
        let server = MockServer::start().await;

        // A `code` key in the body says nothing about success; status and access_token do.
        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 500, "access_token": "tok2"})),
            )
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange("xyz").await.unwrap();
        assert_eq!(token.as_str(), "tok2");
    }

    #[tokio::test]
    async fn test_exchange_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "bad credentials"
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("xyz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(matches!(
            err,
            CleverError::Provider { status: Some(401), ref message, .. }
                if message.contains("invalid_client")
        ));
    }

    #[tokio::test]
    async fn test_exchange_non_json_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("xyz").await.unwrap_err();
        assert!(matches!(
            err,
            CleverError::Provider { status: Some(502), .. }
        ));
    }

    #[tokio::test]
    async fn test_exchange_missing_access_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("xyz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_exchange_unparseable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("xyz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_exchange_empty_code_skips_provider() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
            .expect(0)
            .mount(&server)
            .await;

        let err = exchanger(&server).exchange("").await.unwrap_err();
        assert!(matches!(err, CleverError::MissingCode));
    }

    #[tokio::test]
    async fn test_exchange_transport_error() {
        // Nothing listens on the reserved port 9 of localhost.
        let exchanger = TokenExchanger::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/oauth/tokens").unwrap(),
            ClientCredentials::new("abc", "shh"),
            REDIRECT_URI,
        );

        let err = exchanger.exchange("xyz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.stage(), Some(FlowStage::TokenExchange));
    }

    #[test]
    fn test_access_token_debug_redacted() {
        let token = AccessToken::new("tok1");
        assert!(!format!("{token:?}").contains("tok1"));
    }
}
