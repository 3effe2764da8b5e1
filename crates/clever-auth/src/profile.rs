//! User profile retrieval from the Clever `/me` endpoint.

use serde_json::{Map, Value};
use url::Url;

use crate::CleverResult;
use crate::error::{CleverError, FlowStage};
use crate::token::AccessToken;

const STAGE: FlowStage = FlowStage::ProfileFetch;

/// The authenticated user as returned by `/me`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    /// Clever user id (`data.id`).
    pub id: String,

    /// The full `data` object.
    pub data: Map<String, Value>,
}

impl UserProfile {
    /// Extracts the profile from a `/me` response body.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` if `data` is not an object or `data.id` is
    /// not a non-empty string.
    pub fn from_me_response(body: Value) -> CleverResult<Self> {
        let Value::Object(mut envelope) = body else {
            return Err(CleverError::malformed(STAGE, "response is not a JSON object"));
        };

        let data = match envelope.remove("data") {
            Some(Value::Object(data)) => data,
            Some(_) => return Err(CleverError::malformed(STAGE, "data is not an object")),
            None => return Err(CleverError::malformed(STAGE, "response has no data")),
        };

        let id = data
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| CleverError::malformed(STAGE, "response has no data.id"))?;

        Ok(Self { id, data })
    }
}

/// Fetches the current user's profile with a bearer token.
#[derive(Debug, Clone)]
pub struct ProfileFetcher {
    http_client: reqwest::Client,
    me_url: Url,
}

impl ProfileFetcher {
    /// Creates a new fetcher for the given `/me` URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, me_url: Url) -> Self {
        Self {
            http_client,
            me_url,
        }
    }

    /// Fetches the profile of the user the token belongs to.
    ///
    /// # Errors
    ///
    /// - `Transport` if the request could not be completed
    /// - `Provider` if Clever answered with a non-2xx status
    /// - `MalformedResponse` if the body lacks `data.id`
    pub async fn fetch(&self, token: &AccessToken) -> CleverResult<UserProfile> {
        let response = self
            .http_client
            .get(self.me_url.clone())
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| CleverError::transport(STAGE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CleverError::provider_status(
                STAGE,
                status.as_u16(),
                None,
                None,
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CleverError::transport(STAGE, e))?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            CleverError::malformed(STAGE, format!("failed to parse /me response: {e}"))
        })?;

        let profile = UserProfile::from_me_response(body)?;
        tracing::debug!(user_id = %profile.id, "Fetched Clever profile");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> ProfileFetcher {
        let me_url = Url::parse(&format!("{}/me", server.uri())).unwrap();
        ProfileFetcher::new(reqwest::Client::new(), me_url)
    }

    #[test]
    fn test_from_me_response() {
        let body = json!({
            "type": "student",
            "data": {
                "id": "u1",
                "district": "588910be5e56c4000146fc87",
                "type": "student",
                "name": {"first": "Ada", "last": "Lovelace"}
            },
            "links": [{"rel": "self", "uri": "/me"}]
        });

        let profile = UserProfile::from_me_response(body).unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.data["type"], "student");
        assert_eq!(profile.data["name"]["first"], "Ada");
        assert!(!profile.data.contains_key("links"));
    }

    #[test]
    fn test_from_me_response_missing_fields() {
        for body in [
            json!({}),
            json!([]),
            json!({"data": "u1"}),
            json!({"data": {}}),
            json!({"data": {"id": ""}}),
            json!({"data": {"id": 42}}),
        ] {
            let err = UserProfile::from_me_response(body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedResponse);
            assert_eq!(err.stage(), Some(FlowStage::ProfileFetch));
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "u1"}})))
            .expect(1)
            .mount(&server)
            .await;

        let profile = fetcher(&server)
            .fetch(&AccessToken::new("tok1"))
            .await
            .unwrap();
        assert_eq!(profile.id, "u1");
    }

    #[tokio::test]
    async fn test_fetch_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fetcher(&server)
            .fetch(&AccessToken::new("expired"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CleverError::Provider {
                stage: FlowStage::ProfileFetch,
                status: Some(401),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fetcher(&server)
            .fetch(&AccessToken::new("tok1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
