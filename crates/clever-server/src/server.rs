use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::{Router, middleware, routing::get};
use axum_extra::extract::cookie::Key;
use clever_auth::{CleverClient, ConfigError, InMemorySessionStore, SessionStore};
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, handlers, middleware as app_middleware, session};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub clever: Arc<CleverClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub cookie_key: Key,
    pub session_cookie: Arc<session::SessionCookie>,
}

impl AppState {
    pub fn new(cfg: &AppConfig, sessions: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        let clever = CleverClient::new(&cfg.provider, cfg.redirect_uri())?;

        Ok(Self {
            clever: Arc::new(clever),
            sessions,
            cookie_key: session::signing_key(&cfg.session.secret_key),
            session_cookie: Arc::new(session::SessionCookie {
                name: cfg.session.cookie_name.clone(),
                secure: cfg.secure_cookies(),
                max_age: cfg.session.ttl,
            }),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub struct CleverServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application with a process-local session store.
pub fn build_app(cfg: &AppConfig) -> Result<Router, ConfigError> {
    let sessions = Arc::new(InMemorySessionStore::new(cfg.session.ttl));
    let state = AppState::new(cfg, sessions)?;
    Ok(build_router(state))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/redirect", get(handlers::oauth_redirect))
        .route("/home", get(handlers::home))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        // Request id is outermost so the trace span can pick it up
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    // Path only: the redirect query carries the authorization code
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<CleverServer, ConfigError> {
        Ok(CleverServer {
            addr: self.addr,
            app: build_app(&self.config)?,
        })
    }
}

impl CleverServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.provider.client_id = "abc".into();
        cfg.provider.client_secret = "shh".into();
        cfg.session.secret_key = "app-secret".into();
        cfg
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = build_app(&test_config()).unwrap();
        let res = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(app_middleware::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn incoming_request_id_is_echoed() {
        let app = build_app(&test_config()).unwrap();
        let res = app
            .oneshot(
                Request::get("/healthz")
                    .header(app_middleware::REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()[app_middleware::REQUEST_ID_HEADER], "req-42");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_app(&test_config()).unwrap();
        let res = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_provider_url_fails_build() {
        let mut cfg = test_config();
        cfg.provider.token_url = "ftp://clever.com/oauth/tokens".into();
        assert!(ServerBuilder::new().with_config(cfg).build().is_err());
    }
}
