use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Response},
};
use clever_auth::{CleverError, UserSession};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, server::AppState, session::SessionHandle, templates};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

pub async fn index(State(state): State<AppState>, session: SessionHandle) -> Response {
    if session.is_authenticated() {
        return found("/home");
    }
    Html(templates::render_index(state.clever.authorization_url().as_str())).into_response()
}

/// Query parameters Clever sends back to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

pub async fn oauth_redirect(
    State(state): State<AppState>,
    session: SessionHandle,
    params: Result<Query<RedirectParams>, QueryRejection>,
) -> Result<Response, AppError> {
    // An unreadable callback query counts as a callback without a code
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable callback query");
        CleverError::MissingCode
    })?;

    if let Some(error) = params.error {
        return Err(CleverError::provider_denied(error).into());
    }

    let profile = state.clever.authenticate(params.code.as_deref()).await?;
    let jar = session.set(UserSession::from(profile)).await?;

    Ok((jar, found("/home")).into_response())
}

pub async fn home(session: SessionHandle) -> Result<Html<String>, AppError> {
    let current = session.require()?;
    Ok(Html(templates::render_home(&current.user, &current.data)))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
