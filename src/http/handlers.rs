//! Route handlers.

use super::{AppState, TOKEN_COOKIE};
use crate::error::TokenError;
use crate::metrics::{StatsReport, export_prometheus};
use axum::Json;
use axum::extract::State;
use axum::http::{Uri, header};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Body of a successful `GET /verify`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Subject recovered from the token
    pub user_name: String,
}

/// `GET /auth/{user_name}`: set the token cookie, return the public key.
///
/// The subject is the path segment exactly as sent, percent escapes
/// included.
pub async fn issue(
    State(state): State<AppState>,
    uri: Uri,
    jar: CookieJar,
) -> Result<(CookieJar, [(header::HeaderName, &'static str); 1], Vec<u8>), TokenError> {
    let user_name = raw_last_segment(&uri)
        .ok_or_else(|| TokenError::internal(format!("no subject segment in {}", uri.path())))?;
    let issued = state.issuer.issue(user_name).await?;

    let cookie = Cookie::build((TOKEN_COOKIE, issued.token))
        .path("/")
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        issued.public_key_pem,
    ))
}

/// `GET /verify`: check the token cookie.
pub async fn verify(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<VerifyResponse>, TokenError> {
    let token = jar.get(TOKEN_COOKIE).map(|cookie| cookie.value());
    let user_name = state.verifier.verify(token).await?;

    Ok(Json(VerifyResponse { user_name }))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<StatsReport> {
    Json(state.metrics.report())
}

/// `GET /README.txt`
pub async fn readme(
    State(state): State<AppState>,
) -> Result<([(header::HeaderName, &'static str); 1], String), TokenError> {
    let path = state.readme_path.as_path();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TokenError::Static {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], content))
}

/// `GET /metrics`
pub async fn metrics() -> Result<String, TokenError> {
    export_prometheus().map_err(|e| TokenError::internal(e.to_string()))
}

fn raw_last_segment(uri: &Uri) -> Option<&str> {
    uri.path()
        .rsplit_once('/')
        .map(|(_, segment)| segment)
        .filter(|segment| !segment.is_empty())
}
