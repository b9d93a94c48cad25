//! Request middlewares.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::{Result, ServerError};

const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Extract a bearer token from the request headers.
///
/// `Authorization: Bearer <jwt>` is the canonical transport; the legacy
/// `x-auth-token` header is still honored for older clients.
fn extract_token(request: &Request) -> Option<&str> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().ok()?;
        return value.strip_prefix("Bearer ").or(Some(value));
    }

    request
        .headers()
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Middleware requiring a valid token on the request.
///
/// Decodes the claims and makes them available to handlers as an
/// [`Extension`](axum::Extension); the user row is not loaded here.
pub async fn authorization(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_token(&request).ok_or(ServerError::Unauthorized)?;
    let claims = state.token.decode(token)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
