use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Extracts the bearer token from the `Authorization` header.
///
/// # Arguments
///
/// * `request` - The incoming request.
///
/// # Returns
///
/// An `Option` containing the token if the header is well-formed.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A middleware that requires a valid access token.
///
/// On success the caller's `Identity` is inserted into the request
/// extensions for the handlers to pick up.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an `AppError::Authentication`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_bearer_token(&request).ok_or_else(|| {
        tracing::warn!("❌ No bearer token found");
        AppError::Authentication("Missing bearer token".to_string())
    })?;

    let identity = state.tokens.verify(token)?;
    tracing::debug!("✅ Caller authenticated: {:?}", identity);

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
