//! API-key authentication middleware.
//!
//! Protected routes require an `X-Api-Key` header matching the key the server
//! was configured with. A server started without a key answers 500 on those
//! routes instead of letting them through.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;

/// Rejects requests without a valid `X-Api-Key` header.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .api_key
        .as_deref()
        .ok_or(ApiError::ServerMisconfigured)?;

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if key == expected => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}
