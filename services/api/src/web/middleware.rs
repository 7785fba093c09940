//! services/api/src/web/middleware.rs
//!
//! Session middleware for routes that act on behalf of a user.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use learning_tracker_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::{
    rest::port_error_response,
    state::{AppState, CurrentUser},
};

/// Header carrying the id of the signed-in user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that resolves the `x-user-id` header to a stored user.
///
/// If the user exists, a `CurrentUser` is inserted into request extensions for
/// handlers to use. If the header is missing or names no user, returns 401.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| port_error_response(PortError::Unauthorized))?
        .to_string();

    match state.store.find_user(&user_id).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser { user_id: user.id });
            Ok(next.run(req).await)
        }
        Err(PortError::NotFound(_)) => {
            warn!("Request for unknown user {}", user_id);
            Err(port_error_response(PortError::Unauthorized))
        }
        Err(e) => {
            error!("Failed to resolve user {}: {:?}", user_id, e);
            Err(port_error_response(e))
        }
    }
}
