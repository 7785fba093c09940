//! services/api/src/web/auth.rs
//!
//! Sign-up and login endpoints. Credentials are stored and compared exactly as
//! entered; the returned user id is the client's session value.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use learning_tracker_core::{
    domain::{NewUser, User},
    ports::PortError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::{rest::port_error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub institution: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The public view of a user. Never includes the password.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub name: String,
    pub institution: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            institution: user.institution,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

fn require_filled(fields: &[(&str, &str)]) -> Result<(), (StatusCode, String)> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(port_error_response(PortError::InvalidInput(format!(
            "Please fill in all fields (missing: {})",
            missing.join(", ")
        ))))
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "A required field is blank"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_filled(&[
        ("name", req.name.as_str()),
        ("institution", req.institution.as_str()),
        ("email", req.email.as_str()),
        ("password", req.password.as_str()),
    ])?;

    let user = state
        .store
        .add_user(NewUser {
            name: req.name,
            institution: req.institution,
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            port_error_response(e)
        })?;

    info!("New user created: {}", user.id);
    Ok((StatusCode::CREATED, Json(AuthResponse::from(user))))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "A required field is blank"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_filled(&[("email", req.email.as_str()), ("password", req.password.as_str())])?;

    let user = state
        .store
        .find_user_by_credentials(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            other => {
                error!("Failed to log in: {:?}", other);
                port_error_response(other)
            }
        })?;

    info!("User logged in: {}", user.id);
    Ok((StatusCode::OK, Json(AuthResponse::from(user))))
}
