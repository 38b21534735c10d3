//! Registration, login and password-reset requests

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use papercompass_common::{
    db::models::{PasswordResetRequest, User},
    errors::{AppError, Result},
    metrics,
};

/// Username and password pair
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

impl CredentialsRequest {
    /// Validated username with surrounding whitespace removed
    fn username(&self) -> Result<&str> {
        self.validate()?;
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation {
                message: "Username must not be blank".to_string(),
                field: Some("username".to_string()),
            });
        }
        Ok(username)
    }
}

/// Public view of an account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}

/// Issued session token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetBody {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
}

/// Create a regular account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let username = request.username()?;

    let result = state.repo.register(username, &request.password).await;
    metrics::record_auth("register", result.is_ok());
    let user = result?;

    tracing::info!(user_id = user.id, username = %user.username, "Account registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let username = request.username()?;

    let result = state.repo.authenticate(username, &request.password).await;
    metrics::record_auth("login", result.is_ok());
    let user = result?;

    let token = state.jwt.generate_token(user.id, &user.username, user.is_admin)?;
    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_secs,
        user: user.into(),
    }))
}

/// File a password-reset request for an administrator to complete
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetBody>,
) -> Result<(StatusCode, Json<PasswordResetRequest>)> {
    body.validate()?;

    let request = state.repo.request_password_reset(body.username.trim()).await?;
    tracing::info!(request_id = request.id, user_id = request.user_id, "Password reset requested");

    Ok((StatusCode::ACCEPTED, Json(request)))
}
