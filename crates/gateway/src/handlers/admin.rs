//! Administrator panel: accounts and password resets

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::handlers::auth::UserResponse;
use crate::AppState;
use papercompass_common::{
    auth::AuthContext,
    db::{models::PasswordResetRequest, UserUpdate},
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteResetRequest {
    #[validate(length(min = 1, max = 256))]
    pub new_password: String,
}

/// Admin rights come from the stored account, so a demotion applies to
/// tokens issued before it.
async fn require_current_admin(state: &AppState, auth: &AuthContext) -> Result<()> {
    auth.require_admin()?;

    let user = state.repo.find_user_by_id(auth.user_id).await?.ok_or(AppError::InvalidToken)?;
    if !user.is_admin {
        tracing::warn!(user_id = user.id, "Token carries revoked admin rights");
        return Err(AppError::Forbidden {
            message: "Administrator rights required".to_string(),
        });
    }

    Ok(())
}

pub async fn list_users(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Vec<UserResponse>>> {
    require_current_admin(&state, &auth).await?;

    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Rename an account, change its password or toggle its admin flag
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
    Json(mut update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    require_current_admin(&state, &auth).await?;

    if let Some(username) = update.username.take() {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation {
                message: "Username must not be blank".to_string(),
                field: Some("username".to_string()),
            });
        }
        update.username = Some(username);
    }

    let user = state.repo.update_user(id, update).await?;
    tracing::info!(admin_id = auth.user_id, user_id = user.id, "Account updated");

    Ok(Json(user.into()))
}

pub async fn list_password_resets(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<PasswordResetRequest>>> {
    require_current_admin(&state, &auth).await?;
    Ok(Json(state.repo.pending_password_resets().await?))
}

/// Set the new password and close the request
pub async fn complete_password_reset(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
    Json(body): Json<CompleteResetRequest>,
) -> Result<Json<PasswordResetRequest>> {
    require_current_admin(&state, &auth).await?;
    body.validate()?;

    let request = state.repo.complete_password_reset(id, &body.new_password).await?;
    tracing::info!(admin_id = auth.user_id, request_id = request.id, user_id = request.user_id, "Password reset completed");

    Ok(Json(request))
}
