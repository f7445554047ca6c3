//! Account endpoints: register, login, profile, password reset.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use wastewatch_common::{AppError, AppResult};
use wastewatch_core::{RegisterInput, UpdateProfileInput};
use wastewatch_db::entities::user::{self, UserRole};

use crate::{extractors::AuthUser, middleware::AppState};

/// User wire representation, without credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub points: i32,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            points: u.points,
            avatar_url: u.avatar_url,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Response carrying the account and its API token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

fn session_response(user: user::Model) -> AppResult<SessionResponse> {
    let token = user
        .token
        .clone()
        .ok_or_else(|| AppError::Internal("Account has no API token".to_string()))?;
    Ok(SessionResponse {
        user: user.into(),
        token,
    })
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let user = state.user_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(session_response(user)?)))
}

/// Log in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let user = state
        .user_service
        .authenticate(&req.email, &req.password)
        .await?;
    Ok(Json(session_response(user)?))
}

/// Invalidate the caller's API token.
async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.user_service.logout(&user.id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// The caller's own account.
async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Update the caller's profile.
///
/// Multipart form with optional `name` and `profileImage` fields; an
/// uploaded image is stored like a report photo and its URL becomes the
/// avatar.
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<UserResponse>> {
    let mut name = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {e}")))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        match field_name.as_str() {
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid name: {e}")))?;
                name = Some(text);
            }
            "profileImage" => {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
                image = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let avatar_url = match image {
        Some((file_name, content_type, bytes)) => {
            let stored = state
                .media_service
                .store(&user.id, &file_name, &content_type, &bytes)
                .await?;
            Some(stored.url)
        }
        None => None,
    };

    let input = UpdateProfileInput { name, avatar_url };
    let user = state.user_service.update_profile(&user.id, input).await?;
    Ok(Json(user.into()))
}

/// Start the password-reset flow.
///
/// Responds identically whether or not the email resolves to an account.
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    match state.user_service.create_reset_token(&req.email).await {
        Ok((user, token)) => {
            state
                .email_service
                .send_password_reset(&user.email, &user.name, &token)
                .await?;
        }
        Err(AppError::UserNotFound(_)) => {
            tracing::debug!(email = %req.email, "Password reset requested for unknown email");
        }
        Err(e) => return Err(e),
    }

    Ok(Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent".to_string(),
    }))
}

/// Finish the password-reset flow.
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .user_service
        .reset_password(&req.token, &req.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}
