//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use wastewatch_common::AppError;
use wastewatch_core::{EmailService, MediaService, ReportService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub user_service: UserService,
    pub email_service: EmailService,
    pub media_service: MediaService,
}

/// Authentication middleware.
///
/// Resolves the `Authorization: Bearer <token>` header into a user model and
/// stores it in request extensions. Requests with no token or an unknown
/// token pass through unauthenticated; handlers that need an identity reject
/// via the `AuthUser` extractor. Any other lookup failure is surfaced as-is
/// rather than downgraded to "unauthenticated".
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => {}
            Err(e) => {
                tracing::error!(error = %e, "Token lookup failed");
                return e.into_response();
            }
        }
    }

    next.run(req).await
}
