/// Applicant account endpoints: register, login, logout, profile
use crate::{
    api::ApiResponse,
    auth::{extract_bearer_token, ApplicantAuthContext},
    context::AppContext,
    error::PortalResult,
    portal::applications::{Application, NewApplication},
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build applicant account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// Register a new application
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<NewApplication>,
) -> PortalResult<Json<ApiResponse<Application>>> {
    let application = ctx.applications.register(req).await?;

    tracing::info!("New application registered: {}", application.email);

    Ok(Json(ApiResponse::with_message(
        application,
        "Application created",
    )))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginData {
    token: String,
    expires_at: DateTime<Utc>,
    application: Application,
}

/// Applicant login endpoint; issues a bearer token
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> PortalResult<Json<ApiResponse<LoginData>>> {
    let (application, session) = ctx.applications.login(&req.email, &req.password).await?;

    Ok(Json(ApiResponse::new(LoginData {
        token: session.token,
        expires_at: session.expires_at,
        application,
    })))
}

/// Applicant logout endpoint; idempotent
async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> PortalResult<Json<ApiResponse<serde_json::Value>>> {
    if let Some(token) = extract_bearer_token(&headers) {
        ctx.applications.invalidate(&token).await?;
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Logged out",
    )))
}

/// Current applicant profile
async fn me(auth: ApplicantAuthContext) -> PortalResult<Json<ApiResponse<Application>>> {
    Ok(Json(ApiResponse::new(auth.application)))
}
