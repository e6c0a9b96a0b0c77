/// Admin authentication endpoints: login, logout, current session
use crate::{
    admin::{AdminUser, PermissionSet},
    api::ApiResponse,
    auth::{extract_admin_token, AdminAuthContext, SESSION_COOKIE},
    context::AppContext,
    error::PortalResult,
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build admin auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/auth/login", post(login))
        .route("/api/admin/auth/logout", post(logout))
        .route("/api/admin/auth/session", get(current_session))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
    #[serde(default)]
    remember_me: bool,
}

#[derive(Debug, Serialize)]
struct LoginData {
    token: String,
    expires_at: DateTime<Utc>,
    admin: AdminUser,
    permissions: Vec<String>,
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Admin login endpoint
///
/// Credentials are verified through the CredentialVerifier capability; on
/// success a session row is created with the permission set resolved once,
/// and the token is returned in the body and as an HTTP-only cookie.
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> PortalResult<(CookieJar, Json<ApiResponse<LoginData>>)> {
    let admin = ctx
        .credentials
        .verify_credentials(&req.email, &req.password)
        .await?;

    let permissions = PermissionSet::resolve(admin.role, &admin.permission_overrides);

    let ip = client_ip(&headers);
    let session = ctx
        .sessions
        .create_session(
            &admin,
            &permissions,
            req.remember_me,
            ip.clone(),
            user_agent(&headers),
        )
        .await?;

    ctx.admin_users.touch_last_login(&admin.id).await?;

    if let Err(e) = ctx
        .admin_users
        .log_action(&admin.id, "auth.login", None, None, ip.as_deref())
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    tracing::info!("Admin {} logged in", admin.email);

    let cookie = session_cookie(
        session.token.clone(),
        ctx.config.authentication.cookie_secure,
    );

    let data = LoginData {
        token: session.token,
        expires_at: session.expires_at,
        permissions: permissions.names().to_vec(),
        admin,
    };

    Ok((jar.add(cookie), Json(ApiResponse::new(data))))
}

/// Admin logout endpoint
///
/// Flips the session inactive (row retained) and clears the cookie.
/// Idempotent: unknown or missing tokens still clear the cookie.
async fn logout(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    headers: HeaderMap,
) -> PortalResult<(CookieJar, Json<ApiResponse<serde_json::Value>>)> {
    if let Some(token) = extract_admin_token(&headers) {
        ctx.sessions.invalidate(&token).await?;
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();

    Ok((
        jar.remove(removal),
        Json(ApiResponse::with_message(
            serde_json::json!(null),
            "Logged out",
        )),
    ))
}

#[derive(Debug, Serialize)]
struct SessionData {
    admin: AdminUser,
    permissions: Vec<String>,
}

/// Current admin session info
async fn current_session(auth: AdminAuthContext) -> PortalResult<Json<ApiResponse<SessionData>>> {
    let permissions = auth.permissions.names().to_vec();

    Ok(Json(ApiResponse::new(SessionData {
        admin: auth.admin,
        permissions,
    })))
}
