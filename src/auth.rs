/// Authentication extractors and utilities
use crate::{
    admin::{AdminUser, PermissionSet},
    context::AppContext,
    error::{PortalError, PortalResult},
    portal::applications::Application,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use axum_extra::extract::cookie::CookieJar;

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Fallback header carrying the session token
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Resolve the admin session token from its accepted transports
///
/// Order: Authorization bearer, then x-session-token header, then the
/// admin_session cookie. The token is only ever a lookup key; identity
/// always comes from the session store.
pub fn extract_admin_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }

    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Authenticated admin context - validates the session token against the
/// session store on every request
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub admin: AdminUser,
    pub token: String,
    pub permissions: PermissionSet,
}

impl AdminAuthContext {
    /// Check a named permission, 403 on failure
    pub fn require_permission(&self, name: &str) -> PortalResult<()> {
        if !self.permissions.allows(name) {
            return Err(PortalError::Authorization(format!(
                "Requires {} permission",
                name
            )));
        }

        Ok(())
    }

    /// Permission check with a self-service exception: acting on your own
    /// admin record is allowed without the permission
    pub fn require_permission_or_self(&self, name: &str, subject_id: &str) -> PortalResult<()> {
        if self.admin.id == subject_id {
            return Ok(());
        }

        self.require_permission(name)
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_admin_token(&parts.headers).ok_or_else(|| {
            PortalError::Authentication("Missing session token".to_string())
        })?;

        let validated = state.sessions.validate_token(&token).await?;

        Ok(AdminAuthContext {
            admin: validated.admin,
            token: validated.token,
            permissions: validated.permissions,
        })
    }
}

/// Authenticated applicant context - bearer token only
#[derive(Debug, Clone)]
pub struct ApplicantAuthContext {
    pub application: Application,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppContext> for ApplicantAuthContext {
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            PortalError::Authentication("Missing authorization header".to_string())
        })?;

        let application = state.applications.validate_token(&token).await?;

        Ok(ApplicantAuthContext { application, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::Role;
    use axum::http::header::{AUTHORIZATION, COOKIE};
    use chrono::Utc;

    fn staff_auth(id: &str) -> AdminAuthContext {
        AdminAuthContext {
            admin: AdminUser {
                id: id.to_string(),
                email: "staff@university.edu".to_string(),
                name: "Staff".to_string(),
                role: Role::Staff,
                department: None,
                password_hash: String::new(),
                is_active: true,
                permission_overrides: serde_json::json!({}),
                last_login_at: None,
                created_at: Utc::now(),
            },
            token: "token".to_string(),
            permissions: PermissionSet::resolve(Role::Staff, &serde_json::json!({})),
        }
    }

    #[test]
    fn test_require_permission() {
        let auth = staff_auth("admin-1");

        assert!(auth.require_permission("timeline.read").is_ok());
        assert!(matches!(
            auth.require_permission("admins.update").unwrap_err(),
            PortalError::Authorization(_)
        ));
    }

    #[test]
    fn test_self_service_exception() {
        let auth = staff_auth("admin-1");

        // Acting on your own record needs no permission
        assert!(auth
            .require_permission_or_self("admins.update", "admin-1")
            .is_ok());

        // Acting on anyone else still requires it
        assert!(matches!(
            auth.require_permission_or_self("admins.update", "admin-2")
                .unwrap_err(),
            PortalError::Authorization(_)
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123token".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc123token"));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "abc123token".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_admin_token_transport_order() {
        // Bearer wins over header and cookie
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer from-bearer".parse().unwrap());
        headers.insert(SESSION_TOKEN_HEADER, "from-header".parse().unwrap());
        headers.insert(COOKIE, "admin_session=from-cookie".parse().unwrap());
        assert_eq!(extract_admin_token(&headers).as_deref(), Some("from-bearer"));

        // Header wins over cookie
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_TOKEN_HEADER, "from-header".parse().unwrap());
        headers.insert(COOKIE, "admin_session=from-cookie".parse().unwrap());
        assert_eq!(extract_admin_token(&headers).as_deref(), Some("from-header"));

        // Cookie alone works
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "admin_session=from-cookie".parse().unwrap());
        assert_eq!(extract_admin_token(&headers).as_deref(), Some("from-cookie"));

        let headers = HeaderMap::new();
        assert_eq!(extract_admin_token(&headers), None);
    }
}
