/// Admin session issuance and validation
///
/// Sessions are opaque server-side tokens. Every protected request validates
/// the token against the session table: the row must exist, be active, and
/// be unexpired. Permissions are resolved once at login and snapshotted onto
/// the session row for its lifetime.
use crate::{
    admin::permissions::PermissionSet,
    admin::users::{AdminUser, AdminUserManager},
    config::ServerConfig,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Fixed length of session tokens
pub const TOKEN_LENGTH: usize = 48;

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Admin session record
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub permissions: PermissionSet,
}

/// Session validated against the session store
#[derive(Debug, Clone)]
pub struct ValidatedAdminSession {
    pub admin: AdminUser,
    pub token: String,
    pub permissions: PermissionSet,
    pub expires_at: DateTime<Utc>,
}

/// Generate an opaque session token
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();

    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_CHARSET.len());
            TOKEN_CHARSET[idx] as char
        })
        .collect()
}

/// Admin session manager
#[derive(Clone)]
pub struct SessionManager {
    db: SqlitePool,
    admin_users: AdminUserManager,
    config: Arc<ServerConfig>,
}

impl SessionManager {
    pub fn new(db: SqlitePool, admin_users: AdminUserManager, config: Arc<ServerConfig>) -> Self {
        Self {
            db,
            admin_users,
            config,
        }
    }

    /// Create a session for a verified admin
    ///
    /// Expiry is absolute: session_ttl_hours from now, or remember_me_ttl_days
    /// when the remember-me flag is set.
    pub async fn create_session(
        &self,
        admin: &AdminUser,
        permissions: &PermissionSet,
        remember_me: bool,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> PortalResult<AdminSession> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = if remember_me {
            now + Duration::days(self.config.authentication.remember_me_ttl_days)
        } else {
            now + Duration::hours(self.config.authentication.session_ttl_hours)
        };

        sqlx::query(
            r#"
            INSERT INTO admin_session (token, admin_id, created_at, expires_at, ip_address, user_agent, is_active, permissions)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&token)
        .bind(&admin.id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .bind(&ip_address)
        .bind(&user_agent)
        .bind(permissions.to_json()?)
        .execute(&self.db)
        .await?;

        Ok(AdminSession {
            token,
            admin_id: admin.id.clone(),
            created_at: now,
            expires_at,
            ip_address,
            user_agent,
            is_active: true,
            permissions: permissions.clone(),
        })
    }

    /// Validate a session token against the session store
    ///
    /// The row must exist, be active, and be unexpired; the owning admin
    /// must still exist and be active.
    pub async fn validate_token(&self, token: &str) -> PortalResult<ValidatedAdminSession> {
        let row = sqlx::query(
            r#"
            SELECT admin_id, expires_at, is_active, permissions
            FROM admin_session
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| PortalError::Authentication("Invalid session token".to_string()))?;

        let is_active: bool = row.get("is_active");
        if !is_active {
            return Err(PortalError::Authentication(
                "Invalid session token".to_string(),
            ));
        }

        let expires_at_str: String = row.get("expires_at");
        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            return Err(PortalError::Authentication("Session expired".to_string()));
        }

        let admin_id: String = row.get("admin_id");
        let admin = self
            .admin_users
            .get_admin(&admin_id)
            .await?
            .filter(|admin| admin.is_active)
            .ok_or_else(|| PortalError::Authentication("Invalid session token".to_string()))?;

        let permissions_json: String = row.get("permissions");
        let permissions = PermissionSet::from_json(&permissions_json)?;

        Ok(ValidatedAdminSession {
            admin,
            token: token.to_string(),
            permissions,
            expires_at,
        })
    }

    /// Invalidate a session (logout)
    ///
    /// Flips is_active; the row is retained. Unknown tokens are a no-op so
    /// logout stays idempotent.
    pub async fn invalidate(&self, token: &str) -> PortalResult<()> {
        sqlx::query("UPDATE admin_session SET is_active = 0 WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        admin::credentials::seed_demo_admins,
        admin::permissions::{PermissionSet, Role},
        config::{
            AuthConfig, BootstrapConfig, LoggingConfig, ServiceConfig, StorageConfig,
        },
        db,
    };

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8750,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                portal_db: ":memory:".into(),
            },
            authentication: AuthConfig {
                session_ttl_hours: 8,
                remember_me_ttl_days: 7,
                applicant_session_ttl_hours: 24,
                cookie_secure: false,
            },
            bootstrap: BootstrapConfig {
                seed_demo_admins: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn setup() -> (SessionManager, AdminUser) {
        let pool = db::test_pool().await;
        let admin_users = AdminUserManager::new(pool.clone());
        seed_demo_admins(&admin_users).await.unwrap();

        let admin = admin_users
            .get_admin_by_email("admin@university.edu")
            .await
            .unwrap()
            .unwrap();

        let manager = SessionManager::new(pool, admin_users, test_config());
        (manager, admin)
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_create_and_validate_session() {
        let (manager, admin) = setup().await;
        let permissions = PermissionSet::resolve(Role::SuperAdmin, &serde_json::json!({}));

        let session = manager
            .create_session(&admin, &permissions, false, None, None)
            .await
            .unwrap();

        assert_eq!(session.token.len(), TOKEN_LENGTH);
        // 8h expiry within a second of now
        let expected = Utc::now() + Duration::hours(8);
        assert!((session.expires_at - expected).num_seconds().abs() <= 1);

        let validated = manager.validate_token(&session.token).await.unwrap();
        assert_eq!(validated.admin.id, admin.id);
        assert!(validated.permissions.allows("admins.delete"));
    }

    #[tokio::test]
    async fn test_remember_me_extends_expiry() {
        let (manager, admin) = setup().await;
        let permissions = PermissionSet::resolve(Role::SuperAdmin, &serde_json::json!({}));

        let session = manager
            .create_session(&admin, &permissions, true, None, None)
            .await
            .unwrap();

        let expected = Utc::now() + Duration::days(7);
        assert!((session.expires_at - expected).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let (manager, _admin) = setup().await;

        let err = manager.validate_token("not-a-real-token").await.unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (manager, admin) = setup().await;
        let permissions = PermissionSet::resolve(Role::SuperAdmin, &serde_json::json!({}));

        let session = manager
            .create_session(&admin, &permissions, false, None, None)
            .await
            .unwrap();

        manager.invalidate(&session.token).await.unwrap();

        // The same token must fail validation afterwards
        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));

        // Idempotent: a second logout is a no-op
        manager.invalidate(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let (manager, admin) = setup().await;
        let permissions = PermissionSet::resolve(Role::SuperAdmin, &serde_json::json!({}));

        let session = manager
            .create_session(&admin, &permissions, false, None, None)
            .await
            .unwrap();

        // Backdate the expiry while leaving is_active set
        sqlx::query("UPDATE admin_session SET expires_at = ? WHERE token = ?")
            .bind((Utc::now() - Duration::hours(1)).to_rfc3339())
            .bind(&session.token)
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_deactivated_admin_invalidates_session() {
        let (manager, admin) = setup().await;
        let permissions = PermissionSet::resolve(Role::SuperAdmin, &serde_json::json!({}));

        let session = manager
            .create_session(&admin, &permissions, false, None, None)
            .await
            .unwrap();

        manager
            .admin_users
            .update_admin(
                &admin.id,
                crate::admin::users::AdminUserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));
    }
}
