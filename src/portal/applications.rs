/// Applicant accounts and bearer-token sessions
use crate::{
    admin::credentials::{hash_password, verify_password},
    admin::sessions::generate_token,
    config::ServerConfig,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Application record (the end-user identity)
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub program: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Applicant session record
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSession {
    pub token: String,
    pub application_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Fields for registering an application
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub email: String,
    pub name: String,
    pub password: String,
    pub program: Option<String>,
}

/// Application manager
#[derive(Clone)]
pub struct ApplicationManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl ApplicationManager {
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Register a new application
    pub async fn register(&self, new: NewApplication) -> PortalResult<Application> {
        let email = new.email.trim().to_lowercase();

        if email.is_empty() || !email.contains('@') {
            return Err(PortalError::Validation(
                "A valid email is required".to_string(),
            ));
        }
        if new.name.trim().is_empty() {
            return Err(PortalError::Validation("Name is required".to_string()));
        }
        if new.password.len() < 8 {
            return Err(PortalError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.get_by_email(&email).await?.is_some() {
            return Err(PortalError::Conflict(
                "An application with this email already exists".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(&new.password).await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO application (id, email, name, password_hash, program, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'in_progress', ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(new.name.trim())
        .bind(&password_hash)
        .bind(&new.program)
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(Application {
            id,
            email,
            name: new.name.trim().to_string(),
            password_hash,
            program: new.program,
            status: "in_progress".to_string(),
            created_at: now,
        })
    }

    /// Authenticate an applicant and issue a bearer token
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> PortalResult<(Application, ApplicantSession)> {
        let application = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| PortalError::Authentication("Invalid credentials".to_string()))?;

        let valid = verify_password(password, &application.password_hash).await?;
        if !valid {
            return Err(PortalError::Authentication("Invalid credentials".to_string()));
        }

        let token = generate_token();
        let now = Utc::now();
        let expires_at =
            now + Duration::hours(self.config.authentication.applicant_session_ttl_hours);

        sqlx::query(
            r#"
            INSERT INTO applicant_session (token, application_id, created_at, expires_at, is_active)
            VALUES (?, ?, ?, ?, 1)
            "#,
        )
        .bind(&token)
        .bind(&application.id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        let session = ApplicantSession {
            token,
            application_id: application.id.clone(),
            created_at: now,
            expires_at,
            is_active: true,
        };

        Ok((application, session))
    }

    /// Validate an applicant bearer token
    pub async fn validate_token(&self, token: &str) -> PortalResult<Application> {
        let row = sqlx::query(
            r#"
            SELECT application_id, expires_at, is_active
            FROM applicant_session
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

        let application_id: String = row.get("application_id");
        self.get_application(&application_id)
            .await?
            .ok_or_else(|| PortalError::Authentication("Invalid session token".to_string()))
    }

    /// Invalidate an applicant session (logout); unknown tokens are a no-op
    pub async fn invalidate(&self, token: &str) -> PortalResult<()> {
        sqlx::query("UPDATE applicant_session SET is_active = 0 WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Get an application by id
    pub async fn get_application(&self, id: &str) -> PortalResult<Option<Application>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, program, status, created_at
            FROM application
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_application).transpose()
    }

    async fn get_by_email(&self, email: &str) -> PortalResult<Option<Application>> {
        let email = email.trim().to_lowercase();

        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, program, status, created_at
            FROM application
            WHERE email = ?
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_application).transpose()
    }

    fn parse_application(row: sqlx::sqlite::SqliteRow) -> PortalResult<Application> {
        let created_at_str: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Application {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            password_hash: row.get("password_hash"),
            program: row.get("program"),
            status: row.get("status"),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AuthConfig, BootstrapConfig, LoggingConfig, ServiceConfig, StorageConfig},
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

    fn new_application(email: &str) -> NewApplication {
        NewApplication {
            email: email.to_string(),
            name: "Test Applicant".to_string(),
            password: "applicant-pw".to_string(),
            program: Some("Computer Science".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_login_and_validate() {
        let pool = db::test_pool().await;
        let manager = ApplicationManager::new(pool, test_config());

        manager
            .register(new_application("student@example.com"))
            .await
            .unwrap();

        let (application, session) = manager
            .login("student@example.com", "applicant-pw")
            .await
            .unwrap();
        assert_eq!(session.application_id, application.id);

        let validated = manager.validate_token(&session.token).await.unwrap();
        assert_eq!(validated.id, application.id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let pool = db::test_pool().await;
        let manager = ApplicationManager::new(pool, test_config());

        manager
            .register(new_application("student@example.com"))
            .await
            .unwrap();

        let err = manager
            .login("student@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_conflict() {
        let pool = db::test_pool().await;
        let manager = ApplicationManager::new(pool, test_config());

        manager
            .register(new_application("student@example.com"))
            .await
            .unwrap();
        let err = manager
            .register(new_application("student@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_applicant_session() {
        let pool = db::test_pool().await;
        let manager = ApplicationManager::new(pool, test_config());

        manager
            .register(new_application("student@example.com"))
            .await
            .unwrap();
        let (_, session) = manager
            .login("student@example.com", "applicant-pw")
            .await
            .unwrap();

        manager.invalidate(&session.token).await.unwrap();

        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, PortalError::Authentication(_)));
    }
}
