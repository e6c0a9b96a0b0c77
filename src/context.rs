/// Application context and dependency injection
use crate::{
    admin::{
        credentials::{seed_demo_admins, CredentialVerifier, PasswordVerifier},
        AdminUserManager, SessionManager,
    },
    config::ServerConfig,
    db,
    error::PortalResult,
    portal::{
        applications::ApplicationManager, checklist::ChecklistManager, feedback::FeedbackManager,
        messages::MessageManager, timeline::TimelineManager,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub admin_users: AdminUserManager,
    pub sessions: SessionManager,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub applications: ApplicationManager,
    pub timeline: TimelineManager,
    pub feedback: FeedbackManager,
    pub checklist: ChecklistManager,
    pub messages: MessageManager,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> PortalResult<Self> {
        config.validate()?;

        let pool = db::create_pool(&config.storage.portal_db, db::DatabaseOptions::default())
            .await?;

        db::init_schema(&pool).await?;
        db::test_connection(&pool).await?;

        let config = Arc::new(config);

        let admin_users = AdminUserManager::new(pool.clone());
        let sessions = SessionManager::new(pool.clone(), admin_users.clone(), Arc::clone(&config));
        let credentials: Arc<dyn CredentialVerifier> =
            Arc::new(PasswordVerifier::new(admin_users.clone()));

        let applications = ApplicationManager::new(pool.clone(), Arc::clone(&config));
        let timeline = TimelineManager::new(pool.clone());
        let feedback = FeedbackManager::new(pool.clone());
        let checklist = ChecklistManager::new(pool.clone());
        let messages = MessageManager::new(pool.clone());

        if config.bootstrap.seed_demo_admins {
            seed_demo_admins(&admin_users).await?;
        }

        Ok(Self {
            config,
            db: pool,
            admin_users,
            sessions,
            credentials,
            applications,
            timeline,
            feedback,
            checklist,
            messages,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

#[cfg(test)]
impl AppContext {
    /// Context backed by an in-memory database, for handler tests
    pub async fn test() -> Self {
        use crate::config::{
            AuthConfig, BootstrapConfig, LoggingConfig, ServiceConfig, StorageConfig,
        };

        let pool = db::test_pool().await;
        let config = Arc::new(ServerConfig {
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
        });

        let admin_users = AdminUserManager::new(pool.clone());
        let sessions = SessionManager::new(pool.clone(), admin_users.clone(), Arc::clone(&config));
        let credentials: Arc<dyn CredentialVerifier> =
            Arc::new(PasswordVerifier::new(admin_users.clone()));

        Self {
            applications: ApplicationManager::new(pool.clone(), Arc::clone(&config)),
            timeline: TimelineManager::new(pool.clone()),
            feedback: FeedbackManager::new(pool.clone()),
            checklist: ChecklistManager::new(pool.clone()),
            messages: MessageManager::new(pool.clone()),
            config,
            db: pool,
            admin_users,
            sessions,
            credentials,
        }
    }
}
