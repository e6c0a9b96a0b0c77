/// Configuration management for the admissions portal
use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub portal_db: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Admin session lifetime in hours (default login)
    pub session_ttl_hours: i64,
    /// Admin session lifetime in days when remember-me is set
    pub remember_me_ttl_days: i64,
    /// Applicant session lifetime in hours
    pub applicant_session_ttl_hours: i64,
    /// Mark the admin_session cookie as Secure
    pub cookie_secure: bool,
}

/// Bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Seed the three demo admin accounts at startup
    pub seed_demo_admins: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> PortalResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PORTAL_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("PORTAL_PORT")
            .unwrap_or_else(|_| "8750".to_string())
            .parse()
            .map_err(|_| PortalError::Validation("Invalid port number".to_string()))?;
        let version = env::var("PORTAL_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("PORTAL_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let portal_db = env::var("PORTAL_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("portal.sqlite"));

        let session_ttl_hours = env::var("PORTAL_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .unwrap_or(8);
        let remember_me_ttl_days = env::var("PORTAL_REMEMBER_ME_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);
        let applicant_session_ttl_hours = env::var("PORTAL_APPLICANT_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let cookie_secure = env::var("PORTAL_COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let seed_demo_admins = env::var("PORTAL_SEED_DEMO_ADMINS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                portal_db,
            },
            authentication: AuthConfig {
                session_ttl_hours,
                remember_me_ttl_days,
                applicant_session_ttl_hours,
                cookie_secure,
            },
            bootstrap: BootstrapConfig { seed_demo_admins },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> PortalResult<()> {
        if self.service.hostname.is_empty() {
            return Err(PortalError::Validation(
                "Hostname cannot be empty".to_string(),
            ));
        }

        if self.authentication.session_ttl_hours <= 0 {
            return Err(PortalError::Validation(
                "Session TTL must be positive".to_string(),
            ));
        }

        if self.authentication.remember_me_ttl_days <= 0 {
            return Err(PortalError::Validation(
                "Remember-me TTL must be positive".to_string(),
            ));
        }

        if self.authentication.applicant_session_ttl_hours <= 0 {
            return Err(PortalError::Validation(
                "Applicant session TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
