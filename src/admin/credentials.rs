/// Credential verification for admin login
///
/// All credential checks go through the `CredentialVerifier` capability so
/// the login handler carries no special cases. Demo accounts exist only as
/// an optional bootstrap seed with properly hashed passwords.
use crate::{
    admin::permissions::Role,
    admin::users::{AdminUser, AdminUserManager, NewAdminUser},
    error::{PortalError, PortalResult},
};
use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Demo accounts inserted when PORTAL_SEED_DEMO_ADMINS is set
const DEMO_ADMINS: [(&str, &str, Role, &str); 3] = [
    ("admin@university.edu", "Portal Admin", Role::SuperAdmin, "admin123!"),
    ("manager@university.edu", "Admissions Manager", Role::Manager, "manager123!"),
    ("staff@university.edu", "Admissions Staff", Role::Staff, "staff123!"),
];

/// Hash a password with bcrypt on the blocking thread pool
pub async fn hash_password(password: &str) -> PortalResult<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, DEFAULT_COST)
            .map_err(|e| PortalError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| PortalError::Internal(format!("Task join error: {}", e)))?
}

/// Verify a password against a bcrypt hash on the blocking thread pool
pub async fn verify_password(password: &str, password_hash: &str) -> PortalResult<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &password_hash)
            .map_err(|e| PortalError::Internal(format!("Password verification failed: {}", e)))
    })
    .await
    .map_err(|e| PortalError::Internal(format!("Task join error: {}", e)))?
}

/// Uniform credential verification interface
///
/// Returns the verified admin record or a uniform authentication failure.
/// Callers must not be able to distinguish unknown email, inactive account,
/// and wrong password from the error alone.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_credentials(&self, email: &str, password: &str) -> PortalResult<AdminUser>;
}

/// Password verifier backed by bcrypt hashes in the admin_user table
pub struct PasswordVerifier {
    admin_users: AdminUserManager,
}

impl PasswordVerifier {
    pub fn new(admin_users: AdminUserManager) -> Self {
        Self { admin_users }
    }

    fn invalid_credentials() -> PortalError {
        PortalError::Authentication("Invalid credentials".to_string())
    }
}

#[async_trait]
impl CredentialVerifier for PasswordVerifier {
    async fn verify_credentials(&self, email: &str, password: &str) -> PortalResult<AdminUser> {
        let admin = self
            .admin_users
            .get_admin_by_email(email)
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        if !admin.is_active {
            return Err(Self::invalid_credentials());
        }

        let valid = verify_password(password, &admin.password_hash).await?;
        if !valid {
            return Err(Self::invalid_credentials());
        }

        Ok(admin)
    }
}

/// Seed the demo admin accounts if they do not exist yet
pub async fn seed_demo_admins(admin_users: &AdminUserManager) -> PortalResult<()> {
    for (email, name, role, password) in DEMO_ADMINS {
        if admin_users.get_admin_by_email(email).await?.is_some() {
            continue;
        }

        admin_users
            .create_admin(NewAdminUser {
                email: email.to_string(),
                name: name.to_string(),
                role,
                department: None,
                password: password.to_string(),
                permission_overrides: None,
            })
            .await?;

        tracing::info!("Seeded demo admin account: {}", email);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_password_round_trip() {
        let hash = hash_password("hunter22").await.unwrap();

        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let pool = db::test_pool().await;
        let manager = AdminUserManager::new(pool);
        seed_demo_admins(&manager).await.unwrap();

        let verifier = PasswordVerifier::new(manager);

        let admin = verifier
            .verify_credentials("admin@university.edu", "admin123!")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);

        // Wrong password and unknown email fail with the same uniform error
        let wrong = verifier
            .verify_credentials("admin@university.edu", "nope")
            .await
            .unwrap_err();
        let unknown = verifier
            .verify_credentials("ghost@university.edu", "nope")
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_inactive_admin_cannot_login() {
        let pool = db::test_pool().await;
        let manager = AdminUserManager::new(pool);
        seed_demo_admins(&manager).await.unwrap();

        let admin = manager
            .get_admin_by_email("staff@university.edu")
            .await
            .unwrap()
            .unwrap();
        manager
            .update_admin(
                &admin.id,
                crate::admin::users::AdminUserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let verifier = PasswordVerifier::new(manager);
        let err = verifier
            .verify_credentials("staff@university.edu", "staff123!")
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = db::test_pool().await;
        let manager = AdminUserManager::new(pool);

        seed_demo_admins(&manager).await.unwrap();
        seed_demo_admins(&manager).await.unwrap();

        assert_eq!(manager.list_admins().await.unwrap().len(), 3);
    }
}
