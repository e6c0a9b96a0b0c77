/// Admin user management
use crate::{
    admin::credentials::hash_password,
    admin::permissions::Role,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Admin user record
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    /// Per-user permission overrides, JSON map of name -> bool
    pub permission_overrides: serde_json::Value,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an admin user
#[derive(Debug, Clone, Deserialize)]
pub struct NewAdminUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub password: String,
    pub permission_overrides: Option<serde_json::Value>,
}

/// Fields for updating an admin user
///
/// An absent field leaves the column unchanged; `department` additionally
/// accepts an explicit JSON null to clear the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub department: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
    pub permission_overrides: Option<serde_json::Value>,
}

/// Deserializer distinguishing an absent field (no change, outer None) from
/// an explicit null (clear, Some(None))
pub(crate) fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Admin user manager
#[derive(Clone)]
pub struct AdminUserManager {
    db: SqlitePool,
}

impl AdminUserManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new admin user
    pub async fn create_admin(&self, new: NewAdminUser) -> PortalResult<AdminUser> {
        let email = new.email.trim().to_lowercase();

        if email.is_empty() {
            return Err(PortalError::Validation("Email is required".to_string()));
        }
        if new.name.trim().is_empty() {
            return Err(PortalError::Validation("Name is required".to_string()));
        }
        if new.password.len() < 8 {
            return Err(PortalError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.get_admin_by_email(&email).await?.is_some() {
            return Err(PortalError::Conflict(format!(
                "Admin with email {} already exists",
                email
            )));
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(&new.password).await?;
        let overrides = new
            .permission_overrides
            .unwrap_or_else(|| serde_json::json!({}));
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO admin_user (id, email, name, role, department, password_hash, is_active, permission_overrides, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(new.name.trim())
        .bind(new.role.as_str())
        .bind(&new.department)
        .bind(&password_hash)
        .bind(overrides.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(AdminUser {
            id,
            email,
            name: new.name.trim().to_string(),
            role: new.role,
            department: new.department,
            password_hash,
            is_active: true,
            permission_overrides: overrides,
            last_login_at: None,
            created_at: now,
        })
    }

    /// Get an admin user by id
    pub async fn get_admin(&self, id: &str) -> PortalResult<Option<AdminUser>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, department, password_hash, is_active,
                   permission_overrides, last_login_at, created_at
            FROM admin_user
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_admin).transpose()
    }

    /// Get an admin user by email (lowercased/trimmed before lookup)
    pub async fn get_admin_by_email(&self, email: &str) -> PortalResult<Option<AdminUser>> {
        let email = email.trim().to_lowercase();

        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, department, password_hash, is_active,
                   permission_overrides, last_login_at, created_at
            FROM admin_user
            WHERE email = ?
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_admin).transpose()
    }

    /// List all admin users, newest first
    pub async fn list_admins(&self) -> PortalResult<Vec<AdminUser>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, name, role, department, password_hash, is_active,
                   permission_overrides, last_login_at, created_at
            FROM admin_user
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::parse_admin).collect()
    }

    /// Update an admin user; unset fields keep their current value
    pub async fn update_admin(&self, id: &str, update: AdminUserUpdate) -> PortalResult<AdminUser> {
        let current = self
            .get_admin(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("Admin user {} not found", id)))?;

        let name = match update.name {
            Some(name) => {
                if name.trim().is_empty() {
                    return Err(PortalError::Validation("Name cannot be empty".to_string()));
                }
                name.trim().to_string()
            }
            None => current.name,
        };
        let department = update.department.unwrap_or(current.department);
        let role = update.role.unwrap_or(current.role);
        let is_active = update.is_active.unwrap_or(current.is_active);
        let permission_overrides = update
            .permission_overrides
            .unwrap_or(current.permission_overrides);
        let password_hash = match update.password {
            Some(password) => {
                if password.len() < 8 {
                    return Err(PortalError::Validation(
                        "Password must be at least 8 characters".to_string(),
                    ));
                }
                hash_password(&password).await?
            }
            None => current.password_hash,
        };

        sqlx::query(
            r#"
            UPDATE admin_user
            SET name = ?,
                department = ?,
                role = ?,
                is_active = ?,
                permission_overrides = ?,
                password_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&department)
        .bind(role.as_str())
        .bind(is_active)
        .bind(permission_overrides.to_string())
        .bind(&password_hash)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(AdminUser {
            id: id.to_string(),
            email: current.email,
            name,
            role,
            department,
            password_hash,
            is_active,
            permission_overrides,
            last_login_at: current.last_login_at,
            created_at: current.created_at,
        })
    }

    /// Delete an admin user
    pub async fn delete_admin(&self, id: &str) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM admin_user WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound(format!(
                "Admin user {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: &str) -> PortalResult<()> {
        sqlx::query("UPDATE admin_user SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Append an entry to the admin audit log
    pub async fn log_action(
        &self,
        admin_id: &str,
        action: &str,
        subject: Option<&str>,
        details: Option<&str>,
        ip_address: Option<&str>,
    ) -> PortalResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_audit_log (admin_id, action, subject, details, ip_address, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(admin_id)
        .bind(action)
        .bind(subject)
        .bind(details)
        .bind(ip_address)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    fn parse_admin(row: sqlx::sqlite::SqliteRow) -> PortalResult<AdminUser> {
        let role_str: String = row.get("role");
        let role = Role::from_str(&role_str)?;

        let overrides_str: String = row.get("permission_overrides");
        let permission_overrides = serde_json::from_str(&overrides_str)
            .map_err(|e| PortalError::Internal(format!("Invalid permission overrides: {}", e)))?;

        let created_at_str: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let last_login_at = row
            .try_get::<String, _>("last_login_at")
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(AdminUser {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            role,
            department: row.get("department"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            permission_overrides,
            last_login_at,
            created_at,
        })
    }
}
