/// Admin-curated checklist items shown to applicants
use crate::admin::users::clearable;
use crate::error::{PortalError, PortalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Checklist item record
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: i64,
    pub is_published: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for updating a checklist item
///
/// An absent field leaves the column unchanged; `description` and `category`
/// additionally accept an explicit JSON null to clear the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecklistItemUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    pub category: Option<Option<String>>,
    pub sort_order: Option<i64>,
    pub is_published: Option<bool>,
}

/// Checklist manager
#[derive(Clone)]
pub struct ChecklistManager {
    db: SqlitePool,
}

impl ChecklistManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a checklist item (unpublished by default)
    pub async fn create_item(
        &self,
        title: &str,
        description: Option<&str>,
        category: Option<&str>,
        sort_order: i64,
        created_by: &str,
    ) -> PortalResult<ChecklistItem> {
        if title.trim().is_empty() {
            return Err(PortalError::Validation("Title is required".to_string()));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO checklist_item (title, description, category, sort_order, is_published, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(title.trim())
        .bind(description)
        .bind(category)
        .bind(sort_order)
        .bind(created_by)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(ChecklistItem {
            id: result.last_insert_rowid(),
            title: title.trim().to_string(),
            description: description.map(String::from),
            category: category.map(String::from),
            sort_order,
            is_published: false,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a checklist item by id
    pub async fn get_item(&self, id: i64) -> PortalResult<Option<ChecklistItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, category, sort_order, is_published,
                   created_by, created_at, updated_at
            FROM checklist_item
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_item).transpose()
    }

    /// List checklist items ordered by sort_order
    pub async fn list_items(&self, published_only: bool) -> PortalResult<Vec<ChecklistItem>> {
        let query = if published_only {
            sqlx::query(
                r#"
                SELECT id, title, description, category, sort_order, is_published,
                       created_by, created_at, updated_at
                FROM checklist_item
                WHERE is_published = 1
                ORDER BY sort_order ASC, id ASC
                "#,
            )
        } else {
            sqlx::query(
                r#"
                SELECT id, title, description, category, sort_order, is_published,
                       created_by, created_at, updated_at
                FROM checklist_item
                ORDER BY sort_order ASC, id ASC
                "#,
            )
        };

        let rows = query.fetch_all(&self.db).await?;

        rows.into_iter().map(Self::parse_item).collect()
    }

    /// Update a checklist item; unset fields keep their current value
    pub async fn update_item(
        &self,
        id: i64,
        update: ChecklistItemUpdate,
    ) -> PortalResult<ChecklistItem> {
        let current = self
            .get_item(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("Checklist item {} not found", id)))?;

        let title = match update.title {
            Some(title) => {
                if title.trim().is_empty() {
                    return Err(PortalError::Validation(
                        "Title cannot be empty".to_string(),
                    ));
                }
                title.trim().to_string()
            }
            None => current.title,
        };
        let description = update.description.unwrap_or(current.description);
        let category = update.category.unwrap_or(current.category);
        let sort_order = update.sort_order.unwrap_or(current.sort_order);
        let is_published = update.is_published.unwrap_or(current.is_published);
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE checklist_item
            SET title = ?,
                description = ?,
                category = ?,
                sort_order = ?,
                is_published = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(&category)
        .bind(sort_order)
        .bind(is_published)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(ChecklistItem {
            id,
            title,
            description,
            category,
            sort_order,
            is_published,
            created_by: current.created_by,
            created_at: current.created_at,
            updated_at: now,
        })
    }

    /// Delete a checklist item
    pub async fn delete_item(&self, id: i64) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM checklist_item WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound(format!(
                "Checklist item {} not found",
                id
            )));
        }

        Ok(())
    }

    fn parse_item(row: sqlx::sqlite::SqliteRow) -> PortalResult<ChecklistItem> {
        let created_at_str: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let updated_at_str: String = row.get("updated_at");
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(ChecklistItem {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            category: row.get("category"),
            sort_order: row.get("sort_order"),
            is_published: row.get("is_published"),
            created_by: row.get("created_by"),
            created_at,
            updated_at,
        })
    }
}
