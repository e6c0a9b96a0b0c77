/// Applicant feedback with admin moderation
use crate::{
    error::{PortalError, PortalResult},
    portal::ReviewStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Feedback record
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub application_id: String,
    pub rating: i32,
    pub category: Option<String>,
    pub comment: Option<String>,
    pub status: ReviewStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Feedback manager
#[derive(Clone)]
pub struct FeedbackManager {
    db: SqlitePool,
}

impl FeedbackManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Submit feedback; rating must be in [1,5]
    pub async fn submit(
        &self,
        application_id: &str,
        rating: i32,
        category: Option<&str>,
        comment: Option<&str>,
    ) -> PortalResult<Feedback> {
        if !(1..=5).contains(&rating) {
            return Err(PortalError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO feedback (application_id, rating, category, comment, status, submitted_at)
            VALUES (?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(application_id)
        .bind(rating)
        .bind(category)
        .bind(comment)
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(Feedback {
            id: result.last_insert_rowid(),
            application_id: application_id.to_string(),
            rating,
            category: category.map(String::from),
            comment: comment.map(String::from),
            status: ReviewStatus::Pending,
            submitted_at: now,
            reviewed_by: None,
            reviewed_at: None,
        })
    }

    /// List feedback for one application, newest first
    pub async fn list_for_application(&self, application_id: &str) -> PortalResult<Vec<Feedback>> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, rating, category, comment, status,
                   submitted_at, reviewed_by, reviewed_at
            FROM feedback
            WHERE application_id = ?
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::parse_feedback).collect()
    }

    /// List all feedback with an optional status filter
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
        limit: Option<i64>,
    ) -> PortalResult<Vec<Feedback>> {
        let query = if let Some(status) = status {
            sqlx::query(
                r#"
                SELECT id, application_id, rating, category, comment, status,
                       submitted_at, reviewed_by, reviewed_at
                FROM feedback
                WHERE status = ?
                ORDER BY submitted_at DESC
                LIMIT ?
                "#,
            )
            .bind(status.as_str())
            .bind(limit.unwrap_or(100))
        } else {
            sqlx::query(
                r#"
                SELECT id, application_id, rating, category, comment, status,
                       submitted_at, reviewed_by, reviewed_at
                FROM feedback
                ORDER BY submitted_at DESC
                LIMIT ?
                "#,
            )
            .bind(limit.unwrap_or(100))
        };

        let rows = query.fetch_all(&self.db).await?;

        rows.into_iter().map(Self::parse_feedback).collect()
    }

    /// Approve or reject feedback
    pub async fn review(
        &self,
        id: i64,
        status: ReviewStatus,
        reviewed_by: &str,
    ) -> PortalResult<()> {
        if status == ReviewStatus::Pending {
            return Err(PortalError::Validation(
                "Review status must be approved or rejected".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE feedback
            SET status = ?,
                reviewed_by = ?,
                reviewed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound(format!("Feedback {} not found", id)));
        }

        Ok(())
    }

    /// Delete feedback
    pub async fn delete(&self, id: i64) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound(format!("Feedback {} not found", id)));
        }

        Ok(())
    }

    fn parse_feedback(row: sqlx::sqlite::SqliteRow) -> PortalResult<Feedback> {
        let status_str: String = row.get("status");
        let status = ReviewStatus::from_str(&status_str)?;

        let submitted_at_str: String = row.get("submitted_at");
        let submitted_at = DateTime::parse_from_rfc3339(&submitted_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let reviewed_at = row
            .try_get::<String, _>("reviewed_at")
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Feedback {
            id: row.get("id"),
            application_id: row.get("application_id"),
            rating: row.get("rating"),
            category: row.get("category"),
            comment: row.get("comment"),
            status,
            submitted_at,
            reviewed_by: row.get("reviewed_by"),
            reviewed_at,
        })
    }
}
