/// Timeline event requests and notes
///
/// Applicants submit change requests for their application timeline; admins
/// approve or reject them. Notes form a moderation discussion thread on a
/// request.
use crate::{
    error::{PortalError, PortalResult},
    portal::{Party, ReviewStatus},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Timeline event request record
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEventRequest {
    pub id: i64,
    pub application_id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub status: ReviewStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Note attached to a timeline event request
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEventNote {
    pub id: i64,
    pub request_id: i64,
    pub author_kind: Party,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Timeline manager
#[derive(Clone)]
pub struct TimelineManager {
    db: SqlitePool,
}

impl TimelineManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Submit a new timeline event request; status starts pending
    pub async fn submit_request(
        &self,
        application_id: &str,
        title: &str,
        description: Option<&str>,
        event_date: &str,
    ) -> PortalResult<TimelineEventRequest> {
        if title.trim().is_empty() {
            return Err(PortalError::Validation("Title is required".to_string()));
        }
        if event_date.trim().is_empty() {
            return Err(PortalError::Validation(
                "Event date is required".to_string(),
            ));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO timeline_event_request (application_id, title, description, event_date, status, submitted_at)
            VALUES (?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(application_id)
        .bind(title.trim())
        .bind(description)
        .bind(event_date.trim())
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(TimelineEventRequest {
            id: result.last_insert_rowid(),
            application_id: application_id.to_string(),
            title: title.trim().to_string(),
            description: description.map(String::from),
            event_date: event_date.trim().to_string(),
            status: ReviewStatus::Pending,
            submitted_at: now,
            reviewed_by: None,
            reviewed_at: None,
        })
    }

    /// Get a request by id
    pub async fn get_request(&self, id: i64) -> PortalResult<Option<TimelineEventRequest>> {
        let row = sqlx::query(
            r#"
            SELECT id, application_id, title, description, event_date, status,
                   submitted_at, reviewed_by, reviewed_at
            FROM timeline_event_request
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Self::parse_request).transpose()
    }

    /// List requests for one application, newest first
    pub async fn list_for_application(
        &self,
        application_id: &str,
    ) -> PortalResult<Vec<TimelineEventRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, title, description, event_date, status,
                   submitted_at, reviewed_by, reviewed_at
            FROM timeline_event_request
            WHERE application_id = ?
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::parse_request).collect()
    }

    /// List requests with an optional status filter
    pub async fn list_requests(
        &self,
        status: Option<ReviewStatus>,
        limit: Option<i64>,
    ) -> PortalResult<Vec<TimelineEventRequest>> {
        let query = if let Some(status) = status {
            sqlx::query(
                r#"
                SELECT id, application_id, title, description, event_date, status,
                       submitted_at, reviewed_by, reviewed_at
                FROM timeline_event_request
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
                SELECT id, application_id, title, description, event_date, status,
                       submitted_at, reviewed_by, reviewed_at
                FROM timeline_event_request
                ORDER BY submitted_at DESC
                LIMIT ?
                "#,
            )
            .bind(limit.unwrap_or(100))
        };

        let rows = query.fetch_all(&self.db).await?;

        rows.into_iter().map(Self::parse_request).collect()
    }

    /// Approve or reject a request, stamping the reviewer
    pub async fn review_request(
        &self,
        id: i64,
        status: ReviewStatus,
        reviewed_by: &str,
    ) -> PortalResult<TimelineEventRequest> {
        if status == ReviewStatus::Pending {
            return Err(PortalError::Validation(
                "Review status must be approved or rejected".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE timeline_event_request
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
            return Err(PortalError::NotFound(format!(
                "Timeline event request {} not found",
                id
            )));
        }

        self.get_request(id).await?.ok_or_else(|| {
            PortalError::NotFound(format!("Timeline event request {} not found", id))
        })
    }

    /// Add a note to a request
    pub async fn add_note(
        &self,
        request_id: i64,
        author_kind: Party,
        author_id: &str,
        body: &str,
    ) -> PortalResult<TimelineEventNote> {
        if body.trim().is_empty() {
            return Err(PortalError::Validation("Note body is required".to_string()));
        }

        // Manual existence check; the schema carries no foreign keys here
        if self.get_request(request_id).await?.is_none() {
            return Err(PortalError::NotFound(format!(
                "Timeline event request {} not found",
                request_id
            )));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO timeline_event_note (request_id, author_kind, author_id, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request_id)
        .bind(author_kind.as_str())
        .bind(author_id)
        .bind(body.trim())
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(TimelineEventNote {
            id: result.last_insert_rowid(),
            request_id,
            author_kind,
            author_id: author_id.to_string(),
            body: body.trim().to_string(),
            created_at: now,
        })
    }

    /// List notes on a request, oldest first
    pub async fn list_notes(&self, request_id: i64) -> PortalResult<Vec<TimelineEventNote>> {
        let rows = sqlx::query(
            r#"
            SELECT id, request_id, author_kind, author_id, body, created_at
            FROM timeline_event_note
            WHERE request_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.db)
        .await?;

        let mut notes = Vec::new();
        for row in rows {
            let author_kind_str: String = row.get("author_kind");
            let created_at_str: String = row.get("created_at");
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);

            notes.push(TimelineEventNote {
                id: row.get("id"),
                request_id: row.get("request_id"),
                author_kind: Party::from_str(&author_kind_str)?,
                author_id: row.get("author_id"),
                body: row.get("body"),
                created_at,
            });
        }

        Ok(notes)
    }

    fn parse_request(row: sqlx::sqlite::SqliteRow) -> PortalResult<TimelineEventRequest> {
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

        Ok(TimelineEventRequest {
            id: row.get("id"),
            application_id: row.get("application_id"),
            title: row.get("title"),
            description: row.get("description"),
            event_date: row.get("event_date"),
            status,
            submitted_at,
            reviewed_by: row.get("reviewed_by"),
            reviewed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_submit_and_review_request() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let request = manager
            .submit_request("app-1", "Sent transcript", None, "2026-08-01")
            .await
            .unwrap();
        assert_eq!(request.status, ReviewStatus::Pending);

        let reviewed = manager
            .review_request(request.id, ReviewStatus::Approved, "admin-1")
            .await
            .unwrap();
        assert_eq!(reviewed.status, ReviewStatus::Approved);
        assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
        assert!(reviewed.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn test_review_with_pending_status_is_rejected() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let request = manager
            .submit_request("app-1", "Sent transcript", None, "2026-08-01")
            .await
            .unwrap();

        let err = manager
            .review_request(request.id, ReviewStatus::Pending, "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
    }

    #[tokio::test]
    async fn test_review_missing_request_is_not_found() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let err = manager
            .review_request(999, ReviewStatus::Approved, "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_filter() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let first = manager
            .submit_request("app-1", "First", None, "2026-08-01")
            .await
            .unwrap();
        manager
            .submit_request("app-1", "Second", None, "2026-08-02")
            .await
            .unwrap();
        manager
            .review_request(first.id, ReviewStatus::Rejected, "admin-1")
            .await
            .unwrap();

        let pending = manager
            .list_requests(Some(ReviewStatus::Pending), None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Second");
    }

    #[tokio::test]
    async fn test_notes_thread() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let request = manager
            .submit_request("app-1", "Sent transcript", None, "2026-08-01")
            .await
            .unwrap();

        manager
            .add_note(request.id, Party::Applicant, "app-1", "Uploaded today")
            .await
            .unwrap();
        manager
            .add_note(request.id, Party::Admin, "admin-1", "Received, checking")
            .await
            .unwrap();

        let notes = manager.list_notes(request.id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].author_kind, Party::Applicant);
        assert_eq!(notes[1].author_kind, Party::Admin);
    }

    #[tokio::test]
    async fn test_note_on_missing_request_is_not_found() {
        let pool = db::test_pool().await;
        let manager = TimelineManager::new(pool);

        let err = manager
            .add_note(42, Party::Admin, "admin-1", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }
}
