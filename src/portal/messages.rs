/// Messaging between an applicant and the admissions office
use crate::{
    error::{PortalError, PortalResult},
    portal::Party,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Message record
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    pub application_id: String,
    pub sender_kind: Party,
    pub sender_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Message manager
#[derive(Clone)]
pub struct MessageManager {
    db: SqlitePool,
}

impl MessageManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Send a message on an application's thread
    pub async fn send(
        &self,
        application_id: &str,
        sender_kind: Party,
        sender_id: &str,
        body: &str,
    ) -> PortalResult<Message> {
        if body.trim().is_empty() {
            return Err(PortalError::Validation(
                "Message body is required".to_string(),
            ));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO message (application_id, sender_kind, sender_id, body, sent_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(application_id)
        .bind(sender_kind.as_str())
        .bind(sender_id)
        .bind(body.trim())
        .bind(now.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            application_id: application_id.to_string(),
            sender_kind,
            sender_id: sender_id.to_string(),
            body: body.trim().to_string(),
            sent_at: now,
            read_at: None,
        })
    }

    /// Full message thread for an application, oldest first
    pub async fn thread(&self, application_id: &str) -> PortalResult<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, sender_kind, sender_id, body, sent_at, read_at
            FROM message
            WHERE application_id = ?
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::parse_message).collect()
    }

    /// Mark unread messages from the other party as read
    pub async fn mark_read(&self, application_id: &str, reader: Party) -> PortalResult<()> {
        let sender = match reader {
            Party::Admin => Party::Applicant,
            Party::Applicant => Party::Admin,
        };

        sqlx::query(
            r#"
            UPDATE message
            SET read_at = ?
            WHERE application_id = ? AND sender_kind = ? AND read_at IS NULL
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(application_id)
        .bind(sender.as_str())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    fn parse_message(row: sqlx::sqlite::SqliteRow) -> PortalResult<Message> {
        let sender_kind_str: String = row.get("sender_kind");

        let sent_at_str: String = row.get("sent_at");
        let sent_at = DateTime::parse_from_rfc3339(&sent_at_str)
            .map_err(|e| PortalError::Internal(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let read_at = row
            .try_get::<String, _>("read_at")
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Message {
            id: row.get("id"),
            application_id: row.get("application_id"),
            sender_kind: Party::from_str(&sender_kind_str)?,
            sender_id: row.get("sender_id"),
            body: row.get("body"),
            sent_at,
            read_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_thread_ordering() {
        let pool = db::test_pool().await;
        let manager = MessageManager::new(pool);

        manager
            .send("app-1", Party::Applicant, "app-1", "When is the deadline?")
            .await
            .unwrap();
        manager
            .send("app-1", Party::Admin, "admin-1", "March 1st")
            .await
            .unwrap();
        manager
            .send("app-2", Party::Applicant, "app-2", "Unrelated thread")
            .await
            .unwrap();

        let thread = manager.thread("app-1").await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].sender_kind, Party::Applicant);
        assert_eq!(thread[1].sender_kind, Party::Admin);
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_other_party() {
        let pool = db::test_pool().await;
        let manager = MessageManager::new(pool);

        manager
            .send("app-1", Party::Applicant, "app-1", "Hello")
            .await
            .unwrap();
        manager
            .send("app-1", Party::Admin, "admin-1", "Hi there")
            .await
            .unwrap();

        // Applicant reads the thread: only the admin message flips
        manager.mark_read("app-1", Party::Applicant).await.unwrap();

        let thread = manager.thread("app-1").await.unwrap();
        let applicant_msg = &thread[0];
        let admin_msg = &thread[1];

        assert!(applicant_msg.read_at.is_none());
        assert!(admin_msg.read_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let pool = db::test_pool().await;
        let manager = MessageManager::new(pool);

        let err = manager
            .send("app-1", Party::Applicant, "app-1", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
    }
}
