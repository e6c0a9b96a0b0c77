/// API routes and handlers
pub mod admin_users;
pub mod applications;
pub mod auth;
pub mod checklist;
pub mod feedback;
pub mod messages;
pub mod timeline;

use crate::context::AppContext;
use axum::Router;
use serde::Serialize;

/// Success envelope shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(admin_users::routes())
        .merge(applications::routes())
        .merge(timeline::routes())
        .merge(feedback::routes())
        .merge(checklist::routes())
        .merge(messages::routes())
}
