/// Messaging endpoints between applicants and the admissions office
use crate::{
    api::ApiResponse,
    auth::{AdminAuthContext, ApplicantAuthContext},
    context::AppContext,
    error::{PortalError, PortalResult},
    portal::{messages::Message, Party},
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build message routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/messages", get(own_thread).post(send_message))
        .route(
            "/api/admin/messages/:application_id",
            get(admin_thread).post(admin_send_message),
        )
}

/// Applicant reads their thread; admin messages are marked read
async fn own_thread(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
) -> PortalResult<Json<ApiResponse<Vec<Message>>>> {
    ctx.messages
        .mark_read(&auth.application.id, Party::Applicant)
        .await?;

    let thread = ctx.messages.thread(&auth.application.id).await?;

    Ok(Json(ApiResponse::new(thread)))
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    body: String,
}

/// Applicant sends a message on their own thread
async fn send_message(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
    Json(req): Json<SendMessageRequest>,
) -> PortalResult<Json<ApiResponse<Message>>> {
    let message = ctx
        .messages
        .send(
            &auth.application.id,
            Party::Applicant,
            &auth.application.id,
            &req.body,
        )
        .await?;

    Ok(Json(ApiResponse::new(message)))
}

/// Admin reads an application's thread; applicant messages are marked read
async fn admin_thread(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(application_id): Path<String>,
) -> PortalResult<Json<ApiResponse<Vec<Message>>>> {
    auth.require_permission("messages.read")?;

    if ctx
        .applications
        .get_application(&application_id)
        .await?
        .is_none()
    {
        return Err(PortalError::NotFound(format!(
            "Application {} not found",
            application_id
        )));
    }

    ctx.messages.mark_read(&application_id, Party::Admin).await?;

    let thread = ctx.messages.thread(&application_id).await?;

    Ok(Json(ApiResponse::new(thread)))
}

/// Admin sends a message on an application's thread
async fn admin_send_message(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(application_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> PortalResult<Json<ApiResponse<Message>>> {
    auth.require_permission("messages.send")?;

    if ctx
        .applications
        .get_application(&application_id)
        .await?
        .is_none()
    {
        return Err(PortalError::NotFound(format!(
            "Application {} not found",
            application_id
        )));
    }

    let message = ctx
        .messages
        .send(&application_id, Party::Admin, &auth.admin.id, &req.body)
        .await?;

    Ok(Json(ApiResponse::new(message)))
}
