/// Timeline event request endpoints
///
/// Applicants submit and track change requests on their own application;
/// admins list, moderate, and discuss them via notes.
use crate::{
    api::ApiResponse,
    auth::{AdminAuthContext, ApplicantAuthContext},
    context::AppContext,
    error::{PortalError, PortalResult},
    portal::{
        timeline::{TimelineEventNote, TimelineEventRequest},
        Party, ReviewStatus,
    },
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build timeline routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Applicant side
        .route(
            "/api/timeline-requests",
            get(list_own_requests).post(submit_request),
        )
        .route(
            "/api/timeline-requests/:id/notes",
            get(list_own_notes).post(add_own_note),
        )
        // Admin side
        .route("/api/admin/timeline-requests", get(list_requests))
        .route(
            "/api/admin/timeline-requests/:id",
            axum::routing::put(review_request),
        )
        .route(
            "/api/admin/timeline-requests/:id/notes",
            get(list_notes).post(add_note),
        )
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    title: String,
    description: Option<String>,
    event_date: String,
}

/// Applicant submits a timeline event request
async fn submit_request(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
    Json(req): Json<SubmitRequest>,
) -> PortalResult<Json<ApiResponse<TimelineEventRequest>>> {
    let request = ctx
        .timeline
        .submit_request(
            &auth.application.id,
            &req.title,
            req.description.as_deref(),
            &req.event_date,
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        request,
        "Timeline event request submitted",
    )))
}

/// Applicant lists their own requests
async fn list_own_requests(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
) -> PortalResult<Json<ApiResponse<Vec<TimelineEventRequest>>>> {
    let requests = ctx
        .timeline
        .list_for_application(&auth.application.id)
        .await?;

    Ok(Json(ApiResponse::new(requests)))
}

/// Load a request and check it belongs to the authenticated applicant
async fn own_request(
    ctx: &AppContext,
    auth: &ApplicantAuthContext,
    id: i64,
) -> PortalResult<TimelineEventRequest> {
    let request = ctx
        .timeline
        .get_request(id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("Timeline event request {} not found", id)))?;

    if request.application_id != auth.application.id {
        // Don't reveal other applicants' request ids
        return Err(PortalError::NotFound(format!(
            "Timeline event request {} not found",
            id
        )));
    }

    Ok(request)
}

/// Applicant lists notes on their own request
async fn list_own_notes(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
    Path(id): Path<i64>,
) -> PortalResult<Json<ApiResponse<Vec<TimelineEventNote>>>> {
    own_request(&ctx, &auth, id).await?;

    let notes = ctx.timeline.list_notes(id).await?;

    Ok(Json(ApiResponse::new(notes)))
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    body: String,
}

/// Applicant adds a note to their own request
async fn add_own_note(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
    Path(id): Path<i64>,
    Json(req): Json<NoteRequest>,
) -> PortalResult<Json<ApiResponse<TimelineEventNote>>> {
    own_request(&ctx, &auth, id).await?;

    let note = ctx
        .timeline
        .add_note(id, Party::Applicant, &auth.application.id, &req.body)
        .await?;

    Ok(Json(ApiResponse::new(note)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<i64>,
}

/// Admin lists requests, optionally filtered by status
async fn list_requests(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Query(query): Query<ListQuery>,
) -> PortalResult<Json<ApiResponse<Vec<TimelineEventRequest>>>> {
    auth.require_permission("timeline.read")?;

    let status = query
        .status
        .as_deref()
        .map(ReviewStatus::from_str)
        .transpose()?;

    let requests = ctx.timeline.list_requests(status, query.limit).await?;

    Ok(Json(ApiResponse::new(requests)))
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    status: String,
    note: Option<String>,
}

/// Admin approves or rejects a request
async fn review_request(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> PortalResult<Json<ApiResponse<TimelineEventRequest>>> {
    auth.require_permission("timeline.moderate")?;

    let status = ReviewStatus::from_str(&req.status)?;
    let request = ctx.timeline.review_request(id, status, &auth.admin.id).await?;

    if let Some(note) = req.note.as_deref() {
        ctx.timeline
            .add_note(id, Party::Admin, &auth.admin.id, note)
            .await?;
    }

    if let Err(e) = ctx
        .admin_users
        .log_action(
            &auth.admin.id,
            "timeline.review",
            Some(&id.to_string()),
            Some(status.as_str()),
            None,
        )
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    Ok(Json(ApiResponse::with_message(
        request,
        "Timeline event request reviewed",
    )))
}

/// Admin lists notes on a request
async fn list_notes(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
) -> PortalResult<Json<ApiResponse<Vec<TimelineEventNote>>>> {
    auth.require_permission("timeline.read")?;

    if ctx.timeline.get_request(id).await?.is_none() {
        return Err(PortalError::NotFound(format!(
            "Timeline event request {} not found",
            id
        )));
    }

    let notes = ctx.timeline.list_notes(id).await?;

    Ok(Json(ApiResponse::new(notes)))
}

/// Admin adds a note to a request
async fn add_note(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
    Json(req): Json<NoteRequest>,
) -> PortalResult<Json<ApiResponse<TimelineEventNote>>> {
    auth.require_permission("timeline.moderate")?;

    let note = ctx
        .timeline
        .add_note(id, Party::Admin, &auth.admin.id, &req.body)
        .await?;

    Ok(Json(ApiResponse::new(note)))
}
