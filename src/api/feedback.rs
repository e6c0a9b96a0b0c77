/// Feedback endpoints: applicant submission, admin moderation
use crate::{
    api::ApiResponse,
    auth::{AdminAuthContext, ApplicantAuthContext},
    context::AppContext,
    error::PortalResult,
    portal::{feedback::Feedback, ReviewStatus},
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build feedback routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/feedback", get(list_own_feedback).post(submit_feedback))
        .route("/api/admin/feedback", get(list_feedback))
        .route(
            "/api/admin/feedback/:id",
            axum::routing::put(review_feedback).delete(delete_feedback),
        )
}

#[derive(Debug, Deserialize)]
struct SubmitFeedbackRequest {
    rating: i32,
    category: Option<String>,
    comment: Option<String>,
}

/// Applicant submits feedback; rating must be in [1,5]
async fn submit_feedback(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
    Json(req): Json<SubmitFeedbackRequest>,
) -> PortalResult<Json<ApiResponse<Feedback>>> {
    let feedback = ctx
        .feedback
        .submit(
            &auth.application.id,
            req.rating,
            req.category.as_deref(),
            req.comment.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        feedback,
        "Feedback submitted",
    )))
}

/// Applicant lists their own feedback
async fn list_own_feedback(
    State(ctx): State<AppContext>,
    auth: ApplicantAuthContext,
) -> PortalResult<Json<ApiResponse<Vec<Feedback>>>> {
    let feedback = ctx
        .feedback
        .list_for_application(&auth.application.id)
        .await?;

    Ok(Json(ApiResponse::new(feedback)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<i64>,
}

/// Admin lists feedback, optionally filtered by status
async fn list_feedback(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Query(query): Query<ListQuery>,
) -> PortalResult<Json<ApiResponse<Vec<Feedback>>>> {
    auth.require_permission("feedback.read")?;

    let status = query
        .status
        .as_deref()
        .map(ReviewStatus::from_str)
        .transpose()?;

    let feedback = ctx.feedback.list(status, query.limit).await?;

    Ok(Json(ApiResponse::new(feedback)))
}

#[derive(Debug, Deserialize)]
struct ReviewFeedbackRequest {
    status: String,
}

/// Admin approves or rejects feedback
async fn review_feedback(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
    Json(req): Json<ReviewFeedbackRequest>,
) -> PortalResult<Json<ApiResponse<serde_json::Value>>> {
    auth.require_permission("feedback.moderate")?;

    let status = ReviewStatus::from_str(&req.status)?;
    ctx.feedback.review(id, status, &auth.admin.id).await?;

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Feedback reviewed",
    )))
}

/// Admin deletes feedback; missing id is 404
async fn delete_feedback(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
) -> PortalResult<Json<ApiResponse<serde_json::Value>>> {
    auth.require_permission("feedback.moderate")?;

    ctx.feedback.delete(id).await?;

    if let Err(e) = ctx
        .admin_users
        .log_action(
            &auth.admin.id,
            "feedback.delete",
            Some(&id.to_string()),
            None,
            None,
        )
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Feedback deleted",
    )))
}
