/// Checklist endpoints: public applicant view, admin management
use crate::{
    api::ApiResponse,
    auth::AdminAuthContext,
    context::AppContext,
    error::PortalResult,
    portal::checklist::{ChecklistItem, ChecklistItemUpdate},
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build checklist routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Published guidance is public
        .route("/api/checklist", get(list_published))
        .route(
            "/api/admin/checklist",
            get(list_all).post(create_item),
        )
        .route(
            "/api/admin/checklist/:id",
            axum::routing::put(update_item).delete(delete_item),
        )
}

/// Published checklist items, applicant-visible
async fn list_published(
    State(ctx): State<AppContext>,
) -> PortalResult<Json<ApiResponse<Vec<ChecklistItem>>>> {
    let items = ctx.checklist.list_items(true).await?;

    Ok(Json(ApiResponse::new(items)))
}

/// All checklist items, including unpublished
async fn list_all(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<ApiResponse<Vec<ChecklistItem>>>> {
    auth.require_permission("checklist.read")?;

    let items = ctx.checklist.list_items(false).await?;

    Ok(Json(ApiResponse::new(items)))
}

#[derive(Debug, Deserialize)]
struct CreateItemRequest {
    title: String,
    description: Option<String>,
    category: Option<String>,
    #[serde(default)]
    sort_order: i64,
}

/// Create a checklist item
async fn create_item(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Json(req): Json<CreateItemRequest>,
) -> PortalResult<Json<ApiResponse<ChecklistItem>>> {
    auth.require_permission("checklist.manage")?;

    let item = ctx
        .checklist
        .create_item(
            &req.title,
            req.description.as_deref(),
            req.category.as_deref(),
            req.sort_order,
            &auth.admin.id,
        )
        .await?;

    Ok(Json(ApiResponse::with_message(item, "Checklist item created")))
}

/// Update a checklist item
async fn update_item(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
    Json(update): Json<ChecklistItemUpdate>,
) -> PortalResult<Json<ApiResponse<ChecklistItem>>> {
    auth.require_permission("checklist.manage")?;

    let item = ctx.checklist.update_item(id, update).await?;

    Ok(Json(ApiResponse::with_message(item, "Checklist item updated")))
}

/// Delete a checklist item; missing id is 404
async fn delete_item(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<i64>,
) -> PortalResult<Json<ApiResponse<serde_json::Value>>> {
    auth.require_permission("checklist.manage")?;

    ctx.checklist.delete_item(id).await?;

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Checklist item deleted",
    )))
}
