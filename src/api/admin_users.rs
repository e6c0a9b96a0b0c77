/// Admin user management endpoints
///
/// Permission-gated CRUD with a self-service exception: an admin may read
/// and update their own record without admins.read/admins.update, but role,
/// is_active, and permission-override changes on their own record still
/// require admins.update, and self-delete requires admins.delete.
use crate::{
    admin::users::{AdminUser, AdminUserUpdate, NewAdminUser},
    api::ApiResponse,
    auth::AdminAuthContext,
    context::AppContext,
    error::{PortalError, PortalResult},
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

/// Build admin user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/users", get(list_admins).post(create_admin))
        .route(
            "/api/admin/users/:id",
            get(get_admin).put(update_admin).delete(delete_admin),
        )
}

/// List all admin users
async fn list_admins(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<ApiResponse<Vec<AdminUser>>>> {
    auth.require_permission("admins.read")?;

    let admins = ctx.admin_users.list_admins().await?;

    Ok(Json(ApiResponse::new(admins)))
}

/// Create an admin user
async fn create_admin(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Json(req): Json<NewAdminUser>,
) -> PortalResult<Json<ApiResponse<AdminUser>>> {
    auth.require_permission("admins.create")?;

    let created = ctx.admin_users.create_admin(req).await?;

    if let Err(e) = ctx
        .admin_users
        .log_action(&auth.admin.id, "admins.create", Some(&created.id), None, None)
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    Ok(Json(ApiResponse::with_message(
        created,
        "Admin user created",
    )))
}

/// Get an admin user by id
async fn get_admin(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> PortalResult<Json<ApiResponse<AdminUser>>> {
    auth.require_permission_or_self("admins.read", &id)?;

    let admin = ctx
        .admin_users
        .get_admin(&id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("Admin user {} not found", id)))?;

    Ok(Json(ApiResponse::new(admin)))
}

/// Update an admin user
async fn update_admin(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    Json(update): Json<AdminUserUpdate>,
) -> PortalResult<Json<ApiResponse<AdminUser>>> {
    auth.require_permission_or_self("admins.update", &id)?;

    // The self-service exception does not extend to privilege changes
    let is_self = auth.admin.id == id;
    let touches_privileges = update.role.is_some()
        || update.is_active.is_some()
        || update.permission_overrides.is_some();
    if is_self && touches_privileges {
        auth.require_permission("admins.update")?;
    }

    let updated = ctx.admin_users.update_admin(&id, update).await?;

    if let Err(e) = ctx
        .admin_users
        .log_action(&auth.admin.id, "admins.update", Some(&id), None, None)
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    Ok(Json(ApiResponse::with_message(
        updated,
        "Admin user updated",
    )))
}

/// Delete an admin user
async fn delete_admin(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> PortalResult<Json<ApiResponse<serde_json::Value>>> {
    // No self-service exception for delete
    auth.require_permission("admins.delete")?;

    ctx.admin_users.delete_admin(&id).await?;

    if let Err(e) = ctx
        .admin_users
        .log_action(&auth.admin.id, "admins.delete", Some(&id), None, None)
        .await
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Admin user deleted",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{PermissionSet, Role};
    use axum::extract::Path;

    async fn staff_admin(ctx: &AppContext, email: &str) -> AdminUser {
        ctx.admin_users
            .create_admin(NewAdminUser {
                email: email.to_string(),
                name: "Staff Member".to_string(),
                role: Role::Staff,
                department: None,
                password: "staff-pass".to_string(),
                permission_overrides: None,
            })
            .await
            .unwrap()
    }

    fn auth_for(admin: &AdminUser) -> crate::auth::AdminAuthContext {
        crate::auth::AdminAuthContext {
            admin: admin.clone(),
            token: "token".to_string(),
            permissions: PermissionSet::resolve(admin.role, &admin.permission_overrides),
        }
    }

    #[tokio::test]
    async fn test_self_update_allowed_without_permission() {
        let ctx = AppContext::test().await;
        let staff = staff_admin(&ctx, "staff@example.com").await;

        // A staff admin has no admins.update, but may rename themselves
        let response = update_admin(
            State(ctx.clone()),
            auth_for(&staff),
            Path(staff.id.clone()),
            Json(AdminUserUpdate {
                name: Some("Renamed".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.data.name, "Renamed");
    }

    #[tokio::test]
    async fn test_self_role_change_requires_permission() {
        let ctx = AppContext::test().await;
        let staff = staff_admin(&ctx, "staff@example.com").await;

        // Privilege escalation on your own record is still gated
        let err = update_admin(
            State(ctx.clone()),
            auth_for(&staff),
            Path(staff.id.clone()),
            Json(AdminUserUpdate {
                role: Some(Role::SuperAdmin),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PortalError::Authorization(_)));

        let unchanged = ctx.admin_users.get_admin(&staff.id).await.unwrap().unwrap();
        assert_eq!(unchanged.role, Role::Staff);
    }

    #[tokio::test]
    async fn test_updating_other_admin_requires_permission() {
        let ctx = AppContext::test().await;
        let staff = staff_admin(&ctx, "staff@example.com").await;
        let other = staff_admin(&ctx, "other@example.com").await;

        let err = update_admin(
            State(ctx.clone()),
            auth_for(&staff),
            Path(other.id.clone()),
            Json(AdminUserUpdate {
                name: Some("Hijacked".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PortalError::Authorization(_)));
    }
}
