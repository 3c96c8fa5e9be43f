use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::middleware::permission::ensure_any_permission;
use crate::modules::role_permissions::model::Permission;
use crate::state::AppState;
use crate::utils::crud::CrudService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginatedResponse;
use crate::validator::ValidatedJson;

use super::model::{
    CreateRolePermissionDto, RolePermission, RolePermissionFilterParams, UpdateRolePermissionDto,
};
use super::service::RolePermissionService;

const MANAGE: &[Permission] = &[Permission::ChangeRolesPermissions];

/// Listing is open to any authenticated user, but callers without the
/// management permission only see their own role's rows.
pub async fn get_role_permissions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<RolePermissionFilterParams>,
) -> Result<Json<PaginatedResponse<RolePermission>>, AppError> {
    let actor = ctx.require_user()?;
    let Some(role_id) = actor.role_id else {
        return Err(AppError::forbidden("No role assigned"));
    };

    let service = RolePermissionService::new(state.db.clone());
    let scope = if service.role_has_any(role_id, MANAGE).await? {
        None
    } else {
        Some(role_id)
    };

    let page = service.find_filtered(&params, scope).await?;
    let meta = params.pagination.meta(page.total, page.items.len());
    Ok(Json(PaginatedResponse {
        data: page.items,
        meta,
    }))
}

pub async fn get_role_permission_by_id(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RolePermission>, AppError> {
    let actor = ctx.require_user()?;

    let service = RolePermissionService::new(state.db.clone());
    let row = service.find_one_by_id(id).await?;

    // Rows outside your own role require the management permission.
    if actor.role_id != Some(row.role_id) {
        ensure_any_permission(&state, actor, MANAGE).await?;
    }

    Ok(Json(row))
}

pub async fn create_role_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(dto): ValidatedJson<CreateRolePermissionDto>,
) -> Result<(StatusCode, Json<RolePermission>), AppError> {
    let actor = ctx.require_user()?;
    ensure_any_permission(&state, actor, MANAGE).await?;

    let service = RolePermissionService::new(state.db.clone());
    let row = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_role_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRolePermissionDto>,
) -> Result<Json<RolePermission>, AppError> {
    let actor = ctx.require_user()?;
    ensure_any_permission(&state, actor, MANAGE).await?;

    let service = RolePermissionService::new(state.db.clone());
    let row = service.update(id, dto).await?;
    Ok(Json(row))
}

pub async fn delete_role_permission(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let actor = ctx.require_user()?;
    ensure_any_permission(&state, actor, MANAGE).await?;

    let service = RolePermissionService::new(state.db.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The catalog of known permission identifiers.
pub async fn list_permission_catalog() -> Json<Vec<&'static str>> {
    Json(Permission::ALL.iter().map(Permission::as_str).collect())
}
