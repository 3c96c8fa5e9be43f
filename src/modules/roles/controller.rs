use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::crud::CrudService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginatedResponse;
use crate::validator::ValidatedJson;

use super::model::{CreateRoleDto, Role, RoleFilterParams, RoleWithPermissions, UpdateRoleDto};
use super::service::RoleService;

pub async fn get_roles(
    State(state): State<AppState>,
    Query(params): Query<RoleFilterParams>,
) -> Result<Json<PaginatedResponse<Role>>, AppError> {
    let service = RoleService::new(state.db.clone());
    let page = service.find_filtered(&params).await?;
    let meta = params.pagination.meta(page.total, page.items.len());
    Ok(Json(PaginatedResponse {
        data: page.items,
        meta,
    }))
}

pub async fn get_role_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    let service = RoleService::new(state.db.clone());
    let role = service.find_with_permissions(id).await?;
    Ok(Json(role))
}

pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateRoleDto>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let service = RoleService::new(state.db.clone());
    let role = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<Json<Role>, AppError> {
    let service = RoleService::new(state.db.clone());
    let role = service.update(id, dto).await?;
    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = RoleService::new(state.db.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
