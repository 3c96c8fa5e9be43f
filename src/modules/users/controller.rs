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
    ChangePasswordDto, CreateUserDto, UpdateProfileDto, User, UserFilterParams, UserWithRole,
};
use super::service::UserService;

pub async fn get_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<UserFilterParams>,
) -> Result<Json<PaginatedResponse<User>>, AppError> {
    let actor = ctx.require_user()?;
    ensure_any_permission(&state, actor, &[Permission::UsersView]).await?;

    let service = UserService::new(state.db.clone());
    let page = service.find_filtered(&params).await?;
    let meta = params.pagination.meta(page.total, page.items.len());
    Ok(Json(PaginatedResponse {
        data: page.items,
        meta,
    }))
}

pub async fn get_me(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<UserWithRole>, AppError> {
    let user = ctx.require_user()?;
    let service = UserService::new(state.db.clone());
    let me = service.find_with_role(user.id).await?;
    Ok(Json(me))
}

pub async fn get_user_by_id(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithRole>, AppError> {
    let actor = ctx.require_user()?;
    // Looking yourself up never needs the listing permission.
    if actor.id != id {
        ensure_any_permission(&state, actor, &[Permission::UsersView]).await?;
    }

    let service = UserService::new(state.db.clone());
    let user = service.find_with_role(id).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let actor = ctx.require_user()?;
    ensure_any_permission(&state, actor, &[Permission::UsersEdit]).await?;

    let service = UserService::new(state.db.clone());
    let user = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<User>, AppError> {
    let actor = ctx.require_user()?;

    let can_admin_edit = ctx.has_permission(Permission::AdminEdit.as_str());
    if actor.id == id
        && !can_admin_edit
        && !ctx.has_permission(Permission::ProfileEdit.as_str())
    {
        return Err(AppError::forbidden("Profile editing is not permitted"));
    }

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(
            actor.id,
            id,
            dto,
            can_admin_edit,
            ctx.has_permission(Permission::ChangeRolesPermissions.as_str()),
        )
        .await?;
    Ok(Json(user))
}

/// Password change is strictly self-service; administrators reset other
/// accounts through the password-reset flow instead.
pub async fn change_password(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<StatusCode, AppError> {
    let user = ctx.require_user()?;
    if user.id != id {
        return Err(AppError::forbidden("You can only change your own password"));
    }

    let service = UserService::new(state.db.clone());
    service
        .change_password(user.id, &dto.password, state.app_config.bcrypt_cost)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Account deletion. Deleting your own account needs the delete-account
/// permission; deleting someone else's needs the admin flag.
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let actor = ctx.require_user()?;

    if actor.id == id {
        if !ctx.has_permission(Permission::AccessDeleteAccount.as_str()) {
            return Err(AppError::forbidden("Account deletion is not permitted"));
        }
    } else if !ctx.has_permission(Permission::AdminEdit.as_str()) {
        return Err(AppError::forbidden("You can only delete your own account"));
    }

    let service = UserService::new(state.db.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
