use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::crud::{CrudService, FindOptions, Pagination};
use crate::utils::errors::AppError;

use super::model::{
    CreateRolePermissionDto, Permission, RolePermission, RolePermissionFilterParams,
    UpdateRolePermissionDto, any_enabled_match, is_locked_permission_set,
};

#[derive(Clone)]
pub struct RolePermissionService {
    db: PgPool,
}

impl RolePermissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Lists permission rows, optionally filtered by role. When `scope` is
    /// set the filter is forced to that role regardless of what the query
    /// asked for; callers without management rights only ever see their own.
    #[instrument(skip(self))]
    pub async fn find_filtered(
        &self,
        params: &RolePermissionFilterParams,
        scope: Option<Uuid>,
    ) -> Result<Pagination<RolePermission>, AppError> {
        let role_id = scope.or(params.role_id);

        let items = sqlx::query_as::<_, RolePermission>(
            "SELECT * FROM role_permissions
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR role_id = $1)
             ORDER BY permission
             LIMIT $2 OFFSET $3",
        )
        .bind(role_id)
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM role_permissions
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR role_id = $1)",
        )
        .bind(role_id)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(Pagination { items, total })
    }

    #[instrument(skip(self))]
    pub async fn find_for_role(&self, role_id: Uuid) -> Result<Vec<RolePermission>, AppError> {
        sqlx::query_as::<_, RolePermission>(
            "SELECT * FROM role_permissions WHERE role_id = $1 AND deleted_at IS NULL
             ORDER BY permission",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)
    }

    /// Service-level authorization check: does the role hold any of
    /// `required` enabled? This is the OR policy route guards are built on.
    #[instrument(skip(self))]
    pub async fn role_has_any(
        &self,
        role_id: Uuid,
        required: &[Permission],
    ) -> Result<bool, AppError> {
        let rows = self.find_for_role(role_id).await?;
        Ok(any_enabled_match(&rows, required))
    }

    async fn assert_role_is_mutable(&self, role_id: Uuid) -> Result<(), AppError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

        assert_permission_set_mutable(&name)
    }
}

/// The ADMIN permission set is fixed; any mutation against it is refused.
fn assert_permission_set_mutable(role_name: &str) -> Result<(), AppError> {
    if is_locked_permission_set(role_name) {
        return Err(AppError::not_acceptable(
            "ADMIN role permissions cannot be modified",
        ));
    }
    Ok(())
}

impl CrudService for RolePermissionService {
    type Entity = RolePermission;
    type Create = CreateRolePermissionDto;
    type Update = UpdateRolePermissionDto;

    fn db(&self) -> &PgPool {
        &self.db
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM role_permissions WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn find_all(&self, opts: &FindOptions) -> Result<Pagination<RolePermission>, AppError> {
        let deleted_clause = if opts.include_deleted {
            ""
        } else {
            "WHERE deleted_at IS NULL"
        };
        let query = format!(
            "SELECT * FROM role_permissions {} ORDER BY created_at {} LIMIT $1 OFFSET $2",
            deleted_clause,
            opts.created_order.as_sql()
        );
        let count_query = format!("SELECT COUNT(*) FROM role_permissions {}", deleted_clause);

        let items = sqlx::query_as::<_, RolePermission>(&query)
            .bind(opts.pagination.limit())
            .bind(opts.pagination.offset())
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)?;

        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)?;

        Ok(Pagination { items, total })
    }

    async fn find_one_by_id(&self, id: Uuid) -> Result<RolePermission, AppError> {
        self.try_find_one_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Role permission not found")))
    }

    async fn try_find_one_by_id(&self, id: Uuid) -> Result<Option<RolePermission>, AppError> {
        sqlx::query_as::<_, RolePermission>(
            "SELECT * FROM role_permissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn create(&self, input: CreateRolePermissionDto) -> Result<RolePermission, AppError> {
        self.assert_role_is_mutable(input.role_id).await?;

        sqlx::query_as::<_, RolePermission>(
            "INSERT INTO role_permissions (role_id, permission, enabled, description)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(input.role_id)
        .bind(input.permission.as_str())
        .bind(input.enabled)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "This role already has that permission"
                    ));
                }
            }
            AppError::database(e)
        })
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UpdateRolePermissionDto,
    ) -> Result<RolePermission, AppError> {
        let existing = self.find_one_by_id(id).await?;
        self.assert_role_is_mutable(existing.role_id).await?;

        sqlx::query_as::<_, RolePermission>(
            "UPDATE role_permissions
             SET enabled = COALESCE($2, enabled),
                 description = COALESCE($3, description),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(patch.enabled)
        .bind(&patch.description)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let existing = self.find_one_by_id(id).await?;
        self.assert_role_is_mutable(existing.role_id).await?;

        let result = sqlx::query(
            "UPDATE role_permissions SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }
}
