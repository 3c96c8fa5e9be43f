use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::role_permissions::model::RolePermission;
use crate::utils::crud::{CrudService, FindOptions, Pagination};
use crate::utils::errors::AppError;

use super::model::{
    CreateRoleDto, Role, RoleFilterParams, RoleWithPermissions, UpdateRoleDto, is_protected_role,
};

#[derive(Clone)]
pub struct RoleService {
    db: PgPool,
}

impl RoleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_filtered(
        &self,
        params: &RoleFilterParams,
    ) -> Result<Pagination<Role>, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();
        let name_filter = params.name.as_ref().map(|n| format!("%{}%", n));

        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles
             WHERE deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(&name_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles
             WHERE deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name_filter)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(Pagination {
            items: roles,
            total,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1 AND deleted_at IS NULL")
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
    }

    /// Role together with all its permission rows, the detail-endpoint and
    /// token-issuance shape.
    #[instrument(skip(self))]
    pub async fn find_with_permissions(&self, id: Uuid) -> Result<RoleWithPermissions, AppError> {
        let role = self.find_one_by_id(id).await?;
        let role_permissions = sqlx::query_as::<_, RolePermission>(
            "SELECT * FROM role_permissions WHERE role_id = $1 AND deleted_at IS NULL
             ORDER BY permission",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(RoleWithPermissions {
            role,
            role_permissions,
        })
    }
}

impl CrudService for RoleService {
    type Entity = Role;
    type Create = CreateRoleDto;
    type Update = UpdateRoleDto;

    fn db(&self) -> &PgPool {
        &self.db
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL")
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
    }

    async fn find_all(&self, opts: &FindOptions) -> Result<Pagination<Role>, AppError> {
        let deleted_clause = if opts.include_deleted {
            ""
        } else {
            "WHERE deleted_at IS NULL"
        };
        let query = format!(
            "SELECT * FROM roles {} ORDER BY created_at {} LIMIT $1 OFFSET $2",
            deleted_clause,
            opts.created_order.as_sql()
        );
        let count_query = format!("SELECT COUNT(*) FROM roles {}", deleted_clause);

        let items = sqlx::query_as::<_, Role>(&query)
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

    async fn find_one_by_id(&self, id: Uuid) -> Result<Role, AppError> {
        self.try_find_one_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))
    }

    async fn try_find_one_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
    }

    async fn create(&self, input: CreateRoleDto) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, is_system) VALUES ($1, false) RETURNING *",
        )
        .bind(&input.name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "A role with this name already exists"
                    ));
                }
            }
            AppError::database(e)
        })
    }

    async fn update(&self, id: Uuid, patch: UpdateRoleDto) -> Result<Role, AppError> {
        let role = self.find_one_by_id(id).await?;

        let Some(name) = patch.name else {
            return Ok(role);
        };

        if is_protected_role(&role.name, role.is_system) {
            return Err(AppError::not_acceptable("System default roles cannot be renamed"));
        }

        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "A role with this name already exists"
                    ));
                }
            }
            AppError::database(e)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let role = self.find_one_by_id(id).await?;

        if is_protected_role(&role.name, role.is_system) {
            return Err(AppError::not_acceptable("System default roles cannot be deleted"));
        }

        let result = sqlx::query(
            "UPDATE roles SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }
}
