use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::roles::model::Role;
use crate::utils::crud::{CrudService, FindOptions, Pagination};
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;

use super::model::{CreateUserDto, UpdateProfileDto, User, UserFilterParams, UserWithRole};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Latest matching account wins when an email was re-registered after a
    /// soft delete. Archived and deactivated accounts never match.
    #[instrument(skip(self))]
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE email = $1 AND deleted_at IS NULL AND is_active = true AND is_archived = false
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(self))]
    pub async fn find_with_role(&self, id: Uuid) -> Result<UserWithRole, AppError> {
        let user = self.find_one_by_id(id).await?;
        let role = match user.role_id {
            Some(role_id) => {
                sqlx::query_as::<_, Role>(
                    "SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(role_id)
                .fetch_optional(&self.db)
                .await
                .map_err(AppError::database)?
            }
            None => None,
        };
        Ok(UserWithRole { user, role })
    }

    #[instrument(skip(self))]
    pub async fn find_filtered(
        &self,
        params: &UserFilterParams,
    ) -> Result<Pagination<User>, AppError> {
        let email_filter = params.email.as_ref().map(|e| format!("%{}%", e));

        let items = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR email ILIKE $1)
               AND ($2::uuid IS NULL OR role_id = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(&email_filter)
        .bind(params.role_id)
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR email ILIKE $1)
               AND ($2::uuid IS NULL OR role_id = $2)",
        )
        .bind(&email_filter)
        .bind(params.role_id)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(Pagination { items, total })
    }

    /// Profile update with ownership rules: editing someone else requires the
    /// admin flag, and a role change is silently dropped unless the caller
    /// may manage roles.
    #[instrument(skip(self, dto))]
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        mut dto: UpdateProfileDto,
        can_admin_edit: bool,
        can_change_roles: bool,
    ) -> Result<User, AppError> {
        if target_id != actor_id && !can_admin_edit {
            return Err(AppError::forbidden("You can only edit your own profile"));
        }
        if !can_change_roles {
            dto.role_id = None;
        }
        self.update(target_id, dto).await
    }

    #[instrument(skip(self, password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        password: &str,
        bcrypt_cost: u32,
    ) -> Result<(), AppError> {
        let hash = hash_password(password, bcrypt_cost)?;
        sqlx::query(
            "UPDATE users SET hash = $2, refresh_token = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .bind(&hash)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;
        Ok(())
    }

    #[instrument(skip(self, refresh_token_hash))]
    pub async fn set_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(refresh_token_hash)
            .execute(&self.db)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }
}

impl CrudService for UserService {
    type Entity = User;
    type Create = CreateUserDto;
    type Update = UpdateProfileDto;

    fn db(&self) -> &PgPool {
        &self.db
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
    }

    async fn find_all(&self, opts: &FindOptions) -> Result<Pagination<User>, AppError> {
        let deleted_clause = if opts.include_deleted {
            ""
        } else {
            "WHERE deleted_at IS NULL"
        };
        let query = format!(
            "SELECT * FROM users {} ORDER BY created_at {} LIMIT $1 OFFSET $2",
            deleted_clause,
            opts.created_order.as_sql()
        );
        let count_query = format!("SELECT COUNT(*) FROM users {}", deleted_clause);

        let items = sqlx::query_as::<_, User>(&query)
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

    async fn find_one_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.try_find_one_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    async fn try_find_one_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
    }

    async fn create(&self, input: CreateUserDto) -> Result<User, AppError> {
        if self.find_active_by_email(&input.email).await?.is_some() {
            return Err(AppError::bad_request(anyhow!(
                "An account with this email already exists"
            )));
        }

        let hash = match &input.password {
            Some(password) => Some(hash_password(password, bcrypt::DEFAULT_COST)?),
            None => None,
        };

        sqlx::query_as::<_, User>(
            "INSERT INTO users
                (email, username, first_name, last_name, phone_number, image_url, role_id, hash)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&input.email)
        .bind(&input.username)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(&input.image_url)
        .bind(input.role_id)
        .bind(&hash)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn update(&self, id: Uuid, patch: UpdateProfileDto) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET username = COALESCE($2, username),
                 first_name = COALESCE($3, first_name),
                 last_name = COALESCE($4, last_name),
                 phone_number = COALESCE($5, phone_number),
                 image_url = COALESCE($6, image_url),
                 role_id = COALESCE($7, role_id),
                 updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING *",
        )
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.phone_number)
        .bind(&patch.image_url)
        .bind(patch.role_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE users
             SET deleted_at = now(), refresh_token = NULL, is_active = false
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }
}
