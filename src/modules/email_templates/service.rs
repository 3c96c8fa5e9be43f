use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::crud::{CrudService, FindOptions, Pagination};
use crate::utils::errors::AppError;

use super::model::{
    CreateEmailTemplateDto, EmailTemplate, EmailTemplateFilterParams, UpdateEmailTemplateDto,
};

#[derive(Clone)]
pub struct EmailTemplateService {
    db: PgPool,
}

impl EmailTemplateService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_filtered(
        &self,
        params: &EmailTemplateFilterParams,
    ) -> Result<Pagination<EmailTemplate>, AppError> {
        let name_filter = params.name.as_ref().map(|n| format!("%{}%", n));

        let items = sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates
             WHERE deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name
             LIMIT $2 OFFSET $3",
        )
        .bind(&name_filter)
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(&self.db)
        .await
        .map_err(AppError::database)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM email_templates
             WHERE deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name_filter)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(Pagination { items, total })
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<EmailTemplate>, AppError> {
        sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)
    }
}

impl CrudService for EmailTemplateService {
    type Entity = EmailTemplate;
    type Create = CreateEmailTemplateDto;
    type Update = UpdateEmailTemplateDto;

    fn db(&self) -> &PgPool {
        &self.db
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM email_templates WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn find_all(&self, opts: &FindOptions) -> Result<Pagination<EmailTemplate>, AppError> {
        let deleted_clause = if opts.include_deleted {
            ""
        } else {
            "WHERE deleted_at IS NULL"
        };
        let query = format!(
            "SELECT * FROM email_templates {} ORDER BY created_at {} LIMIT $1 OFFSET $2",
            deleted_clause,
            opts.created_order.as_sql()
        );
        let count_query = format!("SELECT COUNT(*) FROM email_templates {}", deleted_clause);

        let items = sqlx::query_as::<_, EmailTemplate>(&query)
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

    async fn find_one_by_id(&self, id: Uuid) -> Result<EmailTemplate, AppError> {
        self.try_find_one_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Email template not found")))
    }

    async fn try_find_one_by_id(&self, id: Uuid) -> Result<Option<EmailTemplate>, AppError> {
        sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)
    }

    async fn create(&self, input: CreateEmailTemplateDto) -> Result<EmailTemplate, AppError> {
        sqlx::query_as::<_, EmailTemplate>(
            "INSERT INTO email_templates (name, subject, body)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.body)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "A template with this name already exists"
                    ));
                }
            }
            AppError::database(e)
        })
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UpdateEmailTemplateDto,
    ) -> Result<EmailTemplate, AppError> {
        sqlx::query_as::<_, EmailTemplate>(
            "UPDATE email_templates
             SET name = COALESCE($2, name),
                 subject = COALESCE($3, subject),
                 body = COALESCE($4, body),
                 updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING *",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.subject)
        .bind(&patch.body)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Email template not found")))
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE email_templates SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }
}
