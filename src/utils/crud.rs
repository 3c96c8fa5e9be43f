//! Generic data-access contract shared by the entity services.
//!
//! Every persisted entity gets a service implementing [`CrudService`] with its
//! own SQL; domain rules (role protection, permission ownership checks) are
//! layered in the service methods that call into these primitives.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationParams;

/// A page of results together with the unpaginated total.
#[derive(Debug, Serialize)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Listing options honored by `find_all`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub pagination: PaginationParams,
    /// Ordering on `created_at`.
    pub created_order: SortOrder,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
}

/// Capability set every entity service provides: count, find, create,
/// update, delete over one entity type.
#[allow(async_fn_in_trait)]
pub trait CrudService {
    type Entity;
    type Create;
    type Update;

    fn db(&self) -> &PgPool;

    async fn count(&self) -> Result<i64, AppError>;

    async fn find_all(&self, opts: &FindOptions) -> Result<Pagination<Self::Entity>, AppError>;

    /// Returns the entity or a NotFound error.
    async fn find_one_by_id(&self, id: Uuid) -> Result<Self::Entity, AppError>;

    /// Non-failing variant: `Ok(None)` on miss instead of an error.
    async fn try_find_one_by_id(&self, id: Uuid) -> Result<Option<Self::Entity>, AppError>;

    async fn create(&self, input: Self::Create) -> Result<Self::Entity, AppError>;

    async fn update(&self, id: Uuid, patch: Self::Update) -> Result<Self::Entity, AppError>;

    /// Returns the number of rows affected; guarded deletes report 0 instead
    /// of failing.
    async fn delete(&self, id: Uuid) -> Result<u64, AppError>;
}
