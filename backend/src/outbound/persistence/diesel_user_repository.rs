//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! `recipes_owned` and `favorites` are `uuid[]` columns. Pushes and pulls are
//! single `UPDATE` statements using `array_append` and `array_remove`, so
//! each is atomic per row without a surrounding transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Uuid as SqlUuid;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{DisplayName, RecipeId, UserId, UserSummary};

use super::diesel_helpers::{count_to_u64, map_diesel_error, map_pool_error};
use super::models::UserSummaryRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

const PUSH_OWNED_SQL: &str = r#"
UPDATE users
SET recipes_owned = CASE
        WHEN $2 = ANY(recipes_owned) THEN recipes_owned
        ELSE array_append(recipes_owned, $2)
    END
WHERE id = $1
"#;

const PULL_OWNED_SQL: &str = r#"
UPDATE users
SET recipes_owned = array_remove(recipes_owned, $2)
WHERE id = $1 AND $2 = ANY(recipes_owned)
"#;

const PULL_FAVORITE_SQL: &str = r#"
UPDATE users
SET favorites = array_remove(favorites, $1)
WHERE $1 = ANY(favorites)
"#;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn diesel_error(operation: &'static str) -> impl FnOnce(diesel::result::Error) -> UserRepositoryError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            UserRepositoryError::query,
            UserRepositoryError::connection,
        )
    }
}

fn row_to_summary(row: UserSummaryRow) -> Result<UserSummary, UserRepositoryError> {
    let display_name = DisplayName::new(row.display_name).map_err(|err| {
        UserRepositoryError::query(format!("stored user {} is invalid: {err}", row.id))
    })?;
    Ok(UserSummary::new(UserId::from_uuid(row.id), display_name))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_summary(&self, id: &UserId) -> Result<Option<UserSummary>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserSummaryRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserSummaryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("user summary lookup"))?;
        row.map(row_to_summary).transpose()
    }

    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<UserSummaryRow> = users::table
            .filter(users::id.eq_any(&uuids))
            .select(UserSummaryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("user summaries lookup"))?;
        rows.into_iter().map(row_to_summary).collect()
    }

    async fn push_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = sql_query(PUSH_OWNED_SQL)
            .bind::<SqlUuid, _>(user.as_uuid())
            .bind::<SqlUuid, _>(recipe.as_uuid())
            .execute(&mut conn)
            .await
            .map_err(diesel_error("owned recipe push"))?;
        Ok(updated > 0)
    }

    async fn find_owner_of(
        &self,
        recipe: &RecipeId,
    ) -> Result<Option<UserId>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let owner: Option<Uuid> = users::table
            .filter(users::recipes_owned.contains(vec![*recipe.as_uuid()]))
            .select(users::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("recipe owner lookup"))?;
        Ok(owner.map(UserId::from_uuid))
    }

    async fn pull_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = sql_query(PULL_OWNED_SQL)
            .bind::<SqlUuid, _>(user.as_uuid())
            .bind::<SqlUuid, _>(recipe.as_uuid())
            .execute(&mut conn)
            .await
            .map_err(diesel_error("owned recipe pull"))?;
        Ok(updated > 0)
    }

    async fn pull_favorite_everywhere(
        &self,
        recipe: &RecipeId,
    ) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = sql_query(PULL_FAVORITE_SQL)
            .bind::<SqlUuid, _>(recipe.as_uuid())
            .execute(&mut conn)
            .await
            .map_err(diesel_error("favorite pull"))?;
        Ok(count_to_u64(updated))
    }
}
