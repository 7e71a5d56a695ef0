//! PostgreSQL-backed `RecipeRepository` implementation using Diesel ORM.
//!
//! Deletes set `deleted_at` and clear the payload, leaving a tombstone row.
//! Every read filters on `deleted_at IS NULL`. Rating writes are a single
//! conditional `UPDATE` keyed on `cardinality(people_rated)`; when it touches
//! no row a follow-up read tells a moved count from a deleted recipe.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Array, Double, Integer, Jsonb, Nullable, Text};
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{RecipeDeletion, RecipeRepository, RecipeRepositoryError};
use crate::domain::{
    RatingAggregate, Recipe, RecipeFields, RecipeId, RecipePatch, RecipeRecord, RecipeType, UserId,
};

use super::diesel_helpers::{map_diesel_error, map_pool_error, rater_count};
use super::models::{NewRecipeRow, RecipeRow, RecipeStateRow};
use super::pool::{DbPool, PoolError};
use super::schema::recipes;

const APPLY_PATCH_SQL: &str = r#"
UPDATE recipes
SET recipe_type = COALESCE($2, recipe_type),
    fields = (fields || $3) - $4
WHERE id = $1 AND deleted_at IS NULL
RETURNING id, recipe_type, owner_id, people_rated, average_rating, fields, created_at
"#;

const TOMBSTONE_SQL: &str = r#"
UPDATE recipes
SET deleted_at = now(), fields = '{}'::jsonb, people_rated = '{}'
WHERE id = $1 AND deleted_at IS NULL
"#;

const APPEND_RATING_SQL: &str = r#"
UPDATE recipes
SET people_rated = array_append(people_rated, $3),
    average_rating = $4
WHERE id = $1 AND deleted_at IS NULL AND cardinality(people_rated) = $2
"#;

/// Diesel-backed implementation of the `RecipeRepository` port.
#[derive(Clone)]
pub struct DieselRecipeRepository {
    pool: DbPool,
}

impl DieselRecipeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RecipeRepositoryError {
    map_pool_error(error, RecipeRepositoryError::connection)
}

fn diesel_error(operation: &'static str) -> impl FnOnce(diesel::result::Error) -> RecipeRepositoryError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            RecipeRepositoryError::query,
            RecipeRepositoryError::connection,
        )
    }
}

fn to_i64(value: u64, what: &str) -> Result<i64, RecipeRepositoryError> {
    i64::try_from(value).map_err(|_| RecipeRepositoryError::query(format!("{what} out of range")))
}

/// Convert a database row into a recipe, re-checking the rater invariants.
fn row_to_recipe(row: RecipeRow) -> Result<Recipe, RecipeRepositoryError> {
    let recipe_id = row.id.to_string();
    let corrupt = |message: String| RecipeRepositoryError::corrupt(recipe_id.clone(), message);

    let Value::Object(map) = row.fields else {
        return Err(corrupt("fields column is not a JSON object".to_owned()));
    };
    let record = RecipeRecord {
        id: RecipeId::from_uuid(row.id),
        recipe_type: RecipeType::new(row.recipe_type).map_err(|err| corrupt(err.to_string()))?,
        owner: UserId::from_uuid(row.owner_id),
        people_rated: row.people_rated.into_iter().map(UserId::from_uuid).collect(),
        average_rating: row.average_rating,
        created_at: row.created_at,
        fields: RecipeFields::new(map).map_err(|err| corrupt(err.to_string()))?,
    };
    Recipe::rehydrate(record).map_err(|err| corrupt(err.to_string()))
}

#[async_trait]
impl RecipeRepository for DieselRecipeRepository {
    async fn insert(&self, recipe: &Recipe) -> Result<(), RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewRecipeRow {
            id: *recipe.id().as_uuid(),
            recipe_type: recipe.recipe_type().as_ref(),
            owner_id: *recipe.owner().as_uuid(),
            people_rated: recipe
                .people_rated()
                .iter()
                .map(|rater| *rater.as_uuid())
                .collect(),
            average_rating: recipe.average_rating(),
            fields: Value::Object(recipe.fields().as_map().clone()),
            created_at: recipe.created_at(),
        };

        diesel::insert_into(recipes::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("recipe insert"))
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<RecipeRow> = recipes::table
            .filter(recipes::id.eq(id.as_uuid()))
            .filter(recipes::deleted_at.is_null())
            .select(RecipeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("recipe lookup"))?;
        row.map(row_to_recipe).transpose()
    }

    async fn list_by_type(
        &self,
        recipe_type: &RecipeType,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<RecipeRow> = recipes::table
            .filter(recipes::recipe_type.eq(recipe_type.as_ref()))
            .filter(recipes::deleted_at.is_null())
            .order_by((recipes::created_at.desc(), recipes::id.asc()))
            .offset(to_i64(offset, "offset")?)
            .limit(i64::from(limit))
            .select(RecipeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("recipe listing"))?;
        rows.into_iter().map(row_to_recipe).collect()
    }

    async fn count_by_type(&self, recipe_type: &RecipeType) -> Result<u64, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = recipes::table
            .filter(recipes::recipe_type.eq(recipe_type.as_ref()))
            .filter(recipes::deleted_at.is_null())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error("recipe count"))?;
        u64::try_from(count).map_err(|_| RecipeRepositoryError::query("negative recipe count"))
    }

    async fn apply_patch(
        &self,
        id: &RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<RecipeRow> = sql_query(APPLY_PATCH_SQL)
            .bind::<diesel::sql_types::Uuid, _>(id.as_uuid())
            .bind::<Nullable<Text>, _>(patch.recipe_type().map(AsRef::<str>::as_ref))
            .bind::<Jsonb, _>(Value::Object(patch.set().clone()))
            .bind::<Array<Text>, _>(patch.unset())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("recipe patch"))?;
        row.map(row_to_recipe).transpose()
    }

    async fn delete(&self, id: &RecipeId) -> Result<RecipeDeletion, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let tombstoned = sql_query(TOMBSTONE_SQL)
            .bind::<diesel::sql_types::Uuid, _>(id.as_uuid())
            .execute(&mut conn)
            .await
            .map_err(diesel_error("recipe delete"))?;
        if tombstoned > 0 {
            return Ok(RecipeDeletion::Deleted);
        }

        let existing: Option<Uuid> = recipes::table
            .filter(recipes::id.eq(id.as_uuid()))
            .select(recipes::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("recipe tombstone lookup"))?;
        Ok(match existing {
            Some(_) => RecipeDeletion::AlreadyDeleted,
            None => RecipeDeletion::NotFound,
        })
    }

    async fn append_rating(
        &self,
        id: &RecipeId,
        expected_raters: u32,
        rater: &UserId,
        aggregate: RatingAggregate,
    ) -> Result<(), RecipeRepositoryError> {
        let expected = i32::try_from(expected_raters)
            .map_err(|_| RecipeRepositoryError::query("rater count out of range"))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = sql_query(APPEND_RATING_SQL)
            .bind::<diesel::sql_types::Uuid, _>(id.as_uuid())
            .bind::<Integer, _>(expected)
            .bind::<diesel::sql_types::Uuid, _>(rater.as_uuid())
            .bind::<Double, _>(aggregate.average())
            .execute(&mut conn)
            .await
            .map_err(diesel_error("rating append"))?;
        if updated > 0 {
            return Ok(());
        }

        let state: Option<RecipeStateRow> = recipes::table
            .filter(recipes::id.eq(id.as_uuid()))
            .select(RecipeStateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("rating conflict lookup"))?;
        match state {
            Some(state) if state.deleted_at.is_none() => {
                Err(RecipeRepositoryError::rater_count_mismatch(
                    expected_raters,
                    rater_count(state.people_rated.len()),
                ))
            }
            _ => Err(RecipeRepositoryError::not_found(id.to_string())),
        }
    }
}
