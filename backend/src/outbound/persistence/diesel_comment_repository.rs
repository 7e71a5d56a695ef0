//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::RecipeId;
use crate::domain::ports::{CommentRepository, CommentRepositoryError};

use super::diesel_helpers::{count_to_u64, map_diesel_error, map_pool_error};
use super::schema::comments;
use super::pool::DbPool;

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn delete_by_recipe(&self, recipe: &RecipeId) -> Result<u64, CommentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CommentRepositoryError::connection))?;
        let deleted = diesel::delete(comments::table.filter(comments::recipe_id.eq(recipe.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(
                    err,
                    "comment cleanup",
                    CommentRepositoryError::query,
                    CommentRepositoryError::connection,
                )
            })?;
        Ok(count_to_u64(deleted))
    }
}
