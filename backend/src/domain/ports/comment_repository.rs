//! Port for comment cleanup.
//!
//! Comments are written by a separate feature. The recipe core only needs to
//! remove every comment that references a deleted recipe.

use async_trait::async_trait;

use crate::domain::RecipeId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "comment repository query failed: {message}",
    }
}

/// Port for deleting comments attached to a recipe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Delete every comment whose `recipe` is `recipe`.
    ///
    /// Returns the number of comments deleted; zero when none remain.
    async fn delete_by_recipe(&self, recipe: &RecipeId) -> Result<u64, CommentRepositoryError>;
}

/// Fixture implementation for tests that do not exercise comments.
///
/// It deletes nothing, so it is only compiled for unit tests.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCommentRepository;

#[cfg(test)]
#[async_trait]
impl CommentRepository for FixtureCommentRepository {
    async fn delete_by_recipe(&self, _recipe: &RecipeId) -> Result<u64, CommentRepositoryError> {
        Ok(0)
    }
}
