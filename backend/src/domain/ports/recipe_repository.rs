//! Port for recipe document persistence.
//!
//! The [`RecipeRepository`] trait is the recipe collection of the entity
//! store. Adapters provide point lookups, filtered scans with skip/limit,
//! single-document atomic updates, and a tombstoning delete. Rating writes go
//! through [`RecipeRepository::append_rating`], a compare-and-swap keyed on
//! the number of raters observed by the caller.

use async_trait::async_trait;

use crate::domain::{RatingAggregate, Recipe, RecipeId, RecipePatch, RecipeType, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by recipe repository adapters.
    pub enum RecipeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "recipe repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "recipe repository query failed: {message}",
        /// A stored document no longer satisfies the recipe invariants.
        Corrupt { recipe_id: String, message: String } =>
            "stored recipe {recipe_id} is invalid: {message}",
        /// The conditional rating write observed a different rater count.
        RaterCountMismatch { expected: u32, actual: u32 } =>
            "rater count mismatch: expected {expected}, found {actual}",
        /// The recipe disappeared before a conditional write landed.
        NotFound { recipe_id: String } =>
            "recipe {recipe_id} not found",
    }
}

/// Outcome of [`RecipeRepository::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeDeletion {
    /// A live recipe was deleted by this call.
    Deleted,
    /// The recipe had already been deleted by an earlier call.
    AlreadyDeleted,
    /// No recipe with this identifier ever existed.
    NotFound,
}

/// Port for the recipe collection.
///
/// # Deletion semantics
///
/// Deleting a recipe leaves a tombstone holding only its identifier so that a
/// repeated delete can be told apart from a delete of an identifier that
/// never existed. Tombstoned recipes are invisible to every read.
///
/// # Rating writes
///
/// [`append_rating`](Self::append_rating) appends the rater and stores the
/// new average only if the recipe still has exactly `expected_raters`
/// raters. Otherwise it fails with
/// [`RecipeRepositoryError::RaterCountMismatch`] and leaves the document
/// untouched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Persist a newly created recipe.
    async fn insert(&self, recipe: &Recipe) -> Result<(), RecipeRepositoryError>;

    /// Fetch a live recipe by identifier.
    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipeRepositoryError>;

    /// List live recipes of one type, newest first, skipping `offset` and
    /// returning at most `limit`. Ties on creation time break on identifier.
    async fn list_by_type(
        &self,
        recipe_type: &RecipeType,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError>;

    /// Count live recipes of one type.
    async fn count_by_type(&self, recipe_type: &RecipeType) -> Result<u64, RecipeRepositoryError>;

    /// Apply a payload patch atomically, returning the edited recipe or
    /// `None` when no live recipe matches.
    async fn apply_patch(
        &self,
        id: &RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipeRepositoryError>;

    /// Delete a recipe, leaving a tombstone.
    async fn delete(&self, id: &RecipeId) -> Result<RecipeDeletion, RecipeRepositoryError>;

    /// Conditionally append `rater` and store `aggregate.average()`.
    async fn append_rating(
        &self,
        id: &RecipeId,
        expected_raters: u32,
        rater: &UserId,
        aggregate: RatingAggregate,
    ) -> Result<(), RecipeRepositoryError>;
}
