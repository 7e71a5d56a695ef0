//! Port for the user documents the recipe core reads and back-references.
//!
//! Users are owned by the profile feature; this port only exposes the
//! projections and single-field list updates the recipe core needs. Every
//! list mutation is a single-document (or multi-document "pull") atomic
//! update in the underlying store. There is no cross-collection transaction.

use async_trait::async_trait;

use crate::domain::{RecipeId, UserId, UserSummary};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// Port for user lookups and recipe back-reference maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch the display summary for a single user.
    async fn find_summary(&self, id: &UserId) -> Result<Option<UserSummary>, UserRepositoryError>;

    /// Fetch summaries for every listed user that still exists.
    ///
    /// Unknown identifiers are skipped; ordering is unspecified.
    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError>;

    /// Append `recipe` to the user's `recipesOwned` list.
    ///
    /// Returns `false` when no user with `user` exists.
    async fn push_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError>;

    /// Find the user whose `recipesOwned` list contains `recipe`.
    async fn find_owner_of(&self, recipe: &RecipeId)
    -> Result<Option<UserId>, UserRepositoryError>;

    /// Remove `recipe` from the user's `recipesOwned` list.
    ///
    /// Returns `true` when the list changed.
    async fn pull_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError>;

    /// Remove `recipe` from every user's `favorites` list.
    ///
    /// Returns the number of users whose list changed.
    async fn pull_favorite_everywhere(&self, recipe: &RecipeId)
    -> Result<u64, UserRepositoryError>;
}
