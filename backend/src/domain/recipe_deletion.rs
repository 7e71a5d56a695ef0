//! Cascade deletion of a recipe and every reference to it.
//!
//! The entity store has no cross-collection transactions, so removal is an
//! ordered sequence of independent atomic steps:
//!
//! 1. delete the recipe document (leaving a tombstone);
//! 2. pull the recipe from every user's favorites;
//! 3. pull the recipe from its owner's `recipesOwned`;
//! 4. delete every comment on the recipe.
//!
//! A failure stops the sequence and is returned unchanged. Earlier steps are
//! not rolled back; each step is idempotent, so re-running `remove` on the
//! same identifier finishes the job. A second call finds the tombstone,
//! skips step 1 and repeats steps 2 to 4.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Error;
use crate::domain::RecipeId;
use crate::domain::ports::{
    CommentRepository, RecipeDeletion, RecipeRemoval, RecipeRepository, RemovalOutcome,
    UserRepository,
};
use crate::domain::recipe_service_support::{
    map_comment_error, map_recipe_error, map_user_error, recipe_not_found,
};

/// Coordinates the ordered cleanup that keeps references consistent after a
/// recipe is deleted.
#[derive(Clone)]
pub struct RecipeDeletionCoordinator<R, U, C> {
    recipes: Arc<R>,
    users: Arc<U>,
    comments: Arc<C>,
}

impl<R, U, C> RecipeDeletionCoordinator<R, U, C> {
    /// Create a coordinator over the three collections it touches.
    pub fn new(recipes: Arc<R>, users: Arc<U>, comments: Arc<C>) -> Self {
        Self {
            recipes,
            users,
            comments,
        }
    }
}

impl<R, U, C> RecipeDeletionCoordinator<R, U, C>
where
    R: RecipeRepository,
    U: UserRepository,
    C: CommentRepository,
{
    /// Delete `recipe_id` and clean up favorites, ownership and comments.
    ///
    /// Fails with `NotFound` when the identifier never named a recipe; in that
    /// case no other collection is touched.
    pub async fn remove(&self, recipe_id: &RecipeId) -> Result<RecipeRemoval, Error> {
        let outcome = match self
            .recipes
            .delete(recipe_id)
            .await
            .map_err(map_recipe_error)?
        {
            RecipeDeletion::Deleted => RemovalOutcome::Removed,
            RecipeDeletion::AlreadyDeleted => RemovalOutcome::AlreadyRemoved,
            RecipeDeletion::NotFound => return Err(recipe_not_found(recipe_id)),
        };

        let removal = self
            .clean_references(recipe_id, outcome)
            .await
            .inspect_err(|err| {
                warn!(
                    %recipe_id,
                    code = ?err.code(),
                    error = %err,
                    "recipe cleanup interrupted; re-run remove to finish"
                );
            })?;

        info!(
            %recipe_id,
            outcome = ?removal.outcome,
            favorites_cleared = removal.favorites_cleared,
            owner_detached = removal.owner_detached,
            comments_deleted = removal.comments_deleted,
            "recipe removed"
        );
        Ok(removal)
    }

    async fn clean_references(
        &self,
        recipe_id: &RecipeId,
        outcome: RemovalOutcome,
    ) -> Result<RecipeRemoval, Error> {
        let favorites_cleared = self
            .users
            .pull_favorite_everywhere(recipe_id)
            .await
            .map_err(map_user_error)?;

        let owner_detached = self.detach_owner(recipe_id, outcome).await?;

        let comments_deleted = self
            .comments
            .delete_by_recipe(recipe_id)
            .await
            .map_err(map_comment_error)?;

        Ok(RecipeRemoval {
            recipe_id: recipe_id.clone(),
            outcome,
            favorites_cleared,
            owner_detached,
            comments_deleted,
        })
    }

    async fn detach_owner(
        &self,
        recipe_id: &RecipeId,
        outcome: RemovalOutcome,
    ) -> Result<bool, Error> {
        let owner = self
            .users
            .find_owner_of(recipe_id)
            .await
            .map_err(map_user_error)?;

        match owner {
            Some(owner) => self
                .users
                .pull_owned_recipe(&owner, recipe_id)
                .await
                .map_err(map_user_error),
            None => {
                // On a repeat removal the owner was already detached.
                if outcome == RemovalOutcome::Removed {
                    warn!(%recipe_id, "no owner references the removed recipe");
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[path = "recipe_deletion_tests.rs"]
mod tests;
