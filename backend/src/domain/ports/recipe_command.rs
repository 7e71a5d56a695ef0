//! Driving port for recipe mutations.
//!
//! Payloads arrive as JSON values and identifiers as raw strings; the domain
//! owns their validation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{Error, Recipe, RecipeId, UserId};

/// Whether a removal deleted a live recipe or found only its tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOutcome {
    /// The recipe was live and has been deleted by this call.
    Removed,
    /// The recipe had already been deleted; only cleanup was re-run.
    AlreadyRemoved,
}

/// Report returned once every cleanup step has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRemoval {
    pub recipe_id: RecipeId,
    pub outcome: RemovalOutcome,
    /// Users whose favorites list dropped the recipe.
    pub favorites_cleared: u64,
    /// Whether an owner's `recipesOwned` list dropped the recipe.
    pub owner_detached: bool,
    /// Comments deleted alongside the recipe.
    pub comments_deleted: u64,
}

impl RecipeRemoval {
    /// Human-readable confirmation for callers that only relay a status.
    pub fn confirmation(&self) -> &'static str {
        match self.outcome {
            RemovalOutcome::Removed => "Recipe and references to it have been deleted.",
            RemovalOutcome::AlreadyRemoved => "Recipe was already deleted; references are clean.",
        }
    }
}

/// Confirmation that a rating was folded into a recipe's average.
///
/// Deliberately carries no aggregate; callers re-read the recipe if they
/// need the new average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReceipt {
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    /// Conditional-write attempts it took to land the rating.
    pub attempts: u32,
}

impl RatingReceipt {
    /// Human-readable confirmation.
    pub fn confirmation(&self) -> &'static str {
        "Recipe rating saved successfully."
    }
}

/// Domain use-case port for recipe mutations.
#[async_trait]
pub trait RecipeCommand: Send + Sync {
    /// Create a recipe owned by `owner_id` and record it on the owner.
    async fn create(&self, payload: Value, owner_id: &str) -> Result<Recipe, Error>;

    /// Merge a partial payload into an existing recipe.
    async fn update(&self, recipe_id: &str, patch: Value) -> Result<Recipe, Error>;

    /// Delete a recipe and every reference to it.
    async fn remove(&self, recipe_id: &str) -> Result<RecipeRemoval, Error>;

    /// Fold one user's rating into the recipe's average.
    async fn submit_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
        rating: f64,
    ) -> Result<RatingReceipt, Error>;
}
