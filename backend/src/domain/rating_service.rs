//! Rating aggregation with optimistic concurrency.
//!
//! A rating is folded into the stored average with a conditional write keyed
//! on the rater count read beforehand. When another submission lands first
//! the write is rejected, the recipe is re-read and the fold recomputed. The
//! rater-invariant checks are repeated on every attempt so a concurrent
//! duplicate from the same user still ends in `AlreadyRated`.

use std::num::NonZeroU32;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{RatingReceipt, RecipeRepository, RecipeRepositoryError, UserRepository};
use crate::domain::recipe_service_support::{
    map_recipe_error, map_user_error, recipe_not_found, user_not_found,
};
use crate::domain::{Error, Rating, RatingAggregate, Recipe, RecipeId, UserId};

/// Default number of conditional-write attempts per submission.
pub const DEFAULT_RATING_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(8) {
    Some(attempts) => attempts,
    None => NonZeroU32::MIN,
};

/// Bounds the optimistic retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingRetryPolicy {
    max_attempts: NonZeroU32,
}

impl RatingRetryPolicy {
    /// Allow up to `max_attempts` conditional writes per submission.
    pub fn new(max_attempts: NonZeroU32) -> Self {
        Self { max_attempts }
    }

    /// Upper bound on conditional writes.
    pub fn max_attempts(self) -> NonZeroU32 {
        self.max_attempts
    }
}

impl Default for RatingRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RATING_ATTEMPTS)
    }
}

/// Folds one user's rating into a recipe's average.
#[derive(Clone)]
pub struct RatingAggregator<R, U> {
    recipes: Arc<R>,
    users: Arc<U>,
    policy: RatingRetryPolicy,
}

impl<R, U> RatingAggregator<R, U> {
    /// Create an aggregator with the default retry policy.
    pub fn new(recipes: Arc<R>, users: Arc<U>) -> Self {
        Self::with_policy(recipes, users, RatingRetryPolicy::default())
    }

    /// Create an aggregator with an explicit retry policy.
    pub fn with_policy(recipes: Arc<R>, users: Arc<U>, policy: RatingRetryPolicy) -> Self {
        Self {
            recipes,
            users,
            policy,
        }
    }

    /// Active retry policy.
    pub fn policy(&self) -> RatingRetryPolicy {
        self.policy
    }
}

impl<R, U> RatingAggregator<R, U>
where
    R: RecipeRepository,
    U: UserRepository,
{
    /// Submit `rating` from `user_id` for `recipe_id`.
    ///
    /// Checks run in a fixed order: recipe and user exist (`NotFound`), user
    /// has not rated yet (`AlreadyRated`), user is not the owner
    /// (`SelfRatingForbidden`).
    pub async fn submit(
        &self,
        recipe_id: &RecipeId,
        user_id: &UserId,
        rating: Rating,
    ) -> Result<RatingReceipt, Error> {
        let mut recipe = self.load_recipe(recipe_id).await?;
        self.ensure_user_exists(user_id).await?;

        let max_attempts = self.policy.max_attempts.get();
        let mut attempt = 1;
        loop {
            Self::check_rater(&recipe, user_id)?;

            let current = recipe.rating_aggregate();
            let next = current.fold(rating);
            Self::ensure_finite(recipe_id, rating, next)?;
            match self
                .recipes
                .append_rating(recipe_id, current.raters(), user_id, next)
                .await
            {
                Ok(()) => {
                    debug!(
                        %recipe_id,
                        %user_id,
                        attempts = attempt,
                        raters = next.raters(),
                        "rating stored"
                    );
                    return Ok(RatingReceipt {
                        recipe_id: recipe_id.clone(),
                        user_id: user_id.clone(),
                        attempts: attempt,
                    });
                }
                Err(RecipeRepositoryError::RaterCountMismatch { expected, actual }) => {
                    if attempt >= max_attempts {
                        warn!(
                            %recipe_id,
                            attempts = attempt,
                            "rating retry budget exhausted"
                        );
                        return Err(Error::conflict(
                            "recipe is being rated concurrently; try again",
                        )
                        .with_details(json!({
                            "recipeId": recipe_id,
                            "attempts": attempt,
                            "code": "rating_contention",
                        })));
                    }
                    debug!(
                        %recipe_id,
                        expected,
                        actual,
                        attempt,
                        "rater count moved; retrying"
                    );
                    attempt += 1;
                    recipe = self.load_recipe(recipe_id).await?;
                }
                Err(RecipeRepositoryError::NotFound { .. }) => {
                    return Err(recipe_not_found(recipe_id));
                }
                Err(other) => return Err(map_recipe_error(other)),
            }
        }
    }

    async fn load_recipe(&self, recipe_id: &RecipeId) -> Result<Recipe, Error> {
        self.recipes
            .find_by_id(recipe_id)
            .await
            .map_err(map_recipe_error)?
            .ok_or_else(|| recipe_not_found(recipe_id))
    }

    async fn ensure_user_exists(&self, user_id: &UserId) -> Result<(), Error> {
        self.users
            .find_summary(user_id)
            .await
            .map_err(map_user_error)?
            .map(|_| ())
            .ok_or_else(|| user_not_found(user_id))
    }

    fn ensure_finite(
        recipe_id: &RecipeId,
        rating: Rating,
        next: RatingAggregate,
    ) -> Result<(), Error> {
        if next.average().is_finite() {
            return Ok(());
        }
        warn!(%recipe_id, %rating, "rating would leave a non-finite average");
        Err(
            Error::invalid_argument("rating cannot be folded into a finite average")
                .with_details(json!({
                    "field": "rating",
                    "value": rating,
                    "recipeId": recipe_id,
                })),
        )
    }

    fn check_rater(recipe: &Recipe, user_id: &UserId) -> Result<(), Error> {
        if recipe.has_rated(user_id) {
            return Err(Error::already_rated("user has already rated this recipe")
                .with_details(json!({
                    "recipeId": recipe.id(),
                    "userId": user_id,
                    "code": "already_rated",
                })));
        }
        if recipe.is_owned_by(user_id) {
            return Err(Error::self_rating_forbidden("owners cannot rate their own recipe")
                .with_details(json!({
                    "recipeId": recipe.id(),
                    "userId": user_id,
                    "code": "self_rating_forbidden",
                })));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "rating_service_tests.rs"]
mod tests;
