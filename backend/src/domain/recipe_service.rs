//! Recipe service façade.
//!
//! Implements the [`RecipeQuery`] and [`RecipeCommand`] driving ports on top
//! of the recipe, user and comment repositories. Identifiers arrive as raw
//! strings and are parsed before any store call so malformed input never
//! reaches an adapter. Deletion and rating are delegated to
//! [`RecipeDeletionCoordinator`] and [`RatingAggregator`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::domain::ports::{
    CommentRepository, RatingReceipt, RecipeCommand, RecipeQuery, RecipeRemoval,
    RecipeRepository, UserRepository,
};
use crate::domain::rating_service::{RatingAggregator, RatingRetryPolicy};
use crate::domain::recipe_deletion::RecipeDeletionCoordinator;
use crate::domain::recipe_service_support::{
    invalid_payload, map_recipe_error, map_user_error, parse_recipe_id, parse_user_id,
    recipe_not_found,
};
use crate::domain::{
    Error, Rating, Recipe, RecipeDetails, RecipeDraft, RecipeId, RecipeListing, RecipePatch,
    RecipeType, UserId, UserSummary,
};

/// Recipe service implementing the driving ports.
#[derive(Clone)]
pub struct RecipeService<R, U, C> {
    recipes: Arc<R>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    deletion: RecipeDeletionCoordinator<R, U, C>,
    ratings: RatingAggregator<R, U>,
}

impl<R, U, C> RecipeService<R, U, C> {
    /// Create a service over the given repositories.
    ///
    /// `clock` stamps `createdAt` on new recipes.
    pub fn new(recipes: Arc<R>, users: Arc<U>, comments: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            deletion: RecipeDeletionCoordinator::new(
                Arc::clone(&recipes),
                Arc::clone(&users),
                comments,
            ),
            ratings: RatingAggregator::new(Arc::clone(&recipes), Arc::clone(&users)),
            recipes,
            users,
            clock,
        }
    }

    /// Replace the retry policy used for rating submissions.
    #[must_use]
    pub fn with_rating_policy(mut self, policy: RatingRetryPolicy) -> Self {
        self.ratings = RatingAggregator::with_policy(
            Arc::clone(&self.recipes),
            Arc::clone(&self.users),
            policy,
        );
        self
    }
}

impl<R, U, C> RecipeService<R, U, C>
where
    R: RecipeRepository,
    U: UserRepository,
    C: CommentRepository,
{
    async fn fetch_recipe(&self, recipe_id: &RecipeId) -> Result<Recipe, Error> {
        self.recipes
            .find_by_id(recipe_id)
            .await
            .map_err(map_recipe_error)?
            .ok_or_else(|| recipe_not_found(recipe_id))
    }

    async fn summaries_for(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.users
            .find_summaries(ids)
            .await
            .map_err(map_user_error)
    }

    async fn attach_owners(&self, recipes: Vec<Recipe>) -> Result<Vec<RecipeListing>, Error> {
        let mut seen = HashSet::new();
        let owners: Vec<UserId> = recipes
            .iter()
            .map(|recipe| recipe.owner().clone())
            .filter(|owner| seen.insert(owner.clone()))
            .collect();
        let summaries = self.summaries_for(&owners).await?;

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let owner = summaries
                    .iter()
                    .find(|summary| &summary.id == recipe.owner())
                    .cloned();
                RecipeListing { recipe, owner }
            })
            .collect())
    }

    async fn record_ownership(&self, recipe: &Recipe) {
        let recipe_id = recipe.id();
        let owner = recipe.owner();
        match self.users.push_owned_recipe(owner, recipe_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    %recipe_id,
                    %owner,
                    "owner not found; recipe stored without back-reference"
                );
            }
            Err(err) => {
                warn!(
                    %recipe_id,
                    %owner,
                    error = %err,
                    "failed to record ownership; recipe stored without back-reference"
                );
            }
        }
    }
}

#[async_trait]
impl<R, U, C> RecipeQuery for RecipeService<R, U, C>
where
    R: RecipeRepository,
    U: UserRepository,
    C: CommentRepository,
{
    async fn list_by_type(
        &self,
        recipe_type: &str,
        page: PageRequest,
    ) -> Result<Page<RecipeListing>, Error> {
        let recipe_type = RecipeType::new(recipe_type).map_err(|err| invalid_payload(&err))?;
        let total = self
            .recipes
            .count_by_type(&recipe_type)
            .await
            .map_err(map_recipe_error)?;
        let recipes = self
            .recipes
            .list_by_type(&recipe_type, page.offset(), page.limit())
            .await
            .map_err(map_recipe_error)?;
        let items = self.attach_owners(recipes).await?;
        Ok(Page::new(items, total, page))
    }

    async fn owner_record(&self, recipe_id: &str) -> Result<Recipe, Error> {
        let recipe_id = parse_recipe_id(recipe_id)?;
        self.fetch_recipe(&recipe_id).await
    }

    async fn detailed(&self, recipe_id: &str) -> Result<RecipeDetails, Error> {
        let recipe_id = parse_recipe_id(recipe_id)?;
        let recipe = self.fetch_recipe(&recipe_id).await?;
        let owner = self
            .users
            .find_summary(recipe.owner())
            .await
            .map_err(map_user_error)?;
        let raters = self.summaries_for(recipe.people_rated()).await?;
        Ok(RecipeDetails::resolve(recipe, owner, raters))
    }
}

#[async_trait]
impl<R, U, C> RecipeCommand for RecipeService<R, U, C>
where
    R: RecipeRepository,
    U: UserRepository,
    C: CommentRepository,
{
    async fn create(&self, payload: Value, owner_id: &str) -> Result<Recipe, Error> {
        let owner = parse_user_id(owner_id)?;
        let draft = RecipeDraft::from_value(payload).map_err(|err| invalid_payload(&err))?;
        let recipe = Recipe::create(RecipeId::random(), draft, owner, self.clock.utc());

        self.recipes
            .insert(&recipe)
            .await
            .map_err(map_recipe_error)?;
        self.record_ownership(&recipe).await;

        info!(
            recipe_id = %recipe.id(),
            owner = %recipe.owner(),
            recipe_type = %recipe.recipe_type(),
            "recipe created"
        );
        Ok(recipe)
    }

    async fn update(&self, recipe_id: &str, patch: Value) -> Result<Recipe, Error> {
        let recipe_id = parse_recipe_id(recipe_id)?;
        let patch = RecipePatch::from_value(patch).map_err(|err| invalid_payload(&err))?;
        let updated = self
            .recipes
            .apply_patch(&recipe_id, &patch)
            .await
            .map_err(map_recipe_error)?
            .ok_or_else(|| recipe_not_found(&recipe_id))?;
        info!(
            %recipe_id,
            changed = patch.set().len(),
            removed = patch.unset().len(),
            "recipe updated"
        );
        Ok(updated)
    }

    async fn remove(&self, recipe_id: &str) -> Result<RecipeRemoval, Error> {
        let recipe_id = parse_recipe_id(recipe_id)?;
        self.deletion.remove(&recipe_id).await
    }

    async fn submit_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
        rating: f64,
    ) -> Result<RatingReceipt, Error> {
        let recipe_id = parse_recipe_id(recipe_id)?;
        let user_id = parse_user_id(user_id)?;
        let rating = Rating::new(rating).map_err(|err| {
            Error::invalid_argument(err.to_string()).with_details(json!({
                "field": "rating",
                "code": "invalid_rating",
            }))
        })?;
        self.ratings.submit(&recipe_id, &user_id, rating).await
    }
}

#[cfg(test)]
#[path = "recipe_service_tests.rs"]
mod tests;
