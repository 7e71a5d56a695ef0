//! In-process entity store.
//!
//! [`InMemoryEntityStore`] keeps the recipe, user and comment collections in
//! one mutex-guarded state and implements every driven port against it. It
//! honours the same contracts as the PostgreSQL adapter: deletes leave a
//! tombstone, rating writes are conditional on the rater count, and "pull"
//! updates touch every matching user. It backs the integration and behaviour
//! tests.
//!
//! User favorites and comments are written by features outside the recipe
//! core; [`InMemoryEntityStore::add_favorite`] and
//! [`InMemoryEntityStore::seed_comment`] stand in for them.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ports::{
    CommentRepository, CommentRepositoryError, RecipeDeletion, RecipeRepository,
    RecipeRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    CommentId, RatingAggregate, Recipe, RecipeId, RecipePatch, RecipeType, UserId, UserSummary,
};

/// The store's mutex was poisoned by a panicking writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("in-memory entity store lock poisoned")]
pub struct StorePoisoned;

impl From<StorePoisoned> for RecipeRepositoryError {
    fn from(err: StorePoisoned) -> Self {
        Self::connection(err.to_string())
    }
}

impl From<StorePoisoned> for UserRepositoryError {
    fn from(err: StorePoisoned) -> Self {
        Self::connection(err.to_string())
    }
}

impl From<StorePoisoned> for CommentRepositoryError {
    fn from(err: StorePoisoned) -> Self {
        Self::connection(err.to_string())
    }
}

#[derive(Debug, Clone)]
struct UserDocument {
    summary: UserSummary,
    recipes_owned: Vec<RecipeId>,
    favorites: Vec<RecipeId>,
}

#[derive(Debug, Default)]
struct StoreState {
    recipes: HashMap<RecipeId, Recipe>,
    tombstones: HashSet<RecipeId>,
    users: HashMap<UserId, UserDocument>,
    comments: HashMap<CommentId, RecipeId>,
}

impl StoreState {
    fn live_of_type<'a>(&'a self, recipe_type: &'a RecipeType) -> impl Iterator<Item = &'a Recipe> {
        self.recipes
            .values()
            .filter(move |recipe| recipe.recipe_type() == recipe_type)
    }
}

/// Entity store holding every collection in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: Mutex<StoreState>,
}

impl InMemoryEntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StorePoisoned> {
        self.state.lock().map_err(|_| StorePoisoned)
    }

    /// Register a user with empty `recipesOwned` and `favorites` lists.
    ///
    /// Re-seeding an existing user replaces its summary and keeps its lists.
    pub fn seed_user(&self, summary: UserSummary) -> Result<(), StorePoisoned> {
        let mut state = self.lock()?;
        state
            .users
            .entry(summary.id.clone())
            .and_modify(|doc| doc.summary = summary.clone())
            .or_insert_with(|| UserDocument {
                summary,
                recipes_owned: Vec::new(),
                favorites: Vec::new(),
            });
        Ok(())
    }

    /// Record a comment on `recipe`, returning its identifier.
    pub fn seed_comment(&self, recipe: &RecipeId) -> Result<CommentId, StorePoisoned> {
        let id = CommentId::random();
        self.lock()?.comments.insert(id.clone(), recipe.clone());
        Ok(id)
    }

    /// Add `recipe` to `user`'s favorites. Returns `false` for unknown users.
    pub fn add_favorite(&self, user: &UserId, recipe: &RecipeId) -> Result<bool, StorePoisoned> {
        let mut state = self.lock()?;
        let Some(doc) = state.users.get_mut(user) else {
            return Ok(false);
        };
        if !doc.favorites.contains(recipe) {
            doc.favorites.push(recipe.clone());
        }
        Ok(true)
    }

    /// Snapshot of `user`'s favorites.
    pub fn favorites_of(&self, user: &UserId) -> Result<Vec<RecipeId>, StorePoisoned> {
        Ok(self
            .lock()?
            .users
            .get(user)
            .map(|doc| doc.favorites.clone())
            .unwrap_or_default())
    }

    /// Snapshot of `user`'s `recipesOwned`.
    pub fn recipes_owned_by(&self, user: &UserId) -> Result<Vec<RecipeId>, StorePoisoned> {
        Ok(self
            .lock()?
            .users
            .get(user)
            .map(|doc| doc.recipes_owned.clone())
            .unwrap_or_default())
    }

    /// Number of comments still referencing `recipe`.
    pub fn comments_on(&self, recipe: &RecipeId) -> Result<usize, StorePoisoned> {
        Ok(self
            .lock()?
            .comments
            .values()
            .filter(|target| *target == recipe)
            .count())
    }
}

#[async_trait]
impl RecipeRepository for InMemoryEntityStore {
    async fn insert(&self, recipe: &Recipe) -> Result<(), RecipeRepositoryError> {
        let mut state = self.lock()?;
        let id = recipe.id();
        if state.recipes.contains_key(id) || state.tombstones.contains(id) {
            return Err(RecipeRepositoryError::query(format!(
                "recipe {id} already exists"
            )));
        }
        state.recipes.insert(id.clone(), recipe.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipeRepositoryError> {
        Ok(self.lock()?.recipes.get(id).cloned())
    }

    async fn list_by_type(
        &self,
        recipe_type: &RecipeType,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError> {
        let state = self.lock()?;
        let mut matching: Vec<&Recipe> = state.live_of_type(recipe_type).collect();
        matching.sort_by_key(|recipe| (Reverse(recipe.created_at()), *recipe.id().as_uuid()));

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_by_type(&self, recipe_type: &RecipeType) -> Result<u64, RecipeRepositoryError> {
        let count = self.lock()?.live_of_type(recipe_type).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn apply_patch(
        &self,
        id: &RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut state = self.lock()?;
        let Some(recipe) = state.recipes.get_mut(id) else {
            return Ok(None);
        };
        *recipe = recipe.patched(patch);
        Ok(Some(recipe.clone()))
    }

    async fn delete(&self, id: &RecipeId) -> Result<RecipeDeletion, RecipeRepositoryError> {
        let mut state = self.lock()?;
        if state.recipes.remove(id).is_some() {
            state.tombstones.insert(id.clone());
            return Ok(RecipeDeletion::Deleted);
        }
        if state.tombstones.contains(id) {
            return Ok(RecipeDeletion::AlreadyDeleted);
        }
        Ok(RecipeDeletion::NotFound)
    }

    async fn append_rating(
        &self,
        id: &RecipeId,
        expected_raters: u32,
        rater: &UserId,
        aggregate: RatingAggregate,
    ) -> Result<(), RecipeRepositoryError> {
        let mut state = self.lock()?;
        let Some(recipe) = state.recipes.get_mut(id) else {
            return Err(RecipeRepositoryError::not_found(id.to_string()));
        };
        let actual = recipe.rating_aggregate().raters();
        if actual != expected_raters {
            return Err(RecipeRepositoryError::rater_count_mismatch(
                expected_raters,
                actual,
            ));
        }
        *recipe = recipe.with_rating(rater.clone(), aggregate);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryEntityStore {
    async fn find_summary(&self, id: &UserId) -> Result<Option<UserSummary>, UserRepositoryError> {
        Ok(self.lock()?.users.get(id).map(|doc| doc.summary.clone()))
    }

    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(|doc| doc.summary.clone())
            .collect())
    }

    async fn push_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock()?;
        let Some(doc) = state.users.get_mut(user) else {
            return Ok(false);
        };
        if !doc.recipes_owned.contains(recipe) {
            doc.recipes_owned.push(recipe.clone());
        }
        Ok(true)
    }

    async fn find_owner_of(
        &self,
        recipe: &RecipeId,
    ) -> Result<Option<UserId>, UserRepositoryError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|(_, doc)| doc.recipes_owned.contains(recipe))
            .map(|(id, _)| id.clone()))
    }

    async fn pull_owned_recipe(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock()?;
        let Some(doc) = state.users.get_mut(user) else {
            return Ok(false);
        };
        let before = doc.recipes_owned.len();
        doc.recipes_owned.retain(|owned| owned != recipe);
        Ok(doc.recipes_owned.len() != before)
    }

    async fn pull_favorite_everywhere(
        &self,
        recipe: &RecipeId,
    ) -> Result<u64, UserRepositoryError> {
        let mut state = self.lock()?;
        let mut changed = 0_u64;
        for doc in state.users.values_mut() {
            let before = doc.favorites.len();
            doc.favorites.retain(|favorite| favorite != recipe);
            if doc.favorites.len() != before {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl CommentRepository for InMemoryEntityStore {
    async fn delete_by_recipe(&self, recipe: &RecipeId) -> Result<u64, CommentRepositoryError> {
        let mut state = self.lock()?;
        let before = state.comments.len();
        state.comments.retain(|_, target| target != recipe);
        let removed = before - state.comments.len();
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests;
