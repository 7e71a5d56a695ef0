//! Driving port for recipe reads.
//!
//! Inbound adapters pass identifiers through as raw strings; the domain
//! validates them before touching any store so malformed input fails fast
//! with [`crate::domain::ErrorCode::InvalidArgument`].

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Error, Recipe, RecipeDetails, RecipeListing};

/// Domain use-case port for reading recipes.
#[async_trait]
pub trait RecipeQuery: Send + Sync {
    /// Return one page of recipes of `recipe_type`, newest first, together
    /// with the total number of matching recipes.
    async fn list_by_type(
        &self,
        recipe_type: &str,
        page: PageRequest,
    ) -> Result<Page<RecipeListing>, Error>;

    /// Return the stored recipe document, used upstream for ownership checks.
    async fn owner_record(&self, recipe_id: &str) -> Result<Recipe, Error>;

    /// Return the recipe with owner and raters resolved to summaries.
    async fn detailed(&self, recipe_id: &str) -> Result<RecipeDetails, Error>;
}
