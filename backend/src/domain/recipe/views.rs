//! Read models that resolve recipe references into user summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Recipe, RecipeFields, RecipeId, RecipeType};
use crate::domain::UserSummary;

/// A recipe with its owner and raters resolved to display summaries.
///
/// References to users that no longer exist are treated as absent: a missing
/// owner yields `owner: None` and missing raters are left out of
/// `people_rated`. The rater count used for aggregation is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    pub id: RecipeId,
    #[serde(rename = "type")]
    pub recipe_type: RecipeType,
    pub owner: Option<UserSummary>,
    pub people_rated: Vec<UserSummary>,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: RecipeFields,
}

impl RecipeDetails {
    /// Combine a recipe with the summaries resolved for it.
    ///
    /// Rater summaries are reordered to follow the recipe's rating order.
    pub fn resolve(recipe: Recipe, owner: Option<UserSummary>, raters: Vec<UserSummary>) -> Self {
        let mut people_rated = Vec::with_capacity(raters.len());
        for rater_id in recipe.people_rated() {
            if let Some(summary) = raters.iter().find(|summary| &summary.id == rater_id) {
                people_rated.push(summary.clone());
            }
        }

        Self {
            id: recipe.id().clone(),
            recipe_type: recipe.recipe_type().clone(),
            owner,
            people_rated,
            average_rating: recipe.average_rating(),
            created_at: recipe.created_at(),
            fields: recipe.fields().clone(),
        }
    }
}

/// A recipe as shown in a paginated listing: the stored document plus the
/// owner's summary when the owner still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeListing {
    pub recipe: Recipe,
    pub owner: Option<UserSummary>,
}
