//! Recipe aggregate and its read models.
//!
//! A recipe is the authoritative root of the document graph: user
//! `recipesOwned`/`favorites` lists and comments only ever point at it.
//!
//! ## Invariants
//! - `people_rated` never contains `owner`.
//! - `people_rated` has no duplicates.
//! - `average_rating` is finite and is the mean of exactly the ratings
//!   contributed by `people_rated`; it is only ever advanced through
//!   [`crate::domain::RatingAggregate::fold`].

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identifier::uuid_identifier;
use super::{RatingAggregate, UserId};

mod fields;
mod views;

pub use fields::{RESERVED_KEYS, RecipeDraft, RecipeFields, RecipePatch};
pub use views::{RecipeDetails, RecipeListing};

uuid_identifier!(
    /// Stable recipe identifier stored as a UUID.
    RecipeId,
    "recipe"
);

uuid_identifier!(
    /// Stable comment identifier stored as a UUID.
    CommentId,
    "comment"
);

/// Validation errors raised while building or rehydrating recipes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecipeValidationError {
    /// The category tag was blank.
    #[error("recipe type must not be empty")]
    EmptyType,
    /// The category tag had surrounding whitespace.
    #[error("recipe type must not contain surrounding whitespace")]
    PaddedType,
    /// The category tag was not a string.
    #[error("recipe type must be a string")]
    InvalidType,
    /// A draft did not carry a category tag.
    #[error("recipe type is required")]
    MissingType,
    /// The payload was not a JSON object.
    #[error("recipe payload must be a JSON object")]
    PayloadNotObject,
    /// The payload tried to set a field managed by the recipe core.
    #[error("field `{field}` cannot be set by callers")]
    ReservedField { field: String },
    /// A draft did not carry a title.
    #[error("recipe title is required")]
    MissingTitle,
    /// The title was not a non-empty string.
    #[error("recipe title must be a non-empty string")]
    InvalidTitle,
    /// A patch tried to remove the title.
    #[error("recipe title cannot be removed")]
    TitleRemoval,
    /// Stored raters include the owner.
    #[error("recipe owner {owner} appears among its raters")]
    OwnerAmongRaters { owner: UserId },
    /// Stored raters include the same user twice.
    #[error("user {user} appears more than once among the raters")]
    DuplicateRater { user: UserId },
    /// Stored average is NaN or infinite.
    #[error("average rating must be finite (got {value})")]
    NonFiniteAverage { value: f64 },
}

/// Category tag used to group recipes in listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipeType(String);

impl RecipeType {
    /// Validate and construct a category tag.
    pub fn new(value: impl Into<String>) -> Result<Self, RecipeValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(RecipeValidationError::EmptyType);
        }
        if raw.trim() != raw {
            return Err(RecipeValidationError::PaddedType);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for RecipeType {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RecipeType> for String {
    fn from(value: RecipeType) -> Self {
        value.0
    }
}

impl TryFrom<String> for RecipeType {
    type Error = RecipeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stored state of a recipe, as read back from a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord {
    pub id: RecipeId,
    pub recipe_type: RecipeType,
    pub owner: UserId,
    pub people_rated: Vec<UserId>,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub fields: RecipeFields,
}

/// A user-authored recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecipeDto", into = "RecipeDto")]
pub struct Recipe {
    id: RecipeId,
    recipe_type: RecipeType,
    owner: UserId,
    people_rated: Vec<UserId>,
    average_rating: f64,
    created_at: DateTime<Utc>,
    fields: RecipeFields,
}

impl Recipe {
    /// Build a freshly created recipe with no raters.
    pub fn create(
        id: RecipeId,
        draft: RecipeDraft,
        owner: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let RecipeDraft {
            recipe_type,
            fields,
        } = draft;
        Self {
            id,
            recipe_type,
            owner,
            people_rated: Vec::new(),
            average_rating: 0.0,
            created_at,
            fields,
        }
    }

    /// Rebuild a recipe from stored state, checking the rater invariants.
    pub fn rehydrate(record: RecipeRecord) -> Result<Self, RecipeValidationError> {
        let RecipeRecord {
            id,
            recipe_type,
            owner,
            people_rated,
            average_rating,
            created_at,
            fields,
        } = record;

        if !average_rating.is_finite() {
            return Err(RecipeValidationError::NonFiniteAverage {
                value: average_rating,
            });
        }
        let mut seen = HashSet::with_capacity(people_rated.len());
        for rater in &people_rated {
            if rater == &owner {
                return Err(RecipeValidationError::OwnerAmongRaters { owner });
            }
            if !seen.insert(rater) {
                return Err(RecipeValidationError::DuplicateRater {
                    user: rater.clone(),
                });
            }
        }

        Ok(Self {
            id,
            recipe_type,
            owner,
            people_rated,
            average_rating,
            created_at,
            fields,
        })
    }

    /// Stable identifier.
    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    /// Category tag.
    pub fn recipe_type(&self) -> &RecipeType {
        &self.recipe_type
    }

    /// User who created the recipe.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Users who have rated the recipe, in submission order.
    pub fn people_rated(&self) -> &[UserId] {
        &self.people_rated
    }

    /// Mean of every submitted rating; `0.0` until the first rating lands.
    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Opaque payload fields.
    pub fn fields(&self) -> &RecipeFields {
        &self.fields
    }

    /// Whether `user` owns this recipe.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Whether `user` already contributed a rating.
    pub fn has_rated(&self, user: &UserId) -> bool {
        self.people_rated.contains(user)
    }

    /// Current aggregate; the rater count is always `people_rated.len()`.
    pub fn rating_aggregate(&self) -> RatingAggregate {
        let raters = u32::try_from(self.people_rated.len()).unwrap_or(u32::MAX);
        RatingAggregate::new(self.average_rating, raters)
    }

    /// Apply a payload patch, returning the edited recipe.
    #[must_use]
    pub fn patched(&self, patch: &RecipePatch) -> Self {
        let mut edited = self.clone();
        if let Some(recipe_type) = patch.recipe_type() {
            edited.recipe_type = recipe_type.clone();
        }
        edited.fields = self.fields.merged(patch);
        edited
    }

    /// Record a new rater together with the already-folded aggregate.
    ///
    /// Adapters call this after their conditional write succeeded; the rater
    /// invariants were checked by the aggregator beforehand.
    #[must_use]
    pub fn with_rating(&self, rater: UserId, aggregate: RatingAggregate) -> Self {
        let mut rated = self.clone();
        rated.people_rated.push(rater);
        rated.average_rating = aggregate.average();
        rated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeDto {
    id: RecipeId,
    #[serde(rename = "type")]
    recipe_type: RecipeType,
    owner: UserId,
    people_rated: Vec<UserId>,
    average_rating: f64,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    fields: RecipeFields,
}

impl From<Recipe> for RecipeDto {
    fn from(value: Recipe) -> Self {
        Self {
            id: value.id,
            recipe_type: value.recipe_type,
            owner: value.owner,
            people_rated: value.people_rated,
            average_rating: value.average_rating,
            created_at: value.created_at,
            fields: value.fields,
        }
    }
}

impl TryFrom<RecipeDto> for Recipe {
    type Error = RecipeValidationError;

    fn try_from(value: RecipeDto) -> Result<Self, Self::Error> {
        Recipe::rehydrate(RecipeRecord {
            id: value.id,
            recipe_type: value.recipe_type,
            owner: value.owner,
            people_rated: value.people_rated,
            average_rating: value.average_rating,
            created_at: value.created_at,
            fields: value.fields,
        })
    }
}
