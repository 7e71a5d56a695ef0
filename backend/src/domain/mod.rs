//! Domain primitives, aggregates and services for the recipe core.
//!
//! Purpose: define the strongly typed recipe, rating and user types, the
//! ports the core depends on, and the services that enforce the rater and
//! back-reference invariants. Keep types immutable and document invariants
//! and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: typed failure returned by every operation.
//! - [`Recipe`], [`RecipeDraft`], [`RecipePatch`]: the recipe aggregate and
//!   its validated payloads.
//! - [`RatingAggregate`]: pure running-mean fold.
//! - [`RecipeService`]: façade implementing [`ports::RecipeQuery`] and
//!   [`ports::RecipeCommand`].

pub mod error;
mod identifier;
pub mod ports;
pub mod rating;
mod rating_service;
pub mod recipe;
mod recipe_deletion;
mod recipe_service;
mod recipe_service_support;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identifier::IdentifierError;
pub use self::rating::{Rating, RatingAggregate, RatingError};
pub use self::rating_service::{DEFAULT_RATING_ATTEMPTS, RatingAggregator, RatingRetryPolicy};
pub use self::recipe::{
    CommentId, RESERVED_KEYS, Recipe, RecipeDetails, RecipeDraft, RecipeFields, RecipeId,
    RecipeListing, RecipePatch, RecipeRecord, RecipeType, RecipeValidationError,
};
pub use self::recipe_deletion::RecipeDeletionCoordinator;
pub use self::recipe_service::RecipeService;
pub use self::user::{DisplayName, DisplayNameError, UserId, UserSummary};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use recipes::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("recipe not found"))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
