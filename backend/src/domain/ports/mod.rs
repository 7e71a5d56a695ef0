//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`*Repository`) describe the entity store collections the
//! recipe core depends on. Each exposes a strongly typed error so adapters
//! map their failures into predictable variants. Driving ports
//! ([`RecipeQuery`], [`RecipeCommand`]) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod comment_repository;
mod recipe_command;
mod recipe_query;
mod recipe_repository;
mod user_repository;

pub use comment_repository::{CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use comment_repository::{FixtureCommentRepository, MockCommentRepository};
pub use recipe_command::{RatingReceipt, RecipeCommand, RecipeRemoval, RemovalOutcome};
pub use recipe_query::RecipeQuery;
#[cfg(test)]
pub use recipe_repository::MockRecipeRepository;
pub use recipe_repository::{RecipeDeletion, RecipeRepository, RecipeRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
