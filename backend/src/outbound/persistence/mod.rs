//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the recipe, user, and comment ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module; adapters translate them into domain types and map every
//! database failure onto the owning port's error.
//!
//! # Example
//!
//! ```ignore
//! use recipes::outbound::persistence::{DbPool, DieselRecipeRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/recipes")).await?;
//! let recipes = DieselRecipeRepository::new(pool);
//! ```

mod diesel_comment_repository;
pub(crate) mod diesel_helpers;
mod diesel_recipe_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_recipe_repository::DieselRecipeRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
