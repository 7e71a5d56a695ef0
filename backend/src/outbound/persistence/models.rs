//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{recipes, users};

/// Row struct for reading a live recipe.
///
/// Also loadable by name so `RETURNING` clauses of raw updates map onto it.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeRow {
    pub id: Uuid,
    pub recipe_type: String,
    pub owner_id: Uuid,
    pub people_rated: Vec<Uuid>,
    pub average_rating: f64,
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating recipe records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipes)]
pub(crate) struct NewRecipeRow<'a> {
    pub id: Uuid,
    pub recipe_type: &'a str,
    pub owner_id: Uuid,
    pub people_rated: Vec<Uuid>,
    pub average_rating: f64,
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Minimal projection used to tell a tombstone from a stale rater count.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeStateRow {
    pub people_rated: Vec<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Projection of a user onto its display summary.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserSummaryRow {
    pub id: Uuid,
    pub display_name: String,
}
