//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate with `diesel print-schema` or
//! update this file by hand.

diesel::table! {
    /// User documents with their recipe back-reference lists.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Human-readable display name (max 64 characters).
        display_name -> Varchar,
        /// Recipes this user created.
        recipes_owned -> Array<Uuid>,
        /// Recipes this user marked as favorite.
        favorites -> Array<Uuid>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recipe documents. A non-null `deleted_at` marks a tombstone.
    recipes (id) {
        id -> Uuid,
        recipe_type -> Text,
        owner_id -> Uuid,
        /// Raters in submission order; `cardinality` is the rater count.
        people_rated -> Array<Uuid>,
        average_rating -> Float8,
        /// Opaque caller payload, always a JSON object.
        fields -> Jsonb,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Comments attached to recipes.
    comments (id) {
        id -> Uuid,
        recipe_id -> Uuid,
        author_id -> Nullable<Uuid>,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(comments, recipes, users);
