//! Shared helpers for the recipe services: identifier parsing and mapping of
//! store adapter errors into domain errors.
//!
//! Store failures keep the adapter's own message. Nothing here adds context
//! that would blur "the store is down" into "the recipe is missing" or vice
//! versa.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::{CommentRepositoryError, RecipeRepositoryError, UserRepositoryError};
use crate::domain::{IdentifierError, RecipeId, RecipeValidationError, UserId};

fn invalid_identifier(field: &str, raw: &str, error: &IdentifierError) -> Error {
    Error::invalid_argument(error.to_string()).with_details(json!({
        "field": field,
        "value": raw,
        "code": "invalid_identifier",
    }))
}

/// Parse a caller-supplied recipe identifier.
pub(crate) fn parse_recipe_id(raw: &str) -> Result<RecipeId, Error> {
    RecipeId::new(raw).map_err(|err| invalid_identifier("recipeId", raw, &err))
}

/// Parse a caller-supplied user identifier.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| invalid_identifier("userId", raw, &err))
}

/// Map a payload validation failure to `InvalidArgument`.
pub(crate) fn invalid_payload(error: &RecipeValidationError) -> Error {
    Error::invalid_argument(error.to_string()).with_details(json!({
        "code": "invalid_payload",
    }))
}

/// `NotFound` for a recipe identifier.
pub(crate) fn recipe_not_found(recipe_id: &RecipeId) -> Error {
    Error::not_found("recipe not found").with_details(json!({
        "recipeId": recipe_id,
        "code": "recipe_not_found",
    }))
}

/// `NotFound` for a user identifier.
pub(crate) fn user_not_found(user_id: &UserId) -> Error {
    Error::not_found("user not found").with_details(json!({
        "userId": user_id,
        "code": "user_not_found",
    }))
}

pub(crate) fn map_recipe_error(error: RecipeRepositoryError) -> Error {
    match error {
        RecipeRepositoryError::Connection { .. } | RecipeRepositoryError::Query { .. } => {
            Error::store_unavailable(error.to_string())
        }
        RecipeRepositoryError::Corrupt { .. } => Error::internal(error.to_string()),
        RecipeRepositoryError::RaterCountMismatch { expected, actual } => {
            Error::conflict(error.to_string()).with_details(json!({
                "expectedRaters": expected,
                "actualRaters": actual,
                "code": "rater_count_mismatch",
            }))
        }
        RecipeRepositoryError::NotFound { recipe_id } => {
            Error::not_found("recipe not found").with_details(json!({
                "recipeId": recipe_id,
                "code": "recipe_not_found",
            }))
        }
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    Error::store_unavailable(error.to_string())
}

pub(crate) fn map_comment_error(error: CommentRepositoryError) -> Error {
    Error::store_unavailable(error.to_string())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("42")]
    #[case("507f1f77bcf86cd799439011")]
    fn malformed_recipe_ids_are_invalid_arguments(#[case] raw: &str) {
        let err = parse_recipe_id(raw).expect_err("malformed id");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(
            err.details().and_then(|details| details.get("field")),
            Some(&json!("recipeId"))
        );
    }

    #[rstest]
    fn store_failures_keep_adapter_message() {
        let err = map_user_error(UserRepositoryError::connection("socket closed"));
        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
        assert_eq!(
            err.message(),
            "user repository connection failed: socket closed"
        );
    }

    #[rstest]
    #[case(RecipeRepositoryError::connection("down"), ErrorCode::StoreUnavailable)]
    #[case(RecipeRepositoryError::query("syntax"), ErrorCode::StoreUnavailable)]
    #[case(RecipeRepositoryError::corrupt("id", "dup"), ErrorCode::InternalError)]
    #[case(RecipeRepositoryError::rater_count_mismatch(1_u32, 2_u32), ErrorCode::Conflict)]
    #[case(RecipeRepositoryError::not_found("id"), ErrorCode::NotFound)]
    fn recipe_errors_keep_their_kind(#[case] error: RecipeRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_recipe_error(error).code(), code);
    }
}
