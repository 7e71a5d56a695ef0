//! Tests for the rating aggregator.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::Utc;
use mockall::Sequence;
use rstest::{fixture, rstest};
use serde_json::{Map, json};

use super::*;
use crate::domain::ports::{MockRecipeRepository, MockUserRepository, UserRepositoryError};
use crate::domain::{
    DisplayName, ErrorCode, RatingAggregate, RecipeFields, RecipeRecord, RecipeType, UserSummary,
};

struct Ids {
    recipe: RecipeId,
    owner: UserId,
    rater: UserId,
}

#[fixture]
fn ids() -> Ids {
    Ids {
        recipe: RecipeId::random(),
        owner: UserId::random(),
        rater: UserId::random(),
    }
}

fn stored_recipe(ids: &Ids, raters: Vec<UserId>, average: f64) -> Recipe {
    let mut fields = Map::new();
    fields.insert("title".to_owned(), json!("Pancakes"));
    Recipe::rehydrate(RecipeRecord {
        id: ids.recipe.clone(),
        recipe_type: RecipeType::new("breakfast").expect("recipe type"),
        owner: ids.owner.clone(),
        people_rated: raters,
        average_rating: average,
        created_at: Utc::now(),
        fields: RecipeFields::new(fields).expect("fields"),
    })
    .expect("valid stored recipe")
}

fn summary(id: &UserId) -> UserSummary {
    UserSummary::new(id.clone(), DisplayName::new("Rater").expect("display name"))
}

fn users_with(id: &UserId) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    let found = summary(id);
    users
        .expect_find_summary()
        .return_once(move |_| Ok(Some(found)));
    users
}

fn rating(value: f64) -> Rating {
    Rating::new(value).expect("finite rating")
}

fn aggregator(
    recipes: MockRecipeRepository,
    users: MockUserRepository,
    max_attempts: u32,
) -> RatingAggregator<MockRecipeRepository, MockUserRepository> {
    let attempts = NonZeroU32::new(max_attempts).expect("non-zero attempts");
    RatingAggregator::with_policy(
        Arc::new(recipes),
        Arc::new(users),
        RatingRetryPolicy::new(attempts),
    )
}

#[rstest]
#[tokio::test]
async fn first_rating_becomes_the_average(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    let expected_rater = ids.rater.clone();
    recipes
        .expect_append_rating()
        .withf(move |_, expected, rater, aggregate| {
            *expected == 0
                && rater == &expected_rater
                && aggregate.raters() == 1
                && aggregate.average() == 4.0
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(()));

    let receipt = aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect("rating stored");

    assert_eq!(receipt.attempts, 1);
    assert_eq!(receipt.confirmation(), "Recipe rating saved successfully.");
}

#[rstest]
#[tokio::test]
async fn later_rating_folds_into_mean(ids: Ids) {
    let earlier = UserId::random();
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, vec![earlier], 4.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    recipes
        .expect_append_rating()
        .withf(|_, expected, _, aggregate| {
            *expected == 1 && *aggregate == RatingAggregate::new(3.0, 2)
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(()));

    aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(2.0))
        .await
        .expect("rating stored");
}

#[rstest]
#[case(f64::MAX, f64::MAX, f64::MAX)]
#[case(-f64::MAX, -f64::MAX, -f64::MAX)]
#[case(f64::MAX, -f64::MAX, 0.0)]
#[tokio::test]
async fn extreme_ratings_store_a_finite_average(
    ids: Ids,
    #[case] stored_average: f64,
    #[case] submitted: f64,
    #[case] expected: f64,
) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, vec![UserId::random()], stored_average);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    recipes
        .expect_append_rating()
        .withf(move |_, expected_raters, _, aggregate| {
            *expected_raters == 1
                && aggregate.raters() == 2
                && aggregate.average().is_finite()
                && aggregate.average() == expected
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(()));

    aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(submitted))
        .await
        .expect("rating stored");
}

#[rstest]
fn non_finite_fold_is_rejected_as_invalid_rating(ids: Ids) {
    type Aggregator = RatingAggregator<MockRecipeRepository, MockUserRepository>;
    let err = Aggregator::ensure_finite(
        &ids.recipe,
        rating(1.0),
        RatingAggregate::new(f64::INFINITY, 2),
    )
    .expect_err("non-finite average");

    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(
        err.details().and_then(|details| details.get("field")),
        Some(&json!("rating"))
    );
}

#[rstest]
#[tokio::test]
async fn missing_recipe_is_not_found(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    recipes.expect_find_by_id().return_once(|_| Ok(None));
    recipes.expect_append_rating().never();
    let mut users = MockUserRepository::new();
    users.expect_find_summary().never();

    let err = aggregator(recipes, users, 8)
        .submit(&ids.recipe, &ids.rater, rating(5.0))
        .await
        .expect_err("recipe missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn missing_user_is_not_found(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    recipes.expect_append_rating().never();
    let mut users = MockUserRepository::new();
    users.expect_find_summary().return_once(|_| Ok(None));

    let err = aggregator(recipes, users, 8)
        .submit(&ids.recipe, &ids.rater, rating(5.0))
        .await
        .expect_err("user missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), "user not found");
}

#[rstest]
#[tokio::test]
async fn repeat_rater_is_already_rated(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, vec![ids.rater.clone()], 4.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    recipes.expect_append_rating().never();

    let err = aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(1.0))
        .await
        .expect_err("already rated");

    assert_eq!(err.code(), ErrorCode::AlreadyRated);
}

#[rstest]
#[tokio::test]
async fn owner_cannot_rate(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    recipes.expect_append_rating().never();

    let err = aggregator(recipes, users_with(&ids.owner), 8)
        .submit(&ids.recipe, &ids.owner, rating(5.0))
        .await
        .expect_err("self rating");

    assert_eq!(err.code(), ErrorCode::SelfRatingForbidden);
}

#[rstest]
#[tokio::test]
async fn moved_count_rereads_and_retries(ids: Ids) {
    let competitor = UserId::random();
    let mut seq = Sequence::new();
    let mut recipes = MockRecipeRepository::new();

    let first_read = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(first_read)));
    recipes
        .expect_append_rating()
        .withf(|_, expected, _, _| *expected == 0)
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _, _, _| Err(RecipeRepositoryError::rater_count_mismatch(0_u32, 1_u32)));
    let second_read = stored_recipe(&ids, vec![competitor], 2.0);
    recipes
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(second_read)));
    recipes
        .expect_append_rating()
        .withf(|_, expected, _, aggregate| {
            *expected == 1 && *aggregate == RatingAggregate::new(3.0, 2)
        })
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _, _, _| Ok(()));

    let receipt = aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect("retry succeeds");

    assert_eq!(receipt.attempts, 2);
}

#[rstest]
#[tokio::test]
async fn concurrent_duplicate_ends_in_already_rated(ids: Ids) {
    let mut seq = Sequence::new();
    let mut recipes = MockRecipeRepository::new();

    let first_read = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(first_read)));
    recipes
        .expect_append_rating()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _, _, _| Err(RecipeRepositoryError::rater_count_mismatch(0_u32, 1_u32)));
    let second_read = stored_recipe(&ids, vec![ids.rater.clone()], 5.0);
    recipes
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(second_read)));

    let err = aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect_err("duplicate detected on retry");

    assert_eq!(err.code(), ErrorCode::AlreadyRated);
}

#[rstest]
#[tokio::test]
async fn exhausted_budget_is_conflict(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(Some(stored.clone())));
    recipes
        .expect_append_rating()
        .times(2)
        .returning(|_, _, _, _| Err(RecipeRepositoryError::rater_count_mismatch(0_u32, 1_u32)));

    let err = aggregator(recipes, users_with(&ids.rater), 2)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect_err("contention");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn recipe_deleted_mid_write_is_not_found(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    let missing = ids.recipe.to_string();
    recipes
        .expect_append_rating()
        .return_once(move |_, _, _, _| Err(RecipeRepositoryError::not_found(missing)));

    let err = aggregator(recipes, users_with(&ids.rater), 8)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect_err("deleted concurrently");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn user_store_failure_is_store_unavailable(ids: Ids) {
    let mut recipes = MockRecipeRepository::new();
    let stored = stored_recipe(&ids, Vec::new(), 0.0);
    recipes
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    let mut users = MockUserRepository::new();
    users
        .expect_find_summary()
        .return_once(|_| Err(UserRepositoryError::query("statement timeout")));

    let err = aggregator(recipes, users, 8)
        .submit(&ids.recipe, &ids.rater, rating(4.0))
        .await
        .expect_err("store failure");

    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    assert!(err.message().contains("statement timeout"));
}

#[rstest]
fn default_policy_allows_eight_attempts() {
    assert_eq!(RatingRetryPolicy::default().max_attempts().get(), 8);
}
