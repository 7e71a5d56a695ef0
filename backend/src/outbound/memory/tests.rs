//! Tests for the in-process entity store.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::{DisplayName, RecipeDraft};

#[fixture]
fn store() -> InMemoryEntityStore {
    InMemoryEntityStore::new()
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn recipe_of(recipe_type: &str, owner: &UserId, minutes: i64) -> Recipe {
    let draft = RecipeDraft::from_value(json!({ "type": recipe_type, "title": "Soup" }))
        .expect("valid draft");
    Recipe::create(
        RecipeId::random(),
        draft,
        owner.clone(),
        base_time() + TimeDelta::minutes(minutes),
    )
}

fn seeded_user(store: &InMemoryEntityStore, name: &str) -> UserId {
    let id = UserId::random();
    store
        .seed_user(UserSummary::new(
            id.clone(),
            DisplayName::new(name).expect("display name"),
        ))
        .expect("seed user");
    id
}

#[rstest]
#[tokio::test]
async fn delete_leaves_tombstone(store: InMemoryEntityStore) {
    let recipe = recipe_of("soup", &UserId::random(), 0);
    store.insert(&recipe).await.expect("insert");

    let first = store.delete(recipe.id()).await.expect("first delete");
    let second = store.delete(recipe.id()).await.expect("second delete");
    let unknown = store.delete(&RecipeId::random()).await.expect("unknown");

    assert_eq!(first, RecipeDeletion::Deleted);
    assert_eq!(second, RecipeDeletion::AlreadyDeleted);
    assert_eq!(unknown, RecipeDeletion::NotFound);
    assert!(
        store
            .find_by_id(recipe.id())
            .await
            .expect("lookup")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn tombstoned_id_cannot_be_reinserted(store: InMemoryEntityStore) {
    let recipe = recipe_of("soup", &UserId::random(), 0);
    store.insert(&recipe).await.expect("insert");
    store.delete(recipe.id()).await.expect("delete");

    let err = store.insert(&recipe).await.expect_err("reinsert");
    assert!(matches!(err, RecipeRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn list_is_newest_first_and_paged(store: InMemoryEntityStore) {
    let owner = UserId::random();
    let oldest = recipe_of("soup", &owner, 0);
    let middle = recipe_of("soup", &owner, 5);
    let newest = recipe_of("soup", &owner, 10);
    let other = recipe_of("salad", &owner, 20);
    for recipe in [&oldest, &middle, &newest, &other] {
        store.insert(recipe).await.expect("insert");
    }
    let soup = RecipeType::new("soup").expect("type");

    let first_page = store.list_by_type(&soup, 0, 2).await.expect("first page");
    let second_page = store.list_by_type(&soup, 2, 2).await.expect("second page");

    let ids = |page: &[Recipe]| page.iter().map(|r| r.id().clone()).collect::<Vec<_>>();
    assert_eq!(
        ids(&first_page),
        vec![newest.id().clone(), middle.id().clone()]
    );
    assert_eq!(ids(&second_page), vec![oldest.id().clone()]);
    assert_eq!(store.count_by_type(&soup).await.expect("count"), 3);
}

#[rstest]
#[tokio::test]
async fn append_rating_checks_rater_count(store: InMemoryEntityStore) {
    let recipe = recipe_of("soup", &UserId::random(), 0);
    store.insert(&recipe).await.expect("insert");
    let rater = UserId::random();
    let aggregate = RatingAggregate::new(4.0, 1);

    let stale = store
        .append_rating(recipe.id(), 1, &rater, aggregate)
        .await
        .expect_err("stale count");
    assert_eq!(
        stale,
        RecipeRepositoryError::rater_count_mismatch(1_u32, 0_u32)
    );

    store
        .append_rating(recipe.id(), 0, &rater, aggregate)
        .await
        .expect("fresh count");
    let stored = store
        .find_by_id(recipe.id())
        .await
        .expect("lookup")
        .expect("recipe present");
    assert_eq!(stored.people_rated(), [rater].as_slice());
    assert_eq!(stored.average_rating(), 4.0);
}

#[rstest]
#[tokio::test]
async fn append_rating_on_missing_recipe_is_not_found(store: InMemoryEntityStore) {
    let err = store
        .append_rating(
            &RecipeId::random(),
            0,
            &UserId::random(),
            RatingAggregate::EMPTY,
        )
        .await
        .expect_err("missing recipe");
    assert!(matches!(err, RecipeRepositoryError::NotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn pull_favorite_touches_every_user(store: InMemoryEntityStore) {
    let recipe = RecipeId::random();
    let keep = RecipeId::random();
    let first = seeded_user(&store, "Ada");
    let second = seeded_user(&store, "Grace");
    let bystander = seeded_user(&store, "Linus");
    for user in [&first, &second] {
        store.add_favorite(user, &recipe).expect("favorite");
    }
    store.add_favorite(&bystander, &keep).expect("favorite");

    let changed = store
        .pull_favorite_everywhere(&recipe)
        .await
        .expect("pull favorites");

    assert_eq!(changed, 2);
    assert!(store.favorites_of(&first).expect("favorites").is_empty());
    assert_eq!(store.favorites_of(&bystander).expect("favorites"), vec![keep]);
}

#[rstest]
#[tokio::test]
async fn ownership_back_reference_round_trip(store: InMemoryEntityStore) {
    let owner = seeded_user(&store, "Ada");
    let recipe = RecipeId::random();

    assert!(store.push_owned_recipe(&owner, &recipe).await.expect("push"));
    assert_eq!(
        store.find_owner_of(&recipe).await.expect("find owner"),
        Some(owner.clone())
    );
    assert!(store.pull_owned_recipe(&owner, &recipe).await.expect("pull"));
    assert!(!store.pull_owned_recipe(&owner, &recipe).await.expect("pull again"));
    assert!(store.find_owner_of(&recipe).await.expect("find owner").is_none());
}

#[rstest]
#[tokio::test]
async fn push_owned_recipe_reports_unknown_user(store: InMemoryEntityStore) {
    let pushed = store
        .push_owned_recipe(&UserId::random(), &RecipeId::random())
        .await
        .expect("push");
    assert!(!pushed);
}

#[rstest]
#[tokio::test]
async fn find_summaries_skips_unknown_users(store: InMemoryEntityStore) {
    let known = seeded_user(&store, "Ada");
    let summaries = store
        .find_summaries(&[known.clone(), UserId::random()])
        .await
        .expect("summaries");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries.first().map(|s| &s.id), Some(&known));
}

#[rstest]
#[tokio::test]
async fn delete_by_recipe_counts_removed_comments(store: InMemoryEntityStore) {
    let recipe = RecipeId::random();
    let other = RecipeId::random();
    store.seed_comment(&recipe).expect("comment");
    store.seed_comment(&recipe).expect("comment");
    store.seed_comment(&other).expect("comment");

    let removed = store.delete_by_recipe(&recipe).await.expect("delete");

    assert_eq!(removed, 2);
    assert_eq!(store.comments_on(&recipe).expect("count"), 0);
    assert_eq!(store.comments_on(&other).expect("count"), 1);
}
