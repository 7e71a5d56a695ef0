//! Behaviour tests for rating submission over the in-memory store.

use std::cell::RefCell;
use std::sync::Arc;

use recipes::domain::ports::{RatingReceipt, RecipeCommand, RecipeQuery};
use recipes::domain::{Error, RecipeId, UserId};
use recipes::outbound::memory::InMemoryEntityStore;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use tokio::runtime::Runtime;

mod support;

use support::{MemoryService, memory_service, seed_user};

struct RatingWorld {
    runtime: Runtime,
    store: Arc<InMemoryEntityStore>,
    service: MemoryService,
    chef: RefCell<Option<UserId>>,
    recipe: RefCell<Option<RecipeId>>,
    last_diner: RefCell<Option<UserId>>,
    outcome: RefCell<Option<Result<RatingReceipt, Error>>>,
}

impl RatingWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let store = Arc::new(InMemoryEntityStore::new());
        let service = memory_service(&store);
        Self {
            runtime,
            store,
            service,
            chef: RefCell::new(None),
            recipe: RefCell::new(None),
            last_diner: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn rate(&self, user: &UserId, rating: f64) {
        let recipe = self.recipe.borrow().clone().expect("recipe created");
        let outcome = self.runtime.block_on(self.service.submit_rating(
            &recipe.to_string(),
            &user.to_string(),
            rating,
        ));
        *self.outcome.borrow_mut() = Some(outcome);
    }
}

#[fixture]
fn world() -> RatingWorld {
    RatingWorld::new()
}

#[given("a recipe owned by a chef")]
fn a_recipe_owned_by_a_chef(world: &RatingWorld) {
    let chef = seed_user(&world.store, "Chef");
    let recipe = world
        .runtime
        .block_on(world.service.create(
            json!({ "type": "main", "title": "Cassoulet" }),
            &chef.to_string(),
        ))
        .expect("recipe created");
    *world.chef.borrow_mut() = Some(chef);
    *world.recipe.borrow_mut() = Some(recipe.id().clone());
}

#[when("a new diner rates the recipe {rating}")]
fn a_new_diner_rates_the_recipe(world: &RatingWorld, rating: f64) {
    let diner = seed_user(&world.store, "Diner");
    world.rate(&diner, rating);
    assert!(
        matches!(world.outcome.borrow().as_ref(), Some(Ok(_))),
        "first rating by a diner should succeed"
    );
    *world.last_diner.borrow_mut() = Some(diner);
}

#[when("the same diner rates the recipe {rating}")]
fn the_same_diner_rates_the_recipe(world: &RatingWorld, rating: f64) {
    let diner = world.last_diner.borrow().clone().expect("a diner rated");
    world.rate(&diner, rating);
}

#[when("the chef rates the recipe {rating}")]
fn the_chef_rates_the_recipe(world: &RatingWorld, rating: f64) {
    let chef = world.chef.borrow().clone().expect("chef seeded");
    world.rate(&chef, rating);
}

#[then("the rating fails with code {code}")]
fn the_rating_fails_with_code(world: &RatingWorld, code: String) {
    let outcome = world.outcome.borrow();
    let error = match outcome.as_ref().expect("a rating ran") {
        Ok(receipt) => panic!("expected rating to fail, got {receipt:?}"),
        Err(error) => error,
    };
    assert_eq!(
        serde_json::to_value(error.code()).expect("code serialises"),
        json!(code)
    );
}

#[then("the recipe average is {average} across {raters} raters")]
fn the_recipe_average_is(world: &RatingWorld, average: f64, raters: usize) {
    let recipe = world.recipe.borrow().clone().expect("recipe created");
    let stored = world
        .runtime
        .block_on(world.service.owner_record(&recipe.to_string()))
        .expect("recipe readable");
    assert!(
        (stored.average_rating() - average).abs() < 1e-9,
        "expected average {average}, got {}",
        stored.average_rating()
    );
    assert_eq!(stored.people_rated().len(), raters);
}

#[scenario(path = "tests/features/rating_submission.feature")]
fn rating_submission_scenarios(world: RatingWorld) {
    drop(world);
}
