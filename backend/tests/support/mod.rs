//! Shared helpers for recipe integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module gives them one way to build a service over the in-memory store and
//! to seed users.

#![allow(
    dead_code,
    reason = "each integration test crate uses a different subset of helpers"
)]

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use recipes::domain::{DisplayName, RecipeService, UserId, UserSummary};
use recipes::outbound::memory::InMemoryEntityStore;

/// Service wired entirely to one in-memory store.
pub type MemoryService =
    RecipeService<InMemoryEntityStore, InMemoryEntityStore, InMemoryEntityStore>;

/// Clock pinned to a fixed instant.
pub struct FixtureClock {
    pub utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// 2026-03-01T12:00:00Z.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Build a service over `store` with a fixed clock.
pub fn memory_service(store: &Arc<InMemoryEntityStore>) -> MemoryService {
    RecipeService::new(
        Arc::clone(store),
        Arc::clone(store),
        Arc::clone(store),
        Arc::new(FixtureClock {
            utc_now: fixture_now(),
        }),
    )
}

/// Seed a user called `name` and return its id.
pub fn seed_user(store: &InMemoryEntityStore, name: &str) -> UserId {
    let id = UserId::random();
    store
        .seed_user(UserSummary::new(
            id.clone(),
            DisplayName::new(name).expect("display name"),
        ))
        .expect("seed user");
    id
}
