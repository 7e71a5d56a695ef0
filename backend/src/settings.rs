//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `RECIPES_*` environment variables or configuration files.
//! The admin CLI parses its own arguments with clap and loads these settings
//! from an empty argument list so the two parsers never compete.

use std::num::NonZeroU32;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_RATING_ATTEMPTS, RatingRetryPolicy};

/// Configuration for the recipe store and the rating write loop.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPES")]
pub struct RecipeSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Conditional-write attempts allowed per rating submission.
    #[ortho_config(default = 8)]
    pub rating_max_attempts: u32,
}

impl RecipeSettings {
    /// Retry policy for rating submissions.
    ///
    /// A configured zero falls back to the default budget.
    pub fn rating_policy(&self) -> RatingRetryPolicy {
        let attempts = NonZeroU32::new(self.rating_max_attempts).unwrap_or(DEFAULT_RATING_ATTEMPTS);
        RatingRetryPolicy::new(attempts)
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
