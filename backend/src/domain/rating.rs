//! Incremental rating aggregation.
//!
//! Individual rating values are never stored. A recipe keeps only the running
//! mean and the set of users who contributed to it, so the mean is advanced
//! as a pure function of the previous mean, the previous rater count, and the
//! incoming value.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised by [`Rating::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RatingError {
    /// NaN or an infinity would poison every later mean.
    #[error("rating must be a finite number (got {value})")]
    NotFinite { value: f64 },
}

/// A single submitted rating.
///
/// Scale bounds are enforced by whatever validates requests before they
/// reach the recipe core; any finite value is accepted and folded as-is.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Validate and wrap a raw rating value.
    ///
    /// # Examples
    /// ```
    /// use recipes::domain::Rating;
    ///
    /// assert_eq!(Rating::new(4.5).expect("finite").value(), 4.5);
    /// assert!(Rating::new(f64::NAN).is_err());
    /// ```
    pub fn new(value: f64) -> Result<Self, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::NotFinite { value });
        }
        Ok(Self(value))
    }

    /// Raw rating value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Rating> for f64 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Running mean over the ratings contributed by a recipe's raters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    average: f64,
    raters: u32,
}

impl RatingAggregate {
    /// Aggregate with no contributions.
    pub const EMPTY: Self = Self {
        average: 0.0,
        raters: 0,
    };

    /// Reconstruct an aggregate from stored state.
    ///
    /// `raters` must be the length of the recipe's rater set.
    pub fn new(average: f64, raters: u32) -> Self {
        Self { average, raters }
    }

    /// Current mean.
    pub fn average(self) -> f64 {
        self.average
    }

    /// Number of ratings folded into the mean.
    pub fn raters(self) -> u32 {
        self.raters
    }

    /// Fold one more rating into the mean.
    ///
    /// Computes `A + (r - A) / (n + 1)` with both terms scaled before the
    /// subtraction, so values near `f64::MAX` never overflow. Reduces to `r`
    /// when `n == 0`.
    ///
    /// # Examples
    /// ```
    /// use recipes::domain::{Rating, RatingAggregate};
    ///
    /// let first = RatingAggregate::EMPTY.fold(Rating::new(4.0).expect("finite"));
    /// let second = first.fold(Rating::new(2.0).expect("finite"));
    /// assert_eq!(second.average(), 3.0);
    /// assert_eq!(second.raters(), 2);
    /// ```
    #[must_use]
    pub fn fold(self, rating: Rating) -> Self {
        let weight = f64::from(self.raters) + 1.0;
        let average = if self.raters == 0 {
            rating.value()
        } else {
            self.average + (rating.value() / weight - self.average / weight)
        };
        Self {
            average,
            raters: self.raters.saturating_add(1),
        }
    }
}
