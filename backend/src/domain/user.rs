//! User references as seen by the recipe core.
//!
//! Users are owned by an external profile feature. The recipe core only
//! needs their identity and a display name to render owner and rater
//! summaries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::uuid_identifier;

uuid_identifier!(
    /// Stable user identifier stored as a UUID.
    UserId,
    "user"
);

/// Validation errors returned by [`DisplayName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayNameError {
    /// The display name was blank.
    #[error("display name must not be empty")]
    Empty,
    /// The display name exceeded [`DISPLAY_NAME_MAX`] characters.
    #[error("display name must be at most {max} characters")]
    TooLong { max: usize },
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, DisplayNameError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, DisplayNameError> {
        if display_name.trim().is_empty() {
            return Err(DisplayNameError::Empty);
        }
        if display_name.chars().count() > DISPLAY_NAME_MAX {
            return Err(DisplayNameError::TooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = DisplayNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Lightweight projection of a user used when resolving owners and raters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: DisplayName,
}

impl UserSummary {
    /// Build a summary from validated components.
    pub fn new(id: UserId, display_name: DisplayName) -> Self {
        Self { id, display_name }
    }
}
