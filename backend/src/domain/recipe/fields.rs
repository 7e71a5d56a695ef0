//! Free-form recipe payload and partial updates over it.
//!
//! The recipe core treats title, ingredients, steps and the rest as an opaque
//! JSON object. It only guards the keys that belong to the core itself so a
//! payload can never smuggle in an owner, raters, or a derived average.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RecipeType, RecipeValidationError};

/// Keys managed by the recipe core that payloads may never carry.
pub const RESERVED_KEYS: &[&str] = &[
    "id",
    "_id",
    "owner",
    "peopleRated",
    "averageRating",
    "createdAt",
    "type",
];

const TITLE_KEY: &str = "title";
const TYPE_KEY: &str = "type";
const OWNER_KEY: &str = "owner";

fn expect_object(value: Value) -> Result<Map<String, Value>, RecipeValidationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RecipeValidationError::PayloadNotObject),
    }
}

fn check_title(value: &Value) -> Result<(), RecipeValidationError> {
    match value {
        Value::String(title) if !title.trim().is_empty() => Ok(()),
        _ => Err(RecipeValidationError::InvalidTitle),
    }
}

fn take_recipe_type(
    map: &mut Map<String, Value>,
) -> Result<Option<RecipeType>, RecipeValidationError> {
    match map.remove(TYPE_KEY) {
        None => Ok(None),
        Some(Value::String(raw)) => RecipeType::new(raw).map(Some),
        Some(_) => Err(RecipeValidationError::InvalidType),
    }
}

/// Opaque payload fields of a recipe.
///
/// ## Invariants
/// - No key from [`RESERVED_KEYS`] is present.
/// - `title`, when present, is a non-empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct RecipeFields(Map<String, Value>);

impl RecipeFields {
    /// Validate a payload object.
    pub fn new(map: Map<String, Value>) -> Result<Self, RecipeValidationError> {
        if let Some(key) = RESERVED_KEYS.iter().find(|key| map.contains_key(**key)) {
            return Err(RecipeValidationError::ReservedField {
                field: (*key).to_owned(),
            });
        }
        if let Some(title) = map.get(TITLE_KEY) {
            check_title(title)?;
        }
        Ok(Self(map))
    }

    /// Recipe title, if one is set.
    pub fn title(&self) -> Option<&str> {
        self.0.get(TITLE_KEY).and_then(Value::as_str)
    }

    /// Look up a single payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the payload as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Produce the payload that results from applying `patch`.
    #[must_use]
    pub fn merged(&self, patch: &RecipePatch) -> Self {
        let mut map = self.0.clone();
        for key in &patch.unset {
            map.remove(key);
        }
        for (key, value) in &patch.set {
            map.insert(key.clone(), value.clone());
        }
        Self(map)
    }
}

impl TryFrom<Map<String, Value>> for RecipeFields {
    type Error = RecipeValidationError;

    fn try_from(value: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecipeFields> for Map<String, Value> {
    fn from(value: RecipeFields) -> Self {
        value.0
    }
}

/// Caller-supplied content for a new recipe.
///
/// The owner is never taken from the payload; it is always the identity the
/// service was asked to create the recipe for.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub recipe_type: RecipeType,
    pub fields: RecipeFields,
}

impl RecipeDraft {
    /// Build a draft from validated parts. A title is mandatory.
    pub fn new(
        recipe_type: RecipeType,
        fields: RecipeFields,
    ) -> Result<Self, RecipeValidationError> {
        if fields.title().is_none() {
            return Err(RecipeValidationError::MissingTitle);
        }
        Ok(Self {
            recipe_type,
            fields,
        })
    }

    /// Parse a JSON payload such as `{"type": "dessert", "title": "Flan"}`.
    ///
    /// An `owner` key is discarded because the owner is forced by the caller.
    ///
    /// # Examples
    /// ```
    /// use recipes::domain::RecipeDraft;
    /// use serde_json::json;
    ///
    /// let draft = RecipeDraft::from_value(json!({
    ///     "type": "dessert",
    ///     "title": "Flan",
    ///     "ingredients": ["eggs", "milk", "sugar"],
    /// }))
    /// .expect("valid draft");
    /// assert_eq!(draft.recipe_type.as_ref(), "dessert");
    /// assert_eq!(draft.fields.title(), Some("Flan"));
    /// ```
    pub fn from_value(value: Value) -> Result<Self, RecipeValidationError> {
        let mut map = expect_object(value)?;
        map.remove(OWNER_KEY);
        let recipe_type = take_recipe_type(&mut map)?.ok_or(RecipeValidationError::MissingType)?;
        Self::new(recipe_type, RecipeFields::new(map)?)
    }
}

/// Partial update over a recipe's type and payload fields.
///
/// Keys mapped to JSON `null` are removed; every other key overwrites the
/// stored value. Owner, raters and the average are not representable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipePatch {
    recipe_type: Option<RecipeType>,
    set: Map<String, Value>,
    unset: Vec<String>,
}

impl RecipePatch {
    /// Parse a JSON patch object.
    ///
    /// # Examples
    /// ```
    /// use recipes::domain::RecipePatch;
    /// use serde_json::json;
    ///
    /// let patch = RecipePatch::from_value(json!({ "title": "Better flan", "notes": null }))
    ///     .expect("valid patch");
    /// assert_eq!(patch.unset(), ["notes".to_owned()]);
    /// assert!(RecipePatch::from_value(json!({ "averageRating": 5 })).is_err());
    /// ```
    pub fn from_value(value: Value) -> Result<Self, RecipeValidationError> {
        let mut map = expect_object(value)?;
        let recipe_type = take_recipe_type(&mut map)?;
        if let Some(key) = RESERVED_KEYS.iter().find(|key| map.contains_key(**key)) {
            return Err(RecipeValidationError::ReservedField {
                field: (*key).to_owned(),
            });
        }

        let mut set = Map::new();
        let mut unset = Vec::new();
        for (key, value) in map {
            if key == TITLE_KEY {
                if value.is_null() {
                    return Err(RecipeValidationError::TitleRemoval);
                }
                check_title(&value)?;
            }
            if value.is_null() {
                unset.push(key);
            } else {
                set.insert(key, value);
            }
        }

        Ok(Self {
            recipe_type,
            set,
            unset,
        })
    }

    /// Replacement category tag, if any.
    pub fn recipe_type(&self) -> Option<&RecipeType> {
        self.recipe_type.as_ref()
    }

    /// Fields to overwrite.
    pub fn set(&self) -> &Map<String, Value> {
        &self.set
    }

    /// Fields to remove.
    pub fn unset(&self) -> &[String] {
        &self.unset
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.recipe_type.is_none() && self.set.is_empty() && self.unset.is_empty()
    }
}
