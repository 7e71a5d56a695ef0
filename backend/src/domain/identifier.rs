//! UUID-backed identifiers for stored documents.
//!
//! Every document collection (recipes, users, comments) is keyed by an opaque
//! UUID. Identifiers arriving from callers are validated here so malformed
//! input never reaches a store adapter.

use thiserror::Error;

/// Validation errors returned when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier was empty.
    #[error("{kind} id must not be empty")]
    Empty { kind: &'static str },
    /// The identifier was not a canonical UUID string.
    #[error("{kind} id must be a valid UUID")]
    Malformed { kind: &'static str },
}

/// Generates a validated UUID newtype.
///
/// The generated type keeps the caller's original spelling alongside the
/// parsed UUID so round-trips through `String` are lossless.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid, String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, $crate::domain::IdentifierError> {
                Self::from_owned(id.as_ref().to_owned())
            }

            /// Wrap an already-parsed UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid, uuid.to_string())
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self::from_uuid(uuid::Uuid::new_v4())
            }

            fn from_owned(id: String) -> Result<Self, $crate::domain::IdentifierError> {
                if id.is_empty() {
                    return Err($crate::domain::IdentifierError::Empty { kind: $kind });
                }
                if id.trim() != id {
                    return Err($crate::domain::IdentifierError::Malformed { kind: $kind });
                }
                let parsed = uuid::Uuid::parse_str(&id)
                    .map_err(|_| $crate::domain::IdentifierError::Malformed { kind: $kind })?;
                Ok(Self(parsed, id))
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.1.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                let $name(_, raw) = value;
                raw
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

pub(crate) use uuid_identifier;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::IdentifierError;

    uuid_identifier!(
        /// Identifier used only by these tests.
        ProbeId,
        "probe"
    );

    #[rstest]
    fn accepts_canonical_uuid() {
        let id = ProbeId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
        assert_eq!(
            id.as_uuid().to_string(),
            "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        );
    }

    #[rstest]
    fn rejects_empty_input() {
        let err = ProbeId::new("").expect_err("empty id rejected");
        assert_eq!(err, IdentifierError::Empty { kind: "probe" });
        assert_eq!(err.to_string(), "probe id must not be empty");
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("507f1f77bcf86cd799439011")]
    fn rejects_malformed_input(#[case] raw: &str) {
        let err = ProbeId::new(raw).expect_err("malformed id rejected");
        assert_eq!(err, IdentifierError::Malformed { kind: "probe" });
    }

    #[rstest]
    fn serde_uses_plain_string() {
        let id = ProbeId::random();
        let value = serde_json::to_value(&id).expect("serialise id");
        assert_eq!(value, serde_json::Value::String(id.to_string()));
        let decoded: ProbeId = serde_json::from_value(value).expect("deserialise id");
        assert_eq!(decoded, id);
    }
}
