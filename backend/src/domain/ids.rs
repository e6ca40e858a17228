//! UUID-backed identifiers for the RoadGuard aggregates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when an identifier is not a hyphenated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier must be a valid UUID")]
pub struct InvalidIdentifier;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse from text, rejecting surrounding whitespace.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidIdentifier> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err(InvalidIdentifier);
                }
                Uuid::parse_str(raw).map(Self).map_err(|_| InvalidIdentifier)
            }

            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_identifier! {
    /// Identifier of an authenticated user.
    UserId
}

uuid_identifier! {
    /// Identifier of a reported road alert.
    AlertId
}

uuid_identifier! {
    /// Identifier of an SOS request.
    SosId
}

uuid_identifier! {
    /// Identifier of an inbox notification.
    NotificationId
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn rejects_malformed_identifiers(#[case] raw: &str) {
        assert_eq!(AlertId::new(raw), Err(InvalidIdentifier));
    }

    #[test]
    fn serialises_as_bare_uuid_string() {
        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid");
        let value = serde_json::to_value(id).expect("serialise");
        assert_eq!(value, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }
}
