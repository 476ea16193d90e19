// Strongly-typed entity identifiers - prevents mixing up the different
// id spaces that all share the store's i64 key type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for Value {
            fn from(id: $name) -> Self {
                Value::from(id.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a user record.
    UserId
);
entity_id!(
    /// Identifier of a post record.
    PostId
);
entity_id!(
    /// Identifier of a like edge record.
    LikeId
);
entity_id!(
    /// Identifier of an activity record.
    ActivityId
);
