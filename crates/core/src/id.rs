//! Identifiers for gymtrack entities.
//!
//! Stored entities are keyed by the relational store's integer primary keys.

use serde::{Deserialize, Serialize};

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw primary key.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw primary key.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

store_id!(
    /// Identifier of a user (the verified caller identity).
    UserId
);

store_id!(
    /// Identifier of a workout.
    WorkoutId
);

store_id!(
    /// Identifier of an exercise within a workout.
    ExerciseId
);

store_id!(
    /// Identifier of an exercise type (the catalogue entry an exercise refers to).
    ExerciseTypeId
);

store_id!(
    /// Identifier of a set.
    SetId
);

store_id!(
    /// Identifier of a workout session.
    SessionId
);
