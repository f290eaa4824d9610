//! Type-safe identifier wrappers.
//!
//! Identifiers are plain integers rather than random UUIDs: every peer of a
//! lockstep simulation must assign the same id to the same entity, so ids
//! are handed out by deterministic game logic.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an identifier from its numeric value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the inner numeric value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an event target (a unit, a projectile, a curve
    /// owner) in the dependency graph.
    TargetId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_value() {
        assert!(TargetId::new(1) < TargetId::new(2));
        assert_eq!(TargetId::from(7).into_inner(), 7);
        assert_eq!(TargetId::new(9).to_string(), "9");
    }
}
