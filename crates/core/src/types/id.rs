//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers that keep user, car,
//! and purchase IDs from being mixed up at call sites.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`, `is_valid()`
/// - `From<i32>` and `Into<i32>` implementations
/// - a transparent `sqlx::Type` over `INTEGER`/`SERIAL` (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use autoelite_core::define_id;
/// define_id!(UserId);
/// define_id!(CarId);
///
/// let user_id = UserId::new(1);
/// let car_id = CarId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: UserId = car_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Database IDs are always positive.
            #[must_use]
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Entity IDs
define_id!(UserId);
define_id!(CarId);
define_id!(PurchaseId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = CarId::new(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");

        let parsed: PurchaseId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_i32(), 42);
    }

    #[test]
    fn test_is_valid() {
        assert!(UserId::new(1).is_valid());
        assert!(!UserId::new(0).is_valid());
        assert!(!CarId::new(-3).is_valid());
    }

    #[test]
    fn test_ordering_follows_inner_value() {
        let mut ids = vec![CarId::new(9), CarId::new(2), CarId::new(5)];
        ids.sort();
        assert_eq!(ids, vec![CarId::new(2), CarId::new(5), CarId::new(9)]);
    }
}
