//! Type-erased parameters attached to an event.
//!
//! A [`ParamMap`] is filled once when the event is created and only read
//! afterwards. Lookups never fail: a missing key or a value of another type
//! yields the caller's default.

use core::any::{Any, type_name};
use core::fmt;
use std::collections::BTreeMap;

/// Immutable key/value bag passed to [`EventClass::call`].
///
/// [`EventClass::call`]: crate::EventClass::call
#[derive(Default)]
pub struct ParamMap {
    /// Values by key. Each value remembers its concrete type.
    entries: BTreeMap<String, Box<dyn Any>>,
}

impl ParamMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<T: Any>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert `value` under `key`, replacing any previous value.
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// The value under `key` if it exists and has type `T`, else `default`.
    pub fn get<T: Any + Clone>(&self, key: &str, default: T) -> T {
        self.get_ref::<T>(key).cloned().unwrap_or(default)
    }

    /// Like [`ParamMap::get`] with `T::default()` as fallback.
    pub fn get_or_default<T: Any + Clone + Default>(&self, key: &str) -> T {
        self.get_ref::<T>(key).cloned().unwrap_or_default()
    }

    /// Borrow the value under `key` if it has type `T`.
    pub fn get_ref<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Whether a value of any type is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the value under `key` exists and has type `T`.
    pub fn check_type<T: Any>(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|v| v.is::<T>())
    }

    /// Number of stored parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameter is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ParamMap {
        ParamMap::new()
            .with("testInt", 1_i32)
            .with("testStdString", String::from("stdstring"))
            .with("testString", "string")
    }

    #[test]
    fn missing_key_yields_default() {
        let params = sample();
        assert!(!params.contains("tomato"));
        assert!(!params.check_type::<i32>("tomato"));
        assert_eq!(params.get("tomato", 1_i32), 1);
        assert_eq!(params.get_or_default::<i32>("tomato"), 0);
        assert_eq!(params.get("tomato", String::from("test")), "test");
        assert_eq!(params.get_or_default::<String>("tomato"), "");
    }

    #[test]
    fn wrong_type_yields_default() {
        let params = sample();
        assert!(params.contains("testInt"));
        assert!(params.check_type::<i32>("testInt"));
        assert!(!params.check_type::<i64>("testInt"));
        assert_eq!(params.get("testInt", 0_i32), 1);
        assert_eq!(params.get("testInt", String::from("int")), "int");
        assert_eq!(params.get("testInt", 7_i64), 7);
    }

    #[test]
    fn str_and_string_are_distinct_types() {
        let params = sample();
        assert!(params.check_type::<&'static str>("testString"));
        assert!(!params.check_type::<String>("testString"));
        assert_eq!(params.get("testString", ""), "string");

        assert!(params.check_type::<String>("testStdString"));
        assert_eq!(params.get_or_default::<String>("testStdString"), "stdstring");
        assert_eq!(params.get("testStdString", "fallback"), "fallback");
    }

    #[test]
    fn insert_replaces_and_changes_type() {
        let mut params = sample();
        params.insert("testInt", 2_u8);
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("testInt", 0_i32), 0);
        assert_eq!(params.get("testInt", 0_u8), 2);
        assert_eq!(params.keys().collect::<Vec<_>>(), ["testInt", "testStdString", "testString"]);
    }
}
