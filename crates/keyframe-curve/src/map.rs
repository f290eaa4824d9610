//! Map curves: keyed values that exist for a span of time.
//!
//! Every entry carries the time it appears and the time it disappears.
//! Reads at a time only see the entries live then. Keys are kept in a
//! [`BTreeMap`] so iteration order is the same on every peer.

use std::collections::BTreeMap;

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};

/// A value and the span `[alive, dead)` it is live for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapElement<V> {
    /// When the entry appears.
    pub alive: SimTime,
    /// When the entry disappears; [`SimTime::MAX`] if never.
    pub dead: SimTime,
    /// The stored value.
    pub value: V,
}

impl<V> MapElement<V> {
    /// Whether the entry is live at `time`.
    pub fn is_alive_at(&self, time: SimTime) -> bool {
        self.alive <= time && time < self.dead
    }
}

/// Keyed entries with lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedMap<K: Ord, V> {
    /// Every entry ever inserted and not cleaned.
    entries: BTreeMap<K, MapElement<V>>,
}

impl<K: Ord, V> Default for TimedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> TimedMap<K, V> {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add `value` under `key`, live from `alive` on.
    ///
    /// Returns the entry previously stored under `key`. Keys are not meant
    /// to be reused; a reused key loses its old history.
    pub fn insert(&mut self, alive: SimTime, key: K, value: V) -> Option<MapElement<V>> {
        self.insert_until(alive, SimTime::MAX, key, value)
    }

    /// Add `value` under `key`, live in `[alive, dead)`.
    pub fn insert_until(&mut self, alive: SimTime, dead: SimTime, key: K, value: V) -> Option<MapElement<V>> {
        self.entries.insert(key, MapElement { alive, dead, value })
    }

    /// The value under `key` if it is live at `time`.
    pub fn at(&self, time: SimTime, key: &K) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|e| e.is_alive_at(time))
            .map(|e| &e.value)
    }

    /// Move the appearance time of `key`. Returns whether the key exists.
    pub fn birth(&mut self, time: SimTime, key: &K) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.alive = time;
        true
    }

    /// Set the disappearance time of `key`. Returns whether the key exists.
    pub fn kill(&mut self, time: SimTime, key: &K) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.dead = time;
        true
    }

    /// Entries live at `time`, in key order.
    pub fn iter_at(&self, time: SimTime) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter(move |(_, e)| e.is_alive_at(time))
            .map(|(k, e)| (k, &e.value))
    }

    /// Entries live at some point in `[from, to)`, in key order.
    pub fn between(&self, from: SimTime, to: SimTime) -> impl Iterator<Item = (&K, &MapElement<V>)> {
        self.entries
            .iter()
            .filter(move |(_, e)| e.alive < to && from < e.dead)
    }

    /// Drop entries that died at or before `time`. Reads before `time`
    /// lose them too.
    pub fn clean(&mut self, time: SimTime) {
        self.entries.retain(|_, e| e.dead > time);
    }

    /// Number of stored entries, dead or alive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    #[test]
    fn entries_are_visible_only_while_alive() {
        let mut map = TimedMap::new();
        map.insert(t(2), "ball", 1);
        assert_eq!(map.at(t(1), &"ball"), None);
        assert_eq!(map.at(t(2), &"ball"), Some(&1));

        assert!(map.kill(t(5), &"ball"));
        assert_eq!(map.at(t(4), &"ball"), Some(&1));
        assert_eq!(map.at(t(5), &"ball"), None);
        assert!(!map.kill(t(5), &"paddle"));
    }

    #[test]
    fn iteration_filters_by_time_in_key_order() {
        let mut map = TimedMap::new();
        map.insert_until(t(0), t(3), 2, 'b');
        map.insert(t(1), 1, 'a');
        map.insert(t(4), 3, 'c');

        let live: Vec<_> = map.iter_at(t(2)).map(|(k, v)| (*k, *v)).collect();
        assert_eq!(live, vec![(1, 'a'), (2, 'b')]);
        let overlapping: Vec<_> = map.between(t(3), t(5)).map(|(k, _)| *k).collect();
        assert_eq!(overlapping, vec![1, 3]);
    }

    #[test]
    fn birth_moves_the_start_and_clean_drops_the_dead() {
        let mut map = TimedMap::new();
        map.insert(t(5), 'x', 1);
        assert!(map.birth(t(1), &'x'));
        assert_eq!(map.at(t(1), &'x'), Some(&1));

        map.insert_until(t(0), t(2), 'y', 2);
        map.clean(t(3));
        assert_eq!(map.len(), 1);
        assert!(map.at(t(1), &'y').is_none());
    }
}
