//! Queue curves: a FIFO whose contents depend on the time you look at it.
//!
//! Every element lives from the time it was inserted until the time it was
//! popped or cleared. Popping does not erase anything; it records the death
//! time, so reads at earlier times still see the element. Elements are kept
//! sorted by insertion time, and equal insertion times keep insertion order.

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CurveError;

/// One queued value and the time span it is live for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueElement<T> {
    /// When the element was inserted.
    pub alive: SimTime,
    /// When the element was popped or cleared; [`SimTime::MAX`] while it is
    /// still queued.
    pub dead: SimTime,
    /// The queued value.
    pub value: T,
}

impl<T> QueueElement<T> {
    /// Whether the element is in the queue at `time`.
    pub fn is_alive_at(&self, time: SimTime) -> bool {
        self.alive <= time && time < self.dead
    }
}

/// A time-aware FIFO queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue<T> {
    /// Elements ordered by insertion time.
    elements: Vec<QueueElement<T>>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    /// Create a queue that has never held anything.
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Enqueue `value` at `time`.
    ///
    /// The element goes after every element inserted at or before `time`.
    pub fn insert(&mut self, time: SimTime, value: T) {
        let idx = self.elements.partition_point(|e| e.alive <= time);
        trace!(%time, position = idx, "queue insert");
        self.elements.insert(
            idx,
            QueueElement {
                alive: time,
                dead: SimTime::MAX,
                value,
            },
        );
    }

    /// The first element live at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::EmptyQueue`] if nothing is queued at `time`.
    pub fn front(&self, time: SimTime) -> Result<&T, CurveError> {
        self.first_alive(time)
            .and_then(|idx| self.elements.get(idx))
            .map(|e| &e.value)
            .ok_or(CurveError::EmptyQueue { time })
    }

    /// Whether nothing is queued at `time`.
    pub fn empty(&self, time: SimTime) -> bool {
        self.first_alive(time).is_none()
    }

    /// Values live at `time`, front first.
    pub fn iter_at(&self, time: SimTime) -> impl Iterator<Item = &T> {
        self.elements
            .iter()
            .take_while(move |e| e.alive <= time)
            .filter(move |e| e.is_alive_at(time))
            .map(|e| &e.value)
    }

    /// Elements inserted in `[from, to]`, dead or alive.
    pub fn between(&self, from: SimTime, to: SimTime) -> impl Iterator<Item = &QueueElement<T>> {
        self.elements
            .iter()
            .skip_while(move |e| e.alive < from)
            .take_while(move |e| e.alive <= to)
    }

    /// Every element ever inserted, in queue order.
    pub fn elements(&self) -> &[QueueElement<T>] {
        &self.elements
    }

    /// Kill every element live at `time`.
    pub fn clear(&mut self, time: SimTime) {
        for element in self
            .elements
            .iter_mut()
            .take_while(|e| e.alive <= time)
            .filter(|e| e.is_alive_at(time))
        {
            element.dead = time;
        }
    }

    /// Drop the elements inserted at or after `time`, as when the future
    /// is predicted anew.
    pub fn truncate_from(&mut self, time: SimTime) {
        let keep = self.elements.partition_point(|e| e.alive < time);
        self.elements.truncate(keep);
    }

    fn first_alive(&self, time: SimTime) -> Option<usize> {
        self.elements
            .iter()
            .take_while(|e| e.alive <= time)
            .position(|e| e.is_alive_at(time))
    }
}

impl<T: Clone> Queue<T> {
    /// Remove the first element live at `time` and return it.
    ///
    /// The element stays visible to reads before `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::EmptyQueue`] if nothing is queued at `time`.
    pub fn pop_front(&mut self, time: SimTime) -> Result<T, CurveError> {
        let element = self
            .first_alive(time)
            .and_then(|idx| self.elements.get_mut(idx))
            .ok_or(CurveError::EmptyQueue { time })?;
        element.dead = time;
        trace!(%time, inserted = %element.alive, "queue pop");
        Ok(element.value.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    #[test]
    fn fifo_order_with_equal_insert_times() {
        let mut queue = Queue::new();
        queue.insert(t(2), 'b');
        queue.insert(t(1), 'a');
        queue.insert(t(2), 'c');

        assert_eq!(queue.pop_front(t(5)).unwrap(), 'a');
        assert_eq!(queue.pop_front(t(5)).unwrap(), 'b');
        assert_eq!(queue.pop_front(t(5)).unwrap(), 'c');
        assert!(queue.empty(t(5)));
    }

    #[test]
    fn element_is_invisible_before_its_insert_time() {
        let mut queue = Queue::new();
        queue.insert(t(3), 1);
        assert!(queue.empty(t(2)));
        assert_eq!(queue.front(t(2)), Err(CurveError::EmptyQueue { time: t(2) }));
        assert_eq!(queue.front(t(3)), Ok(&1));
    }

    #[test]
    fn popped_element_stays_in_history() {
        let mut queue = Queue::new();
        queue.insert(t(0), 1);
        queue.insert(t(0), 2);
        assert_eq!(queue.pop_front(t(4)).unwrap(), 1);

        assert_eq!(queue.front(t(3)), Ok(&1));
        assert_eq!(queue.front(t(4)), Ok(&2));
        assert_eq!(queue.iter_at(t(3)).copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(queue.iter_at(t(4)).copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn clear_kills_only_live_elements() {
        let mut queue = Queue::new();
        queue.insert(t(0), 1);
        queue.insert(t(1), 2);
        queue.insert(t(6), 3);
        queue.clear(t(5));

        assert!(queue.empty(t(5)));
        assert_eq!(queue.front(t(4)), Ok(&1));
        assert_eq!(queue.front(t(6)), Ok(&3));
    }

    #[test]
    fn between_and_truncate_use_insert_times() {
        let mut queue = Queue::new();
        for units in [0, 2, 4, 6] {
            queue.insert(t(units), units);
        }
        let picked: Vec<_> = queue.between(t(1), t(4)).map(|e| e.value).collect();
        assert_eq!(picked, vec![2, 4]);

        queue.truncate_from(t(4));
        assert_eq!(queue.elements().len(), 2);
        assert_eq!(queue.iter_at(t(10)).count(), 2);
    }
}
