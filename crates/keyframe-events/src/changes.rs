//! Double-buffered change sets.
//!
//! When a target changes, every dependent event is recorded here instead of
//! being rescheduled on the spot. The manager drains the *current* set at the
//! start of each fixpoint round. An event that was already notified at or
//! after the new change time goes into the *future* set, which becomes
//! current once the requested time has been reached. This is what stops two
//! events that keep changing each other from looping forever inside one
//! call.
//!
//! Both sets are shared between the [`EventQueue`] and every
//! [`EventTarget`] through a [`ChangeSink`].
//!
//! [`EventQueue`]: crate::EventQueue
//! [`EventTarget`]: crate::EventTarget

use core::cell::RefCell;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use keyframe_types::{SimTime, TargetId};
use tracing::trace;

use crate::event::Event;

/// A pending request to reschedule an event because of a change at `time`.
pub struct Change<S> {
    /// The affected event.
    pub event: Weak<Event<S>>,
    /// When the change happened.
    pub time: SimTime,
}

impl<S> fmt::Debug for Change<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Change")
            .field("event", &self.event.upgrade())
            .field("time", &self.time)
            .finish()
    }
}

/// Deduplicated changes, iterated in first-insertion order.
///
/// Two changes are the same entry when they concern the same class on the
/// same target; the earlier change time wins.
pub struct ChangeSet<S> {
    /// Changes in insertion order.
    entries: Vec<Change<S>>,
    /// `(class id, target id)` to index in `entries`.
    index: BTreeMap<(String, TargetId), usize>,
}

impl<S> Default for ChangeSet<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<S> ChangeSet<S> {
    /// Record a change, keeping the earlier time on a duplicate.
    pub fn insert(&mut self, event: &Rc<Event<S>>, time: SimTime) {
        let key = (event.class_id().to_owned(), event.target_id());
        if let Some(existing) = self
            .index
            .get(&key)
            .and_then(|&idx| self.entries.get_mut(idx))
        {
            if time < existing.time {
                trace!(class = event.class_id(), %time, "moving pending change earlier");
                existing.time = time;
            }
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(Change {
            event: Rc::downgrade(event),
            time,
        });
    }

    /// Number of pending changes.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no change is pending.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the pending changes in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Change<S>> {
        self.entries.iter()
    }

    /// Drop every pending change.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<S> IntoIterator for ChangeSet<S> {
    type Item = Change<S>;
    type IntoIter = std::vec::IntoIter<Change<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<S> fmt::Debug for ChangeSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

/// The current and future change sets.
pub struct ChangeSets<S> {
    /// Changes to apply in the ongoing `execute_until` call.
    current: ChangeSet<S>,
    /// Changes deferred until the next call.
    future: ChangeSet<S>,
}

impl<S> Default for ChangeSets<S> {
    fn default() -> Self {
        Self {
            current: ChangeSet::default(),
            future: ChangeSet::default(),
        }
    }
}

impl<S> ChangeSets<S> {
    /// Route a change to the current or future set and remember it on the
    /// event. Changes for cancelled events are dropped.
    pub fn add_change(&mut self, event: &Rc<Event<S>>, changed_at: SimTime) {
        if event.is_cancelled() {
            return;
        }
        if event.last_triggered() < changed_at {
            trace!(class = event.class_id(), target_id = %event.target_id(), time = %changed_at, "queueing change");
            self.current.insert(event, changed_at);
        } else {
            trace!(class = event.class_id(), target_id = %event.target_id(), time = %changed_at, "deferring change");
            self.future.insert(event, changed_at);
        }
        event.set_last_triggered(changed_at);
    }

    /// Changes to apply now.
    pub const fn current(&self) -> &ChangeSet<S> {
        &self.current
    }

    /// Changes deferred to the next call.
    pub const fn future(&self) -> &ChangeSet<S> {
        &self.future
    }

    /// Remove and return the current set, leaving it empty.
    pub fn take_current(&mut self) -> ChangeSet<S> {
        core::mem::take(&mut self.current)
    }

    /// Drop the current set.
    pub fn clear_current(&mut self) {
        self.current.clear();
    }

    /// Exchange the current and future sets.
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.current, &mut self.future);
    }
}

impl<S> fmt::Debug for ChangeSets<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSets")
            .field("current", &self.current)
            .field("future", &self.future)
            .finish()
    }
}

/// Shared handle to the change sets of one manager.
///
/// Targets keep a clone so they can report changes without a reference to
/// the manager. The borrow is released before any callback runs.
pub struct ChangeSink<S>(Rc<RefCell<ChangeSets<S>>>);

impl<S> Clone for ChangeSink<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S> Default for ChangeSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ChangeSink<S> {
    /// Create empty change sets.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(ChangeSets::default())))
    }

    /// See [`ChangeSets::add_change`].
    pub fn add_change(&self, event: &Rc<Event<S>>, changed_at: SimTime) {
        self.0.borrow_mut().add_change(event, changed_at);
    }

    /// See [`ChangeSets::take_current`].
    pub fn take_current(&self) -> ChangeSet<S> {
        self.0.borrow_mut().take_current()
    }

    /// See [`ChangeSets::clear_current`].
    pub fn clear_current(&self) {
        self.0.borrow_mut().clear_current();
    }

    /// See [`ChangeSets::swap`].
    pub fn swap(&self) {
        self.0.borrow_mut().swap();
    }

    /// Number of changes in the current set.
    pub fn current_len(&self) -> usize {
        self.0.borrow().current().len()
    }

    /// Number of changes in the future set.
    pub fn future_len(&self) -> usize {
        self.0.borrow().future().len()
    }

    /// Whether two handles refer to the same change sets.
    pub fn same_sink(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S> fmt::Debug for ChangeSink<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSink")
            .field("current", &self.current_len())
            .field("future", &self.future_len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::class::{EventClass, TriggerType};
    use crate::manager::EventManager;
    use crate::params::ParamMap;
    use crate::target::EventTarget;

    struct Named(&'static str);

    impl EventClass<()> for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn trigger_type(&self) -> TriggerType {
            TriggerType::OnChange
        }

        fn call(
            &self,
            _manager: &mut EventManager<()>,
            _target: &Rc<EventTarget<()>>,
            _state: &mut (),
            _time: SimTime,
            _params: &ParamMap,
        ) {
        }

        fn recalculate_time(&self, _target: &Rc<EventTarget<()>>, _state: &(), at: SimTime) -> SimTime {
            at
        }
    }

    fn target(id: u64) -> Rc<EventTarget<()>> {
        Rc::new(EventTarget::new(TargetId::new(id), ChangeSink::new()))
    }

    fn event(target: &Rc<EventTarget<()>>, class: &'static str) -> Rc<Event<()>> {
        Rc::new(Event::new(target, Rc::new(Named(class)), ParamMap::new()))
    }

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    fn times(set: &ChangeSet<()>) -> Vec<SimTime> {
        set.iter().map(|change| change.time).collect()
    }

    #[test]
    fn duplicate_with_earlier_time_moves_the_change() {
        let target = target(1);
        let first = event(&target, "move");
        let second = event(&target, "move");

        let mut set = ChangeSet::default();
        set.insert(&first, t(5));
        set.insert(&second, t(3));
        assert_eq!(set.len(), 1);
        assert_eq!(times(&set), vec![t(3)]);
        // The entry still points at the event that created it.
        let change = set.iter().next().unwrap();
        assert!(Rc::ptr_eq(&change.event.upgrade().unwrap(), &first));
    }

    #[test]
    fn duplicate_with_later_time_is_ignored() {
        let target = target(1);
        let first = event(&target, "move");
        let second = event(&target, "move");

        let mut set = ChangeSet::default();
        set.insert(&first, t(3));
        set.insert(&second, t(7));
        assert_eq!(times(&set), vec![t(3)]);
    }

    #[test]
    fn different_class_or_target_are_separate_entries() {
        let one = target(1);
        let two = target(2);
        let mut set = ChangeSet::default();
        set.insert(&event(&one, "move"), t(4));
        set.insert(&event(&one, "turn"), t(2));
        set.insert(&event(&two, "move"), t(1));
        assert_eq!(times(&set), vec![t(4), t(2), t(1)]);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn change_at_or_before_last_trigger_is_deferred() {
        let target = target(1);
        let event = event(&target, "move");
        let mut sets: ChangeSets<()> = ChangeSets::default();

        sets.add_change(&event, t(4));
        assert_eq!(event.last_triggered(), t(4));
        assert_eq!(times(sets.current()), vec![t(4)]);

        sets.add_change(&event, t(4));
        sets.add_change(&event, t(2));
        assert_eq!(times(sets.current()), vec![t(4)]);
        assert_eq!(times(sets.future()), vec![t(2)]);
        assert_eq!(event.last_triggered(), t(2));

        // Back above the last trigger time: current again.
        sets.add_change(&event, t(6));
        assert_eq!(times(sets.current()), vec![t(4)]);
    }

    #[test]
    fn swap_makes_deferred_changes_current() {
        let target = target(1);
        let event = event(&target, "move");
        let sink = ChangeSink::new();

        sink.add_change(&event, t(3));
        sink.add_change(&event, t(3));
        assert_eq!((sink.current_len(), sink.future_len()), (1, 1));

        assert_eq!(sink.take_current().len(), 1);
        sink.swap();
        assert_eq!((sink.current_len(), sink.future_len()), (1, 0));
        sink.clear_current();
        assert_eq!(sink.current_len(), 0);
    }

    #[test]
    fn cancelled_events_are_not_recorded() {
        let target = target(1);
        let event = event(&target, "move");
        event.cancel();

        let sink = ChangeSink::new();
        sink.add_change(&event, t(3));
        assert_eq!((sink.current_len(), sink.future_len()), (0, 0));
        assert_eq!(event.last_triggered(), SimTime::MIN);
    }
}
