//! A scheduled instance of an [`EventClass`] bound to one target.

use core::cell::Cell;
use core::fmt;
use std::rc::{Rc, Weak};

use keyframe_types::{SimTime, TargetId};

use crate::class::{EventClass, TriggerType};
use crate::params::ParamMap;
use crate::target::EventTarget;

/// Position of an event in the main queue: time plus insertion sequence.
pub(crate) type QueueKey = (SimTime, u64);

/// One event: target, class, parameters and scheduling state.
///
/// The target is held weakly. Once it is dropped the event can no longer
/// run and is discarded the next time the loop reaches it.
pub struct Event<S> {
    /// The target the event acts on.
    target: Weak<EventTarget<S>>,
    /// Id of the target, kept for logging and change deduplication after the
    /// target is gone.
    target_id: TargetId,
    /// Shared behaviour.
    class: Rc<dyn EventClass<S>>,
    /// Parameters handed to [`EventClass::call`].
    params: ParamMap,
    /// Scheduled execution time.
    time: Cell<SimTime>,
    /// Most recent change time that reached this event.
    last_triggered: Cell<SimTime>,
    /// Whether the event has run at least once.
    executed: Cell<bool>,
    /// Key in the main queue while the event is queued.
    queue_key: Cell<Option<QueueKey>>,
    /// Set once the event is removed; it never runs again.
    cancelled: Cell<bool>,
}

impl<S> Event<S> {
    pub(crate) fn new(
        target: &Rc<EventTarget<S>>,
        class: Rc<dyn EventClass<S>>,
        params: ParamMap,
    ) -> Self {
        Self {
            target: Rc::downgrade(target),
            target_id: target.id(),
            class,
            params,
            time: Cell::new(SimTime::MIN),
            last_triggered: Cell::new(SimTime::MIN),
            executed: Cell::new(false),
            queue_key: Cell::new(None),
            cancelled: Cell::new(false),
        }
    }

    /// Make this event react to changes of `target`.
    pub fn depend_on(self: &Rc<Self>, target: &EventTarget<S>) {
        target.add_dependent(self);
    }

    /// The target, if it is still alive.
    pub fn target(&self) -> Option<Rc<EventTarget<S>>> {
        self.target.upgrade()
    }

    /// Id of the target this event was created for.
    pub const fn target_id(&self) -> TargetId {
        self.target_id
    }

    /// The event's class.
    pub const fn class(&self) -> &Rc<dyn EventClass<S>> {
        &self.class
    }

    /// Shorthand for `self.class().id()`.
    pub fn class_id(&self) -> &str {
        self.class.id()
    }

    /// Shorthand for `self.class().trigger_type()`.
    pub fn trigger_type(&self) -> TriggerType {
        self.class.trigger_type()
    }

    /// Parameters given at creation.
    pub const fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Scheduled execution time.
    pub fn time(&self) -> SimTime {
        self.time.get()
    }

    /// Most recent change time delivered to this event, or
    /// [`SimTime::MIN`] if none yet.
    pub fn last_triggered(&self) -> SimTime {
        self.last_triggered.get()
    }

    /// Whether the event has executed at least once.
    pub fn has_executed(&self) -> bool {
        self.executed.get()
    }

    /// Whether the event currently sits in the main queue.
    pub fn is_queued(&self) -> bool {
        self.queue_key.get().is_some()
    }

    /// Whether the event was removed from its manager.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub(crate) fn set_time(&self, time: SimTime) {
        self.time.set(time);
    }

    pub(crate) fn set_last_triggered(&self, time: SimTime) {
        self.last_triggered.set(time);
    }

    pub(crate) fn mark_executed(&self) {
        self.executed.set(true);
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub(crate) fn queue_key(&self) -> Option<QueueKey> {
        self.queue_key.get()
    }

    pub(crate) fn set_queue_key(&self, key: Option<QueueKey>) {
        self.queue_key.set(key);
    }
}

impl<S> fmt::Debug for Event<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("class", &self.class.id())
            .field("trigger", &self.class.trigger_type())
            .field("target", &self.target_id)
            .field("time", &self.time.get())
            .field("last_triggered", &self.last_triggered.get())
            .field("executed", &self.executed.get())
            .field("cancelled", &self.cancelled.get())
            .field("params", &self.params)
            .finish()
    }
}
