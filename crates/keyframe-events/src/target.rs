//! Notification sources that events depend on.
//!
//! Anything that owns curves and can be watched by events holds an
//! [`EventTarget`]. Writing to one of its curves is followed by
//! [`EventTarget::changes`], which queues every dependent event for
//! rescheduling.

use core::cell::RefCell;
use core::fmt;
use std::rc::{Rc, Weak};

use keyframe_types::{SimTime, TargetId};
use tracing::trace;

use crate::changes::ChangeSink;
use crate::class::TriggerType;
use crate::event::Event;

/// Callback invoked with the change time after a target reports a change.
pub type ParentNotifier = Rc<dyn Fn(SimTime)>;

/// A node in the dependency graph.
///
/// Dependents are held weakly: a target never keeps an event alive.
pub struct EventTarget<S> {
    /// Stable identifier.
    id: TargetId,
    /// Change sets of the owning manager.
    sink: ChangeSink<S>,
    /// Events to notify, possibly expired.
    dependents: RefCell<Vec<Weak<Event<S>>>>,
    /// Optional hook to propagate changes upward (e.g. to a container).
    parent_notifier: RefCell<Option<ParentNotifier>>,
}

impl<S> EventTarget<S> {
    /// Create a target that reports into `sink`.
    pub fn new(id: TargetId, sink: ChangeSink<S>) -> Self {
        Self {
            id,
            sink,
            dependents: RefCell::new(Vec::new()),
            parent_notifier: RefCell::new(None),
        }
    }

    /// The target's identifier.
    pub const fn id(&self) -> TargetId {
        self.id
    }

    /// Register `event` as a dependent. Registering twice has no effect.
    pub fn add_dependent(&self, event: &Rc<Event<S>>) {
        let mut dependents = self.dependents.borrow_mut();
        let known = dependents
            .iter()
            .any(|d| core::ptr::eq(d.as_ptr(), Rc::as_ptr(event)));
        if !known {
            dependents.push(Rc::downgrade(event));
        }
    }

    /// Number of dependents that are alive and not cancelled.
    pub fn dependent_count(&self) -> usize {
        self.dependents
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|event| !event.is_cancelled())
            .count()
    }

    /// Report that this target's data changed at `time`.
    ///
    /// Queues every live [`TriggerType::OnChange`],
    /// [`TriggerType::OnChangeImmediately`] and [`TriggerType::Once`]
    /// dependent, then calls the parent notifier.
    pub fn changes(&self, time: SimTime) {
        trace!(target_id = %self.id, %time, "target changed");
        for event in self.live_dependents() {
            if event.trigger_type().reacts_to_changes() {
                self.sink.add_change(&event, time);
            }
        }
        self.notify_parent(time);
    }

    /// Fire the [`TriggerType::OnKeyframe`] dependents at `time`, then call
    /// the parent notifier.
    pub fn trigger(&self, time: SimTime) {
        trace!(target_id = %self.id, %time, "target triggered");
        for event in self.live_dependents() {
            if event.trigger_type() == TriggerType::OnKeyframe {
                self.sink.add_change(&event, time);
            }
        }
        self.notify_parent(time);
    }

    /// Install a callback run after every change or trigger.
    pub fn set_parent_notifier(&self, notifier: impl Fn(SimTime) + 'static) {
        *self.parent_notifier.borrow_mut() = Some(Rc::new(notifier));
    }

    /// Remove the parent notifier.
    pub fn clear_parent_notifier(&self) {
        *self.parent_notifier.borrow_mut() = None;
    }

    /// Handle to the change sets this target reports into.
    pub const fn change_sink(&self) -> &ChangeSink<S> {
        &self.sink
    }

    /// Upgrade all dependents, dropping the expired and cancelled ones.
    fn live_dependents(&self) -> Vec<Rc<Event<S>>> {
        let mut dependents = self.dependents.borrow_mut();
        let mut live = Vec::with_capacity(dependents.len());
        dependents.retain(|d| match d.upgrade() {
            Some(event) if !event.is_cancelled() => {
                live.push(event);
                true
            }
            _ => false,
        });
        live
    }

    fn notify_parent(&self, time: SimTime) {
        let notifier = self.parent_notifier.borrow().clone();
        if let Some(notify) = notifier {
            notify(time);
        }
    }
}

impl<S> fmt::Debug for EventTarget<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("id", &self.id)
            .field("dependents", &self.dependent_count())
            .field("has_parent", &self.parent_notifier.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::class::EventClass;
    use crate::manager::EventManager;
    use crate::params::ParamMap;

    struct Kind(TriggerType);

    impl EventClass<()> for Kind {
        fn id(&self) -> &str {
            "kind"
        }

        fn trigger_type(&self) -> TriggerType {
            self.0
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

    fn event(target: &Rc<EventTarget<()>>, trigger: TriggerType) -> Rc<Event<()>> {
        Rc::new(Event::new(target, Rc::new(Kind(trigger)), ParamMap::new()))
    }

    #[test]
    fn dependents_are_deduplicated_and_weak() {
        let sink = ChangeSink::new();
        let target = Rc::new(EventTarget::new(TargetId::new(3), sink));
        let first = event(&target, TriggerType::OnChange);
        first.depend_on(&target);
        first.depend_on(&target);
        assert_eq!(target.dependent_count(), 1);

        drop(first);
        assert_eq!(target.dependent_count(), 0);
    }

    #[test]
    fn changes_and_trigger_select_by_kind() {
        let sink = ChangeSink::new();
        let target = Rc::new(EventTarget::new(TargetId::new(3), sink.clone()));
        let on_change = event(&target, TriggerType::OnChange);
        let on_keyframe = event(&target, TriggerType::OnKeyframe);
        let on_execute = event(&target, TriggerType::OnExecute);
        for e in [&on_change, &on_keyframe, &on_execute] {
            e.depend_on(&target);
        }

        target.changes(SimTime::ONE);
        assert_eq!(sink.current_len(), 1);
        assert_eq!(on_change.last_triggered(), SimTime::ONE);
        assert_eq!(on_execute.last_triggered(), SimTime::MIN);

        target.trigger(SimTime::ONE);
        // Same class and target as the pending change: merged.
        assert_eq!(sink.current_len(), 1);
        assert_eq!(on_keyframe.last_triggered(), SimTime::ONE);
    }

    #[test]
    fn repeated_change_at_same_time_is_deferred() {
        let sink = ChangeSink::new();
        let target = Rc::new(EventTarget::new(TargetId::new(3), sink.clone()));
        let on_change = event(&target, TriggerType::OnChange);
        on_change.depend_on(&target);

        target.changes(SimTime::ONE);
        target.changes(SimTime::ONE);
        assert_eq!(sink.current_len(), 1);
        assert_eq!(sink.future_len(), 1);

        sink.swap();
        assert_eq!(sink.current_len(), 1);
        assert_eq!(sink.take_current().len(), 1);
        assert_eq!(sink.current_len(), 0);
    }
}
