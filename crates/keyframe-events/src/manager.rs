//! The event manager: class registry and the fixpoint loop.
//!
//! [`EventManager::execute_until`] advances the simulation to a requested
//! time. Each round first applies the pending target changes (which may move
//! events in the queue) and then executes every event due by that time.
//! Executed events can change targets again, so rounds repeat until one
//! executes nothing. Changes that arrive for events already notified at the
//! same or a later time are deferred to the next call.
//!
//! # Design Principles
//!
//! - Single-threaded. The manager is passed into event bodies as `&mut`, so
//!   there is never more than one mutator.
//! - An event whose target is gone is dropped silently.
//! - Equal times execute in queue order, which makes every run reproducible.

use std::collections::BTreeMap;
use std::rc::Rc;

use keyframe_types::{SimTime, TargetId};
use tracing::{debug, trace, warn};

use crate::changes::ChangeSink;
use crate::class::{EventClass, TriggerType};
use crate::config::LoopConfig;
use crate::error::EventError;
use crate::event::Event;
use crate::params::ParamMap;
use crate::queue::EventQueue;
use crate::target::EventTarget;

/// What one [`EventManager::execute_until`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Fixpoint rounds run.
    pub rounds: u32,
    /// Changes taken from the current change set.
    pub changes_processed: usize,
    /// Events whose body was called.
    pub events_executed: usize,
}

/// Owns the class registry and the event queue for state type `S`.
pub struct EventManager<S> {
    /// Registered classes by id.
    classes: BTreeMap<String, Rc<dyn EventClass<S>>>,
    /// Main queue, watch-lists and change sets.
    queue: EventQueue<S>,
    /// Loop limits.
    config: LoopConfig,
    /// The event whose body is running, if any.
    active_event: Option<Rc<Event<S>>>,
}

impl<S> Default for EventManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> EventManager<S> {
    /// Create a manager with the default [`LoopConfig`].
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    /// Create a manager with explicit loop limits.
    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            classes: BTreeMap::new(),
            queue: EventQueue::new(ChangeSink::new()),
            config,
            active_event: None,
        }
    }

    /// Loop limits in effect.
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Handle for creating targets that report into this manager.
    pub fn change_sink(&self) -> ChangeSink<S> {
        self.queue.change_sink().clone()
    }

    /// Create a target bound to this manager.
    pub fn new_target(&self, id: TargetId) -> Rc<EventTarget<S>> {
        Rc::new(EventTarget::new(id, self.change_sink()))
    }

    /// Register a class, returning the class previously registered under the
    /// same id.
    pub fn add_class(&mut self, class: Rc<dyn EventClass<S>>) -> Option<Rc<dyn EventClass<S>>> {
        let id = class.id().to_owned();
        debug!(class = %id, trigger = %class.trigger_type(), "registering event class");
        self.classes.insert(id, class)
    }

    /// Whether a class with this id is registered.
    pub fn has_class(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    /// The class registered under `id`.
    pub fn class(&self, id: &str) -> Option<&Rc<dyn EventClass<S>>> {
        self.classes.get(id)
    }

    /// Create an event of the registered class `name` on `target`.
    ///
    /// `Ok(None)` means the class decided the event is not needed.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ClassNotRegistered`] if no class has that id.
    pub fn on(
        &mut self,
        name: &str,
        target: &Rc<EventTarget<S>>,
        state: &S,
        reference_time: SimTime,
        params: ParamMap,
    ) -> Result<Option<Rc<Event<S>>>, EventError> {
        let class = self
            .classes
            .get(name)
            .cloned()
            .ok_or_else(|| EventError::ClassNotRegistered(name.to_owned()))?;
        Ok(self.queue.add(target, class, state, reference_time, params))
    }

    /// Create an event of `class`, registering the class if its id is new.
    ///
    /// If a class with the same id is already registered, that one is used.
    pub fn on_class(
        &mut self,
        class: Rc<dyn EventClass<S>>,
        target: &Rc<EventTarget<S>>,
        state: &S,
        reference_time: SimTime,
        params: ParamMap,
    ) -> Option<Rc<Event<S>>> {
        let class = Rc::clone(
            self.classes
                .entry(class.id().to_owned())
                .or_insert(class),
        );
        self.queue.add(target, class, state, reference_time, params)
    }

    /// Cancel an event: it leaves the main queue and its watch-list and is
    /// never queued again, even when a target it depends on changes or the
    /// event removes itself from inside its own body.
    pub fn remove(&mut self, event: &Rc<Event<S>>) {
        debug!(class = event.class_id(), target_id = %event.target_id(), "removing event");
        self.queue.remove(event);
    }

    /// The event whose body is currently running.
    pub const fn active_event(&self) -> Option<&Rc<Event<S>>> {
        self.active_event.as_ref()
    }

    /// Read access to the queue.
    pub const fn queue(&self) -> &EventQueue<S> {
        &self.queue
    }

    /// Queued events in execution order.
    pub fn pending_events(&self) -> Vec<Rc<Event<S>>> {
        self.queue.pending_events()
    }

    /// Advance to `until`: apply changes and execute due events until a
    /// round executes nothing, then make deferred changes current.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SettleLimitExceeded`] if the events have not
    /// settled after [`LoopConfig::max_rounds`] rounds. The change sets are
    /// swapped in that case too, so the next call continues from a
    /// consistent state.
    pub fn execute_until(&mut self, until: SimTime, state: &mut S) -> Result<StepSummary, EventError> {
        let mut summary = StepSummary::default();
        loop {
            if summary.rounds >= self.config.max_rounds {
                self.queue.swap_changesets();
                warn!(time = %until, rounds = summary.rounds, "event loop did not settle, giving up");
                return Err(EventError::SettleLimitExceeded {
                    time: until,
                    rounds: summary.rounds,
                });
            }
            summary.rounds = summary.rounds.saturating_add(1);

            let changes = self.update_changes(state);
            let executed = self.execute_events(until, state);
            summary.changes_processed = summary.changes_processed.saturating_add(changes);
            summary.events_executed = summary.events_executed.saturating_add(executed);
            trace!(round = summary.rounds, changes, executed, "fixpoint round done");

            if executed == 0 {
                break;
            }
        }

        self.queue.swap_changesets();
        debug!(
            time = %until,
            rounds = summary.rounds,
            executed = summary.events_executed,
            "reached time"
        );
        Ok(summary)
    }

    /// Apply the current change set to the queue. Returns how many changes
    /// were taken.
    pub fn update_changes(&mut self, state: &S) -> usize {
        let changes = self.queue.take_changes();
        let count = changes.len();
        if count > 0 {
            debug!(count, "processing target changes");
        }

        for change in changes {
            let Some(event) = change.event.upgrade() else {
                continue;
            };
            if event.is_cancelled() {
                trace!(class = event.class_id(), "ignoring change for cancelled event");
                continue;
            }
            match event.trigger_type() {
                TriggerType::Once if event.has_executed() => {
                    trace!(class = event.class_id(), "ignoring change for finished event");
                }
                TriggerType::OnChange | TriggerType::Once => {
                    let Some(target) = event.target() else {
                        self.queue.discard(&event);
                        continue;
                    };
                    let class = Rc::clone(event.class());
                    let new_time = class.recalculate_time(&target, state, change.time);
                    if new_time.is_never() {
                        debug!(
                            class = class.id(),
                            target_id = %target.id(),
                            changed_at = %change.time,
                            "change cancelled event"
                        );
                        self.queue.discard(&event);
                    } else {
                        debug!(
                            class = class.id(),
                            target_id = %target.id(),
                            changed_at = %change.time,
                            time = %new_time,
                            "change rescheduled event"
                        );
                        event.set_time(new_time);
                        self.queue.update(&event);
                    }
                }
                TriggerType::OnChangeImmediately | TriggerType::OnKeyframe => {
                    event.set_time(change.time);
                    self.queue.update(&event);
                }
                TriggerType::OnExecute => {}
            }
        }
        count
    }

    /// Execute every queued event due at or before `until`, in order.
    /// Returns how many event bodies ran.
    pub fn execute_events(&mut self, until: SimTime, state: &mut S) -> usize {
        let mut executed = 0_usize;
        while let Some(event) = self.queue.take_event(until) {
            let Some(target) = event.target() else {
                debug!(class = event.class_id(), target_id = %event.target_id(), "target gone, dropping event");
                self.queue.discard(&event);
                continue;
            };

            let class = Rc::clone(event.class());
            let time = event.time();
            debug!(class = class.id(), target_id = %target.id(), %time, "invoking event");

            self.active_event = Some(Rc::clone(&event));
            class.call(self, &target, state, time, event.params());
            self.active_event = None;
            event.mark_executed();
            executed = executed.saturating_add(1);

            if event.is_cancelled() {
                trace!(class = class.id(), "event cancelled itself");
            } else if class.trigger_type() == TriggerType::OnExecute {
                let next = class.recalculate_time(&target, state, time);
                if next.is_never() {
                    debug!(class = class.id(), target_id = %target.id(), "repeating event finished");
                    self.queue.discard(&event);
                } else {
                    trace!(class = class.id(), time = %next, "re-arming repeating event");
                    event.set_time(next);
                    self.queue.update(&event);
                }
            }
        }
        executed
    }
}

impl<S> core::fmt::Debug for EventManager<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventManager")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("queue", &self.queue)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
