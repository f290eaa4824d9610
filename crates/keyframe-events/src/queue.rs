//! Event storage: the time-ordered main queue and per-kind watch-lists.
//!
//! The main queue decides what executes next. It is keyed by
//! `(time, sequence)` where the sequence grows with every insertion, so
//! events due at the same time run in the order they were (re)queued.
//! Watch-lists keep every registered event of a reactive kind alive while it
//! waits for a change to arm it.

use std::collections::BTreeMap;
use std::rc::Rc;

use keyframe_types::SimTime;
use tracing::{debug, trace};

use crate::changes::{ChangeSet, ChangeSink};
use crate::class::{EventClass, TriggerType};
use crate::event::{Event, QueueKey};
use crate::params::ParamMap;
use crate::target::EventTarget;

/// Main queue plus watch-lists plus the change sets.
pub struct EventQueue<S> {
    /// Events armed for execution.
    queue: BTreeMap<QueueKey, Rc<Event<S>>>,
    /// Next insertion sequence number.
    next_sequence: u64,
    /// Registered [`TriggerType::OnChange`] events.
    on_change: Vec<Rc<Event<S>>>,
    /// Registered [`TriggerType::OnChangeImmediately`] events.
    on_change_immediately: Vec<Rc<Event<S>>>,
    /// Registered [`TriggerType::OnKeyframe`] events.
    on_keyframe: Vec<Rc<Event<S>>>,
    /// Registered [`TriggerType::OnExecute`] events.
    on_execute: Vec<Rc<Event<S>>>,
    /// Current and future change sets, shared with the targets.
    sink: ChangeSink<S>,
}

impl<S> EventQueue<S> {
    /// Create an empty queue reporting into `sink`.
    pub const fn new(sink: ChangeSink<S>) -> Self {
        Self {
            queue: BTreeMap::new(),
            next_sequence: 0,
            on_change: Vec::new(),
            on_change_immediately: Vec::new(),
            on_keyframe: Vec::new(),
            on_execute: Vec::new(),
            sink,
        }
    }

    /// Create an event, set it up and register it.
    ///
    /// Returns `None` when the class reports [`SimTime::NEVER`] as the
    /// initial time; the event is dropped in that case.
    pub fn add(
        &mut self,
        target: &Rc<EventTarget<S>>,
        class: Rc<dyn EventClass<S>>,
        state: &S,
        reference_time: SimTime,
        params: ParamMap,
    ) -> Option<Rc<Event<S>>> {
        let trigger = class.trigger_type();
        let event = Rc::new(Event::new(target, Rc::clone(&class), params));

        if trigger != TriggerType::OnExecute {
            class.setup(&event, state);
        }

        let time = if trigger.recalculates_initial_time() {
            class.recalculate_time(target, state, reference_time)
        } else {
            reference_time
        };
        if trigger.recalculates_initial_time() && time.is_never() {
            debug!(class = class.id(), target_id = %target.id(), "event not needed, dropping");
            return None;
        }
        event.set_time(time);

        debug!(
            class = class.id(),
            target_id = %target.id(),
            trigger = %trigger,
            %time,
            "registering event"
        );

        if let Some(list) = self.watch_list_mut(trigger) {
            list.push(Rc::clone(&event));
        }
        if matches!(trigger, TriggerType::Once | TriggerType::OnExecute) {
            self.update(&event);
        }
        Some(event)
    }

    /// Put `event` into the main queue at its current time, or move it there.
    ///
    /// An event whose time did not change keeps its position. A cancelled
    /// event is never queued again.
    pub fn update(&mut self, event: &Rc<Event<S>>) {
        if event.is_cancelled() {
            trace!(class = event.class_id(), "not queueing cancelled event");
            return;
        }
        let time = event.time();
        if let Some(key) = event.queue_key() {
            if key.0 == time {
                return;
            }
            self.queue.remove(&key);
        }
        let key = (time, self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.queue.insert(key, Rc::clone(event));
        event.set_queue_key(Some(key));
        debug!(class = event.class_id(), %time, "queued event");
    }

    /// Cancel `event`: it leaves the main queue and its watch-list, and
    /// later changes of its targets no longer bring it back.
    pub fn remove(&mut self, event: &Rc<Event<S>>) {
        event.cancel();
        self.discard(event);
    }

    /// Take `event` out of the main queue and its watch-list without
    /// cancelling it.
    pub(crate) fn discard(&mut self, event: &Rc<Event<S>>) {
        if let Some(key) = event.queue_key() {
            self.queue.remove(&key);
            event.set_queue_key(None);
        }
        if let Some(list) = self.watch_list_mut(event.trigger_type()) {
            list.retain(|e| !Rc::ptr_eq(e, event));
        }
    }

    /// Pop the earliest event due at or before `until`.
    pub fn take_event(&mut self, until: SimTime) -> Option<Rc<Event<S>>> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > until {
            return None;
        }
        let (_, event) = self.queue.pop_first()?;
        event.set_queue_key(None);
        Some(event)
    }

    /// Time of the next queued event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.first_key_value().map(|(key, _)| key.0)
    }

    /// Number of events in the main queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the main queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued events in execution order.
    pub fn pending_events(&self) -> Vec<Rc<Event<S>>> {
        self.queue.values().cloned().collect()
    }

    /// Registered events of a reactive kind. [`TriggerType::Once`] events
    /// live only in the main queue and yield an empty slice.
    pub fn watch_list(&self, trigger: TriggerType) -> &[Rc<Event<S>>] {
        match trigger {
            TriggerType::OnChange => &self.on_change,
            TriggerType::OnChangeImmediately => &self.on_change_immediately,
            TriggerType::OnKeyframe => &self.on_keyframe,
            TriggerType::OnExecute => &self.on_execute,
            TriggerType::Once => &[],
        }
    }

    /// Record that `event` should be reconsidered because of a change at
    /// `changed_at`.
    pub fn add_change(&self, event: &Rc<Event<S>>, changed_at: SimTime) {
        self.sink.add_change(event, changed_at);
    }

    /// Take the current change set for processing, leaving it empty.
    pub fn take_changes(&self) -> ChangeSet<S> {
        self.sink.take_current()
    }

    /// Number of changes waiting in the current set.
    pub fn pending_changes(&self) -> usize {
        self.sink.current_len()
    }

    /// Drop the current change set.
    pub fn clear_changes(&self) {
        self.sink.clear_current();
    }

    /// Make deferred changes current.
    pub fn swap_changesets(&self) {
        self.sink.swap();
    }

    /// Handle for targets that should report into this queue.
    pub const fn change_sink(&self) -> &ChangeSink<S> {
        &self.sink
    }

    fn watch_list_mut(&mut self, trigger: TriggerType) -> Option<&mut Vec<Rc<Event<S>>>> {
        match trigger {
            TriggerType::OnChange => Some(&mut self.on_change),
            TriggerType::OnChangeImmediately => Some(&mut self.on_change_immediately),
            TriggerType::OnKeyframe => Some(&mut self.on_keyframe),
            TriggerType::OnExecute => Some(&mut self.on_execute),
            TriggerType::Once => None,
        }
    }
}

impl<S> core::fmt::Debug for EventQueue<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventQueue")
            .field("queued", &self.queue.len())
            .field("on_change", &self.on_change.len())
            .field("on_change_immediately", &self.on_change_immediately.len())
            .field("on_keyframe", &self.on_keyframe.len())
            .field("on_execute", &self.on_execute.len())
            .field("changes", &self.sink)
            .finish()
    }
}
