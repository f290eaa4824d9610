//! Event classes: the behaviour shared by every event of one kind.
//!
//! An [`EventClass`] is registered once with the [`EventManager`] and then
//! instantiated as many [`Event`]s as needed. The class decides when its
//! events run ([`TriggerType`] plus [`EventClass::recalculate_time`]) and
//! what they do ([`EventClass::call`]).

use core::fmt;
use std::rc::Rc;

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::manager::EventManager;
use crate::params::ParamMap;
use crate::target::EventTarget;

/// When the events of a class are scheduled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Rescheduled with [`EventClass::recalculate_time`] whenever a watched
    /// target changes. Changes are batched per fixpoint round.
    OnChange,
    /// Scheduled at exactly the change time of a watched target.
    OnChangeImmediately,
    /// Scheduled at the time passed to [`EventTarget::trigger`].
    OnKeyframe,
    /// Re-armed after every execution until
    /// [`EventClass::recalculate_time`] returns [`SimTime::NEVER`].
    OnExecute,
    /// Executes at most once; may be rescheduled by changes until then.
    Once,
}

impl TriggerType {
    /// Whether [`EventTarget::changes`] notifies events of this kind.
    pub const fn reacts_to_changes(self) -> bool {
        matches!(self, Self::OnChange | Self::OnChangeImmediately | Self::Once)
    }

    /// Whether the initial execution time comes from
    /// [`EventClass::recalculate_time`] rather than the reference time.
    pub const fn recalculates_initial_time(self) -> bool {
        matches!(self, Self::OnChange | Self::OnExecute | Self::Once)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OnChange => "on_change",
            Self::OnChangeImmediately => "on_change_immediately",
            Self::OnKeyframe => "on_keyframe",
            Self::OnExecute => "on_execute",
            Self::Once => "once",
        };
        f.write_str(name)
    }
}

/// Behaviour of one kind of event operating on state `S`.
///
/// Implementations are stateless descriptors shared behind an `Rc`; all
/// mutable data lives in `S` or in the curves it owns.
pub trait EventClass<S> {
    /// Unique identifier used for registration and lookup.
    fn id(&self) -> &str;

    /// When events of this class are scheduled.
    fn trigger_type(&self) -> TriggerType;

    /// Register dependency edges for a freshly created event, usually via
    /// [`Event::depend_on`]. Not called for [`TriggerType::OnExecute`].
    fn setup(&self, event: &Rc<Event<S>>, state: &S) {
        let _ = (event, state);
    }

    /// Apply the event's effects at `time`.
    ///
    /// The manager is passed so the body can create or remove events.
    fn call(
        &self,
        manager: &mut EventManager<S>,
        target: &Rc<EventTarget<S>>,
        state: &mut S,
        time: SimTime,
        params: &ParamMap,
    );

    /// Compute the next execution time after something happened at `at`.
    ///
    /// Returning [`SimTime::NEVER`] drops the event. The result need not be
    /// later than the previous time; the queue repositions either way.
    fn recalculate_time(&self, target: &Rc<EventTarget<S>>, state: &S, at: SimTime) -> SimTime;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_reaction_by_kind() {
        assert!(TriggerType::OnChange.reacts_to_changes());
        assert!(TriggerType::OnChangeImmediately.reacts_to_changes());
        assert!(TriggerType::Once.reacts_to_changes());
        assert!(!TriggerType::OnKeyframe.reacts_to_changes());
        assert!(!TriggerType::OnExecute.reacts_to_changes());
    }

    #[test]
    fn initial_time_source_by_kind() {
        assert!(TriggerType::OnExecute.recalculates_initial_time());
        assert!(!TriggerType::OnKeyframe.recalculates_initial_time());
        assert!(!TriggerType::OnChangeImmediately.recalculates_initial_time());
    }

    #[test]
    fn display_matches_serde_names() {
        assert_eq!(TriggerType::OnChangeImmediately.to_string(), "on_change_immediately");
    }
}
