//! Events scheduled from curve predictions.
//!
//! A tank drains linearly. An on-change event predicts from the level
//! curve when the tank runs dry and refills it at exactly that time.
//! Changing the drain rate reschedules the refill.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use keyframe_curve::{Continuous, Discrete};
use keyframe_events::{Event, EventClass, EventManager, EventTarget, ParamMap, TriggerType};
use keyframe_types::{SimTime, TargetId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CAPACITY: Decimal = dec!(12);

fn t(units: i32) -> SimTime {
    SimTime::from_int(units)
}

struct Tank {
    target: Rc<EventTarget<Tank>>,
    level: Continuous<Decimal>,
    rate: Discrete<Decimal>,
    refills: Vec<SimTime>,
}

impl Tank {
    fn new(manager: &EventManager<Self>) -> Self {
        Self {
            target: manager.new_target(TargetId::new(1)),
            level: Continuous::with_initial(SimTime::ZERO, CAPACITY),
            rate: Discrete::new(),
            refills: Vec::new(),
        }
    }

    /// Drain at `rate` per time unit from `time` on.
    fn set_rate(&mut self, time: SimTime, rate: Decimal) {
        let level = self.level.get(time).unwrap();
        self.rate.set_last(time, rate);
        self.level.set_last(time, level);
        let empty_at = time.saturating_add(SimTime::from_decimal(level / rate).unwrap());
        self.level.set_last(empty_at, Decimal::ZERO);
        self.target.changes(time);
    }
}

struct Refill;

impl EventClass<Tank> for Refill {
    fn id(&self) -> &str {
        "refill"
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnChange
    }

    fn setup(&self, event: &Rc<Event<Tank>>, state: &Tank) {
        event.depend_on(&state.target);
    }

    fn call(
        &self,
        _manager: &mut EventManager<Tank>,
        _target: &Rc<EventTarget<Tank>>,
        state: &mut Tank,
        time: SimTime,
        _params: &ParamMap,
    ) {
        state.refills.push(time);
        state.level.set_last(time, CAPACITY);
        let rate = state.rate.get(time).unwrap();
        state.set_rate(time, rate);
    }

    fn recalculate_time(&self, _target: &Rc<EventTarget<Tank>>, state: &Tank, at: SimTime) -> SimTime {
        // The last keyframe is where the tank runs dry.
        state.level.last_time().unwrap_or(SimTime::MAX).max(at)
    }
}

fn setup() -> (EventManager<Tank>, Tank) {
    let mut manager = EventManager::new();
    manager.add_class(Rc::new(Refill));
    let tank = Tank::new(&manager);
    let target = Rc::clone(&tank.target);
    manager
        .on("refill", &target, &tank, SimTime::ZERO, ParamMap::new())
        .unwrap()
        .expect("refill is needed");
    (manager, tank)
}

#[test]
fn refills_when_the_curve_reaches_zero() {
    let (mut manager, mut tank) = setup();
    tank.set_rate(SimTime::ZERO, dec!(3));

    manager.execute_until(t(20), &mut tank).unwrap();
    assert_eq!(tank.refills, vec![t(4), t(8), t(12), t(16), t(20)]);
    // The last drain is still predicted: full at 20, dry at 24.
    assert_eq!(tank.level.get(t(22)).unwrap(), dec!(6));
    assert_eq!(tank.level.last_time(), Some(t(24)));
    // Every refill replaced the dry keyframe at its own time, so earlier
    // segments read as full.
    assert_eq!(tank.level.get(t(10)).unwrap(), CAPACITY);
}

#[test]
fn rate_change_reschedules_the_refill() {
    let (mut manager, mut tank) = setup();
    tank.set_rate(SimTime::ZERO, dec!(2));
    manager.execute_until(t(2), &mut tank).unwrap();
    assert!(tank.refills.is_empty());
    assert_eq!(tank.level.get(t(2)).unwrap(), dec!(8));

    // 8 left at 4 per unit: dry at 4 instead of 6.
    tank.set_rate(t(2), dec!(4));
    manager.execute_until(t(5), &mut tank).unwrap();
    assert_eq!(tank.refills, vec![t(4)]);
    assert_eq!(tank.level.get(t(5)).unwrap(), dec!(8));
}
