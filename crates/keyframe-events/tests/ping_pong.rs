//! Two objects that keep handing a change back and forth.
//!
//! Each event reacts to a change of the *other* object by bumping its own
//! number one time unit later, which in turn wakes the other event. The
//! traces below pin down exactly when each side runs for a sequence of
//! `execute_until` calls.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::rc::Rc;

use keyframe_events::{EventClass, EventManager, EventTarget, ParamMap, TriggerType};
use keyframe_types::{SimTime, TargetId};

fn t(units: i32) -> SimTime {
    SimTime::from_int(units)
}

struct TestObject {
    target: Rc<EventTarget<TestState>>,
    number: i32,
}

impl TestObject {
    fn set_number(&mut self, number: i32, time: SimTime) {
        self.number = number;
        self.target.changes(time + SimTime::ONE);
    }
}

struct TestState {
    a: TestObject,
    b: TestObject,
    trace: Vec<(&'static str, SimTime)>,
}

impl TestState {
    fn new(manager: &EventManager<Self>) -> Self {
        Self {
            a: TestObject {
                target: manager.new_target(TargetId::new(0)),
                number: 0,
            },
            b: TestObject {
                target: manager.new_target(TargetId::new(1)),
                number: 0,
            },
            trace: Vec::new(),
        }
    }

    fn number_of(&self, id: TargetId) -> i32 {
        if id == self.a.target.id() {
            self.a.number
        } else {
            self.b.number
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// Watches the other side and bumps its own side `delay` after a change.
struct Bump {
    name: &'static str,
    side: Side,
    delay: i32,
}

impl EventClass<TestState> for Bump {
    fn id(&self) -> &str {
        self.name
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnChange
    }

    fn setup(&self, event: &Rc<keyframe_events::Event<TestState>>, state: &TestState) {
        match self.side {
            Side::A => event.depend_on(&state.b.target),
            Side::B => event.depend_on(&state.a.target),
        }
    }

    fn call(
        &self,
        _manager: &mut EventManager<TestState>,
        target: &Rc<EventTarget<TestState>>,
        state: &mut TestState,
        time: SimTime,
        _params: &ParamMap,
    ) {
        let next = state.number_of(target.id()) + 1;
        match self.side {
            Side::A => {
                state.a.set_number(next, time);
                state.trace.push(("A", time));
            }
            Side::B => {
                state.b.set_number(next, time);
                state.trace.push(("B", time));
            }
        }
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<TestState>>,
        _state: &TestState,
        at: SimTime,
    ) -> SimTime {
        at + t(self.delay)
    }
}

fn run(on_b: Bump, start: SimTime) -> Vec<(&'static str, SimTime)> {
    let mut manager = EventManager::new();
    manager.add_class(Rc::new(Bump {
        name: "test_on_A",
        side: Side::A,
        delay: 2,
    }));
    manager.add_class(Rc::new(on_b));

    let mut state = TestState::new(&manager);
    let (a, b) = (Rc::clone(&state.a.target), Rc::clone(&state.b.target));
    manager
        .on("test_on_B", &b, &state, t(1), ParamMap::new())
        .unwrap()
        .expect("dependent event is kept");
    manager
        .on("test_on_A", &a, &state, t(1), ParamMap::new())
        .unwrap()
        .expect("dependent event is kept");

    state.a.set_number(0, start);

    for step in 1..=10 {
        manager.execute_until(t(step * 2), &mut state).unwrap();
    }
    state.trace
}

#[test]
fn single_class_ping_pong() {
    let trace = run(
        Bump {
            name: "test_on_B",
            side: Side::B,
            delay: 2,
        },
        t(0),
    );
    let expected = vec![
        ("B", t(3)),
        ("A", t(6)),
        ("B", t(9)),
        ("A", t(12)),
        ("B", t(15)),
        ("A", t(18)),
    ];
    assert_eq!(trace, expected);
}

#[test]
fn two_class_ping_pong() {
    let trace = run(
        Bump {
            name: "test_on_B",
            side: Side::B,
            delay: 1,
        },
        t(1),
    );
    let expected = vec![
        ("B", t(3)),
        ("A", t(6)),
        ("B", t(8)),
        ("A", t(11)),
        ("B", t(13)),
        ("A", t(16)),
        ("B", t(18)),
    ];
    assert_eq!(trace, expected);
}

#[test]
fn traces_are_reproducible() {
    let make = || Bump {
        name: "test_on_B",
        side: Side::B,
        delay: 1,
    };
    assert_eq!(run(make(), t(1)), run(make(), t(1)));
}

#[test]
fn trace_never_goes_back_in_time() {
    let trace = run(
        Bump {
            name: "test_on_B",
            side: Side::B,
            delay: 2,
        },
        t(0),
    );
    assert!(trace.windows(2).all(|w| w[0].1 <= w[1].1));
}
