//! Headless Pong expressed as curves and events.
//!
//! Nothing here advances in fixed ticks. The ball travels on straight
//! lines between predicted collisions, and every collision is an event
//! whose execution time is derived from the curves:
//!
//! | Class | Trigger | Target | Effect |
//! |---|---|---|---|
//! | `pong.serve` | on keyframe | ball | centre the ball, pick a random direction |
//! | `pong.reflect_wall` | on change | ball | flip the vertical speed at a wall |
//! | `pong.reflect_panel` | on change | ball | return the ball or score a miss |
//! | `pong.steer` | on execute | paddle | move a paddle toward the ball |
//! | `pong.score` | on change immediately | score | report lives, detect the loser |
//! | `pong.match_over` | once | ball | record the end of the match |
//!
//! # Design Principles
//!
//! - The only randomness is the serve direction, drawn from a seeded
//!   [`StdRng`]; two runs with the same seed produce the same match.
//! - Positions, speeds and times are [`Decimal`] or [`SimTime`], never
//!   floats.
//! - Collision times are rounded down to the time resolution, so the ball
//!   never leaves the field.

use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;

use keyframe_curve::{Continuous, CurveError, Discrete, Segmented};
use keyframe_events::{Event, EventClass, EventManager, EventTarget, ParamMap, TriggerType};
use keyframe_types::{SimTime, TargetId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::config::PongConfig;
use crate::error::EngineError;

/// Class id of the serve event.
pub const SERVE: &str = "pong.serve";
/// Class id of the wall collision event.
pub const REFLECT_WALL: &str = "pong.reflect_wall";
/// Class id of the goal line collision event.
pub const REFLECT_PANEL: &str = "pong.reflect_panel";
/// Class id of the paddle steering event.
pub const STEER: &str = "pong.steer";
/// Class id of the score report event.
pub const SCORE: &str = "pong.score";
/// Class id of the end-of-match event.
pub const MATCH_OVER: &str = "pong.match_over";

const PARAM_MAX_SPEED: &str = "max_speed";
const PARAM_LOSER: &str = "loser";

/// Vertical serve speed as a percentage of the horizontal one.
const SERVE_RISE_PERCENT: core::ops::RangeInclusive<u32> = 25..=75;

const BALL_ID: TargetId = TargetId::new(0);
const LEFT_PADDLE_ID: TargetId = TargetId::new(1);
const RIGHT_PADDLE_ID: TargetId = TargetId::new(2);
const LEFT_SCORE_ID: TargetId = TargetId::new(3);
const RIGHT_SCORE_ID: TargetId = TargetId::new(4);

/// A point or velocity on the field: `[x, y]`.
pub type Vec2 = [Decimal; 2];

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Defends the goal line at `x = 0`.
    Left,
    /// Defends the goal line at `x = width`.
    Right,
}

impl Side {
    /// The other player.
    pub const fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The player whose goal line a ball with horizontal speed `vx` is
    /// heading for.
    fn facing(vx: Decimal) -> Option<Self> {
        match vx.cmp(&Decimal::ZERO) {
            Ordering::Less => Some(Self::Left),
            Ordering::Greater => Some(Self::Right),
            Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// The ball: a piecewise linear path and a speed that jumps at collisions.
#[derive(Debug)]
pub struct Ball {
    target: Rc<EventTarget<PongState>>,
    position: Continuous<Vec2>,
    speed: Segmented<Vec2>,
}

/// A player: a paddle on its goal line and the lives it has left.
#[derive(Debug)]
pub struct Player {
    side: Side,
    /// Changes when the paddle moves.
    body: Rc<EventTarget<PongState>>,
    /// Changes when the lives change.
    score: Rc<EventTarget<PongState>>,
    /// Centre of the paddle along the goal line.
    paddle: Continuous<Decimal>,
    lives: Discrete<i64>,
}

impl Player {
    fn new(
        side: Side,
        body: Rc<EventTarget<PongState>>,
        score: Rc<EventTarget<PongState>>,
        config: &PongConfig,
        start: SimTime,
    ) -> Self {
        Self {
            side,
            body,
            score,
            paddle: Continuous::with_initial(start, half(config.height)),
            lives: Discrete::with_initial(start, config.lives),
        }
    }
}

/// Counters collected while the match runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Serves performed.
    pub serves: u32,
    /// Bounces off the top or bottom wall.
    pub wall_bounces: u32,
    /// Balls returned by a paddle.
    pub paddle_returns: u32,
    /// Balls that crossed a goal line.
    pub misses: u32,
    /// Set as soon as one player has no lives left.
    pub winner: Option<Side>,
    /// When the end-of-match event ran.
    pub finished_at: Option<SimTime>,
}

/// Serializable snapshot of a match at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// The time the snapshot was taken at.
    pub time: Decimal,
    /// The winning side, if the match is decided.
    pub winner: Option<Side>,
    /// When the match ended, if it did.
    pub finished_at: Option<Decimal>,
    /// Lives of the left player.
    pub left_lives: i64,
    /// Lives of the right player.
    pub right_lives: i64,
    /// Ball position.
    pub ball: Vec2,
    /// Centre of the left paddle.
    pub left_paddle: Decimal,
    /// Centre of the right paddle.
    pub right_paddle: Decimal,
    /// Serves performed.
    pub serves: u32,
    /// Wall bounces.
    pub wall_bounces: u32,
    /// Paddle returns.
    pub paddle_returns: u32,
    /// Misses.
    pub misses: u32,
}

/// Everything the Pong events read and write.
#[derive(Debug)]
pub struct PongState {
    config: PongConfig,
    ball: Ball,
    left: Player,
    right: Player,
    rng: StdRng,
    stats: MatchStats,
}

impl PongState {
    /// Create a match whose ball rests in the centre at `start`.
    ///
    /// Targets are created on `manager`, so the state must be driven by
    /// that manager.
    pub fn new(manager: &EventManager<Self>, config: PongConfig, start: SimTime) -> Self {
        let mut speed = Segmented::new();
        speed.set_last(start, [Decimal::ZERO, Decimal::ZERO]);
        let ball = Ball {
            target: manager.new_target(BALL_ID),
            position: Continuous::with_initial(start, centre(&config)),
            speed,
        };
        let left = Player::new(
            Side::Left,
            manager.new_target(LEFT_PADDLE_ID),
            manager.new_target(LEFT_SCORE_ID),
            &config,
            start,
        );
        let right = Player::new(
            Side::Right,
            manager.new_target(RIGHT_PADDLE_ID),
            manager.new_target(RIGHT_SCORE_ID),
            &config,
            start,
        );
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            ball,
            left,
            right,
            stats: MatchStats::default(),
        }
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Whether one player has run out of lives.
    pub const fn is_finished(&self) -> bool {
        self.stats.winner.is_some()
    }

    /// Ball position at `time`.
    pub fn ball_position(&self, time: SimTime) -> Result<Vec2, CurveError> {
        self.ball.position.get(time)
    }

    /// Centre of `side`'s paddle at `time`.
    pub fn paddle_position(&self, side: Side, time: SimTime) -> Result<Decimal, CurveError> {
        self.player(side).paddle.get(time)
    }

    /// Lives `side` has left at `time`.
    pub fn lives(&self, side: Side, time: SimTime) -> Result<i64, CurveError> {
        self.player(side).lives.get(time)
    }

    /// Snapshot of the match at `time`.
    pub fn summary(&self, time: SimTime) -> Result<MatchSummary, CurveError> {
        Ok(MatchSummary {
            time: time.to_decimal(),
            winner: self.stats.winner,
            finished_at: self.stats.finished_at.map(SimTime::to_decimal),
            left_lives: self.lives(Side::Left, time)?,
            right_lives: self.lives(Side::Right, time)?,
            ball: self.ball_position(time)?,
            left_paddle: self.paddle_position(Side::Left, time)?,
            right_paddle: self.paddle_position(Side::Right, time)?,
            serves: self.stats.serves,
            wall_bounces: self.stats.wall_bounces,
            paddle_returns: self.stats.paddle_returns,
            misses: self.stats.misses,
        })
    }

    const fn player(&self, side: Side) -> &Player {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    const fn player_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// The player owning a paddle or score target.
    fn side_of(&self, id: TargetId) -> Option<Side> {
        [&self.left, &self.right]
            .into_iter()
            .find(|p| p.body.id() == id || p.score.id() == id)
            .map(|p| p.side)
    }

    fn is_decided(&self, time: SimTime) -> Result<bool, CurveError> {
        Ok(self.lives(Side::Left, time)? <= 0 || self.lives(Side::Right, time)? <= 0)
    }

    fn ball_motion(&self, time: SimTime) -> Result<(Vec2, Vec2), CurveError> {
        Ok((self.ball.position.get(time)?, self.ball.speed.get(time)?))
    }

    fn time_to_wall(&self, position: Vec2, speed: Vec2) -> Option<Decimal> {
        let [_, y] = position;
        let [_, vy] = speed;
        time_to_boundary(y, vy, self.config.height)
    }

    fn time_to_goal(&self, position: Vec2, speed: Vec2) -> Option<Decimal> {
        let [x, _] = position;
        let [vx, _] = speed;
        time_to_boundary(x, vx, self.config.width)
    }

    /// Rewrite the ball path from `now` up to its next collision.
    fn predict_ball(&mut self, now: SimTime) -> Result<(), EngineError> {
        let (position, speed) = self.ball_motion(now)?;
        self.ball.position.set_last(now, position);

        let next = [
            self.time_to_wall(position, speed),
            self.time_to_goal(position, speed),
        ]
        .into_iter()
        .flatten()
        .min();
        let Some(travel) = next else {
            return Ok(());
        };
        let arrival = now.saturating_add(SimTime::from_decimal(travel)?);
        let elapsed = arrival.saturating_sub(now).to_decimal();
        self.ball
            .position
            .set_last(arrival, advance(position, speed, elapsed));
        trace!(%now, %arrival, "ball path predicted");
        Ok(())
    }

    fn serve(&mut self, now: SimTime) -> Result<(), EngineError> {
        if self.is_decided(now)? {
            debug!(time = %now, "match decided, ball stays down");
            self.ball.target.changes(now);
            return Ok(());
        }

        let previous = self.ball.speed.get(now)?;
        let speed = self.serve_speed();
        self.ball.position.set_last(now, centre(&self.config));
        self.ball.speed.set_last_jump(now, previous, speed);
        self.stats.serves = self.stats.serves.saturating_add(1);
        self.predict_ball(now)?;
        self.ball.target.changes(now);

        let [vx, vy] = speed;
        info!(time = %now, %vx, %vy, serve = self.stats.serves, "ball served");
        Ok(())
    }

    fn serve_speed(&mut self) -> Vec2 {
        let horizontal = self.config.ball_speed;
        let rise = Decimal::from(self.rng.random_range(SERVE_RISE_PERCENT));
        let vertical = horizontal
            .saturating_mul(rise)
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);
        let vx = if self.rng.random_bool(0.5) {
            horizontal
        } else {
            negate(horizontal)
        };
        let vy = if self.rng.random_bool(0.5) {
            vertical
        } else {
            negate(vertical)
        };
        [vx, vy]
    }

    fn reflect_wall(&mut self, now: SimTime) -> Result<(), EngineError> {
        let ([_, y], speed) = self.ball_motion(now)?;
        let [vx, vy] = speed;
        let midline = half(self.config.height);
        let toward_wall = match vy.cmp(&Decimal::ZERO) {
            Ordering::Greater => y >= midline,
            Ordering::Less => y <= midline,
            Ordering::Equal => false,
        };
        if !toward_wall {
            trace!(time = %now, "no wall ahead of the ball");
            return Ok(());
        }

        self.ball.speed.set_last_jump(now, speed, [vx, negate(vy)]);
        self.stats.wall_bounces = self.stats.wall_bounces.saturating_add(1);
        self.predict_ball(now)?;
        self.ball.target.changes(now);
        debug!(time = %now, %y, "ball bounced off a wall");
        Ok(())
    }

    fn reflect_panel(&mut self, now: SimTime) -> Result<(), EngineError> {
        let (position, speed) = self.ball_motion(now)?;
        let [x, y] = position;
        let [vx, vy] = speed;
        let Some(side) = Side::facing(vx) else {
            return Ok(());
        };
        let midline = half(self.config.width);
        let at_goal = match side {
            Side::Left => x <= midline,
            Side::Right => x >= midline,
        };
        if !at_goal {
            trace!(time = %now, "no goal line ahead of the ball");
            return Ok(());
        }

        let paddle = self.player(side).paddle.get(now)?;
        if y.saturating_sub(paddle).abs() <= half(self.config.paddle_size) {
            self.ball.speed.set_last_jump(now, speed, [negate(vx), vy]);
            self.stats.paddle_returns = self.stats.paddle_returns.saturating_add(1);
            self.predict_ball(now)?;
            self.ball.target.changes(now);
            debug!(time = %now, %side, %y, %paddle, "paddle returned the ball");
            return Ok(());
        }

        let lives = self.player(side).lives.get(now)?.saturating_sub(1);
        self.player_mut(side).lives.set_last(now, lives);
        self.ball
            .speed
            .set_last_jump(now, speed, [Decimal::ZERO, Decimal::ZERO]);
        self.ball.position.set_last(now, position);
        self.stats.misses = self.stats.misses.saturating_add(1);
        info!(time = %now, %side, lives, %y, %paddle, "player missed the ball");

        self.player(side).score.changes(now);
        self.ball.target.trigger(now);
        Ok(())
    }

    fn steer(
        &mut self,
        side: Side,
        now: SimTime,
        interval: SimTime,
        max_speed: Decimal,
    ) -> Result<(), EngineError> {
        let current = self.player(side).paddle.get(now)?;
        let ([_, ball_y], [vx, _]) = self.ball_motion(now)?;
        let height = self.config.height;
        let aim = if Side::facing(vx) == Some(side) {
            ball_y
        } else {
            half(height)
        };

        let reach = max_speed.saturating_mul(interval.to_decimal());
        let travel = aim.saturating_sub(current).clamp(negate(reach), reach);
        let margin = half(self.config.paddle_size);
        let next = current
            .saturating_add(travel)
            .clamp(margin, height.saturating_sub(margin));

        let player = self.player_mut(side);
        player.paddle.set_last(now, current);
        player.paddle.set_last(now.saturating_add(interval), next);
        player.body.changes(now);
        trace!(time = %now, %side, from = %current, to = %next, "paddle steered");
        Ok(())
    }
}

/// Register every Pong event class on `manager`.
///
/// # Errors
///
/// Returns [`EngineError::Time`] if the steering interval cannot be
/// represented, or [`EngineError::InvalidConfig`] if it rounds to zero.
pub fn register_classes(
    manager: &mut EventManager<PongState>,
    config: &PongConfig,
) -> Result<(), EngineError> {
    let interval = SimTime::from_decimal(config.steer_interval)?;
    if interval <= SimTime::ZERO {
        return Err(EngineError::InvalidConfig {
            message: format!(
                "pong.steer_interval {} is below the time resolution",
                config.steer_interval
            ),
        });
    }

    manager.add_class(Rc::new(Serve));
    manager.add_class(Rc::new(ReflectWall));
    manager.add_class(Rc::new(ReflectPanel));
    manager.add_class(Rc::new(Steer { interval }));
    manager.add_class(Rc::new(Score));
    manager.add_class(Rc::new(MatchOver));
    Ok(())
}

/// Create the match events and serve the first ball at `start`.
///
/// # Errors
///
/// Returns [`EngineError::Event`] if [`register_classes`] has not been
/// called on `manager`.
pub fn start_match(
    manager: &mut EventManager<PongState>,
    state: &PongState,
    start: SimTime,
) -> Result<(), EngineError> {
    let ball = &state.ball.target;
    manager.on(SERVE, ball, state, start, ParamMap::new())?;
    manager.on(REFLECT_WALL, ball, state, start, ParamMap::new())?;
    manager.on(REFLECT_PANEL, ball, state, start, ParamMap::new())?;

    for side in [Side::Left, Side::Right] {
        let player = state.player(side);
        manager.on(SCORE, &player.score, state, start, ParamMap::new())?;
        let params = ParamMap::new().with(PARAM_MAX_SPEED, state.config.paddle_speed);
        manager.on(STEER, &player.body, state, start, params)?;
    }

    ball.trigger(start);
    info!(
        time = %start,
        width = %state.config.width,
        height = %state.config.height,
        lives = state.config.lives,
        seed = state.config.seed,
        "match scheduled"
    );
    Ok(())
}

fn half(value: Decimal) -> Decimal {
    value.checked_div(Decimal::TWO).unwrap_or(value)
}

fn negate(value: Decimal) -> Decimal {
    value.saturating_mul(Decimal::NEGATIVE_ONE)
}

fn centre(config: &PongConfig) -> Vec2 {
    [half(config.width), half(config.height)]
}

fn advance(position: Vec2, speed: Vec2, elapsed: Decimal) -> Vec2 {
    let [x, y] = position;
    let [vx, vy] = speed;
    [
        x.saturating_add(vx.saturating_mul(elapsed)),
        y.saturating_add(vy.saturating_mul(elapsed)),
    ]
}

/// Time for a coordinate moving at `speed` to reach `0` or `limit`.
fn time_to_boundary(coordinate: Decimal, speed: Decimal, limit: Decimal) -> Option<Decimal> {
    let distance = match speed.cmp(&Decimal::ZERO) {
        Ordering::Greater => limit.saturating_sub(coordinate),
        Ordering::Less => coordinate,
        Ordering::Equal => return None,
    };
    distance
        .checked_div(speed.abs())
        .map(|t| t.max(Decimal::ZERO))
}

/// `at` plus a travel time, or [`SimTime::MAX`] (parked) without one.
fn schedule_after(at: SimTime, travel: Option<Decimal>) -> SimTime {
    let Some(travel) = travel else {
        return SimTime::MAX;
    };
    match SimTime::from_decimal(travel) {
        Ok(delay) => at.saturating_add(delay),
        Err(err) => {
            error!(%err, "collision time out of range, parking event");
            SimTime::MAX
        }
    }
}

fn report(class: &str, time: SimTime, result: Result<(), EngineError>) {
    if let Err(err) = result {
        error!(class, %time, %err, "event failed");
    }
}

/// Serves the ball whenever the ball target is triggered.
struct Serve;

impl EventClass<PongState> for Serve {
    fn id(&self) -> &str {
        SERVE
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnKeyframe
    }

    fn setup(&self, event: &Rc<Event<PongState>>, state: &PongState) {
        event.depend_on(&state.ball.target);
    }

    fn call(
        &self,
        _manager: &mut EventManager<PongState>,
        _target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        _params: &ParamMap,
    ) {
        report(SERVE, time, state.serve(time));
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        _state: &PongState,
        at: SimTime,
    ) -> SimTime {
        at
    }
}

struct ReflectWall;

impl EventClass<PongState> for ReflectWall {
    fn id(&self) -> &str {
        REFLECT_WALL
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnChange
    }

    fn setup(&self, event: &Rc<Event<PongState>>, state: &PongState) {
        event.depend_on(&state.ball.target);
    }

    fn call(
        &self,
        _manager: &mut EventManager<PongState>,
        _target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        _params: &ParamMap,
    ) {
        report(REFLECT_WALL, time, state.reflect_wall(time));
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        state: &PongState,
        at: SimTime,
    ) -> SimTime {
        match state.ball_motion(at) {
            Ok((position, speed)) => schedule_after(at, state.time_to_wall(position, speed)),
            Err(err) => {
                error!(class = REFLECT_WALL, %at, %err, "cannot predict wall hit");
                SimTime::MAX
            }
        }
    }
}

/// Watches the ball only: paddle moves do not change when the ball
/// reaches a goal line, just what happens there.
struct ReflectPanel;

impl EventClass<PongState> for ReflectPanel {
    fn id(&self) -> &str {
        REFLECT_PANEL
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnChange
    }

    fn setup(&self, event: &Rc<Event<PongState>>, state: &PongState) {
        event.depend_on(&state.ball.target);
    }

    fn call(
        &self,
        _manager: &mut EventManager<PongState>,
        _target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        _params: &ParamMap,
    ) {
        report(REFLECT_PANEL, time, state.reflect_panel(time));
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        state: &PongState,
        at: SimTime,
    ) -> SimTime {
        match state.ball_motion(at) {
            Ok((position, speed)) => schedule_after(at, state.time_to_goal(position, speed)),
            Err(err) => {
                error!(class = REFLECT_PANEL, %at, %err, "cannot predict goal line hit");
                SimTime::MAX
            }
        }
    }
}

/// Moves a paddle every `interval` until the match is decided.
struct Steer {
    interval: SimTime,
}

impl EventClass<PongState> for Steer {
    fn id(&self) -> &str {
        STEER
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnExecute
    }

    fn call(
        &self,
        _manager: &mut EventManager<PongState>,
        target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        params: &ParamMap,
    ) {
        let Some(side) = state.side_of(target.id()) else {
            error!(target_id = %target.id(), "steering event on an unknown paddle");
            return;
        };
        let max_speed = params.get(PARAM_MAX_SPEED, state.config.paddle_speed);
        report(STEER, time, state.steer(side, time, self.interval, max_speed));
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        state: &PongState,
        at: SimTime,
    ) -> SimTime {
        if state.is_finished() {
            SimTime::NEVER
        } else {
            at.saturating_add(self.interval)
        }
    }
}

/// Reports every change of a player's lives and detects the loser.
struct Score;

impl EventClass<PongState> for Score {
    fn id(&self) -> &str {
        SCORE
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::OnChangeImmediately
    }

    fn setup(&self, event: &Rc<Event<PongState>>, _state: &PongState) {
        if let Some(target) = event.target() {
            event.depend_on(&target);
        }
    }

    fn call(
        &self,
        manager: &mut EventManager<PongState>,
        target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        _params: &ParamMap,
    ) {
        let Some(side) = state.side_of(target.id()) else {
            error!(target_id = %target.id(), "score event on an unknown player");
            return;
        };
        let lives = match state.lives(side, time) {
            Ok(lives) => lives,
            Err(err) => {
                error!(%side, %time, %err, "cannot read lives");
                return;
            }
        };
        info!(%side, lives, %time, "score changed");
        if lives > 0 || state.is_finished() {
            return;
        }

        state.stats.winner = Some(side.opponent());
        let ball = Rc::clone(&state.ball.target);
        let params = ParamMap::new().with(PARAM_LOSER, side);
        if let Err(err) = manager.on(MATCH_OVER, &ball, state, time, params) {
            error!(%err, "cannot schedule end of match");
        }
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        _state: &PongState,
        at: SimTime,
    ) -> SimTime {
        at
    }
}

/// Records when the match ended.
struct MatchOver;

impl EventClass<PongState> for MatchOver {
    fn id(&self) -> &str {
        MATCH_OVER
    }

    fn trigger_type(&self) -> TriggerType {
        TriggerType::Once
    }

    fn call(
        &self,
        _manager: &mut EventManager<PongState>,
        _target: &Rc<EventTarget<PongState>>,
        state: &mut PongState,
        time: SimTime,
        params: &ParamMap,
    ) {
        let loser = params.get_ref::<Side>(PARAM_LOSER).copied();
        state.stats.finished_at = Some(time);
        info!(
            %time,
            winner = ?state.stats.winner,
            loser = ?loser,
            serves = state.stats.serves,
            "match finished"
        );
    }

    fn recalculate_time(
        &self,
        _target: &Rc<EventTarget<PongState>>,
        _state: &PongState,
        at: SimTime,
    ) -> SimTime {
        at
    }
}
