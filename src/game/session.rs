//! The game session - one owner for all mutable game state.
//!
//! Presentation code reads [`Session::state`] and talks to the session only
//! through its command methods:
//! - [`Session::apply_aim_change`] / [`Session::apply_shoot`] / [`Session::apply_reset`]
//! - [`Session::tick`], called once per fixed simulation step
//! - [`Session::resolve_settle`], called once the pop highlight has been shown
//!
//! Each command runs to completion, so there is never a half-applied turn.
//! Noteworthy changes are queued as [`SessionEvent`]s and relayed as Bevy
//! messages for the audio and notification layers.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    bubble::{Bubble, BubbleColor, BubbleId},
    cluster::{find_cluster, find_floating, is_poppable},
    grid::{GRID_COLS, GRID_ROWS, GridBounds, INITIAL_ROWS},
    hex::{BUBBLE_SIZE, GridCoord, PlayArea},
    projectile::{Projectile, SHOT_SPEED, StepOutcome},
    state::{GameState, clamp_angle, reached_danger_zone, rows_for_level, score_for},
};
use crate::{AppSystems, PausableSystems};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GameConfig>();
    app.init_resource::<GameConfig>();
    app.add_message::<SessionEvent>();
    app.init_resource::<Session>();
    app.init_resource::<SettleTimer>();

    app.configure_sets(Update, SessionRelay.in_set(AppSystems::Update));
    app.add_systems(
        Update,
        pace_settle
            .in_set(AppSystems::TickTimers)
            .in_set(PausableSystems),
    );
    app.add_systems(Update, relay_session_events.in_set(SessionRelay));
}

/// Systems that publish queued [`SessionEvent`]s; readers run after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionRelay;

/// How long popped bubbles stay highlighted before they are removed.
pub const POP_DELAY_SECS: f32 = 0.3;

/// Tunable numbers for a session.
///
/// Read once when the [`Session`] resource is created.
#[derive(Resource, Debug, Clone, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct GameConfig {
    pub bubble_size: f32,
    pub rows: i32,
    /// Columns in even rows.
    pub cols: i32,
    /// Pixels per simulation tick.
    pub shot_speed: f32,
    pub pop_delay_secs: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bubble_size: BUBBLE_SIZE,
            rows: GRID_ROWS,
            cols: GRID_COLS,
            shot_speed: SHOT_SPEED,
            pop_delay_secs: POP_DELAY_SECS,
        }
    }
}

impl GameConfig {
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.rows, self.cols)
    }

    pub fn play_area(&self) -> PlayArea {
        PlayArea::new(self.rows, self.cols, self.bubble_size)
    }
}

/// Where the current shot is in its life cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ShotPhase {
    /// Ready to shoot.
    #[default]
    Idle,
    InFlight(Projectile),
    /// A group popped and waits for [`Session::resolve_settle`].
    Settling(PendingPop),
}

/// A popped group waiting to be removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPop {
    pub cluster: Vec<GridCoord>,
    /// Distinguishes this pop from any earlier one, so a timer started for a
    /// previous pop can never settle this one.
    pub ticket: u64,
}

/// Something the audio or notification layers may react to.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ShotFired { color: BubbleColor },
    Bounced,
    Landed { coord: GridCoord, color: BubbleColor },
    Popped { count: usize, color: BubbleColor },
    Dropped { count: usize },
    Scored { points: u32, total: u32 },
    LevelUp { level: u32 },
    GameOver { score: u32 },
    Reset,
}

/// The single owner of [`GameState`].
#[derive(Resource, Debug)]
pub struct Session {
    config: GameConfig,
    state: GameState,
    phase: ShotPhase,
    rng: StdRng,
    next_id: u64,
    next_ticket: u64,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Start a session with OS-seeded randomness.
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Start a reproducible session.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, mut rng: StdRng) -> Self {
        let active = BubbleColor::random(&mut rng);
        let next = BubbleColor::random(&mut rng);
        let mut session = Self {
            state: GameState::new(config.bounds(), active, next),
            config,
            phase: ShotPhase::Idle,
            rng,
            next_id: 0,
            next_ticket: 0,
            events: Vec::new(),
        };
        session.fill_grid(INITIAL_ROWS);
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> &ShotPhase {
        &self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn play_area(&self) -> PlayArea {
        self.config.play_area()
    }

    /// Whether a shot would be accepted right now.
    pub fn can_shoot(&self) -> bool {
        !self.state.game_over && self.phase == ShotPhase::Idle
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Point the shooter. Out-of-range angles are clamped.
    pub fn apply_aim_change(&mut self, angle: f32) {
        self.state.active_bubble.angle = clamp_angle(angle);
    }

    /// Fire the loaded bubble.
    ///
    /// Ignored while a shot is in flight or settling, and after game over.
    /// Returns whether a shot was fired.
    pub fn apply_shoot(&mut self) -> bool {
        if !self.can_shoot() {
            debug!("Shoot ignored in phase {:?}", self.phase);
            return false;
        }

        let active = self.state.active_bubble;
        let projectile = Projectile::launch(
            self.play_area().launch_position(),
            active.angle,
            self.config.shot_speed,
            active.color,
        );
        debug!("Shot {:?} at {:.1} degrees", active.color, active.angle);

        self.phase = ShotPhase::InFlight(projectile);
        self.events.push(SessionEvent::ShotFired {
            color: active.color,
        });
        true
    }

    /// Advance the in-flight projectile by one simulation step.
    pub fn tick(&mut self) {
        let area = self.play_area();
        let ShotPhase::InFlight(projectile) = &mut self.phase else {
            return;
        };

        match projectile.step(&self.state.bubbles, &area) {
            StepOutcome::Moved => {}
            StepOutcome::Bounced => self.events.push(SessionEvent::Bounced),
            StepOutcome::Collided(at) => self.resolve_pop(at),
        }
    }

    /// Land the in-flight bubble at a collision position and check for a pop.
    ///
    /// A pop marks the group as popping and waits for
    /// [`Session::resolve_settle`]; anything else finishes the turn at once.
    pub fn resolve_pop(&mut self, position: Vec2) {
        let color = match &self.phase {
            ShotPhase::InFlight(projectile) => projectile.color,
            _ => return,
        };
        self.phase = ShotPhase::Idle;
        let target = GridCoord::from_position(position, self.config.bubble_size);

        let Some(coord) = self.state.bubbles.closest_empty_cell(target) else {
            warn!("No free cell near {}, discarding {:?} shot", target, color);
            self.finish_turn_without_pop();
            return;
        };

        let id = self.next_bubble_id();
        self.state.bubbles.insert(Bubble::new(id, color, coord));
        self.events.push(SessionEvent::Landed { coord, color });
        info!("Bubble landed at {} with color {:?}", coord, color);

        let cluster = find_cluster(&self.state.bubbles, coord);
        if !is_poppable(&cluster) {
            self.finish_turn_without_pop();
            return;
        }

        info!("Found cluster of {} {:?} bubbles at {}", cluster.len(), color, coord);
        for &member in &cluster {
            if let Some(bubble) = self.state.bubbles.get_mut(member) {
                bubble.is_popping = true;
            }
        }
        self.events.push(SessionEvent::Popped {
            count: cluster.len(),
            color,
        });

        self.next_ticket += 1;
        self.phase = ShotPhase::Settling(PendingPop {
            cluster,
            ticket: self.next_ticket,
        });
    }

    /// Remove the popped group and whatever it left hanging, then score.
    ///
    /// Does nothing unless a pop is waiting.
    pub fn resolve_settle(&mut self) {
        let pending = match &self.phase {
            ShotPhase::Settling(pending) => pending.clone(),
            _ => {
                debug!("Settle requested with no pop pending");
                return;
            }
        };
        self.phase = ShotPhase::Idle;

        let popped = self.state.bubbles.remove_all(&pending.cluster);
        let floating = find_floating(&self.state.bubbles);
        let dropped = self.state.bubbles.remove_all(&floating);
        if dropped > 0 {
            info!("Found {} floating bubbles to remove", dropped);
            self.events.push(SessionEvent::Dropped { count: dropped });
        }

        let points = score_for(popped) + score_for(dropped);
        self.state.add_score(points);
        self.events.push(SessionEvent::Scored {
            points,
            total: self.state.score,
        });
        info!("+{} points (total: {})", points, self.state.score);

        if self.state.bubbles.is_empty() {
            self.level_up();
        }

        self.rotate_bubbles();
    }

    /// Start over: fresh grid, score and level. The high score survives.
    ///
    /// Any in-flight shot or pending pop is dropped with the old grid.
    pub fn apply_reset(&mut self) {
        self.phase = ShotPhase::Idle;
        let high_score = self.state.high_score;
        let active = BubbleColor::random(&mut self.rng);
        let next = BubbleColor::random(&mut self.rng);

        self.state = GameState::new(self.config.bounds(), active, next);
        self.state.high_score = high_score;
        self.fill_grid(INITIAL_ROWS);

        self.events.push(SessionEvent::Reset);
        info!("Session reset");
    }

    fn finish_turn_without_pop(&mut self) {
        if reached_danger_zone(&self.state.bubbles) {
            self.state.game_over = true;
            self.events.push(SessionEvent::GameOver {
                score: self.state.score,
            });
            info!("GAME OVER! Bubbles reached the danger zone. Final score: {}", self.state.score);
        }
        self.rotate_bubbles();
        self.phase = ShotPhase::Idle;
    }

    fn level_up(&mut self) {
        self.state.level += 1;
        let rows = rows_for_level(self.state.level, self.config.rows);
        self.fill_grid(rows);
        self.events.push(SessionEvent::LevelUp {
            level: self.state.level,
        });
        info!("Level {} with {} rows", self.state.level, rows);
    }

    /// Next becomes active; a new next is drawn. The aim is kept.
    fn rotate_bubbles(&mut self) {
        self.state.active_bubble.color = self.state.next_bubble;
        self.state.next_bubble = BubbleColor::random(&mut self.rng);
    }

    fn fill_grid(&mut self, rows: i32) {
        let next_id = &mut self.next_id;
        self.state.bubbles.populate(rows, &mut self.rng, || {
            *next_id += 1;
            BubbleId(*next_id)
        });
    }

    fn next_bubble_id(&mut self) -> BubbleId {
        self.next_id += 1;
        BubbleId(self.next_id)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

impl FromWorld for Session {
    fn from_world(world: &mut World) -> Self {
        let config = world
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();
        Self::new(config)
    }
}

/// Paces the pop-to-settle delay for the current pending pop.
#[derive(Resource, Debug, Default)]
struct SettleTimer(Option<(u64, Timer)>);

fn pace_settle(time: Res<Time>, mut settle: ResMut<SettleTimer>, mut session: ResMut<Session>) {
    let ShotPhase::Settling(pending) = session.phase() else {
        settle.0 = None;
        return;
    };
    let ticket = pending.ticket;

    if settle.0.as_ref().is_none_or(|(started_for, _)| *started_for != ticket) {
        let delay = session.config().pop_delay_secs;
        settle.0 = Some((ticket, Timer::from_seconds(delay, TimerMode::Once)));
    }

    let finished = match settle.0.as_mut() {
        Some((_, timer)) => timer.tick(time.delta()).just_finished(),
        None => false,
    };

    if finished {
        settle.0 = None;
        session.resolve_settle();
    }
}

fn relay_session_events(mut session: ResMut<Session>, mut writer: MessageWriter<SessionEvent>) {
    for event in session.drain_events() {
        writer.write(event);
    }
}
