//! Game session and per-tick entry point
//!
//! One tick: the physics world advances, its collision-start notifications
//! are resolved into merges, then the overflow check runs. Drops arrive
//! between ticks and are applied atomically.

use anyhow::Result;
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::chain::{BallType, BallTypeChain};
use super::merge::MergeResolver;
use super::overflow::GameOverDetector;
use super::physics::{CollisionPair, PhysicsWorld};
use super::spawn::{SpawnController, SpawnOutcome};
use super::state::{
    BallView, Container, EventKind, GameEvent, Playfield, Score, SessionState, Snapshot,
};
use super::world::SimpleWorld;
use crate::settings::GameConfig;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub merges: u32,
    /// This tick flipped the session to Over
    pub game_over: bool,
}

/// A single play-through: NotStarted -> Running -> Over
#[derive(Debug)]
pub struct GameSession<W: PhysicsWorld> {
    rng: Pcg32,
    chain: BallTypeChain,
    state: SessionState,
    score: Score,
    spawner: SpawnController,
    resolver: MergeResolver,
    detector: GameOverDetector,
    playfield: Playfield<W>,
    events: Vec<GameEvent>,
    time_ticks: u64,
}

impl GameSession<SimpleWorld> {
    /// Session backed by the built-in physics world
    pub fn new(config: &GameConfig) -> Result<Self> {
        let world = SimpleWorld::new(config.container, config.gravity);
        Self::with_world(config, world)
    }
}

impl<W: PhysicsWorld> GameSession<W> {
    /// Session over any physics world. Fails only on invalid config.
    pub fn with_world(config: &GameConfig, world: W) -> Result<Self> {
        config.validate()?;
        let chain = config.chain()?;
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let first = chain.choose(&mut rng).clone();

        log::info!(
            "Session created (seed {}, {} ranks, debounce {} ms)",
            config.seed,
            chain.count(),
            config.debounce_ms
        );

        Ok(Self {
            rng,
            chain,
            state: SessionState::NotStarted,
            score: Score::new(),
            spawner: SpawnController::new(
                config.debounce_ms,
                config.spawn_margin,
                config.spawn_offset,
                first,
            ),
            resolver: MergeResolver::new(config.promotion_bonus, config.terminal_bonus),
            detector: GameOverDetector::new(config.overflow_epsilon),
            playfield: Playfield::new(world, config.container, config.body),
            events: Vec::new(),
            time_ticks: 0,
        })
    }

    /// Resolve this tick's notifications, then check for overflow.
    ///
    /// No-op once the session is over.
    pub fn tick(&mut self, notifications: &[CollisionPair], time_ms: f64) -> TickOutcome {
        if self.state == SessionState::Over {
            return TickOutcome::default();
        }
        self.time_ticks += 1;

        let merges = self.resolver.resolve(
            notifications,
            &self.chain,
            &mut self.playfield,
            &mut self.score,
            &mut self.events,
        );

        let mut game_over = false;
        if self.state == SessionState::Running {
            let live = self.playfield.live_balls();
            if self.detector.evaluate(&live, self.playfield.container()) {
                self.state = SessionState::Over;
                game_over = true;
                log::info!(
                    "Game over at t={time_ms:.0} ms: final score {}, {} balls",
                    self.score.current(),
                    live.len()
                );
            }
        }

        TickOutcome { merges, game_over }
    }

    /// Advance physics one step, pull its notifications and tick.
    ///
    /// Physics is frozen once the session is over.
    pub fn step(&mut self, dt: f32, time_ms: f64) -> TickOutcome {
        if self.state == SessionState::Over {
            return TickOutcome::default();
        }
        let world = self.playfield.world_mut();
        world.step(dt);
        let notifications = world.collisions_since_last_tick();
        self.tick(&notifications, time_ms)
    }

    /// Player drop at `pointer_x`
    pub fn handle_spawn_request(&mut self, pointer_x: f32, time_ms: f64) -> SpawnOutcome {
        let rank = self.spawner.next_ball().rank;
        let visual_key = self.spawner.next_ball().visual_key.clone();
        let outcome = self.spawner.request_spawn(
            pointer_x,
            time_ms,
            &mut self.state,
            &self.chain,
            &mut self.rng,
            &mut self.playfield,
        );
        if let SpawnOutcome::Accepted { pos, .. } = outcome {
            self.events.push(GameEvent {
                kind: EventKind::Drop,
                pos,
                rank,
                visual_key,
            });
        }
        outcome
    }

    /// Boolean form of [`Self::handle_spawn_request`]
    pub fn request_spawn(&mut self, pointer_x: f32, time_ms: f64) -> bool {
        self.handle_spawn_request(pointer_x, time_ms).is_accepted()
    }

    /// Hover indicator position for the pending ball
    pub fn preview_position(&self, pointer_x: f32) -> Vec2 {
        self.spawner
            .preview_position(pointer_x, self.playfield.container())
    }

    /// Insert a ball directly, bypassing gating and clamping
    pub fn insert_ball(&mut self, rank: usize, pos: Vec2) -> Option<u32> {
        let ball_type = self.chain.get(rank)?;
        Some(self.playfield.insert_ball(ball_type, pos))
    }

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn score(&self) -> &Score {
        &self.score
    }

    #[inline]
    pub fn next_ball(&self) -> &BallType {
        self.spawner.next_ball()
    }

    pub fn chain(&self) -> &BallTypeChain {
        &self.chain
    }

    pub fn container(&self) -> &Container {
        self.playfield.container()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn live_balls(&self) -> Vec<BallView> {
        self.playfield.live_balls()
    }

    pub fn playfield(&self) -> &Playfield<W> {
        &self.playfield
    }

    /// Render/host view of the whole session
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_state: self.state,
            score: self.score.current(),
            next_ball: self.spawner.next_ball().clone(),
            balls: self.playfield.live_balls(),
            container: *self.playfield.container(),
            tick: self.time_ticks,
        }
    }
}
