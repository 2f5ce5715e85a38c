//! Player drop gating and placement

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chain::{BallType, BallTypeChain};
use super::physics::PhysicsWorld;
use super::state::{Container, Playfield, SessionState};

/// Why a drop request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Session already over
    GameOver,
    /// Too soon after the previous accepted drop
    Debounced,
}

/// Result of a drop request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnOutcome {
    Accepted { ball_id: u32, pos: Vec2 },
    Rejected(RejectReason),
}

impl SpawnOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SpawnOutcome::Accepted { .. })
    }
}

/// Decides what drops next, where, and whether a request is allowed
#[derive(Debug, Clone)]
pub struct SpawnController {
    debounce_ms: f64,
    margin: f32,
    offset: f32,
    last_accepted_ms: Option<f64>,
    next: BallType,
}

impl SpawnController {
    pub fn new(debounce_ms: f64, margin: f32, offset: f32, first: BallType) -> Self {
        Self {
            debounce_ms,
            margin,
            offset,
            last_accepted_ms: None,
            next: first,
        }
    }

    /// Ball type waiting to be dropped
    #[inline]
    pub fn next_ball(&self) -> &BallType {
        &self.next
    }

    /// Clamp a pointer x so a ball of `radius` clears both side walls
    pub fn clamp_x(&self, pointer_x: f32, radius: f32, container: &Container) -> f32 {
        let min = container.left() + radius + self.margin;
        let max = container.right() - radius - self.margin;
        pointer_x.max(min).min(max)
    }

    /// Drop height for a ball of `radius`, just inside the top edge
    pub fn spawn_y(&self, radius: f32, container: &Container) -> f32 {
        container.top() + radius + self.offset
    }

    /// Where the pending ball would appear for this pointer x
    pub fn preview_position(&self, pointer_x: f32, container: &Container) -> Vec2 {
        let r = self.next.radius;
        Vec2::new(
            self.clamp_x(pointer_x, r, container),
            self.spawn_y(r, container),
        )
    }

    fn check(&self, time_ms: f64, state: SessionState) -> Result<(), RejectReason> {
        if state == SessionState::Over {
            return Err(RejectReason::GameOver);
        }
        if let Some(last) = self.last_accepted_ms {
            if time_ms - last < self.debounce_ms {
                return Err(RejectReason::Debounced);
            }
        }
        Ok(())
    }

    /// Gate, place and insert the pending ball.
    ///
    /// On rejection nothing changes.
    pub fn request_spawn<W: PhysicsWorld, R: Rng>(
        &mut self,
        pointer_x: f32,
        time_ms: f64,
        state: &mut SessionState,
        chain: &BallTypeChain,
        rng: &mut R,
        playfield: &mut Playfield<W>,
    ) -> SpawnOutcome {
        if let Err(reason) = self.check(time_ms, *state) {
            log::debug!("Drop at t={time_ms} rejected: {reason:?}");
            return SpawnOutcome::Rejected(reason);
        }

        let pos = self.preview_position(pointer_x, playfield.container());
        let ball_id = playfield.insert_ball(&self.next, pos);

        if *state == SessionState::NotStarted {
            *state = SessionState::Running;
            log::info!("Session started");
        }
        self.last_accepted_ms = Some(time_ms);
        self.next = chain.choose(rng).clone();

        SpawnOutcome::Accepted { ball_id, pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::physics::BodyProperties;
    use crate::sim::world::SimpleWorld;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Rig {
        spawner: SpawnController,
        state: SessionState,
        chain: BallTypeChain,
        rng: Pcg32,
        playfield: Playfield<SimpleWorld>,
    }

    impl Rig {
        fn new() -> Self {
            let chain = BallTypeChain::default();
            let container = Container::default();
            Self {
                spawner: SpawnController::new(
                    DEBOUNCE_MS,
                    SPAWN_MARGIN,
                    SPAWN_OFFSET,
                    chain.type_at(0).clone(),
                ),
                state: SessionState::NotStarted,
                chain,
                rng: Pcg32::seed_from_u64(1),
                playfield: Playfield::new(
                    SimpleWorld::new(container, GRAVITY),
                    container,
                    BodyProperties::default(),
                ),
            }
        }

        fn drop_at(&mut self, x: f32, t: f64) -> SpawnOutcome {
            self.spawner.request_spawn(
                x,
                t,
                &mut self.state,
                &self.chain,
                &mut self.rng,
                &mut self.playfield,
            )
        }
    }

    #[test]
    fn test_first_drop_starts_session() {
        let mut rig = Rig::new();
        let outcome = rig.drop_at(250.0, 1000.0);
        assert!(outcome.is_accepted());
        assert_eq!(rig.state, SessionState::Running);
        assert_eq!(rig.playfield.live_balls().len(), 1);
    }

    #[test]
    fn test_debounce_boundary() {
        let mut rig = Rig::new();
        assert!(rig.drop_at(250.0, 1000.0).is_accepted());
        assert_eq!(
            rig.drop_at(250.0, 1139.0),
            SpawnOutcome::Rejected(RejectReason::Debounced)
        );
        assert_eq!(rig.playfield.record_count(), 1);

        let mut rig = Rig::new();
        assert!(rig.drop_at(250.0, 1000.0).is_accepted());
        assert!(rig.drop_at(250.0, 1141.0).is_accepted());
        assert_eq!(rig.playfield.record_count(), 2);
    }

    #[test]
    fn test_exact_interval_is_accepted() {
        let mut rig = Rig::new();
        assert!(rig.drop_at(250.0, 0.0).is_accepted());
        assert!(rig.drop_at(250.0, 140.0).is_accepted());
    }

    #[test]
    fn test_rejected_after_game_over_without_side_effects() {
        let mut rig = Rig::new();
        rig.state = SessionState::Over;
        let before = rig.spawner.next_ball().clone();
        assert_eq!(
            rig.drop_at(250.0, 5000.0),
            SpawnOutcome::Rejected(RejectReason::GameOver)
        );
        assert_eq!(rig.playfield.record_count(), 0);
        assert_eq!(rig.spawner.next_ball(), &before);
        assert_eq!(rig.state, SessionState::Over);
    }

    #[test]
    fn test_rejected_drop_keeps_debounce_clock() {
        let mut rig = Rig::new();
        assert!(rig.drop_at(250.0, 0.0).is_accepted());
        assert!(!rig.drop_at(250.0, 100.0).is_accepted());
        // Measured from the accepted drop, not the rejected one
        assert!(rig.drop_at(250.0, 150.0).is_accepted());
    }

    #[test]
    fn test_spawn_height_inside_top() {
        let mut rig = Rig::new();
        let SpawnOutcome::Accepted { pos, .. } = rig.drop_at(250.0, 0.0) else {
            panic!("drop rejected");
        };
        // First pending ball is rank 0 (radius 16)
        assert_eq!(pos.y, Container::default().top() + 16.0 + SPAWN_OFFSET);
    }

    #[test]
    fn test_preview_works_before_and_after() {
        let mut rig = Rig::new();
        let c = Container::default();
        let p = rig.spawner.preview_position(-1000.0, &c);
        assert_eq!(p.x, c.left() + 16.0 + SPAWN_MARGIN);
        rig.state = SessionState::Over;
        let p = rig.spawner.preview_position(10_000.0, &c);
        assert_eq!(p.x, c.right() - 16.0 - SPAWN_MARGIN);
    }

    proptest! {
        #[test]
        fn prop_clamp_keeps_ball_inside(x in -2000.0f32..2000.0, rank in 0usize..9) {
            let rig = Rig::new();
            let c = Container::default();
            let r = rig.chain.type_at(rank).radius;
            let min = c.left() + r + SPAWN_MARGIN;
            let max = c.right() - r - SPAWN_MARGIN;
            let clamped = rig.spawner.clamp_x(x, r, &c);
            if x < min {
                prop_assert_eq!(clamped, min);
            } else if x > max {
                prop_assert_eq!(clamped, max);
            } else {
                prop_assert_eq!(clamped, x);
            }
        }
    }
}
