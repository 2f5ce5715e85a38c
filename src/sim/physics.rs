//! Boundary to the rigid-body simulator
//!
//! The engine never touches positions or velocities. It inserts and removes
//! bodies, reads positions back, and pulls collision-start notifications
//! once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Generational handle into the simulator's body arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Metadata attached to every ball body, read back from notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallTag {
    pub ball_id: u32,
    pub rank: usize,
}

/// Material of a dropped or merged ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyProperties {
    /// Bounciness (0 = dead stop)
    pub restitution: f32,
    /// Tangential velocity lost per wall contact (0-1)
    pub friction: f32,
    /// Velocity lost per step to drag (0-1)
    pub air_friction: f32,
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            restitution: 0.05,
            friction: 0.12,
            air_friction: 0.02,
        }
    }
}

/// Two bodies that started touching since the last pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl CollisionPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }
}

/// The operations the engine consumes from a 2D physics simulator
pub trait PhysicsWorld {
    /// Insert a dynamic circle tagged with its ball metadata
    fn insert_body(
        &mut self,
        position: Vec2,
        radius: f32,
        properties: &BodyProperties,
        tag: BallTag,
    ) -> BodyHandle;

    /// Remove a body. Unknown or stale handles are ignored.
    fn remove_body(&mut self, handle: BodyHandle);

    /// Advance the simulation by one fixed step
    fn step(&mut self, dt: f32);

    /// Collision-start notifications accumulated since the previous call, in order
    fn collisions_since_last_tick(&mut self) -> Vec<CollisionPair>;

    /// Ball metadata of a live body; None for walls and removed bodies
    fn body_tag(&self, handle: BodyHandle) -> Option<BallTag>;

    /// Position of a live body
    fn body_position(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Every live dynamic body and its position
    fn live_body_positions(&self) -> Vec<(BodyHandle, Vec2)>;
}
