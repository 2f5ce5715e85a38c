//! Deterministic merge & progression engine
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (ball records by ID, notifications in arrival order)
//! - Physics is reached only through the `PhysicsWorld` trait
//! - No rendering, audio or platform dependencies

pub mod chain;
pub mod merge;
pub mod overflow;
pub mod physics;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use chain::{BallType, BallTypeChain, BallTypeDef, default_ball_types};
pub use merge::MergeResolver;
pub use overflow::GameOverDetector;
pub use physics::{BallTag, BodyHandle, BodyProperties, CollisionPair, PhysicsWorld};
pub use spawn::{RejectReason, SpawnController, SpawnOutcome};
pub use state::{
    Ball, BallView, Container, EventKind, GameEvent, Playfield, Score, SessionState, Snapshot,
};
pub use tick::{GameSession, TickOutcome};
pub use world::{SimpleWorld, Wall};
