//! Game state and core rules types
//!
//! Ball records, the container, score, session phase and the events the
//! engine emits for audio/particles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain::BallType;
use super::physics::{BallTag, BodyHandle, BodyProperties, PhysicsWorld};
use crate::consts::*;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No ball dropped yet
    #[default]
    NotStarted,
    /// Active gameplay
    Running,
    /// Container overflowed (terminal)
    Over,
}

/// Playable rectangle. `x`, `y` is the top-left corner, +y points down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Container {
    fn default() -> Self {
        Self::centered(
            Vec2::new(PLAYFIELD_WIDTH / 2.0, PLAYFIELD_HEIGHT / 2.0),
            CONTAINER_WIDTH,
            CONTAINER_HEIGHT,
        )
    }
}

impl Container {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Container of the given size around `center`
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A live ball entity. Position and velocity belong to the physics world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub ball_type: BallType,
    pub handle: BodyHandle,
    /// Set the moment a merge selects this ball; a claimed ball is dead
    pub merge_claimed: bool,
}

/// Cumulative score. Only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    points: u64,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, points: u64) {
        self.points = self.points.saturating_add(points);
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.points
    }
}

/// What happened, for audio/particle subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Player drop accepted
    Drop,
    /// Two balls merged into the next rank
    Promote,
    /// Two terminal-rank balls merged and vanished
    Terminal,
}

/// One-shot engine event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    pub pos: Vec2,
    /// Rank of the dropped ball, or of the consumed pair for merges
    pub rank: usize,
    pub visual_key: String,
}

/// Render-facing view of one live ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub id: u32,
    pub pos: Vec2,
    pub rank: usize,
    pub radius: f32,
    pub visual_key: String,
}

/// Everything a renderer or host needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_state: SessionState,
    pub score: u64,
    pub next_ball: BallType,
    pub balls: Vec<BallView>,
    pub container: Container,
    pub tick: u64,
}

/// The physics world plus the engine's ball records.
///
/// All insertions (player drops and merge products) go through here.
#[derive(Debug)]
pub struct Playfield<W: PhysicsWorld> {
    world: W,
    container: Container,
    body_properties: BodyProperties,
    /// Ball records sorted by id
    balls: Vec<Ball>,
    next_id: u32,
}

impl<W: PhysicsWorld> Playfield<W> {
    pub fn new(world: W, container: Container, body_properties: BodyProperties) -> Self {
        Self {
            world,
            container,
            body_properties,
            balls: Vec::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Insert a ball body with no gating or clamping
    pub fn insert_ball(&mut self, ball_type: &BallType, pos: Vec2) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let tag = BallTag {
            ball_id: id,
            rank: ball_type.rank,
        };
        let handle = self
            .world
            .insert_body(pos, ball_type.radius, &self.body_properties, tag);
        // Ids only grow, so pushing keeps the records sorted
        self.balls.push(Ball {
            id,
            ball_type: ball_type.clone(),
            handle,
            merge_claimed: false,
        });
        id
    }

    /// Ball metadata carried by a body; None for walls and removed bodies
    #[inline]
    pub fn tag(&self, handle: BodyHandle) -> Option<BallTag> {
        self.world.body_tag(handle)
    }

    /// Ball record for a body, if the body is one of ours
    pub fn ball_for_handle(&self, handle: BodyHandle) -> Option<&Ball> {
        let tag = self.world.body_tag(handle)?;
        self.ball(tag.ball_id).filter(|b| b.handle == handle)
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.balls[i])
    }

    fn ball_mut(&mut self, id: u32) -> Option<&mut Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &mut self.balls[i])
    }

    /// Mark a ball consumed. Returns false if it was already claimed or unknown.
    pub fn claim(&mut self, id: u32) -> bool {
        match self.ball_mut(id) {
            Some(ball) if !ball.merge_claimed => {
                ball.merge_claimed = true;
                true
            }
            _ => false,
        }
    }

    pub fn remove_body(&mut self, handle: BodyHandle) {
        self.world.remove_body(handle);
    }

    /// Drop every record whose body is gone from the world.
    ///
    /// A claimed ball keeps its record while the world still holds the body.
    pub fn purge_removed(&mut self) {
        let world = &self.world;
        self.balls.retain(|b| world.body_position(b.handle).is_some());
    }

    pub fn position(&self, ball: &Ball) -> Option<Vec2> {
        self.world.body_position(ball.handle)
    }

    /// Unclaimed balls that are still present in the world, by id
    pub fn live_balls(&self) -> Vec<BallView> {
        let mut views: Vec<BallView> = self
            .world
            .live_body_positions()
            .into_iter()
            .filter_map(|(handle, pos)| {
                let ball = self.ball_for_handle(handle)?;
                if ball.merge_claimed {
                    return None;
                }
                Some(BallView {
                    id: ball.id,
                    pos,
                    rank: ball.ball_type.rank,
                    radius: ball.ball_type.radius,
                    visual_key: ball.ball_type.visual_key.clone(),
                })
            })
            .collect();
        views.sort_by_key(|v| v.id);
        views
    }

    /// Number of ball records, claimed ones included
    pub fn record_count(&self) -> usize {
        self.balls.len()
    }
}
