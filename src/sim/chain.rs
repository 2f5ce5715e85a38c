//! Ball rank progression
//!
//! The chain is an ordered list of ball types. Two balls of rank `k` merge
//! into one of rank `k + 1`; the last rank has no successor.

use anyhow::{Result, ensure};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configured description of one rank, before ranks are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallTypeDef {
    pub radius: f32,
    /// Opaque renderer key (sprite path)
    pub visual_key: String,
    /// Opaque tint used for fallback art and particles
    pub color: String,
}

impl BallTypeDef {
    pub fn new(radius: f32, visual_key: &str, color: &str) -> Self {
        Self {
            radius,
            visual_key: visual_key.to_string(),
            color: color.to_string(),
        }
    }
}

/// A ranked, immutable ball type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallType {
    /// 0-based position in the chain
    pub rank: usize,
    pub radius: f32,
    pub visual_key: String,
    pub color: String,
}

/// The nine ball types of the reference game, smallest first
pub fn default_ball_types() -> Vec<BallTypeDef> {
    vec![
        BallTypeDef::new(16.0, "ball1.png", "#ff5555"),
        BallTypeDef::new(20.0, "ball2.png", "#ff8855"),
        BallTypeDef::new(24.0, "ball3.png", "#ffaa55"),
        BallTypeDef::new(28.0, "ball4.png", "#55ff55"),
        BallTypeDef::new(32.0, "ball5.png", "#55ffaa"),
        BallTypeDef::new(36.0, "ball6.png", "#5599ff"),
        BallTypeDef::new(40.0, "ball7.png", "#5555ff"),
        BallTypeDef::new(48.0, "ball8.png", "#ffff55"),
        BallTypeDef::new(60.0, "ball9.png", "#ff55ff"),
    ]
}

/// Ordered progression of ball types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallTypeChain {
    types: Vec<BallType>,
}

impl Default for BallTypeChain {
    fn default() -> Self {
        Self {
            types: assign_ranks(default_ball_types()),
        }
    }
}

fn assign_ranks(defs: Vec<BallTypeDef>) -> Vec<BallType> {
    defs.into_iter()
        .enumerate()
        .map(|(rank, def)| BallType {
            rank,
            radius: def.radius,
            visual_key: def.visual_key,
            color: def.color,
        })
        .collect()
}

impl BallTypeChain {
    /// Build a chain from definitions, smallest first.
    ///
    /// Fails if the chain is empty or radii are not strictly increasing.
    pub fn new(defs: Vec<BallTypeDef>) -> Result<Self> {
        ensure!(!defs.is_empty(), "ball_types: chain must have at least one rank");
        for (rank, def) in defs.iter().enumerate() {
            ensure!(
                def.radius.is_finite() && def.radius > 0.0,
                "ball_types[{rank}]: radius must be positive, got {}",
                def.radius
            );
        }
        for (rank, pair) in defs.windows(2).enumerate() {
            ensure!(
                pair[1].radius > pair[0].radius,
                "ball_types[{}]: radius {} must exceed rank {rank} radius {}",
                rank + 1,
                pair[1].radius,
                pair[0].radius
            );
        }
        Ok(Self {
            types: assign_ranks(defs),
        })
    }

    /// Type at `rank`. Ranks handed out by the chain are always in range.
    #[inline]
    pub fn type_at(&self, rank: usize) -> &BallType {
        &self.types[rank]
    }

    /// Type at `rank`, or None for ranks this chain never produced
    #[inline]
    pub fn get(&self, rank: usize) -> Option<&BallType> {
        self.types.get(rank)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.types.len()
    }

    /// True iff `rank` is the last rank (merging it yields no ball)
    #[inline]
    pub fn is_terminal(&self, rank: usize) -> bool {
        rank + 1 == self.types.len()
    }

    /// The type two balls of `rank` merge into
    pub fn successor(&self, rank: usize) -> Option<&BallType> {
        self.types.get(rank + 1)
    }

    /// Largest radius in the chain
    pub fn max_radius(&self) -> f32 {
        self.types.last().map(|t| t.radius).unwrap_or(0.0)
    }

    /// Pick the next drop. Uniform over every rank, terminal included.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &BallType {
        let rank = rng.random_range(0..self.types.len());
        &self.types[rank]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BallType> {
        self.types.iter()
    }
}
