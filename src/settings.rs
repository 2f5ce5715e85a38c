//! Game configuration
//!
//! Everything the engine takes at construction: ball chain, container,
//! drop gating, bonuses and body material. Loaded from JSON; missing fields
//! fall back to the reference game's values.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::chain::{BallTypeChain, BallTypeDef, default_ball_types};
use crate::sim::state::Container;

pub use crate::sim::physics::BodyProperties;

/// Static session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for next-ball selection
    pub seed: u64,
    /// Ranks, smallest first
    pub ball_types: Vec<BallTypeDef>,
    pub container: Container,

    // === Drops ===
    /// Minimum time between accepted drops (ms)
    pub debounce_ms: f64,
    /// Gap between a dropped ball and the side walls
    pub spawn_margin: f32,
    /// Extra offset below the container top for drops
    pub spawn_offset: f32,

    // === Scoring ===
    pub promotion_bonus: u64,
    pub terminal_bonus: u64,

    // === Overflow ===
    /// Slack below the container top that already counts as overflow
    pub overflow_epsilon: f32,

    // === Physics (built-in world only) ===
    pub body: BodyProperties,
    /// Downward acceleration, pixels/s²
    pub gravity: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ball_types: default_ball_types(),
            container: Container::default(),

            debounce_ms: DEBOUNCE_MS,
            spawn_margin: SPAWN_MARGIN,
            spawn_offset: SPAWN_OFFSET,

            promotion_bonus: PROMOTION_BONUS,
            terminal_bonus: TERMINAL_BONUS,

            overflow_epsilon: OVERFLOW_EPSILON,

            body: BodyProperties::default(),
            gravity: GRAVITY,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid game config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&json).with_context(|| format!("loading {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Ranked chain built from `ball_types`
    pub fn chain(&self) -> Result<BallTypeChain> {
        BallTypeChain::new(self.ball_types.clone())
    }

    /// Check every field the engine relies on
    pub fn validate(&self) -> Result<()> {
        let chain = self.chain()?;

        let c = &self.container;
        ensure!(
            c.width.is_finite() && c.width > 0.0 && c.height.is_finite() && c.height > 0.0,
            "container: size must be positive, got {}x{}",
            c.width,
            c.height
        );
        ensure!(
            self.spawn_margin >= 0.0 && self.spawn_offset >= 0.0,
            "spawn_margin/spawn_offset must be non-negative"
        );
        let widest = 2.0 * (chain.max_radius() + self.spawn_margin);
        ensure!(
            c.width >= widest,
            "container: width {} cannot fit the largest ball ({widest} with margins)",
            c.width
        );
        ensure!(
            self.debounce_ms.is_finite() && self.debounce_ms >= 0.0,
            "debounce_ms must be non-negative, got {}",
            self.debounce_ms
        );
        ensure!(
            self.overflow_epsilon.is_finite() && self.overflow_epsilon > 0.0,
            "overflow_epsilon must be positive, got {}",
            self.overflow_epsilon
        );
        // A fresh drop must not count as overflow
        ensure!(
            self.spawn_offset > self.overflow_epsilon,
            "spawn_offset {} must exceed overflow_epsilon {}",
            self.spawn_offset,
            self.overflow_epsilon
        );
        let b = &self.body;
        for (name, value) in [
            ("restitution", b.restitution),
            ("friction", b.friction),
            ("air_friction", b.air_friction),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "body.{name} must be within 0..=1, got {value}"
            );
        }
        ensure!(self.gravity.is_finite(), "gravity must be finite");
        Ok(())
    }
}
