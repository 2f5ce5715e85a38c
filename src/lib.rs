//! Merge Balls - drop-and-merge arcade rules engine
//!
//! Core modules:
//! - `sim`: Deterministic merge & progression engine (spawning, merging, scoring, game over)
//! - `settings`: Data-driven game configuration
//! - `cues`: Audio/particle cue mapping for engine events

pub mod cues;
pub mod settings;
pub mod sim;

pub use cues::{Cue, CueMixer, ParticleBurst, SoundCue};
pub use settings::{BodyProperties, GameConfig};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the reference physics step)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Fixed timestep in milliseconds, for host timestamps
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;

    /// Playfield dimensions (the container is centred in it)
    pub const PLAYFIELD_WIDTH: f32 = 500.0;
    pub const PLAYFIELD_HEIGHT: f32 = 700.0;

    /// Container defaults
    pub const CONTAINER_WIDTH: f32 = 422.0;
    pub const CONTAINER_HEIGHT: f32 = 598.0;

    /// Minimum interval between accepted player drops (ms)
    pub const DEBOUNCE_MS: f64 = 140.0;

    /// Points for merging two balls into the next rank
    pub const PROMOTION_BONUS: u64 = 10;
    /// Points for merging two balls of the terminal rank
    pub const TERMINAL_BONUS: u64 = 30;

    /// Gap kept between a dropped ball and the side walls
    pub const SPAWN_MARGIN: f32 = 4.0;
    /// Extra vertical offset below the container top for dropped balls
    pub const SPAWN_OFFSET: f32 = 8.0;
    /// Slack below the container top that still counts as overflow
    pub const OVERFLOW_EPSILON: f32 = 2.0;

    /// Downward gravity in pixels/s² (screen coordinates, +y is down)
    pub const GRAVITY: f32 = 980.0;
}
