//! Audio and particle cues for engine events
//!
//! The engine emits `GameEvent`s; this maps them to what the audio and
//! particle subsystems should play. Nothing here plays sound or draws.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{BallTypeChain, EventKind, GameEvent, SessionState};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Player dropped a ball
    Drop,
    /// Two balls merged into the next rank
    Merge,
    /// Two largest balls merged and vanished
    MaxMerge,
}

impl SoundCue {
    /// Asset name under `assets/sounds/`
    pub fn asset(&self) -> &'static str {
        match self {
            SoundCue::Drop => "drop.wav",
            SoundCue::Merge => "removefruits.wav",
            SoundCue::MaxMerge => "magic.wav",
        }
    }

    /// Base playback volume (0.0 - 1.0)
    pub fn base_volume(&self) -> f32 {
        match self {
            SoundCue::Drop => 0.35,
            SoundCue::Merge => 0.55,
            SoundCue::MaxMerge => 0.75,
        }
    }
}

/// One radial burst of particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    pub pos: Vec2,
    pub color: String,
    pub count: u32,
    /// Maximum initial speed (pixels/frame)
    pub speed: f32,
    /// Lifetime in frames
    pub life: u32,
}

/// Everything to play for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub sound: SoundCue,
    /// Effective volume after mixing
    pub volume: f32,
    pub bursts: Vec<ParticleBurst>,
}

/// Max-merge burst palette
const MAX_MERGE_COLORS: [&str; 4] = ["#ff55ff", "#ff88ff", "#ffccff", "#ff55aa"];

/// Volume settings and event-to-cue mapping
#[derive(Debug, Clone)]
pub struct CueMixer {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for CueMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl CueMixer {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self, sound: SoundCue) -> f32 {
        if self.muted {
            0.0
        } else {
            sound.base_volume() * self.master_volume * self.sfx_volume
        }
    }

    /// Cue for an event. Sound stays silent until the first drop;
    /// particles are still returned.
    pub fn cue_for(&self, event: &GameEvent, chain: &BallTypeChain, state: SessionState) -> Cue {
        let (sound, bursts) = match event.kind {
            EventKind::Drop => (SoundCue::Drop, Vec::new()),
            EventKind::Promote => {
                let color = chain
                    .get(event.rank)
                    .map(|t| t.color.clone())
                    .unwrap_or_default();
                let burst = ParticleBurst {
                    pos: event.pos,
                    color,
                    count: 12,
                    speed: 2.6,
                    life: 36,
                };
                (SoundCue::Merge, vec![burst])
            }
            EventKind::Terminal => {
                let bursts = MAX_MERGE_COLORS
                    .iter()
                    .map(|c| ParticleBurst {
                        pos: event.pos,
                        color: (*c).to_string(),
                        count: 8,
                        speed: 3.5,
                        life: 48,
                    })
                    .collect();
                (SoundCue::MaxMerge, bursts)
            }
        };

        let volume = if state == SessionState::NotStarted {
            0.0
        } else {
            self.effective_volume(sound)
        };

        Cue {
            sound,
            volume,
            bursts,
        }
    }
}
