//! Merge Balls headless host
//!
//! Runs an autoplay session on the built-in physics world: fixed-timestep
//! physics, a seeded "player" clicking at random positions, and event/cue
//! logging in place of rendering and audio.

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::path::PathBuf;

    use anyhow::Result;
    use clap::Parser;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use merge_balls::consts::*;
    use merge_balls::sim::{GameSession, SessionState, SimpleWorld, SpawnOutcome};
    use merge_balls::{CueMixer, GameConfig};

    /// Maximum substeps per frame to prevent spiral of death
    const MAX_SUBSTEPS: u32 = 8;
    /// Frames simulated after the last drop before giving up on game over
    const SETTLE_FRAMES: u32 = 600;

    #[derive(Debug, Parser)]
    #[command(name = "merge-balls", about = "Headless autoplay for the merge balls engine")]
    pub struct Args {
        /// JSON config file (defaults to the reference game)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many accepted drops
        #[arg(long, default_value_t = 200)]
        drops: u32,
        /// Frames between drop attempts
        #[arg(long, default_value_t = 6)]
        click_every: u32,
        /// Print the final snapshot as JSON
        #[arg(long)]
        dump_state: bool,
    }

    /// Game instance holding all state
    struct Game {
        session: GameSession<SimpleWorld>,
        mixer: CueMixer,
        /// Stand-in for the pointer
        player: Pcg32,
        accumulator: f32,
        time_ms: f64,
        frames: u64,
        accepted: u32,
        rejected: u32,
    }

    impl Game {
        fn new(config: &GameConfig) -> Result<Self> {
            Ok(Self {
                session: GameSession::new(config)?,
                mixer: CueMixer::new(),
                player: Pcg32::seed_from_u64(config.seed ^ 0x9e37_79b9_7f4a_7c15),
                accumulator: 0.0,
                time_ms: 0.0,
                frames: 0,
                accepted: 0,
                rejected: 0,
            })
        }

        /// Run simulation ticks for one frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.time_ms += SIM_DT_MS;
                self.session.step(SIM_DT, self.time_ms);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            self.frames += 1;
            self.play_cues();
        }

        fn click(&mut self) {
            let container = *self.session.container();
            // Overshoot the walls now and then to exercise clamping
            let x = self
                .player
                .random_range(container.left() - 20.0..container.right() + 20.0);
            match self.session.handle_spawn_request(x, self.time_ms) {
                SpawnOutcome::Accepted { ball_id, pos } => {
                    self.accepted += 1;
                    log::debug!("Drop #{ball_id} at ({:.1}, {:.1})", pos.x, pos.y);
                }
                SpawnOutcome::Rejected(_) => self.rejected += 1,
            }
        }

        /// Stand-in for the audio/particle subsystems
        fn play_cues(&mut self) {
            let state = self.session.state();
            for event in self.session.drain_events() {
                let cue = self.mixer.cue_for(&event, self.session.chain(), state);
                log::debug!(
                    "{:?} at ({:.1}, {:.1}) rank {}: {} @ {:.2}, {} bursts",
                    event.kind,
                    event.pos.x,
                    event.pos.y,
                    event.rank,
                    cue.sound.asset(),
                    cue.volume,
                    cue.bursts.len()
                );
            }
        }
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let mut config = match &args.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        if let Some(seed) = args.seed {
            config.seed = seed;
        }

        log::info!("Merge Balls (headless) starting...");
        let mut game = Game::new(&config)?;
        let click_every = args.click_every.max(1);

        let mut settle = 0;
        while game.session.state() != SessionState::Over && settle < SETTLE_FRAMES {
            if game.accepted < args.drops {
                if game.frames % click_every as u64 == 0 {
                    game.click();
                }
            } else {
                settle += 1;
            }
            game.update(SIM_DT);
        }

        let snapshot = game.session.snapshot();
        log::info!(
            "Finished: {:?} after {} ticks, score {}, {} balls, {} drops ({} rejected)",
            snapshot.session_state,
            snapshot.tick,
            snapshot.score,
            snapshot.balls.len(),
            game.accepted,
            game.rejected
        );
        println!("Final score: {}", snapshot.score);
        if args.dump_state {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    host::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser host; the library is embedded by the web front end
}
