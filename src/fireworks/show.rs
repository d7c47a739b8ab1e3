use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use super::launcher::{LaunchController, Phase};
use super::simulation::Simulation;
use crate::render::{Canvas, Viewport};

/// Height of the sky in world units. Width follows the canvas aspect ratio.
pub const WORLD_HEIGHT: f64 = 600.0;
/// One simulation tick (60 Hz).
pub const TICK: Duration = Duration::from_nanos(16_666_667);
/// A stalled frame never replays more than this many ticks.
const MAX_CATCH_UP_TICKS: u32 = 8;

/// The whole display: sky, launch schedule and a virtual clock that turns
/// frame time into fixed ticks.
pub struct Show {
    sim: Simulation,
    launcher: LaunchController,
    clock: Duration,
    accumulator: Duration,
    /// World units per canvas pixel.
    scale: f64,
}

impl Show {
    /// Start ambient launches on a canvas of the given pixel size.
    pub fn start(canvas_width: usize, canvas_height: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        log::debug!("rng seed {seed}");
        let (scale, width, height) = world_size(canvas_width, canvas_height);
        Show {
            sim: Simulation::new(width, height, StdRng::seed_from_u64(seed)),
            launcher: LaunchController::start(Duration::ZERO),
            clock: Duration::ZERO,
            accumulator: Duration::ZERO,
            scale,
        }
    }

    pub fn on_resize(&mut self, canvas_width: usize, canvas_height: usize) {
        let (scale, width, height) = world_size(canvas_width, canvas_height);
        log::info!(
            "canvas {canvas_width}x{canvas_height}, sky {width:.0}x{height:.0} ({scale:.2} units/px)"
        );
        self.scale = scale;
        self.sim.resize(width, height);
    }

    /// The celebration trigger.
    pub fn activate(&mut self) -> bool {
        self.launcher.activate(self.clock)
    }

    pub fn clear(&mut self) {
        self.sim.clear();
    }

    /// Advance by `dt` seconds of wall time, then draw into `canvas`.
    pub fn update(&mut self, canvas: &mut Canvas, dt: f64) {
        self.accumulator += Duration::try_from_secs_f64(dt).unwrap_or_default();
        let mut ticks = 0;
        while self.accumulator >= TICK {
            if ticks == MAX_CATCH_UP_TICKS {
                log::debug!("dropping {:?} of backlog", self.accumulator);
                self.accumulator = Duration::ZERO;
                break;
            }
            self.tick();
            self.accumulator -= TICK;
            ticks += 1;
        }

        let mut view = Viewport::new(canvas, self.scale);
        self.sim.render(&mut view);
    }

    fn tick(&mut self) {
        self.clock += TICK;
        self.launcher.update(self.clock, &mut self.sim);
        self.sim.step();
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn launcher(&self) -> &LaunchController {
        &self.launcher
    }

    /// Short mode label for the status bar.
    pub fn mode_label(&self) -> String {
        match self.launcher.phase() {
            Phase::Ambient { .. } => "ambient".to_string(),
            Phase::Volleying { fired, .. } => format!("finale {}/{}", fired, super::launcher::VOLLEY_COUNT),
            Phase::Settling { .. } => "finale settling".to_string(),
        }
    }
}

/// Units per pixel plus world width and height for a canvas.
fn world_size(canvas_width: usize, canvas_height: usize) -> (f64, f64, f64) {
    let scale = WORLD_HEIGHT / canvas_height.max(1) as f64;
    (scale, canvas_width.max(1) as f64 * scale, WORLD_HEIGHT)
}
