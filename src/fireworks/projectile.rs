use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::RngExt;

use super::palette::{GOLD, SHELL, WHITE, hsl};
use super::particle::Particle;
use crate::render::Surface;

/// Number of past positions kept for the trail.
pub const TRAIL_LENGTH: usize = 15;
/// Speed multiplier applied every tick.
pub const ACCELERATION: f64 = 1.02;

const ORDINARY_SPEED: f64 = 18.0;
const FINALE_SPEED: f64 = 25.0;
const ORDINARY_PARTICLES: usize = 80;
const FINALE_PARTICLES: usize = 150;

const TRAIL_WIDTH: f64 = 3.0;
const TRAIL_BLUR: f64 = 10.0;
const HEAD_RADIUS: f64 = 2.0;
const HEAD_BLUR: f64 = 20.0;

/// Ordinary shells go up on the idle timer, finale shells are faster and bigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ordinary,
    Finale,
}

impl Mode {
    pub fn initial_speed(self) -> f64 {
        match self {
            Mode::Ordinary => ORDINARY_SPEED,
            Mode::Finale => FINALE_SPEED,
        }
    }

    /// Sparks thrown out on detonation.
    pub fn particle_count(self) -> usize {
        match self {
            Mode::Ordinary => ORDINARY_PARTICLES,
            Mode::Finale => FINALE_PARTICLES,
        }
    }
}

/// Outcome of one tick of flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Ascending,
    /// The shell burst this tick and must leave the active set.
    Detonated,
}

/// A rocket climbing from its launch point to the point where it bursts.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub x: f64,
    pub y: f64,
    sx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
    distance_to_target: f64,
    angle: f64,
    speed: f64,
    trail: VecDeque<(f64, f64)>,
    /// Lightness of the trail colour, in percent.
    brightness: f64,
    mode: Mode,
}

impl Projectile {
    pub fn new(
        (sx, sy): (f64, f64),
        (tx, ty): (f64, f64),
        mode: Mode,
        rng: &mut impl RngExt,
    ) -> Self {
        Projectile {
            x: sx,
            y: sy,
            sx,
            sy,
            tx,
            ty,
            distance_to_target: distance(sx, sy, tx, ty),
            angle: (ty - sy).atan2(tx - sx),
            speed: mode.initial_speed(),
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            brightness: rng.random_range(50.0..100.0),
            mode,
        }
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[allow(dead_code)]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[allow(dead_code)]
    pub fn target(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    /// Past positions, oldest first.
    #[allow(dead_code)]
    pub fn trail(&self) -> impl ExactSizeIterator<Item = &(f64, f64)> {
        self.trail.iter()
    }

    /// Move one tick along the launch angle. When the next position would
    /// reach the target distance the shell bursts instead, pushing its
    /// sparks into `debris`.
    pub fn advance(&mut self, rng: &mut impl RngExt, debris: &mut Vec<Particle>) -> Flight {
        self.trail.push_back((self.x, self.y));
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }

        self.speed *= ACCELERATION;
        let vx = self.angle.cos() * self.speed;
        let vy = self.angle.sin() * self.speed;

        let traveled = distance(self.sx, self.sy, self.x + vx, self.y + vy);
        if traveled >= self.distance_to_target {
            self.detonate(rng, debris);
            Flight::Detonated
        } else {
            self.x += vx;
            self.y += vy;
            Flight::Ascending
        }
    }

    fn detonate(&self, rng: &mut impl RngExt, debris: &mut Vec<Particle>) {
        let total = self.mode.particle_count();
        let core = total / 2;
        let shell = total - core;
        debris.reserve(total);

        // Fast white/gold core, evenly spaced
        let step = TAU / core as f64;
        for i in 0..core {
            let angle = step * i as f64;
            let speed = rng.random_range(4.0..12.0);
            let color = if rng.random_bool(0.5) { WHITE } else { GOLD };
            let velocity = (angle.cos() * speed, angle.sin() * speed);
            debris.push(Particle::new(self.tx, self.ty, color, velocity, false, rng));
        }

        // Slower coloured shell with angular jitter
        let step = TAU / shell as f64;
        for i in 0..shell {
            let angle = step * i as f64 + rng.random_range(0.0..0.5);
            let speed = rng.random_range(2.0..8.0);
            let color = SHELL[rng.random_range(0..SHELL.len())];
            let velocity = (angle.cos() * speed, angle.sin() * speed);
            debris.push(Particle::new(self.tx, self.ty, color, velocity, true, rng));
        }
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let mut path: Vec<(f64, f64)> = self.trail.iter().copied().collect();
        path.push((self.x, self.y));
        let color = hsl(60.0, 1.0, self.brightness / 100.0);
        if path.len() > 1 {
            // Halo along the whole stroke
            for &(x, y) in &path {
                surface.glow(x, y, TRAIL_BLUR, GOLD, 1.0);
            }
            surface.stroke_path(&path, TRAIL_WIDTH, color, 1.0);
        }

        surface.glow(self.x, self.y, HEAD_BLUR, WHITE, 1.0);
        surface.fill_circle(self.x, self.y, HEAD_RADIUS, WHITE, 1.0);
    }
}

#[inline]
fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}
