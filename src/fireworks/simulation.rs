use rand::rngs::StdRng;

use super::particle::Particle;
use super::projectile::{Flight, Projectile};
use crate::render::Surface;

/// Everything that is alive in the sky, plus the bounds new launches use.
pub struct Simulation {
    width: f64,
    height: f64,
    projectiles: Vec<Projectile>,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl Simulation {
    pub fn new(width: f64, height: f64, rng: StdRng) -> Self {
        let mut sim = Simulation {
            width: 1.0,
            height: 1.0,
            projectiles: Vec::new(),
            particles: Vec::with_capacity(2048),
            rng,
        };
        sim.resize(width, height);
        sim
    }

    /// Change the launch bounds. Live projectiles and particles keep their
    /// coordinates. Degenerate sizes clamp to one unit.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = clamp_extent(width);
        self.height = clamp_extent(height);
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn spawn(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.particles.clear();
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// One simulation tick: projectiles first, then particles.
    pub fn step(&mut self) {
        let Simulation {
            projectiles,
            particles,
            rng,
            ..
        } = self;

        projectiles.retain_mut(|p| p.advance(&mut *rng, particles) == Flight::Ascending);

        particles.retain_mut(|p| {
            if p.is_expired() {
                return false;
            }
            p.advance();
            true
        });
    }

    /// Draw the current state from scratch.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear();
        for p in &self.projectiles {
            p.render(surface);
        }
        for p in &self.particles {
            p.render(surface);
        }
    }
}

fn clamp_extent(v: f64) -> f64 {
    if v.is_finite() { v.max(1.0) } else { 1.0 }
}
