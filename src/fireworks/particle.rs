use rand::RngExt;

use super::palette::WHITE;
use crate::render::{Rgb, Surface};

/// Velocity multiplier applied every tick on both axes.
const AIR_FRICTION: f64 = 0.99;
/// Added to the vertical velocity every tick (y grows downward).
const GRAVITY: f64 = 0.05;
/// Halo radius around every spark.
const GLOW_BLUR: f64 = 20.0;
/// Above this alpha a spark shows a white-hot centre.
const HOT_CORE_ALPHA: f64 = 0.8;

/// One spark thrown out by a detonation.
///
/// Core sparks burn fast and large, shell (secondary) sparks are smaller and
/// linger, which gives the burst its two-stage look.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub color: Rgb,
    pub alpha: f64,
    pub decay: f64,
    pub size: f64,
}

impl Particle {
    pub fn new(
        x: f64,
        y: f64,
        color: Rgb,
        (vx, vy): (f64, f64),
        secondary: bool,
        rng: &mut impl RngExt,
    ) -> Self {
        let (decay, size) = if secondary {
            (rng.random_range(0.005..0.013), rng.random_range(1.0..3.0))
        } else {
            (rng.random_range(0.008..0.023), rng.random_range(1.0..4.0))
        };
        Particle {
            x,
            y,
            vx,
            vy,
            color,
            alpha: 1.0,
            decay,
            size,
        }
    }

    pub fn advance(&mut self) {
        self.vx *= AIR_FRICTION;
        self.vy *= AIR_FRICTION;
        self.vy += GRAVITY;
        self.x += self.vx;
        self.y += self.vy;
        self.alpha -= self.decay;
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.alpha <= 0.0
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        if self.is_expired() {
            return;
        }
        surface.glow(self.x, self.y, GLOW_BLUR, self.color, self.alpha);
        surface.fill_circle(self.x, self.y, self.size, self.color, self.alpha);
        if self.alpha > HOT_CORE_ALPHA {
            surface.fill_circle(self.x, self.y, self.size * 0.5, WHITE, self.alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::recording::{Op, RecordingSurface};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn spark(secondary: bool) -> Particle {
        let mut rng = StdRng::seed_from_u64(7);
        Particle::new(100.0, 100.0, (255, 105, 180), (3.0, -2.0), secondary, &mut rng)
    }

    #[test]
    fn test_decay_profiles() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let core = Particle::new(0.0, 0.0, WHITE, (0.0, 0.0), false, &mut rng);
            assert!((0.008..0.023).contains(&core.decay));
            assert!((1.0..4.0).contains(&core.size));
            let shell = Particle::new(0.0, 0.0, WHITE, (0.0, 0.0), true, &mut rng);
            assert!((0.005..0.013).contains(&shell.decay));
            assert!((1.0..3.0).contains(&shell.size));
        }
    }

    #[test]
    fn test_alpha_falls_linearly() {
        let mut p = spark(false);
        let decay = p.decay;
        for n in 1..=30 {
            p.advance();
            let expected = 1.0 - n as f64 * decay;
            assert!((p.alpha - expected).abs() < 1e-9, "tick {n}");
        }
    }

    #[test]
    fn test_friction_and_gravity() {
        let mut p = spark(true);
        p.advance();
        assert!((p.vx - 2.97).abs() < 1e-12);
        assert!((p.vy - (-1.98 + 0.05)).abs() < 1e-12);
        assert!((p.x - 102.97).abs() < 1e-12);
        assert!((p.y - (100.0 - 1.93)).abs() < 1e-12);
    }

    #[test]
    fn test_expires_when_alpha_reaches_zero() {
        let mut p = spark(false);
        p.decay = 0.25;
        for _ in 0..3 {
            p.advance();
            assert!(!p.is_expired());
        }
        p.advance();
        assert!(p.is_expired());
    }

    #[test]
    fn test_render_hot_core_only_when_bright() {
        let mut p = spark(false);
        let mut surface = RecordingSurface::default();
        p.render(&mut surface);
        assert_eq!(surface.circles().count(), 2);
        assert!(surface.ops.iter().any(|op| matches!(op, Op::Glow { blur, .. } if *blur == GLOW_BLUR)));

        p.alpha = 0.5;
        let mut surface = RecordingSurface::default();
        p.render(&mut surface);
        assert_eq!(surface.circles().count(), 1);
    }

    #[test]
    fn test_expired_spark_is_never_drawn() {
        let mut p = spark(false);
        p.alpha = 0.0;
        let mut surface = RecordingSurface::default();
        p.render(&mut surface);
        assert!(surface.ops.is_empty());
    }
}
