//! Fireworks simulation: rockets, sparks, and the schedule that launches them.

pub mod launcher;
pub mod palette;
pub mod particle;
pub mod projectile;
pub mod show;
pub mod simulation;

pub use show::Show;
