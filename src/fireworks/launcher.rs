use std::collections::VecDeque;
use std::time::Duration;

use rand::RngExt;

use super::projectile::{Mode, Projectile};
use super::simulation::Simulation;

/// Period of the idle launches.
pub const AMBIENT_INTERVAL: Duration = Duration::from_millis(1500);
/// Period between finale volleys.
pub const VOLLEY_INTERVAL: Duration = Duration::from_millis(800);
/// Volleys in one finale.
pub const VOLLEY_COUNT: u32 = 5;
/// Shells per volley.
pub const VOLLEY_SIZE: u32 = 5;
/// Delay between the shells of one volley.
pub const LAUNCH_STAGGER: Duration = Duration::from_millis(200);
/// Quiet time after the last volley before idle launches resume.
pub const SETTLE_DELAY: Duration = Duration::from_millis(3000);

/// Finale shells burst at least this far below the top edge.
const FINALE_TARGET_DROP: f64 = 50.0;

/// Where the controller is in its cycle. Each variant carries the deadline
/// of the one timer that is live in that phase, so leaving a phase drops
/// its timer with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ambient { next_launch: Duration },
    Volleying { fired: u32, next_volley: Duration },
    Settling { resume_at: Duration },
}

/// Running totals, mostly for the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchCounts {
    pub ordinary: u64,
    pub finale: u64,
    pub volleys: u64,
}

/// Decides when shells go up. Time is whatever clock the caller passes in,
/// so the whole sequence can be driven without real timers.
pub struct LaunchController {
    phase: Phase,
    /// Due times of staggered finale launches, earliest first.
    pending: VecDeque<Duration>,
    ambient_starts: u32,
    counts: LaunchCounts,
}

enum Event {
    Phase(Duration),
    Pending,
}

impl LaunchController {
    /// Begin in ambient mode, first launch one interval after `now`.
    pub fn start(now: Duration) -> Self {
        LaunchController {
            phase: Phase::Ambient {
                next_launch: now + AMBIENT_INTERVAL,
            },
            pending: VecDeque::new(),
            ambient_starts: 1,
            counts: LaunchCounts::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn counts(&self) -> LaunchCounts {
        self.counts
    }

    pub fn ambient_active(&self) -> bool {
        matches!(self.phase, Phase::Ambient { .. })
    }

    pub fn is_finale(&self) -> bool {
        !self.ambient_active()
    }

    /// How many times the ambient timer has been (re)started.
    #[allow(dead_code)]
    pub fn ambient_starts(&self) -> u32 {
        self.ambient_starts
    }

    /// Start the grand finale. Ignored while one is already running,
    /// including its settle period. Returns whether a finale started.
    pub fn activate(&mut self, now: Duration) -> bool {
        if self.is_finale() {
            log::debug!("finale already running, trigger ignored");
            return false;
        }
        log::info!("finale started");
        self.phase = Phase::Volleying {
            fired: 0,
            next_volley: now + VOLLEY_INTERVAL,
        };
        true
    }

    /// Fire every timer that is due at `now`, in chronological order.
    /// Returns the number of shells launched.
    pub fn update(&mut self, now: Duration, sim: &mut Simulation) -> usize {
        let mut launched = 0;
        while let Some(event) = self.next_due(now) {
            match event {
                Event::Pending => {
                    self.pending.pop_front();
                    launch(sim, Mode::Finale);
                    self.counts.finale += 1;
                    launched += 1;
                }
                Event::Phase(due) => {
                    if self.fire_phase(due, sim) {
                        launched += 1;
                    }
                }
            }
        }
        launched
    }

    /// The earliest timer at or before `now`. Staggered launches win ties so
    /// a volley's last shell goes up before the next volley is queued.
    fn next_due(&self, now: Duration) -> Option<Event> {
        let phase_due = match self.phase {
            Phase::Ambient { next_launch } => next_launch,
            Phase::Volleying { next_volley, .. } => next_volley,
            Phase::Settling { resume_at } => resume_at,
        };
        match self.pending.front() {
            Some(&due) if due <= now && due <= phase_due => Some(Event::Pending),
            _ if phase_due <= now => Some(Event::Phase(phase_due)),
            _ => None,
        }
    }

    /// Returns true when an ambient shell went up.
    fn fire_phase(&mut self, due: Duration, sim: &mut Simulation) -> bool {
        match self.phase {
            Phase::Ambient { .. } => {
                launch(sim, Mode::Ordinary);
                self.counts.ordinary += 1;
                self.phase = Phase::Ambient {
                    next_launch: due + AMBIENT_INTERVAL,
                };
                true
            }
            Phase::Volleying { fired, .. } => {
                let fired = fired + 1;
                self.pending
                    .extend((0..VOLLEY_SIZE).map(|i| due + LAUNCH_STAGGER * i));
                self.counts.volleys += 1;
                log::debug!("volley {fired}/{VOLLEY_COUNT}");
                self.phase = if fired >= VOLLEY_COUNT {
                    Phase::Settling {
                        resume_at: due + SETTLE_DELAY,
                    }
                } else {
                    Phase::Volleying {
                        fired,
                        next_volley: due + VOLLEY_INTERVAL,
                    }
                };
                false
            }
            Phase::Settling { .. } => {
                self.ambient_starts += 1;
                log::info!("finale over, ambient launches resumed");
                self.phase = Phase::Ambient {
                    next_launch: due + AMBIENT_INTERVAL,
                };
                false
            }
        }
    }
}

/// Put one shell in the air from a random spot on the bottom edge.
fn launch(sim: &mut Simulation, mode: Mode) {
    let (width, height) = sim.bounds();
    let rng = sim.rng();
    let start = (rng.random_range(0.0..width), height);
    let tx = rng.random_range(0.0..width);
    let ty = rng.random_range(0.0..height / 2.0);
    let ty = match mode {
        Mode::Ordinary => ty,
        Mode::Finale => (ty + FINALE_TARGET_DROP).min(height),
    };
    let projectile = Projectile::new(start, (tx, ty), mode, rng);
    sim.spawn(projectile);
}
