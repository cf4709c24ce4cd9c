//! Per-tick animation state.
//!
//! The driver is fed a wall-clock reading each display tick and produces what
//! must be uploaded that frame. Two strategies exist because the effect
//! originally integrated positions on the CPU and re-uploaded the whole
//! particle buffer each frame, then moved that arithmetic into the vertex
//! stage once stress testing showed the copy dominating at high counts. Both
//! are kept behind one tagged enum.
//!
//! Position evaluation is absolute replay: `initial + velocity * elapsed`,
//! recomputed from t=0 every tick. Incremental accumulation would diverge
//! under uneven frame intervals and is deliberately not used.

use serde::{Deserialize, Serialize};

use crate::particle::Particle;

/// Where per-frame position evaluation happens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStrategy {
    /// Recompute every particle on the CPU and re-upload the full buffer
    /// each tick.
    CpuIntegration,
    /// Upload only the elapsed time; the vertex stage evaluates
    /// `initial + velocity * elapsed`. Scales better into the tens of
    /// thousands of particles.
    #[default]
    GpuUniform,
}

/// What one tick decided to upload.
pub struct TickOutput<'a> {
    /// Seconds since the session started, zero on the very first tick.
    pub elapsed: f32,
    /// Refreshed particle array, present only under `CpuIntegration`. The
    /// consumer copies it into the particle buffer in one bulk write.
    pub particles: Option<&'a [Particle]>,
}

/// Advances one effect session's animation state.
pub struct AnimationDriver {
    strategy: UpdateStrategy,
    duration_secs: f32,
    /// Pristine creation-time particle state; never mutated.
    initial: Vec<Particle>,
    /// CPU-strategy working copy, rebuilt from `initial` every tick.
    scratch: Vec<Particle>,
    /// Wall-clock reading of the first tick. `None` until then; the first
    /// tick records it and reports zero elapsed rather than applying a
    /// nonsensical interval.
    started_at: Option<f64>,
}

impl AnimationDriver {
    pub fn new(particles: Vec<Particle>, duration_secs: f32, strategy: UpdateStrategy) -> Self {
        let scratch = match strategy {
            UpdateStrategy::CpuIntegration => particles.clone(),
            UpdateStrategy::GpuUniform => Vec::new(),
        };
        Self {
            strategy,
            duration_secs,
            initial: particles,
            scratch,
            started_at: None,
        }
    }

    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    pub fn particle_count(&self) -> usize {
        self.initial.len()
    }

    /// Creation-time particle state, as uploaded at session start.
    pub fn initial_particles(&self) -> &[Particle] {
        &self.initial
    }

    /// Seconds elapsed at `now_secs`, zero before the first tick.
    pub fn elapsed(&self, now_secs: f64) -> f32 {
        match self.started_at {
            Some(start) => (now_secs - start).max(0.0) as f32,
            None => 0.0,
        }
    }

    /// Whether the session duration has run out. Time-based only; `life`
    /// values are a visual fade and never authoritative for teardown.
    pub fn finished(&self, now_secs: f64) -> bool {
        self.elapsed(now_secs) >= self.duration_secs
    }

    /// Advance to `now_secs` and return this frame's upload set.
    pub fn tick(&mut self, now_secs: f64) -> TickOutput<'_> {
        if self.started_at.is_none() {
            self.started_at = Some(now_secs);
        }
        let elapsed = self.elapsed(now_secs);

        match self.strategy {
            UpdateStrategy::GpuUniform => TickOutput {
                elapsed,
                particles: None,
            },
            UpdateStrategy::CpuIntegration => {
                let life = (1.0 - elapsed / self.duration_secs).max(0.0);
                for (current, initial) in self.scratch.iter_mut().zip(&self.initial) {
                    current.position = [
                        initial.position[0] + initial.velocity[0] * elapsed,
                        initial.position[1] + initial.velocity[1] * elapsed,
                    ];
                    current.life = life;
                }
                TickOutput {
                    elapsed,
                    particles: Some(&self.scratch),
                }
            }
        }
    }
}
