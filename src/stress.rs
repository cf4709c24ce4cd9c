//! Stress harness: ramp the particle budget until the frame rate collapses.
//!
//! Each step runs one full disintegration of the same capture at an
//! increasing requested budget and measures the achieved FPS over the
//! session. Steps are labelled by the *requested* budget; the actual
//! area-derived count is reported alongside it since the two only
//! approximately agree.

use std::time::Instant;

use glam::Vec2;
use log::info;

use crate::capture::CapturedFrame;
use crate::config::EffectConfig;
use crate::gpu::renderer::EffectRenderer;
use crate::session::Effect;

/// Budgets below this finish too quickly to produce a meaningful FPS
/// reading, so the threshold stop does not apply to them.
const MIN_BUDGET_FOR_LIMIT: u32 = 4_000;

#[derive(Clone, Copy, Debug)]
pub struct StressOptions {
    pub start_budget: u32,
    pub step: u32,
    pub max_budget: u32,
    /// Stop at the first step whose FPS falls below this.
    pub fps_threshold: f64,
}

impl Default for StressOptions {
    fn default() -> Self {
        Self {
            start_budget: 1_000,
            step: 2_000,
            max_budget: 200_000,
            fps_threshold: 50.0,
        }
    }
}

/// Result of one ramp step.
#[derive(Clone, Copy, Debug)]
pub struct StressStep {
    /// Requested particle budget (the step label).
    pub requested: u32,
    /// Particles actually generated by the tiler.
    pub generated: usize,
    pub fps: f64,
}

pub struct StressReport {
    pub steps: Vec<StressStep>,
    /// Requested budget of the step that crossed the threshold, if any.
    pub limit: Option<u32>,
}

/// The budgets a ramp will visit, in order.
///
/// The ramp ends at the cap or at `u32::MAX`, whichever comes first. A zero
/// step visits the start budget exactly once rather than looping forever
/// (the CLI additionally rejects `--step 0`).
fn budget_ramp(options: &StressOptions) -> Vec<u32> {
    let mut budgets = Vec::new();
    let mut budget = options.start_budget;
    while budget <= options.max_budget {
        budgets.push(budget);
        if options.step == 0 {
            break;
        }
        budget = match budget.checked_add(options.step) {
            Some(next) => next,
            None => break,
        };
    }
    budgets
}

/// Run the ramp against an offscreen target, one full session per step.
pub fn run_stress(
    renderer: &EffectRenderer,
    target: &wgpu::TextureView,
    frame: &CapturedFrame,
    surface_size_points: Vec2,
    base_config: &EffectConfig,
    options: &StressOptions,
) -> StressReport {
    let mut steps = Vec::new();
    let mut limit = None;

    for requested in budget_ramp(options) {
        let config = EffectConfig {
            max_tiles: requested,
            ..base_config.clone()
        };
        let duration = config.duration_secs as f64;
        let mut effect = Effect::new(config);

        if effect.trigger(renderer, frame, surface_size_points).is_none() {
            break;
        }
        let generated = effect.particle_count().unwrap_or(0);

        let epoch = Instant::now();
        let mut frames = 0u64;
        while effect.tick(
            renderer,
            target,
            epoch.elapsed().as_secs_f64(),
            wgpu::Color::TRANSPARENT,
        ) {
            // Block until the GPU drained the submission, so the loop
            // measures real frame cost rather than submission cost.
            renderer.device().poll(wgpu::Maintain::Wait);
            frames += 1;
        }

        let fps = frames as f64 / duration;
        info!("stress: requested {} -> {} particles, {:.1} FPS", requested, generated, fps);
        steps.push(StressStep {
            requested,
            generated,
            fps,
        });

        if fps < options.fps_threshold && requested > MIN_BUDGET_FOR_LIMIT {
            limit = Some(requested);
            break;
        }
    }

    StressReport { steps, limit }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_matches_harness_schedule() {
        let budgets = budget_ramp(&StressOptions::default());
        assert_eq!(budgets[0], 1_000);
        assert_eq!(budgets[1], 3_000);
        assert!(budgets.iter().all(|b| *b <= 200_000));
        assert_eq!(*budgets.last().unwrap(), 199_000);
    }

    #[test]
    fn ramp_saturates_instead_of_overflowing() {
        // A cap at u32::MAX must terminate the ramp, not overflow the
        // budget counter.
        let budgets = budget_ramp(&StressOptions {
            start_budget: 4_000_000_000,
            step: 1_000_000_000,
            max_budget: u32::MAX,
            ..Default::default()
        });
        assert_eq!(budgets, vec![4_000_000_000]);
    }

    #[test]
    fn zero_step_visits_the_start_budget_once() {
        let budgets = budget_ramp(&StressOptions {
            start_budget: 1_000,
            step: 0,
            max_budget: 200_000,
            ..Default::default()
        });
        assert_eq!(budgets, vec![1_000]);
    }

    #[test]
    fn ramp_is_empty_when_start_exceeds_max() {
        let budgets = budget_ramp(&StressOptions {
            start_budget: 500,
            step: 100,
            max_budget: 400,
            ..Default::default()
        });
        assert!(budgets.is_empty());
    }
}
