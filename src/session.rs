//! Effect session lifecycle.
//!
//! A session is one disintegration from trigger to teardown: the captured
//! texture, the particle and uniform buffers, the animation driver and the
//! start timestamp. At most one session is active per [`Effect`]; triggering
//! again tears the previous one down first. Teardown is driven by elapsed
//! time against the configured duration, never by particle life.

use glam::Vec2;
use log::{debug, info, warn};

use crate::animation::AnimationDriver;
use crate::capture::CapturedFrame;
use crate::config::EffectConfig;
use crate::gpu::buffers::SessionResources;
use crate::gpu::renderer::EffectRenderer;
use crate::particle::EffectUniforms;
use crate::tiling::{self, ScreenGeometry};

/// Generation token for a triggered session.
///
/// Hosts that schedule a deferred teardown keep the token; a token from a
/// session that has since been replaced no longer matches and the stale
/// teardown is a no-op instead of killing the new session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Allocates generation tokens and knows which one is live.
#[derive(Debug, Default)]
struct SessionTracker {
    current: u64,
}

impl SessionTracker {
    fn begin(&mut self) -> SessionToken {
        self.current += 1;
        SessionToken(self.current)
    }

    fn is_live(&self, token: SessionToken) -> bool {
        token.0 == self.current
    }
}

struct ActiveSession {
    driver: AnimationDriver,
    resources: SessionResources,
    /// Full surface size in physical pixels, for the uniform block.
    surface_size_px: [f32; 2],
    token: SessionToken,
}

/// Host-facing disintegration effect bound to one render surface.
pub struct Effect {
    config: EffectConfig,
    tracker: SessionTracker,
    session: Option<ActiveSession>,
}

impl Effect {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            tracker: SessionTracker::default(),
            session: None,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Particle count of the active session, if any.
    pub fn particle_count(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.driver.particle_count())
    }

    /// Start a disintegration for `frame` on a surface of
    /// `surface_size_points` logical points.
    ///
    /// Any active session is torn down first (its buffers drop here). A
    /// capture that produces no particles (zero-area image or zero budget)
    /// is a silent no-op, matching the transient-failure handling of the
    /// original: the trigger just does nothing.
    pub fn trigger(
        &mut self,
        renderer: &EffectRenderer,
        frame: &CapturedFrame,
        surface_size_points: Vec2,
    ) -> Option<SessionToken> {
        // Old session's particle state and buffers go before the new ones
        // are generated.
        self.session = None;

        let geometry = ScreenGeometry {
            surface_size: surface_size_points,
            scale_factor: frame.scale_factor,
            capture_origin: frame.origin,
        };
        let particles = tiling::generate(frame.size(), &geometry, &self.config);
        if particles.is_empty() {
            warn!(
                "disintegration skipped: no particles for {:?} at budget {}",
                frame.size(),
                self.config.max_tiles
            );
            return None;
        }

        info!(
            "disintegration started: {} particles (budget {}), strategy {:?}",
            particles.len(),
            self.config.max_tiles,
            self.config.strategy
        );

        let resources = SessionResources::new(
            renderer.device(),
            renderer.queue(),
            renderer.bind_group_layout(),
            &particles,
            &frame.image,
        );
        let driver = AnimationDriver::new(
            particles,
            self.config.duration_secs,
            self.config.strategy,
        );
        let token = self.tracker.begin();
        self.session = Some(ActiveSession {
            driver,
            resources,
            surface_size_px: (surface_size_points * frame.scale_factor).into(),
            token,
        });
        Some(token)
    }

    /// Advance and draw one frame at `now_secs` (any monotonic clock).
    ///
    /// Returns false once the session has expired (the expiry tick tears it
    /// down and only clears). Buffer writes complete before the draw that
    /// consumes them is submitted; both happen on the calling thread.
    pub fn tick(
        &mut self,
        renderer: &EffectRenderer,
        view: &wgpu::TextureView,
        now_secs: f64,
        clear_color: wgpu::Color,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            renderer.clear(view, clear_color);
            return false;
        };

        if session.driver.finished(now_secs) {
            debug!("disintegration finished after {:.3}s", session.driver.elapsed(now_secs));
            self.session = None;
            renderer.clear(view, clear_color);
            return false;
        }

        let surface_size = session.surface_size_px;
        let duration = self.config.duration_secs;
        let output = session.driver.tick(now_secs);
        if let Some(particles) = output.particles {
            session.resources.write_particles(renderer.queue(), particles);
        }
        session.resources.write_uniforms(
            renderer.queue(),
            &EffectUniforms {
                elapsed: output.elapsed,
                duration,
                surface_size,
            },
        );

        renderer.render(view, &session.resources, self.config.strategy, clear_color);
        true
    }

    /// Deferred-teardown entry point for hosts with their own timers.
    ///
    /// Tears the session down only if `token` still names the live session;
    /// a stale token is a harmless no-op. Returns whether anything happened.
    pub fn teardown(&mut self, token: SessionToken) -> bool {
        if self.tracker.is_live(token) && self.session.is_some() {
            debug!("session {:?} torn down", token);
            self.session = None;
            true
        } else {
            false
        }
    }
}
