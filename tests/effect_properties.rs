//! End-to-end properties of the tiling -> animation pipeline, driven with a
//! simulated clock so they hold independent of wall time.

use glam::Vec2;

use disintegrate::animation::{AnimationDriver, UpdateStrategy};
use disintegrate::config::EffectConfig;
use disintegrate::tiling::{self, ImageSize, ScreenGeometry};

fn geometry() -> ScreenGeometry {
    ScreenGeometry {
        surface_size: Vec2::new(390.0, 844.0),
        scale_factor: 3.0,
        capture_origin: Vec2::new(50.0, 200.0),
    }
}

#[test]
fn generated_set_animates_with_absolute_replay() {
    let config = EffectConfig {
        max_tiles: 100,
        seed: 7,
        ..Default::default()
    };
    let particles = tiling::generate(ImageSize::new(1000, 1000), &geometry(), &config);
    assert_eq!(particles.len(), 100);

    let initial = particles.clone();
    let mut driver = AnimationDriver::new(particles, 1.0, UpdateStrategy::CpuIntegration);

    // Irregular tick spacing must not matter: every tick replays from t=0.
    driver.tick(10.0);
    driver.tick(10.017);
    driver.tick(10.3);
    let out = driver.tick(10.75);
    let current = out.particles.unwrap();
    for (now, start) in current.iter().zip(&initial) {
        let expected_x = start.position[0] + start.velocity[0] * 0.75;
        let expected_y = start.position[1] + start.velocity[1] * 0.75;
        assert!((now.position[0] - expected_x).abs() < 1e-5);
        assert!((now.position[1] - expected_y).abs() < 1e-5);
        assert!((now.life - 0.25).abs() < 1e-4);
    }
}

#[test]
fn gpu_strategy_leaves_buffer_source_untouched() {
    let config = EffectConfig {
        max_tiles: 64,
        ..Default::default()
    };
    let particles = tiling::generate(ImageSize::new(512, 512), &geometry(), &config);
    let snapshot = particles.clone();
    let mut driver = AnimationDriver::new(particles, 1.0, UpdateStrategy::GpuUniform);

    driver.tick(5.0);
    let out = driver.tick(5.5);
    assert!(out.particles.is_none());
    assert_eq!(driver.initial_particles(), snapshot.as_slice());
}

#[test]
fn default_drift_cone_moves_particles_right() {
    // The default velocity ranges bias rightward and slightly upward, so
    // after a full session every particle must have drifted right.
    let config = EffectConfig {
        max_tiles: 500,
        ..Default::default()
    };
    let particles = tiling::generate(ImageSize::new(800, 600), &geometry(), &config);
    let initial = particles.clone();
    let mut driver = AnimationDriver::new(particles, 1.0, UpdateStrategy::CpuIntegration);
    driver.tick(0.0);
    let out = driver.tick(0.9);
    for (now, start) in out.particles.unwrap().iter().zip(&initial) {
        assert!(now.position[0] > start.position[0]);
    }
}

#[test]
fn session_expiry_is_independent_of_life() {
    // A shortened duration ends the session even though the life fade and
    // the configured duration disagree frame-to-frame.
    let config = EffectConfig {
        max_tiles: 10,
        duration_secs: 0.25,
        ..Default::default()
    };
    let particles = tiling::generate(ImageSize::new(100, 100), &geometry(), &config);
    let mut driver = AnimationDriver::new(particles, 0.25, UpdateStrategy::CpuIntegration);
    driver.tick(1.0);
    assert!(!driver.finished(1.2));
    let out = driver.tick(1.2);
    assert!((out.particles.unwrap()[0].life - 0.2).abs() < 1e-4);
    assert!(driver.finished(1.25));
    assert!(driver.finished(2.0));
}
