//! Tiling generator: captured image -> particle grid.
//!
//! Pure function of the image dimensions, the on-screen geometry of the
//! captured region and the effect config. No ambient reads: display scale,
//! surface size and the capture origin all come in as parameters so the
//! generator is unit-testable.

use glam::Vec2;

use crate::config::EffectConfig;
use crate::particle::Particle;

/// Pixel dimensions of the captured image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// On-screen placement of the captured region.
///
/// All lengths are in logical points; `scale_factor` converts captured-image
/// pixels back to points (the snapshot is rasterised at the display scale).
#[derive(Clone, Copy, Debug)]
pub struct ScreenGeometry {
    /// Size of the full render surface (window) in logical points.
    pub surface_size: Vec2,
    /// Physical-to-logical pixel scale factor of the display.
    pub scale_factor: f32,
    /// Global origin of the captured region within the surface, in points.
    pub capture_origin: Vec2,
}

/// Grid dimensions derived from an image and a tile budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    /// Square tile edge length in image pixels.
    pub tile_size: f32,
    pub tiles_per_row: u32,
    pub tiles_per_column: u32,
}

impl TileGrid {
    /// Derive the grid for `max_tiles` over an image.
    ///
    /// `tile_size = ceil(sqrt(pixels / max_tiles))`, so the resulting count
    /// `tiles_per_row * tiles_per_column` only approximates the budget. The
    /// last row and column may overshoot the image edge; their tiles are
    /// still emitted and rely on clamp-to-edge sampling.
    pub fn derive(image: ImageSize, max_tiles: u32) -> Option<Self> {
        if max_tiles == 0 || image.width == 0 || image.height == 0 {
            return None;
        }
        let width = image.width as f32;
        let height = image.height as f32;
        let estimated_area = width * height / max_tiles as f32;
        let tile_size = estimated_area.sqrt().ceil().max(1.0);
        Some(Self {
            tile_size,
            tiles_per_row: (width / tile_size).ceil() as u32,
            tiles_per_column: (height / tile_size).ceil() as u32,
        })
    }

    pub fn particle_count(&self) -> usize {
        self.tiles_per_row as usize * self.tiles_per_column as usize
    }
}

/// Generate the particle set for one disintegration.
///
/// Emission order is column-major (x outer, y inner); order is consistent but
/// carries no meaning for the blended point output. Positions and texture
/// coordinates are fully determined by the inputs; only velocities consume
/// the RNG, so two runs differing only in seed agree on everything else.
pub fn generate(image: ImageSize, geometry: &ScreenGeometry, config: &EffectConfig) -> Vec<Particle> {
    let grid = match TileGrid::derive(image, config.max_tiles) {
        Some(grid) => grid,
        None => return Vec::new(),
    };

    let image_w = image.width as f32;
    let image_h = image.height as f32;
    let offset = geometry.capture_origin + Vec2::splat(config.inset);
    let mut rng = Xorshift64::new(config.seed);

    let mut particles = Vec::with_capacity(grid.particle_count());
    for x in 0..grid.tiles_per_row {
        for y in 0..grid.tiles_per_column {
            // Texture coordinates are a pure image-space ratio, independent
            // of the display scale. The final row/column may exceed 1.0; the
            // session sampler clamps to edge.
            let tex_coord = [
                x as f32 * grid.tile_size / image_w,
                y as f32 * grid.tile_size / image_h,
            ];

            // Image pixels -> logical points -> global surface position.
            let screen_x = x as f32 * grid.tile_size / geometry.scale_factor + offset.x;
            let screen_y = y as f32 * grid.tile_size / geometry.scale_factor + offset.y;

            // Points -> clip space. Screen Y grows downward, clip Y upward.
            let position = [
                screen_x / geometry.surface_size.x * 2.0 - 1.0,
                1.0 - screen_y / geometry.surface_size.y * 2.0,
            ];

            let velocity = [
                config.velocity_x.sample(rng.next_unit()),
                config.velocity_y.sample(rng.next_unit()),
            ];

            particles.push(Particle {
                position,
                velocity,
                life: 1.0,
                tex_coord,
                point_size: grid.tile_size,
            });
        }
    }

    particles
}

/// xorshift64 RNG for velocity sampling. Deterministic per seed so tests and
/// repeated runs are reproducible.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        // Seed 0 is degenerate for xorshift (stays at zero forever).
        let state = if seed == 0 { 0x5DEECE66D } else { seed };
        Self { state }
    }

    /// Next value in [0, 1].
    fn next_unit(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state as f32) / (u64::MAX as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VelocityRange;

    fn test_geometry() -> ScreenGeometry {
        ScreenGeometry {
            surface_size: Vec2::new(400.0, 800.0),
            scale_factor: 2.0,
            capture_origin: Vec2::new(50.0, 200.0),
        }
    }

    #[test]
    fn square_image_exact_budget() {
        // 1000x1000 at budget 100: tile = ceil(sqrt(10000)) = 100, 10x10 grid.
        let grid = TileGrid::derive(ImageSize::new(1000, 1000), 100).unwrap();
        assert_eq!(grid.tile_size, 100.0);
        assert_eq!(grid.tiles_per_row, 10);
        assert_eq!(grid.tiles_per_column, 10);
        assert_eq!(grid.particle_count(), 100);
    }

    #[test]
    fn point_size_is_tile_edge_in_image_pixels() {
        let particles = generate(
            ImageSize::new(1000, 1000),
            &test_geometry(),
            &EffectConfig {
                max_tiles: 100,
                ..Default::default()
            },
        );
        // Tile edge is 100 image pixels regardless of the 2.0 scale factor.
        assert!(particles.iter().all(|p| p.point_size == 100.0));
    }

    #[test]
    fn count_matches_grid_formula() {
        for (w, h, budget) in [(640, 480, 1_000), (1170, 2532, 50_000), (33, 77, 123)] {
            let grid = TileGrid::derive(ImageSize::new(w, h), budget).unwrap();
            let expected = ((w as f32 / grid.tile_size).ceil()
                * (h as f32 / grid.tile_size).ceil()) as usize;
            let particles = generate(
                ImageSize::new(w, h),
                &test_geometry(),
                &EffectConfig {
                    max_tiles: budget,
                    ..Default::default()
                },
            );
            assert_eq!(particles.len(), expected);
            assert!(!particles.is_empty());
        }
    }

    #[test]
    fn budget_beyond_pixel_count_degrades_to_single_pixel_tiles() {
        let image = ImageSize::new(8, 6);
        let grid = TileGrid::derive(image, 1_000_000).unwrap();
        assert_eq!(grid.tile_size, 1.0);
        let particles = generate(
            image,
            &test_geometry(),
            &EffectConfig {
                max_tiles: 1_000_000,
                ..Default::default()
            },
        );
        assert_eq!(particles.len(), 48);
    }

    #[test]
    fn zero_budget_or_zero_image_yields_empty() {
        let config = EffectConfig {
            max_tiles: 0,
            ..Default::default()
        };
        assert!(generate(ImageSize::new(100, 100), &test_geometry(), &config).is_empty());

        let config = EffectConfig::default();
        assert!(generate(ImageSize::new(0, 100), &test_geometry(), &config).is_empty());
        assert!(generate(ImageSize::new(100, 0), &test_geometry(), &config).is_empty());
    }

    #[test]
    fn tex_coords_cover_unit_square_without_gaps() {
        let particles = generate(
            ImageSize::new(1000, 1000),
            &test_geometry(),
            &EffectConfig {
                max_tiles: 100,
                ..Default::default()
            },
        );
        for particle in &particles {
            assert!(particle.tex_coord[0] >= 0.0 && particle.tex_coord[0] < 1.0);
            assert!(particle.tex_coord[1] >= 0.0 && particle.tex_coord[1] < 1.0);
        }
        // Grid divides evenly here, so the maximum coordinate is 1 - 1/10.
        let max_u = particles
            .iter()
            .map(|p| p.tex_coord[0])
            .fold(0.0f32, f32::max);
        assert!((max_u - 0.9).abs() < 1e-6);
    }

    #[test]
    fn last_column_overshoot_is_emitted_not_clipped() {
        // 110px wide with 100px tiles: second column starts at u = 100/110
        // and extends past the right edge. It must still be present.
        let particles = generate(
            ImageSize::new(110, 100),
            &test_geometry(),
            &EffectConfig {
                max_tiles: 1,
                ..Default::default()
            },
        );
        assert_eq!(particles.len(), 2);
        assert!(particles[1].tex_coord[0] > 0.9);
    }

    #[test]
    fn seed_only_changes_velocity() {
        let image = ImageSize::new(500, 300);
        let geometry = test_geometry();
        let base = EffectConfig {
            max_tiles: 200,
            seed: 1,
            ..Default::default()
        };
        let reseeded = EffectConfig { seed: 2, ..base.clone() };

        let a = generate(image, &geometry, &base);
        let b = generate(image, &geometry, &reseeded);
        assert_eq!(a.len(), b.len());

        let mut velocity_differs = false;
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.position, pb.position);
            assert_eq!(pa.tex_coord, pb.tex_coord);
            assert_eq!(pa.life, pb.life);
            if pa.velocity != pb.velocity {
                velocity_differs = true;
            }
        }
        assert!(velocity_differs, "different seeds should change velocities");
    }

    #[test]
    fn generation_is_deterministic() {
        let image = ImageSize::new(321, 123);
        let geometry = test_geometry();
        let config = EffectConfig {
            max_tiles: 500,
            seed: 99,
            ..Default::default()
        };
        assert_eq!(generate(image, &geometry, &config), generate(image, &geometry, &config));
    }

    #[test]
    fn velocities_stay_within_configured_ranges() {
        let config = EffectConfig {
            max_tiles: 1_000,
            velocity_x: VelocityRange::new(0.05, 0.10),
            velocity_y: VelocityRange::new(-0.01, 0.03),
            ..Default::default()
        };
        let particles = generate(ImageSize::new(400, 400), &test_geometry(), &config);
        for particle in &particles {
            assert!(particle.velocity[0] >= 0.05 && particle.velocity[0] <= 0.10);
            assert!(particle.velocity[1] >= -0.01 && particle.velocity[1] <= 0.03);
        }
    }

    #[test]
    fn clip_space_y_is_flipped() {
        // Top-left tile of the captured region must map to the highest clip
        // Y, bottom-right to the lowest.
        let particles = generate(
            ImageSize::new(1000, 1000),
            &test_geometry(),
            &EffectConfig {
                max_tiles: 100,
                ..Default::default()
            },
        );
        let first_y = particles.first().unwrap().position[1];
        let max_y = particles.iter().map(|p| p.position[1]).fold(f32::MIN, f32::max);
        let min_y = particles.iter().map(|p| p.position[1]).fold(f32::MAX, f32::min);
        assert_eq!(first_y, max_y, "top-left particle has the maximum clip Y");
        assert_eq!(particles.last().unwrap().position[1], min_y);
        assert!(max_y > min_y);
    }

    #[test]
    fn capture_origin_and_inset_shift_positions() {
        let image = ImageSize::new(200, 200);
        let config = EffectConfig {
            max_tiles: 16,
            ..Default::default()
        };
        let at_origin = ScreenGeometry {
            capture_origin: Vec2::ZERO,
            ..test_geometry()
        };
        let shifted = ScreenGeometry {
            capture_origin: Vec2::new(40.0, 0.0),
            ..test_geometry()
        };
        let a = generate(image, &at_origin, &config);
        let b = generate(image, &shifted, &config);
        // 40 points on a 400-point surface is 0.2 clip units.
        assert!((b[0].position[0] - a[0].position[0] - 0.2).abs() < 1e-5);
        assert_eq!(a[0].position[1], b[0].position[1]);

        // Inset applies on both axes and pushes clip Y down.
        let inset = EffectConfig { inset: 60.0, ..config.clone() };
        let c = generate(image, &at_origin, &inset);
        assert!((c[0].position[0] - a[0].position[0] - 0.2).abs() < 1e-5);
        assert!(c[0].position[1] < a[0].position[1]);
    }
}
