//! Capture boundary.
//!
//! The host environment is responsible for rasterising the source element
//! into an RGBA image; the core only ever sees the result. The CLI and the
//! viewer stand in for a real host by loading the image from disk.

use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;

use crate::tiling::ImageSize;

/// A rasterised snapshot of the source element plus the context needed to
/// place its tiles back on screen.
pub struct CapturedFrame {
    /// RGBA pixels of the captured region, at physical resolution.
    pub image: image::RgbaImage,
    /// Global origin of the captured region in logical points.
    pub origin: Vec2,
    /// Physical-to-logical scale factor the snapshot was rasterised at.
    pub scale_factor: f32,
}

impl CapturedFrame {
    pub fn new(image: image::RgbaImage, origin: Vec2, scale_factor: f32) -> Self {
        Self {
            image,
            origin,
            scale_factor,
        }
    }

    /// Load a capture stand-in from an image file.
    pub fn from_file(path: &Path, origin: Vec2, scale_factor: f32) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load capture image {:?}", path))?
            .to_rgba8();
        Ok(Self::new(image, origin, scale_factor))
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    /// Logical-point footprint of the capture on screen.
    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(
            self.image.width() as f32 / self.scale_factor,
            self.image.height() as f32 / self.scale_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_and_logical_size() {
        let image = image::RgbaImage::new(200, 100);
        let frame = CapturedFrame::new(image, Vec2::new(10.0, 20.0), 2.0);
        assert_eq!(frame.size(), ImageSize::new(200, 100));
        assert_eq!(frame.logical_size(), Vec2::new(100.0, 50.0));
    }
}
