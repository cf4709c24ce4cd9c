//! The GPU-side particle record.
//!
//! One particle per image tile. The struct is uploaded to the GPU verbatim,
//! so field order and size are part of the wire contract with
//! `gpu/shader_disintegrate.wgsl` (vertex buffer slot 0, locations 0..=4).

use bytemuck::{Pod, Zeroable};

/// A single disintegration particle.
///
/// `position` is in clip space ([-1, 1] both axes, Y up). `velocity` is a
/// constant per-particle drift in clip units per second, fixed at creation.
/// `life` starts at 1.0 and fades to 0 over the session duration; it only
/// drives opacity, not teardown. `tex_coord` selects the tile of the captured
/// image this particle displays. `point_size` is the tile edge length in
/// image pixels, carried as a rendering hint; WebGPU point primitives
/// rasterise at a single pixel so no stage consumes it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub life: f32,
    pub tex_coord: [f32; 2],
    pub point_size: f32,
}

impl Particle {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // velocity
        2 => Float32,   // life
        3 => Float32x2, // tex_coord
        4 => Float32,   // point_size
    ];

    /// Vertex buffer layout for the particle buffer (slot 0, per-vertex step).
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-frame uniforms for the effect pipeline.
///
/// Written in full every tick. In the GPU-uniform strategy this is the *only*
/// per-frame upload; the vertex stage reconstructs positions from it. Bound at
/// group 0, binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct EffectUniforms {
    /// Seconds since the session started.
    pub elapsed: f32,
    /// Configured session duration in seconds.
    pub duration: f32,
    /// Full render surface size in physical pixels.
    pub surface_size: [f32; 2],
}
