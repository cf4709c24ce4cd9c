//! Per-session GPU resources.
//!
//! Each triggered disintegration allocates its own particle buffer, uniform
//! buffer and capture texture, and drops them when the session is replaced
//! or torn down. No pooling across sessions: the effect fires at decorative
//! frequency, so fresh allocation keeps the lifecycle trivial.

use wgpu::util::DeviceExt;

use crate::particle::{EffectUniforms, Particle};

/// GPU-visible state for one effect session.
pub struct SessionResources {
    particle_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    capture_texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    particle_count: u32,
}

impl SessionResources {
    /// Allocate and populate the session's buffers and texture.
    ///
    /// The particle buffer is sized exactly to the particle array and
    /// uploaded once here; under CPU integration it is then overwritten in
    /// full every tick via [`SessionResources::write_particles`].
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        particles: &[Particle],
        image: &image::RgbaImage,
    ) -> Self {
        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(particles),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Effect Uniform Buffer"),
            size: std::mem::size_of::<EffectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let capture_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &capture_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let capture_view = capture_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Clamp-to-edge: the final tile row/column may sample past the image
        // edge, which repeats the edge texel rather than wrapping.
        let capture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Capture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&capture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&capture_sampler),
                },
            ],
            label: Some("effect_bind_group"),
        });

        Self {
            particle_buffer,
            uniform_buffer,
            capture_texture,
            bind_group,
            particle_count: particles.len() as u32,
        }
    }

    /// Whole-buffer replace of the particle array (CPU-integration ticks).
    pub fn write_particles(&self, queue: &wgpu::Queue, particles: &[Particle]) {
        debug_assert_eq!(particles.len() as u32, self.particle_count);
        queue.write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(particles));
    }

    /// Per-tick uniform upload (both strategies).
    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &EffectUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        &self.particle_buffer
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }
}
