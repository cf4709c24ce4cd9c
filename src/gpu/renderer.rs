//! Render orchestration for the disintegration effect.
//!
//! One draw call per tick: bind the strategy's point-list pipeline, the
//! session's bind group and particle buffer, draw `particle_count` points.
//! The caller provides the target view; surface acquisition (and skipping
//! the tick when no drawable is available) happens at the host boundary.

use crate::animation::UpdateStrategy;
use crate::gpu::buffers::SessionResources;
use crate::gpu::pipeline;

pub struct EffectRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_group_layout: wgpu::BindGroupLayout,
    cpu_pipeline: wgpu::RenderPipeline,
    gpu_pipeline: wgpu::RenderPipeline,
    format: wgpu::TextureFormat,
}

impl EffectRenderer {
    /// Build both strategy pipelines up front for the given target format.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = pipeline::create_effect_bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Disintegrate Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let cpu_pipeline = pipeline::create_disintegrate_pipeline(
            &device,
            &pipeline_layout,
            format,
            UpdateStrategy::CpuIntegration,
        );
        let gpu_pipeline = pipeline::create_disintegrate_pipeline(
            &device,
            &pipeline_layout,
            format,
            UpdateStrategy::GpuUniform,
        );

        Self {
            device,
            queue,
            bind_group_layout,
            cpu_pipeline,
            gpu_pipeline,
            format,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Draw the session's particles into `view`, clearing it first.
    pub fn render(
        &self,
        view: &wgpu::TextureView,
        resources: &SessionResources,
        strategy: UpdateStrategy,
        clear_color: wgpu::Color,
    ) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Disintegrate Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Disintegrate Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let pipeline = match strategy {
                UpdateStrategy::CpuIntegration => &self.cpu_pipeline,
                UpdateStrategy::GpuUniform => &self.gpu_pipeline,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, resources.bind_group(), &[]);
            render_pass.set_vertex_buffer(0, resources.particle_buffer().slice(..));
            render_pass.draw(0..resources.particle_count(), 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Clear `view` without drawing anything (no active session this tick).
    pub fn clear(&self, view: &wgpu::TextureView, clear_color: wgpu::Color) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
