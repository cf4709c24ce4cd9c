//! Interactive viewer.
//!
//! Opens a window, waits for Space (or a click) and runs a disintegration of
//! the loaded image, centred on the surface. While idle the surface is only
//! cleared; the capture becomes visible the moment it disintegrates, so each
//! trigger plays against the bare background. The per-tick driver runs off
//! the window's redraw clock; a tick with no drawable available is skipped
//! outright, with no retry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::Vec2;
use log::{info, warn};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use crate::capture::CapturedFrame;
use crate::config::EffectConfig;
use crate::gpu::renderer::EffectRenderer;
use crate::session::Effect;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

pub fn run(image_path: PathBuf, config: EffectConfig, width: u32, height: u32) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("disintegrate")
            .with_inner_size(LogicalSize::new(width, height))
            .build(&event_loop)?,
    );

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let surface = instance.create_surface(window.clone())?;
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .ok_or_else(|| anyhow!("no compatible graphics adapter found"))?;
    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))?;

    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(caps.formats[0]);
    let size = window.inner_size();
    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &surface_config);

    let renderer = EffectRenderer::new(device, queue, format);
    let mut frame = CapturedFrame::from_file(&image_path, Vec2::ZERO, 1.0)?;
    let mut effect = Effect::new(config);

    let epoch = Instant::now();
    let mut frames_this_second = 0u32;
    let mut fps_window_start = Instant::now();

    info!("viewer ready; press Space or click to disintegrate");

    event_loop.run(move |event, elwt| {
        let event = match event {
            Event::AboutToWait => {
                window.request_redraw();
                return;
            }
            Event::WindowEvent { event, .. } => event,
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => elwt.exit(),
                KeyCode::Space => {
                    trigger(&renderer, &mut effect, &mut frame, &window);
                }
                _ => {}
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                trigger(&renderer, &mut effect, &mut frame, &window);
            }
            WindowEvent::Resized(new_size) => {
                surface_config.width = new_size.width.max(1);
                surface_config.height = new_size.height.max(1);
                surface.configure(renderer.device(), &surface_config);
            }
            WindowEvent::RedrawRequested => {
                let drawable = match surface.get_current_texture() {
                    Ok(drawable) => drawable,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        // Reconfigure and drop the frame; the next redraw
                        // picks up the fresh swapchain.
                        surface.configure(renderer.device(), &surface_config);
                        return;
                    }
                    Err(err) => {
                        warn!("no drawable this tick: {err}");
                        return;
                    }
                };

                let view = drawable
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                effect.tick(&renderer, &view, epoch.elapsed().as_secs_f64(), BACKGROUND);
                drawable.present();

                frames_this_second += 1;
                let window_elapsed = fps_window_start.elapsed().as_secs_f64();
                if window_elapsed >= 1.0 {
                    let fps = frames_this_second as f64 / window_elapsed;
                    window.set_title(&format!("disintegrate - {:.0} FPS", fps));
                    frames_this_second = 0;
                    fps_window_start = Instant::now();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

/// Start (or restart) a disintegration centred on the current surface.
fn trigger(
    renderer: &EffectRenderer,
    effect: &mut Effect,
    frame: &mut CapturedFrame,
    window: &winit::window::Window,
) {
    let scale = window.scale_factor() as f32;
    let physical = window.inner_size();
    let surface_points = Vec2::new(physical.width as f32, physical.height as f32) / scale;

    frame.scale_factor = scale;
    frame.origin = (surface_points - frame.logical_size()) * 0.5;

    effect.trigger(renderer, frame, surface_points);
}
