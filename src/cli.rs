use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use std::path::PathBuf;

use crate::animation::UpdateStrategy;
use crate::capture::CapturedFrame;
use crate::config::EffectConfig;
use crate::gpu::renderer::EffectRenderer;
use crate::session::Effect;
use crate::stress::{self, StressOptions};
use crate::viewer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one disintegration to numbered PNG frames
    Render {
        /// Source image standing in for the captured view
        #[arg(long)]
        image: PathBuf,

        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// Effect config JSON (missing fields use defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Frames per second of the simulated display clock
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Particle budget override
        #[arg(long)]
        budget: Option<u32>,

        /// Update strategy override: "cpu" or "gpu"
        #[arg(long)]
        strategy: Option<String>,

        /// Render surface width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Render surface height
        #[arg(long, default_value_t = 600)]
        height: u32,
    },

    /// Ramp the particle budget and report FPS per step
    Stress {
        /// Source image; omitted, a flat-colour box is disintegrated
        #[arg(long)]
        image: Option<PathBuf>,

        /// Effect config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 1_000)]
        start: u32,

        #[arg(long, default_value_t = 2_000)]
        step: u32,

        #[arg(long, default_value_t = 200_000)]
        max: u32,

        /// Stop at the first step below this FPS
        #[arg(long, default_value_t = 50.0)]
        threshold: f64,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,
    },

    /// Open a window and trigger disintegrations interactively
    View {
        /// Source image standing in for the captured view
        #[arg(long)]
        image: PathBuf,

        /// Effect config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            image,
            out,
            config,
            fps,
            budget,
            strategy,
            width,
            height,
        } => {
            let mut effect_config = load_config(config.as_deref())?;
            if let Some(budget) = budget {
                effect_config.max_tiles = budget;
            }
            if let Some(strategy) = strategy.as_deref() {
                effect_config.strategy = parse_strategy(strategy)?;
            }
            pollster::block_on(render_offline(image, out, effect_config, fps, width, height))?;
        }
        Commands::Stress {
            image,
            config,
            start,
            step,
            max,
            threshold,
            width,
            height,
        } => {
            if step == 0 {
                return Err(anyhow!("--step must be at least 1"));
            }
            let effect_config = load_config(config.as_deref())?;
            let options = StressOptions {
                start_budget: start,
                step,
                max_budget: max,
                fps_threshold: threshold,
            };
            pollster::block_on(run_stress(image, effect_config, options, width, height))?;
        }
        Commands::View {
            image,
            config,
            width,
            height,
        } => {
            let effect_config = load_config(config.as_deref())?;
            viewer::run(image, effect_config, width, height)?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<EffectConfig> {
    match path {
        Some(path) => EffectConfig::from_json_file(path),
        None => Ok(EffectConfig::default()),
    }
}

fn parse_strategy(value: &str) -> Result<UpdateStrategy> {
    match value {
        "cpu" => Ok(UpdateStrategy::CpuIntegration),
        "gpu" => Ok(UpdateStrategy::GpuUniform),
        other => Err(anyhow!("unknown strategy {:?}, expected \"cpu\" or \"gpu\"", other)),
    }
}

/// Headless device plus an offscreen render target.
///
/// No compatible adapter or a failed device request is an environment
/// failure and aborts the command, unlike the per-frame no-ops.
async fn create_headless(width: u32, height: u32) -> Result<(EffectRenderer, wgpu::Texture)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| anyhow!("no compatible graphics adapter found"))?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await?;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Target Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let renderer = EffectRenderer::new(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb);
    Ok((renderer, texture))
}

/// Centre the capture on the surface, as the interactive demo does.
fn centered_capture(path: &std::path::Path, surface_points: Vec2) -> Result<CapturedFrame> {
    let mut frame = CapturedFrame::from_file(path, Vec2::ZERO, 1.0)?;
    frame.origin = (surface_points - frame.logical_size()) * 0.5;
    Ok(frame)
}

async fn render_offline(
    image_path: PathBuf,
    out_dir: PathBuf,
    config: EffectConfig,
    fps: f32,
    width: u32,
    height: u32,
) -> Result<()> {
    let (renderer, texture) = create_headless(width, height).await?;
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let surface_points = Vec2::new(width as f32, height as f32);
    let frame = centered_capture(&image_path, surface_points)?;

    // Readback buffer: rows padded to the 256-byte copy alignment.
    let u32_size = std::mem::size_of::<u32>() as u32;
    let unpadded_bytes_per_row = u32_size * width;
    let align = 256;
    let padded_bytes_per_row =
        unpadded_bytes_per_row + (align - unpadded_bytes_per_row % align) % align;
    let output_buffer = renderer.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("Output Buffer"),
        size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    std::fs::create_dir_all(&out_dir)?;

    let mut effect = Effect::new(config);
    effect
        .trigger(&renderer, &frame, surface_points)
        .ok_or_else(|| anyhow!("capture produced no particles"))?;

    let dt = 1.0 / fps as f64;
    println!("Rendering to {:?}...", out_dir);

    let mut frame_index = 0usize;
    // Simulated display clock: the driver only sees these timestamps, so
    // output is deterministic regardless of render speed.
    while effect.tick(
        &renderer,
        &texture_view,
        frame_index as f64 * dt,
        wgpu::Color::BLACK,
    ) {
        let mut encoder = renderer
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            texture.size(),
        );
        renderer.queue().submit(Some(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
            let _ = tx.send(v);
        });
        renderer.device().poll(wgpu::Maintain::Wait);
        rx.recv()
            .context("readback channel closed")?
            .context("frame readback failed")?;

        {
            let data = buffer_slice.get_mapped_range();
            let mut unpadded = Vec::with_capacity((width * height * 4) as usize);
            for row in 0..height {
                let start = (row * padded_bytes_per_row) as usize;
                unpadded.extend_from_slice(&data[start..start + (width * 4) as usize]);
            }
            let frame_path = out_dir.join(format!("frame_{:05}.png", frame_index));
            image::save_buffer(&frame_path, &unpadded, width, height, image::ColorType::Rgba8)?;
        }
        output_buffer.unmap();

        frame_index += 1;
    }

    println!("Done: {} frames.", frame_index);
    Ok(())
}

async fn run_stress(
    image_path: Option<PathBuf>,
    config: EffectConfig,
    options: StressOptions,
    width: u32,
    height: u32,
) -> Result<()> {
    let (renderer, texture) = create_headless(width, height).await?;
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let surface_points = Vec2::new(width as f32, height as f32);

    let frame = match image_path {
        Some(path) => centered_capture(&path, surface_points)?,
        None => {
            // The original harness disintegrated a flat-colour box.
            let image = image::RgbaImage::from_pixel(400, 500, image::Rgba([60, 120, 230, 255]));
            CapturedFrame::new(image, Vec2::new(50.0, 50.0), 1.0)
        }
    };

    let report = stress::run_stress(&renderer, &texture_view, &frame, surface_points, &config, &options);

    for step in &report.steps {
        println!(
            "particles: {:>7} requested / {:>7} generated -> {:6.1} FPS",
            step.requested, step.generated, step.fps
        );
    }
    match report.limit {
        Some(limit) => println!("limit reached at requested budget {}", limit),
        None => println!("no limit reached up to budget {}", options.max_budget),
    }
    Ok(())
}
