//! Headless scatter chart driver.
//!
//! Renders a synthetic point cloud through the full render/present cycle
//! and writes every presented frame to disk as PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scatterview_engine::coords::ColorRgba;
use scatterview_engine::logging::{init_logging, LoggingConfig};
use scatterview_engine::overlay::PixelCanvas;
use scatterview_engine::vertex::{BufferUsage, PrimitiveType, Vertex, VertexBuffer};
use scatterview_engine::{
    ChartConfig, DrawTarget, FrameOutcome, GpuInit, RenderStates, ScatterChart, WgpuRenderer,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, `env_logger` syntax. Falls back to `RUST_LOG`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a spiral point cloud to a PNG sequence
    Render {
        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// Number of frames to write
        #[arg(long, default_value_t = 1)]
        frames: u32,

        /// Output width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Output height
        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Number of points in the cloud
        #[arg(long, default_value_t = 20_000)]
        points: usize,

        /// Render the 3D box view
        #[arg(long)]
        three_d: bool,

        /// Derive the X range from Y and the grid aspect
        #[arg(long)]
        polar: bool,

        /// Camera azimuth step per frame, in degrees
        #[arg(long, default_value_t = 3.0)]
        spin: f32,
    },
}

struct RenderArgs {
    out: PathBuf,
    frames: u32,
    width: u32,
    height: u32,
    points: usize,
    three_d: bool,
    polar: bool,
    spin: f32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig { env_filter: cli.log, ..LoggingConfig::default() });

    match cli.command {
        Commands::Render { out, frames, width, height, points, three_d, polar, spin } => {
            render(RenderArgs { out, frames, width, height, points, three_d, polar, spin })
        }
    }
}

fn render(args: RenderArgs) -> Result<()> {
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let config = ChartConfig {
        width: args.width,
        height: args.height,
        enable_3d: args.three_d,
        polar: args.polar,
        ..ChartConfig::default()
    };
    let init = GpuInit::default();
    let mut chart = ScatterChart::new(config, move || WgpuRenderer::new(&init))?;

    chart.set_y_axis_min(-1.2);
    chart.set_y_axis_max(1.2);
    if !args.polar {
        chart.set_x_axis_min(-1.2);
        chart.set_x_axis_max(1.2);
    }
    chart.set_z_axis_min(0.0);
    chart.set_z_axis_max(1.0);

    let mut cloud = VertexBuffer::new(PrimitiveType::Points).with_usage(BufferUsage::Static);
    cloud.set_points(PrimitiveType::Points, spiral(args.points));
    chart.set_trace_overlay(move |target: &mut dyn DrawTarget, states: &RenderStates| {
        cloud.draw(target, states);
    });

    // Crosshair on the origin, in pixel space of the current grid.
    if !args.three_d {
        let origin = (chart.pixel_at_x(0.0, true), chart.pixel_at_y(0.0, true));
        let client = chart.grid().client_rect();
        chart.set_marker_overlay(move |canvas: &mut PixelCanvas<'_>| {
            let x = (client.x + origin.0).round() as i64;
            let y = (client.y + origin.1).round() as i64;
            canvas.cross(x, y, 6, ColorRgba::white());
        });
    }

    let mut written = 0;
    for frame in 0..args.frames {
        match chart.render_and_present() {
            FrameOutcome::Presented(_) => {
                let path = args.out.join(format!("frame_{frame:05}.png"));
                save(&chart.front(), &path)?;
                written += 1;
            }
            FrameOutcome::Skipped(reason) => log::warn!("frame {frame} skipped: {reason:?}"),
            FrameOutcome::Rendered(_) => {}
        }
        chart.camera_mut().change_azimuth(args.spin);
    }

    chart.release();
    log::info!("wrote {written} of {} frames to {}", args.frames, args.out.display());
    Ok(())
}

/// Deterministic three-arm spiral, radius and height growing with index.
fn spiral(count: usize) -> Vec<Vertex> {
    let n = count.max(1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / n;
            let arm = (i % 3) as f32 * std::f32::consts::TAU / 3.0;
            let angle = t * 6.0 * std::f32::consts::PI + arm;
            let r = t;
            let color = [t, 0.4 + 0.6 * (1.0 - t), 1.0 - t, 1.0];
            Vertex::new([r * angle.cos(), r * angle.sin(), t], color)
        })
        .collect()
}

fn save(image: &scatterview_engine::image::RgbaImage, path: &Path) -> Result<()> {
    image.save(path).with_context(|| format!("writing {}", path.display()))
}
