//! raycam CLI - render mesh scenes to image sequences
//!
//! Renders a JSON scene along a trajectory file or an automatic orbit and
//! writes color, depth, mask and depth-visualization PNGs per frame.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use raycam::camera::trajectory::{read_indexed_trajectory, write_trajectory};
use raycam::math::Pose;
use raycam::{
    orbit_poses, render_frames, ColorInterpolation, RenderOptions, Renderer, Scene, ShadingNormal,
};

#[derive(Parser)]
#[command(name = "raycam")]
#[command(about = "Ray-cast color, depth and mask rendering of mesh scenes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene from every pose of a trajectory or an orbit
    Render {
        /// Scene JSON file (mesh and camera)
        #[arg(long)]
        scene: PathBuf,
        /// Render options TOML file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(long)]
        out: PathBuf,
        /// Trajectory file (`index tx ty tz qx qy qz qw` per line)
        #[arg(long, conflicts_with = "orbit", required_unless_present = "orbit")]
        trajectory: Option<PathBuf>,
        /// Render this many poses circling the mesh instead of a trajectory
        #[arg(long)]
        orbit: Option<usize>,
        /// Override the depth scale
        #[arg(long)]
        depth_scale: Option<f64>,
        /// Shade with per-vertex colors
        #[arg(long)]
        vertex_color: bool,
        /// Override vertex color interpolation
        #[arg(long, value_enum)]
        interp: Option<InterpArg>,
        /// Keep hits on back-facing triangles
        #[arg(long)]
        no_backface_culling: bool,
        /// Override the normal image source
        #[arg(long, value_enum)]
        shading_normal: Option<NormalArg>,
    },
    /// Write an orbit trajectory around a scene's mesh
    Orbit {
        /// Scene JSON file
        #[arg(long)]
        scene: PathBuf,
        /// Number of poses
        #[arg(long, default_value_t = 36)]
        count: usize,
        /// Output trajectory file
        #[arg(long)]
        out: PathBuf,
    },
    /// Display information about a scene file
    Info {
        /// Scene JSON file
        #[arg(long)]
        scene: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InterpArg {
    Nearest,
    Bilinear,
}

#[derive(Clone, Copy, ValueEnum)]
enum NormalArg {
    Face,
    Vertex,
}

impl From<NormalArg> for ShadingNormal {
    fn from(arg: NormalArg) -> Self {
        match arg {
            NormalArg::Face => ShadingNormal::Face,
            NormalArg::Vertex => ShadingNormal::Vertex,
        }
    }
}

impl From<InterpArg> for ColorInterpolation {
    fn from(arg: InterpArg) -> Self {
        match arg {
            InterpArg::Nearest => ColorInterpolation::Nearest,
            InterpArg::Bilinear => ColorInterpolation::Bilinear,
        }
    }
}

/// Flag overrides applied on top of the TOML options.
struct OptionOverrides {
    depth_scale: Option<f64>,
    vertex_color: bool,
    interp: Option<InterpArg>,
    no_backface_culling: bool,
    shading_normal: Option<NormalArg>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(cli.command)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Render {
            scene,
            config,
            out,
            trajectory,
            orbit,
            depth_scale,
            vertex_color,
            interp,
            no_backface_culling,
            shading_normal,
        } => {
            let overrides = OptionOverrides {
                depth_scale,
                vertex_color,
                interp,
                no_backface_culling,
                shading_normal,
            };
            let options = load_options(config.as_deref(), &overrides)?;
            render_scene(&scene, &out, trajectory.as_deref(), orbit, &options)?;
        }
        Commands::Orbit { scene, count, out } => {
            write_orbit(&scene, count, &out)?;
        }
        Commands::Info { scene } => {
            show_info(&scene)?;
        }
    }
    Ok(())
}

fn load_options(config: Option<&Path>, overrides: &OptionOverrides) -> Result<RenderOptions> {
    let mut options = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RenderOptions::from_toml_str(&text)
                .with_context(|| format!("invalid options in {}", path.display()))?
        }
        None => RenderOptions::default(),
    };

    if let Some(scale) = overrides.depth_scale {
        options.depth_scale = scale;
    }
    if overrides.vertex_color {
        options.use_vertex_color = true;
    }
    if let Some(interp) = overrides.interp {
        options.interp = interp.into();
    }
    if overrides.no_backface_culling {
        options.backface_culling = false;
    }
    if let Some(normal) = overrides.shading_normal {
        options.shading_normal = normal.into();
    }
    options.validate()?;
    Ok(options)
}

fn render_scene(
    scene_path: &Path,
    out: &Path,
    trajectory: Option<&Path>,
    orbit: Option<usize>,
    options: &RenderOptions,
) -> Result<()> {
    let scene = Scene::load(scene_path)
        .with_context(|| format!("failed to load scene {}", scene_path.display()))?;
    let mesh = scene.to_mesh()?;
    let stats = mesh
        .stats()
        .context("scene mesh has no vertices")?;

    let frames: Vec<(i64, Pose)> = match (trajectory, orbit) {
        (Some(path), _) => read_indexed_trajectory(path)
            .with_context(|| format!("failed to read trajectory {}", path.display()))?,
        (None, Some(count)) => orbit_poses(&stats, count)
            .into_iter()
            .enumerate()
            .map(|(i, pose)| (i as i64, pose))
            .collect(),
        (None, None) => anyhow::bail!("either --trajectory or --orbit is required"),
    };
    if frames.is_empty() {
        anyhow::bail!("no poses to render");
    }
    log::info!("rendering {} frame(s) of {}", frames.len(), scene_path.display());

    let mut renderer = Renderer::new();
    renderer.set_mesh(Arc::new(mesh));
    renderer.prepare()?;

    let mut camera = scene.camera.build(frames[0].1)?;
    let written = render_frames(&renderer, &mut camera, &frames, options, out)?;

    println!("Rendered {} frame(s) to {}", written, out.display());
    Ok(())
}

fn write_orbit(scene_path: &Path, count: usize, out: &Path) -> Result<()> {
    let scene = Scene::load(scene_path)
        .with_context(|| format!("failed to load scene {}", scene_path.display()))?;
    let stats = scene.to_mesh()?.stats().context("scene mesh has no vertices")?;

    let poses = orbit_poses(&stats, count);
    write_trajectory(out, &poses)?;

    println!("Wrote {} pose(s) to {}", poses.len(), out.display());
    Ok(())
}

fn show_info(scene_path: &Path) -> Result<()> {
    let scene = Scene::load(scene_path)
        .with_context(|| format!("failed to load scene {}", scene_path.display()))?;
    let mesh = scene.to_mesh()?;

    println!("raycam scene: {}", scene_path.display());
    println!("  Vertices: {}", mesh.num_vertices());
    println!("  Triangles: {}", mesh.num_triangles());
    println!(
        "  Vertex colors: {}",
        if scene.colors.is_some() { "yes" } else { "no" }
    );
    println!(
        "  Vertex normals: {}",
        if scene.normals.is_some() { "given" } else { "computed" }
    );
    if let Some(stats) = mesh.stats() {
        println!(
            "  Bounds: [{:.3}, {:.3}, {:.3}] - [{:.3}, {:.3}, {:.3}]",
            stats.bb_min.x, stats.bb_min.y, stats.bb_min.z, stats.bb_max.x, stats.bb_max.y, stats.bb_max.z
        );
        println!(
            "  Center: [{:.3}, {:.3}, {:.3}]",
            stats.center.x, stats.center.y, stats.center.z
        );
    }
    println!("  Camera: {:?}", scene.camera);
    Ok(())
}
