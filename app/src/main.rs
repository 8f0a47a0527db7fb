//! Glimt demo: loads a small textured scene and runs the frame loop
//! against the headless backend, printing FPS and GPU timing reports.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use glimt_core::math::Vec3;
use glimt_graphics::backend::{Backend, HeadlessBackend};
use glimt_graphics::object::ObjectDesc;
use glimt_graphics::pipeline::{ShaderBytecode, ShaderSet};
use glimt_graphics::renderer::{Renderer, RendererConfig};
use glimt_graphics::surface::HeadlessSurface;
use glimt_graphics::GraphicsError;

#[derive(Parser, Debug)]
#[command(name = "glimt", about = "Minimal explicit-API renderer demo")]
struct Args {
    /// Number of frames to render.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Directory holding meshes, materials, textures, and shaders.
    #[arg(long, default_value = "app/assets")]
    assets: PathBuf,

    /// Compiled shader directory.
    #[arg(long, default_value = "app/shaders")]
    shaders: PathBuf,

    /// Render target width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Render target height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// GPU benchmark sample count.
    #[arg(long, default_value_t = 1000)]
    benchmark_samples: usize,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_shaders(args: &Args) -> Result<ShaderSet, GraphicsError> {
    let read = |name: &str| -> Result<Vec<u8>, GraphicsError> {
        let path = args.shaders.join(name);
        std::fs::read(&path).map_err(|e| {
            GraphicsError::AssetLoad(format!("{}: {e}", path.display()))
        })
    };
    Ok(ShaderSet {
        vertex: ShaderBytecode::new(read("scene.hlsl")?, "VSMain"),
        pixel: ShaderBytecode::new(read("scene.hlsl")?, "PSMain"),
    })
}

/// A room box, two crates, an animated sprite, and two half-size crates.
fn populate_scene(renderer: &mut Renderer, assets: &PathBuf) {
    let box_obj = assets.join("box.obj");
    let sprite_obj = assets.join("sprite.obj");
    let objects = [
        ObjectDesc::new(&box_obj)
            .with_label("room")
            .with_scale(Vec3::new(10.0, 10.0, 10.0)),
        ObjectDesc::new(&box_obj)
            .with_label("crate right")
            .with_position(Vec3::new(2.0, 0.0, 0.0)),
        ObjectDesc::new(&box_obj)
            .with_label("crate left")
            .with_position(Vec3::new(-2.0, 0.0, 0.0)),
        ObjectDesc::new(&sprite_obj)
            .with_label("sprite")
            .with_position(Vec3::new(0.0, 1.0, 0.0)),
        ObjectDesc::new(&box_obj)
            .with_label("half crate")
            .with_position(Vec3::new(1.0, 0.5, 1.0))
            .with_scale(Vec3::new(0.5, 0.5, 0.5)),
        ObjectDesc::new(&box_obj)
            .with_label("half crate wireframe")
            .with_position(Vec3::new(-1.0, 0.5, 1.0))
            .with_scale(Vec3::new(0.5, 0.5, 0.5))
            .with_wireframe(true),
    ];
    for desc in &objects {
        // A broken asset costs one object, not the run.
        if let Err(err) = renderer.create_object(desc) {
            log::error!("skipping '{}': {err}", desc.label);
        }
    }
}

fn run(args: &Args) -> Result<(), GraphicsError> {
    let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::new());
    let surface = HeadlessSurface::new(args.width, args.height);
    let shaders = load_shaders(args)?;
    let config = RendererConfig {
        benchmark_samples: args.benchmark_samples,
        ..RendererConfig::default()
    };

    let mut renderer = Renderer::new(backend, Box::new(surface), shaders, config)?;
    populate_scene(&mut renderer, &args.assets);
    log::info!("scene holds {} objects", renderer.object_count());

    let mut fps = String::new();
    for _ in 0..args.frames {
        if let Err(err) = renderer.frame() {
            // The frame skipped presentation; keep looping.
            log::error!("frame dropped: {err}");
        }
        if renderer.fps_string() != fps {
            fps = renderer.fps_string().to_owned();
            println!("{fps}");
        }
    }

    println!("{}", renderer.frame_benchmark_report());
    println!("{}", renderer.object_benchmark_report());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
