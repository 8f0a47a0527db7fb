//! Full frame-loop behavior against the headless backend.

use std::sync::Arc;

use glimt_core::mesh::parse_obj;
use glimt_core::CpuTexture;
use glimt_graphics::backend::{Backend, HeadlessBackend};
use glimt_graphics::object::{ObjectDesc, SceneObject};
use glimt_graphics::pipeline::{ShaderBytecode, ShaderSet};
use glimt_graphics::renderer::{Renderer, RendererConfig};
use glimt_graphics::surface::HeadlessSurface;
use glimt_graphics::types::ResourceState;
use glimt_graphics::ResourceId;

const QUAD_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 4/4/1 5/5/1 6/6/1
";

fn shaders() -> ShaderSet {
    let _ = env_logger::builder().is_test(true).try_init();
    ShaderSet {
        vertex: ShaderBytecode::new(b"vs".to_vec(), "vs_main"),
        pixel: ShaderBytecode::new(b"ps".to_vec(), "ps_main"),
    }
}

fn solid_texture(byte: u8) -> CpuTexture {
    CpuTexture {
        width: 2,
        height: 2,
        pixels: vec![byte; 16],
    }
}

fn quad(
    backend: &Arc<dyn Backend>,
    textures: &[CpuTexture],
    label: &str,
) -> SceneObject {
    SceneObject::from_parts(
        backend,
        &parse_obj(QUAD_OBJ, "quad.obj"),
        textures,
        &shaders(),
        &ObjectDesc::new("quad.obj").with_label(label),
    )
    .unwrap()
}

struct Scene {
    headless: Arc<HeadlessBackend>,
    renderer: Renderer,
    still_textures: Vec<ResourceId>,
    animated_textures: Vec<ResourceId>,
}

/// One still object and one three-frame animated object.
fn scene(config: RendererConfig) -> Scene {
    let headless = Arc::new(HeadlessBackend::new());
    let backend: Arc<dyn Backend> = headless.clone();

    let still = quad(&backend, &[solid_texture(0x11)], "still");
    let animated = quad(
        &backend,
        &[solid_texture(0x22), solid_texture(0x33), solid_texture(0x44)],
        "animated",
    );
    let still_textures = still.texture_set().texture_ids();
    let animated_textures = animated.texture_set().texture_ids();

    let mut renderer = Renderer::new(
        backend,
        Box::new(HeadlessSurface::new(128, 128)),
        shaders(),
        config,
    )
    .unwrap();
    renderer.add_object(still);
    renderer.add_object(animated);

    Scene {
        headless,
        renderer,
        still_textures,
        animated_textures,
    }
}

#[test]
fn textures_round_trip_to_copy_dest_every_frame() {
    let mut scene = scene(RendererConfig::default());

    for _ in 0..5 {
        scene.renderer.frame().unwrap();
        for id in scene
            .still_textures
            .iter()
            .chain(scene.animated_textures.iter())
        {
            assert_eq!(
                scene.headless.resource_state(*id),
                Some(ResourceState::CopyDest),
                "texture {id} did not return to CopyDest"
            );
        }
    }
}

#[test]
fn uploads_happen_on_the_first_frame_only() {
    let mut scene = scene(RendererConfig::default());

    scene.renderer.frame().unwrap();
    // 1 still + 3 animated textures.
    assert_eq!(scene.headless.copy_count(), 4);

    for _ in 0..4 {
        scene.renderer.frame().unwrap();
    }
    assert_eq!(scene.headless.copy_count(), 4);

    // The copies moved the staged bytes into the textures.
    assert_eq!(
        scene.headless.texture_data(scene.still_textures[0]),
        Some(vec![0x11; 16])
    );
    assert_eq!(
        scene.headless.texture_data(scene.animated_textures[2]),
        Some(vec![0x44; 16])
    );
}

#[test]
fn every_frame_retires_before_the_next_begins() {
    let mut scene = scene(RendererConfig::default());

    for expected in 1..=6u64 {
        scene.renderer.frame().unwrap();
        assert_eq!(scene.headless.completed_value(), expected);
    }
    assert_eq!(scene.renderer.frame_count(), 6);
}

#[test]
fn benchmark_reports_cover_all_objects() {
    let config = RendererConfig {
        benchmark_samples: 3,
        ..RendererConfig::default()
    };
    let mut scene = scene(config);

    for _ in 0..3 {
        scene.renderer.frame().unwrap();
    }
    assert!(scene.renderer.benchmark_complete());

    let report = scene.renderer.object_benchmark_report();
    assert!(report.contains("Object 0"));
    assert!(report.contains("Object 1"));
    assert!(report.contains("Benchmark average was made with 3 samples"));
    assert!(scene
        .renderer
        .frame_benchmark_report()
        .contains("3 samples"));
}

#[test]
fn renderer_drop_drains_the_fence() {
    let scene = scene(RendererConfig::default());
    // No frames rendered; dropping must not block or panic.
    drop(scene.renderer);
}
