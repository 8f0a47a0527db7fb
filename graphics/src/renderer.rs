//! The renderer: frame driver over the recorder, frame slots, and fence.
//!
//! Each frame runs the fixed sequence: write the slot's constants, record
//! the protocol steps, submit, present, then block until the fence
//! retires. No frame overlaps another; the wait is the last step of every
//! frame.

use std::sync::Arc;

use glimt_core::math;
use glimt_core::{Camera, FrameClock};

use crate::backend::Backend;
use crate::benchmark::{GpuBenchmark, DEFAULT_SAMPLE_TARGET};
use crate::command::{CommandRecorder, TimestampQuery};
use crate::error::GraphicsError;
use crate::frame::{FrameSet, SWAP_BUFFER_COUNT};
use crate::object::{ObjectDesc, SceneObject};
use crate::pipeline::ShaderSet;
use crate::surface::PresentSurface;
use crate::sync::SyncGate;
use crate::types::{ScissorRect, Viewport};

/// Tunable renderer parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Clear color of every frame, RGBA.
    pub clear_color: [f32; 4],
    /// Texture animation rate.
    pub animation_hz: u32,
    /// GPU benchmark sample count.
    pub benchmark_samples: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            animation_hz: 60,
            benchmark_samples: DEFAULT_SAMPLE_TARGET,
        }
    }
}

/// Frame driver owning the scene and all per-frame machinery.
pub struct Renderer {
    backend: Arc<dyn Backend>,
    surface: Box<dyn PresentSurface>,
    gate: SyncGate,
    recorder: CommandRecorder,
    frames: FrameSet,
    objects: Vec<SceneObject>,
    camera: Camera,
    clock: FrameClock,
    shaders: ShaderSet,
    config: RendererConfig,
    viewport: Viewport,
    scissor: ScissorRect,
    benchmark: GpuBenchmark,
    /// Texture uploads are recorded into the first frame only.
    first_frame: bool,
    frame_count: u64,
}

impl Renderer {
    pub fn new(
        backend: Arc<dyn Backend>,
        surface: Box<dyn PresentSurface>,
        shaders: ShaderSet,
        config: RendererConfig,
    ) -> Result<Self, GraphicsError> {
        if surface.image_count() as usize != SWAP_BUFFER_COUNT {
            return Err(GraphicsError::InvalidParameter(format!(
                "surface has {} images, renderer needs {SWAP_BUFFER_COUNT}",
                surface.image_count()
            )));
        }
        if config.animation_hz == 0 {
            return Err(GraphicsError::InvalidParameter(
                "animation rate of 0 Hz".to_string(),
            ));
        }
        let width = surface.width();
        let height = surface.height();
        // Frame constants are one 4x4 matrix.
        let frames = FrameSet::new(&backend, width, height, 16 * 4)?;
        let benchmark = GpuBenchmark::new(config.benchmark_samples);
        log::info!(
            "renderer on '{}' backend, {width}x{height}, {SWAP_BUFFER_COUNT} frames in flight",
            backend.name()
        );
        Ok(Self {
            gate: SyncGate::new(backend.clone()),
            backend,
            surface,
            recorder: CommandRecorder::new(),
            frames,
            objects: Vec::new(),
            camera: Camera::new(width, height),
            clock: FrameClock::new(),
            shaders,
            config,
            viewport: Viewport::new(width as f32, height as f32),
            scissor: ScissorRect::new(width as i32, height as i32),
            benchmark,
            first_frame: true,
            frame_count: 0,
        })
    }

    /// Load an object from disk and add it to the scene.
    pub fn create_object(&mut self, desc: &ObjectDesc) -> Result<(), GraphicsError> {
        let object = SceneObject::load(&self.backend, desc, &self.shaders)?;
        log::info!(
            "loaded '{}': {} vertices, {} textures",
            object.label(),
            object.vertex_count(),
            object.texture_set().len()
        );
        self.objects.push(object);
        Ok(())
    }

    /// Add an already-built object to the scene.
    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Recompute every object's WVP from the current camera.
    pub fn update_scene(&mut self) -> Result<(), GraphicsError> {
        let view_projection = self.camera.view_projection();
        for object in &mut self.objects {
            object.update_transform(&view_projection)?;
        }
        Ok(())
    }

    /// Run one complete frame: update, record, submit, present, wait.
    ///
    /// A rejected submission skips presentation and is returned; the
    /// caller decides whether to keep looping.
    pub fn frame(&mut self) -> Result<(), GraphicsError> {
        self.clock.begin_frame();
        self.update_scene()?;
        let result = self.render_frame();
        self.clock.end_frame();
        result
    }

    fn render_frame(&mut self) -> Result<(), GraphicsError> {
        let index = self.surface.current_index();
        let completed = self.gate.completed_value();
        let ticked = self
            .clock
            .consume_animation_tick(1000.0 / self.config.animation_hz as f64);

        let frame_constants =
            math::to_row_major_array(&self.camera.view_projection().transpose());

        let slot = self.frames.slot_mut(index)?;
        slot.write_constants(completed, bytemuck::cast_slice(&frame_constants))?;

        self.recorder.reset(completed)?;
        self.recorder.begin_timestamp(TimestampQuery::FRAME)?;
        self.recorder.transition_for_render_target(slot)?;
        self.recorder
            .bind_frame_targets(slot, self.viewport, self.scissor)?;
        self.recorder.clear(self.config.clear_color, 1.0)?;

        let upload = self.first_frame;
        for (i, object) in self.objects.iter_mut().enumerate() {
            let active = object.texture_set_mut().select_active(ticked);
            self.recorder.draw_object(object, active, upload, i as u32)?;
        }

        self.recorder.transition_for_present(slot)?;
        self.recorder.end_timestamp(TimestampQuery::FRAME)?;
        self.recorder.close()?;

        let stream = self.recorder.take_stream()?;
        let value = match self.gate.submit(&stream) {
            Ok(value) => value,
            Err(err) => {
                log::error!(
                    "frame {}: submission rejected, skipping present: {err}",
                    self.frame_count
                );
                return Err(err);
            }
        };
        slot.set_last_fence(value);
        self.recorder.mark_submitted(value);
        self.first_frame = false;
        self.frame_count += 1;

        self.surface.present()?;
        self.gate.wait_for_retirement(value);
        self.benchmark.collect(self.backend.as_ref(), self.objects.len());
        Ok(())
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[inline]
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Latest FPS string; empty until a full second has been rendered.
    pub fn fps_string(&self) -> &str {
        self.clock.fps_string()
    }

    pub fn benchmark_complete(&self) -> bool {
        self.benchmark.is_complete()
    }

    pub fn frame_benchmark_report(&self) -> String {
        self.benchmark.frame_report()
    }

    pub fn object_benchmark_report(&self) -> String {
        self.benchmark.object_report()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Resources drop right after this; nothing may still be in flight.
        self.gate.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::ShaderBytecode;
    use crate::surface::HeadlessSurface;

    fn shaders() -> ShaderSet {
        ShaderSet {
            vertex: ShaderBytecode::new(vec![0xAA], "vs_main"),
            pixel: ShaderBytecode::new(vec![0xBB], "ps_main"),
        }
    }

    fn renderer() -> Renderer {
        let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::new());
        Renderer::new(
            backend,
            Box::new(HeadlessSurface::new(64, 64)),
            shaders(),
            RendererConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn empty_scene_renders_and_presents() {
        let mut renderer = renderer();
        for _ in 0..4 {
            renderer.frame().unwrap();
        }
        assert_eq!(renderer.frame_count(), 4);
    }

    #[test]
    fn zero_animation_rate_is_refused() {
        let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::new());
        let config = RendererConfig {
            animation_hz: 0,
            ..RendererConfig::default()
        };
        assert!(Renderer::new(
            backend,
            Box::new(HeadlessSurface::new(8, 8)),
            shaders(),
            config,
        )
        .is_err());
    }

    #[test]
    fn fps_string_is_empty_before_the_first_second() {
        let renderer = renderer();
        assert_eq!(renderer.fps_string(), "");
    }
}
