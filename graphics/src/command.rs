//! Command streams and the frame recording protocol.
//!
//! A [`CommandRecorder`] builds one frame's command stream through a fixed
//! sequence of steps and refuses any step out of order:
//!
//! 1. [`reset`](CommandRecorder::reset) (gated on the previous stream's
//!    fence having retired),
//! 2. [`transition_for_render_target`](CommandRecorder::transition_for_render_target),
//! 3. [`bind_frame_targets`](CommandRecorder::bind_frame_targets) then
//!    [`clear`](CommandRecorder::clear),
//! 4. any number of [`draw_object`](CommandRecorder::draw_object) calls,
//! 5. [`transition_for_present`](CommandRecorder::transition_for_present),
//! 6. [`close`](CommandRecorder::close) and
//!    [`take_stream`](CommandRecorder::take_stream).

use crate::descriptor::DescriptorHeapId;
use crate::error::GraphicsError;
use crate::frame::FrameSlot;
use crate::object::SceneObject;
use crate::pipeline::{PipelineId, PrimitiveTopology, RootParam};
use crate::resource::ResourceId;
use crate::types::{ResourceState, ScissorRect, Viewport};

/// Named timer a timestamp pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSet {
    /// Whole-frame GPU time.
    Frame,
    /// Per-object GPU time; the index selects the object.
    Object,
}

/// Identifies one begin/end timestamp pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampQuery {
    pub set: TimerSet,
    pub index: u32,
}

impl TimestampQuery {
    pub const FRAME: Self = Self {
        set: TimerSet::Frame,
        index: 0,
    };

    pub fn object(index: u32) -> Self {
        Self {
            set: TimerSet::Object,
            index,
        }
    }
}

/// One entry of a recorded command stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transition {
        resource: ResourceId,
        before: ResourceState,
        after: ResourceState,
    },
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    SetDescriptorHeap(DescriptorHeapId),
    SetRootSignature,
    BindRenderTargets {
        color: ResourceId,
        depth: ResourceId,
    },
    ClearRenderTarget {
        target: ResourceId,
        color: [f32; 4],
    },
    ClearDepth {
        target: ResourceId,
        depth: f32,
    },
    SetPipelineState(PipelineId),
    SetPrimitiveTopology(PrimitiveTopology),
    SetRootShaderResource {
        param: RootParam,
        resource: ResourceId,
    },
    SetRootConstants {
        param: RootParam,
        values: Vec<u32>,
    },
    SetRootDescriptorTable {
        param: RootParam,
        heap: DescriptorHeapId,
    },
    CopyBufferToTexture {
        src: ResourceId,
        dst: ResourceId,
        row_pitch: u32,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
    BeginTimestamp(TimestampQuery),
    EndTimestamp(TimestampQuery),
}

/// Recording protocol stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Open,
    RenderTargetReady,
    TargetsBound,
    Cleared,
    PresentReady,
    Closed,
}

/// Builds one frame's command stream, enforcing the recording protocol.
#[derive(Debug)]
pub struct CommandRecorder {
    commands: Vec<Command>,
    stage: Stage,
    bound_color: Option<ResourceId>,
    bound_depth: Option<ResourceId>,
    /// Fence value of the last submitted stream; reset is refused until it
    /// has retired.
    pending_fence: Option<u64>,
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            stage: Stage::Idle,
            bound_color: None,
            bound_depth: None,
            pending_fence: None,
        }
    }

    fn require(&self, stage: Stage, step: &str) -> Result<(), GraphicsError> {
        if self.stage != stage {
            return Err(GraphicsError::InvalidRecorderState(format!(
                "{step} issued in stage {:?}",
                self.stage
            )));
        }
        Ok(())
    }

    /// Step 1: begin recording a new frame.
    ///
    /// `completed_value` is the fence's current completed value; if the
    /// previous stream has not retired, the allocator backing it may still
    /// be read by the device and reset is refused.
    pub fn reset(&mut self, completed_value: u64) -> Result<(), GraphicsError> {
        if self.stage != Stage::Idle && self.stage != Stage::Closed {
            return Err(GraphicsError::InvalidRecorderState(format!(
                "reset issued in stage {:?}",
                self.stage
            )));
        }
        if let Some(pending) = self.pending_fence {
            if completed_value < pending {
                return Err(GraphicsError::ResourceInFlight(format!(
                    "allocator of fence value {pending} not retired (completed {completed_value})"
                )));
            }
        }
        self.commands.clear();
        self.bound_color = None;
        self.bound_depth = None;
        self.stage = Stage::Open;
        Ok(())
    }

    /// Step 2: move the slot's back buffer from `Present` to
    /// `RenderTarget`.
    pub fn transition_for_render_target(
        &mut self,
        slot: &mut FrameSlot,
    ) -> Result<(), GraphicsError> {
        self.require(Stage::Open, "transition_for_render_target")?;
        let cmd = slot
            .render_target_mut()
            .transition(ResourceState::Present, ResourceState::RenderTarget)?;
        self.commands.push(cmd);
        self.stage = Stage::RenderTargetReady;
        Ok(())
    }

    /// Step 3a: bind the slot's targets, viewport, scissor, constant-buffer
    /// heap, and the root signature.
    pub fn bind_frame_targets(
        &mut self,
        slot: &FrameSlot,
        viewport: Viewport,
        scissor: ScissorRect,
    ) -> Result<(), GraphicsError> {
        self.require(Stage::RenderTargetReady, "bind_frame_targets")?;
        let color = slot.render_target().id();
        let depth = slot.depth_stencil().id();
        self.commands.push(Command::SetViewport(viewport));
        self.commands.push(Command::SetScissor(scissor));
        self.commands
            .push(Command::SetDescriptorHeap(slot.cbv_heap().id()));
        self.commands.push(Command::BindRenderTargets { color, depth });
        self.commands.push(Command::SetRootSignature);
        self.bound_color = Some(color);
        self.bound_depth = Some(depth);
        self.stage = Stage::TargetsBound;
        Ok(())
    }

    /// Step 3b: clear both bound targets.
    pub fn clear(&mut self, color: [f32; 4], depth: f32) -> Result<(), GraphicsError> {
        self.require(Stage::TargetsBound, "clear")?;
        // Targets were recorded by bind_frame_targets.
        let (target, depth_target) = match (self.bound_color, self.bound_depth) {
            (Some(c), Some(d)) => (c, d),
            _ => {
                return Err(GraphicsError::Internal(
                    "clear with no bound targets".to_string(),
                ))
            }
        };
        self.commands.push(Command::ClearRenderTarget { target, color });
        self.commands.push(Command::ClearDepth {
            target: depth_target,
            depth,
        });
        self.stage = Stage::Cleared;
        Ok(())
    }

    /// Step 4: record one object's draw.
    ///
    /// `active_texture` is the texture-set index to sample this frame.
    /// When `upload_textures` is set, the object's staged texel data is
    /// copied into its default-heap textures first; this happens on the
    /// first recorded frame only. The object's textures round-trip
    /// `CopyDest` -> `PixelShaderResource` -> `CopyDest` within the draw.
    pub fn draw_object(
        &mut self,
        object: &mut SceneObject,
        active_texture: u32,
        upload_textures: bool,
        timer_index: u32,
    ) -> Result<(), GraphicsError> {
        self.require(Stage::Cleared, "draw_object")?;

        let pipeline = object.pipeline().id();
        let positions = object.positions_buffer().id();
        let uvs = object.uv_buffer().id();
        let vertex_count = object.vertex_count();
        let wvp = object.wvp_bits();

        let set = object.texture_set_mut();
        if upload_textures {
            set.record_upload(&mut self.commands);
        }
        self.commands.push(Command::SetDescriptorHeap(set.heap().id()));
        self.commands.push(Command::SetPipelineState(pipeline));
        for cmd in set.transition_all(
            ResourceState::CopyDest,
            ResourceState::PixelShaderResource,
        )? {
            self.commands.push(cmd);
        }
        self.commands.push(Command::SetRootDescriptorTable {
            param: RootParam::TextureTable,
            heap: set.heap().id(),
        });
        self.commands
            .push(Command::SetPrimitiveTopology(PrimitiveTopology::TriangleList));
        self.commands.push(Command::SetRootShaderResource {
            param: RootParam::Positions,
            resource: positions,
        });
        self.commands.push(Command::SetRootShaderResource {
            param: RootParam::Uv,
            resource: uvs,
        });
        self.commands.push(Command::SetRootConstants {
            param: RootParam::Wvp,
            values: wvp.to_vec(),
        });
        self.commands.push(Command::SetRootConstants {
            param: RootParam::TextureIndex,
            values: vec![active_texture],
        });
        self.commands
            .push(Command::BeginTimestamp(TimestampQuery::object(timer_index)));
        self.commands.push(Command::Draw {
            vertex_count,
            instance_count: 1,
        });
        self.commands
            .push(Command::EndTimestamp(TimestampQuery::object(timer_index)));
        for cmd in object.texture_set_mut().transition_all(
            ResourceState::PixelShaderResource,
            ResourceState::CopyDest,
        )? {
            self.commands.push(cmd);
        }
        Ok(())
    }

    /// Step 5: move the back buffer from `RenderTarget` back to `Present`.
    ///
    /// Legal directly after [`clear`](Self::clear): a frame may draw zero
    /// objects.
    pub fn transition_for_present(&mut self, slot: &mut FrameSlot) -> Result<(), GraphicsError> {
        self.require(Stage::Cleared, "transition_for_present")?;
        let cmd = slot
            .render_target_mut()
            .transition(ResourceState::RenderTarget, ResourceState::Present)?;
        self.commands.push(cmd);
        self.stage = Stage::PresentReady;
        Ok(())
    }

    /// Step 6: finish recording.
    pub fn close(&mut self) -> Result<(), GraphicsError> {
        self.require(Stage::PresentReady, "close")?;
        self.stage = Stage::Closed;
        Ok(())
    }

    /// Take the closed stream for submission, leaving the recorder closed.
    pub fn take_stream(&mut self) -> Result<Vec<Command>, GraphicsError> {
        self.require(Stage::Closed, "take_stream")?;
        Ok(std::mem::take(&mut self.commands))
    }

    /// Record the fence value the taken stream was submitted under.
    pub fn mark_submitted(&mut self, fence_value: u64) {
        self.pending_fence = Some(fence_value);
    }

    /// Record a begin timestamp. Legal in any recording stage.
    pub fn begin_timestamp(&mut self, query: TimestampQuery) -> Result<(), GraphicsError> {
        self.require_recording("begin_timestamp")?;
        self.commands.push(Command::BeginTimestamp(query));
        Ok(())
    }

    /// Record an end timestamp. Legal in any recording stage.
    pub fn end_timestamp(&mut self, query: TimestampQuery) -> Result<(), GraphicsError> {
        self.require_recording("end_timestamp")?;
        self.commands.push(Command::EndTimestamp(query));
        Ok(())
    }

    fn require_recording(&self, step: &str) -> Result<(), GraphicsError> {
        match self.stage {
            Stage::Idle | Stage::Closed => Err(GraphicsError::InvalidRecorderState(format!(
                "{step} issued in stage {:?}",
                self.stage
            ))),
            _ => Ok(()),
        }
    }

    /// Commands recorded so far. Test hook.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_out_of_order_are_refused() {
        let mut recorder = CommandRecorder::new();

        // Clear before reset.
        assert!(matches!(
            recorder.clear([0.0; 4], 1.0),
            Err(GraphicsError::InvalidRecorderState(_))
        ));

        recorder.reset(0).unwrap();
        // Close straight after reset skips the whole middle of the protocol.
        assert!(matches!(
            recorder.close(),
            Err(GraphicsError::InvalidRecorderState(_))
        ));
        // Double reset.
        assert!(matches!(
            recorder.reset(0),
            Err(GraphicsError::InvalidRecorderState(_))
        ));
    }

    #[test]
    fn reset_is_gated_on_the_pending_fence() {
        let mut recorder = CommandRecorder::new();
        recorder.reset(0).unwrap();
        recorder.stage = Stage::Closed;
        recorder.mark_submitted(3);

        assert!(matches!(
            recorder.reset(2),
            Err(GraphicsError::ResourceInFlight(_))
        ));
        recorder.reset(3).unwrap();
    }

    #[test]
    fn timestamps_are_refused_outside_recording() {
        let mut recorder = CommandRecorder::new();
        assert!(recorder.begin_timestamp(TimestampQuery::FRAME).is_err());
        recorder.reset(0).unwrap();
        assert!(recorder.begin_timestamp(TimestampQuery::FRAME).is_ok());
    }
}
