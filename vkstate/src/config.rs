use crate::{compose_frame_refs, keep_old_frame_ref, vk, BarrierBatches, DiagnosticSink, FrameRefCompose};

/// Whether a frame is currently being captured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Commands are observed, but no frame is being captured: reference types aren't tracked.
    Background,
    /// A frame is being captured.
    #[default]
    ActiveCapturing,
}

impl CaptureState {
    pub fn is_capturing(self) -> bool {
        self == CaptureState::ActiveCapturing
    }
}

/// Tracker configuration.
#[derive(Copy, Clone, Debug)]
pub struct TrackerConfig {
    /// Queue family that receives barriers that don't name a queue family, in exclusive sharing mode.
    ///
    /// `vk::QUEUE_FAMILY_IGNORED` means that there is no default: such barriers are dropped.
    pub default_queue_family_index: u32,
    /// Whether depth and stencil aspects of depth/stencil images can be transitioned separately
    /// (`VK_KHR_separate_depth_stencil_layouts`).
    pub separate_depth_stencil_layouts: bool,
    /// Number of queue families of the device.
    pub queue_family_count: u32,
    pub capture_state: CaptureState,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            default_queue_family_index: 0,
            separate_depth_stencil_layouts: false,
            queue_family_count: 1,
            capture_state: CaptureState::ActiveCapturing,
        }
    }
}

/// Parameters shared by all state transitions of an operation.
#[derive(Copy, Clone)]
pub struct ImageTransitionInfo<'a> {
    pub capture_state: CaptureState,
    pub default_queue_family_index: u32,
    pub separate_depth_stencil_layouts: bool,
    /// Where transitions put their barriers.
    pub batches: BarrierBatches,
    pub diagnostics: &'a dyn DiagnosticSink,
}

impl<'a> ImageTransitionInfo<'a> {
    pub fn new(config: &TrackerConfig, diagnostics: &'a dyn DiagnosticSink) -> ImageTransitionInfo<'a> {
        ImageTransitionInfo {
            capture_state: config.capture_state,
            default_queue_family_index: config.default_queue_family_index,
            separate_depth_stencil_layouts: config.separate_depth_stencil_layouts,
            batches: BarrierBatches::default(),
            diagnostics,
        }
    }

    /// Same parameters, with barriers going to `batches`.
    pub fn with_batches(self, batches: BarrierBatches) -> ImageTransitionInfo<'a> {
        ImageTransitionInfo { batches, ..self }
    }

    /// How new references combine with existing ones.
    pub fn frame_ref_compose(&self) -> FrameRefCompose {
        if self.capture_state.is_capturing() {
            compose_frame_refs
        } else {
            keep_old_frame_ref
        }
    }

    pub fn has_default_queue_family(&self) -> bool {
        self.default_queue_family_index != vk::QUEUE_FAMILY_IGNORED
    }
}
