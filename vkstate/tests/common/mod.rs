#![allow(dead_code)]
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};
use vkstate::{
    vk::{self, Handle},
    BarrierBatches, CaptureState, ImageInfo, ImageTransitionInfo, ImageType, RecordingDiagnostics, TrackerConfig,
};

static INIT_LOGGING: Once = Once::new();

pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .compact()
            .init();
    });
}

pub fn image_handle(raw: u64) -> vk::Image {
    vk::Image::from_raw(raw)
}

pub fn memory_handle(raw: u64) -> vk::DeviceMemory {
    vk::DeviceMemory::from_raw(raw)
}

pub fn buffer_handle(raw: u64) -> vk::Buffer {
    vk::Buffer::from_raw(raw)
}

pub fn color_image(level_count: u32, layer_count: u32) -> ImageInfo {
    ImageInfo::new(
        ImageType::Image2D,
        vk::Format::R8G8B8A8_UNORM,
        vk::Extent3D {
            width: 256,
            height: 256,
            depth: 1,
        },
        level_count,
        layer_count,
        vk::SharingMode::EXCLUSIVE,
    )
}

pub fn depth_stencil_image(level_count: u32) -> ImageInfo {
    ImageInfo::new(
        ImageType::Image2D,
        vk::Format::D24_UNORM_S8_UINT,
        vk::Extent3D {
            width: 128,
            height: 128,
            depth: 1,
        },
        level_count,
        1,
        vk::SharingMode::EXCLUSIVE,
    )
}

pub fn volume_image(depth: u32) -> ImageInfo {
    ImageInfo::new(
        ImageType::Image3D,
        vk::Format::R16G16B16A16_SFLOAT,
        vk::Extent3D {
            width: 32,
            height: 32,
            depth,
        },
        1,
        1,
        vk::SharingMode::EXCLUSIVE,
    )
}

pub fn transition_info(diagnostics: &RecordingDiagnostics) -> ImageTransitionInfo<'_> {
    ImageTransitionInfo {
        capture_state: CaptureState::ActiveCapturing,
        default_queue_family_index: 0,
        separate_depth_stencil_layouts: false,
        batches: BarrierBatches::default(),
        diagnostics,
    }
}

pub fn config() -> TrackerConfig {
    TrackerConfig {
        queue_family_count: 3,
        ..Default::default()
    }
}
