//! Tracks a small frame and prints the barriers that restore the pre-frame state on replay.
use tracing_subscriber::{fmt, EnvFilter};
use vkstate::{
    vk::{self, Handle},
    AccessAction, BarrierBatches, Error, FrameRefType, ImageInfo, ImageSubresourceRange, ImageType, NoWrapping, ResourceTracker,
    TrackerConfig,
};

fn main() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut tracker = ResourceTracker::new(TrackerConfig {
        queue_family_count: 2,
        ..Default::default()
    });

    let texture = vk::Image::from_raw(0x10);
    let memory = vk::DeviceMemory::from_raw(0x20);
    let uniforms = vk::Buffer::from_raw(0x30);
    let info = ImageInfo::new(
        ImageType::Image2D,
        vk::Format::R8G8B8A8_SRGB,
        vk::Extent3D {
            width: 512,
            height: 512,
            depth: 1,
        },
        10,
        1,
        vk::SharingMode::EXCLUSIVE,
    );

    tracker.register_allocation(memory, 1 << 24)?;
    tracker.register_image(texture, info, vk::ImageLayout::UNDEFINED)?;
    tracker.bind_image(texture, memory, 0, 1 << 22)?;
    tracker.bind_buffer(uniforms, memory, 1 << 22, 256, vk::SharingMode::EXCLUSIVE)?;

    // before the capture: the texture is uploaded and sampled
    tracker.access_image(
        texture,
        &ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR),
        0,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        FrameRefType::None,
    )?;

    tracker.begin_capture();

    // the frame regenerates mip levels 1..: each level is written as a transfer destination
    for level in 1..info.level_count {
        let range = ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR).levels(level, 1);
        tracker.access_image(
            texture,
            &range,
            0,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            FrameRefType::CompleteWrite,
        )?;
    }
    tracker.access_buffer(uniforms, 0, AccessAction::Read, 0, vk::WHOLE_SIZE)?;
    tracker.access_buffer(uniforms, 0, AccessAction::Write, 0, 64)?;

    tracker.finalize_allocations();
    if let Some(allocation) = tracker.allocation(memory) {
        for index in allocation.order_by_reset_requirement() {
            let resource = &allocation.bound_resources()[index];
            println!("{:?}: {:?}", resource.handle, resource.reset);
        }
    }

    let mut seq = tracker.reset_images_to_old_state(
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::SHADER_READ,
        BarrierBatches::default(),
    );
    let mut barriers = vec![];
    while let Some(batch) = seq.extract_first_unwrapped_batch_for_queue(0, &NoWrapping, &mut barriers) {
        println!("batch {batch}:");
        for b in barriers.drain(..) {
            println!(
                "    levels {}..{}: {:?} -> {:?}",
                b.subresource_range.base_mip_level,
                b.subresource_range.base_mip_level + b.subresource_range.level_count,
                b.old_layout,
                b.new_layout
            );
        }
    }
    Ok(())
}
