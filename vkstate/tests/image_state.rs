mod common;

use common::{color_image, depth_stencil_image, image_handle, init_logging, transition_info, volume_image};
use vkstate::{
    compose_frame_refs, vk, BarrierBatches, FrameRefType, ImageBarrier, ImageBarrierSequence, ImageInfo, ImageState,
    ImageSubresourceRange, ImageSubresourceState, ImageType, NoWrapping, RecordingDiagnostics, ResetRequirement,
    Severity, SplitFlags, BATCH_ACQUIRE, BATCH_CLOSE_TRANSFERS, BATCH_MAIN, BATCH_RESTORE_TRANSFERS,
};

const COLOR: vk::ImageAspectFlags = vk::ImageAspectFlags::COLOR;
const DEPTH: vk::ImageAspectFlags = vk::ImageAspectFlags::DEPTH;
const STENCIL: vk::ImageAspectFlags = vk::ImageAspectFlags::STENCIL;

fn all(aspect: vk::ImageAspectFlags) -> ImageSubresourceRange {
    ImageSubresourceRange::whole(aspect)
}

/// Image owned by queue family `queue` in `layout`, at the beginning of a capture.
fn owned_image(info: ImageInfo, queue: u32, layout: vk::ImageLayout) -> ImageState {
    let mut state = ImageState::new(image_handle(1), info, vk::ImageLayout::UNDEFINED);
    state.access(
        &info.full_range(),
        &ImageSubresourceState::new(queue, layout, FrameRefType::None),
        compose_frame_refs,
    );
    state.begin_capture();
    state
}

fn use_in(state: &mut ImageState, range: ImageSubresourceRange, queue: u32, layout: vk::ImageLayout) {
    state.access(
        &range,
        &ImageSubresourceState::new(queue, layout, FrameRefType::None),
        compose_frame_refs,
    );
}

fn ownership_barrier(src: u32, dst: u32, range: ImageSubresourceRange) -> ImageBarrier {
    ImageBarrier {
        image: image_handle(1),
        src_access_mask: vk::AccessFlags::SHADER_WRITE,
        dst_access_mask: vk::AccessFlags::SHADER_READ,
        old_layout: vk::ImageLayout::GENERAL,
        new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        src_queue_family_index: src,
        dst_queue_family_index: dst,
        subresource_range: range,
    }
}

fn drain(seq: &mut ImageBarrierSequence, batch: usize, queue: u32) -> Vec<vk::ImageMemoryBarrier> {
    let mut out = vec![];
    seq.extract_unwrapped_batch(batch, queue, &NoWrapping, &mut out);
    out
}

#[test]
fn transition_to_same_state_emits_nothing() {
    init_logging();
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = ImageState::new(image_handle(1), color_image(4, 1), vk::ImageLayout::UNDEFINED);
    state.access(
        &all(COLOR).levels(0, 2),
        &ImageSubresourceState::new(0, vk::ImageLayout::GENERAL, FrameRefType::PartialWrite),
        compose_frame_refs,
    );
    let target = state.clone();

    let mut seq = ImageBarrierSequence::new();
    state.transition(
        &target,
        vk::AccessFlags::MEMORY_WRITE,
        vk::AccessFlags::MEMORY_READ,
        &mut seq,
        &info,
    );
    assert!(seq.is_empty());
    assert!(!diag.has_problems());
}

#[test]
fn reset_to_undefined_emits_nothing() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = ImageState::new(image_handle(1), color_image(1, 1), vk::ImageLayout::UNDEFINED);
    state.begin_capture();
    use_in(&mut state, all(COLOR), 0, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let mut seq = ImageBarrierSequence::new();
    state.reset_to_old_state(vk::AccessFlags::empty(), vk::AccessFlags::empty(), &mut seq, &info);
    assert!(seq.is_empty());
}

#[test]
fn reset_to_old_state_restores_layouts() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(4, 1), 0, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    use_in(&mut state, all(COLOR).levels(0, 1), 0, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(state.subresource_states().split_flags(), SplitFlags::LEVELS);

    let mut seq = ImageBarrierSequence::with_queue_family_count(1);
    state.reset_to_old_state(
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    assert_eq!(seq.len(), 1);

    let mut out = vec![];
    assert_eq!(
        seq.extract_first_unwrapped_batch_for_queue(0, &NoWrapping, &mut out),
        Some(BATCH_MAIN)
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(out[0].new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(out[0].src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    assert_eq!(out[0].subresource_range.base_mip_level, 0);
    assert_eq!(out[0].subresource_range.level_count, 1);
    assert!(seq.is_empty());

    for level in 0..4 {
        assert_eq!(
            state.layout(COLOR, level, 0, 0),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }
}

#[test]
fn matching_release_and_acquire() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);

    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 0, &info);
    assert_eq!(state.new_queue_family_transfers().len(), 1);
    // not applied until acquired
    assert_eq!(state.layout(COLOR, 0, 0, 0), vk::ImageLayout::GENERAL);

    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 1, &info);
    assert!(state.new_queue_family_transfers().is_empty());
    assert!(state.old_queue_family_transfers().is_empty());
    assert_eq!(state.layout(COLOR, 0, 0, 0), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    let s = state.subresource_states().subresource_value(COLOR, 0, 0, 0);
    assert_eq!(s.new_queue_family_index, 1);
    assert_eq!(s.old_queue_family_index, 0);
    assert!(!diag.has_problems());
}

#[test]
fn unmatched_acquire_is_an_old_transfer() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);

    let mut cb_state = state.command_buffer_initial_state();
    cb_state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 1, &info);
    assert_eq!(cb_state.old_queue_family_transfers().len(), 1);
    assert_eq!(cb_state.layout(COLOR, 0, 0, 0), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(diag.count(Severity::Debug), 1);
    assert!(!diag.has_problems());
}

#[test]
fn merge_matches_acquire_with_pending_release() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 0, &info);

    let mut cb_state = state.command_buffer_initial_state();
    cb_state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 1, &info);
    cb_state.access(
        &all(COLOR),
        &ImageSubresourceState::new(1, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, FrameRefType::Read),
        compose_frame_refs,
    );

    let max_ref = state.merge(&cb_state, &info);
    assert_eq!(max_ref, FrameRefType::Read);
    assert!(state.new_queue_family_transfers().is_empty());
    assert!(state.old_queue_family_transfers().is_empty());
    let s = state.subresource_states().subresource_value(COLOR, 0, 0, 0);
    assert_eq!(s.old_layout, vk::ImageLayout::GENERAL);
    assert_eq!(s.new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(s.new_queue_family_index, 1);
    assert_eq!(state.max_ref_type(), FrameRefType::Read);
    assert!(!diag.has_problems());
}

#[test]
fn mismatched_acquire_warns() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(2, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(0, 1, all(COLOR).levels(0, 1)), 0, &info);
    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 1, &info);
    assert_eq!(diag.count(Severity::Warning), 1);
    assert!(state.new_queue_family_transfers().is_empty());
}

#[test]
fn second_release_replaces_first() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 0, &info);
    state.record_barrier(ownership_barrier(0, 2, all(COLOR)), 0, &info);
    assert_eq!(diag.count(Severity::Warning), 1);
    assert_eq!(state.new_queue_family_transfers().len(), 1);
    assert_eq!(state.new_queue_family_transfers()[0].dst_queue_family_index, 2);
}

#[test]
fn external_queue_families_are_ignored() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(vk::QUEUE_FAMILY_EXTERNAL, 0, all(COLOR)), 0, &info);
    assert_eq!(diag.count(Severity::Warning), 1);
    assert_eq!(state.layout(COLOR, 0, 0, 0), vk::ImageLayout::GENERAL);
}

#[test]
fn close_transfers_completes_pending_releases() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 0, &info);

    let mut seq = ImageBarrierSequence::new();
    state.close_transfers(BATCH_CLOSE_TRANSFERS, vk::AccessFlags::TRANSFER_READ, &mut seq, &info);
    assert!(state.new_queue_family_transfers().is_empty());
    assert_eq!(state.layout(COLOR, 0, 0, 0), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

    let barriers = drain(&mut seq, BATCH_CLOSE_TRANSFERS, 1);
    assert_eq!(barriers.len(), 1);
    // replaces the access mask of the recorded release
    assert_eq!(barriers[0].dst_access_mask, vk::AccessFlags::TRANSFER_READ);
}

#[test]
fn ownership_transfer_emits_release_and_acquire() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);

    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        1,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::SHADER_WRITE,
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    let release = drain(&mut seq, BATCH_MAIN, 0);
    let acquire = drain(&mut seq, BATCH_ACQUIRE, 1);
    assert_eq!(release.len(), 1);
    assert_eq!(acquire.len(), 1);
    assert_eq!(release[0].src_queue_family_index, 0);
    assert_eq!(release[0].dst_queue_family_index, 1);
    assert_eq!(release[0].dst_access_mask, vk::AccessFlags::empty());
    assert_eq!(acquire[0].src_access_mask, vk::AccessFlags::empty());
    assert!(seq.is_empty());

    let s = state.subresource_states().subresource_value(COLOR, 0, 0, 0);
    assert_eq!(s.new_queue_family_index, 1);
}

#[test]
fn transition_from_undefined_skips_ownership_transfer() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::UNDEFINED);

    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        1,
        vk::ImageLayout::GENERAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_WRITE,
        &mut seq,
        &info,
    );
    assert!(seq.is_batch_empty(BATCH_ACQUIRE, 1));
    let barriers = drain(&mut seq, BATCH_MAIN, 1);
    assert_eq!(barriers.len(), 1);
    assert_eq!(barriers[0].old_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(barriers[0].src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
}

#[test]
fn preinitialized_target_becomes_general() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::TRANSFER_DST_OPTIMAL);

    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        1,
        vk::ImageLayout::PREINITIALIZED,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::empty(),
        &mut seq,
        &info,
    );
    assert_eq!(diag.count(Severity::Warning), 1);
    assert_eq!(seq.len(), 1);
    let barriers = drain(&mut seq, BATCH_MAIN, 0);
    assert_eq!(barriers[0].new_layout, vk::ImageLayout::GENERAL);
    let s = state.subresource_states().subresource_value(COLOR, 0, 0, 0);
    assert_eq!(s.new_queue_family_index, 0);
}

#[test]
fn depth_and_stencil_are_coalesced() {
    let diag = RecordingDiagnostics::new();
    let mut state = owned_image(depth_stencil_image(1), 0, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    use_in(&mut state, all(DEPTH), 0, vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL);
    assert_eq!(state.subresource_states().split_flags(), SplitFlags::ASPECTS);
    let mut separate = state.clone();

    let info = transition_info(&diag);
    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        0,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    let barriers = drain(&mut seq, BATCH_MAIN, 0);
    assert_eq!(barriers.len(), 1);
    assert_eq!(barriers[0].subresource_range.aspect_mask, DEPTH | STENCIL);
    assert_eq!(state.layout(STENCIL, 0, 0, 0), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

    let info = vkstate::ImageTransitionInfo {
        separate_depth_stencil_layouts: true,
        ..transition_info(&diag)
    };
    let mut seq = ImageBarrierSequence::new();
    separate.transition_to(
        0,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    let barriers = drain(&mut seq, BATCH_MAIN, 0);
    assert_eq!(barriers.len(), 2);
    assert_eq!(barriers[0].subresource_range.aspect_mask, DEPTH);
    assert_eq!(barriers[1].subresource_range.aspect_mask, STENCIL);
}

#[test]
fn lone_stencil_transition_warns() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(depth_stencil_image(1), 0, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    use_in(&mut state, all(STENCIL), 0, vk::ImageLayout::GENERAL);

    let mut seq = ImageBarrierSequence::new();
    state.reset_to_old_state(vk::AccessFlags::empty(), vk::AccessFlags::empty(), &mut seq, &info);
    assert!(seq.is_empty());
    assert_eq!(diag.count(Severity::Warning), 1);
    assert_eq!(
        state.layout(STENCIL, 0, 0, 0),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    );
}

#[test]
fn ownership_transfer_in_requested_batches() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag).with_batches(BarrierBatches {
        close_transfers: 0,
        main: 0,
        acquire: 1,
        restore_transfers: 1,
    });
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    state.record_barrier(ownership_barrier(0, 2, all(COLOR)), 0, &info);

    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        1,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::SHADER_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        &mut seq,
        &info,
    );
    assert!(seq.batch(BATCH_MAIN, 2).is_empty());
    assert!(seq.batch(BATCH_ACQUIRE, 1).is_empty());

    // the pending release to queue family 2 is completed first, then released to queue family 1
    let on_2 = drain(&mut seq, 0, 2);
    assert_eq!(on_2.len(), 2);
    assert_eq!(on_2[0].src_queue_family_index, 0);
    assert_eq!(on_2[0].dst_queue_family_index, 2);
    assert_eq!(on_2[1].src_queue_family_index, 2);
    assert_eq!(on_2[1].dst_queue_family_index, 1);
    assert_eq!(on_2[1].dst_access_mask, vk::AccessFlags::empty());

    let acquire = drain(&mut seq, 1, 1);
    assert_eq!(acquire.len(), 1);
    assert_eq!(acquire[0].src_queue_family_index, 2);
    assert_eq!(acquire[0].new_layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
    assert!(seq.is_empty());
    assert!(!diag.has_problems());
}

#[test]
fn volume_images_only_transition_slice_zero() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(volume_image(4), 0, vk::ImageLayout::GENERAL);
    use_in(&mut state, all(COLOR).slices(2, 1), 0, vk::ImageLayout::TRANSFER_DST_OPTIMAL);

    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        0,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    assert_eq!(seq.len(), 1);
    for slice in 0..4 {
        assert_eq!(
            state.layout(COLOR, 0, 0, slice),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }
}

#[test]
fn concurrent_images_use_default_queue() {
    let diag = RecordingDiagnostics::new();
    let image_info = ImageInfo::new(
        ImageType::Image2D,
        vk::Format::R8G8B8A8_UNORM,
        vk::Extent3D {
            width: 4,
            height: 4,
            depth: 1,
        },
        1,
        1,
        vk::SharingMode::CONCURRENT,
    );
    let mut state = owned_image(image_info, vk::QUEUE_FAMILY_IGNORED, vk::ImageLayout::GENERAL);
    let mut no_default = state.clone();

    let info = vkstate::ImageTransitionInfo {
        default_queue_family_index: 2,
        ..transition_info(&diag)
    };
    let mut seq = ImageBarrierSequence::new();
    state.transition_to(
        1,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    let barriers = drain(&mut seq, BATCH_MAIN, 2);
    assert_eq!(barriers.len(), 1);
    assert_eq!(barriers[0].dst_queue_family_index, vk::QUEUE_FAMILY_IGNORED);

    let info = vkstate::ImageTransitionInfo {
        default_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        ..transition_info(&diag)
    };
    let mut seq = ImageBarrierSequence::new();
    no_default.transition_to(
        1,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    assert!(seq.is_empty());
    assert_eq!(diag.count(Severity::Error), 1);
}

#[test]
fn initial_state_reflects_capture_start() {
    let mut state = owned_image(color_image(3, 2), 0, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    use_in(&mut state, all(COLOR).levels(1, 1), 0, vk::ImageLayout::GENERAL);
    use_in(&mut state, all(COLOR).layers(1, 1), 0, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);

    let initial = state.initial_state();
    assert_eq!(initial.subresource_states().len(), 1);
    assert_eq!(
        initial.layout(COLOR, 1, 1, 0),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );

    // transitioning back to it undoes the frame
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut seq = ImageBarrierSequence::new();
    state.transition(
        &initial,
        vk::AccessFlags::empty(),
        vk::AccessFlags::SHADER_READ,
        &mut seq,
        &info,
    );
    assert!(!seq.is_empty());
    for level in 0..3 {
        for layer in 0..2 {
            assert_eq!(
                state.layout(COLOR, level, layer, 0),
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
            );
        }
    }
}

#[test]
fn reset_requirements_follow_references() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(2, 1), 0, vk::ImageLayout::GENERAL);
    let read = ImageSubresourceState::new(0, vk::ImageLayout::GENERAL, FrameRefType::Read);
    let write = ImageSubresourceState::new(0, vk::ImageLayout::GENERAL, FrameRefType::PartialWrite);

    state.access(&all(COLOR).levels(0, 1), &read, compose_frame_refs);
    assert_eq!(state.reset_requirement(&all(COLOR)), ResetRequirement::Init);
    state.access(&all(COLOR).levels(0, 1), &write, compose_frame_refs);
    assert_eq!(state.reset_requirement(&all(COLOR)), ResetRequirement::Reset);
    assert_eq!(state.max_ref_type(), FrameRefType::ReadBeforeWrite);

    // discarded contents are never observed
    state.discard_contents(&all(COLOR).levels(1, 1), &info);
    state.access(&all(COLOR).levels(1, 1), &read, compose_frame_refs);
    assert_eq!(
        state.reset_requirement(&all(COLOR).levels(1, 1)),
        ResetRequirement::NoReset
    );
}

#[test]
fn reset_to_old_state_restores_pending_transfers() {
    let diag = RecordingDiagnostics::new();
    let info = transition_info(&diag);
    let mut state = owned_image(color_image(1, 1), 0, vk::ImageLayout::GENERAL);
    // released before the capture began
    state.record_barrier(ownership_barrier(0, 1, all(COLOR)), 1, &info);
    assert_eq!(state.old_queue_family_transfers().len(), 1);

    let mut seq = ImageBarrierSequence::new();
    state.reset_to_old_state(
        vk::AccessFlags::SHADER_READ,
        vk::AccessFlags::SHADER_WRITE,
        &mut seq,
        &info,
    );
    assert_eq!(drain(&mut seq, BATCH_MAIN, 1).len(), 1);
    assert_eq!(drain(&mut seq, BATCH_ACQUIRE, 0).len(), 1);
    assert_eq!(drain(&mut seq, BATCH_RESTORE_TRANSFERS, 0).len(), 1);
    assert!(seq.is_empty());
    assert_eq!(state.new_queue_family_transfers().len(), 1);
    assert_eq!(state.layout(COLOR, 0, 0, 0), vk::ImageLayout::GENERAL);
    assert!(!diag.has_problems());
}
