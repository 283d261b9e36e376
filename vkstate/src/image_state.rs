//! Per-image state: subresource layouts and queue family ownership, and the barriers needed to
//! move between states.
use crate::{
    compose_frame_refs_disjoint, is_external_queue_family, vk, DiagnosticContext, FrameRefCompose, FrameRefType,
    ImageBarrier, ImageBarrierSequence, ImageInfo, ImageSubresourceRange, ImageTransitionInfo, ImageType,
    ResetRequirement, SubresourceMap, UNKNOWN_PREV_IMG_LAYOUT,
};
use std::mem;

/// State of one subresource: at the beginning (`old_*`) and at the end (`new_*`) of the tracked
/// interval.
///
/// `UNKNOWN_PREV_IMG_LAYOUT` and `vk::QUEUE_FAMILY_IGNORED` mean "not observed".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSubresourceState {
    pub old_queue_family_index: u32,
    pub new_queue_family_index: u32,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub ref_type: FrameRefType,
}

impl Default for ImageSubresourceState {
    fn default() -> Self {
        ImageSubresourceState {
            old_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            new_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            old_layout: UNKNOWN_PREV_IMG_LAYOUT,
            new_layout: UNKNOWN_PREV_IMG_LAYOUT,
            ref_type: FrameRefType::None,
        }
    }
}

impl ImageSubresourceState {
    /// A state that doesn't change over the interval.
    pub fn new(queue_family_index: u32, layout: vk::ImageLayout, ref_type: FrameRefType) -> ImageSubresourceState {
        ImageSubresourceState {
            old_queue_family_index: queue_family_index,
            new_queue_family_index: queue_family_index,
            old_layout: layout,
            new_layout: layout,
            ref_type,
        }
    }

    /// The state resulting from `self` followed by `other`.
    ///
    /// Old fields keep the first observed value, new fields take the last observed value.
    pub fn updated(&self, other: &ImageSubresourceState, compose: FrameRefCompose) -> ImageSubresourceState {
        let first = |a: u32, b: u32| if a == vk::QUEUE_FAMILY_IGNORED { b } else { a };
        let first_layout = |a: vk::ImageLayout, b: vk::ImageLayout| if a == UNKNOWN_PREV_IMG_LAYOUT { b } else { a };
        ImageSubresourceState {
            old_queue_family_index: first(self.old_queue_family_index, other.old_queue_family_index),
            new_queue_family_index: first(other.new_queue_family_index, self.new_queue_family_index),
            old_layout: first_layout(self.old_layout, other.old_layout),
            new_layout: first_layout(other.new_layout, self.new_layout),
            ref_type: compose(self.ref_type, other.ref_type),
        }
    }

    /// Updates `self` in place. Returns whether the state changed.
    pub fn update(&mut self, other: &ImageSubresourceState, compose: FrameRefCompose) -> bool {
        let new = self.updated(other, compose);
        let changed = new != *self;
        *self = new;
        changed
    }
}

pub type ImageSubresourceMap = SubresourceMap<ImageSubresourceState>;

/// A transition computed for a group of subresources.
struct PlannedTransition {
    range: ImageSubresourceRange,
    barrier: Option<ImageBarrier>,
    /// Queue family on which the barrier is submitted (the releasing one for ownership transfers).
    submit_queue_family_index: u32,
    state: ImageSubresourceState,
    /// Stencil transition left to the barrier of the depth aspect.
    coalesced: bool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Tracked state of an image.
#[derive(Clone, Debug)]
pub struct ImageState {
    handle: vk::Image,
    /// Acquires observed without a matching release: the releases happened before the interval.
    old_queue_family_transfers: Vec<ImageBarrier>,
    /// Releases not matched by an acquire yet.
    new_queue_family_transfers: Vec<ImageBarrier>,
    max_ref_type: FrameRefType,
    subresource_states: ImageSubresourceMap,
    is_memory_bound: bool,
}

impl ImageState {
    /// State of a newly created image, in `initial_layout` and not owned by any queue family.
    pub fn new(handle: vk::Image, info: ImageInfo, initial_layout: vk::ImageLayout) -> ImageState {
        ImageState::with_state(
            handle,
            info,
            ImageSubresourceState::new(vk::QUEUE_FAMILY_IGNORED, initial_layout, FrameRefType::None),
        )
    }

    fn with_state(handle: vk::Image, info: ImageInfo, state: ImageSubresourceState) -> ImageState {
        ImageState {
            handle,
            old_queue_family_transfers: vec![],
            new_queue_family_transfers: vec![],
            max_ref_type: FrameRefType::None,
            subresource_states: SubresourceMap::new(info, state),
            is_memory_bound: false,
        }
    }

    /// Empty state used to track the effect of a command buffer: nothing is known about the image.
    pub fn command_buffer_initial_state(&self) -> ImageState {
        ImageState::with_state(self.handle, *self.info(), ImageSubresourceState::default())
    }

    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    pub fn info(&self) -> &ImageInfo {
        self.subresource_states.info()
    }

    pub fn subresource_states(&self) -> &ImageSubresourceMap {
        &self.subresource_states
    }

    pub fn old_queue_family_transfers(&self) -> &[ImageBarrier] {
        &self.old_queue_family_transfers
    }

    pub fn new_queue_family_transfers(&self) -> &[ImageBarrier] {
        &self.new_queue_family_transfers
    }

    pub fn max_ref_type(&self) -> FrameRefType {
        self.max_ref_type
    }

    pub fn is_memory_bound(&self) -> bool {
        self.is_memory_bound
    }

    pub fn set_memory_bound(&mut self, bound: bool) {
        self.is_memory_bound = bound;
    }

    fn context(&self) -> DiagnosticContext {
        DiagnosticContext::Image(self.handle)
    }

    /// Current layout of a subresource.
    pub fn layout(&self, aspect: vk::ImageAspectFlags, level: u32, layer: u32, slice: u32) -> vk::ImageLayout {
        self.subresource_states
            .subresource_value(aspect, level, layer, slice)
            .new_layout
    }

    /// The state the image was in at the beginning of the interval.
    ///
    /// Releases that were pending then are pending in the returned state.
    pub fn initial_state(&self) -> ImageState {
        let mut result = ImageState {
            handle: self.handle,
            old_queue_family_transfers: vec![],
            new_queue_family_transfers: self.old_queue_family_transfers.clone(),
            max_ref_type: FrameRefType::None,
            subresource_states: self.subresource_states.clone(),
            is_memory_bound: self.is_memory_bound,
        };
        result.subresource_states.for_each_in_range_mut(&self.info().full_range(), |_, s| {
            s.new_layout = s.old_layout;
            s.new_queue_family_index = s.old_queue_family_index;
            s.ref_type = FrameRefType::None;
        });
        result.subresource_states.unsplit();
        result
    }

    /// Starts a new tracked interval from the current state.
    pub fn begin_capture(&mut self) {
        self.max_ref_type = FrameRefType::None;
        // matching acquires seen during the frame end up in `old_queue_family_transfers`
        self.new_queue_family_transfers.clear();
        self.old_queue_family_transfers.clear();
        let full = self.info().full_range();
        self.subresource_states.for_each_in_range_mut(&full, |_, s| {
            s.old_layout = s.new_layout;
            s.old_queue_family_index = s.new_queue_family_index;
            s.ref_type = FrameRefType::None;
        });
        self.subresource_states.unsplit();
    }

    /// Records an access to `range`. Returns the most demanding resulting reference in the range.
    pub fn access(
        &mut self,
        range: &ImageSubresourceRange,
        dst: &ImageSubresourceState,
        compose: FrameRefCompose,
    ) -> FrameRefType {
        self.subresource_states.update_range(range, |s| s.updated(dst, compose));
        let max_ref = self
            .subresource_states
            .range_iter(range)
            .fold(FrameRefType::None, |r, (_, s)| compose_frame_refs_disjoint(r, s.ref_type));
        self.max_ref_type = compose_frame_refs_disjoint(self.max_ref_type, max_ref);
        max_ref
    }

    /// Applies the effect of `other` (typically the state of a command buffer) after the current state.
    ///
    /// Returns the most demanding resulting reference over the subresources touched by `other`.
    pub fn merge(&mut self, other: &ImageState, info: &ImageTransitionInfo) -> FrameRefType {
        debug_assert_eq!(self.info(), other.info());
        for barrier in other.old_queue_family_transfers.iter() {
            self.record_queue_family_acquire(*barrier, info);
        }
        let compose = info.frame_ref_compose();
        let mut max_ref = FrameRefType::None;
        for (range, state) in other.subresource_states.iter() {
            if *state == ImageSubresourceState::default() {
                continue;
            }
            max_ref = compose_frame_refs_disjoint(max_ref, self.access(&range, state, compose));
        }
        for barrier in other.new_queue_family_transfers.iter() {
            self.record_queue_family_release(*barrier, info);
        }
        max_ref
    }

    /// Marks the contents of `range` as discarded.
    pub fn discard_contents(&mut self, range: &ImageSubresourceRange, info: &ImageTransitionInfo) {
        let state = ImageSubresourceState {
            new_layout: vk::ImageLayout::UNDEFINED,
            ref_type: FrameRefType::CompleteWrite,
            ..Default::default()
        };
        self.access(range, &state, info.frame_ref_compose());
    }

    /// Most demanding reset requirement of the subresources in `range`.
    pub fn reset_requirement(&self, range: &ImageSubresourceRange) -> ResetRequirement {
        self.subresource_states
            .range_iter(range)
            .fold(ResetRequirement::NoReset, |r, (_, s)| r.combine(s.ref_type.reset_requirement()))
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Queue family ownership transfers

    /// Records a release. The subresource states are left untouched until the matching acquire.
    pub fn record_queue_family_release(&mut self, barrier: ImageBarrier, info: &ImageTransitionInfo) {
        let ctx = self.context();
        self.new_queue_family_transfers.retain(|pending| {
            if pending.subresource_range.overlaps(&barrier.subresource_range) {
                info.diagnostics.warn(
                    "queue family release of subresources that already have a pending release, \
                     discarding the older release",
                    ctx,
                );
                false
            } else {
                true
            }
        });
        self.new_queue_family_transfers.push(barrier);
    }

    /// Records an acquire, consuming the matching pending release.
    ///
    /// An acquire without a matching release is remembered in `old_queue_family_transfers`.
    pub fn record_queue_family_acquire(&mut self, barrier: ImageBarrier, info: &ImageTransitionInfo) {
        let ctx = self.context();
        let mut found = false;
        self.new_queue_family_transfers.retain(|release| {
            if !release.subresource_range.overlaps(&barrier.subresource_range) {
                return true;
            }
            if found {
                info.diagnostics
                    .warn("queue family acquire matches multiple pending releases", ctx);
            }
            if release.subresource_range != barrier.subresource_range {
                info.diagnostics.warn(
                    "subresource range of queue family acquire doesn't match the release",
                    ctx,
                );
            }
            if release.src_queue_family_index != barrier.src_queue_family_index
                || release.dst_queue_family_index != barrier.dst_queue_family_index
            {
                info.diagnostics
                    .warn("queue families of queue family acquire don't match the release", ctx);
            }
            if release.old_layout != barrier.old_layout || release.new_layout != barrier.new_layout {
                info.diagnostics
                    .warn("layouts of queue family acquire don't match the release", ctx);
            }
            found = true;
            false
        });
        if !found {
            info.diagnostics
                .debug("queue family acquire without a pending release, keeping it as a prior transfer", ctx);
            self.old_queue_family_transfers.push(barrier);
        }
    }

    /// Records a pipeline barrier submitted on `queue_family_index`.
    pub fn record_barrier(&mut self, barrier: ImageBarrier, queue_family_index: u32, info: &ImageTransitionInfo) {
        let mut barrier = barrier;
        barrier.subresource_range = self.info().clamp_range(&barrier.subresource_range);
        let ctx = self.context();

        if self.info().is_concurrent() {
            barrier.src_queue_family_index = vk::QUEUE_FAMILY_IGNORED;
            barrier.dst_queue_family_index = vk::QUEUE_FAMILY_IGNORED;
        } else {
            if is_external_queue_family(barrier.src_queue_family_index)
                || is_external_queue_family(barrier.dst_queue_family_index)
            {
                info.diagnostics
                    .warn("barriers involving external queue families are not supported", ctx);
                return;
            }
            let src_ignored = barrier.src_queue_family_index == vk::QUEUE_FAMILY_IGNORED;
            let dst_ignored = barrier.dst_queue_family_index == vk::QUEUE_FAMILY_IGNORED;
            if src_ignored != dst_ignored {
                info.diagnostics.warn(
                    "barrier has exactly one queue family index set to VK_QUEUE_FAMILY_IGNORED",
                    ctx,
                );
            }
            if src_ignored {
                barrier.src_queue_family_index = queue_family_index;
            }
            if dst_ignored {
                barrier.dst_queue_family_index = queue_family_index;
            }

            if barrier.src_queue_family_index != barrier.dst_queue_family_index {
                if barrier.src_queue_family_index == queue_family_index {
                    self.record_queue_family_release(barrier, info);
                    return;
                } else if barrier.dst_queue_family_index == queue_family_index {
                    self.record_queue_family_acquire(barrier, info);
                } else {
                    info.diagnostics.error(
                        "ownership transfer between queue families other than the submitting queue's",
                        ctx,
                    );
                    return;
                }
            }
        }

        let ref_type = if barrier.old_layout == vk::ImageLayout::UNDEFINED {
            FrameRefType::CompleteWrite
        } else {
            FrameRefType::None
        };
        let state = ImageSubresourceState {
            old_queue_family_index: barrier.src_queue_family_index,
            new_queue_family_index: barrier.dst_queue_family_index,
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
            ref_type,
        };
        self.access(&barrier.subresource_range, &state, info.frame_ref_compose());
    }

    fn add_barrier(
        &self,
        seq: &mut ImageBarrierSequence,
        batch_index: usize,
        queue_family_index: u32,
        barrier: ImageBarrier,
        info: &ImageTransitionInfo,
    ) {
        if let Err(err) = seq.add_wrapped(batch_index, queue_family_index, barrier) {
            info.diagnostics
                .error(&format!("could not add image barrier: {err}"), self.context());
        }
    }

    /// Completes every pending release with an acquire submitted in `batch_index`, and applies its
    /// effect on the subresource states.
    pub fn close_transfers(
        &mut self,
        batch_index: usize,
        dst_access: vk::AccessFlags,
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        let compose = info.frame_ref_compose();
        for mut barrier in mem::take(&mut self.new_queue_family_transfers) {
            barrier.dst_access_mask = dst_access;
            self.add_barrier(seq, batch_index, barrier.dst_queue_family_index, barrier, info);
            let state = ImageSubresourceState {
                old_queue_family_index: barrier.src_queue_family_index,
                new_queue_family_index: barrier.dst_queue_family_index,
                old_layout: barrier.old_layout,
                new_layout: barrier.new_layout,
                ref_type: FrameRefType::None,
            };
            self.access(&barrier.subresource_range, &state, compose);
        }
    }

    /// Re-issues `transfers` as releases submitted in `batch_index`, leaving them pending.
    pub fn restore_transfers(
        &mut self,
        batch_index: usize,
        transfers: &[ImageBarrier],
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        for barrier in transfers {
            let mut release = *barrier;
            release.dst_access_mask = vk::AccessFlags::empty();
            self.add_barrier(seq, batch_index, release.src_queue_family_index, release, info);
            self.record_queue_family_release(*barrier, info);
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Transitions

    /// Computes the transition of a group of subresources in `src` to `dst`, or `None` if there is
    /// nothing to do.
    fn plan_transition(
        &self,
        range: ImageSubresourceRange,
        src: &ImageSubresourceState,
        dst: &ImageSubresourceState,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        info: &ImageTransitionInfo,
    ) -> Option<PlannedTransition> {
        let ctx = self.context();
        let image_info = self.info();

        let mut src_layout = src.new_layout;
        let mut dst_layout = dst.new_layout;
        if dst_layout == UNKNOWN_PREV_IMG_LAYOUT {
            dst_layout = src_layout;
        }
        if src_layout == UNKNOWN_PREV_IMG_LAYOUT {
            src_layout = vk::ImageLayout::UNDEFINED;
        }
        if dst_layout == UNKNOWN_PREV_IMG_LAYOUT || dst_layout == vk::ImageLayout::UNDEFINED {
            return None;
        }

        let mut src_queue_family_index = src.new_queue_family_index;
        let mut dst_queue_family_index = dst.new_queue_family_index;
        if image_info.is_concurrent() {
            if !info.has_default_queue_family() {
                info.diagnostics
                    .error("no queue family to submit a transition of a concurrent image to", ctx);
                return None;
            }
            src_queue_family_index = vk::QUEUE_FAMILY_IGNORED;
            dst_queue_family_index = vk::QUEUE_FAMILY_IGNORED;
        } else {
            if is_external_queue_family(src_queue_family_index) || is_external_queue_family(dst_queue_family_index) {
                info.diagnostics
                    .warn("transitions involving external queue families are not supported", ctx);
                return None;
            }
            if dst_queue_family_index == vk::QUEUE_FAMILY_IGNORED {
                dst_queue_family_index = src_queue_family_index;
            }
            if src_queue_family_index == vk::QUEUE_FAMILY_IGNORED {
                src_queue_family_index = dst_queue_family_index;
            }
            if dst_queue_family_index == vk::QUEUE_FAMILY_IGNORED {
                if !info.has_default_queue_family() {
                    info.diagnostics
                        .error("image isn't owned by any queue family and there is no default", ctx);
                    return None;
                }
                src_queue_family_index = info.default_queue_family_index;
                dst_queue_family_index = info.default_queue_family_index;
            }
        }

        if dst_layout == vk::ImageLayout::PREINITIALIZED {
            info.diagnostics
                .warn("transition to VK_IMAGE_LAYOUT_PREINITIALIZED, using VK_IMAGE_LAYOUT_GENERAL instead", ctx);
            dst_layout = vk::ImageLayout::GENERAL;
            dst_queue_family_index = src_queue_family_index;
        }
        if src_layout == vk::ImageLayout::UNDEFINED {
            // no contents to transfer
            src_queue_family_index = dst_queue_family_index;
        }
        if src_layout == dst_layout && src_queue_family_index == dst_queue_family_index {
            return None;
        }
        let submit_queue_family_index = if image_info.is_concurrent() {
            info.default_queue_family_index
        } else {
            src_queue_family_index
        };

        let state = ImageSubresourceState {
            new_layout: dst_layout,
            new_queue_family_index: dst_queue_family_index,
            ..*src
        };

        let mut barrier_range = range;
        let mut emit = true;
        let mut coalesced = false;
        if image_info.is_depth_stencil() && !info.separate_depth_stencil_layouts {
            if !range.aspect_mask.contains(vk::ImageAspectFlags::DEPTH) {
                // covered by the barrier of the depth aspect
                emit = false;
                coalesced = true;
            } else {
                barrier_range.aspect_mask = vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL;
            }
        }
        if image_info.image_type == ImageType::Image3D && range.base_depth_slice > 0 {
            // barriers address all depth slices at once
            emit = false;
        }

        let barrier = emit.then(|| ImageBarrier {
            image: self.handle,
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            old_layout: src_layout,
            new_layout: dst_layout,
            src_queue_family_index,
            dst_queue_family_index,
            subresource_range: barrier_range,
        });

        Some(PlannedTransition {
            range,
            barrier,
            submit_queue_family_index,
            state,
            coalesced,
        })
    }

    /// Applies planned transitions and adds their barriers to `seq`.
    fn apply_transitions(
        &mut self,
        plans: Vec<PlannedTransition>,
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        for plan in plans.iter().filter(|p| p.coalesced) {
            let covered = plans.iter().any(|p| {
                p.barrier
                    .map_or(false, |b| b.subresource_range.overlaps(&plan.range))
            });
            if !covered {
                info.diagnostics.warn(
                    "stencil transition without a matching depth transition, \
                     dropping the barrier since depth and stencil layouts can't be separated",
                    self.context(),
                );
            }
        }
        for plan in plans {
            let state = plan.state;
            self.subresource_states.update_range(&plan.range, |_| state);
            let Some(barrier) = plan.barrier else { continue };
            if barrier.src_queue_family_index != barrier.dst_queue_family_index {
                let release = ImageBarrier {
                    dst_access_mask: vk::AccessFlags::empty(),
                    ..barrier
                };
                let acquire = ImageBarrier {
                    src_access_mask: vk::AccessFlags::empty(),
                    ..barrier
                };
                self.add_barrier(seq, info.batches.main, plan.submit_queue_family_index, release, info);
                self.add_barrier(seq, info.batches.acquire, barrier.dst_queue_family_index, acquire, info);
            } else {
                let barrier = ImageBarrier {
                    src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    ..barrier
                };
                self.add_barrier(seq, info.batches.main, plan.submit_queue_family_index, barrier, info);
            }
        }
    }

    /// Transitions the image to the current state of `dst`.
    ///
    /// Subresources whose state in `dst` is unknown keep their layout and owner. Pending releases
    /// of the image are completed first (`info.batches.close_transfers`), and pending releases of
    /// `dst` are re-issued last (`info.batches.restore_transfers`).
    pub fn transition(
        &mut self,
        dst: &ImageState,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        debug_assert_eq!(self.info(), dst.info());
        self.close_transfers(info.batches.close_transfers, dst_access, seq, info);

        let mut plans = Vec::new();
        for (dst_range, dst_state) in dst.subresource_states.iter() {
            for (range, src_state) in self.subresource_states.range_iter(&dst_range) {
                let range = range.intersection(&dst_range);
                plans.extend(self.plan_transition(range, src_state, dst_state, src_access, dst_access, info));
            }
        }
        self.apply_transitions(plans, seq, info);

        self.restore_transfers(info.batches.restore_transfers, &dst.new_queue_family_transfers, seq, info);
    }

    /// Transitions every subresource to `layout`, owned by `queue_family_index`.
    pub fn transition_to(
        &mut self,
        queue_family_index: u32,
        layout: vk::ImageLayout,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        let dst = ImageState::with_state(
            self.handle,
            *self.info(),
            ImageSubresourceState {
                new_queue_family_index: queue_family_index,
                new_layout: layout,
                ..Default::default()
            },
        );
        self.transition(&dst, src_access, dst_access, seq, info);
    }

    /// Moves every subresource back to the layout and owner it had at the beginning of the
    /// interval, and re-issues the releases that were pending then.
    pub fn reset_to_old_state(
        &mut self,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        seq: &mut ImageBarrierSequence,
        info: &ImageTransitionInfo,
    ) {
        self.close_transfers(info.batches.close_transfers, dst_access, seq, info);

        let mut plans = Vec::new();
        for (range, state) in self.subresource_states.iter() {
            if state.old_layout == UNKNOWN_PREV_IMG_LAYOUT || state.new_layout == UNKNOWN_PREV_IMG_LAYOUT {
                continue;
            }
            let target = ImageSubresourceState {
                new_layout: state.old_layout,
                new_queue_family_index: state.old_queue_family_index,
                ..*state
            };
            plans.extend(self.plan_transition(range, state, &target, src_access, dst_access, info));
        }
        self.apply_transitions(plans, seq, info);

        let transfers = self.old_queue_family_transfers.clone();
        self.restore_transfers(info.batches.restore_transfers, &transfers, seq, info);
    }
}
