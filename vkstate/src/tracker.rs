//! Registry of tracked images and memory allocations.
use crate::{
    vk, AccessAction, BarrierBatches, BoundResourceHandle, CaptureState, DiagnosticContext, DiagnosticSink, Error, FrameRefType,
    ImageBarrier, ImageBarrierSequence, ImageInfo, ImageState, ImageSubresourceRange, ImageSubresourceState,
    ImageTransitionInfo, MemoryAllocationWithBoundResources, TrackerConfig, TracingDiagnostics,
};
use fxhash::FxHashMap;
use slotmap::SlotMap;
use tracing::debug;

slotmap::new_key_type! {
    /// Identifies a tracked image.
    pub struct ImageId;

    /// Identifies a tracked memory allocation.
    pub struct MemoryId;
}

#[derive(Clone, Debug)]
struct ImageEntry {
    state: ImageState,
    is_swapchain_image: bool,
    memory: Option<MemoryId>,
}

/// Memory range of a buffer.
#[derive(Copy, Clone, Debug)]
struct BufferBinding {
    memory: MemoryId,
    offset: u64,
    size: u64,
    sharing_mode: vk::SharingMode,
}

/// Tracks the state of all images and memory allocations of a device.
pub struct ResourceTracker {
    config: TrackerConfig,
    diagnostics: Box<dyn DiagnosticSink>,
    images: SlotMap<ImageId, ImageEntry>,
    image_ids: FxHashMap<vk::Image, ImageId>,
    allocations: SlotMap<MemoryId, MemoryAllocationWithBoundResources>,
    allocation_ids: FxHashMap<vk::DeviceMemory, MemoryId>,
    buffers: FxHashMap<vk::Buffer, BufferBinding>,
}

impl ResourceTracker {
    /// Creates a tracker that reports diagnostics with `tracing`.
    pub fn new(config: TrackerConfig) -> ResourceTracker {
        ResourceTracker::with_diagnostics(config, Box::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(config: TrackerConfig, diagnostics: Box<dyn DiagnosticSink>) -> ResourceTracker {
        ResourceTracker {
            config,
            diagnostics,
            images: SlotMap::with_key(),
            image_ids: FxHashMap::default(),
            allocations: SlotMap::with_key(),
            allocation_ids: FxHashMap::default(),
            buffers: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn set_capture_state(&mut self, capture_state: CaptureState) {
        self.config.capture_state = capture_state;
    }

    /// Parameters of state transitions under the current configuration.
    pub fn transition_info(&self) -> ImageTransitionInfo<'_> {
        ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref())
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Images

    fn insert_image(&mut self, handle: vk::Image, entry: ImageEntry) -> Result<ImageId, Error> {
        if self.image_ids.contains_key(&handle) {
            return Err(Error::ImageAlreadyTracked(handle));
        }
        let id = self.images.insert(entry);
        self.image_ids.insert(handle, id);
        Ok(id)
    }

    /// Starts tracking an image created with the given parameters.
    pub fn register_image(
        &mut self,
        handle: vk::Image,
        info: ImageInfo,
        initial_layout: vk::ImageLayout,
    ) -> Result<ImageId, Error> {
        debug!(image = ?handle, ?info, "register image");
        self.insert_image(
            handle,
            ImageEntry {
                state: ImageState::new(handle, info, initial_layout),
                is_swapchain_image: false,
                memory: None,
            },
        )
    }

    /// Starts tracking an image created by `vkCreateImage` with `create_info`.
    pub fn register_created_image(
        &mut self,
        handle: vk::Image,
        create_info: &vk::ImageCreateInfo,
    ) -> Result<ImageId, Error> {
        self.register_image(
            handle,
            ImageInfo::from_create_info(create_info),
            create_info.initial_layout,
        )
    }

    /// Starts tracking a swapchain image. Swapchain images start in `UNDEFINED` and own their memory.
    pub fn register_swapchain_image(&mut self, handle: vk::Image, info: ImageInfo) -> Result<ImageId, Error> {
        debug!(image = ?handle, ?info, "register swapchain image");
        let mut state = ImageState::new(handle, info, vk::ImageLayout::UNDEFINED);
        state.set_memory_bound(true);
        self.insert_image(
            handle,
            ImageEntry {
                state,
                is_swapchain_image: true,
                memory: None,
            },
        )
    }

    /// Stops tracking an image and returns its last state.
    pub fn destroy_image(&mut self, handle: vk::Image) -> Result<ImageState, Error> {
        let id = self.image_ids.remove(&handle).ok_or(Error::UnknownImage(handle))?;
        let entry = self.images.remove(id).ok_or(Error::UnknownImage(handle))?;
        Ok(entry.state)
    }

    pub fn image_id(&self, handle: vk::Image) -> Option<ImageId> {
        self.image_ids.get(&handle).copied()
    }

    pub fn image(&self, handle: vk::Image) -> Option<&ImageState> {
        self.image_id(handle).map(|id| &self.images[id].state)
    }

    pub fn is_swapchain_image(&self, handle: vk::Image) -> bool {
        self.image_id(handle)
            .map(|id| self.images[id].is_swapchain_image)
            .unwrap_or(false)
    }

    /// Iterates over all tracked images.
    pub fn images(&self) -> impl Iterator<Item = &ImageState> + '_ {
        self.images.values().map(|e| &e.state)
    }

    /// An empty state of the image, to record the effect of a command buffer into.
    pub fn command_buffer_state(&self, handle: vk::Image) -> Result<ImageState, Error> {
        self.image(handle)
            .map(ImageState::command_buffer_initial_state)
            .ok_or(Error::UnknownImage(handle))
    }

    /// Records a use of `range` in `layout` by a queue of family `queue_family_index`.
    ///
    /// Returns the most demanding resulting frame reference in the range.
    pub fn access_image(
        &mut self,
        handle: vk::Image,
        range: &ImageSubresourceRange,
        queue_family_index: u32,
        layout: vk::ImageLayout,
        ref_type: FrameRefType,
    ) -> Result<FrameRefType, Error> {
        let id = *self.image_ids.get(&handle).ok_or(Error::UnknownImage(handle))?;
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref());
        let state = &mut self.images[id].state;
        let queue_family_index = if state.info().is_concurrent() {
            vk::QUEUE_FAMILY_IGNORED
        } else {
            queue_family_index
        };
        let dst = ImageSubresourceState::new(queue_family_index, layout, ref_type);
        Ok(state.access(range, &dst, info.frame_ref_compose()))
    }

    /// Records an image memory barrier submitted on a queue of family `queue_family_index`.
    pub fn record_image_barrier(
        &mut self,
        queue_family_index: u32,
        barrier: &vk::ImageMemoryBarrier,
    ) -> Result<(), Error> {
        let id = *self
            .image_ids
            .get(&barrier.image)
            .ok_or(Error::UnknownImage(barrier.image))?;
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref());
        self.images[id]
            .state
            .record_barrier(ImageBarrier::from_vk(barrier), queue_family_index, &info);
        Ok(())
    }

    /// Marks the contents of `range` as discarded.
    pub fn discard_image_contents(&mut self, handle: vk::Image, range: &ImageSubresourceRange) -> Result<(), Error> {
        let id = *self.image_ids.get(&handle).ok_or(Error::UnknownImage(handle))?;
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref());
        self.images[id].state.discard_contents(range, &info);
        Ok(())
    }

    /// Applies the effect of command buffers, in submission order, to the tracked images.
    pub fn merge_command_buffer_states<'a>(
        &mut self,
        states: impl IntoIterator<Item = &'a ImageState>,
    ) -> Result<(), Error> {
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref());
        for cb_state in states {
            let handle = cb_state.handle();
            let id = *self.image_ids.get(&handle).ok_or(Error::UnknownImage(handle))?;
            self.images[id].state.merge(cb_state, &info);
        }
        Ok(())
    }

    /// Transitions images to the given target states, e.g. states returned by
    /// `ImageState::initial_state` at the end of a frame.
    pub fn transition_images<'a>(
        &mut self,
        targets: impl IntoIterator<Item = &'a ImageState>,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        batches: BarrierBatches,
    ) -> Result<ImageBarrierSequence, Error> {
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref()).with_batches(batches);
        let mut seq = ImageBarrierSequence::with_queue_family_count(self.config.queue_family_count);
        for target in targets {
            let handle = target.handle();
            let id = *self.image_ids.get(&handle).ok_or(Error::UnknownImage(handle))?;
            self.images[id]
                .state
                .transition(target, src_access, dst_access, &mut seq, &info);
        }
        Ok(seq)
    }

    /// Moves every image back to the state it was in when the capture began.
    pub fn reset_images_to_old_state(
        &mut self,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
        batches: BarrierBatches,
    ) -> ImageBarrierSequence {
        let info = ImageTransitionInfo::new(&self.config, self.diagnostics.as_ref()).with_batches(batches);
        let mut seq = ImageBarrierSequence::with_queue_family_count(self.config.queue_family_count);
        for entry in self.images.values_mut() {
            entry.state.reset_to_old_state(src_access, dst_access, &mut seq, &info);
        }
        seq
    }

    /// Starts tracking a new frame from the current state of every resource.
    pub fn begin_capture(&mut self) {
        debug!(
            images = self.images.len(),
            allocations = self.allocations.len(),
            "begin capture"
        );
        self.config.capture_state = CaptureState::ActiveCapturing;
        for entry in self.images.values_mut() {
            entry.state.begin_capture();
        }
        for allocation in self.allocations.values_mut() {
            allocation.begin_capture();
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Memory

    pub fn register_allocation(&mut self, memory: vk::DeviceMemory, size: u64) -> Result<MemoryId, Error> {
        if self.allocation_ids.contains_key(&memory) {
            return Err(Error::MemoryAlreadyTracked(memory));
        }
        debug!(?memory, size, "register allocation");
        let id = self
            .allocations
            .insert(MemoryAllocationWithBoundResources::new(memory, size));
        self.allocation_ids.insert(memory, id);
        Ok(id)
    }

    /// Stops tracking an allocation and returns it. Buffers bound to it are forgotten.
    pub fn free_allocation(&mut self, memory: vk::DeviceMemory) -> Result<MemoryAllocationWithBoundResources, Error> {
        let id = self
            .allocation_ids
            .remove(&memory)
            .ok_or(Error::UnknownMemory(memory))?;
        self.buffers.retain(|_, b| b.memory != id);
        for entry in self.images.values_mut() {
            if entry.memory == Some(id) {
                entry.memory = None;
                entry.state.set_memory_bound(false);
            }
        }
        self.allocations.remove(id).ok_or(Error::UnknownMemory(memory))
    }

    pub fn allocation(&self, memory: vk::DeviceMemory) -> Option<&MemoryAllocationWithBoundResources> {
        self.allocation_ids.get(&memory).map(|&id| &self.allocations[id])
    }

    fn allocation_id(&self, memory: vk::DeviceMemory) -> Result<MemoryId, Error> {
        self.allocation_ids
            .get(&memory)
            .copied()
            .ok_or(Error::UnknownMemory(memory))
    }

    /// Records the binding of a buffer to `offset..offset+size` of an allocation.
    pub fn bind_buffer(
        &mut self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: u64,
        size: u64,
        sharing_mode: vk::SharingMode,
    ) -> Result<(), Error> {
        let id = self.allocation_id(memory)?;
        let allocation = &mut self.allocations[id];
        let index = allocation.bind(BoundResourceHandle::Buffer(buffer), offset, size);
        let size = allocation.bound_resources()[index].size;
        self.buffers.insert(
            buffer,
            BufferBinding {
                memory: id,
                offset,
                size,
                sharing_mode,
            },
        );
        Ok(())
    }

    /// Records the binding of an image to `offset..offset+size` of an allocation.
    pub fn bind_image(
        &mut self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: u64,
        size: u64,
    ) -> Result<(), Error> {
        let memory_id = self.allocation_id(memory)?;
        let image_id = *self.image_ids.get(&image).ok_or(Error::UnknownImage(image))?;
        self.allocations[memory_id].bind(BoundResourceHandle::Image(image), offset, size);
        let entry = &mut self.images[image_id];
        entry.memory = Some(memory_id);
        entry.state.set_memory_bound(true);
        Ok(())
    }

    /// Records an access to `offset..offset+size` of an allocation.
    #[allow(clippy::too_many_arguments)]
    pub fn access_memory(
        &mut self,
        memory: vk::DeviceMemory,
        queue_family_index: u32,
        sharing_mode: vk::SharingMode,
        action: AccessAction,
        offset: u64,
        size: u64,
    ) -> Result<(), Error> {
        let id = self.allocation_id(memory)?;
        self.allocations[id].access(
            queue_family_index,
            sharing_mode,
            action,
            offset,
            size,
            self.diagnostics.as_ref(),
        );
        Ok(())
    }

    /// Records an access to `offset..offset+size` of a buffer (`vk::WHOLE_SIZE` extends to the end
    /// of the buffer).
    pub fn access_buffer(
        &mut self,
        buffer: vk::Buffer,
        queue_family_index: u32,
        action: AccessAction,
        offset: u64,
        size: u64,
    ) -> Result<(), Error> {
        let Some(binding) = self.buffers.get(&buffer).copied() else {
            self.diagnostics
                .warn("access to a buffer without bound memory", DiagnosticContext::None);
            return Ok(());
        };
        if offset >= binding.size {
            return Ok(());
        }
        let size = if size == vk::WHOLE_SIZE {
            binding.size - offset
        } else {
            size.min(binding.size - offset)
        };
        self.allocations[binding.memory].access(
            queue_family_index,
            binding.sharing_mode,
            action,
            binding.offset + offset,
            size,
            self.diagnostics.as_ref(),
        );
        Ok(())
    }

    /// Records a queue family ownership transfer of `offset..offset+size` of an allocation,
    /// submitted on a queue of family `queue_family_index`.
    #[allow(clippy::too_many_arguments)]
    pub fn transition_memory_queue_family(
        &mut self,
        memory: vk::DeviceMemory,
        queue_family_index: u32,
        sharing_mode: vk::SharingMode,
        src_queue_family_index: u32,
        dst_queue_family_index: u32,
        offset: u64,
        size: u64,
    ) -> Result<(), Error> {
        let id = self.allocation_id(memory)?;
        self.allocations[id].transition_queue_family(
            queue_family_index,
            sharing_mode,
            src_queue_family_index,
            dst_queue_family_index,
            offset,
            size,
            self.diagnostics.as_ref(),
        );
        Ok(())
    }

    /// Computes the reset requirements of the resources bound to every allocation.
    ///
    /// Images are accessed by subresource rather than by byte range: their requirement comes from
    /// their subresource states.
    pub fn finalize_allocations(&mut self) {
        let image_ids = &self.image_ids;
        let images = &self.images;
        let image_requirement = |handle: BoundResourceHandle| match handle {
            BoundResourceHandle::Image(image) => image_ids.get(&image).map(|&id| {
                let state = &images[id].state;
                state.reset_requirement(&state.info().full_range())
            }),
            BoundResourceHandle::Buffer(_) => None,
        };
        for allocation in self.allocations.values_mut() {
            allocation.compute_reset_requirements_with(image_requirement);
        }
    }

    pub fn allocations(&self) -> impl Iterator<Item = &MemoryAllocationWithBoundResources> + '_ {
        self.allocations.values()
    }
}
