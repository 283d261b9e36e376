//! Batched, per-queue-family image barrier lists.
use crate::{is_external_queue_family, vk, BarrierSequenceError, ImageSubresourceRange};
use tracing::trace;

/// Number of ordering stages of a barrier sequence.
pub const MAX_BATCH_COUNT: usize = 4;

/// Completes pending queue family releases.
pub const BATCH_CLOSE_TRANSFERS: usize = 0;
/// Layout transitions and queue family releases.
pub const BATCH_MAIN: usize = 1;
/// Queue family acquires matching the releases of `BATCH_MAIN`.
pub const BATCH_ACQUIRE: usize = 2;
/// Re-issues releases that were pending in the target state.
pub const BATCH_RESTORE_TRANSFERS: usize = 3;

/// Batches that receive the barriers of an image transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BarrierBatches {
    /// Acquires completing the releases pending in the current state.
    pub close_transfers: usize,
    /// Layout transitions, and the release half of ownership transfers.
    pub main: usize,
    /// The acquire half of ownership transfers.
    pub acquire: usize,
    /// Releases pending in the target state.
    pub restore_transfers: usize,
}

impl Default for BarrierBatches {
    fn default() -> Self {
        BarrierBatches {
            close_transfers: BATCH_CLOSE_TRANSFERS,
            main: BATCH_MAIN,
            acquire: BATCH_ACQUIRE,
            restore_transfers: BATCH_RESTORE_TRANSFERS,
        }
    }
}

/// An image memory barrier.
///
/// Unlike `vk::ImageMemoryBarrier`, it can be compared and doesn't carry an extension chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub subresource_range: ImageSubresourceRange,
}

impl ImageBarrier {
    pub fn from_vk(barrier: &vk::ImageMemoryBarrier) -> ImageBarrier {
        ImageBarrier {
            image: barrier.image,
            src_access_mask: barrier.src_access_mask,
            dst_access_mask: barrier.dst_access_mask,
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
            src_queue_family_index: barrier.src_queue_family_index,
            dst_queue_family_index: barrier.dst_queue_family_index,
            subresource_range: barrier.subresource_range.into(),
        }
    }

    /// Converts to a Vulkan barrier on the given image handle.
    pub fn to_vk(&self, image: vk::Image) -> vk::ImageMemoryBarrier {
        vk::ImageMemoryBarrier {
            src_access_mask: self.src_access_mask,
            dst_access_mask: self.dst_access_mask,
            old_layout: self.old_layout,
            new_layout: self.new_layout,
            src_queue_family_index: self.src_queue_family_index,
            dst_queue_family_index: self.dst_queue_family_index,
            image,
            subresource_range: self.subresource_range.to_vk(),
            ..Default::default()
        }
    }
}

/// Maps the handles stored in barriers to the handles that must appear in emitted barriers.
pub trait UnwrapHandle {
    fn unwrap_image(&self, image: vk::Image) -> vk::Image;
}

impl<F: Fn(vk::Image) -> vk::Image> UnwrapHandle for F {
    fn unwrap_image(&self, image: vk::Image) -> vk::Image {
        self(image)
    }
}

/// Handles are used as is.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoWrapping;

impl UnwrapHandle for NoWrapping {
    fn unwrap_image(&self, image: vk::Image) -> vk::Image {
        image
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Image barriers, partitioned by batch then by the queue family that must execute them.
///
/// Barriers of a batch for a given queue keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct ImageBarrierSequence {
    batches: [Vec<Vec<ImageBarrier>>; MAX_BATCH_COUNT],
    barrier_count: usize,
}

impl ImageBarrierSequence {
    pub fn new() -> ImageBarrierSequence {
        ImageBarrierSequence::default()
    }

    /// Creates a sequence with preallocated lists for `queue_family_count` queue families.
    pub fn with_queue_family_count(queue_family_count: u32) -> ImageBarrierSequence {
        let mut seq = ImageBarrierSequence::default();
        for batch in seq.batches.iter_mut() {
            batch.resize_with(queue_family_count as usize, Vec::new);
        }
        seq
    }

    /// Appends a barrier to the list of `queue_family_index` in batch `batch_index`.
    pub fn add_wrapped(
        &mut self,
        batch_index: usize,
        queue_family_index: u32,
        barrier: ImageBarrier,
    ) -> Result<(), BarrierSequenceError> {
        if batch_index >= MAX_BATCH_COUNT {
            return Err(BarrierSequenceError::BatchOutOfRange {
                index: batch_index,
                max: MAX_BATCH_COUNT,
            });
        }
        if queue_family_index == vk::QUEUE_FAMILY_IGNORED || is_external_queue_family(queue_family_index) {
            return Err(BarrierSequenceError::ReservedQueueFamily(queue_family_index));
        }
        let batch = &mut self.batches[batch_index];
        let q = queue_family_index as usize;
        if batch.len() <= q {
            batch.resize_with(q + 1, Vec::new);
        }
        batch[q].push(barrier);
        self.barrier_count += 1;
        Ok(())
    }

    /// Appends all barriers of `other`, batch by batch and queue by queue.
    pub fn merge(&mut self, other: &ImageBarrierSequence) {
        for (batch, other_batch) in self.batches.iter_mut().zip(other.batches.iter()) {
            if batch.len() < other_batch.len() {
                batch.resize_with(other_batch.len(), Vec::new);
            }
            for (list, other_list) in batch.iter_mut().zip(other_batch.iter()) {
                list.extend_from_slice(other_list);
            }
        }
        self.barrier_count += other.barrier_count;
    }

    /// Barriers of a batch for a queue family.
    pub fn batch(&self, batch_index: usize, queue_family_index: u32) -> &[ImageBarrier] {
        self.batches
            .get(batch_index)
            .and_then(|b| b.get(queue_family_index as usize))
            .map(|l| l.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_batch_empty(&self, batch_index: usize, queue_family_index: u32) -> bool {
        self.batch(batch_index, queue_family_index).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.barrier_count == 0
    }

    /// Total number of barriers in the sequence.
    pub fn len(&self) -> usize {
        self.barrier_count
    }

    /// Moves the barriers of a batch for a queue family to `out`, converted to Vulkan barriers
    /// with unwrapped image handles.
    pub fn extract_unwrapped_batch(
        &mut self,
        batch_index: usize,
        queue_family_index: u32,
        unwrap: &impl UnwrapHandle,
        out: &mut Vec<vk::ImageMemoryBarrier>,
    ) {
        let Some(list) = self
            .batches
            .get_mut(batch_index)
            .and_then(|b| b.get_mut(queue_family_index as usize))
        else {
            return;
        };
        trace!(
            batch = batch_index,
            queue_family = queue_family_index,
            count = list.len(),
            "extracting barrier batch"
        );
        self.barrier_count -= list.len();
        out.extend(list.drain(..).map(|b| b.to_vk(unwrap.unwrap_image(b.image))));
    }

    /// Extracts the first non-empty batch for a queue family. Returns the index of that batch.
    pub fn extract_first_unwrapped_batch_for_queue(
        &mut self,
        queue_family_index: u32,
        unwrap: &impl UnwrapHandle,
        out: &mut Vec<vk::ImageMemoryBarrier>,
    ) -> Option<usize> {
        let batch_index = (0..MAX_BATCH_COUNT).find(|&i| !self.is_batch_empty(i, queue_family_index))?;
        self.extract_unwrapped_batch(batch_index, queue_family_index, unwrap, out);
        Some(batch_index)
    }

    /// Extracts the last non-empty batch for a queue family. Returns the index of that batch.
    pub fn extract_last_unwrapped_batch_for_queue(
        &mut self,
        queue_family_index: u32,
        unwrap: &impl UnwrapHandle,
        out: &mut Vec<vk::ImageMemoryBarrier>,
    ) -> Option<usize> {
        let batch_index = (0..MAX_BATCH_COUNT)
            .rev()
            .find(|&i| !self.is_batch_empty(i, queue_family_index))?;
        self.extract_unwrapped_batch(batch_index, queue_family_index, unwrap, out);
        Some(batch_index)
    }
}
