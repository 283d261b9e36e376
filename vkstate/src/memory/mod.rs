//! Memory allocations and the resources bound to them.
mod intervals;

pub use intervals::*;

use crate::{vk, AccessAction, DiagnosticSink, ResetRequirement};
use std::ops::Range;
use tracing::debug;

/// A resource bound to a memory allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundResourceHandle {
    Buffer(vk::Buffer),
    Image(vk::Image),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundResource {
    pub handle: BoundResourceHandle,
    pub offset: u64,
    pub size: u64,
    /// `ResetRequirement::Unknown` until `compute_reset_requirements` is called.
    pub reset: ResetRequirement,
}

/// A device memory allocation, with the state of its bytes and the resources bound to it.
#[derive(Clone, Debug)]
pub struct MemoryAllocationWithBoundResources {
    memory: vk::DeviceMemory,
    tracker: IntervalMemoryTracker,
    bound_resources: Vec<BoundResource>,
    /// Ranges of all resources bound so far, for alias detection.
    ranges: Vec<Range<u64>>,
    has_aliased_resources: bool,
    reset_requirements_computed: bool,
}

impl MemoryAllocationWithBoundResources {
    pub fn new(memory: vk::DeviceMemory, size: u64) -> MemoryAllocationWithBoundResources {
        MemoryAllocationWithBoundResources {
            memory,
            tracker: IntervalMemoryTracker::new(memory, size),
            bound_resources: vec![],
            ranges: vec![],
            has_aliased_resources: false,
            reset_requirements_computed: false,
        }
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    pub fn size(&self) -> u64 {
        self.tracker.size()
    }

    pub fn tracker(&self) -> &IntervalMemoryTracker {
        &self.tracker
    }

    pub fn bound_resources(&self) -> &[BoundResource] {
        &self.bound_resources
    }

    pub fn has_aliased_resources(&self) -> bool {
        self.has_aliased_resources
    }

    /// Forgets the access history of the allocation. Bound resources and aliasing are kept.
    pub fn begin_capture(&mut self) {
        self.tracker = IntervalMemoryTracker::new(self.memory, self.tracker.size());
        for resource in self.bound_resources.iter_mut() {
            resource.reset = ResetRequirement::Unknown;
        }
        self.reset_requirements_computed = false;
    }

    /// Binds a resource to `offset..offset+size` (`vk::WHOLE_SIZE` extends to the end of the
    /// allocation). Returns the index of the bound resource.
    pub fn bind(&mut self, handle: BoundResourceHandle, offset: u64, size: u64) -> usize {
        let size = if size == vk::WHOLE_SIZE {
            self.size().saturating_sub(offset)
        } else {
            size
        };
        self.check_aliased_resources(offset..offset.saturating_add(size));
        self.bound_resources.push(BoundResource {
            handle,
            offset,
            size,
            reset: ResetRequirement::Unknown,
        });
        self.reset_requirements_computed = false;
        self.bound_resources.len() - 1
    }

    /// Registers a bound range, flagging the allocation as aliased if it overlaps a previous one.
    ///
    /// Returns whether the allocation has aliased resources. Once set, the flag is never cleared.
    pub fn check_aliased_resources(&mut self, range: Range<u64>) -> bool {
        if !self.has_aliased_resources
            && self
                .ranges
                .iter()
                .any(|r| r.start < range.end && range.start < r.end)
        {
            debug!(memory = ?self.memory, ?range, "allocation has aliased resources");
            self.has_aliased_resources = true;
        }
        self.ranges.push(range);
        self.has_aliased_resources
    }

    pub fn access(
        &mut self,
        queue_family_index: u32,
        sharing_mode: vk::SharingMode,
        action: AccessAction,
        offset: u64,
        size: u64,
        diagnostics: &dyn DiagnosticSink,
    ) {
        self.tracker
            .access(queue_family_index, sharing_mode, action, offset, size, diagnostics);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn transition_queue_family(
        &mut self,
        queue_family_index: u32,
        sharing_mode: vk::SharingMode,
        src_queue_family_index: u32,
        dst_queue_family_index: u32,
        offset: u64,
        size: u64,
        diagnostics: &dyn DiagnosticSink,
    ) {
        self.tracker.transition_queue_family(
            queue_family_index,
            sharing_mode,
            src_queue_family_index,
            dst_queue_family_index,
            offset,
            size,
            diagnostics,
        );
    }

    /// Computes the reset requirement of every bound resource from the state of its bytes.
    ///
    /// Resources of an aliased allocation all need a reset.
    pub fn compute_reset_requirements(&mut self) {
        self.compute_reset_requirements_with(|_| None);
    }

    /// Same as `compute_reset_requirements`, also taking into account the requirement returned by
    /// `tracked_elsewhere` for resources whose accesses aren't recorded as byte ranges (images).
    pub fn compute_reset_requirements_with(
        &mut self,
        tracked_elsewhere: impl Fn(BoundResourceHandle) -> Option<ResetRequirement>,
    ) {
        for resource in self.bound_resources.iter_mut() {
            resource.reset = if self.has_aliased_resources {
                ResetRequirement::Reset
            } else {
                let bytes = self.tracker.reset_requirement(resource.offset, resource.size);
                match tracked_elsewhere(resource.handle) {
                    Some(requirement) => bytes.combine(requirement),
                    None => bytes,
                }
            };
        }
        self.reset_requirements_computed = true;
    }

    /// Most demanding requirement over the bound resources and every byte of the allocation,
    /// including bytes outside of bound resources (e.g. host accesses to mapped memory).
    fn allocation_reset_requirement(&self) -> ResetRequirement {
        self.bound_resources
            .iter()
            .fold(self.tracker.reset_requirement(0, vk::WHOLE_SIZE), |r, b| r.combine(b.reset))
    }

    fn assert_reset_requirements_computed(&self) {
        assert!(
            self.reset_requirements_computed,
            "reset requirements of memory {:?} queried before being computed",
            self.memory
        );
    }

    /// # Panics
    ///
    /// If `compute_reset_requirements` hasn't been called since the last bind.
    pub fn reset_requirement(&self, index: usize) -> ResetRequirement {
        self.assert_reset_requirements_computed();
        self.bound_resources[index].reset
    }

    /// Returns whether the allocation must be restored before every replay.
    ///
    /// # Panics
    ///
    /// If `compute_reset_requirements` hasn't been called since the last bind.
    pub fn needs_reset(&self) -> bool {
        self.assert_reset_requirements_computed();
        self.has_aliased_resources || self.allocation_reset_requirement() == ResetRequirement::Reset
    }

    /// Returns whether the captured contents of the allocation must be uploaded before replay.
    ///
    /// # Panics
    ///
    /// If `compute_reset_requirements` hasn't been called since the last bind.
    pub fn needs_init(&self) -> bool {
        self.assert_reset_requirements_computed();
        self.has_aliased_resources
            || matches!(
                self.allocation_reset_requirement(),
                ResetRequirement::Reset | ResetRequirement::Init
            )
    }

    /// Indices of the bound resources, resources needing a reset first, then those needing an
    /// initialization, then the others. Resources with the same requirement keep their binding order.
    ///
    /// # Panics
    ///
    /// If `compute_reset_requirements` hasn't been called since the last bind.
    pub fn order_by_reset_requirement(&self) -> Vec<usize> {
        self.assert_reset_requirements_computed();
        let mut order: Vec<usize> = (0..self.bound_resources.len()).collect();
        order.sort_by_key(|&i| self.bound_resources[i].reset);
        order
    }
}
