//! Byte-range state of a memory allocation.
use crate::{vk, AccessAction, AccessState, DiagnosticContext, DiagnosticSink, ResetRequirement};
use rangemap::RangeMap;
use std::ops::Range;

/// State of a range of bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryState {
    pub access_state: AccessState,
    /// Owner of the range, or the queue family it was released to if `is_acquired` is false.
    pub queue_family_index: u32,
    pub is_acquired: bool,
}

impl Default for MemoryState {
    fn default() -> Self {
        MemoryState {
            access_state: AccessState::Init,
            queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            is_acquired: false,
        }
    }
}

/// Tracks the state of every byte of an allocation.
///
/// The allocation is always fully covered by the intervals of the map; adjacent intervals with
/// equal states are merged.
#[derive(Clone, Debug)]
pub struct IntervalMemoryTracker {
    memory: vk::DeviceMemory,
    size: u64,
    states: RangeMap<u64, MemoryState>,
}

impl IntervalMemoryTracker {
    pub fn new(memory: vk::DeviceMemory, size: u64) -> IntervalMemoryTracker {
        let mut states = RangeMap::new();
        if size > 0 {
            states.insert(0..size, MemoryState::default());
        }
        IntervalMemoryTracker { memory, size, states }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Resolves `vk::WHOLE_SIZE` and clamps `offset..offset+size` to the allocation.
    pub fn clamp(&self, offset: u64, size: u64) -> Option<Range<u64>> {
        if offset >= self.size {
            return None;
        }
        let end = if size == vk::WHOLE_SIZE {
            self.size
        } else {
            offset.saturating_add(size).min(self.size)
        };
        (end > offset).then_some(offset..end)
    }

    fn context(&self) -> DiagnosticContext {
        DiagnosticContext::Memory(self.memory)
    }

    /// Intervals overlapping `range`, clipped to it.
    fn clipped(&self, range: &Range<u64>) -> Vec<(Range<u64>, MemoryState)> {
        self.states
            .overlapping(range)
            .map(|(r, s)| (r.start.max(range.start)..r.end.min(range.end), *s))
            .collect()
    }

    fn store(&mut self, updates: Vec<(Range<u64>, MemoryState)>) {
        for (range, state) in updates {
            self.states.insert(range, state);
        }
    }

    /// Records an access by a queue of family `queue_family_index`.
    ///
    /// In exclusive mode, the first use of a range that isn't owned implicitly acquires it.
    pub fn access(
        &mut self,
        queue_family_index: u32,
        sharing_mode: vk::SharingMode,
        action: AccessAction,
        offset: u64,
        size: u64,
        diagnostics: &dyn DiagnosticSink,
    ) {
        let Some(range) = self.clamp(offset, size) else {
            return;
        };
        let mut warned = false;
        let mut updates = self.clipped(&range);
        for (_, state) in updates.iter_mut() {
            state.access_state = state.access_state.apply(action);
            if sharing_mode == vk::SharingMode::CONCURRENT {
                continue;
            }
            if !state.is_acquired {
                state.queue_family_index = queue_family_index;
                state.is_acquired = true;
            } else if state.queue_family_index != queue_family_index && !warned {
                diagnostics.warn(
                    &format!(
                        "memory accessed by queue family {} while owned by queue family {}",
                        queue_family_index, state.queue_family_index
                    ),
                    self.context(),
                );
                warned = true;
            }
        }
        self.store(updates);
    }

    /// Records a queue family ownership transfer barrier submitted on `queue_family_index`.
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
        if sharing_mode == vk::SharingMode::CONCURRENT || src_queue_family_index == dst_queue_family_index {
            return;
        }
        let Some(range) = self.clamp(offset, size) else {
            return;
        };
        let acquired = if queue_family_index == src_queue_family_index {
            false
        } else if queue_family_index == dst_queue_family_index {
            true
        } else {
            diagnostics.warn(
                &format!(
                    "ownership transfer from queue family {} to {} submitted on queue family {}",
                    src_queue_family_index, dst_queue_family_index, queue_family_index
                ),
                self.context(),
            );
            return;
        };
        let mut updates = self.clipped(&range);
        for (_, state) in updates.iter_mut() {
            state.queue_family_index = dst_queue_family_index;
            state.is_acquired = acquired;
        }
        self.store(updates);
    }

    /// State of the byte at `offset`.
    pub fn state_at(&self, offset: u64) -> Option<MemoryState> {
        self.states.get(&offset).copied()
    }

    /// States of `offset..offset+size`, as maximal intervals clipped to the range.
    pub fn states_in(&self, offset: u64, size: u64) -> Vec<(Range<u64>, MemoryState)> {
        match self.clamp(offset, size) {
            Some(range) => self.clipped(&range),
            None => vec![],
        }
    }

    /// Iterates over all intervals of the allocation.
    pub fn iter(&self) -> impl Iterator<Item = (&Range<u64>, &MemoryState)> + '_ {
        self.states.iter()
    }

    /// Most demanding reset requirement of `offset..offset+size`.
    pub fn reset_requirement(&self, offset: u64, size: u64) -> ResetRequirement {
        self.states_in(offset, size)
            .iter()
            .fold(ResetRequirement::NoReset, |r, (_, s)| r.combine(s.access_state.reset_requirement()))
    }
}
