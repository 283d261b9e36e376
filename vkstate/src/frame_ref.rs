//! Frame reference types: how a frame uses the contents a resource had when the frame began.
use crate::{vk, ALL_WRITE_ACCESS};

/// How a resource (or subresource) is referenced during a frame.
///
/// Variants are ordered by how much of the pre-frame contents matter, so that `max` over a set of
/// disjoint subresources gives the most demanding reference.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameRefType {
    /// Not referenced.
    #[default]
    None,
    /// Entirely overwritten; previous contents are irrelevant.
    CompleteWrite,
    /// Entirely overwritten, then read.
    WriteBeforeRead,
    /// Written, possibly not entirely.
    PartialWrite,
    /// Read only.
    Read,
    /// Read, then written.
    ReadBeforeWrite,
    /// Referenced in an unknown way.
    Unknown,
}

/// Function combining a previous reference with a new one.
pub type FrameRefCompose = fn(FrameRefType, FrameRefType) -> FrameRefType;

/// Reset requirement of a resource.
///
/// Ordered so that sorting puts the resources that need the most work first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResetRequirement {
    /// Must be restored before every replay of the frame.
    Reset,
    /// Must be initialized once, before the first replay.
    Init,
    /// Captured contents are never observed.
    NoReset,
    /// Not computed yet.
    Unknown,
}

impl ResetRequirement {
    /// Returns the more demanding of the two requirements.
    pub fn combine(self, other: ResetRequirement) -> ResetRequirement {
        self.min(other)
    }
}

impl FrameRefType {
    pub fn includes_read(self) -> bool {
        matches!(
            self,
            FrameRefType::Read | FrameRefType::ReadBeforeWrite | FrameRefType::WriteBeforeRead | FrameRefType::Unknown
        )
    }

    pub fn includes_write(self) -> bool {
        matches!(
            self,
            FrameRefType::PartialWrite
                | FrameRefType::CompleteWrite
                | FrameRefType::ReadBeforeWrite
                | FrameRefType::WriteBeforeRead
                | FrameRefType::Unknown
        )
    }

    /// What the pre-frame contents of a resource referenced this way require before each replay.
    pub fn reset_requirement(self) -> ResetRequirement {
        match self {
            FrameRefType::None | FrameRefType::CompleteWrite | FrameRefType::WriteBeforeRead => {
                ResetRequirement::NoReset
            }
            // unwritten parts of a partial write survive the frame untouched
            FrameRefType::PartialWrite | FrameRefType::Read => ResetRequirement::Init,
            FrameRefType::ReadBeforeWrite | FrameRefType::Unknown => ResetRequirement::Reset,
        }
    }
}

/// Reference resulting from `first` followed by `second` on the same subresource.
pub fn compose_frame_refs(first: FrameRefType, second: FrameRefType) -> FrameRefType {
    use FrameRefType::*;
    match (first, second) {
        (first, None) => first,
        (None, second) => second,
        (Unknown, _) | (_, Unknown) => Unknown,
        // these already fix the dependency on the pre-frame contents
        (ReadBeforeWrite, _) => ReadBeforeWrite,
        (WriteBeforeRead, _) => WriteBeforeRead,
        (CompleteWrite, second) => {
            if second.includes_read() {
                WriteBeforeRead
            } else {
                CompleteWrite
            }
        }
        (PartialWrite, CompleteWrite) => CompleteWrite,
        (PartialWrite, WriteBeforeRead) => WriteBeforeRead,
        (PartialWrite, PartialWrite) => PartialWrite,
        // the read may see pre-frame data in the unwritten part
        (PartialWrite, Read | ReadBeforeWrite) => ReadBeforeWrite,
        (Read, second) => {
            if second.includes_write() {
                ReadBeforeWrite
            } else {
                Read
            }
        }
    }
}

/// Ignores the new reference.
pub fn keep_old_frame_ref(first: FrameRefType, _second: FrameRefType) -> FrameRefType {
    first
}

/// Combines references of disjoint subresources.
pub fn compose_frame_refs_disjoint(a: FrameRefType, b: FrameRefType) -> FrameRefType {
    a.max(b)
}

/// Classifies an access mask as a frame reference.
///
/// A mask with both read and write bits is assumed to read first (e.g. blending, storage images).
pub fn ref_type_for_access(mask: vk::AccessFlags) -> FrameRefType {
    let write = mask.intersects(ALL_WRITE_ACCESS);
    let read = mask.as_raw() & !ALL_WRITE_ACCESS.as_raw() != 0;
    match (read, write) {
        (false, false) => FrameRefType::None,
        (true, false) => FrameRefType::Read,
        (false, true) => FrameRefType::PartialWrite,
        (true, true) => FrameRefType::ReadBeforeWrite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_then_write_needs_reset() {
        let r = compose_frame_refs(FrameRefType::Read, FrameRefType::PartialWrite);
        assert_eq!(r, FrameRefType::ReadBeforeWrite);
        assert_eq!(r.reset_requirement(), ResetRequirement::Reset);
    }

    #[test]
    fn complete_write_then_read() {
        let r = compose_frame_refs(FrameRefType::CompleteWrite, FrameRefType::Read);
        assert_eq!(r, FrameRefType::WriteBeforeRead);
        assert_eq!(r.reset_requirement(), ResetRequirement::NoReset);
        // nothing that follows brings back the pre-frame dependency
        assert_eq!(compose_frame_refs(r, FrameRefType::PartialWrite), FrameRefType::WriteBeforeRead);
    }

    #[test]
    fn none_is_identity() {
        for r in [
            FrameRefType::None,
            FrameRefType::CompleteWrite,
            FrameRefType::WriteBeforeRead,
            FrameRefType::PartialWrite,
            FrameRefType::Read,
            FrameRefType::ReadBeforeWrite,
            FrameRefType::Unknown,
        ] {
            assert_eq!(compose_frame_refs(FrameRefType::None, r), r);
            assert_eq!(compose_frame_refs(r, FrameRefType::None), r);
        }
    }

    #[test]
    fn access_masks() {
        assert_eq!(ref_type_for_access(vk::AccessFlags::SHADER_READ), FrameRefType::Read);
        assert_eq!(ref_type_for_access(vk::AccessFlags::TRANSFER_WRITE), FrameRefType::PartialWrite);
        assert_eq!(
            ref_type_for_access(vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
            FrameRefType::ReadBeforeWrite
        );
        assert_eq!(ref_type_for_access(vk::AccessFlags::empty()), FrameRefType::None);
    }
}
