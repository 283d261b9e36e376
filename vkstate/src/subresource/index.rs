//! Index arithmetic of subresource maps.
//!
//! A map stores its values in a flat array, in row-major order over
//! (aspect, level, layer, slice), restricted to the dimensions that are split. An unsplit dimension
//! contributes a single stored index (0) that stands for every subresource along it.
use bitflags::bitflags;

bitflags! {
    /// Dimensions of a subresource map.
    #[repr(transparent)]
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SplitFlags: u8 {
        const ASPECTS = 0b1;
        const LEVELS = 0b10;
        const LAYERS = 0b100;
        const DEPTH = 0b1000;
    }
}

/// Dimensions, in storage order.
pub const DIMENSIONS: [SplitFlags; 4] = [
    SplitFlags::ASPECTS,
    SplitFlags::LEVELS,
    SplitFlags::LAYERS,
    SplitFlags::DEPTH,
];

/// Coordinates of a single subresource.
///
/// `aspect` is the index of the aspect in the image's aspect dimension, not an aspect bit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubresourceIndex {
    pub aspect: u32,
    pub level: u32,
    pub layer: u32,
    pub slice: u32,
}

impl SubresourceIndex {
    pub fn new(aspect: u32, level: u32, layer: u32, slice: u32) -> SubresourceIndex {
        SubresourceIndex {
            aspect,
            level,
            layer,
            slice,
        }
    }

    pub fn to_array(self) -> [u32; 4] {
        [self.aspect, self.level, self.layer, self.slice]
    }

    pub fn from_array(c: [u32; 4]) -> SubresourceIndex {
        SubresourceIndex::new(c[0], c[1], c[2], c[3])
    }
}

/// Cardinality of each dimension, and which dimensions are split.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapShape {
    /// Number of aspects, levels, layers and depth slices of the image.
    pub counts: [u32; 4],
    pub split: SplitFlags,
}

impl MapShape {
    /// Shape with no dimension split.
    pub fn new(aspect_count: u32, level_count: u32, layer_count: u32, slice_count: u32) -> MapShape {
        MapShape {
            counts: [aspect_count.max(1), level_count.max(1), layer_count.max(1), slice_count.max(1)],
            split: SplitFlags::empty(),
        }
    }

    pub fn with_split(&self, split: SplitFlags) -> MapShape {
        MapShape {
            counts: self.counts,
            split,
        }
    }

    pub fn is_split(&self, dim: usize) -> bool {
        self.split.contains(DIMENSIONS[dim])
    }

    /// Number of values stored along a dimension.
    pub fn stored_count(&self, dim: usize) -> u32 {
        if self.is_split(dim) {
            self.counts[dim]
        } else {
            1
        }
    }

    /// Number of values stored in a map of this shape.
    pub fn value_count(&self) -> usize {
        (0..4).map(|d| self.stored_count(d) as usize).product()
    }

    /// Number of subresources of the image.
    pub fn subresource_count(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).product()
    }
}

/// Position of the value of subresource `coord` in a map of the given shape.
///
/// Coordinates along unsplit dimensions are ignored.
pub fn compute_flat_index(coord: SubresourceIndex, shape: &MapShape) -> usize {
    let c = coord.to_array();
    let mut index = 0usize;
    for d in 0..4 {
        let n = shape.stored_count(d) as usize;
        let x = if shape.is_split(d) { c[d] as usize } else { 0 };
        debug_assert!(x < n, "subresource coordinate out of range");
        index = index * n + x;
    }
    index
}

/// Inverse of `compute_flat_index`. Coordinates along unsplit dimensions are 0.
pub fn coordinate_from_flat_index(index: usize, shape: &MapShape) -> SubresourceIndex {
    let mut c = [0u32; 4];
    let mut rest = index;
    for d in (0..4).rev() {
        let n = shape.stored_count(d) as usize;
        c[d] = (rest % n) as u32;
        rest /= n;
    }
    debug_assert_eq!(rest, 0, "flat index out of range");
    SubresourceIndex::from_array(c)
}
