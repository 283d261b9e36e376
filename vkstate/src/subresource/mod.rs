//! Sparse per-subresource state storage.
//!
//! A [`SubresourceMap`] holds one value per *group* of subresources: along each of the four
//! dimensions (aspect, mip level, array layer, depth slice), the map is either split, storing one
//! value per index, or unsplit, storing a single value shared by the whole dimension. Maps start
//! fully unsplit and are split lazily when a sub-range diverges from the rest of the image.
mod index;

pub use index::*;

use crate::{aspect_bits, vk, ImageInfo, ImageSubresourceRange};
use tracing::trace;

/// Per-subresource values of an image.
///
/// Invariant: `values.len() == shape.value_count()`, and two subresources share a value iff their
/// coordinates are equal along every split dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct SubresourceMap<T> {
    info: ImageInfo,
    shape: MapShape,
    values: Vec<T>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Iterator over the groups of a map that intersect a subresource range.
///
/// Yields the range covered by each group along with the position of its value. Along unsplit
/// dimensions, the range of a group covers the whole dimension, which may extend beyond the
/// requested range.
#[derive(Clone, Debug)]
pub struct RangeGroups {
    info: ImageInfo,
    shape: MapShape,
    /// Aspect indices left to visit (bit `i` set for index `i`).
    aspect_set: u32,
    /// Stored index ranges along levels, layers and slices (entry 0 unused).
    bounds: [(u32, u32); 4],
    current: [u32; 4],
    done: bool,
}

impl RangeGroups {
    fn new(info: &ImageInfo, shape: &MapShape, range: &ImageSubresourceRange) -> RangeGroups {
        let range = info.clamp_range(range);

        let mut aspect_set = 0u32;
        if !range.is_empty() {
            if shape.is_split(0) {
                for (i, aspect) in aspect_bits(info.aspects).enumerate() {
                    if range.aspect_mask.contains(aspect) {
                        aspect_set |= 1 << i;
                    }
                }
            } else {
                aspect_set = 1;
            }
        }

        let bound = |dim: usize, base: u32, count: u32| {
            if shape.is_split(dim) {
                (base, base + count)
            } else {
                (0, 1)
            }
        };
        let bounds = [
            (0, 0),
            bound(1, range.base_mip_level, range.level_count),
            bound(2, range.base_array_layer, range.layer_count),
            bound(3, range.base_depth_slice, range.slice_count),
        ];

        RangeGroups {
            info: *info,
            shape: *shape,
            aspect_set,
            bounds,
            current: [aspect_set.trailing_zeros(), bounds[1].0, bounds[2].0, bounds[3].0],
            done: aspect_set == 0,
        }
    }

    fn group_range(&self, coord: SubresourceIndex) -> ImageSubresourceRange {
        let extent = |dim: usize, x: u32| {
            if self.shape.is_split(dim) {
                (x, 1)
            } else {
                (0, self.shape.counts[dim])
            }
        };
        let (base_mip_level, level_count) = extent(1, coord.level);
        let (base_array_layer, layer_count) = extent(2, coord.layer);
        let (base_depth_slice, slice_count) = extent(3, coord.slice);
        ImageSubresourceRange {
            aspect_mask: if self.shape.is_split(0) {
                self.info.aspect_at(coord.aspect)
            } else {
                self.info.aspects
            },
            base_mip_level,
            level_count,
            base_array_layer,
            layer_count,
            base_depth_slice,
            slice_count,
        }
    }

    fn advance(&mut self) {
        for d in (1..4).rev() {
            self.current[d] += 1;
            if self.current[d] < self.bounds[d].1 {
                return;
            }
            self.current[d] = self.bounds[d].0;
        }
        let remaining = self.aspect_set & !((2u32 << self.current[0]) - 1);
        if remaining == 0 {
            self.done = true;
        } else {
            self.current[0] = remaining.trailing_zeros();
        }
    }
}

impl Iterator for RangeGroups {
    type Item = (ImageSubresourceRange, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let coord = SubresourceIndex::from_array(self.current);
        // empty ranges along levels/layers/slices
        if (1..4).any(|d| self.bounds[d].0 >= self.bounds[d].1) {
            self.done = true;
            return None;
        }
        let item = (self.group_range(coord), compute_flat_index(coord, &self.shape));
        self.advance();
        Some(item)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

impl<T: Clone + PartialEq> SubresourceMap<T> {
    /// Creates a fully unsplit map where every subresource has the given value.
    pub fn new(info: ImageInfo, value: T) -> SubresourceMap<T> {
        let shape = MapShape::new(
            info.aspect_count(),
            info.level_count,
            info.layer_count,
            info.slice_count(),
        );
        SubresourceMap {
            info,
            shape,
            values: vec![value],
        }
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn shape(&self) -> &MapShape {
        &self.shape
    }

    pub fn split_flags(&self) -> SplitFlags {
        self.shape.split
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn value(&self, index: usize) -> &T {
        &self.values[index]
    }

    fn subresource_index(&self, aspect: vk::ImageAspectFlags, level: u32, layer: u32, slice: u32) -> SubresourceIndex {
        let aspect = self
            .info
            .aspect_index(aspect)
            .unwrap_or_else(|| panic!("image has no {:?} aspect", aspect));
        assert!(
            level < self.shape.counts[1] && layer < self.shape.counts[2] && slice < self.shape.counts[3],
            "subresource out of range"
        );
        SubresourceIndex::new(aspect, level, layer, slice)
    }

    /// Value of a single subresource.
    ///
    /// # Panics
    ///
    /// If the subresource isn't part of the image.
    pub fn subresource_value(&self, aspect: vk::ImageAspectFlags, level: u32, layer: u32, slice: u32) -> &T {
        let coord = self.subresource_index(aspect, level, layer, slice);
        &self.values[compute_flat_index(coord, &self.shape)]
    }

    /// Sets the value of a single subresource, splitting the map if needed.
    pub fn set_subresource_value(
        &mut self,
        aspect: vk::ImageAspectFlags,
        level: u32,
        layer: u32,
        slice: u32,
        value: T,
    ) {
        // validates the coordinates
        self.subresource_index(aspect, level, layer, slice);
        let range = ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: level,
            level_count: 1,
            base_array_layer: layer,
            layer_count: 1,
            base_depth_slice: slice,
            slice_count: 1,
        };
        self.update_range(&range, |_| value.clone());
    }

    /// Sets every subresource to `value` and collapses the map to a single entry.
    pub fn fill(&mut self, value: T) {
        self.shape = self.shape.with_split(SplitFlags::empty());
        self.values.clear();
        self.values.push(value);
    }

    /// Splits the given dimensions.
    ///
    /// Every subresource keeps its value: values are replicated along the newly split dimensions.
    pub fn split(&mut self, flags: SplitFlags) {
        let new_flags = flags - self.shape.split;
        if new_flags.is_empty() {
            return;
        }
        let old_shape = self.shape;
        let new_shape = old_shape.with_split(old_shape.split | new_flags);
        let new_len = new_shape.value_count();
        trace!(
            from = ?old_shape.split,
            to = ?new_shape.split,
            len = new_len,
            "splitting subresource map"
        );

        let fill = self.values[0].clone();
        self.values.resize(new_len, fill);
        // Walk backwards: the source of a value never comes after its destination,
        // so sources are read before being overwritten.
        for new_index in (0..new_len).rev() {
            let coord = coordinate_from_flat_index(new_index, &new_shape);
            let old_index = compute_flat_index(coord, &old_shape);
            if old_index != new_index {
                self.values[new_index] = self.values[old_index].clone();
            }
        }
        self.shape = new_shape;
    }

    /// Collapses the given dimensions, keeping the value at index 0 along each of them.
    ///
    /// The values along collapsed dimensions are assumed to be equal; the others are discarded.
    pub fn unsplit_dims(&mut self, flags: SplitFlags) {
        let removed = flags & self.shape.split;
        if removed.is_empty() {
            return;
        }
        let old_shape = self.shape;
        let new_shape = old_shape.with_split(old_shape.split - removed);
        let new_len = new_shape.value_count();
        trace!(
            from = ?old_shape.split,
            to = ?new_shape.split,
            len = new_len,
            "unsplitting subresource map"
        );

        for new_index in 0..new_len {
            let coord = coordinate_from_flat_index(new_index, &new_shape);
            let old_index = compute_flat_index(coord, &old_shape);
            if old_index != new_index {
                self.values[new_index] = self.values[old_index].clone();
            }
        }
        self.values.truncate(new_len);
        self.shape = new_shape;
    }

    /// Returns whether the values don't depend on the coordinate along `dim`.
    fn is_uniform_along(&self, dim: usize) -> bool {
        (0..self.values.len()).all(|i| {
            let mut c = coordinate_from_flat_index(i, &self.shape).to_array();
            if c[dim] == 0 {
                return true;
            }
            c[dim] = 0;
            self.values[i] == self.values[compute_flat_index(SubresourceIndex::from_array(c), &self.shape)]
        })
    }

    /// Collapses every split dimension along which all values are equal.
    pub fn unsplit(&mut self) {
        let mut collapsible = SplitFlags::empty();
        for (dim, flag) in DIMENSIONS.iter().enumerate() {
            if self.shape.split.contains(*flag) && self.is_uniform_along(dim) {
                collapsible |= *flag;
            }
        }
        self.unsplit_dims(collapsible);
    }

    /// Dimensions that `range` covers only partially and that aren't split yet.
    fn dims_to_split_for(&self, range: &ImageSubresourceRange) -> SplitFlags {
        let range = self.info.clamp_range(range);
        let mut flags = SplitFlags::empty();
        if range.is_empty() {
            return flags;
        }
        if range.aspect_mask != self.info.aspects {
            flags |= SplitFlags::ASPECTS;
        }
        let partial = |dim: usize, base: u32, count: u32| base != 0 || count != self.shape.counts[dim];
        if partial(1, range.base_mip_level, range.level_count) {
            flags |= SplitFlags::LEVELS;
        }
        if partial(2, range.base_array_layer, range.layer_count) {
            flags |= SplitFlags::LAYERS;
        }
        if partial(3, range.base_depth_slice, range.slice_count) {
            flags |= SplitFlags::DEPTH;
        }
        flags - self.shape.split
    }

    /// Splits the map so that no group straddles the boundary of `range`.
    pub fn split_for_range(&mut self, range: &ImageSubresourceRange) {
        let flags = self.dims_to_split_for(range);
        self.split(flags);
    }

    /// Groups intersecting `range`, with the positions of their values.
    pub fn groups(&self, range: &ImageSubresourceRange) -> RangeGroups {
        RangeGroups::new(&self.info, &self.shape, range)
    }

    /// Iterates over all groups of the map.
    pub fn iter(&self) -> impl Iterator<Item = (ImageSubresourceRange, &T)> + '_ {
        self.range_iter(&self.info.full_range())
    }

    /// Iterates over the groups intersecting `range`.
    pub fn range_iter(&self, range: &ImageSubresourceRange) -> impl Iterator<Item = (ImageSubresourceRange, &T)> + '_ {
        self.groups(range).map(move |(r, i)| (r, &self.values[i]))
    }

    /// Calls `f` on the value of every group intersecting `range`.
    pub fn for_each_in_range_mut(&mut self, range: &ImageSubresourceRange, mut f: impl FnMut(&ImageSubresourceRange, &mut T)) {
        for (r, i) in self.groups(range) {
            f(&r, &mut self.values[i]);
        }
    }

    /// Replaces the value of every subresource in `range` by `f(value)`.
    ///
    /// The map is split only if `f` changes at least one value. Returns whether anything changed.
    pub fn update_range(&mut self, range: &ImageSubresourceRange, mut f: impl FnMut(&T) -> T) -> bool {
        let diverges = self.range_iter(range).any(|(_, v)| f(v) != *v);
        if !diverges {
            return false;
        }
        self.split_for_range(range);
        for (_, i) in self.groups(range) {
            let v = f(&self.values[i]);
            self.values[i] = v;
        }
        true
    }
}
