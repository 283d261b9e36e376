use crate::{aspects_for_format, vk};

/// Layout of subresources that haven't been observed yet.
///
/// Not a valid Vulkan layout: it never ends up in an emitted barrier.
pub const UNKNOWN_PREV_IMG_LAYOUT: vk::ImageLayout = vk::ImageLayout::from_raw(0x7fff_ffff);

/// `VK_QUEUE_FAMILY_EXTERNAL`
pub const QUEUE_FAMILY_EXTERNAL: u32 = !1;
/// `VK_QUEUE_FAMILY_FOREIGN_EXT`
pub const QUEUE_FAMILY_FOREIGN: u32 = !2;

/// Returns whether the queue family index designates a queue outside of the device.
pub fn is_external_queue_family(index: u32) -> bool {
    index == QUEUE_FAMILY_EXTERNAL || index == QUEUE_FAMILY_FOREIGN
}

/// Image aspects in the order used to index the aspect dimension of subresource maps.
pub const ORDERED_ASPECTS: [vk::ImageAspectFlags; 6] = [
    vk::ImageAspectFlags::COLOR,
    vk::ImageAspectFlags::DEPTH,
    vk::ImageAspectFlags::STENCIL,
    vk::ImageAspectFlags::PLANE_0,
    vk::ImageAspectFlags::PLANE_1,
    vk::ImageAspectFlags::PLANE_2,
];

/// Iterates over the individual aspect bits of `mask`, in `ORDERED_ASPECTS` order.
pub fn aspect_bits(mask: vk::ImageAspectFlags) -> impl Iterator<Item = vk::ImageAspectFlags> + Clone {
    ORDERED_ASPECTS.into_iter().filter(move |a| mask.contains(*a))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    Image1D,
    Image2D,
    Image3D,
}

impl ImageType {
    pub const fn to_vk_image_type(self) -> vk::ImageType {
        match self {
            Self::Image1D => vk::ImageType::TYPE_1D,
            Self::Image2D => vk::ImageType::TYPE_2D,
            Self::Image3D => vk::ImageType::TYPE_3D,
        }
    }

    pub fn from_vk_image_type(ty: vk::ImageType) -> ImageType {
        match ty {
            vk::ImageType::TYPE_1D => ImageType::Image1D,
            vk::ImageType::TYPE_3D => ImageType::Image3D,
            _ => ImageType::Image2D,
        }
    }
}

impl From<ImageType> for vk::ImageType {
    fn from(ty: ImageType) -> Self {
        ty.to_vk_image_type()
    }
}

/// Immutable description of a tracked image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub image_type: ImageType,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub level_count: u32,
    pub layer_count: u32,
    pub sharing_mode: vk::SharingMode,
    /// All aspects of the image, derived from the format.
    pub aspects: vk::ImageAspectFlags,
}

impl ImageInfo {
    pub fn new(
        image_type: ImageType,
        format: vk::Format,
        extent: vk::Extent3D,
        level_count: u32,
        layer_count: u32,
        sharing_mode: vk::SharingMode,
    ) -> ImageInfo {
        ImageInfo {
            image_type,
            format,
            extent,
            level_count: level_count.max(1),
            layer_count: layer_count.max(1),
            sharing_mode,
            aspects: aspects_for_format(format),
        }
    }

    pub fn from_create_info(create_info: &vk::ImageCreateInfo) -> ImageInfo {
        ImageInfo::new(
            ImageType::from_vk_image_type(create_info.image_type),
            create_info.format,
            create_info.extent,
            create_info.mip_levels,
            create_info.array_layers,
            create_info.sharing_mode,
        )
    }

    /// Number of depth slices tracked separately (the depth of 3D images, 1 otherwise).
    pub fn slice_count(&self) -> u32 {
        match self.image_type {
            ImageType::Image3D => self.extent.depth.max(1),
            _ => 1,
        }
    }

    pub fn aspect_count(&self) -> u32 {
        aspect_bits(self.aspects).count() as u32
    }

    /// Index of `aspect` in the aspect dimension of the image, if the image has it.
    pub fn aspect_index(&self, aspect: vk::ImageAspectFlags) -> Option<u32> {
        aspect_bits(self.aspects).position(|a| a == aspect).map(|i| i as u32)
    }

    /// Aspect bit at `index` in the aspect dimension of the image.
    ///
    /// # Panics
    ///
    /// If `index >= self.aspect_count()`.
    pub fn aspect_at(&self, index: u32) -> vk::ImageAspectFlags {
        aspect_bits(self.aspects)
            .nth(index as usize)
            .expect("aspect index out of range")
    }

    pub fn is_depth_stencil(&self) -> bool {
        self.aspects
            .contains(vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL)
    }

    pub fn is_concurrent(&self) -> bool {
        self.sharing_mode == vk::SharingMode::CONCURRENT
    }

    /// The range covering every subresource of the image.
    pub fn full_range(&self) -> ImageSubresourceRange {
        ImageSubresourceRange {
            aspect_mask: self.aspects,
            base_mip_level: 0,
            level_count: self.level_count,
            base_array_layer: 0,
            layer_count: self.layer_count,
            base_depth_slice: 0,
            slice_count: self.slice_count(),
        }
    }

    /// Resolves `REMAINING_*` counts, clamps the range to the image and drops aspects the image
    /// doesn't have.
    ///
    /// The result may be empty if the range lies outside of the image.
    pub fn clamp_range(&self, range: &ImageSubresourceRange) -> ImageSubresourceRange {
        fn clamp(base: u32, count: u32, total: u32) -> (u32, u32) {
            let base = base.min(total);
            let count = if count == vk::REMAINING_MIP_LEVELS {
                total - base
            } else {
                count.min(total - base)
            };
            (base, count)
        }

        let (base_mip_level, level_count) = clamp(range.base_mip_level, range.level_count, self.level_count);
        let (base_array_layer, layer_count) = clamp(range.base_array_layer, range.layer_count, self.layer_count);
        let (base_depth_slice, slice_count) = clamp(range.base_depth_slice, range.slice_count, self.slice_count());
        // `COLOR` on a multi-planar image refers to all planes
        let aspect_mask = if range.aspect_mask.contains(vk::ImageAspectFlags::COLOR)
            && self.aspects.contains(vk::ImageAspectFlags::PLANE_0)
        {
            self.aspects
        } else {
            range.aspect_mask & self.aspects
        };
        ImageSubresourceRange {
            aspect_mask,
            base_mip_level,
            level_count,
            base_array_layer,
            layer_count,
            base_depth_slice,
            slice_count,
        }
    }
}

/// Describe a subresource range of an image.
///
/// Same as VkImageSubresourceRange, but implements Eq and PartialEq, and has an additional depth
/// slice range for 3D images.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImageSubresourceRange {
    pub aspect_mask: vk::ImageAspectFlags,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
    pub base_depth_slice: u32,
    pub slice_count: u32,
}

impl ImageSubresourceRange {
    /// A range over the given aspects, covering all levels, layers and slices.
    pub fn whole(aspect_mask: vk::ImageAspectFlags) -> ImageSubresourceRange {
        ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
            base_depth_slice: 0,
            slice_count: vk::REMAINING_ARRAY_LAYERS,
        }
    }

    /// Restricts the range to the given mip levels.
    pub fn levels(mut self, base: u32, count: u32) -> ImageSubresourceRange {
        self.base_mip_level = base;
        self.level_count = count;
        self
    }

    /// Restricts the range to the given array layers.
    pub fn layers(mut self, base: u32, count: u32) -> ImageSubresourceRange {
        self.base_array_layer = base;
        self.layer_count = count;
        self
    }

    /// Restricts the range to the given depth slices.
    pub fn slices(mut self, base: u32, count: u32) -> ImageSubresourceRange {
        self.base_depth_slice = base;
        self.slice_count = count;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.aspect_mask.is_empty() || self.level_count == 0 || self.layer_count == 0 || self.slice_count == 0
    }

    /// Returns whether the two ranges share at least one subresource.
    ///
    /// Both ranges must be clamped to the same image.
    pub fn overlaps(&self, other: &ImageSubresourceRange) -> bool {
        fn overlap(a_base: u32, a_count: u32, b_base: u32, b_count: u32) -> bool {
            let a_end = a_base.saturating_add(a_count);
            let b_end = b_base.saturating_add(b_count);
            a_base < b_end && b_base < a_end
        }
        self.aspect_mask.intersects(other.aspect_mask)
            && overlap(self.base_mip_level, self.level_count, other.base_mip_level, other.level_count)
            && overlap(self.base_array_layer, self.layer_count, other.base_array_layer, other.layer_count)
            && overlap(self.base_depth_slice, self.slice_count, other.base_depth_slice, other.slice_count)
    }

    /// Subresources in both ranges. Both ranges must be clamped to the same image.
    pub fn intersection(&self, other: &ImageSubresourceRange) -> ImageSubresourceRange {
        fn intersect(a_base: u32, a_count: u32, b_base: u32, b_count: u32) -> (u32, u32) {
            let base = a_base.max(b_base);
            let end = a_base.saturating_add(a_count).min(b_base.saturating_add(b_count));
            (base, end.saturating_sub(base))
        }
        let (base_mip_level, level_count) =
            intersect(self.base_mip_level, self.level_count, other.base_mip_level, other.level_count);
        let (base_array_layer, layer_count) =
            intersect(self.base_array_layer, self.layer_count, other.base_array_layer, other.layer_count);
        let (base_depth_slice, slice_count) =
            intersect(self.base_depth_slice, self.slice_count, other.base_depth_slice, other.slice_count);
        ImageSubresourceRange {
            aspect_mask: self.aspect_mask & other.aspect_mask,
            base_mip_level,
            level_count,
            base_array_layer,
            layer_count,
            base_depth_slice,
            slice_count,
        }
    }

    pub fn to_vk(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask,
            base_mip_level: self.base_mip_level,
            level_count: self.level_count,
            base_array_layer: self.base_array_layer,
            layer_count: self.layer_count,
        }
    }
}

impl From<vk::ImageSubresourceRange> for ImageSubresourceRange {
    fn from(range: vk::ImageSubresourceRange) -> Self {
        ImageSubresourceRange {
            aspect_mask: range.aspect_mask,
            base_mip_level: range.base_mip_level,
            level_count: range.level_count,
            base_array_layer: range.base_array_layer,
            layer_count: range.layer_count,
            base_depth_slice: 0,
            slice_count: vk::REMAINING_ARRAY_LAYERS,
        }
    }
}
