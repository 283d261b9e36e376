use crate::vk;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image {0:?} is not tracked")]
    UnknownImage(vk::Image),
    #[error("memory allocation {0:?} is not tracked")]
    UnknownMemory(vk::DeviceMemory),
    #[error("image {0:?} is already tracked")]
    ImageAlreadyTracked(vk::Image),
    #[error("memory allocation {0:?} is already tracked")]
    MemoryAlreadyTracked(vk::DeviceMemory),
    #[error("barrier sequence error")]
    BarrierSequence(#[from] BarrierSequenceError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BarrierSequenceError {
    #[error("batch index {index} is out of range (at most {max} batches)")]
    BatchOutOfRange { index: usize, max: usize },
    #[error("barriers can't be submitted to reserved queue family {0:#x}")]
    ReservedQueueFamily(u32),
}
