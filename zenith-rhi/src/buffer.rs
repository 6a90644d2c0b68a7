//! Buffer handles bound into render graphs.

use ash::vk;
use ash::vk::Handle;

/// A non-owning view over a range of a GPU buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferView {
    pub handle: u64,
    pub offset: u64,
    pub size: u64,
}

impl BufferView {
    /// View covering the whole buffer.
    pub fn new(handle: u64, size: u64) -> Self {
        Self { handle, offset: 0, size }
    }

    pub fn with_range(mut self, offset: u64, size: u64) -> Self {
        self.offset = offset;
        self.size = size;
        self
    }

    #[inline]
    pub fn buffer(&self) -> vk::Buffer {
        vk::Buffer::from_raw(self.handle)
    }
}
