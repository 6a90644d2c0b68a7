//! Pre-built shader resource sets bound into render graphs.

use ash::vk;
use ash::vk::Handle;

/// A descriptor set built outside the render graph.
///
/// The graph only forwards it to the executor, no state transition is tracked for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderResourceSet {
    pub handle: u64,
    pub set_index: u32,
}

impl ShaderResourceSet {
    pub fn new(handle: u64, set_index: u32) -> Self {
        Self { handle, set_index }
    }

    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        vk::DescriptorSet::from_raw(self.handle)
    }
}
