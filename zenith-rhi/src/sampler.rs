//! Sampler handles bound into render graphs.

use ash::vk;
use ash::vk::Handle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sampler {
    pub handle: u64,
}

impl Sampler {
    pub fn new(handle: u64) -> Self {
        Self { handle }
    }

    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        vk::Sampler::from_raw(self.handle)
    }
}
