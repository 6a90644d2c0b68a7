//! Zenith RHI (Render Hardware Interface) - backend-agnostic GPU vocabulary.
//!
//! Resource handles, pipeline stages and resource states shared by the render graph and its
//! backends, with translations into Vulkan types.

pub mod buffer;
pub mod descriptor;
pub mod device;
pub mod sampler;
pub mod texture;
mod barrier;

pub use ash::vk;
pub use buffer::BufferView;
pub use descriptor::ShaderResourceSet;
pub use device::{HeadlessDevice, RenderDevice};
pub use sampler::Sampler;
pub use texture::{
    texture_usages_to_vk, Extent2D, Extent3D, ImageView, TextureDesc, TextureDimension,
    TextureFormat, TextureUsage, TextureUsages,
};
pub use barrier::{
    BufferState, TextureState,
    PipelineStage, PipelineStages,
    BufferBarrier, TextureBarrier,
};
