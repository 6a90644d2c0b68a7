//! Texture descriptions and the view handle bound into render graphs.

use ash::vk;
use ash::vk::Handle;
use enumflags2::{bitflags, BitFlags};
use crate::barrier::TextureState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn to_vk(self) -> vk::Extent2D {
        vk::Extent2D { width: self.width, height: self.height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Default for Extent3D {
    fn default() -> Self {
        Self { width: 1, height: 1, depth: 1 }
    }
}

impl Extent3D {
    pub fn to_vk(self) -> vk::Extent3D {
        vk::Extent3D { width: self.width, height: self.height, depth: self.depth }
    }
}

impl From<Extent2D> for Extent3D {
    fn from(value: Extent2D) -> Self {
        Self { width: value.width, height: value.height, depth: 1 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8UNorm,
    RG8UNorm,
    #[default]
    RGBA8UNorm,
    RGBA8Srgb,
    BGRA8UNorm,
    BGRA8Srgb,
    R16Float,
    RG16Float,
    RGBA16Float,
    R32Float,
    RG32Float,
    RGBA32Float,
    R32UInt,
    RGB10A2UNorm,
    RG11B10Float,
    D16UNorm,
    D32Float,
    D24UNormS8UInt,
    D32FloatS8UInt,
}

impl TextureFormat {
    pub fn to_vk(self) -> vk::Format {
        match self {
            TextureFormat::R8UNorm => vk::Format::R8_UNORM,
            TextureFormat::RG8UNorm => vk::Format::R8G8_UNORM,
            TextureFormat::RGBA8UNorm => vk::Format::R8G8B8A8_UNORM,
            TextureFormat::RGBA8Srgb => vk::Format::R8G8B8A8_SRGB,
            TextureFormat::BGRA8UNorm => vk::Format::B8G8R8A8_UNORM,
            TextureFormat::BGRA8Srgb => vk::Format::B8G8R8A8_SRGB,
            TextureFormat::R16Float => vk::Format::R16_SFLOAT,
            TextureFormat::RG16Float => vk::Format::R16G16_SFLOAT,
            TextureFormat::RGBA16Float => vk::Format::R16G16B16A16_SFLOAT,
            TextureFormat::R32Float => vk::Format::R32_SFLOAT,
            TextureFormat::RG32Float => vk::Format::R32G32_SFLOAT,
            TextureFormat::RGBA32Float => vk::Format::R32G32B32A32_SFLOAT,
            TextureFormat::R32UInt => vk::Format::R32_UINT,
            TextureFormat::RGB10A2UNorm => vk::Format::A2B10G10R10_UNORM_PACK32,
            TextureFormat::RG11B10Float => vk::Format::B10G11R11_UFLOAT_PACK32,
            TextureFormat::D16UNorm => vk::Format::D16_UNORM,
            TextureFormat::D32Float => vk::Format::D32_SFLOAT,
            TextureFormat::D24UNormS8UInt => vk::Format::D24_UNORM_S8_UINT,
            TextureFormat::D32FloatS8UInt => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::D16UNorm
                | TextureFormat::D32Float
                | TextureFormat::D24UNormS8UInt
                | TextureFormat::D32FloatS8UInt
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, TextureFormat::D24UNormS8UInt | TextureFormat::D32FloatS8UInt)
    }

    pub fn aspect(self) -> vk::ImageAspectFlags {
        if self.has_stencil() {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else if self.is_depth() {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::COLOR
        }
    }
}

#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    Sampled = 1 << 0,
    Storage = 1 << 1,
    ColorAttachment = 1 << 2,
    DepthStencilAttachment = 1 << 3,
    TransferSrc = 1 << 4,
    TransferDst = 1 << 5,
}

pub type TextureUsages = BitFlags<TextureUsage>;

pub fn texture_usages_to_vk(usages: TextureUsages) -> vk::ImageUsageFlags {
    usages.iter().fold(vk::ImageUsageFlags::empty(), |acc, usage| {
        acc | match usage {
            TextureUsage::Sampled => vk::ImageUsageFlags::SAMPLED,
            TextureUsage::Storage => vk::ImageUsageFlags::STORAGE,
            TextureUsage::ColorAttachment => vk::ImageUsageFlags::COLOR_ATTACHMENT,
            TextureUsage::DepthStencilAttachment => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            TextureUsage::TransferSrc => vk::ImageUsageFlags::TRANSFER_SRC,
            TextureUsage::TransferDst => vk::ImageUsageFlags::TRANSFER_DST,
        }
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    #[default]
    D2,
    D3,
    Cube,
}

/// Texture descriptor for creating GPU textures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub name: String,
    pub format: TextureFormat,
    pub extent: Extent3D,
    pub usage: TextureUsages,
    pub dimension: TextureDimension,
    pub mip_levels: u32,
    pub array_layers: u32,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            format: TextureFormat::RGBA8UNorm,
            extent: Extent3D::default(),
            usage: TextureUsage::Sampled.into(),
            dimension: TextureDimension::D2,
            mip_levels: 1,
            array_layers: 1,
        }
    }
}

impl TextureDesc {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(name: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            name: name.to_owned(),
            format,
            extent: Extent3D { width, height, depth: 1 },
            ..Default::default()
        }
    }

    /// Create a new 3D texture descriptor.
    pub fn new_3d(name: &str, width: u32, height: u32, depth: u32, format: TextureFormat) -> Self {
        Self {
            name: name.to_owned(),
            format,
            extent: Extent3D { width, height, depth },
            dimension: TextureDimension::D3,
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_dimension(mut self, dimension: TextureDimension) -> Self {
        self.dimension = dimension;
        if dimension == TextureDimension::Cube {
            self.array_layers = 6;
        }
        self
    }
}

/// A non-owning handle to a texture view plus the state the texture was last left in.
///
/// The render graph seeds its barrier walk from `state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageView {
    pub handle: u64,
    pub format: TextureFormat,
    pub extent: Extent3D,
    pub state: TextureState,
}

impl ImageView {
    pub fn new(handle: u64, format: TextureFormat, extent: Extent3D) -> Self {
        Self { handle, format, extent, state: TextureState::Undefined }
    }

    pub fn with_state(mut self, state: TextureState) -> Self {
        self.state = state;
        self
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        vk::Image::from_raw(self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_report_aspect() {
        assert!(TextureFormat::D32Float.is_depth());
        assert!(!TextureFormat::RGBA8UNorm.is_depth());
        assert_eq!(TextureFormat::D32Float.aspect(), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            TextureFormat::D24UNormS8UInt.aspect(),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(TextureFormat::RGBA16Float.aspect(), vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn usages_translate_to_vk() {
        let usage = TextureUsage::ColorAttachment | TextureUsage::Sampled;
        assert_eq!(
            texture_usages_to_vk(usage),
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED
        );
    }

    #[test]
    fn cube_dimension_sets_six_layers() {
        let desc = TextureDesc::new_2d("sky", 512, 512, TextureFormat::RGBA16Float)
            .with_dimension(TextureDimension::Cube);
        assert_eq!(desc.array_layers, 6);
    }
}
