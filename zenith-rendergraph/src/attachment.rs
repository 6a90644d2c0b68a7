//! Attachment vocabulary shared between the recording front-end and the graph.
//!
//! The attachment type of a declaration is the only thing dependency inference and barrier
//! classification look at, so the set is closed.

use crate::symbol::ResourceName;
use zenith_rhi::{
    BufferState, Extent2D, TextureDimension, TextureFormat, TextureState, TextureUsage,
    TextureUsages,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttachmentType {
    RenderTarget1D,
    RenderTarget2D,
    RenderTarget3D,
    Depth,
    Texture1D,
    Texture2D,
    Texture3D,
    CubeMap,
    Image1D,
    Image2D,
    Image3D,
    DataBufferRO,
    DataBufferWO,
    DataBufferRW,
    UniformBuffer,
    VertexBuffer,
    IndexBuffer,
    IndirectBuffer,
    CommandPredicationBuffer,
    Sampler,
    TextureArray,
    PushConstants,
    TransferSource,
    TransferDestination,
    ShaderResourceSet,
}

impl AttachmentType {
    #[inline]
    pub fn is_render_target(self) -> bool {
        matches!(
            self,
            AttachmentType::RenderTarget1D | AttachmentType::RenderTarget2D | AttachmentType::RenderTarget3D
        )
    }

    #[inline]
    pub fn is_depth(self) -> bool {
        self == AttachmentType::Depth
    }

    pub fn is_sampled_texture(self) -> bool {
        matches!(
            self,
            AttachmentType::Texture1D
                | AttachmentType::Texture2D
                | AttachmentType::Texture3D
                | AttachmentType::CubeMap
                | AttachmentType::TextureArray
        )
    }

    pub fn is_storage_image(self) -> bool {
        matches!(self, AttachmentType::Image1D | AttachmentType::Image2D | AttachmentType::Image3D)
    }

    /// Descriptor declarations that write an image: storage images and copy destinations.
    pub(crate) fn writes_image_descriptor(self) -> bool {
        self.is_storage_image() || self == AttachmentType::TransferDestination
    }

    /// Descriptor declarations that read an image written by a previous task.
    pub(crate) fn reads_image_descriptor(self) -> bool {
        matches!(
            self,
            AttachmentType::Texture1D
                | AttachmentType::Texture2D
                | AttachmentType::Texture3D
                | AttachmentType::CubeMap
                | AttachmentType::TransferSource
        )
    }

    pub(crate) fn writes_buffer(self) -> bool {
        matches!(self, AttachmentType::DataBufferWO | AttachmentType::DataBufferRW)
    }

    pub(crate) fn consumes_buffer(self) -> bool {
        matches!(
            self,
            AttachmentType::DataBufferRO
                | AttachmentType::DataBufferRW
                | AttachmentType::VertexBuffer
                | AttachmentType::IndexBuffer
                | AttachmentType::IndirectBuffer
                | AttachmentType::CommandPredicationBuffer
        )
    }

    /// State a texture bound under this attachment must be in, or `None` for buffer-only roles.
    pub fn texture_state(self) -> Option<TextureState> {
        match self {
            AttachmentType::RenderTarget1D
            | AttachmentType::RenderTarget2D
            | AttachmentType::RenderTarget3D => Some(TextureState::Color),
            AttachmentType::Depth => Some(TextureState::DepthStencil),
            AttachmentType::Texture1D
            | AttachmentType::Texture2D
            | AttachmentType::Texture3D
            | AttachmentType::CubeMap
            | AttachmentType::TextureArray => Some(TextureState::Sampled),
            AttachmentType::Image1D
            | AttachmentType::Image2D
            | AttachmentType::Image3D => Some(TextureState::Storage),
            AttachmentType::TransferSource => Some(TextureState::TransferSrc),
            AttachmentType::TransferDestination => Some(TextureState::TransferDst),
            _ => None,
        }
    }

    /// State a buffer bound under this attachment must be in, or `None` for image-only roles.
    ///
    /// Command predication has no dedicated state and is synchronized like indirect arguments.
    pub fn buffer_state(self) -> Option<BufferState> {
        match self {
            AttachmentType::DataBufferRO => Some(BufferState::StorageRead),
            AttachmentType::DataBufferWO => Some(BufferState::StorageWrite),
            AttachmentType::DataBufferRW => Some(BufferState::StorageReadWrite),
            AttachmentType::UniformBuffer => Some(BufferState::Uniform),
            AttachmentType::VertexBuffer => Some(BufferState::Vertex),
            AttachmentType::IndexBuffer => Some(BufferState::Index),
            AttachmentType::IndirectBuffer
            | AttachmentType::CommandPredicationBuffer => Some(BufferState::Indirect),
            AttachmentType::TransferSource => Some(BufferState::TransferSrc),
            AttachmentType::TransferDestination => Some(BufferState::TransferDst),
            _ => None,
        }
    }

    /// Usage flags an internally allocated texture needs to serve this role.
    pub fn texture_usage(self) -> TextureUsages {
        match self.texture_state() {
            Some(TextureState::Color) => TextureUsage::ColorAttachment.into(),
            Some(TextureState::DepthStencil) => TextureUsage::DepthStencilAttachment.into(),
            Some(TextureState::Sampled) => TextureUsage::Sampled.into(),
            Some(TextureState::Storage) => TextureUsage::Storage.into(),
            Some(TextureState::TransferSrc) => TextureUsage::TransferSrc.into(),
            Some(TextureState::TransferDst) => TextureUsage::TransferDst.into(),
            _ => TextureUsages::empty(),
        }
    }

    pub(crate) fn texture_dimension(self) -> TextureDimension {
        match self {
            AttachmentType::RenderTarget1D | AttachmentType::Texture1D | AttachmentType::Image1D => TextureDimension::D1,
            AttachmentType::RenderTarget3D | AttachmentType::Texture3D | AttachmentType::Image3D => TextureDimension::D3,
            AttachmentType::CubeMap => TextureDimension::Cube,
            _ => TextureDimension::D2,
        }
    }
}

/// Policy deriving an internally managed texture's extent from the swapchain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SizeClass {
    #[default]
    Swapchain,
    HalfSwapchain,
    QuarterSwapchain,
    DoubleSwapchain,
    QuadrupleSwapchain,
    /// Sized and owned by the application, never allocated by the graph.
    Custom,
}

impl SizeClass {
    #[inline]
    pub fn is_managed(self) -> bool {
        self != SizeClass::Custom
    }

    /// Extent relative to `swapchain`, or `None` for [`SizeClass::Custom`].
    pub fn extent(self, swapchain: Extent2D) -> Option<Extent2D> {
        let (width, height) = (swapchain.width, swapchain.height);
        let (width, height) = match self {
            SizeClass::Swapchain => (width, height),
            SizeClass::HalfSwapchain => (width / 2, height / 2),
            SizeClass::QuarterSwapchain => (width / 4, height / 4),
            SizeClass::DoubleSwapchain => (width * 2, height * 2),
            SizeClass::QuadrupleSwapchain => (width * 4, height * 4),
            SizeClass::Custom => return None,
        };

        Some(Extent2D::new(width.max(1), height.max(1)))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    #[default]
    ClearBlack,
    ClearWhite,
    DontCare,
}

impl LoadOp {
    pub fn clear_value(self) -> Option<[f32; 4]> {
        match self {
            LoadOp::ClearBlack => Some([0.0, 0.0, 0.0, 1.0]),
            LoadOp::ClearWhite => Some([1.0, 1.0, 1.0, 1.0]),
            LoadOp::Load | LoadOp::DontCare => None,
        }
    }
}

/// A resource a task reads (or writes through a descriptor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputAttachment {
    pub name: String,
    pub ty: AttachmentType,
    pub(crate) resource: ResourceName,
}

impl InputAttachment {
    pub fn new(name: &str, ty: AttachmentType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            resource: ResourceName::INVALID,
        }
    }

    #[inline]
    pub fn resource(&self) -> ResourceName {
        self.resource
    }
}

/// A render target or depth attachment written by a graphics task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputAttachment {
    pub name: String,
    pub ty: AttachmentType,
    pub format: TextureFormat,
    pub size_class: SizeClass,
    pub load_op: LoadOp,
    pub(crate) resource: ResourceName,
}

impl OutputAttachment {
    pub fn new(
        name: &str,
        ty: AttachmentType,
        format: TextureFormat,
        size_class: SizeClass,
        load_op: LoadOp,
    ) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            format,
            size_class,
            load_op,
            resource: ResourceName::INVALID,
        }
    }

    /// Swapchain-sized color target cleared to black.
    pub fn color(name: &str, format: TextureFormat) -> Self {
        Self::new(name, AttachmentType::RenderTarget2D, format, SizeClass::Swapchain, LoadOp::ClearBlack)
    }

    /// Swapchain-sized depth target cleared to the far plane.
    pub fn depth(name: &str, format: TextureFormat) -> Self {
        Self::new(name, AttachmentType::Depth, format, SizeClass::Swapchain, LoadOp::ClearWhite)
    }

    pub fn with_size_class(mut self, size_class: SizeClass) -> Self {
        self.size_class = size_class;
        self
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    #[inline]
    pub fn resource(&self) -> ResourceName {
        self.resource
    }
}
