use ash::vk;
use enumflags2::BitFlags;
use crate::buffer::BufferView;
use crate::texture::ImageView;

#[enumflags2::bitflags]
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    TopOfPipe = 1 << 0,
    Host = 1 << 1,
    Transfer = 1 << 2,
    DrawIndirect = 1 << 3,
    VertexAttributeInput = 1 << 4,
    IndexInput = 1 << 5,
    VertexShader = 1 << 6,
    FragmentShader = 1 << 7,
    ComputeShader = 1 << 8,
    ColorAttachmentOutput = 1 << 9,
    EarlyFragmentTests = 1 << 10,
    LateFragmentTests = 1 << 11,
    BottomOfPipe = 1 << 12,
    AllCommands = 1 << 13,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PipelineStages(BitFlags<PipelineStage>);

impl PipelineStage {
    pub fn to_vk(self) -> vk::PipelineStageFlags2 {
        match self {
            PipelineStage::TopOfPipe => vk::PipelineStageFlags2::TOP_OF_PIPE,
            PipelineStage::Host => vk::PipelineStageFlags2::HOST,
            PipelineStage::Transfer => vk::PipelineStageFlags2::TRANSFER,
            PipelineStage::DrawIndirect => vk::PipelineStageFlags2::DRAW_INDIRECT,
            PipelineStage::VertexAttributeInput => vk::PipelineStageFlags2::VERTEX_ATTRIBUTE_INPUT,
            PipelineStage::IndexInput => vk::PipelineStageFlags2::INDEX_INPUT,
            PipelineStage::VertexShader => vk::PipelineStageFlags2::VERTEX_SHADER,
            PipelineStage::FragmentShader => vk::PipelineStageFlags2::FRAGMENT_SHADER,
            PipelineStage::ComputeShader => vk::PipelineStageFlags2::COMPUTE_SHADER,
            PipelineStage::ColorAttachmentOutput => vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            PipelineStage::EarlyFragmentTests => vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
            PipelineStage::LateFragmentTests => vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
            PipelineStage::BottomOfPipe => vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
            PipelineStage::AllCommands => vk::PipelineStageFlags2::ALL_COMMANDS,
        }
    }
}

impl PipelineStages {
    pub fn empty() -> Self {
        Self(BitFlags::empty())
    }

    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(self, stage: PipelineStage) -> bool {
        self.0.contains(stage)
    }

    pub fn insert(&mut self, stage: PipelineStage) {
        self.0.insert(stage);
    }

    pub fn iter(self) -> impl Iterator<Item = PipelineStage> {
        self.0.iter()
    }

    pub fn to_vk(self) -> vk::PipelineStageFlags2 {
        self.0.iter()
            .fold(vk::PipelineStageFlags2::empty(), |acc, s| acc | s.to_vk())
    }
}

impl From<PipelineStage> for PipelineStages {
    fn from(value: PipelineStage) -> Self {
        Self(BitFlags::from_flag(value))
    }
}

impl From<BitFlags<PipelineStage>> for PipelineStages {
    fn from(value: BitFlags<PipelineStage>) -> Self {
        Self(value)
    }
}

impl core::ops::BitOr for PipelineStages {
    type Output = PipelineStages;
    fn bitor(self, rhs: PipelineStages) -> Self::Output {
        PipelineStages(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for PipelineStages {
    fn bitor_assign(&mut self, rhs: PipelineStages) {
        self.0 |= rhs.0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureState {
    #[default]
    Undefined,
    TransferSrc,
    TransferDst,
    Sampled,
    Storage,
    General,
    Color,
    DepthStencil,
    Present,
}

impl TextureState {
    /// Stages touching the texture in this state; `shader_stages` is used for shader accesses.
    pub fn into_pipeline_stages(self, shader_stages: PipelineStages) -> PipelineStages {
        match self {
            TextureState::Undefined => PipelineStage::TopOfPipe.into(),
            TextureState::TransferSrc |
            TextureState::TransferDst => PipelineStage::Transfer.into(),
            TextureState::Sampled => shader_stages,
            TextureState::Storage => shader_stages,
            TextureState::General => shader_stages,
            TextureState::Color => PipelineStage::ColorAttachmentOutput.into(),
            TextureState::DepthStencil => (PipelineStage::EarlyFragmentTests | PipelineStage::LateFragmentTests).into(),
            TextureState::Present => PipelineStage::BottomOfPipe.into(),
        }
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            TextureState::TransferDst
                | TextureState::Storage
                | TextureState::General
                | TextureState::Color
                | TextureState::DepthStencil
        )
    }

    pub fn into_access_flag(self) -> vk::AccessFlags2 {
        match self {
            TextureState::Undefined => vk::AccessFlags2::NONE,
            TextureState::TransferSrc => vk::AccessFlags2::TRANSFER_READ,
            TextureState::TransferDst => vk::AccessFlags2::TRANSFER_WRITE,
            TextureState::Sampled => vk::AccessFlags2::SHADER_SAMPLED_READ,
            TextureState::Storage => vk::AccessFlags2::SHADER_STORAGE_READ | vk::AccessFlags2::SHADER_STORAGE_WRITE,
            TextureState::General => vk::AccessFlags2::MEMORY_READ | vk::AccessFlags2::MEMORY_WRITE,
            TextureState::Color => vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
            TextureState::DepthStencil => vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
            TextureState::Present => vk::AccessFlags2::NONE,
        }
    }

    pub fn into_image_layout(self) -> vk::ImageLayout {
        match self {
            TextureState::Undefined => vk::ImageLayout::UNDEFINED,
            TextureState::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            TextureState::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            TextureState::Sampled => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            TextureState::Storage => vk::ImageLayout::GENERAL,
            TextureState::General => vk::ImageLayout::GENERAL,
            TextureState::Color => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            TextureState::DepthStencil => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            TextureState::Present => vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferState {
    #[default]
    Undefined,
    HostWrite,
    TransferSrc,
    TransferDst,
    Uniform,
    StorageRead,
    StorageWrite,
    StorageReadWrite,
    Vertex,
    Index,
    Indirect,
}

impl BufferState {
    /// Stages touching the buffer in this state; `shader_stages` is used for shader accesses.
    pub fn into_pipeline_stages(self, shader_stages: PipelineStages) -> PipelineStages {
        match self {
            BufferState::Undefined => PipelineStage::TopOfPipe.into(),
            BufferState::HostWrite => PipelineStage::Host.into(),
            BufferState::TransferSrc |
            BufferState::TransferDst => PipelineStage::Transfer.into(),
            BufferState::Uniform |
            BufferState::StorageRead |
            BufferState::StorageWrite |
            BufferState::StorageReadWrite => shader_stages,
            BufferState::Vertex => PipelineStage::VertexAttributeInput.into(),
            BufferState::Index => PipelineStage::IndexInput.into(),
            BufferState::Indirect => PipelineStage::DrawIndirect.into(),
        }
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            BufferState::HostWrite
                | BufferState::TransferDst
                | BufferState::StorageWrite
                | BufferState::StorageReadWrite
        )
    }

    pub fn into_access_flag(self) -> vk::AccessFlags2 {
        match self {
            BufferState::Undefined => vk::AccessFlags2::NONE,
            BufferState::HostWrite => vk::AccessFlags2::HOST_WRITE,
            BufferState::TransferSrc => vk::AccessFlags2::TRANSFER_READ,
            BufferState::TransferDst => vk::AccessFlags2::TRANSFER_WRITE,
            BufferState::Uniform => vk::AccessFlags2::UNIFORM_READ,
            BufferState::StorageRead => vk::AccessFlags2::SHADER_STORAGE_READ,
            BufferState::StorageWrite => vk::AccessFlags2::SHADER_STORAGE_WRITE,
            BufferState::StorageReadWrite => vk::AccessFlags2::SHADER_STORAGE_READ | vk::AccessFlags2::SHADER_STORAGE_WRITE,
            BufferState::Vertex => vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
            BufferState::Index => vk::AccessFlags2::INDEX_READ,
            BufferState::Indirect => vk::AccessFlags2::INDIRECT_COMMAND_READ,
        }
    }
}

/// Layout transition of a whole texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBarrier {
    pub view: ImageView,
    pub src_state: TextureState,
    pub dst_state: TextureState,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
}

impl TextureBarrier {
    pub fn new(
        view: ImageView,
        src_state: TextureState,
        dst_state: TextureState,
        src_stage: PipelineStages,
        dst_stage: PipelineStages,
    ) -> Self {
        Self {
            view,
            src_state,
            dst_state,
            src_stage,
            dst_stage,
        }
    }

    pub fn to_vk(&self) -> vk::ImageMemoryBarrier2<'static> {
        vk::ImageMemoryBarrier2::default()
            .src_stage_mask(self.src_stage.to_vk())
            .src_access_mask(self.src_state.into_access_flag())
            .dst_stage_mask(self.dst_stage.to_vk())
            .dst_access_mask(self.dst_state.into_access_flag())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .old_layout(self.src_state.into_image_layout())
            .new_layout(self.dst_state.into_image_layout())
            .image(self.view.image())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: self.view.format.aspect(),
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            })
    }
}

/// Memory dependency over a buffer range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferBarrier {
    pub view: BufferView,
    pub src_state: BufferState,
    pub dst_state: BufferState,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
}

impl BufferBarrier {
    pub fn new(
        view: BufferView,
        src_state: BufferState,
        dst_state: BufferState,
        src_stage: PipelineStages,
        dst_stage: PipelineStages,
    ) -> Self {
        Self {
            view,
            src_state,
            dst_state,
            src_stage,
            dst_stage,
        }
    }

    pub fn to_vk(&self) -> vk::BufferMemoryBarrier2<'static> {
        vk::BufferMemoryBarrier2::default()
            .src_stage_mask(self.src_stage.to_vk())
            .src_access_mask(self.src_state.into_access_flag())
            .dst_stage_mask(self.dst_stage.to_vk())
            .dst_access_mask(self.dst_state.into_access_flag())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .buffer(self.view.buffer())
            .offset(self.view.offset)
            .size(self.view.size)
    }
}
