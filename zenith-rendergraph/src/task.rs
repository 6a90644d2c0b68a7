use std::fmt;
use std::sync::Arc;
use derive_builder::Builder;
use enumflags2::{bitflags, BitFlags};
use zenith_core::log::warn;
use zenith_rhi::{vk, PipelineStage, PipelineStages};
use crate::attachment::{AttachmentType, InputAttachment, OutputAttachment};
use crate::command::CommandList;
use crate::executor::TaskExecutionContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Graphics,
    Compute,
    AsyncCompute,
}

impl TaskKind {
    pub(crate) const COUNT: usize = 3;

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            TaskKind::Graphics => 0,
            TaskKind::Compute => 1,
            TaskKind::AsyncCompute => 2,
        }
    }

    /// Shader stages a task of this kind touches descriptors from.
    pub fn shader_stages(self) -> PipelineStages {
        match self {
            TaskKind::Graphics => (PipelineStage::VertexShader | PipelineStage::FragmentShader).into(),
            TaskKind::Compute | TaskKind::AsyncCompute => PipelineStage::ComputeShader.into(),
        }
    }
}

/// Stable handle of a task inside its per-kind list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub kind: TaskKind,
    pub index: u32,
}

impl TaskId {
    pub fn new(kind: TaskKind, index: u32) -> Self {
        Self { kind, index }
    }
}

/// Per-task state a backend has to rebuild after a binding changed.
#[bitflags]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskDirty {
    Framebuffer = 1 << 0,
    Descriptors = 1 << 1,
}

pub type TaskDirtyFlags = BitFlags<TaskDirty>;

#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct DepthStencilInfo {
    #[builder(default = "true")]
    pub depth_test_enable: bool,
    #[builder(default = "true")]
    pub depth_write_enable: bool,
    #[builder(default = "vk::CompareOp::LESS")]
    pub depth_compare_op: vk::CompareOp,
    #[builder(default = "1.0")]
    pub depth_clear_value: f32,
    #[builder(default)]
    pub stencil_test_enable: bool,
    #[builder(default)]
    pub stencil_front: vk::StencilOpState,
    #[builder(default)]
    pub stencil_back: vk::StencilOpState,
}

impl Default for DepthStencilInfo {
    fn default() -> Self {
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: vk::CompareOp::LESS,
            depth_clear_value: 1.0,
            stencil_test_enable: false,
            stencil_front: vk::StencilOpState::default(),
            stencil_back: vk::StencilOpState::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GraphicPipelineDesc {
    pub vertex_shader: Option<String>,
    pub fragment_shader: Option<String>,
    pub topology: vk::PrimitiveTopology,
    pub cull_mode: vk::CullModeFlags,
    pub depth_stencil: Option<DepthStencilInfo>,
}

impl Default for GraphicPipelineDesc {
    fn default() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            cull_mode: vk::CullModeFlags::BACK,
            depth_stencil: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComputePipelineDesc {
    pub shader: Option<String>,
}

#[derive(Clone, Debug)]
pub enum PipelineDesc {
    Graphic(GraphicPipelineDesc),
    Compute(ComputePipelineDesc),
}

impl PipelineDesc {
    /// Pipelines without depth state write depth by default.
    pub fn depth_write_enabled(&self) -> bool {
        match self {
            PipelineDesc::Graphic(desc) => desc
                .depth_stencil
                .as_ref()
                .is_none_or(|info| info.depth_write_enable),
            PipelineDesc::Compute(_) => false,
        }
    }
}

pub type TaskCallback = Arc<dyn Fn(&mut TaskExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// A unit of GPU work with declared inputs and outputs.
///
/// Built by value and handed to [`crate::RenderGraph::add_task`], which resolves every attachment
/// name against the graph's symbol table.
#[derive(Clone)]
pub struct Task {
    pub(crate) name: String,
    pub(crate) kind: TaskKind,
    pub(crate) inputs: Vec<InputAttachment>,
    pub(crate) outputs: Vec<OutputAttachment>,
    pub(crate) pipeline: PipelineDesc,
    pub(crate) commands: CommandList,
    pub(crate) callback: Option<TaskCallback>,
    pub(crate) dirty: TaskDirtyFlags,
}

impl Task {
    fn new(name: &str, kind: TaskKind, pipeline: PipelineDesc) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            pipeline,
            commands: CommandList::default(),
            callback: None,
            dirty: TaskDirtyFlags::all(),
        }
    }

    pub fn graphics(name: &str) -> Self {
        Self::new(name, TaskKind::Graphics, PipelineDesc::Graphic(GraphicPipelineDesc::default()))
    }

    pub fn compute(name: &str) -> Self {
        Self::new(name, TaskKind::Compute, PipelineDesc::Compute(ComputePipelineDesc::default()))
    }

    pub fn async_compute(name: &str) -> Self {
        Self::new(name, TaskKind::AsyncCompute, PipelineDesc::Compute(ComputePipelineDesc::default()))
    }

    pub fn read(mut self, name: &str, ty: AttachmentType) -> Self {
        if let Some(existing) = self.inputs.iter().find(|input| input.name == name) {
            warn!(
                "Try to read resource[{name}] multiple time in task [{}], keep it as {:?}!",
                self.name, existing.ty
            );
            return self;
        }

        self.inputs.push(InputAttachment::new(name, ty));
        self
    }

    /// Declare a render target or depth output.
    ///
    /// Only graphics tasks own outputs; compute tasks write through storage image or buffer inputs.
    pub fn write(mut self, output: OutputAttachment) -> Self {
        assert_eq!(
            self.kind,
            TaskKind::Graphics,
            "Only graphic task can own output attachments, task [{}] writes [{}]!",
            self.name,
            output.name
        );
        assert!(
            output.ty.is_render_target() || output.ty.is_depth(),
            "Output [{}] of task [{}] must be a render target or depth!",
            output.name,
            self.name
        );

        if self.outputs.iter().any(|existing| existing.name == output.name) {
            warn!("Try to write resource[{}] multiple time in task [{}]!", output.name, self.name);
            return self;
        }

        self.outputs.push(output);
        self
    }

    pub fn with_vertex_shader(mut self, shader: &str) -> Self {
        if let PipelineDesc::Graphic(desc) = &mut self.pipeline {
            desc.vertex_shader = Some(shader.to_owned());
        }
        self
    }

    pub fn with_fragment_shader(mut self, shader: &str) -> Self {
        if let PipelineDesc::Graphic(desc) = &mut self.pipeline {
            desc.fragment_shader = Some(shader.to_owned());
        }
        self
    }

    pub fn with_compute_shader(mut self, shader: &str) -> Self {
        if let PipelineDesc::Compute(desc) = &mut self.pipeline {
            desc.shader = Some(shader.to_owned());
        }
        self
    }

    pub fn with_depth_stencil(mut self, info: DepthStencilInfo) -> Self {
        match &mut self.pipeline {
            PipelineDesc::Graphic(desc) => desc.depth_stencil = Some(info),
            PipelineDesc::Compute(_) => warn!("Compute task [{}] ignores depth stencil state!", self.name),
        }
        self
    }

    pub fn with_commands(mut self, commands: CommandList) -> Self {
        self.commands = commands;
        self
    }

    /// Run `callback` after the pre-recorded commands when the task executes.
    pub fn with_callback(
        mut self,
        callback: impl Fn(&mut TaskExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    #[inline]
    pub fn inputs(&self) -> &[InputAttachment] {
        &self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &[OutputAttachment] {
        &self.outputs
    }

    #[inline]
    pub fn pipeline(&self) -> &PipelineDesc {
        &self.pipeline
    }

    #[inline]
    pub fn commands(&self) -> &CommandList {
        &self.commands
    }

    #[inline]
    pub fn callback(&self) -> Option<&TaskCallback> {
        self.callback.as_ref()
    }

    #[inline]
    pub fn depth_write_enabled(&self) -> bool {
        self.pipeline.depth_write_enabled()
    }

    #[inline]
    pub fn dirty_flags(&self) -> TaskDirtyFlags {
        self.dirty
    }

    #[inline]
    pub fn needs_framebuffer_update(&self) -> bool {
        self.dirty.contains(TaskDirty::Framebuffer)
    }

    #[inline]
    pub fn needs_descriptor_update(&self) -> bool {
        self.dirty.contains(TaskDirty::Descriptors)
    }

    pub(crate) fn mark_dirty(&mut self, flags: TaskDirtyFlags) {
        self.dirty |= flags;
    }

    /// Acknowledge that the backend rebuilt framebuffers and descriptors of this task.
    pub fn clear_dirty(&mut self) {
        self.dirty = TaskDirtyFlags::empty();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("commands", &self.commands.len())
            .field("has_callback", &self.callback.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}
