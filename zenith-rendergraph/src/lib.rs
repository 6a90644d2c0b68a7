//! Per-frame render graph: dependency inference, queue-aware scheduling and barrier synthesis.

mod allocator;
mod attachment;
mod barrier;
mod binding;
mod command;
mod config;
mod container;
mod dependency;
mod executor;
mod graph;
mod scheduler;
mod symbol;
mod task;

pub use attachment::{
    AttachmentType, InputAttachment, OutputAttachment,
    LoadOp, SizeClass,
};
pub use barrier::{
    BarrierSet, BufferTransition, TextureTransition,
    Hazard, ResourceState,
};
pub use binding::{
    BufferBinding, BufferKind, ResourceBinding, ResourceBindingTable,
    ResourceFlag, ResourceFlags, ResourceInfo, ResourceUsage,
};
pub use command::{Command, CommandList, IndexType};
pub use config::{RenderGraphConfig, RenderGraphConfigBuilder, RenderGraphConfigBuilderError};
pub use container::TaskContainer;
pub use dependency::{find_cycle, DependencyEdge, DependencyList};
pub use executor::{Executor, TaskExecutionContext};
pub use graph::{
    RenderGraph, CompiledRenderGraph, RetiredRenderGraph,
};
pub use symbol::{ResourceName, SymbolTable};
pub use task::{
    ComputePipelineDesc, GraphicPipelineDesc, PipelineDesc,
    DepthStencilInfo, DepthStencilInfoBuilder, DepthStencilInfoBuilderError,
    Task, TaskCallback, TaskDirty, TaskDirtyFlags, TaskId, TaskKind,
};
