use std::slice;
use zenith_core::collections::hashmap::HashMap;
use zenith_core::collections::SmallVec;
use zenith_core::log::{debug, trace, warn};
use zenith_rhi::{
    vk, BufferBarrier, BufferState, BufferView, ImageView, PipelineStage, PipelineStages,
    TextureBarrier, TextureState,
};
use crate::binding::{ResourceBinding, ResourceBindingTable, ResourceFlag, ResourceInfo, ResourceUsage};
use crate::container::TaskContainer;
use crate::symbol::ResourceName;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hazard {
    ReadAfterWrite,
    WriteAfterRead,
    WriteAfterWrite,
}

impl Hazard {
    fn classify(previous_writes: bool, current_writes: bool) -> Self {
        match (previous_writes, current_writes) {
            (true, true) => Hazard::WriteAfterWrite,
            (true, false) => Hazard::ReadAfterWrite,
            (false, _) => Hazard::WriteAfterRead,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureTransition {
    pub resource: ResourceName,
    pub hazard: Hazard,
    pub barrier: TextureBarrier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferTransition {
    pub resource: ResourceName,
    pub hazard: Hazard,
    pub barrier: BufferBarrier,
}

/// Barriers to record right before the task of one order slot executes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BarrierSet {
    pub textures: SmallVec<[TextureTransition; 4]>,
    pub buffers: SmallVec<[BufferTransition; 4]>,
}

impl BarrierSet {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.buffers.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len() + self.buffers.len()
    }

    pub fn to_vk(&self) -> (Vec<vk::ImageMemoryBarrier2<'static>>, Vec<vk::BufferMemoryBarrier2<'static>>) {
        (
            self.textures.iter().map(|t| t.barrier.to_vk()).collect(),
            self.buffers.iter().map(|b| b.barrier.to_vk()).collect(),
        )
    }
}

/// State a resource is left in after the last task of the frame touching it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Texture(TextureState),
    Buffer(BufferState),
}

pub(crate) struct BarrierPlan {
    pub barriers: Vec<BarrierSet>,
    pub final_states: HashMap<ResourceName, ResourceState>,
}

struct Cursor<S> {
    state: S,
    writes: bool,
    producer: Option<usize>,
}

/// Walk the usage history of every tracked resource in final order and emit a barrier wherever
/// the required state changes.
#[profiling::function]
pub(crate) fn synthesize_barriers(tasks: &TaskContainer, resources: &ResourceBindingTable) -> BarrierPlan {
    let mut plan = BarrierPlan {
        barriers: vec![BarrierSet::default(); tasks.len()],
        final_states: HashMap::default(),
    };

    for (resource, info) in resources.iter() {
        let Some(binding) = info.binding() else {
            continue;
        };
        if info.usages().is_empty() || !binding.tracks_state() {
            continue;
        }
        if info.flags().contains(ResourceFlag::ManualBarriers) {
            trace!("Skip barriers of manually synchronized resource [{}]", resources.name_of(resource));
            continue;
        }

        let walker = BarrierWalker { tasks, resources, resource, info };
        let final_state = match binding {
            ResourceBinding::Image(view) => walker.walk_texture(slice::from_ref(view), &mut plan.barriers),
            ResourceBinding::ImageArray(views) => walker.walk_texture(views, &mut plan.barriers),
            ResourceBinding::Buffer(buffer) => walker.walk_buffer(buffer.view, &mut plan.barriers),
            ResourceBinding::Sampler(_) | ResourceBinding::ShaderResourceSet(_) => unreachable!(),
        };

        if let Some(final_state) = final_state {
            plan.final_states.insert(resource, final_state);
        }
    }

    debug!(
        "Synthesized {} barriers over {} slots",
        plan.barriers.iter().map(BarrierSet::len).sum::<usize>(),
        plan.barriers.len()
    );
    plan
}

struct BarrierWalker<'a> {
    tasks: &'a TaskContainer,
    resources: &'a ResourceBindingTable,
    resource: ResourceName,
    info: &'a ResourceInfo,
}

impl BarrierWalker<'_> {
    fn name(&self) -> &str {
        self.resources.name_of(self.resource)
    }

    /// Whether `usage` writes the resource. Depth attached to a read-only depth pipeline does not.
    fn writes(&self, usage: &ResourceUsage, state_writes: bool) -> bool {
        if usage.attachment.is_depth() {
            return state_writes && self.tasks.task_at(usage.task_index).depth_write_enabled();
        }
        state_writes
    }

    fn shader_stages(&self, position: usize) -> PipelineStages {
        self.tasks.task_at(position).kind().shader_stages()
    }

    fn barrier_slot(&self, producer: Option<usize>, consumer: usize) -> usize {
        match producer {
            Some(producer) if producer < consumer => producer + 1,
            Some(_) => {
                warn!(
                    "Resource [{}] is declared with conflicting states inside task [{}]!",
                    self.name(),
                    self.tasks.task_at(consumer).name()
                );
                consumer
            }
            None => consumer,
        }
    }

    /// Stages a state left behind by an earlier frame may still be accessed in.
    fn carried_stages(state: TextureState) -> PipelineStages {
        state.into_pipeline_stages(
            (PipelineStage::VertexShader | PipelineStage::FragmentShader | PipelineStage::ComputeShader).into(),
        )
    }

    /// Every view of an array is seeded from its own bound state.
    fn walk_texture(&self, views: &[ImageView], barriers: &mut [BarrierSet]) -> Option<ResourceState> {
        let mut usages: SmallVec<[(TextureState, bool, usize); 8]> = SmallVec::new();
        for usage in self.info.usages() {
            let Some(state) = usage.attachment.texture_state() else {
                warn!("Image [{}] is declared as {:?}, skip its barrier!", self.name(), usage.attachment);
                continue;
            };
            usages.push((state, self.writes(usage, state.is_write()), usage.task_index));
        }

        let mut final_state = None;
        for view in views {
            let mut cursor = Cursor { state: view.state, writes: view.state.is_write(), producer: None };

            for &(state, writes, task_index) in &usages {
                if state == cursor.state {
                    cursor.writes = writes;
                    cursor.producer = Some(task_index);
                    continue;
                }

                let slot = self.barrier_slot(cursor.producer, task_index);
                let src_stage = match cursor.producer {
                    Some(producer) => cursor.state.into_pipeline_stages(self.shader_stages(producer)),
                    None => Self::carried_stages(cursor.state),
                };
                let dst_stage = state.into_pipeline_stages(self.shader_stages(task_index));

                barriers[slot].textures.push(TextureTransition {
                    resource: self.resource,
                    hazard: Hazard::classify(cursor.writes, writes),
                    barrier: TextureBarrier::new(*view, cursor.state, state, src_stage, dst_stage),
                });

                cursor = Cursor { state, writes, producer: Some(task_index) };
            }

            final_state = Some(ResourceState::Texture(cursor.state));
        }

        final_state
    }

    fn walk_buffer(&self, view: BufferView, barriers: &mut [BarrierSet]) -> Option<ResourceState> {
        let mut cursor: Option<Cursor<BufferState>> = None;

        for usage in self.info.usages() {
            let Some(state) = usage.attachment.buffer_state() else {
                warn!("Buffer [{}] is declared as {:?}, skip its barrier!", self.name(), usage.attachment);
                continue;
            };
            let writes = self.writes(usage, state.is_write());

            let Some(previous) = cursor.as_mut() else {
                cursor = Some(Cursor { state, writes, producer: Some(usage.task_index) });
                continue;
            };

            if state == previous.state {
                previous.writes = writes;
                previous.producer = Some(usage.task_index);
                continue;
            }

            let slot = self.barrier_slot(previous.producer, usage.task_index);
            let src_stage = match previous.producer {
                Some(producer) => previous.state.into_pipeline_stages(self.shader_stages(producer)),
                None => PipelineStage::TopOfPipe.into(),
            };
            let dst_stage = state.into_pipeline_stages(self.shader_stages(usage.task_index));

            barriers[slot].buffers.push(BufferTransition {
                resource: self.resource,
                hazard: Hazard::classify(previous.writes, writes),
                barrier: BufferBarrier::new(view, previous.state, state, src_stage, dst_stage),
            });

            *previous = Cursor { state, writes, producer: Some(usage.task_index) };
        }

        cursor.map(|cursor| ResourceState::Buffer(cursor.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentType, OutputAttachment};
    use crate::binding::{BufferBinding, BufferKind, ResourceFlags};
    use crate::task::{DepthStencilInfoBuilder, Task};
    use zenith_rhi::{Extent3D, TextureFormat};

    struct Fixture {
        tasks: TaskContainer,
        resources: ResourceBindingTable,
    }

    impl Fixture {
        fn new(tasks: Vec<Task>) -> Self {
            let mut resources = ResourceBindingTable::default();
            let mut container = TaskContainer::default();
            for mut task in tasks {
                for input in &mut task.inputs {
                    input.resource = resources.intern(&input.name);
                }
                for output in &mut task.outputs {
                    output.resource = resources.intern(&output.name);
                }
                container.add_task(task);
            }
            Self { tasks: container, resources }
        }

        fn bind(&mut self, name: &str, binding: ResourceBinding, flags: ResourceFlags) -> &mut Self {
            let id = self.resources.bind(name, binding, flags);
            self.resources.record_usages(id, &self.tasks);
            self
        }

        fn bind_image(&mut self, name: &str, state: TextureState) -> &mut Self {
            let view = ImageView::new(11, TextureFormat::RGBA16Float, Extent3D::default()).with_state(state);
            self.bind(name, view.into(), ResourceFlags::empty())
        }

        fn bind_buffer(&mut self, name: &str) -> &mut Self {
            let buffer = BufferBinding { view: BufferView::new(21, 4096), kind: BufferKind::Generic };
            self.bind(name, buffer.into(), ResourceFlags::empty())
        }

        fn plan(&self) -> BarrierPlan {
            synthesize_barriers(&self.tasks, &self.resources)
        }
    }

    fn total(plan: &BarrierPlan) -> usize {
        plan.barriers.iter().map(BarrierSet::len).sum()
    }

    #[test]
    fn write_then_read_buffer_emits_single_raw_barrier() {
        let mut fixture = Fixture::new(vec![
            Task::compute("X").read("particles", AttachmentType::DataBufferWO),
            Task::compute("Y").read("particles", AttachmentType::DataBufferRO),
        ]);
        fixture.bind_buffer("particles");
        let plan = fixture.plan();

        assert_eq!(total(&plan), 1);
        let transition = &plan.barriers[1].buffers[0];
        assert_eq!(transition.hazard, Hazard::ReadAfterWrite);
        assert_eq!(transition.barrier.src_state, BufferState::StorageWrite);
        assert_eq!(transition.barrier.dst_state, BufferState::StorageRead);
        assert_eq!(transition.barrier.src_stage, PipelineStages::from(PipelineStage::ComputeShader));
        assert_eq!(
            plan.final_states.get(&fixture.resources.lookup("particles").unwrap()),
            Some(&ResourceState::Buffer(BufferState::StorageRead))
        );
    }

    #[test]
    fn barrier_lands_right_after_producer() {
        let mut fixture = Fixture::new(vec![
            Task::compute("X").read("args", AttachmentType::DataBufferRW),
            Task::compute("unrelated"),
            Task::graphics("Y").read("args", AttachmentType::IndirectBuffer),
        ]);
        fixture.bind_buffer("args");
        let plan = fixture.plan();

        assert_eq!(plan.barriers[1].buffers.len(), 1);
        assert!(plan.barriers[2].is_empty());
        assert_eq!(plan.barriers[1].buffers[0].barrier.dst_stage, PipelineStages::from(PipelineStage::DrawIndirect));
        assert_eq!(plan.barriers[1].buffers[0].hazard, Hazard::ReadAfterWrite);
    }

    #[test]
    fn same_category_emits_nothing() {
        let mut fixture = Fixture::new(vec![
            Task::compute("a").read("lut", AttachmentType::Texture2D),
            Task::graphics("b").read("lut", AttachmentType::Texture3D),
        ]);
        fixture.bind_image("lut", TextureState::Sampled);

        assert_eq!(total(&fixture.plan()), 0);
    }

    #[test]
    fn first_image_use_transitions_from_top_of_pipe() {
        let mut fixture = Fixture::new(vec![
            Task::graphics("draw").write(OutputAttachment::color("hdr", TextureFormat::RGBA16Float)),
            Task::compute("tonemap").read("hdr", AttachmentType::Texture2D),
        ]);
        fixture.bind_image("hdr", TextureState::Undefined);
        let plan = fixture.plan();

        let initial = &plan.barriers[0].textures[0];
        assert_eq!(initial.barrier.src_stage, PipelineStages::from(PipelineStage::TopOfPipe));
        assert_eq!(initial.barrier.dst_state, TextureState::Color);
        assert_eq!(initial.hazard, Hazard::WriteAfterRead);

        let sample = &plan.barriers[1].textures[0];
        assert_eq!(sample.barrier.src_state, TextureState::Color);
        assert_eq!(sample.barrier.dst_state, TextureState::Sampled);
        assert_eq!(sample.barrier.dst_stage, PipelineStages::from(PipelineStage::ComputeShader));
        assert_eq!(sample.hazard, Hazard::ReadAfterWrite);
    }

    #[test]
    fn storage_after_storage_then_copy() {
        let mut fixture = Fixture::new(vec![
            Task::compute("a").read("target", AttachmentType::Image2D),
            Task::compute("b").read("target", AttachmentType::Image2D),
            Task::compute("c").read("target", AttachmentType::TransferDestination),
        ]);
        fixture.bind_image("target", TextureState::Storage);
        let plan = fixture.plan();

        assert_eq!(total(&plan), 1);
        let copy = &plan.barriers[2].textures[0];
        assert_eq!(copy.hazard, Hazard::WriteAfterWrite);
        assert_eq!(copy.barrier.dst_stage, PipelineStages::from(PipelineStage::Transfer));
    }

    #[test]
    fn read_only_depth_does_not_count_as_write() {
        let read_only = DepthStencilInfoBuilder::default()
            .depth_write_enable(false)
            .build()
            .unwrap();
        let mut fixture = Fixture::new(vec![
            Task::graphics("decals")
                .write(OutputAttachment::depth("depth", TextureFormat::D32Float))
                .with_depth_stencil(read_only),
            Task::graphics("fog").read("depth", AttachmentType::Texture2D),
        ]);
        fixture.bind_image("depth", TextureState::DepthStencil);
        let plan = fixture.plan();

        assert_eq!(total(&plan), 1);
        assert_eq!(plan.barriers[1].textures[0].hazard, Hazard::WriteAfterRead);
    }

    #[test]
    fn image_arrays_transition_every_view() {
        let views = (0..3)
            .map(|handle| ImageView::new(handle, TextureFormat::RGBA8UNorm, Extent3D::default()))
            .collect::<Vec<_>>();
        let mut fixture = Fixture::new(vec![Task::compute("shade").read("shadows", AttachmentType::TextureArray)]);
        fixture.bind("shadows", views.into(), ResourceFlags::empty());
        let plan = fixture.plan();

        assert_eq!(plan.barriers[0].textures.len(), 3);
        assert_eq!(plan.barriers[0].to_vk().0.len(), 3);
    }

    #[test]
    fn carried_layout_waits_on_its_own_stages() {
        let mut fixture = Fixture::new(vec![Task::compute("blur").read("scene", AttachmentType::Texture2D)]);
        fixture.bind_image("scene", TextureState::Color);
        let plan = fixture.plan();

        let transition = &plan.barriers[0].textures[0];
        assert_eq!(transition.hazard, Hazard::ReadAfterWrite);
        assert_eq!(transition.barrier.src_stage, PipelineStages::from(PipelineStage::ColorAttachmentOutput));

        let (images, _) = plan.barriers[0].to_vk();
        assert_eq!(images[0].src_stage_mask, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(
            images[0].src_access_mask,
            vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE
        );
        assert_eq!(images[0].old_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn carried_sampled_layout_covers_every_shader_stage() {
        let mut fixture = Fixture::new(vec![Task::compute("fill").read("lut", AttachmentType::Image2D)]);
        fixture.bind_image("lut", TextureState::Sampled);
        let plan = fixture.plan();

        let src_stage = plan.barriers[0].textures[0].barrier.src_stage;
        assert!(src_stage.contains(PipelineStage::VertexShader));
        assert!(src_stage.contains(PipelineStage::FragmentShader));
        assert!(src_stage.contains(PipelineStage::ComputeShader));
        assert!(!src_stage.contains(PipelineStage::TopOfPipe));
        assert_eq!(plan.barriers[0].textures[0].hazard, Hazard::WriteAfterRead);
    }

    #[test]
    fn image_array_views_keep_their_own_layout() {
        let views = vec![
            ImageView::new(0, TextureFormat::RGBA8UNorm, Extent3D::default()).with_state(TextureState::Sampled),
            ImageView::new(1, TextureFormat::RGBA8UNorm, Extent3D::default()).with_state(TextureState::Color),
            ImageView::new(2, TextureFormat::RGBA8UNorm, Extent3D::default()),
        ];
        let mut fixture = Fixture::new(vec![Task::compute("shade").read("shadows", AttachmentType::TextureArray)]);
        fixture.bind("shadows", views.into(), ResourceFlags::empty());
        let plan = fixture.plan();

        let transitions = &plan.barriers[0].textures;
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].barrier.view.handle, 1);
        assert_eq!(transitions[0].barrier.src_state, TextureState::Color);
        assert_eq!(transitions[0].hazard, Hazard::ReadAfterWrite);
        assert_eq!(transitions[1].barrier.view.handle, 2);
        assert_eq!(transitions[1].barrier.src_state, TextureState::Undefined);
        assert_eq!(transitions[1].barrier.src_stage, PipelineStages::from(PipelineStage::TopOfPipe));
        assert_eq!(
            plan.final_states.get(&fixture.resources.lookup("shadows").unwrap()),
            Some(&ResourceState::Texture(TextureState::Sampled))
        );
    }

    #[test]
    fn read_and_write_in_one_task_stay_in_its_slot() {
        let mut fixture = Fixture::new(vec![
            Task::compute("idle"),
            Task::graphics("blend")
                .read("hdr", AttachmentType::Texture2D)
                .write(OutputAttachment::color("hdr", TextureFormat::RGBA16Float)),
        ]);
        fixture.bind_image("hdr", TextureState::Undefined);
        let plan = fixture.plan();

        assert!(plan.barriers[0].is_empty());
        let transitions = &plan.barriers[1].textures;
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].barrier.dst_state, TextureState::Sampled);
        assert_eq!(transitions[1].barrier.src_state, TextureState::Sampled);
        assert_eq!(transitions[1].barrier.dst_state, TextureState::Color);
    }

    #[test]
    fn manual_and_untracked_resources_are_skipped() {
        let mut fixture = Fixture::new(vec![
            Task::compute("a").read("buf", AttachmentType::DataBufferWO).read("linear", AttachmentType::Sampler),
            Task::compute("b").read("buf", AttachmentType::DataBufferRO),
        ]);
        let buffer = BufferBinding { view: BufferView::new(3, 64), kind: BufferKind::Generic };
        fixture.bind("buf", buffer.into(), ResourceFlag::ManualBarriers.into());
        fixture.bind("linear", zenith_rhi::Sampler { handle: 5 }.into(), ResourceFlags::empty());
        let plan = fixture.plan();

        assert_eq!(total(&plan), 0);
        assert!(plan.final_states.is_empty());
    }
}
