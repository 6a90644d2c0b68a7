use std::slice;
use anyhow::Context;
use zenith_core::collections::hashmap::HashMap;
use zenith_core::log::{debug, error, trace, warn};
use zenith_rhi::{BufferView, ImageView, RenderDevice, Sampler, ShaderResourceSet, TextureState};
use crate::allocator;
use crate::barrier::{self, BarrierSet, ResourceState};
use crate::binding::{BufferBinding, BufferKind, ResourceBinding, ResourceBindingTable, ResourceFlags};
use crate::config::RenderGraphConfig;
use crate::container::TaskContainer;
use crate::dependency::{self, DependencyEdge, DependencyList};
use crate::executor::{Executor, TaskExecutionContext};
use crate::scheduler;
use crate::symbol::ResourceName;
use crate::task::{Task, TaskId, TaskKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameState {
    Idle,
    Recording,
}

/// Mutable per-frame render graph.
///
/// Tasks and bindings are recorded between [`RenderGraph::begin_frame`] and
/// [`RenderGraph::end_frame`], then [`RenderGraph::compile`] produces an immutable
/// [`CompiledRenderGraph`].
pub struct RenderGraph {
    config: RenderGraphConfig,
    frame: FrameState,
    tasks: TaskContainer,
    resources: ResourceBindingTable,
    explicit_dependencies: Vec<(String, String)>,
    // allocated but not yet handed to a compiled graph
    internal_textures: Vec<ImageView>,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::with_config(RenderGraphConfig::default())
    }
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderGraphConfig) -> Self {
        Self {
            config,
            frame: FrameState::Idle,
            tasks: TaskContainer::default(),
            resources: ResourceBindingTable::default(),
            explicit_dependencies: Vec::new(),
            internal_textures: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &RenderGraphConfig {
        &self.config
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.frame == FrameState::Recording
    }

    pub fn begin_frame(&mut self) {
        if self.is_recording() {
            warn!("Render graph frame begins before the previous one ended!");
        }

        self.reset();
        self.frame = FrameState::Recording;
    }

    /// Drop every task, binding and dependency of the frame.
    ///
    /// Internal textures never handed to a compiled graph go back to `device`.
    pub fn end_frame(&mut self, device: &mut dyn RenderDevice) {
        if !self.is_recording() {
            warn!("Render graph frame ends without begin!");
        }

        for view in self.internal_textures.drain(..) {
            device.release_texture(view);
        }
        self.reset();
        self.frame = FrameState::Idle;
    }

    fn reset(&mut self) {
        self.tasks.reset();
        self.resources.clear();
        self.explicit_dependencies.clear();
    }

    fn assert_recording(&self, action: &str) {
        assert!(self.is_recording(), "Try to {action} outside of a render graph frame!");
    }

    pub fn add_task(&mut self, mut task: Task) -> TaskId {
        self.assert_recording("add task");

        for input in &mut task.inputs {
            input.resource = self.resources.intern(&input.name);
        }
        for output in &mut task.outputs {
            output.resource = self.resources.intern(&output.name);
        }

        let inputs: Vec<ResourceName> = task.inputs.iter().map(|input| input.resource).collect();
        let outputs: Vec<ResourceName> = task.outputs.iter().map(|output| output.resource).collect();
        trace!(
            "Add {:?} task [{}] with {} inputs, {} outputs",
            task.kind,
            task.name,
            inputs.len(),
            outputs.len()
        );

        let id = self.tasks.add_task(task);

        // bindings made before this task was added must see it as well
        for resource in inputs.into_iter().chain(outputs) {
            if self.resources.info(resource).is_bound() {
                let touched = self.resources.record_usages(resource, &self.tasks);
                self.mark_dirty(&touched);
            }
        }
        id
    }

    #[inline]
    pub fn task(&self, id: TaskId) -> &Task {
        self.tasks.task(id)
    }

    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn tasks(&self) -> &TaskContainer {
        &self.tasks
    }

    #[inline]
    pub fn resources(&self) -> &ResourceBindingTable {
        &self.resources
    }

    pub fn bind_image(&mut self, name: &str, view: ImageView, flags: ResourceFlags) {
        self.bind(name, ResourceBinding::Image(view), flags);
    }

    pub fn bind_image_array(&mut self, name: &str, views: Vec<ImageView>, flags: ResourceFlags) {
        self.bind(name, ResourceBinding::ImageArray(views), flags);
    }

    pub fn bind_buffer(&mut self, name: &str, view: BufferView, flags: ResourceFlags) {
        self.bind(name, BufferBinding { view, kind: BufferKind::Generic }.into(), flags);
    }

    pub fn bind_vertex_buffer(&mut self, name: &str, view: BufferView, flags: ResourceFlags) {
        self.bind(name, BufferBinding { view, kind: BufferKind::Vertex }.into(), flags);
    }

    pub fn bind_index_buffer(&mut self, name: &str, view: BufferView, flags: ResourceFlags) {
        self.bind(name, BufferBinding { view, kind: BufferKind::Index }.into(), flags);
    }

    pub fn bind_sampler(&mut self, name: &str, sampler: Sampler, flags: ResourceFlags) {
        self.bind(name, ResourceBinding::Sampler(sampler), flags);
    }

    pub fn bind_shader_resource_set(&mut self, name: &str, set: ShaderResourceSet, flags: ResourceFlags) {
        self.bind(name, ResourceBinding::ShaderResourceSet(set), flags);
    }

    fn bind(&mut self, name: &str, binding: ResourceBinding, flags: ResourceFlags) {
        self.assert_recording("bind resource");

        let kind = binding.kind_name();
        let resource = self.resources.bind(name, binding, flags);
        let touched = self.resources.record_usages(resource, &self.tasks);
        self.mark_dirty(&touched);

        debug!(
            "Bind {kind} [{name}] generation {} used by {} tasks",
            self.resources.info(resource).generation(),
            touched.len()
        );
    }

    fn mark_dirty(&mut self, touched: &[(TaskId, crate::task::TaskDirtyFlags)]) {
        for (id, dirty) in touched {
            self.tasks.task_mut(*id).mark_dirty(*dirty);
        }
    }

    #[inline]
    pub fn is_resource_slot_bound(&self, name: &str) -> bool {
        self.resources.is_bound(name)
    }

    /// Force `producer` to execute before `consumer`, both named by task.
    pub fn add_dependency(&mut self, producer: &str, consumer: &str) {
        self.assert_recording("add dependency");
        self.explicit_dependencies.push((producer.to_owned(), consumer.to_owned()));
    }

    /// Infer the partial order of the current task order.
    ///
    /// # Panics
    /// When an explicit dependency names an unknown task or the dependencies form a cycle.
    #[profiling::function]
    pub fn compile_dependencies(&self) -> DependencyList {
        let mut edges = dependency::infer_dependencies(&self.tasks);
        edges.extend(dependency::resolve_explicit(&self.tasks, &self.explicit_dependencies));
        let edges = dependency::dedup(edges);

        if self.config.validate_cycles {
            if let Some(cycle) = dependency::find_cycle(self.tasks.len(), &edges) {
                error!("Found cycle in render graph:");
                for position in &cycle {
                    error!("    {}", self.tasks.task_at(*position).name());
                }
                panic!("Render graph has a cycle!");
            }
        }

        debug!("Compiled {} dependencies over {} tasks", edges.len(), self.tasks.len());
        DependencyList {
            order: self.tasks.order().to_vec(),
            edges,
        }
    }

    /// Schedule the tasks along `dependencies` and return the edges in final positions.
    #[profiling::function]
    pub fn reorder_tasks(&mut self, dependencies: DependencyList) -> Vec<DependencyEdge> {
        assert!(
            dependencies.order.as_slice() == self.tasks.order(),
            "Dependency list is stale, compile dependencies again!"
        );

        let kinds: Vec<TaskKind> = self.tasks.iter().map(|(_, _, task)| task.kind()).collect();
        let permutation = scheduler::schedule(&kinds, &dependencies.edges, &self.config);
        self.tasks.apply_permutation(&permutation);
        self.resources.rescan(&self.tasks);

        debug!(
            "Scheduled render graph: [{}]",
            self.tasks.iter().map(|(_, _, task)| task.name()).collect::<Vec<_>>().join(", ")
        );
        scheduler::remap_edges(&dependencies.edges, &permutation)
    }

    /// Create and bind textures for every managed output against the current swapchain.
    #[profiling::function]
    pub fn allocate_internal_resources(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<()> {
        for view in self.internal_textures.drain(..) {
            device.release_texture(view);
        }

        let swapchain = device.swapchain_extent();
        for desc in allocator::plan_internal_textures(&self.tasks, swapchain) {
            let view = device
                .create_texture(&desc)
                .with_context(|| format!("Failed to allocate internal resource [{}]", desc.name))?;

            self.internal_textures.push(view);
            self.bind_image(&desc.name, view, ResourceFlags::empty());
        }

        debug!(
            "Allocated {} internal resources for {}x{} swapchain",
            self.internal_textures.len(),
            swapchain.width,
            swapchain.height
        );
        Ok(())
    }

    /// Barrier sets of the current order, one per slot.
    pub fn generate_barriers(&self) -> Vec<BarrierSet> {
        barrier::synthesize_barriers(&self.tasks, &self.resources).barriers
    }

    /// Run every stage and snapshot the result.
    #[profiling::function]
    pub fn compile(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<CompiledRenderGraph> {
        self.assert_recording("compile");

        let dependencies = self.compile_dependencies();
        let edges = self.reorder_tasks(dependencies);
        self.allocate_internal_resources(device)?;
        let plan = barrier::synthesize_barriers(&self.tasks, &self.resources);

        let tasks = self.tasks.iter().map(|(_, _, task)| task.clone()).collect();
        let task_ids = self.tasks.order().to_vec();
        for id in &task_ids {
            self.tasks.task_mut(*id).clear_dirty();
        }

        Ok(CompiledRenderGraph {
            tasks,
            task_ids,
            edges,
            barriers: plan.barriers,
            resources: self.resources.clone(),
            final_states: plan.final_states,
            internal_textures: std::mem::take(&mut self.internal_textures),
        })
    }
}

/// Immutable result of [`RenderGraph::compile`]: ordered tasks, their edges and barrier sets.
pub struct CompiledRenderGraph {
    tasks: Vec<Task>,
    task_ids: Vec<TaskId>,
    edges: Vec<DependencyEdge>,
    barriers: Vec<BarrierSet>,
    resources: ResourceBindingTable,
    final_states: HashMap<ResourceName, ResourceState>,
    internal_textures: Vec<ImageView>,
}

impl CompiledRenderGraph {
    #[inline]
    pub fn tasks(&self) -> slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    #[inline]
    pub fn task(&self, index: usize) -> &Task {
        self.tasks.get(index).expect("Task index out of bound!")
    }

    #[inline]
    pub fn task_id(&self, index: usize) -> TaskId {
        *self.task_ids.get(index).expect("Task index out of bound!")
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.name() == name)
    }

    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    #[inline]
    pub fn barriers(&self, slot: usize) -> &BarrierSet {
        self.barriers.get(slot).expect("Barrier slot out of bound!")
    }

    #[inline]
    pub fn all_barriers(&self) -> &[BarrierSet] {
        &self.barriers
    }

    #[inline]
    pub fn resources(&self) -> &ResourceBindingTable {
        &self.resources
    }

    #[inline]
    pub fn image_view(&self, name: &str) -> &ImageView {
        self.resources.image_view(name)
    }

    #[inline]
    pub fn try_image_view(&self, name: &str) -> Option<&ImageView> {
        self.resources.try_image_view(name)
    }

    #[inline]
    pub fn image_array_views(&self, name: &str) -> &[ImageView] {
        self.resources.image_array_views(name)
    }

    #[inline]
    pub fn buffer(&self, name: &str) -> &BufferBinding {
        self.resources.buffer(name)
    }

    #[inline]
    pub fn sampler(&self, name: &str) -> &Sampler {
        self.resources.sampler(name)
    }

    #[inline]
    pub fn shader_resource_set(&self, name: &str) -> &ShaderResourceSet {
        self.resources.shader_resource_set(name)
    }

    pub fn final_state(&self, name: &str) -> Option<ResourceState> {
        self.final_states.get(&self.resources.lookup(name)?).copied()
    }

    /// Layout to seed the next frame's binding of `name` with.
    pub fn final_texture_state(&self, name: &str) -> Option<TextureState> {
        match self.final_state(name)? {
            ResourceState::Texture(state) => Some(state),
            ResourceState::Buffer(_) => None,
        }
    }

    #[profiling::function]
    pub fn execute(&self, executor: &mut dyn Executor) -> anyhow::Result<()> {
        for (index, task) in self.tasks.iter().enumerate() {
            profiling::scope!("rendergraph::task", task.name());

            let barriers = &self.barriers[index];
            if !barriers.is_empty() {
                executor.record_barriers(self, index, barriers)?;
            }

            executor.begin_task(self, index)?;
            for command in task.commands().iter() {
                executor.record_command(self, index, command)?;
            }
            if let Some(callback) = task.callback() {
                let mut ctx = TaskExecutionContext {
                    graph: self,
                    task_index: index,
                    executor: &mut *executor,
                };
                callback(&mut ctx).with_context(|| format!("Task [{}] failed to execute", task.name()))?;
            }
            executor.end_task(self, index)?;
        }
        Ok(())
    }

    pub fn retire(self) -> RetiredRenderGraph {
        RetiredRenderGraph {
            internal_textures: self.internal_textures,
        }
    }
}

/// Frame resources of an executed graph, waiting for the GPU to be done with them.
pub struct RetiredRenderGraph {
    internal_textures: Vec<ImageView>,
}

impl RetiredRenderGraph {
    pub fn release_frame_resources(self, device: &mut dyn RenderDevice) {
        for view in self.internal_textures {
            device.release_texture(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentType, LoadOp, OutputAttachment, SizeClass};
    use crate::binding::ResourceFlag;
    use zenith_rhi::{Extent2D, Extent3D, HeadlessDevice, TextureFormat};

    fn image(handle: u64) -> ImageView {
        ImageView::new(handle, TextureFormat::RGBA8UNorm, Extent3D::default())
    }

    fn device() -> HeadlessDevice {
        HeadlessDevice::new(Extent2D::new(1920, 1080))
    }

    #[test]
    #[should_panic(expected = "outside of a render graph frame")]
    fn adding_task_requires_frame() {
        let mut graph = RenderGraph::new();
        graph.add_task(Task::compute("orphan"));
    }

    #[test]
    fn end_frame_resets_everything() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::compute("cull").read("draws", AttachmentType::DataBufferWO));
        graph.bind_buffer("draws", BufferView::new(1, 64), ResourceFlags::empty());
        graph.end_frame(&mut device);

        assert!(!graph.is_recording());
        assert_eq!(graph.task_count(), 0);
        assert!(!graph.is_resource_slot_bound("draws"));
    }

    #[test]
    fn compile_orders_producers_first() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::graphics("tonemap").read("hdr", AttachmentType::Texture2D).write(
            OutputAttachment::color("ldr", TextureFormat::RGBA8UNorm).with_size_class(SizeClass::Custom),
        ));
        graph.add_task(Task::compute("sky").read("hdr", AttachmentType::Image2D));

        graph.add_dependency("sky", "tonemap");
        graph.bind_image("hdr", image(1), ResourceFlags::empty());
        graph.bind_image("ldr", image(2), ResourceFlags::empty());
        let compiled = graph.compile(&mut device).unwrap();

        assert_eq!(compiled.task(0).name(), "sky");
        assert_eq!(compiled.task(1).name(), "tonemap");
        assert_eq!(compiled.edges(), &[DependencyEdge::new(0, 1)]);
        assert_eq!(compiled.final_texture_state("hdr"), Some(TextureState::Sampled));
        assert_eq!(compiled.final_texture_state("ldr"), Some(TextureState::Color));
    }

    #[test]
    fn binding_marks_tasks_dirty() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        let blur = graph.add_task(Task::compute("blur").read("src", AttachmentType::Texture2D));
        graph.bind_image("src", image(1), ResourceFlags::empty());
        graph.compile(&mut device).unwrap();
        assert!(!graph.task(blur).needs_descriptor_update());

        graph.bind_image("src", image(2), ResourceFlags::empty());
        assert!(graph.task(blur).needs_descriptor_update());
        assert!(!graph.task(blur).needs_framebuffer_update());
    }

    #[test]
    fn binding_before_task_still_records_usage() {
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.bind_image("lut", image(1), ResourceFlags::empty());
        graph.add_task(Task::compute("grade").read("lut", AttachmentType::Texture3D));

        let info = graph.resources().info_by_name("lut").unwrap();
        assert_eq!(info.usages().len(), 1);
    }

    #[test]
    fn rebinding_drops_previous_history() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::compute("write").read("R", AttachmentType::DataBufferWO));
        graph.add_task(Task::compute("read").read("R", AttachmentType::DataBufferRO));
        graph.bind_buffer("R", BufferView::new(1, 256), ResourceFlags::empty());
        let first = graph.compile(&mut device).unwrap();
        assert_eq!(first.buffer("R").view.handle, 1);

        graph.bind_buffer("R", BufferView::new(2, 256), ResourceFlags::empty());
        let info = graph.resources().info_by_name("R").unwrap();
        assert_eq!(info.generation(), 2);
        assert_eq!(info.usages().len(), 2);

        let second = graph.compile(&mut device).unwrap();
        let barriers: Vec<_> = second.all_barriers().iter().flat_map(|set| set.buffers.iter()).collect();
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].barrier.view.handle, 2);
        assert_eq!(second.edges(), first.edges());
    }

    #[test]
    #[should_panic(expected = "Render graph has a cycle!")]
    fn long_cycles_trap() {
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::compute("A"));
        graph.add_task(Task::compute("B"));
        graph.add_task(Task::compute("C"));
        graph.add_dependency("A", "B");
        graph.add_dependency("B", "C");
        graph.add_dependency("C", "A");
        graph.compile_dependencies();
    }

    #[test]
    #[should_panic(expected = "Dependency list is stale")]
    fn stale_dependency_list_is_rejected() {
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::compute("A"));
        let dependencies = graph.compile_dependencies();
        graph.add_task(Task::compute("B"));
        graph.reorder_tasks(dependencies);
    }

    #[test]
    fn half_swapchain_output_is_allocated_and_bound() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::graphics("bloom").write(OutputAttachment::new(
            "Foo",
            AttachmentType::RenderTarget2D,
            TextureFormat::RGBA8UNorm,
            SizeClass::HalfSwapchain,
            LoadOp::ClearBlack,
        )));
        let compiled = graph.compile(&mut device).unwrap();

        let view = compiled.image_view("Foo");
        assert_eq!((view.extent.width, view.extent.height), (960, 540));
        assert_eq!(view.format, TextureFormat::RGBA8UNorm);
        assert_eq!(device.live_texture_count(), 1);

        compiled.retire().release_frame_resources(&mut device);
        graph.end_frame(&mut device);
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn compute_tasks_stay_adjacent() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::graphics("G").write(OutputAttachment::color("scene", TextureFormat::RGBA16Float)));
        graph.add_task(Task::compute("C1"));
        graph.add_task(Task::graphics("G2").read("scene", AttachmentType::Texture2D));
        graph.add_task(Task::compute("C2"));
        let compiled = graph.compile(&mut device).unwrap();

        assert_eq!(compiled.task(0).name(), "G");
        let c1 = compiled.position_of("C1").unwrap();
        let c2 = compiled.position_of("C2").unwrap();
        assert_eq!(c1.abs_diff(c2), 1);
    }

    #[test]
    fn manual_barrier_resources_are_left_alone() {
        let mut device = device();
        let mut graph = RenderGraph::new();
        graph.begin_frame();
        graph.add_task(Task::compute("a").read("img", AttachmentType::Image2D));
        graph.add_task(Task::compute("b").read("img", AttachmentType::Texture2D));
        graph.bind_image("img", image(3), ResourceFlag::ManualBarriers.into());
        let compiled = graph.compile(&mut device).unwrap();

        assert!(compiled.all_barriers().iter().all(BarrierSet::is_empty));
        assert_eq!(compiled.final_state("img"), None);
    }
}
