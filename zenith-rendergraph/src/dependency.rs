use zenith_core::collections::hashset::HashSet;
use crate::container::TaskContainer;
use crate::task::{Task, TaskId};

/// `producer` must execute before `consumer`. Both are positions in a task order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub producer: usize,
    pub consumer: usize,
}

impl DependencyEdge {
    pub fn new(producer: usize, consumer: usize) -> Self {
        Self { producer, consumer }
    }
}

/// Edges together with the task order their positions refer to.
///
/// Consumed by [`crate::RenderGraph::reorder_tasks`]; a list computed against an older order is
/// rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyList {
    pub(crate) order: Vec<TaskId>,
    pub(crate) edges: Vec<DependencyEdge>,
}

impl DependencyList {
    #[inline]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    #[inline]
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, producer: usize, consumer: usize) -> bool {
        self.edges.contains(&DependencyEdge::new(producer, consumer))
    }
}

/// Whether `inner` has to wait for `outer`, judged only from their declarations.
pub(crate) fn depends_on(outer: &Task, inner: &Task) -> bool {
    // output -> input
    for output in outer.outputs() {
        if output.ty.is_depth() && !outer.depth_write_enabled() {
            continue;
        }
        if inner.inputs().iter().any(|input| input.resource == output.resource) {
            return true;
        }
    }

    // descriptor -> descriptor
    for write in outer.inputs() {
        let image_write = write.ty.writes_image_descriptor();
        let buffer_write = write.ty.writes_buffer();
        if !image_write && !buffer_write {
            continue;
        }

        let hazard = inner.inputs().iter().any(|read| {
            read.resource == write.resource
                && ((image_write && read.ty.reads_image_descriptor())
                    || (buffer_write && read.ty.consumes_buffer()))
        });
        if hazard {
            return true;
        }
    }

    // managed output -> custom output
    outer.outputs().iter().any(|transient| {
        transient.size_class.is_managed()
            && inner.outputs().iter().any(|persistent| {
                persistent.resource == transient.resource
                    && !persistent.size_class.is_managed()
                    && (persistent.ty.is_depth() == transient.ty.is_depth())
            })
    })
}

/// Edges implied by the declarations of every ordered task pair in current order.
pub(crate) fn infer_dependencies(tasks: &TaskContainer) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();
    for outer in 0..tasks.len() {
        let producer = tasks.task_at(outer);
        for inner in outer + 1..tasks.len() {
            if depends_on(producer, tasks.task_at(inner)) {
                edges.push(DependencyEdge::new(outer, inner));
            }
        }
    }
    edges
}

/// Resolve `(producer, consumer)` task names into edges of the current order.
pub(crate) fn resolve_explicit(tasks: &TaskContainer, explicit: &[(String, String)]) -> Vec<DependencyEdge> {
    let position = |name: &str| {
        tasks
            .find(name)
            .unwrap_or_else(|| panic!("Unknown task [{name}] in explicit dependency!"))
    };

    explicit
        .iter()
        .map(|(producer, consumer)| DependencyEdge::new(position(producer), position(consumer)))
        .collect()
}

/// Drop repeated edges, keeping the first occurrence.
pub(crate) fn dedup(edges: Vec<DependencyEdge>) -> Vec<DependencyEdge> {
    let mut seen = HashSet::default();
    edges.into_iter().filter(|edge| seen.insert(*edge)).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Visiting,
    Visited,
}

/// Find any cycle in the graph of `task_count` nodes.
///
/// Returns the positions along the cycle, starting and ending with the same task.
pub fn find_cycle(task_count: usize, edges: &[DependencyEdge]) -> Option<Vec<usize>> {
    let mut successors = vec![Vec::new(); task_count];
    for edge in edges {
        successors[edge.producer].push(edge.consumer);
    }

    let mut state = vec![Visit::Unvisited; task_count];
    let mut visiting_stack = Vec::new();
    for root in 0..task_count {
        if state[root] == Visit::Unvisited {
            if let Some(cycle) = visit(root, &successors, &mut state, &mut visiting_stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    successors: &[Vec<usize>],
    state: &mut [Visit],
    visiting_stack: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    state[node] = Visit::Visiting;
    visiting_stack.push(node);

    for &next in &successors[node] {
        match state[next] {
            Visit::Visiting => {
                let start = visiting_stack.iter().position(|v| *v == next).unwrap_or(0);
                let mut cycle = visiting_stack[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Visit::Unvisited => {
                if let Some(cycle) = visit(next, successors, state, visiting_stack) {
                    return Some(cycle);
                }
            }
            Visit::Visited => {}
        }
    }

    visiting_stack.pop();
    state[node] = Visit::Visited;
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentType, LoadOp, OutputAttachment, SizeClass};
    use crate::binding::ResourceBindingTable;
    use crate::task::DepthStencilInfoBuilder;
    use zenith_rhi::TextureFormat;

    fn container(tasks: Vec<Task>) -> TaskContainer {
        let mut table = ResourceBindingTable::default();
        let mut container = TaskContainer::default();
        for mut task in tasks {
            for input in &mut task.inputs {
                input.resource = table.intern(&input.name);
            }
            for output in &mut task.outputs {
                output.resource = table.intern(&output.name);
            }
            container.add_task(task);
        }
        container
    }

    fn depth_output(name: &str, size_class: SizeClass) -> OutputAttachment {
        OutputAttachment::new(name, AttachmentType::Depth, TextureFormat::D32Float, size_class, LoadOp::Load)
    }

    #[test]
    fn output_feeds_input() {
        let tasks = container(vec![
            Task::graphics("gbuffer").write(OutputAttachment::color("albedo", TextureFormat::RGBA8UNorm)),
            Task::compute("lighting").read("albedo", AttachmentType::Texture2D),
        ]);

        assert_eq!(infer_dependencies(&tasks), vec![DependencyEdge::new(0, 1)]);
    }

    #[test]
    fn later_producer_never_yields_backward_edge() {
        let tasks = container(vec![
            Task::compute("lighting").read("albedo", AttachmentType::Texture2D),
            Task::graphics("gbuffer").write(OutputAttachment::color("albedo", TextureFormat::RGBA8UNorm)),
        ]);

        assert!(infer_dependencies(&tasks).is_empty());
    }

    #[test]
    fn depth_read_only_producer_is_exempt() {
        let read_only = DepthStencilInfoBuilder::default()
            .depth_write_enable(false)
            .build()
            .unwrap();
        let tasks = container(vec![
            Task::graphics("forward")
                .write(depth_output("D", SizeClass::Custom))
                .with_depth_stencil(read_only),
            Task::graphics("fog").read("D", AttachmentType::Texture2D),
        ]);
        assert!(infer_dependencies(&tasks).is_empty());

        let tasks = container(vec![
            Task::graphics("prepass").write(depth_output("D", SizeClass::Custom)),
            Task::graphics("fog").read("D", AttachmentType::Texture2D),
        ]);
        assert_eq!(infer_dependencies(&tasks), vec![DependencyEdge::new(0, 1)]);
    }

    #[test]
    fn storage_write_then_sample() {
        let tasks = container(vec![
            Task::compute("bloom").read("hdr", AttachmentType::Image2D),
            Task::graphics("tonemap").read("hdr", AttachmentType::Texture2D),
            Task::compute("histogram").read("hdr", AttachmentType::Texture2D),
        ]);

        assert_eq!(
            infer_dependencies(&tasks),
            vec![DependencyEdge::new(0, 1), DependencyEdge::new(0, 2)]
        );
    }

    #[test]
    fn buffer_write_then_consume() {
        let tasks = container(vec![
            Task::compute("cull").read("draws", AttachmentType::DataBufferWO),
            Task::graphics("draw").read("draws", AttachmentType::IndirectBuffer),
            Task::compute("stats").read("draws", AttachmentType::UniformBuffer),
        ]);

        assert_eq!(infer_dependencies(&tasks), vec![DependencyEdge::new(0, 1)]);
    }

    #[test]
    fn reads_do_not_order_each_other() {
        let tasks = container(vec![
            Task::compute("a").read("lut", AttachmentType::Texture2D),
            Task::compute("b").read("lut", AttachmentType::Texture2D),
        ]);

        assert!(infer_dependencies(&tasks).is_empty());
    }

    #[test]
    fn managed_output_orders_custom_output() {
        let tasks = container(vec![
            Task::graphics("prepass").write(depth_output("depth", SizeClass::HalfSwapchain)),
            Task::graphics("main").write(depth_output("depth", SizeClass::Custom)),
        ]);
        assert_eq!(infer_dependencies(&tasks), vec![DependencyEdge::new(0, 1)]);

        let tasks = container(vec![
            Task::graphics("a").write(depth_output("depth", SizeClass::Swapchain)),
            Task::graphics("b").write(depth_output("depth", SizeClass::Swapchain)),
        ]);
        assert!(infer_dependencies(&tasks).is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let edges = vec![
            DependencyEdge::new(0, 2),
            DependencyEdge::new(0, 1),
            DependencyEdge::new(0, 2),
        ];
        assert_eq!(dedup(edges), vec![DependencyEdge::new(0, 2), DependencyEdge::new(0, 1)]);
    }

    #[test]
    fn explicit_dependencies_resolve_names() {
        let tasks = container(vec![Task::compute("a"), Task::compute("b")]);
        let edges = resolve_explicit(&tasks, &[("b".to_owned(), "a".to_owned())]);
        assert_eq!(edges, vec![DependencyEdge::new(1, 0)]);
    }

    #[test]
    #[should_panic(expected = "Unknown task [ghost]")]
    fn unknown_explicit_task_traps() {
        let tasks = container(vec![Task::compute("a")]);
        resolve_explicit(&tasks, &[("a".to_owned(), "ghost".to_owned())]);
    }

    #[test]
    fn detects_long_cycles() {
        let edges = [
            DependencyEdge::new(0, 1),
            DependencyEdge::new(1, 2),
            DependencyEdge::new(2, 0),
        ];
        assert_eq!(find_cycle(3, &edges), Some(vec![0, 1, 2, 0]));

        let edges = [DependencyEdge::new(0, 1), DependencyEdge::new(1, 0)];
        assert_eq!(find_cycle(2, &edges), Some(vec![0, 1, 0]));
    }

    #[test]
    fn diamond_is_acyclic() {
        let edges = [
            DependencyEdge::new(0, 1),
            DependencyEdge::new(0, 2),
            DependencyEdge::new(1, 3),
            DependencyEdge::new(2, 3),
        ];
        assert_eq!(find_cycle(4, &edges), None);
    }
}
