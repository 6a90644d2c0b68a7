use crate::barrier::BarrierSet;
use crate::command::Command;
use crate::graph::CompiledRenderGraph;
use crate::task::Task;

/// Backend seam consuming a compiled graph.
///
/// [`CompiledRenderGraph::execute`] walks the slots in order and, per slot, calls
/// `record_barriers` (when the slot has any), `begin_task`, `record_command` for every
/// pre-recorded command, the task callback, then `end_task`.
pub trait Executor {
    fn begin_task(&mut self, graph: &CompiledRenderGraph, index: usize) -> anyhow::Result<()>;

    fn record_barriers(&mut self, graph: &CompiledRenderGraph, index: usize, barriers: &BarrierSet) -> anyhow::Result<()>;

    fn record_command(&mut self, graph: &CompiledRenderGraph, index: usize, command: &Command) -> anyhow::Result<()>;

    fn end_task(&mut self, graph: &CompiledRenderGraph, index: usize) -> anyhow::Result<()>;
}

/// What a task callback sees while its task executes.
pub struct TaskExecutionContext<'a> {
    pub(crate) graph: &'a CompiledRenderGraph,
    pub(crate) task_index: usize,
    pub(crate) executor: &'a mut dyn Executor,
}

impl TaskExecutionContext<'_> {
    #[inline]
    pub fn graph(&self) -> &CompiledRenderGraph {
        self.graph
    }

    #[inline]
    pub fn task_index(&self) -> usize {
        self.task_index
    }

    #[inline]
    pub fn task(&self) -> &Task {
        self.graph.task(self.task_index)
    }

    #[inline]
    pub fn executor(&mut self) -> &mut dyn Executor {
        &mut *self.executor
    }

    /// Record a command generated at execution time, after the task's pre-recorded ones.
    pub fn record(&mut self, command: &Command) -> anyhow::Result<()> {
        self.executor.record_command(self.graph, self.task_index, command)
    }
}
