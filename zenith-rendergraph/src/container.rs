use crate::task::{Task, TaskId, TaskKind};

/// Tasks grouped per kind, plus the cross-kind order they execute in.
///
/// A [`TaskId`] stays valid for the whole frame. Reordering only permutes `order`.
#[derive(Clone, Debug, Default)]
pub struct TaskContainer {
    lists: [Vec<Task>; TaskKind::COUNT],
    order: Vec<TaskId>,
}

impl TaskContainer {
    pub fn add_task(&mut self, task: Task) -> TaskId {
        let list = &mut self.lists[task.kind.slot()];
        let id = TaskId::new(task.kind, list.len() as u32);
        list.push(task);
        self.order.push(id);
        id
    }

    #[inline]
    pub fn task(&self, id: TaskId) -> &Task {
        self.lists[id.kind.slot()]
            .get(id.index as usize)
            .expect("Task id out of bound!")
    }

    #[inline]
    pub fn task_mut(&mut self, id: TaskId) -> &mut Task {
        self.lists[id.kind.slot()]
            .get_mut(id.index as usize)
            .expect("Task id out of bound!")
    }

    /// Task at `position` of the current execution order.
    #[inline]
    pub fn task_at(&self, position: usize) -> &Task {
        let id = *self.order.get(position).expect("Task order position out of bound!");
        self.task(id)
    }

    #[inline]
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|id| self.task(*id).name == name)
    }

    /// Iterate tasks in execution order together with their position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, TaskId, &Task)> + '_ {
        self.order
            .iter()
            .enumerate()
            .map(|(position, id)| (position, *id, self.task(*id)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn count_of(&self, kind: TaskKind) -> usize {
        self.lists[kind.slot()].len()
    }

    /// Replace the execution order with `permutation`, where entry `i` is the current position
    /// of the task that moves to position `i`.
    pub(crate) fn apply_permutation(&mut self, permutation: &[usize]) {
        assert_eq!(permutation.len(), self.order.len(), "Task permutation must cover every task!");
        self.order = permutation.iter().map(|old| self.order[*old]).collect();
    }

    pub fn reset(&mut self) {
        self.lists.iter_mut().for_each(Vec::clear);
        self.order.clear();
    }
}
