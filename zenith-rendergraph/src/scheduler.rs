use crate::config::RenderGraphConfig;
use crate::dependency::DependencyEdge;
use crate::task::TaskKind;

/// Greedy list scheduling over `edges`.
///
/// Returns a permutation: entry `i` is the current position of the task placed at position `i`.
/// Among tasks without pending producers, the one with the highest score wins. Ties keep scan
/// order.
#[profiling::function]
pub(crate) fn schedule(kinds: &[TaskKind], edges: &[DependencyEdge], config: &RenderGraphConfig) -> Vec<usize> {
    let task_count = kinds.len();
    let mut remaining = edges.to_vec();
    let mut scheduled = vec![false; task_count];
    let mut order = Vec::with_capacity(task_count);
    let mut previous_kind = None;

    while order.len() < task_count {
        let mut blocked = scheduled.clone();
        for edge in &remaining {
            blocked[edge.consumer] = true;
        }

        let mut best: Option<(usize, u32)> = None;
        for candidate in (0..task_count).filter(|task| !blocked[*task]) {
            let same_kind = previous_kind == Some(kinds[candidate]);
            let fan_out = remaining.iter().filter(|edge| edge.producer == candidate).count() as u32;
            let score = if same_kind { config.same_kind_bonus } else { 0 } + config.fan_out_weight * fan_out;

            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        let Some((selected, _)) = best else {
            panic!("No schedulable task left, dependency graph has a cycle!");
        };

        scheduled[selected] = true;
        previous_kind = Some(kinds[selected]);
        remaining.retain(|edge| edge.producer != selected);
        order.push(selected);
    }

    order
}

/// Map edges of the old order into positions of the order described by `permutation`.
pub(crate) fn remap_edges(edges: &[DependencyEdge], permutation: &[usize]) -> Vec<DependencyEdge> {
    let mut new_position = vec![0; permutation.len()];
    for (position, old) in permutation.iter().enumerate() {
        new_position[*old] = position;
    }

    edges
        .iter()
        .map(|edge| DependencyEdge::new(new_position[edge.producer], new_position[edge.consumer]))
        .collect()
}
