use std::collections::VecDeque;

use rcarton_model::PanelIndex;

use crate::adjacency::Adjacency;

/// Number of panels reachable from `start` without passing through `excluded`.
fn reachable_count(adjacency: &Adjacency, start: PanelIndex, excluded: PanelIndex) -> usize {
    let mut visited = vec![false; adjacency.len()];
    visited[excluded as usize] = true;
    visited[start as usize] = true;

    let mut queue = VecDeque::from([start]);
    let mut count = 0;
    while let Some(current) = queue.pop_front() {
        count += 1;
        for neighbour in adjacency.neighbours(current) {
            let slot = &mut visited[neighbour.index as usize];
            if !*slot {
                *slot = true;
                queue.push_back(neighbour.index);
            }
        }
    }
    count
}

/// How much of the layout hangs off each panel.
///
/// A panel's score is the sum, over its direct neighbours, of the size of the
/// component that neighbour reaches once the panel itself is removed.
pub fn root_scores(adjacency: &Adjacency) -> Vec<usize> {
    (0..adjacency.len() as PanelIndex)
        .map(|candidate| {
            adjacency
                .neighbours(candidate)
                .iter()
                .map(|n| reachable_count(adjacency, n.index, candidate))
                .sum()
        })
        .collect()
}

/// The best-connected panel, first in input order on ties.
pub fn select_root(adjacency: &Adjacency) -> Option<PanelIndex> {
    let scores = root_scores(adjacency);
    let mut best: Option<(PanelIndex, usize)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index as PanelIndex, score));
        }
    }
    tracing::event!(tracing::Level::DEBUG, "selected root {:?}", best);
    best.map(|(index, _)| index)
}
