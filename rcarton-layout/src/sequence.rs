use std::collections::HashSet;

use rcarton_model::{DrivenMap, FoldSchedule, PanelId, TimingWindow};

/// Share of a panel's window spent overlapping the next one.
pub const DEFAULT_OVERLAP: f32 = 0.3;

/// Staggers the folding of non-root panels over the global progress range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldSequencer {
    overlap: f32,
}

impl Default for FoldSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP)
    }
}

impl FoldSequencer {
    /// `overlap` is clamped to `[0, 1]`.
    pub fn new(overlap: f32) -> Self {
        let overlap = if overlap.is_finite() {
            overlap.clamp(0.0, 1.0)
        } else {
            DEFAULT_OVERLAP
        };
        Self { overlap }
    }

    pub const fn overlap(&self) -> f32 {
        self.overlap
    }

    /// Duration of every window when `count` panels fold.
    pub fn segment_duration(&self, count: usize) -> f32 {
        let n = count as f32;
        1.0 / (n * (1.0 - self.overlap) + self.overlap)
    }

    /// Windows for `order` (non-root panels, in folding order).
    pub fn windows<'a>(&self, order: impl ExactSizeIterator<Item = &'a PanelId>) -> Vec<TimingWindow> {
        let segment = self.segment_duration(order.len());
        order
            .enumerate()
            .map(|(i, panel_id)| {
                let start = i as f32 * segment * (1.0 - self.overlap);
                TimingWindow {
                    panel_id: panel_id.clone(),
                    start,
                    end: (start + segment).min(1.0),
                }
            })
            .collect()
    }

    /// Full schedule: the root's window first, then one per panel of `order`.
    pub fn schedule(&self, root: &str, order: &[PanelId]) -> FoldSchedule {
        let mut windows = Vec::with_capacity(order.len() + 1);
        windows.push(TimingWindow::root(root));
        windows.extend(self.windows(order.iter()));

        let mut sequence = Vec::with_capacity(order.len() + 1);
        sequence.push(root.to_owned());
        sequence.extend(order.iter().cloned());

        FoldSchedule { sequence, windows }
    }
}

/// Non-root folding order.
///
/// Without an explicit order this is the breadth-first walk of `map`. An
/// explicit order is cleaned up: the root, panels outside the tree and repeats
/// are dropped, then tree panels it forgot are appended in walk order.
pub fn resolve_order(map: &DrivenMap, root: &str, explicit: Option<&[PanelId]>) -> Vec<PanelId> {
    let walk = map.walk_order(root);
    let Some(explicit) = explicit else {
        return walk.into_iter().skip(1).collect();
    };

    let in_tree = walk.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut seen = HashSet::from([root]);
    let mut order = Vec::with_capacity(walk.len());

    for id in explicit {
        if !in_tree.contains(id.as_str()) {
            tracing::warn!("fold order names '{id}', which is not part of the tree");
            continue;
        }
        if !seen.insert(id.as_str()) {
            if id != root {
                tracing::warn!("fold order lists '{id}' more than once");
            }
            continue;
        }
        order.push(id.clone());
    }

    for id in walk.iter().skip(1) {
        if seen.insert(id.as_str()) {
            tracing::event!(tracing::Level::DEBUG, "appending '{id}' missing from the fold order");
            order.push(id.clone());
        }
    }

    order
}
