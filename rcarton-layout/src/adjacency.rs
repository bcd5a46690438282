use itertools::Itertools;
use rcarton_model::{FoldEdge, Panel, PanelIndex};

use crate::edges::{detect_rect_edge, SharedEdge};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub index: PanelIndex,
    /// Seen from the panel owning the neighbour list
    pub edge: SharedEdge,
}

/// Undirected panel adjacency, one neighbour list per panel in input order.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    neighbours: Vec<Vec<Neighbour>>,
}

impl Adjacency {
    /// Runs the edge detector over every unordered pair of panels.
    #[tracing::instrument(skip(panels), fields(count = panels.len()))]
    pub fn build(panels: &[Panel], tolerance: f32) -> Self {
        let rects = panels.iter().map(Panel::rect).collect::<Vec<_>>();
        let mut neighbours = vec![Vec::new(); panels.len()];

        for ((i, a), (j, b)) in rects.iter().enumerate().tuple_combinations() {
            let Some(edge) = detect_rect_edge(a, b, tolerance) else {
                continue;
            };
            tracing::event!(
                tracing::Level::TRACE,
                "{} - {}: {:?} crease at {} ({}..{})",
                panels[i].id,
                panels[j].id,
                edge.kind(),
                edge.position,
                edge.span_start,
                edge.span_end
            );
            neighbours[i].push(Neighbour {
                index: j as PanelIndex,
                edge,
            });
            neighbours[j].push(Neighbour {
                index: i as PanelIndex,
                edge: edge.reversed(),
            });
        }

        // Pairs are visited (0,1), (0,2).., (1,2).. so lists are already sorted by index
        Self { neighbours }
    }

    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    pub fn neighbours(&self, index: PanelIndex) -> &[Neighbour] {
        self.neighbours
            .get(index as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn degree(&self, index: PanelIndex) -> usize {
        self.neighbours(index).len()
    }

    pub fn edge_between(&self, a: PanelIndex, b: PanelIndex) -> Option<&SharedEdge> {
        self.neighbours(a)
            .iter()
            .find(|n| n.index == b)
            .map(|n| &n.edge)
    }

    /// Each undirected edge once, lower index first.
    pub fn edges(&self) -> impl Iterator<Item = (PanelIndex, PanelIndex, &SharedEdge)> {
        self.neighbours
            .iter()
            .enumerate()
            .flat_map(|(i, list)| {
                list.iter()
                    .filter(move |n| (n.index as usize) > i)
                    .map(move |n| (i as PanelIndex, n.index, &n.edge))
            })
    }

    /// Flat crease list for overlays, oriented from the lower panel index.
    pub fn fold_edges(&self, panels: &[Panel]) -> Vec<FoldEdge> {
        self.edges()
            .map(|(a, b, edge)| {
                edge.into_fold_edge(
                    panels[a as usize].id.clone(),
                    panels[b as usize].id.clone(),
                )
            })
            .collect()
    }
}
