//! Turns a flat list of panels into a fold plan: which panel is hinged to
//! which, along which crease, in what order and when.
//!
//! The stages can be used one by one ([`Adjacency::build`], [`select_root`],
//! [`derive_driven_map`], [`FoldSequencer`], [`build_panel_tree`]) or through
//! [`plan_fold`] / [`auto_fold_sequence`], which chain them the way a host
//! usually needs them.

use std::collections::{BTreeMap, HashMap, HashSet};

use rcarton_model::{DrivenMap, FoldEdge, FoldSchedule, Panel, PanelId, PanelIndex};

pub mod adjacency;
pub mod driven;
pub mod edges;
pub mod root;
pub mod sequence;
pub mod tree;

pub use adjacency::{Adjacency, Neighbour};
pub use driven::{derive_driven_map, ChainSiblings, ParallelSiblings, SiblingMode, SiblingPolicy};
pub use edges::{detect_rect_edge, detect_shared_edge, SharedEdge, DEFAULT_TOLERANCE, UI_TOLERANCE};
pub use root::{root_scores, select_root};
pub use sequence::{resolve_order, FoldSequencer, DEFAULT_OVERLAP};
pub use tree::{
    build_panel_tree, fold_direction, infer_joint_edge, JointInfo, NodeIndex, PanelNode, PanelTree,
    TreeOptions, DEFAULT_MAX_FOLD_ANGLE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub tolerance: f32,
    pub overlap: f32,
    pub sibling_mode: SiblingMode,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            overlap: DEFAULT_OVERLAP,
            sibling_mode: SiblingMode::default(),
        }
    }
}

/// What the host may pin down instead of letting it be inferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldInputs<'a> {
    pub driven: Option<&'a DrivenMap>,
    pub root: Option<&'a str>,
    pub order: Option<&'a [PanelId]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoFoldSequence {
    pub root: PanelId,
    pub driven: DrivenMap,
    /// Creases along the driven links, parent first
    pub fold_edges: Vec<FoldEdge>,
    /// Every input panel once: the root, the folding panels, then `unreached`
    pub sequence: Vec<PanelId>,
    /// Panels the driven map does not reach from the root, in input order
    pub unreached: Vec<PanelId>,
    pub schedule: FoldSchedule,
}

fn index_of(panels: &[Panel], id: &str) -> Option<PanelIndex> {
    panels
        .iter()
        .position(|p| p.id == id)
        .map(|i| i as PanelIndex)
}

/// Root of a hand-made map: the first panel, in input order, that drives
/// others without being driven itself.
fn map_root(panels: &[Panel], map: &DrivenMap) -> Option<PanelIndex> {
    panels
        .iter()
        .position(|p| !map.children(&p.id).is_empty() && map.parent_of(&p.id).is_none())
        .map(|i| i as PanelIndex)
}

/// Copy of a hand-made map without the links no tree can hang: those naming
/// a panel that is not in `panels`, and those driving a degenerate panel.
fn prune_links(panels: &[Panel], map: &DrivenMap) -> DrivenMap {
    let by_id = panels
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect::<HashMap<_, _>>();

    let mut entries = BTreeMap::new();
    for (parent, children) in map.iter() {
        if !by_id.contains_key(parent.as_str()) {
            tracing::warn!("driven map links from '{parent}', which is not a panel");
            continue;
        }
        let kept = children
            .iter()
            .filter(|child| match by_id.get(child.as_str()) {
                None => {
                    tracing::warn!("driven map links '{parent}' to '{child}', which is not a panel");
                    false
                }
                Some(panel) if panel.rect().is_degenerate() => {
                    tracing::warn!("'{child}' has no area, dropping its link from '{parent}'");
                    false
                }
                Some(_) => true,
            })
            .cloned()
            .collect::<Vec<_>>();
        if !kept.is_empty() {
            entries.insert(parent.clone(), kept);
        }
    }
    DrivenMap::from_entries(entries)
}

/// Resolves the root and the driven map, inferring whatever `inputs` leaves out.
///
/// Returns `None` only when there is no panel to start from.
pub fn resolve_topology(
    panels: &[Panel],
    inputs: &FoldInputs<'_>,
    options: &LayoutOptions,
) -> Option<(PanelIndex, DrivenMap)> {
    let adjacency = || Adjacency::build(panels, options.tolerance);

    let explicit_root = inputs.root.and_then(|id| {
        let found = index_of(panels, id);
        if found.is_none() {
            tracing::warn!("requested root '{id}' is not a panel, selecting one automatically");
        }
        found
    });

    match inputs.driven {
        Some(map) => {
            let map = prune_links(panels, map);
            let root = explicit_root
                .or_else(|| map_root(panels, &map))
                .or_else(|| select_root(&adjacency()))?;
            if let Err(e) = map.validate(&panels[root as usize].id) {
                tracing::warn!("driven map is not a single tree: {e}");
            }
            Some((root, map))
        }
        None => {
            let adjacency = adjacency();
            let root = explicit_root.or_else(|| select_root(&adjacency))?;
            let map = derive_driven_map(panels, &adjacency, root, options.sibling_mode.policy());
            Some((root, map))
        }
    }
}

/// One crease per driven link reached from `root`, the way the panel tree
/// hinges them: detected where the panels touch, inferred otherwise.
fn fold_edges_of(panels: &[Panel], driven: &DrivenMap, root: &str, tolerance: f32) -> Vec<FoldEdge> {
    let by_id = panels
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect::<HashMap<_, _>>();
    let mut hinged = HashSet::from([root]);
    let mut fold_edges = Vec::new();

    for parent_id in driven.walk_order(root) {
        let Some(parent) = by_id.get(parent_id.as_str()) else {
            continue;
        };
        for child_id in driven.children(&parent_id) {
            if !hinged.insert(child_id.as_str()) {
                continue;
            }
            let Some(child) = by_id.get(child_id.as_str()) else {
                continue;
            };
            let edge = detect_shared_edge(parent, child, tolerance).unwrap_or_else(|| {
                infer_joint_edge(&parent.rect(), &child.rect())
                    .into_fold_edge(parent.id.clone(), child.id.clone())
            });
            fold_edges.push(edge);
        }
    }
    fold_edges
}

/// Full fold plan: topology, creases, folding order and timing windows.
#[tracing::instrument(skip_all, fields(count = panels.len()))]
pub fn plan_fold(
    panels: &[Panel],
    inputs: &FoldInputs<'_>,
    options: &LayoutOptions,
) -> Option<AutoFoldSequence> {
    let (root_index, driven) = resolve_topology(panels, inputs, options)?;
    let root = panels[root_index as usize].id.clone();

    let fold_edges = fold_edges_of(panels, &driven, &root, options.tolerance);

    let order = resolve_order(&driven, &root, inputs.order);
    let schedule = FoldSequencer::new(options.overlap).schedule(&root, &order);

    let mut sequence = schedule.sequence.clone();
    let unreached = panels
        .iter()
        .filter(|p| !sequence.contains(&p.id))
        .map(|p| p.id.clone())
        .collect::<Vec<_>>();
    if !unreached.is_empty() {
        tracing::warn!("{} panel(s) are not connected to '{root}': {:?}", unreached.len(), unreached);
    }
    sequence.extend(unreached.iter().cloned());

    Some(AutoFoldSequence {
        root,
        driven,
        fold_edges,
        sequence,
        unreached,
        schedule,
    })
}

/// [`plan_fold`] with everything inferred from the panels.
pub fn auto_fold_sequence(panels: &[Panel], options: &LayoutOptions) -> Option<AutoFoldSequence> {
    plan_fold(panels, &FoldInputs::default(), options)
}
