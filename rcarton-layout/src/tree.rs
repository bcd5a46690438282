use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Unit, Vector3};
use rcarton_model::{DrivenMap, EdgeKind, FoldEdge, Panel, PanelIndex, Rect, Side};
use tinyvec::TinyVec;

use crate::edges::{detect_rect_edge, SharedEdge, DEFAULT_TOLERANCE};

pub type NodeIndex = u32;

/// Default fold angle, a right angle.
pub const DEFAULT_MAX_FOLD_ANGLE: f32 = std::f32::consts::FRAC_PI_2;

/// Where and how a panel hinges on its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct JointInfo {
    pub kind: EdgeKind,
    /// Where the child lies relative to its parent
    pub side: Side,
    pub position: f32,
    pub span_start: f32,
    pub span_end: f32,
    /// Crease midpoint, in layout space
    pub anchor: Point3<f32>,
    /// `anchor` relative to the parent's pivot
    pub local_position: Vector3<f32>,
    pub length: f32,
    pub axis: Unit<Vector3<f32>>,
    /// Sign applied to the fold angle so that the child rises towards +z
    pub direction: f32,
    pub max_fold_angle: f32,
    /// No shared edge was detected, the joint was guessed from the centres
    pub inferred: bool,
}

impl JointInfo {
    fn new(
        edge: &SharedEdge,
        parent_pivot: Point3<f32>,
        max_fold_angle: f32,
        inferred: bool,
    ) -> Self {
        let along = (edge.span_start + edge.span_end) * 0.5;
        let (anchor, axis) = match edge.kind() {
            EdgeKind::Horizontal => (Point3::new(along, edge.position, 0.0), Vector3::x_axis()),
            EdgeKind::Vertical => (Point3::new(edge.position, along, 0.0), Vector3::y_axis()),
        };
        Self {
            kind: edge.kind(),
            side: edge.side,
            position: edge.position,
            span_start: edge.span_start,
            span_end: edge.span_end,
            anchor,
            local_position: anchor - parent_pivot,
            length: edge.length(),
            axis,
            direction: fold_direction(edge.side),
            max_fold_angle,
            inferred,
        }
    }

    /// Signed rotation about `axis` once `local_progress` of the fold is done.
    pub fn angle(&self, local_progress: f32) -> f32 {
        local_progress * self.max_fold_angle * self.direction
    }
}

/// Rotation sign that lifts a panel lying on `side` of its parent towards +z.
pub const fn fold_direction(side: Side) -> f32 {
    match side {
        Side::Below | Side::Left => 1.0,
        Side::Above | Side::Right => -1.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelNode {
    /// Index into the panel list the tree was built from
    pub panel: PanelIndex,
    pub id: String,
    pub rect: Rect,
    pub center: [f32; 2],
    pub parent: Option<NodeIndex>,
    pub children: TinyVec<[NodeIndex; 4]>,
    /// `None` for the root only
    pub joint: Option<JointInfo>,
}

/// Fold hierarchy resolved against panel geometry.
///
/// Nodes are stored in pre-order with the root at index 0, so a parent
/// always comes before its children.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTree {
    nodes: Vec<PanelNode>,
}

impl PanelTree {
    pub const ROOT: NodeIndex = 0;

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &PanelNode {
        &self.nodes[Self::ROOT as usize]
    }

    pub fn nodes(&self) -> &[PanelNode] {
        &self.nodes
    }

    pub fn get(&self, index: NodeIndex) -> Option<&PanelNode> {
        self.nodes.get(index as usize)
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .map(|i| i as NodeIndex)
    }

    /// Point a node rotates about: its crease anchor, or the centre for the root.
    pub fn pivot(&self, index: NodeIndex) -> Point3<f32> {
        let node = &self.nodes[index as usize];
        match &node.joint {
            Some(joint) => joint.anchor,
            None => Point3::new(node.center[0], node.center[1], 0.0),
        }
    }

    /// Nodes carrying a joint, with their parent.
    pub fn joints(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &JointInfo)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| {
            let joint = node.joint.as_ref()?;
            Some((i as NodeIndex, node.parent?, joint))
        })
    }

    /// One crease per parent → child link, in pre-order.
    pub fn fold_edges(&self) -> Vec<FoldEdge> {
        self.joints()
            .map(|(child, parent, joint)| FoldEdge {
                kind: joint.kind,
                position: joint.position,
                span_start: joint.span_start,
                span_end: joint.span_end,
                parent_id: self.nodes[parent as usize].id.clone(),
                child_id: self.nodes[child as usize].id.clone(),
            })
            .collect()
    }

    /// Panel ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeOptions {
    pub tolerance: f32,
    pub max_fold_angle: f32,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_fold_angle: DEFAULT_MAX_FOLD_ANGLE,
        }
    }
}

fn overlap_or(a0: f32, a1: f32, b0: f32, b1: f32) -> (f32, f32) {
    let start = a0.max(b0);
    let end = a1.min(b1);
    if end > start {
        (start, end)
    } else {
        (a0, a1)
    }
}

/// Best guess at a joint for two panels that share no detectable edge.
///
/// The crease goes on the parent edge facing the child, along the axis of the
/// larger centre displacement (vertical displacement wins ties). Its span is
/// the overlap of both panels across that edge, or the whole parent edge.
pub fn infer_joint_edge(parent: &Rect, child: &Rect) -> SharedEdge {
    let [px, py] = parent.center();
    let [cx, cy] = child.center();
    let (dx, dy) = (cx - px, cy - py);

    if dy.abs() >= dx.abs() {
        let (side, position) = if dy >= 0.0 {
            (Side::Below, parent.bottom())
        } else {
            (Side::Above, parent.top())
        };
        let (span_start, span_end) =
            overlap_or(parent.left(), parent.right(), child.left(), child.right());
        SharedEdge {
            side,
            position,
            span_start,
            span_end,
            gap: (dy.abs() - (parent.height + child.height) * 0.5).max(0.0),
        }
    } else {
        let (side, position) = if dx >= 0.0 {
            (Side::Right, parent.right())
        } else {
            (Side::Left, parent.left())
        };
        let (span_start, span_end) =
            overlap_or(parent.top(), parent.bottom(), child.top(), child.bottom());
        SharedEdge {
            side,
            position,
            span_start,
            span_end,
            gap: (dx.abs() - (parent.width + child.width) * 0.5).max(0.0),
        }
    }
}

/// Resolves `map` from `root` into a [`PanelTree`].
///
/// Each child is matched against its parent's own rectangle; when no shared
/// edge is found the joint is inferred with [`infer_joint_edge`]. Links naming
/// unknown panels and panels reached a second time are skipped. Returns `None`
/// when `root` is not one of `panels`.
#[tracing::instrument(skip(panels, map, options), fields(count = panels.len()))]
pub fn build_panel_tree(
    panels: &[Panel],
    map: &DrivenMap,
    root: &str,
    options: &TreeOptions,
) -> Option<PanelTree> {
    let mut by_id: HashMap<&str, PanelIndex> = HashMap::with_capacity(panels.len());
    for (i, panel) in panels.iter().enumerate() {
        if by_id.insert(panel.id.as_str(), i as PanelIndex).is_some() {
            tracing::warn!("duplicate panel id '{}', the last one wins", panel.id);
        }
    }

    let Some(&root_panel) = by_id.get(root) else {
        tracing::warn!("root panel '{root}' not found");
        return None;
    };

    let root_rect = panels[root_panel as usize].rect();
    let mut nodes = vec![PanelNode {
        panel: root_panel,
        id: root.to_owned(),
        rect: root_rect,
        center: root_rect.center(),
        parent: None,
        children: TinyVec::new(),
        joint: None,
    }];
    let mut visited = HashSet::from([root]);

    // Reversed so that children pop off in map order, which keeps the arena in pre-order
    let mut stack: Vec<(NodeIndex, &str)> = map
        .children(root)
        .iter()
        .rev()
        .map(|c| (PanelTree::ROOT, c.as_str()))
        .collect();

    while let Some((parent, child_id)) = stack.pop() {
        let Some(&child_panel) = by_id.get(child_id) else {
            tracing::warn!(
                "driven map links '{}' to unknown panel '{child_id}', skipping",
                nodes[parent as usize].id
            );
            continue;
        };
        let child_rect = panels[child_panel as usize].rect();
        if child_rect.is_degenerate() {
            tracing::warn!("panel '{child_id}' has no area and cannot be hinged, skipping");
            continue;
        }
        if !visited.insert(child_id) {
            tracing::warn!("panel '{child_id}' reached twice, the driven map has a cycle or a shared child");
            continue;
        }

        let parent_node = &nodes[parent as usize];
        let parent_rect = parent_node.rect;
        let parent_pivot = match &parent_node.joint {
            Some(joint) => joint.anchor,
            None => Point3::new(parent_node.center[0], parent_node.center[1], 0.0),
        };

        let joint = match detect_rect_edge(&parent_rect, &child_rect, options.tolerance) {
            Some(edge) => JointInfo::new(&edge, parent_pivot, options.max_fold_angle, false),
            None => {
                tracing::debug!(
                    "no shared edge between '{}' and '{child_id}', inferring the joint",
                    parent_node.id
                );
                let edge = infer_joint_edge(&parent_rect, &child_rect);
                JointInfo::new(&edge, parent_pivot, options.max_fold_angle, true)
            }
        };

        let index = nodes.len() as NodeIndex;
        nodes.push(PanelNode {
            panel: child_panel,
            id: child_id.to_owned(),
            rect: child_rect,
            center: child_rect.center(),
            parent: Some(parent),
            children: TinyVec::new(),
            joint: Some(joint),
        });
        nodes[parent as usize].children.push(index);

        stack.extend(
            map.children(child_id)
                .iter()
                .rev()
                .map(|c| (index, c.as_str())),
        );
    }

    Some(PanelTree { nodes })
}
