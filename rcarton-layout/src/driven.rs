use std::collections::VecDeque;

use rcarton_model::{DrivenMap, Panel, PanelId, PanelIndex, Side};
use tinyvec::TinyVec;

use crate::adjacency::Adjacency;

/// Turns a group of same-side siblings, claimed by one parent, into
/// parent → child links.
pub trait SiblingPolicy {
    fn link(&self, parent: &str, group: &[PanelId], out: &mut Vec<(PanelId, PanelId)>);
}

static_assertions::assert_obj_safe!(SiblingPolicy);

/// The first panel of a group hangs off the parent and each following
/// panel hangs off the previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainSiblings;

impl SiblingPolicy for ChainSiblings {
    fn link(&self, parent: &str, group: &[PanelId], out: &mut Vec<(PanelId, PanelId)>) {
        let mut previous = parent;
        for child in group {
            out.push((previous.to_owned(), child.clone()));
            previous = child.as_str();
        }
    }
}

/// Every panel of a group hangs off the parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelSiblings;

impl SiblingPolicy for ParallelSiblings {
    fn link(&self, parent: &str, group: &[PanelId], out: &mut Vec<(PanelId, PanelId)>) {
        out.extend(group.iter().map(|child| (parent.to_owned(), child.clone())));
    }
}

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiblingMode {
    #[default]
    Chain,
    Parallel,
}

impl SiblingMode {
    pub fn policy(self) -> &'static dyn SiblingPolicy {
        match self {
            Self::Chain => &ChainSiblings,
            Self::Parallel => &ParallelSiblings,
        }
    }
}

/// Neighbours claimed by one parent, grouped by the side they lie on.
/// Groups keep the order in which their side first shows up.
fn group_by_side(claimed: &[(Side, PanelIndex)]) -> Vec<(Side, TinyVec<[PanelIndex; 4]>)> {
    let mut groups: Vec<(Side, TinyVec<[PanelIndex; 4]>)> = Vec::with_capacity(4);
    for &(side, index) in claimed {
        match groups.iter_mut().find(|(s, _)| *s == side) {
            Some((_, members)) => members.push(index),
            None => {
                let mut members = TinyVec::new();
                members.push(index);
                groups.push((side, members));
            }
        }
    }
    groups
}

/// Derives the fold hierarchy from the adjacency graph.
///
/// Breadth-first from `root`: each panel claims its not yet visited
/// neighbours, which `policy` then links under it side by side. Panels out of
/// reach of the root are left out of the map.
#[tracing::instrument(skip_all, fields(root = %panels[root as usize].id))]
pub fn derive_driven_map(
    panels: &[Panel],
    adjacency: &Adjacency,
    root: PanelIndex,
    policy: &dyn SiblingPolicy,
) -> DrivenMap {
    let mut visited = vec![false; panels.len()];
    visited[root as usize] = true;

    let mut queue = VecDeque::from([root]);
    let mut links = Vec::new();
    let mut map = DrivenMap::new();

    while let Some(current) = queue.pop_front() {
        let claimed = adjacency
            .neighbours(current)
            .iter()
            .filter(|n| !std::mem::replace(&mut visited[n.index as usize], true))
            .map(|n| (n.edge.side, n.index))
            .collect::<Vec<_>>();

        for (side, members) in group_by_side(&claimed) {
            let ids = members
                .iter()
                .map(|&i| panels[i as usize].id.clone())
                .collect::<Vec<_>>();
            tracing::event!(
                tracing::Level::TRACE,
                "{} claims {:?} on its {:?} side",
                panels[current as usize].id,
                ids,
                side
            );
            links.clear();
            policy.link(&panels[current as usize].id, &ids, &mut links);
            for (parent, child) in links.drain(..) {
                if let Err(e) = map.add_edge(parent, child) {
                    tracing::warn!("skipping driven link: {e}");
                }
            }
            queue.extend(members);
        }
    }

    map
}
