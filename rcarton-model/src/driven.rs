use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::PanelId;

/// Directed fold hierarchy: which panel's motion carries which others.
///
/// Children keep their insertion order, which is the order they are laid out
/// and scheduled in. The map is expected to describe a single rooted tree;
/// [`DrivenMap::add_edge`] refuses any insertion that would close a cycle and
/// [`DrivenMap::validate`] checks maps that came from elsewhere.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrivenMap {
    entries: BTreeMap<PanelId, Vec<PanelId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrivenMapError {
    /// The child already drives the parent (directly or through descendants)
    WouldCreateCycle { parent: PanelId, child: PanelId },
    /// A child listed twice under the same parent
    DuplicateChild { parent: PanelId, child: PanelId },
    MultipleParents {
        child: PanelId,
        first: PanelId,
        second: PanelId,
    },
    RootHasParent { root: PanelId, parent: PanelId },
    CycleDetected { panel: PanelId },
    /// Entry not reachable from the root, the map is a forest
    Unreachable { panel: PanelId },
}

impl std::fmt::Display for DrivenMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WouldCreateCycle { parent, child } => write!(
                f,
                "cannot make '{parent}' drive '{child}': '{child}' already drives '{parent}', this would create a cycle"
            ),
            Self::DuplicateChild { parent, child } => {
                write!(f, "'{child}' is listed more than once under '{parent}'")
            }
            Self::MultipleParents {
                child,
                first,
                second,
            } => write!(
                f,
                "'{child}' is driven by both '{first}' and '{second}', a panel can only have one parent"
            ),
            Self::RootHasParent { root, parent } => {
                write!(f, "root panel '{root}' is driven by '{parent}'")
            }
            Self::CycleDetected { panel } => write!(f, "cycle detected through '{panel}'"),
            Self::Unreachable { panel } => {
                write!(f, "'{panel}' is not reachable from the root panel")
            }
        }
    }
}

impl std::error::Error for DrivenMapError {}

impl DrivenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes entries as-is, without any check. Use [`DrivenMap::validate`] on
    /// the result when the source is not trusted.
    pub fn from_entries(entries: BTreeMap<PanelId, Vec<PanelId>>) -> Self {
        Self { entries }
    }

    /// Builds a map through [`DrivenMap::add_edge`], stopping at the first rejected edge.
    pub fn from_edges<P, C, I>(edges: I) -> Result<Self, DrivenMapError>
    where
        P: Into<PanelId>,
        C: Into<PanelId>,
        I: IntoIterator<Item = (P, C)>,
    {
        let mut map = Self::new();
        for (parent, child) in edges {
            map.add_edge(parent, child)?;
        }
        Ok(map)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn children(&self, parent: &str) -> &[PanelId] {
        self.entries
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, child: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, children)| children.iter().any(|c| c == child))
            .map(|(parent, _)| parent.as_str())
    }

    pub fn contains_edge(&self, parent: &str, child: &str) -> bool {
        self.children(parent).iter().any(|c| c == child)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PanelId, &[PanelId])> {
        self.entries
            .iter()
            .map(|(parent, children)| (parent, children.as_slice()))
    }

    /// Every `(parent, child)` pair, parents in key order, children in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(parent, children)| {
            children
                .iter()
                .map(move |child| (parent.as_str(), child.as_str()))
        })
    }

    /// Whether `target` can be reached from `from` by following parent → child links.
    pub fn reaches(&self, from: &str, target: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.children(current).iter().map(String::as_str));
        }
        false
    }

    /// Inserts `parent → child`.
    ///
    /// Rejected without touching the map when `child` already reaches `parent`
    /// (self-loops included). A child that already has another parent is moved
    /// under the new one.
    pub fn add_edge(
        &mut self,
        parent: impl Into<PanelId>,
        child: impl Into<PanelId>,
    ) -> Result<(), DrivenMapError> {
        let parent = parent.into();
        let child = child.into();

        if self.reaches(&child, &parent) {
            return Err(DrivenMapError::WouldCreateCycle { parent, child });
        }

        if let Some(previous) = self.parent_of(&child).map(str::to_owned) {
            if previous == parent {
                return Ok(());
            }
            self.detach(&previous, &child);
        }

        self.entries.entry(parent).or_default().push(child);
        Ok(())
    }

    /// Returns whether the edge existed.
    pub fn remove_edge(&mut self, parent: &str, child: &str) -> bool {
        self.detach(parent, child)
    }

    fn detach(&mut self, parent: &str, child: &str) -> bool {
        let Some(children) = self.entries.get_mut(parent) else {
            return false;
        };
        let before = children.len();
        children.retain(|c| c != child);
        let removed = children.len() != before;
        if children.is_empty() {
            self.entries.remove(parent);
        }
        removed
    }

    /// Breadth-first order starting at `root` (included). Re-visits are skipped,
    /// so a malformed map still yields each panel at most once.
    pub fn walk_order(&self, root: &str) -> Vec<PanelId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current.to_owned());
            queue.extend(self.children(current).iter().map(String::as_str));
        }
        order
    }

    /// Pre-order descendants of `of`, excluding `of` itself.
    pub fn descendants(&self, of: &str) -> Vec<PanelId> {
        let mut visited = HashSet::from([of]);
        let mut stack: Vec<&str> = self.children(of).iter().rev().map(String::as_str).collect();
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current.to_owned());
            stack.extend(self.children(current).iter().rev().map(String::as_str));
        }
        out
    }

    /// Checks that the map is a single tree hanging from `root`.
    pub fn validate(&self, root: &str) -> Result<(), DrivenMapError> {
        let mut parents: HashMap<&str, &str> = HashMap::new();
        for (parent, child) in self.edges() {
            match parents.insert(child, parent) {
                Some(first) if first == parent => {
                    return Err(DrivenMapError::DuplicateChild {
                        parent: parent.to_owned(),
                        child: child.to_owned(),
                    })
                }
                Some(first) => {
                    return Err(DrivenMapError::MultipleParents {
                        child: child.to_owned(),
                        first: first.to_owned(),
                        second: parent.to_owned(),
                    })
                }
                None => {}
            }
        }

        if let Some(parent) = parents.get(root) {
            return Err(DrivenMapError::RootHasParent {
                root: root.to_owned(),
                parent: (*parent).to_owned(),
            });
        }

        let visited: HashSet<PanelId> = self.walk_order(root).into_iter().collect();
        let mut mentioned: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        mentioned.extend(parents.keys().copied());

        for panel in mentioned {
            if visited.contains(panel) {
                continue;
            }
            // Climb parents: coming back to a panel means the stray part is a loop
            let mut seen = HashSet::from([panel]);
            let mut current = panel;
            while let Some(&parent) = parents.get(current) {
                if !seen.insert(parent) {
                    return Err(DrivenMapError::CycleDetected {
                        panel: parent.to_owned(),
                    });
                }
                current = parent;
            }
            return Err(DrivenMapError::Unreachable {
                panel: panel.to_owned(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DrivenMap {
        DrivenMap::from_edges([("a", "b"), ("a", "c"), ("b", "d")]).unwrap()
    }

    #[test]
    fn children_keep_insertion_order() {
        let map = sample();
        assert_eq!(map.children("a"), ["b", "c"]);
        assert_eq!(map.children("d"), [] as [PanelId; 0]);
        assert_eq!(map.parent_of("d"), Some("b"));
        assert_eq!(map.parent_of("a"), None);
        assert_eq!(map.edge_count(), 3);
    }

    #[test]
    fn cycle_is_rejected_and_map_unchanged() {
        let mut map = sample();
        let before = map.clone();

        let err = map.add_edge("d", "a").unwrap_err();
        assert_eq!(
            err,
            DrivenMapError::WouldCreateCycle {
                parent: "d".into(),
                child: "a".into()
            }
        );
        assert_eq!(map, before);

        assert!(map.add_edge("c", "c").is_err());
        assert_eq!(map, before);
    }

    #[test]
    fn valid_edge_reparents() {
        let mut map = sample();
        map.add_edge("c", "d").unwrap();
        assert_eq!(map.parent_of("d"), Some("c"));
        assert!(!map.contains_edge("b", "d"));
        // b lost its only child, so its entry disappears
        assert!(map.iter().all(|(parent, _)| parent != "b"));
        map.validate("a").unwrap();
    }

    #[test]
    fn adding_existing_edge_is_noop() {
        let mut map = sample();
        let before = map.clone();
        map.add_edge("a", "b").unwrap();
        assert_eq!(map, before);
    }

    #[test]
    fn remove_edge() {
        let mut map = sample();
        assert!(map.remove_edge("b", "d"));
        assert!(!map.remove_edge("b", "d"));
        assert_eq!(map.edge_count(), 2);
    }

    #[test]
    fn walk_and_descendants() {
        let map = sample();
        assert_eq!(map.walk_order("a"), ["a", "b", "c", "d"]);
        assert_eq!(map.descendants("a"), ["b", "d", "c"]);
        assert!(map.reaches("a", "d"));
        assert!(!map.reaches("d", "a"));
    }

    #[test]
    fn validate_reports_problems() {
        sample().validate("a").unwrap();

        let two_parents = DrivenMap::from_entries(BTreeMap::from([
            ("a".to_owned(), vec!["b".to_owned()]),
            ("c".to_owned(), vec!["b".to_owned()]),
        ]));
        assert!(matches!(
            two_parents.validate("a"),
            Err(DrivenMapError::MultipleParents { .. })
        ));

        let forest = DrivenMap::from_edges([("a", "b"), ("x", "y")]).unwrap();
        assert_eq!(
            forest.validate("a"),
            Err(DrivenMapError::Unreachable { panel: "x".into() })
        );

        let looped = DrivenMap::from_entries(BTreeMap::from([
            ("a".to_owned(), vec!["b".to_owned()]),
            ("x".to_owned(), vec!["y".to_owned()]),
            ("y".to_owned(), vec!["x".to_owned()]),
        ]));
        assert!(matches!(
            looped.validate("a"),
            Err(DrivenMapError::CycleDetected { .. })
        ));

        assert!(matches!(
            sample().validate("b"),
            Err(DrivenMapError::RootHasParent { .. })
        ));
    }

    #[test]
    fn walk_survives_cycles() {
        let looped = DrivenMap::from_entries(BTreeMap::from([
            ("a".to_owned(), vec!["b".to_owned()]),
            ("b".to_owned(), vec!["a".to_owned()]),
        ]));
        assert_eq!(looped.walk_order("a"), ["a", "b"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejected_edit_is_byte_identical() {
        let mut map = sample();
        let before = serde_json::to_string(&map).unwrap();
        assert!(map.add_edge("d", "b").is_err());
        assert_eq!(serde_json::to_string(&map).unwrap(), before);
        assert_eq!(before, r#"{"a":["b","c"],"b":["d"]}"#);
    }
}
