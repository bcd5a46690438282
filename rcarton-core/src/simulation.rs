use std::sync::Arc;

use bitflags::bitflags;
use rcarton_layout::{build_panel_tree, plan_fold, resolve_order, AutoFoldSequence, FoldInputs, FoldSequencer};
use rcarton_model::{DrivenMap, DrivenMapError, Panel, PanelId};
use rcarton_rig::{sanitize_progress, FoldRig, Pose};

use crate::config::{ConfigError, FoldConfig};

bitflags! {
    /// What has to be recomputed before the next frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Invalidation: u8 {
        /// Folding order or timing windows
        const SCHEDULE = 1 << 0;
        /// Panels, driven links, root or anything feeding the mesh
        const TOPOLOGY = 1 << 1;
        const ALL = Self::SCHEDULE.bits() | Self::TOPOLOGY.bits();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(ConfigError),
    Driven(DrivenMapError),
    UnknownPanel(PanelId),
    /// There is no panel to fold yet
    Empty,
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Driven(e) => write!(f, "invalid driven link: {e}"),
            Self::UnknownPanel(id) => write!(f, "no panel with id '{id}'"),
            Self::Empty => write!(f, "the simulation holds no panel"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Driven(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DrivenMapError> for SimulationError {
    fn from(e: DrivenMapError) -> Self {
        Self::Driven(e)
    }
}

/// Host-facing state of one folding object.
///
/// Inputs are set piecemeal; the fold plan and the rig are rebuilt lazily,
/// only as far as the changes require, and published as immutable `Arc`s that
/// are swapped out wholesale. Moving the fold progress never rebuilds anything.
#[derive(Debug)]
pub struct FoldSimulation {
    config: FoldConfig,
    panels: Vec<Panel>,
    driven: Option<DrivenMap>,
    root: Option<PanelId>,
    order: Option<Vec<PanelId>>,
    fold_progress: f32,
    pending: Invalidation,
    plan: Option<Arc<AutoFoldSequence>>,
    rig: Option<Arc<FoldRig>>,
}

impl Default for FoldSimulation {
    fn default() -> Self {
        Self {
            config: FoldConfig::default(),
            panels: Vec::new(),
            driven: None,
            root: None,
            order: None,
            fold_progress: 0.0,
            pending: Invalidation::empty(),
            plan: None,
            rig: None,
        }
    }
}

impl FoldSimulation {
    pub fn new(config: FoldConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &FoldConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FoldConfig) -> Result<(), SimulationError> {
        config.validate()?;
        let retimed = FoldConfig {
            overlap_ratio: self.config.overlap_ratio,
            ..config
        };
        if retimed != self.config {
            self.pending |= Invalidation::TOPOLOGY;
        } else if config.overlap_ratio != self.config.overlap_ratio {
            self.pending |= Invalidation::SCHEDULE;
        }
        self.config = config;
        Ok(())
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Replaces the layout. Returns the ids that are gone, so that caches
    /// keyed by panel can drop them.
    pub fn set_panels(&mut self, panels: Vec<Panel>) -> Vec<PanelId> {
        let removed = self
            .panels
            .iter()
            .filter(|old| !panels.iter().any(|p| p.id == old.id))
            .map(|old| old.id.clone())
            .collect();
        self.panels = panels;
        self.pending |= Invalidation::TOPOLOGY;
        removed
    }

    /// `None` lets the driven map be derived from the layout.
    pub fn set_driven_map(&mut self, driven: Option<DrivenMap>) {
        self.driven = driven;
        self.pending |= Invalidation::TOPOLOGY;
    }

    /// `None` lets the root be selected from the layout.
    pub fn set_root(&mut self, root: Option<PanelId>) {
        self.root = root;
        self.pending |= Invalidation::TOPOLOGY;
    }

    /// `None` folds in walk order.
    pub fn set_fold_order(&mut self, order: Option<Vec<PanelId>>) {
        self.order = order;
        self.pending |= Invalidation::SCHEDULE;
    }

    fn require_panel(&self, id: &str) -> Result<(), SimulationError> {
        if self.panels.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(SimulationError::UnknownPanel(id.to_owned()))
        }
    }

    /// The map edits start from: the host's own, or the one in use. Editing
    /// the derived map pins its root as well.
    fn editable_map(&mut self) -> Result<DrivenMap, SimulationError> {
        if let Some(map) = &self.driven {
            return Ok(map.clone());
        }
        let plan = self.plan().ok_or(SimulationError::Empty)?;
        if self.root.is_none() {
            self.root = Some(plan.root.clone());
        }
        Ok(plan.driven.clone())
    }

    /// Makes `parent` drive `child`, moving `child` away from its former
    /// parent. Refused, with nothing changed, when it would close a cycle.
    pub fn add_driven_edge(&mut self, parent: &str, child: &str) -> Result<(), SimulationError> {
        self.require_panel(parent)?;
        self.require_panel(child)?;
        let mut map = self.editable_map()?;
        map.add_edge(parent, child)?;
        self.set_driven_map(Some(map));
        Ok(())
    }

    /// Returns whether the link existed.
    pub fn remove_driven_edge(&mut self, parent: &str, child: &str) -> Result<bool, SimulationError> {
        let mut map = self.editable_map()?;
        let removed = map.remove_edge(parent, child);
        if removed {
            self.set_driven_map(Some(map));
        }
        Ok(removed)
    }

    pub fn fold_progress(&self) -> f32 {
        self.fold_progress
    }

    pub fn set_fold_progress(&mut self, progress: f32) {
        self.fold_progress = sanitize_progress(progress);
    }

    pub fn pending(&self) -> Invalidation {
        self.pending
    }

    /// Brings the published plan and rig up to date. Returns what was rebuilt.
    #[tracing::instrument(skip(self), fields(pending = ?self.pending))]
    pub fn rebuild(&mut self) -> Invalidation {
        let pending = self.pending;
        if pending.contains(Invalidation::TOPOLOGY) || (self.plan.is_none() && !pending.is_empty()) {
            self.rebuild_topology();
        } else if pending.contains(Invalidation::SCHEDULE) {
            self.rebuild_schedule();
        }
        self.pending = Invalidation::empty();
        pending
    }

    fn rebuild_topology(&mut self) {
        let inputs = FoldInputs {
            driven: self.driven.as_ref(),
            root: self.root.as_deref(),
            order: self.order.as_deref(),
        };
        let Some(plan) = plan_fold(&self.panels, &inputs, &self.config.layout_options()) else {
            tracing::debug!("nothing to fold");
            self.plan = None;
            self.rig = None;
            return;
        };

        self.rig = build_panel_tree(&self.panels, &plan.driven, &plan.root, &self.config.tree_options())
            .map(|tree| Arc::new(FoldRig::build(tree, &plan.schedule, &self.config.mesh_builder())));
        self.plan = Some(Arc::new(plan));
    }

    fn rebuild_schedule(&mut self) {
        let (Some(plan), Some(rig)) = (&self.plan, &self.rig) else {
            return;
        };
        let order = resolve_order(&plan.driven, &plan.root, self.order.as_deref());
        let schedule = FoldSequencer::new(self.config.overlap_ratio).schedule(&plan.root, &order);

        let mut sequence = schedule.sequence.clone();
        sequence.extend(plan.unreached.iter().cloned());
        let rig = Arc::new(rig.retimed(&schedule));
        let plan = Arc::new(AutoFoldSequence {
            sequence,
            schedule,
            ..AutoFoldSequence::clone(plan)
        });

        self.rig = Some(rig);
        self.plan = Some(plan);
    }

    /// Up-to-date fold plan, `None` while there is nothing to fold.
    pub fn plan(&mut self) -> Option<Arc<AutoFoldSequence>> {
        self.rebuild();
        self.plan.clone()
    }

    /// Up-to-date rig, `None` while there is nothing to fold.
    pub fn rig(&mut self) -> Option<Arc<FoldRig>> {
        self.rebuild();
        self.rig.clone()
    }

    /// Whatever was published last, without rebuilding.
    pub fn published(&self) -> Option<Arc<FoldRig>> {
        self.rig.clone()
    }

    /// Bone rotations for the current fold progress.
    pub fn pose(&mut self) -> Option<Pose> {
        let progress = self.fold_progress;
        self.rig().map(|rig| rig.pose(progress))
    }

    pub fn deformed_positions(&mut self) -> Option<Vec<[f32; 3]>> {
        let progress = self.fold_progress;
        self.rig().map(|rig| rig.deformed_positions(progress))
    }
}

static_assertions::assert_impl_all!(FoldSimulation: Send, Sync);
