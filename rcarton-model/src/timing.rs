use crate::PanelId;

/// Linear ramp of `global` over `[start, end]`, clamped to `[0, 1]`.
///
/// A zero-length window behaves as a step at `start`.
pub fn calculate_local_progress(global: f32, start: f32, end: f32) -> f32 {
    if global.is_nan() || global < start {
        return 0.0;
    }
    if global >= end {
        return 1.0;
    }
    ((global - start) / (end - start)).clamp(0.0, 1.0)
}

/// Slice of the global fold progress during which one panel folds.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct TimingWindow {
    pub panel_id: PanelId,
    pub start: f32,
    pub end: f32,
}

impl TimingWindow {
    /// The root never folds.
    pub fn root(panel_id: impl Into<PanelId>) -> Self {
        Self {
            panel_id: panel_id.into(),
            start: 0.0,
            end: 0.0,
        }
    }

    pub fn local_progress(&self, global: f32) -> f32 {
        calculate_local_progress(global, self.start, self.end)
    }

    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Fold order plus one window per panel of that order, root first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldSchedule {
    pub sequence: Vec<PanelId>,
    pub windows: Vec<TimingWindow>,
}

impl FoldSchedule {
    pub fn window(&self, panel_id: &str) -> Option<&TimingWindow> {
        self.windows.iter().find(|w| w.panel_id == panel_id)
    }

    pub fn root(&self) -> Option<&str> {
        self.sequence.first().map(String::as_str)
    }
}
