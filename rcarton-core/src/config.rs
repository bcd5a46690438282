use rcarton_layout::{LayoutOptions, SiblingMode, TreeOptions, DEFAULT_MAX_FOLD_ANGLE, DEFAULT_OVERLAP, DEFAULT_TOLERANCE};
use rcarton_rig::{SkeletalMeshBuilder, DEFAULT_CREASE_WIDTH, FOLD_SEGMENTS};

/// Tunables of the whole pipeline. Missing fields take their default.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FoldConfig {
    pub tolerance: f32,
    pub overlap_ratio: f32,
    pub fold_segments: u32,
    pub crease_width: f32,
    pub max_fold_angle: f32,
    pub sibling_mode: SiblingMode,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            overlap_ratio: DEFAULT_OVERLAP,
            fold_segments: FOLD_SEGMENTS,
            crease_width: DEFAULT_CREASE_WIDTH,
            max_fold_angle: DEFAULT_MAX_FOLD_ANGLE,
            sibling_mode: SiblingMode::Chain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidTolerance(f32),
    InvalidOverlap(f32),
    NoFoldSegments,
    InvalidCreaseWidth(f32),
    InvalidFoldAngle(f32),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTolerance(v) => {
                write!(f, "tolerance must be a finite, non-negative distance, got {v}")
            }
            Self::InvalidOverlap(v) => write!(f, "overlap ratio must lie in [0, 1], got {v}"),
            Self::NoFoldSegments => write!(f, "creases need at least one fold segment"),
            Self::InvalidCreaseWidth(v) => {
                write!(f, "crease width must be a finite, non-negative distance, got {v}")
            }
            Self::InvalidFoldAngle(v) => {
                write!(f, "max fold angle must lie in (0, pi] radians, got {v}")
            }
            Self::Parse(msg) => write!(f, "could not parse fold configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl FoldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let distance = |v: f32| v.is_finite() && v >= 0.0;
        if !distance(self.tolerance) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if !(0.0..=1.0).contains(&self.overlap_ratio) {
            return Err(ConfigError::InvalidOverlap(self.overlap_ratio));
        }
        if self.fold_segments == 0 {
            return Err(ConfigError::NoFoldSegments);
        }
        if !distance(self.crease_width) {
            return Err(ConfigError::InvalidCreaseWidth(self.crease_width));
        }
        if !(self.max_fold_angle > 0.0 && self.max_fold_angle <= std::f32::consts::PI) {
            return Err(ConfigError::InvalidFoldAngle(self.max_fold_angle));
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            tolerance: self.tolerance,
            overlap: self.overlap_ratio,
            sibling_mode: self.sibling_mode,
        }
    }

    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            tolerance: self.tolerance,
            max_fold_angle: self.max_fold_angle,
        }
    }

    pub fn mesh_builder(&self) -> SkeletalMeshBuilder {
        SkeletalMeshBuilder {
            fold_segments: self.fold_segments,
            crease_width: self.crease_width,
        }
    }
}
