use crate::PanelId;

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// Crease running along the x axis, at a constant y
    Horizontal,

    /// Crease running along the y axis, at a constant x
    Vertical,
}

/// Where a panel sits relative to the panel it is hinged to.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Left,
    Right,
    Above,
    Below,
}

impl Side {
    pub const fn kind(self) -> EdgeKind {
        match self {
            Self::Left | Self::Right => EdgeKind::Vertical,
            Self::Above | Self::Below => EdgeKind::Horizontal,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Above => Self::Below,
            Self::Below => Self::Above,
        }
    }

    /// +1 when the far panel lies towards growing layout coordinates.
    pub const fn outward_sign(self) -> f32 {
        match self {
            Self::Right | Self::Below => 1.0,
            Self::Left | Self::Above => -1.0,
        }
    }
}

/// A crease shared by exactly two panels.
///
/// `position` is the constant coordinate of the crease line (y for horizontal
/// creases, x for vertical ones) and `span_start..span_end` its extent along
/// the other axis.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FoldEdge {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EdgeKind,
    pub position: f32,
    pub span_start: f32,
    pub span_end: f32,
    pub parent_id: PanelId,
    pub child_id: PanelId,
}

impl FoldEdge {
    pub fn length(&self) -> f32 {
        self.span_end - self.span_start
    }

    /// Crease midpoint in layout coordinates.
    pub fn midpoint(&self) -> [f32; 2] {
        let along = (self.span_start + self.span_end) * 0.5;
        match self.kind {
            EdgeKind::Horizontal => [along, self.position],
            EdgeKind::Vertical => [self.position, along],
        }
    }

    pub fn swapped(self) -> Self {
        Self {
            parent_id: self.child_id,
            child_id: self.parent_id,
            ..self
        }
    }

    /// Same crease line, ignoring which panel drives which.
    pub fn same_geometry(&self, other: &FoldEdge, epsilon: f32) -> bool {
        self.kind == other.kind
            && (self.position - other.position).abs() <= epsilon
            && (self.span_start - other.span_start).abs() <= epsilon
            && (self.span_end - other.span_end).abs() <= epsilon
    }
}
