use rcarton_model::{EdgeKind, FoldEdge, Panel, PanelId, Rect, Side};

/// Matching distance used when nothing else is configured.
pub const DEFAULT_TOLERANCE: f32 = 10.0;

/// Tighter matching distance for interactive picking.
pub const UI_TOLERANCE: f32 = 2.0;

/// A crease between two rectangles, described from the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedEdge {
    /// Where the second rectangle lies relative to the first
    pub side: Side,
    pub position: f32,
    pub span_start: f32,
    pub span_end: f32,
    /// Distance between the two matched rectangle edges
    pub gap: f32,
}

impl SharedEdge {
    pub const fn kind(&self) -> EdgeKind {
        self.side.kind()
    }

    pub fn length(&self) -> f32 {
        self.span_end - self.span_start
    }

    /// The same crease seen from the second rectangle.
    pub fn reversed(self) -> Self {
        Self {
            side: self.side.opposite(),
            ..self
        }
    }

    pub fn into_fold_edge(self, parent_id: PanelId, child_id: PanelId) -> FoldEdge {
        FoldEdge {
            kind: self.kind(),
            position: self.position,
            span_start: self.span_start,
            span_end: self.span_end,
            parent_id,
            child_id,
        }
    }
}

fn overlap(a0: f32, a1: f32, b0: f32, b1: f32, tolerance: f32) -> Option<(f32, f32)> {
    let start = a0.max(b0);
    let end = a1.min(b1);
    // Corner contacts (and degenerate rectangles) give a near-empty overlap
    (end - start > tolerance).then_some((start, end))
}

fn hypothesis(
    side: Side,
    near: f32,
    far: f32,
    (span_start, span_end): (f32, f32),
    tolerance: f32,
) -> Option<SharedEdge> {
    let gap = (near - far).abs();
    (gap < tolerance).then(|| SharedEdge {
        side,
        position: (near + far) * 0.5,
        span_start,
        span_end,
        gap,
    })
}

/// Both hypotheses of one axis can hold for thin rectangles; prefer the
/// tighter match so that the answer does not depend on argument order.
fn tighter(a: Option<SharedEdge>, b: Option<SharedEdge>) -> Option<SharedEdge> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if (b.gap, b.position) < (a.gap, a.position) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, b) => a.or(b),
    }
}

/// Finds the crease shared by `a` and `b`, if any.
///
/// Hypotheses are tried in a fixed order: `a`'s bottom against `b`'s top,
/// `b`'s bottom against `a`'s top, then `a`'s right against `b`'s left and
/// `b`'s right against `a`'s left. Edges match when they are closer than
/// `tolerance`, and the overlap along the crease must be longer than
/// `tolerance`. Degenerate rectangles share no edge.
pub fn detect_rect_edge(a: &Rect, b: &Rect, tolerance: f32) -> Option<SharedEdge> {
    if a.is_degenerate() || b.is_degenerate() {
        return None;
    }
    let along_x = overlap(a.left(), a.right(), b.left(), b.right(), tolerance);
    let along_y = overlap(a.top(), a.bottom(), b.top(), b.bottom(), tolerance);

    let horizontal = along_x.and_then(|span| {
        tighter(
            hypothesis(Side::Below, a.bottom(), b.top(), span, tolerance),
            hypothesis(Side::Above, b.bottom(), a.top(), span, tolerance),
        )
    });

    horizontal.or_else(|| {
        along_y.and_then(|span| {
            tighter(
                hypothesis(Side::Right, a.right(), b.left(), span, tolerance),
                hypothesis(Side::Left, b.right(), a.left(), span, tolerance),
            )
        })
    })
}

/// Panel-level wrapper around [`detect_rect_edge`], `parent` being the first rectangle.
pub fn detect_shared_edge(parent: &Panel, child: &Panel, tolerance: f32) -> Option<FoldEdge> {
    detect_rect_edge(&parent.rect(), &child.rect(), tolerance)
        .map(|edge| edge.into_fold_edge(parent.id.clone(), child.id.clone()))
}
