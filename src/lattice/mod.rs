//! Tonal lattice geometry
//!
//! Maps the twelve pitch classes onto a 2D tiling of the viewport. Both
//! layouts share one recurrence: tiling index `(i, j)` carries pitch class
//! `i - 7j (mod 12)`, plus a companion node a major third (+4) higher that
//! sits half a step along both axes. The layouts differ only in which
//! viewport axis is spaced by `unit` and which by `unit * sqrt(3)`.
//!
//! Node `(0, 0)` always lands on the viewport centre.

pub mod adjacency;
pub mod pitch;

pub use adjacency::{adjacent_pairs, adjacent_triangles, AdjacencyBand, AdjacencyIndex};
pub use pitch::{PitchClass, PitchClassError, PITCH_CLASS_COUNT};

use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Semitone step between neighbouring rows of the tiling (`i - 7j`)
const ROW_INTERVAL: i64 = 7;
/// Interval of the half-offset companion node
const COMPANION_INTERVAL: i64 = 4;

/// Which viewport axis carries the `unit` spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Layout A: `i` runs along x at `unit`, `j` runs along y at `unit * sqrt(3)`
    #[default]
    #[serde(alias = "a")]
    Rows,
    /// Layout B: the same tiling with the axes swapped
    #[serde(alias = "b")]
    Columns,
}

impl LayoutKind {
    /// Map (along, across) tiling offsets to viewport (x, y) offsets
    fn place(self, along: f64, across: f64) -> (f64, f64) {
        match self {
            LayoutKind::Rows => (along, across),
            LayoutKind::Columns => (across, along),
        }
    }

    /// Viewport extents as (along, across)
    fn extents(self, width: f64, height: f64) -> (f64, f64) {
        match self {
            LayoutKind::Rows => (width, height),
            LayoutKind::Columns => (height, width),
        }
    }
}

impl std::str::FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rows" | "a" => Ok(LayoutKind::Rows),
            "columns" | "b" => Ok(LayoutKind::Columns),
            other => Err(format!("unknown layout `{other}` (expected rows or columns)")),
        }
    }
}

/// A lattice point in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub pitch_class: PitchClass,
}

impl Node {
    pub fn distance(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Inputs to [`build`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    pub width: f64,
    pub height: f64,
    /// Lattice units spanning `width + height`; higher means smaller nodes
    pub density: f64,
    pub layout: LayoutKind,
}

impl LatticeParameters {
    pub fn new(width: f64, height: f64, density: f64, layout: LayoutKind) -> Self {
        Self {
            width,
            height,
            density,
            layout,
        }
    }

    /// Distance between adjacent nodes in pixels
    ///
    /// Zero whenever the parameters are degenerate (non-positive density,
    /// empty viewport, non-finite input). Callers treat zero as "draw nothing".
    pub fn unit(&self) -> f64 {
        let span = self.width + self.height;
        let valid = self.density.is_finite() && self.density > 0.0 && span.is_finite() && span > 0.0;
        if !valid {
            return 0.0;
        }
        span / self.density
    }
}

/// Number of tiling steps from the centre to cover `extent`, plus one ring
fn half_range(extent: f64, spacing: f64) -> i64 {
    (extent / (2.0 * spacing)).ceil() as i64 + 1
}

fn push_clipped(nodes: &mut Vec<Node>, params: &LatticeParameters, x: f64, y: f64, pc: PitchClass) {
    if x >= 0.0 && x < params.width && y >= 0.0 && y < params.height {
        nodes.push(Node {
            x,
            y,
            pitch_class: pc,
        });
    }
}

/// Generate the visible lattice nodes
///
/// Nodes outside `[0, width) x [0, height)` are dropped, so the count tracks
/// the visible area. Pure and deterministic: identical parameters always
/// produce an identical list in identical order.
pub fn build(params: &LatticeParameters) -> Vec<Node> {
    let unit = params.unit();
    if unit <= 0.0 {
        return Vec::new();
    }

    let step = unit * SQRT_3;
    let (along_extent, across_extent) = params.layout.extents(params.width, params.height);
    let ni = half_range(along_extent, unit);
    let nj = half_range(across_extent, step);
    let (cx, cy) = (params.width / 2.0, params.height / 2.0);

    let mut nodes = Vec::new();
    for j in -nj..=nj {
        for i in -ni..=ni {
            let root = PitchClass::from_semitone(i - ROW_INTERVAL * j);
            let along = i as f64 * unit;
            let across = j as f64 * step;

            let (dx, dy) = params.layout.place(along, across);
            push_clipped(&mut nodes, params, cx + dx, cy + dy, root);

            let (dx, dy) = params.layout.place(along + unit / 2.0, across + step / 2.0);
            push_clipped(
                &mut nodes,
                params,
                cx + dx,
                cy + dy,
                root.transpose(COMPANION_INTERVAL),
            );
        }
    }
    nodes
}

/// Index of the node closest to `(x, y)`, if any lies within `max_distance`
pub fn nearest_node(nodes: &[Node], x: f64, y: f64, max_distance: f64) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (i, (n.x - x).hypot(n.y - y)))
        .filter(|&(_, d)| d <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
