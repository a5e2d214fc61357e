//! Frame renderer
//!
//! One renderer shared by every driver. Draw order is fixed so later layers
//! occlude earlier ones:
//! 1. background
//! 2. static lattice edges
//! 3. node fills (active nodes in the highlight colour)
//! 4. highlighted edges between adjacent active nodes (2+ active)
//! 5. translucent triangles over mutually adjacent active nodes (3+ active)
//! 6. pitch-class labels on every node

pub mod backend;
pub mod color;
pub mod surface;

pub use backend::{render_svg_string, write_svg, PlottersSurface};
pub use color::{Color, Theme};
pub use surface::{DrawCommand, Point, RecordingSurface, Surface};

use crate::active::ActivePitchSet;
use crate::error::SurfaceError;
use crate::lattice::{adjacent_pairs, adjacent_triangles, AdjacencyBand, Node};

const EDGE_WIDTH: f64 = 1.0;
const ACTIVE_EDGE_WIDTH: f64 = 3.0;
const TRIANGLE_OPACITY: f64 = 0.25;
const MIN_FONT_SIZE: f64 = 12.0;
const MAX_FONT_SIZE: f64 = 20.0;

/// Node radius for a given lattice unit
pub fn node_radius(unit: f64) -> f64 {
    unit / 5.0
}

/// Label size for a given lattice unit
pub fn font_size(unit: f64) -> f64 {
    (node_radius(unit) * 0.8).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// What a frame contained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub nodes: usize,
    pub edges: usize,
    pub active_nodes: usize,
    pub active_edges: usize,
    pub triangles: usize,
}

/// Paint one frame of `nodes` onto `surface`
///
/// A non-positive `unit` draws nothing at all (not even the background) and
/// returns empty stats.
///
/// # Arguments
/// * `surface` - Target, cleared to the background first
/// * `nodes` - Lattice nodes in viewport coordinates
/// * `unit` - Edge length in pixels, sets the adjacency band and node radius
/// * `active` - Pitch classes to highlight
/// * `theme` - Colours for every role
///
/// # Returns
/// Counts of drawn nodes, edges and highlights, or the first surface error.
pub fn render_frame(
    surface: &mut dyn Surface,
    nodes: &[Node],
    unit: f64,
    active: &ActivePitchSet,
    theme: &Theme,
) -> Result<RenderStats, SurfaceError> {
    if unit.is_nan() || unit <= 0.0 {
        return Ok(RenderStats::default());
    }

    let band = AdjacencyBand::for_unit(unit);
    let radius = node_radius(unit);
    let mut stats = RenderStats {
        nodes: nodes.len(),
        ..Default::default()
    };

    let (width, height) = surface.size();
    surface.clear(theme.background)?;
    surface.fill_rect(
        Point::new(0.0, 0.0),
        width as f64,
        height as f64,
        theme.background,
    )?;

    for (a, b) in adjacent_pairs(nodes, band) {
        surface.stroke_line(at(&nodes[a]), at(&nodes[b]), EDGE_WIDTH, theme.edge)?;
        stats.edges += 1;
    }

    let mut lit: Vec<Node> = Vec::new();
    for node in nodes {
        let is_active = active.contains(node.pitch_class);
        let fill = if is_active { theme.highlight } else { theme.base };
        surface.fill_circle(at(node), radius, fill)?;
        if is_active {
            lit.push(*node);
        }
    }
    stats.active_nodes = lit.len();

    if lit.len() >= 2 {
        for (a, b) in adjacent_pairs(&lit, band) {
            surface.stroke_line(at(&lit[a]), at(&lit[b]), ACTIVE_EDGE_WIDTH, theme.accent)?;
            stats.active_edges += 1;
        }
    }

    if lit.len() >= 3 {
        let fill = theme.accent.with_alpha(TRIANGLE_OPACITY);
        for [a, b, c] in adjacent_triangles(&lit, band) {
            surface.fill_polygon(&[at(&lit[a]), at(&lit[b]), at(&lit[c])], fill)?;
            stats.triangles += 1;
        }
    }

    let size = font_size(unit);
    for node in nodes {
        let fill = if active.contains(node.pitch_class) {
            theme.highlight
        } else {
            theme.base
        };
        surface.draw_text(
            node.pitch_class.name(),
            at(node),
            size,
            theme.label_color(fill),
        )?;
    }

    log::trace!(
        "rendered frame: {} nodes, {} edges, {} active, {} triangles",
        stats.nodes,
        stats.edges,
        stats.active_nodes,
        stats.triangles
    );
    Ok(stats)
}

fn at(node: &Node) -> Point {
    Point::new(node.x, node.y)
}
