//! Nearest-neighbour tests on lattice nodes
//!
//! Two nodes are adjacent when their distance lies strictly inside
//! `(0.9 * unit, 1.05 * unit)`. The band excludes coincident nodes and
//! second neighbours (the closest of which sit `sqrt(3) * unit` apart).
//! Static edges, highlighted edges and highlighted triangles all go through
//! the same band so they never disagree.

use super::Node;

pub const BAND_LOWER: f64 = 0.9;
pub const BAND_UPPER: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyBand {
    lower: f64,
    upper: f64,
}

impl AdjacencyBand {
    pub fn for_unit(unit: f64) -> Self {
        Self {
            lower: BAND_LOWER * unit,
            upper: BAND_UPPER * unit,
        }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance > self.lower && distance < self.upper
    }

    pub fn adjacent(&self, a: &Node, b: &Node) -> bool {
        self.contains(a.distance(b))
    }
}

/// All adjacent index pairs `(i, j)` with `i < j`
pub fn adjacent_pairs(nodes: &[Node], band: AdjacencyBand) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            if band.adjacent(&nodes[i], &nodes[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// All index triples whose three pairwise distances are inside the band
///
/// Cubic in `nodes.len()`; only meant for the active subset.
pub fn adjacent_triangles(nodes: &[Node], band: AdjacencyBand) -> Vec<[usize; 3]> {
    let mut triangles = Vec::new();
    let n = nodes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            if !band.adjacent(&nodes[i], &nodes[j]) {
                continue;
            }
            for k in (j + 1)..n {
                if band.adjacent(&nodes[i], &nodes[k]) && band.adjacent(&nodes[j], &nodes[k]) {
                    triangles.push([i, j, k]);
                }
            }
        }
    }
    triangles
}

/// Neighbour lists for a whole node list
///
/// Used for point queries (which nodes touch the one under the cursor);
/// rendering recomputes pairs per frame instead.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    band: AdjacencyBand,
    neighbours: Vec<Vec<usize>>,
}

impl AdjacencyIndex {
    pub fn new(nodes: &[Node], unit: f64) -> Self {
        let band = AdjacencyBand::for_unit(unit);
        let mut neighbours = vec![Vec::new(); nodes.len()];
        for (i, j) in adjacent_pairs(nodes, band) {
            neighbours[i].push(j);
            neighbours[j].push(i);
        }
        Self { band, neighbours }
    }

    pub fn band(&self) -> AdjacencyBand {
        self.band
    }

    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.neighbours.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbours(a).contains(&b)
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbours.iter().map(Vec::len).sum::<usize>() / 2
    }
}
