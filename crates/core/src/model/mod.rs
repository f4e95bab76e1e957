use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{LuminaireError, Result};

/// On-disk description of the installation: 3D node positions plus the node
/// pairs spanned by lit segments. One LED per edge.
#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    nodes: Vec<[f32; 3]>,
    edges: Vec<[usize; 2]>,
}

/// Static geometry of the physical installation.
///
/// LEDs are zero-based indices matching the order used by the output server.
/// Positions are normalized so the whole installation fits in the unit cube,
/// which keeps effect math independent of the real-world dimensions. The
/// model is read-only to the rendering core.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    positions: Vec<[f32; 3]>,
    distances: Vec<f32>,
}

impl Model {
    /// Builds a model from raw LED positions. Positions are normalized
    /// against their axis-aligned bounding box.
    pub fn from_positions(raw: Vec<[f32; 3]>) -> Self {
        let positions = normalize(raw);
        let distances = positions.iter().map(|p| base_distance(*p)).collect();
        Self {
            positions,
            distances,
        }
    }

    /// Parses a model from the JSON graph format: `nodes` holding 3D
    /// positions and `edges` holding node-index pairs. Each edge becomes one
    /// LED placed at the edge's midpoint.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(raw)?;
        let mut centers = Vec::with_capacity(file.edges.len());
        for [a, b] in &file.edges {
            let (a, b) = match (file.nodes.get(*a), file.nodes.get(*b)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(LuminaireError::config(format!(
                        "edge ({a}, {b}) references a node that does not exist"
                    )))
                }
            };
            centers.push([
                (a[0] + b[0]) / 2.0,
                (a[1] + b[1]) / 2.0,
                (a[2] + b[2]) / 2.0,
            ]);
        }
        Ok(Self::from_positions(centers))
    }

    /// Loads a model from a JSON graph file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn led_count(&self) -> usize {
        self.positions.len()
    }

    /// Normalized [0, 1] position of one LED.
    pub fn position(&self, led: usize) -> [f32; 3] {
        self.positions[led]
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Distance from the installation's bottom-center to one LED, in
    /// normalized coordinates. Effects use this to propagate "outward" or
    /// "inward" along the piece.
    pub fn distance(&self, led: usize) -> f32 {
        self.distances[led]
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }
}

fn normalize(raw: Vec<[f32; 3]>) -> Vec<[f32; 3]> {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for position in &raw {
        for axis in 0..3 {
            min[axis] = min[axis].min(position[axis]);
            max[axis] = max[axis].max(position[axis]);
        }
    }

    raw.into_iter()
        .map(|position| {
            let mut scaled = [0.0; 3];
            for axis in 0..3 {
                let span = max[axis] - min[axis];
                scaled[axis] = if span > 0.0 {
                    (position[axis] - min[axis]) / span
                } else {
                    0.5
                };
            }
            scaled
        })
        .collect()
}

fn base_distance([x, y, z]: [f32; 3]) -> f32 {
    // Relative to bottom-center of the normalized coordinate space.
    let dx = x - 0.5;
    let dy = y - 0.5;
    (dx * dx + dy * dy + z * z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_positions_to_unit_box() {
        let model = Model::from_positions(vec![[0.0, -2.0, 10.0], [4.0, 2.0, 30.0]]);

        assert_eq!(model.position(0), [0.0, 0.0, 0.0]);
        assert_eq!(model.position(1), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn degenerate_axis_maps_to_center() {
        let model = Model::from_positions(vec![[1.0, 0.0, 5.0], [1.0, 1.0, 5.0]]);

        assert_eq!(model.position(0)[0], 0.5);
        assert_eq!(model.position(1)[2], 0.5);
    }

    #[test]
    fn measures_distance_from_bottom_center() {
        let model = Model::from_positions(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);

        // Bottom-center in normalized space is (0.5, 0.5, 0).
        let expected = (0.25_f32 + 0.25 + 1.0).sqrt();
        assert!((model.distance(1) - expected).abs() < 1e-6);
    }

    #[test]
    fn parses_edges_into_led_centers() {
        let raw = r#"{
            "nodes": [[0, 0, 0], [2, 0, 0], [2, 2, 2]],
            "edges": [[0, 1], [1, 2]]
        }"#;

        let model = Model::from_json(raw).unwrap();

        assert_eq!(model.led_count(), 2);
        // Midpoints (1, 0, 0) and (2, 1, 1) normalize against each other.
        assert_eq!(model.position(0), [0.0, 0.0, 0.0]);
        assert_eq!(model.position(1), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn rejects_edges_with_missing_nodes() {
        let raw = r#"{ "nodes": [[0, 0, 0]], "edges": [[0, 7]] }"#;

        let err = Model::from_json(raw).unwrap_err();
        assert!(format!("{err}").contains("does not exist"));
    }
}
