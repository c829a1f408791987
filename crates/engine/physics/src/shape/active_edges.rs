//! Active edge classification
//!
//! An edge is active when it can generate contacts. Boundary edges always
//! are. An internal edge shared by two triangles is active only if it is
//! convex and its faces meet at a sharper angle than the configured
//! threshold; flat and concave seams are suppressed so bodies sliding over
//! them do not catch on internal edges.

use glam::Vec3;
use std::collections::HashMap;

/// Normals this close to opposite belong to back-to-back triangles
const BACK_TO_BACK_COS: f32 = -0.999;

/// Per-triangle active edge flags
///
/// Bit `i` of a triangle's flags covers the edge from corner `i` to corner
/// `(i + 1) % 3`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveEdges {
    flags: Vec<u8>,
    count: usize,
}

impl ActiveEdges {
    /// Classify the edges of an indexed triangle list
    pub fn compute(positions: &[Vec3], triangles: &[[u32; 3]], cos_threshold: f32) -> Self {
        let normals: Vec<Vec3> = triangles
            .iter()
            .map(|tri| {
                let a = positions[tri[0] as usize];
                let b = positions[tri[1] as usize];
                let c = positions[tri[2] as usize];
                (b - a).cross(c - a).normalize_or_zero()
            })
            .collect();

        // Undirected edge -> (triangle, edge slot) for every use
        let mut edges: HashMap<(u32, u32), Vec<(usize, u8)>> = HashMap::new();
        for (tri_idx, tri) in triangles.iter().enumerate() {
            for slot in 0..3u8 {
                let a = tri[slot as usize];
                let b = tri[(slot as usize + 1) % 3];
                edges
                    .entry((a.min(b), a.max(b)))
                    .or_default()
                    .push((tri_idx, slot));
            }
        }

        let mut flags = vec![0u8; triangles.len()];
        let mut count = 0;

        for uses in edges.values() {
            let active = match uses.as_slice() {
                [(t1, slot), (t2, _)] => {
                    let tri = triangles[*t1];
                    let from = positions[tri[*slot as usize] as usize];
                    let to = positions[tri[(*slot as usize + 1) % 3] as usize];
                    is_edge_active(normals[*t1], normals[*t2], to - from, cos_threshold)
                }
                // Boundary or non-manifold
                _ => true,
            };

            if active {
                count += 1;
                for (tri_idx, slot) in uses {
                    flags[*tri_idx] |= 1 << slot;
                }
            }
        }

        Self { flags, count }
    }

    /// Number of distinct active edges
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flags of one triangle
    pub fn flags(&self, triangle: usize) -> u8 {
        self.flags.get(triangle).copied().unwrap_or(0)
    }
}

/// `edge_direction` follows the winding of the triangle owning `normal1`
fn is_edge_active(normal1: Vec3, normal2: Vec3, edge_direction: Vec3, cos_threshold: f32) -> bool {
    let cos_angle = normal1.dot(normal2);
    if cos_angle < BACK_TO_BACK_COS {
        return true;
    }

    // Concave
    if normal1.cross(normal2).dot(edge_direction) < 0.0 {
        return false;
    }

    cos_angle < cos_threshold
}
