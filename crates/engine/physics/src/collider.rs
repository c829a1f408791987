//! Rapier collider export
//!
//! Flattens a built shape into a rapier triangle mesh so it can be dropped
//! into a rapier `ColliderSet`. Shared vertices are welded so rapier can fix
//! up internal edges between neighbouring triangles.

use crate::shape::{to_vec3, ShapeRef};
use rapier3d::math::{Point, Real};
use rapier3d::prelude::{Collider, ColliderBuilder, TriMeshFlags};
use std::collections::HashMap;

/// Build a trimesh collider from the triangles of `shape`
///
/// Returns `None` if the shape has no triangles or rapier rejects the mesh.
///
/// Rapier trimeshes collide from both sides, so a double-sided wrapper has no
/// separate representation in the export. The collider holds the inner
/// triangles once and a single-sided shape exports the same way.
pub fn to_collider(shape: &ShapeRef) -> Option<Collider> {
    if shape.is_double_sided() {
        tracing::debug!("Exporting double-sided shape as a plain trimesh");
    }

    let mut vertices: Vec<Point<Real>> = Vec::with_capacity(shape.triangle_count() * 3);
    let mut indices: Vec<[u32; 3]> = Vec::with_capacity(shape.triangle_count());
    let mut welded: HashMap<[u32; 3], u32> = HashMap::new();

    let mut index_of = |p: &Point<Real>, vertices: &mut Vec<Point<Real>>| -> u32 {
        let key = to_vec3(p).to_array().map(f32::to_bits);
        *welded.entry(key).or_insert_with(|| {
            vertices.push(*p);
            (vertices.len() - 1) as u32
        })
    };

    shape.visit_triangles(&mut |tri| {
        let a = index_of(&tri.a, &mut vertices);
        let b = index_of(&tri.b, &mut vertices);
        let c = index_of(&tri.c, &mut vertices);
        indices.push([a, b, c]);
    });

    if indices.is_empty() {
        return None;
    }

    match ColliderBuilder::trimesh_with_flags(vertices, indices, TriMeshFlags::FIX_INTERNAL_EDGES) {
        Ok(builder) => Some(builder.build()),
        Err(e) => {
            tracing::warn!("Failed to build trimesh collider: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::HeightGrid;
    use crate::settings::PhysicsSettings;
    use crate::HeightMapBuilder;

    fn build(grid: &HeightGrid) -> ShapeRef {
        HeightMapBuilder::new()
            .with_settings(PhysicsSettings::default())
            .build(grid)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_height_field_collider() {
        let shape = build(&HeightGrid::from_fn(5, 5, |x, z| (x * z) as f32 * 0.5));
        let collider = to_collider(&shape).unwrap();

        let trimesh = collider.shape().as_trimesh().expect("Expected trimesh collider");
        assert_eq!(trimesh.indices().len(), 32);
        // One vertex per sample after welding
        assert_eq!(trimesh.vertices().len(), 25);
    }

    #[test]
    fn test_double_sided_exports_inner_triangles() {
        let grid = HeightGrid::flat(3, 3, 0.0);
        let shape = build(&grid);
        assert!(shape.is_double_sided());

        let inner = HeightMapBuilder::new()
            .with_settings(PhysicsSettings::default())
            .build_mesh(&grid)
            .unwrap();
        let wrapped = to_collider(&shape).unwrap();
        let plain = to_collider(&inner).unwrap();

        let wrapped = wrapped.shape().as_trimesh().expect("Expected trimesh collider");
        let plain = plain.shape().as_trimesh().expect("Expected trimesh collider");
        assert_eq!(wrapped.indices(), plain.indices());
        assert_eq!(wrapped.indices().len(), 8);
    }

    #[test]
    fn test_mesh_collider_bounds() {
        let shape = build(&HeightGrid::flat(4, 6, 1.0));
        let collider = to_collider(&shape).unwrap();

        let aabb = collider.compute_aabb();
        assert!((aabb.mins.x + 1.5).abs() < 1e-5);
        assert!((aabb.maxs.z - 2.5).abs() < 1e-5);
        assert!((aabb.maxs.y - 1.0).abs() < 1e-5);
    }
}
