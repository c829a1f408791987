//! Explicit triangle mesh

use super::active_edges::ActiveEdges;
use super::triangle::to_point;
use super::{CollisionShape, ShapeKind};
use crate::error::EngineError;
use glam::Vec3;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::Triangle;

/// Settings for creating a [`MeshShape`]
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSettings {
    pub vertices: Vec<Vec3>,
    /// Counter-clockwise seen from the front face
    pub triangles: Vec<[u32; 3]>,
    /// Cosine of the active edge threshold angle
    pub active_edge_cos_threshold: f32,
}

impl MeshSettings {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            active_edge_cos_threshold: super::HeightFieldSettings::DEFAULT_ACTIVE_EDGE_COS_THRESHOLD,
        }
    }

    /// Validate the settings and build the shape
    ///
    /// Triangles that reuse a vertex index are dropped; the mesh is rejected
    /// if nothing is left afterwards.
    pub fn create(self) -> Result<MeshShape, EngineError> {
        let Self {
            vertices,
            mut triangles,
            active_edge_cos_threshold,
        } = self;

        if let Some(vertex) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(EngineError::new(format!(
                "mesh vertex {vertex} is not finite"
            )));
        }

        let vertex_count = vertices.len();
        if let Some(triangle) = triangles
            .iter()
            .find(|tri| tri.iter().any(|&i| i as usize >= vertex_count))
        {
            return Err(EngineError::new(format!(
                "triangle {triangle:?} references a vertex outside of the {vertex_count} provided"
            )));
        }

        triangles.retain(|[a, b, c]| a != b && b != c && a != c);
        if triangles.is_empty() {
            return Err(EngineError::new("need triangles to create a mesh shape"));
        }

        let mut aabb = Aabb::new_invalid();
        for vertex in &vertices {
            aabb.take_point(to_point(*vertex));
        }

        let active_edges = ActiveEdges::compute(&vertices, &triangles, active_edge_cos_threshold);

        Ok(MeshShape {
            vertices,
            triangles,
            active_edges,
            aabb,
        })
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone)]
pub struct MeshShape {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    active_edges: ActiveEdges,
    aabb: Aabb,
}

impl MeshShape {
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn active_edges(&self) -> &ActiveEdges {
        &self.active_edges
    }
}

impl CollisionShape for MeshShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Mesh
    }

    fn local_aabb(&self) -> Aabb {
        self.aabb
    }

    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn visit_triangles(&self, visitor: &mut dyn FnMut(&Triangle)) {
        for [a, b, c] in &self.triangles {
            visitor(&Triangle::new(
                to_point(self.vertices[*a as usize]),
                to_point(self.vertices[*b as usize]),
                to_point(self.vertices[*c as usize]),
            ));
        }
    }

    fn active_edge_count(&self) -> usize {
        self.active_edges.count()
    }

    fn as_mesh(&self) -> Option<&MeshShape> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_create_quad() {
        let shape = MeshSettings::new(quad(), vec![[0, 2, 1], [1, 2, 3]])
            .create()
            .unwrap();

        assert_eq!(shape.triangle_count(), 2);
        assert_eq!(shape.triangles(), &[[0, 2, 1], [1, 2, 3]]);
        // Four perimeter edges, flat diagonal
        assert_eq!(shape.active_edge_count(), 4);

        let aabb = shape.local_aabb();
        assert_eq!(aabb.maxs.x, 1.0);
        assert_eq!(aabb.maxs.z, 1.0);
    }

    #[test]
    fn test_height_query() {
        let mut vertices = quad();
        vertices[3].y = 2.0;
        let shape = MeshSettings::new(vertices, vec![[0, 2, 1], [1, 2, 3]])
            .create()
            .unwrap();

        assert_eq!(shape.height_at(0.0, 0.0), Some(0.0));
        let corner = shape.height_at(1.0, 1.0).unwrap();
        assert!((corner - 2.0).abs() < 1e-5);
        assert_eq!(shape.height_at(2.0, 2.0), None);
    }

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let shape = MeshSettings::new(quad(), vec![[0, 2, 1], [1, 1, 3]])
            .create()
            .unwrap();
        assert_eq!(shape.triangle_count(), 1);

        let err = MeshSettings::new(quad(), vec![[0, 0, 1]]).create().unwrap_err();
        assert!(err.message().contains("need triangles"));
    }

    #[test]
    fn test_rejects_invalid_mesh() {
        assert!(MeshSettings::new(quad(), vec![]).create().is_err());
        assert!(MeshSettings::new(quad(), vec![[0, 2, 4]]).create().is_err());

        let mut vertices = quad();
        vertices[0].y = f32::INFINITY;
        assert!(MeshSettings::new(vertices, vec![[0, 2, 1]]).create().is_err());
    }

    #[test]
    fn test_one_sided_by_default() {
        let shape = MeshSettings::new(quad(), vec![[0, 2, 1], [1, 2, 3]])
            .create()
            .unwrap();

        let from_below = shape.cast_ray(Vec3::new(0.5, -1.0, 0.5), Vec3::Y, 10.0);
        assert!(from_below.is_none());

        let from_above = shape.cast_ray(Vec3::new(0.5, 1.0, 0.5), Vec3::NEG_Y, 10.0);
        assert!(from_above.is_some());
    }
}
