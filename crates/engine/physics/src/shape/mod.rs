//! Collision shapes produced by the engine
//!
//! Every shape is immutable once created and shared through [`ShapeRef`].
//! Decorators ([`DoubleSidedShape`], [`ScaledShape`]) hold a reference to the
//! shape they wrap and never copy its geometry.
//!
//! # Shapes
//!
//! - [`HeightFieldShape`]: Quantized regular grid, triangulated implicitly
//! - [`MeshShape`]: Explicit vertices and indexed triangles
//! - [`DoubleSidedShape`]: Reports hits on both faces of the inner surface
//! - [`ScaledShape`]: Non-uniform scale applied to the inner shape

mod active_edges;
mod decorated;
mod height_field;
mod mesh;
mod triangle;

pub use active_edges::ActiveEdges;
pub use decorated::{with_scale, DoubleSidedShape, ScaledShape};
pub use height_field::{HeightFieldSettings, HeightFieldShape};
pub use mesh::{MeshSettings, MeshShape};
pub use triangle::{intersect_ray, to_point, to_vec3, triangle_normal};

use glam::Vec3;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::Triangle;
use std::fmt;
use std::sync::Arc;

/// Shared handle to an immutable collision shape
pub type ShapeRef = Arc<dyn CollisionShape>;

/// Concrete type behind a [`ShapeRef`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    HeightField,
    Mesh,
    DoubleSided,
    Scaled,
}

/// Result of a ray query against a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray, in units of the ray direction
    pub toi: f32,
    /// Hit position in shape space
    pub point: Vec3,
    /// Unit normal facing the ray origin
    pub normal: Vec3,
    /// Whether the ray struck the back of the triangle
    pub back_face: bool,
}

/// Queries answered by every collision shape
///
/// Triangles are reported in shape space with counter-clockwise winding seen
/// from the front face.
pub trait CollisionShape: fmt::Debug + Send + Sync {
    fn kind(&self) -> ShapeKind;

    /// The wrapped shape, for decorators
    fn inner(&self) -> Option<&ShapeRef> {
        None
    }

    fn local_aabb(&self) -> Aabb;

    fn triangle_count(&self) -> usize;

    fn visit_triangles(&self, visitor: &mut dyn FnMut(&Triangle));

    /// Number of distinct edges that generate contacts
    fn active_edge_count(&self) -> usize;

    /// Whether back faces collide
    fn is_double_sided(&self) -> bool {
        false
    }

    fn as_height_field(&self) -> Option<&HeightFieldShape> {
        None
    }

    fn as_mesh(&self) -> Option<&MeshShape> {
        None
    }

    /// Closest hit along `origin + dir * t` for `t` in `[0, max_toi]`
    ///
    /// Back faces are skipped unless the shape is double-sided. Every triangle
    /// is tested, there is no spatial culling.
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_toi: f32) -> Option<RayHit> {
        let double_sided = self.is_double_sided();
        let mut closest: Option<RayHit> = None;

        self.visit_triangles(&mut |tri| {
            let Some(hit) = intersect_ray(tri, origin, dir) else {
                return;
            };
            if hit.toi > max_toi || (hit.back_face && !double_sided) {
                return;
            }
            if closest.map_or(true, |best| hit.toi < best.toi) {
                closest = Some(hit);
            }
        });

        closest
    }

    /// Surface height below `(x, z)`, sampled with a downward ray
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let aabb = self.local_aabb();
        let top = aabb.maxs.y + 1.0;
        let span = top - aabb.mins.y + 1.0;

        self.cast_ray(Vec3::new(x, top, z), Vec3::NEG_Y, span)
            .map(|hit| hit.point.y)
    }
}

/// Walks the decorator chain, outermost first
pub fn shape_chain(shape: &ShapeRef) -> Vec<ShapeKind> {
    let mut kinds = vec![shape.kind()];
    let mut current = shape.inner();
    while let Some(inner) = current {
        kinds.push(inner.kind());
        current = inner.inner();
    }
    kinds
}

/// The innermost shape behind any number of decorators
pub fn innermost(shape: &ShapeRef) -> &ShapeRef {
    let mut current = shape;
    while let Some(inner) = current.inner() {
        current = inner;
    }
    current
}
