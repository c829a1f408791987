//! Decorator shapes
//!
//! Decorators forward every query to the shape they wrap. They never copy or
//! re-triangulate the inner geometry, so creating one is O(1).

use super::triangle::{to_point, to_vec3};
use super::{CollisionShape, ShapeKind, ShapeRef};
use glam::Vec3;
use rapier3d::math::{Point, Real};
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::Triangle;
use std::sync::Arc;

/// Makes both faces of the inner surface collidable
#[derive(Debug, Clone)]
pub struct DoubleSidedShape {
    inner: ShapeRef,
}

impl DoubleSidedShape {
    pub fn new(inner: ShapeRef) -> Self {
        Self { inner }
    }
}

impl CollisionShape for DoubleSidedShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::DoubleSided
    }

    fn inner(&self) -> Option<&ShapeRef> {
        Some(&self.inner)
    }

    fn local_aabb(&self) -> Aabb {
        self.inner.local_aabb()
    }

    fn triangle_count(&self) -> usize {
        self.inner.triangle_count()
    }

    fn visit_triangles(&self, visitor: &mut dyn FnMut(&Triangle)) {
        self.inner.visit_triangles(visitor)
    }

    fn active_edge_count(&self) -> usize {
        self.inner.active_edge_count()
    }

    fn is_double_sided(&self) -> bool {
        true
    }
}

/// Applies a non-uniform scale to the inner shape
///
/// A scale with a negative determinant turns the geometry inside out; the
/// triangle winding is reversed in that case so front faces keep facing the
/// same side of the surface.
#[derive(Debug, Clone)]
pub struct ScaledShape {
    inner: ShapeRef,
    scale: Vec3,
}

impl ScaledShape {
    pub fn new(inner: ShapeRef, scale: Vec3) -> Self {
        Self { inner, scale }
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    fn is_inside_out(&self) -> bool {
        self.scale.x * self.scale.y * self.scale.z < 0.0
    }
}

impl CollisionShape for ScaledShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Scaled
    }

    fn inner(&self) -> Option<&ShapeRef> {
        Some(&self.inner)
    }

    fn local_aabb(&self) -> Aabb {
        let aabb = self.inner.local_aabb();
        let a = to_vec3(&aabb.mins) * self.scale;
        let b = to_vec3(&aabb.maxs) * self.scale;
        Aabb::new(to_point(a.min(b)), to_point(a.max(b)))
    }

    fn triangle_count(&self) -> usize {
        self.inner.triangle_count()
    }

    fn visit_triangles(&self, visitor: &mut dyn FnMut(&Triangle)) {
        let scale = self.scale;
        let inside_out = self.is_inside_out();
        let transform = |p: &Point<Real>| to_point(to_vec3(p) * scale);

        self.inner.visit_triangles(&mut |tri| {
            let a = transform(&tri.a);
            let b = transform(&tri.b);
            let c = transform(&tri.c);
            let scaled = if inside_out {
                Triangle::new(a, c, b)
            } else {
                Triangle::new(a, b, c)
            };
            visitor(&scaled);
        });
    }

    fn active_edge_count(&self) -> usize {
        self.inner.active_edge_count()
    }

    fn is_double_sided(&self) -> bool {
        self.inner.is_double_sided()
    }
}

/// Wraps `shape` in a [`ScaledShape`] unless `scale` is one
pub fn with_scale(shape: ShapeRef, scale: Vec3) -> ShapeRef {
    if scale == Vec3::ONE {
        shape
    } else {
        Arc::new(ScaledShape::new(shape, scale))
    }
}
