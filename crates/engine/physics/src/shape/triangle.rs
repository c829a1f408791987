//! Triangle helpers shared by all shapes
//!
//! Shapes keep their geometry in glam types and hand out parry `Triangle`s
//! to visitors, so collider export and ray queries see the same data.

use super::RayHit;
use glam::Vec3;
use rapier3d::math::{Point, Real};
use rapier3d::parry::shape::Triangle;

/// Barycentric slack so rays through shared edges and vertices still hit
const BARYCENTRIC_EPSILON: f32 = 1.0e-5;

pub fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

pub fn to_vec3(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

/// Unnormalized face normal following the winding `a -> b -> c`
pub fn triangle_normal(tri: &Triangle) -> Vec3 {
    let a = to_vec3(&tri.a);
    (to_vec3(&tri.b) - a).cross(to_vec3(&tri.c) - a)
}

/// Ray/triangle intersection (Möller–Trumbore), reporting which face was hit
pub fn intersect_ray(tri: &Triangle, origin: Vec3, dir: Vec3) -> Option<RayHit> {
    let a = to_vec3(&tri.a);
    let ab = to_vec3(&tri.b) - a;
    let ac = to_vec3(&tri.c) - a;

    let p = dir.cross(ac);
    let det = ab.dot(p);
    if det.abs() <= f32::EPSILON * ab.length() * ac.length() * dir.length() {
        // Parallel to the plane or degenerate
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(-BARYCENTRIC_EPSILON..=1.0 + BARYCENTRIC_EPSILON).contains(&u) {
        return None;
    }

    let q = s.cross(ab);
    let v = dir.dot(q) * inv_det;
    if v < -BARYCENTRIC_EPSILON || u + v > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    let toi = ac.dot(q) * inv_det;
    if toi < 0.0 {
        return None;
    }

    let normal = ab.cross(ac).normalize_or_zero();
    let back_face = normal.dot(dir) > 0.0;

    Some(RayHit {
        toi,
        point: origin + dir * toi,
        normal: if back_face { -normal } else { normal },
        back_face,
    })
}
