//! Convex/concave classification of a fitted surface relative to the
//! viewer.

use glam::Vec3;

use crate::geometry::Geometry;

/// Whether the surface seen at `hit` is the outside (convex) of the
/// primitive.
///
/// Only spheres and cylinders can be viewed from the inside. The sphere
/// test runs along the line from `ray_origin` to the centre; the cylinder
/// test runs in the cross-section through `hit`. Everything else is
/// reported convex.
pub fn is_convex(geometry: &Geometry, ray_origin: Vec3, _ray_direction: Vec3, hit: Vec3) -> bool {
    match *geometry {
        Geometry::Sphere { center, radius } => outside_of(center - ray_origin, ray_origin, hit, radius),
        Geometry::Cylinder { bottom, top, radius } => {
            let axis = (top - bottom).normalize_or_zero();
            if axis == Vec3::ZERO {
                return true;
            }
            let center = (bottom + top) * 0.5;
            // project the origin and the axis point into the hit's cross-section
            let origin = ray_origin + (hit - ray_origin).dot(axis) * axis;
            let base = center + (hit - center).dot(axis) * axis - origin;
            outside_of(base, origin, hit, radius)
        }
        _ => true,
    }
}

/// The viewer at `origin` is outside the circle/sphere of `radius` whose
/// centre is `origin + base`, and `hit` lies on the near side.
fn outside_of(base: Vec3, origin: Vec3, hit: Vec3, radius: f32) -> bool {
    let distance = base.length();
    if !(radius < distance) {
        return false;
    }
    (hit - origin).dot(base / distance) < distance
}
