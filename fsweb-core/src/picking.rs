//! Seed selection along a view ray, plus the screen-to-world helpers used
//! to build that ray.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Index of the best seed point along the ray.
///
/// A point `p` with `s = p - origin` and `len = dot(direction, s)` is
/// inside the picking cylinder when `|s|² < (probe_radius² + 1) · len²`,
/// i.e. its distance from the ray is below `probe_radius · len`. The
/// nearest inside point wins. With nothing inside, the point with the
/// largest `len / |s|` (smallest angle to the ray) is returned. Points
/// behind or at the origin are ignored. `direction` should be unit length.
pub fn pick_seed(origin: Vec3, direction: Vec3, points: &[Vec3], probe_radius: f32) -> Option<usize> {
    let factor = probe_radius * probe_radius + 1.0;

    let mut inside: Option<(usize, f32)> = None;
    let mut fallback: Option<(usize, f32)> = None;

    for (index, &p) in points.iter().enumerate() {
        let s = p - origin;
        let len = direction.dot(s);
        if len < f32::EPSILON {
            continue;
        }

        let s_sq = s.length_squared();
        if s_sq < factor * len * len {
            if inside.is_none_or(|(_, best)| len < best) {
                inside = Some((index, len));
            }
        } else if inside.is_none() {
            let cos = len / s_sq.sqrt();
            if fallback.is_none_or(|(_, best)| cos > best) {
                fallback = Some((index, cos));
            }
        }
    }

    inside.or(fallback).map(|(index, _)| index)
}

// ── Screen helpers ───────────────────────────────────────────────

/// Screen position (origin top-left, y down) to normalized device
/// coordinates (origin centre, y up).
pub fn screen_to_ndc(position: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        2.0 * (position.x / viewport.x) - 1.0,
        -(2.0 * (position.y / viewport.y) - 1.0),
    )
}

/// World-space length at unit depth covered by `length` screen pixels,
/// measured along the viewport's shorter side.
pub fn screen_length_to_world(length: f32, viewport: Vec2, projection: &Mat4) -> f32 {
    if viewport.x < viewport.y {
        (length / viewport.x) / projection.x_axis.x
    } else {
        (length / viewport.y) / projection.y_axis.y
    }
}

/// Unit world-space direction of the ray through `ndc`.
///
/// `camera_to_world` is the inverse view matrix.
pub fn ndc_to_ray_direction(ndc: Vec2, camera_to_world: &Mat4, projection: &Mat4) -> Vec3 {
    let z = if projection.z_axis.z > 0.0 { 1.0 } else { -1.0 };
    let local = Vec4::new(ndc.x / projection.x_axis.x, ndc.y / projection.y_axis.y, z, 0.0);
    (*camera_to_world * local).truncate().normalize_or_zero()
}
