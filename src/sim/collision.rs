//! Narrow-phase collision detection for circles and edges
//!
//! Normals always point from the other shape toward the circle being
//! tested, so pushing the circle along the normal separates the pair.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit), midway through the overlap
    pub point: Vec2,
    /// Unit normal pointing toward the tested circle's center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Closest point to `p` on segment `a`..`b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Circle B against circle A. Normal points from A to B.
pub fn circle_circle(center_a: Vec2, radius_a: f32, center_b: Vec2, radius_b: f32) -> CollisionResult {
    let delta = center_b - center_a;
    let dist_sq = delta.length_squared();
    let radii = radius_a + radius_b;
    if dist_sq >= radii * radii {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: pick a stable direction (straight up)
    let normal = if dist > 1e-9 {
        delta / dist
    } else {
        Vec2::new(0.0, -1.0)
    };
    let penetration = radii - dist;
    let point = center_a + normal * (radius_a - penetration * 0.5);
    CollisionResult {
        hit: true,
        point,
        normal,
        penetration,
    }
}

/// Circle against a two-sided edge `a`..`b`. Normal points from the edge
/// toward the circle.
pub fn circle_edge(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> CollisionResult {
    let closest = closest_point_on_segment(center, a, b);
    let delta = center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-9 {
        delta / dist
    } else {
        // Center exactly on the line: use the segment's left-hand perpendicular
        (b - a).perp().normalize_or_zero()
    };
    let penetration = radius - dist;
    CollisionResult {
        hit: true,
        point: closest + normal * (-penetration * 0.5),
        normal,
        penetration,
    }
}
