//! Small 2D geometry helpers shared by the table, the integrator and the rules.

use glam::Vec2;

/// Reflect `v` about a surface with unit normal `normal`.
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    v - 2.0 * v.dot(normal) * normal
}

/// Shortest distance from `point` to the segment `a`–`b`.
pub fn segment_point_distance(a: Vec2, b: Vec2, point: Vec2) -> f32 {
    let line = b - a;
    let len_sq = line.length_squared();
    if len_sq < 1e-12 {
        return a.distance(point);
    }
    // Project point onto line, clamped to segment
    let t = ((point - a).dot(line) / len_sq).clamp(0.0, 1.0);
    (a + line * t).distance(point)
}

/// Distance along a ray (`origin`, unit `dir`) to the first intersection with
/// a circle, or `None` when the ray misses or the circle is behind the origin.
pub fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = -b - sqrt_disc;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin inside the circle: only report it when still moving inward.
    let far = -b + sqrt_disc;
    if c < 0.0 && b < 0.0 && far >= 0.0 {
        return Some(0.0);
    }
    None
}

/// Point on a quadratic bezier at parameter `t`.
#[inline]
pub fn quadratic_bezier(p0: Vec2, control: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + control * (2.0 * u * t) + p1 * (t * t)
}

/// Sample a quadratic bezier into `segments + 1` points, both ends included.
pub fn sample_quadratic(p0: Vec2, control: Vec2, p1: Vec2, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| quadratic_bezier(p0, control, p1, i as f32 / segments as f32))
        .collect()
}

/// Move `current` toward `target` by the fraction `rate * dt`, clamped to 1.
#[inline]
pub fn blend_toward(current: Vec2, target: Vec2, rate: f32, dt: f32) -> Vec2 {
    current.lerp(target, (rate * dt).clamp(0.0, 1.0))
}
