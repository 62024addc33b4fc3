//! 2D vector utilities for the table plane.
//! Coordinates are table units with the origin at the top-left cushion corner.

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Shorthand constructor
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Dot product
pub fn dot(a: Vec2, b: Vec2) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Squared length, avoids the sqrt for overlap tests
pub fn length_sq(v: Vec2) -> f64 {
    v.x * v.x + v.y * v.y
}

/// Vector length
pub fn length(v: Vec2) -> f64 {
    length_sq(v).sqrt()
}

/// Squared distance between two points
pub fn distance_sq(a: Vec2, b: Vec2) -> f64 {
    length_sq(sub(a, b))
}

/// Normalize vector to unit length. Returns None for (near) zero vectors.
pub fn try_normalize(v: Vec2) -> Option<Vec2> {
    let len = length(v);
    if len < 1e-10 || !len.is_finite() {
        return None;
    }
    Some(Vec2::new(v.x / len, v.y / len))
}

/// Scale vector by scalar
pub fn scale(v: Vec2, s: f64) -> Vec2 {
    Vec2::new(v.x * s, v.y * s)
}

/// Add two vectors
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x + b.x, a.y + b.y)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x - b.x, a.y - b.y)
}

/// Perpendicular (rotated +90 degrees), the tangent of a contact normal.
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Compose a vector from components along a unit normal and its tangent.
pub fn from_basis(normal: Vec2, along_normal: f64, along_tangent: f64) -> Vec2 {
    add(scale(normal, along_normal), scale(perp(normal), along_tangent))
}
