//! Result of a ray query.

use tessera_core::Color;
use tessera_math::{Interval, Vec3};

/// Intersection record passed between the tracer and its shaders.
///
/// `t == -1` marks a rejected or absent hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payload {
    /// Ray parameter of the intersection
    pub t: f32,
    /// Barycentric weights for the triangle's vertices a, b, c
    pub bary: Vec3,
    /// Resolved color
    pub color: Color,
}

impl Payload {
    pub const MISS: Payload = Payload {
        t: -1.0,
        bary: Vec3::ZERO,
        color: Color::ZERO,
    };

    /// A miss carrying a color, e.g. from a miss shader.
    pub fn with_color(color: Color) -> Self {
        Self { color, ..Self::MISS }
    }

    /// True if the hit lies strictly inside `ray_t`.
    #[inline]
    pub fn is_hit_within(&self, ray_t: Interval) -> bool {
        ray_t.surrounds(self.t)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::MISS
    }
}
