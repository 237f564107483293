//! Vertex layout consumed by both pipelines.

use bytemuck::{Pod, Zeroable};
use tessera_math::{Vec2, Vec3};

use crate::Color;

/// Per-vertex attributes as produced by the model loader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub texture: Vec2,
    pub ambient: Color,
    pub diffuse: Color,
    pub emissive: Color,
}

/// Attribute access the pipelines need from a vertex type.
///
/// The rasterizer overwrites the position with its screen-space value and
/// interpolates whole vertices across a triangle; the ray tracer reads
/// positions, normals and material terms to build triangles.
pub trait VertexData: Copy + Send + Sync + 'static {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn normal(&self) -> Vec3;
    fn ambient(&self) -> Color;
    fn diffuse(&self) -> Color;
    fn emissive(&self) -> Color;

    /// Blend three vertices with barycentric `weights` (x for `a`, y for `b`,
    /// z for `c`).
    fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self;
}

impl VertexData for Vertex {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn normal(&self) -> Vec3 {
        self.normal
    }

    fn ambient(&self) -> Color {
        self.ambient
    }

    fn diffuse(&self) -> Color {
        self.diffuse
    }

    fn emissive(&self) -> Color {
        self.emissive
    }

    fn interpolate(a: &Self, b: &Self, c: &Self, weights: Vec3) -> Self {
        let blend3 =
            |pa: Vec3, pb: Vec3, pc: Vec3| pa * weights.x + pb * weights.y + pc * weights.z;
        Self {
            position: blend3(a.position, b.position, c.position),
            normal: blend3(a.normal, b.normal, c.normal),
            texture: a.texture * weights.x + b.texture * weights.y + c.texture * weights.z,
            ambient: blend3(a.ambient, b.ambient, c.ambient),
            diffuse: blend3(a.diffuse, b.diffuse, c.diffuse),
            emissive: blend3(a.emissive, b.emissive, c.emissive),
        }
    }
}
