//! Triangle snapshot used by the ray tracer.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use tessera_core::{Color, VertexData};
use tessera_math::{Aabb, Ray, Vec3};

use crate::Payload;

/// Determinants smaller than this are treated as a ray parallel to the plane.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Padding applied to bounding boxes so flat triangles stay hittable.
const BOUNDS_PADDING: f32 = 0.0001;

/// Read-only copy of three vertices plus precomputed edges.
///
/// Material terms come from the first vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    /// Edge b - a
    pub ba: Vec3,
    /// Edge c - a
    pub ca: Vec3,
    pub na: Vec3,
    pub nb: Vec3,
    pub nc: Vec3,
    pub ambient: Color,
    pub diffuse: Color,
    pub emissive: Color,
}

impl Triangle {
    pub fn new<V: VertexData>(vertex_a: &V, vertex_b: &V, vertex_c: &V) -> Self {
        let (a, b, c) = (vertex_a.position(), vertex_b.position(), vertex_c.position());
        Self {
            a,
            b,
            c,
            ba: b - a,
            ca: c - a,
            na: vertex_a.normal(),
            nb: vertex_b.normal(),
            nc: vertex_c.normal(),
            ambient: vertex_a.ambient(),
            diffuse: vertex_a.diffuse(),
            emissive: vertex_a.emissive(),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        let bbox = Aabb::enclosing([self.a, self.b, self.c]);
        Aabb::from_points(
            bbox.min - Vec3::splat(BOUNDS_PADDING),
            bbox.max + Vec3::splat(BOUNDS_PADDING),
        )
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Unit geometric normal for counter-clockwise winding.
    pub fn face_normal(&self) -> Vec3 {
        self.ba.cross(self.ca).normalize_or_zero()
    }

    /// Shading normal blended from the vertex normals. Falls back to the face
    /// normal when the vertex normals cancel out.
    pub fn interpolate_normal(&self, bary: Vec3) -> Vec3 {
        (bary.x * self.na + bary.y * self.nb + bary.z * self.nc)
            .try_normalize()
            .unwrap_or_else(|| self.face_normal())
    }

    /// Möller-Trumbore intersection. Returns `Payload::MISS` (t = -1) for
    /// near-parallel rays and for points outside the triangle.
    pub fn intersect(&self, ray: &Ray) -> Payload {
        let pvec = ray.direction.cross(self.ca);
        let det = self.ba.dot(pvec);

        // Ray is parallel to triangle
        if det.abs() < PARALLEL_EPSILON {
            return Payload::MISS;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin - self.a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return Payload::MISS;
        }

        let qvec = tvec.cross(self.ba);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return Payload::MISS;
        }

        Payload {
            t: self.ca.dot(qvec) * inv_det,
            bary: Vec3::new(1.0 - u - v, u, v),
            color: Color::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Vertex;
    use tessera_math::Interval;

    fn vertex(position: Vec3) -> Vertex {
        Vertex {
            position,
            normal: Vec3::Z,
            ..Default::default()
        }
    }

    /// Triangle in the z = -1 plane, counter-clockwise seen from the origin.
    fn facing_triangle() -> Triangle {
        Triangle::new(
            &vertex(Vec3::new(-1.0, -1.0, -1.0)),
            &vertex(Vec3::new(1.0, -1.0, -1.0)),
            &vertex(Vec3::new(0.0, 1.0, -1.0)),
        )
    }

    #[test]
    fn test_material_from_first_vertex() {
        let mut first = vertex(Vec3::ZERO);
        first.emissive = Color::ONE;
        first.diffuse = Color::splat(0.25);
        let mut other = vertex(Vec3::X);
        other.emissive = Color::new(0.0, 1.0, 0.0);

        let triangle = Triangle::new(&first, &other, &vertex(Vec3::Y));
        assert_eq!(triangle.emissive, Color::ONE);
        assert_eq!(triangle.diffuse, Color::splat(0.25));
        assert_eq!(triangle.ba, Vec3::X);
        assert_eq!(triangle.ca, Vec3::Y);
    }

    #[test]
    fn test_ray_through_centroid_hits() {
        let triangle = facing_triangle();
        let ray = Ray::new(Vec3::ZERO, triangle.centroid());

        let payload = triangle.intersect(&ray);
        assert!(payload.t > 0.0);
        assert!((payload.bary.element_sum() - 1.0).abs() < 1e-5);
        assert!(payload.bary.min_element() >= 0.0 && payload.bary.max_element() <= 1.0);
        assert!((payload.bary - Vec3::splat(1.0 / 3.0)).length() < 1e-4);
        assert!((ray.at(payload.t) - triangle.centroid()).length() < 1e-4);
    }

    #[test]
    fn test_hit_from_behind_is_reported() {
        // Culling is a shading decision; the intersection is two-sided.
        let triangle = facing_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let payload = triangle.intersect(&ray);
        assert!((payload.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_away_misses() {
        let triangle = facing_triangle();
        let payload = triangle.intersect(&Ray::new(Vec3::ZERO, Vec3::Z));
        assert!(!payload.is_hit_within(Interval::new(0.001, 1000.0)));
    }

    #[test]
    fn test_ray_beside_misses() {
        let triangle = facing_triangle();
        let payload = triangle.intersect(&Ray::new(Vec3::new(5.0, 0.0, 0.0), -Vec3::Z));
        assert_eq!(payload, Payload::MISS);
    }

    #[test]
    fn test_parallel_ray_misses() {
        let triangle = facing_triangle();
        let payload = triangle.intersect(&Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X));
        assert_eq!(payload.t, -1.0);
    }

    #[test]
    fn test_degenerate_triangle_misses() {
        let collapsed = Triangle::new(
            &vertex(Vec3::new(0.0, 0.0, -1.0)),
            &vertex(Vec3::new(1.0, 0.0, -1.0)),
            &vertex(Vec3::new(2.0, 0.0, -1.0)),
        );
        let payload = collapsed.intersect(&Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, -1.0)));
        assert_eq!(payload, Payload::MISS);
        assert_eq!(collapsed.face_normal(), Vec3::ZERO);
    }

    #[test]
    fn test_interpolate_normal_falls_back_to_face_normal() {
        let mut triangle = facing_triangle();
        triangle.na = Vec3::ZERO;
        triangle.nb = Vec3::ZERO;
        triangle.nc = Vec3::ZERO;

        let n = triangle.interpolate_normal(Vec3::splat(1.0 / 3.0));
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_bounding_box_is_padded() {
        let bbox = facing_triangle().bounding_box();
        assert!(bbox.min.z < -1.0 && bbox.max.z > -1.0);
        assert!(bbox.min.x < -1.0 && bbox.max.x > 1.0);
    }
}
