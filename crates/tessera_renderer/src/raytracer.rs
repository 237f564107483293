//! Recursive ray tracer with a programmable shading chain.
//!
//! Primary rays are generated per pixel from a camera basis and traced
//! against a bounding volume hierarchy. What happens at a hit or a miss is
//! decided entirely by the installed shaders; a closest-hit shader receives
//! the tracer itself so it can cast further rays with the remaining depth.

use std::sync::Arc;
use std::time::Instant;

use rand::RngCore;
use rayon::prelude::*;
use tessera_core::{Color, RenderTargetColor, SharedBuffer, TypedBuffer, VertexData};
use tessera_math::{Interval, Ray, Vec3};

use crate::acceleration::BvhNode;
use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::error::{check_viewport, RenderError, Result};
use crate::sampling::pixel_rng;
use crate::{Payload, Triangle};

/// Default far limit for `trace_ray`.
pub const DEFAULT_MAX_T: f32 = 1000.0;
/// Default near limit for `trace_ray`; keeps secondary rays off their origin surface.
pub const DEFAULT_MIN_T: f32 = 0.001;

/// Called when a ray hits nothing within range, or when depth runs out.
pub type MissShader = dyn Fn(&Ray) -> Payload + Send + Sync;

/// Called at the nearest hit with the already-decremented depth.
pub type ClosestHitShader<V, RT> =
    dyn Fn(&Raytracer<V, RT>, &Ray, Payload, &Triangle, usize, &mut dyn RngCore) -> Payload
        + Send
        + Sync;

/// Called at the first hit found in traversal order. Installing one turns the
/// tracer into an occlusion tracer.
pub type AnyHitShader = dyn Fn(&Ray, Payload, &Triangle) -> Payload + Send + Sync;

pub struct Raytracer<V, RT> {
    vertex_buffers: Vec<Arc<TypedBuffer<V>>>,
    index_buffers: Vec<Arc<TypedBuffer<u32>>>,
    render_target: Option<SharedBuffer<RT>>,
    acceleration_structure: Option<Arc<BvhNode>>,
    width: usize,
    height: usize,
    seed: u64,
    bucket_size: usize,
    miss_shader: Option<Box<MissShader>>,
    closest_hit_shader: Option<Box<ClosestHitShader<V, RT>>>,
    any_hit_shader: Option<Box<AnyHitShader>>,
}

impl<V: VertexData, RT: RenderTargetColor> Default for Raytracer<V, RT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexData, RT: RenderTargetColor> Raytracer<V, RT> {
    pub fn new() -> Self {
        Self {
            vertex_buffers: Vec::new(),
            index_buffers: Vec::new(),
            render_target: None,
            acceleration_structure: None,
            width: 1920,
            height: 1080,
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
            miss_shader: None,
            closest_hit_shader: None,
            any_hit_shader: None,
        }
    }

    pub fn set_render_target(&mut self, render_target: SharedBuffer<RT>) {
        self.render_target = Some(render_target);
    }

    pub fn clear_render_target(&self, clear_value: RT) -> Result<()> {
        let render_target = self
            .render_target
            .as_ref()
            .ok_or(RenderError::MissingRenderTarget)?;
        render_target.write().fill(clear_value);
        Ok(())
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// One vertex buffer per shape, parallel to `set_index_buffers`.
    pub fn set_vertex_buffers(&mut self, vertex_buffers: Vec<Arc<TypedBuffer<V>>>) {
        self.vertex_buffers = vertex_buffers;
    }

    pub fn set_index_buffers(&mut self, index_buffers: Vec<Arc<TypedBuffer<u32>>>) {
        self.index_buffers = index_buffers;
    }

    /// Seed for the per-pixel random generators handed to shaders.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Edge length of the square tiles rendered in parallel.
    pub fn set_bucket_size(&mut self, bucket_size: usize) {
        self.bucket_size = bucket_size.max(1);
    }

    pub fn set_miss_shader<F>(&mut self, shader: F)
    where
        F: Fn(&Ray) -> Payload + Send + Sync + 'static,
    {
        self.miss_shader = Some(Box::new(shader));
    }

    pub fn set_closest_hit_shader<F>(&mut self, shader: F)
    where
        F: Fn(&Raytracer<V, RT>, &Ray, Payload, &Triangle, usize, &mut dyn RngCore) -> Payload
            + Send
            + Sync
            + 'static,
    {
        self.closest_hit_shader = Some(Box::new(shader));
    }

    pub fn set_any_hit_shader<F>(&mut self, shader: F)
    where
        F: Fn(&Ray, Payload, &Triangle) -> Payload + Send + Sync + 'static,
    {
        self.any_hit_shader = Some(Box::new(shader));
    }

    /// Snapshot every shape's triangles and build the hierarchy over them.
    ///
    /// Must complete before any trace; the result is read-only afterwards.
    pub fn build_acceleration_structure(&mut self) -> Result<()> {
        if self.vertex_buffers.len() != self.index_buffers.len() {
            return Err(RenderError::ShapeCountMismatch {
                vertex_buffers: self.vertex_buffers.len(),
                index_buffers: self.index_buffers.len(),
            });
        }

        let start = Instant::now();
        let mut triangles = Vec::new();
        let mut degenerate = 0;

        for (shape, (vertex_buffer, index_buffer)) in self
            .vertex_buffers
            .iter()
            .zip(&self.index_buffers)
            .enumerate()
        {
            let indices = index_buffer.as_slice();
            if indices.len() % 3 != 0 {
                return Err(RenderError::InvalidDrawCount(indices.len()));
            }

            for face in indices.chunks_exact(3) {
                let triangle = Triangle::new(
                    vertex_buffer.item(face[0] as usize)?,
                    vertex_buffer.item(face[1] as usize)?,
                    vertex_buffer.item(face[2] as usize)?,
                );
                if triangle.face_normal() == Vec3::ZERO {
                    degenerate += 1;
                    continue;
                }
                triangles.push(triangle);
            }
            log::debug!("Shape {}: {} indices", shape, indices.len());
        }

        if degenerate > 0 {
            log::warn!("Skipped {} degenerate triangles", degenerate);
        }

        let structure = BvhNode::new(triangles);
        log::info!(
            "Built acceleration structure: {} triangles in {} volumes ({:?})",
            structure.triangle_count(),
            structure.volume_count(),
            start.elapsed()
        );
        self.acceleration_structure = Some(Arc::new(structure));
        Ok(())
    }

    /// Reuse another tracer's built structure, e.g. for shadow rays.
    pub fn share_acceleration_structure(&mut self, other: &Raytracer<V, RT>) -> Result<()> {
        let structure = other
            .acceleration_structure
            .as_ref()
            .ok_or(RenderError::AccelerationStructureNotBuilt)?;
        self.acceleration_structure = Some(Arc::clone(structure));
        Ok(())
    }

    pub fn acceleration_structure(&self) -> Option<&BvhNode> {
        self.acceleration_structure.as_deref()
    }

    /// Trace one primary ray per sample through every pixel center and write
    /// the averaged color to the render target.
    ///
    /// `u` spans [-aspect, aspect] left to right and `v` spans [-1, 1] top to
    /// bottom, so the ray direction is `direction + u * right - v * up`.
    pub fn ray_generation(
        &self,
        position: Vec3,
        direction: Vec3,
        right: Vec3,
        up: Vec3,
        depth: usize,
        samples_per_pixel: usize,
    ) -> Result<()> {
        let render_target = self
            .render_target
            .as_ref()
            .ok_or(RenderError::MissingRenderTarget)?;
        if self.miss_shader.is_none() {
            return Err(RenderError::MissingShader("miss"));
        }
        if self.closest_hit_shader.is_none() && self.any_hit_shader.is_none() {
            return Err(RenderError::MissingShader("closest hit"));
        }
        if self.acceleration_structure.is_none() {
            return Err(RenderError::AccelerationStructureNotBuilt);
        }
        {
            let target = render_target.read();
            check_viewport(
                "render target",
                target.stride(),
                target.height(),
                self.width,
                self.height,
            )?;
        }

        let start = Instant::now();
        let samples = samples_per_pixel.max(1);
        let width = self.width as f32;
        let height = self.height as f32;
        let aspect = width / height;

        let shade = |x: usize, y: usize| -> Color {
            let u = (2.0 * (x as f32 + 0.5) / width - 1.0) * aspect;
            let v = 2.0 * (y as f32 + 0.5) / height - 1.0;
            let ray = Ray::new(position, direction + u * right - v * up);

            let mut rng = pixel_rng(self.seed, x, y);
            let mut accumulated = Color::ZERO;
            for _ in 0..samples {
                accumulated += self
                    .trace_ray(&ray, depth, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng)
                    .color;
            }
            accumulated / samples as f32
        };

        let buckets = generate_buckets(self.width, self.height, self.bucket_size);
        let results: Vec<BucketResult> = buckets
            .par_iter()
            .map(|bucket| render_bucket(bucket, &shade))
            .collect();

        let mut target = render_target.write();
        for result in &results {
            for (x, y, color) in result.iter_pixels() {
                target.set_2d(x, y, RT::from(color))?;
            }
        }

        log::info!(
            "Ray generation: {}x{} pixels, {} buckets, depth {}, {} spp in {:?}",
            self.width,
            self.height,
            results.len(),
            depth,
            samples,
            start.elapsed()
        );
        Ok(())
    }

    /// Trace `ray` with `depth` levels of recursion left.
    ///
    /// Depth 0 returns the miss shader's output unconditionally. Otherwise the
    /// closest hit with `min_t < t < max_t` goes to the closest-hit shader
    /// with `depth - 1`, or the first such hit to the any-hit shader when one
    /// is installed.
    pub fn trace_ray(
        &self,
        ray: &Ray,
        depth: usize,
        max_t: f32,
        min_t: f32,
        rng: &mut dyn RngCore,
    ) -> Payload {
        if depth == 0 {
            return self.miss(ray);
        }
        let depth = depth - 1;

        let Some(structure) = self.acceleration_structure.as_deref() else {
            return self.miss(ray);
        };
        let ray_t = Interval::new(min_t, max_t);

        if let Some(any_hit) = &self.any_hit_shader {
            return match structure.any_hit(ray, ray_t) {
                Some((payload, triangle)) => any_hit(ray, payload, triangle),
                None => self.miss(ray),
            };
        }

        match (structure.closest_hit(ray, ray_t), &self.closest_hit_shader) {
            (Some((payload, triangle)), Some(closest_hit)) => {
                closest_hit(self, ray, payload, triangle, depth, rng)
            }
            _ => self.miss(ray),
        }
    }

    /// Möller-Trumbore ray/triangle test. `t == -1` on a miss.
    pub fn intersection_shader(&self, triangle: &Triangle, ray: &Ray) -> Payload {
        triangle.intersect(ray)
    }

    fn miss(&self, ray: &Ray) -> Payload {
        self.miss_shader
            .as_ref()
            .map_or(Payload::MISS, |shader| shader(ray))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tessera_core::{shared, PackedColor, Vertex};

    use crate::shaders;

    const SKY: Color = Color::new(0.25, 0.5, 0.75);

    fn vertex(x: f32, y: f32, z: f32, emissive: Color) -> Vertex {
        Vertex {
            position: Vec3::new(x, y, z),
            normal: Vec3::Z,
            diffuse: Color::splat(0.5),
            emissive,
            ..Default::default()
        }
    }

    fn emissive_closest_hit(
        _: &Raytracer<Vertex, PackedColor>,
        _: &Ray,
        payload: Payload,
        triangle: &Triangle,
        _: usize,
        _: &mut dyn RngCore,
    ) -> Payload {
        Payload {
            color: triangle.emissive,
            ..payload
        }
    }

    /// Large triangle in the z = -1 plane facing +Z.
    fn facing_triangle(emissive: Color) -> (Arc<TypedBuffer<Vertex>>, Arc<TypedBuffer<u32>>) {
        let vertices = vec![
            vertex(-5.0, -5.0, -1.0, emissive),
            vertex(5.0, -5.0, -1.0, emissive),
            vertex(0.0, 5.0, -1.0, emissive),
        ];
        (
            Arc::new(TypedBuffer::from_vec(vertices)),
            Arc::new(TypedBuffer::from_vec(vec![0, 1, 2])),
        )
    }

    fn tracer(emissive: Color) -> Raytracer<Vertex, PackedColor> {
        let (vertices, indices) = facing_triangle(emissive);
        let mut tracer = Raytracer::new();
        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![indices]);
        tracer.set_miss_shader(|_: &Ray| Payload::with_color(SKY));
        tracer.set_closest_hit_shader(emissive_closest_hit);
        tracer.build_acceleration_structure().unwrap();
        tracer
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn test_depth_zero_returns_miss_shader_output() {
        let tracer = tracer(Color::X);
        // Would hit the triangle head on
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let payload = tracer.trace_ray(&ray, 0, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert_eq!(payload, Payload::with_color(SKY));
    }

    #[test]
    fn test_hit_reports_distance_and_barycentrics() {
        let tracer = tracer(Color::X);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let payload = tracer.trace_ray(&ray, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());

        assert!((payload.t - 2.0).abs() < 1e-5);
        assert!((payload.bary.element_sum() - 1.0).abs() < 1e-5);
        assert!(payload.bary.min_element() >= 0.0);
        assert_eq!(payload.color, Color::X);
    }

    #[test]
    fn test_ray_through_centroid_hits() {
        let tracer = tracer(Color::Y);
        let centroid = Vec3::new(0.0, -5.0 / 3.0, -1.0);
        let ray = Ray::new(centroid + Vec3::new(0.0, 0.0, 3.0), -Vec3::Z);
        let payload = tracer.trace_ray(&ray, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());

        assert!((payload.t - 3.0).abs() < 1e-5);
        for weight in payload.bary.to_array() {
            assert!((weight - 1.0 / 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let tracer = tracer(Color::X);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let payload = tracer.trace_ray(&ray, 4, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert_eq!(payload.color, SKY);
    }

    #[test]
    fn test_range_limits_are_exclusive() {
        let tracer = tracer(Color::X);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);

        // Triangle sits at t = 2
        let short = tracer.trace_ray(&ray, 1, 1.5, DEFAULT_MIN_T, &mut rng());
        assert_eq!(short.color, SKY);
        let behind = tracer.trace_ray(&ray, 1, DEFAULT_MAX_T, 2.5, &mut rng());
        assert_eq!(behind.color, SKY);
    }

    #[test]
    fn test_intersection_shader_parallel_ray_misses() {
        let tracer = tracer(Color::X);
        let (vertices, _) = facing_triangle(Color::X);
        let slice = vertices.as_slice();
        let triangle = Triangle::new(&slice[0], &slice[1], &slice[2]);

        let parallel = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);
        assert_eq!(tracer.intersection_shader(&triangle, &parallel).t, -1.0);

        let head_on = Ray::new(Vec3::new(0.0, 0.0, 4.0), -Vec3::Z);
        assert!((tracer.intersection_shader(&triangle, &head_on).t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_closest_hit_receives_decremented_depth() {
        let (vertices, indices) = facing_triangle(Color::ZERO);
        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![indices]);
        tracer.set_miss_shader(|_: &Ray| Payload::MISS);
        tracer.set_closest_hit_shader(
            |_: &Raytracer<Vertex, PackedColor>,
             _: &Ray,
             payload: Payload,
             _: &Triangle,
             depth: usize,
             _: &mut dyn RngCore| Payload {
                color: Color::splat(depth as f32),
                ..payload
            },
        );
        tracer.build_acceleration_structure().unwrap();

        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let payload = tracer.trace_ray(&ray, 5, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert_eq!(payload.color, Color::splat(4.0));
    }

    #[test]
    fn test_nearest_of_two_shapes_wins() {
        let near = Arc::new(TypedBuffer::from_vec(vec![
            vertex(-5.0, -5.0, -1.0, Color::X),
            vertex(5.0, -5.0, -1.0, Color::X),
            vertex(0.0, 5.0, -1.0, Color::X),
        ]));
        let far = Arc::new(TypedBuffer::from_vec(vec![
            vertex(-5.0, -5.0, -3.0, Color::Y),
            vertex(5.0, -5.0, -3.0, Color::Y),
            vertex(0.0, 5.0, -3.0, Color::Y),
        ]));
        let indices = Arc::new(TypedBuffer::from_vec(vec![0, 1, 2]));

        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        // Far shape first so submission order cannot decide
        tracer.set_vertex_buffers(vec![far, near]);
        tracer.set_index_buffers(vec![indices.clone(), indices]);
        tracer.set_miss_shader(|_: &Ray| Payload::MISS);
        tracer.set_closest_hit_shader(emissive_closest_hit);
        tracer.build_acceleration_structure().unwrap();

        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let payload = tracer.trace_ray(&ray, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert_eq!(payload.color, Color::X);
        assert!((payload.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_emissive_triangle_at_depth_one_is_exact() {
        let (vertices, indices) = facing_triangle(Color::new(1.0, 0.0, 0.0));
        let target = shared(TypedBuffer::new_2d(8, 8));

        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        tracer.set_render_target(target.clone());
        tracer.set_viewport(8, 8);
        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![indices]);
        tracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
        tracer.set_closest_hit_shader(shaders::monte_carlo_closest_hit::<Vertex, PackedColor>());
        tracer.build_acceleration_structure().unwrap();
        tracer.clear_render_target(PackedColor::WHITE).unwrap();

        // Camera at z = 1 looking down -Z; the triangle covers the whole view
        tracer
            .ray_generation(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z, Vec3::X * 0.5, Vec3::Y * 0.5, 1, 1)
            .unwrap();

        let target = target.read();
        assert!(target.iter().all(|c| *c == PackedColor::new(255, 0, 0)));
    }

    #[test]
    fn test_ray_generation_orientation() {
        // Small triangle in the upper-left of the view
        let vertices = Arc::new(TypedBuffer::from_vec(vec![
            vertex(-1.0, 0.1, -1.0, Color::ONE),
            vertex(0.0, 0.1, -1.0, Color::ONE),
            vertex(-1.0, 1.1, -1.0, Color::ONE),
        ]));
        let indices = Arc::new(TypedBuffer::from_vec(vec![0, 1, 2]));
        let target = shared(TypedBuffer::new_2d(4, 4));

        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        tracer.set_render_target(target.clone());
        tracer.set_viewport(4, 4);
        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![indices]);
        tracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
        tracer.set_closest_hit_shader(emissive_closest_hit);
        tracer.build_acceleration_structure().unwrap();
        tracer
            .ray_generation(Vec3::ZERO, -Vec3::Z, Vec3::X, Vec3::Y, 1, 1)
            .unwrap();

        let target = target.read();
        // Pixel (0, 0) looks through (-0.75, 0.75)
        assert_eq!(*target.item_2d(0, 0).unwrap(), PackedColor::WHITE);
        assert_eq!(*target.item_2d(3, 0).unwrap(), PackedColor::BLACK);
        assert_eq!(*target.item_2d(0, 3).unwrap(), PackedColor::BLACK);
        assert_eq!(*target.item_2d(3, 3).unwrap(), PackedColor::BLACK);
    }

    #[test]
    fn test_seeded_render_is_deterministic() {
        let render = |seed: u64, bucket_size: usize| {
            let (vertices, indices) = facing_triangle(Color::splat(0.1));
            let target = shared(TypedBuffer::<Color>::new_2d(6, 5));
            let mut tracer = Raytracer::<Vertex, Color>::new();
            tracer.set_render_target(target.clone());
            tracer.set_viewport(6, 5);
            tracer.set_vertex_buffers(vec![vertices]);
            tracer.set_index_buffers(vec![indices]);
            tracer.set_seed(seed);
            tracer.set_bucket_size(bucket_size);
            tracer.set_miss_shader(shaders::solid_miss(Color::ONE));
            tracer.set_closest_hit_shader(shaders::monte_carlo_closest_hit::<Vertex, Color>());
            tracer.build_acceleration_structure().unwrap();
            tracer
                .ray_generation(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z, Vec3::X, Vec3::Y, 3, 2)
                .unwrap();
            let pixels = target.read().as_slice().to_vec();
            pixels
        };

        let reference = render(9, 2);
        // Tiling must not change the result
        assert_eq!(render(9, 4), reference);
        assert_eq!(render(9, 32), reference);
    }

    #[test]
    fn test_any_hit_shader_reports_occlusion() {
        let mut scene = tracer(Color::X);
        scene.set_any_hit_shader(shaders::shadow_any_hit());
        scene.set_miss_shader(shaders::shadow_miss());

        let blocked = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let payload = scene.trace_ray(&blocked, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert!((payload.t - 2.0).abs() < 1e-5);

        let clear = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        let payload = scene.trace_ray(&clear, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert_eq!(payload.t, -1.0);
    }

    #[test]
    fn test_shared_acceleration_structure() {
        let scene = tracer(Color::X);
        let mut shadow = Raytracer::<Vertex, PackedColor>::new();
        assert_eq!(
            shadow.share_acceleration_structure(&Raytracer::new()),
            Err(RenderError::AccelerationStructureNotBuilt)
        );

        shadow.share_acceleration_structure(&scene).unwrap();
        shadow.set_any_hit_shader(shaders::shadow_any_hit());
        shadow.set_miss_shader(shaders::shadow_miss());

        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let payload = shadow.trace_ray(&ray, 1, DEFAULT_MAX_T, DEFAULT_MIN_T, &mut rng());
        assert!(payload.t > 0.0);
    }

    #[test]
    fn test_degenerate_triangles_are_skipped() {
        let vertices = Arc::new(TypedBuffer::from_vec(vec![
            vertex(0.0, 0.0, -1.0, Color::X),
            vertex(1.0, 0.0, -1.0, Color::X),
            vertex(2.0, 0.0, -1.0, Color::X),
        ]));
        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![Arc::new(TypedBuffer::from_vec(vec![0, 1, 2]))]);
        tracer.build_acceleration_structure().unwrap();

        assert_eq!(tracer.acceleration_structure().map(BvhNode::triangle_count), Some(0));
    }

    #[test]
    fn test_build_precondition_errors() {
        let (vertices, indices) = facing_triangle(Color::X);

        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        tracer.set_vertex_buffers(vec![vertices.clone()]);
        assert_eq!(
            tracer.build_acceleration_structure(),
            Err(RenderError::ShapeCountMismatch {
                vertex_buffers: 1,
                index_buffers: 0
            })
        );

        tracer.set_index_buffers(vec![Arc::new(TypedBuffer::from_vec(vec![0, 1, 5]))]);
        assert!(matches!(
            tracer.build_acceleration_structure(),
            Err(RenderError::Buffer(_))
        ));

        tracer.set_index_buffers(vec![Arc::new(TypedBuffer::from_vec(vec![0, 1]))]);
        assert_eq!(
            tracer.build_acceleration_structure(),
            Err(RenderError::InvalidDrawCount(2))
        );

        tracer.set_index_buffers(vec![indices]);
        assert!(tracer.build_acceleration_structure().is_ok());
    }

    #[test]
    fn test_ray_generation_precondition_errors() {
        let (vertices, indices) = facing_triangle(Color::X);
        let mut tracer = Raytracer::<Vertex, PackedColor>::new();
        let generate = |tracer: &Raytracer<Vertex, PackedColor>| {
            tracer.ray_generation(Vec3::ZERO, -Vec3::Z, Vec3::X, Vec3::Y, 1, 1)
        };

        assert_eq!(generate(&tracer), Err(RenderError::MissingRenderTarget));

        tracer.set_render_target(shared(TypedBuffer::new_2d(4, 2)));
        assert_eq!(generate(&tracer), Err(RenderError::MissingShader("miss")));

        tracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
        assert_eq!(generate(&tracer), Err(RenderError::MissingShader("closest hit")));

        tracer.set_closest_hit_shader(shaders::monte_carlo_closest_hit::<Vertex, PackedColor>());
        assert_eq!(generate(&tracer), Err(RenderError::AccelerationStructureNotBuilt));

        tracer.set_vertex_buffers(vec![vertices]);
        tracer.set_index_buffers(vec![indices]);
        tracer.build_acceleration_structure().unwrap();
        assert!(matches!(
            generate(&tracer),
            Err(RenderError::ViewportMismatch { .. })
        ));

        tracer.set_viewport(4, 2);
        assert!(generate(&tracer).is_ok());
    }
}
