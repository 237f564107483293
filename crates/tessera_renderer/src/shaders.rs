//! Reference shaders for both pipelines.
//!
//! Each constructor returns a closure ready to hand to the matching
//! `set_*_shader` call.

use std::sync::Arc;

use rand::RngCore;
use tessera_core::{Color, Light, RenderTargetColor, VertexData};
use tessera_math::{Mat4, Ray, Vec4};

use crate::raytracer::{DEFAULT_MAX_T, DEFAULT_MIN_T};
use crate::sampling::cosine_hemisphere;
use crate::{Payload, Raytracer, Triangle};

/// Miss shader returning a constant background color.
pub fn solid_miss(color: Color) -> impl Fn(&Ray) -> Payload + Send + Sync + Clone {
    move |_: &Ray| Payload::with_color(color)
}

/// One-bounce-per-level Monte Carlo global illumination.
///
/// Casts a single cosine-weighted bounce around the interpolated normal and
/// returns `emissive + diffuse * incoming * max(0, n . bounce)`. The bounce
/// is traced with the depth this shader received, so the recursion ends at
/// the tracer's miss shader.
pub fn monte_carlo_closest_hit<V, RT>(
) -> impl Fn(&Raytracer<V, RT>, &Ray, Payload, &Triangle, usize, &mut dyn RngCore) -> Payload
       + Send
       + Sync
       + Clone
where
    V: VertexData,
    RT: RenderTargetColor,
{
    |tracer: &Raytracer<V, RT>,
     ray: &Ray,
     payload: Payload,
     triangle: &Triangle,
     depth: usize,
     rng: &mut dyn RngCore| {
        let normal = triangle.interpolate_normal(payload.bary);
        let bounce = Ray::new(ray.at(payload.t), cosine_hemisphere(normal, rng));
        let incoming = tracer.trace_ray(&bounce, depth, DEFAULT_MAX_T, DEFAULT_MIN_T, rng);

        let cosine = normal.dot(bounce.direction).max(0.0);
        Payload {
            color: triangle.emissive + triangle.diffuse * incoming.color * cosine,
            ..payload
        }
    }
}

/// Any-hit shader for occlusion queries: accept the first hit as is.
pub fn shadow_any_hit() -> impl Fn(&Ray, Payload, &Triangle) -> Payload + Send + Sync + Clone {
    |_: &Ray, payload: Payload, _: &Triangle| payload
}

/// Miss shader paired with `shadow_any_hit`: `t == -1` means unoccluded.
pub fn shadow_miss() -> impl Fn(&Ray) -> Payload + Send + Sync + Clone {
    |_: &Ray| Payload::MISS
}

/// Lambertian direct lighting with hard shadows.
///
/// `shadow_tracer` should carry `shadow_any_hit`/`shadow_miss` and share the
/// scene's acceleration structure. Each light contributes
/// `diffuse * light * max(0, n . l)` unless something lies between the hit
/// point and the light.
pub fn direct_lighting_closest_hit<V, RT>(
    lights: Vec<Light>,
    shadow_tracer: Arc<Raytracer<V, RT>>,
) -> impl Fn(&Raytracer<V, RT>, &Ray, Payload, &Triangle, usize, &mut dyn RngCore) -> Payload
       + Send
       + Sync
       + Clone
where
    V: VertexData,
    RT: RenderTargetColor,
{
    move |_: &Raytracer<V, RT>,
          ray: &Ray,
          payload: Payload,
          triangle: &Triangle,
          _: usize,
          rng: &mut dyn RngCore| {
        let position = ray.at(payload.t);
        let normal = triangle.interpolate_normal(payload.bary);
        let mut color = triangle.ambient + triangle.emissive;

        for light in &lights {
            let to_light = light.position - position;
            let shadow_ray = Ray::new(position, to_light);
            let occluder =
                shadow_tracer.trace_ray(&shadow_ray, 1, to_light.length(), DEFAULT_MIN_T, rng);
            if occluder.t < 0.0 {
                color += triangle.diffuse * light.color * normal.dot(shadow_ray.direction).max(0.0);
            }
        }

        Payload { color, ..payload }
    }
}

/// Vertex shader applying one matrix, typically projection * view * world.
pub fn transform_vertex_shader<V>(
    matrix: Mat4,
) -> impl Fn(Vec4, V) -> (Vec4, V) + Send + Sync + Clone
where
    V: VertexData,
{
    move |position: Vec4, vertex: V| (matrix * position, vertex)
}

/// Pixel shader returning the interpolated ambient color.
pub fn ambient_pixel_shader<V: VertexData>() -> impl Fn(&V, f32) -> Color + Send + Sync + Clone {
    |vertex: &V, _: f32| vertex.ambient()
}

/// Pixel shader visualizing depth: white at `near`, black at `far`.
///
/// `z` arrives as normalized device depth in [-1, 1] and is linearized
/// before mapping.
pub fn depth_pixel_shader<V: VertexData>(
    near: f32,
    far: f32,
) -> impl Fn(&V, f32) -> Color + Send + Sync + Clone {
    move |_: &V, z: f32| {
        let linear = 2.0 * near * far / (far + near - z * (far - near));
        let shade = 1.0 - ((linear - near) / (far - near)).clamp(0.0, 1.0);
        Color::splat(shade)
    }
}
