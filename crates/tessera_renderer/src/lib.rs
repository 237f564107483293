//! Tessera renderer - software rasterization and ray tracing
//!
//! Two CPU pipelines over the same buffers and vertex layout:
//! a scan-conversion `Rasterizer` with edge-function coverage and an optional
//! depth test, and a `Raytracer` that walks a bounding volume hierarchy and
//! hands hits to user-supplied shaders.

pub mod acceleration;
pub mod bucket;
mod error;
mod payload;
pub mod rasterizer;
pub mod raytracer;
pub mod sampling;
pub mod shaders;
mod triangle;

pub use acceleration::{AccelerationVolume, BvhNode};
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use error::{RenderError, Result};
pub use payload::Payload;
pub use rasterizer::{DrawStats, Interpolation, Rasterizer, DEFAULT_DEPTH};
pub use raytracer::{Raytracer, DEFAULT_MAX_T, DEFAULT_MIN_T};
pub use triangle::Triangle;

/// Re-export the types callers need alongside the pipelines
pub use tessera_core::{Color, PackedColor, TypedBuffer, Vertex, VertexData};
pub use tessera_math::{Interval, Ray, Vec3};
