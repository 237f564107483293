// Re-export glam for convenience
pub use glam::*;

// Tessera math types
mod aabb;
pub mod camera;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use camera::{Camera, RayBasis};
pub use interval::Interval;
pub use ray::Ray;
