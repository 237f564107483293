//! Tessera Core - data shared by the rasterizer and the ray tracer.
//!
//! This crate provides:
//!
//! - **Typed buffers**: `TypedBuffer<T>`, linear or 2D-strided storage used
//!   for vertices, indices, color targets and depth targets
//! - **Color model**: float `Color` and 8-bit `PackedColor`
//! - **Vertex data**: the `Vertex` layout and the `VertexData` trait the
//!   pipelines are generic over
//! - **Collaborators**: OBJ model loading and PNG persistence
//!
//! # Example
//!
//! ```ignore
//! use tessera_core::{model::Model, image_io::save_png, TypedBuffer, PackedColor};
//!
//! let model = Model::load_obj("cornell_box.obj")?;
//! let target = TypedBuffer::<PackedColor>::new_2d(640, 480);
//! save_png(&target, "out.png")?;
//! ```

pub mod buffer;
pub mod color;
pub mod image_io;
pub mod light;
pub mod model;
pub mod vertex;

// Re-export commonly used types
pub use buffer::{shared, BufferError, SharedBuffer, TypedBuffer};
pub use color::{Color, PackedColor, RenderTargetColor};
pub use light::Light;
pub use model::{Model, ModelError};
pub use vertex::{Vertex, VertexData};
