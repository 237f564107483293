//! Error type shared by both pipelines.

use tessera_core::BufferError;
use thiserror::Error;

/// Failures that abort a render call before or during pixel work.
///
/// Degenerate geometry is never an error; it shows up as a missed ray or a
/// culled triangle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("No render target bound")]
    MissingRenderTarget,

    #[error("No {0} buffer bound")]
    MissingBuffer(&'static str),

    #[error("No {0} shader installed")]
    MissingShader(&'static str),

    #[error("Draw count {0} is not a multiple of 3")]
    InvalidDrawCount(usize),

    #[error("{target} is {actual_width}x{actual_height} but the viewport is {width}x{height}")]
    ViewportMismatch {
        target: &'static str,
        actual_width: usize,
        actual_height: usize,
        width: usize,
        height: usize,
    },

    #[error("{vertex_buffers} vertex buffers but {index_buffers} index buffers")]
    ShapeCountMismatch {
        vertex_buffers: usize,
        index_buffers: usize,
    },

    #[error("Acceleration structure has not been built")]
    AccelerationStructureNotBuilt,
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Check that a 2D target covers exactly the viewport.
pub(crate) fn check_viewport(
    target: &'static str,
    stride: usize,
    rows: usize,
    width: usize,
    height: usize,
) -> Result<()> {
    if stride != width || rows != height {
        return Err(RenderError::ViewportMismatch {
            target,
            actual_width: stride,
            actual_height: rows,
            width,
            height,
        });
    }
    Ok(())
}
