//! PNG persistence for packed color targets.

use std::path::Path;

use thiserror::Error;

use crate::{PackedColor, TypedBuffer};

/// Errors that can occur while writing or reading images.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Render target has no row stride")]
    NotTwoDimensional,

    #[error("Image is {width}x{height}, larger than a PNG can hold")]
    TooLarge { width: usize, height: usize },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Write a 2D packed color buffer as an 8-bit RGB PNG.
pub fn save_png(target: &TypedBuffer<PackedColor>, path: impl AsRef<Path>) -> ImageResult<()> {
    let (width, height) = (target.stride(), target.height());
    if width == 0 {
        return Err(ImageError::NotTwoDimensional);
    }
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(ImageError::TooLarge { width, height }),
    };

    image::save_buffer_with_format(
        path.as_ref(),
        target.as_bytes(),
        w,
        h,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )?;
    log::info!("Saved {}x{} image to {}", w, h, path.as_ref().display());
    Ok(())
}

/// Read a PNG back into a 2D packed color buffer.
pub fn load_png(path: impl AsRef<Path>) -> ImageResult<TypedBuffer<PackedColor>> {
    let rgb = image::open(path.as_ref())?.to_rgb8();
    let width = rgb.width() as usize;
    let pixels = rgb
        .pixels()
        .map(|p| PackedColor::new(p[0], p[1], p[2]))
        .collect::<Vec<_>>();
    TypedBuffer::from_vec_2d(pixels, width).map_err(|_| ImageError::NotTwoDimensional)
}
