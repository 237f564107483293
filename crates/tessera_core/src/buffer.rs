//! Typed buffers: the storage substrate for every pipeline resource.
//!
//! A buffer is either linear (`stride == 0`) or 2D with `stride` elements per
//! row. Every accessor is bounds-checked and reports a `BufferError` instead of
//! clamping or panicking.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Errors raised by buffer accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("index {index} out of range for buffer of {count} items")]
    OutOfRange { index: usize, count: usize },

    #[error("coordinate ({x}, {y}) out of range for {width}x{height} buffer")]
    OutOfRange2d {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("{len} items cannot be arranged in rows of {width}")]
    SizeMismatch { len: usize, width: usize },
}

pub type Result<T> = std::result::Result<T, BufferError>;

/// A render target or depth target shared between a driver and a pipeline.
pub type SharedBuffer<T> = Arc<RwLock<TypedBuffer<T>>>;

/// Wrap a buffer for shared, lockable access.
pub fn shared<T>(buffer: TypedBuffer<T>) -> SharedBuffer<T> {
    Arc::new(RwLock::new(buffer))
}

/// Contiguous storage of fixed-size elements with an optional row stride.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer<T> {
    data: Vec<T>,
    stride: usize,
}

impl<T: Clone + Default> TypedBuffer<T> {
    /// Linear buffer of `count` default-initialized items.
    pub fn new(count: usize) -> Self {
        Self {
            data: vec![T::default(); count],
            stride: 0,
        }
    }

    /// 2D buffer of `width * height` default-initialized items.
    ///
    /// A zero `width` holds no items and reads back as an empty linear
    /// buffer: `stride() == 0` and `height() == 0`, so it matches no
    /// non-empty viewport.
    pub fn new_2d(width: usize, height: usize) -> Self {
        Self {
            data: vec![T::default(); width * height],
            stride: width,
        }
    }
}

impl<T> TypedBuffer<T> {
    /// Linear buffer taking ownership of `data`.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data, stride: 0 }
    }

    /// 2D buffer taking ownership of `data`, laid out in rows of `width`.
    pub fn from_vec_2d(data: Vec<T>, width: usize) -> Result<Self> {
        if width == 0 || data.len() % width != 0 {
            return Err(BufferError::SizeMismatch {
                len: data.len(),
                width,
            });
        }
        Ok(Self {
            data,
            stride: width,
        })
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Elements per row, or 0 for a linear buffer.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of rows, or 0 for a linear buffer.
    pub fn height(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<T>()
    }

    pub fn item(&self, index: usize) -> Result<&T> {
        let count = self.data.len();
        self.data
            .get(index)
            .ok_or(BufferError::OutOfRange { index, count })
    }

    pub fn item_mut(&mut self, index: usize) -> Result<&mut T> {
        let count = self.data.len();
        self.data
            .get_mut(index)
            .ok_or(BufferError::OutOfRange { index, count })
    }

    pub fn item_2d(&self, x: usize, y: usize) -> Result<&T> {
        let index = self.index_2d(x, y)?;
        Ok(&self.data[index])
    }

    pub fn item_2d_mut(&mut self, x: usize, y: usize) -> Result<&mut T> {
        let index = self.index_2d(x, y)?;
        Ok(&mut self.data[index])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        *self.item_mut(index)? = value;
        Ok(())
    }

    pub fn set_2d(&mut self, x: usize, y: usize, value: T) -> Result<()> {
        *self.item_2d_mut(x, y)? = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    fn index_2d(&self, x: usize, y: usize) -> Result<usize> {
        let width = self.stride;
        let height = self.height();
        if x >= width || y >= height {
            return Err(BufferError::OutOfRange2d {
                x,
                y,
                width,
                height,
            });
        }
        Ok(y * width + x)
    }
}

impl<T: Clone> TypedBuffer<T> {
    /// Overwrite every item with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: bytemuck::Pod> TypedBuffer<T> {
    /// Raw view of the storage, e.g. for image encoders.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
