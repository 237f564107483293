//! Bucket-based tile partitioning for parallel ray generation.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! with rayon. No two buckets share a pixel, so workers never write the same
//! render target cell.

use tessera_core::Color;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: usize,
    /// Y coordinate of bucket's top-left corner
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: usize, y: usize, width: usize, height: usize, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: usize = 32;

/// Generate buckets covering a `width` x `height` image, sorted in spiral
/// order from the center.
pub fn generate_buckets(width: usize, height: usize, bucket_size: usize) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    for y in (0..height).step_by(bucket_size) {
        for x in (0..width).step_by(bucket_size) {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
        }
    }

    sort_spiral(&mut buckets, width, height);

    // Update indices after sorting
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: usize, height: usize) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| {
        distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Shade every pixel of `bucket` in row-major order.
pub fn render_bucket<F>(bucket: &Bucket, shade: F) -> BucketResult
where
    F: Fn(usize, usize) -> Color,
{
    let mut pixels = Vec::with_capacity(bucket.pixel_count());

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            pixels.push(shade(bucket.x + local_x, bucket.y + local_y));
        }
    }

    BucketResult::new(*bucket, pixels)
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }

    /// Iterate `(x, y, color)` in image coordinates.
    pub fn iter_pixels(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        let bucket = self.bucket;
        self.pixels.iter().enumerate().map(move |(i, color)| {
            (
                bucket.x + i % bucket.width,
                bucket.y + i / bucket.width,
                *color,
            )
        })
    }
}
