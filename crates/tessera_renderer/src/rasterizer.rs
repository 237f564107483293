//! Scan-conversion rasterizer.
//!
//! Triangles are transformed by the vertex shader, perspective-divided and
//! mapped to pixel coordinates. Coverage is decided per pixel center with
//! three edge functions; the normalized edge values double as barycentric
//! weights for depth and attribute interpolation.

use std::sync::Arc;
use std::time::Instant;

use tessera_core::{Color, RenderTargetColor, SharedBuffer, TypedBuffer, VertexData};
use tessera_math::{Vec2, Vec3, Vec4};

use crate::error::{check_viewport, RenderError, Result};

/// Depth a target is cleared to: farther than anything drawable.
pub const DEFAULT_DEPTH: f32 = f32::MAX;

/// Clip-space `w` at or below this is behind the eye; such triangles are culled.
const MIN_CLIP_W: f32 = 1e-6;

/// Vertex shader: `(position with w = 1, vertex) -> (clip position, vertex)`.
pub type VertexShader<V> = dyn Fn(Vec4, V) -> (Vec4, V) + Send + Sync;

/// Pixel shader: `(interpolated vertex, depth) -> color`.
pub type PixelShader<V> = dyn Fn(&V, f32) -> Color + Send + Sync;

/// How vertex attributes reach the pixel shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Every covered pixel sees the first vertex's attributes.
    Flat,
    /// Perspective-correct barycentric blend of all three vertices.
    #[default]
    Smooth,
}

/// Counters reported by a draw call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Triangles submitted
    pub triangles: usize,
    /// Triangles dropped for back-facing, zero area, or lying behind the eye
    pub culled: usize,
    /// Pixels that passed coverage and depth and were written
    pub pixels_shaded: usize,
}

/// A vertex after the vertex shader and viewport transform.
#[derive(Clone, Copy)]
struct ScreenVertex<V> {
    /// Pixel x, pixel y, NDC z
    screen: Vec3,
    /// Reciprocal clip w, for perspective-correct interpolation
    inv_w: f32,
    data: V,
}

/// Signed area of the parallelogram spanned by `b - a` and `c - a`.
///
/// Positive when `c` lies on the inner side of the directed edge `a -> b` for
/// a triangle that was counter-clockwise in normalized device coordinates.
#[inline]
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

pub struct Rasterizer<V: VertexData, RT: RenderTargetColor> {
    vertex_buffer: Option<Arc<TypedBuffer<V>>>,
    index_buffer: Option<Arc<TypedBuffer<u32>>>,
    render_target: Option<SharedBuffer<RT>>,
    depth_buffer: Option<SharedBuffer<f32>>,
    width: usize,
    height: usize,
    interpolation: Interpolation,
    vertex_shader: Option<Box<VertexShader<V>>>,
    pixel_shader: Option<Box<PixelShader<V>>>,
}

impl<V: VertexData, RT: RenderTargetColor> Default for Rasterizer<V, RT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexData, RT: RenderTargetColor> Rasterizer<V, RT> {
    pub fn new() -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            render_target: None,
            depth_buffer: None,
            width: 1920,
            height: 1080,
            interpolation: Interpolation::default(),
            vertex_shader: None,
            pixel_shader: None,
        }
    }

    /// Bind a color target and, optionally, a depth target. Without a depth
    /// target later triangles always overwrite earlier ones.
    pub fn set_render_target(
        &mut self,
        render_target: SharedBuffer<RT>,
        depth_buffer: Option<SharedBuffer<f32>>,
    ) {
        self.render_target = Some(render_target);
        self.depth_buffer = depth_buffer;
    }

    /// Fill the color target with `clear_value` and reset the depth target,
    /// if bound, to `DEFAULT_DEPTH`.
    pub fn clear_render_target(&self, clear_value: RT) -> Result<()> {
        self.clear_render_target_with_depth(clear_value, DEFAULT_DEPTH)
    }

    pub fn clear_render_target_with_depth(&self, clear_value: RT, depth: f32) -> Result<()> {
        let render_target = self
            .render_target
            .as_ref()
            .ok_or(RenderError::MissingRenderTarget)?;
        let start = Instant::now();

        render_target.write().fill(clear_value);
        if let Some(depth_buffer) = &self.depth_buffer {
            depth_buffer.write().fill(depth);
        }

        log::debug!("Clearing took {:?}", start.elapsed());
        Ok(())
    }

    pub fn set_vertex_buffer(&mut self, vertex_buffer: Arc<TypedBuffer<V>>) {
        self.vertex_buffer = Some(vertex_buffer);
    }

    pub fn set_index_buffer(&mut self, index_buffer: Arc<TypedBuffer<u32>>) {
        self.index_buffer = Some(index_buffer);
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    pub fn set_vertex_shader<F>(&mut self, shader: F)
    where
        F: Fn(Vec4, V) -> (Vec4, V) + Send + Sync + 'static,
    {
        self.vertex_shader = Some(Box::new(shader));
    }

    pub fn set_pixel_shader<F>(&mut self, shader: F)
    where
        F: Fn(&V, f32) -> Color + Send + Sync + 'static,
    {
        self.pixel_shader = Some(Box::new(shader));
    }

    /// Draw `count` indices starting at `offset`, three per triangle.
    ///
    /// All bindings are validated before any pixel is touched. A vertex index
    /// past the vertex buffer aborts the call at the offending triangle.
    pub fn draw(&self, count: usize, offset: usize) -> Result<DrawStats> {
        let vertex_shader = self
            .vertex_shader
            .as_deref()
            .ok_or(RenderError::MissingShader("vertex"))?;
        let pixel_shader = self
            .pixel_shader
            .as_deref()
            .ok_or(RenderError::MissingShader("pixel"))?;
        let render_target = self
            .render_target
            .as_ref()
            .ok_or(RenderError::MissingRenderTarget)?;
        let vertex_buffer = self
            .vertex_buffer
            .as_ref()
            .ok_or(RenderError::MissingBuffer("vertex"))?;
        let index_buffer = self
            .index_buffer
            .as_ref()
            .ok_or(RenderError::MissingBuffer("index"))?;

        if count % 3 != 0 {
            return Err(RenderError::InvalidDrawCount(count));
        }
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= index_buffer.count())
            .ok_or(tessera_core::BufferError::OutOfRange {
                index: offset.saturating_add(count).saturating_sub(1),
                count: index_buffer.count(),
            })?;

        let mut target = render_target.write();
        check_viewport(
            "render target",
            target.stride(),
            target.height(),
            self.width,
            self.height,
        )?;
        let mut depth = self.depth_buffer.as_ref().map(|d| d.write());
        if let Some(depth) = &depth {
            check_viewport(
                "depth buffer",
                depth.stride(),
                depth.height(),
                self.width,
                self.height,
            )?;
        }

        let start = Instant::now();
        let mut stats = DrawStats::default();

        for first in (offset..end).step_by(3) {
            stats.triangles += 1;

            let mut corners = [None; 3];
            for (k, corner) in corners.iter_mut().enumerate() {
                let index = *index_buffer.item(first + k)? as usize;
                let vertex = *vertex_buffer.item(index)?;
                *corner = self.transform_vertex(vertex, vertex_shader);
            }

            match corners {
                [Some(a), Some(b), Some(c)] => {
                    let shaded = self.rasterize_triangle(
                        &[a, b, c],
                        &mut target,
                        depth.as_deref_mut(),
                        pixel_shader,
                    )?;
                    match shaded {
                        Some(pixels) => stats.pixels_shaded += pixels,
                        None => stats.culled += 1,
                    }
                }
                _ => stats.culled += 1,
            }
        }

        log::debug!(
            "Drew {} triangles ({} culled, {} pixels) in {:?}",
            stats.triangles,
            stats.culled,
            stats.pixels_shaded,
            start.elapsed()
        );
        Ok(stats)
    }

    /// Vertex shader, perspective divide, and viewport mapping. `None` when
    /// the vertex lies behind the eye.
    fn transform_vertex(
        &self,
        vertex: V,
        vertex_shader: &VertexShader<V>,
    ) -> Option<ScreenVertex<V>> {
        let coords = vertex.position().extend(1.0);
        let (clip, mut data) = vertex_shader(coords, vertex);
        if clip.w <= MIN_CLIP_W {
            return None;
        }

        let ndc = clip.truncate() / clip.w;
        // Device y points up, pixel rows go down
        let screen = Vec3::new(
            (ndc.x + 1.0) * self.width as f32 / 2.0,
            (-ndc.y + 1.0) * self.height as f32 / 2.0,
            ndc.z,
        );
        data.set_position(screen);

        Some(ScreenVertex {
            screen,
            inv_w: 1.0 / clip.w,
            data,
        })
    }

    /// Returns the number of pixels written, or `None` if the triangle was
    /// culled.
    fn rasterize_triangle(
        &self,
        vertices: &[ScreenVertex<V>; 3],
        target: &mut TypedBuffer<RT>,
        mut depth: Option<&mut TypedBuffer<f32>>,
        pixel_shader: &PixelShader<V>,
    ) -> Result<Option<usize>> {
        let [a, b, c] = vertices.map(|v| v.screen.truncate());
        let area = edge_function(a, b, c);
        // Back-facing or degenerate
        if area <= 0.0 || !area.is_finite() {
            return Ok(None);
        }

        let Some((x_range, y_range)) = self.bounding_box(a, b, c) else {
            return Ok(Some(0));
        };

        let depths = Vec3::new(vertices[0].screen.z, vertices[1].screen.z, vertices[2].screen.z);
        let inv_ws = Vec3::new(vertices[0].inv_w, vertices[1].inv_w, vertices[2].inv_w);
        let mut shaded = 0;

        for y in y_range {
            for x in x_range.clone() {
                let point = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let edge0 = edge_function(a, b, point);
                let edge1 = edge_function(b, c, point);
                let edge2 = edge_function(c, a, point);
                if edge0 < 0.0 || edge1 < 0.0 || edge2 < 0.0 {
                    continue;
                }

                // Weight of each vertex is the edge value opposite to it
                let weights = Vec3::new(edge1, edge2, edge0) / area;
                let z = weights.dot(depths);

                if let Some(depth) = depth.as_deref_mut() {
                    let stored = depth.item_2d_mut(x, y)?;
                    if z.is_nan() || *stored <= z {
                        continue;
                    }
                    *stored = z;
                }

                let data = match self.interpolation {
                    Interpolation::Flat => vertices[0].data,
                    Interpolation::Smooth => {
                        let perspective = weights * inv_ws;
                        let perspective = perspective / perspective.element_sum();
                        let mut data = V::interpolate(
                            &vertices[0].data,
                            &vertices[1].data,
                            &vertices[2].data,
                            perspective,
                        );
                        data.set_position(point.extend(z));
                        data
                    }
                };

                let color = pixel_shader(&data, z);
                target.set_2d(x, y, RT::from(color))?;
                shaded += 1;
            }
        }

        Ok(Some(shaded))
    }

    /// Integer pixel box of the triangle clamped to the viewport, or `None`
    /// when it lies entirely outside.
    fn bounding_box(
        &self,
        a: Vec2,
        b: Vec2,
        c: Vec2,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let min = a.min(b).min(c).floor();
        let max = a.max(b).max(c).floor();
        let last = Vec2::new((self.width - 1) as f32, (self.height - 1) as f32);

        if max.x < 0.0 || max.y < 0.0 || min.x > last.x || min.y > last.y {
            return None;
        }

        let min = min.max(Vec2::ZERO);
        let max = max.min(last);
        Some((
            min.x as usize..=max.x as usize,
            min.y as usize..=max.y as usize,
        ))
    }
}
