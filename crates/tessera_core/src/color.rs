//! Float and packed 8-bit color representations.

use bytemuck::{Pod, Zeroable};
use tessera_math::Vec3;

/// Linear float color. Components are unconstrained until packed.
pub type Color = Vec3;

/// 8-bit RGB color, laid out for direct upload to image encoders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PackedColor {
    pub const BLACK: PackedColor = PackedColor::new(0, 0, 0);
    pub const WHITE: PackedColor = PackedColor::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale to [0, 255], clamp, and truncate each channel.
    pub fn from_color(color: Color) -> Self {
        let scaled = (color * 255.0).clamp(Vec3::ZERO, Vec3::splat(255.0));
        Self {
            r: scaled.x as u8,
            g: scaled.y as u8,
            b: scaled.z as u8,
        }
    }

    pub fn to_color(self) -> Color {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

impl From<Color> for PackedColor {
    fn from(color: Color) -> Self {
        PackedColor::from_color(color)
    }
}

impl From<PackedColor> for Color {
    fn from(color: PackedColor) -> Self {
        color.to_color()
    }
}

/// Storage types a render target may hold.
///
/// Pipelines resolve shading in float `Color` and convert once per pixel.
pub trait RenderTargetColor: From<Color> + Copy + Send + Sync + 'static {}

impl<T> RenderTargetColor for T where T: From<Color> + Copy + Send + Sync + 'static {}
