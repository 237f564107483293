//! Command line settings.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tessera_core::{Light, PackedColor};
use tessera_math::{Camera, Vec3};
use tessera_renderer::Interpolation;

/// Which pipeline renders the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Scan conversion with a depth test
    Rasterizer,
    /// Monte Carlo global illumination
    Raytracer,
    /// Direct lighting with hard shadows
    Shadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterpolationMode {
    Flat,
    Smooth,
}

impl From<InterpolationMode> for Interpolation {
    fn from(mode: InterpolationMode) -> Self {
        match mode {
            InterpolationMode::Flat => Interpolation::Flat,
            InterpolationMode::Smooth => Interpolation::Smooth,
        }
    }
}

/// Render an OBJ model to a PNG with the rasterizer or the ray tracer.
#[derive(Debug, Clone, Parser)]
#[command(name = "tessera", version, about)]
pub struct Settings {
    /// Output width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: usize,

    /// Output height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: usize,

    /// OBJ file to render (MTL libraries are resolved next to it)
    #[arg(long, default_value = "models/CornellBox-Original.obj")]
    pub model_path: PathBuf,

    #[arg(
        long,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        default_values_t = [0.0, 0.75, 2.4],
        allow_negative_numbers = true
    )]
    pub camera_position: Vec<f32>,

    /// Yaw in degrees; 0 looks down -Z
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub camera_theta: f32,

    /// Pitch in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub camera_phi: f32,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    pub camera_angle_of_view: f32,

    #[arg(long, default_value_t = 0.001)]
    pub camera_z_near: f32,

    #[arg(long, default_value_t = 100.0)]
    pub camera_z_far: f32,

    #[arg(long, default_value = "result.png")]
    pub result_path: PathBuf,

    /// Maximum recursion depth for traced rays
    #[arg(long, default_value_t = 3)]
    pub raytracing_depth: usize,

    /// Samples averaged per pixel
    #[arg(long, default_value_t = 16)]
    pub accumulation_num: usize,

    /// Seed for Monte Carlo sampling
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Rasterizer background as 8-bit RGB
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = [111, 15, 112])]
    pub clear_color: Vec<u8>,

    #[arg(long, value_enum, default_value_t = InterpolationMode::Smooth)]
    pub interpolation: InterpolationMode,

    #[arg(long, value_enum, default_value_t = RendererKind::Rasterizer)]
    pub renderer: RendererKind,

    /// Point light used by the shadow renderer
    #[arg(
        long,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        default_values_t = [0.0, 1.58, -0.03],
        allow_negative_numbers = true
    )]
    pub light_position: Vec<f32>,

    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = [0.78, 0.78, 0.78])]
    pub light_color: Vec<f32>,
}

impl Settings {
    pub fn camera(&self) -> Camera {
        Camera {
            position: vec3(&self.camera_position),
            theta: self.camera_theta,
            phi: self.camera_phi,
            angle_of_view: self.camera_angle_of_view,
            z_near: self.camera_z_near,
            z_far: self.camera_z_far,
            width: self.width as f32,
            height: self.height as f32,
        }
    }

    pub fn clear_color(&self) -> PackedColor {
        match self.clear_color.as_slice() {
            [r, g, b] => PackedColor::new(*r, *g, *b),
            _ => PackedColor::BLACK,
        }
    }

    pub fn light(&self) -> Light {
        Light::new(vec3(&self.light_position), vec3(&self.light_color))
    }
}

/// clap enforces three values; anything else falls back to zero.
fn vec3(values: &[f32]) -> Vec3 {
    match values {
        [x, y, z] => Vec3::new(*x, *y, *z),
        _ => Vec3::ZERO,
    }
}
