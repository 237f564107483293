//! Random sampling helpers for Monte Carlo shading.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tessera_math::Vec3;

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniformly distributed unit vector (rejection sampled in the unit ball).
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = p.length_squared();
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

/// Cosine-weighted direction in the hemisphere around `normal`.
///
/// `normal` must be unit length. The result is normalized.
pub fn cosine_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let direction = normal + random_unit_vector(rng);
    // Catch degenerate direction
    direction.try_normalize().unwrap_or(normal)
}

/// SplitMix64 finalizer applied to `x` plus the golden-ratio increment.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stream seed for pixel `(x, y)`. Fixed arithmetic, so a seed names the
/// same image on every platform and toolchain.
pub fn pixel_seed(seed: u64, x: usize, y: usize) -> u64 {
    splitmix64(splitmix64(splitmix64(seed) ^ x as u64) ^ y as u64)
}

/// Deterministic per-pixel generator, independent of which thread renders
/// the pixel.
pub fn pixel_rng(seed: u64, x: usize, y: usize) -> StdRng {
    StdRng::seed_from_u64(pixel_seed(seed, x, y))
}
