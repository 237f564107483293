//! Simple scene rendered with both pipelines.
//!
//! Builds a small box with an emissive ceiling panel, rasterizes an unlit
//! preview, ray traces it with Monte Carlo bounces, and saves both as PNG.

use std::sync::Arc;

use tessera_core::image_io::save_png;
use tessera_core::{shared, Color, Model, PackedColor, TypedBuffer, Vertex};
use tessera_math::{Camera, Vec3};
use tessera_renderer::{shaders, Rasterizer, Raytracer};

const WIDTH: usize = 320;
const HEIGHT: usize = 240;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Tessera - Simple Example");
    println!("========================");

    let start = std::time::Instant::now();
    let model = build_scene()?;
    println!(
        "Scene built in {:?}: {} shapes, {} triangles",
        start.elapsed(),
        model.shape_count(),
        model.triangle_count()
    );

    let camera = Camera {
        position: Vec3::new(0.0, 1.0, 3.2),
        angle_of_view: 60.0,
        z_near: 0.01,
        z_far: 10.0,
        width: WIDTH as f32,
        height: HEIGHT as f32,
        ..Default::default()
    };

    // Rasterized preview
    let preview = shared(TypedBuffer::<PackedColor>::new_2d(WIDTH, HEIGHT));
    let depth = shared(TypedBuffer::<f32>::new_2d(WIDTH, HEIGHT));
    let mut rasterizer = Rasterizer::<Vertex, PackedColor>::new();
    rasterizer.set_viewport(WIDTH, HEIGHT);
    rasterizer.set_render_target(preview.clone(), Some(depth));
    rasterizer.set_vertex_shader(shaders::transform_vertex_shader::<Vertex>(
        camera.view_projection_matrix() * model.world_matrix(),
    ));
    rasterizer.set_pixel_shader(|vertex: &Vertex, _z| vertex.diffuse + vertex.emissive);
    rasterizer.clear_render_target(PackedColor::new(111, 15, 112))?;

    for (vertices, indices) in model.vertex_buffers().iter().zip(model.index_buffers()) {
        rasterizer.set_vertex_buffer(Arc::clone(vertices));
        rasterizer.set_index_buffer(Arc::clone(indices));
        rasterizer.draw(indices.count(), 0)?;
    }
    save_png(&preview.read(), "simple_raster.png")?;
    println!("Saved simple_raster.png");

    // Path traced
    let image = shared(TypedBuffer::<PackedColor>::new_2d(WIDTH, HEIGHT));
    let mut raytracer = Raytracer::<Vertex, PackedColor>::new();
    raytracer.set_viewport(WIDTH, HEIGHT);
    raytracer.set_render_target(image.clone());
    raytracer.set_vertex_buffers(model.world_space_vertex_buffers());
    raytracer.set_index_buffers(model.index_buffers().to_vec());
    raytracer.set_seed(2024);
    raytracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
    raytracer.set_closest_hit_shader(shaders::monte_carlo_closest_hit::<Vertex, PackedColor>());
    raytracer.build_acceleration_structure()?;

    let basis = camera.ray_basis();
    let start = std::time::Instant::now();
    raytracer.ray_generation(basis.position, basis.direction, basis.right, basis.up, 4, 16)?;
    println!("Ray traced in {:?}", start.elapsed());

    save_png(&image.read(), "simple_trace.png")?;
    println!("Saved simple_trace.png");
    Ok(())
}

/// Open box from -1 to 1 in x and z, 0 to 2 in y, with a light panel just
/// under the ceiling.
fn build_scene() -> Result<Model, tessera_core::ModelError> {
    let white = Color::splat(0.73);
    let red = Color::new(0.65, 0.05, 0.05);
    let green = Color::new(0.12, 0.45, 0.15);

    let shapes = vec![
        // Floor, ceiling, back wall
        quad(
            [
                Vec3::new(-1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(-1.0, 0.0, -1.0),
            ],
            white,
            Color::ZERO,
        ),
        quad(
            [
                Vec3::new(-1.0, 2.0, -1.0),
                Vec3::new(1.0, 2.0, -1.0),
                Vec3::new(1.0, 2.0, 1.0),
                Vec3::new(-1.0, 2.0, 1.0),
            ],
            white,
            Color::ZERO,
        ),
        quad(
            [
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 2.0, -1.0),
                Vec3::new(-1.0, 2.0, -1.0),
            ],
            white,
            Color::ZERO,
        ),
        // Left and right walls
        quad(
            [
                Vec3::new(-1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(-1.0, 2.0, -1.0),
                Vec3::new(-1.0, 2.0, 1.0),
            ],
            red,
            Color::ZERO,
        ),
        quad(
            [
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 2.0, 1.0),
                Vec3::new(1.0, 2.0, -1.0),
            ],
            green,
            Color::ZERO,
        ),
        // Light
        quad(
            [
                Vec3::new(-0.3, 1.98, -0.3),
                Vec3::new(0.3, 1.98, -0.3),
                Vec3::new(0.3, 1.98, 0.3),
                Vec3::new(-0.3, 1.98, 0.3),
            ],
            Color::ZERO,
            Color::splat(8.0),
        ),
    ];

    Model::from_shapes(shapes)
}

/// Two triangles over four corners given in counter-clockwise order as seen
/// from the side the normal points to.
fn quad(corners: [Vec3; 4], diffuse: Color, emissive: Color) -> (Vec<Vertex>, Vec<u32>) {
    let normal = (corners[1] - corners[0])
        .cross(corners[3] - corners[0])
        .normalize_or_zero();
    let vertices = corners
        .iter()
        .map(|&position| Vertex {
            position,
            normal,
            ambient: diffuse * 0.1,
            diffuse,
            emissive,
            ..Default::default()
        })
        .collect();
    (vertices, vec![0, 1, 2, 0, 2, 3])
}
