//! Drives one render from settings to saved image.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tessera_core::image_io::save_png;
use tessera_core::{shared, Color, Model, PackedColor, SharedBuffer, TypedBuffer, Vertex};
use tessera_math::Camera;
use tessera_renderer::{shaders, Rasterizer, Raytracer};

use crate::settings::{RendererKind, Settings};

/// Load the model, render it with the selected pipeline and save the PNG.
pub fn run(settings: &Settings) -> Result<()> {
    let model = Model::load_obj(&settings.model_path)
        .with_context(|| format!("Failed to load model {}", settings.model_path.display()))?;
    let camera = settings.camera();

    log::info!(
        "Rendering {}x{} with the {:?} pipeline",
        settings.width,
        settings.height,
        settings.renderer
    );

    let image = match settings.renderer {
        RendererKind::Rasterizer => rasterize(settings, &model, &camera)?,
        RendererKind::Raytracer => ray_trace(settings, &model, &camera)?,
        RendererKind::Shadow => shadow_trace(settings, &model, &camera)?,
    };

    let image = image.read();
    save_png(&image, &settings.result_path)
        .with_context(|| format!("Failed to save {}", settings.result_path.display()))?;
    log::info!("Saved {}", settings.result_path.display());
    Ok(())
}

fn rasterize(
    settings: &Settings,
    model: &Model,
    camera: &Camera,
) -> Result<SharedBuffer<PackedColor>> {
    let target = shared(TypedBuffer::new_2d(settings.width, settings.height));
    let depth = shared(TypedBuffer::new_2d(settings.width, settings.height));

    let mut rasterizer = Rasterizer::<Vertex, PackedColor>::new();
    rasterizer.set_viewport(settings.width, settings.height);
    rasterizer.set_render_target(target.clone(), Some(depth));
    rasterizer.set_interpolation(settings.interpolation.into());
    rasterizer.set_vertex_shader(shaders::transform_vertex_shader::<Vertex>(
        camera.view_projection_matrix() * model.world_matrix(),
    ));
    rasterizer.set_pixel_shader(shaders::ambient_pixel_shader::<Vertex>());

    let start = Instant::now();
    rasterizer.clear_render_target(settings.clear_color())?;
    log::info!("Clearing took {:?}", start.elapsed());

    let start = Instant::now();
    let mut pixels = 0;
    for (shape, (vertices, indices)) in model
        .vertex_buffers()
        .iter()
        .zip(model.index_buffers())
        .enumerate()
    {
        log::debug!(
            "Shape {}: vertex buffer {} bytes, index buffer {} bytes",
            shape,
            vertices.size_bytes(),
            indices.size_bytes()
        );
        rasterizer.set_vertex_buffer(Arc::clone(vertices));
        rasterizer.set_index_buffer(Arc::clone(indices));
        let stats = rasterizer
            .draw(indices.count(), 0)
            .with_context(|| format!("Failed to draw shape {}", shape))?;
        if stats.culled > 0 {
            log::warn!(
                "Shape {}: culled {} of {} triangles",
                shape,
                stats.culled,
                stats.triangles
            );
        }
        pixels += stats.pixels_shaded;
    }
    log::info!("Rasterization took {:?} ({} pixels shaded)", start.elapsed(), pixels);

    Ok(target)
}

fn scene_tracer(settings: &Settings, model: &Model) -> Result<Raytracer<Vertex, PackedColor>> {
    let mut raytracer = Raytracer::new();
    raytracer.set_viewport(settings.width, settings.height);
    raytracer.set_vertex_buffers(model.world_space_vertex_buffers());
    raytracer.set_index_buffers(model.index_buffers().to_vec());
    raytracer.set_seed(settings.seed);
    raytracer
        .build_acceleration_structure()
        .context("Failed to build acceleration structure")?;
    Ok(raytracer)
}

fn generate(
    settings: &Settings,
    raytracer: &mut Raytracer<Vertex, PackedColor>,
    camera: &Camera,
) -> Result<SharedBuffer<PackedColor>> {
    let target = shared(TypedBuffer::new_2d(settings.width, settings.height));
    raytracer.set_render_target(target.clone());
    raytracer.clear_render_target(PackedColor::BLACK)?;

    let basis = camera.ray_basis();
    raytracer.ray_generation(
        basis.position,
        basis.direction,
        basis.right,
        basis.up,
        settings.raytracing_depth,
        settings.accumulation_num,
    )?;
    Ok(target)
}

fn ray_trace(
    settings: &Settings,
    model: &Model,
    camera: &Camera,
) -> Result<SharedBuffer<PackedColor>> {
    let mut raytracer = scene_tracer(settings, model)?;
    raytracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
    raytracer.set_closest_hit_shader(shaders::monte_carlo_closest_hit::<Vertex, PackedColor>());
    generate(settings, &mut raytracer, camera)
}

fn shadow_trace(
    settings: &Settings,
    model: &Model,
    camera: &Camera,
) -> Result<SharedBuffer<PackedColor>> {
    let mut raytracer = scene_tracer(settings, model)?;

    let mut shadow_tracer = Raytracer::new();
    shadow_tracer.share_acceleration_structure(&raytracer)?;
    shadow_tracer.set_any_hit_shader(shaders::shadow_any_hit());
    shadow_tracer.set_miss_shader(shaders::shadow_miss());

    raytracer.set_miss_shader(shaders::solid_miss(Color::ZERO));
    raytracer.set_closest_hit_shader(shaders::direct_lighting_closest_hit(
        vec![settings.light()],
        Arc::new(shadow_tracer),
    ));
    generate(settings, &mut raytracer, camera)
}
