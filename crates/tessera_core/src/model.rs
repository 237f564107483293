//! Wavefront OBJ loading into per-shape vertex and index buffers.
//!
//! Each OBJ shape becomes one `TypedBuffer<Vertex>` plus one
//! `TypedBuffer<u32>` of triangle indices. Material terms (`Ka`, `Kd`, `Ke`)
//! are copied onto every vertex of the shape so the pipelines never need a
//! material table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tessera_math::{Mat4, Vec2, Vec3};
use thiserror::Error;

use crate::{Color, TypedBuffer, Vertex};

/// Errors that can occur while loading or assembling a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load OBJ: {0}")]
    Load(#[from] tobj::LoadError),

    #[error("No shapes found in {0}")]
    Empty(PathBuf),

    #[error("Shape {shape} has {count} indices, not a multiple of 3")]
    InvalidIndexCount { shape: usize, count: usize },

    #[error("Shape {shape} references vertex {index} but has only {vertex_count}")]
    IndexOutOfRange {
        shape: usize,
        index: u32,
        vertex_count: usize,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Material terms applied to every vertex of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SurfaceTerms {
    ambient: Color,
    diffuse: Color,
    emissive: Color,
}

impl Default for SurfaceTerms {
    fn default() -> Self {
        Self {
            ambient: Color::ZERO,
            diffuse: Color::splat(0.5),
            emissive: Color::ZERO,
        }
    }
}

/// Loaded geometry: parallel lists of vertex and index buffers plus a world
/// transform.
#[derive(Debug, Clone)]
pub struct Model {
    vertex_buffers: Vec<Arc<TypedBuffer<Vertex>>>,
    index_buffers: Vec<Arc<TypedBuffer<u32>>>,
    world_matrix: Mat4,
}

impl Model {
    /// Assemble a model from in-memory shapes, validating every index.
    pub fn from_shapes(shapes: Vec<(Vec<Vertex>, Vec<u32>)>) -> ModelResult<Self> {
        let mut vertex_buffers = Vec::with_capacity(shapes.len());
        let mut index_buffers = Vec::with_capacity(shapes.len());

        for (shape, (vertices, indices)) in shapes.into_iter().enumerate() {
            if indices.len() % 3 != 0 {
                return Err(ModelError::InvalidIndexCount {
                    shape,
                    count: indices.len(),
                });
            }
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(ModelError::IndexOutOfRange {
                    shape,
                    index,
                    vertex_count: vertices.len(),
                });
            }
            vertex_buffers.push(Arc::new(TypedBuffer::from_vec(vertices)));
            index_buffers.push(Arc::new(TypedBuffer::from_vec(indices)));
        }

        Ok(Self {
            vertex_buffers,
            index_buffers,
            world_matrix: Mat4::IDENTITY,
        })
    }

    /// Load an OBJ file (and its MTL library, when present).
    pub fn load_obj(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )?;

        if models.is_empty() {
            return Err(ModelError::Empty(path.to_path_buf()));
        }

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("No materials for {}: {}", path.display(), err);
            Vec::new()
        });
        let surfaces: Vec<SurfaceTerms> = materials.iter().map(surface_terms).collect();

        let shapes = models
            .into_iter()
            .map(|model| {
                let surface = model
                    .mesh
                    .material_id
                    .and_then(|id| surfaces.get(id).copied())
                    .unwrap_or_default();
                log::debug!(
                    "Shape '{}': {} vertices, {} triangles",
                    model.name,
                    model.mesh.positions.len() / 3,
                    model.mesh.indices.len() / 3
                );
                build_vertices(&model.mesh, surface)
            })
            .collect();

        let loaded = Self::from_shapes(shapes)?;
        log::info!(
            "Loaded {}: {} shapes, {} triangles",
            path.display(),
            loaded.shape_count(),
            loaded.triangle_count()
        );
        Ok(loaded)
    }

    pub fn vertex_buffers(&self) -> &[Arc<TypedBuffer<Vertex>>] {
        &self.vertex_buffers
    }

    pub fn index_buffers(&self) -> &[Arc<TypedBuffer<u32>>] {
        &self.index_buffers
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    pub fn set_world_matrix(&mut self, world_matrix: Mat4) {
        self.world_matrix = world_matrix;
    }

    /// Vertex buffers with the world transform baked into positions and
    /// normals. Returns shared handles to the originals when the transform is
    /// the identity.
    pub fn world_space_vertex_buffers(&self) -> Vec<Arc<TypedBuffer<Vertex>>> {
        if self.world_matrix == Mat4::IDENTITY {
            return self.vertex_buffers.clone();
        }

        let normal_matrix = self.world_matrix.inverse().transpose();
        self.vertex_buffers
            .iter()
            .map(|buffer| {
                let vertices = buffer
                    .iter()
                    .map(|vertex| Vertex {
                        position: self.world_matrix.transform_point3(vertex.position),
                        normal: normal_matrix
                            .transform_vector3(vertex.normal)
                            .normalize_or_zero(),
                        ..*vertex
                    })
                    .collect();
                Arc::new(TypedBuffer::from_vec(vertices))
            })
            .collect()
    }

    pub fn shape_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.index_buffers.iter().map(|b| b.count() / 3).sum()
    }
}

fn surface_terms(material: &tobj::Material) -> SurfaceTerms {
    let defaults = SurfaceTerms::default();
    SurfaceTerms {
        ambient: material.ambient.map(Vec3::from).unwrap_or(defaults.ambient),
        diffuse: material.diffuse.map(Vec3::from).unwrap_or(defaults.diffuse),
        emissive: material.emissive.map(Vec3::from).unwrap_or(defaults.emissive),
    }
}

fn build_vertices(mesh: &tobj::Mesh, surface: SurfaceTerms) -> (Vec<Vertex>, Vec<u32>) {
    let vertex_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_texcoords = mesh.texcoords.len() / 2 == vertex_count;

    let mut vertices: Vec<Vertex> = (0..vertex_count)
        .map(|i| Vertex {
            position: Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]),
            normal: if has_normals {
                Vec3::from_slice(&mesh.normals[i * 3..i * 3 + 3])
            } else {
                Vec3::ZERO
            },
            texture: if has_texcoords {
                Vec2::from_slice(&mesh.texcoords[i * 2..i * 2 + 2])
            } else {
                Vec2::ZERO
            },
            ambient: surface.ambient,
            diffuse: surface.diffuse,
            emissive: surface.emissive,
        })
        .collect();

    if !has_normals {
        compute_normals(&mut vertices, &mesh.indices);
    }

    (vertices, mesh.indices.clone())
}

/// Smooth vertex normals: the normalized sum of adjacent counter-clockwise
/// face normals.
pub fn compute_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let vertex_count = vertices.len();
    let mut normals = vec![Vec3::ZERO; vertex_count];

    for face in indices.chunks_exact(3) {
        let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }

        let p0 = vertices[i0].position;
        let face_normal = (vertices[i1].position - p0).cross(vertices[i2].position - p0);

        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    for (vertex, normal) in vertices.iter_mut().zip(normals) {
        // Unreferenced or degenerate vertices keep a default up normal
        vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o light
v -1.0 -1.0 -1.0
v 1.0 -1.0 -1.0
v 1.0 1.0 -1.0
v -1.0 1.0 -1.0
usemtl glow
f 1 2 3 4
o floor
v -1.0 -2.0 0.0
v 1.0 -2.0 0.0
v 0.0 -2.0 -1.0
vn 0.0 1.0 0.0
usemtl grey
f 5//1 6//1 7//1
";

    const QUAD_MTL: &str = "\
newmtl glow
Ka 0.1 0.1 0.1
Kd 0.0 0.0 0.0
Ke 1.0 0.5 0.25

newmtl grey
Kd 0.7 0.7 0.7
";

    fn vertex_at(position: Vec3) -> Vertex {
        Vertex {
            position,
            ..Default::default()
        }
    }

    #[test]
    fn test_load_obj_with_materials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let model = Model::load_obj(dir.path().join("quad.obj")).unwrap();

        assert_eq!(model.shape_count(), 2);
        // Quad is triangulated into two triangles
        assert_eq!(model.index_buffers()[0].count(), 6);
        assert_eq!(model.triangle_count(), 3);
        assert_eq!(model.world_matrix(), Mat4::IDENTITY);

        let light = model.vertex_buffers()[0].item(0).unwrap();
        assert_eq!(light.emissive, Color::new(1.0, 0.5, 0.25));
        assert_eq!(light.ambient, Color::splat(0.1));
        // No normals in the file: computed facing +Z for CCW winding
        assert!((light.normal - Vec3::Z).length() < 1e-5);

        let floor = model.vertex_buffers()[1].item(0).unwrap();
        assert_eq!(floor.diffuse, Color::splat(0.7));
        assert_eq!(floor.emissive, Color::ZERO);
        assert_eq!(floor.normal, Vec3::Y);
    }

    #[test]
    fn test_load_obj_emissive_per_material() {
        let obj = "\
mtllib lamps.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
v 1.0 1.0 0.0
usemtl warm
f 1 2 3
usemtl cool
f 2 4 3
usemtl dark
f 1 2 4
";
        let mtl = "\
newmtl warm
Kd 0.2 0.2 0.2
Ke 4.0 2.0 1.0

newmtl cool
Ke 0.5 1.0 8.0

newmtl dark
Kd 0.3 0.3 0.3
";
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lamps.obj"), obj).unwrap();
        fs::write(dir.path().join("lamps.mtl"), mtl).unwrap();

        let model = Model::load_obj(dir.path().join("lamps.obj")).unwrap();
        assert_eq!(model.shape_count(), 3);

        let emissive: Vec<Color> = model
            .vertex_buffers()
            .iter()
            .map(|buffer| {
                let first = buffer.item(0).unwrap().emissive;
                assert!(buffer.iter().all(|v| v.emissive == first));
                first
            })
            .collect();
        assert_eq!(
            emissive,
            vec![
                Color::new(4.0, 2.0, 1.0),
                Color::new(0.5, 1.0, 8.0),
                Color::ZERO
            ]
        );
        assert_eq!(model.vertex_buffers()[0].item(0).unwrap().diffuse, Color::splat(0.2));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Model::load_obj(dir.path().join("missing.obj"));
        assert!(matches!(result, Err(ModelError::Load(_))));
    }

    #[test]
    fn test_from_shapes_validates_indices() {
        let vertices = vec![vertex_at(Vec3::ZERO), vertex_at(Vec3::X), vertex_at(Vec3::Y)];

        let ok = Model::from_shapes(vec![(vertices.clone(), vec![0, 1, 2])]).unwrap();
        assert_eq!(ok.triangle_count(), 1);

        let partial = Model::from_shapes(vec![(vertices.clone(), vec![0, 1])]);
        assert!(matches!(
            partial,
            Err(ModelError::InvalidIndexCount { shape: 0, count: 2 })
        ));

        let dangling = Model::from_shapes(vec![(vertices, vec![0, 1, 3])]);
        assert!(matches!(
            dangling,
            Err(ModelError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_world_space_vertex_buffers() {
        let vertices = vec![
            Vertex {
                position: Vec3::new(1.0, 0.0, 0.0),
                normal: Vec3::Y,
                ..Default::default()
            };
            3
        ];
        let mut model = Model::from_shapes(vec![(vertices, vec![0, 1, 2])]).unwrap();

        let identity = model.world_space_vertex_buffers();
        assert!(Arc::ptr_eq(&identity[0], &model.vertex_buffers()[0]));

        model.set_world_matrix(
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)) * Mat4::from_scale(Vec3::splat(3.0)),
        );
        let moved = model.world_space_vertex_buffers();
        let vertex = moved[0].item(0).unwrap();
        assert!((vertex.position - Vec3::new(3.0, 2.0, 0.0)).length() < 1e-5);
        assert!((vertex.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_compute_normals_ccw() {
        let mut vertices = vec![vertex_at(Vec3::ZERO), vertex_at(Vec3::X), vertex_at(Vec3::Y)];
        compute_normals(&mut vertices, &[0, 1, 2]);

        for vertex in &vertices {
            assert!((vertex.normal - Vec3::Z).length() < 1e-5);
        }
    }
}
