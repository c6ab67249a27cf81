//! Mesh library and procedural primitives
//!
//! Geometry is CPU-side here; the renderer uploads vertex and index buffers
//! on first use, keyed by [`MeshHandle`]. Primitives are generated with the
//! scene-file color baked into the vertices.
//!
//! Model-space faces wind counter-clockwise seen from outside.

use serde::{Deserialize, Serialize};

use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::foundation::math::{constants, Vec3};

/// Vertex layout shared by every mesh pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Linear RGB vertex color
    pub color: [f32; 3],
    /// Outward normal in model space
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

// Only f32 fields, no padding bytes at this layout.
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Creates a vertex.
    pub fn new(position: [f32; 3], color: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }
}

/// Procedural shapes the library can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveShape {
    /// Unit quad in the XZ plane, normal +Y
    Quad,
    /// Unit cube centered at the origin
    Cube,
    /// Sphere of radius 0.5
    Sphere,
}

/// Handle to a mesh in the library
pub type MeshHandle = TypedHandle<MeshData>;

/// One mesh's geometry plus the recipe it was generated from
#[derive(Debug, Clone)]
pub struct MeshData {
    shape: PrimitiveShape,
    color: Vec3,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Shape this mesh was generated from
    pub fn shape(&self) -> PrimitiveShape {
        self.shape
    }

    /// Color baked into the vertices
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index data, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Owns all mesh geometry for a running engine
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: HandleMap<MeshData>,
}

impl MeshLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a primitive with `color` baked in and returns its handle.
    pub fn load_primitive(&mut self, shape: PrimitiveShape, color: Vec3) -> MeshHandle {
        let rgb = [color.x, color.y, color.z];
        let (vertices, indices) = match shape {
            PrimitiveShape::Quad => quad(rgb),
            PrimitiveShape::Cube => cube(rgb),
            PrimitiveShape::Sphere => sphere(rgb),
        };
        let key = self.meshes.insert(MeshData {
            shape,
            color,
            vertices,
            indices,
        });
        TypedHandle::new(key)
    }

    /// Looks up a mesh.
    pub fn get(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(handle.key())
    }

    /// Number of meshes in the library
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// True when the library holds no meshes.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Iterates all meshes with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &MeshData)> {
        self.meshes
            .iter()
            .map(|(key, data)| (TypedHandle::new(key), data))
    }
}

fn quad(color: [f32; 3]) -> (Vec<Vertex>, Vec<u32>) {
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([-0.5, 0.0, -0.5], color, up, [0.0, 0.0]),
        Vertex::new([0.5, 0.0, -0.5], color, up, [1.0, 0.0]),
        Vertex::new([0.5, 0.0, 0.5], color, up, [1.0, 1.0]),
        Vertex::new([-0.5, 0.0, 0.5], color, up, [0.0, 1.0]),
    ];
    let indices = vec![0, 3, 2, 0, 2, 1];
    (vertices, indices)
}

fn cube(color: [f32; 3]) -> (Vec<Vertex>, Vec<u32>) {
    // Four vertices per face so normals stay flat.
    let faces: [([f32; 3], [[f32; 3]; 4], [[f32; 2]; 4]); 6] = [
        // Front (+Z)
        (
            [0.0, 0.0, 1.0],
            [
                [-0.5, -0.5, 0.5],
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        // Back (-Z)
        (
            [0.0, 0.0, -1.0],
            [
                [0.5, -0.5, -0.5],
                [-0.5, -0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [0.5, 0.5, -0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        // Left (-X)
        (
            [-1.0, 0.0, 0.0],
            [
                [-0.5, -0.5, -0.5],
                [-0.5, -0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [-0.5, 0.5, -0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        // Right (+X)
        (
            [1.0, 0.0, 0.0],
            [
                [0.5, -0.5, 0.5],
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, 0.5, 0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        // Top (+Y)
        (
            [0.0, 1.0, 0.0],
            [
                [-0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
                [0.5, 0.5, -0.5],
                [-0.5, 0.5, -0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        // Bottom (-Y)
        (
            [0.0, -1.0, 0.0],
            [
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, -0.5, 0.5],
                [-0.5, -0.5, 0.5],
            ],
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, corners, uvs)) in faces.iter().enumerate() {
        let base = (face * 4) as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            vertices.push(Vertex::new(*corner, color, *normal, *uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

fn sphere(color: [f32; 3]) -> (Vec<Vertex>, Vec<u32>) {
    const RINGS: u32 = 16;
    const SECTORS: u32 = 24;
    const RADIUS: f32 = 0.5;

    let mut vertices = Vec::with_capacity(((RINGS + 1) * (SECTORS + 1)) as usize);
    for ring in 0..=RINGS {
        let phi = constants::PI * ring as f32 / RINGS as f32;
        for sector in 0..=SECTORS {
            let theta = constants::TAU * sector as f32 / SECTORS as f32;
            let normal = [
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            ];
            let position = [normal[0] * RADIUS, normal[1] * RADIUS, normal[2] * RADIUS];
            let uv = [
                sector as f32 / SECTORS as f32,
                ring as f32 / RINGS as f32,
            ];
            vertices.push(Vertex::new(position, color, normal, uv));
        }
    }

    let mut indices = Vec::with_capacity((RINGS * SECTORS * 6) as usize);
    for ring in 0..RINGS {
        for sector in 0..SECTORS {
            let a = ring * (SECTORS + 1) + sector;
            let b = a + SECTORS + 1;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_have_consistent_geometry() {
        let mut library = MeshLibrary::new();
        let color = Vec3::new(0.8, 0.2, 0.1);

        let quad = library.load_primitive(PrimitiveShape::Quad, color);
        let cube = library.load_primitive(PrimitiveShape::Cube, color);
        let sphere = library.load_primitive(PrimitiveShape::Sphere, color);

        let quad = library.get(quad).unwrap();
        assert_eq!(quad.vertices().len(), 4);
        assert_eq!(quad.index_count(), 6);

        let cube = library.get(cube).unwrap();
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.index_count(), 36);

        let sphere = library.get(sphere).unwrap();
        assert_eq!(sphere.index_count() % 3, 0);
        for vertex in sphere.vertices() {
            let p = vertex.position;
            let radius = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((radius - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_indices_stay_in_bounds() {
        let mut library = MeshLibrary::new();
        for shape in [
            PrimitiveShape::Quad,
            PrimitiveShape::Cube,
            PrimitiveShape::Sphere,
        ] {
            let handle = library.load_primitive(shape, Vec3::new(1.0, 1.0, 1.0));
            let mesh = library.get(handle).unwrap();
            let vertex_count = mesh.vertices().len() as u32;
            assert!(mesh.indices().iter().all(|&i| i < vertex_count));
        }
    }

    #[test]
    fn test_color_is_baked_and_recorded() {
        let mut library = MeshLibrary::new();
        let color = Vec3::new(0.1, 0.6, 0.9);
        let handle = library.load_primitive(PrimitiveShape::Cube, color);
        let mesh = library.get(handle).unwrap();

        assert_eq!(mesh.shape(), PrimitiveShape::Cube);
        assert_eq!(mesh.color(), color);
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| v.color == [0.1, 0.6, 0.9]));
    }

    #[test]
    fn test_handles_resolve_and_the_library_counts_them() {
        let mut library = MeshLibrary::new();
        let handle = library.load_primitive(PrimitiveShape::Quad, Vec3::zeros());
        assert!(library.get(handle).is_some());
        assert_eq!(library.len(), 1);
    }
}
