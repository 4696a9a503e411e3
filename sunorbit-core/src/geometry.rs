/// Vertex layout and unindexed triangle-list meshes
use nalgebra::{Point3, Vector3};

/// Floats per interleaved vertex: position (3), normal (3), uv (2).
pub const VERTEX_STRIDE: usize = 8;

/// A vertex shared by every mesh in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position: Point3::from(position),
            normal: Vector3::from(normal),
            uv,
        }
    }

    pub fn from_array(a: &[f32; VERTEX_STRIDE]) -> Self {
        Self::new([a[0], a[1], a[2]], [a[3], a[4], a[5]], [a[6], a[7]])
    }

    /// Interleaved attribute layout used for buffer uploads.
    pub fn to_array(&self) -> [f32; VERTEX_STRIDE] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.uv[0],
            self.uv[1],
        ]
    }
}

/// Unit cube centered at the origin, one outward normal per face.
#[rustfmt::skip]
pub const CUBE_VERTICES: [[f32; VERTEX_STRIDE]; 36] = [
    // Back (-z)
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [ 0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    [-0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0],
    // Front (+z)
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [-0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    // Left (-x)
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0],
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    // Right (+x)
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    [ 0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0],
    // Bottom (-y)
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [-0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0],
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    // Top (+y)
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
    [-0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0],
];

/// A triangle list: every three consecutive vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate complete triangles; a trailing partial triangle is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex]> + '_ {
        self.vertices.chunks_exact(3)
    }

    /// Flat interleaved float buffer in [`VERTEX_STRIDE`] layout.
    pub fn interleaved(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }

    /// The 36-vertex unit cube.
    pub fn cube() -> Self {
        Self::from_vertices(CUBE_VERTICES.iter().map(Vertex::from_array).collect())
    }
}

/// Geometric normal of a counter-clockwise triangle.
pub fn face_normal(tri: &[Vertex]) -> Vector3<f32> {
    let edge1 = tri[1].position - tri[0].position;
    let edge2 = tri[2].position - tri[0].position;
    edge1.cross(&edge2)
}
