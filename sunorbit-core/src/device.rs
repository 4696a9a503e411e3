/// The graphics device contract consumed by the frame renderer.
///
/// Handles are opaque ids minted by the device. The renderer owns every
/// handle it creates and hands them back through the `release_*` methods.

use nalgebra::Vector3;

use crate::error::DeviceError;
use crate::geometry::Mesh;
use crate::matrix::Mat4;
use crate::shader::ShaderSource;
use crate::texture::TextureImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec3(Vector3<f32>),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn vec3(v: [f32; 3]) -> Self {
        Self::Vec3(Vector3::from(v))
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        Self::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(m)
    }
}

/// A rasterizing backend.
///
/// Creation calls may fail and are made once at startup. Per-frame calls
/// (`use_program` through `draw`) are infallible; a device that cannot honor
/// one logs it and carries on.
pub trait GraphicsDevice {
    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramHandle, DeviceError>;

    fn upload_vertex_buffer(&mut self, mesh: &Mesh) -> Result<BufferHandle, DeviceError>;

    /// Upload format follows `image.format()` (RGB or RGBA).
    fn upload_texture(&mut self, image: &TextureImage) -> Result<TextureHandle, DeviceError>;

    /// Current viewport size in pixels.
    fn viewport(&self) -> (u32, u32);

    fn clear(&mut self, color: [f32; 4]);

    fn use_program(&mut self, program: ProgramHandle);

    /// `None` unbinds, leaving samplers without a texture.
    fn bind_texture(&mut self, texture: Option<TextureHandle>);

    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn draw(&mut self, buffer: BufferHandle, vertex_count: usize, primitive: PrimitiveKind);

    fn release_program(&mut self, program: ProgramHandle);

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_texture(&mut self, texture: TextureHandle);
}
