/// Sunorbit Core Library - Scene math, geometry and frame submission
///
/// This library holds the device-independent half of the orbiting-sun demo:
/// matrix math, mesh generation, scene state, the shader program and the
/// per-frame renderer that drives any `GraphicsDevice`.

pub mod config;
pub mod device;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod projection;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod shading;
pub mod sphere;
pub mod texture;
pub mod transform;

// Re-export commonly used types
pub use config::SceneConfig;
pub use device::{BufferHandle, GraphicsDevice, PrimitiveKind, ProgramHandle, TextureHandle, UniformValue};
pub use error::{ConfigError, DeviceError, GeometryError, MatrixError, RenderError, ShaderError, TextureError};
pub use geometry::{Mesh, Vertex};
pub use matrix::Mat4;
pub use projection::{ScreenPoint, Viewport};
pub use renderer::{FrameLoop, FrameRenderer, FrameTransforms};
pub use scene::{SceneEvent, SceneState};
pub use shader::{ShaderSource, SCENE_PROGRAM};
pub use shading::{shade, Fragment, ShadingMode, ShadingUniforms, VertexStage};
pub use sphere::{generate_sphere, SphereParams};
pub use texture::{PixelFormat, TextureImage};
pub use transform::{Orbit, Transform};
