/// Error types for the rendering core.
use thiserror::Error;

/// Rejected inputs to the matrix constructors.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MatrixError {
    #[error("vertical field of view must lie in (0, pi), got {0}")]
    InvalidFieldOfView(f32),

    #[error("aspect ratio must be positive, got {0}")]
    InvalidAspectRatio(f32),

    #[error("depth range requires 0 < near < far, got near={near} far={far}")]
    InvalidDepthRange { near: f32, far: f32 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "invalid sphere parameters: radius={radius}, longitude_segments={longitude_segments}, \
         latitude_segments={latitude_segments}"
    )]
    InvalidSphere {
        radius: f32,
        longitude_segments: u32,
        latitude_segments: u32,
    },
}

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Shader source that could not be compiled or linked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    #[error("{stage} shader is missing a #version directive")]
    MissingVersion { stage: &'static str },

    #[error("{stage} shader: malformed uniform declaration near `{snippet}`")]
    MalformedUniform { stage: &'static str, snippet: String },

    #[error("{stage} shader: unsupported uniform type `{ty}` for `{name}`")]
    UnsupportedType {
        stage: &'static str,
        ty: String,
        name: String,
    },

    #[error("link failed: uniform `{name}` declared as {vertex} and {fragment}")]
    LinkMismatch {
        name: String,
        vertex: String,
        fragment: String,
    },

    #[error("stage version mismatch: vertex {vertex}, fragment {fragment}")]
    VersionMismatch { vertex: u32, fragment: u32 },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("shader program rejected: {0}")]
    Compile(#[from] ShaderError),

    #[error("vertex buffer is empty")]
    EmptyBuffer,

    #[error("texture upload failed: {0}")]
    Texture(String),

    #[error("device failure: {0}")]
    Backend(String),
}

/// Startup-fatal failures of the frame renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("graphics device error: {0}")]
    Device(#[from] DeviceError),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
