/// CPU implementation of the scene program's vertex and fragment stages.
///
/// Software devices run these per vertex and per covered pixel; they follow
/// [`crate::shader::SCENE_PROGRAM`] line for line.

use nalgebra::{Point3, Vector3};

use crate::device::UniformValue;
use crate::geometry::Vertex;
use crate::matrix::Mat4;
use crate::shader::uniforms;
use crate::texture::TextureImage;
use crate::transform::Transform;

/// Fragment-stage branch selected by the `renderMode` uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    /// Diffuse-lit surface with ambient term.
    #[default]
    LitSurface,
    /// Light source: samples the sun texture directly, no lighting.
    Emitter,
}

impl ShadingMode {
    pub fn as_uniform(self) -> i32 {
        match self {
            Self::LitSurface => 0,
            Self::Emitter => 1,
        }
    }

    pub fn from_uniform(value: i32) -> Self {
        if value == 1 {
            Self::Emitter
        } else {
            Self::LitSurface
        }
    }
}

/// Typed view of the program's uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingUniforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub light_position: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub light_enabled: bool,
    pub use_alternate_material: bool,
    pub base_color: Vector3<f32>,
    pub alternate_color: Vector3<f32>,
    pub ambient: f32,
    pub mode: ShadingMode,
    pub has_texture: bool,
    pub sun_fallback_color: Vector3<f32>,
    pub texture_unit: i32,
}

impl Default for ShadingUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            light_position: Vector3::zeros(),
            light_color: Vector3::zeros(),
            light_enabled: false,
            use_alternate_material: false,
            base_color: Vector3::zeros(),
            alternate_color: Vector3::zeros(),
            ambient: 0.0,
            mode: ShadingMode::LitSurface,
            has_texture: false,
            sun_fallback_color: Vector3::zeros(),
            texture_unit: 0,
        }
    }
}

impl ShadingUniforms {
    /// Store a uniform write. Returns `false` for names or value types the
    /// program does not declare, leaving the block unchanged.
    pub fn apply(&mut self, name: &str, value: &UniformValue) -> bool {
        match (name, *value) {
            (uniforms::MODEL_MATRIX, UniformValue::Mat4(m)) => self.model = m,
            (uniforms::VIEW_MATRIX, UniformValue::Mat4(m)) => self.view = m,
            (uniforms::PROJECTION_MATRIX, UniformValue::Mat4(m)) => self.projection = m,
            (uniforms::LIGHT_POSITION, UniformValue::Vec3(v)) => self.light_position = v,
            (uniforms::LIGHT_COLOR, UniformValue::Vec3(v)) => self.light_color = v,
            (uniforms::LIGHT_ENABLED, UniformValue::Bool(b)) => self.light_enabled = b,
            (uniforms::USE_ALTERNATE_MATERIAL, UniformValue::Bool(b)) => self.use_alternate_material = b,
            (uniforms::BASE_COLOR, UniformValue::Vec3(v)) => self.base_color = v,
            (uniforms::ALTERNATE_COLOR, UniformValue::Vec3(v)) => self.alternate_color = v,
            (uniforms::AMBIENT, UniformValue::Float(f)) => self.ambient = f,
            (uniforms::RENDER_MODE, UniformValue::Int(i)) => self.mode = ShadingMode::from_uniform(i),
            (uniforms::HAS_SUN_TEXTURE, UniformValue::Bool(b)) => self.has_texture = b,
            (uniforms::SUN_FALLBACK_COLOR, UniformValue::Vec3(v)) => self.sun_fallback_color = v,
            (uniforms::SUN_TEXTURE, UniformValue::Int(i)) => self.texture_unit = i,
            _ => return false,
        }
        true
    }
}

/// Per-vertex outputs interpolated across a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub world_position: Point3<f32>,
    pub world_normal: Vector3<f32>,
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    /// Homogeneous clip-space position.
    pub clip: [f32; 4],
    pub varying: Fragment,
}

/// Vertex stage with the matrices of the current draw folded together.
pub struct VertexStage {
    model: Mat4,
    mvp: Mat4,
}

impl VertexStage {
    pub fn new(uniforms: &ShadingUniforms) -> Self {
        Self {
            model: uniforms.model,
            mvp: Transform::mvp_matrix(&uniforms.model, &uniforms.view, &uniforms.projection),
        }
    }

    pub fn run(&self, vertex: &Vertex) -> VertexOutput {
        let world = self.model.transform_point(&vertex.position);
        VertexOutput {
            clip: self.mvp.transform_point(&vertex.position),
            varying: Fragment {
                world_position: Point3::new(world[0], world[1], world[2]),
                world_normal: self.model.transform_normal(&vertex.normal),
                uv: vertex.uv,
            },
        }
    }
}

/// Fragment stage. Output channels are clamped to `[0, 1]` as a color
/// attachment would store them.
pub fn shade(u: &ShadingUniforms, frag: &Fragment, texture: Option<&TextureImage>) -> [f32; 4] {
    let color = match u.mode {
        ShadingMode::Emitter => match texture.filter(|_| u.has_texture) {
            Some(tex) => tex.sample(frag.uv[0], frag.uv[1]),
            None => {
                let c = u.sun_fallback_color;
                [c.x, c.y, c.z, 1.0]
            }
        },
        ShadingMode::LitSurface => {
            let surface = if u.use_alternate_material {
                u.alternate_color
            } else {
                u.base_color
            };
            let n = frag.world_normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
            let to_light = (u.light_position - frag.world_position.coords)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let diffuse = n.dot(&to_light).max(0.0);
            let light = if u.light_enabled {
                u.light_color * diffuse
            } else {
                Vector3::zeros()
            };
            let lit = (light.add_scalar(u.ambient)).component_mul(&surface);
            [lit.x, lit.y, lit.z, 1.0]
        }
    };
    color.map(|c| c.clamp(0.0, 1.0))
}
