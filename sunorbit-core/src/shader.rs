/// Compiled-in scene program and uniform interface reflection.
///
/// The scene uses a single program for every draw. `renderMode` switches the
/// fragment stage between diffuse-lit surfaces and the textured emitter, so
/// no program switch happens mid-frame. [`reflect`] pulls the `#version` and
/// `uniform` declarations out of GLSL source so devices can validate programs
/// and uniform writes.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map_res, opt},
    sequence::{preceded, tuple},
    IResult,
};

use crate::device::UniformValue;
use crate::error::ShaderError;

/// Uniform names shared by the renderer and the program source.
pub mod uniforms {
    pub const MODEL_MATRIX: &str = "modelMatrix";
    pub const VIEW_MATRIX: &str = "viewMatrix";
    pub const PROJECTION_MATRIX: &str = "projectionMatrix";
    pub const LIGHT_POSITION: &str = "lightPosition";
    pub const LIGHT_COLOR: &str = "lightColor";
    pub const LIGHT_ENABLED: &str = "lightEnabled";
    pub const USE_ALTERNATE_MATERIAL: &str = "useAlternateMaterial";
    pub const BASE_COLOR: &str = "baseColor";
    pub const ALTERNATE_COLOR: &str = "alternateColor";
    pub const AMBIENT: &str = "ambient";
    pub const RENDER_MODE: &str = "renderMode";
    pub const HAS_SUN_TEXTURE: &str = "hasSunTexture";
    pub const SUN_FALLBACK_COLOR: &str = "sunFallbackColor";
    pub const SUN_TEXTURE: &str = "sunTexture";
}

pub const SCENE_VERTEX_SHADER: &str = r#"
#version 330 core
layout (location = 0) in vec3 aPosition;
layout (location = 1) in vec3 aNormal;
layout (location = 2) in vec2 aTexCoord;

uniform mat4 modelMatrix;
uniform mat4 viewMatrix;
uniform mat4 projectionMatrix;

out vec3 worldPosition;
out vec3 worldNormal;
out vec2 texCoord;

void main() {
    worldPosition = vec3(modelMatrix * vec4(aPosition, 1.0));
    worldNormal = mat3(transpose(inverse(modelMatrix))) * aNormal;
    texCoord = aTexCoord;
    gl_Position = projectionMatrix * viewMatrix * vec4(worldPosition, 1.0);
}
"#;

pub const SCENE_FRAGMENT_SHADER: &str = r#"
#version 330 core
in vec3 worldPosition;
in vec3 worldNormal;
in vec2 texCoord;

out vec4 fragColor;

uniform vec3 lightPosition;
uniform vec3 lightColor;
uniform bool lightEnabled;
uniform bool useAlternateMaterial;
uniform vec3 baseColor;
uniform vec3 alternateColor;
uniform float ambient;
uniform int renderMode;        // 0 = lit surface, 1 = emitter
uniform bool hasSunTexture;
uniform vec3 sunFallbackColor;
uniform sampler2D sunTexture;

void main() {
    if (renderMode == 1) {
        fragColor = hasSunTexture
            ? texture(sunTexture, texCoord)
            : vec4(sunFallbackColor, 1.0);
        return;
    }

    vec3 surface = useAlternateMaterial ? alternateColor : baseColor;
    vec3 n = normalize(worldNormal);
    vec3 toLight = normalize(lightPosition - worldPosition);
    float diffuse = max(dot(n, toLight), 0.0);
    vec3 light = lightEnabled ? diffuse * lightColor : vec3(0.0);
    fragColor = vec4((light + ambient) * surface, 1.0);
}
"#;

/// Vertex and fragment stage source for one program.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

pub const SCENE_PROGRAM: ShaderSource<'static> = ShaderSource {
    vertex: SCENE_VERTEX_SHADER,
    fragment: SCENE_FRAGMENT_SHADER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl UniformType {
    fn parse(ty: &str) -> Option<Self> {
        Some(match ty {
            "float" => Self::Float,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat4" => Self::Mat4,
            "sampler2D" => Self::Sampler2D,
            _ => return None,
        })
    }

    /// Whether a value may be written to a uniform of this type.
    /// Samplers take the texture unit as an integer.
    pub fn accepts(self, value: &UniformValue) -> bool {
        matches!(
            (self, value),
            (Self::Float, UniformValue::Float(_))
                | (Self::Int, UniformValue::Int(_))
                | (Self::Bool, UniformValue::Bool(_))
                | (Self::Vec3, UniformValue::Vec3(_))
                | (Self::Mat4, UniformValue::Mat4(_))
                | (Self::Sampler2D, UniformValue::Int(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
}

/// Declarations found in one stage, or the union of both after linking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderInterface {
    pub version: u32,
    pub uniforms: Vec<UniformDecl>,
}

impl ShaderInterface {
    pub fn uniform(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    let (rest, head) = take_while1(|c: char| c.is_ascii_alphabetic() || c == '_')(input)?;
    let (rest, tail) = take_while(|c: char| c.is_ascii_alphanumeric() || c == '_')(rest)?;
    Ok((rest, &input[..head.len() + tail.len()]))
}

fn version_directive(input: &str) -> IResult<&str, u32> {
    let (input, version) = preceded(
        tuple((tag("#version"), multispace1)),
        map_res(digit1, str::parse::<u32>),
    )(input)?;
    let (input, _) = opt(preceded(multispace1, alt((tag("core"), tag("compatibility")))))(input)?;
    Ok((input, version))
}

/// `uniform <type> <name>;` with optional `highp`-style precision qualifier.
fn uniform_declaration(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tuple((tag("uniform"), multispace1))(input)?;
    let (input, _) = opt(tuple((alt((tag("highp"), tag("mediump"), tag("lowp"))), multispace1)))(input)?;
    let (input, ty) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = tuple((multispace0, char(';')))(input)?;
    Ok((input, (ty, name)))
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or("").trim()
}

/// Extract the version and uniform declarations of one shader stage.
pub fn reflect(source: &str, stage: &'static str) -> Result<ShaderInterface, ShaderError> {
    let mut version = None;
    let mut uniforms = Vec::new();

    for line in source.lines().map(strip_comment) {
        if line.starts_with("#version") {
            if let Ok((_, v)) = version_directive(line) {
                version = Some(v);
            }
        } else if line.starts_with("uniform ") {
            let (_, (ty, name)) = uniform_declaration(line).map_err(|_| ShaderError::MalformedUniform {
                stage,
                snippet: line.to_string(),
            })?;
            let ty = UniformType::parse(ty).ok_or_else(|| ShaderError::UnsupportedType {
                stage,
                ty: ty.to_string(),
                name: name.to_string(),
            })?;
            uniforms.push(UniformDecl {
                name: name.to_string(),
                ty,
            });
        }
    }

    let version = version.ok_or(ShaderError::MissingVersion { stage })?;
    Ok(ShaderInterface { version, uniforms })
}

/// Reflect both stages and merge their uniforms, as a link step would.
pub fn link(source: &ShaderSource<'_>) -> Result<ShaderInterface, ShaderError> {
    let vertex = reflect(source.vertex, "vertex")?;
    let fragment = reflect(source.fragment, "fragment")?;

    if vertex.version != fragment.version {
        return Err(ShaderError::VersionMismatch {
            vertex: vertex.version,
            fragment: fragment.version,
        });
    }

    let mut merged = vertex.clone();
    for decl in fragment.uniforms {
        match vertex.uniform(&decl.name) {
            Some(existing) if existing.ty != decl.ty => {
                return Err(ShaderError::LinkMismatch {
                    name: decl.name,
                    vertex: format!("{:?}", existing.ty),
                    fragment: format!("{:?}", decl.ty),
                });
            }
            Some(_) => {}
            None => merged.uniforms.push(decl),
        }
    }
    Ok(merged)
}
