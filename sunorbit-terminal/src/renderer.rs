/// Software graphics device that rasterizes into terminal cells
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::io::Write;
use sunorbit_core::geometry::{Vertex, VERTEX_STRIDE};
use sunorbit_core::projection::{ScreenPoint, Viewport};
use sunorbit_core::shader::{link, ShaderInterface, ShaderSource};
use sunorbit_core::shading::{shade, Fragment, ShadingUniforms, VertexOutput, VertexStage};
use sunorbit_core::{
    BufferHandle, DeviceError, GraphicsDevice, Mesh, PrimitiveKind, ProgramHandle, TextureHandle,
    TextureImage, UniformValue,
};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are about twice as tall as they are wide.
pub const CELL_ASPECT: u32 = 2;

/// A linked program and the uniform values last written to it.
struct Program {
    interface: ShaderInterface,
    uniforms: ShadingUniforms,
}

/// Color and depth planes, one entry per terminal cell.
pub struct Framebuffer {
    width: usize,
    height: usize,
    clear_color: [f32; 4],
    color_buffer: Vec<Option<[f32; 4]>>,
    depth_buffer: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            color_buffer: vec![None; size],
            depth_buffer: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.color_buffer.fill(None);
        self.depth_buffer.fill(f32::INFINITY);
    }

    /// Shaded color of a cell, or `None` if nothing was drawn there.
    pub fn cell(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        self.color_buffer[y * self.width + x]
    }

    pub fn covered_cells(&self) -> usize {
        self.color_buffer.iter().filter(|c| c.is_some()).count()
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.width as u32, self.height as u32)
    }

    /// Depth-tested write. Depth outside the clip range is discarded.
    fn write(&mut self, x: i32, y: i32, depth: f32, color: [f32; 4]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        if !(-1.0..=1.0).contains(&depth) {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.color_buffer[idx] = Some(color);
        }
    }

    fn rasterize_triangle<F>(&mut self, verts: [(ScreenPoint, Fragment); 3], mut fragment_shader: F)
    where
        F: FnMut(&Fragment) -> [f32; 4],
    {
        let [(v0, f0), (v1, f1), (v2, f2)] = verts;

        // Bounding box, clipped to screen bounds
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i32;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i32;
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p) else {
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let weights = perspective_weights([w0, w1, w2], [v0.w, v1.w, v2.w]);
                let frag = interpolate(&[f0, f1, f2], weights);
                let color = fragment_shader(&frag);
                self.write(x, y, depth, color);
            }
        }
    }

    /// Queue the frame as colored characters, starting at terminal row `top`.
    pub fn present<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, top.saturating_add(y as u16)))?;
            for x in 0..self.width {
                let (c, color) = match self.cell(x, y) {
                    Some(rgba) => (ramp_char(rgba), to_terminal_color(rgba)),
                    None => (' ', to_terminal_color(self.clear_color)),
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Covered cells never use the blank character, so dark surfaces stay visible.
fn ramp_char(rgba: [f32; 4]) -> char {
    let luminance = 0.2126 * rgba[0] + 0.7152 * rgba[1] + 0.0722 * rgba[2];
    let top = (LUMINOSITY_RAMP.len() - 1) as f32;
    let index = (luminance.clamp(0.0, 1.0) * top).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, LUMINOSITY_RAMP.len() - 1)]
}

fn to_terminal_color(rgba: [f32; 4]) -> Color {
    let [r, g, b, _] = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color::Rgb { r, g, b }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

/// Screen-space weights corrected for perspective using each vertex's clip `w`.
fn perspective_weights(screen: [f32; 3], w: [f32; 3]) -> [f32; 3] {
    let scaled = [screen[0] / w[0], screen[1] / w[1], screen[2] / w[2]];
    let sum: f32 = scaled.iter().sum();
    scaled.map(|s| s / sum)
}

fn interpolate(frags: &[Fragment; 3], weights: [f32; 3]) -> Fragment {
    let mut position = Vector3::<f32>::zeros();
    let mut normal = Vector3::<f32>::zeros();
    let mut uv = [0.0; 2];
    for (f, &k) in frags.iter().zip(weights.iter()) {
        position += f.world_position.coords * k;
        normal += f.world_normal * k;
        uv[0] += f.uv[0] * k;
        uv[1] += f.uv[1] * k;
    }
    Fragment {
        world_position: position.into(),
        world_normal: normal,
        uv,
    }
}

/// `GraphicsDevice` that runs the scene program on the CPU and prints the
/// result as colored characters.
pub struct AsciiDevice {
    target: Framebuffer,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, Vec<f32>>,
    textures: HashMap<TextureHandle, TextureImage>,
    next_handle: u32,
    active_program: Option<ProgramHandle>,
    bound_texture: Option<TextureHandle>,
}

impl AsciiDevice {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            target: Framebuffer::new(width, height),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            next_handle: 0,
            active_program: None,
            bound_texture: None,
        }
    }

    /// Reallocate the framebuffer for a new terminal size.
    pub fn resize(&mut self, width: usize, height: usize) {
        log::debug!("Resizing framebuffer to {}x{} cells", width, height);
        self.target = Framebuffer::new(width, height);
    }

    /// Framebuffer size in cells (columns, rows).
    pub fn viewport_cells(&self) -> (usize, usize) {
        (self.target.width, self.target.height)
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.target
    }

    /// Number of live programs, buffers and textures.
    pub fn live_resources(&self) -> usize {
        self.programs.len() + self.buffers.len() + self.textures.len()
    }

    fn mint(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl GraphicsDevice for AsciiDevice {
    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramHandle, DeviceError> {
        let interface = link(source)?;
        log::debug!(
            "Linked GLSL {} program with {} uniforms",
            interface.version,
            interface.uniforms.len()
        );
        let handle = ProgramHandle(self.mint());
        self.programs.insert(
            handle,
            Program {
                interface,
                uniforms: ShadingUniforms::default(),
            },
        );
        Ok(handle)
    }

    fn upload_vertex_buffer(&mut self, mesh: &Mesh) -> Result<BufferHandle, DeviceError> {
        if mesh.is_empty() {
            return Err(DeviceError::EmptyBuffer);
        }
        let handle = BufferHandle(self.mint());
        self.buffers.insert(handle, mesh.interleaved());
        Ok(handle)
    }

    fn upload_texture(&mut self, image: &TextureImage) -> Result<TextureHandle, DeviceError> {
        let handle = TextureHandle(self.mint());
        self.textures.insert(handle, image.clone());
        Ok(handle)
    }

    fn viewport(&self) -> (u32, u32) {
        (self.target.width as u32, self.target.height as u32 * CELL_ASPECT)
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.target.clear(color);
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if self.programs.contains_key(&program) {
            self.active_program = Some(program);
        } else {
            log::warn!("use_program: unknown program {:?}", program);
        }
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.bound_texture = texture;
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(program) = self.active_program.and_then(|h| self.programs.get_mut(&h)) else {
            log::warn!("set_uniform({}) with no program in use", name);
            return;
        };
        match program.interface.uniform(name) {
            Some(decl) if decl.ty.accepts(&value) => {
                program.uniforms.apply(name, &value);
            }
            Some(decl) => log::warn!("Uniform {} is {:?}, ignoring {:?}", name, decl.ty, value),
            None => log::trace!("Uniform {} is not active", name),
        }
    }

    fn draw(&mut self, buffer: BufferHandle, vertex_count: usize, primitive: PrimitiveKind) {
        let Some(program) = self.active_program.and_then(|h| self.programs.get(&h)) else {
            log::warn!("draw with no program in use");
            return;
        };
        let Some(data) = self.buffers.get(&buffer) else {
            log::warn!("draw: unknown buffer {:?}", buffer);
            return;
        };
        let texture = self.bound_texture.and_then(|h| self.textures.get(&h));
        let uniforms = &program.uniforms;
        let stage = VertexStage::new(uniforms);
        let viewport = self.target.viewport();

        let processed: Vec<Option<(ScreenPoint, Fragment)>> = data
            .chunks_exact(VERTEX_STRIDE)
            .take(vertex_count)
            .filter_map(|chunk| <&[f32; VERTEX_STRIDE]>::try_from(chunk).ok())
            .map(|attrs| {
                let VertexOutput { clip, varying } = stage.run(&Vertex::from_array(attrs));
                viewport.project(clip).map(|p| (p, varying))
            })
            .collect();

        let shader = |frag: &Fragment| shade(uniforms, frag, texture);
        match primitive {
            PrimitiveKind::Triangles => {
                for tri in processed.chunks_exact(3) {
                    // Triangles crossing the eye plane are dropped whole.
                    if let [Some(a), Some(b), Some(c)] = tri {
                        self.target.rasterize_triangle([*a, *b, *c], shader);
                    }
                }
            }
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if self.active_program == Some(program) {
            self.active_program = None;
        }
        self.programs.remove(&program);
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        self.textures.remove(&texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunorbit_core::{FrameRenderer, Mat4, SceneConfig, SceneState, SCENE_PROGRAM};

    fn device_with_program() -> (AsciiDevice, ProgramHandle) {
        let mut device = AsciiDevice::new(40, 20);
        let program = device.compile_program(&SCENE_PROGRAM).unwrap();
        device.use_program(program);
        (device, program)
    }

    #[test]
    fn test_barycentric_inside_and_degenerate() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_ramp_never_blank_for_covered_cells() {
        assert_eq!(ramp_char([0.0, 0.0, 0.0, 1.0]), '.');
        assert_eq!(ramp_char([1.0, 1.0, 1.0, 1.0]), '@');
    }

    #[test]
    fn test_viewport_compensates_cell_aspect() {
        let device = AsciiDevice::new(80, 24);
        assert_eq!(device.viewport(), (80, 48));
    }

    #[test]
    fn test_rejects_bad_program() {
        let mut device = AsciiDevice::new(10, 10);
        let source = ShaderSource {
            vertex: "void main() {}",
            fragment: "#version 330 core\nvoid main() {}",
        };
        assert!(matches!(device.compile_program(&source), Err(DeviceError::Compile(_))));
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_rejects_empty_buffer() {
        let mut device = AsciiDevice::new(10, 10);
        assert!(matches!(
            device.upload_vertex_buffer(&Mesh::new()),
            Err(DeviceError::EmptyBuffer)
        ));
    }

    #[test]
    fn test_mistyped_uniform_is_ignored() {
        let (mut device, program) = device_with_program();
        device.set_uniform("lightEnabled", UniformValue::Bool(true));
        device.set_uniform("lightEnabled", UniformValue::Float(0.0));
        device.set_uniform("notInTheProgram", UniformValue::Int(3));
        assert!(device.programs[&program].uniforms.light_enabled);
    }

    #[test]
    fn test_draw_covers_cells_with_emitter_color() {
        let (mut device, _) = device_with_program();
        let buffer = device.upload_vertex_buffer(&Mesh::cube()).unwrap();
        device.clear([0.0, 0.0, 0.0, 1.0]);
        // Identity view/projection: a cube scaled to the NDC box fills the screen.
        device.set_uniform("renderMode", UniformValue::Int(1));
        device.set_uniform("sunFallbackColor", UniformValue::vec3([1.0, 0.0, 0.0]));
        device.set_uniform("modelMatrix", UniformValue::Mat4(Mat4::uniform_scale(2.0)));
        device.draw(buffer, 36, PrimitiveKind::Triangles);

        let fb = device.framebuffer();
        assert_eq!(fb.covered_cells(), fb.width() * fb.height());
        assert_eq!(fb.cell(20, 10), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let (mut device, _) = device_with_program();
        let buffer = device.upload_vertex_buffer(&Mesh::cube()).unwrap();
        device.clear([0.0; 4]);
        device.set_uniform("renderMode", UniformValue::Int(1));

        device.set_uniform("sunFallbackColor", UniformValue::vec3([0.0, 1.0, 0.0]));
        device.set_uniform("modelMatrix", UniformValue::Mat4(Mat4::translation(0.0, 0.0, -0.4)));
        device.draw(buffer, 36, PrimitiveKind::Triangles);

        device.set_uniform("sunFallbackColor", UniformValue::vec3([0.0, 0.0, 1.0]));
        device.set_uniform("modelMatrix", UniformValue::Mat4(Mat4::translation(0.0, 0.0, 0.2)));
        device.draw(buffer, 36, PrimitiveKind::Triangles);

        // With an identity projection smaller z is nearer.
        assert_eq!(device.framebuffer().cell(20, 10), Some([0.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_textured_draw_samples_bound_texture() {
        let (mut device, _) = device_with_program();
        let buffer = device.upload_vertex_buffer(&Mesh::cube()).unwrap();
        let texture = device
            .upload_texture(&TextureImage::solid(2, 2, [0, 0, 255, 255]).unwrap())
            .unwrap();
        device.clear([0.0; 4]);
        device.bind_texture(Some(texture));
        device.set_uniform("renderMode", UniformValue::Int(1));
        device.set_uniform("hasSunTexture", UniformValue::Bool(true));
        device.draw(buffer, 36, PrimitiveKind::Triangles);
        assert_eq!(device.framebuffer().cell(20, 10), Some([0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_geometry_behind_eye_is_dropped() {
        let (mut device, _) = device_with_program();
        let buffer = device.upload_vertex_buffer(&Mesh::cube()).unwrap();
        device.clear([0.0; 4]);
        // w = -1 for every vertex
        let mut cells = *Mat4::IDENTITY.as_array();
        cells[15] = -1.0;
        let behind = Mat4::from_cols_array(cells);
        device.set_uniform("projectionMatrix", UniformValue::Mat4(behind));
        device.draw(buffer, 36, PrimitiveKind::Triangles);
        assert_eq!(device.framebuffer().covered_cells(), 0);
    }

    #[test]
    fn test_full_scene_renders_and_releases() {
        let device = AsciiDevice::new(80, 24);
        let sun = TextureImage::solid(4, 4, [255, 200, 0, 255]).unwrap();
        let mut renderer = FrameRenderer::new(device, SceneConfig::default(), Some(&sun)).unwrap();
        assert_eq!(renderer.device().live_resources(), 4);

        renderer.render_frame(&SceneState::default());
        let covered = renderer.device().framebuffer().covered_cells();
        assert!(covered > 0 && covered < 80 * 24);

        let mut out = Vec::new();
        renderer.device().framebuffer().present(&mut out, 1).unwrap();
        assert!(!out.is_empty());
    }
}
