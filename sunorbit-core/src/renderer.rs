/// Per-frame transform derivation and draw submission.
///
/// Each frame clears the target, writes the shared uniforms once, draws the
/// cube row in lit-surface mode and then the sun sphere in emitter mode. All
/// draws go through the single scene program.

use nalgebra::{Point3, Vector3};

use crate::config::SceneConfig;
use crate::device::{BufferHandle, GraphicsDevice, PrimitiveKind, ProgramHandle, TextureHandle, UniformValue};
use crate::error::{MatrixError, RenderError};
use crate::geometry::Mesh;
use crate::matrix::Mat4;
use crate::projection::Viewport;
use crate::scene::{SceneEvent, SceneState};
use crate::shader::{uniforms, SCENE_PROGRAM};
use crate::shading::ShadingMode;
use crate::sphere::generate_sphere;
use crate::texture::TextureImage;
use crate::transform::Transform;

/// Every transform one frame needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransforms {
    pub camera_position: Point3<f32>,
    pub light_position: Point3<f32>,
    pub view: Mat4,
    pub projection: Mat4,
    pub cube_models: Vec<Mat4>,
    pub sun_model: Mat4,
}

impl FrameTransforms {
    pub fn compute(config: &SceneConfig, scene: &SceneState, aspect: f32) -> Result<Self, MatrixError> {
        let projection = Mat4::perspective(config.fov, aspect, config.near, config.far)?;
        Ok(Self::with_projection(config, scene, projection))
    }

    fn with_projection(config: &SceneConfig, scene: &SceneState, projection: Mat4) -> Self {
        let camera_position = scene.camera_position();
        let light_position = scene.light_position();
        let view = Mat4::look_at(&camera_position, &Point3::origin(), &Vector3::y());

        let sun_position = Point3::new(light_position.x, config.sun_height, light_position.z);

        Self {
            camera_position,
            light_position,
            view,
            projection,
            cube_models: config.cube_offsets.iter().map(|&x| Transform::offset_x(x)).collect(),
            sun_model: Transform::placed_scaled(&sun_position, config.sun_scale),
        }
    }
}

/// An uploaded mesh and how many vertices to draw from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrawBuffer {
    handle: BufferHandle,
    vertex_count: usize,
}

/// Owns the device and every resource created on it.
///
/// Resources are released on drop, including when construction fails
/// part-way through.
pub struct FrameRenderer<D: GraphicsDevice> {
    device: D,
    config: SceneConfig,
    program: Option<ProgramHandle>,
    cube: Option<DrawBuffer>,
    sphere: Option<DrawBuffer>,
    sun_texture: Option<TextureHandle>,
    last_view: Mat4,
    last_projection: Mat4,
    warned_missing_sphere: bool,
}

impl<D: GraphicsDevice> FrameRenderer<D> {
    /// Compile the program and upload the scene resources.
    ///
    /// A program that fails to compile, or sphere parameters that cannot be
    /// tessellated, are fatal. A missing or rejected texture only switches
    /// the sun to flat shading; a rejected mesh upload skips that mesh.
    pub fn new(device: D, config: SceneConfig, sun_image: Option<&TextureImage>) -> Result<Self, RenderError> {
        config.validate()?;
        let last_projection = Mat4::perspective(config.fov, 1.0, config.near, config.far)?;

        let mut renderer = Self {
            device,
            config,
            program: None,
            cube: None,
            sphere: None,
            sun_texture: None,
            last_view: Mat4::IDENTITY,
            last_projection,
            warned_missing_sphere: false,
        };

        renderer.program = Some(renderer.device.compile_program(&SCENE_PROGRAM)?);
        log::info!("Scene program compiled");

        renderer.cube = renderer.upload("cube", &Mesh::cube());
        let sphere = generate_sphere(&renderer.config.sphere_params())?;
        renderer.sphere = renderer.upload("sphere", &sphere);

        renderer.sun_texture = match sun_image {
            Some(image) => match renderer.device.upload_texture(image) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::warn!("Sun texture upload failed, using flat shading: {}", e);
                    None
                }
            },
            None => {
                log::warn!("No sun texture available, using flat shading");
                None
            }
        };

        Ok(renderer)
    }

    fn upload(&mut self, label: &str, mesh: &Mesh) -> Option<DrawBuffer> {
        if mesh.is_empty() {
            log::warn!("{} mesh is empty, it will not be drawn", label);
            return None;
        }
        match self.device.upload_vertex_buffer(mesh) {
            Ok(handle) => {
                log::debug!("Uploaded {} mesh: {} vertices", label, mesh.vertex_count());
                Some(DrawBuffer {
                    handle,
                    vertex_count: mesh.vertex_count(),
                })
            }
            Err(e) => {
                log::warn!("{} mesh upload failed, it will not be drawn: {}", label, e);
                None
            }
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn has_sun_texture(&self) -> bool {
        self.sun_texture.is_some()
    }

    /// Derive this frame's transforms, re-using the last valid view or
    /// projection when the current one would be degenerate.
    pub fn frame_transforms(&mut self, scene: &SceneState) -> FrameTransforms {
        let (width, height) = self.device.viewport();
        let aspect = Viewport::new(width, height).aspect();

        let projection = match Mat4::perspective(self.config.fov, aspect, self.config.near, self.config.far) {
            Ok(projection) => {
                self.last_projection = projection;
                projection
            }
            Err(e) => {
                log::debug!("Keeping previous projection for {}x{} viewport: {}", width, height, e);
                self.last_projection
            }
        };

        let mut transforms = FrameTransforms::with_projection(&self.config, scene, projection);
        if transforms.view.is_finite() {
            self.last_view = transforms.view;
        } else {
            log::warn!(
                "Degenerate view from camera at {:?}, keeping previous view",
                transforms.camera_position
            );
            transforms.view = self.last_view;
        }
        transforms
    }

    /// Submit one frame. Reads `scene` only.
    pub fn render_frame(&mut self, scene: &SceneState) {
        let transforms = self.frame_transforms(scene);
        let config = &self.config;
        let device = &mut self.device;

        device.clear(config.clear_color);
        let Some(program) = self.program else {
            return;
        };
        device.use_program(program);

        device.set_uniform(uniforms::VIEW_MATRIX, transforms.view.into());
        device.set_uniform(uniforms::PROJECTION_MATRIX, transforms.projection.into());
        device.set_uniform(uniforms::LIGHT_POSITION, transforms.light_position.coords.into());
        device.set_uniform(uniforms::LIGHT_COLOR, UniformValue::vec3(config.light_color));
        device.set_uniform(uniforms::LIGHT_ENABLED, scene.light_enabled().into());
        device.set_uniform(uniforms::USE_ALTERNATE_MATERIAL, scene.use_alternate_material().into());
        device.set_uniform(uniforms::BASE_COLOR, UniformValue::vec3(config.base_color));
        device.set_uniform(uniforms::ALTERNATE_COLOR, UniformValue::vec3(config.alternate_color));
        device.set_uniform(uniforms::AMBIENT, config.ambient.into());
        device.set_uniform(uniforms::SUN_FALLBACK_COLOR, UniformValue::vec3(config.sun_fallback_color));
        device.set_uniform(uniforms::HAS_SUN_TEXTURE, self.sun_texture.is_some().into());
        device.set_uniform(uniforms::SUN_TEXTURE, UniformValue::Int(0));

        if let Some(cube) = self.cube {
            device.bind_texture(None);
            device.set_uniform(uniforms::RENDER_MODE, ShadingMode::LitSurface.as_uniform().into());
            for model in &transforms.cube_models {
                device.set_uniform(uniforms::MODEL_MATRIX, (*model).into());
                device.draw(cube.handle, cube.vertex_count, PrimitiveKind::Triangles);
            }
        }

        match self.sphere {
            Some(sphere) => {
                device.bind_texture(self.sun_texture);
                device.set_uniform(uniforms::RENDER_MODE, ShadingMode::Emitter.as_uniform().into());
                device.set_uniform(uniforms::MODEL_MATRIX, transforms.sun_model.into());
                device.draw(sphere.handle, sphere.vertex_count, PrimitiveKind::Triangles);
            }
            None if !self.warned_missing_sphere => {
                log::warn!("Sun sphere has no vertex buffer, skipping its draw");
                self.warned_missing_sphere = true;
            }
            None => {}
        }

        log::trace!(
            "Frame: camera {:?}, light {:?}",
            transforms.camera_position,
            transforms.light_position
        );
    }
}

impl<D: GraphicsDevice> Drop for FrameRenderer<D> {
    fn drop(&mut self) {
        if let Some(texture) = self.sun_texture.take() {
            self.device.release_texture(texture);
        }
        for buffer in [self.sphere.take(), self.cube.take()].into_iter().flatten() {
            self.device.release_buffer(buffer.handle);
        }
        if let Some(program) = self.program.take() {
            self.device.release_program(program);
        }
        log::debug!("Released scene resources");
    }
}

/// Drives the scene: applies input events, advances the light, renders.
pub struct FrameLoop<D: GraphicsDevice> {
    scene: SceneState,
    renderer: FrameRenderer<D>,
    frames: u64,
}

impl<D: GraphicsDevice> FrameLoop<D> {
    pub fn new(renderer: FrameRenderer<D>) -> Self {
        let scene = SceneState::new(renderer.config());
        Self {
            scene,
            renderer,
            frames: 0,
        }
    }

    pub fn handle_event(&mut self, event: SceneEvent) {
        self.scene.apply(event);
    }

    /// Advance the light one step, then draw the frame.
    pub fn step(&mut self) {
        self.scene.advance_frame();
        self.renderer.render_frame(&self.scene);
        self.frames += 1;
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn renderer(&self) -> &FrameRenderer<D> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut FrameRenderer<D> {
        &mut self.renderer
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeviceError, GeometryError, ShaderError};
    use crate::shader::{link, ShaderSource};
    use crate::shading::{shade, Fragment, ShadingUniforms};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Compile,
        UploadBuffer(usize),
        UploadTexture,
        Clear,
        UseProgram,
        BindTexture(Option<TextureHandle>),
        SetUniform(String, UniformValue),
        Draw(BufferHandle, usize),
        ReleaseProgram(ProgramHandle),
        ReleaseBuffer(BufferHandle),
        ReleaseTexture(TextureHandle),
    }

    /// Records every device call into a log shared with the test.
    struct RecordingDevice {
        calls: Rc<RefCell<Vec<Call>>>,
        viewport: (u32, u32),
        next_id: u32,
        fail_compile: bool,
        fail_texture: bool,
        /// Reject vertex buffers with exactly this many vertices.
        fail_buffer_vertices: Option<usize>,
    }

    impl RecordingDevice {
        fn new() -> (Self, Rc<RefCell<Vec<Call>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let device = Self {
                calls: Rc::clone(&calls),
                viewport: (800, 600),
                next_id: 1,
                fail_compile: false,
                fail_texture: false,
                fail_buffer_vertices: None,
            };
            (device, calls)
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn mint(&mut self) -> u32 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl GraphicsDevice for RecordingDevice {
        fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<ProgramHandle, DeviceError> {
            self.record(Call::Compile);
            if self.fail_compile {
                return Err(ShaderError::MissingVersion { stage: "vertex" }.into());
            }
            link(source)?;
            Ok(ProgramHandle(self.mint()))
        }

        fn upload_vertex_buffer(&mut self, mesh: &Mesh) -> Result<BufferHandle, DeviceError> {
            self.record(Call::UploadBuffer(mesh.vertex_count()));
            if self.fail_buffer_vertices == Some(mesh.vertex_count()) {
                return Err(DeviceError::Backend("out of buffer memory".into()));
            }
            Ok(BufferHandle(self.mint()))
        }

        fn upload_texture(&mut self, _image: &TextureImage) -> Result<TextureHandle, DeviceError> {
            self.record(Call::UploadTexture);
            if self.fail_texture {
                return Err(DeviceError::Texture("out of texture memory".into()));
            }
            Ok(TextureHandle(self.mint()))
        }

        fn viewport(&self) -> (u32, u32) {
            self.viewport
        }

        fn clear(&mut self, _color: [f32; 4]) {
            self.record(Call::Clear);
        }

        fn use_program(&mut self, _program: ProgramHandle) {
            self.record(Call::UseProgram);
        }

        fn bind_texture(&mut self, texture: Option<TextureHandle>) {
            self.record(Call::BindTexture(texture));
        }

        fn set_uniform(&mut self, name: &str, value: UniformValue) {
            self.record(Call::SetUniform(name.to_string(), value));
        }

        fn draw(&mut self, buffer: BufferHandle, vertex_count: usize, _primitive: PrimitiveKind) {
            self.record(Call::Draw(buffer, vertex_count));
        }

        fn release_program(&mut self, program: ProgramHandle) {
            self.record(Call::ReleaseProgram(program));
        }

        fn release_buffer(&mut self, buffer: BufferHandle) {
            self.record(Call::ReleaseBuffer(buffer));
        }

        fn release_texture(&mut self, texture: TextureHandle) {
            self.record(Call::ReleaseTexture(texture));
        }
    }

    /// Uniform state in effect at each draw, in submission order.
    fn draws(calls: &[Call]) -> Vec<(usize, HashMap<String, UniformValue>)> {
        let mut state = HashMap::new();
        let mut out = Vec::new();
        for call in calls {
            match call {
                Call::SetUniform(name, value) => {
                    state.insert(name.clone(), *value);
                }
                Call::Draw(_, count) => out.push((*count, state.clone())),
                _ => {}
            }
        }
        out
    }

    fn mat(state: &HashMap<String, UniformValue>, name: &str) -> Mat4 {
        match state.get(name) {
            Some(UniformValue::Mat4(m)) => *m,
            other => panic!("{} is not a matrix: {:?}", name, other),
        }
    }

    fn sun() -> TextureImage {
        TextureImage::solid(4, 4, [255, 200, 0, 255]).unwrap()
    }

    fn sphere_vertices(config: &SceneConfig) -> usize {
        config.sphere_params().triangle_count() * 3
    }

    #[test]
    fn test_startup_uploads_resources() {
        let (device, calls) = RecordingDevice::new();
        let config = SceneConfig::default();
        let expected_sphere = sphere_vertices(&config);
        let renderer = FrameRenderer::new(device, config, Some(&sun())).unwrap();
        assert!(renderer.has_sun_texture());

        let calls = calls.borrow();
        assert_eq!(
            &calls[..4],
            &[
                Call::Compile,
                Call::UploadBuffer(36),
                Call::UploadBuffer(expected_sphere),
                Call::UploadTexture
            ]
        );
        assert_eq!(expected_sphere, 3 * 2 * 36 * 17);
    }

    #[test]
    fn test_draw_order_and_modes() {
        let (device, calls) = RecordingDevice::new();
        let config = SceneConfig::default();
        let sphere_count = sphere_vertices(&config);
        let mut renderer = FrameRenderer::new(device, config, Some(&sun())).unwrap();
        calls.borrow_mut().clear();

        renderer.render_frame(&SceneState::default());
        let calls = calls.borrow();
        assert_eq!(calls[0], Call::Clear);
        assert_eq!(calls[1], Call::UseProgram);

        let draws = draws(&calls);
        assert_eq!(draws.len(), 4);
        for (i, (count, state)) in draws.iter().enumerate().take(3) {
            assert_eq!(*count, 36);
            assert_eq!(state[uniforms::RENDER_MODE], UniformValue::Int(0));
            let model = mat(state, uniforms::MODEL_MATRIX);
            assert_eq!(model, Mat4::translation([-1.1, 0.0, 1.1][i], 0.0, 0.0));
        }
        let (count, state) = &draws[3];
        assert_eq!(*count, sphere_count);
        assert_eq!(state[uniforms::RENDER_MODE], UniformValue::Int(1));
        assert_eq!(state[uniforms::HAS_SUN_TEXTURE], UniformValue::Bool(true));
    }

    #[test]
    fn test_sun_model_is_translate_times_scale() {
        let (device, calls) = RecordingDevice::new();
        let config = SceneConfig {
            light_step: 0.7,
            ..SceneConfig::default()
        };
        let mut scene = SceneState::new(&config);
        scene.advance_frame();
        let mut renderer = FrameRenderer::new(device, config, None).unwrap();
        renderer.render_frame(&scene);

        let draws = draws(&calls.borrow());
        let sun = mat(&draws[3].1, uniforms::MODEL_MATRIX);
        let center = sun.transform_point(&Point3::origin());
        assert_relative_eq!(center[0], 4.0 * 0.7f32.cos(), epsilon = 1e-5);
        assert_relative_eq!(center[1], 1.8, epsilon = 1e-6);
        assert_relative_eq!(center[2], 4.0 * 0.7f32.sin(), epsilon = 1e-5);
        assert_eq!(sun.get(0, 0), 0.5);

        match draws[3].1[uniforms::LIGHT_POSITION] {
            UniformValue::Vec3(v) => assert_relative_eq!(v.y, 2.0),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_orbit_right_then_frame() {
        let (device, calls) = RecordingDevice::new();
        let renderer = FrameRenderer::new(device, SceneConfig::default(), Some(&sun())).unwrap();
        let mut frame_loop = FrameLoop::new(renderer);

        frame_loop.handle_event(SceneEvent::OrbitRight);
        frame_loop.step();

        let camera = frame_loop.scene().camera_position();
        assert_relative_eq!(camera.x, 6.0 * 0.1f32.cos(), epsilon = 1e-6);
        assert_relative_eq!(frame_loop.scene().light_orbit_angle(), 0.005);
        assert_eq!(frame_loop.frame_count(), 1);

        let draws = draws(&calls.borrow());
        let view = mat(&draws[0].1, uniforms::VIEW_MATRIX);
        assert_eq!(view, Mat4::look_at(&camera, &Point3::origin(), &Vector3::y()));
        let eye = view.transform_point(&camera);
        assert_abs_diff_eq!(eye[2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_alternate_material_reaches_shading() {
        let (device, calls) = RecordingDevice::new();
        let renderer = FrameRenderer::new(device, SceneConfig::default(), None).unwrap();
        let mut frame_loop = FrameLoop::new(renderer);
        frame_loop.handle_event(SceneEvent::ToggleMaterial);
        frame_loop.handle_event(SceneEvent::ToggleLight);
        frame_loop.step();

        let draws = draws(&calls.borrow());
        let (_, cube_uniforms) = &draws[1];
        assert_eq!(cube_uniforms[uniforms::USE_ALTERNATE_MATERIAL], UniformValue::Bool(true));
        assert_eq!(cube_uniforms[uniforms::LIGHT_ENABLED], UniformValue::Bool(false));

        let mut block = ShadingUniforms::default();
        for (name, value) in cube_uniforms {
            assert!(block.apply(name, value), "undeclared uniform {}", name);
        }
        let frag = Fragment {
            world_position: Point3::new(0.0, 0.5, 0.0),
            world_normal: Vector3::y(),
            uv: [0.0, 0.0],
        };
        let color = shade(&block, &frag, None);
        assert_abs_diff_eq!(color[0], 0.2, epsilon = 1e-6);
        assert_eq!(color[1], 0.0);
        assert_abs_diff_eq!(color[2], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_texture_failure_degrades_to_flat_sun() {
        let (mut device, calls) = RecordingDevice::new();
        device.fail_texture = true;
        let mut renderer = FrameRenderer::new(device, SceneConfig::default(), Some(&sun())).unwrap();
        assert!(!renderer.has_sun_texture());

        renderer.render_frame(&SceneState::default());
        renderer.render_frame(&SceneState::default());

        let calls = calls.borrow();
        let draws = draws(&calls);
        assert_eq!(draws.len(), 8);
        assert_eq!(draws[3].1[uniforms::HAS_SUN_TEXTURE], UniformValue::Bool(false));
        assert!(calls.iter().all(|c| !matches!(c, Call::BindTexture(Some(_)))));
    }

    #[test]
    fn test_sphere_upload_failure_skips_sun_draw() {
        let config = SceneConfig::default();
        let sphere_count = sphere_vertices(&config);
        let (mut device, calls) = RecordingDevice::new();
        device.fail_buffer_vertices = Some(sphere_count);

        let mut renderer = FrameRenderer::new(device, config, Some(&sun())).unwrap();
        assert!(renderer.has_sun_texture());
        assert!(!renderer.warned_missing_sphere);

        renderer.render_frame(&SceneState::default());
        assert!(renderer.warned_missing_sphere);
        renderer.render_frame(&SceneState::default());
        assert!(renderer.warned_missing_sphere);

        let recorded = draws(&calls.borrow());
        assert_eq!(recorded.len(), 6);
        assert!(recorded.iter().all(|(count, _)| *count == 36));

        drop(renderer);
        let calls = calls.borrow();
        let count = |pred: fn(&Call) -> bool| calls.iter().filter(|c| pred(c)).count();
        assert_eq!(count(|c| matches!(c, Call::ReleaseBuffer(_))), 1);
        assert_eq!(count(|c| matches!(c, Call::ReleaseTexture(_))), 1);
        assert_eq!(count(|c| matches!(c, Call::ReleaseProgram(_))), 1);
    }

    #[test]
    fn test_compile_failure_is_fatal() {
        let (mut device, calls) = RecordingDevice::new();
        device.fail_compile = true;
        let result = FrameRenderer::new(device, SceneConfig::default(), None);
        assert!(matches!(result, Err(RenderError::Device(DeviceError::Compile(_)))));
        assert_eq!(*calls.borrow(), vec![Call::Compile]);
    }

    #[test]
    fn test_failed_startup_releases_created_resources() {
        let (device, calls) = RecordingDevice::new();
        let config = SceneConfig {
            sphere_longitude_segments: 2,
            ..SceneConfig::default()
        };
        let result = FrameRenderer::new(device, config, Some(&sun()));
        assert!(matches!(
            result,
            Err(RenderError::Geometry(GeometryError::InvalidSphere { .. }))
        ));

        let calls = calls.borrow();
        let released: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::ReleaseBuffer(_) | Call::ReleaseProgram(_)))
            .collect();
        assert_eq!(released.len(), 2);
        assert!(calls.iter().all(|c| *c != Call::UploadTexture));
    }

    #[test]
    fn test_drop_releases_everything() {
        let (device, calls) = RecordingDevice::new();
        let renderer = FrameRenderer::new(device, SceneConfig::default(), Some(&sun())).unwrap();
        drop(renderer);

        let calls = calls.borrow();
        let tail: Vec<&Call> = calls.iter().rev().take(4).collect();
        assert!(matches!(tail[0], Call::ReleaseProgram(_)));
        assert!(matches!(tail[3], Call::ReleaseTexture(_)));
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::ReleaseBuffer(_))).count(),
            2
        );
    }

    #[test]
    fn test_zero_viewport_keeps_last_projection() {
        let (device, calls) = RecordingDevice::new();
        let mut renderer = FrameRenderer::new(device, SceneConfig::default(), None).unwrap();
        renderer.render_frame(&SceneState::default());
        renderer.device_mut().viewport = (800, 0);
        renderer.render_frame(&SceneState::default());

        let draws = draws(&calls.borrow());
        let before = mat(&draws[0].1, uniforms::PROJECTION_MATRIX);
        let after = mat(&draws[4].1, uniforms::PROJECTION_MATRIX);
        assert_eq!(before, after);
        assert!(after.is_finite());
    }

    #[test]
    fn test_degenerate_view_never_leaks_nan() {
        let (device, calls) = RecordingDevice::new();
        // Camera straight above the origin with a +Y up vector.
        let config = SceneConfig {
            camera_orbit_radius: 0.0,
            ..SceneConfig::default()
        };
        let mut renderer = FrameRenderer::new(device, config, None).unwrap();
        let scene = SceneState::new(renderer.config());
        renderer.render_frame(&scene);
        renderer.render_frame(&scene);

        for (_, state) in draws(&calls.borrow()) {
            for value in state.values() {
                if let UniformValue::Mat4(m) = value {
                    assert!(m.is_finite());
                }
            }
        }
    }

    #[test]
    fn test_frame_transforms_are_pure() {
        let config = SceneConfig::default();
        let scene = SceneState::default();
        let a = FrameTransforms::compute(&config, &scene, 4.0 / 3.0).unwrap();
        let b = FrameTransforms::compute(&config, &scene, 4.0 / 3.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cube_models.len(), 3);
        assert_eq!(a.camera_position, Point3::new(6.0, 2.0, 0.0));
        assert!(FrameTransforms::compute(&config, &scene, 0.0).is_err());
    }
}
