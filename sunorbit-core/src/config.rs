/// Scene tunables, loadable from TOML.
///
/// Every field has a default, so a config file only needs the values it
/// overrides:
///
/// ```toml
/// camera_orbit_radius = 8.0
/// light_step = 0.01
/// cube_offsets = [-2.2, 0.0, 2.2]
/// ```

use std::f32::consts::FRAC_PI_4;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sphere::SphereParams;
use crate::transform::Orbit;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera_orbit_radius: f32,
    pub camera_height: f32,
    /// Angle added or removed per orbit-left/orbit-right event.
    pub orbit_step: f32,

    pub light_orbit_radius: f32,
    pub light_height: f32,
    /// Angle the light advances every frame.
    pub light_step: f32,
    pub light_color: [f32; 3],
    pub ambient: f32,

    /// The sun sphere sits slightly below the light it represents.
    pub sun_height: f32,
    pub sun_scale: f32,
    pub sun_fallback_color: [f32; 3],

    pub cube_offsets: Vec<f32>,
    pub base_color: [f32; 3],
    pub alternate_color: [f32; 3],

    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],

    pub sphere_radius: f32,
    pub sphere_longitude_segments: u32,
    pub sphere_latitude_segments: u32,

    /// Reduce orbit angles modulo 2pi after every update.
    pub wrap_angles: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_orbit_radius: 6.0,
            camera_height: 2.0,
            orbit_step: 0.1,
            light_orbit_radius: 4.0,
            light_height: 2.0,
            light_step: 0.005,
            light_color: [1.0, 1.0, 0.0],
            ambient: 0.2,
            sun_height: 1.8,
            sun_scale: 0.5,
            sun_fallback_color: [1.0, 0.8, 0.2],
            cube_offsets: vec![-1.1, 0.0, 1.1],
            base_color: [1.0, 1.0, 1.0],
            alternate_color: [1.0, 0.0, 1.0],
            fov: FRAC_PI_4,
            near: 0.1,
            far: 100.0,
            clear_color: [0.1, 0.1, 0.15, 1.0],
            sphere_radius: 0.5,
            sphere_longitude_segments: 36,
            sphere_latitude_segments: 18,
            wrap_angles: false,
        }
    }
}

impl SceneConfig {
    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.near > 0.0 && self.far > self.near) {
            return invalid(format!("expected 0 < near < far, got near={} far={}", self.near, self.far));
        }
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return invalid(format!("fov must lie in (0, pi), got {}", self.fov));
        }
        if self.camera_orbit_radius <= 0.0 && self.camera_height == 0.0 {
            return invalid("camera would sit on the look-at target".to_string());
        }
        if !(self.sun_scale > 0.0) {
            return invalid(format!("sun_scale must be positive, got {}", self.sun_scale));
        }
        if self.cube_offsets.is_empty() {
            return invalid("cube_offsets must name at least one cube".to_string());
        }
        Ok(())
    }

    pub fn camera_orbit(&self) -> Orbit {
        Orbit::new(self.camera_orbit_radius, self.camera_height)
    }

    pub fn light_orbit(&self) -> Orbit {
        Orbit::new(self.light_orbit_radius, self.light_height)
    }

    pub fn sphere_params(&self) -> SphereParams {
        SphereParams {
            radius: self.sphere_radius,
            longitude_segments: self.sphere_longitude_segments,
            latitude_segments: self.sphere_latitude_segments,
        }
    }
}
