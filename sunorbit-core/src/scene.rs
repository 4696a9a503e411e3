/// Mutable simulation state and the discrete events that drive it.
use std::f32::consts::TAU;

use nalgebra::Point3;

use crate::config::SceneConfig;
use crate::transform::Orbit;

/// Already-decoded input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEvent {
    OrbitLeft,
    OrbitRight,
    ToggleLight,
    ToggleMaterial,
}

/// Camera and light parameters for one frame.
///
/// Angles accumulate without bound unless `wrap_angles` is set; they only
/// feed `sin`/`cos`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    camera_orbit_angle: f32,
    light_orbit_angle: f32,
    light_enabled: bool,
    use_alternate_material: bool,
    camera_orbit: Orbit,
    light_orbit: Orbit,
    orbit_step: f32,
    light_step: f32,
    wrap_angles: bool,
}

impl SceneState {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            camera_orbit_angle: 0.0,
            light_orbit_angle: 0.0,
            light_enabled: true,
            use_alternate_material: false,
            camera_orbit: config.camera_orbit(),
            light_orbit: config.light_orbit(),
            orbit_step: config.orbit_step,
            light_step: config.light_step,
            wrap_angles: config.wrap_angles,
        }
    }

    pub fn apply(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::OrbitLeft => self.camera_orbit_angle -= self.orbit_step,
            SceneEvent::OrbitRight => self.camera_orbit_angle += self.orbit_step,
            SceneEvent::ToggleLight => self.light_enabled = !self.light_enabled,
            SceneEvent::ToggleMaterial => {
                self.use_alternate_material = !self.use_alternate_material
            }
        }
        if self.wrap_angles {
            self.camera_orbit_angle = self.camera_orbit_angle.rem_euclid(TAU);
        }
        log::trace!("Applied {:?}: {:?}", event, self);
    }

    /// Per-frame update: move the light one step along its orbit.
    pub fn advance_frame(&mut self) {
        self.light_orbit_angle += self.light_step;
        if self.wrap_angles {
            self.light_orbit_angle = self.light_orbit_angle.rem_euclid(TAU);
        }
    }

    pub fn camera_orbit_angle(&self) -> f32 {
        self.camera_orbit_angle
    }

    pub fn light_orbit_angle(&self) -> f32 {
        self.light_orbit_angle
    }

    pub fn light_enabled(&self) -> bool {
        self.light_enabled
    }

    pub fn use_alternate_material(&self) -> bool {
        self.use_alternate_material
    }

    /// The camera height is fixed by the orbit.
    pub fn camera_height(&self) -> f32 {
        self.camera_orbit.height
    }

    pub fn camera_position(&self) -> Point3<f32> {
        self.camera_orbit.position(self.camera_orbit_angle)
    }

    pub fn light_position(&self) -> Point3<f32> {
        self.light_orbit.position(self.light_orbit_angle)
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let state = SceneState::default();
        assert_eq!(state.camera_orbit_angle(), 0.0);
        assert_eq!(state.light_orbit_angle(), 0.0);
        assert!(state.light_enabled());
        assert!(!state.use_alternate_material());
        assert_eq!(state.camera_height(), 2.0);
    }

    #[test]
    fn test_orbit_right_moves_camera() {
        let config = SceneConfig::default();
        let mut state = SceneState::new(&config);
        state.apply(SceneEvent::OrbitRight);

        assert_relative_eq!(state.camera_orbit_angle(), 0.1);
        let p = state.camera_position();
        assert_relative_eq!(p.x, config.camera_orbit_radius * 0.1f32.cos(), epsilon = 1e-6);
        assert_relative_eq!(p.z, config.camera_orbit_radius * 0.1f32.sin(), epsilon = 1e-6);
        assert_eq!(p.y, config.camera_height);
    }

    #[test]
    fn test_orbit_left_and_right_cancel() {
        let mut state = SceneState::default();
        state.apply(SceneEvent::OrbitLeft);
        state.apply(SceneEvent::OrbitLeft);
        assert_relative_eq!(state.camera_orbit_angle(), -0.2);
        state.apply(SceneEvent::OrbitRight);
        state.apply(SceneEvent::OrbitRight);
        assert_relative_eq!(state.camera_orbit_angle(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_toggles_are_involutions() {
        let mut state = SceneState::default();
        let before = state.clone();
        state.apply(SceneEvent::ToggleLight);
        assert!(!state.light_enabled());
        state.apply(SceneEvent::ToggleLight);
        assert_eq!(state, before);

        state.apply(SceneEvent::ToggleMaterial);
        assert!(state.use_alternate_material());
        assert!(state.light_enabled());
    }

    #[test]
    fn test_light_advances_monotonically() {
        let mut state = SceneState::default();
        let mut last = state.light_orbit_angle();
        for _ in 0..100 {
            state.advance_frame();
            assert!(state.light_orbit_angle() > last);
            last = state.light_orbit_angle();
        }
        assert_relative_eq!(state.light_orbit_angle(), 0.5, epsilon = 1e-4);
        assert_eq!(state.light_position().y, 2.0);
    }

    #[test]
    fn test_wrapping_keeps_angles_in_range() {
        let config = SceneConfig {
            wrap_angles: true,
            ..SceneConfig::default()
        };
        let mut state = SceneState::new(&config);
        state.apply(SceneEvent::OrbitLeft);
        assert!(state.camera_orbit_angle() >= 0.0 && state.camera_orbit_angle() < TAU);
        assert_relative_eq!(state.camera_orbit_angle(), TAU - 0.1, epsilon = 1e-5);

        let config = SceneConfig {
            wrap_angles: true,
            light_step: 4.0,
            ..SceneConfig::default()
        };
        let mut state = SceneState::new(&config);
        state.advance_frame();
        state.advance_frame();
        assert!(state.light_orbit_angle() < TAU);
        assert_relative_eq!(state.light_orbit_angle(), 8.0 - TAU, epsilon = 1e-5);
    }
}
