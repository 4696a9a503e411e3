/// Orbit placement and model-matrix composition
use nalgebra::Point3;

use crate::matrix::Mat4;

/// A horizontal circle around the world Y axis at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub radius: f32,
    pub height: f32,
}

impl Orbit {
    pub fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }

    /// Point on the orbit at `angle` radians: `(r cos a, h, r sin a)`.
    pub fn position(&self, angle: f32) -> Point3<f32> {
        Point3::new(
            self.radius * angle.cos(),
            self.height,
            self.radius * angle.sin(),
        )
    }
}

/// Model matrix builders used by the frame renderer
pub struct Transform;

impl Transform {
    /// Place an object at `position` scaled uniformly about its own center.
    ///
    /// Translation is the outer transform (`T x S`) so the scale never
    /// shrinks the orbit radius.
    pub fn placed_scaled(position: &Point3<f32>, factor: f32) -> Mat4 {
        let mut model = Mat4::translation(position.x, position.y, position.z);
        model = model * Mat4::uniform_scale(factor);
        model
    }

    pub fn offset_x(offset: f32) -> Mat4 {
        Mat4::translation(offset, 0.0, 0.0)
    }

    /// Combined clip-space transform, `projection x view x model`.
    pub fn mvp_matrix(model: &Mat4, view: &Mat4, projection: &Mat4) -> Mat4 {
        *projection * *view * *model
    }
}
