/// Clip-space to viewport mapping for software rasterizers
use nalgebra::Point3;

/// Clip-space `w` below which a vertex counts as behind the eye.
pub const MIN_CLIP_W: f32 = 1e-5;

/// A vertex after the perspective divide, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// NDC depth in `[-1, 1]` for points between the clip planes.
    pub depth: f32,
    /// Clip-space `w`, kept for perspective-correct interpolation.
    pub w: f32,
}

/// Pixel rectangle the NDC square maps onto, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Divide by `w` and map to pixels. Points at or behind the eye have no
    /// screen position.
    pub fn project(&self, clip: [f32; 4]) -> Option<ScreenPoint> {
        let [x, y, z, w] = clip;
        if !(w > MIN_CLIP_W) {
            return None;
        }

        let ndc = Point3::new(x / w, y / w, z / w);
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: ndc.z,
            w,
        })
    }
}
