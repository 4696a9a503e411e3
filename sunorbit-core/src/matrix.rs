/// Hand-rolled 4x4 column-major matrices for the scene transforms.
///
/// Cells are stored as `cells[row + col * 4]`, which is the layout graphics
/// APIs expect for `mat4` uniforms. Every constructor returns a new value, so
/// composing into one of the operands (`model = model * scale`) never reads a
/// half-written result.

use std::f32::consts::PI;
use std::ops::Mul;

use nalgebra::{Point3, Vector3};

use crate::error::MatrixError;

/// A 4x4 transform in column-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    cells: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cells: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_cols_array(cells: [f32; 16]) -> Self {
        Self { cells }
    }

    /// Raw cells in column-major order, ready for a uniform upload.
    pub fn as_array(&self) -> &[f32; 16] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cells[row + col * 4]
    }

    pub fn is_finite(&self) -> bool {
        self.cells.iter().all(|c| c.is_finite())
    }

    /// Identity with the translation column set to `(x, y, z)`.
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cells[12] = x;
        m.cells[13] = y;
        m.cells[14] = z;
        m
    }

    /// Identity with the diagonal replaced by `(x, y, z, 1)`.
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cells[0] = x;
        m.cells[5] = y;
        m.cells[10] = z;
        m
    }

    pub fn uniform_scale(factor: f32) -> Self {
        Self::scale(factor, factor, factor)
    }

    /// Right-handed perspective projection.
    ///
    /// View-space depths `-near..-far` land on clip-space `-1..1` after the
    /// homogeneous divide. The bottom row becomes `[0, 0, -1, 0]`.
    pub fn perspective(
        vertical_fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, MatrixError> {
        if !(vertical_fov.is_finite() && vertical_fov > 0.0 && vertical_fov < PI) {
            return Err(MatrixError::InvalidFieldOfView(vertical_fov));
        }
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(MatrixError::InvalidAspectRatio(aspect_ratio));
        }
        if !(near.is_finite() && far.is_finite() && near > 0.0 && far > near) {
            return Err(MatrixError::InvalidDepthRange { near, far });
        }

        let focal = 1.0 / (vertical_fov / 2.0).tan();
        let mut cells = [0.0; 16];
        cells[0] = focal / aspect_ratio;
        cells[5] = focal;
        cells[10] = (far + near) / (near - far);
        cells[11] = -1.0;
        cells[14] = (2.0 * far * near) / (near - far);
        Ok(Self { cells })
    }

    /// Right-handed view matrix looking from `eye` toward `target`.
    ///
    /// `eye` must differ from `target` and `up` must not be parallel to the
    /// viewing direction; either violation yields non-finite cells. The up
    /// vector is rebuilt from `right x forward`, so it need not be orthogonal.
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Self {
        debug_assert!(eye != target, "look_at: eye and target coincide");

        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(&forward);
        let eye = eye.coords;

        let mut m = Self::IDENTITY;
        m.cells[0] = right.x;
        m.cells[4] = right.y;
        m.cells[8] = right.z;
        m.cells[1] = true_up.x;
        m.cells[5] = true_up.y;
        m.cells[9] = true_up.z;
        m.cells[2] = -forward.x;
        m.cells[6] = -forward.y;
        m.cells[10] = -forward.z;
        m.cells[12] = -right.dot(&eye);
        m.cells[13] = -true_up.dot(&eye);
        m.cells[14] = forward.dot(&eye);
        m
    }

    /// `a x b`: applied to a column vector, `b` acts first.
    pub fn multiply(a: &Self, b: &Self) -> Self {
        let mut cells = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                cells[row + col * 4] = (0..4).map(|k| a.get(row, k) * b.get(k, col)).sum();
            }
        }
        Self { cells }
    }

    /// Multiply `(p, 1)` and return the homogeneous result.
    pub fn transform_point(&self, p: &Point3<f32>) -> [f32; 4] {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|col| self.get(row, col) * v[col]).sum();
        }
        out
    }

    /// Transform a surface normal by the inverse-transpose of the upper 3x3.
    ///
    /// Uses the cofactor matrix, which equals the inverse-transpose scaled by
    /// the determinant; the scale drops out in the final normalisation.
    pub fn transform_normal(&self, n: &Vector3<f32>) -> Vector3<f32> {
        let m = |r: usize, c: usize| self.get(r, c);
        let cof = |r: usize, c: usize| {
            let (r0, r1) = ((r + 1) % 3, (r + 2) % 3);
            let (c0, c1) = ((c + 1) % 3, (c + 2) % 3);
            m(r0, c0) * m(r1, c1) - m(r0, c1) * m(r1, c0)
        };
        let out = Vector3::new(
            cof(0, 0) * n.x + cof(0, 1) * n.y + cof(0, 2) * n.z,
            cof(1, 0) * n.x + cof(1, 1) * n.y + cof(1, 2) * n.z,
            cof(2, 0) * n.x + cof(2, 1) * n.y + cof(2, 2) * n.z,
        );
        out.try_normalize(f32::EPSILON).unwrap_or(out)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::multiply(&self, &rhs)
    }
}
