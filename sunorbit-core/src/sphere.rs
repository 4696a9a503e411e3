/// Latitude/longitude sphere tessellation.
///
/// Generation runs in two phases: an indexed `(lat + 1) x (lon + 1)` vertex
/// grid, then expansion of the index list into an unindexed triangle list for
/// devices that only issue non-indexed draws. Devices with indexed draws can
/// upload the [`IndexedMesh`] directly and skip [`IndexedMesh::flatten`].
///
/// The poles lie on the z axis. Rows run from the north pole (`v = 0`) to the
/// south pole (`v = 1`); the seam column is duplicated so `u` reaches 1.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::error::GeometryError;
use crate::geometry::{Mesh, Vertex};

/// Upper bound on either segment count. Keeps the grid addressable by
/// `u32` indices and the expanded mesh a sane size.
pub const MAX_SPHERE_SEGMENTS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    pub longitude_segments: u32,
    pub latitude_segments: u32,
}

impl SphereParams {
    pub fn validate(&self) -> Result<(), GeometryError> {
        let radius_ok = self.radius.is_finite() && self.radius > 0.0;
        let lon_ok = (3..=MAX_SPHERE_SEGMENTS).contains(&self.longitude_segments);
        let lat_ok = (2..=MAX_SPHERE_SEGMENTS).contains(&self.latitude_segments);
        let grid_fits = self
            .latitude_segments
            .checked_add(1)
            .zip(self.longitude_segments.checked_add(1))
            .and_then(|(rows, columns)| rows.checked_mul(columns))
            .is_some();
        if !(radius_ok && lon_ok && lat_ok && grid_fits) {
            return Err(GeometryError::InvalidSphere {
                radius: self.radius,
                longitude_segments: self.longitude_segments,
                latitude_segments: self.latitude_segments,
            });
        }
        Ok(())
    }

    /// Pole rows contribute a single triangle per cell.
    pub fn triangle_count(&self) -> usize {
        2 * self.longitude_segments as usize * (self.latitude_segments as usize).saturating_sub(1)
    }
}

/// Shared vertices plus a triangle index list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    /// Duplicate every referenced vertex inline, three per triangle.
    pub fn flatten(&self) -> Mesh {
        Mesh::from_vertices(
            self.indices
                .iter()
                .map(|&i| self.vertices[i as usize])
                .collect(),
        )
    }
}

/// Build the indexed grid for a sphere centered at the origin.
pub fn sphere_grid(params: &SphereParams) -> Result<IndexedMesh, GeometryError> {
    params.validate()?;
    let SphereParams {
        radius,
        longitude_segments: lon,
        latitude_segments: lat,
    } = *params;

    let longitude_step = TAU / lon as f32;
    let latitude_step = PI / lat as f32;
    let columns = lon + 1;

    let mut vertices = Vec::with_capacity(((lat + 1) * columns) as usize);
    for row in 0..=lat {
        let polar = FRAC_PI_2 - row as f32 * latitude_step;
        let ring = radius * polar.cos();
        let z = radius * polar.sin();

        for col in 0..=lon {
            let azimuth = col as f32 * longitude_step;
            let position = [ring * azimuth.cos(), ring * azimuth.sin(), z];
            let normal = position.map(|c| c / radius);
            let uv = [col as f32 / lon as f32, row as f32 / lat as f32];
            vertices.push(Vertex::new(position, normal, uv));
        }
    }

    let mut indices = Vec::with_capacity(params.triangle_count() * 3);
    for row in 0..lat {
        for col in 0..lon {
            let current = row * columns + col;
            let next = current + columns;

            // The north row's upper triangle and the south row's lower
            // triangle would collapse onto the pole.
            if row != 0 {
                indices.extend_from_slice(&[current, next, current + 1]);
            }
            if row != lat - 1 {
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }
    }

    Ok(IndexedMesh { vertices, indices })
}

/// Generate the sphere as an unindexed triangle list.
pub fn generate_sphere(params: &SphereParams) -> Result<Mesh, GeometryError> {
    let mesh = sphere_grid(params)?.flatten();
    log::debug!(
        "Tessellated sphere: {} triangles from {}x{} segments",
        mesh.triangle_count(),
        params.longitude_segments,
        params.latitude_segments
    );
    Ok(mesh)
}
