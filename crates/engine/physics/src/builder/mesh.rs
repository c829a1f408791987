use super::HeightMapBuilder;
use crate::engine::ShapeEngine;
use crate::error::{BuildError, BuildStage};
use crate::grid::HeightGrid;
use crate::shape::{MeshSettings, ShapeRef};
use glam::Vec3;

/// Explicit triangulation of a height grid
///
/// One vertex per sample in scan order, so vertex `z * width + x` is sample
/// `(x, z)`. Each quad contributes two triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl ExplicitMesh {
    pub fn from_grid(grid: &HeightGrid) -> Self {
        let width = grid.width.max(0) as u32;
        let depth = grid.depth.max(0) as u32;
        let (offset_x, offset_z) = grid.centering_offset();

        let vertices = if width == 0 {
            Vec::new()
        } else {
            grid.heights
                .iter()
                .enumerate()
                .map(|(i, &height)| {
                    let x = (i as u32 % width) as f32;
                    let z = (i as u32 / width) as f32;
                    Vec3::new(offset_x + x, height, offset_z + z)
                })
                .collect()
        };

        let quads_x = width.saturating_sub(1);
        let quads_z = depth.saturating_sub(1);
        let index = |x: u32, z: u32| z * width + x;

        let mut triangles = Vec::with_capacity((quads_x * quads_z * 2) as usize);
        for z in 0..quads_z {
            for x in 0..quads_x {
                let lr = index(x, z);
                let ll = index(x + 1, z);
                let ur = index(x, z + 1);
                let ul = index(x + 1, z + 1);

                triangles.push([lr, ur, ll]);
                triangles.push([ll, ur, ul]);
            }
        }

        Self {
            vertices,
            triangles,
        }
    }
}

impl<E: ShapeEngine> HeightMapBuilder<E> {
    /// Build `grid` as an explicit triangle mesh, centered on the origin in XZ
    pub fn build_mesh(&self, grid: &HeightGrid) -> Result<ShapeRef, BuildError> {
        self.check_grid(grid)?;

        let ExplicitMesh {
            vertices,
            triangles,
        } = ExplicitMesh::from_grid(grid);

        let mut settings = MeshSettings::new(vertices, triangles);
        settings.active_edge_cos_threshold = self.settings().active_edge_cos_threshold();

        self.engine.create_mesh(settings).map_err(|e| {
            self.log_failure(BuildError::rejected(
                BuildStage::Mesh,
                e,
                Some(self.diagnostics(grid)),
            ))
        })
    }
}
