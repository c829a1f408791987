use super::HeightMapBuilder;
use crate::engine::ShapeEngine;
use crate::error::{BuildError, BuildStage};
use crate::grid::HeightGrid;
use crate::shape::{with_scale, HeightFieldSettings, ShapeRef};
use glam::Vec3;

/// Flips the mirrored rows back so sample `(x, z)` ends up at `+z`
const DEPTH_FLIP: Vec3 = Vec3::new(1.0, 1.0, -1.0);

impl<E: ShapeEngine> HeightMapBuilder<E> {
    /// Build `grid` as a regular-grid height field
    ///
    /// The engine's height field grows along the opposite depth direction, so
    /// the rows are handed over in reverse order and the finished shape is
    /// mirrored back along Z. The grid is centered on the origin in XZ.
    pub fn build_height_field(&self, grid: &HeightGrid) -> Result<ShapeRef, BuildError> {
        self.check_grid(grid)?;

        let (offset_x, offset_z) = grid.centering_offset();
        let mut settings = HeightFieldSettings::new(
            grid.mirrored_rows(),
            Vec3::new(offset_x, 0.0, offset_z),
            Vec3::ONE,
            grid.width as u32,
        );
        settings.bits_per_sample = settings.calculate_bits_per_sample_for_error(0.0);
        settings.active_edge_cos_threshold = self.settings().active_edge_cos_threshold();

        let shape = self
            .engine
            .create_height_field(settings)
            .map_err(|e| {
                self.log_failure(BuildError::rejected(
                    BuildStage::HeightField,
                    e,
                    Some(self.diagnostics(grid)),
                ))
            })?;

        Ok(with_scale(shape, DEPTH_FLIP))
    }
}
