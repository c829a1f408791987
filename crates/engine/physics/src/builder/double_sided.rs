use super::HeightMapBuilder;
use crate::engine::ShapeEngine;
use crate::error::{BuildError, BuildStage};
use crate::shape::ShapeRef;

impl<E: ShapeEngine> HeightMapBuilder<E> {
    /// Make both faces of `shape` collidable
    pub fn make_double_sided(&self, shape: Option<ShapeRef>) -> Result<ShapeRef, BuildError> {
        let Some(shape) = shape else {
            return Err(self.log_failure(BuildError::NullShape));
        };

        self.engine
            .create_double_sided(shape)
            .map_err(|e| self.log_failure(BuildError::rejected(BuildStage::DoubleSided, e, None)))
    }
}
