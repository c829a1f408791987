//! Shape construction entry points
//!
//! The build pipeline talks to the physics engine through [`ShapeEngine`]
//! only: one entry point for regular height grids, one for explicit triangle
//! meshes and one for the double-sided decorator. Anything implementing the
//! trait can stand in for the engine, which is how tests force rejections.

use crate::error::EngineError;
use crate::shape::{DoubleSidedShape, HeightFieldSettings, MeshSettings, ShapeRef};
use std::sync::Arc;

/// Backend that turns shape settings into collision shapes
pub trait ShapeEngine {
    fn create_height_field(&self, settings: HeightFieldSettings) -> Result<ShapeRef, EngineError>;

    fn create_mesh(&self, settings: MeshSettings) -> Result<ShapeRef, EngineError>;

    fn create_double_sided(&self, inner: ShapeRef) -> Result<ShapeRef, EngineError>;
}

impl<E: ShapeEngine + ?Sized> ShapeEngine for &E {
    fn create_height_field(&self, settings: HeightFieldSettings) -> Result<ShapeRef, EngineError> {
        (**self).create_height_field(settings)
    }

    fn create_mesh(&self, settings: MeshSettings) -> Result<ShapeRef, EngineError> {
        (**self).create_mesh(settings)
    }

    fn create_double_sided(&self, inner: ShapeRef) -> Result<ShapeRef, EngineError> {
        (**self).create_double_sided(inner)
    }
}

impl<E: ShapeEngine + ?Sized> ShapeEngine for Box<E> {
    fn create_height_field(&self, settings: HeightFieldSettings) -> Result<ShapeRef, EngineError> {
        (**self).create_height_field(settings)
    }

    fn create_mesh(&self, settings: MeshSettings) -> Result<ShapeRef, EngineError> {
        (**self).create_mesh(settings)
    }

    fn create_double_sided(&self, inner: ShapeRef) -> Result<ShapeRef, EngineError> {
        (**self).create_double_sided(inner)
    }
}

/// The built-in engine backed by the shapes in [`crate::shape`]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl ShapeEngine for NativeEngine {
    fn create_height_field(&self, settings: HeightFieldSettings) -> Result<ShapeRef, EngineError> {
        Ok(Arc::new(settings.create()?))
    }

    fn create_mesh(&self, settings: MeshSettings) -> Result<ShapeRef, EngineError> {
        Ok(Arc::new(settings.create()?))
    }

    fn create_double_sided(&self, inner: ShapeRef) -> Result<ShapeRef, EngineError> {
        if inner.triangle_count() == 0 {
            return Err(EngineError::new("inner shape has no surface"));
        }
        Ok(Arc::new(DoubleSidedShape::new(inner)))
    }
}
