//! Collision shapes for height map terrain
//!
//! Turns a rectangular grid of height samples into a collision shape for a
//! rigid-body engine. Square grids that are large enough to be split into
//! acceleration blocks become a compact height field; everything else becomes
//! an explicit triangle mesh.
//!
//! # Architecture
//!
//! - [`HeightGrid`]: The input samples (row-major, rows along the depth axis)
//! - [`HeightMapBuilder`]: Validates a grid, picks a [`Strategy`] and drives the engine
//! - [`ShapeEngine`]: The three shape construction entry points ([`NativeEngine`] by default)
//! - [`CollisionShape`]: The queries every built shape answers
//! - [`HeightMapShape`]: Owner-facing object with untyped data marshalling and a shape cache
//!
//! # Usage
//!
//! ```ignore
//! use heightmap_physics::{HeightGrid, HeightMapBuilder};
//!
//! let grid = HeightGrid::from_fn(5, 5, |x, z| (x + z) as f32 * 0.5);
//! let shape = HeightMapBuilder::new().build(&grid)?.expect("grid has samples");
//! let height = shape.height_at(0.0, 0.0);
//! ```

pub mod builder;
pub mod collider;
pub mod engine;
pub mod error;
pub mod grid;
pub mod heightmap;
pub mod settings;
pub mod shape;

pub use builder::{BuildPlan, HeightMapBuilder, Strategy, BLOCK_SIZE};
pub use engine::{NativeEngine, ShapeEngine};
pub use error::{BuildError, BuildErrorKind, BuildStage, DataError, EngineError, SettingsError};
pub use grid::{GridSummary, HeightGrid};
pub use heightmap::HeightMapShape;
pub use settings::PhysicsSettings;
pub use shape::{CollisionShape, RayHit, ShapeKind, ShapeRef};

// Re-export for convenience
pub use glam;
pub use rapier3d;
