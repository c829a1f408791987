//! Height map build pipeline
//!
//! [`HeightMapBuilder::build`] validates a [`HeightGrid`], decides how it is
//! represented and drives the [`ShapeEngine`]:
//!
//! - Square grids with at least [`BLOCK_SIZE`] blocks per side become a
//!   height field, wrapped double-sided
//! - Smaller square grids become an explicit mesh, wrapped double-sided
//! - Non-square grids become an explicit mesh as-is
//!
//! Every build is a pure function of the grid it is given. Nothing is cached
//! between calls.

mod double_sided;
mod height_field;
mod mesh;

pub use mesh::ExplicitMesh;

use crate::engine::{NativeEngine, ShapeEngine};
use crate::error::{BuildError, Diagnostics};
use crate::grid::HeightGrid;
use crate::settings::{self, PhysicsSettings};
use crate::shape::{HeightFieldSettings, ShapeRef};

/// Quads per acceleration block side used when choosing the representation
pub const BLOCK_SIZE: i32 = HeightFieldSettings::DEFAULT_BLOCK_SIZE as i32;

/// Owner description used when nobody claimed the shape
pub const UNKNOWN_OWNER: &str = "<unknown>";

/// How a grid is turned into a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Compact height field
    RegularGrid,
    /// Two triangles per quad
    ExplicitMesh,
}

/// The representation chosen for one grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildPlan {
    pub strategy: Strategy,
    pub double_sided: bool,
}

impl BuildPlan {
    /// Representation for a grid that already passed validation
    pub fn for_dimensions(width: i32, depth: i32) -> Self {
        if width != depth {
            return Self {
                strategy: Strategy::ExplicitMesh,
                double_sided: false,
            };
        }

        let block_count = width / BLOCK_SIZE;
        let strategy = if block_count >= 2 {
            Strategy::RegularGrid
        } else {
            Strategy::ExplicitMesh
        };

        Self {
            strategy,
            double_sided: true,
        }
    }
}

/// Turns height grids into collision shapes
#[derive(Debug, Clone)]
pub struct HeightMapBuilder<E = NativeEngine> {
    engine: E,
    settings: Option<PhysicsSettings>,
    owners: String,
}

impl HeightMapBuilder<NativeEngine> {
    pub fn new() -> Self {
        Self::with_engine(NativeEngine)
    }
}

impl Default for HeightMapBuilder<NativeEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> HeightMapBuilder<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            settings: None,
            owners: UNKNOWN_OWNER.to_string(),
        }
    }

    /// Use fixed settings instead of [`settings::global`]
    pub fn with_settings(mut self, settings: PhysicsSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Owner description included in failure diagnostics
    pub fn with_owners(mut self, owners: impl Into<String>) -> Self {
        self.owners = owners.into();
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn owners(&self) -> &str {
        &self.owners
    }

    /// Settings in effect for the next build
    pub fn settings(&self) -> PhysicsSettings {
        self.settings.unwrap_or_else(settings::global)
    }

    /// Validate `grid` and choose its representation
    ///
    /// `Ok(None)` means the grid has no samples and produces no shape.
    pub fn plan(&self, grid: &HeightGrid) -> Result<Option<BuildPlan>, BuildError> {
        if grid.heights.is_empty() {
            return Ok(None);
        }
        self.check_grid(grid)?;
        Ok(Some(BuildPlan::for_dimensions(grid.width, grid.depth)))
    }

    fn check_grid(&self, grid: &HeightGrid) -> Result<(), BuildError> {
        if !grid.is_consistent() {
            return Err(self.log_failure(BuildError::DimensionMismatch {
                grid: grid.summary(),
                owners: self.owners.clone(),
            }));
        }
        if grid.width < 2 || grid.depth < 2 {
            return Err(self.log_failure(BuildError::GridTooSmall {
                grid: grid.summary(),
                owners: self.owners.clone(),
            }));
        }
        Ok(())
    }

    fn diagnostics(&self, grid: &HeightGrid) -> Diagnostics {
        Diagnostics {
            grid: grid.summary(),
            owners: self.owners.clone(),
        }
    }

    fn log_failure(&self, error: BuildError) -> BuildError {
        tracing::error!("{}", error);
        error
    }
}

impl<E: ShapeEngine> HeightMapBuilder<E> {
    /// Build the collision shape for `grid`
    ///
    /// Returns `Ok(None)` for a grid without samples. An engine rejection is
    /// final; the other representation is never tried as a fallback.
    pub fn build(&self, grid: &HeightGrid) -> Result<Option<ShapeRef>, BuildError> {
        let Some(plan) = self.plan(grid)? else {
            return Ok(None);
        };

        tracing::debug!(
            "Building {}x{} height map as {:?} (double-sided: {})",
            grid.width,
            grid.depth,
            plan.strategy,
            plan.double_sided
        );

        let shape = match plan.strategy {
            Strategy::RegularGrid => self.build_height_field(grid)?,
            Strategy::ExplicitMesh => self.build_mesh(grid)?,
        };

        let shape = if plan.double_sided {
            self.make_double_sided(Some(shape))?
        } else {
            shape
        };

        tracing::debug!(
            "Built height map shape: {} triangles, {} active edges",
            shape.triangle_count(),
            shape.active_edge_count()
        );

        Ok(Some(shape))
    }
}
