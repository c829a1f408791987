//! Owner-facing height map shape
//!
//! [`HeightMapShape`] keeps the grid assigned by its owners, accepts it as an
//! untyped JSON payload and builds the collision shape lazily. The built shape
//! is cached until the data changes.

use crate::builder::{HeightMapBuilder, UNKNOWN_OWNER};
use crate::engine::{NativeEngine, ShapeEngine};
use crate::error::{BuildError, DataError};
use crate::grid::HeightGrid;
use crate::settings::PhysicsSettings;
use crate::shape::ShapeRef;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Default)]
enum ShapeCache {
    #[default]
    Stale,
    Built(Option<ShapeRef>),
    Failed,
}

/// Height map data plus its lazily built collision shape
#[derive(Debug, Clone)]
pub struct HeightMapShape<E = NativeEngine> {
    engine: E,
    settings: Option<PhysicsSettings>,
    grid: HeightGrid,
    owners: BTreeSet<String>,
    cache: ShapeCache,
}

impl HeightMapShape<NativeEngine> {
    pub fn new() -> Self {
        Self::with_engine(NativeEngine)
    }
}

impl Default for HeightMapShape<NativeEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> HeightMapShape<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            settings: None,
            grid: HeightGrid::default(),
            owners: BTreeSet::new(),
            cache: ShapeCache::Stale,
        }
    }

    /// Build with fixed settings instead of the process-wide ones
    pub fn with_settings(mut self, settings: PhysicsSettings) -> Self {
        self.settings = Some(settings);
        self.invalidate();
        self
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }

    pub fn set_grid(&mut self, grid: HeightGrid) {
        self.invalidate();
        self.grid = grid;
    }

    /// Assign the grid from a `{ "heights", "width", "depth" }` object
    ///
    /// The current shape is discarded even if the payload is rejected. A
    /// rejected payload leaves the previous grid in place.
    pub fn set_data(&mut self, data: &Value) -> Result<(), DataError> {
        self.invalidate();

        match parse_grid(data) {
            Ok(grid) => {
                self.grid = grid;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected height map data: {}", e);
                Err(e)
            }
        }
    }

    pub fn data(&self) -> Value {
        json!({
            "width": self.grid.width,
            "depth": self.grid.depth,
            "heights": self.grid.heights,
        })
    }

    pub fn add_owner(&mut self, owner: impl Into<String>) {
        self.owners.insert(owner.into());
    }

    /// Returns whether `owner` was registered
    pub fn remove_owner(&mut self, owner: &str) -> bool {
        self.owners.remove(owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.iter().map(String::as_str)
    }

    /// Owner names for diagnostics, e.g. `'Terrain', 'Floor'`
    pub fn owners_to_string(&self) -> String {
        if self.owners.is_empty() {
            return UNKNOWN_OWNER.to_string();
        }
        self.owners
            .iter()
            .map(|owner| format!("'{owner}'"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Drop the cached shape so the next [`shape`](Self::shape) call rebuilds
    pub fn invalidate(&mut self) {
        self.cache = ShapeCache::Stale;
    }

    /// Whether the cache holds a build result, successful or not
    pub fn is_built(&self) -> bool {
        !matches!(self.cache, ShapeCache::Stale)
    }
}

impl<E: ShapeEngine> HeightMapShape<E> {
    /// Run the build pipeline on the current grid without touching the cache
    pub fn try_shape(&self) -> Result<Option<ShapeRef>, BuildError> {
        let mut builder =
            HeightMapBuilder::with_engine(&self.engine).with_owners(self.owners_to_string());
        if let Some(settings) = self.settings {
            builder = builder.with_settings(settings);
        }
        builder.build(&self.grid)
    }

    /// The collision shape for the current grid, built on first use
    ///
    /// Build failures are logged and yield `None` until the data changes.
    pub fn shape(&mut self) -> Option<ShapeRef> {
        if let ShapeCache::Stale = self.cache {
            self.cache = match self.try_shape() {
                Ok(shape) => ShapeCache::Built(shape),
                Err(_) => ShapeCache::Failed,
            };
        }

        match &self.cache {
            ShapeCache::Built(shape) => shape.clone(),
            ShapeCache::Stale | ShapeCache::Failed => None,
        }
    }
}

impl<E> fmt::Display for HeightMapShape<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.grid, f)
    }
}

fn parse_grid(data: &Value) -> Result<HeightGrid, DataError> {
    let object = data.as_object().ok_or(DataError::NotAnObject)?;

    let heights = field(object, "heights")?
        .as_array()
        .and_then(|values| {
            values
                .iter()
                .map(|v| v.as_f64().map(|h| h as f32))
                .collect::<Option<Vec<f32>>>()
        })
        .ok_or(DataError::WrongType {
            field: "heights",
            expected: "an array of numbers",
        })?;

    let width = integer_field(object, "width")?;
    let depth = integer_field(object, "depth")?;

    Ok(HeightGrid::new(width, depth, heights))
}

fn field<'a>(object: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, DataError> {
    object.get(name).ok_or(DataError::MissingField(name))
}

fn integer_field(object: &Map<String, Value>, name: &'static str) -> Result<i32, DataError> {
    field(object, name)?
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(DataError::WrongType {
            field: name,
            expected: "a 32-bit integer",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use std::sync::Arc;

    fn height_map() -> HeightMapShape {
        HeightMapShape::new().with_settings(PhysicsSettings::default())
    }

    #[test]
    fn test_set_data() {
        let mut shape = height_map();
        shape
            .set_data(&json!({ "width": 2, "depth": 2, "heights": [0.0, 1.0, 2.0, 3.5] }))
            .unwrap();

        assert_eq!(shape.grid(), &HeightGrid::new(2, 2, vec![0.0, 1.0, 2.0, 3.5]));
        assert_eq!(shape.to_string(), "{height_count=4 width=2 depth=2}");
        assert_eq!(
            shape.data(),
            json!({ "width": 2, "depth": 2, "heights": [0.0, 1.0, 2.0, 3.5] })
        );
    }

    #[test]
    fn test_rejected_data_keeps_grid() {
        let mut shape = height_map();
        shape.set_grid(HeightGrid::flat(3, 3, 1.0));

        let err = shape.set_data(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err, DataError::NotAnObject);

        let err = shape
            .set_data(&json!({ "width": 2, "depth": 2 }))
            .unwrap_err();
        assert_eq!(err, DataError::MissingField("heights"));

        let err = shape
            .set_data(&json!({ "width": 2.5, "depth": 2, "heights": [] }))
            .unwrap_err();
        assert_eq!(
            err,
            DataError::WrongType {
                field: "width",
                expected: "a 32-bit integer"
            }
        );

        let err = shape
            .set_data(&json!({ "width": 2, "depth": 2, "heights": [0.0, "x"] }))
            .unwrap_err();
        assert!(matches!(err, DataError::WrongType { field: "heights", .. }));

        let err = shape
            .set_data(&json!({ "width": 2, "heights": [] }))
            .unwrap_err();
        assert_eq!(err, DataError::MissingField("depth"));

        assert_eq!(shape.grid(), &HeightGrid::flat(3, 3, 1.0));
    }

    #[test]
    fn test_dimensions_checked_at_build_time() {
        let mut shape = height_map();
        shape
            .set_data(&json!({ "width": 3, "depth": 3, "heights": [0.0, 1.0] }))
            .unwrap();
        assert!(shape.try_shape().is_err());
        assert!(shape.shape().is_none());
        assert!(shape.is_built());
    }

    #[test]
    fn test_owners_to_string() {
        let mut shape = height_map();
        assert_eq!(shape.owners_to_string(), "<unknown>");

        shape.add_owner("Terrain");
        shape.add_owner("Floor");
        assert_eq!(shape.owners_to_string(), "'Floor', 'Terrain'");

        assert!(shape.remove_owner("Floor"));
        assert!(!shape.remove_owner("Floor"));
        assert_eq!(shape.owners_to_string(), "'Terrain'");
    }

    #[test]
    fn test_owners_in_build_errors() {
        let mut shape = height_map();
        shape.add_owner("Terrain");
        shape.set_grid(HeightGrid::new(1, 1, vec![0.0]));

        let err = shape.try_shape().unwrap_err();
        assert!(err.to_string().ends_with("This shape belongs to 'Terrain'."));
    }

    #[test]
    fn test_shape_is_cached_until_data_changes() {
        let mut shape = height_map();
        assert!(shape.shape().is_none());

        shape.set_grid(HeightGrid::flat(5, 5, 0.0));
        let first = shape.shape().unwrap();
        let second = shape.shape().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.kind(), ShapeKind::DoubleSided);

        // Even a rejected payload drops the cached shape
        assert!(shape.set_data(&Value::Null).is_err());
        assert!(!shape.is_built());
        let rebuilt = shape.shape().unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }
}
