//! Error types for height map shape construction

use crate::grid::GridSummary;
use std::fmt;
use thiserror::Error;

/// Error text returned by a [`ShapeEngine`](crate::ShapeEngine) entry point
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The construction step that produced an engine rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    /// Regular-grid height field
    HeightField,
    /// Explicit triangle mesh
    Mesh,
    /// Double-sided wrapper
    DoubleSided,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStage::HeightField => f.write_str("failed to build height map shape"),
            BuildStage::Mesh => f.write_str("failed to build height map shape (as polygon)"),
            BuildStage::DoubleSided => f.write_str("failed to make shape double-sided"),
        }
    }
}

/// Grid and owner description attached to grid-level failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub grid: GridSummary,
    pub owners: String,
}

/// Discriminant of [`BuildError`], handy for assertions and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildErrorKind {
    DimensionMismatch,
    GridTooSmall,
    EngineRejected,
    NullShape,
}

/// Failures of the height map build pipeline
///
/// None of these are retriable: they all stem from the grid contents or from
/// the engine refusing the geometry derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Height count is not `width * depth`
    #[error(
        "failed to build height map shape with {grid}. \
         Height count must be the product of width and depth. \
         This shape belongs to {owners}."
    )]
    DimensionMismatch { grid: GridSummary, owners: String },

    /// Width or depth below 2
    #[error(
        "failed to build height map shape with {grid}. \
         The height map must be at least 2x2. \
         This shape belongs to {owners}."
    )]
    GridTooSmall { grid: GridSummary, owners: String },

    /// The engine refused to construct the shape
    #[error("{}", rejection_message(.stage, .message, .diagnostics))]
    EngineRejected {
        stage: BuildStage,
        message: String,
        diagnostics: Option<Diagnostics>,
    },

    /// A wrapper was asked to decorate a missing shape
    #[error("failed to make shape double-sided. There was no shape to wrap.")]
    NullShape,
}

impl BuildError {
    pub fn kind(&self) -> BuildErrorKind {
        match self {
            BuildError::DimensionMismatch { .. } => BuildErrorKind::DimensionMismatch,
            BuildError::GridTooSmall { .. } => BuildErrorKind::GridTooSmall,
            BuildError::EngineRejected { .. } => BuildErrorKind::EngineRejected,
            BuildError::NullShape => BuildErrorKind::NullShape,
        }
    }

    /// The engine's own error text, for [`BuildError::EngineRejected`]
    pub fn engine_message(&self) -> Option<&str> {
        match self {
            BuildError::EngineRejected { message, .. } => Some(message),
            _ => None,
        }
    }

    pub(crate) fn rejected(
        stage: BuildStage,
        error: EngineError,
        diagnostics: Option<Diagnostics>,
    ) -> Self {
        BuildError::EngineRejected {
            stage,
            message: error.message,
            diagnostics,
        }
    }
}

fn rejection_message(
    stage: &BuildStage,
    message: &str,
    diagnostics: &Option<Diagnostics>,
) -> String {
    match diagnostics {
        Some(diagnostics) => format!(
            "{stage} with {}. It returned the following error: '{message}'. \
             This shape belongs to {}.",
            diagnostics.grid, diagnostics.owners
        ),
        None => format!("{stage}. It returned the following error: '{message}'."),
    }
}

/// Errors from turning an untyped payload into a [`HeightGrid`](crate::HeightGrid)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("height map data must be an object")]
    NotAnObject,

    #[error("height map data is missing field '{0}'")]
    MissingField(&'static str),

    #[error("height map field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Errors from loading [`PhysicsSettings`](crate::PhysicsSettings)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("active edge threshold must be within [0, 180] degrees, got {0}")]
    InvalidThreshold(f32),

    #[error("could not parse {var}={value}")]
    Parse { var: &'static str, value: String },

    #[error("settings parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> GridSummary {
        GridSummary {
            height_count: 3,
            width: 2,
            depth: 2,
        }
    }

    #[test]
    fn test_grid_failure_message() {
        let err = BuildError::DimensionMismatch {
            grid: summary(),
            owners: "'Terrain'".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to build height map shape with {height_count=3 width=2 depth=2}. \
             Height count must be the product of width and depth. \
             This shape belongs to 'Terrain'."
        );
        assert_eq!(err.kind(), BuildErrorKind::DimensionMismatch);
        assert_eq!(err.engine_message(), None);
    }

    #[test]
    fn test_mesh_rejection_is_tagged_as_polygon() {
        let err = BuildError::rejected(
            BuildStage::Mesh,
            EngineError::new("no triangles"),
            Some(Diagnostics {
                grid: summary(),
                owners: "<unknown>".into(),
            }),
        );
        let text = err.to_string();
        assert!(text.starts_with("failed to build height map shape (as polygon) with {"));
        assert!(text.contains("'no triangles'"));
        assert!(text.ends_with("This shape belongs to <unknown>."));
        assert_eq!(err.engine_message(), Some("no triangles"));
    }

    #[test]
    fn test_double_sided_rejection_has_no_grid() {
        let err = BuildError::rejected(BuildStage::DoubleSided, EngineError::new("boom"), None);
        assert_eq!(
            err.to_string(),
            "failed to make shape double-sided. It returned the following error: 'boom'."
        );
    }
}
