//! Process-wide physics settings
//!
//! The only setting consumed by the build pipeline is the active edge
//! threshold: internal mesh edges whose faces meet at an angle below the
//! threshold do not generate contacts.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::{PoisonError, RwLock};

/// Default active edge threshold in degrees
pub const DEFAULT_ACTIVE_EDGE_THRESHOLD_DEGREES: f32 = 50.0;

/// Environment variable read by [`PhysicsSettings::from_env`]
pub const ACTIVE_EDGE_THRESHOLD_ENV: &str = "HEIGHTMAP_ACTIVE_EDGE_THRESHOLD";

static GLOBAL: RwLock<PhysicsSettings> = RwLock::new(PhysicsSettings {
    active_edge_threshold_degrees: DEFAULT_ACTIVE_EDGE_THRESHOLD_DEGREES,
});

/// Settings that influence collision shape construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Angle in degrees above which an internal edge is considered active
    pub active_edge_threshold_degrees: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            active_edge_threshold_degrees: DEFAULT_ACTIVE_EDGE_THRESHOLD_DEGREES,
        }
    }
}

impl PhysicsSettings {
    pub fn new(active_edge_threshold_degrees: f32) -> Result<Self, SettingsError> {
        let settings = Self {
            active_edge_threshold_degrees,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from the environment, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Ok(value) = env::var(ACTIVE_EDGE_THRESHOLD_ENV) {
            settings.active_edge_threshold_degrees =
                value.trim().parse().map_err(|_| SettingsError::Parse {
                    var: ACTIVE_EDGE_THRESHOLD_ENV,
                    value: value.clone(),
                })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let degrees = self.active_edge_threshold_degrees;
        if !degrees.is_finite() || !(0.0..=180.0).contains(&degrees) {
            return Err(SettingsError::InvalidThreshold(degrees));
        }
        Ok(())
    }

    /// The threshold as the cosine of the angle, the form the engine consumes
    pub fn active_edge_cos_threshold(&self) -> f32 {
        self.active_edge_threshold_degrees.to_radians().cos()
    }
}

/// Current process-wide settings
pub fn global() -> PhysicsSettings {
    *GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the process-wide settings
///
/// Takes effect for every build started afterwards; shapes that were already
/// built keep the threshold they were built with.
pub fn set_global(settings: PhysicsSettings) {
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = settings;
}
