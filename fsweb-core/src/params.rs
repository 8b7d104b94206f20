//! Search parameters sent with every fit request.
//!
//! The four settings are persisted between sessions as TOML and passed
//! into request building as an immutable value.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FsError;

// ── SearchLevel ──────────────────────────────────────────────────

/// Region-growth aggressiveness, `0` (off) to `10`.
///
/// Deserializing clamps out-of-range values, negative or above `10`,
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct SearchLevel(u8);

impl SearchLevel {
    pub const MAX_LEVEL: u8 = 10;

    pub const OFF: SearchLevel = SearchLevel(0);
    pub const MODERATE: SearchLevel = SearchLevel(1);
    pub const DEFAULT: SearchLevel = SearchLevel(5);
    pub const RADICAL: SearchLevel = SearchLevel(10);

    /// Returns `None` for values above [`MAX_LEVEL`](Self::MAX_LEVEL).
    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::MAX_LEVEL).then_some(SearchLevel(level))
    }

    pub fn clamped(level: u8) -> Self {
        SearchLevel(level.min(Self::MAX_LEVEL))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SearchLevel {
    fn default() -> Self {
        SearchLevel::DEFAULT
    }
}

impl From<u8> for SearchLevel {
    fn from(value: u8) -> Self {
        SearchLevel::clamped(value)
    }
}

impl From<i64> for SearchLevel {
    fn from(value: i64) -> Self {
        SearchLevel(value.clamp(0, Self::MAX_LEVEL as i64) as u8)
    }
}

impl From<SearchLevel> for u8 {
    fn from(level: SearchLevel) -> Self {
        level.0
    }
}

impl fmt::Display for SearchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lv{}", self.0)
    }
}

// ── SearchParams ─────────────────────────────────────────────────

/// Fit tolerances and region-growth levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Expected sensor noise magnitude (metres).
    pub measurement_accuracy: f32,
    /// Expected spacing between neighbouring points (metres).
    pub mean_distance: f32,
    pub lateral_extension: SearchLevel,
    pub radial_expansion: SearchLevel,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            measurement_accuracy: 0.02,
            mean_distance: 0.2,
            lateral_extension: SearchLevel::DEFAULT,
            radial_expansion: SearchLevel::DEFAULT,
        }
    }
}

impl SearchParams {
    /// Accuracy and distance must both be strictly positive.
    pub fn validate(&self) -> Result<(), FsError> {
        if !(self.measurement_accuracy > 0.0) {
            return Err(FsError::InvalidParams("measurement accuracy must be positive"));
        }
        if !(self.mean_distance > 0.0) {
            return Err(FsError::InvalidParams("mean distance must be positive"));
        }
        Ok(())
    }

    /// Load parameters saved by a previous session, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SearchParams>(&contents) {
                Ok(params) if params.validate().is_ok() => params,
                Ok(_) => {
                    tracing::warn!("rejected params in {}; using defaults", path.display());
                    Self::default()
                }
                Err(e) => {
                    tracing::warn!("invalid params {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("no params at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), FsError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bounds() {
        assert_eq!(SearchLevel::new(10), Some(SearchLevel::RADICAL));
        assert_eq!(SearchLevel::new(11), None);
        assert_eq!(SearchLevel::clamped(200).get(), 10);
    }

    #[test]
    fn levels_are_clamped_on_load() {
        let text = "measurement_accuracy = 0.01\nmean_distance = 0.1\nlateral_extension = 42\nradial_expansion = 3\n";
        let params: SearchParams = toml::from_str(text).unwrap();
        assert_eq!(params.lateral_extension, SearchLevel::RADICAL);
        assert_eq!(params.radial_expansion.get(), 3);
    }

    #[test]
    fn levels_beyond_u8_are_clamped_on_load() {
        let path = std::env::temp_dir().join(format!("fsweb-params-wide-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "measurement_accuracy = 0.5\nmean_distance = 0.7\nlateral_extension = 300\nradial_expansion = -1\n",
        )
        .unwrap();
        let params = SearchParams::load(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(params.measurement_accuracy, 0.5);
        assert_eq!(params.mean_distance, 0.7);
        assert_eq!(params.lateral_extension, SearchLevel::RADICAL);
        assert_eq!(params.radial_expansion, SearchLevel::OFF);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let params: SearchParams = toml::from_str("mean_distance = 0.5").unwrap();
        assert_eq!(params.mean_distance, 0.5);
        assert_eq!(params.measurement_accuracy, 0.02);
        assert_eq!(params.radial_expansion, SearchLevel::DEFAULT);
    }

    #[test]
    fn validate_rejects_non_positive() {
        let mut params = SearchParams::default();
        assert!(params.validate().is_ok());
        params.mean_distance = 0.0;
        assert!(matches!(params.validate(), Err(FsError::InvalidParams(_))));
        params.mean_distance = 0.2;
        params.measurement_accuracy = f32::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("fsweb-params-{}.toml", std::process::id()));
        let params = SearchParams {
            measurement_accuracy: 0.005,
            mean_distance: 0.05,
            lateral_extension: SearchLevel::MODERATE,
            radial_expansion: SearchLevel::OFF,
        };
        params.save(&path).unwrap();
        assert_eq!(SearchParams::load(&path), params);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/fsweb/params.toml");
        assert_eq!(SearchParams::load(path), SearchParams::default());
    }
}
