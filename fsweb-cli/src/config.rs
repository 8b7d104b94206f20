//! Configuration for the `fsweb` command line client.

use std::path::Path;
use std::time::Duration;

use fsweb_core::{AccumulatorConfig, DEFAULT_BASE_URL, PickingConfig, SearchParams};
use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fitting service endpoint.
    pub service: ServiceConfig,
    /// Search parameters used when no params file exists yet.
    pub search: SearchParams,
    /// Point buffer settings.
    pub accumulator: AccumulatorConfig,
    /// Seed region size on screen.
    pub picking: PickingConfig,
    /// Virtual camera used to turn screen radii into world radii.
    pub camera: CameraConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Service endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; the feature name is appended as a path segment.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Pinhole camera looking down the pick ray.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1170.0,
            viewport_height: 2532.0,
            fov_y_deg: 60.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.service.timeout_ms.max(1))
    }
}

impl CameraConfig {
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width.max(1.0), self.viewport_height.max(1.0))
    }

    pub fn projection(&self) -> Mat4 {
        let viewport = self.viewport();
        let fov = self.fov_y_deg.clamp(1.0, 179.0).to_radians();
        Mat4::perspective_rh(fov, viewport.x / viewport.y, 0.001, 1000.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────
