//! Fittable primitive types and response result codes.
//!
//! Uses `TryFrom` so unknown result codes become errors instead of panics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FsError;

// ── FeatureType ──────────────────────────────────────────────────

/// The five primitives the service can fit.
///
/// Discriminants match the response result codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Plane = 1,
    Sphere = 2,
    Cylinder = 3,
    Cone = 4,
    Torus = 5,
}

impl FeatureType {
    pub const ALL: [FeatureType; 5] = [
        FeatureType::Plane,
        FeatureType::Sphere,
        FeatureType::Cylinder,
        FeatureType::Cone,
        FeatureType::Torus,
    ];

    /// Path segment appended to the service base URL.
    pub fn url_name(&self) -> &'static str {
        match self {
            FeatureType::Plane => "plane",
            FeatureType::Sphere => "sphere",
            FeatureType::Cylinder => "cylinder",
            FeatureType::Cone => "cone",
            FeatureType::Torus => "torus",
        }
    }

    /// Returns `true` for types whose results may be degenerate and
    /// should be reinterpreted.
    pub fn may_degenerate(&self) -> bool {
        matches!(self, FeatureType::Cone | FeatureType::Torus)
    }
}

impl TryFrom<i32> for FeatureType {
    type Error = FsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FeatureType::Plane),
            2 => Ok(FeatureType::Sphere),
            3 => Ok(FeatureType::Cylinder),
            4 => Ok(FeatureType::Cone),
            5 => Ok(FeatureType::Torus),
            _ => Err(FsError::UnknownResultCode(value)),
        }
    }
}

impl FromStr for FeatureType {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureType::ALL
            .into_iter()
            .find(|t| t.url_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FsError::Other(format!("unknown feature type: {s}")))
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_name())
    }
}

// ── Result codes ─────────────────────────────────────────────────

/// Result code reported when the service found no surface.
pub const RESULT_NOT_FOUND: i32 = 0;

/// Map a response result code to a feature type.
///
/// `0` is "not found" and maps to `Ok(None)`; codes outside `0..=5`
/// are [`FsError::UnknownResultCode`].
pub fn feature_from_result_code(code: i32) -> Result<Option<FeatureType>, FsError> {
    if code == RESULT_NOT_FOUND {
        return Ok(None);
    }
    FeatureType::try_from(code).map(Some)
}
