//! Printable summary of one fit.

use std::fmt;

use fsweb_core::{FeatureType, FitOutcome, Geometry};
use glam::Vec3;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub requested: FeatureType,
    pub found: Option<FoundSurface>,
    pub point_count: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoundSurface {
    pub geometry: Geometry,
    pub rms: f32,
    pub seed_index: usize,
    pub seed_point: Vec3,
    pub convex: bool,
    pub inlier_count: usize,
}

impl FitReport {
    pub fn new(requested: FeatureType, outcome: Option<&FitOutcome>, point_count: usize, elapsed_ms: u64) -> Self {
        let found = outcome.map(|o| FoundSurface {
            geometry: o.result.geometry,
            rms: o.result.rms,
            seed_index: o.seed_index,
            seed_point: o.seed_point,
            convex: o.convex,
            inlier_count: o.inliers.len(),
        });
        Self {
            requested,
            found,
            point_count,
            elapsed_ms,
        }
    }
}

fn v(p: Vec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", p.x, p.y, p.z)
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(found) = &self.found else {
            return write!(
                f,
                "no {} found in {} points ({} ms)",
                self.requested, self.point_count, self.elapsed_ms
            );
        };

        match found.geometry {
            Geometry::Plane {
                lower_left,
                lower_right,
                upper_right,
                upper_left,
            } => {
                writeln!(f, "plane")?;
                writeln!(f, "  lower left   {}", v(lower_left))?;
                writeln!(f, "  lower right  {}", v(lower_right))?;
                writeln!(f, "  upper right  {}", v(upper_right))?;
                writeln!(f, "  upper left   {}", v(upper_left))?;
            }
            Geometry::Sphere { center, radius } => {
                writeln!(f, "sphere")?;
                writeln!(f, "  center  {}", v(center))?;
                writeln!(f, "  radius  {radius:.4}")?;
            }
            Geometry::Cylinder { bottom, top, radius } => {
                writeln!(f, "cylinder")?;
                writeln!(f, "  bottom  {}", v(bottom))?;
                writeln!(f, "  top     {}", v(top))?;
                writeln!(f, "  radius  {radius:.4}")?;
            }
            Geometry::Cone {
                bottom,
                top,
                bottom_radius,
                top_radius,
            } => {
                writeln!(f, "cone")?;
                writeln!(f, "  bottom  {} r={bottom_radius:.4}", v(bottom))?;
                writeln!(f, "  top     {} r={top_radius:.4}", v(top))?;
            }
            Geometry::Torus {
                center,
                normal,
                mean_radius,
                tube_radius,
            } => {
                writeln!(f, "torus")?;
                writeln!(f, "  center  {}", v(center))?;
                writeln!(f, "  normal  {}", v(normal))?;
                writeln!(f, "  radii   mean={mean_radius:.4} tube={tube_radius:.4}")?;
            }
        }
        writeln!(f, "  rms     {:.6}", found.rms)?;
        writeln!(f, "  seed    #{} {}", found.seed_index, v(found.seed_point))?;
        writeln!(f, "  {}", if found.convex { "convex" } else { "concave" })?;
        write!(
            f,
            "  inliers {}/{} ({} ms)",
            found.inlier_count, self.point_count, self.elapsed_ms
        )
    }
}
