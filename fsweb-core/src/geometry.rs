//! Fitted primitives.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::feature::FeatureType;

/// One fitted primitive. Exactly one variant per fit result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Plane {
        lower_left: Vec3,
        lower_right: Vec3,
        upper_right: Vec3,
        upper_left: Vec3,
    },
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Cylinder {
        bottom: Vec3,
        top: Vec3,
        radius: f32,
    },
    Cone {
        bottom: Vec3,
        top: Vec3,
        bottom_radius: f32,
        top_radius: f32,
    },
    Torus {
        center: Vec3,
        normal: Vec3,
        mean_radius: f32,
        tube_radius: f32,
    },
}

impl Geometry {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            Geometry::Plane { .. } => FeatureType::Plane,
            Geometry::Sphere { .. } => FeatureType::Sphere,
            Geometry::Cylinder { .. } => FeatureType::Cylinder,
            Geometry::Cone { .. } => FeatureType::Cone,
            Geometry::Torus { .. } => FeatureType::Torus,
        }
    }

    /// Collapse degenerate cones and tori into the simpler primitive they
    /// describe.
    ///
    /// - cone with equal radii → cylinder
    /// - torus with zero mean radius → sphere of the tube radius
    /// - torus with `f32::MAX` mean radius → cylinder of the tube radius
    ///
    /// Payload fields alias by wire offset, so a degenerate torus's centre
    /// and normal slots carry the cylinder's bottom and top.
    pub fn reinterpreted(&self) -> Geometry {
        match *self {
            Geometry::Cone {
                bottom,
                top,
                bottom_radius,
                top_radius,
            } if top_radius == bottom_radius => Geometry::Cylinder {
                bottom,
                top,
                radius: bottom_radius,
            },
            Geometry::Torus {
                center,
                mean_radius,
                tube_radius,
                ..
            } if mean_radius == 0.0 => Geometry::Sphere {
                center,
                radius: tube_radius,
            },
            Geometry::Torus {
                center,
                normal,
                mean_radius,
                tube_radius,
            } if mean_radius == f32::MAX => Geometry::Cylinder {
                bottom: center,
                top: normal,
                radius: tube_radius,
            },
            other => other,
        }
    }
}
