//! Response body decoding.
//!
//! ## Wire format
//!
//! ```text
//! 0x00  magic/version   [u8; 4]  "FS" 1 0
//! 0x04  header length   u32      start of the inlier mask
//! 0x08  result code     i32      0 = not found, 1-5 = feature type
//! 0x0C  data length     u32      inlier mask length (0 = none)
//! 0x10  rms             f32
//! 0x14  payload         three packed f32 per 3D point, type dependent
//! ```
//!
//! Payload slots alias across types:
//!
//! | offset | plane       | sphere | cylinder | cone          | torus       |
//! |--------|-------------|--------|----------|---------------|-------------|
//! | 0x14   | lower left  | center | bottom   | bottom        | center      |
//! | 0x20   | lower right | radius | top      | top           | normal      |
//! | 0x2C   | upper right |        | radius   | bottom radius | mean radius |
//! | 0x30   |             |        |          | top radius    | tube radius |
//! | 0x38   | upper left  |        |          |               |             |

use bytes::Bytes;
use glam::Vec3;

use crate::error::FsError;
use crate::feature::{FeatureType, feature_from_result_code};
use crate::geometry::Geometry;
use crate::header::{ByteOrder, MAGIC_VERSION};

/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = 0x14;

/// Payload bytes each feature type needs.
fn payload_size(feature: FeatureType) -> usize {
    match feature {
        FeatureType::Plane => 4 * 12,
        FeatureType::Sphere => 12 + 4,
        FeatureType::Cylinder => 2 * 12 + 4,
        FeatureType::Cone | FeatureType::Torus => 2 * 12 + 2 * 4,
    }
}

// ── ResponseBody ─────────────────────────────────────────────────

/// A validated response buffer with typed accessors at fixed offsets.
///
/// Every accessor is in bounds: lengths are checked once in
/// [`parse`](Self::parse).
#[derive(Debug, Clone)]
pub struct ResponseBody {
    bytes: Bytes,
    order: ByteOrder,
    feature: Option<FeatureType>,
}

impl ResponseBody {
    pub fn parse(bytes: Bytes, order: ByteOrder) -> Result<Self, FsError> {
        if bytes.len() < PAYLOAD_OFFSET || bytes[0..4] != MAGIC_VERSION {
            return Err(FsError::InvalidResponseBody);
        }
        let feature = feature_from_result_code(order.get_i32(&bytes, 0x08))?;

        if let Some(feature) = feature {
            if bytes.len() < PAYLOAD_OFFSET + payload_size(feature) {
                return Err(FsError::InvalidResponseBody);
            }
            let header_length = order.get_u32(&bytes, 0x04) as u64;
            let data_length = order.get_u32(&bytes, 0x0C) as u64;
            // The mask must not overlap the fixed header or the payload.
            if header_length < (PAYLOAD_OFFSET + payload_size(feature)) as u64 {
                return Err(FsError::InvalidResponseBody);
            }
            if data_length > 0 && header_length + data_length > bytes.len() as u64 {
                return Err(FsError::InvalidResponseBody);
            }
        }

        Ok(Self {
            bytes,
            order,
            feature,
        })
    }

    /// `None` when the service found nothing.
    pub fn feature(&self) -> Option<FeatureType> {
        self.feature
    }

    pub fn header_length(&self) -> usize {
        self.order.get_u32(&self.bytes, 0x04) as usize
    }

    pub fn data_length(&self) -> usize {
        self.order.get_u32(&self.bytes, 0x0C) as usize
    }

    pub fn rms(&self) -> f32 {
        self.order.get_f32(&self.bytes, 0x10)
    }

    fn scalar(&self, at: usize) -> f32 {
        self.order.get_f32(&self.bytes, at)
    }

    fn point(&self, at: usize) -> Vec3 {
        Vec3::new(self.scalar(at), self.scalar(at + 4), self.scalar(at + 8))
    }

    /// Decode the payload for the reported feature type.
    pub fn geometry(&self) -> Option<Geometry> {
        let geometry = match self.feature? {
            FeatureType::Plane => Geometry::Plane {
                lower_left: self.point(0x14),
                lower_right: self.point(0x20),
                upper_right: self.point(0x2C),
                upper_left: self.point(0x38),
            },
            FeatureType::Sphere => Geometry::Sphere {
                center: self.point(0x14),
                radius: self.scalar(0x20),
            },
            FeatureType::Cylinder => Geometry::Cylinder {
                bottom: self.point(0x14),
                top: self.point(0x20),
                radius: self.scalar(0x2C),
            },
            FeatureType::Cone => Geometry::Cone {
                bottom: self.point(0x14),
                top: self.point(0x20),
                bottom_radius: self.scalar(0x2C),
                top_radius: self.scalar(0x30),
            },
            FeatureType::Torus => Geometry::Torus {
                center: self.point(0x14),
                normal: self.point(0x20),
                mean_radius: self.scalar(0x2C),
                tube_radius: self.scalar(0x30),
            },
        };
        Some(geometry)
    }

    pub fn inlier_mask(&self) -> Option<InlierMask> {
        let len = self.data_length();
        if self.feature.is_none() || len == 0 {
            return None;
        }
        let start = self.header_length();
        Some(InlierMask(self.bytes.slice(start..start + len)))
    }

    /// Convert into the caller-owned result, `None` for "not found".
    pub fn into_result(self) -> Option<FitResult> {
        Some(FitResult {
            geometry: self.geometry()?,
            rms: self.rms(),
            inlier_mask: self.inlier_mask(),
        })
    }
}

// ── InlierMask ───────────────────────────────────────────────────

/// One byte per request point; `0` marks an inlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlierMask(Bytes);

impl InlierMask {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        InlierMask(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_inlier(&self, index: usize) -> bool {
        self.0.get(index) == Some(&0)
    }

    pub fn inlier_count(&self) -> usize {
        self.0.iter().filter(|&&b| b == 0).count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ── FitResult ────────────────────────────────────────────────────

/// A successful fit: primitive, residual and optional inlier mask.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub geometry: Geometry,
    pub rms: f32,
    pub inlier_mask: Option<InlierMask>,
}

impl FitResult {
    pub fn feature_type(&self) -> FeatureType {
        self.geometry.feature_type()
    }

    /// Replace a degenerate cone or torus with its simpler primitive.
    pub fn reinterpret(self) -> Self {
        Self {
            geometry: self.geometry.reinterpreted(),
            ..self
        }
    }

    /// Points marked as inliers.
    ///
    /// `points` must be the buffer sent with the request; a length that
    /// does not match the mask yields `None`, as does a missing mask.
    pub fn inliers(&self, points: &[Vec3]) -> Option<Vec<Vec3>> {
        let mask = self.inlier_mask.as_ref()?;
        if mask.len() != points.len() {
            return None;
        }
        Some(
            points
                .iter()
                .zip(mask.as_bytes())
                .filter(|(_, flag)| **flag == 0)
                .map(|(p, _)| *p)
                .collect(),
        )
    }

    /// Same as [`inliers`](Self::inliers) over a raw native-endian
    /// single-precision buffer with an arbitrary stride.
    pub fn inliers_strided(&self, raw: &[u8], count: usize, stride: usize) -> Option<Vec<Vec3>> {
        let mask = self.inlier_mask.as_ref()?;
        if mask.len() != count || stride < 12 {
            return None;
        }
        if count > 0 && raw.len() < (count - 1) * stride + 12 {
            return None;
        }
        let read = |at: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&raw[at..at + 4]);
            f32::from_ne_bytes(b)
        };
        Some(
            (0..count)
                .filter(|&i| mask.is_inlier(i))
                .map(|i| {
                    let at = i * stride;
                    Vec3::new(read(at), read(at + 4), read(at + 8))
                })
                .collect(),
        )
    }
}
