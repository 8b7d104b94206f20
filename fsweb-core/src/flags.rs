use bitflags::bitflags;

bitflags! {
    /// Option byte at offset 0x27 of the request header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RequestOptions: u8 {
        /// Ask the service to append a per-point inlier mask.
        const REQUEST_INLIERS = 0x01;
        /// Points are three `f64` coordinates instead of three `f32`.
        const DOUBLE_PRECISION = 0x02;
    }
}

impl RequestOptions {
    pub fn precision(&self) -> Precision {
        if self.contains(RequestOptions::DOUBLE_PRECISION) {
            Precision::Double
        } else {
            Precision::Single
        }
    }
}

/// Coordinate precision of the point buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Single,
    Double,
}

impl Precision {
    /// Smallest legal point stride: three coordinates, tightly packed.
    pub const fn min_stride(self) -> u32 {
        match self {
            Precision::Single => 3 * 4,
            Precision::Double => 3 * 8,
        }
    }
}
