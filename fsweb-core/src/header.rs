//! Fixed 40-byte request header.
//!
//! ## Wire format
//!
//! ```text
//! 0x00  magic 'F'             u8
//! 0x01  magic 'S'             u8
//! 0x02  version major         u8  (1)
//! 0x03  version minor         u8  (0)
//! 0x04  header size           u32 (40)
//! 0x08  point count           u32
//! 0x0C  point offset          u32
//! 0x10  point stride          u32
//! 0x14  measurement accuracy  f32
//! 0x18  mean distance         f32
//! 0x1C  touch radius          f32
//! 0x20  seed index            u32
//! 0x24  reserved              u8
//! 0x25  radial expansion      u8  (0-10)
//! 0x26  lateral extension     u8  (0-10)
//! 0x27  option flags          u8
//! ```

use crate::error::FsError;
use crate::flags::{Precision, RequestOptions};
use crate::params::SearchLevel;

/// Magic tag and protocol version shared by requests and responses.
pub const MAGIC_VERSION: [u8; 4] = [b'F', b'S', 1, 0];

/// Size of the encoded request header.
pub const HEADER_SIZE: usize = 40;

// ── ByteOrder ────────────────────────────────────────────────────

/// Byte order of multi-byte header fields and point coordinates.
///
/// Little-endian is the service default; big-endian must be announced
/// with extra HTTP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host, which is also the order of any point buffer
    /// produced by casting native floats to bytes.
    pub const NATIVE: ByteOrder = if cfg!(target_endian = "big") {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };

    pub(crate) fn put_u32(self, buf: &mut [u8], at: usize, v: u32) {
        let raw = match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        };
        buf[at..at + 4].copy_from_slice(&raw);
    }

    pub(crate) fn put_f32(self, buf: &mut [u8], at: usize, v: f32) {
        self.put_u32(buf, at, v.to_bits());
    }

    /// Callers check bounds before reading.
    pub(crate) fn get_u32(self, buf: &[u8], at: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&buf[at..at + 4]);
        match self {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        }
    }

    pub(crate) fn get_i32(self, buf: &[u8], at: usize) -> i32 {
        self.get_u32(buf, at) as i32
    }

    pub(crate) fn get_f32(self, buf: &[u8], at: usize) -> f32 {
        f32::from_bits(self.get_u32(buf, at))
    }
}

// ── PointBufferDescription ───────────────────────────────────────

/// Layout of the raw point buffer that follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointBufferDescription {
    pub count: u32,
    pub stride: u32,
    pub offset: u32,
    pub precision: Precision,
}

impl PointBufferDescription {
    /// A stride below the precision minimum is raised to the minimum.
    pub fn new(count: u32, stride: u32, offset: u32, precision: Precision) -> Self {
        Self {
            count,
            stride: stride.max(precision.min_stride()),
            offset,
            precision,
        }
    }

    /// Tightly packed single-precision points.
    pub fn packed(count: u32) -> Self {
        Self::new(count, 0, 0, Precision::Single)
    }

    /// Bytes the service will read from the point buffer:
    /// `offset + stride * count`.
    pub fn required_len(&self) -> u64 {
        self.offset as u64 + self.stride as u64 * self.count as u64
    }
}

// ── RequestHeader ────────────────────────────────────────────────

/// Decoded form of the 40-byte request header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestHeader {
    pub points: PointBufferDescription,
    pub measurement_accuracy: f32,
    pub mean_distance: f32,
    pub touch_radius: f32,
    pub seed_index: u32,
    pub radial_expansion: SearchLevel,
    pub lateral_extension: SearchLevel,
    pub request_inliers: bool,
}

impl Default for RequestHeader {
    fn default() -> Self {
        Self {
            points: PointBufferDescription::packed(0),
            measurement_accuracy: 0.0,
            mean_distance: 0.0,
            touch_radius: 0.0,
            seed_index: 0,
            radial_expansion: SearchLevel::OFF,
            lateral_extension: SearchLevel::OFF,
            request_inliers: false,
        }
    }
}

impl RequestHeader {
    pub fn options(&self) -> RequestOptions {
        let mut opts = RequestOptions::empty();
        opts.set(RequestOptions::REQUEST_INLIERS, self.request_inliers);
        opts.set(
            RequestOptions::DOUBLE_PRECISION,
            self.points.precision == Precision::Double,
        );
        opts
    }

    /// Serialize to bytes in the given order.
    pub fn encode(&self, order: ByteOrder) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC_VERSION);
        order.put_u32(&mut buf, 0x04, HEADER_SIZE as u32);
        order.put_u32(&mut buf, 0x08, self.points.count);
        order.put_u32(&mut buf, 0x0C, self.points.offset);
        order.put_u32(&mut buf, 0x10, self.points.stride);
        order.put_f32(&mut buf, 0x14, self.measurement_accuracy);
        order.put_f32(&mut buf, 0x18, self.mean_distance);
        order.put_f32(&mut buf, 0x1C, self.touch_radius);
        order.put_u32(&mut buf, 0x20, self.seed_index);
        buf[0x25] = self.radial_expansion.get();
        buf[0x26] = self.lateral_extension.get();
        buf[0x27] = self.options().bits();
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8], order: ByteOrder) -> Result<Self, FsError> {
        if data.len() < HEADER_SIZE {
            return Err(FsError::InvalidHeader("request header too short"));
        }
        if data[0..4] != MAGIC_VERSION {
            return Err(FsError::InvalidHeader("bad magic or version"));
        }
        if order.get_u32(data, 0x04) != HEADER_SIZE as u32 {
            return Err(FsError::InvalidHeader("unexpected header size"));
        }
        let level = |v: u8| SearchLevel::new(v).ok_or(FsError::InvalidHeader("search level out of range"));
        let options = RequestOptions::from_bits_truncate(data[0x27]);

        Ok(Self {
            points: PointBufferDescription {
                count: order.get_u32(data, 0x08),
                offset: order.get_u32(data, 0x0C),
                stride: order.get_u32(data, 0x10),
                precision: options.precision(),
            },
            measurement_accuracy: order.get_f32(data, 0x14),
            mean_distance: order.get_f32(data, 0x18),
            touch_radius: order.get_f32(data, 0x1C),
            seed_index: order.get_u32(data, 0x20),
            radial_expansion: level(data[0x25])?,
            lateral_extension: level(data[0x26])?,
            request_inliers: options.contains(RequestOptions::REQUEST_INLIERS),
        })
    }
}
