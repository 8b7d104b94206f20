use bytes::{Bytes, BytesMut};
use glam::{DVec3, Vec3};

use crate::error::FsError;
use crate::flags::Precision;
use crate::header::{ByteOrder, HEADER_SIZE, PointBufferDescription, RequestHeader};

/// Header bytes followed by the raw point buffer.
#[derive(Debug, Clone)]
pub struct RequestBody {
    header: RequestHeader,
    bytes: Bytes,
}

impl RequestBody {
    /// Assemble a request body.
    ///
    /// `points` are native-endian; their coordinates are rewritten in
    /// `order` so the whole body matches the announced byte order.
    /// Fails when the point buffer is shorter than
    /// `offset + stride * count` bytes.
    pub fn new(header: RequestHeader, points: &[u8], order: ByteOrder) -> Result<Self, FsError> {
        let required = header.points.required_len();
        if (points.len() as u64) < required {
            return Err(FsError::InvalidHeader("point buffer shorter than offset + stride * count"));
        }
        if header.points.count > 0 && header.seed_index >= header.points.count {
            return Err(FsError::InvalidHeader("seed index outside point buffer"));
        }

        let mut bytes = BytesMut::with_capacity(HEADER_SIZE + points.len());
        bytes.extend_from_slice(&header.encode(order));
        bytes.extend_from_slice(points);
        if order != ByteOrder::NATIVE {
            swap_coordinates(&mut bytes[HEADER_SIZE..], &header.points);
        }
        Ok(Self {
            header,
            bytes: bytes.freeze(),
        })
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Reverse the bytes of every coordinate word the service will read.
fn swap_coordinates(points: &mut [u8], desc: &PointBufferDescription) {
    let word = match desc.precision {
        Precision::Single => 4,
        Precision::Double => 8,
    };
    let (offset, stride) = (desc.offset as usize, desc.stride as usize);
    for i in 0..desc.count as usize {
        let base = offset + i * stride;
        for coord in points[base..base + 3 * word].chunks_exact_mut(word) {
            coord.reverse();
        }
    }
}

/// View packed single-precision points as native-endian bytes.
pub fn point_bytes(points: &[Vec3]) -> &[u8] {
    bytemuck::cast_slice(points)
}

/// View packed double-precision points as native-endian bytes.
pub fn point_bytes_f64(points: &[DVec3]) -> &[u8] {
    bytemuck::cast_slice(points)
}
