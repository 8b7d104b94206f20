//! Depth-stream point accumulation.
//!
//! Each frame, a random subsample of the depth map's high-confidence
//! pixels is unprojected into world space and written to the ring buffer.
//! While recording, frames are only ingested after the camera has moved
//! or turned enough to see something new.

use glam::{Mat3, Mat4, Vec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cloud::buffer::{PointCloudBuffer, PointSnapshot};
use crate::cloud::grid::{DepthGrid, Sampling};

/// Maps the depth camera's axes (y down, z forward) onto the tracking
/// camera's (y up, z backward).
pub const AXIS_CORRECTION: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, -1.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

// ── Frame inputs ─────────────────────────────────────────────────

/// Per-pixel confidence reported alongside depth.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low = 0,
    Medium = 1,
    High = 2,
}

/// Row-major depth in metres. `row_stride` is in elements.
#[derive(Debug, Clone, Copy)]
pub struct DepthMap<'a> {
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
    pub data: &'a [f32],
}

/// Row-major confidence bytes. `row_stride` is in bytes.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceMap<'a> {
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
    pub data: &'a [u8],
}

fn covers(len: usize, width: usize, height: usize, row_stride: usize) -> bool {
    width > 0 && height > 0 && row_stride >= width && len >= (height - 1) * row_stride + width
}

impl DepthMap<'_> {
    fn is_well_formed(&self) -> bool {
        covers(self.data.len(), self.width, self.height, self.row_stride)
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.row_stride + x]
    }
}

impl ConfidenceMap<'_> {
    fn is_well_formed(&self) -> bool {
        covers(self.data.len(), self.width, self.height, self.row_stride)
    }

    fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x]
    }
}

/// Camera placement in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Camera-to-world transform, i.e. the inverse view matrix.
    pub transform: Mat4,
}

impl CameraPose {
    pub fn from_transform(transform: Mat4) -> Self {
        Self { transform }
    }

    pub fn from_view_matrix(view: Mat4) -> Self {
        Self {
            transform: view.inverse(),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.transform.inverse()
    }

    /// Camera z axis in world space.
    pub fn forward_axis(&self) -> Vec3 {
        self.transform.z_axis.truncate()
    }

    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

/// Pinhole intrinsics of the colour image the depth map is aligned with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub matrix: Mat3,
    pub image_width: f32,
    pub image_height: f32,
}

/// Everything needed to ingest one frame.
#[derive(Debug, Clone, Copy)]
pub struct DepthFrame<'a> {
    pub depth: DepthMap<'a>,
    pub confidence: ConfidenceMap<'a>,
    pub pose: CameraPose,
    pub intrinsics: CameraIntrinsics,
}

// ── Configuration ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Ring buffer capacity in points.
    pub capacity: usize,
    /// Depth grid reduction per frame.
    pub sampling: Sampling,
    /// Minimum view rotation before a new frame is ingested (degrees).
    pub rotation_threshold_deg: f32,
    /// Minimum camera travel before a new frame is ingested (metres).
    pub translation_threshold: f32,
    /// Fixed RNG seed for reproducible sampling.
    pub seed: Option<u64>,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            capacity: 500_000,
            sampling: Sampling::Div256,
            rotation_threshold_deg: 5.0,
            translation_threshold: 0.05,
            seed: None,
        }
    }
}

/// How [`PointCloudAccumulator::update`] treats a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationMode {
    /// Preview: the buffer holds only the current frame's points.
    Live,
    /// Accumulate, gated on camera motion.
    Recording,
}

// ── PointCloudAccumulator ────────────────────────────────────────

pub struct PointCloudAccumulator {
    buffer: PointCloudBuffer,
    sampling: Sampling,
    rotation_cos: f32,
    translation_sq: f32,
    last_pose: Option<CameraPose>,
    grid: Option<DepthGrid>,
    rng: StdRng,
}

impl PointCloudAccumulator {
    pub fn new(config: &AccumulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            buffer: PointCloudBuffer::new(config.capacity),
            sampling: config.sampling,
            rotation_cos: config.rotation_threshold_deg.to_radians().cos(),
            translation_sq: config.translation_threshold * config.translation_threshold,
            last_pose: None,
            grid: None,
            rng,
        }
    }

    pub fn buffer(&self) -> &PointCloudBuffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Immutable copy of the current points for a fit request.
    pub fn snapshot(&self) -> PointSnapshot {
        self.buffer.snapshot()
    }

    /// Drop all points. The cached grid is kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_pose = None;
    }

    /// Whether `pose` differs enough from the last ingested pose.
    pub fn should_ingest(&self, pose: &CameraPose) -> bool {
        let Some(last) = self.last_pose else {
            return true;
        };
        self.buffer.is_empty()
            || pose.forward_axis().dot(last.forward_axis()) <= self.rotation_cos
            || pose.position().distance_squared(last.position()) >= self.translation_sq
    }

    /// Feed one frame according to `mode`. Returns the points written.
    pub fn update(&mut self, frame: &DepthFrame<'_>, mode: AccumulationMode) -> usize {
        match mode {
            AccumulationMode::Live => {
                self.buffer.clear();
                self.ingest(frame)
            }
            AccumulationMode::Recording if self.should_ingest(&frame.pose) => self.ingest(frame),
            AccumulationMode::Recording => 0,
        }
    }

    /// Sample, filter, unproject and store one frame.
    ///
    /// Malformed frames are skipped and leave the buffer untouched.
    pub fn ingest(&mut self, frame: &DepthFrame<'_>) -> usize {
        let depth = &frame.depth;
        let confidence = &frame.confidence;
        if !depth.is_well_formed() || !confidence.is_well_formed() {
            debug!("skipping frame: malformed depth or confidence map");
            return 0;
        }
        if confidence.width != depth.width || confidence.height != depth.height {
            debug!(
                "skipping frame: confidence {}x{} does not match depth {}x{}",
                confidence.width, confidence.height, depth.width, depth.height
            );
            return 0;
        }
        if frame.intrinsics.matrix.determinant() == 0.0 {
            debug!("skipping frame: singular intrinsics");
            return 0;
        }

        if !self.grid.as_ref().is_some_and(|g| g.matches(depth.width, depth.height)) {
            debug!(width = depth.width, height = depth.height, "rebuilding depth grid");
            self.grid = Some(DepthGrid::new(
                depth.width,
                depth.height,
                frame.intrinsics.matrix.inverse(),
                (frame.intrinsics.image_width, frame.intrinsics.image_height),
            ));
        }
        let Some(grid) = self.grid.as_ref() else {
            return 0;
        };

        let local_to_world = frame.pose.transform * AXIS_CORRECTION;
        let samples = grid.sample(&mut self.rng, self.sampling.sample_count(grid.len()));

        let points = samples.iter().filter_map(|cell| {
            if confidence.at(cell.x, cell.y) < Confidence::High as u8 {
                return None;
            }
            let d = depth.at(cell.x, cell.y);
            if !d.is_finite() {
                return None;
            }
            Some(local_to_world.project_point3(cell.base * d))
        });
        let written = self.buffer.extend(points);

        self.last_pose = Some(frame.pose);
        trace!(written, total = self.buffer.len(), "ingested frame");
        written
    }
}
