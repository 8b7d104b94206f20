pub mod accumulator;
pub mod buffer;
pub mod grid;

pub use accumulator::{
    AXIS_CORRECTION, AccumulationMode, AccumulatorConfig, CameraIntrinsics, CameraPose,
    Confidence, ConfidenceMap, DepthFrame, DepthMap, PointCloudAccumulator,
};
pub use buffer::{PointCloudBuffer, PointSnapshot};
pub use grid::{DepthGrid, DepthGridElement, Sampling};
