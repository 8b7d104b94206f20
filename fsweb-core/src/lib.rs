//! # fsweb-core
//!
//! Client library for a remote surface-fitting service, plus the point
//! capture pipeline that feeds it.
//!
//! This crate contains:
//! - **Wire format**: `RequestHeader`, `RequestBody`, `ResponseBody`, `RequestOptions`
//! - **Results**: `Geometry` (plane, sphere, cylinder, cone, torus), `FitResult`, `InlierMask`
//! - **Network**: `RequestClient` over a pluggable `Transport` (`HttpTransport` by default)
//! - **Cloud**: `PointCloudAccumulator` turning depth frames into a ring buffer of world points
//! - **Picking**: seed selection along a view ray and screen/world conversions
//! - **Session**: `FitSession`, which ties picking, fitting and post-processing together
//! - **Params**: persisted `SearchParams`
//! - **Error**: `FsError`, a typed `thiserror`-based error enum

pub mod cloud;
pub mod convexity;
pub mod error;
pub mod export;
pub mod feature;
pub mod flags;
pub mod geometry;
pub mod header;
pub mod network;
pub mod params;
pub mod picking;
pub mod request;
pub mod response;
pub mod session;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use cloud::{
    AccumulationMode, AccumulatorConfig, CameraIntrinsics, CameraPose, Confidence, ConfidenceMap,
    DepthFrame, DepthMap, PointCloudAccumulator, PointCloudBuffer, PointSnapshot, Sampling,
};
pub use convexity::is_convex;
pub use error::FsError;
pub use export::{read_xyz, write_xyz};
pub use feature::FeatureType;
pub use flags::{Precision, RequestOptions};
pub use geometry::Geometry;
pub use header::{ByteOrder, HEADER_SIZE, PointBufferDescription, RequestHeader};
pub use network::{DEFAULT_BASE_URL, HttpTransport, RequestClient, Transport};
pub use params::{SearchLevel, SearchParams};
pub use picking::pick_seed;
pub use request::RequestBody;
pub use response::{FitResult, InlierMask, ResponseBody};
pub use session::{FitOutcome, FitSession, PickRequest, PickingConfig};
