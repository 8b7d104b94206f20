//! One-shot fit orchestration: pick a seed, configure the client, run the
//! exchange and post-process the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::convexity::is_convex;
use crate::error::FsError;
use crate::feature::FeatureType;
use crate::network::client::RequestClient;
use crate::network::transport::{HttpTransport, Transport};
use crate::params::SearchParams;
use crate::picking::{ndc_to_ray_direction, pick_seed, screen_length_to_world};
use crate::response::FitResult;

/// Smallest probe radius on screen, in pixels.
pub const MIN_PROBE_PIXELS: f32 = 5.0;

// ── Picking input ────────────────────────────────────────────────

/// Seed-region size on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Seed region radius in pixels.
    pub pixel_radius: f32,
    /// Probe radius as a fraction of the seed region radius.
    pub probe_ratio: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            pixel_radius: 64.0,
            probe_ratio: 0.25,
        }
    }
}

/// The ray to pick along and the radii at unit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRequest {
    pub ray_origin: Vec3,
    pub ray_direction: Vec3,
    /// Seed radius per metre of depth.
    pub unit_radius: f32,
    /// Picking cylinder radius per metre of depth.
    pub probe_radius: f32,
}

impl PickRequest {
    /// Ray through the screen centre of a camera.
    pub fn screen_center(
        camera_to_world: &Mat4,
        projection: &Mat4,
        viewport: Vec2,
        picking: &PickingConfig,
    ) -> Self {
        let probe_pixels = (picking.pixel_radius * picking.probe_ratio).max(MIN_PROBE_PIXELS);
        Self {
            ray_origin: camera_to_world.w_axis.truncate(),
            ray_direction: ndc_to_ray_direction(Vec2::ZERO, camera_to_world, projection),
            unit_radius: screen_length_to_world(picking.pixel_radius, viewport, projection),
            probe_radius: screen_length_to_world(probe_pixels, viewport, projection),
        }
    }
}

/// A completed fit with everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Reinterpreted result.
    pub result: FitResult,
    pub seed_index: usize,
    pub seed_point: Vec3,
    pub convex: bool,
    /// Points the service marked as inliers.
    pub inliers: Vec<Vec3>,
}

// ── FitSession ───────────────────────────────────────────────────

/// Serializes fits over a [`RequestClient`].
///
/// A fit triggered while another is in flight fails fast with
/// [`FsError::Busy`] instead of queueing.
pub struct FitSession<T: Transport = HttpTransport> {
    client: Mutex<RequestClient<T>>,
    params: SearchParams,
    running: Arc<AtomicBool>,
}

impl<T: Transport> FitSession<T> {
    pub fn new(client: RequestClient<T>, params: SearchParams) -> Self {
        Self {
            client: Mutex::new(client),
            params,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle to the "fit running" flag.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SearchParams) {
        self.params = params;
    }

    /// Pick a seed in `points` and fit `feature` around it.
    ///
    /// `Ok(None)` means the service found no such surface.
    pub async fn run(
        &self,
        feature: FeatureType,
        points: &[Vec3],
        pick: &PickRequest,
    ) -> Result<Option<FitOutcome>, FsError> {
        let _guard = RunningGuard::acquire(&self.running)?;
        self.params.validate()?;

        let seed_index = pick_seed(pick.ray_origin, pick.ray_direction, points, pick.probe_radius)
            .ok_or_else(|| FsError::Request("no picked points for seed region".into()))?;
        let seed_point = points[seed_index];
        let seed_radius = pick.unit_radius * pick.ray_direction.dot(seed_point - pick.ray_origin).abs();
        debug!(seed_index, seed_radius, "picked seed");

        let result = {
            let mut client = self.client.lock().await;
            client.apply_params(&self.params);
            client.set_seed_region(seed_index as u32, seed_radius);
            client.fit_points(feature, points, true).await?
        };
        let Some(result) = result else {
            return Ok(None);
        };

        let result = if feature.may_degenerate() {
            result.reinterpret()
        } else {
            result
        };
        if result.feature_type() != feature {
            info!("{feature} reinterpreted as {}", result.feature_type());
        }
        let convex = is_convex(&result.geometry, pick.ray_origin, pick.ray_direction, seed_point);
        let inliers = result.inliers(points).unwrap_or_default();

        Ok(Some(FitOutcome {
            result,
            seed_index,
            seed_point,
            convex,
            inliers,
        }))
    }

    pub async fn last_elapsed(&self) -> std::time::Duration {
        self.client.lock().await.last_elapsed()
    }
}

/// Holds the running flag for the lifetime of one fit.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, FsError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FsError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
