//! Fit request client.
//!
//! Holds the request header state configured by the setters and performs
//! one exchange per [`fit`](RequestClient::fit) call. `fit` borrows the
//! client mutably, so a single client can never have two exchanges in
//! flight; callers serialize.

use std::time::{Duration, Instant};

use glam::Vec3;
use tracing::{debug, info};

use crate::error::FsError;
use crate::feature::FeatureType;
use crate::header::{ByteOrder, PointBufferDescription, RequestHeader};
use crate::network::transport::{
    ACCEPT_ENDIAN_HEADER, CONTENT_ENDIAN_HEADER, HttpRequest, HttpTransport, RESPONSE_MIME,
    Transport,
};
use crate::params::{SearchLevel, SearchParams};
use crate::request::{RequestBody, point_bytes};
use crate::response::{FitResult, ResponseBody};

/// Public endpoint of the surface-fitting service.
pub const DEFAULT_BASE_URL: &str = "https://developers.curvsurf.com/FindSurface";

pub struct RequestClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    header: RequestHeader,
    order: ByteOrder,
    last_elapsed: Duration,
}

impl RequestClient<HttpTransport> {
    /// Client over HTTP with the given per-request timeout.
    pub fn http(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FsError> {
        Ok(Self::new(HttpTransport::new(timeout)?, base_url))
    }
}

impl<T: Transport> RequestClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            header: RequestHeader::default(),
            order: ByteOrder::NATIVE,
            last_elapsed: Duration::ZERO,
        }
    }

    /// Override the byte order of the request body and of the expected
    /// response. Point coordinates are converted from native order.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wall-clock duration of the most recent exchange.
    pub fn last_elapsed(&self) -> Duration {
        self.last_elapsed
    }

    // ── Header setters ────────────────────────────────────────────

    pub fn set_point_buffer_description(&mut self, description: PointBufferDescription) {
        // re-apply the stride floor for descriptions built by hand
        self.header.points = PointBufferDescription::new(
            description.count,
            description.stride,
            description.offset,
            description.precision,
        );
    }

    pub fn set_point_data_description(&mut self, measurement_accuracy: f32, mean_distance: f32) {
        self.header.measurement_accuracy = measurement_accuracy;
        self.header.mean_distance = mean_distance;
    }

    pub fn set_seed_region(&mut self, seed_index: u32, radius: f32) {
        self.header.seed_index = seed_index;
        self.header.touch_radius = radius;
    }

    pub fn set_radial_expansion_level(&mut self, level: SearchLevel) {
        self.header.radial_expansion = level;
    }

    pub fn set_lateral_extension_level(&mut self, level: SearchLevel) {
        self.header.lateral_extension = level;
    }

    /// Copy all four search parameters into the header.
    pub fn apply_params(&mut self, params: &SearchParams) {
        self.set_point_data_description(params.measurement_accuracy, params.mean_distance);
        self.set_radial_expansion_level(params.radial_expansion);
        self.set_lateral_extension_level(params.lateral_extension);
    }

    // ── Exchange ──────────────────────────────────────────────────

    /// Run one fit exchange over `points`, laid out as described by the
    /// last [`set_point_buffer_description`](Self::set_point_buffer_description).
    ///
    /// Returns `Ok(None)` when the service found nothing.
    pub async fn fit(
        &mut self,
        feature: FeatureType,
        points: &[u8],
        request_inliers: bool,
    ) -> Result<Option<FitResult>, FsError> {
        self.header.request_inliers = request_inliers;
        let body = RequestBody::new(self.header, points, self.order)?;

        let mut headers = Vec::new();
        if self.order == ByteOrder::Big {
            headers.push((CONTENT_ENDIAN_HEADER, "big".to_string()));
            headers.push((ACCEPT_ENDIAN_HEADER, "big".to_string()));
        }
        let request = HttpRequest {
            url: format!("{}/{}", self.base_url, feature.url_name()),
            headers,
            body: body.into_bytes(),
        };
        debug!(
            url = %request.url,
            points = self.header.points.count,
            seed = self.header.seed_index,
            bytes = request.body.len(),
            "sending fit request"
        );

        let started = Instant::now();
        let outcome = self.exchange(request).await;
        self.last_elapsed = started.elapsed();

        match &outcome {
            Ok(Some(result)) => info!(
                feature = %result.feature_type(),
                rms = result.rms,
                elapsed_ms = self.last_elapsed.as_millis() as u64,
                "fit succeeded"
            ),
            Ok(None) => info!(
                elapsed_ms = self.last_elapsed.as_millis() as u64,
                "no {feature} found"
            ),
            Err(e) => debug!("fit request failed: {e}"),
        }
        outcome
    }

    /// Fit over tightly packed single-precision points.
    pub async fn fit_points(
        &mut self,
        feature: FeatureType,
        points: &[Vec3],
        request_inliers: bool,
    ) -> Result<Option<FitResult>, FsError> {
        let count = u32::try_from(points.len())
            .map_err(|_| FsError::InvalidHeader("too many points"))?;
        self.set_point_buffer_description(PointBufferDescription::packed(count));
        self.fit(feature, point_bytes(points), request_inliers).await
    }

    async fn exchange(&self, request: HttpRequest) -> Result<Option<FitResult>, FsError> {
        let response = self.transport.post(request).await?;

        if response.status != 200 {
            return Err(FsError::StatusCode(response.status));
        }
        match response.content_type.as_deref() {
            Some(RESPONSE_MIME) => {}
            other => {
                return Err(FsError::InvalidContentType(
                    other.unwrap_or_default().to_string(),
                ));
            }
        }
        let body = response.body.ok_or(FsError::NoResponseBody)?;

        Ok(ResponseBody::parse(body, self.order)?.into_result())
    }
}
