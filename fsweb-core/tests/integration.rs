//! Integration tests: fit exchanges through a scripted transport, the fit
//! session end to end, and the HTTP transport against a local listener.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use fsweb_core::network::transport::{HttpRequest, HttpResponse, RESPONSE_MIME};
use fsweb_core::{
    ByteOrder, FeatureType, FitSession, FsError, Geometry, HttpTransport, PickRequest,
    PointBufferDescription, PointSnapshot, RequestClient, RequestHeader, SearchLevel,
    SearchParams, Transport,
};
use glam::Vec3;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Helpers ──────────────────────────────────────────────────────

type Reply = dyn Fn() -> Result<HttpResponse, FsError> + Send + Sync;

/// Transport that records every request and answers with a fixed reply.
#[derive(Clone)]
struct ScriptedTransport {
    sent: Arc<Mutex<Vec<HttpRequest>>>,
    reply: Arc<Reply>,
    delay: Duration,
}

impl ScriptedTransport {
    fn new(reply: impl Fn() -> Result<HttpResponse, FsError> + Send + Sync + 'static) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(reply),
            delay: Duration::ZERO,
        }
    }

    fn ok(body: Bytes) -> Self {
        Self::new(move || {
            Ok(HttpResponse {
                status: 200,
                content_type: Some(RESPONSE_MIME.to_string()),
                body: Some(body.clone()),
            })
        })
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, FsError> {
        self.sent.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.reply)()
    }
}

/// Little-endian response body.
fn response(code: i32, rms: f32, payload: &[f32], mask: &[u8]) -> Bytes {
    let header_length = (0x14 + payload.len() * 4) as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(b"FS\x01\x00");
    buf.extend_from_slice(&header_length.to_le_bytes());
    buf.extend_from_slice(&code.to_le_bytes());
    buf.extend_from_slice(&(mask.len() as u32).to_le_bytes());
    buf.extend_from_slice(&rms.to_le_bytes());
    for v in payload {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(mask);
    Bytes::from(buf)
}

fn sphere_response(mask: &[u8]) -> Bytes {
    response(2, 0.01, &[1.0, 2.0, 3.0, 4.0], mask)
}

fn client(transport: ScriptedTransport) -> RequestClient<ScriptedTransport> {
    RequestClient::new(transport, "http://fit.test/FindSurface/").with_byte_order(ByteOrder::Little)
}

fn cloud() -> Vec<Vec3> {
    vec![
        Vec3::new(0.5, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(0.1, 0.0, 2.0),
        Vec3::new(3.0, 3.0, 3.0),
    ]
}

// ── RequestClient ────────────────────────────────────────────────

#[tokio::test]
async fn test_sphere_response_decodes() {
    let transport = ScriptedTransport::ok(sphere_response(&[]));
    let mut client = client(transport.clone());

    let result = client
        .fit_points(FeatureType::Sphere, &cloud(), false)
        .await
        .unwrap()
        .expect("sphere expected");

    assert_eq!(
        result.geometry,
        Geometry::Sphere {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 4.0
        }
    );
    assert_eq!(result.rms, 0.01);
    assert!(result.inlier_mask.is_none());
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_request_url_and_body() {
    let transport = ScriptedTransport::ok(sphere_response(&[]));
    let mut client = client(transport.clone());
    client.apply_params(&SearchParams {
        measurement_accuracy: 0.01,
        mean_distance: 0.1,
        lateral_extension: SearchLevel::RADICAL,
        radial_expansion: SearchLevel::MODERATE,
    });
    client.set_seed_region(2, 0.3);

    let points = cloud();
    client.fit_points(FeatureType::Cylinder, &points, true).await.unwrap();

    let sent = transport.sent();
    let request = &sent[0];
    assert_eq!(request.url, "http://fit.test/FindSurface/cylinder");
    assert!(request.headers.is_empty());
    assert_eq!(request.body.len(), 40 + points.len() * 12);

    let header = RequestHeader::decode(&request.body, ByteOrder::Little).unwrap();
    assert_eq!(header.points, PointBufferDescription::packed(4));
    assert_eq!(header.seed_index, 2);
    assert_eq!(header.touch_radius, 0.3);
    assert_eq!(header.measurement_accuracy, 0.01);
    assert_eq!(header.mean_distance, 0.1);
    assert_eq!(header.lateral_extension, SearchLevel::RADICAL);
    assert_eq!(header.radial_expansion, SearchLevel::MODERATE);
    assert!(header.request_inliers);
}

#[tokio::test]
async fn test_big_endian_sends_endian_headers() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"FS\x01\x00");
    buf.extend_from_slice(&0x24u32.to_be_bytes());
    buf.extend_from_slice(&2i32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&0.25f32.to_be_bytes());
    for v in [1.0f32, 2.0, 3.0, 4.0] {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    let transport = ScriptedTransport::ok(Bytes::from(buf));
    let mut client = RequestClient::new(transport.clone(), "http://fit.test")
        .with_byte_order(ByteOrder::Big);

    let result = client
        .fit_points(FeatureType::Sphere, &cloud(), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.rms, 0.25);

    let sent = transport.sent();
    let names: Vec<&str> = sent[0].headers.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, ["X-Content-Endian", "X-Accept-Endian"]);
    assert!(sent[0].headers.iter().all(|(_, v)| v == "big"));

    // Header and point coordinates are both big-endian.
    let body = &sent[0].body;
    let header = RequestHeader::decode(body, ByteOrder::Big).unwrap();
    assert_eq!(header.points.count, cloud().len() as u32);
    let coord = |i: usize| f32::from_be_bytes(body[40 + i * 4..44 + i * 4].try_into().unwrap());
    assert_eq!(coord(0), 0.5);
    assert_eq!(coord(2), 1.0);
    assert_eq!(coord(11), 3.0);
}

#[tokio::test]
async fn test_not_found_is_none() {
    let transport = ScriptedTransport::ok(response(0, 0.0, &[], &[]));
    let mut client = client(transport);
    let result = client.fit_points(FeatureType::Torus, &cloud(), false).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_error_mapping() {
    let points = cloud();

    let mut c = client(ScriptedTransport::new(|| Err(FsError::NoResponse)));
    assert!(matches!(
        c.fit_points(FeatureType::Plane, &points, false).await,
        Err(FsError::NoResponse)
    ));

    let mut c = client(ScriptedTransport::new(|| {
        Ok(HttpResponse {
            status: 503,
            ..HttpResponse::default()
        })
    }));
    assert!(matches!(
        c.fit_points(FeatureType::Plane, &points, false).await,
        Err(FsError::StatusCode(503))
    ));

    let mut c = client(ScriptedTransport::new(|| {
        Ok(HttpResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: Some(Bytes::from_static(b"<html>")),
        })
    }));
    match c.fit_points(FeatureType::Plane, &points, false).await {
        Err(FsError::InvalidContentType(ct)) => assert_eq!(ct, "text/html"),
        other => panic!("unexpected: {other:?}"),
    }

    let mut c = client(ScriptedTransport::new(|| {
        Ok(HttpResponse {
            status: 200,
            content_type: Some(RESPONSE_MIME.into()),
            body: None,
        })
    }));
    assert!(matches!(
        c.fit_points(FeatureType::Plane, &points, false).await,
        Err(FsError::NoResponseBody)
    ));

    let mut c = client(ScriptedTransport::ok(Bytes::from_static(b"XX\x01\x00garbage garbage garb")));
    assert!(matches!(
        c.fit_points(FeatureType::Plane, &points, false).await,
        Err(FsError::InvalidResponseBody)
    ));

    let mut c = client(ScriptedTransport::ok(response(9, 0.0, &[0.0; 12], &[])));
    assert!(matches!(
        c.fit_points(FeatureType::Plane, &points, false).await,
        Err(FsError::UnknownResultCode(9))
    ));
}

#[tokio::test]
async fn test_elapsed_is_recorded() {
    let mut transport = ScriptedTransport::ok(sphere_response(&[]));
    transport.delay = Duration::from_millis(20);
    let mut client = client(transport);
    assert_eq!(client.last_elapsed(), Duration::ZERO);
    client.fit_points(FeatureType::Sphere, &cloud(), false).await.unwrap();
    assert!(client.last_elapsed() >= Duration::from_millis(20));
}

// ── FitSession ───────────────────────────────────────────────────

fn center_pick() -> PickRequest {
    PickRequest {
        ray_origin: Vec3::ZERO,
        ray_direction: Vec3::Z,
        unit_radius: 0.5,
        probe_radius: 0.1,
    }
}

#[tokio::test]
async fn test_session_fit_with_inliers() {
    let transport = ScriptedTransport::ok(sphere_response(&[1, 0, 0, 1]));
    let session = FitSession::new(client(transport.clone()), SearchParams::default());
    let snapshot = PointSnapshot::new(cloud());

    let outcome = session
        .run(FeatureType::Sphere, &snapshot, &center_pick())
        .await
        .unwrap()
        .expect("sphere expected");

    // (0, 0, 2) is the nearest point inside the probe
    assert_eq!(outcome.seed_index, 1);
    assert_eq!(outcome.seed_point, Vec3::new(0.0, 0.0, 2.0));
    assert_eq!(outcome.inliers, vec![Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.1, 0.0, 2.0)]);
    // sphere centre (1, 2, 3) radius 4 contains the viewer
    assert!(!outcome.convex);
    assert!(!session.is_running());

    let header = RequestHeader::decode(&transport.sent()[0].body, ByteOrder::Little).unwrap();
    assert_eq!(header.seed_index, 1);
    assert_eq!(header.touch_radius, 1.0);
    assert_eq!(header.measurement_accuracy, 0.02);
    assert!(header.request_inliers);
}

#[tokio::test]
async fn test_session_reinterprets_degenerate_cone() {
    // equal radii: bottom (0,0,0) top (0,1,0), radius 0.5 at both ends
    let payload = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.5, 0.5];
    let transport = ScriptedTransport::ok(response(4, 0.0, &payload, &[]));
    let session = FitSession::new(client(transport), SearchParams::default());

    let outcome = session
        .run(FeatureType::Cone, &cloud(), &center_pick())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.result.feature_type(), FeatureType::Cylinder);
    assert!(outcome.inliers.is_empty());
}

#[tokio::test]
async fn test_session_keeps_result_for_stable_request() {
    // same equal-radius cone, but the caller asked for a cylinder
    let payload = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.5, 0.5];
    let transport = ScriptedTransport::ok(response(4, 0.0, &payload, &[]));
    let session = FitSession::new(client(transport), SearchParams::default());

    let outcome = session
        .run(FeatureType::Cylinder, &cloud(), &center_pick())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.result.feature_type(), FeatureType::Cone);
}

#[tokio::test]
async fn test_session_without_seed() {
    let transport = ScriptedTransport::ok(sphere_response(&[]));
    let session = FitSession::new(client(transport.clone()), SearchParams::default());

    let behind = [Vec3::new(0.0, 0.0, -1.0)];
    match session.run(FeatureType::Plane, &behind, &center_pick()).await {
        Err(FsError::Request(reason)) => assert!(reason.contains("no picked points")),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(transport.sent().is_empty());
    assert!(!session.is_running());
}

#[tokio::test]
async fn test_session_busy() {
    let transport = ScriptedTransport::ok(sphere_response(&[]));
    let session = FitSession::new(client(transport.clone()), SearchParams::default());

    let flag = session.running_flag();
    flag.store(true, Ordering::Release);
    assert!(matches!(
        session.run(FeatureType::Sphere, &cloud(), &center_pick()).await,
        Err(FsError::Busy)
    ));
    flag.store(false, Ordering::Release);
    assert!(session.run(FeatureType::Sphere, &cloud(), &center_pick()).await.is_ok());
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_session_concurrent_trigger_is_rejected() {
    let mut transport = ScriptedTransport::ok(sphere_response(&[]));
    transport.delay = Duration::from_millis(200);
    let session = Arc::new(FitSession::new(client(transport), SearchParams::default()));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.run(FeatureType::Sphere, &cloud(), &center_pick()).await }
    });
    // wait until the first fit holds the gate
    while !session.is_running() {
        tokio::task::yield_now().await;
    }
    assert!(matches!(
        session.run(FeatureType::Sphere, &cloud(), &center_pick()).await,
        Err(FsError::Busy)
    ));
    assert!(first.await.unwrap().unwrap().is_some());
    assert!(!session.is_running());
}

#[tokio::test]
async fn test_session_gate_cleared_after_error() {
    let transport = ScriptedTransport::new(|| Err(FsError::NoResponse));
    let session = FitSession::new(client(transport), SearchParams::default());
    assert!(session.run(FeatureType::Sphere, &cloud(), &center_pick()).await.is_err());
    assert!(!session.is_running());
}

// ── HttpTransport ────────────────────────────────────────────────

/// Read one HTTP request (headers plus `Content-Length` body).
async fn read_request(stream: &mut tokio::net::TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed early");
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_string();
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            return (head, buf[end + 4..end + 4 + length].to_vec());
        }
    }
}

#[tokio::test]
async fn test_http_transport_roundtrip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = sphere_response(&[]);

    let server = tokio::spawn({
        let body = body.clone();
        async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let (head, request_body) = read_request(&mut stream).await;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {RESPONSE_MIME}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.write_all(&body).await.unwrap();
            stream.shutdown().await.unwrap();
            (head, request_body)
        }
    });

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let mut client = RequestClient::new(transport, format!("http://{addr}/FindSurface"))
        .with_byte_order(ByteOrder::Little);
    let points = cloud();
    let result = client
        .fit_points(FeatureType::Sphere, &points, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.feature_type(), FeatureType::Sphere);

    let (head, request_body) = server.await.unwrap();
    assert!(head.starts_with("POST /FindSurface/sphere HTTP/1.1"));
    assert!(head.to_ascii_lowercase().contains("content-type: application/x-findsurface-request"));
    assert_eq!(request_body.len(), 40 + points.len() * 12);
}

#[tokio::test]
async fn test_http_transport_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();
    let mut client = RequestClient::new(transport, format!("http://{addr}"));
    assert!(matches!(
        client.fit_points(FeatureType::Plane, &cloud(), false).await,
        Err(FsError::NoResponse)
    ));
}

#[tokio::test]
async fn test_http_transport_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let mut client = RequestClient::new(transport, format!("http://{addr}"));
    assert!(matches!(
        client.fit_points(FeatureType::Plane, &cloud(), false).await,
        Err(FsError::Request(_))
    ));
}
