//! fsweb entry point.
//!
//! ```text
//! fsweb --points cloud.xyz --type sphere          Fit along the default ray
//! fsweb --points cloud.xyz --origin 0,1,0 --direction 0,0,-1
//! fsweb --config <path>                           Load a custom config TOML
//! fsweb --gen-config                              Write default config to stdout
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use glam::{Mat4, Vec3};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fsweb_cli::config::AppConfig;
use fsweb_cli::report::FitReport;
use fsweb_core::export::export_file_name;
use fsweb_core::{
    FeatureType, FitSession, PickRequest, PointCloudBuffer, RequestClient, SearchLevel,
    SearchParams, read_xyz, write_xyz,
};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fsweb", about = "Fit a geometric primitive to a point cloud")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "fsweb.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Point cloud in `.xyz` format.
    #[arg(short, long, required_unless_present = "gen_config")]
    points: Option<PathBuf>,

    /// Primitive to search for: plane, sphere, cylinder, cone, torus.
    #[arg(short = 't', long = "type", default_value = "plane")]
    feature: FeatureType,

    /// Ray origin as `x,y,z`.
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
    origin: Vec3,

    /// Ray direction as `x,y,z`.
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,-1")]
    direction: Vec3,

    /// Persisted search parameters; created on first run.
    #[arg(long, default_value = "fsweb-params.toml")]
    params: PathBuf,

    /// Override the measurement accuracy (metres).
    #[arg(long)]
    accuracy: Option<f32>,

    /// Override the mean point distance (metres).
    #[arg(long)]
    mean_distance: Option<f32>,

    /// Override the lateral extension level (0-10).
    #[arg(long)]
    lateral: Option<u8>,

    /// Override the radial expansion level (0-10).
    #[arg(long)]
    radial: Option<u8>,

    /// Write the inlier points to this `.xyz` file.
    #[arg(long)]
    inliers_out: Option<PathBuf>,

    /// Save the loaded cloud as `points_<timestamp>.xyz` in this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {s:?}")),
    }
}

/// Camera at `origin` looking along `direction`.
fn camera_to_world(origin: Vec3, direction: Vec3) -> Mat4 {
    let dir = direction.normalize_or(Vec3::NEG_Z);
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_to_rh(origin, dir, up).inverse()
}

fn search_params(cli: &Cli, config: &AppConfig) -> SearchParams {
    let mut params = if cli.params.exists() {
        SearchParams::load(&cli.params)
    } else {
        config.search
    };
    if let Some(v) = cli.accuracy {
        params.measurement_accuracy = v;
    }
    if let Some(v) = cli.mean_distance {
        params.mean_distance = v;
    }
    if let Some(v) = cli.lateral {
        params.lateral_extension = SearchLevel::clamped(v);
    }
    if let Some(v) = cli.radial {
        params.radial_expansion = SearchLevel::clamped(v);
    }
    params
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&AppConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let config = AppConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("fsweb v{}", env!("CARGO_PKG_VERSION"));
    info!("service: {}", config.service.base_url);

    // Load points into a capacity-bounded buffer.
    let Some(points_path) = cli.points.as_deref() else {
        return Err("--points is required".into());
    };
    let points = read_xyz(BufReader::new(File::open(points_path)?))?;
    let mut buffer = PointCloudBuffer::new(config.accumulator.capacity);
    buffer.extend(points.iter().copied());
    if buffer.len() < points.len() {
        warn!(
            "{} points exceed capacity {}; keeping the most recent",
            points.len(),
            buffer.capacity()
        );
    }
    let snapshot = buffer.snapshot();
    info!("loaded {} points from {}", snapshot.len(), points_path.display());

    if let Some(dir) = &cli.export_dir {
        let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let path = dir.join(export_file_name(stamp));
        write_xyz(std::io::BufWriter::new(File::create(&path)?), &snapshot)?;
        info!("exported points to {}", path.display());
    }

    // Build the pick ray and radii from the virtual camera.
    let pick = PickRequest::screen_center(
        &camera_to_world(cli.origin, cli.direction),
        &config.camera.projection(),
        config.camera.viewport(),
        &config.picking,
    );

    let params = search_params(&cli, &config);
    info!(
        "params: accuracy={} mean_distance={} lateral={} radial={}",
        params.measurement_accuracy,
        params.mean_distance,
        params.lateral_extension,
        params.radial_expansion
    );

    let client = RequestClient::http(config.service.base_url.clone(), config.timeout())?;
    let session = FitSession::new(client, params);

    let started = Instant::now();
    let outcome = session.run(cli.feature, &snapshot, &pick).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // Persist parameters even when the fit failed.
    if let Err(e) = params.save(&cli.params) {
        warn!("could not save params to {}: {e}", cli.params.display());
    }
    let outcome = outcome?;

    if let (Some(path), Some(found)) = (&cli.inliers_out, &outcome) {
        write_xyz(std::io::BufWriter::new(File::create(path)?), &found.inliers)?;
        info!("wrote {} inliers to {}", found.inliers.len(), path.display());
    }

    let report = FitReport::new(cli.feature, outcome.as_ref(), snapshot.len(), elapsed_ms);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
