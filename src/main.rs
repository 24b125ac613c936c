use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use hand_pose::io::load_recording;
use hand_pose::system::{HandTrackingSession, TrackingConfig};
use hand_pose::tracking::WorldScaleContext;

/// Camera distance and vertical field of view of the replay viewport.
const CAMERA_DISTANCE: f64 = 10.0;
const VERTICAL_FOV_DEG: f64 = 50.0;
const ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Print the pose every this many frames.
const REPORT_EVERY: usize = 30;

fn replay_world_scale() -> WorldScaleContext {
    let height = 2.0 * CAMERA_DISTANCE * (VERTICAL_FOV_DEG.to_radians() / 2.0).tan();
    WorldScaleContext::new(height * ASPECT_RATIO, height)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let recording_path = args
        .next()
        .context("usage: hand-pose-replay <recording.csv> [config.yaml]")?;
    let config = match args.next() {
        Some(path) => TrackingConfig::from_yaml_file(&path)?,
        None => TrackingConfig::default(),
    };

    println!("Loading recording from: {}", recording_path);
    let batches = load_recording(&recording_path)?;
    println!("Loaded {} detection frames", batches.len());

    let mut session = HandTrackingSession::with_world_scale(config, replay_world_scale());
    let mut last_ts: Option<u64> = None;

    for (i, batch) in batches.iter().enumerate() {
        let elapsed = last_ts.map_or(0.0, |t| batch.timestamp_ns.saturating_sub(t) as f64 * 1e-9);
        last_ts = Some(batch.timestamp_ns);

        session.on_detections(batch);
        let pose = session.tick(elapsed);

        if i % REPORT_EVERY == 0 {
            let (roll, pitch, yaw) = pose.rotation.euler_angles();
            println!(
                "Frame {} (ts={}): hands={} pos=[{:.3}, {:.3}, {:.3}] \
                 rpy=[{:.3}, {:.3}, {:.3}] scale={:.3}",
                i,
                batch.timestamp_ns,
                batch.hands.len(),
                pose.position.x,
                pose.position.y,
                pose.position.z,
                roll,
                pitch,
                yaw,
                pose.scale
            );
        }
    }

    let stats = session.stats();
    let pose = session.pose();
    println!(
        "Done. frames={} with_hand={} dropped={} ticks={}",
        stats.frames_received, stats.frames_with_hand, stats.dropped_out_of_order, stats.ticks
    );
    println!(
        "Final pose: pos=[{:.3}, {:.3}, {:.3}] rotation_angle={:.3} scale={:.3}",
        pose.position.x,
        pose.position.y,
        pose.position.z,
        pose.rotation.angle(),
        pose.scale
    );

    Ok(())
}
