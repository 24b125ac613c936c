//! Single-threaded hand tracking session.
//!
//! `HandTrackingSession` is the sole owner of the filtered pose. Detector
//! callbacks and render ticks are its only two inputs and must be delivered
//! from the same thread (or serialized by the caller). For detection running
//! on another thread see [`super::TrackingSystem`].

use anyhow::Result;
use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::hand::DetectionBatch;
use crate::tracking::{
    HandFrame, SessionState, SmoothedPose, TemporalSmoother, WorldScaleContext,
};

use super::config::TrackingConfig;
use super::frame_builder::FrameBuilder;

/// Counters for a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Detector callbacks received, including dropped ones.
    pub frames_received: usize,

    /// Applied callbacks that contained at least one hand.
    pub frames_with_hand: usize,

    /// Callbacks dropped because their sequence was not newer.
    pub dropped_out_of_order: usize,

    /// Render ticks that advanced the pose.
    pub ticks: usize,
}

/// Returns whether `point` lies within `radius` of `pointer`.
///
/// `None` pointer (no secondary hand) is never within range.
#[inline]
pub fn within_pointer_radius(
    pointer: Option<&Vector3<f64>>,
    point: &Vector3<f64>,
    radius: f64,
) -> bool {
    pointer.is_some_and(|p| (point - p).norm() < radius)
}

/// Hand-driven object pose for one viewer session.
pub struct HandTrackingSession {
    config: TrackingConfig,
    builder: FrameBuilder,
    smoother: TemporalSmoother,

    /// Frame from the newest applied callback; `None` means no hand.
    latest: Option<HandFrame>,
    last_sequence: Option<u64>,

    state: SessionState,
    stats: SessionStats,
}

impl HandTrackingSession {
    pub fn new(config: TrackingConfig) -> Self {
        Self::with_world_scale(config, WorldScaleContext::default())
    }

    pub fn with_world_scale(config: TrackingConfig, world_scale: WorldScaleContext) -> Self {
        let builder = FrameBuilder::new(config.combiner_params(), world_scale);
        Self {
            config,
            builder,
            smoother: TemporalSmoother::new(),
            latest: None,
            last_sequence: None,
            state: SessionState::default(),
            stats: SessionStats::default(),
        }
    }

    /// Apply one detector callback.
    ///
    /// Batches whose sequence is not strictly newer than the last applied
    /// one are dropped. Ignored entirely while paused.
    pub fn on_detections(&mut self, batch: &DetectionBatch) {
        self.stats.frames_received += 1;

        if self.state == SessionState::Paused {
            return;
        }

        if let Some(last) = self.last_sequence {
            if batch.sequence <= last {
                warn!(
                    "Dropping out-of-order detection batch {} (last applied {})",
                    batch.sequence, last
                );
                self.stats.dropped_out_of_order += 1;
                return;
            }
        }
        self.last_sequence = Some(batch.sequence);

        self.latest = self.builder.build(&batch.hands);
        if self.latest.is_some() {
            self.stats.frames_with_hand += 1;
        }
    }

    /// Advance the pose by `elapsed` seconds. No-op while paused.
    pub fn tick(&mut self, elapsed: f64) -> &SmoothedPose {
        if self.state == SessionState::Paused {
            return self.smoother.pose();
        }

        self.stats.ticks += 1;
        let settings = self.config.smoother_settings();
        let is_visible = self.latest.is_some();
        self.smoother
            .advance(self.latest.as_ref(), is_visible, elapsed, &settings)
    }

    pub fn set_world_scale(&mut self, world_scale: WorldScaleContext) {
        debug!(
            "World scale set to ({:.3}, {:.3})",
            world_scale.scale_x, world_scale.scale_y
        );
        self.builder.set_world_scale(world_scale);
    }

    /// Sleep mode. The pose and the last frame are kept as they are.
    pub fn pause(&mut self) {
        if self.state != SessionState::Paused {
            info!("Hand tracking paused");
            self.state = SessionState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state != SessionState::Active {
            info!("Hand tracking resumed");
            self.state = SessionState::Active;
        }
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.config.auto_rotate_enabled = enabled;
    }

    pub fn set_auto_rotate_speed(&mut self, percent: u8) {
        self.config.set_auto_rotate_speed(percent);
    }

    /// Ignored (with a warning) when negative or non-finite.
    pub fn set_base_object_scale(&mut self, scale: f64) {
        self.config.set_base_object_scale(scale);
    }

    /// Replace the whole configuration, e.g. after the config file changed.
    ///
    /// Thresholds apply from the next detector callback. On error the
    /// current configuration is kept.
    pub fn reconfigure(&mut self, config: TrackingConfig) -> Result<()> {
        let config = config.validated()?;
        self.builder.set_params(config.combiner_params());
        self.config = config;
        info!("Tracking configuration reloaded");
        Ok(())
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn pose(&self) -> &SmoothedPose {
        self.smoother.pose()
    }

    pub fn latest_frame(&self) -> Option<&HandFrame> {
        self.latest.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Whether a world point is within `radius` of the secondary pointer.
    pub fn proximity_query(&self, point: &Vector3<f64>, radius: f64) -> bool {
        within_pointer_radius(self.pointer(), point, radius)
    }

    /// Distance from a world point to the secondary pointer, if any.
    pub fn pointer_distance(&self, point: &Vector3<f64>) -> Option<f64> {
        self.pointer().map(|p| (point - p).norm())
    }

    /// World position of an object sub-part given its local offset.
    ///
    /// Translation and uniform scale only; the object rotation is not applied.
    pub fn part_world_position(&self, local: &Vector3<f64>) -> Vector3<f64> {
        let pose = self.smoother.pose();
        pose.position + local * pose.scale
    }

    /// Indices of `parts` (local offsets) whose world position is within the
    /// configured label radius of the secondary pointer.
    pub fn labelled_parts(&self, parts: &[Vector3<f64>]) -> Vec<usize> {
        self.labelled_parts_within(parts, self.config.label_radius)
    }

    pub fn labelled_parts_within(&self, parts: &[Vector3<f64>], radius: f64) -> Vec<usize> {
        let Some(pointer) = self.pointer() else {
            return Vec::new();
        };
        parts
            .iter()
            .enumerate()
            .filter(|(_, local)| {
                within_pointer_radius(Some(pointer), &self.part_world_position(local), radius)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn pointer(&self) -> Option<&Vector3<f64>> {
        self.latest.as_ref().and_then(|f| f.secondary_pointer.as_ref())
    }
}

impl Default for HandTrackingSession {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{
        HandSample, INDEX_MCP, INDEX_TIP, LANDMARKS_PER_HAND, Landmark, MIDDLE_MCP, PINKY_MCP,
        THUMB_TIP, WRIST,
    };
    use approx::assert_relative_eq;

    const DT: f64 = 1.0 / 60.0;

    /// Palm centroid at `(cx, cy)`, forward = +y, side = +x.
    fn hand_at(cx: f64, cy: f64, pinched: bool) -> HandSample {
        let mut lm = [Landmark::new(cx, cy, 0.0); LANDMARKS_PER_HAND];
        lm[WRIST] = Landmark::new(cx, cy - 0.1, 0.0);
        lm[MIDDLE_MCP] = Landmark::new(cx, cy + 0.1, 0.0);
        lm[INDEX_MCP] = Landmark::new(cx - 0.05, cy + 0.05, 0.0);
        lm[PINKY_MCP] = Landmark::new(cx + 0.05, cy + 0.05, 0.0);
        lm[THUMB_TIP] = Landmark::new(cx, cy + 0.2, 0.0);
        let gap = if pinched { 0.02 } else { 0.1 };
        lm[INDEX_TIP] = Landmark::new(cx + gap, cy + 0.2, 0.0);
        HandSample::new(lm).unwrap()
    }

    fn batch(sequence: u64, hands: Vec<HandSample>) -> DetectionBatch {
        DetectionBatch::new(sequence, sequence * 33_000_000, hands)
    }

    fn session_10x10() -> HandTrackingSession {
        let world_scale = WorldScaleContext::new(10.0, 10.0);
        HandTrackingSession::with_world_scale(TrackingConfig::default(), world_scale)
    }

    #[test]
    fn test_end_to_end_centered_pinch() {
        let mut session = session_10x10();
        session.on_detections(&batch(1, vec![hand_at(0.5, 0.5, true)]));

        let frame = session.latest_frame().unwrap();
        assert!(frame.is_pinched);
        assert_relative_eq!(frame.position, Vector3::zeros(), epsilon = 1e-9);
        assert!(frame.rotation.angle() < 1e-9);

        for _ in 0..300 {
            session.tick(DT);
        }
        let pose = session.pose();
        assert_relative_eq!(pose.position, Vector3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(pose.scale, 1.0, epsilon = 1e-6);
        assert!(pose.rotation.angle() < 1e-6);
    }

    #[test]
    fn test_pinched_hand_drags_object() {
        let mut session = session_10x10();
        // centroid x = 0.4 -> world x = 1.0
        session.on_detections(&batch(1, vec![hand_at(0.4, 0.5, true)]));
        for _ in 0..300 {
            session.tick(DT);
        }
        assert_relative_eq!(session.pose().position.x, 1.0, epsilon = 1e-3);

        // release and move away: object stays
        let held = session.pose().position;
        session.on_detections(&batch(2, vec![hand_at(0.0, 0.5, false)]));
        for _ in 0..100 {
            session.tick(DT);
        }
        assert_eq!(session.pose().position, held);
    }

    #[test]
    fn test_hand_loss_collapses_scale() {
        let mut session = session_10x10();
        session.on_detections(&batch(1, vec![hand_at(0.5, 0.5, false)]));
        for _ in 0..120 {
            session.tick(DT);
        }
        let rotation = session.pose().rotation;

        session.on_detections(&batch(2, Vec::new()));
        assert!(session.latest_frame().is_none());
        for _ in 0..600 {
            session.tick(DT);
        }
        assert!(session.pose().scale < 1e-6);
        assert!(session.pose().scale >= 0.0);
        assert_eq!(session.pose().rotation, rotation);
    }

    #[test]
    fn test_out_of_order_batches_dropped() {
        let mut session = session_10x10();
        session.on_detections(&batch(5, vec![hand_at(0.5, 0.5, true)]));
        session.on_detections(&batch(4, Vec::new()));
        session.on_detections(&batch(5, Vec::new()));

        assert!(session.latest_frame().is_some());
        assert_eq!(session.stats().frames_received, 3);
        assert_eq!(session.stats().dropped_out_of_order, 2);
        assert_eq!(session.stats().frames_with_hand, 1);

        session.on_detections(&batch(6, Vec::new()));
        assert!(session.latest_frame().is_none());
    }

    #[test]
    fn test_pause_holds_pose() {
        let mut session = session_10x10();
        session.on_detections(&batch(1, vec![hand_at(0.4, 0.5, true)]));
        for _ in 0..30 {
            session.tick(DT);
        }

        session.pause();
        assert_eq!(session.state(), SessionState::Paused);
        let held = session.pose().clone();
        session.on_detections(&batch(2, Vec::new()));
        for _ in 0..60 {
            session.tick(DT);
        }
        assert_eq!(session.pose(), &held);
        assert!(session.latest_frame().is_some());
        assert_eq!(session.stats().ticks, 30);

        session.resume();
        assert_eq!(session.state(), SessionState::Active);
        // first tick after resume moves by one small step, not a jump
        let before = session.pose().position;
        session.tick(DT);
        assert!((session.pose().position - before).norm() < 0.5);
    }

    #[test]
    fn test_autorotate_setters() {
        let mut session = session_10x10();
        session.set_auto_rotate(true);
        session.set_auto_rotate_speed(200);
        assert_eq!(session.config().auto_rotate_speed_percent, 100);

        session.on_detections(&batch(1, vec![hand_at(0.5, 0.5, false)]));
        session.tick(0.5);
        // 0.5 s * 100 % * 0.02
        assert_relative_eq!(session.pose().auto_rotation_y, 1.0, epsilon = 1e-12);

        session.set_base_object_scale(-1.0);
        assert_eq!(session.config().base_object_scale, 1.0);
        session.set_base_object_scale(3.0);
        assert_eq!(session.config().base_object_scale, 3.0);
    }

    #[test]
    fn test_reconfigure_applies_thresholds() {
        let mut session = session_10x10();
        session.on_detections(&batch(1, vec![hand_at(0.5, 0.5, true)]));
        assert!(session.latest_frame().unwrap().is_pinched);

        let tighter = TrackingConfig {
            pinch_threshold: 0.01,
            auto_rotate_speed_percent: 150,
            ..Default::default()
        };
        session.reconfigure(tighter).unwrap();
        assert_eq!(session.config().auto_rotate_speed_percent, 100);
        session.on_detections(&batch(2, vec![hand_at(0.5, 0.5, true)]));
        assert!(!session.latest_frame().unwrap().is_pinched);

        let broken = TrackingConfig {
            deadzone: f64::NAN,
            ..Default::default()
        };
        assert!(session.reconfigure(broken).is_err());
        assert_eq!(session.config().pinch_threshold, 0.01);
    }

    #[test]
    fn test_world_scale_update_applies_to_next_frame() {
        let mut session = session_10x10();
        session.set_world_scale(WorldScaleContext::new(20.0, 10.0));
        session.on_detections(&batch(1, vec![hand_at(0.4, 0.5, false)]));
        assert_relative_eq!(session.latest_frame().unwrap().position.x, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_proximity_and_labels() {
        let mut session = session_10x10();
        assert!(!session.proximity_query(&Vector3::zeros(), 100.0));
        assert!(session.labelled_parts(&[Vector3::zeros()]).is_empty());

        // secondary index tip at (0.8, 0.7) -> pointer (-3, -2)
        session.on_detections(&batch(
            1,
            vec![hand_at(0.5, 0.5, true), hand_at(0.7, 0.5, false)],
        ));
        for _ in 0..300 {
            session.tick(DT);
        }
        let pointer = session.latest_frame().unwrap().secondary_pointer.unwrap();
        assert_relative_eq!(pointer, Vector3::new(-3.0, -2.0, 0.0), epsilon = 1e-9);

        assert!(session.proximity_query(&Vector3::new(-3.0, -2.2, 0.0), 0.5));
        assert!(!session.proximity_query(&Vector3::zeros(), 1.5));
        assert_relative_eq!(
            session.pointer_distance(&Vector3::new(-3.0, 0.0, 0.0)).unwrap(),
            2.0,
            epsilon = 1e-9
        );

        // hands 0.2 apart -> zoom 0.6, object stays at the origin
        assert_relative_eq!(session.pose().scale, 0.6, epsilon = 1e-6);
        let parts = [
            Vector3::new(-5.0, -3.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(-4.0, -4.0, 0.0),
            Vector3::new(-8.0, -3.0, 0.0),
        ];
        assert_eq!(session.labelled_parts(&parts), vec![0, 2]);
        assert_eq!(session.labelled_parts_within(&parts, 2.0), vec![0, 2, 3]);
    }

    #[test]
    fn test_part_world_position() {
        let mut session = HandTrackingSession::default();
        session.on_detections(&batch(1, vec![hand_at(0.5, 0.5, false)]));
        for _ in 0..300 {
            session.tick(DT);
        }
        let local = Vector3::new(1.0, 2.0, 3.0);
        let world = session.part_world_position(&local);
        let pose = session.pose();
        assert_relative_eq!(world, pose.position + local * pose.scale, epsilon = 1e-12);
        assert_relative_eq!(world, local, epsilon = 1e-6);
    }
}
