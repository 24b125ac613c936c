//! Latest-frame handoff between the detection worker and the render thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::tracking::{CombinerParams, HandFrame, WorldScaleContext};

/// Newest frame published by the detection worker.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestFrame {
    /// Sequence of the detection batch the frame was built from.
    pub sequence: u64,

    /// `None` when that batch contained no hand.
    pub frame: Option<HandFrame>,
}

/// Frame-building inputs owned by the render side.
///
/// Read by the worker before every batch, so an update is never lost to a
/// full detection queue.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInputs {
    pub world_scale: WorldScaleContext,
    pub params: CombinerParams,
}

/// State shared by the detection worker and the render side.
pub struct SharedHandFrame {
    /// Only ever replaced by a frame with a higher sequence.
    latest: Mutex<Option<LatestFrame>>,

    /// Latest viewport and combiner thresholds.
    inputs: Mutex<FrameInputs>,

    /// Request the detection worker to exit.
    shutdown_requested: AtomicBool,
}

impl SharedHandFrame {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_inputs(inputs: FrameInputs) -> Arc<Self> {
        Arc::new(Self {
            inputs: Mutex::new(inputs),
            ..Self::default()
        })
    }

    /// Store `frame` if `sequence` is newer than the stored one.
    ///
    /// Returns whether the frame was stored.
    pub fn publish(&self, sequence: u64, frame: Option<HandFrame>) -> bool {
        let mut latest = self.latest.lock();
        if latest.as_ref().is_some_and(|l| l.sequence >= sequence) {
            return false;
        }
        *latest = Some(LatestFrame { sequence, frame });
        true
    }

    /// Copy of the newest published frame.
    pub fn latest(&self) -> Option<LatestFrame> {
        self.latest.lock().clone()
    }

    pub fn latest_sequence(&self) -> Option<u64> {
        self.latest.lock().as_ref().map(|l| l.sequence)
    }

    pub fn frame_inputs(&self) -> FrameInputs {
        *self.inputs.lock()
    }

    pub fn set_world_scale(&self, world_scale: WorldScaleContext) {
        self.inputs.lock().world_scale = world_scale;
    }

    pub fn set_combiner_params(&self, params: CombinerParams) {
        self.inputs.lock().params = params;
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for SharedHandFrame {
    fn default() -> Self {
        Self {
            latest: Mutex::new(None),
            inputs: Mutex::new(FrameInputs::default()),
            shutdown_requested: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};

    fn frame(x: f64) -> HandFrame {
        HandFrame::single_hand(Vector3::new(x, 0.0, 0.0), UnitQuaternion::identity(), false)
    }

    #[test]
    fn test_publish_keeps_newest() {
        let shared = SharedHandFrame::new();
        assert!(shared.latest().is_none());

        assert!(shared.publish(2, Some(frame(2.0))));
        assert!(!shared.publish(1, Some(frame(1.0))));
        assert!(!shared.publish(2, None));

        let latest = shared.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.frame, Some(frame(2.0)));

        assert!(shared.publish(3, None));
        assert_eq!(shared.latest_sequence(), Some(3));
        assert!(shared.latest().unwrap().frame.is_none());
    }

    #[test]
    fn test_concurrent_publishers_keep_max_sequence() {
        let shared = SharedHandFrame::new();
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for i in 0..250u64 {
                        shared.publish(i * 4 + t, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.latest_sequence(), Some(999));
    }

    #[test]
    fn test_frame_inputs_last_write_wins() {
        let shared = SharedHandFrame::with_inputs(FrameInputs {
            world_scale: WorldScaleContext::new(4.0, 3.0),
            ..Default::default()
        });
        assert_eq!(shared.frame_inputs().world_scale, WorldScaleContext::new(4.0, 3.0));

        shared.set_world_scale(WorldScaleContext::new(8.0, 6.0));
        shared.set_combiner_params(CombinerParams {
            pinch_threshold: 0.1,
            deadzone: 0.3,
        });
        let inputs = shared.frame_inputs();
        assert_eq!(inputs.world_scale, WorldScaleContext::new(8.0, 6.0));
        assert_eq!(inputs.params.pinch_threshold, 0.1);
        assert_eq!(inputs.params.deadzone, 0.3);
    }

    #[test]
    fn test_shutdown_flag() {
        let shared = SharedHandFrame::new();
        assert!(!shared.is_shutdown_requested());
        shared.request_shutdown();
        assert!(shared.is_shutdown_requested());
    }
}
