//! Detection worker: builds hand frames off the render thread.
//!
//! The worker receives [`DetectionBatch`]es, turns each one into a
//! [`crate::tracking::HandFrame`] with its own [`FrameBuilder`] and publishes
//! the result to [`SharedHandFrame`], where the render side picks it up.
//! Viewport and threshold changes arrive through the shared state, not the
//! channel.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::hand::DetectionBatch;

use super::frame_builder::FrameBuilder;
use super::shared_state::SharedHandFrame;

/// Timeout for receiving batches. Allows periodic shutdown checks.
const RECV_TIMEOUT: Duration = Duration::from_millis(50);

/// Statistics for the detection worker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetectionWorkerStats {
    /// Batches turned into frames and published.
    pub batches_processed: usize,

    /// Batches whose sequence was not newer than the last processed one.
    pub dropped_out_of_order: usize,
}

/// Detection thread state.
pub struct DetectionWorker {
    builder: FrameBuilder,
    shared: Arc<SharedHandFrame>,
    last_sequence: Option<u64>,
    stats: DetectionWorkerStats,
}

impl DetectionWorker {
    pub fn new(shared: Arc<SharedHandFrame>) -> Self {
        let inputs = shared.frame_inputs();
        Self {
            builder: FrameBuilder::new(inputs.params, inputs.world_scale),
            shared,
            last_sequence: None,
            stats: DetectionWorkerStats::default(),
        }
    }

    pub fn stats(&self) -> &DetectionWorkerStats {
        &self.stats
    }

    /// Main thread loop.
    ///
    /// Runs until shutdown is requested or every sender is dropped.
    pub fn run(&mut self, receiver: Receiver<DetectionBatch>) {
        info!("Detection worker started");

        loop {
            if self.shared.is_shutdown_requested() {
                break;
            }

            match receiver.recv_timeout(RECV_TIMEOUT) {
                Ok(batch) => self.process_batch(&batch),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Detection channel disconnected");
                    break;
                }
            }
        }

        info!(
            "Detection worker exiting. Stats: processed={}, dropped_out_of_order={}",
            self.stats.batches_processed, self.stats.dropped_out_of_order
        );
    }

    /// Build and publish the frame for one batch, using the current
    /// viewport and thresholds.
    pub fn process_batch(&mut self, batch: &DetectionBatch) {
        if let Some(last) = self.last_sequence {
            if batch.sequence <= last {
                warn!(
                    "Dropping out-of-order detection batch {} (last processed {})",
                    batch.sequence, last
                );
                self.stats.dropped_out_of_order += 1;
                return;
            }
        }
        self.last_sequence = Some(batch.sequence);

        let inputs = self.shared.frame_inputs();
        self.builder.set_world_scale(inputs.world_scale);
        self.builder.set_params(inputs.params);

        let frame = self.builder.build(&batch.hands);
        self.shared.publish(batch.sequence, frame);
        self.stats.batches_processed += 1;
    }
}
