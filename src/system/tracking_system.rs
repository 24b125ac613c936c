//! Tracking system with detection on its own thread.
//!
//! The `TrackingSystem` owns the shared frame handoff, the detection worker
//! thread and the render-side smoother. Detector callbacks go in through
//! [`TrackingSystem::submit`]; the render loop calls [`TrackingSystem::tick`].
//! Viewport and threshold changes are written straight to the shared state,
//! so they never compete with batches for queue slots.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::hand::DetectionBatch;
use crate::tracking::{
    HandFrame, SessionState, SmoothedPose, TemporalSmoother, WorldScaleContext,
};

use super::config::TrackingConfig;
use super::detection_worker::DetectionWorker;
use super::session::within_pointer_radius;
use super::shared_state::{FrameInputs, LatestFrame, SharedHandFrame};

/// Capacity of the detection channel. When full, new batches are dropped.
const DETECTION_CHANNEL_CAPACITY: usize = 4;

/// Hand tracking with detection processed off the render thread.
pub struct TrackingSystem {
    shared: Arc<SharedHandFrame>,

    /// Taken on shutdown so the worker sees a closed channel.
    sender: Option<Sender<DetectionBatch>>,

    worker_handle: Option<JoinHandle<()>>,

    config: TrackingConfig,
    smoother: TemporalSmoother,
    state: SessionState,

    /// Frame read from the handoff on the last tick.
    current: Option<LatestFrame>,
}

impl TrackingSystem {
    /// Create the shared state and spawn the detection worker.
    pub fn new(config: TrackingConfig) -> Result<Self> {
        Self::with_world_scale(config, WorldScaleContext::default())
    }

    pub fn with_world_scale(
        config: TrackingConfig,
        world_scale: WorldScaleContext,
    ) -> Result<Self> {
        let config = config.validated()?;
        let shared = SharedHandFrame::with_inputs(FrameInputs {
            world_scale,
            params: config.combiner_params(),
        });
        let (sender, receiver) = bounded::<DetectionBatch>(DETECTION_CHANNEL_CAPACITY);

        let worker_handle = Self::spawn_worker(Arc::clone(&shared), receiver)?;

        Ok(Self {
            shared,
            sender: Some(sender),
            worker_handle: Some(worker_handle),
            config,
            smoother: TemporalSmoother::new(),
            state: SessionState::default(),
            current: None,
        })
    }

    fn spawn_worker(
        shared: Arc<SharedHandFrame>,
        receiver: Receiver<DetectionBatch>,
    ) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("hand-detection".into())
            .spawn(move || {
                let mut worker = DetectionWorker::new(shared);
                worker.run(receiver);
            })
            .context("Failed to spawn detection worker thread")
    }

    /// Queue a detector callback without blocking.
    ///
    /// Returns `false` when the batch was dropped (paused, queue full or
    /// shut down).
    pub fn submit(&self, batch: DetectionBatch) -> bool {
        if self.state == SessionState::Paused {
            return false;
        }
        let Some(sender) = self.sender.as_ref() else {
            debug!("Tracking system shut down, ignoring batch {}", batch.sequence);
            return false;
        };
        match sender.try_send(batch) {
            Ok(()) => true,
            Err(TrySendError::Full(batch)) => {
                warn!("Detection queue full, dropping batch {}", batch.sequence);
                false
            }
            Err(TrySendError::Disconnected(batch)) => {
                warn!("Detection worker gone, dropping batch {}", batch.sequence);
                false
            }
        }
    }

    /// Change the viewport mapping. The worker picks it up on the next batch
    /// it processes, whether or not the queue is full.
    pub fn set_world_scale(&self, world_scale: WorldScaleContext) {
        debug!(
            "World scale set to ({:.3}, {:.3})",
            world_scale.scale_x, world_scale.scale_y
        );
        self.shared.set_world_scale(world_scale);
    }

    /// Replace the whole configuration. On error the current one is kept.
    pub fn reconfigure(&mut self, config: TrackingConfig) -> Result<()> {
        let config = config.validated()?;
        self.shared.set_combiner_params(config.combiner_params());
        self.config = config;
        info!("Tracking configuration reloaded");
        Ok(())
    }

    /// Sleep mode. Batches are refused and ticks hold the pose.
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

    /// Advance the pose using the newest published frame. Holds the pose
    /// while paused.
    pub fn tick(&mut self, elapsed: f64) -> SmoothedPose {
        if self.state == SessionState::Paused {
            return self.smoother.pose().clone();
        }

        if let Some(latest) = self.shared.latest() {
            self.current = Some(latest);
        }
        let settings = self.config.smoother_settings();
        let frame = self.current.as_ref().and_then(|l| l.frame.as_ref());
        self.smoother
            .advance(frame, frame.is_some(), elapsed, &settings)
            .clone()
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pose(&self) -> &SmoothedPose {
        self.smoother.pose()
    }

    /// Frame used by the last tick; `None` means no hand.
    pub fn latest_frame(&self) -> Option<&HandFrame> {
        self.current.as_ref().and_then(|l| l.frame.as_ref())
    }

    /// Sequence of the newest frame published by the worker.
    pub fn latest_sequence(&self) -> Option<u64> {
        self.shared.latest_sequence()
    }

    /// Whether a world point is within `radius` of the secondary pointer, as
    /// of the last tick.
    pub fn proximity_query(&self, point: &Vector3<f64>, radius: f64) -> bool {
        let pointer = self.latest_frame().and_then(|f| f.secondary_pointer.as_ref());
        within_pointer_radius(pointer, point, radius)
    }

    /// Stop the detection worker and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.shared.request_shutdown();
        self.sender.take();

        if let Some(handle) = self.worker_handle.take() {
            if handle.join().is_err() {
                warn!("Detection worker panicked");
            }
        }
    }
}

impl Drop for TrackingSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
