//! Session orchestration: configuration, per-callback frame building and the
//! two ways of driving the pipeline.
//!
//! - [`HandTrackingSession`] runs detection callbacks and render ticks on one
//!   thread.
//! - [`TrackingSystem`] runs frame building on a worker thread and hands the
//!   newest frame to the render side through [`SharedHandFrame`].

pub mod config;
pub mod detection_worker;
pub mod frame_builder;
pub mod session;
pub mod shared_state;
mod tracking_system;

pub use config::{
    DEFAULT_LABEL_RADIUS, MAX_AUTO_ROTATE_SPEED, TrackingConfig, clamp_speed_percent,
};
pub use detection_worker::{DetectionWorker, DetectionWorkerStats};
pub use frame_builder::FrameBuilder;
pub use session::{HandTrackingSession, SessionStats, within_pointer_radius};
pub use shared_state::{FrameInputs, LatestFrame, SharedHandFrame};
pub use tracking_system::TrackingSystem;
