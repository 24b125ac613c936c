//! Per-frame tracking: turns hand samples into a [`HandFrame`] and filters
//! successive frames into a [`SmoothedPose`].
//!
//! - `frame`: the per-callback measurement and the image-to-world mapping
//! - `combiner`: primary pose plus secondary-hand differential signals
//! - `smoother`: adaptive, time-based filtering of position/rotation/scale
//! - `state`: active/paused session state

pub mod combiner;
pub mod frame;
pub mod smoother;
pub mod state;

pub use combiner::{
    CombinerParams, DEADZONE, SecondarySignals, apply_deadzone, combine, secondary_signals,
    zoom_from_distance,
};
pub use frame::{HandFrame, MAX_EXTRA_SCALE, MIN_EXTRA_SCALE, WorldScaleContext};
pub use smoother::{SmoothedPose, SmootherSettings, TemporalSmoother, position_gain};
pub use state::SessionState;
