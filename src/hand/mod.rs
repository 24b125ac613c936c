//! Per-hand measurement: landmark layout, pinch gesture, palm centroid and
//! instantaneous orientation.

pub mod gesture;
pub mod landmarks;
pub mod orientation;

pub use gesture::{PINCH_THRESHOLD, compute_centroid, detect_pinch, pinch_distance};
pub use landmarks::{
    DetectionBatch, HandSample, INDEX_MCP, INDEX_TIP, LANDMARKS_PER_HAND, Landmark, MAX_HANDS,
    MIDDLE_MCP, PINKY_MCP, THUMB_TIP, WRIST, parse_flat_hands,
};
pub use orientation::{estimate_orientation, hand_basis};
