//! Offline input: recorded detector output for replay.

pub mod recording;

pub use recording::{load_recording, load_recording_from_reader};
