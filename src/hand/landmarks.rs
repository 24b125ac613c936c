//! Hand landmark layout and per-frame samples.
//!
//! A detector reports 21 normalized landmarks per hand: `x`/`y` in `[0, 1]`
//! image space, `z` a relative depth. Indices carry anatomical meaning and
//! follow the usual 21-point hand topology (wrist, then four joints per
//! digit from thumb to pinky).

use nalgebra::Vector3;
use tracing::warn;

use crate::geometry::is_finite;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Landmarks per detected hand.
pub const LANDMARKS_PER_HAND: usize = 21;

/// The pipeline uses at most a primary and a secondary hand.
pub const MAX_HANDS: usize = 2;

/// Floats per hand in the flat detector format (x, y, z interleaved).
const FLOATS_PER_HAND: usize = LANDMARKS_PER_HAND * 3;

/// A normalized 3D landmark.
pub type Landmark = Vector3<f64>;

/// The 21 landmarks of one detected hand for one frame.
///
/// Construction validates that every coordinate is finite, so downstream
/// geometry never sees NaN input from the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct HandSample {
    landmarks: [Landmark; LANDMARKS_PER_HAND],
}

impl HandSample {
    /// Returns `None` if any coordinate is non-finite.
    pub fn new(landmarks: [Landmark; LANDMARKS_PER_HAND]) -> Option<Self> {
        if landmarks.iter().all(is_finite) {
            Some(Self { landmarks })
        } else {
            None
        }
    }

    /// Builds a sample from a slice that must hold exactly 21 landmarks.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let landmarks: [Landmark; LANDMARKS_PER_HAND] = points.try_into().ok()?;
        Self::new(landmarks)
    }

    /// Landmark at an anatomical index (see the index constants).
    ///
    /// # Panics
    /// If `index >= 21`.
    #[inline]
    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARKS_PER_HAND] {
        &self.landmarks
    }
}

/// Parses the flat detector buffer: `num_hands × 21 × (x, y, z)` floats.
///
/// Hands that are truncated or contain non-finite values are dropped; at most
/// [`MAX_HANDS`] are returned, in input order.
pub fn parse_flat_hands(flat: &[f32], num_hands: usize) -> Vec<HandSample> {
    let requested = num_hands.min(MAX_HANDS);
    if num_hands > MAX_HANDS {
        warn!("Detector reported {} hands; keeping the first {}", num_hands, MAX_HANDS);
    }

    let mut hands = Vec::with_capacity(requested);
    for h in 0..requested {
        let start = h * FLOATS_PER_HAND;
        let Some(chunk) = flat.get(start..start + FLOATS_PER_HAND) else {
            warn!(
                "Landmark buffer truncated: {} floats, hand {} needs {}",
                flat.len(),
                h,
                start + FLOATS_PER_HAND
            );
            break;
        };

        let mut landmarks = [Landmark::zeros(); LANDMARKS_PER_HAND];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            *lm = Vector3::new(
                chunk[i * 3] as f64,
                chunk[i * 3 + 1] as f64,
                chunk[i * 3 + 2] as f64,
            );
        }

        match HandSample::new(landmarks) {
            Some(sample) => hands.push(sample),
            None => warn!("Dropping hand {} with non-finite landmarks", h),
        }
    }
    hands
}

/// One detector callback: zero, one or two hands observed at a timestamp.
///
/// `sequence` increases by one per callback and defines frame order; hand
/// order inside `hands` is only meaningful for this frame (index 0 is the
/// primary hand, there is no identity across frames).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBatch {
    pub sequence: u64,
    pub timestamp_ns: u64,
    pub hands: Vec<HandSample>,
}

impl DetectionBatch {
    pub fn new(sequence: u64, timestamp_ns: u64, hands: Vec<HandSample>) -> Self {
        Self {
            sequence,
            timestamp_ns,
            hands,
        }
    }

    /// A callback in which nothing was detected.
    pub fn empty(sequence: u64, timestamp_ns: u64) -> Self {
        Self::new(sequence, timestamp_ns, Vec::new())
    }

    pub fn primary(&self) -> Option<&HandSample> {
        self.hands.first()
    }

    pub fn secondary(&self) -> Option<&HandSample> {
        self.hands.get(1)
    }
}
