//! Builds one [`HandFrame`] per detector callback.

use nalgebra::UnitQuaternion;
use tracing::debug;

use crate::hand::{HandSample, estimate_orientation};
use crate::tracking::{CombinerParams, HandFrame, WorldScaleContext, combine};

/// Per-callback frame construction with orientation hold.
///
/// When the primary hand's geometry is degenerate the last good orientation
/// is reused, so a NaN rotation never reaches the smoother.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    params: CombinerParams,
    world_scale: WorldScaleContext,
    last_orientation: UnitQuaternion<f64>,
}

impl FrameBuilder {
    pub fn new(params: CombinerParams, world_scale: WorldScaleContext) -> Self {
        Self {
            params,
            world_scale,
            last_orientation: UnitQuaternion::identity(),
        }
    }

    pub fn set_params(&mut self, params: CombinerParams) {
        self.params = params;
    }

    pub fn set_world_scale(&mut self, world_scale: WorldScaleContext) {
        self.world_scale = world_scale;
    }

    /// Last orientation that came from non-degenerate geometry.
    pub fn last_orientation(&self) -> &UnitQuaternion<f64> {
        &self.last_orientation
    }

    /// `None` when no hand was detected. Index 0 is primary, index 1 secondary.
    pub fn build(&mut self, hands: &[HandSample]) -> Option<HandFrame> {
        let primary = hands.first()?;
        let secondary = hands.get(1);

        let rotation = match estimate_orientation(primary) {
            Some(rotation) => {
                self.last_orientation = rotation;
                rotation
            }
            None => {
                debug!("Degenerate primary hand, holding last orientation");
                self.last_orientation
            }
        };

        Some(combine(
            primary,
            secondary,
            rotation,
            &self.world_scale,
            &self.params,
        ))
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new(CombinerParams::default(), WorldScaleContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{INDEX_MCP, LANDMARKS_PER_HAND, Landmark, MIDDLE_MCP, PINKY_MCP, WRIST};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn tilted_hand() -> HandSample {
        let mut lm = [Landmark::new(0.5, 0.5, 0.0); LANDMARKS_PER_HAND];
        lm[WRIST] = Landmark::new(0.5, 0.7, 0.0);
        lm[INDEX_MCP] = Landmark::new(0.42, 0.52, 0.05);
        lm[MIDDLE_MCP] = Landmark::new(0.48, 0.45, 0.02);
        lm[PINKY_MCP] = Landmark::new(0.6, 0.55, -0.03);
        HandSample::new(lm).unwrap()
    }

    fn flat_hand() -> HandSample {
        HandSample::new([Landmark::new(0.4, 0.6, 0.0); LANDMARKS_PER_HAND]).unwrap()
    }

    #[test]
    fn test_no_hands_no_frame() {
        let mut builder = FrameBuilder::default();
        assert!(builder.build(&[]).is_none());
    }

    #[test]
    fn test_degenerate_before_any_is_identity() {
        let mut builder = FrameBuilder::default();
        let frame = builder.build(&[flat_hand()]).unwrap();
        assert_eq!(frame.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_degenerate_holds_last_orientation() {
        let mut builder = FrameBuilder::default();
        let good = builder.build(&[tilted_hand()]).unwrap();
        assert!(good.rotation.angle() > 1e-3);

        let held = builder.build(&[flat_hand()]).unwrap();
        assert_eq!(held.rotation, good.rotation);
        // position still follows the degenerate hand
        assert_ne!(held.position, good.position);
    }

    #[test]
    fn test_secondary_hand_is_index_one() {
        let world_scale = WorldScaleContext::new(10.0, 10.0);
        let mut builder = FrameBuilder::new(CombinerParams::default(), world_scale);
        let frame = builder.build(&[tilted_hand(), flat_hand()]).unwrap();
        assert!(frame.extra_rotation.is_some());
        // flat hand index tip at (0.4, 0.6)
        let pointer = frame.secondary_pointer.unwrap();
        assert_relative_eq!(pointer, Vector3::new(1.0, -1.0, 0.0), epsilon = 1e-9);
    }
}
