//! Session state machine.

/// Whether the session is consuming detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Detections are applied and the pose is advanced every tick.
    Active,
    /// Sleep mode: detections are ignored and the pose is held.
    Paused,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Active
    }
}
