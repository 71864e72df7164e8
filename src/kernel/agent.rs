use glam::DVec3;

use crate::aiming::orientation::Orientation;

/// World-side accessors for the controlled agent.
///
/// Implemented by whatever owns the simulated player. The kernel only reads
/// facing and status, applies a heading, and may transmit a standalone look packet.
pub trait Agent {
    /// Natural facing; yaw is not wrapped.
    fn orientation(&self) -> Orientation;
    /// Natural facing at the end of the previous tick.
    fn last_orientation(&self) -> Orientation;
    fn set_orientation(&mut self, orientation: Orientation);
    fn is_on_ground(&self) -> bool;
    /// A screen that should freeze orientation changes (e.g. inventory) is open.
    fn is_modal_open(&self) -> bool;
    fn eye_position(&self) -> DVec3;
    fn send_look(&mut self, orientation: Orientation, on_ground: bool);
}

/// Headless agent that records every heading change and look packet.
#[derive(Debug, Clone, Default)]
pub struct RecordingAgent {
    pub orientation: Orientation,
    pub last_orientation: Orientation,
    pub on_ground: bool,
    pub modal_open: bool,
    pub eyes: DVec3,
    pub heading_changes: Vec<Orientation>,
    pub sent_looks: Vec<Orientation>,
}

impl RecordingAgent {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            last_orientation: orientation,
            on_ground: true,
            eyes: DVec3::new(0.0, 1.62, 0.0),
            ..Self::default()
        }
    }

    /// Rolls the natural facing over to the next tick.
    pub fn end_tick(&mut self) {
        self.last_orientation = self.orientation;
    }
}

impl Agent for RecordingAgent {
    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn last_orientation(&self) -> Orientation {
        self.last_orientation
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.heading_changes.push(orientation);
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    fn eye_position(&self) -> DVec3 {
        self.eyes
    }

    fn send_look(&mut self, orientation: Orientation, _on_ground: bool) {
        self.sent_looks.push(orientation);
    }
}
