use glam::DVec3;
use serde::{Deserialize, Serialize};

pub const MIN_PITCH: f32 = -90.0;
pub const MAX_PITCH: f32 = 90.0;

/// Wraps an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle % 360.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Yaw/pitch pair in degrees.
///
/// Yaw 0 faces +Z and grows clockwise seen from above; positive pitch looks down.
/// Values are never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    pub const ZERO: Orientation = Orientation { yaw: 0.0, pitch: 0.0 };

    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }

    /// Yaw wrapped into (-180, 180], pitch clamped to the look range.
    pub fn normalize(&self) -> Orientation {
        Orientation {
            yaw: wrap_degrees(self.yaw),
            pitch: self.pitch.clamp(MIN_PITCH, MAX_PITCH),
        }
    }

    /// Same direction, expressed with the yaw representative nearest `reference`.
    pub fn closest_to(&self, reference: &Orientation) -> Orientation {
        Orientation {
            yaw: reference.yaw + wrap_degrees(self.yaw - reference.yaw),
            pitch: self.pitch.clamp(MIN_PITCH, MAX_PITCH),
        }
    }

    /// Angular distance in degrees over the wrapped yaw and clamped pitch
    /// differences. Not capped, so far-apart candidates still rank apart.
    pub fn angle_to(&self, other: &Orientation) -> f32 {
        let yaw_diff = wrap_degrees(other.yaw - self.yaw);
        let pitch_diff =
            other.pitch.clamp(MIN_PITCH, MAX_PITCH) - self.pitch.clamp(MIN_PITCH, MAX_PITCH);
        yaw_diff.hypot(pitch_diff)
    }

    pub fn direction_vector(&self) -> DVec3 {
        let yaw = f64::from(self.yaw).to_radians();
        let pitch = f64::from(self.pitch).to_radians();
        DVec3::new(-yaw.sin() * pitch.cos(), -pitch.sin(), yaw.cos() * pitch.cos())
    }

    /// Orientation of the ray from `eyes` through `point`.
    pub fn looking_at(point: DVec3, eyes: DVec3) -> Orientation {
        let diff = point - eyes;
        let horizontal = diff.x.hypot(diff.z);
        let yaw = diff.z.atan2(diff.x).to_degrees() - 90.0;
        let pitch = -diff.y.atan2(horizontal).to_degrees();
        Orientation::new(yaw as f32, pitch as f32).normalize()
    }
}
