use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::orientation::{wrap_degrees, Orientation};
use crate::kernel::error::TargetError;

/// How far an override reaches beyond the reported facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMode {
    /// Report the override only; movement keeps the natural heading.
    #[default]
    None,
    /// Visual change that is released as soon as nothing renews it.
    VisualOnly,
    /// Apply the override to the agent's heading so it ships in the next movement packet.
    CommitToNetwork,
}

/// Per-tick stepping policy supplied by the requesting module.
pub trait Interpolator {
    /// Next orientation on the way from `from` to `to`. `releasing` is set
    /// once no request renews the target and the goal is the natural facing.
    fn towards(&self, from: Orientation, to: Orientation, releasing: bool) -> Orientation;
}

/// Moves at most `max_yaw_step` / `max_pitch_step` degrees per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleStep {
    pub max_yaw_step: f32,
    pub max_pitch_step: f32,
}

impl AngleStep {
    pub fn uniform(step: f32) -> Self {
        Self { max_yaw_step: step, max_pitch_step: step }
    }
}

impl Interpolator for AngleStep {
    fn towards(&self, from: Orientation, to: Orientation, _releasing: bool) -> Orientation {
        let yaw_diff = wrap_degrees(to.yaw - from.yaw);
        let pitch_diff = to.pitch - from.pitch;
        Orientation::new(
            from.yaw + yaw_diff.clamp(-self.max_yaw_step, self.max_yaw_step),
            from.pitch + pitch_diff.clamp(-self.max_pitch_step, self.max_pitch_step),
        )
    }
}

/// Completion callback that runs at most once.
pub struct OnReached(RefCell<Option<Box<dyn FnOnce()>>>);

impl OnReached {
    pub fn new(callback: impl FnOnce() + 'static) -> Self {
        Self(RefCell::new(Some(Box::new(callback))))
    }

    /// Runs the callback if it has not run yet. Returns whether it ran now.
    pub fn fire(&self) -> bool {
        let callback = self.0.borrow_mut().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// A desired orientation plus the policy for reaching and releasing it.
pub struct OrientationTarget {
    orientation: Orientation,
    correction: CorrectionMode,
    ticks_until_reset: u32,
    reset_threshold: f32,
    interpolator: Option<Rc<dyn Interpolator>>,
    on_reached: Option<OnReached>,
}

impl OrientationTarget {
    pub fn builder(orientation: Orientation) -> TargetBuilder {
        TargetBuilder {
            orientation,
            correction: CorrectionMode::None,
            ticks_until_reset: 1,
            reset_threshold: 1.0,
            interpolator: None,
            on_reached: None,
        }
    }

    /// Instant one-tick target with default policy.
    pub fn simple(orientation: Orientation) -> Result<Self, TargetError> {
        Self::builder(orientation).build()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn correction(&self) -> CorrectionMode {
        self.correction
    }

    pub fn ticks_until_reset(&self) -> u32 {
        self.ticks_until_reset
    }

    pub fn reset_threshold(&self) -> f32 {
        self.reset_threshold
    }

    /// Whether the target keeps stepping after it stops being renewed.
    pub fn needs_processing(&self) -> bool {
        self.interpolator.is_some()
    }

    /// Next candidate orientation starting at `from`. While releasing the goal
    /// is `natural`; an instant target always yields its own orientation.
    pub fn towards(&self, from: Orientation, natural: Orientation, releasing: bool) -> Orientation {
        match &self.interpolator {
            Some(interpolator) => {
                let goal = if releasing { natural } else { self.orientation };
                interpolator.towards(from, goal, releasing)
            }
            None => self.orientation,
        }
    }

    pub(crate) fn fire_on_reached(&self) -> bool {
        self.on_reached.as_ref().is_some_and(OnReached::fire)
    }
}

impl fmt::Debug for OrientationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrientationTarget")
            .field("orientation", &self.orientation)
            .field("correction", &self.correction)
            .field("ticks_until_reset", &self.ticks_until_reset)
            .field("reset_threshold", &self.reset_threshold)
            .field("interpolated", &self.interpolator.is_some())
            .field("on_reached", &self.on_reached.as_ref().map(|c| !c.is_spent()))
            .finish()
    }
}

pub struct TargetBuilder {
    orientation: Orientation,
    correction: CorrectionMode,
    ticks_until_reset: u32,
    reset_threshold: f32,
    interpolator: Option<Rc<dyn Interpolator>>,
    on_reached: Option<OnReached>,
}

impl TargetBuilder {
    pub fn correction(mut self, correction: CorrectionMode) -> Self {
        self.correction = correction;
        self
    }

    pub fn ticks_until_reset(mut self, ticks: u32) -> Self {
        self.ticks_until_reset = ticks;
        self
    }

    pub fn reset_threshold(mut self, threshold: f32) -> Self {
        self.reset_threshold = threshold;
        self
    }

    pub fn interpolator(mut self, interpolator: impl Interpolator + 'static) -> Self {
        self.interpolator = Some(Rc::new(interpolator));
        self
    }

    pub fn on_reached(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_reached = Some(OnReached::new(callback));
        self
    }

    pub fn build(self) -> Result<OrientationTarget, TargetError> {
        if !self.orientation.is_finite() {
            return Err(TargetError::NonFiniteOrientation {
                yaw: self.orientation.yaw,
                pitch: self.orientation.pitch,
            });
        }
        if !self.reset_threshold.is_finite() || self.reset_threshold < 0.0 {
            return Err(TargetError::InvalidResetThreshold(self.reset_threshold));
        }
        if self.ticks_until_reset == 0 {
            return Err(TargetError::ZeroLifetime);
        }

        Ok(OrientationTarget {
            orientation: self.orientation,
            correction: self.correction,
            ticks_until_reset: self.ticks_until_reset,
            reset_threshold: self.reset_threshold,
            interpolator: self.interpolator,
            on_reached: self.on_reached,
        })
    }
}
