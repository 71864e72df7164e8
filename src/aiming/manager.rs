use glam::DVec3;
use std::rc::Rc;
use tracing::{debug, trace};

use super::arbitrator::{ArbitrationSlot, Priority, Request};
use super::orientation::Orientation;
use super::target::{CorrectionMode, OrientationTarget};
use crate::kernel::agent::Agent;
use crate::kernel::config::KernelConfig;
use crate::kernel::module::{ModuleHandle, ModuleId};

const JUMP_IMPULSE: f64 = 0.2;

/// What a single [`OrientationManager::update`] call decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// No agent, or no target left to honor.
    Idle,
    /// A modal screen is open; orientation was left alone.
    Suppressed,
    Tracking {
        orientation: Orientation,
        /// The completion callback of the active request ran this tick.
        reached: bool,
    },
    /// The override was dropped and the natural heading restored.
    Released { restored: Orientation },
}

/// Arbitrates orientation overrides between feature modules and synthesizes
/// the orientation the agent reports each tick.
pub struct OrientationManager {
    slot: ArbitrationSlot<Rc<OrientationTarget>>,
    previous_target: Option<Rc<OrientationTarget>>,
    current: Option<Orientation>,
    previous: Option<Orientation>,
    last_network_committed: Orientation,
    server_shadow: Orientation,
    suppress_while_modal_open: bool,
    report_server_shadow: bool,
}

impl Default for OrientationManager {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl OrientationManager {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            slot: ArbitrationSlot::new(),
            previous_target: None,
            current: None,
            previous: None,
            last_network_committed: Orientation::ZERO,
            server_shadow: Orientation::ZERO,
            suppress_while_modal_open: config.suppress_while_modal_open,
            report_server_shadow: config.report_server_shadow,
        }
    }

    /// Submits an override. The caller is not told whether it won; poll
    /// [`Self::current_effective_orientation`] instead.
    pub fn request_orientation(
        &mut self,
        target: OrientationTarget,
        priority: Priority,
        owner: ModuleHandle,
    ) {
        let lifetime = target.ticks_until_reset();
        trace!(owner = %owner.id(), ?priority, lifetime, "orientation requested");
        self.slot.request(Request::new(lifetime, priority, owner, Rc::new(target)));
    }

    /// Orientation currently synthesized for the agent; `None` means the natural facing governs.
    pub fn current_effective_orientation(&self) -> Option<Orientation> {
        self.current
    }

    pub fn previous_orientation(&self) -> Option<Orientation> {
        self.previous
    }

    /// Target honored this tick: the arbitration winner, else the one being released.
    pub fn active_target(&self) -> Option<&OrientationTarget> {
        self.slot
            .active_value()
            .or(self.previous_target.as_ref())
            .map(Rc::as_ref)
    }

    pub fn active_owner(&self) -> Option<ModuleId> {
        self.slot.active_owner()
    }

    pub fn is_overriding(&self) -> bool {
        self.current.is_some()
    }

    /// Whether facing did not change between the last two ticks.
    pub fn is_facing_matching_last_committed(&self, agent: Option<&dyn Agent>) -> bool {
        let Some(agent) = agent else {
            return false;
        };

        match self.current {
            Some(current) => Some(current) == self.previous,
            None => agent.orientation() == agent.last_orientation(),
        }
    }

    /// Orientation the remote authority is believed to hold.
    pub fn server_orientation(&self) -> Orientation {
        if self.report_server_shadow {
            self.server_shadow
        } else {
            self.last_network_committed
        }
    }

    /// Records the orientation that actually went out in the movement packet.
    pub fn on_network_commit(&mut self, sent: Orientation) {
        self.last_network_committed = sent;
    }

    fn set_current(&mut self, value: Option<Orientation>, natural: Orientation) {
        self.previous = value.map(|_| self.current.unwrap_or(natural));
        self.current = value;
    }

    /// Per-tick step. Must run after every module had its chance to request.
    pub fn update(&mut self, agent: Option<&mut dyn Agent>) -> UpdateOutcome {
        let outcome = self.compute(agent);
        let evicted = self.slot.tick();
        if evicted > 0 {
            trace!(evicted, "orientation requests expired");
        }
        outcome
    }

    fn compute(&mut self, agent: Option<&mut dyn Agent>) -> UpdateOutcome {
        let Some(agent) = agent else {
            return UpdateOutcome::Idle;
        };

        let held = self.slot.active_value().cloned();
        let Some(effective) = held.clone().or_else(|| self.previous_target.clone()) else {
            return UpdateOutcome::Idle;
        };

        if self.suppress_while_modal_open && agent.is_modal_open() {
            return UpdateOutcome::Suppressed;
        }

        let natural = agent.orientation();
        let from = self.current.unwrap_or(natural);
        let releasing = held.is_none();
        let candidate = effective.towards(from, natural, releasing).normalize();
        let diff = candidate.angle_to(&natural);

        if releasing
            && (effective.correction() == CorrectionMode::VisualOnly
                || !effective.needs_processing()
                || diff <= effective.reset_threshold())
        {
            let restored = match self.current {
                Some(current) => {
                    let restored =
                        Orientation::new(current.yaw, natural.pitch).closest_to(&natural);
                    agent.set_orientation(restored);
                    restored
                }
                None => natural,
            };

            self.set_current(None, natural);
            self.previous_target = None;
            debug!(yaw = restored.yaw, pitch = restored.pitch, "orientation override released");
            return UpdateOutcome::Released { restored };
        }

        if effective.correction() == CorrectionMode::CommitToNetwork {
            agent.set_orientation(candidate.closest_to(&natural));
        }

        if self.current.is_none() {
            debug!(
                yaw = candidate.yaw,
                pitch = candidate.pitch,
                correction = ?effective.correction(),
                "orientation override started"
            );
        }
        self.set_current(Some(candidate), natural);
        self.server_shadow = candidate;
        self.previous_target = Some(effective);

        let reached = held.is_some_and(|target| {
            candidate.angle_to(&target.orientation()) <= target.reset_threshold()
                && target.fire_on_reached()
        });

        UpdateOutcome::Tracking { orientation: candidate, reached }
    }

    fn correcting_yaw(&self) -> Option<f32> {
        let target = self.active_target()?;
        if target.correction() == CorrectionMode::None {
            return None;
        }
        self.current.map(|current| current.yaw)
    }

    /// World velocity for a local movement input (strafe, up, forward), steered
    /// by the override yaw. `None` when movement should use the natural heading.
    pub fn corrected_velocity(&self, input: DVec3, speed: f64) -> Option<DVec3> {
        let yaw = f64::from(self.correcting_yaw()?).to_radians();

        let length_sq = input.length_squared();
        if length_sq < 1.0e-7 {
            return Some(DVec3::ZERO);
        }
        let direction = if length_sq > 1.0 { input.normalize() } else { input };
        let scaled = direction * speed;
        let (sin, cos) = yaw.sin_cos();
        Some(DVec3::new(
            scaled.x * cos - scaled.z * sin,
            scaled.y,
            scaled.z * cos + scaled.x * sin,
        ))
    }

    /// Horizontal sprint-jump impulse along the override yaw.
    pub fn jump_impulse(&self) -> Option<DVec3> {
        let yaw = f64::from(self.correcting_yaw()?).to_radians();
        Some(DVec3::new(-yaw.sin() * JUMP_IMPULSE, 0.0, yaw.cos() * JUMP_IMPULSE))
    }

    /// Drops every request and override, e.g. after a world change.
    pub fn reset(&mut self) {
        self.slot.clear();
        self.previous_target = None;
        self.current = None;
        self.previous = None;
    }
}
