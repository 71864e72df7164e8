use tracing::trace;

use super::arbitrator::Priority;
use super::orientation::Orientation;
use super::target::OrientationTarget;
use crate::kernel::agent::Agent;
use crate::kernel::error::TargetError;
use crate::kernel::module::ModuleHandle;
use crate::kernel::reactor::Kernel;
use crate::kernel::scheduler::{ActionBody, ActionPhase, ScheduledAction};

/// How a feature module turns "face this way, then do that" into kernel calls.
pub trait RotationMode {
    fn name(&self) -> &'static str;

    /// Aims at `orientation`. `on_finished` runs once the aim is usable, which
    /// `is_finished` reports for the current tick.
    fn rotate(
        &self,
        kernel: &mut Kernel,
        agent: &mut dyn Agent,
        orientation: Orientation,
        is_finished: &dyn Fn() -> bool,
        on_finished: ActionBody,
    ) -> Result<(), TargetError>;
}

/// Arbitrated override; the completion runs as the priority action once the
/// aim is in place, so it sees the orientation that was actually sent.
pub struct NormalMode {
    pub module: ModuleHandle,
    pub priority: Priority,
    pub post_commit: bool,
    pub instant: bool,
    /// After an instant completion, still aim at the orientation.
    pub aim_after_instant_action: bool,
}

impl NormalMode {
    pub fn new(module: ModuleHandle, priority: Priority) -> Self {
        Self {
            module,
            priority,
            post_commit: false,
            instant: false,
            aim_after_instant_action: false,
        }
    }
}

impl RotationMode for NormalMode {
    fn name(&self) -> &'static str {
        "Normal"
    }

    fn rotate(
        &self,
        kernel: &mut Kernel,
        agent: &mut dyn Agent,
        orientation: Orientation,
        is_finished: &dyn Fn() -> bool,
        on_finished: ActionBody,
    ) -> Result<(), TargetError> {
        if self.instant && is_finished() {
            on_finished(agent);
            if self.aim_after_instant_action {
                let target = OrientationTarget::simple(orientation)?;
                kernel.request_orientation(target, self.priority, self.module.clone());
            }
            return Ok(());
        }

        let target = OrientationTarget::simple(orientation)?;
        kernel.request_orientation(target, self.priority, self.module.clone());

        if is_finished() {
            let phase = ActionPhase::from_after_commit(self.post_commit);
            let action = ScheduledAction::new(self.module.clone(), phase, on_finished);
            kernel.add_task(action.prioritized());
        }
        Ok(())
    }
}

/// Never overrides orientation. Optionally sends one standalone look packet
/// before completing.
pub struct NoRotationMode {
    pub module: ModuleHandle,
    pub send: bool,
    pub post_commit: bool,
    pub instant: bool,
}

impl NoRotationMode {
    pub fn new(module: ModuleHandle) -> Self {
        Self {
            module,
            send: false,
            post_commit: false,
            instant: false,
        }
    }
}

impl RotationMode for NoRotationMode {
    fn name(&self) -> &'static str {
        "None"
    }

    fn rotate(
        &self,
        kernel: &mut Kernel,
        agent: &mut dyn Agent,
        orientation: Orientation,
        _is_finished: &dyn Fn() -> bool,
        on_finished: ActionBody,
    ) -> Result<(), TargetError> {
        let send = self.send;
        let task = move |agent: &mut dyn Agent| {
            if send {
                let look = orientation.normalize();
                let on_ground = agent.is_on_ground();
                trace!(yaw = look.yaw, pitch = look.pitch, "standalone look sent");
                agent.send_look(look, on_ground);
            }
            on_finished(agent);
        };

        if self.instant {
            task(agent);
            return Ok(());
        }

        kernel.add_task(ScheduledAction::new(
            self.module.clone(),
            ActionPhase::from_after_commit(self.post_commit),
            task,
        ));
        Ok(())
    }
}
