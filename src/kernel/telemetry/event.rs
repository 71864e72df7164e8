use serde::{Deserialize, Serialize};

use crate::aiming::arbitrator::Priority;
use crate::kernel::module::ModuleId;
use crate::kernel::scheduler::ActionPhase;
use crate::kernel::time::Tick;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    RequestSubmitted {
        owner: ModuleId,
        priority: Priority,
        /// Whether the request is the arbitration winner right after submission.
        won: bool,
        tick: Tick,
    },

    TrackingStarted {
        owner: Option<ModuleId>,
        tick: Tick,
    },

    TargetReached {
        tick: Tick,
    },

    Released {
        tick: Tick,
    },

    Suppressed {
        tick: Tick,
    },

    PhaseDrained {
        phase: ActionPhase,
        executed: usize,
        dropped: usize,
        tick: Tick,
    },

    PhaseDeferred {
        phase: ActionPhase,
        tick: Tick,
    },

    WorldChanged {
        discarded: usize,
        tick: Tick,
    },
}

impl TelemetryEvent {
    pub fn tick(&self) -> Tick {
        match self {
            TelemetryEvent::RequestSubmitted { tick, .. }
            | TelemetryEvent::TrackingStarted { tick, .. }
            | TelemetryEvent::TargetReached { tick }
            | TelemetryEvent::Released { tick }
            | TelemetryEvent::Suppressed { tick }
            | TelemetryEvent::PhaseDrained { tick, .. }
            | TelemetryEvent::PhaseDeferred { tick, .. }
            | TelemetryEvent::WorldChanged { tick, .. } => *tick,
        }
    }
}
