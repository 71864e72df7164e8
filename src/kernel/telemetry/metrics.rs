use std::collections::VecDeque;
use super::event::TelemetryEvent;
use crate::kernel::scheduler::ActionPhase;

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub arbitration: ArbitrationStats,
    pub orientation: OrientationStats,
    pub post_commit: PhaseStats,
    pub tick_start: PhaseStats,
    pub world_changes: u64,
    pub discarded_on_world_change: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ArbitrationStats {
    pub submitted: u64,
    pub won: u64,
    /// Share of submissions that were winning right after submission.
    pub win_ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OrientationStats {
    pub tracking_started: u64,
    pub reached: u64,
    pub released: u64,
    pub suppressed_ticks: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PhaseStats {
    pub runs: u64,
    pub executed: u64,
    pub dropped: u64,
    pub deferred: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::RequestSubmitted { won, .. } => {
                snap.arbitration.submitted += 1;
                if *won {
                    snap.arbitration.won += 1;
                }
            }
            TelemetryEvent::TrackingStarted { .. } => snap.orientation.tracking_started += 1,
            TelemetryEvent::TargetReached { .. } => snap.orientation.reached += 1,
            TelemetryEvent::Released { .. } => snap.orientation.released += 1,
            TelemetryEvent::Suppressed { .. } => snap.orientation.suppressed_ticks += 1,
            TelemetryEvent::PhaseDrained { phase, executed, dropped, .. } => {
                let stats = phase_stats(&mut snap, *phase);
                stats.runs += 1;
                stats.executed += *executed as u64;
                stats.dropped += *dropped as u64;
            }
            TelemetryEvent::PhaseDeferred { phase, .. } => {
                phase_stats(&mut snap, *phase).deferred += 1;
            }
            TelemetryEvent::WorldChanged { discarded, .. } => {
                snap.world_changes += 1;
                snap.discarded_on_world_change += *discarded as u64;
            }
        }
    }

    if snap.arbitration.submitted > 0 {
        snap.arbitration.win_ratio =
            snap.arbitration.won as f64 / snap.arbitration.submitted as f64;
    }

    snap
}

fn phase_stats(snap: &mut TelemetrySnapshot, phase: ActionPhase) -> &mut PhaseStats {
    match phase {
        ActionPhase::PostCommit => &mut snap.post_commit,
        ActionPhase::TickStart => &mut snap.tick_start,
    }
}
