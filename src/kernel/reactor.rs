use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use super::agent::{Agent, RecordingAgent};
use super::config::KernelConfig;
use super::module::ModuleHandle;
use super::scheduler::{ActionPhase, PhaseReport, PhasedScheduler, ScheduledAction};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Tick;
use crate::aiming::arbitrator::Priority;
use crate::aiming::manager::{OrientationManager, UpdateOutcome};
use crate::aiming::orientation::Orientation;
use crate::aiming::target::OrientationTarget;

/// What one full tick cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub tick: Tick,
    pub tick_start: PhaseReport,
    pub outcome: UpdateOutcome,
    /// Orientation carried by this tick's movement packet.
    pub sent: Orientation,
    pub post_commit: PhaseReport,
}

/// Context object handed to feature modules: one orientation manager, one
/// phased scheduler and the telemetry they feed.
///
/// The backbone drives the hooks in this order every tick:
/// [`Kernel::tick_start`], module logic, [`Kernel::compute`], network
/// transmission, [`Kernel::network_commit`].
pub struct Kernel {
    pub manager: OrientationManager,
    pub scheduler: PhasedScheduler,
    pub telemetry: TelemetryRecorder,
    pub tick: Tick,
    config: KernelConfig,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            manager: OrientationManager::new(&config),
            scheduler: PhasedScheduler::new(&config),
            telemetry: TelemetryRecorder::new(),
            tick: Tick::new(),
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn request_orientation(
        &mut self,
        target: OrientationTarget,
        priority: Priority,
        owner: ModuleHandle,
    ) {
        let id = owner.id();
        self.manager.request_orientation(target, priority, owner);
        let won = self.manager.active_owner() == Some(id);
        self.telemetry.record(TelemetryEvent::RequestSubmitted {
            owner: id,
            priority,
            won,
            tick: self.tick,
        });
    }

    pub fn schedule_action(
        &mut self,
        owner: ModuleHandle,
        run_after_commit: bool,
        body: impl FnOnce(&mut dyn Agent) + 'static,
        is_priority: bool,
    ) {
        self.scheduler.schedule_action(owner, run_after_commit, body, is_priority);
    }

    pub fn add_task(&mut self, action: ScheduledAction) {
        self.scheduler.add_task(action);
    }

    pub fn current_effective_orientation(&self) -> Option<Orientation> {
        self.manager.current_effective_orientation()
    }

    pub fn is_facing_matching_last_committed(&self, agent: Option<&dyn Agent>) -> bool {
        self.manager.is_facing_matching_last_committed(agent)
    }

    /// Start of a tick: advances the clock, then flushes the tick-start phase.
    pub fn tick_start(&mut self, agent: Option<&mut dyn Agent>) -> PhaseReport {
        self.tick = self.tick.next();
        let report = self.scheduler.tick_start(agent);
        self.record_phase(ActionPhase::TickStart, report);
        report
    }

    /// Orientation step; runs after module logic, before transmission.
    pub fn compute(&mut self, agent: Option<&mut dyn Agent>) -> UpdateOutcome {
        let was_overriding = self.manager.is_overriding();
        // Winner before the countdown advances; a one-tick request is gone after update.
        let owner = self.manager.active_owner();
        let outcome = self.manager.update(agent);
        let tick = self.tick;

        match outcome {
            UpdateOutcome::Tracking { reached, .. } => {
                if !was_overriding {
                    self.telemetry.record(TelemetryEvent::TrackingStarted { owner, tick });
                }
                if reached {
                    self.telemetry.record(TelemetryEvent::TargetReached { tick });
                }
            }
            UpdateOutcome::Released { .. } => {
                self.telemetry.record(TelemetryEvent::Released { tick })
            }
            UpdateOutcome::Suppressed => {
                self.telemetry.record(TelemetryEvent::Suppressed { tick })
            }
            UpdateOutcome::Idle => {}
        }
        outcome
    }

    /// Called once the movement packet carrying `sent` went out.
    pub fn network_commit(
        &mut self,
        agent: Option<&mut dyn Agent>,
        sent: Orientation,
    ) -> PhaseReport {
        self.manager.on_network_commit(sent);
        let in_flight = self.manager.is_overriding();
        let report = self.scheduler.post_commit(in_flight, agent);
        self.record_phase(ActionPhase::PostCommit, report);
        report
    }

    pub fn world_changed(&mut self) {
        let discarded = self.scheduler.world_changed();
        self.manager.reset();
        info!(discarded, "world changed, kernel state cleared");
        self.telemetry.record(TelemetryEvent::WorldChanged { discarded, tick: self.tick });
    }

    fn record_phase(&mut self, phase: ActionPhase, report: PhaseReport) {
        let tick = self.tick;
        if report.deferred {
            self.telemetry.record(TelemetryEvent::PhaseDeferred { phase, tick });
        } else if report.executed > 0 || report.dropped > 0 {
            debug!(?phase, executed = report.executed, dropped = report.dropped, "phase drained");
            self.telemetry.record(TelemetryEvent::PhaseDrained {
                phase,
                executed: report.executed,
                dropped: report.dropped,
                tick,
            });
        }
    }

    /// Runs one whole tick for a driver that owns the agent. `modules` is the
    /// feature-module logic of the tick. The movement packet carries the
    /// effective override, or the natural facing when there is none.
    pub fn step<A, F>(&mut self, agent: &mut A, modules: F) -> CycleReport
    where
        A: Agent,
        F: FnOnce(&mut Kernel, &mut A),
    {
        let tick_start = self.tick_start(Some(&mut *agent));
        modules(&mut *self, &mut *agent);
        let outcome = self.compute(Some(&mut *agent));
        let sent = self
            .current_effective_orientation()
            .unwrap_or_else(|| agent.orientation())
            .normalize();
        let post_commit = self.network_commit(Some(&mut *agent), sent);

        CycleReport { tick: self.tick, tick_start, outcome, sent, post_commit }
    }

    /// Drives the kernel against a headless agent on a fixed cadence.
    pub async fn run<F>(&mut self, agent: &mut RecordingAgent, mut modules: F)
    where
        F: FnMut(&mut Kernel, &mut RecordingAgent),
    {
        info!(
            "Kernel loop started. Tick: {}ms, ticks: {}",
            self.config.tick_ms, self.config.demo_ticks
        );

        let mut cadence = interval(Duration::from_millis(self.config.tick_ms));
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        for _ in 0..self.config.demo_ticks {
            cadence.tick().await;
            let report = self.step(agent, &mut modules);
            debug!(
                tick = report.tick.frame,
                outcome = ?report.outcome,
                sent = ?report.sent,
                "cycle complete"
            );
            agent.end_tick();
        }

        info!("Kernel loop finished at tick {}", self.tick.frame);
    }
}
