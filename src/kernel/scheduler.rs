use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

use super::agent::Agent;
use super::config::{KernelConfig, PostCommitPolicy};
use super::module::ModuleHandle;

/// Point in the tick pipeline an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionPhase {
    /// Start of the next tick, before any module reacts.
    TickStart,
    /// Right after this tick's movement packet went out.
    PostCommit,
}

impl ActionPhase {
    pub fn from_after_commit(run_after_commit: bool) -> Self {
        if run_after_commit {
            ActionPhase::PostCommit
        } else {
            ActionPhase::TickStart
        }
    }
}

pub type ActionBody = Box<dyn FnOnce(&mut dyn Agent)>;

/// Deferred side effect plus the module that owns it.
pub struct ScheduledAction {
    pub owner: ModuleHandle,
    pub phase: ActionPhase,
    pub priority: bool,
    body: ActionBody,
}

impl ScheduledAction {
    pub fn new(
        owner: ModuleHandle,
        phase: ActionPhase,
        body: impl FnOnce(&mut dyn Agent) + 'static,
    ) -> Self {
        Self {
            owner,
            phase,
            priority: false,
            body: Box::new(body),
        }
    }

    pub fn prioritized(mut self) -> Self {
        self.priority = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub executed: usize,
    /// Entries skipped because their owner was inactive.
    pub dropped: usize,
    /// The phase held its queue back this tick.
    pub deferred: bool,
}

impl PhaseReport {
    fn deferred() -> Self {
        Self { deferred: true, ..Self::default() }
    }

    fn run(&mut self, action: ScheduledAction, agent: &mut dyn Agent) {
        if action.owner.is_active() {
            (action.body)(agent);
            self.executed += 1;
        } else {
            self.dropped += 1;
        }
    }

    fn drain(&mut self, queue: &mut VecDeque<ScheduledAction>, agent: &mut dyn Agent) {
        while let Some(action) = queue.pop_front() {
            self.run(action, agent);
        }
    }
}

/// Runs deferred actions immediately after the network commit of a tick, or
/// at the start of the next tick when no commit happened.
///
/// Holds at most one priority action and two FIFO queues.
pub struct PhasedScheduler {
    priority_action: Option<ScheduledAction>,
    post_commit: VecDeque<ScheduledAction>,
    tick_start: VecDeque<ScheduledAction>,
    policy: PostCommitPolicy,
    world_change_clears_priority: bool,
}

impl Default for PhasedScheduler {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl PhasedScheduler {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            priority_action: None,
            post_commit: VecDeque::new(),
            tick_start: VecDeque::new(),
            policy: config.post_commit_policy,
            world_change_clears_priority: config.world_change_clears_priority,
        }
    }

    /// Queues an action. A priority action replaces any pending one.
    pub fn add_task(&mut self, action: ScheduledAction) {
        if action.priority {
            if self.priority_action.is_some() {
                trace!(owner = %action.owner.id(), "priority action replaced");
            }
            self.priority_action = Some(action);
            return;
        }

        match action.phase {
            ActionPhase::PostCommit => self.post_commit.push_back(action),
            ActionPhase::TickStart => self.tick_start.push_back(action),
        }
    }

    pub fn schedule_action(
        &mut self,
        owner: ModuleHandle,
        run_after_commit: bool,
        body: impl FnOnce(&mut dyn Agent) + 'static,
        is_priority: bool,
    ) {
        let phase = ActionPhase::from_after_commit(run_after_commit);
        let mut action = ScheduledAction::new(owner, phase, body);
        action.priority = is_priority;
        self.add_task(action);
    }

    /// Post-commit phase. `override_in_flight` tells whether some module
    /// currently holds an orientation override.
    pub fn post_commit(
        &mut self,
        override_in_flight: bool,
        agent: Option<&mut dyn Agent>,
    ) -> PhaseReport {
        let Some(agent) = agent else {
            return PhaseReport::default();
        };
        if self.priority_action.is_none() && self.post_commit.is_empty() {
            return PhaseReport::default();
        }

        // A tick-start priority action must run before anything else may send packets.
        let blocked_by_priority = self
            .priority_action
            .as_ref()
            .is_some_and(|action| action.phase == ActionPhase::TickStart);

        // Without a priority action the override belongs to another module, and
        // running now could clobber the orientation that was just committed.
        let blocked_by_override = self.policy == PostCommitPolicy::DeferWhileOverride
            && override_in_flight
            && self.priority_action.is_none();

        if blocked_by_priority || blocked_by_override {
            trace!(blocked_by_priority, blocked_by_override, "post-commit phase deferred");
            return PhaseReport::deferred();
        }

        let mut report = PhaseReport::default();
        if let Some(action) = self.priority_action.take() {
            report.run(action, agent);
        }
        report.drain(&mut self.post_commit, agent);
        report
    }

    /// Tick-start phase. Also flushes post-commit leftovers from a tick that
    /// never committed.
    pub fn tick_start(&mut self, agent: Option<&mut dyn Agent>) -> PhaseReport {
        let Some(agent) = agent else {
            return PhaseReport::default();
        };

        let mut report = PhaseReport::default();
        let priority_due = self
            .priority_action
            .as_ref()
            .is_some_and(|action| action.phase == ActionPhase::TickStart);
        if priority_due {
            if let Some(action) = self.priority_action.take() {
                report.run(action, agent);
            }
        }

        if !self.post_commit.is_empty() {
            debug!(leftover = self.post_commit.len(), "post-commit tasks flushed at tick start");
        }
        report.drain(&mut self.post_commit, agent);
        report.drain(&mut self.tick_start, agent);
        report
    }

    /// Drops queued work that belonged to the previous world. Returns how many
    /// actions were discarded.
    pub fn world_changed(&mut self) -> usize {
        let mut discarded = self.post_commit.len() + self.tick_start.len();
        self.post_commit.clear();
        self.tick_start.clear();
        if self.world_change_clears_priority && self.priority_action.take().is_some() {
            discarded += 1;
        }
        discarded
    }

    pub fn has_priority_action(&self) -> bool {
        self.priority_action.is_some()
    }

    pub fn pending(&self) -> usize {
        self.post_commit.len() + self.tick_start.len() + usize::from(self.priority_action.is_some())
    }
}
