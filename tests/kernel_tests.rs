use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vantage::aiming::manager::UpdateOutcome;
use vantage::aiming::modes::{NoRotationMode, NormalMode, RotationMode};
use vantage::aiming::target::OrientationTarget;
use vantage::aiming::{Orientation, Priority};
use vantage::kernel::agent::{Agent, RecordingAgent};
use vantage::kernel::config::{KernelConfig, PostCommitPolicy};
use vantage::kernel::module::{FeatureModule, Module};
use vantage::kernel::scheduler::ActionBody;
use vantage::kernel::telemetry::event::TelemetryEvent;
use vantage::kernel::telemetry::recorder::TelemetryRecorder;
use vantage::kernel::time::Tick;
use vantage::Kernel;

fn interactor() -> Rc<FeatureModule> {
    FeatureModule::enabled("Interactor")
}

fn noop() -> ActionBody {
    Box::new(|_agent: &mut dyn Agent| {})
}

fn flag() -> Rc<Cell<bool>> {
    Rc::new(Cell::new(false))
}

#[test]
fn test_full_cycle_runs_priority_action_after_commit() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let aimer = FeatureModule::enabled("Aimer");
    let seen: Rc<RefCell<Vec<Orientation>>> = Rc::new(RefCell::new(Vec::new()));

    let report = kernel.step(&mut agent, |kernel, _agent| {
        let target = OrientationTarget::builder(Orientation::new(45.0, 0.0))
            .on_reached(|| {})
            .build()
            .unwrap();
        kernel.request_orientation(target, Priority::IMPORTANT_FOR_USAGE_1, aimer.clone());

        let seen = seen.clone();
        kernel.schedule_action(
            aimer.clone(),
            true,
            move |agent: &mut dyn Agent| seen.borrow_mut().push(agent.orientation()),
            true,
        );
    });

    assert_eq!(report.tick.frame, 1);
    assert_eq!(
        report.outcome,
        UpdateOutcome::Tracking { orientation: Orientation::new(45.0, 0.0), reached: true }
    );
    assert_eq!(report.sent, Orientation::new(45.0, 0.0));
    assert_eq!(report.post_commit.executed, 1);
    assert_eq!(*seen.borrow(), vec![Orientation::ZERO]);
    assert_eq!(kernel.manager.server_orientation(), Orientation::new(45.0, 0.0));

    let report = kernel.step(&mut agent, |_, _| {});
    assert!(matches!(report.outcome, UpdateOutcome::Released { .. }));
    assert_eq!(kernel.current_effective_orientation(), None);

    let snapshot = kernel.telemetry.snapshot();
    assert_eq!(snapshot.arbitration.submitted, 1);
    assert_eq!(snapshot.arbitration.won, 1);
    assert_eq!(snapshot.orientation.tracking_started, 1);
    assert_eq!(snapshot.orientation.reached, 1);
    assert_eq!(snapshot.orientation.released, 1);
    assert_eq!(snapshot.post_commit.runs, 1);
    assert_eq!(snapshot.post_commit.executed, 1);
}

#[test]
fn test_foreign_override_defers_post_commit_to_next_tick() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let aimer = FeatureModule::enabled("Aimer");
    let interactor = FeatureModule::enabled("Interactor");
    let ran = flag();

    let report = kernel.step(&mut agent, |kernel, _agent| {
        let target = OrientationTarget::builder(Orientation::new(90.0, 0.0))
            .ticks_until_reset(5)
            .build()
            .unwrap();
        kernel.request_orientation(target, Priority::IMPORTANT_FOR_USAGE_2, aimer.clone());
        let ran = ran.clone();
        let action = move |_agent: &mut dyn Agent| ran.set(true);
        kernel.schedule_action(interactor.clone(), true, action, false);
    });
    assert!(report.post_commit.deferred);
    assert!(!ran.get());

    let report = kernel.step(&mut agent, |_, _| {});
    assert_eq!(report.tick_start.executed, 1);
    assert!(ran.get());

    let snapshot = kernel.telemetry.snapshot();
    assert_eq!(snapshot.post_commit.deferred, 1);
    assert_eq!(snapshot.tick_start.executed, 1);
}

#[test]
fn test_lower_priority_submission_is_recorded_as_lost() {
    let mut kernel = Kernel::default();
    let high = FeatureModule::enabled("High");
    let low = FeatureModule::enabled("Low");

    kernel.request_orientation(
        OrientationTarget::simple(Orientation::new(10.0, 0.0)).unwrap(),
        Priority::IMPORTANT_FOR_USER_SAFETY,
        high,
    );
    kernel.request_orientation(
        OrientationTarget::simple(Orientation::new(20.0, 0.0)).unwrap(),
        Priority::NOT_IMPORTANT,
        low,
    );

    let snapshot = kernel.telemetry.snapshot();
    assert_eq!(snapshot.arbitration.submitted, 2);
    assert_eq!(snapshot.arbitration.won, 1);
    assert!((snapshot.arbitration.win_ratio - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_normal_mode_completes_at_next_tick_start() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let mode = NormalMode::new(interactor(), Priority::IMPORTANT_FOR_USAGE_3);
    let ran = flag();

    let report = kernel.step(&mut agent, |kernel, agent| {
        let ran = ran.clone();
        mode.rotate(
            kernel,
            agent,
            Orientation::new(30.0, 0.0),
            &|| true,
            Box::new(move |_agent: &mut dyn Agent| ran.set(true)),
        )
        .unwrap();
    });
    assert!(matches!(report.outcome, UpdateOutcome::Tracking { .. }));
    assert!(report.post_commit.deferred, "tick-start priority action holds the phase");
    assert!(!ran.get());

    let report = kernel.step(&mut agent, |_, _| {});
    assert_eq!(report.tick_start.executed, 1);
    assert!(ran.get());
}

#[test]
fn test_normal_mode_instant_action() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let mut mode = NormalMode::new(interactor(), Priority::IMPORTANT_FOR_USAGE_3);
    mode.instant = true;
    let ran = flag();

    let done = ran.clone();
    mode.rotate(
        &mut kernel,
        &mut agent,
        Orientation::new(30.0, 0.0),
        &|| true,
        Box::new(move |_agent: &mut dyn Agent| done.set(true)),
    )
    .unwrap();
    assert!(ran.get());
    assert!(kernel.manager.active_target().is_none());
    assert_eq!(kernel.scheduler.pending(), 0);

    mode.aim_after_instant_action = true;
    mode.rotate(&mut kernel, &mut agent, Orientation::new(30.0, 0.0), &|| true, noop()).unwrap();
    assert_eq!(kernel.manager.active_target().unwrap().orientation(), Orientation::new(30.0, 0.0));
}

#[test]
fn test_normal_mode_waits_while_unfinished() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let mode = NormalMode::new(interactor(), Priority::IMPORTANT_FOR_USAGE_3);

    mode.rotate(&mut kernel, &mut agent, Orientation::new(30.0, 0.0), &|| false, noop()).unwrap();
    assert!(kernel.manager.active_target().is_some());
    assert!(!kernel.scheduler.has_priority_action());

    let rejected = mode.rotate(
        &mut kernel,
        &mut agent,
        Orientation::new(f32::INFINITY, 0.0),
        &|| true,
        noop(),
    );
    assert!(rejected.is_err());
}

#[test]
fn test_no_rotation_mode_sends_standalone_look() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let mut mode = NoRotationMode::new(FeatureModule::enabled("Interactor"));
    mode.send = true;
    mode.instant = true;
    let ran = flag();

    let done = ran.clone();
    mode.rotate(
        &mut kernel,
        &mut agent,
        Orientation::new(190.0, 0.0),
        &|| true,
        Box::new(move |_agent: &mut dyn Agent| done.set(true)),
    )
    .unwrap();

    assert!(ran.get());
    assert_eq!(agent.sent_looks, vec![Orientation::new(-170.0, 0.0)]);
    assert!(kernel.manager.active_target().is_none(), "never overrides orientation");
}

#[test]
fn test_no_rotation_mode_queues_post_commit_task() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let mut mode = NoRotationMode::new(FeatureModule::enabled("Interactor"));
    mode.post_commit = true;

    mode.rotate(&mut kernel, &mut agent, Orientation::new(10.0, 0.0), &|| true, noop()).unwrap();
    assert_eq!(kernel.scheduler.pending(), 1);
    assert!(agent.sent_looks.is_empty());

    let report = kernel.network_commit(Some(&mut agent), Orientation::ZERO);
    assert_eq!(report.executed, 1);
}

#[test]
fn test_world_change_clears_kernel_state() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let module = FeatureModule::enabled("Scaffold");

    kernel.step(&mut agent, |kernel, _agent| {
        let target = OrientationTarget::builder(Orientation::new(60.0, 0.0))
            .ticks_until_reset(10)
            .build()
            .unwrap();
        kernel.request_orientation(target, Priority::IMPORTANT_FOR_USAGE_1, module.clone());
        kernel.schedule_action(module.clone(), false, |_agent: &mut dyn Agent| {}, false);
    });
    assert!(kernel.current_effective_orientation().is_some());

    kernel.world_changed();
    assert_eq!(kernel.current_effective_orientation(), None);
    assert_eq!(kernel.scheduler.pending(), 0);

    let snapshot = kernel.telemetry.snapshot();
    assert_eq!(snapshot.world_changes, 1);
    assert_eq!(snapshot.discarded_on_world_change, 1);
}

#[test]
fn test_config_from_json() {
    let raw = r#"{"post_commit_policy":"always","tick_ms":10}"#;
    let config = KernelConfig::from_json(raw).unwrap();
    assert_eq!(config.post_commit_policy, PostCommitPolicy::Always);
    assert_eq!(config.tick_ms, 10);
    assert!(config.suppress_while_modal_open);
    assert!(config.world_change_clears_priority);

    assert!(KernelConfig::from_json(r#"{"tick_ms":0}"#).is_err());
    assert!(KernelConfig::from_json(r#"{"post_commit_policy":"sometimes"}"#).is_err());
}

#[tokio::test]
async fn test_run_drives_fixed_number_of_ticks() {
    let config = KernelConfig { tick_ms: 1, demo_ticks: 5, ..KernelConfig::default() };
    let mut kernel = Kernel::new(config);
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let aimer = FeatureModule::enabled("Aimer");

    kernel
        .run(&mut agent, |kernel, _agent| {
            if kernel.tick.frame == 1 {
                let target = OrientationTarget::builder(Orientation::new(20.0, 0.0))
                    .ticks_until_reset(2)
                    .build()
                    .unwrap();
                kernel.request_orientation(target, Priority::IMPORTANT_FOR_USAGE_1, aimer.clone());
            }
        })
        .await;

    assert_eq!(kernel.tick.frame, 5);
    let snapshot = kernel.telemetry.snapshot();
    assert_eq!(snapshot.orientation.tracking_started, 1);
    assert_eq!(snapshot.orientation.released, 1);
}

#[test]
fn test_tracking_start_names_the_winning_module() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let aimer = FeatureModule::enabled("Aimer");
    let id = aimer.id();

    kernel.step(&mut agent, |kernel, _agent| {
        let target = OrientationTarget::simple(Orientation::new(45.0, 0.0)).unwrap();
        kernel.request_orientation(target, Priority::IMPORTANT_FOR_USAGE_1, aimer.clone());
    });

    let owners: Vec<_> = kernel
        .telemetry
        .events()
        .filter_map(|event| match event {
            TelemetryEvent::TrackingStarted { owner, .. } => Some(*owner),
            _ => None,
        })
        .collect();
    assert_eq!(owners, vec![Some(id)]);
}

#[test]
fn test_telemetry_window_and_overwrite() {
    let mut kernel = Kernel::default();
    let mut agent = RecordingAgent::new(Orientation::ZERO);
    let module = FeatureModule::enabled("Scaffold");

    kernel.step(&mut agent, |kernel, _agent| {
        kernel.schedule_action(module.clone(), true, |_agent: &mut dyn Agent| {}, false);
    });
    kernel.step(&mut agent, |kernel, _agent| {
        kernel.schedule_action(module.clone(), true, |_agent: &mut dyn Agent| {}, false);
    });

    assert_eq!(kernel.telemetry.len(), 2);
    assert_eq!(kernel.telemetry.since(Tick { frame: 2 }).count(), 1);

    let mut recorder = TelemetryRecorder::with_capacity(1);
    for event in kernel.telemetry.events().cloned() {
        recorder.record(event);
    }
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.overwritten(), 1);
    assert_eq!(recorder.events().next().map(TelemetryEvent::tick), Some(Tick { frame: 2 }));
}
