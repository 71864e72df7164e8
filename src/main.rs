use glam::DVec3;
use tracing_subscriber::EnvFilter;

use vantage::aiming::modes::{NormalMode, RotationMode};
use vantage::aiming::target::{AngleStep, CorrectionMode, OrientationTarget};
use vantage::aiming::{Orientation, Priority};
use vantage::kernel::agent::{Agent, RecordingAgent};
use vantage::kernel::config::KernelConfig;
use vantage::kernel::module::FeatureModule;
use vantage::Kernel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("Vantage kernel booting...");

    let config = KernelConfig::from_env()?;
    let mut kernel = Kernel::new(config);
    let mut agent = RecordingAgent::new(Orientation::ZERO);

    // Scripted feature modules
    let aimer = FeatureModule::enabled("Aimer");
    let interactor = FeatureModule::enabled("Interactor");
    let mark = DVec3::new(4.0, 1.0, 6.0);

    let mut interact_mode = NormalMode::new(interactor.clone(), Priority::IMPORTANT_FOR_USAGE_3);
    interact_mode.post_commit = true;

    kernel
        .run(&mut agent, |kernel, agent| {
            let frame = kernel.tick.frame;

            if frame <= 20 {
                let look = Orientation::looking_at(mark, agent.eye_position());
                let target = OrientationTarget::builder(look)
                    .correction(CorrectionMode::None)
                    .ticks_until_reset(2)
                    .reset_threshold(2.0)
                    .interpolator(AngleStep::uniform(15.0))
                    .build();
                match target {
                    Ok(target) => {
                        let priority = Priority::IMPORTANT_FOR_USAGE_1;
                        kernel.request_orientation(target, priority, aimer.clone())
                    }
                    Err(e) => tracing::warn!("Aimer target rejected: {}", e),
                }
            }

            if frame % 10 == 0 {
                let current = kernel.current_effective_orientation();
                let is_finished = move || current.is_some();
                let result = interact_mode.rotate(
                    kernel,
                    agent,
                    Orientation::new(90.0, 10.0),
                    &is_finished,
                    Box::new(move |agent: &mut dyn Agent| {
                        tracing::info!(frame, yaw = agent.orientation().yaw, "Interactor acted");
                    }),
                );
                if let Err(e) = result {
                    tracing::warn!("Interactor rotation rejected: {}", e);
                }
            }

            if frame == 30 {
                kernel.world_changed();
            }
        })
        .await;

    let snapshot = kernel.telemetry.snapshot();
    tracing::info!(
        submitted = snapshot.arbitration.submitted,
        won = snapshot.arbitration.won,
        reached = snapshot.orientation.reached,
        released = snapshot.orientation.released,
        post_commit_executed = snapshot.post_commit.executed,
        tick_start_executed = snapshot.tick_start.executed,
        "Session summary"
    );
    tracing::info!(
        heading_changes = agent.heading_changes.len(),
        looks = agent.sent_looks.len(),
        "Agent summary"
    );

    Ok(())
}
