pub mod arbitrator;
pub mod manager;
pub mod modes;
pub mod orientation;
pub mod preference;
pub mod target;

pub use arbitrator::{ArbitrationSlot, Priority, Request};
pub use manager::{OrientationManager, UpdateOutcome};
pub use orientation::Orientation;
pub use target::{AngleStep, CorrectionMode, Interpolator, OrientationTarget};
