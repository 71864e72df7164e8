pub mod aiming;
pub mod kernel;

// Convenience re-exports
pub use aiming::{Orientation, OrientationTarget, Priority};
pub use kernel::reactor::Kernel;
