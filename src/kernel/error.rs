use thiserror::Error;

/// Rejections raised when a feature module builds a malformed orientation target.
/// These never reach the tick loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    #[error("reset threshold must be finite and >= 0, got {0}")]
    InvalidResetThreshold(f32),
    #[error("ticks until reset must be at least 1")]
    ZeroLifetime,
    #[error("orientation component is not finite (yaw {yaw}, pitch {pitch})")]
    NonFiniteOrientation { yaw: f32, pitch: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tick_ms must be greater than zero")]
    ZeroTickInterval,
}
