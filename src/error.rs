use thiserror::Error;

/// Chart-level misconfiguration. A failing resolve or integration call
/// aborts atomically; other lines and notes in the same frame are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("judge line {0} appears twice in its own father chain")]
    CyclicFather(usize),
    #[error("judge line index {0} is out of range")]
    LineOutOfRange(usize),
    #[error("BPM list is empty")]
    EmptyBpmList,
    #[error("BPM {bpm} at beat {beats} must be positive and finite")]
    BadBpm { beats: f32, bpm: f32 },
    #[error("first tempo point sits at beat {0}, expected beat 0")]
    FirstBpmOffZero(f32),
}

/// Malformed construction or mutation input. Rejected up front; the field
/// keeps its last valid value.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("beats denominator must be non-zero")]
    ZeroDenominator,
    #[error("easing window [{left}, {right}] must satisfy 0 <= left < right <= 1")]
    BadEasingWindow { left: f32, right: f32 },
}
