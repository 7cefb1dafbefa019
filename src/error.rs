use thiserror::Error;

/// Errors that actually propagate through `Result` in the monitor core.
///
/// Miscompare, not-found and busy conditions are recoverable scan outcomes;
/// they travel as `StepStatus` values and events, never as errors.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("definition table validation failed: good={good} bad={bad} unused={unused}")]
    Validation { good: u32, bad: u32, unused: u32 },

    #[error("child task {action} failed")]
    ChildTask { action: &'static str },

    #[error("invalid address range: addr={addr:#010x} len={len}")]
    InvalidRange { addr: u32, len: u32 },
}
