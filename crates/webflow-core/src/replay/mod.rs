//! Replay of a recorded session against an [`AutomationEngine`](crate::AutomationEngine).

mod options;
mod report;
mod scheduler;

pub use options::ReplayOptions;
pub use report::{ReplayReport, SkippedStep, StepOutcome};
pub use scheduler::{is_transitional, ReplayState, Replayer, REPLAYED_KEYS};
