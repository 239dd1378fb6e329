//! Capture: raw page occurrences in, redacted events out.

mod bus;
mod occurrence;
mod pipeline;

pub use bus::{CaptureBus, SubscriptionToken};
pub use occurrence::{text_preview, truncate, RawOccurrence, RawTarget, TEXT_PREVIEW_LIMIT, VALUE_PREVIEW_LIMIT};
pub use pipeline::CapturePipeline;
