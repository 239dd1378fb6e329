//! # Webflow Core
//!
//! Capture and replay of browser sessions as timestamped event logs.
//!
//! ## Capture
//!
//! ```text
//! in-page occurrence ──► RawOccurrence ──► selector synthesis ──► classify/redact ──► SessionWriter
//!                                                                        │
//!                                                                        └──► CaptureBus subscribers
//! ```
//!
//! ## Replay
//!
//! ```text
//! SessionReader ──► Replayer ──► pacing ──► LocatorResolver ──► AutomationEngine::act ──► settle
//! ```
//!
//! The browser itself sits behind [`AutomationEngine`]; this crate never talks
//! to a browser process directly.

pub mod capture;
pub mod classify;
pub mod credentials;
mod error;
pub mod engine;
pub mod event;
pub mod locate;
pub mod pacing;
pub mod redaction;
pub mod replay;
pub mod selector;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::{CaptureBus, CapturePipeline, RawOccurrence, SubscriptionToken};
pub use classify::{classify, FieldAttributes, FieldKind};
pub use credentials::{autofill, AutofillOutcome, Credentials};
pub use engine::{Action, AutomationEngine, FieldCandidate, PageCondition, Query};
pub use error::{CaptureError, EngineError, ReplayError, ResolveError, SessionError, StepError};
pub use event::{ElementDescriptor, Event, EventKind, EventPayload, MouseButton, Selectors, VisibilityState};
pub use locate::{Locator, LocatorResolver, Strategy};
pub use pacing::{plan_offsets, Pacer};
pub use redaction::{is_redacted, RedactionPolicy, REDACTION_MARKER};
pub use replay::{ReplayOptions, ReplayReport, ReplayState, Replayer, StepOutcome};
pub use session::{SessionReader, SessionSummary, SessionWriter};
