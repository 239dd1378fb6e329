//! The replay state machine.
//!
//! ```text
//! Idle ──► Navigating ──► Pacing ──► Resolving ──► Acting ──► Settling ──┐
//!                            ▲                                          │
//!                            └──────────────────────────────────────────┘
//!                                     (next event)      ──► Finished
//! ```
//!
//! One event at a time, in log order. Step failures are logged and skipped;
//! only a failed initial navigation or a lost engine ends a run early.

use std::sync::LazyLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::options::ReplayOptions;
use super::report::{ReplayReport, StepOutcome};
use crate::classify::{classify, FieldAttributes, FieldKind};
use crate::credentials::{autofill, Credentials};
use crate::engine::{Action, AutomationEngine, PageCondition, Query};
use crate::error::{EngineError, ReplayError, ResolveError, StepError};
use crate::event::{ElementDescriptor, Event, EventPayload};
use crate::locate::LocatorResolver;
use crate::pacing::{plan_offsets, Pacer};
use crate::redaction::is_redacted;

/// Keys replayed from `keydown` events. Printable keys are not; their effect
/// is already carried by `input` events.
pub const REPLAYED_KEYS: &[&str] = &[
    "Enter",
    "Tab",
    "Escape",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
];

static TRANSITIONAL_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)continue|next|log\s*in|sign\s*in|submit").expect("transitional pattern is valid")
});

/// Whether clicking a control with this label likely moves a login flow on.
pub fn is_transitional(label: &str) -> bool {
    TRANSITIONAL_LABEL.is_match(label)
}

/// The first of text, aria-label and title that reads as transitional.
fn transitional_label(el: &ElementDescriptor) -> Option<&str> {
    [&el.text, &el.aria_label, &el.title]
        .into_iter()
        .filter_map(|value| value.as_deref())
        .find(|label| is_transitional(label))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Idle,
    Navigating,
    Pacing,
    Resolving,
    Acting,
    Settling,
    Finished,
}

/// Replays an event log against one page.
pub struct Replayer<'a> {
    engine: &'a dyn AutomationEngine,
    options: ReplayOptions,
    credentials: Credentials,
    resolver: LocatorResolver,
    cancel: CancellationToken,
    state: ReplayState,
    /// Page address before the step being replayed.
    last_url: String,
}

impl<'a> Replayer<'a> {
    pub fn new(engine: &'a dyn AutomationEngine, options: ReplayOptions) -> Self {
        let resolver = LocatorResolver::new(options.candidate_timeout);
        Self {
            engine,
            options,
            credentials: Credentials::default(),
            resolver,
            cancel: CancellationToken::new(),
            state: ReplayState::Idle,
            last_url: String::new(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Stop between steps once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    fn enter(&mut self, state: ReplayState) {
        trace!(from = ?self.state, to = ?state, "Replay state");
        self.state = state;
    }

    /// Where replay starts: the first `nav` target, else the first event's page.
    pub fn start_url(events: &[Event]) -> Option<&str> {
        events
            .iter()
            .find_map(|e| match &e.payload {
                EventPayload::Nav { to_url, .. } => to_url.as_deref(),
                _ => None,
            })
            .or_else(|| events.first().and_then(|e| e.url.as_deref()))
            .filter(|url| !url.is_empty())
    }

    /// Replay `events` in order.
    pub async fn run(&mut self, events: &[Event]) -> Result<ReplayReport, ReplayError> {
        let mut report = ReplayReport::new(events.len());
        if events.is_empty() {
            info!("Session is empty; nothing to replay");
            self.enter(ReplayState::Finished);
            return Ok(report);
        }

        let start_url = Self::start_url(events).ok_or(ReplayError::NoStartUrl)?.to_string();
        self.enter(ReplayState::Navigating);
        info!(url = %start_url, "Navigating to start URL");
        match self
            .engine
            .navigate(&start_url, PageCondition::DomReady, self.options.dom_ready_timeout)
            .await
        {
            Ok(()) => {}
            Err(EngineError::Timeout(what)) => {
                warn!(url = %start_url, "Start page not ready ({}); continuing", what);
                self.settle().await?;
            }
            Err(source) => {
                return Err(ReplayError::InitialNavigation {
                    url: start_url,
                    source,
                });
            }
        }
        autofill(self.engine, &self.credentials).await?;
        self.last_url = self.engine.current_url().await?;

        let timestamps: Vec<_> = events.iter().map(|e| e.t).collect();
        let pacer = Pacer::start(plan_offsets(&timestamps, self.options.timescale, self.options.max_gap));

        for (index, event) in events.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(index, "Replay cancelled");
                report.cancelled = true;
                break;
            }

            if self.options.pacing {
                self.enter(ReplayState::Pacing);
                pacer.wait(index).await;
            }

            let outcome = self.step(index, event).await?;
            match &outcome {
                StepOutcome::Skipped(reason) => {
                    warn!(index, kind = %event.kind(), reason = %reason, "Step skipped")
                }
                StepOutcome::Performed => debug!(index, kind = %event.kind(), "Step performed"),
                StepOutcome::Informational => trace!(index, kind = %event.kind(), "Step informational"),
            }
            report.record(index, event.kind(), &outcome);

            if !self.options.step_delay.is_zero() {
                tokio::time::sleep(self.options.step_delay).await;
            }
        }

        self.enter(ReplayState::Finished);
        info!(
            performed = report.performed,
            skipped = report.skipped.len(),
            informational = report.informational,
            "Replay finished"
        );
        Ok(report)
    }

    async fn step(&mut self, index: usize, event: &Event) -> Result<StepOutcome, ReplayError> {
        if event.is_probe() {
            return Ok(StepOutcome::Informational);
        }

        match &event.payload {
            EventPayload::Nav { to_url, .. } => {
                let target = to_url.as_deref().or(event.url.as_deref());
                match target {
                    Some(target) => self.replay_nav(index, target).await,
                    None => Ok(StepOutcome::Informational),
                }
            }
            EventPayload::Click { el, .. } => match el {
                Some(el) => self.replay_click(index, el).await,
                None => Ok(StepOutcome::Skipped(StepError::NotFound("click has no target".into()))),
            },
            EventPayload::Input { el, input_value } => match el {
                Some(el) => {
                    self.replay_input(index, el, input_value.as_deref().unwrap_or(""))
                        .await
                }
                None => Ok(StepOutcome::Skipped(StepError::NotFound("input has no target".into()))),
            },
            EventPayload::Keydown { key, .. } => self.replay_key(index, key).await,
            EventPayload::Change { .. } | EventPayload::Submit { .. } | EventPayload::Visibility { .. } => {
                Ok(StepOutcome::Informational)
            }
        }
    }

    async fn replay_nav(&mut self, index: usize, target: &str) -> Result<StepOutcome, ReplayError> {
        let current = self.engine.current_url().await?;
        if current == target {
            trace!(index, url = %target, "Already at navigation target");
            self.last_url = current;
            return Ok(StepOutcome::Performed);
        }

        self.enter(ReplayState::Acting);
        info!(index, url = %target, "Navigating");
        let navigated = self
            .engine
            .navigate(target, PageCondition::DomReady, self.options.dom_ready_timeout)
            .await;
        let outcome = match navigated {
            Ok(()) => StepOutcome::Performed,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => StepOutcome::Skipped(StepError::NavigationTimeout(e.to_string())),
        };

        self.settle().await?;
        if self.options.autofill_on_navigation {
            autofill(self.engine, &self.credentials).await?;
        }
        Ok(outcome)
    }

    async fn replay_click(&mut self, index: usize, el: &ElementDescriptor) -> Result<StepOutcome, ReplayError> {
        let Some(query) = self.resolve(el).await? else {
            return Ok(StepOutcome::Skipped(StepError::NotFound(el.label())));
        };

        self.enter(ReplayState::Acting);
        info!(index, target = %el.label(), "Click");
        if let Err(e) = self.act_or_fatal(&query, &Action::Click { force: false }).await? {
            debug!(index, error = %e, "Click failed, retrying forced");
            if let Err(e) = self.act_or_fatal(&query, &Action::Click { force: true }).await? {
                return Ok(StepOutcome::Skipped(StepError::Action(e.to_string())));
            }
        }

        if !self.options.post_click_delay.is_zero() {
            tokio::time::sleep(self.options.post_click_delay).await;
        }
        self.settle().await?;

        if let Some(label) = transitional_label(el) {
            debug!(index, label, "Transitional click; retrying autofill");
            autofill(self.engine, &self.credentials).await?;
        }
        Ok(StepOutcome::Performed)
    }

    async fn replay_input(
        &mut self,
        index: usize,
        el: &ElementDescriptor,
        recorded: &str,
    ) -> Result<StepOutcome, ReplayError> {
        let value = if is_redacted(recorded) {
            let kind = classify(&FieldAttributes::from(el));
            if kind == FieldKind::Unclassified {
                return Ok(StepOutcome::Skipped(StepError::Ambiguous));
            }
            match self.credentials.value_for(kind) {
                Some(value) => {
                    info!(index, target = %el.label(), field = %kind, "Fill credential");
                    value.to_string()
                }
                None => return Ok(StepOutcome::Skipped(StepError::MissingCredential(kind))),
            }
        } else {
            info!(index, target = %el.label(), "Fill");
            recorded.to_string()
        };

        let Some(query) = self.resolve(el).await? else {
            return Ok(StepOutcome::Skipped(StepError::NotFound(el.label())));
        };

        self.enter(ReplayState::Acting);
        let fill = Action::Fill(value);
        if let Err(e) = self.act_or_fatal(&query, &fill).await? {
            debug!(index, error = %e, "Fill failed, clicking the field first");
            let _ = self.act_or_fatal(&query, &Action::Click { force: false }).await?;
            if let Err(e) = self.act_or_fatal(&query, &fill).await? {
                return Ok(StepOutcome::Skipped(StepError::Action(e.to_string())));
            }
        }
        Ok(StepOutcome::Performed)
    }

    async fn replay_key(&mut self, index: usize, key: &str) -> Result<StepOutcome, ReplayError> {
        if !REPLAYED_KEYS.contains(&key) {
            return Ok(StepOutcome::Informational);
        }

        self.enter(ReplayState::Acting);
        info!(index, key, "Press");
        match self.engine.press_key(key).await {
            Ok(()) => Ok(StepOutcome::Performed),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => Ok(StepOutcome::Skipped(StepError::Action(e.to_string()))),
        }
    }

    async fn resolve(&mut self, el: &ElementDescriptor) -> Result<Option<Query>, ReplayError> {
        self.enter(ReplayState::Resolving);
        match self.resolver.resolve(self.engine, el).await {
            Ok(locator) => Ok(Some(locator.query)),
            Err(ResolveError::NotFound { attempted }) => {
                debug!(attempted, target = %el.label(), "No locator resolved");
                Ok(None)
            }
            Err(ResolveError::Engine(e)) => Err(e.into()),
        }
    }

    /// Run an action, splitting fatal engine errors from per-step failures.
    async fn act_or_fatal(
        &self,
        query: &Query,
        action: &Action,
    ) -> Result<Result<(), EngineError>, ReplayError> {
        match self.engine.act(query, action).await {
            Err(e) if e.is_fatal() => Err(e.into()),
            other => Ok(other),
        }
    }

    /// Wait for the page to react to the last action: a URL change, then
    /// network quiet, falling back to DOM-ready when neither shows up.
    async fn settle(&mut self) -> Result<(), ReplayError> {
        self.enter(ReplayState::Settling);
        let from = self.last_url.clone();

        let changed = self
            .wait(&PageCondition::UrlChanged { from }, self.options.url_change_timeout)
            .await?;
        let idle = self
            .wait(&PageCondition::NetworkIdle, self.options.network_idle_timeout)
            .await?;
        if !changed && !idle {
            let ready = self
                .wait(&PageCondition::DomReady, self.options.dom_ready_timeout)
                .await?;
            if !ready {
                warn!("Page did not settle in time; continuing");
            }
        }

        self.last_url = self.engine.current_url().await?;
        Ok(())
    }

    async fn wait(&self, condition: &PageCondition, timeout: std::time::Duration) -> Result<bool, ReplayError> {
        match self.engine.wait_for(condition, timeout).await {
            Ok(met) => {
                trace!(condition = %condition, met, "Waited");
                Ok(met)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                debug!(condition = %condition, error = %e, "Wait failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
