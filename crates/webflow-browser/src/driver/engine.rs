//! [`AutomationEngine`] over a CDP page session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use webflow_core::{Action, AutomationEngine, EngineError, FieldAttributes, FieldCandidate, PageCondition, Query};

use super::lifecycle::{LifecycleWatch, LoadState};
use crate::cdp::{CdpError, PageSession};

const LOCATOR_JS: &str = include_str!("locator.js");

/// Poll interval for address changes.
const URL_POLL: Duration = Duration::from_millis(50);

/// Poll interval for visibility and document state.
const STATE_POLL: Duration = Duration::from_millis(100);

impl From<CdpError> for EngineError {
    fn from(e: CdpError) -> Self {
        match e {
            e if e.is_disconnect() => EngineError::Disconnected(e.to_string()),
            CdpError::JavaScript(msg) => EngineError::Script(msg),
            CdpError::NavigationFailed(msg) => EngineError::Navigation(msg),
            CdpError::Timeout(msg) => EngineError::Timeout(msg),
            e => EngineError::Action(e.to_string()),
        }
    }
}

/// What the locator script reports about the element it would act on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub(super) enum Probe {
    Ok {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Missing,
    Covered {
        #[serde(default)]
        by: String,
    },
    Disabled,
    NotEditable,
}

impl Probe {
    /// Turn a non-`Ok` probe into the matching error.
    fn into_error(self, query: &Query) -> EngineError {
        match self {
            Probe::Ok { .. } => EngineError::Action(format!("{query}: unexpected probe result")),
            Probe::Missing => EngineError::NotFound(query.to_string()),
            Probe::Covered { by } => EngineError::Intercepted(format!("{query} (covered by {by})")),
            Probe::Disabled => EngineError::Action(format!("{query} is disabled")),
            Probe::NotEditable => EngineError::Action(format!("{query} is not editable")),
        }
    }
}

/// An editable field as the locator script reports it.
#[derive(Debug, Deserialize)]
pub(super) struct ReportedField {
    selector: String,
    id: Option<String>,
    name: Option<String>,
    placeholder: Option<String>,
    aria_label: Option<String>,
    input_type: Option<String>,
}

impl From<ReportedField> for FieldCandidate {
    fn from(field: ReportedField) -> Self {
        FieldCandidate {
            query: Query::css(field.selector),
            attributes: FieldAttributes {
                id: field.id,
                name: field.name,
                placeholder: field.placeholder,
                aria_label: field.aria_label,
                input_type: field.input_type,
            },
        }
    }
}

/// Drives one Chrome page through CDP.
///
/// Elements are found and checked by an injected locator script; clicks and
/// typing go through `Input.*` so the page sees trusted events.
pub struct CdpEngine {
    page: Arc<PageSession>,
    lifecycle: LifecycleWatch,
}

impl CdpEngine {
    /// Start tracking `page`.
    pub async fn new(page: Arc<PageSession>) -> Result<Self, CdpError> {
        // Subscribe before reading the frame tree so no lifecycle event slips by.
        let events = page.subscribe();
        let main_frame = page.main_frame_id().await?;
        debug!(main_frame = %main_frame, "Tracking page lifecycle");

        Ok(Self {
            lifecycle: LifecycleWatch::spawn(events, main_frame),
            page,
        })
    }

    pub fn page(&self) -> &Arc<PageSession> {
        &self.page
    }

    async fn locate(&self, op: &str, query: Option<&Query>) -> Result<Value, EngineError> {
        let args = [json!(op), serde_json::to_value(query).map_err(CdpError::from)?];
        Ok(self.page.call_function(LOCATOR_JS, &args).await?)
    }

    async fn probe(&self, op: &str, query: &Query) -> Result<Probe, EngineError> {
        let value = self.locate(op, Some(query)).await?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::Script(format!("unexpected {op} result: {e}")))
    }

    async fn is_visible(&self, query: &Query) -> Result<bool, EngineError> {
        Ok(self.locate("visible", Some(query)).await?.as_bool().unwrap_or(false))
    }

    async fn click(&self, query: &Query, force: bool) -> Result<(), EngineError> {
        if force {
            return match self.probe("forceClick", query).await? {
                Probe::Ok { .. } => Ok(()),
                other => Err(other.into_error(query)),
            };
        }

        match self.probe("click", query).await? {
            Probe::Ok { x, y } => Ok(self.page.click(x, y).await?),
            other => Err(other.into_error(query)),
        }
    }

    async fn fill(&self, query: &Query, value: &str) -> Result<(), EngineError> {
        match self.probe("focus", query).await? {
            Probe::Ok { .. } => {}
            other => return Err(other.into_error(query)),
        }

        if value.is_empty() {
            self.locate("clear", None).await?;
        } else {
            // Replaces the selection the focus step made.
            self.page.insert_text(value).await?;
        }
        self.locate("commit", None).await?;
        Ok(())
    }

    async fn url_differs(&self, from: &str) -> Result<bool, CdpError> {
        Ok(self.page.get_url().await? != from)
    }

    async fn document_ready(&self) -> Result<bool, CdpError> {
        Ok(matches!(self.page.ready_state().await?.as_str(), "interactive" | "complete"))
    }

    async fn wait_for_load_state<F>(&self, timeout: Duration, reached: F) -> Result<bool, EngineError>
    where
        F: Fn(&LoadState) -> bool,
    {
        self.lifecycle.wait(timeout, reached).await
    }
}

/// Re-run `check` every `interval` until it holds or `timeout` passes.
///
/// Errors other than a lost connection count as "not yet": mid-navigation the
/// page briefly has no execution context to answer in.
async fn poll<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Result<bool, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, CdpError>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match check().await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) if e.is_disconnect() => return Err(e.into()),
            Err(e) => debug!("Poll check failed: {}", e),
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval).await;
    }
}

#[async_trait]
impl AutomationEngine for CdpEngine {
    async fn navigate(
        &self,
        url: &str,
        until: PageCondition,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        let navigation = self.page.navigate(url).await?;
        let Some(loader) = navigation.loader_id else {
            // Same-document navigation: nothing new to load.
            return Ok(());
        };

        let reached = match &until {
            PageCondition::DomReady => {
                self.wait_for_load_state(timeout, |s| s.is_loader(&loader) && s.dom_content_loaded)
                    .await?
            }
            PageCondition::NetworkIdle => {
                self.wait_for_load_state(timeout, |s| s.is_loader(&loader) && s.network_idle)
                    .await?
            }
            PageCondition::UrlChanged { .. } => self.wait_for(&until, timeout).await?,
        };

        if !reached {
            return Err(EngineError::Timeout(format!(
                "{} not reached within {:?} after navigating to {}",
                until, timeout, url
            )));
        }
        debug!(url, %until, "Navigation settled");
        Ok(())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self.page.get_url().await?)
    }

    async fn count(&self, query: &Query) -> Result<usize, EngineError> {
        let count = self.locate("count", Some(query)).await?;
        Ok(count.as_u64().unwrap_or(0) as usize)
    }

    async fn wait_for_visible(&self, query: &Query, timeout: Duration) -> Result<bool, EngineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_visible(query).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(STATE_POLL).await;
        }
    }

    async fn act(&self, query: &Query, action: &Action) -> Result<(), EngineError> {
        match action {
            Action::Click { force } => self.click(query, *force).await,
            Action::Fill(value) => self.fill(query, value).await,
        }
    }

    async fn press_key(&self, key: &str) -> Result<(), EngineError> {
        Ok(self.page.press_key(key).await?)
    }

    async fn wait_for(
        &self,
        condition: &PageCondition,
        timeout: Duration,
    ) -> Result<bool, EngineError> {
        match condition {
            PageCondition::UrlChanged { from } => {
                poll(timeout, URL_POLL, move || self.url_differs(from)).await
            }
            PageCondition::NetworkIdle => self.wait_for_load_state(timeout, |s| s.network_idle).await,
            PageCondition::DomReady => poll(timeout, STATE_POLL, move || self.document_ready()).await,
        }
    }

    async fn input_fields(&self) -> Result<Vec<FieldCandidate>, EngineError> {
        let value = self.locate("fields", None).await?;
        let fields: Vec<ReportedField> = serde_json::from_value(value)
            .map_err(|e| EngineError::Script(format!("unexpected fields result: {e}")))?;
        Ok(fields.into_iter().map(FieldCandidate::from).collect())
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, EngineError> {
        let value = if args.is_empty() {
            self.page.evaluate(script).await?
        } else {
            self.page.call_function(script, &args).await?
        };
        Ok(value)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
