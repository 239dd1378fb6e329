//! Credentials supplied at replay time, and autofill of login forms.

use std::fmt;

use tracing::{debug, info, warn};

use crate::classify::{classify, FieldKind};
use crate::engine::{Action, AutomationEngine, Query};
use crate::error::EngineError;

/// Identity and secret to type into masked fields.
#[derive(Clone, Default)]
pub struct Credentials {
    pub identity: Option<String>,
    pub secret: Option<String>,
    /// CSS selector that overrides identity field discovery.
    pub identity_selector: Option<String>,
    /// CSS selector that overrides secret field discovery.
    pub secret_selector: Option<String>,
}

impl Credentials {
    pub fn new(identity: Option<String>, secret: Option<String>) -> Self {
        Self {
            identity,
            secret,
            ..Default::default()
        }
    }

    /// The value that fills a field of `kind`, if one is configured.
    pub fn value_for(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Identity => self.identity.as_deref(),
            FieldKind::Secret => self.secret.as_deref(),
            FieldKind::Unclassified => None,
        }
        .filter(|v| !v.is_empty())
    }

    fn selector_for(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Identity => self.identity_selector.as_deref(),
            FieldKind::Secret => self.secret_selector.as_deref(),
            FieldKind::Unclassified => None,
        }
        .map(str::trim)
        .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.value_for(FieldKind::Identity).is_none() && self.value_for(FieldKind::Secret).is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity.as_ref().map(|_| "<set>"))
            .field("secret", &self.secret.as_ref().map(|_| "<hidden>"))
            .field("identity_selector", &self.identity_selector)
            .field("secret_selector", &self.secret_selector)
            .finish()
    }
}

/// Which fields an autofill pass managed to fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutofillOutcome {
    pub identity: bool,
    pub secret: bool,
}

impl AutofillOutcome {
    pub fn any(&self) -> bool {
        self.identity || self.secret
    }
}

/// Fill whatever credential fields the current page shows.
///
/// An explicit selector is tried first when configured; otherwise, or when
/// it matches nothing, the first visible field that classifies as the right
/// kind is used. Only a disconnected engine is an error.
pub async fn autofill(
    engine: &dyn AutomationEngine,
    credentials: &Credentials,
) -> Result<AutofillOutcome, EngineError> {
    let mut outcome = AutofillOutcome::default();
    if credentials.is_empty() {
        return Ok(outcome);
    }

    let fields = match engine.input_fields().await {
        Ok(fields) => fields,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            debug!(error = %e, "Could not list input fields");
            Vec::new()
        }
    };

    for kind in [FieldKind::Identity, FieldKind::Secret] {
        let Some(value) = credentials.value_for(kind) else {
            continue;
        };

        let mut targets: Vec<Query> = Vec::new();
        if let Some(selector) = credentials.selector_for(kind) {
            targets.push(Query::css(selector));
        }
        targets.extend(
            fields
                .iter()
                .filter(|f| classify(&f.attributes) == kind)
                .map(|f| f.query.clone()),
        );

        let mut filled = false;
        for query in targets {
            match fill_if_present(engine, &query, value).await {
                Ok(true) => {
                    info!(field = %kind, query = %query, "Autofilled credential");
                    filled = true;
                    break;
                }
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(field = %kind, query = %query, error = %e, "Autofill attempt failed"),
            }
        }

        match kind {
            FieldKind::Identity => outcome.identity = filled,
            FieldKind::Secret => outcome.secret = filled,
            FieldKind::Unclassified => {}
        }
    }

    Ok(outcome)
}

async fn fill_if_present(
    engine: &dyn AutomationEngine,
    query: &Query,
    value: &str,
) -> Result<bool, EngineError> {
    if engine.count(query).await? == 0 {
        return Ok(false);
    }
    engine.act(query, &Action::Fill(value.to_string())).await?;
    Ok(true)
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
