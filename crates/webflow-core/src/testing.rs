//! In-memory [`AutomationEngine`] for tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use crate::classify::FieldAttributes;
use crate::engine::{Action, AutomationEngine, FieldCandidate, PageCondition, Query};
use crate::error::EngineError;

/// An element on the fake page.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub name: String,
    pub matches: Vec<Query>,
    pub visible: bool,
    pub field: Option<FieldAttributes>,
    /// Unforced clicks fail as if another element covers this one.
    pub covered: bool,
    /// Fills fail; a click first does not help.
    pub read_only: bool,
    /// Clicking loads this address.
    pub navigates_to: Option<String>,
    /// Clicking makes the named element visible.
    pub reveals: Option<String>,
    pub value: String,
}

impl FakeElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matches: Vec::new(),
            visible: true,
            field: None,
            covered: false,
            read_only: false,
            navigates_to: None,
            reveals: None,
            value: String::new(),
        }
    }

    pub fn matching(mut self, query: Query) -> Self {
        self.matches.push(query);
        self
    }

    pub fn field(mut self, attrs: FieldAttributes) -> Self {
        self.field = Some(attrs);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn covered(mut self) -> Self {
        self.covered = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.navigates_to = Some(url.to_string());
        self
    }

    pub fn reveals(mut self, name: &str) -> Self {
        self.reveals = Some(name.to_string());
        self
    }
}

/// Everything the engine was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    WaitVisible(Query),
    Click { element: String, force: bool, ok: bool },
    Fill { element: String, value: String, ok: bool },
    Press(String),
    WaitFor(PageCondition),
}

#[derive(Debug)]
struct FakeState {
    url: String,
    elements: Vec<FakeElement>,
    calls: Vec<(Instant, Call)>,
    network_idle: bool,
    fail_navigation: bool,
    /// The next navigation loads but reports a readiness timeout.
    slow_load: bool,
    disconnected: bool,
}

pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: "about:blank".to_string(),
                elements: Vec::new(),
                calls: Vec::new(),
                network_idle: true,
                fail_navigation: false,
                slow_load: false,
                disconnected: false,
            }),
        }
    }

    pub fn with(self, element: FakeElement) -> Self {
        self.state.lock().elements.push(element);
        self
    }

    pub fn failing_navigation(self) -> Self {
        self.state.lock().fail_navigation = true;
        self
    }

    pub fn slow_first_load(self) -> Self {
        self.state.lock().slow_load = true;
        self
    }

    pub fn disconnected(self) -> Self {
        self.state.lock().disconnected = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.state.lock().calls.clone()
    }

    /// Calls that changed the page: navigations, clicks, fills and keys.
    pub fn actions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::WaitVisible(_) | Call::WaitFor(_)))
            .collect()
    }

    pub fn value_of(&self, name: &str) -> Option<String> {
        let state = self.state.lock();
        state.elements.iter().find(|e| e.name == name).map(|e| e.value.clone())
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.state.lock().disconnected {
            return Err(EngineError::Disconnected("page closed".into()));
        }
        Ok(())
    }
}

impl FakeState {
    fn record(&mut self, call: Call) {
        self.calls.push((Instant::now(), call));
    }

    fn first_visible(&self, query: &Query) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.visible && e.matches.contains(query))
    }
}

#[async_trait]
impl AutomationEngine for FakeEngine {
    async fn navigate(&self, url: &str, _until: PageCondition, _timeout: Duration) -> Result<(), EngineError> {
        self.check()?;
        let mut state = self.state.lock();
        state.record(Call::Navigate(url.to_string()));
        if state.fail_navigation {
            return Err(EngineError::Navigation(format!("cannot load {url}")));
        }
        state.url = url.to_string();
        if std::mem::take(&mut state.slow_load) {
            return Err(EngineError::Timeout("dom ready not reached".into()));
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        self.check()?;
        Ok(self.state.lock().url.clone())
    }

    async fn count(&self, query: &Query) -> Result<usize, EngineError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state.elements.iter().filter(|e| e.matches.contains(query)).count())
    }

    async fn wait_for_visible(&self, query: &Query, timeout: Duration) -> Result<bool, EngineError> {
        self.check()?;
        let found = {
            let mut state = self.state.lock();
            state.record(Call::WaitVisible(query.clone()));
            state.first_visible(query).is_some()
        };
        if !found {
            tokio::time::sleep(timeout).await;
        }
        Ok(found)
    }

    async fn act(&self, query: &Query, action: &Action) -> Result<(), EngineError> {
        self.check()?;
        let mut state = self.state.lock();
        let Some(index) = state.first_visible(query) else {
            return Err(EngineError::NotFound(query.to_string()));
        };
        let element = state.elements[index].clone();

        match action {
            Action::Click { force } => {
                let ok = *force || !element.covered;
                state.record(Call::Click {
                    element: element.name.clone(),
                    force: *force,
                    ok,
                });
                if !ok {
                    return Err(EngineError::Intercepted(element.name));
                }
                if let Some(url) = element.navigates_to {
                    state.url = url;
                }
                if let Some(name) = element.reveals {
                    for other in state.elements.iter_mut().filter(|e| e.name == name) {
                        other.visible = true;
                    }
                }
                Ok(())
            }
            Action::Fill(value) => {
                let ok = !element.read_only;
                state.record(Call::Fill {
                    element: element.name.clone(),
                    value: value.clone(),
                    ok,
                });
                if !ok {
                    return Err(EngineError::Action(format!("{} is read-only", element.name)));
                }
                state.elements[index].value = value.clone();
                Ok(())
            }
        }
    }

    async fn press_key(&self, key: &str) -> Result<(), EngineError> {
        self.check()?;
        self.state.lock().record(Call::Press(key.to_string()));
        Ok(())
    }

    async fn wait_for(&self, condition: &PageCondition, _timeout: Duration) -> Result<bool, EngineError> {
        self.check()?;
        let mut state = self.state.lock();
        state.record(Call::WaitFor(condition.clone()));
        Ok(match condition {
            PageCondition::UrlChanged { from } => state.url != *from,
            PageCondition::NetworkIdle => state.network_idle,
            PageCondition::DomReady => true,
        })
    }

    async fn input_fields(&self) -> Result<Vec<FieldCandidate>, EngineError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state
            .elements
            .iter()
            .filter(|e| e.visible)
            .filter_map(|e| {
                let attributes = e.field.clone()?;
                let query = e.matches.first()?.clone();
                Some(FieldCandidate { query, attributes })
            })
            .collect())
    }

    async fn evaluate(&self, _script: &str, _args: Vec<Value>) -> Result<Value, EngineError> {
        self.check()?;
        Ok(Value::Null)
    }
}
