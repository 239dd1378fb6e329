//! A scripted page for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use webflow_core::{Action, AutomationEngine, EngineError, FieldCandidate, PageCondition, Query};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Navigate(String),
    Click(String),
    Fill(String, String),
    Press(String),
}

struct Element {
    name: String,
    queries: Vec<Query>,
    navigates_to: Option<String>,
}

struct Page {
    url: String,
    elements: Vec<Element>,
    steps: Vec<Step>,
}

/// Elements are always visible; clicks may load a new address.
pub struct ScriptedPage {
    page: Mutex<Page>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self {
            page: Mutex::new(Page {
                url: "about:blank".to_string(),
                elements: Vec::new(),
                steps: Vec::new(),
            }),
        }
    }

    pub fn element(self, name: &str, queries: Vec<Query>, navigates_to: Option<&str>) -> Self {
        self.page.lock().elements.push(Element {
            name: name.to_string(),
            queries,
            navigates_to: navigates_to.map(str::to_string),
        });
        self
    }

    pub fn steps(&self) -> Vec<Step> {
        self.page.lock().steps.clone()
    }

    pub fn url(&self) -> String {
        self.page.lock().url.clone()
    }
}

impl Page {
    fn find(&self, query: &Query) -> Option<usize> {
        self.elements.iter().position(|e| e.queries.contains(query))
    }
}

#[async_trait]
impl AutomationEngine for ScriptedPage {
    async fn navigate(&self, url: &str, _until: PageCondition, _timeout: Duration) -> Result<(), EngineError> {
        let mut page = self.page.lock();
        page.url = url.to_string();
        page.steps.push(Step::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self.url())
    }

    async fn count(&self, query: &Query) -> Result<usize, EngineError> {
        Ok(usize::from(self.page.lock().find(query).is_some()))
    }

    async fn wait_for_visible(&self, query: &Query, _timeout: Duration) -> Result<bool, EngineError> {
        Ok(self.page.lock().find(query).is_some())
    }

    async fn act(&self, query: &Query, action: &Action) -> Result<(), EngineError> {
        let mut page = self.page.lock();
        let index = page
            .find(query)
            .ok_or_else(|| EngineError::NotFound(query.to_string()))?;
        let name = page.elements[index].name.clone();
        match action {
            Action::Click { .. } => {
                if let Some(url) = page.elements[index].navigates_to.clone() {
                    page.url = url;
                }
                page.steps.push(Step::Click(name));
            }
            Action::Fill(value) => page.steps.push(Step::Fill(name, value.clone())),
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), EngineError> {
        self.page.lock().steps.push(Step::Press(key.to_string()));
        Ok(())
    }

    async fn wait_for(&self, condition: &PageCondition, _timeout: Duration) -> Result<bool, EngineError> {
        Ok(match condition {
            PageCondition::UrlChanged { from } => self.url() != *from,
            PageCondition::NetworkIdle | PageCondition::DomReady => true,
        })
    }

    async fn input_fields(&self) -> Result<Vec<FieldCandidate>, EngineError> {
        Ok(Vec::new())
    }

    async fn evaluate(&self, _script: &str, _args: Vec<Value>) -> Result<Value, EngineError> {
        Ok(Value::Null)
    }
}
