//! JavaScript execution operations for CDP page session.

use serde_json::{json, Value};

use crate::cdp::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate JavaScript expression in the main world of the main frame.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        Self::evaluation_value(result)
    }

    /// Evaluate JavaScript expression in a specific execution context.
    pub async fn evaluate_in_context(
        &self,
        expression: &str,
        context_id: i64,
    ) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "contextId": context_id,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        Self::evaluation_value(result)
    }

    /// Call a function expression with JSON arguments.
    pub async fn call_function(&self, function: &str, args: &[Value]) -> Result<Value, CdpError> {
        self.evaluate(&Self::invocation(function, args)).await
    }

    /// Expose `window[name]` to page scripts; calls arrive as
    /// `Runtime.bindingCalled` events.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({"name": name})))
            .await?;
        Ok(())
    }

    /// Run `source` in every new document before its own scripts. Returns the
    /// script identifier.
    pub async fn add_script_on_new_document(&self, source: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Page.addScriptToEvaluateOnNewDocument",
                Some(json!({"source": source})),
            )
            .await?;

        result["identifier"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing script identifier".to_string()))
    }

    pub async fn remove_script_on_new_document(&self, identifier: &str) -> Result<(), CdpError> {
        self.call(
            "Page.removeScriptToEvaluateOnNewDocument",
            Some(json!({"identifier": identifier})),
        )
        .await?;
        Ok(())
    }

    /// `(function)(arg, ...)` with the arguments as JSON literals.
    pub(super) fn invocation(function: &str, args: &[Value]) -> String {
        let args: Vec<String> = args.iter().map(Value::to_string).collect();
        format!("({})({})", function.trim(), args.join(", "))
    }

    fn evaluation_value(result: Value) -> Result<Value, CdpError> {
        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }
}
