//! A scripted stand-in for Chrome's browser websocket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::{CdpClient, PageSession};

pub(crate) const SESSION_ID: &str = "SESSION-1";
pub(crate) const TARGET_ID: &str = "TARGET-1";

/// How the fake answers one request.
pub(crate) enum Reply {
    Result(Value),
    Error(i64, &'static str),
    /// Never answer.
    Silent,
}

/// `Runtime.evaluate` result carrying `value`.
pub(crate) fn value(value: Value) -> Reply {
    Reply::Result(json!({"result": {"type": "object", "value": value}}))
}

/// Answers every method the session setup needs.
pub(crate) fn default_reply(method: &str, _params: &Value) -> Reply {
    match method {
        "Target.attachToTarget" => Reply::Result(json!({"sessionId": SESSION_ID})),
        "Page.getFrameTree" => Reply::Result(json!({
            "frameTree": {"frame": {"id": TARGET_ID, "loaderId": "L0", "url": "about:blank"}}
        })),
        "Page.addScriptToEvaluateOnNewDocument" => Reply::Result(json!({"identifier": "1"})),
        _ => Reply::Result(json!({})),
    }
}

enum Control {
    Send(Value),
    Close,
}

pub(crate) struct FakeBrowser {
    ws_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    control: mpsc::UnboundedSender<Control>,
}

impl FakeBrowser {
    /// Accept one client and answer its requests with `responder`.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_url = format!("ws://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (control, mut control_rx) = mpsc::unbounded_channel();

        let log = requests.clone();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            loop {
                tokio::select! {
                    msg = ws.next() => {
                        let Some(Ok(Message::Text(text))) = msg else { break };
                        let request: Value = serde_json::from_str(&text).unwrap();
                        log.lock().push(request.clone());

                        let method = request["method"].as_str().unwrap_or_default();
                        let reply = match responder(method, &request["params"]) {
                            Reply::Result(result) => json!({"id": request["id"], "result": result}),
                            Reply::Error(code, message) => {
                                json!({"id": request["id"], "error": {"code": code, "message": message}})
                            }
                            Reply::Silent => continue,
                        };
                        if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    ctl = control_rx.recv() => match ctl {
                        Some(Control::Send(message)) => {
                            if ws.send(Message::Text(message.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                        Some(Control::Close) | None => {
                            let _ = ws.close(None).await;
                            break;
                        }
                    }
                }
            }
        });

        Self {
            ws_url,
            requests,
            control,
        }
    }

    pub async fn client(&self) -> CdpClient {
        CdpClient::connect_ws("http://127.0.0.1:9", &self.ws_url)
            .await
            .unwrap()
    }

    /// A client with the test page attached.
    pub async fn page(&self) -> (CdpClient, PageSession) {
        let client = self.client().await;
        let page = client.attach_page(TARGET_ID).await.unwrap();
        (client, page)
    }

    /// Push an event for the attached page.
    pub fn emit(&self, method: &str, params: Value) {
        let message = json!({"method": method, "params": params, "sessionId": SESSION_ID});
        let _ = self.control.send(Control::Send(message));
    }

    /// Drop the connection.
    pub fn close(&self) {
        let _ = self.control.send(Control::Close);
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Params of every request for `method`, in order.
    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r["method"] == method)
            .map(|r| r["params"].clone())
            .collect()
    }
}
