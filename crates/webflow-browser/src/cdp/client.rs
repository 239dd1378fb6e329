//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpEvent, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type EventRoutes = Arc<RwLock<HashMap<String, broadcast::Sender<CdpEvent>>>>;

/// How long a single command may wait for its response.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Events buffered per session before slow subscribers start lagging.
const EVENT_BUFFER: usize = 512;

/// Pending request waiting for response.
struct PendingRequest {
    tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// The websocket shared by the client and every page session.
pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    closed: AtomicBool,
}

impl Connection {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if self.is_closed() {
            return Err(CdpError::SessionClosed);
        }
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });
        // The receive loop may have drained `pending` between the check above and the insert.
        if self.is_closed() {
            self.pending.lock().remove(&id);
            return Err(CdpError::SessionClosed);
        }

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fail every in-flight request once the socket is gone.
    fn shut_down(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let pending: Vec<PendingRequest> = self.pending.lock().drain().map(|(_, p)| p).collect();
        for request in pending {
            let _ = request.tx.send(Err(CdpError::SessionClosed));
        }
    }
}

/// CDP client for browser automation.
///
/// Connects to Chrome via WebSocket and routes responses back to callers and
/// events to the page session they belong to.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    conn: Arc<Connection>,
    /// Event fan-out by session ID.
    event_routes: EventRoutes,
    /// Background task handle.
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://localhost:9222").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = Url::parse(endpoint)?.as_str().trim_end_matches('/').to_string();

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);

        Self::connect_ws(&http_endpoint, &version.web_socket_debugger_url).await
    }

    /// Connect straight to a known browser websocket.
    pub async fn connect_ws(http_endpoint: &str, browser_ws_url: &str) -> Result<Self, CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let conn = Arc::new(Connection {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });
        let event_routes: EventRoutes = Arc::new(RwLock::new(HashMap::new()));

        let recv_task = {
            let conn = conn.clone();
            let event_routes = event_routes.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, &conn, &event_routes).await;
                conn.shut_down();
                // Dropping the senders ends every session's event stream.
                event_routes.write().await.clear();
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint: http_endpoint.trim_end_matches('/').to_string(),
            browser_ws_url: browser_ws_url.to_string(),
            conn,
            event_routes,
            _recv_task: recv_task,
        })
    }

    /// WebSocket receive loop.
    async fn receive_loop(mut ws_source: WsSource, conn: &Connection, event_routes: &EventRoutes) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => {
                            if let Some(id) = resp.id {
                                let pending_req = conn.pending.lock().remove(&id);
                                if let Some(req) = pending_req {
                                    let result = if let Some(error) = resp.error {
                                        Err(CdpError::Protocol {
                                            code: error.code,
                                            message: error.message,
                                        })
                                    } else {
                                        Ok(resp.result.unwrap_or(Value::Null))
                                    };
                                    let _ = req.tx.send(result);
                                }
                            } else if resp.method.is_some() {
                                let session_id = resp.session_id.clone().unwrap_or_default();
                                let routes = event_routes.read().await;
                                if let (Some(tx), Some(event)) = (routes.get(&session_id), resp.into_event()) {
                                    // No subscribers is fine.
                                    let _ = tx.send(event);
                                }
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Send a browser-level CDP command and wait for response.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, None).await
    }

    /// Get browser WebSocket URL.
    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Whether the websocket is still open.
    pub fn is_connected(&self) -> bool {
        !self.conn.is_closed()
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// Create a new page/tab and attach to it.
    pub async fn new_page(&self, url: Option<&str>) -> Result<PageSession, CdpError> {
        // Chrome requires PUT method for /json/new
        let create_url = match url {
            Some(u) => format!("{}/json/new?{}", self.http_endpoint, u),
            None => format!("{}/json/new", self.http_endpoint),
        };

        let client = reqwest::Client::new();
        let page_info: PageInfo = client.put(&create_url).send().await?.json().await?;
        debug!("Created new page: {} - {}", page_info.id, page_info.url);

        self.attach_page(&page_info.id).await
    }

    /// Attach to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = broadcast::channel(EVENT_BUFFER);
        self.event_routes
            .write()
            .await
            .insert(session_id.clone(), event_tx);

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.conn.clone(),
            event_rx,
        );

        session.enable_domains().await?;

        Ok(session)
    }

    /// Close a page and stop routing its events.
    pub async fn close_page(&self, page: &PageSession) -> Result<(), CdpError> {
        self.event_routes.write().await.remove(page.session_id());
        self.call(
            "Target.closeTarget",
            Some(json!({"targetId": page.target_id()})),
        )
        .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
        self.conn.shut_down();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
