use super::*;
use crate::cdp::testing::{default_reply, FakeBrowser, Reply, TARGET_ID};
use tokio::sync::broadcast::error::RecvError;

#[tokio::test]
async fn test_call_returns_result() {
    let browser = FakeBrowser::start(|method, params| match method {
        "Browser.getVersion" => Reply::Result(json!({"product": "Chrome/131"})),
        _ => default_reply(method, params),
    })
    .await;
    let client = browser.client().await;

    let result = client.call("Browser.getVersion", None).await.unwrap();
    assert_eq!(result["product"], "Chrome/131");
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_protocol_error() {
    let browser = FakeBrowser::start(|_, _| Reply::Error(-32601, "'Nope.nope' wasn't found")).await;
    let client = browser.client().await;

    match client.call("Nope.nope", None).await {
        Err(CdpError::Protocol { code, message }) => {
            assert_eq!(code, -32601);
            assert!(message.contains("wasn't found"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attach_enables_domains() {
    let browser = FakeBrowser::start(default_reply).await;
    let (_client, page) = browser.page().await;

    assert_eq!(page.target_id(), TARGET_ID);
    assert_eq!(
        browser.methods(),
        [
            "Target.attachToTarget",
            "Page.enable",
            "Runtime.enable",
            "Page.setLifecycleEventsEnabled",
        ]
    );
}

#[tokio::test]
async fn test_events_reach_session_subscribers() {
    let browser = FakeBrowser::start(default_reply).await;
    let (_client, page) = browser.page().await;
    let mut events = page.subscribe();

    browser.emit("Page.lifecycleEvent", json!({"name": "init", "loaderId": "L1"}));

    let event = events.recv().await.unwrap();
    assert_eq!(event.method, "Page.lifecycleEvent");
    assert_eq!(event.params["loaderId"], "L1");
}

#[tokio::test]
async fn test_disconnect_fails_calls_and_ends_events() {
    let browser = FakeBrowser::start(|method, params| match method {
        "Runtime.evaluate" => Reply::Silent,
        _ => default_reply(method, params),
    })
    .await;
    let (client, page) = browser.page().await;
    let mut events = page.subscribe();

    let in_flight = tokio::spawn(async move {
        let result = page.evaluate("1").await;
        (page, result)
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    browser.close();

    let (page, result) = in_flight.await.unwrap();
    assert!(matches!(result, Err(CdpError::SessionClosed)));
    assert!(matches!(events.recv().await, Err(RecvError::Closed)));
    assert!(!client.is_connected());
    assert!(page.is_closed());
    assert!(matches!(
        page.call("Page.enable", None).await,
        Err(CdpError::SessionClosed)
    ));
}

#[test]
fn test_request_id_increment() {
    let id = AtomicU64::new(1);
    assert_eq!(id.fetch_add(1, Ordering::SeqCst), 1);
    assert_eq!(id.fetch_add(1, Ordering::SeqCst), 2);
    assert_eq!(id.load(Ordering::SeqCst), 3);
}
