use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use super::*;
use crate::event::Selectors;
use crate::redaction::REDACTION_MARKER;
use crate::testing::{Call, FakeElement, FakeEngine};

const LOGIN: &str = "https://example.test/login";
const HOME: &str = "https://example.test/home";

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
}

fn event(ms: i64, payload: EventPayload) -> Event {
    Event::at(at(ms), payload, Some(LOGIN.to_string()))
}

fn nav(ms: i64, to: &str) -> Event {
    event(
        ms,
        EventPayload::Nav {
            from_url: None,
            to_url: Some(to.to_string()),
        },
    )
}

fn input(ms: i64, el: ElementDescriptor, value: &str) -> Event {
    event(
        ms,
        EventPayload::Input {
            el: Some(el),
            input_value: Some(value.to_string()),
        },
    )
}

fn click(ms: i64, el: ElementDescriptor) -> Event {
    event(
        ms,
        EventPayload::Click {
            x: 10.0,
            y: 10.0,
            button: Default::default(),
            el: Some(el),
        },
    )
}

fn key(ms: i64, key: &str) -> Event {
    event(
        ms,
        EventPayload::Keydown {
            key: key.to_string(),
            code: String::new(),
            ctrl: false,
            alt: false,
            shift: false,
            meta_key: false,
        },
    )
}

fn field(id: &str, input_type: &str) -> ElementDescriptor {
    ElementDescriptor {
        tag: Some("input".into()),
        id: Some(id.into()),
        input_type: Some(input_type.into()),
        value_preview: Some(REDACTION_MARKER.into()),
        selectors: Selectors {
            css: Some(format!("#{id}")),
            xpath: None,
        },
        ..Default::default()
    }
}

fn sign_in_button() -> ElementDescriptor {
    ElementDescriptor {
        tag: Some("button".into()),
        text: Some("Sign In".into()),
        ..Default::default()
    }
}

fn credentials() -> Credentials {
    Credentials::new(Some("alice@example.test".into()), Some("s3cr3t".into()))
}

fn login_page() -> FakeEngine {
    FakeEngine::new()
        .with(FakeElement::new("email").matching(Query::css("#email")))
        .with(FakeElement::new("password").matching(Query::css("#password")))
        .with(
            FakeElement::new("sign-in")
                .matching(Query::role("button", "Sign In"))
                .navigates_to(HOME),
        )
}

fn login_session() -> Vec<Event> {
    vec![
        nav(0, LOGIN),
        input(800, field("email", "email"), REDACTION_MARKER),
        input(1600, field("password", "password"), REDACTION_MARKER),
        click(2100, sign_in_button()),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_login_flow_fills_credentials_and_waits_for_navigation() {
    let engine = login_page();
    let mut replayer = Replayer::new(&engine, ReplayOptions::default()).with_credentials(credentials());

    let report = replayer.run(&login_session()).await.unwrap();

    assert_eq!(report.performed, 4);
    assert!(report.skipped.is_empty());
    assert_eq!(replayer.state(), ReplayState::Finished);
    assert_eq!(
        engine.actions(),
        [
            Call::Navigate(LOGIN.into()),
            Call::Fill {
                element: "email".into(),
                value: "alice@example.test".into(),
                ok: true
            },
            Call::Fill {
                element: "password".into(),
                value: "s3cr3t".into(),
                ok: true
            },
            Call::Click {
                element: "sign-in".into(),
                force: false,
                ok: true
            },
        ]
    );

    let calls = engine.calls();
    let clicked = calls
        .iter()
        .position(|c| matches!(c, Call::Click { .. }))
        .unwrap();
    assert_eq!(
        calls[clicked + 1],
        Call::WaitFor(PageCondition::UrlChanged { from: LOGIN.into() })
    );

    // The marker itself is never typed into the page.
    assert!(!calls.iter().any(|c| matches!(c, Call::Fill { value, .. } if value == REDACTION_MARKER)));
}

#[tokio::test(start_paused = true)]
async fn test_steps_follow_recorded_timing() {
    let engine = login_page();
    let options = ReplayOptions {
        timescale: 2.0,
        autofill_on_navigation: false,
        ..Default::default()
    };
    let events = vec![key(0, "Enter"), key(600, "Tab"), key(10_600, "Escape")];

    Replayer::new(&engine, options).run(&events).await.unwrap();

    let presses: Vec<_> = engine
        .timed_calls()
        .into_iter()
        .filter(|(_, c)| matches!(c, Call::Press(_)))
        .map(|(t, _)| t)
        .collect();
    assert_eq!(presses.len(), 3);
    assert_eq!(presses[1] - presses[0], Duration::from_millis(300));
    // 10s gap capped at 1.5s, then halved.
    assert_eq!(presses[2] - presses[1], Duration::from_millis(750));
}

#[tokio::test(start_paused = true)]
async fn test_printable_keys_are_not_replayed() {
    let engine = login_page();
    let events = vec![key(0, "a"), key(10, "Enter"), key(20, "Shift")];

    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&events)
        .await
        .unwrap();

    let presses: Vec<Call> = engine
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Press(_)))
        .collect();
    assert_eq!(presses, [Call::Press("Enter".into())]);
    assert_eq!(report.performed, 1);
    assert_eq!(report.informational, 2);
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_click_is_skipped_and_replay_continues() {
    let engine = login_page();
    let missing = ElementDescriptor {
        tag: Some("button".into()),
        id: Some("gone".into()),
        ..Default::default()
    };
    let events = vec![nav(0, LOGIN), click(100, missing), key(200, "Enter")];

    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&events)
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert!(report.skipped[0].reason.contains("button#gone"));
    assert!(engine.calls().contains(&Call::Press("Enter".into())));
}

#[tokio::test(start_paused = true)]
async fn test_covered_click_retries_forced() {
    let engine = FakeEngine::new().with(
        FakeElement::new("sign-in")
            .matching(Query::role("button", "Sign In"))
            .covered(),
    );
    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&[click(0, sign_in_button())])
        .await
        .unwrap();

    assert_eq!(report.performed, 1);
    let clicks: Vec<Call> = engine
        .actions()
        .into_iter()
        .filter(|c| matches!(c, Call::Click { .. }))
        .collect();
    assert_eq!(
        clicks,
        [
            Call::Click {
                element: "sign-in".into(),
                force: false,
                ok: false
            },
            Call::Click {
                element: "sign-in".into(),
                force: true,
                ok: true
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_masked_unclassified_input_is_skipped() {
    let engine = FakeEngine::new().with(FakeElement::new("otp").matching(Query::css("#otp")));
    let otp = field("otp", "text");

    let report = Replayer::new(&engine, ReplayOptions::default())
        .with_credentials(credentials())
        .run(&[input(0, otp, REDACTION_MARKER)])
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("credential"));
    assert!(!engine.actions().iter().any(|c| matches!(c, Call::Fill { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_masked_input_without_credential_is_skipped() {
    let engine = login_page();
    let report = Replayer::new(&engine, ReplayOptions::default())
        .with_credentials(Credentials::new(Some("alice".into()), None))
        .run(&[input(0, field("password", "password"), REDACTION_MARKER)])
        .await
        .unwrap();

    assert_eq!(report.skipped[0].reason, "No secret credential configured");
    assert_eq!(engine.value_of("password").as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_plain_input_fills_recorded_value() {
    let engine = FakeEngine::new().with(FakeElement::new("search").matching(Query::css("#q")));
    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&[input(0, field("q", "search"), "rust async")])
        .await
        .unwrap();

    assert_eq!(report.performed, 1);
    assert_eq!(engine.value_of("search").as_deref(), Some("rust async"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_fill_clicks_then_gives_up() {
    let engine = FakeEngine::new().with(FakeElement::new("q").matching(Query::css("#q")).read_only());
    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&[input(0, field("q", "search"), "x")])
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    let fills = engine
        .actions()
        .iter()
        .filter(|c| matches!(c, Call::Fill { .. }))
        .count();
    assert_eq!(fills, 2);
    assert!(engine.actions().iter().any(|c| matches!(c, Call::Click { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_transitional_click_runs_autofill() {
    let engine = FakeEngine::new()
        .with(
            FakeElement::new("next")
                .matching(Query::role("button", "Next"))
                .reveals("password"),
        )
        .with(
            FakeElement::new("password")
                .matching(Query::css("#pw"))
                .field(FieldAttributes {
                    input_type: Some("password".into()),
                    ..Default::default()
                })
                .hidden(),
        );
    // The visible text reads as transitional even though the aria-label does not.
    let next = ElementDescriptor {
        tag: Some("button".into()),
        text: Some("Next".into()),
        aria_label: Some("Primary".into()),
        ..Default::default()
    };
    let options = ReplayOptions {
        autofill_on_navigation: false,
        ..Default::default()
    };

    Replayer::new(&engine, options)
        .with_credentials(credentials())
        .run(&[nav(0, LOGIN), click(100, next)])
        .await
        .unwrap();

    assert_eq!(engine.value_of("password").as_deref(), Some("s3cr3t"));
    let actions = engine.actions();
    let click_at = actions.iter().position(|c| matches!(c, Call::Click { .. })).unwrap();
    let fill_at = actions.iter().position(|c| matches!(c, Call::Fill { .. })).unwrap();
    assert!(click_at < fill_at);
}

#[test]
fn test_transitional_label_checks_text_aria_and_title() {
    let mut el = ElementDescriptor {
        tag: Some("button".into()),
        aria_label: Some("Primary".into()),
        text: Some("Sign in".into()),
        ..Default::default()
    };
    assert_eq!(transitional_label(&el), Some("Sign in"));

    el.text = Some("Go".into());
    el.title = Some("Continue to your account".into());
    assert_eq!(transitional_label(&el), Some("Continue to your account"));

    el.title = None;
    assert_eq!(transitional_label(&el), None);
}

#[tokio::test(start_paused = true)]
async fn test_start_page_autofilled_without_navigation_autofill() {
    let engine = FakeEngine::new().with(
        FakeElement::new("email")
            .matching(Query::css("#email"))
            .field(FieldAttributes {
                input_type: Some("email".into()),
                ..Default::default()
            }),
    );
    let options = ReplayOptions {
        autofill_on_navigation: false,
        ..Default::default()
    };

    Replayer::new(&engine, options)
        .with_credentials(credentials())
        .run(&[nav(0, LOGIN)])
        .await
        .unwrap();

    assert_eq!(engine.value_of("email").as_deref(), Some("alice@example.test"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_start_page_is_not_fatal() {
    let engine = login_page().slow_first_load();
    let mut replayer = Replayer::new(&engine, ReplayOptions::default()).with_credentials(credentials());

    let report = replayer.run(&login_session()).await.unwrap();

    assert_eq!(report.performed, 4);
    assert!(report.skipped.is_empty());
    assert_eq!(engine.value_of("password").as_deref(), Some("s3cr3t"));
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::WaitFor(PageCondition::NetworkIdle))));
}

#[tokio::test(start_paused = true)]
async fn test_nav_to_current_page_does_not_reload() {
    let engine = login_page();
    Replayer::new(&engine, ReplayOptions::default())
        .run(&[nav(0, LOGIN), nav(100, LOGIN)])
        .await
        .unwrap();

    let navigations = engine
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Navigate(_)))
        .count();
    assert_eq!(navigations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_initial_navigation_failure_is_fatal() {
    let engine = login_page().failing_navigation();
    let err = Replayer::new(&engine, ReplayOptions::default())
        .run(&login_session())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::InitialNavigation { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_lost_engine_ends_replay() {
    let engine = login_page().disconnected();
    let err = Replayer::new(&engine, ReplayOptions::default())
        .run(&login_session())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::InitialNavigation { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_first_step() {
    let engine = login_page();
    let token = CancellationToken::new();
    token.cancel();

    let report = Replayer::new(&engine, ReplayOptions::default())
        .with_cancellation(token)
        .run(&login_session())
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.processed(), 0);
}

#[tokio::test]
async fn test_empty_session() {
    let engine = FakeEngine::new();
    let report = Replayer::new(&engine, ReplayOptions::default())
        .run(&[])
        .await
        .unwrap();
    assert_eq!(report.total, 0);
    assert!(engine.calls().is_empty());
}

#[test]
fn test_start_url_prefers_first_nav() {
    let mut events = vec![key(0, "Tab"), nav(10, HOME)];
    assert_eq!(Replayer::start_url(&events), Some(HOME));

    events.remove(1);
    assert_eq!(Replayer::start_url(&events), Some(LOGIN));
}

#[test]
fn test_transitional_labels() {
    for label in ["Continue", "Next step", "Log in", "Sign In", "submit"] {
        assert!(is_transitional(label), "{label}");
    }
    assert!(!is_transitional("Cancel"));
}
