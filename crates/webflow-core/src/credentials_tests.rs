use super::*;
use crate::classify::FieldAttributes;
use crate::testing::{Call, FakeElement, FakeEngine};

fn creds() -> Credentials {
    Credentials::new(Some("alice@example.test".into()), Some("s3cr3t".into()))
}

fn typed(input_type: &str) -> FieldAttributes {
    FieldAttributes {
        input_type: Some(input_type.into()),
        ..Default::default()
    }
}

fn login_page() -> FakeEngine {
    FakeEngine::new()
        .with(
            FakeElement::new("search")
                .matching(Query::xpath("//input[1]"))
                .field(typed("search")),
        )
        .with(
            FakeElement::new("email")
                .matching(Query::xpath("//input[2]"))
                .field(typed("email")),
        )
        .with(
            FakeElement::new("password")
                .matching(Query::xpath("//input[3]"))
                .field(typed("password")),
        )
}

#[test]
fn test_value_for_kind() {
    let c = creds();
    assert_eq!(c.value_for(FieldKind::Identity), Some("alice@example.test"));
    assert_eq!(c.value_for(FieldKind::Secret), Some("s3cr3t"));
    assert_eq!(c.value_for(FieldKind::Unclassified), None);

    let blank = Credentials::new(Some(String::new()), None);
    assert!(blank.is_empty());
}

#[test]
fn test_debug_hides_values() {
    let debug = format!("{:?}", creds());
    assert!(!debug.contains("s3cr3t"));
    assert!(!debug.contains("alice"));
}

#[tokio::test]
async fn test_autofill_uses_classified_fields() {
    let engine = login_page();
    let outcome = autofill(&engine, &creds()).await.unwrap();

    assert_eq!(outcome, AutofillOutcome { identity: true, secret: true });
    assert_eq!(engine.value_of("email").as_deref(), Some("alice@example.test"));
    assert_eq!(engine.value_of("password").as_deref(), Some("s3cr3t"));
    assert_eq!(engine.value_of("search").as_deref(), Some(""));
}

#[tokio::test]
async fn test_explicit_selector_takes_precedence() {
    let engine = login_page().with(FakeElement::new("custom").matching(Query::css("#pin")));
    let mut credentials = creds();
    credentials.secret_selector = Some("#pin".into());

    autofill(&engine, &credentials).await.unwrap();
    assert_eq!(engine.value_of("custom").as_deref(), Some("s3cr3t"));
    assert_eq!(engine.value_of("password").as_deref(), Some(""));
}

#[tokio::test]
async fn test_missing_explicit_selector_falls_back() {
    let engine = login_page();
    let mut credentials = creds();
    credentials.identity_selector = Some("#no-such-field".into());

    let outcome = autofill(&engine, &credentials).await.unwrap();
    assert!(outcome.identity);
    assert_eq!(engine.value_of("email").as_deref(), Some("alice@example.test"));
}

#[tokio::test]
async fn test_failed_fill_tries_next_field() {
    let engine = FakeEngine::new()
        .with(
            FakeElement::new("locked")
                .matching(Query::xpath("//input[1]"))
                .field(typed("password"))
                .read_only(),
        )
        .with(
            FakeElement::new("password")
                .matching(Query::xpath("//input[2]"))
                .field(typed("password")),
        );
    let outcome = autofill(&engine, &Credentials::new(None, Some("pw".into())))
        .await
        .unwrap();

    assert_eq!(outcome, AutofillOutcome { identity: false, secret: true });
    assert_eq!(engine.value_of("password").as_deref(), Some("pw"));
}

#[tokio::test]
async fn test_nothing_configured_touches_nothing() {
    let engine = login_page();
    let outcome = autofill(&engine, &Credentials::default()).await.unwrap();
    assert!(!outcome.any());
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_page_without_fields() {
    let engine = FakeEngine::new();
    let outcome = autofill(&engine, &creds()).await.unwrap();
    assert!(!outcome.any());
    assert!(!engine.calls().iter().any(|c| matches!(c, Call::Fill { .. })));
}
