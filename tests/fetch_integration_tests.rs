//! Integration tests for the user source and the load flow
//!
//! - `HttpUserSource` against a local wiremock server (success, HTTP errors,
//!   malformed bodies, timeouts)
//! - `load_records` driving the StateManager with a mocked source

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;
use usertable::models::{EditField, LoadStatus, Record};
use usertable::services::{FetchError, HttpUserSource, UserSource, load_records};
use usertable::{StateChange, StateManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mock! {
    pub Source {}

    #[async_trait]
    impl UserSource for Source {
        async fn fetch_users(&self) -> Result<Vec<Record>, FetchError>;
        fn describe(&self) -> String;
    }
}

fn users_body() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": { "street": "Kulas Light", "city": "Gwenborough" }
        },
        {
            "id": 2,
            "name": "Ervin Howell",
            "username": "Antonette",
            "email": "Shanna@melissa.tv"
        }
    ])
}

async fn source_for(server: &MockServer, timeout: Duration) -> HttpUserSource {
    HttpUserSource::new(format!("{}/users", server.uri()), timeout).unwrap()
}

// ── HttpUserSource ──────────────────────────────────────────────

#[tokio::test]
async fn http_source_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_body()))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let records = source.fetch_users().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].name, "Leanne Graham");
    assert_eq!(records[0].extra["username"], "Bret");
    assert_eq!(records[0].extra["address"]["city"], "Gwenborough");
    assert_eq!(records[1].email, "Shanna@melissa.tv");
}

#[tokio::test]
async fn http_source_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let err = source.fetch_users().await.unwrap_err();

    assert!(matches!(err, FetchError::Status(503)), "got {:?}", err);
}

#[tokio::test]
async fn http_source_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let err = source.fetch_users().await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn http_source_rejects_records_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "x" }])))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    assert!(matches!(
        source.fetch_users().await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn http_source_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_millis(200)).await;
    let err = source.fetch_users().await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn http_source_unreachable_host() {
    // Port 9 (discard) on localhost is almost never listening
    let source = HttpUserSource::new("http://127.0.0.1:9/users", Duration::from_secs(2)).unwrap();
    let err = source.fetch_users().await.unwrap_err();

    assert!(
        matches!(err, FetchError::Transport(_) | FetchError::Timeout(_)),
        "got {:?}",
        err
    );
}

// ── load_records ────────────────────────────────────────────────

#[tokio::test]
async fn load_populates_state() {
    let mut source = MockSource::new();
    source.expect_describe().return_const("mock".to_string());
    source
        .expect_fetch_users()
        .times(1)
        .returning(|| Ok(vec![Record::new(1, "Bob", "b@x.com"), Record::new(2, "Ann", "a@x.com")]));

    let state = StateManager::new();
    let changes = load_records(&source, &state).await;

    assert!(changes.contains(&StateChange::RecordsReplaced { count: 2 }));
    let snapshot = state.snapshot();
    assert_eq!(snapshot.load_status, LoadStatus::Loaded);
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(state.metrics().fetches_succeeded.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn failed_load_surfaces_reason() {
    let mut source = MockSource::new();
    source.expect_describe().return_const("mock".to_string());
    source
        .expect_fetch_users()
        .times(1)
        .returning(|| Err(FetchError::Status(404)));

    let state = StateManager::new();
    load_records(&source, &state).await;

    let snapshot = state.snapshot();
    assert_eq!(
        snapshot.load_status,
        LoadStatus::Failed("Server responded with HTTP 404".to_string())
    );
    assert!(snapshot.records.is_empty());
    assert_eq!(state.metrics().fetches_failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn retry_after_failure_recovers() {
    let mut source = MockSource::new();
    source.expect_describe().return_const("mock".to_string());

    let mut seq = mockall::Sequence::new();
    source
        .expect_fetch_users()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(FetchError::Transport("connection reset".to_string())));
    source
        .expect_fetch_users()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(vec![Record::new(7, "Glenna", "g@x.com")]));

    let state = StateManager::new();
    let mut rx = state.subscribe();

    load_records(&source, &state).await;
    assert!(state.read(|s| s.load_status.is_failed()));

    let changes = load_records(&source, &state).await;
    assert_eq!(
        changes,
        vec![
            StateChange::LoadStatusChanged {
                status: LoadStatus::Loading
            },
            StateChange::LoadStatusChanged {
                status: LoadStatus::Loaded
            },
            StateChange::RecordsReplaced { count: 1 },
        ]
    );

    // First event on the channel is the failure from the first attempt
    let first = rx.recv().await.unwrap();
    assert!(matches!(
        first,
        StateChange::LoadStatusChanged {
            status: LoadStatus::Failed(_)
        }
    ));
}

#[tokio::test]
async fn reload_replaces_wholesale_and_drops_edit() {
    let mut source = MockSource::new();
    source.expect_describe().return_const("mock".to_string());
    source
        .expect_fetch_users()
        .returning(|| Ok(vec![Record::new(1, "Bob", "b@x.com")]));

    let state = StateManager::new();
    load_records(&source, &state).await;

    state.begin_edit(1).unwrap();
    state.change_draft(EditField::Name, "Robert");
    state.save_edit();
    state.begin_edit(1).unwrap();

    let changes = load_records(&source, &state).await;
    assert!(changes.contains(&StateChange::EditCancelled { id: 1 }));

    // Saved edits live only in memory; a reload brings back the source data
    assert_eq!(state.read(|s| s.record(1).unwrap().name.clone()), "Bob");
    assert_eq!(state.read(|s| s.edit.active_id()), None);
}

#[tokio::test]
async fn end_to_end_with_http_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_body()))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let state = StateManager::new();
    load_records(&source, &state).await;

    state.set_search_text("ERVIN");
    let visible = state.visible_records();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, 2);
}
