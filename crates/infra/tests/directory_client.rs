//! End-to-end tests for the directory client over a mock HTTP server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dirsync_common::EventSink;
use dirsync_core::DirectoryOps;
use dirsync_domain::{
    BulkJob, ClientConfig, Credentials, DirSyncError, JobStatus, Record, UsernameIndex,
};
use dirsync_infra::DirectoryClient;

const CLIENT_SECRET: &str = "client-s3cret-value";
const ACCESS_TOKEN: &str = "tok-xyz-123";

fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new("env-1")
        .with_auth_base_url(server.uri())
        .with_api_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(2))
}

fn client_for(server: &MockServer) -> (Arc<DirectoryClient>, EventSink) {
    let config = test_config(server).with_event_capacity(1024);
    let credentials = Credentials::new("env-1", "client-id", CLIENT_SECRET);
    let client = Arc::new(DirectoryClient::new(config, credentials).unwrap());
    let events = client.events().clone();
    (client, events)
}

async fn mount_token(server: &MockServer, expected_requests: u64) {
    Mock::given(method("POST"))
        .and(path("/env-1/as/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_requests)
        .mount(server)
        .await;
}

fn user_body(id: &str, username: &str) -> serde_json::Value {
    json!({"id": id, "username": username, "name": {"given": "Test"}})
}

#[tokio::test]
async fn concurrent_callers_trigger_one_token_request() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let (client, _events) = client_for(&server);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move { client.test_connection().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    // The token mock's expect(1) is verified when the server drops.
}

#[tokio::test]
async fn pagination_follows_next_links_in_page_order() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let users_path = "/environments/env-1/users";
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path(users_path))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-1", "alpha")]},
            "_links": {"next": {"href": format!("{base}{users_path}?cursor=2")}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(users_path))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-2", "bravo")]},
            "_links": {"next": {"href": format!("{base}{users_path}?cursor=3")}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(users_path))
        .and(query_param("cursor", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-3", "charlie")]},
            "_links": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let users = client.fetch_all_users().await.unwrap();

    let ids: Vec<_> = users.iter().filter_map(Record::id).collect();
    assert_eq!(ids, ["u-1", "u-2", "u-3"]);
}

#[tokio::test]
async fn repeating_next_link_stops_the_walk() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let users_path = "/environments/env-1/users";
    let self_url = format!("{}{users_path}", server.uri());
    Mock::given(method("GET"))
        .and(path(users_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-1", "alpha")]},
            "_links": {"next": {"href": self_url}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let users = client.fetch_all_users().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn failing_page_aborts_the_whole_walk() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let users_path = "/environments/env-1/users";
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path(users_path))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-1", "alpha")]},
            "_links": {"next": {"href": format!("{base}{users_path}?cursor=2")}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The second page fails every attempt; the retry ceiling is 3.
    Mock::given(method("GET"))
        .and(path(users_path))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let result = client.fetch_all_users().await;
    assert!(matches!(result, Err(DirSyncError::Network(_))));
}

#[tokio::test]
async fn rate_limited_call_waits_for_retry_after() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    Mock::given(method("GET"))
        .and(path("/environments/env-1/users/u-1"))
        .respond_with(move |_req: &wiremock::Request| {
            if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429).insert_header("Retry-After", "1")
            } else {
                ResponseTemplate::new(200).set_body_json(user_body("u-1", "alpha"))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let started = Instant::now();
    let user = client.get_user("u-1").await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(user.id(), Some("u-1"));
}

#[tokio::test]
async fn rate_limited_bulk_item_is_delayed_then_succeeds() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("DELETE"))
        .and(path("/environments/env-1/users/u-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/environments/env-1/users/u-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    Mock::given(method("DELETE"))
        .and(path("/environments/env-1/users/u-3"))
        .respond_with(move |_req: &wiremock::Request| {
            if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429).insert_header("Retry-After", "1")
            } else {
                ResponseTemplate::new(204)
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let scheduler = client.scheduler();

    let started = Instant::now();
    let job = BulkJob::delete(vec!["u-1".into(), "u-2".into(), "u-3".into()]);
    let summary = scheduler.submit(job).wait().await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn import_matching_existing_username_patches_instead_of_posting() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("PATCH"))
        .and(path("/environments/env-1/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("u-1", "jbloggs")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/environments/env-1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_body("u-9", "newuser")))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let scheduler = client.scheduler();

    let mut imported = Record::new();
    imported.set("username", json!("  JBloggs "));
    imported.set("name.given", json!("Joe"));

    let mut existing = UsernameIndex::new();
    existing.insert("jbloggs", "u-1");

    let summary = scheduler.submit(BulkJob::create(vec![imported], existing)).wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn events_never_carry_secret_material() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/environments/env-1/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("u-1", "alpha")))
        .mount(&server)
        .await;

    let (client, events) = client_for(&server);
    let mut rx = events.subscribe();
    client.get_user("u-1").await.unwrap();

    let mut seen = 0;
    while let Ok(event) = rx.try_recv() {
        let rendered = serde_json::to_string(&event).unwrap();
        assert!(!rendered.contains(CLIENT_SECRET), "secret leaked: {rendered}");
        assert!(!rendered.contains(ACCESS_TOKEN), "token leaked: {rendered}");
        seen += 1;
    }
    // Auth attempt plus the token POST and user GET api-call events.
    assert!(seen >= 3, "expected events, saw {seen}");
}

#[tokio::test]
async fn event_stream_is_bounded_by_configured_capacity() {
    use tokio::sync::broadcast::error::TryRecvError;

    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/environments/env-1/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("u-1", "alpha")))
        .mount(&server)
        .await;

    let config = test_config(&server).with_event_capacity(2);
    let credentials = Credentials::new("env-1", "client-id", CLIENT_SECRET);
    let client = Arc::new(DirectoryClient::new(config, credentials).unwrap());

    let mut rx = client.events().subscribe();
    // One authenticated GET emits at least three events (auth attempt, token
    // POST, user GET); with a buffer of two the idle subscriber must lag.
    client.get_user("u-1").await.unwrap();

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(_))));
    let mut remaining = 0;
    while rx.try_recv().is_ok() {
        remaining += 1;
    }
    assert_eq!(remaining, 2);
}

#[tokio::test]
async fn fetch_all_returns_populations_and_users_together() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/environments/env-1/populations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"populations": [
                {"id": "p-1", "name": "Default"},
                {"id": "p-2", "name": "Contractors"}
            ]},
            "_links": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/environments/env-1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"users": [user_body("u-1", "alpha")]},
            "_links": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _events) = client_for(&server);
    let (populations, users) = client.fetch_all().await.unwrap();

    assert_eq!(populations.name("p-2"), Some("Contractors"));
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username(), Some("alpha"));
}
