//! End-to-end tests for the resource clients against a mocked portal API.

use super::*;
use crate::models::{CreateLead, CreateSupportRequest, PageParams, StatsSnapshot};
use crate::query::QueryStatus;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lead_json(id: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Aigerim",
        "phone_number": "+77011234567",
        "announcement_id": "flat-42",
        "created_at": "2024-03-10T09:00:00"
    })
}

fn page_json(items: Vec<Value>) -> Value {
    json!({ "total": items.len(), "size": 12, "support_requests": items })
}

fn stats_json(sold: &str, price: &str, days: &str, news: &str) -> Value {
    json!({
        "apartments_sold_monthly": sold,
        "average_price_one_room": price,
        "avg_sale_days": days,
        "news_message": news
    })
}

fn api_with(config: ClientConfig) -> Api {
    Api::new(&config, Arc::new(NoCredentials)).unwrap()
}

fn api_for(server: &MockServer) -> Api {
    api_with(ClientConfig::new(server.uri()))
}

fn auth_headers(requests: &[wiremock::Request]) -> Vec<Option<String>> {
    requests
        .iter()
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_string())
        })
        .collect()
}

// ==================== Listing ====================

#[tokio::test]
async fn test_list_defaults_to_first_page_of_twelve() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![lead_json("l-1")])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.client().base_url(), server.uri());
    assert_eq!(api.leads.path(), LEADS_PATH);

    let mut handle = api.leads.list(PageParams::default());
    assert!(handle.is_loading());

    let page = handle.settled().await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, "l-1");
    assert_eq!(handle.status(), QueryStatus::Success);
}

#[tokio::test]
async fn test_list_sends_supplied_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/support_request"))
        .and(query_param("page", "3"))
        .and(query_param("page_size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/support_request"))
        .and(query_param("page", "4"))
        .and(query_param("page_size", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.support_requests.list(PageParams::new(3, 5)).settled().await.unwrap();
    api.support_requests
        .list(PageParams { page: Some(4), page_size: None })
        .settled()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_becomes_error_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is down"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let mut handle = api.leads.list(PageParams::new(99, 12));

    let err = handle.settled().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http { status: 500, body: "database is down".to_string() }
    );
    assert_eq!(handle.status(), QueryStatus::Error);
    assert_eq!(handle.error().and_then(ApiError::status), Some(500));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.stats.get().settled().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let api = api_with(ClientConfig::new("http://127.0.0.1:9"));
    let err = api.leads.list(PageParams::default()).settled().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stats_json("1", "2", "3", "4"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let api = api_with(ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(100)));
    let err = api.stats.get().settled().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

// ==================== Caching ====================

#[tokio::test]
async fn test_concurrent_identical_queries_hit_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![lead_json("l-1")]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let mut first = api.leads.list(PageParams::default());
    let mut second = api.leads.list(PageParams::new(1, 12));

    let a = first.settled().await.unwrap();
    let b = second.settled().await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_fresh_result_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json("1", "2", "3", "4")))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_with(ClientConfig::new(server.uri()).with_stale_time(Duration::from_secs(60)));
    api.stats.get().settled().await.unwrap();

    let handle = api.stats.get();
    assert_eq!(handle.status(), QueryStatus::Success);
    assert_eq!(handle.data().unwrap().avg_sale_days, "3");
}

#[tokio::test]
async fn test_create_invalidates_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![lead_json("abc-1")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/lead_request"))
        .respond_with(ResponseTemplate::new(201).set_body_json(lead_json("abc-1")))
        .mount(&server)
        .await;

    let api = api_with(ClientConfig::new(server.uri()).with_stale_time(Duration::from_secs(60)));
    let mut before = api.leads.list(PageParams::default());
    assert_eq!(before.settled().await.unwrap().total, 0);
    assert_eq!(api.leads.list(PageParams::default()).status(), QueryStatus::Success);

    api.leads
        .create(&CreateLead::new("Aigerim", "+77011234567", "flat-42"))
        .await
        .unwrap();

    let page = api.leads.list(PageParams::default()).settled().await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, "abc-1");

    let gets = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 2);
}

// ==================== Mutations ====================

#[tokio::test]
async fn test_create_lead_passes_server_fields_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lead_request"))
        .and(body_json(json!({
            "first_name": "Aigerim",
            "phone_number": "+77011234567",
            "announcement_id": "flat-42"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(lead_json("abc-1")))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let lead = api
        .leads
        .create(&CreateLead::new("Aigerim", "+77011234567", "flat-42"))
        .await
        .unwrap();

    assert_eq!(lead.id, "abc-1");
    assert_eq!(lead.created_at, "2024-03-10T09:00:00");
    assert!(lead.created_at_utc().is_some());
}

#[tokio::test]
async fn test_create_support_request_passes_server_fields_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/support_request"))
        .and(body_json(json!({
            "first_name": "Dana",
            "phone_number": "+77770000000",
            "details": "Is the two-room flat on Abay still available?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc-1",
            "first_name": "Dana",
            "phone_number": "+77770000000",
            "details": "Is the two-room flat on Abay still available?",
            "created_at": "2024-03-11T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let request = api
        .support_requests
        .create(&CreateSupportRequest::new(
            "Dana",
            "+77770000000",
            "Is the two-room flat on Abay still available?",
        ))
        .await
        .unwrap();

    assert_eq!(request.id, "abc-1");
    assert_eq!(request.created_at, "2024-03-11T12:00:00Z");
}

#[tokio::test]
async fn test_delete_existing_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/lead_request/abc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "id": "abc-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.leads.delete("abc-1").await.unwrap();
    assert!(response.success);
    assert_eq!(response.id, "abc-1");
}

#[tokio::test]
async fn test_delete_escapes_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "id": "abc#1" })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.leads.delete("abc#1").await.unwrap();
    api.leads.delete("a/b").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, vec!["/lead_request/abc%231", "/lead_request/a%2Fb"]);
    assert!(requests.iter().all(|r| r.url.query().is_none()));
}

#[tokio::test]
async fn test_delete_missing_id_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/support_request/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("support request not found"))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.support_requests.delete("nope").await.unwrap_err();
    assert_eq!(err, ApiError::NotFound("support request not found".to_string()));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_stats_update_caches_server_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json(
            "95", "17 900 000 ₸", "24", "Winter prices",
        )))
        .expect(1)
        .mount(&server)
        .await;
    // Blank fields in the payload; the server keeps its own values for them.
    Mock::given(method("PUT"))
        .and(path("/stats"))
        .and(body_json(stats_json("120", "", "", "Spring sale")))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json(
            "120", "18 500 000 ₸", "21", "Spring sale",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_with(ClientConfig::new(server.uri()).with_stale_time(Duration::from_secs(60)));
    let mut observer = api.stats.get();
    assert_eq!(observer.settled().await.unwrap().news_message, "Winter prices");

    let payload = StatsSnapshot {
        apartments_sold_monthly: "120".to_string(),
        average_price_one_room: String::new(),
        avg_sale_days: String::new(),
        news_message: "Spring sale".to_string(),
    };
    let updated = api.stats.update(&payload).await.unwrap();

    let expected = StatsSnapshot {
        apartments_sold_monthly: "120".to_string(),
        average_price_one_room: "18 500 000 ₸".to_string(),
        avg_sale_days: "21".to_string(),
        news_message: "Spring sale".to_string(),
    };
    assert_eq!(updated, expected);
    assert_eq!(api.stats.get().data().as_deref(), Some(&expected));

    let next = observer.changed().await.unwrap();
    assert_eq!(next.data().as_deref(), Some(&expected));
}

// ==================== Credentials ====================

#[tokio::test]
async fn test_authorization_follows_credential_at_call_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json("1", "2", "3", "4")))
        .expect(3)
        .mount(&server)
        .await;

    let credentials = Arc::new(MemoryCredentials::default());
    let api = Api::new(&ClientConfig::new(server.uri()), credentials.clone()).unwrap();

    api.stats.get().settled().await.unwrap();
    credentials.set_token(Some("t0k".to_string()));
    api.stats.get().settled().await.unwrap();
    credentials.clear();
    api.stats.get().settled().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        auth_headers(&requests),
        vec![None, Some("Bearer t0k".to_string()), None]
    );
}

#[tokio::test]
async fn test_mutations_carry_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/lead_request/abc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "id": "abc-1" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json("1", "2", "3", "4")))
        .mount(&server)
        .await;

    let credentials = Arc::new(MemoryCredentials::new(Some("admin-token".to_string())));
    let api = Api::new(&ClientConfig::new(server.uri()), credentials).unwrap();

    api.leads.delete("abc-1").await.unwrap();
    api.stats.update(&StatsSnapshot::default()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        auth_headers(&requests),
        vec![Some("Bearer admin-token".to_string()); 2]
    );
}

#[tokio::test]
async fn test_token_file_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("access_token");
    std::fs::write(&token_path, "from-disk\n").unwrap();

    let api = Api::from_config(&ClientConfig::new(server.uri()).with_token_file(&token_path)).unwrap();
    api.leads.list(PageParams::default()).settled().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(auth_headers(&requests), vec![Some("Bearer from-disk".to_string())]);
}

// ==================== Cancellation ====================

#[tokio::test]
async fn test_cancelled_handle_ignores_late_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lead_request"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![lead_json("l-1")]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let mut handle = api.leads.list(PageParams::default());
    handle.cancel();

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(handle.status(), QueryStatus::Loading);
    assert!(handle.data().is_none());
    assert_eq!(handle.settled().await.unwrap_err(), ApiError::Cancelled);

    // The request itself still completed into the shared cache.
    let cached = api.leads.cached(&PageParams::default()).unwrap();
    assert_eq!(cached.status(), QueryStatus::Success);
}

#[tokio::test]
async fn test_dropped_subscription_is_never_called() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/support_request"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let live = Arc::new(Mutex::new(Vec::new()));
    let dropped = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&live);
    let live_subscription = api
        .support_requests
        .list(PageParams::default())
        .subscribe(move |state| sink.lock().unwrap().push(state.status()));

    let sink = Arc::clone(&dropped);
    let dropped_subscription = api
        .support_requests
        .list(PageParams::default())
        .subscribe(move |state| sink.lock().unwrap().push(state.status()));
    drop(dropped_subscription);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(*live.lock().unwrap(), vec![QueryStatus::Loading, QueryStatus::Success]);
    assert!(dropped.lock().unwrap().is_empty());
    live_subscription.unsubscribe();
}

// ==================== Retry ====================

async fn flaky_stats_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json("1", "2", "3", "4")))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let server = flaky_stats_server().await;
    let api = api_for(&server);

    let err = api.stats.get().settled().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_configured_retry_recovers_query() {
    let server = flaky_stats_server().await;
    let api = api_with(
        ClientConfig::new(server.uri()).with_retry(RetryPolicy::fixed(1, Duration::from_millis(10))),
    );

    let stats = api.stats.get().settled().await.unwrap();
    assert_eq!(stats.apartments_sold_monthly, "1");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_mutations_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/support_request"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_with(
        ClientConfig::new(server.uri()).with_retry(RetryPolicy::fixed(3, Duration::from_millis(10))),
    );
    let err = api
        .support_requests
        .create(&CreateSupportRequest::new("Dana", "+77770000000", "Call me"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}
