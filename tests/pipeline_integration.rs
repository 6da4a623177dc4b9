//! End-to-end pipeline tests against a mock mail-store/agent server.
//!
//! These exercise the full stack: HTTP source, HTTP agent, HTTP mail
//! store and the controller's buffering policy, with one wiremock
//! server playing every service.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mail_triage::agent::HttpTriageAgent;
use mail_triage::mailstore::{HttpAutomationHook, HttpMailStore};
use mail_triage::model::Tier;
use mail_triage::pipeline::{PipelinePhase, TriageController};
use mail_triage::source::HttpMessageSource;
use mail_triage::TriageConfig;

fn email(id: &str, snippet: &str) -> serde_json::Value {
    json!({
        "id": id,
        "subject": format!("subject {id}"),
        "sender": "sender@example.com",
        "snippet": snippet,
    })
}

/// Mount a page of emails at the given skip offset.
async fn mount_page(server: &MockServer, page_size: usize, page: usize, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/emails"))
        .and(query_param("max_results", page_size.to_string()))
        .and(query_param("skip", (page * page_size).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a classify response for any request whose email text contains
/// the marker.
async fn mount_classify(server: &MockServer, marker: &str, category: &str) {
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": category })))
        .mount(server)
        .await;
}

fn controller_for(server: &MockServer, config: &TriageConfig) -> Arc<TriageController> {
    let base = server.uri();
    TriageController::new(
        config,
        Arc::new(HttpMessageSource::new(&base, config.page_size)),
        Arc::new(HttpTriageAgent::new(&base)),
        Arc::new(HttpMailStore::new(&base)),
        Arc::new(HttpAutomationHook::new(&base)),
    )
}

#[tokio::test]
async fn three_messages_fan_out_to_their_tiers() {
    let server = MockServer::start().await;
    let config = TriageConfig {
        working_set_capacity: 10,
        page_size: 3,
        low_buffer_threshold: 2,
        ..TriageConfig::default()
    };

    mount_page(
        &server,
        3,
        0,
        json!([
            email("a", "urgent contract deadline"),
            email("b", "team lunch friday"),
            email("c", "weekly newsletter digest"),
        ]),
    )
    .await;
    mount_page(&server, 3, 1, json!([])).await;

    mount_classify(&server, "urgent contract", "important").await;
    mount_classify(&server, "team lunch", "moderate").await;
    mount_classify(&server, "newsletter", "spam").await;

    // The important message fires the automation hook.
    Mock::given(method("POST"))
        .and(path("/emails/process_one"))
        .and(body_string_contains("\"a\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, &config);
    controller.refresh().await;

    let important = controller.messages(Tier::Important).await;
    let moderate = controller.messages(Tier::Moderate).await;
    let other = controller.messages(Tier::Other).await;
    assert_eq!(important.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["a"]);
    assert_eq!(moderate.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["b"]);
    assert_eq!(other.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["c"]);
    assert_eq!(controller.phase().await, PipelinePhase::Exhausted);
}

#[tokio::test]
async fn removal_confirms_with_store_then_backfills_from_buffer() {
    let server = MockServer::start().await;
    let config = TriageConfig {
        working_set_capacity: 2,
        page_size: 2,
        low_buffer_threshold: 2,
        ..TriageConfig::default()
    };

    mount_page(&server, 2, 0, json!([email("a", "first"), email("b", "second")])).await;
    mount_page(&server, 2, 1, json!([email("c", "third"), email("d", "fourth")])).await;
    mount_page(&server, 2, 2, json!([])).await;

    // Everything classifies as important here; routing is not the point.
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "important" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/emails/process_one"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let mark_read = Mock::given(method("POST"))
        .and(path("/emails/mark_read"))
        .and(body_string_contains("\"a\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let controller = controller_for(&server, &config);
    controller.refresh().await;

    // Capacity 2 filled from page 0; page 1 buffered by the top-up fetch.
    assert_eq!(controller.total_count().await, 2);
    assert_eq!(controller.buffer_len().await, 2);

    controller.mark_read(Tier::Important, "a").await.unwrap();

    // "a" left, "c" (the buffer head) took its place, "d" stays buffered.
    let held: Vec<String> = controller
        .messages(Tier::Important)
        .await
        .iter()
        .map(|m| m.id.clone())
        .collect();
    assert_eq!(held, ["b", "c"]);
    assert_eq!(controller.buffer_len().await, 1);
    drop(mark_read);
}

#[tokio::test]
async fn store_rejection_blocks_local_removal() {
    let server = MockServer::start().await;
    let config = TriageConfig {
        working_set_capacity: 4,
        page_size: 2,
        low_buffer_threshold: 1,
        ..TriageConfig::default()
    };

    mount_page(&server, 2, 0, json!([email("a", "first"), email("b", "second")])).await;
    mount_page(&server, 2, 1, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "moderate" })))
        .mount(&server)
        .await;
    // The store answers but refuses the delete.
    Mock::given(method("POST"))
        .and(path("/emails/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, &config);
    controller.refresh().await;
    assert_eq!(controller.total_count().await, 2);

    assert!(controller.delete(Tier::Moderate, "a").await.is_err());
    // The message is still held.
    assert_eq!(controller.total_count().await, 2);
    assert!(controller
        .messages(Tier::Moderate)
        .await
        .iter()
        .any(|m| m.id == "a"));
}

#[tokio::test]
async fn exhausted_session_stops_fetching() {
    let server = MockServer::start().await;
    let config = TriageConfig {
        working_set_capacity: 4,
        page_size: 2,
        low_buffer_threshold: 2,
        ..TriageConfig::default()
    };

    // Exactly one full page; the follow-up page is empty. The page-0 and
    // page-1 mocks each permit a single request, so any further fetch
    // after exhaustion fails the test on verification.
    let page0 = Mock::given(method("GET"))
        .and(path("/emails"))
        .and(query_param("skip", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([email("a", "first"), email("b", "second")])),
        )
        .expect(1)
        .mount_as_scoped(&server)
        .await;
    let page1 = Mock::given(method("GET"))
        .and(path("/emails"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "spam" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/emails/mark_read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, &config);
    controller.refresh().await;
    assert_eq!(controller.phase().await, PipelinePhase::Exhausted);

    // Removals after exhaustion shrink the working set without fetching.
    controller.mark_read(Tier::Other, "a").await.unwrap();
    controller.mark_read(Tier::Other, "b").await.unwrap();
    assert_eq!(controller.total_count().await, 0);

    drop(page0);
    drop(page1);
}

#[tokio::test]
async fn summarize_round_trip_updates_the_held_message() {
    let server = MockServer::start().await;
    let config = TriageConfig {
        working_set_capacity: 4,
        page_size: 1,
        low_buffer_threshold: 1,
        ..TriageConfig::default()
    };

    mount_page(&server, 1, 0, json!([email("a", "quarterly report attached")])).await;
    mount_page(&server, 1, 1, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "moderate" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_string_contains("quarterly report"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "summary": "Q3 report is attached." })),
        )
        .mount(&server)
        .await;

    let controller = controller_for(&server, &config);
    controller.refresh().await;

    let summary = controller.summarize(Tier::Moderate, "a").await;
    assert_eq!(summary.as_deref(), Some("Q3 report is attached."));
    let held = controller.messages(Tier::Moderate).await;
    assert_eq!(held[0].summary.as_deref(), Some("Q3 report is attached."));

    // A second call for an id that is not held does nothing.
    assert!(controller.summarize(Tier::Moderate, "ghost").await.is_none());
}
