//! End-to-end tests for the webhook routes.
//!
//! The router runs in-process via `oneshot`; GitHub is a wiremock server.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use hmac::{Hmac, Mac};
use projectbot::{
    config::{BoardConfig, Config},
    server::{build_router, AppState, WEBHOOK_PATH},
};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "webhook-secret";
const PROJECT_ID: i64 = 1;
const BACKLOG: i64 = 10;
const IN_PROGRESS: i64 = 11;
const IN_REVIEW: i64 = 12;
const PENDING: i64 = 13;

// =============================================================================
// Helpers
// =============================================================================

fn config(api_url: &str) -> Config {
    Config {
        port: 0,
        github_token: "ghp_test".to_string(),
        webhook_secret: SECRET.to_string(),
        github_api_url: api_url.to_string(),
        board: BoardConfig {
            owner: "octo".to_string(),
            repo: "app".to_string(),
            project_name: "Sprint".to_string(),
        },
    }
}

fn app(server: &MockServer) -> Router {
    let state = AppState::new(config(&server.uri())).unwrap();
    build_router(state)
}

fn sign(body: &[u8]) -> String {
    let mut mac = <Hmac<Sha256> as hmac::digest::KeyInit>::new_from_slice(SECRET.as_bytes()).unwrap();
    Mac::update(&mut mac, body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn pull_request_payload(action: &str, node_id: &str) -> Value {
    json!({
        "action": action,
        "number": 7,
        "pull_request": {
            "id": 4242,
            "node_id": node_id,
            "number": 7,
            "title": "Add login page"
        },
        "repository": {"name": "app", "full_name": "octo/app"}
    })
}

fn webhook_request(event_type: &str, payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).unwrap();
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header("x-github-event", event_type)
        .header("x-github-delivery", "delivery-1")
        .header("x-hub-signature-256", sign(&body))
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Mount the project, column and card listings of a healthy board.
async fn mount_board(server: &MockServer, cards: &[(i64, Value)]) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/projects"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": PROJECT_ID, "name": "Sprint"}])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT_ID}/columns")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": BACKLOG, "name": "Backlog"},
            {"id": IN_PROGRESS, "name": "In progress"},
            {"id": IN_REVIEW, "name": "In review"},
            {"id": PENDING, "name": "Pending release"}
        ])))
        .mount(server)
        .await;

    for column_id in [BACKLOG, IN_PROGRESS, IN_REVIEW, PENDING] {
        let column_cards: Vec<Value> = cards
            .iter()
            .filter(|(id, _)| *id == column_id)
            .map(|(_, card)| card.clone())
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/projects/columns/{column_id}/cards")))
            .respond_with(ResponseTemplate::new(200).set_body_json(column_cards))
            .expect(1)
            .mount(server)
            .await;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_preflight_returns_cors_headers() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri(WEBHOOK_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-headers"], "X-Requested-With");
    assert_eq!(
        headers["access-control-allow-methods"],
        "POST, GET, PUT, DELETE, OPTIONS"
    );
}

#[tokio::test]
async fn test_opened_without_card_creates_one() {
    let server = MockServer::start().await;
    mount_board(&server, &[(BACKLOG, json!({"id": 1, "node_id": "PR_other"}))]).await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/columns/{IN_REVIEW}/cards")))
        .and(body_json(json!({"content_id": 4242, "content_type": "PullRequest"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 900})))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &pull_request_payload("opened", "PR_1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_opened_with_existing_card_moves_it() {
    let server = MockServer::start().await;
    mount_board(&server, &[(BACKLOG, json!({"id": 555, "node_id": "PR_2"}))]).await;
    Mock::given(method("POST"))
        .and(path("/projects/columns/cards/555/moves"))
        .and(body_json(json!({"position": "bottom", "column_id": IN_REVIEW})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/columns/{IN_REVIEW}/cards")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &pull_request_payload("opened", "PR_2")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_other_actions_are_accepted_without_calls() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &pull_request_payload("closed", "PR_1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_pull_request_events_are_acknowledged() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(webhook_request("push", &json!({"ref": "refs/heads/main"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_non_pull_request_event_is_bad_request() {
    let server = MockServer::start().await;
    let body = b"{not json".to_vec();
    let request = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header("x-github-event", "push")
        .header("x-hub-signature-256", sign(&body))
        .body(Body::from(body))
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("failed to parse push event"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_card_matched_by_issue_url_is_moved() {
    let server = MockServer::start().await;
    let issue_url = "https://api.github.com/repos/octo/app/issues/7";
    mount_board(
        &server,
        &[(
            IN_PROGRESS,
            json!({"id": 777, "node_id": "MDExOlByb2plY3RDYXJkNzc3", "content_url": issue_url}),
        )],
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/projects/columns/cards/777/moves"))
        .and(body_json(json!({"position": "bottom", "column_id": IN_REVIEW})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut payload = pull_request_payload("opened", "PR_7");
    payload["pull_request"]["issue_url"] = json!(issue_url);
    let response = app(&server)
        .oneshot(webhook_request("pull_request", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_bad_signature_is_unauthorized() {
    let server = MockServer::start().await;
    let body = serde_json::to_vec(&pull_request_payload("opened", "PR_1")).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .header("x-github-event", "pull_request")
        .header("x-hub-signature-256", sign(b"something else"))
        .body(Body::from(body))
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "payload signature check failed\n");
}

#[tokio::test]
async fn test_unparseable_event_is_bad_request() {
    let server = MockServer::start().await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &json!({"action": "opened"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response)
        .await
        .starts_with("failed to parse pull_request event"));
}

#[tokio::test]
async fn test_project_mismatch_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "name": "Roadmap"}])))
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &pull_request_payload("opened", "PR_1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "project Roadmap not found\n");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_card_listing_failure_surfaces_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/app/projects"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": PROJECT_ID, "name": "Sprint"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT_ID}/columns")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": BACKLOG, "name": "Backlog"},
            {"id": IN_PROGRESS, "name": "In progress"},
            {"id": IN_REVIEW, "name": "In review"},
            {"id": PENDING, "name": "Pending release"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/columns/{BACKLOG}/cards")))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Must have admin rights"})),
        )
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(webhook_request("pull_request", &pull_request_payload("opened", "PR_1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Must have admin rights"));
}

#[tokio::test]
async fn test_state_accepts_any_board_client() {
    let server = MockServer::start().await;
    let client = projectbot::GitHubBoardClient::with_url("ghp_test", &server.uri()).unwrap();
    let state = AppState::with_client(config(&server.uri()), Arc::new(client));

    let response = build_router(state)
        .oneshot(webhook_request("ping", &json!({"zen": "Practicality beats purity.", "hook_id": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
