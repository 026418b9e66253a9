//! HTTP API integration tests
//!
//! Covers the ingest, message list, statistics, clear, and
//! outgoing-simulation endpoints across listener profiles.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use tempfile::TempDir;

use smscd::bootstrap::{Shutdown, SimulatorState};
use smscd::config::Config;
use smscd::http::HttpListener;

/// Submit response
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    status: String,
    message_id: u64,
    response_code: String,
    processed_parameters: ProcessedParameters,
}

#[derive(Debug, Deserialize)]
struct ProcessedParameters {
    sms_submit: bool,
    sms_submit_ud: bool,
    sms_submit_da: bool,
    sms_submit_pid: bool,
    sms_submit_dcs: bool,
}

/// Message list response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<ApiMessage>,
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: u64,
    direction: String,
    status: String,
    source: String,
    raw_data: String,
    user_data: String,
    destination_address: String,
    original_message_id: Option<String>,
}

/// Statistics response
#[derive(Debug, Deserialize)]
struct StatsResponse {
    total_messages: usize,
    successful_messages: usize,
    failed_messages: usize,
    uptime_seconds: i64,
    messages_per_minute: f64,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

/// Test fixture that starts listeners on ephemeral ports over a private
/// ledger file.
struct TestServer {
    urls: Vec<String>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    #[allow(dead_code)]
    shutdown: Arc<Shutdown>,
    _store_dir: TempDir,
}

impl TestServer {
    /// Start one listener per profile, all sharing one simulator state.
    async fn start(profiles: &[&str]) -> Self {
        let store_dir = TempDir::new().unwrap();
        let store_path = store_dir.path().join("ledger.json");

        let listeners_yaml: String = profiles
            .iter()
            .enumerate()
            .map(|(i, profile)| {
                format!(
                    "  - name: {}-{}\n    address: \"127.0.0.1:0\"\n    profile: {}\n",
                    profile, i, profile
                )
            })
            .collect();

        let yaml = format!(
            "listeners:\n{}store:\n  path: {}\n  capacity: 100\n",
            listeners_yaml,
            store_path.display()
        );

        let config = Arc::new(Config::from_yaml(&yaml).unwrap());
        let state = Arc::new(SimulatorState::new(config.clone()));
        let shutdown = Shutdown::new();

        let mut urls = Vec::new();
        let mut handles = Vec::new();

        for listener_config in &config.listeners {
            let listener =
                HttpListener::new(listener_config.clone(), state.clone(), shutdown.clone());
            let bound = listener.bind().await.unwrap();
            let addr = bound.local_addr().unwrap();
            urls.push(format!("http://{}", addr));
            handles.push(tokio::spawn(async move {
                let _ = bound.serve().await;
            }));
        }

        Self {
            urls,
            handles,
            shutdown,
            _store_dir: store_dir,
        }
    }

    async fn start_web() -> Self {
        Self::start(&["web"]).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.urls[0], path)
    }

    fn url_on(&self, listener: usize, path: &str) -> String {
        format!("{}{}", self.urls[listener], path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[tokio::test]
async fn test_submit_via_query_parameters() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url(
            "/cgi-bin/smshandler.pl?submit=0011AABB&MSISDN=%2B258841234567&sms_submit_da=%2B258821112222",
        ))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body: SubmitResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.status, "success");
    assert_eq!(body.message_id, 1);
    assert_eq!(body.response_code, "00");
    assert!(body.processed_parameters.sms_submit);
    assert!(!body.processed_parameters.sms_submit_ud);
    assert!(body.processed_parameters.sms_submit_da);
    assert!(!body.processed_parameters.sms_submit_pid);
    assert!(!body.processed_parameters.sms_submit_dcs);
}

#[tokio::test]
async fn test_submit_via_form_body() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/cgi-bin/smshandler.pl"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("apdu_hex=0011915155214365&msisdn=%2B258840000001")
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body: SubmitResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.status, "success");
    assert!(body.processed_parameters.sms_submit);
}

#[tokio::test]
async fn test_submit_with_no_parameters_is_rejected() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url("/cgi-bin/smshandler.pl"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.status, "error");
    assert!(body.message.contains("missing"));

    // Nothing was stored.
    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_count, 0);
}

#[tokio::test]
async fn test_messages_list() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        client
            .get(server.url(&format!("/cgi-bin/smshandler.pl?submit=00{}0", i)))
            .send()
            .await
            .expect("request failed");
    }

    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body: MessagesResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_count, 3);
    assert_eq!(body.messages.len(), 3);
    assert_eq!(body.messages[0].id, 1);
    assert_eq!(body.messages[2].id, 3);
    assert_eq!(body.messages[0].direction, "received");
    assert_eq!(body.messages[0].status, "success");
    assert_eq!(body.messages[0].source, "web-0");
    assert_eq!(body.messages[0].raw_data, "0000");
}

#[tokio::test]
async fn test_stats_consistency() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        client
            .get(server.url("/cgi-bin/smshandler.pl?submit=0011"))
            .send()
            .await
            .expect("request failed");
    }

    let resp = client
        .get(server.url("/stats"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body: StatsResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_messages, 5);
    assert_eq!(
        body.successful_messages + body.failed_messages,
        body.total_messages
    );
    assert!(body.uptime_seconds < 60);
    assert_eq!(body.messages_per_minute, 5.0);
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    client
        .get(server.url("/cgi-bin/smshandler.pl?submit=0011"))
        .send()
        .await
        .expect("request failed");

    for _ in 0..2 {
        let resp = client
            .delete(server.url("/messages"))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);

        let body: AckResponse = resp.json().await.expect("invalid json");
        assert_eq!(body.status, "success");
    }

    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_count, 0);
}

#[tokio::test]
async fn test_simulate_outgoing() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url("/simulate-outgoing?destination=%2B258841234567&message=hello"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");

    assert_eq!(body.total_count, 1);
    assert_eq!(body.messages[0].direction, "sent");
    assert_eq!(body.messages[0].source, "simulator");
    assert_eq!(body.messages[0].destination_address, "+258841234567");
    assert_eq!(body.messages[0].user_data, "hello");
    assert_eq!(body.messages[0].raw_data, "SIMULATED_OUTGOING_1");
}

#[tokio::test]
async fn test_sms_reply_records_outgoing_message() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    // Submit an inbound message, then reply to it.
    client
        .get(server.url("/cgi-bin/smshandler.pl?submit=0011&MSISDN=%2B258841234567"))
        .send()
        .await
        .expect("request failed");

    let resp = client
        .post(server.url("/sms-reply"))
        .form(&[
            ("msisdn", "+258841234567"),
            ("message", "reply text"),
            ("original_message_id", "1"),
        ])
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.expect("invalid json");
    assert_eq!(body["status"], "success");
    assert_eq!(body["reply_to"], "+258841234567");
    assert_eq!(body["original_message_id"], "1");
    assert_eq!(body["message_id"], 2);

    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");

    assert_eq!(body.total_count, 2);
    let reply = &body.messages[1];
    assert_eq!(reply.direction, "sent");
    assert_eq!(reply.source, "simulator");
    assert_eq!(reply.user_data, "reply text");
    assert_eq!(reply.raw_data, "SMS_REPLY_2");
    assert_eq!(reply.original_message_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_sms_reply_requires_msisdn_and_message() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/sms-reply"))
        .form(&[("message", "no sender")])
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.status, "error");
    assert!(body.message.contains("msisdn"));

    // Nothing was stored.
    let resp = client
        .get(server.url("/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_count, 0);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url("/no-such-endpoint"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.status, "error");
}

#[tokio::test]
async fn test_sms_profile_exposes_only_submission_and_status() {
    let server = TestServer::start(&["sms"]).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url("/cgi-bin/smshandler.pl?submit=0011"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(server.url("/status"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    for path in ["/messages", "/stats", "/simulate-outgoing"] {
        let resp = client
            .get(server.url(path))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "path {}", path);
    }

    let resp = client
        .post(server.url("/sms-reply"))
        .form(&[("msisdn", "+258841234567"), ("message", "hi")])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submission_on_one_listener_visible_on_another() {
    let server = TestServer::start(&["web", "sms"]).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url_on(1, "/cgi-bin/smshandler.pl?submit=0011"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(server.url_on(0, "/messages"))
        .send()
        .await
        .expect("request failed");
    let body: MessagesResponse = resp.json().await.expect("invalid json");

    assert_eq!(body.total_count, 1);
    assert_eq!(body.messages[0].source, "sms-1");
}

#[tokio::test]
async fn test_reset_stats() {
    let server = TestServer::start_web().await;
    let client = reqwest::Client::new();

    client
        .get(server.url("/cgi-bin/smshandler.pl?submit=0011"))
        .send()
        .await
        .expect("request failed");

    let resp = client
        .post(server.url("/reset-stats"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(server.url("/stats"))
        .send()
        .await
        .expect("request failed");
    let body: StatsResponse = resp.json().await.expect("invalid json");
    assert_eq!(body.total_messages, 0);
    assert_eq!(body.successful_messages, 0);
    assert_eq!(body.failed_messages, 0);
}
