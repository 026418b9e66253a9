//! Request handlers shared by all listener profiles.

use std::sync::Arc;

use axum::{
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

use crate::bootstrap::SharedSimulatorState;
use crate::config::EndpointProfile;
use crate::ingest::{self, Params};
use crate::ledger::{self, MessageRecord};

/// Per-listener handler state: the shared simulator state plus the name
/// used as the record source tag.
pub struct ListenerState {
    pub name: String,
    pub shared: SharedSimulatorState,
}

/// Request-level errors surfaced to the caller.
///
/// Store-level failures never appear here: they are downgraded inside the
/// ledger (degraded-availability), and the submission still succeeds.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid submission, nothing stored
    Validation(String),
    /// Unknown endpoint
    NotFound(String),
    /// Catch-all for unexpected faults
    Internal(String),
}

/// Error body; every response carries an explicit status field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (code, Json(body)).into_response()
    }
}

/// Build the router for one listener.
///
/// The `web` profile exposes the full interface; the `sms` and `legacy`
/// delivery paths expose only submission and status, mirroring the
/// carrier-facing ports they simulate.
pub fn build_router(profile: EndpointProfile, state: Arc<ListenerState>) -> Router {
    let router = Router::new()
        .route(
            "/cgi-bin/smshandler.pl",
            get(submit_handler).post(submit_handler),
        )
        .route("/status", get(status_handler));

    let router = match profile {
        EndpointProfile::Web => router
            .route(
                "/messages",
                get(messages_handler).delete(clear_handler),
            )
            .route("/stats", get(stats_handler))
            .route("/config", get(config_handler))
            .route("/simulate-outgoing", get(simulate_outgoing_handler))
            .route("/sms-reply", post(sms_reply_handler))
            .route("/reset-stats", post(reset_stats_handler)),
        EndpointProfile::Sms | EndpointProfile::Legacy => router,
    };

    let timeout = state.shared.config.settings.request_timeout;

    router
        .fallback(not_found_handler)
        .layer(TimeoutLayer::new(timeout))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Convert a handler panic into the standard error body. No fault may kill
/// a listener or leak an unstructured response.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };

    error!(detail, "request handler panicked");

    ApiError::Internal("Internal server error".to_string()).into_response()
}

// -----------------------------------------------------------------------------
// Submission
// -----------------------------------------------------------------------------

/// Which recognized submission keys were populated.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedParameters {
    pub sms_submit: bool,
    pub sms_submit_ud: bool,
    pub sms_submit_da: bool,
    pub sms_submit_pid: bool,
    pub sms_submit_dcs: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    pub message: String,
    pub message_id: u64,
    /// Carrier-style result code; the simulator always accepts
    pub response_code: String,
    pub processed_parameters: ProcessedParameters,
}

/// Ingest endpoint: accepts a submission via query parameters or a
/// form-encoded body.
async fn submit_handler(
    State(state): State<Arc<ListenerState>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Result<Json<SubmitResponse>, ApiError> {
    let params = parse_params(query.as_deref(), &body);

    let payload =
        ingest::normalize(&params).map_err(|e| ApiError::Validation(e.to_string()))?;

    let processed = ProcessedParameters {
        sms_submit: !payload.raw_data.is_empty(),
        sms_submit_ud: !payload.user_data.is_empty(),
        sms_submit_da: !payload.destination_address.is_empty(),
        sms_submit_pid: !payload.protocol_identifier.is_empty(),
        sms_submit_dcs: !payload.data_coding_scheme.is_empty(),
    };

    let record = {
        let mut ledger = state.shared.ledger.lock().await;
        let id = ledger.allocate_id();
        ledger.record_and_persist(MessageRecord::received(id, &state.name, payload))
    };

    info!(
        id = record.id,
        source = %state.name,
        msisdn = %record.payload.msisdn,
        "SMS received and processed"
    );

    Ok(Json(SubmitResponse {
        status: "success".to_string(),
        message: "SMS received and processed successfully".to_string(),
        message_id: record.id,
        response_code: "00".to_string(),
        processed_parameters: processed,
    }))
}

/// Merge query-string and form-body parameters into one multi-valued map.
fn parse_params(query: Option<&str>, body: &str) -> Params {
    let mut params = Params::new();

    for raw in [query.unwrap_or(""), body] {
        if raw.is_empty() {
            continue;
        }
        match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            Ok(pairs) => {
                for (key, value) in pairs {
                    params.entry(key).or_default().push(value);
                }
            }
            Err(e) => {
                warn!(error = %e, "ignoring unparseable parameter string");
            }
        }
    }

    params
}

// -----------------------------------------------------------------------------
// Messages and statistics
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageRecord>,
    pub total_count: usize,
    pub timestamp: String,
}

/// Message list endpoint; reconciles before reading so records written by
/// sibling processes are visible.
async fn messages_handler(
    State(state): State<Arc<ListenerState>>,
) -> Json<MessagesResponse> {
    let mut ledger = state.shared.ledger.lock().await;
    let messages = ledger.reconcile().to_vec();
    let total_count = messages.len();

    Json(MessagesResponse {
        messages,
        total_count,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Statistics endpoint.
async fn stats_handler(
    State(state): State<Arc<ListenerState>>,
) -> Json<ledger::LedgerStats> {
    let mut ledger = state.shared.ledger.lock().await;
    let started_at = ledger.started_at();
    let stats = ledger::compute(ledger.reconcile(), started_at);
    Json(stats)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

/// Clear endpoint; idempotent.
async fn clear_handler(State(state): State<Arc<ListenerState>>) -> Json<AckResponse> {
    state.shared.ledger.lock().await.clear();

    Json(AckResponse {
        status: "success".to_string(),
        message: "All messages cleared successfully".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Reset statistics: clears the ledger and restarts the uptime baseline.
async fn reset_stats_handler(
    State(state): State<Arc<ListenerState>>,
) -> Json<AckResponse> {
    state.shared.ledger.lock().await.reset_stats();

    Json(AckResponse {
        status: "success".to_string(),
        message: "Statistics reset successfully".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// -----------------------------------------------------------------------------
// Outgoing simulation
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SimulateOutgoingParams {
    destination: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateOutgoingResponse {
    pub status: String,
    pub message: String,
    pub message_id: u64,
    pub destination: String,
    pub text: String,
}

/// Synthesize a simulator-originated message for a destination/text pair.
async fn simulate_outgoing_handler(
    State(state): State<Arc<ListenerState>>,
    Query(params): Query<SimulateOutgoingParams>,
) -> Json<SimulateOutgoingResponse> {
    let destination = params
        .destination
        .unwrap_or_else(|| "+5511999999999".to_string());
    let text = params
        .message
        .unwrap_or_else(|| "Simulator test message".to_string());

    let record = {
        let mut ledger = state.shared.ledger.lock().await;
        let id = ledger.allocate_id();
        ledger.record_and_persist(MessageRecord::sent(id, &destination, &text))
    };

    info!(id = record.id, destination = %destination, "simulated outgoing message");

    Json(SimulateOutgoingResponse {
        status: "success".to_string(),
        message: "Outgoing message simulated successfully".to_string(),
        message_id: record.id,
        destination,
        text,
    })
}

#[derive(Debug, Deserialize)]
struct SmsReplyParams {
    #[serde(default)]
    msisdn: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    original_message_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SmsReplyResponse {
    pub status: String,
    pub message: String,
    pub message_id: u64,
    pub reply_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_message_id: Option<String>,
    pub timestamp: String,
}

/// Record a simulator-originated reply to an earlier message.
async fn sms_reply_handler(
    State(state): State<Arc<ListenerState>>,
    Form(params): Form<SmsReplyParams>,
) -> Result<Json<SmsReplyResponse>, ApiError> {
    if params.msisdn.is_empty() || params.message.is_empty() {
        return Err(ApiError::Validation(
            "Missing required parameters: msisdn and message".to_string(),
        ));
    }

    let record = {
        let mut ledger = state.shared.ledger.lock().await;
        let id = ledger.allocate_id();
        ledger.record_and_persist(MessageRecord::reply(
            id,
            &params.msisdn,
            &params.message,
            params.original_message_id.clone(),
        ))
    };

    info!(
        id = record.id,
        reply_to = %params.msisdn,
        "SMS reply recorded"
    );

    Ok(Json(SmsReplyResponse {
        status: "success".to_string(),
        message: "SMS reply sent successfully".to_string(),
        message_id: record.id,
        reply_to: params.msisdn,
        original_message_id: params.original_message_id,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

// -----------------------------------------------------------------------------
// Status and configuration
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        service: "SMSC Simulator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListenerInfo {
    pub name: String,
    pub address: String,
    pub profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub listeners: Vec<ListenerInfo>,
    pub store_path: String,
    pub capacity: usize,
    pub log_level: String,
    pub version: String,
    pub total_messages: usize,
    pub successful_messages: usize,
    pub failed_messages: usize,
    pub uptime: String,
}

/// Read-only snapshot of the effective configuration and ledger counters.
async fn config_handler(State(state): State<Arc<ListenerState>>) -> Json<ConfigResponse> {
    let config = &state.shared.config;

    let (stats, started_at) = {
        let mut ledger = state.shared.ledger.lock().await;
        let started_at = ledger.started_at();
        (ledger::compute(ledger.reconcile(), started_at), started_at)
    };

    Json(ConfigResponse {
        listeners: config
            .listeners
            .iter()
            .map(|l| ListenerInfo {
                name: l.name.clone(),
                address: l.address.to_string(),
                profile: l.profile.name().to_string(),
            })
            .collect(),
        store_path: config.store.path.display().to_string(),
        capacity: config.store.capacity,
        log_level: config.settings.log_level.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        total_messages: stats.total_messages,
        successful_messages: stats.successful_messages,
        failed_messages: stats.failed_messages,
        uptime: format_uptime(Utc::now().signed_duration_since(started_at)),
    })
}

/// Format uptime as days, hours, and minutes.
fn format_uptime(elapsed: chrono::Duration) -> String {
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    let minutes = elapsed.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes.max(0))
    }
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
