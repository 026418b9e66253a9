//! Ledger record types.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ingest::ApduInfo;

/// Direction of a recorded message relative to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Inbound from an external sender
    Received,
    /// Simulator-originated
    Sent,
}

/// Delivery status of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// Normalized submission fields carried by every record.
///
/// Missing fields default to the empty string. The original query
/// parameters are preserved as a multi-valued map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Raw hex/text from the `submit` parameter
    #[serde(default)]
    pub raw_data: String,

    /// Sender address (`MSISDN`)
    #[serde(default)]
    pub msisdn: String,

    /// User data (`sms_submit_ud`)
    #[serde(default)]
    pub user_data: String,

    /// Destination address (`sms_submit_da`)
    #[serde(default)]
    pub destination_address: String,

    /// Protocol identifier (`sms_submit_pid`)
    #[serde(default)]
    pub protocol_identifier: String,

    /// Data coding scheme (`sms_submit_dcs`)
    #[serde(default)]
    pub data_coding_scheme: String,

    /// Id of the message this record answers, for reply records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message_id: Option<String>,

    /// Original query parameters, multi-valued
    #[serde(default)]
    pub query_params: BTreeMap<String, Vec<String>>,

    /// Best-effort APDU inspection of the raw hex, if any was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apdu: Option<ApduInfo>,
}

/// One entry in the ledger.
///
/// Records are created once at ingestion and never mutated. They are
/// destroyed only by FIFO eviction or an explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Monotonically increasing id, unique within one persisted ledger
    /// generation. Used as the dedup key at reconcile time.
    pub id: u64,

    /// Creation time, ISO-8601, assigned at ingestion
    pub timestamp: String,

    pub direction: Direction,

    pub status: DeliveryStatus,

    /// Which listener/path produced the record
    pub source: String,

    #[serde(flatten)]
    pub payload: SubmissionPayload,
}

impl MessageRecord {
    /// Create a record for an inbound submission.
    pub fn received(id: u64, source: &str, payload: SubmissionPayload) -> Self {
        Self {
            id,
            timestamp: Utc::now().to_rfc3339(),
            direction: Direction::Received,
            status: DeliveryStatus::Success,
            source: source.to_string(),
            payload,
        }
    }

    /// Create a simulator-originated reply to an earlier message.
    pub fn reply(
        id: u64,
        msisdn: &str,
        text: &str,
        original_message_id: Option<String>,
    ) -> Self {
        Self {
            id,
            timestamp: Utc::now().to_rfc3339(),
            direction: Direction::Sent,
            status: DeliveryStatus::Success,
            source: "simulator".to_string(),
            payload: SubmissionPayload {
                raw_data: format!("SMS_REPLY_{}", id),
                msisdn: msisdn.to_string(),
                user_data: text.to_string(),
                destination_address: msisdn.to_string(),
                protocol_identifier: "00".to_string(),
                data_coding_scheme: "00".to_string(),
                original_message_id,
                ..Default::default()
            },
        }
    }

    /// Create a simulator-originated record for the outgoing simulation.
    pub fn sent(id: u64, destination: &str, text: &str) -> Self {
        Self {
            id,
            timestamp: Utc::now().to_rfc3339(),
            direction: Direction::Sent,
            status: DeliveryStatus::Success,
            source: "simulator".to_string(),
            payload: SubmissionPayload {
                raw_data: format!("SIMULATED_OUTGOING_{}", id),
                user_data: text.to_string(),
                destination_address: destination.to_string(),
                protocol_identifier: "00".to_string(),
                data_coding_scheme: "00".to_string(),
                ..Default::default()
            },
        }
    }
}
