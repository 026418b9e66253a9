//! Best-effort APDU hex inspection.
//!
//! Deliberately shallow: the simulator tags submissions with whatever it
//! can read off the hex string and nothing more. Inspection failures
//! degrade to unparsed metadata and never block storage of the raw
//! submission.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metadata extracted from a submitted hex string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApduInfo {
    /// Input with whitespace stripped, uppercased
    pub hex_clean: String,

    /// Octet count of the cleaned input
    pub length: usize,

    /// Whether the input looked like well-formed hex
    pub parsed: bool,

    /// First octet, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    /// Second octet, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<String>,

    /// "international" when the 0x91 type-of-address marker is present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_indicator_pos: Option<usize>,
}

/// Inspect a submitted hex string.
pub fn inspect_hex(raw: &str) -> ApduInfo {
    let hex_clean: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let well_formed =
        hex_clean.len() % 2 == 0 && hex_clean.chars().all(|c| c.is_ascii_hexdigit());

    let mut info = ApduInfo {
        length: hex_clean.len() / 2,
        parsed: well_formed,
        hex_clean,
        ..Default::default()
    };

    if !well_formed {
        debug!(raw, "submission is not well-formed hex, tagging as unparsed");
        return info;
    }

    if info.hex_clean.len() >= 4 {
        info.message_type = Some(info.hex_clean[..2].to_string());
        info.message_reference = Some(info.hex_clean[2..4].to_string());
    }

    // 0x91 is the GSM type-of-address octet for international numbers.
    if let Some(pos) = info.hex_clean.find("91") {
        info.number_type = Some("international".to_string());
        info.number_indicator_pos = Some(pos);
    }

    info
}
