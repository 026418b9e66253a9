//! Submission ingestion.
//!
//! Different listeners accept different parameter names and formats; this
//! module normalizes them all into the canonical [`SubmissionPayload`]
//! before the record reaches the ledger.

mod apdu;

pub use apdu::{inspect_hex, ApduInfo};

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ledger::SubmissionPayload;

/// Ingestion validation errors. Surfaced to the caller as 400s; nothing is
/// stored when validation fails.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Every recognized submission field was absent or empty.
    #[error("missing SMS parameters")]
    MissingRequiredField,
}

/// Multi-valued request parameters, as parsed from a query string or a
/// form-encoded body.
pub type Params = BTreeMap<String, Vec<String>>;

fn first<'a>(params: &'a Params, key: &str) -> &'a str {
    params
        .get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
        .unwrap_or("")
}

/// Normalize raw request parameters into the canonical payload shape.
///
/// Recognized keys: `submit` (alias `apdu_hex`), `MSISDN`/`msisdn`,
/// `sms_submit_ud`, `sms_submit_da`, `sms_submit_pid`, `sms_submit_dcs`.
/// Missing fields default to empty. A submission must carry some signal:
/// at least one of the five submit fields must be populated (the sender
/// address alone is not a message).
pub fn normalize(params: &Params) -> Result<SubmissionPayload, IngestError> {
    let raw_data = {
        let submit = first(params, "submit");
        if submit.is_empty() {
            first(params, "apdu_hex")
        } else {
            submit
        }
    };
    let msisdn = {
        let upper = first(params, "MSISDN");
        if upper.is_empty() {
            first(params, "msisdn")
        } else {
            upper
        }
    };
    let user_data = first(params, "sms_submit_ud");
    let destination_address = first(params, "sms_submit_da");
    let protocol_identifier = first(params, "sms_submit_pid");
    let data_coding_scheme = first(params, "sms_submit_dcs");

    if raw_data.is_empty()
        && user_data.is_empty()
        && destination_address.is_empty()
        && protocol_identifier.is_empty()
        && data_coding_scheme.is_empty()
    {
        return Err(IngestError::MissingRequiredField);
    }

    // Best-effort metadata only; inspection never blocks storage.
    let apdu = (!raw_data.is_empty()).then(|| inspect_hex(raw_data));

    Ok(SubmissionPayload {
        raw_data: raw_data.to_string(),
        msisdn: msisdn.to_string(),
        user_data: user_data.to_string(),
        destination_address: destination_address.to_string(),
        protocol_identifier: protocol_identifier.to_string(),
        data_coding_scheme: data_coding_scheme.to_string(),
        query_params: params.clone(),
        original_message_id: None,
        apdu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        let mut map = Params::new();
        for (k, v) in pairs {
            map.entry(k.to_string())
                .or_default()
                .push(v.to_string());
        }
        map
    }

    #[test]
    fn test_full_submission() {
        let payload = normalize(&params(&[
            ("submit", "0011AABB"),
            ("MSISDN", "+258841234567"),
            ("sms_submit_ud", "hello"),
            ("sms_submit_da", "+258821112222"),
            ("sms_submit_pid", "00"),
            ("sms_submit_dcs", "08"),
        ]))
        .unwrap();

        assert_eq!(payload.raw_data, "0011AABB");
        assert_eq!(payload.msisdn, "+258841234567");
        assert_eq!(payload.user_data, "hello");
        assert_eq!(payload.destination_address, "+258821112222");
        assert_eq!(payload.protocol_identifier, "00");
        assert_eq!(payload.data_coding_scheme, "08");
        assert!(payload.apdu.is_some());
    }

    #[test]
    fn test_all_fields_empty_is_rejected() {
        let result = normalize(&params(&[]));
        assert!(matches!(result, Err(IngestError::MissingRequiredField)));
    }

    #[test]
    fn test_msisdn_alone_is_not_a_message() {
        let result = normalize(&params(&[("MSISDN", "+258841234567")]));
        assert!(matches!(result, Err(IngestError::MissingRequiredField)));
    }

    #[test]
    fn test_single_field_is_enough() {
        let payload = normalize(&params(&[("sms_submit_da", "+258821112222")])).unwrap();
        assert_eq!(payload.destination_address, "+258821112222");
        assert!(payload.raw_data.is_empty());
        assert!(payload.apdu.is_none());
    }

    #[test]
    fn test_apdu_hex_alias() {
        let payload = normalize(&params(&[("apdu_hex", "0011")])).unwrap();
        assert_eq!(payload.raw_data, "0011");
    }

    #[test]
    fn test_lowercase_msisdn_alias() {
        let payload =
            normalize(&params(&[("submit", "00"), ("msisdn", "+258840000001")])).unwrap();
        assert_eq!(payload.msisdn, "+258840000001");
    }

    #[test]
    fn test_multi_valued_params_preserved() {
        let mut map = params(&[("submit", "0011")]);
        map.get_mut("submit").unwrap().push("2233".to_string());

        let payload = normalize(&map).unwrap();
        // First value wins for the field, all values survive in query_params.
        assert_eq!(payload.raw_data, "0011");
        assert_eq!(payload.query_params["submit"], vec!["0011", "2233"]);
    }

    #[test]
    fn test_unparseable_hex_still_accepted() {
        let payload = normalize(&params(&[("submit", "not-hex-at-all")])).unwrap();
        let apdu = payload.apdu.unwrap();
        assert!(!apdu.parsed);
        assert_eq!(payload.raw_data, "not-hex-at-all");
    }
}
