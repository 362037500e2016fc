//! Status classification of raw transport outcomes.
//!
//! Each source kind has its own fixed rule. The rules mirror the response
//! formats of the respective sources and are conservative: anything that does
//! not clearly match a registered or unregistered signature is `Failed`, since
//! a false "unregistered" verdict is the expensive mistake.

use crate::types::{Payload, RawOutcome, SourceKind, Status};
use serde_json::Value;

/// Substrings in WHOIS client output that mean "no such registration".
const WHOIS_FREE_MARKERS: [&str; 4] = ["can't find", "not found", "not exist", "status: free"];

/// Prefix of the raw WHOIS text for an unregistered domain on the raw API.
const RAW_NOT_FOUND_PREFIX: &str = "Not found";

/// Classify an outcome according to the rule of `kind`.
///
/// Pure and total: the same outcome always maps to the same status and no
/// input panics.
pub fn classify(outcome: &RawOutcome, kind: SourceKind) -> Status {
    match kind {
        SourceKind::Whois => classify_whois(outcome),
        SourceKind::JsonApi => classify_json_api(outcome),
        SourceKind::RawApi => classify_raw_api(outcome),
    }
}

fn classify_whois(outcome: &RawOutcome) -> Status {
    if outcome.code != Some(0) {
        return Status::Failed;
    }

    let text = match &outcome.payload {
        Payload::Text(text) => text.to_lowercase(),
        Payload::Json(value) => value.to_string().to_lowercase(),
    };

    if WHOIS_FREE_MARKERS.iter().any(|marker| text.contains(marker)) {
        Status::Unregistered
    } else {
        Status::Registered
    }
}

fn classify_json_api(outcome: &RawOutcome) -> Status {
    let Some(body) = success_body(outcome) else {
        return Status::Failed;
    };
    if !number_equals(body.get("code"), 200) {
        return Status::Failed;
    }

    match body.get("data") {
        None => Status::Unregistered,
        Some(Value::Null) => Status::Failed,
        Some(Value::Object(data)) => {
            if is_blank(data.get("Domain Name")) {
                Status::Unregistered
            } else {
                Status::Registered
            }
        }
        Some(_) => Status::Failed,
    }
}

fn classify_raw_api(outcome: &RawOutcome) -> Status {
    let Some(body) = success_body(outcome) else {
        return Status::Failed;
    };
    if !number_equals(body.get("status"), 1) {
        return Status::Failed;
    }

    let Some(Value::Object(data)) = body.get("data") else {
        return Status::Failed;
    };

    match data.get("raw") {
        None => Status::Registered,
        Some(Value::Null) => Status::Failed,
        Some(Value::String(raw)) if raw.starts_with(RAW_NOT_FOUND_PREFIX) => Status::Unregistered,
        Some(Value::String(_)) => Status::Registered,
        Some(_) => Status::Failed,
    }
}

/// The JSON object body of an HTTP 200 outcome.
fn success_body(outcome: &RawOutcome) -> Option<&serde_json::Map<String, Value>> {
    if outcome.code != Some(200) {
        return None;
    }
    outcome.payload.as_json()?.as_object()
}

fn number_equals(value: Option<&Value>, expected: i64) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_f64() == Some(expected as f64),
        _ => false,
    }
}

/// Absent, null, false, zero, or an empty string/array/object.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}
