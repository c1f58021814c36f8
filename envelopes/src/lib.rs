//! Shared envelope model and JSON codec for the socketbus wire protocol.
//!
//! This crate owns the wire representation used between a socketbus client
//! and whatever peer sits on the other end of the socket. Envelopes keep
//! payloads flexible (`serde_json::Value`) and fix exactly one canonical
//! schema: outbound frames are `{"data": ..., "route": "..."}` and inbound
//! frames are `{"identifier": "...", "data": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key-value payload carried inside an inbound envelope.
pub type Payload = Map<String, Value>;

/// Error returned by [`encode_envelope`] and [`decode_envelope`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text could not be parsed, or the value could not be serialized.
    #[error("envelope JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level JSON value is not an object.
    #[error("envelope is not a JSON object")]
    NotAnObject,
    /// A routing field is absent or carries the wrong JSON type.
    #[error("envelope field `{0}` is missing or mistyped")]
    BadField(&'static str),
}

/// Outgoing wire frame: arbitrary JSON content tagged with a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Arbitrary JSON payload.
    pub data: Value,
    /// Topic string the peer routes this message by.
    pub route: String,
}

/// Incoming wire frame after shape validation.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundEnvelope {
    /// Topic string used to match subscriptions.
    pub identifier: String,
    /// The object under the `data` key.
    pub payload: Payload,
}

/// Encode content bound for `route` into wire text.
///
/// Object keys serialize in sorted order: the `serde_json` map is
/// `BTreeMap`-backed and the envelope fields are declared in sorted
/// position, so the output is byte-deterministic for equal input.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the content cannot be serialized.
pub fn encode_envelope(content: &Value, route: &str) -> Result<String, CodecError> {
    let envelope = OutboundEnvelope { data: content.clone(), route: route.to_owned() };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode wire text into an inbound envelope.
///
/// Parsing is permissive: any top-level JSON value is accepted by the
/// parser. Shape validation is not: only an object carrying a string
/// `identifier` and an object `data` is routable.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for unparseable text,
/// [`CodecError::NotAnObject`] for non-object top-level values, and
/// [`CodecError::BadField`] for absent or mistyped routing fields.
pub fn decode_envelope(text: &str) -> Result<InboundEnvelope, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };

    let identifier = object
        .get("identifier")
        .and_then(Value::as_str)
        .ok_or(CodecError::BadField("identifier"))?
        .to_owned();

    let payload = object
        .get("data")
        .and_then(Value::as_object)
        .ok_or(CodecError::BadField("data"))?
        .clone();

    Ok(InboundEnvelope { identifier, payload })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
