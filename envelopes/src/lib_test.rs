use super::*;

use serde_json::json;

#[test]
fn encode_produces_sorted_keys() {
    let text = encode_envelope(&json!({"x": 1}), "r").expect("encode");
    assert_eq!(text, r#"{"data":{"x":1},"route":"r"}"#);
}

#[test]
fn encode_sorts_nested_payload_keys() {
    let text = encode_envelope(&json!({"zeta": 1, "alpha": {"b": 2, "a": 1}}), "topic")
        .expect("encode");
    assert_eq!(
        text,
        r#"{"data":{"alpha":{"a":1,"b":2},"zeta":1},"route":"topic"}"#
    );
}

#[test]
fn encode_accepts_non_object_content() {
    let text = encode_envelope(&json!([1, 2, 3]), "list").expect("encode");
    assert_eq!(text, r#"{"data":[1,2,3],"route":"list"}"#);

    let text = encode_envelope(&Value::Null, "nil").expect("encode");
    assert_eq!(text, r#"{"data":null,"route":"nil"}"#);
}

#[test]
fn round_trip_preserves_payload() {
    let content = json!({"x": 1});
    let text = encode_envelope(&content, "r").expect("encode");

    // An inbound frame carries the same `data` key, so re-tagging the
    // outbound text with an identifier must yield the payload unchanged.
    let inbound = format!(r#"{{"identifier":"r",{}}}"#, &text[1..text.len() - 1]);
    let decoded = decode_envelope(&inbound).expect("decode");
    assert_eq!(decoded.identifier, "r");
    assert_eq!(Value::Object(decoded.payload), content);
}

#[test]
fn decode_extracts_identifier_and_payload() {
    let decoded = decode_envelope(r#"{"identifier":"ping","data":{"n":1}}"#).expect("decode");
    assert_eq!(decoded.identifier, "ping");
    assert_eq!(decoded.payload.get("n"), Some(&json!(1)));
}

#[test]
fn decode_ignores_extra_fields() {
    let decoded =
        decode_envelope(r#"{"identifier":"a","data":{},"ts":123,"from":"x"}"#).expect("decode");
    assert_eq!(decoded.identifier, "a");
    assert!(decoded.payload.is_empty());
}

#[test]
fn decode_accepts_empty_identifier() {
    let decoded = decode_envelope(r#"{"identifier":"","data":{}}"#).expect("decode");
    assert_eq!(decoded.identifier, "");
}

#[test]
fn decode_rejects_non_json_text() {
    let err = decode_envelope("not json").expect_err("text should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_rejects_missing_data() {
    let err = decode_envelope(r#"{"identifier":"a"}"#).expect_err("shape should fail");
    assert!(matches!(err, CodecError::BadField("data")));
}

#[test]
fn decode_rejects_missing_identifier() {
    let err = decode_envelope(r#"{"data":{}}"#).expect_err("shape should fail");
    assert!(matches!(err, CodecError::BadField("identifier")));
}

#[test]
fn decode_rejects_mistyped_fields() {
    let err = decode_envelope(r#"{"identifier":7,"data":{}}"#).expect_err("shape should fail");
    assert!(matches!(err, CodecError::BadField("identifier")));

    let err =
        decode_envelope(r#"{"identifier":"a","data":[1,2]}"#).expect_err("shape should fail");
    assert!(matches!(err, CodecError::BadField("data")));
}

#[test]
fn decode_rejects_non_object_fragments() {
    // Fragment parsing succeeds for scalars and arrays; shape validation
    // then rejects them as unroutable.
    let err = decode_envelope("42").expect_err("number should fail");
    assert!(matches!(err, CodecError::NotAnObject));

    let err = decode_envelope(r#""just a string""#).expect_err("string should fail");
    assert!(matches!(err, CodecError::NotAnObject));

    let err = decode_envelope("[1,2,3]").expect_err("array should fail");
    assert!(matches!(err, CodecError::NotAnObject));
}

#[test]
fn outbound_envelope_json_round_trips() {
    let envelope = OutboundEnvelope { data: json!({"k": "v"}), route: "topic".to_owned() };
    let text = serde_json::to_string(&envelope).expect("serialize");
    let restored: OutboundEnvelope = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(restored, envelope);
}
