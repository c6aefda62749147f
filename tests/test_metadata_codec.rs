mod common;

use apicize_transcode::{
    METADATA_END, METADATA_START, MetadataError, MetadataRecord, RequestEntry, contains_block,
    decode_block, decode_value, encode_block, encode_block_indented,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// =============================================================================
// encode / decode
// =============================================================================

#[test]
fn test_encode_block_is_delimited_comment() {
    let block = encode_block(&json!({"a": 1})).unwrap();
    assert!(block.starts_with(METADATA_START));
    assert!(block.ends_with(METADATA_END));
    assert!(block.starts_with("/*"));
    assert!(block.ends_with("*/"));
}

#[test]
fn test_encode_escapes_comment_terminator() {
    let block = encode_block(&json!({"text": "a */ b"})).unwrap();
    let interior = &block[METADATA_START.len()..block.len() - METADATA_END.len()];
    assert!(!interior.contains("*/"));
    let decoded = decode_value(&block).unwrap();
    assert_eq!(decoded, json!({"text": "a */ b"}));
}

#[test]
fn test_decode_tolerates_surrounding_and_reindented_text() {
    let block = encode_block_indented(&json!({"id": "x", "nested": {"n": 1.5}}), "        ").unwrap();
    let text = format!("const a = 1;\n\n   {block}   \n// trailing\n");
    let decoded: Value = decode_block(&text).unwrap();
    assert_eq!(decoded, json!({"id": "x", "nested": {"n": 1.5}}));

    let reindented = block.replace("\n        ", "\n  ");
    assert_eq!(decode_value(&reindented).unwrap(), decoded);
}

#[test]
fn test_decode_missing_is_soft() {
    let err = decode_value("describe('x', function () {});").unwrap_err();
    assert!(err.is_missing());
    assert!(!contains_block("/* ordinary comment */"));
}

#[test]
fn test_decode_unterminated() {
    let text = format!("\n\n{} {{\"a\": 1}}", METADATA_START);
    match decode_value(&text) {
        Err(MetadataError::Unterminated { start }) => {
            assert_eq!(start.line, 3);
            assert_eq!(start.column, 1);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_decode_malformed_is_distinct_from_missing() {
    let text = format!("{}\n{{\"id\": \"abc\", \n{}", METADATA_START, METADATA_END);
    let err = decode_value(&text).unwrap_err();
    assert!(!err.is_missing());
    match &err {
        MetadataError::Malformed {
            position: Some(position),
            ..
        } => assert!(position.line >= 1),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(err.to_string().contains(" at payload "));
}

#[test]
fn test_decode_first_block_wins() {
    let first = encode_block(&json!({"n": 1})).unwrap();
    let second = encode_block(&json!({"n": 2})).unwrap();
    let text = format!("{first}\n{second}");
    assert_eq!(decode_value(&text).unwrap(), json!({"n": 1}));
}

// =============================================================================
// MetadataRecord
// =============================================================================

#[test]
fn test_group_record_omits_children() {
    let workbook = common::sample_workbook();
    let RequestEntry::Group(group) = &workbook.requests[0] else {
        panic!("expected group");
    };
    let value = MetadataRecord::Group(group.clone()).to_value().unwrap();
    assert_eq!(value["kind"], "group");
    assert!(value.get("children").is_none());
    assert_eq!(value["id"], "group-users");
    assert_eq!(value["execution"], "CONCURRENT");

    let decoded = MetadataRecord::decode(&MetadataRecord::Group(group.clone()).encode("    ").unwrap()).unwrap();
    match decoded {
        MetadataRecord::Group(decoded) => {
            assert!(decoded.children.is_empty());
            assert_eq!(decoded.id, group.id);
            assert_eq!(decoded.runs, 2);
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_request_record_omits_test() {
    let request = common::request("req-1", "One", Some("expect(1).to.equal(1)"));
    let value = MetadataRecord::Request(request.clone()).to_value().unwrap();
    assert_eq!(value["kind"], "request");
    assert!(value.get("test").is_none());

    let decoded = MetadataRecord::from_value(value).unwrap();
    let expected = apicize_transcode::Request {
        test: None,
        ..request
    };
    assert_eq!(decoded, MetadataRecord::Request(expected));
}

#[test]
fn test_record_rejects_unknown_kind() {
    let err = MetadataRecord::from_value(json!({"kind": "widget"})).unwrap_err();
    assert!(matches!(err, MetadataError::Malformed { .. }));
    let err = MetadataRecord::from_value(json!({"id": "x"})).unwrap_err();
    assert!(matches!(err, MetadataError::Malformed { .. }));
    let err = MetadataRecord::from_value(json!([1, 2])).unwrap_err();
    assert!(matches!(err, MetadataError::Malformed { .. }));
}

#[test]
fn test_record_errors_carry_no_payload_position() {
    let err = MetadataRecord::from_value(json!({"kind": "widget"})).unwrap_err();
    assert!(matches!(err, MetadataError::Malformed { position: None, .. }));
    assert_eq!(
        err.to_string(),
        "metadata block is malformed: unknown metadata kind \"widget\""
    );
}

#[test]
fn test_record_regenerates_missing_id() {
    let record = MetadataRecord::from_value(json!({"kind": "group", "name": "G"})).unwrap();
    match record {
        MetadataRecord::Group(group) => {
            assert_eq!(group.name, "G");
            assert_eq!(group.id.len(), 36);
        }
        other => panic!("unexpected record {:?}", other),
    }
}
