//! Response parser: raw model text → `Vec<Annotation>`.
//!
//! Models wrap their JSON in prose or fences now and then, so the payload is
//! taken to be the span from the first `{` to the last `}`. That span must
//! decode as JSON and carry an `annotations` array; anything else is a
//! [`DrawingError::MalformedResponse`] for this attempt. There is no partial
//! recovery and no re-prompting.
//!
//! Inside a well-formed payload every field is best-effort, and each default
//! below is its own branch:
//!
//! | field | missing / malformed |
//! |-------|---------------------|
//! | `original` | `""` (numbers are stringified) |
//! | `bbox` | `[0, 0, 0, 0]` unless exactly four numbers |
//! | `candidates` | `[]` |
//! | `ja`, `category`, `en_desc` | `""` |
//!
//! Non-object entries in `annotations` or `candidates` are skipped.

use crate::annotation::{Annotation, BBox, Candidate};
use crate::error::DrawingError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse a raw model reply into annotations.
pub fn parse_response(raw: &str) -> Result<Vec<Annotation>, DrawingError> {
    let payload = locate_payload(raw).ok_or_else(|| DrawingError::MalformedResponse {
        reason: "no JSON object found in the response".into(),
    })?;

    let value: Value = serde_json::from_str(payload).map_err(|e| {
        // serde_json errors carry only line/column, never the input itself.
        DrawingError::MalformedResponse {
            reason: format!("payload is not valid JSON ({e})"),
        }
    })?;

    let entries = match value.get("annotations") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(DrawingError::MalformedResponse {
                reason: "`annotations` is not a list".into(),
            })
        }
        None => {
            return Err(DrawingError::MalformedResponse {
                reason: "payload has no `annotations` field".into(),
            })
        }
    };

    let annotations: Vec<Annotation> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry {
            Value::Object(obj) => Some(parse_annotation(i, obj)),
            other => {
                warn!("Skipping annotation #{}: expected object, got {}", i + 1, kind(other));
                None
            }
        })
        .collect();

    debug!("Parsed {} annotations", annotations.len());
    Ok(annotations)
}

/// Slice from the first `{` to the last `}` inclusive.
fn locate_payload(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

fn parse_annotation(index: usize, obj: &Map<String, Value>) -> Annotation {
    let original = match obj.get("original") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            debug!("Annotation #{}: no `original`, using empty string", index + 1);
            String::new()
        }
    };

    let bbox = parse_bbox(obj.get("bbox")).unwrap_or_else(|| {
        debug!("Annotation #{}: missing or malformed `bbox`, using zeros", index + 1);
        BBox::default()
    });

    let candidates = match obj.get("candidates") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().map(parse_candidate))
            .collect(),
        _ => {
            debug!("Annotation #{}: no `candidates`, using empty list", index + 1);
            Vec::new()
        }
    };

    Annotation {
        original,
        candidates,
        bbox,
    }
}

fn parse_bbox(value: Option<&Value>) -> Option<BBox> {
    let items = value?.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0f32; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(BBox(out))
}

fn parse_candidate(obj: &Map<String, Value>) -> Candidate {
    Candidate {
        translated_text: string_field(obj, "ja"),
        category: string_field(obj, "category"),
        rationale: string_field(obj, "en_desc"),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(raw: &str) -> String {
        match parse_response(raw) {
            Err(DrawingError::MalformedResponse { reason }) => reason,
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn surrounding_prose_is_tolerated() {
        let parsed = parse_response(r#"blah {"annotations":[]} trailing"#).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn markdown_fence_is_tolerated() {
        let raw = "Here you go:\n```json\n{\"annotations\": [{\"original\": \"Tap\", \"candidates\": [{\"ja\": \"タップ\", \"category\": \"Standard\", \"en_desc\": \"Same word\"}], \"bbox\": [1, 2, 3, 4]}]}\n```\n";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].original, "Tap");
        assert_eq!(parsed[0].candidates[0].translated_text, "タップ");
        assert_eq!(parsed[0].bbox, BBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn no_braces_is_malformed() {
        let reason = malformed("I could not find any text in this drawing.");
        assert!(reason.contains("no JSON object"));
    }

    #[test]
    fn reversed_braces_are_malformed() {
        malformed("} nothing here {");
    }

    #[test]
    fn invalid_json_is_malformed_without_echoing_input() {
        let reason = malformed(r#"{"annotations": [SECRET-PROMPT-ECHO}"#);
        assert!(!reason.contains("SECRET-PROMPT-ECHO"));
    }

    #[test]
    fn missing_annotations_field_is_malformed() {
        let reason = malformed(r#"{"regions": []}"#);
        assert!(reason.contains("annotations"));
    }

    #[test]
    fn annotations_must_be_a_list() {
        malformed(r#"{"annotations": {"original": "x"}}"#);
    }

    #[test]
    fn missing_original_defaults_to_empty() {
        let parsed = parse_response(r#"{"annotations":[{"candidates":[],"bbox":[0,0,1,1]}]}"#).unwrap();
        assert_eq!(parsed[0].original, "");
    }

    #[test]
    fn numeric_original_is_stringified() {
        let parsed = parse_response(r#"{"annotations":[{"original": 42}]}"#).unwrap();
        assert_eq!(parsed[0].original, "42");
    }

    #[test]
    fn missing_bbox_defaults_to_zeros() {
        let parsed = parse_response(r#"{"annotations":[{"original":"Ream"}]}"#).unwrap();
        assert_eq!(parsed[0].bbox, BBox([0.0; 4]));
    }

    #[test]
    fn short_bbox_defaults_to_zeros() {
        let parsed = parse_response(r#"{"annotations":[{"original":"Ream","bbox":[1,2,3]}]}"#).unwrap();
        assert_eq!(parsed[0].bbox, BBox::default());
    }

    #[test]
    fn non_numeric_bbox_defaults_to_zeros() {
        let parsed =
            parse_response(r#"{"annotations":[{"original":"Ream","bbox":[1,"2",3,4]}]}"#).unwrap();
        assert_eq!(parsed[0].bbox, BBox::default());
    }

    #[test]
    fn out_of_range_bbox_is_kept() {
        let parsed =
            parse_response(r#"{"annotations":[{"original":"X","bbox":[-10, 0, 1200, 500.5]}]}"#)
                .unwrap();
        assert_eq!(parsed[0].bbox, BBox::new(-10.0, 0.0, 1200.0, 500.5));
    }

    #[test]
    fn missing_candidates_default_to_empty() {
        let parsed = parse_response(r#"{"annotations":[{"original":"Datum A"}]}"#).unwrap();
        assert!(parsed[0].candidates.is_empty());
    }

    #[test]
    fn missing_candidate_fields_default_to_empty() {
        let parsed =
            parse_response(r#"{"annotations":[{"original":"Tap","candidates":[{"ja":"タップ"}]}]}"#)
                .unwrap();
        let c = &parsed[0].candidates[0];
        assert_eq!(c.translated_text, "タップ");
        assert_eq!(c.category, "");
        assert_eq!(c.rationale, "");
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let parsed = parse_response(
            r#"{"annotations":["junk", {"original":"Tap","candidates":[42, {"ja":"タップ"}]}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].candidates.len(), 1);
    }

    #[test]
    fn candidate_order_is_preserved() {
        let parsed = parse_response(
            r#"{"annotations":[{"original":"Drill","candidates":[{"ja":"B"},{"ja":"A"},{"ja":"C"}]}]}"#,
        )
        .unwrap();
        let texts: Vec<_> = parsed[0]
            .candidates
            .iter()
            .map(|c| c.translated_text.as_str())
            .collect();
        assert_eq!(texts, ["B", "A", "C"]);
    }
}
