//! Shape guards for untrusted response payloads.
//!
//! Each guard is a predicate over a raw [`serde_json::Value`] that returns
//! `true` only when the payload carries every field the endpoint promises,
//! with the right JSON type. The client runs the guard before building a
//! typed result; a payload that fails is reported as a schema error and never
//! reaches callers.

use serde_json::Value;

fn is_str(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_string)
}

fn is_count(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_u64)
}

fn is_optional_str(value: &Value, key: &str) -> bool {
    match value.get(key) {
        None | Some(Value::Null) => true,
        Some(v) => v.is_string(),
    }
}

/// `{status: "success"|"failure", message, url}`, with a non-empty message
/// on failure.
pub fn is_add_document_response(value: &Value) -> bool {
    let status = match value.get("status").and_then(Value::as_str) {
        Some(s) => s,
        None => return false,
    };
    let message = match value.get("message").and_then(Value::as_str) {
        Some(m) => m,
        None => return false,
    };
    if !is_str(value, "url") {
        return false;
    }
    match status {
        "success" => true,
        "failure" => !message.trim().is_empty(),
        _ => false,
    }
}

/// A single citation: `{content, metadata?: {source?}}`.
pub fn is_citation(value: &Value) -> bool {
    if !is_str(value, "content") {
        return false;
    }
    match value.get("metadata") {
        None | Some(Value::Null) => true,
        Some(meta) => meta.is_object() && is_optional_str(meta, "source"),
    }
}

/// `{answer, sources?: [citation]}`.
///
/// `answer` may be an empty string but must be present. A missing `sources`
/// reads as no citations.
pub fn is_search_response(value: &Value) -> bool {
    if !is_str(value, "answer") {
        return false;
    }
    match value.get("sources") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.iter().all(is_citation),
        Some(_) => false,
    }
}

/// `{url, title, chunk_count, added_at}`.
pub fn is_source_summary(value: &Value) -> bool {
    is_str(value, "url")
        && is_str(value, "title")
        && is_count(value, "chunk_count")
        && is_str(value, "added_at")
}

/// `{total_documents, total_chunks, sources}`.
///
/// Counts must be non-negative integers and `sources` an array. Entries are
/// checked separately by [`is_source_summary`].
pub fn is_stats_response(value: &Value) -> bool {
    is_count(value, "total_documents")
        && is_count(value, "total_chunks")
        && value.get("sources").is_some_and(Value::is_array)
}

/// `{status, timestamp?}` with a non-empty status.
pub fn is_health_response(value: &Value) -> bool {
    let status_ok = value
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    let timestamp_ok = match value.get("timestamp") {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_)) => true,
        Some(_) => false,
    };
    status_ok && timestamp_ok
}

/// Acknowledgement of a model switch: an object (possibly empty) or no body.
pub fn is_model_switch_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(_) => is_optional_str(value, "message") && is_optional_str(value, "model_type"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_document_guard() {
        assert!(is_add_document_response(
            &json!({"status": "success", "message": "", "url": "https://a"})
        ));
        assert!(is_add_document_response(
            &json!({"status": "failure", "message": "unreachable", "url": "https://a"})
        ));
        assert!(!is_add_document_response(
            &json!({"status": "failure", "message": "  ", "url": "https://a"})
        ));
        assert!(!is_add_document_response(
            &json!({"status": "queued", "message": "x", "url": "https://a"})
        ));
        assert!(!is_add_document_response(&json!({"status": "success", "message": "x"})));
    }

    #[test]
    fn test_search_guard_requires_answer() {
        assert!(is_search_response(&json!({"answer": "", "sources": []})));
        assert!(is_search_response(&json!({"answer": "yes"})));
        assert!(!is_search_response(&json!({"sources": []})));
        assert!(!is_search_response(&json!({"answer": null, "sources": []})));
        assert!(!is_search_response(&json!({"answer": 1})));
    }

    #[test]
    fn test_search_guard_checks_citations() {
        assert!(is_search_response(&json!({
            "answer": "a",
            "sources": [{"content": "c"}, {"content": "d", "metadata": {"source": "x.md"}}]
        })));
        assert!(!is_search_response(&json!({"answer": "a", "sources": [{"text": "c"}]})));
        assert!(!is_search_response(&json!({
            "answer": "a",
            "sources": [{"content": "c", "metadata": {"source": 7}}]
        })));
        assert!(!is_search_response(&json!({"answer": "a", "sources": "none"})));
    }

    #[test]
    fn test_stats_guard_iff_all_present() {
        let full = json!({"total_documents": 2, "total_chunks": 9, "sources": []});
        assert!(is_stats_response(&full));

        for key in ["total_documents", "total_chunks", "sources"] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(key);
            assert!(!is_stats_response(&partial), "guard accepted payload without {key}");
        }

        assert!(!is_stats_response(
            &json!({"total_documents": -1, "total_chunks": 0, "sources": []})
        ));
    }

    #[test]
    fn test_source_summary_guard() {
        assert!(is_source_summary(&json!({
            "url": "https://a", "title": "A", "chunk_count": 4, "added_at": "2024-11-17T00:00:00"
        })));
        assert!(!is_source_summary(&json!({"url": "https://a", "title": "A", "chunk_count": 4})));
    }

    #[test]
    fn test_health_guard() {
        assert!(is_health_response(&json!({"status": "healthy"})));
        assert!(is_health_response(&json!({"status": "ok", "timestamp": "2024-11-17T00:00:00Z"})));
        assert!(!is_health_response(&json!({"status": ""})));
        assert!(!is_health_response(&json!({"timestamp": 1})));
    }

    #[test]
    fn test_model_switch_guard() {
        assert!(is_model_switch_response(&Value::Null));
        assert!(is_model_switch_response(&json!({})));
        assert!(is_model_switch_response(&json!({"message": "switched", "model_type": "m"})));
        assert!(!is_model_switch_response(&json!("ok")));
        assert!(!is_model_switch_response(&json!({"message": 3})));
    }
}
