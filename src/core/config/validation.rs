use serde_json::{Map, Value};

use crate::core::errors::RagError;

const RETRIEVAL_MODES: [&str; 3] = ["heuristic", "remote", "vector"];

pub fn validate_config(config: &Value) -> Result<(), RagError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_enum_field(retrieval, "retrieval.mode", "mode", &RETRIEVAL_MODES)?;
    }

    if let Some(heuristic) = expect_optional_object(root, "heuristic")? {
        validate_chunking_section(heuristic, "heuristic")?;
        validate_f64_field(heuristic, "heuristic.min_score", "min_score", 0.0, 1_000.0)?;
    }

    if let Some(remote) = expect_optional_object(root, "remote")? {
        validate_chunking_section(remote, "remote")?;
        validate_u64_field(remote, "remote.batch_size", "batch_size", 1, 50)?;
        validate_u64_field(remote, "remote.snippet_chars", "snippet_chars", 1, 100_000)?;
        validate_u64_field(remote, "remote.max_tokens", "max_tokens", 1, 100_000)?;
        validate_f64_field(remote, "remote.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(vector) = expect_optional_object(root, "vector")? {
        validate_chunking_section(vector, "vector")?;
    }

    if let Some(groq) = expect_optional_object(root, "groq")? {
        validate_required_string_if_present(groq, "groq.base_url", "base_url")?;
        validate_required_string_if_present(groq, "groq.model", "model")?;
        validate_optional_string_field(groq, "groq.api_key", "api_key")?;
        validate_u64_field(groq, "groq.min_interval_ms", "min_interval_ms", 0, 600_000)?;
        validate_u64_field(groq, "groq.max_attempts", "max_attempts", 1, 20)?;
        validate_u64_field(groq, "groq.backoff_ms", "backoff_ms", 0, 600_000)?;
        validate_u64_field(
            groq,
            "groq.default_retry_after_secs",
            "default_retry_after_secs",
            0,
            3_600,
        )?;
        validate_u64_field(
            groq,
            "groq.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_required_string_if_present(embedding, "embedding.base_url", "base_url")?;
        validate_required_string_if_present(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.api_key", "api_key")?;
        validate_u64_field(
            embedding,
            "embedding.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(answer) = expect_optional_object(root, "answer")? {
        validate_u64_field(answer, "answer.max_tokens", "max_tokens", 1, 100_000)?;
        validate_f64_field(answer, "answer.temperature", "temperature", 0.0, 2.0)?;
    }

    Ok(())
}

fn validate_chunking_section(section: &Map<String, Value>, prefix: &str) -> Result<(), RagError> {
    validate_u64_field(
        section,
        &format!("{}.chunk_max_length", prefix),
        "chunk_max_length",
        1,
        1_000_000,
    )?;
    validate_u64_field(section, &format!("{}.top_k", prefix), "top_k", 1, 1_000)
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, RagError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(RagError::InvalidConfig(format!(
            "'{}' must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(RagError::InvalidConfig(format!(
            "'{}' must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(RagError::InvalidConfig(format!(
            "'{}' must be one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_required_string_if_present(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(RagError::InvalidConfig(format!(
            "'{}' cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn config_type_error(path: &str, expected: &str) -> RagError {
    RagError::InvalidConfig(format!("'{}': expected {}", path, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_partial_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "retrieval": { "mode": "heuristic" },
            "remote": { "batch_size": 3, "temperature": 0.1 },
            "groq": { "api_key": null }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = validate_config(&json!({ "retrieval": { "mode": "bm25" } })).unwrap_err();
        assert!(err.to_string().contains("retrieval.mode"));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(validate_config(&json!({ "remote": { "batch_size": 0 } })).is_err());
        assert!(validate_config(&json!({ "groq": { "max_attempts": 0 } })).is_err());
        assert!(validate_config(&json!({ "answer": { "temperature": 3.5 } })).is_err());
        assert!(
            validate_config(&json!({ "embedding": { "request_timeout_secs": 0 } })).is_err()
        );
    }

    #[test]
    fn rejects_wrong_section_types() {
        assert!(validate_config(&json!({ "groq": "fast" })).is_err());
        assert!(validate_config(&json!({ "heuristic": { "top_k": "five" } })).is_err());
    }
}
