//! Language-model health report.
//!
//! Small models rarely follow a schema exactly, so the response is scanned
//! for the first balanced JSON object and its fields are read leniently.
//! Anything that cannot be recovered ends up in
//! [`AiSummary::Unstructured`] instead of an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::llm::LanguageModel;

/// Structured report returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Whether the model thinks something is wrong
    #[serde(default, deserialize_with = "lenient_bool")]
    pub problem_detected: Option<bool>,
    /// Free-form severity, e.g. "low" or "3"
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity_level: Option<String>,
    /// Short description of the plant's condition
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    /// Suggested actions, one per entry
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommendations: Vec<String>,
    /// Keys outside the requested schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of asking the model for a report.
///
/// Serialized as `{"kind": ..., "report": {...}}` so keys chosen by the
/// model can never collide with the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "report", rename_all = "snake_case")]
pub enum AiSummary {
    /// A JSON object was found and parsed
    Structured(HealthReport),
    /// The call failed or the reply held no usable JSON
    Unstructured {
        /// Model output, absent when the call itself failed
        raw_text: Option<String>,
        /// What went wrong
        error: String,
    },
}

impl AiSummary {
    /// Whether the reply parsed into a report.
    pub fn is_structured(&self) -> bool {
        matches!(self, AiSummary::Structured(_))
    }

    /// Error marker of a degraded summary.
    pub fn error(&self) -> Option<&str> {
        match self {
            AiSummary::Structured(_) => None,
            AiSummary::Unstructured { error, .. } => Some(error),
        }
    }
}

/// Build the prompt for a scene's statistics.
pub fn build_prompt(
    ndvi_mean: f64,
    lci_mean: f64,
    analysis_text: &str,
    accuracy: Option<f64>,
) -> String {
    let accuracy = accuracy.map_or_else(|| "N/A".to_string(), |a| format!("{a:.3}"));
    format!(
        "You are an agricultural expert. Analyze the following:\n\
         - NDVI mean: {ndvi_mean:.3}\n\
         - LCI mean: {lci_mean:.3}\n\
         - Health summary: {analysis_text}\n\
         - Accuracy: {accuracy}\n\
         \n\
         Return JSON with:\n\
         problem_detected, severity_level, summary, and recommendations."
    )
}

/// First balanced top-level `{...}` span of `text`.
///
/// Braces inside JSON string literals are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turn a raw model reply into a summary.
pub fn parse_response(text: &str) -> AiSummary {
    let Some(span) = extract_json_object(text) else {
        return AiSummary::Unstructured {
            raw_text: Some(text.trim().to_string()),
            error: "no JSON object in model response".to_string(),
        };
    };

    match serde_json::from_str::<HealthReport>(span) {
        Ok(report) => AiSummary::Structured(report),
        Err(e) => AiSummary::Unstructured {
            raw_text: Some(text.trim().to_string()),
            error: format!("invalid JSON in model response: {e}"),
        },
    }
}

/// Ask `model` for a report. Never fails; problems are logged and folded
/// into [`AiSummary::Unstructured`].
pub fn request_summary(model: &dyn LanguageModel, prompt: &str) -> AiSummary {
    log::info!("Requesting AI summary from {}", model.name());
    let summary = match model.complete(prompt) {
        Ok(text) => parse_response(&text),
        Err(e) => AiSummary::Unstructured {
            raw_text: None,
            error: format!("AI summary failed: {e}"),
        },
    };
    if let Some(error) = summary.error() {
        log::warn!("AI summary degraded: {}", error);
    }
    summary
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" | "none" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_string))
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.into_iter().filter_map(value_to_string).collect(),
        Some(other) => value_to_string(other).into_iter().collect(),
        None => Vec::new(),
    })
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelServiceError;

    struct Canned(Result<&'static str, &'static str>);

    impl LanguageModel for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn complete(&self, _prompt: &str) -> Result<String, ModelServiceError> {
            self.0
                .map(str::to_string)
                .map_err(|e| ModelServiceError::Unavailable(e.to_string()))
        }
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_prompt(0.51234, 0.1, "Mixed vegetation health detected.", None);
        assert!(prompt.contains("NDVI mean: 0.512"));
        assert!(prompt.contains("LCI mean: 0.100"));
        assert!(prompt.contains("Accuracy: N/A"));
        assert!(prompt.contains("problem_detected, severity_level, summary, and recommendations"));

        let prompt = build_prompt(0.0, 0.0, "x", Some(0.95));
        assert!(prompt.contains("Accuracy: 0.950"));
    }

    #[test]
    fn test_extract_skips_prose_and_string_braces() {
        let text = r#"Sure! Here it is: {"summary": "a {weird} value", "n": {"x": 1}} hope that helps }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"summary": "a {weird} value", "n": {"x": 1}}"#)
        );
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let text = r#"{"summary": "say \"}\" loudly"} trailing"#;
        assert_eq!(extract_json_object(text), Some(r#"{"summary": "say \"}\" loudly"}"#));
    }

    #[test]
    fn test_extract_none_when_unbalanced() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(r#"{"open": true"#), None);
    }

    #[test]
    fn test_parse_structured_lenient_fields() {
        let reply = r#"```json
{"problem_detected": "Yes", "severity_level": 2, "summary": "Low chlorophyll.",
 "recommendations": "Apply nitrogen", "confidence": 0.7}
```"#;
        let AiSummary::Structured(report) = parse_response(reply) else {
            panic!("expected structured summary");
        };
        assert_eq!(report.problem_detected, Some(true));
        assert_eq!(report.severity_level.as_deref(), Some("2"));
        assert_eq!(report.summary.as_deref(), Some("Low chlorophyll."));
        assert_eq!(report.recommendations, vec!["Apply nitrogen".to_string()]);
        assert_eq!(report.extra.get("confidence"), Some(&serde_json::json!(0.7)));
    }

    #[test]
    fn test_parse_without_json_keeps_text() {
        let summary = parse_response("  The leaves look fine.  ");
        assert_eq!(
            summary,
            AiSummary::Unstructured {
                raw_text: Some("The leaves look fine.".to_string()),
                error: "no JSON object in model response".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_invalid_json_keeps_text() {
        let summary = parse_response("{summary: unquoted}");
        assert!(!summary.is_structured());
        assert!(summary.error().unwrap().starts_with("invalid JSON"));
    }

    #[test]
    fn test_request_summary_never_fails() {
        let summary = request_summary(&Canned(Err("connection refused")), "prompt");
        match summary {
            AiSummary::Unstructured { raw_text, error } => {
                assert_eq!(raw_text, None);
                assert!(error.contains("connection refused"));
            }
            other => panic!("unexpected summary {other:?}"),
        }

        let summary = request_summary(&Canned(Ok(r#"{"summary": "ok"}"#)), "prompt");
        assert!(summary.is_structured());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(AiSummary::Structured(HealthReport {
            summary: Some("fine".to_string()),
            ..HealthReport::default()
        }))
        .unwrap();
        assert_eq!(json["kind"], "structured");
        assert_eq!(json["report"]["summary"], "fine");

        let json = serde_json::to_value(AiSummary::Unstructured {
            raw_text: None,
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "unstructured");
        assert_eq!(json["report"]["error"], "boom");
    }

    #[test]
    fn test_model_keys_do_not_override_tag() {
        let summary = parse_response(r#"{"kind": "unstructured", "summary": "fine"}"#);
        let AiSummary::Structured(report) = &summary else {
            panic!("expected structured summary, got {summary:?}");
        };
        assert_eq!(report.extra.get("kind"), Some(&serde_json::json!("unstructured")));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "structured");
        assert_eq!(json["report"]["kind"], "unstructured");

        let text = serde_json::to_string(&summary).unwrap();
        assert_eq!(text.matches("\"kind\"").count(), 2);
        let back: AiSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, summary);
    }
}
