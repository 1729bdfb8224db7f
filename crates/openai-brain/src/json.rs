//! Lenient parsing of model-produced JSON.

use brain_core::{tags, BrainError, Classification, Entities};
use serde::Deserialize;
use serde_json::Value;

/// Classification as the model writes it. Counts may arrive as numbers or
/// strings and tags in any case.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawClassification {
    tags: Vec<String>,
    profile: Option<String>,
    sentiment: Option<String>,
    entities: RawEntities,
    journey_stage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEntities {
    name: Option<String>,
    farm_name: Option<String>,
    location: Option<String>,
    pivot_count: Option<Value>,
    pump_count: Option<Value>,
}

/// Parse a classifier response into a [`Classification`].
///
/// Tags outside the shared vocabulary are dropped.
pub fn parse_classification(response: &str) -> Result<Classification, BrainError> {
    let json = extract_json(response);
    let raw: RawClassification = serde_json::from_str(json).map_err(|e| {
        BrainError::ProcessingFailed(format!(
            "unparseable classification: {}, response was: {}",
            e, response
        ))
    })?;

    let tags = raw
        .tags
        .iter()
        .map(|tag| tag.trim().to_uppercase())
        .filter(|tag| tags::ALL.contains(&tag.as_str()))
        .collect();

    Ok(Classification {
        tags,
        profile: non_empty(raw.profile).map(|p| p.to_lowercase()),
        sentiment: non_empty(raw.sentiment),
        entities: Entities {
            name: non_empty(raw.entities.name),
            farm_name: non_empty(raw.entities.farm_name),
            location: non_empty(raw.entities.location),
            pivot_count: raw.entities.pivot_count.as_ref().and_then(count),
            pump_count: raw.entities.pump_count.as_ref().and_then(count),
        },
        journey_stage: non_empty(raw.journey_stage).map(|s| s.to_lowercase()),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

fn count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract JSON from a response that may contain markdown or other text.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if trimmed.starts_with('{') {
        return extract_balanced_json(trimmed);
    }

    if let Some(start) = trimmed.find("```") {
        let after_backticks = &trimmed[start + 3..];
        // Skip the optional language identifier
        let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(end) = after_backticks[json_start..].find("```") {
            let extracted = after_backticks[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    if let Some(start) = trimmed.find('{') {
        return extract_balanced_json(&trimmed[start..]);
    }

    trimmed
}

/// Cut a string starting with '{' at its matching closing brace.
///
/// Models sometimes add trailing text or stray braces after the object.
pub fn extract_balanced_json(s: &str) -> &str {
    if !s.starts_with('{') {
        return s;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return &s[..=i];
                }
            }
            _ => {}
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_balanced_json_trailing_braces() {
        assert_eq!(extract_balanced_json(r#"{"a": 1}}}"#), r#"{"a": 1}"#);
        assert_eq!(
            extract_balanced_json(r#"{"a": "}{"} trailing"#),
            r#"{"a": "}{"}"#
        );
        assert_eq!(extract_balanced_json(r#"{"a": 1"#), r#"{"a": 1"#);
    }

    #[test]
    fn test_extract_json_from_markdown() {
        let response = "Here you go:\n```json\n{\"tags\": []}\n```\nAnything else?";
        assert_eq!(extract_json(response), r#"{"tags": []}"#);

        let prose = "The answer is {\"tags\": [\"GREETING\"]} as requested";
        assert_eq!(extract_json(prose), r#"{"tags": ["GREETING"]}"#);
    }

    #[test]
    fn test_parse_classification_full() {
        let response = r#"{
            "tags": ["quote_request", "QUANTITY_GIVEN", "MADE_UP"],
            "profile": "Technical",
            "sentiment": "positive",
            "entities": {"farm_name": "Boa Vista", "location": " Goiás ", "pivot_count": "3", "pump_count": 2},
            "journey_stage": "Consideration"
        }"#;
        let parsed = parse_classification(response).unwrap();

        assert_eq!(parsed.tags.len(), 2);
        assert!(parsed.has_tag(tags::QUOTE_REQUEST));
        assert!(parsed.has_tag(tags::QUANTITY_GIVEN));
        assert_eq!(parsed.profile.as_deref(), Some("technical"));
        assert_eq!(parsed.entities.farm_name.as_deref(), Some("Boa Vista"));
        assert_eq!(parsed.entities.location.as_deref(), Some("Goiás"));
        assert_eq!(parsed.entities.pivot_count, Some(3));
        assert_eq!(parsed.entities.pump_count, Some(2));
        assert_eq!(parsed.journey_stage.as_deref(), Some("consideration"));
    }

    #[test]
    fn test_parse_classification_nulls_and_negatives() {
        let response = r#"{"tags": [], "profile": "", "entities": {"location": "null", "pivot_count": -1}}"#;
        let parsed = parse_classification(response).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_classification_garbage() {
        assert!(matches!(
            parse_classification("I cannot help with that."),
            Err(BrainError::ProcessingFailed(_))
        ));
    }
}
