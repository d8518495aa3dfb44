use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{GenerateError, GenerateField, GeneratedMetadata};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("code fence pattern is valid")
});

const PROMPT_PREAMBLE: &str =
    "You are an assistant for a photography portfolio website. Given the following photo, generate";
const PROMPT_SUFFIX: &str = "Do not include any other text.";

pub fn build_prompt(field: GenerateField, location: Option<&str>) -> String {
    let location_hint = location
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(|location| format!(" The photo was taken in {}.", location))
        .unwrap_or_default();

    let (task, format) = match field {
        GenerateField::Title => ("a short artistic title.", r#"{"title": "..."}"#),
        GenerateField::Description => (
            "a brief evocative description (1-2 sentences).",
            r#"{"description": "..."}"#,
        ),
        GenerateField::Tags => (
            "a comma-separated list of relevant tags (e.g. location, film type, colors, camera, lens, mood, style, subject). Provide 5-10 concise tags.",
            r#"{"tags": "tag1, tag2, tag3, ..."}"#,
        ),
        GenerateField::Both => (
            "a short artistic title and a brief evocative description (1-2 sentences).",
            r#"{"title": "...", "description": "..."}"#,
        ),
    };

    format!(
        "{} {}{} Respond in JSON format: {}. {}",
        PROMPT_PREAMBLE, task, location_hint, format, PROMPT_SUFFIX
    )
}

/// Pulls the requested fields out of the model's reply. The reply may wrap
/// its JSON in a markdown code fence; keys the model left out come back as
/// empty strings.
pub fn parse_reply(field: GenerateField, reply: &str) -> Result<GeneratedMetadata, GenerateError> {
    let reply = reply.trim();
    let json = CODE_FENCE
        .captures(reply)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().trim())
        .unwrap_or(reply);

    let parsed: Value =
        serde_json::from_str(json).map_err(|e| GenerateError::MalformedReply(e.to_string()))?;
    let object = parsed.as_object().ok_or_else(|| {
        GenerateError::MalformedReply("expected a JSON object".to_string())
    })?;

    let read = |key: &str| object.get(key).map(value_to_text).unwrap_or_default();

    Ok(GeneratedMetadata {
        title: field.wants_title().then(|| read("title")),
        description: field.wants_description().then(|| read("description")),
        tags: field.wants_tags().then(|| read("tags")),
    })
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
