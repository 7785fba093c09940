//! crates/learning_tracker_core/src/plan.rs
//!
//! Prompt construction and best-effort parsing for generated learning plans.
//! Parsing never fails: anything missing or malformed degrades to an empty
//! value so callers always get a usable `LearningPlan`.

use crate::domain::{LearningPlan, PlanRequest, PlanVideo};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const PLAN_PROMPT_TEMPLATE: &str = r#"I want to learn about "{title}".
I am {level}. {exam}
I want to be done within {expected_date}.

Create a learning plan for me. Respond with a single JSON code block of this exact shape:

```json
{
  "videos": [
    { "url": "https://www.youtube.com/watch?v=...", "title": "...", "description": "..." }
  ],
  "keyPoints": ["..."],
  "summary": "..."
}
```

Recommend only real YouTube videos. Keep the key points short and ordered from basic to advanced."#;

/// Builds the natural-language prompt sent to the generative-language API.
pub fn build_plan_prompt(request: &PlanRequest) -> String {
    let level = if request.is_beginner {
        "a complete beginner on this topic"
    } else {
        "already familiar with the basics of this topic"
    };
    let exam = if request.is_preparing_exam {
        "I am preparing for an exam, so focus on what is most likely to be tested."
    } else {
        "I am not preparing for an exam; I want a practical understanding."
    };

    PLAN_PROMPT_TEMPLATE
        .replace("{title}", request.title.trim())
        .replace("{level}", level)
        .replace("{exam}", exam)
        .replace("{expected_date}", request.expected_date.trim())
}

fn code_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:[A-Za-z]+)?\s*(.*?)```").expect("code block pattern is valid")
    })
}

/// Finds the JSON payload inside a free-text response: the first fenced code
/// block if there is one, otherwise the outermost `{ ... }` span.
fn extract_json_payload(text: &str) -> Option<&str> {
    if let Some(body) = code_block_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
    {
        return Some(body.as_str().trim());
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn video_list(value: &Value) -> Vec<PlanVideo> {
    value
        .get("videos")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .map(|item| PlanVideo {
                    url: string_field(item, "url"),
                    title: string_field(item, "title"),
                    description: string_field(item, "description"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parses a generated response into a `LearningPlan`, field by field.
pub fn parse_plan_response(text: &str) -> LearningPlan {
    let Some(payload) = extract_json_payload(text) else {
        return LearningPlan::default();
    };

    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) if value.is_object() => value,
        _ => return LearningPlan::default(),
    };

    LearningPlan {
        videos: video_list(&value),
        key_points: string_list(&value, "keyPoints"),
        summary: string_field(&value, "summary"),
    }
}
