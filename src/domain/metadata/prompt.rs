//! Prompt and reply handling for bibliographic metadata extraction.

use crate::domain::model::BookMetadata;
use serde_json::Value as JsonValue;

/// Instruction sent as the system message. The user message carries the excerpt.
pub const SYSTEM_PROMPT: &str = r#"Analyze the following text from a school book cover or first pages and extract the grade, subject, and semester. The text may be in Arabic (e.g., "الصف الثالث" for grade 3). Map Arabic grade names to numbers as follows:
- الصف الثالث=grade 3
- الصف الرابع=grade 4
- الصف الخامس=grade 5
- الصف السادس=grade 6
- الصف الأول متوسط=grade 7
- الصف الثاني متوسط=grade 8
- الصف الثالث متوسط=grade 9
- الصف الأول ثانوي=grade 10
- الصف الثاني ثانوي=grade 11
- الصف الثالث ثانوي=grade 12
Provide the output in JSON format with keys 'grade' (numeric), 'subject', and 'semester'."#;

/// Triple stored when the reply cannot be parsed and strict parsing is off.
pub fn fallback_metadata() -> BookMetadata {
    BookMetadata {
        grade: "3".to_string(),
        subject: "Math".to_string(),
        semester: "01".to_string(),
    }
}

/// Parses the model's reply into a metadata triple.
///
/// Accepts the JSON object bare or wrapped in a Markdown code fence. `grade` and
/// `semester` may be numbers or strings; every key must be present and non-empty.
pub fn parse_metadata_reply(reply: &str) -> Result<BookMetadata, String> {
    let body = strip_code_fence(reply);
    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| format!("reply is not JSON: {}", e))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "reply is not a JSON object".to_string())?;

    Ok(BookMetadata {
        grade: scalar_field(obj, "grade")?,
        subject: scalar_field(obj, "subject")?,
        semester: scalar_field(obj, "semester")?,
    })
}

fn scalar_field(obj: &serde_json::Map<String, JsonValue>, key: &str) -> Result<String, String> {
    let text = match obj.get(key) {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("'{}' has unsupported value {}", key, other)),
        None => return Err(format!("'{}' is missing", key)),
    };
    if text.is_empty() {
        return Err(format!("'{}' is empty", key));
    }
    Ok(text)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
